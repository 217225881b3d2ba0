//! 节段目录
//!
//! 固定的椎间盘节段枚举（颅尾顺序），以及检查部位到节段子序列的映射

use crate::error::{Result, SpineError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 检查部位
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Cervical, // 颈椎
    Thoracic, // 胸椎
    Lumbar,   // 腰椎
    Whole,    // 全脊柱
}

impl Region {
    pub const ALL: [Region; 4] = [Self::Cervical, Self::Thoracic, Self::Lumbar, Self::Whole];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cervical => "cervical",
            Self::Thoracic => "thoracic",
            Self::Lumbar => "lumbar",
            Self::Whole => "whole",
        }
    }

    /// 表单上显示的名称
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cervical => "Cervical",
            Self::Thoracic => "Thoracic",
            Self::Lumbar => "Lumbar",
            Self::Whole => "Whole spine",
        }
    }

    /// 报告是否包含圆锥（conus）相关内容
    pub fn includes_conus(&self) -> bool {
        matches!(self, Self::Lumbar | Self::Whole)
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::Lumbar
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = SpineError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cervical" => Ok(Self::Cervical),
            "thoracic" => Ok(Self::Thoracic),
            "lumbar" => Ok(Self::Lumbar),
            "whole" => Ok(Self::Whole),
            _ => Err(SpineError::InvalidRegion(value.to_string())),
        }
    }
}

/// 椎间盘节段
///
/// 声明顺序即颅尾顺序，`Ord` 依此排序。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LevelKey {
    C2C3,
    C3C4,
    C4C5,
    C5C6,
    C6C7,
    C7T1,
    T1T2,
    T2T3,
    T3T4,
    T4T5,
    T5T6,
    T6T7,
    T7T8,
    T8T9,
    T9T10,
    T10T11,
    T11T12,
    T12L1,
    L1L2,
    L2L3,
    L3L4,
    L4L5,
    L5S1,
}

/// 节段总数
pub const LEVEL_COUNT: usize = 23;

const CERVICAL_END: usize = 6;
const THORACIC_END: usize = 18;

impl LevelKey {
    /// 全部节段：颈 ++ 胸 ++ 腰
    pub const ALL: [LevelKey; LEVEL_COUNT] = [
        Self::C2C3,
        Self::C3C4,
        Self::C4C5,
        Self::C5C6,
        Self::C6C7,
        Self::C7T1,
        Self::T1T2,
        Self::T2T3,
        Self::T3T4,
        Self::T4T5,
        Self::T5T6,
        Self::T6T7,
        Self::T7T8,
        Self::T8T9,
        Self::T9T10,
        Self::T10T11,
        Self::T11T12,
        Self::T12L1,
        Self::L1L2,
        Self::L2L3,
        Self::L3L4,
        Self::L4L5,
        Self::L5S1,
    ];

    /// 在 `ALL` 中的位置
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::C2C3 => "C2C3",
            Self::C3C4 => "C3C4",
            Self::C4C5 => "C4C5",
            Self::C5C6 => "C5C6",
            Self::C6C7 => "C6C7",
            Self::C7T1 => "C7T1",
            Self::T1T2 => "T1T2",
            Self::T2T3 => "T2T3",
            Self::T3T4 => "T3T4",
            Self::T4T5 => "T4T5",
            Self::T5T6 => "T5T6",
            Self::T6T7 => "T6T7",
            Self::T7T8 => "T7T8",
            Self::T8T9 => "T8T9",
            Self::T9T10 => "T9T10",
            Self::T10T11 => "T10T11",
            Self::T11T12 => "T11T12",
            Self::T12L1 => "T12L1",
            Self::L1L2 => "L1L2",
            Self::L2L3 => "L2L3",
            Self::L3L4 => "L3L4",
            Self::L4L5 => "L4L5",
            Self::L5S1 => "L5S1",
        }
    }

    /// 节段所属的部位（不会返回 `Whole`）
    pub fn region(self) -> Region {
        match self.index() {
            i if i < CERVICAL_END => Region::Cervical,
            i if i < THORACIC_END => Region::Thoracic,
            _ => Region::Lumbar,
        }
    }
}

impl fmt::Display for LevelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LevelKey {
    type Err = SpineError;

    fn from_str(value: &str) -> Result<Self> {
        let wanted = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SpineError::KeyNotFound(value.to_string()))
    }
}

/// 返回某部位在报告和表单中展示的节段（颅尾顺序）
pub fn levels_for(region: Region) -> &'static [LevelKey] {
    match region {
        Region::Cervical => &LevelKey::ALL[..CERVICAL_END],
        Region::Thoracic => &LevelKey::ALL[CERVICAL_END..THORACIC_END],
        Region::Lumbar => &LevelKey::ALL[THORACIC_END..],
        Region::Whole => &LevelKey::ALL,
    }
}
