//! 结构化表单的选项定义
//!
//! 所有下拉选项均为封闭枚举；`label()` 即表单与报告中使用的文本。
//! 带哨兵值（None / Normal / Absent）的枚举通过 `is_reportable()` 判断是否写入报告。

use crate::error::{Result, SpineError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pfirrmann 椎间盘退变分级
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PfirrmannGrade {
    #[serde(rename = "I", alias = "I – Homogeneous bright, normal height")]
    I,
    #[serde(rename = "II", alias = "II – Inhomogeneous, normal height")]
    II,
    #[serde(
        rename = "III",
        alias = "III – Inhomogeneous, intermediate, normal/slightly decreased height"
    )]
    III,
    #[serde(rename = "IV", alias = "IV – Inhomogeneous, dark, moderately decreased height")]
    IV,
    #[serde(rename = "V", alias = "V – Collapsed disc space")]
    V,
}

impl PfirrmannGrade {
    pub const ALL: [PfirrmannGrade; 5] = [Self::I, Self::II, Self::III, Self::IV, Self::V];

    pub fn label(&self) -> &'static str {
        match self {
            Self::I => "I – Homogeneous bright, normal height",
            Self::II => "II – Inhomogeneous, normal height",
            Self::III => "III – Inhomogeneous, intermediate, normal/slightly decreased height",
            Self::IV => "IV – Inhomogeneous, dark, moderately decreased height",
            Self::V => "V – Collapsed disc space",
        }
    }
}

impl Default for PfirrmannGrade {
    fn default() -> Self {
        Self::II
    }
}

/// 椎间盘病变
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DiscPathology {
    None,
    #[serde(rename = "Broad-based disc bulge")]
    BroadBasedBulge,
    #[serde(rename = "Focal protrusion")]
    FocalProtrusion,
    Extrusion,
    #[serde(rename = "Sequestered fragment")]
    SequesteredFragment,
    #[serde(rename = "Annular fissure")]
    AnnularFissure,
}

impl DiscPathology {
    pub const ALL: [DiscPathology; 6] = [
        Self::None,
        Self::BroadBasedBulge,
        Self::FocalProtrusion,
        Self::Extrusion,
        Self::SequesteredFragment,
        Self::AnnularFissure,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::BroadBasedBulge => "Broad-based disc bulge",
            Self::FocalProtrusion => "Focal protrusion",
            Self::Extrusion => "Extrusion",
            Self::SequesteredFragment => "Sequestered fragment",
            Self::AnnularFissure => "Annular fissure",
        }
    }

    pub fn is_reportable(&self) -> bool {
        *self != Self::None
    }
}

impl Default for DiscPathology {
    fn default() -> Self {
        Self::None
    }
}

/// 椎管/椎间孔狭窄程度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StenosisGrade {
    None,
    Mild,
    Moderate,
    Severe,
}

impl StenosisGrade {
    pub const ALL: [StenosisGrade; 4] = [Self::None, Self::Mild, Self::Moderate, Self::Severe];

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Mild => "Mild",
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
        }
    }

    pub fn is_reportable(&self) -> bool {
        *self != Self::None
    }
}

impl Default for StenosisGrade {
    fn default() -> Self {
        Self::None
    }
}

/// Modic 终板改变
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ModicChange {
    None,
    #[serde(rename = "Type I")]
    TypeI,
    #[serde(rename = "Type II")]
    TypeII,
    #[serde(rename = "Type III")]
    TypeIII,
    Mixed,
}

impl ModicChange {
    pub const ALL: [ModicChange; 5] = [
        Self::None,
        Self::TypeI,
        Self::TypeII,
        Self::TypeIII,
        Self::Mixed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::TypeI => "Type I",
            Self::TypeII => "Type II",
            Self::TypeIII => "Type III",
            Self::Mixed => "Mixed",
        }
    }

    pub fn is_reportable(&self) -> bool {
        *self != Self::None
    }
}

impl Default for ModicChange {
    fn default() -> Self {
        Self::None
    }
}

/// 脊柱序列
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Alignment {
    Physiological,
    #[serde(rename = "Straightening of lordosis")]
    StraighteningOfLordosis,
    #[serde(rename = "Reversal of lordosis")]
    ReversalOfLordosis,
    #[serde(rename = "Focal kyphosis")]
    FocalKyphosis,
    Scoliosis,
    Spondylolisthesis,
}

impl Alignment {
    pub const ALL: [Alignment; 6] = [
        Self::Physiological,
        Self::StraighteningOfLordosis,
        Self::ReversalOfLordosis,
        Self::FocalKyphosis,
        Self::Scoliosis,
        Self::Spondylolisthesis,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Physiological => "Physiological",
            Self::StraighteningOfLordosis => "Straightening of lordosis",
            Self::ReversalOfLordosis => "Reversal of lordosis",
            Self::FocalKyphosis => "Focal kyphosis",
            Self::Scoliosis => "Scoliosis",
            Self::Spondylolisthesis => "Spondylolisthesis",
        }
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self::Physiological
    }
}

/// 脊髓/马尾信号
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CordSignal {
    Normal,
    #[serde(rename = "T2 hyperintense signal")]
    T2Hyperintense,
    #[serde(rename = "Heterogeneous signal")]
    Heterogeneous,
    #[serde(rename = "Syrinx / central canal dilatation")]
    Syrinx,
}

impl CordSignal {
    pub const ALL: [CordSignal; 4] = [
        Self::Normal,
        Self::T2Hyperintense,
        Self::Heterogeneous,
        Self::Syrinx,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::T2Hyperintense => "T2 hyperintense signal",
            Self::Heterogeneous => "Heterogeneous signal",
            Self::Syrinx => "Syrinx / central canal dilatation",
        }
    }
}

impl Default for CordSignal {
    fn default() -> Self {
        Self::Normal
    }
}

/// 脊髓/马尾受压
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CordCompression {
    None,
    #[serde(rename = "CSF effacement")]
    CsfEffacement,
    Mild,
    Moderate,
    Severe,
}

impl CordCompression {
    pub const ALL: [CordCompression; 5] = [
        Self::None,
        Self::CsfEffacement,
        Self::Mild,
        Self::Moderate,
        Self::Severe,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::CsfEffacement => "CSF effacement",
            Self::Mild => "Mild",
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
        }
    }

    pub fn is_reportable(&self) -> bool {
        *self != Self::None
    }
}

impl Default for CordCompression {
    fn default() -> Self {
        Self::None
    }
}

/// 脊髓软化
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Myelomalacia {
    Absent,
    Present,
}

impl Myelomalacia {
    pub const ALL: [Myelomalacia; 2] = [Self::Absent, Self::Present];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Absent => "Absent",
            Self::Present => "Present",
        }
    }

    pub fn is_reportable(&self) -> bool {
        *self != Self::Absent
    }
}

impl Default for Myelomalacia {
    fn default() -> Self {
        Self::Absent
    }
}

macro_rules! label_option {
    ($($ty:ty => $field:literal),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.label())
                }
            }

            impl FromStr for $ty {
                type Err = SpineError;

                fn from_str(s: &str) -> Result<Self> {
                    let wanted = s.trim();
                    Self::ALL
                        .into_iter()
                        .find(|option| {
                            let label = option.label();
                            label.eq_ignore_ascii_case(wanted)
                                || label.split(" – ").next() == Some(wanted)
                        })
                        .ok_or_else(|| SpineError::InvalidOption {
                            field: $field.to_string(),
                            value: s.to_string(),
                        })
                }
            }
        )*
    };
}

label_option!(
    PfirrmannGrade => "pfirrmann",
    DiscPathology => "herniation",
    StenosisGrade => "stenosis",
    ModicChange => "modic",
    Alignment => "alignment",
    CordSignal => "cord_signal",
    CordCompression => "cord_compression",
    Myelomalacia => "myelomalacia",
);

/// 表单下拉选项全集（供渲染层填充选择框）
#[derive(Debug, Clone, Serialize)]
pub struct FormOptions {
    pub regions: Vec<RegionOption>,
    pub pfirrmann: Vec<&'static str>,
    pub herniation: Vec<&'static str>,
    pub stenosis: Vec<&'static str>,
    pub modic: Vec<&'static str>,
    pub alignment: Vec<&'static str>,
    pub cord_signal: Vec<&'static str>,
    pub cord_compression: Vec<&'static str>,
    pub myelomalacia: Vec<&'static str>,
}

/// 部位选项
#[derive(Debug, Clone, Serialize)]
pub struct RegionOption {
    pub id: &'static str,
    pub label: &'static str,
}

impl FormOptions {
    pub fn new() -> Self {
        Self {
            regions: crate::catalog::Region::ALL
                .iter()
                .map(|region| RegionOption {
                    id: region.as_str(),
                    label: region.label(),
                })
                .collect(),
            pfirrmann: PfirrmannGrade::ALL.iter().map(|o| o.label()).collect(),
            herniation: DiscPathology::ALL.iter().map(|o| o.label()).collect(),
            stenosis: StenosisGrade::ALL.iter().map(|o| o.label()).collect(),
            modic: ModicChange::ALL.iter().map(|o| o.label()).collect(),
            alignment: Alignment::ALL.iter().map(|o| o.label()).collect(),
            cord_signal: CordSignal::ALL.iter().map(|o| o.label()).collect(),
            cord_compression: CordCompression::ALL.iter().map(|o| o.label()).collect(),
            myelomalacia: Myelomalacia::ALL.iter().map(|o| o.label()).collect(),
        }
    }
}

impl Default for FormOptions {
    fn default() -> Self {
        Self::new()
    }
}
