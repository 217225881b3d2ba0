//! 节段所见存储
//!
//! `FindingsStore` 对全部 23 个节段始终完整（total），与当前选择的检查部位无关。
//! 所有操作都返回新的存储；未被修改的节段与原存储共享同一个 `Arc<Finding>`。

use crate::catalog::{LevelKey, LEVEL_COUNT};
use crate::error::Result;
use crate::models::{DiscPathology, ModicChange, PfirrmannGrade, StenosisGrade};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// 单个节段的所见
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Finding {
    pub pfirrmann: PfirrmannGrade,
    pub herniation: DiscPathology,
    pub canal: StenosisGrade,
    pub foraminal: StenosisGrade,
    pub modic: ModicChange,
    pub comments: String,
}

impl Finding {
    /// 是否与默认所见完全一致
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// 应用单字段更新，返回新的所见
    pub fn with(&self, update: FindingUpdate) -> Self {
        let mut next = self.clone();
        match update {
            FindingUpdate::Pfirrmann(grade) => next.pfirrmann = grade,
            FindingUpdate::Herniation(pathology) => next.herniation = pathology,
            FindingUpdate::Canal(grade) => next.canal = grade,
            FindingUpdate::Foraminal(grade) => next.foraminal = grade,
            FindingUpdate::Modic(change) => next.modic = change,
            FindingUpdate::Comments(text) => next.comments = text,
        }
        next
    }
}

/// 所见字段
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FindingField {
    Pfirrmann,
    Herniation,
    Canal,
    Foraminal,
    Modic,
    Comments,
}

/// 单字段更新（字段 + 新值）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FindingUpdate {
    Pfirrmann(PfirrmannGrade),
    Herniation(DiscPathology),
    Canal(StenosisGrade),
    Foraminal(StenosisGrade),
    Modic(ModicChange),
    Comments(String),
}

impl FindingUpdate {
    pub fn field(&self) -> FindingField {
        match self {
            Self::Pfirrmann(_) => FindingField::Pfirrmann,
            Self::Herniation(_) => FindingField::Herniation,
            Self::Canal(_) => FindingField::Canal,
            Self::Foraminal(_) => FindingField::Foraminal,
            Self::Modic(_) => FindingField::Modic,
            Self::Comments(_) => FindingField::Comments,
        }
    }
}

/// 全节段所见存储
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindingsStore {
    levels: Vec<Arc<Finding>>,
}

impl FindingsStore {
    /// 所有节段均为默认所见
    pub fn new() -> Self {
        let blank = Arc::new(Finding::default());
        Self {
            levels: vec![blank; LEVEL_COUNT],
        }
    }

    /// 初始会话使用的示例数据：L4L5、L5S1 预填
    pub fn seeded() -> Self {
        Self::new()
            .replace(
                LevelKey::L4L5,
                Finding {
                    pfirrmann: PfirrmannGrade::III,
                    herniation: DiscPathology::BroadBasedBulge,
                    canal: StenosisGrade::Mild,
                    foraminal: StenosisGrade::Mild,
                    modic: ModicChange::TypeII,
                    comments: String::new(),
                },
            )
            .replace(
                LevelKey::L5S1,
                Finding {
                    pfirrmann: PfirrmannGrade::III,
                    herniation: DiscPathology::FocalProtrusion,
                    canal: StenosisGrade::Mild,
                    foraminal: StenosisGrade::Moderate,
                    modic: ModicChange::None,
                    comments: String::new(),
                },
            )
    }

    /// 由节段映射构建；缺失的节段补默认所见
    pub fn from_entries(entries: BTreeMap<LevelKey, Finding>) -> Self {
        entries
            .into_iter()
            .fold(Self::new(), |store, (level, finding)| store.replace(level, finding))
    }

    pub fn get(&self, level: LevelKey) -> &Finding {
        &self.levels[level.index()]
    }

    /// 共享句柄，用于判断节段是否被结构性共享
    pub fn get_shared(&self, level: LevelKey) -> &Arc<Finding> {
        &self.levels[level.index()]
    }

    /// 按节段名称读取；名称不在目录中时返回 `KeyNotFound`
    pub fn get_by_name(&self, level: &str) -> Result<&Finding> {
        let key: LevelKey = level.parse()?;
        Ok(self.get(key))
    }

    /// 替换某节段的某个字段
    pub fn set(&self, level: LevelKey, update: FindingUpdate) -> Self {
        tracing::debug!("Finding updated: {} {:?}", level, update.field());
        let next = self.get(level).with(update);
        self.replace(level, next)
    }

    /// 将某节段恢复为默认所见
    pub fn reset_level(&self, level: LevelKey) -> Self {
        tracing::debug!("Finding reset to default: {}", level);
        self.replace(level, Finding::default())
    }

    /// 将全部节段恢复为默认所见
    pub fn reset_all(&self) -> Self {
        Self::new()
    }

    /// 按颅尾顺序遍历所有节段
    pub fn iter(&self) -> impl Iterator<Item = (LevelKey, &Finding)> {
        LevelKey::ALL
            .iter()
            .copied()
            .zip(self.levels.iter().map(|finding| &**finding))
    }

    /// 非默认所见的节段
    pub fn abnormal_levels(&self) -> Vec<LevelKey> {
        self.iter()
            .filter(|(_, finding)| !finding.is_default())
            .map(|(level, _)| level)
            .collect()
    }

    fn replace(&self, level: LevelKey, finding: Finding) -> Self {
        let mut levels = self.levels.clone();
        levels[level.index()] = Arc::new(finding);
        Self { levels }
    }
}

impl Default for FindingsStore {
    fn default() -> Self {
        Self::seeded()
    }
}

impl Serialize for FindingsStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for FindingsStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let entries = BTreeMap::<LevelKey, Finding>::deserialize(deserializer)?;
        Ok(Self::from_entries(entries))
    }
}
