//! 临床上下文
//!
//! 节段所见之外的全部结构化状态：患者信息、扫描技术、序列、脊髓/马尾、其他结构和印象要点。

use crate::models::{Alignment, CordCompression, CordSignal, Myelomalacia};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TECHNIQUE: &str =
    "Multiplanar, multisequence MRI of the spine was performed without intravenous contrast.";
pub const BASELINE_VERTEBRAE: &str =
    "Vertebral body heights are maintained. Marrow signal is within normal limits.";
pub const BASELINE_LIGAMENTS: &str =
    "Facet joints, ligamentum flavum and posterior ligaments are unremarkable.";
pub const BASELINE_PARASPINAL: &str =
    "No paraspinal or epidural soft tissue abnormality.";
pub const BASELINE_CONUS: &str =
    "Conus medullaris terminates at a normal level and is normal in signal.";

/// 患者基本信息（均为可选）
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PatientInfo {
    pub name: Option<String>,
    pub id: Option<String>,
    pub age: Option<String>,
    pub sex: Option<String>,
    pub study_date: Option<String>,
    pub referring: Option<String>,
}

/// 患者信息字段
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PatientField {
    Name,
    Id,
    Age,
    Sex,
    StudyDate,
    Referring,
}

impl PatientInfo {
    pub fn field(&self, field: PatientField) -> Option<&str> {
        let value = match field {
            PatientField::Name => &self.name,
            PatientField::Id => &self.id,
            PatientField::Age => &self.age,
            PatientField::Sex => &self.sex,
            PatientField::StudyDate => &self.study_date,
            PatientField::Referring => &self.referring,
        };
        value.as_deref()
    }

    fn slot(&mut self, field: PatientField) -> &mut Option<String> {
        match field {
            PatientField::Name => &mut self.name,
            PatientField::Id => &mut self.id,
            PatientField::Age => &mut self.age,
            PatientField::Sex => &mut self.sex,
            PatientField::StudyDate => &mut self.study_date,
            PatientField::Referring => &mut self.referring,
        }
    }
}

/// 脊髓 / 圆锥 / 马尾所见
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CordCauda {
    pub signal: CordSignal,
    pub compression: CordCompression,
    pub myelomalacia: Myelomalacia,
    pub comments: String,
}

/// 其他结构的自由文本
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OtherCompartments {
    pub vertebrae: String,
    pub ligaments: String,
    pub paraspinal: String,
    pub conus: String,
}

impl OtherCompartments {
    /// 正常检查的四句基线描述
    pub fn baseline() -> Self {
        Self {
            vertebrae: BASELINE_VERTEBRAE.to_string(),
            ligaments: BASELINE_LIGAMENTS.to_string(),
            paraspinal: BASELINE_PARASPINAL.to_string(),
            conus: BASELINE_CONUS.to_string(),
        }
    }
}

impl Default for OtherCompartments {
    fn default() -> Self {
        Self::baseline()
    }
}

/// 其他结构字段
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OtherField {
    Vertebrae,
    Ligaments,
    Paraspinal,
    Conus,
}

/// 临床上下文
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ClinicalContext {
    pub patient: PatientInfo,
    pub technique: String,
    pub alignment: Alignment,
    pub cord_cauda: CordCauda,
    pub others: OtherCompartments,
    /// 换行分隔的印象要点
    pub impression_key_points: String,
}

impl Default for ClinicalContext {
    fn default() -> Self {
        Self {
            patient: PatientInfo::default(),
            technique: DEFAULT_TECHNIQUE.to_string(),
            alignment: Alignment::default(),
            cord_cauda: CordCauda::default(),
            others: OtherCompartments::baseline(),
            impression_key_points: String::new(),
        }
    }
}

/// 临床上下文的单字段更新
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContextUpdate {
    Patient { field: PatientField, value: Option<String> },
    Technique { value: String },
    Alignment { value: Alignment },
    CordSignal { value: CordSignal },
    CordCompression { value: CordCompression },
    Myelomalacia { value: Myelomalacia },
    CordComments { value: String },
    Other { field: OtherField, value: String },
    ImpressionKeyPoints { value: String },
}

impl ClinicalContext {
    /// 应用单字段更新，返回新的上下文
    pub fn with(&self, update: ContextUpdate) -> Self {
        let mut next = self.clone();
        match update {
            ContextUpdate::Patient { field, value } => *next.patient.slot(field) = value,
            ContextUpdate::Technique { value } => next.technique = value,
            ContextUpdate::Alignment { value } => next.alignment = value,
            ContextUpdate::CordSignal { value } => next.cord_cauda.signal = value,
            ContextUpdate::CordCompression { value } => next.cord_cauda.compression = value,
            ContextUpdate::Myelomalacia { value } => next.cord_cauda.myelomalacia = value,
            ContextUpdate::CordComments { value } => next.cord_cauda.comments = value,
            ContextUpdate::Other { field, value } => match field {
                OtherField::Vertebrae => next.others.vertebrae = value,
                OtherField::Ligaments => next.others.ligaments = value,
                OtherField::Paraspinal => next.others.paraspinal = value,
                OtherField::Conus => next.others.conus = value,
            },
            ContextUpdate::ImpressionKeyPoints { value } => next.impression_key_points = value,
        }
        next
    }
}
