//! # Spine Core
//!
//! 脊柱MRI结构化报告的核心模块，提供节段目录、选项枚举、所见存储、临床上下文和错误定义。

pub mod catalog;
pub mod context;
pub mod error;
pub mod findings;
pub mod models;
pub mod utils;

pub use catalog::{levels_for, LevelKey, Region, LEVEL_COUNT};
pub use context::{
    ClinicalContext, ContextUpdate, CordCauda, OtherCompartments, OtherField, PatientField,
    PatientInfo,
};
pub use error::{Result, SpineError};
pub use findings::{Finding, FindingField, FindingUpdate, FindingsStore};
pub use models::*;
