//! # 脊柱MRI报告引擎
//!
//! 提供报告生成的全部纯函数逻辑，包括：
//! - 正常检查基线：按部位重置所见并填入标准描述
//! - 报告生成器：把结构化状态组装为有序、按条件取舍的报告文本
//! - 报告会话：显式传递的不可变状态快照，含AI印象优化状态

pub mod composer;
pub mod normalize;
pub mod session;

pub use composer::{compose, compose_sections, ReportSection};
pub use normalize::{apply_normal_study, normal_impression, normalize, NormalBaseline};
pub use session::{RefinementRequest, RefinementStatus, ReportSession};
