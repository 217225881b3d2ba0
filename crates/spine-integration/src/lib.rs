//! # 脊柱报告集成模块
//!
//! 提供与外部环境的集成功能，包括：
//! - AI印象优化服务客户端
//! - 报告导出到系统剪贴板
//! - RESTful API接口，供渲染层获取选项、生成与规范化报告

pub mod api;
pub mod clipboard;
pub mod refine;

pub use api::{create_api_routes, ApiError, ApiJson, ApiServer, ApiState};
pub use clipboard::{export_report, ClipboardSink, CommandClipboard, MemoryClipboard};
pub use refine::{
    refine_impression, HttpRefinementClient, RefinementClient, RefinementResponse, REFINE_PATH,
};
