//! 错误定义模块

use thiserror::Error;

/// 脊柱报告系统统一错误类型
#[derive(Error, Debug)]
pub enum SpineError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("未知节段: {0}")]
    KeyNotFound(String),

    #[error("未知检查部位: {0}")]
    InvalidRegion(String),

    #[error("无效选项: {field} = {value}")]
    InvalidOption { field: String, value: String },

    #[error("请求无效: {0}")]
    InvalidRequest(String),

    #[error("AI印象优化不可用: {0}")]
    RefinementUnavailable(String),

    #[error("已有AI印象优化请求正在进行")]
    RefinementInFlight,

    #[error("剪贴板不可用: {0}")]
    ClipboardUnavailable(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SpineError {
    /// 是否为外部协作方（AI优化、剪贴板）引起的可恢复错误
    pub fn is_boundary_error(&self) -> bool {
        matches!(
            self,
            Self::RefinementUnavailable(_) | Self::RefinementInFlight | Self::ClipboardUnavailable(_)
        )
    }
}

/// 脊柱报告系统统一结果类型
pub type Result<T> = std::result::Result<T, SpineError>;
