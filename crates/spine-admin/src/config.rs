//! 配置管理
//!
//! 从可选的TOML文件和 `SPINE_` 前缀的环境变量加载配置，按规则列表验证，并可保存回TOML。

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use spine_core::Region;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// 配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    /// 配置数据
    config: Arc<RwLock<SpineConfig>>,
    /// 配置文件路径
    config_path: Option<String>,
    /// 配置验证器
    validator: ConfigValidator,
}

/// 报告服务完整配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SpineConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 报告配置
    pub report: ReportConfig,
    /// AI印象优化配置
    pub refinement: RefinementConfig,
    /// 剪贴板导出配置
    pub clipboard: ClipboardConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听主机
    pub host: String,
    /// 监听端口
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportConfig {
    /// 新会话的默认部位
    pub default_region: String,
}

/// AI印象优化配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RefinementConfig {
    pub enabled: bool,
    /// 优化服务的完整URL
    pub endpoint: String,
    /// 请求超时（秒）
    pub timeout_secs: Option<u64>,
}

/// 剪贴板导出配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClipboardConfig {
    /// 接收报告文本（stdin）的程序
    pub program: String,
    pub args: Vec<String>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别或过滤指令
    pub level: String,
    /// 输出格式：pretty 或 json
    pub format: String,
}

/// 支持的日志格式
pub const LOG_FORMATS: [&str; 2] = ["pretty", "json"];

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_region: Region::default().as_str().to_string(),
        }
    }
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "http://127.0.0.1:8000/api/ai-refine".to_string(),
            timeout_secs: Some(30),
        }
    }
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            program: "xclip".to_string(),
            args: vec!["-selection".to_string(), "clipboard".to_string()],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl SpineConfig {
    /// 解析默认部位
    pub fn default_region(&self) -> Result<Region> {
        self.report
            .default_region
            .parse()
            .context("Invalid report.default_region")
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl RefinementConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl ConfigManager {
    /// 创建新的配置管理器；未给出路径时只使用默认值和环境变量
    pub fn new(config_path: Option<&str>) -> Result<Self> {
        let validator = ConfigValidator::new();
        let config = Self::load_config(config_path)?;
        validator.validate(&config)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path: config_path.map(str::to_string),
            validator,
        })
    }

    /// 加载配置：默认值 < 配置文件 < 环境变量
    fn load_config(config_path: Option<&str>) -> Result<SpineConfig> {
        let mut builder = Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("SPINE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: SpineConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        match config_path {
            Some(path) => info!("Configuration loaded from: {}", path),
            None => info!("Configuration loaded from defaults and environment"),
        }
        Ok(config)
    }

    /// 配置文件路径（未指定时为 `None`）
    pub fn config_path(&self) -> Option<&str> {
        self.config_path.as_deref()
    }

    /// 获取配置
    pub async fn get_config(&self) -> SpineConfig {
        let config = self.config.read().await;
        config.clone()
    }

    /// 更新配置（先验证）
    pub async fn update_config(&self, new_config: SpineConfig) -> Result<()> {
        self.validator.validate(&new_config)?;

        {
            let mut config = self.config.write().await;
            *config = new_config;
        }

        info!("Configuration updated successfully");
        Ok(())
    }

    /// 保存配置到指定文件
    pub async fn save_config(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let config = self.config.read().await;
        let config_str =
            toml::to_string_pretty(&*config).context("Failed to serialize configuration")?;

        tokio::fs::write(path, config_str)
            .await
            .context("Failed to write configuration file")?;

        info!("Configuration saved to: {}", path.display());
        Ok(())
    }

    /// 按点分路径读取配置值，如 `server.port`
    pub async fn get_value<T>(&self, path: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let config = self.config.read().await;
        let config_json =
            serde_json::to_value(&*config).context("Failed to serialize config to JSON")?;

        let mut current = &config_json;
        for part in path.split('.') {
            current = current
                .as_object()
                .and_then(|map| map.get(part))
                .ok_or_else(|| anyhow::anyhow!("Configuration path not found: {}", path))?;
        }
        debug!("Configuration value read: {}", path);

        serde_json::from_value(current.clone()).context("Failed to deserialize configuration value")
    }
}

/// 配置验证器
#[derive(Debug)]
pub struct ConfigValidator {
    /// 验证规则
    validation_rules: Vec<ValidationRule>,
}

/// 验证规则
#[derive(Debug)]
struct ValidationRule {
    /// 字段路径
    field_path: &'static str,
    /// 验证函数
    validator: fn(&SpineConfig) -> Result<()>,
    /// 错误消息
    error_message: &'static str,
}

impl ConfigValidator {
    /// 创建新的配置验证器
    pub fn new() -> Self {
        let validation_rules = vec![
            ValidationRule {
                field_path: "server.port",
                validator: |config| {
                    if config.server.port == 0 {
                        Err(anyhow::anyhow!("Server port cannot be 0"))
                    } else {
                        Ok(())
                    }
                },
                error_message: "Invalid server port",
            },
            ValidationRule {
                field_path: "report.default_region",
                validator: |config| config.default_region().map(|_| ()),
                error_message: "Invalid default region",
            },
            ValidationRule {
                field_path: "refinement.endpoint",
                validator: |config| {
                    let endpoint = config.refinement.endpoint.trim();
                    if !config.refinement.enabled
                        || endpoint.starts_with("http://")
                        || endpoint.starts_with("https://")
                    {
                        Ok(())
                    } else {
                        Err(anyhow::anyhow!("Endpoint must be an http(s) URL: {:?}", endpoint))
                    }
                },
                error_message: "Invalid refinement endpoint",
            },
            ValidationRule {
                field_path: "clipboard.program",
                validator: |config| {
                    if config.clipboard.program.trim().is_empty() {
                        Err(anyhow::anyhow!("Clipboard program cannot be empty"))
                    } else {
                        Ok(())
                    }
                },
                error_message: "Invalid clipboard program",
            },
            ValidationRule {
                field_path: "logging.format",
                validator: |config| {
                    if LOG_FORMATS.contains(&config.logging.format.as_str()) {
                        Ok(())
                    } else {
                        Err(anyhow::anyhow!("Unknown log format: {}", config.logging.format))
                    }
                },
                error_message: "Invalid log format",
            },
        ];

        Self { validation_rules }
    }

    /// 验证配置
    pub fn validate(&self, config: &SpineConfig) -> Result<()> {
        for rule in &self.validation_rules {
            if let Err(e) = (rule.validator)(config) {
                error!("Configuration validation failed for {}: {}", rule.field_path, e);
                return Err(anyhow::anyhow!("{}: {}", rule.error_message, e));
            }
        }

        debug!("Configuration validation passed");
        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}
