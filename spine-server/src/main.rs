//! 脊柱MRI报告服务主程序

use anyhow::Result;
use clap::Parser;
use spine_admin::{init_logging, ConfigManager, SpineConfig};
use spine_integration::{ApiServer, ApiState, CommandClipboard, HttpRefinementClient};
use std::sync::Arc;
use tracing::{error, info};

/// 报告服务命令行参数
#[derive(Parser, Debug)]
#[command(name = "spine-server")]
#[command(about = "脊柱MRI结构化报告服务")]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 监听主机（覆盖配置）
    #[arg(long)]
    host: Option<String>,

    /// 监听端口（覆盖配置）
    #[arg(short, long)]
    port: Option<u16>,

    /// 日志级别（覆盖配置）
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut SpineConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

fn build_state(config: &SpineConfig) -> Result<ApiState> {
    let clipboard = CommandClipboard::new(
        config.clipboard.program.clone(),
        config.clipboard.args.clone(),
    );
    info!("  剪贴板程序: {}", clipboard.program());
    let mut state = ApiState::new(config.default_region()?).with_clipboard(Arc::new(clipboard));

    if config.refinement.enabled {
        let endpoint = config.refinement.endpoint.clone();
        let client = match config.refinement.timeout() {
            Some(timeout) => HttpRefinementClient::with_timeout(endpoint, timeout)?,
            None => HttpRefinementClient::new(endpoint),
        };
        info!("  优化服务: {}", client.endpoint());
        state = state.with_refinement(Arc::new(client));
    }

    Ok(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let manager = ConfigManager::new(args.config.as_deref())?;
    let mut config = manager.get_config().await;
    args.apply(&mut config);
    manager.update_config(config.clone()).await?;

    init_logging(&config.logging)?;

    info!("启动脊柱MRI报告服务...");
    if let Some(path) = manager.config_path() {
        info!("  配置文件: {}", path);
    }
    info!("  监听地址: {}", config.listen_addr());
    info!("  默认部位: {}", config.report.default_region);

    let state = build_state(&config)?;
    let server = ApiServer::new(state);

    if let Err(e) = server.run(&config.listen_addr()).await {
        error!("服务器启动失败: {}", e);
        return Err(e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_state_from_config() {
        let mut config = SpineConfig::default();
        config.report.default_region = "whole".to_string();

        let state = build_state(&config).unwrap();
        assert_eq!(state.default_region, spine_core::Region::Whole);
        assert!(state.clipboard.is_some());
        assert!(state.refinement.is_none());

        config.refinement.enabled = true;
        assert!(build_state(&config).unwrap().refinement.is_some());
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from(["spine-server", "--port", "9191", "--log-level", "debug"]);
        let mut config = SpineConfig::default();
        args.apply(&mut config);

        assert_eq!(config.server.port, 9191);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.server.host, "127.0.0.1");
    }
}
