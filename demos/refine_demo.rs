//! AI印象优化演示程序
//!
//! 启动一个本地的模拟优化服务，再通过HTTP客户端对报告会话执行一次优化。

use anyhow::Result;
use axum::{routing::post, Json, Router};
use serde_json::{json, Value};
use spine_core::Region;
use spine_integration::{refine_impression, HttpRefinementClient, REFINE_PATH};
use spine_report::{RefinementStatus, ReportSession};
use tracing::{info, warn};

/// 模拟优化服务：把报告中的节段行压缩为一句印象
async fn mock_refine(Json(body): Json<Value>) -> Json<Value> {
    let report = body["baseReport"].as_str().unwrap_or_default();
    let abnormal = report
        .lines()
        .filter(|line| line.contains("stenosis"))
        .count();
    Json(json!({
        "impression": format!("Degenerative changes with stenosis at {} level(s).", abnormal)
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    info!("🚀 启动AI印象优化演示");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    tokio::spawn(async move {
        let app = Router::new().route(REFINE_PATH, post(mock_refine));
        if let Err(e) = axum::serve(listener, app).await {
            warn!("模拟优化服务退出: {}", e);
        }
    });

    let client = HttpRefinementClient::from_base_url(&base_url);
    let session = ReportSession::new(Region::Lumbar).generate_report();

    let refined = refine_impression(&client, &session).await?;
    match &refined.ai_impression {
        RefinementStatus::Succeeded(impression) => info!("✅ 优化后的印象: {}", impression),
        RefinementStatus::Failed(reason) => warn!("❌ 优化失败: {}", reason),
        other => warn!("意外的状态: {:?}", other),
    }

    // 服务不可达时，失败只体现在AI印象状态上
    let offline = HttpRefinementClient::from_base_url("http://127.0.0.1:9");
    let failed = refine_impression(&offline, &session).await?;
    info!("   离线服务状态: {:?}", failed.ai_impression);
    info!("   报告文本未变化: {}", failed.report_text == session.report_text);

    info!("✅ AI印象优化演示完成");
    Ok(())
}
