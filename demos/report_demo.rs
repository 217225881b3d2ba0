//! 报告生成演示程序
//!
//! 展示报告会话的核心流程：
//! - 从示例所见开始编辑节段和临床信息
//! - 切换部位后生成报告
//! - 一键填充正常检查
//! - 导出到剪贴板

use anyhow::Result;
use spine_core::{
    Alignment, ContextUpdate, DiscPathology, FindingUpdate, LevelKey, ModicChange, PatientField,
    Region, StenosisGrade,
};
use spine_integration::{export_report, MemoryClipboard};
use spine_report::ReportSession;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    info!("🚀 启动脊柱报告生成演示");

    let session = demo_edit_session();
    let session = demo_normal_study(&session);
    demo_export(&session).await?;

    info!("✅ 报告生成演示完成");
    Ok(())
}

/// 编辑会话并生成报告
fn demo_edit_session() -> ReportSession {
    info!("\n📋 编辑腰椎报告");

    let session = ReportSession::new(Region::Lumbar)
        .edit_context(ContextUpdate::Patient {
            field: PatientField::Name,
            value: Some("Jane Roe".to_string()),
        })
        .edit_context(ContextUpdate::Patient {
            field: PatientField::Age,
            value: Some("52".to_string()),
        })
        .edit_context(ContextUpdate::Patient {
            field: PatientField::Sex,
            value: Some("F".to_string()),
        })
        .edit_context(ContextUpdate::Alignment { value: Alignment::StraighteningOfLordosis })
        .edit_finding(LevelKey::L3L4, FindingUpdate::Herniation(DiscPathology::BroadBasedBulge))
        .edit_finding(LevelKey::L3L4, FindingUpdate::Modic(ModicChange::TypeI))
        .edit_context(ContextUpdate::ImpressionKeyPoints {
            value: "Multilevel lumbar spondylosis.\nModerate right L5S1 foraminal stenosis."
                .to_string(),
        })
        .generate_report();

    info!("   可见节段: {:?}", session.visible_levels());
    println!("{}\n", session.report_text);

    // 切换部位不丢失已编辑的所见
    let whole = session
        .with_region(Region::Whole)
        .edit_finding(LevelKey::C5C6, FindingUpdate::Canal(StenosisGrade::Moderate))
        .generate_report();
    info!("   全脊柱报告共 {} 个节段", whole.visible_levels().len());
    println!("{}\n", whole.report_text);

    whole
}

/// 正常检查一键填充：患者信息与技术描述保留
fn demo_normal_study(session: &ReportSession) -> ReportSession {
    info!("\n🩺 正常检查");

    let normal = session.apply_normal_study().generate_report();
    info!("   异常节段数: {}", normal.findings.abnormal_levels().len());
    println!("{}\n", normal.report_text);

    normal
}

/// 导出到（内存）剪贴板
async fn demo_export(session: &ReportSession) -> Result<()> {
    info!("\n📎 导出报告");

    let clipboard = MemoryClipboard::new();
    let text = export_report(&clipboard, session).await?;
    info!("   已导出 {} 个字符", text.len());

    Ok(())
}
