//! 报告会话
//!
//! 一次报告编辑过程的完整状态快照。每个操作都返回新的会话，旧快照保持不变；
//! 没有观察者或订阅机制，调用方显式地传入和取回状态。

use crate::composer::compose;
use crate::normalize::apply_normal_study;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spine_core::{
    levels_for, ClinicalContext, ContextUpdate, FindingUpdate, FindingsStore, LevelKey, Region,
    Result, SpineError,
};
use uuid::Uuid;

/// AI印象优化状态
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum RefinementStatus {
    #[default]
    Idle,
    Pending,
    Succeeded(String),
    Failed(String),
}

impl RefinementStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// 优化后的印象文本（仅成功时）
    pub fn impression(&self) -> Option<&str> {
        match self {
            Self::Succeeded(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

/// 发往优化服务的请求体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefinementRequest {
    pub base_report: String,
    pub region: Region,
}

/// 报告会话快照
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportSession {
    pub id: Uuid,
    pub region: Region,
    pub findings: FindingsStore,
    pub context: ClinicalContext,
    /// 最近一次生成（或用户编辑后）的报告文本
    pub report_text: String,
    pub ai_impression: RefinementStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportSession {
    /// 创建新会话：示例所见 + 默认临床上下文
    pub fn new(region: Region) -> Self {
        let now = Utc::now();
        let session = Self {
            id: Uuid::new_v4(),
            region,
            findings: FindingsStore::seeded(),
            context: ClinicalContext::default(),
            report_text: String::new(),
            ai_impression: RefinementStatus::Idle,
            created_at: now,
            updated_at: now,
        };
        tracing::info!("Report session {} started on {} region", session.id, region);
        session
    }

    /// 当前部位在表单与报告中展示的节段
    pub fn visible_levels(&self) -> &'static [LevelKey] {
        levels_for(self.region)
    }

    pub fn with_region(&self, region: Region) -> Self {
        tracing::debug!("Session {} region changed: {} -> {}", self.id, self.region, region);
        self.derive(|next| next.region = region)
    }

    pub fn edit_finding(&self, level: LevelKey, update: FindingUpdate) -> Self {
        let findings = self.findings.set(level, update);
        self.derive(|next| next.findings = findings)
    }

    /// 单个节段 "Mark normal"
    pub fn mark_level_normal(&self, level: LevelKey) -> Self {
        let findings = self.findings.reset_level(level);
        self.derive(|next| next.findings = findings)
    }

    pub fn edit_context(&self, update: ContextUpdate) -> Self {
        let context = self.context.with(update);
        self.derive(|next| next.context = context)
    }

    /// 正常检查一键填充，所见存储与上下文在同一步内替换
    pub fn apply_normal_study(&self) -> Self {
        let (findings, context) = apply_normal_study(self.region, &self.context);
        self.derive(|next| {
            next.findings = findings;
            next.context = context;
        })
    }

    /// 按当前状态生成报告文本（不修改会话）
    pub fn compose(&self) -> String {
        compose(self.region, &self.findings, &self.context)
    }

    /// 生成报告并覆盖已保存的报告文本
    pub fn generate_report(&self) -> Self {
        let report_text = self.compose();
        tracing::info!(
            "Report generated for session {} ({} region, {} chars)",
            self.id,
            self.region,
            report_text.len()
        );
        self.derive(|next| next.report_text = report_text)
    }

    /// 用户直接编辑报告文本
    pub fn with_report_text(&self, text: impl Into<String>) -> Self {
        let report_text = text.into();
        self.derive(|next| next.report_text = report_text)
    }

    /// 发起AI印象优化：同一时间最多一个请求
    ///
    /// 尚未生成报告时先按当前状态生成。返回进入 `Pending` 的会话和请求体。
    pub fn begin_refinement(&self) -> Result<(Self, RefinementRequest)> {
        if self.ai_impression.is_pending() {
            tracing::warn!("Refinement already in flight for session {}", self.id);
            return Err(SpineError::RefinementInFlight);
        }

        let base = if self.report_text.trim().is_empty() {
            self.generate_report()
        } else {
            self.clone()
        };

        let request = RefinementRequest {
            base_report: base.report_text.clone(),
            region: base.region,
        };
        let pending = base.derive(|next| next.ai_impression = RefinementStatus::Pending);
        Ok((pending, request))
    }

    /// 写入优化结果；只替换AI印象字段
    pub fn complete_refinement(&self, outcome: Result<String>) -> Self {
        let status = match outcome {
            Ok(impression) => {
                tracing::info!("Refinement succeeded for session {}", self.id);
                RefinementStatus::Succeeded(impression)
            }
            Err(e) => {
                tracing::warn!("Refinement failed for session {}: {}", self.id, e);
                RefinementStatus::Failed(e.to_string())
            }
        };
        self.derive(|next| next.ai_impression = status)
    }

    fn derive(&self, change: impl FnOnce(&mut Self)) -> Self {
        let mut next = self.clone();
        change(&mut next);
        next.updated_at = Utc::now();
        next
    }
}

impl Default for ReportSession {
    fn default() -> Self {
        Self::new(Region::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normal_impression;
    use spine_core::{Alignment, PatientField, StenosisGrade};
    use std::sync::Arc;

    #[test]
    fn test_new_session() {
        let session = ReportSession::default();
        assert_eq!(session.region, Region::Lumbar);
        assert_eq!(session.visible_levels().len(), 5);
        assert_eq!(session.findings, FindingsStore::seeded());
        assert!(session.report_text.is_empty());
        assert_eq!(session.ai_impression, RefinementStatus::Idle);
    }

    #[test]
    fn test_region_switch_keeps_data() {
        let session = ReportSession::new(Region::Lumbar)
            .edit_finding(LevelKey::C4C5, FindingUpdate::Canal(StenosisGrade::Moderate));

        let cervical = session.with_region(Region::Cervical);
        assert_eq!(cervical.visible_levels().len(), 6);
        assert_eq!(cervical.findings, session.findings);

        let back = cervical.with_region(Region::Lumbar);
        assert_eq!(back.findings.get(LevelKey::C4C5).canal, StenosisGrade::Moderate);
        assert_eq!(back.findings.get(LevelKey::L4L5), FindingsStore::seeded().get(LevelKey::L4L5));
    }

    #[test]
    fn test_edits_are_copy_on_write() {
        let session = ReportSession::default();
        let edited = session.edit_finding(LevelKey::L3L4, FindingUpdate::Foraminal(StenosisGrade::Mild));

        assert!(session.findings.get(LevelKey::L3L4).is_default());
        assert_eq!(edited.findings.get(LevelKey::L3L4).foraminal, StenosisGrade::Mild);
        assert!(Arc::ptr_eq(
            edited.findings.get_shared(LevelKey::L4L5),
            session.findings.get_shared(LevelKey::L4L5)
        ));
        assert_eq!(edited.id, session.id);
    }

    #[test]
    fn test_mark_level_normal() {
        let session = ReportSession::default().mark_level_normal(LevelKey::L4L5);
        assert!(session.findings.get(LevelKey::L4L5).is_default());
        assert!(!session.findings.get(LevelKey::L5S1).is_default());
    }

    #[test]
    fn test_normal_study_on_session() {
        let session = ReportSession::new(Region::Whole)
            .edit_context(ContextUpdate::Patient {
                field: PatientField::Name,
                value: Some("John Doe".to_string()),
            })
            .edit_context(ContextUpdate::Alignment { value: Alignment::FocalKyphosis })
            .apply_normal_study();

        assert!(session.findings.abnormal_levels().is_empty());
        assert_eq!(session.context.alignment, Alignment::Physiological);
        assert_eq!(session.context.patient.name.as_deref(), Some("John Doe"));
        assert_eq!(session.context.impression_key_points, normal_impression(Region::Whole));
    }

    #[test]
    fn test_generate_and_edit_report() {
        let session = ReportSession::default().generate_report();
        assert_eq!(session.report_text, session.compose());

        let edited = session.with_report_text("Edited by hand");
        assert_eq!(edited.report_text, "Edited by hand");

        let regenerated = edited.generate_report();
        assert_eq!(regenerated.report_text, session.report_text);
    }

    #[test]
    fn test_refinement_lifecycle() {
        let session = ReportSession::default();
        let (pending, request) = session.begin_refinement().unwrap();

        assert!(pending.ai_impression.is_pending());
        assert_eq!(request.region, Region::Lumbar);
        assert_eq!(request.base_report, session.compose());
        assert_eq!(pending.report_text, request.base_report);

        assert!(matches!(pending.begin_refinement(), Err(SpineError::RefinementInFlight)));

        let done = pending.complete_refinement(Ok("Mild L4L5 degeneration.".to_string()));
        assert_eq!(done.ai_impression.impression(), Some("Mild L4L5 degeneration."));
        assert_eq!(done.findings, pending.findings);
        assert_eq!(done.context, pending.context);
        assert_eq!(done.report_text, pending.report_text);
    }

    #[test]
    fn test_refinement_uses_edited_report() {
        let session = ReportSession::default().with_report_text("Custom report body");
        let (_, request) = session.begin_refinement().unwrap();
        assert_eq!(request.base_report, "Custom report body");
    }

    #[test]
    fn test_refinement_failure_keeps_state() {
        let (pending, _) = ReportSession::default().begin_refinement().unwrap();
        let failed = pending.complete_refinement(Err(SpineError::RefinementUnavailable(
            "status 503".to_string(),
        )));

        assert!(matches!(failed.ai_impression, RefinementStatus::Failed(ref reason) if reason.contains("503")));
        assert_eq!(failed.report_text, pending.report_text);
        assert_eq!(failed.findings, pending.findings);

        // 失败后可以重新发起
        assert!(failed.begin_refinement().is_ok());
    }

    #[test]
    fn test_request_json_shape() {
        let request = RefinementRequest {
            base_report: "MRI LUMBAR SPINE".to_string(),
            region: Region::Lumbar,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["baseReport"], "MRI LUMBAR SPINE");
        assert_eq!(value["region"], "lumbar");
    }

    #[test]
    fn test_session_json_round_trip() {
        let session = ReportSession::default().generate_report();
        let json = serde_json::to_string(&session).unwrap();
        let restored: ReportSession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
    }
}
