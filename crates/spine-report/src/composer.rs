//! 报告生成器
//!
//! 把 `(部位, 所见存储, 临床上下文)` 确定性地组装成自由文本报告。
//! 章节顺序固定；部位只决定椎间盘章节包含哪些节段、脊髓章节的标题以及是否出现圆锥章节。

use serde::Serialize;
use spine_core::utils::{non_blank, non_blank_lines, non_blank_opt};
use spine_core::context::{
    BASELINE_CONUS, BASELINE_LIGAMENTS, BASELINE_PARASPINAL, BASELINE_VERTEBRAE, DEFAULT_TECHNIQUE,
};
use spine_core::{
    levels_for, ClinicalContext, CordCauda, Finding, FindingsStore, LevelKey, PatientInfo,
    Region,
};

pub const NO_SIGNIFICANT_ABNORMALITY: &str = "No significant abnormality.";
pub const IMPRESSION_FALLBACK: &str = "Multilevel spondylotic changes as detailed above.";
pub const BULLET: &str = "•";

/// 报告章节：可选标题行 + 正文行
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportSection {
    pub heading: Option<String>,
    pub lines: Vec<String>,
}

impl ReportSection {
    fn titled(heading: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            heading: Some(heading.into()),
            lines,
        }
    }

    fn bare(line: String) -> Self {
        Self {
            heading: None,
            lines: vec![line],
        }
    }

    fn render(&self) -> String {
        self.heading
            .iter()
            .chain(self.lines.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// 报告标题
pub fn title(region: Region) -> String {
    match region {
        Region::Whole => "MRI WHOLE SPINE".to_string(),
        other => format!("MRI {} SPINE", other.as_str().to_uppercase()),
    }
}

/// 患者信息行；所有字段为空时返回 `None`
pub fn demographics_line(patient: &PatientInfo) -> Option<String> {
    let age_sex = [patient.age.as_deref(), patient.sex.as_deref()]
        .into_iter()
        .filter_map(non_blank_opt)
        .collect::<Vec<_>>()
        .join("/");

    let parts: Vec<String> = [
        non_blank_opt(patient.name.as_deref()).map(|v| format!("Name: {}", v)),
        non_blank_opt(patient.id.as_deref()).map(|v| format!("ID: {}", v)),
        non_blank(&age_sex).map(|v| format!("Age/Sex: {}", v)),
        non_blank_opt(patient.study_date.as_deref()).map(|v| format!("Study date: {}", v)),
        non_blank_opt(patient.referring.as_deref()).map(|v| format!("Referring: {}", v)),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

/// 单个节段的描述短语（按固定字段顺序，只包含非默认内容）
pub fn level_phrases(finding: &Finding) -> Vec<String> {
    let mut phrases = Vec::new();

    if finding.herniation.is_reportable() {
        phrases.push(format!("Disc pathology: {}.", finding.herniation.label()));
    }
    if finding.canal.is_reportable() {
        phrases.push(format!("Central canal stenosis: {}.", finding.canal.label()));
    }
    if finding.foraminal.is_reportable() {
        phrases.push(format!("Neural foraminal stenosis: {}.", finding.foraminal.label()));
    }
    if finding.modic.is_reportable() {
        phrases.push(format!("Endplate changes: {}.", finding.modic.label()));
    }
    if let Some(comments) = non_blank(&finding.comments) {
        phrases.push(comments.to_string());
    }

    // Pfirrmann 分级总在最前；仅当其为默认值且没有其他所见时省略
    let default_grade = finding.pfirrmann == Finding::default().pfirrmann;
    if !default_grade || !phrases.is_empty() {
        phrases.insert(0, format!("Pfirrmann grade: {}.", finding.pfirrmann.label()));
    }

    phrases
}

/// 单个节段的报告行
pub fn level_line(level: LevelKey, finding: &Finding) -> String {
    let phrases = level_phrases(finding);
    if phrases.is_empty() {
        format!("{}: {}", level, NO_SIGNIFICANT_ABNORMALITY)
    } else {
        format!("{}: {}", level, phrases.join(" "))
    }
}

/// 脊髓/马尾章节标题
pub fn cord_heading(region: Region) -> &'static str {
    match region {
        Region::Cervical | Region::Thoracic => "SPINAL CORD:",
        Region::Whole => "SPINAL CORD / CONUS / CAUDA EQUINA:",
        Region::Lumbar => "CAUDA EQUINA / CONUS:",
    }
}

/// 脊髓/马尾章节正文
pub fn cord_lines(cord: &CordCauda) -> Vec<String> {
    let mut lines = vec![format!("Signal: {}.", cord.signal.label())];
    if cord.compression.is_reportable() {
        lines.push(format!("Compression: {}.", cord.compression.label()));
    }
    if cord.myelomalacia.is_reportable() {
        lines.push(format!("Myelomalacia: {}.", cord.myelomalacia.label()));
    }
    if let Some(comments) = non_blank(&cord.comments) {
        lines.push(comments.to_string());
    }
    lines
}

/// 印象章节正文：每个非空要点一条项目符号，否则使用兜底句
pub fn impression_lines(key_points: &str) -> Vec<String> {
    let points = non_blank_lines(key_points);
    if points.is_empty() {
        vec![IMPRESSION_FALLBACK.to_string()]
    } else {
        points
            .into_iter()
            .map(|point| format!("{} {}", BULLET, point))
            .collect()
    }
}

/// 自由文本章节正文；清空的字段回落到该章节的默认描述，保证每个章节至少一行正文
fn text_lines(text: &str, fallback: &str) -> Vec<String> {
    vec![non_blank(text).unwrap_or(fallback).to_string()]
}

/// 按固定顺序生成全部章节
pub fn compose_sections(
    region: Region,
    store: &FindingsStore,
    context: &ClinicalContext,
) -> Vec<ReportSection> {
    let mut sections = vec![ReportSection::bare(title(region))];

    if let Some(line) = demographics_line(&context.patient) {
        sections.push(ReportSection::bare(line));
    }

    sections.push(ReportSection::titled(
        "Technique:",
        text_lines(&context.technique, DEFAULT_TECHNIQUE),
    ));
    sections.push(ReportSection::titled(
        "Alignment:",
        vec![format!("{}.", context.alignment.label())],
    ));
    sections.push(ReportSection::titled(
        "Vertebrae & marrow:",
        text_lines(&context.others.vertebrae, BASELINE_VERTEBRAE),
    ));

    let disc_lines = levels_for(region)
        .iter()
        .map(|level| level_line(*level, store.get(*level)))
        .collect();
    sections.push(ReportSection::titled("Discs & neural foramina:", disc_lines));

    sections.push(ReportSection::titled(
        cord_heading(region),
        cord_lines(&context.cord_cauda),
    ));
    sections.push(ReportSection::titled(
        "Posterior elements / ligaments:",
        text_lines(&context.others.ligaments, BASELINE_LIGAMENTS),
    ));
    sections.push(ReportSection::titled(
        "Paraspinal / epidural soft tissues:",
        text_lines(&context.others.paraspinal, BASELINE_PARASPINAL),
    ));

    if region.includes_conus() {
        sections.push(ReportSection::titled(
            "Conus:",
            text_lines(&context.others.conus, BASELINE_CONUS),
        ));
    }

    sections.push(ReportSection::titled(
        "Impression:",
        impression_lines(&context.impression_key_points),
    ));

    sections
}

/// 生成报告文本；章节之间以一个空行分隔
pub fn compose(region: Region, store: &FindingsStore, context: &ClinicalContext) -> String {
    compose_sections(region, store, context)
        .iter()
        .map(ReportSection::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}
