//! 正常检查基线
//!
//! "Normal study" 一键填充：重置全部节段所见，并把序列、脊髓/马尾、其他结构和印象要点
//! 替换为按检查部位选定的标准描述。患者信息与扫描技术保持不变。

use serde::{Deserialize, Serialize};
use spine_core::{
    Alignment, ClinicalContext, CordCauda, FindingsStore, OtherCompartments, Region,
};

/// 各部位正常检查的标准印象
pub fn normal_impression(region: Region) -> &'static str {
    match region {
        Region::Cervical => {
            "MRI cervical spine within normal limits. No disc herniation or spinal canal stenosis. No cord signal abnormality."
        }
        Region::Thoracic => {
            "MRI thoracic spine within normal limits. No disc herniation or spinal canal stenosis. No cord signal abnormality."
        }
        Region::Lumbar => {
            "MRI lumbar spine within normal limits. No significant disc bulge, spinal canal or neural foraminal stenosis."
        }
        Region::Whole => {
            "MRI whole spine within normal limits. No significant disc herniation, spinal canal or neural foraminal stenosis. No abnormal cord or conus signal."
        }
    }
}

/// 正常检查基线（所见存储 + 上下文的部分字段）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NormalBaseline {
    pub findings: FindingsStore,
    pub alignment: Alignment,
    pub cord_cauda: CordCauda,
    pub others: OtherCompartments,
    pub impression_key_points: String,
}

impl NormalBaseline {
    /// 合并到已有上下文：只保留 `patient` 与 `technique`
    pub fn merge_into(&self, context: &ClinicalContext) -> ClinicalContext {
        ClinicalContext {
            patient: context.patient.clone(),
            technique: context.technique.clone(),
            alignment: self.alignment,
            cord_cauda: self.cord_cauda.clone(),
            others: self.others.clone(),
            impression_key_points: self.impression_key_points.clone(),
        }
    }
}

/// 计算某部位的正常检查基线
pub fn normalize(region: Region) -> NormalBaseline {
    NormalBaseline {
        findings: FindingsStore::new(),
        alignment: Alignment::Physiological,
        cord_cauda: CordCauda::default(),
        others: OtherCompartments::baseline(),
        impression_key_points: normal_impression(region).to_string(),
    }
}

/// 一步完成正常检查填充，返回新的所见存储与上下文
pub fn apply_normal_study(
    region: Region,
    context: &ClinicalContext,
) -> (FindingsStore, ClinicalContext) {
    let baseline = normalize(region);
    let next_context = baseline.merge_into(context);
    tracing::info!("Normal study baseline applied for {} region", region);
    (baseline.findings, next_context)
}
