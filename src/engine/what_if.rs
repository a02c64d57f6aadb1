// ==========================================
// 供应商风险决策支持系统 - 假设分析 (What-if)
// ==========================================
// 职责: 调整全局权重 + 对比两次排名
// ==========================================

use crate::domain::matrix::LabeledSeries;
use crate::engine::supplier_scorer::SupplierRanking;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 放大/缩小指定子准则的全局权重并重新归一化
///
/// # 参数
/// - `gw`: 原全局权重
/// - `sub_ids`: 需要调整的子准则 (不存在的标识符忽略)
/// - `factor`: 乘数
///
/// # 返回
/// 和为 1 的新权重 (调整后总和为 0 时除数取 1)
pub fn tweak_weights<S: AsRef<str>>(gw: &LabeledSeries, sub_ids: &[S], factor: f64) -> LabeledSeries {
    if gw.is_empty() {
        return gw.clone();
    }
    let mut out = gw.clone();
    for (label, value) in out.labels.iter().zip(out.values.iter_mut()) {
        if sub_ids.iter().any(|s| s.as_ref().trim() == label) {
            *value *= factor;
        }
    }
    let total = out.sum();
    let divisor = if total != 0.0 { total } else { 1.0 };
    out.values.iter_mut().for_each(|v| *v /= divisor);
    out
}

/// 排名对比行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingDelta {
    pub supplier_id: String,
    pub score_base: f64,
    pub score_new: f64,
    pub delta: f64, // new - base
}

/// 按供应商内连接两次排名, 按 delta 降序
pub fn compare_rankings(base: &SupplierRanking, new: &SupplierRanking) -> Vec<RankingDelta> {
    let new_scores: HashMap<&str, f64> = new
        .rows
        .iter()
        .map(|r| (r.supplier_id.as_str(), r.score))
        .collect();

    let mut rows: Vec<RankingDelta> = base
        .rows
        .iter()
        .filter_map(|b| {
            new_scores.get(b.supplier_id.as_str()).map(|&score_new| RankingDelta {
                supplier_id: b.supplier_id.clone(),
                score_base: b.score,
                score_new,
                delta: score_new - b.score,
            })
        })
        .collect();
    rows.sort_by(|a, b| b.delta.total_cmp(&a.delta));
    rows
}
