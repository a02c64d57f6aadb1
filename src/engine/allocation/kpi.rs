use super::solver::AllocationResult;
use crate::domain::matrix::normalize_label;
use crate::domain::supplier::AllocationSupplier;
use crate::engine::supplier_scorer::SupplierRanking;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// AllocationKpis - 分配方案指标
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationKpis {
    /// Σ 数量 × 单位成本
    pub total_cost: f64,

    /// 数量加权的平均归一化质量 (最高分下限取 1.0)
    pub avg_quality: f64,

    /// Σ 数量 × 排放评分
    pub total_emission: f64,

    pub total_quantity: f64,
}

/// 计算分配方案指标
///
/// 无分配行时全部为 0; 无排名时 avg_quality 为 0
pub fn compute_kpis(
    result: &AllocationResult,
    suppliers: &[AllocationSupplier],
    ranking: &SupplierRanking,
) -> AllocationKpis {
    if result.is_empty() {
        return AllocationKpis::default();
    }

    let mut economics: HashMap<String, (f64, f64)> = HashMap::new();
    for s in suppliers {
        economics
            .entry(normalize_label(&s.supplier_id))
            .or_insert((finite(s.unit_cost), finite(s.emission_score)));
    }

    let mut kpis = AllocationKpis::default();
    for row in &result.rows {
        let (cost, emission) = economics.get(&row.supplier_id).copied().unwrap_or((0.0, 0.0));
        kpis.total_cost += row.quantity * cost;
        kpis.total_emission += row.quantity * emission;
        kpis.total_quantity += row.quantity;
    }

    if let Some(max_score) = ranking.max_score() {
        let max_score = max_score.max(1.0);
        let weighted: f64 = result
            .rows
            .iter()
            .map(|r| ranking.score_of(&r.supplier_id).unwrap_or(0.0) / max_score * r.quantity)
            .sum();
        let denom = if kpis.total_quantity != 0.0 {
            kpis.total_quantity
        } else {
            1.0
        };
        kpis.avg_quality = weighted / denom;
    }

    kpis
}

fn finite(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

// ==========================================
// RegionShare - 区域供应占比
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionShare {
    pub region: String,
    pub quantity: f64,
    pub share: f64,
}

/// 各区域供应量占比 (按占比降序, 同值按区域名)
pub fn region_shares(result: &AllocationResult) -> Vec<RegionShare> {
    let total = result.total_quantity();
    if result.is_empty() || total <= 0.0 {
        return Vec::new();
    }

    let mut by_region: Vec<(String, f64)> = Vec::new();
    for row in &result.rows {
        match by_region.iter_mut().find(|(r, _)| *r == row.region) {
            Some((_, q)) => *q += row.quantity,
            None => by_region.push((row.region.clone(), row.quantity)),
        }
    }
    by_region.sort_by(|a, b| a.0.cmp(&b.0));

    let mut shares: Vec<RegionShare> = by_region
        .into_iter()
        .map(|(region, quantity)| RegionShare {
            region,
            quantity,
            share: quantity / total,
        })
        .collect();
    shares.sort_by(|a, b| b.share.total_cmp(&a.share));
    shares
}
