// ==========================================
// 供应商风险决策支持系统 - 情景模拟
// ==========================================
// 职责: 保存一组分析参数 (情景), 并据此重算 权重 -> 排名 -> 分配 -> 指标
// 说明: 情景只携带参数与基准权重, 不携带数据; 重算时传入当前数据集
// ==========================================

use crate::config::analysis_profile::{ActionBudget, AllocationParams, AnalysisConfig};
use crate::domain::dataset::Dataset;
use crate::domain::matrix::LabeledSeries;
use crate::domain::supplier::RatingFilters;
use crate::engine::allocation::{compute_kpis, AllocationKpis, AllocationOptimizer, AllocationResult};
use crate::engine::supplier_scorer::{SupplierRanking, SupplierScorer};
use crate::engine::what_if::tweak_weights;
use serde::{Deserialize, Serialize};

/// 权重调整 (子准则列表 × 乘数)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatIf {
    pub subs: Vec<String>,
    pub factor: f64,
}

impl Default for WhatIf {
    fn default() -> Self {
        Self {
            subs: Vec::new(),
            factor: 1.0,
        }
    }
}

impl WhatIf {
    pub fn is_identity(&self) -> bool {
        self.subs.is_empty() || self.factor == 1.0
    }
}

// ==========================================
// ScenarioState - 情景快照
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioState {
    pub filters: RatingFilters,
    pub what_if: WhatIf,
    pub action_budget: ActionBudget,
    pub allocation: AllocationParams,
    pub gw_base: LabeledSeries,
}

impl ScenarioState {
    /// 由当前配置与基准全局权重捕获情景 (what-if 置为恒等)
    pub fn capture(gw: &LabeledSeries, config: &AnalysisConfig) -> Self {
        Self {
            filters: config.filters.clone(),
            what_if: WhatIf::default(),
            action_budget: config.action_budget.clone(),
            allocation: config.allocation.clone(),
            gw_base: gw.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutcome {
    pub gw: LabeledSeries,
    pub ranking: SupplierRanking,
    pub allocation: AllocationResult,
    pub kpis: AllocationKpis,
}

// ==========================================
// ScenarioSimulator
// ==========================================
pub struct ScenarioSimulator {
    scorer: SupplierScorer,
    allocator: AllocationOptimizer,
}

impl Default for ScenarioSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioSimulator {
    pub fn new() -> Self {
        Self {
            scorer: SupplierScorer::new(),
            allocator: AllocationOptimizer::new(),
        }
    }

    /// 按情景重算
    ///
    /// 排名为空时不做分配 (分配结果为 NOT_SOLVED, 指标为 0)
    pub fn simulate(&self, state: &ScenarioState, data: &Dataset) -> SimulationOutcome {
        let gw = if state.what_if.is_identity() {
            state.gw_base.clone()
        } else {
            tweak_weights(&state.gw_base, &state.what_if.subs, state.what_if.factor)
        };

        let ranking = self.scorer.score(
            &data.ratings,
            &data.respondents,
            &gw,
            &data.suppliers,
            &state.filters,
        );

        let allocation = if ranking.is_empty() {
            AllocationResult::default()
        } else {
            self.allocator.optimize(
                &data.plants,
                &data.allocation_suppliers,
                &ranking,
                &state.allocation,
            )
        };
        let kpis = compute_kpis(&allocation, &data.allocation_suppliers, &ranking);

        tracing::debug!(
            suppliers = ranking.rows.len(),
            allocation_rows = allocation.rows.len(),
            status = %allocation.status,
            "情景重算完成"
        );

        SimulationOutcome {
            gw,
            ranking,
            allocation,
            kpis,
        }
    }
}
