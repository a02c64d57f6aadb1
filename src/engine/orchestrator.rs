// ==========================================
// 供应商风险决策支持系统 - 分析编排器
// ==========================================
// 用途: 按数据流顺序协调各引擎
// 对齐 -> HOR -> DEMATEL -> DANP -> 供应商评分
//      -> {分配, 措施选择 + ε 前沿} -> 敏感性 -> 洞察
// 红线: 编排器不修复数据; 调用方应先执行 Dataset::sanitize
// ==========================================

use crate::config::analysis_profile::AnalysisConfig;
use crate::domain::dataset::Dataset;
use crate::domain::matrix::LabeledSeries;
use crate::engine::action_optimizer::{default_targets, ActionOptimizer, ActionSelection, FrontierRow};
use crate::engine::alignment::AlignmentWarning;
use crate::engine::allocation::{
    compute_kpis, region_shares, AllocationKpis, AllocationOptimizer, AllocationResult, RegionShare,
};
use crate::engine::danp::{DanpResult, DanpSolver};
use crate::engine::dematel::{CausalPosition, DematelEngine, DematelResult};
use crate::engine::hor::{HorEngine, HorStage1Result, MitigationDetail};
use crate::engine::insights::{auto_insights, Insight, InsightInputs};
use crate::engine::sensitivity::{HorInputs, SensitivityAnalyzer, TornadoRow};
use crate::engine::supplier_scorer::{SupplierRanking, SupplierScorer};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

// ==========================================
// AnalysisReport - 一次完整分析的输出
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub config: AnalysisConfig,

    // HOR
    pub hor_stage1: HorStage1Result,
    pub mitigation: MitigationDetail,

    // 评价网络
    pub dematel: DematelResult,
    pub causal_positions: Vec<CausalPosition>,
    pub danp: DanpResult,
    pub criterion_weights: LabeledSeries,

    // 供应商
    pub ranking: SupplierRanking,
    pub allocation: AllocationResult,
    pub allocation_kpis: AllocationKpis,
    pub region_shares: Vec<RegionShare>,

    // 措施组合
    pub action_selection: ActionSelection,
    pub frontier: Vec<FrontierRow>,

    // 敏感性 + 洞察
    pub tornado: Vec<TornadoRow>,
    pub insights: Vec<Insight>,

    /// 矩阵对齐告警 (R 与 E)
    pub warnings: Vec<AlignmentWarning>,
}

// ==========================================
// AnalysisPipeline - 分析编排器
// ==========================================
pub struct AnalysisPipeline {
    hor: HorEngine,
    dematel: DematelEngine,
    danp: DanpSolver,
    scorer: SupplierScorer,
    allocator: AllocationOptimizer,
    actions: ActionOptimizer,
    sensitivity: SensitivityAnalyzer,
}

impl Default for AnalysisPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisPipeline {
    pub fn new() -> Self {
        Self {
            hor: HorEngine::new(),
            dematel: DematelEngine::new(),
            danp: DanpSolver::new(),
            scorer: SupplierScorer::new(),
            allocator: AllocationOptimizer::new(),
            actions: ActionOptimizer::new(),
            sensitivity: SensitivityAnalyzer::new(),
        }
    }

    /// 执行完整分析
    ///
    /// # 参数
    /// - `data`: 输入数据集 (建议已 sanitize)
    /// - `config`: 分析参数
    ///
    /// # 返回
    /// AnalysisReport (任何阶段的失败都以空结果/状态体现, 不返回错误)
    pub fn run(&self, data: &Dataset, config: &AnalysisConfig) -> AnalysisReport {
        let run_id = Uuid::new_v4().to_string();
        info!(run_id = %run_id, "开始执行分析流程");

        // ==========================================
        // 步骤1: HOR 两阶段
        // ==========================================
        debug!("步骤1: HOR 风险传播");
        let (hor_stage1, mitigation) = self.hor.run(
            &data.events,
            &data.agents,
            &data.risk_matrix,
            &data.effectiveness,
            &data.actions,
        );
        let mut warnings = hor_stage1.warnings.clone();
        warnings.extend(mitigation.warnings.iter().cloned());

        // ==========================================
        // 步骤2: DEMATEL + DANP
        // ==========================================
        debug!("步骤2: DEMATEL / DANP");
        let sub_ids = data.sub_ids();
        let dematel = self.dematel.build(&data.respondents, &sub_ids, &data.edges);
        let causal_positions = dematel.causal_positions();

        let criterion_ids = data.criterion_ids();
        let danp = self.danp.solve(&dematel.t, &data.subcriteria, &criterion_ids);
        let criterion_weights = danp.criterion_weights(&criterion_ids, &data.subcriteria);

        // ==========================================
        // 步骤3: 供应商评分与分配
        // ==========================================
        debug!("步骤3: 供应商评分与分配");
        let ranking = self.scorer.score(
            &data.ratings,
            &data.respondents,
            &danp.gw,
            &data.suppliers,
            &config.filters,
        );
        let allocation = self.allocator.optimize(
            &data.plants,
            &data.allocation_suppliers,
            &ranking,
            &config.allocation,
        );
        let allocation_kpis = compute_kpis(&allocation, &data.allocation_suppliers, &ranking);
        let shares = region_shares(&allocation);

        // ==========================================
        // 步骤4: 措施组合
        // ==========================================
        debug!("步骤4: 措施组合优化");
        let action_selection = self.actions.select(&mitigation.rows, &config.action_budget);
        let targets = if config.epsilon_targets.is_empty() {
            default_targets(&mitigation.rows)
        } else {
            config.epsilon_targets.clone()
        };
        let frontier = self
            .actions
            .frontier(&mitigation.rows, &config.action_budget, &targets);

        // ==========================================
        // 步骤5: 敏感性分析
        // ==========================================
        debug!("步骤5: 龙卷风分析");
        let tornado = self.sensitivity.tornado(
            &HorInputs {
                events: &data.events,
                agents: &data.agents,
                risk_matrix: &data.risk_matrix,
                effectiveness: &data.effectiveness,
                actions: &data.actions,
            },
            config.sensitivity_perturbation,
        );

        // ==========================================
        // 步骤6: 洞察
        // ==========================================
        let insights = auto_insights(&InsightInputs {
            stage1: &hor_stage1,
            mitigation: &mitigation,
            dematel: &dematel,
            danp: &danp,
            ranking: &ranking,
            allocation: &allocation,
        });

        info!(
            run_id = %run_id,
            agents = hor_stage1.arp.len(),
            actions = mitigation.rows.len(),
            suppliers = ranking.rows.len(),
            allocation_status = %allocation.status,
            selection_status = %action_selection.status,
            warnings = warnings.len(),
            "分析流程完成"
        );

        AnalysisReport {
            run_id,
            generated_at: Utc::now(),
            config: config.clone(),
            hor_stage1,
            mitigation,
            dematel,
            causal_positions,
            danp,
            criterion_weights,
            ranking,
            allocation,
            allocation_kpis,
            region_shares: shares,
            action_selection,
            frontier,
            tornado,
            insights,
            warnings,
        }
    }
}
