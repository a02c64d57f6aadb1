// ==========================================
// 供应商风险决策支持系统 - 引擎层
// ==========================================
// 职责: 实现分析与优化引擎, 不访问数据库
// 红线: 引擎不修改输入; 空输入返回空结果, 不 panic
// ==========================================

pub mod action_optimizer;
pub mod alignment;
pub mod allocation;
pub mod danp;
pub mod dematel;
pub mod hor;
pub mod insights;
pub mod lp;
pub mod orchestrator;
pub mod scenario;
pub mod sensitivity;
pub mod supplier_scorer;
pub mod what_if;

// 重导出核心引擎
pub use action_optimizer::{default_targets, ActionOptimizer, ActionSelection, FrontierRow};
pub use alignment::{AlignmentOutcome, AlignmentWarning, Axis, MatrixAligner};
pub use allocation::{
    compute_kpis, region_shares, AllocationKpis, AllocationOptimizer, AllocationResult,
    AllocationRow, RegionShare,
};
pub use danp::{limit_supermatrix, DanpResult, DanpSolver};
pub use dematel::{CausalPosition, DematelEngine, DematelResult};
pub use hor::{ActionEffect, HorEngine, HorStage1Result, MitigationDetail};
pub use insights::{auto_insights, Insight, InsightInputs, InsightItem, InsightSection};
pub use orchestrator::{AnalysisPipeline, AnalysisReport};
pub use scenario::{ScenarioSimulator, ScenarioState, SimulationOutcome, WhatIf};
pub use sensitivity::{HorInputs, SensitivityAnalyzer, TornadoRow};
pub use supplier_scorer::{
    rating_trend, respondent_weights, RankedSupplier, SupplierRanking, SupplierScorer, TrendPoint,
};
pub use what_if::{compare_rankings, tweak_weights, RankingDelta};
