use crate::domain::supplier::RatingFilters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 分配优化参数
///
/// 存储位置：config_kv（scope_id='global'，key='allocation/*'）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationParams {
    /// 质量权重
    pub qwt: f64,

    /// 单位成本权重
    pub cwt: f64,

    /// 偏好区域奖励权重
    pub rwt: f64,

    /// 排放惩罚权重
    pub ewt: f64,

    /// 偏好区域
    pub preferred_regions: Vec<String>,

    /// 单供应商占总需求的上限比例（<1 时生效）
    pub max_share_supplier: f64,

    /// 单供应商占单工厂需求的上限比例（<1 时生效）
    pub max_share_per_plant_supplier: f64,

    /// 单供应商最低总供应量（>0 时生效）
    pub min_total_supplier: f64,

    /// 排除的供应商（产能置 0）
    pub excluded_suppliers: Vec<String>,

    /// 归一化质量下限（低于则产能置 0）
    pub min_quality_norm: f64,

    /// 区域最低份额（占总需求比例，>0 时生效）
    pub region_min_shares: BTreeMap<String, f64>,

    /// 区域最高份额（占总需求比例，<1 时生效）
    pub region_max_shares: BTreeMap<String, f64>,

    /// 总排放上限
    pub max_total_emission: Option<f64>,

    /// 是否允许超出需求供货（false 时每个工厂的供应量不超过其需求）
    pub allow_oversupply: bool,
}

impl Default for AllocationParams {
    fn default() -> Self {
        Self {
            qwt: 1.0,
            cwt: 0.0,
            rwt: 0.0,
            ewt: 0.0,
            preferred_regions: Vec::new(),
            max_share_supplier: 1.0,
            max_share_per_plant_supplier: 1.0,
            min_total_supplier: 0.0,
            excluded_suppliers: Vec::new(),
            min_quality_norm: 0.0,
            region_min_shares: BTreeMap::new(),
            region_max_shares: BTreeMap::new(),
            max_total_emission: None,
            allow_oversupply: false,
        }
    }
}

/// 缓解措施选择的预算与目标权重
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionBudget {
    /// 成本预算；未设置时取全部措施总成本的 60%
    pub budget_cost: Option<f64>,

    /// 工时预算；未设置时取全部措施总工时的 60%
    pub budget_manhours: Option<f64>,

    pub w_te: f64,
    pub w_cost: f64,
    pub w_manhours: f64,
}

/// 未配置预算时占总量的比例
pub const DEFAULT_BUDGET_RATIO: f64 = 0.6;

impl ActionBudget {
    /// 解析实际预算 (成本, 工时)
    pub fn resolve(&self, total_cost: f64, total_manhours: f64) -> (f64, f64) {
        (
            self.budget_cost.unwrap_or(total_cost * DEFAULT_BUDGET_RATIO),
            self.budget_manhours
                .unwrap_or(total_manhours * DEFAULT_BUDGET_RATIO),
        )
    }
}

impl Default for ActionBudget {
    fn default() -> Self {
        Self {
            budget_cost: None,
            budget_manhours: None,
            w_te: 1.0,
            w_cost: 0.1,
            w_manhours: 0.1,
        }
    }
}

/// 一次分析运行的完整参数快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub filters: RatingFilters,
    pub allocation: AllocationParams,
    pub action_budget: ActionBudget,

    /// ε-约束前沿的 TE 目标；为空时在总 TE 的 20%..95% 之间等距生成 10 个
    pub epsilon_targets: Vec<f64>,

    /// 龙卷风分析扰动比例
    pub sensitivity_perturbation: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            filters: RatingFilters::default(),
            allocation: AllocationParams::default(),
            action_budget: ActionBudget::default(),
            epsilon_targets: Vec::new(),
            sensitivity_perturbation: 0.1,
        }
    }
}
