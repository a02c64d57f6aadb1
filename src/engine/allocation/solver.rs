use crate::config::analysis_profile::AllocationParams;
use crate::domain::matrix::normalize_label;
use crate::domain::supplier::{AllocationSupplier, Plant};
use crate::domain::types::SolverStatus;
use crate::engine::lp::status_of;
use crate::engine::supplier_scorer::SupplierRanking;
use good_lp::{
    constraint, microlp, variable, Constraint, Expression, ProblemVariables, Solution,
    SolverModel, Variable,
};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

/// 小于该值的分配量视为 0
pub const QUANTITY_TOLERANCE: f64 = 1e-6;

// ==========================================
// 分配结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationRow {
    pub supplier_id: String,
    pub plant_id: String,
    pub quantity: f64,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationResult {
    pub status: SolverStatus,
    pub rows: Vec<AllocationRow>,        // 按 (plant_id, supplier_id) 排序
    pub objective: Option<f64>,
}

impl AllocationResult {
    fn unsolved(status: SolverStatus) -> Self {
        Self {
            status,
            rows: Vec::new(),
            objective: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_quantity(&self) -> f64 {
        self.rows.iter().map(|r| r.quantity).sum()
    }

    /// 某工厂收到的总量
    pub fn plant_quantity(&self, plant_id: &str) -> f64 {
        self.rows
            .iter()
            .filter(|r| r.plant_id == plant_id)
            .map(|r| r.quantity)
            .sum()
    }

    /// 某供应商供出的总量
    pub fn supplier_quantity(&self, supplier_id: &str) -> f64 {
        self.rows
            .iter()
            .filter(|r| r.supplier_id == supplier_id)
            .map(|r| r.quantity)
            .sum()
    }
}

impl Default for AllocationResult {
    fn default() -> Self {
        Self::unsolved(SolverStatus::NotSolved)
    }
}

/// 参与建模的供应商 (已解析区域/质量/有效产能)
struct Candidate {
    supplier_id: String,
    region: String,
    qn: f64,
    unit_cost: f64,
    emission: f64,
    capacity: f64,
}

impl Candidate {
    fn coefficient(&self, params: &AllocationParams) -> f64 {
        let bonus = if params.preferred_regions.iter().any(|r| r.trim() == self.region) {
            1.0
        } else {
            0.0
        };
        params.qwt * self.qn + params.rwt * bonus
            - params.cwt * self.unit_cost
            - params.ewt * self.emission
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}

// ==========================================
// AllocationOptimizer - 供应分配优化引擎
// ==========================================
pub struct AllocationOptimizer {
    // 无状态引擎
}

impl Default for AllocationOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationOptimizer {
    pub fn new() -> Self {
        Self {}
    }

    /// 求解分配
    ///
    /// # 参数
    /// - `plants`: 工厂需求
    /// - `suppliers`: 供应经济参数 (产能/单位成本/排放)
    /// - `ranking`: 供应商评分排名 (提供质量分与区域); 可为空
    /// - `params`: 目标权重与可选约束
    ///
    /// # 返回
    /// AllocationResult; 空输入或总需求 ≤ 0 时为 NOT_SOLVED 空结果
    pub fn optimize(
        &self,
        plants: &[Plant],
        suppliers: &[AllocationSupplier],
        ranking: &SupplierRanking,
        params: &AllocationParams,
    ) -> AllocationResult {
        let plants = dedup_plants(plants);
        if plants.is_empty() || suppliers.is_empty() {
            debug!("分配输入为空, 跳过求解");
            return AllocationResult::unsolved(SolverStatus::NotSolved);
        }
        let total_demand: f64 = plants.iter().map(|(_, d)| d).sum();
        if total_demand <= 0.0 {
            debug!(total_demand, "总需求 ≤ 0, 跳过求解");
            return AllocationResult::unsolved(SolverStatus::NotSolved);
        }

        let candidates = build_candidates(suppliers, ranking, params);

        if params.allow_oversupply {
            return self.solve_model(&plants, &candidates, params, false);
        }
        let capped = self.solve_model(&plants, &candidates, params, true);
        if capped.status != SolverStatus::Infeasible {
            return capped;
        }
        // 需求上限与下限约束冲突时, 去掉上限重解
        warn!("按需求封顶的分配模型不可行, 放开需求上限重新求解");
        self.solve_model(&plants, &candidates, params, false)
    }

    /// 构建并求解分配模型
    ///
    /// # 参数
    /// - `cap_demand`: 是否附加 Σ_s x[s,p] ≤ demand[p]
    fn solve_model(
        &self,
        plants: &[(String, f64)],
        candidates: &[Candidate],
        params: &AllocationParams,
        cap_demand: bool,
    ) -> AllocationResult {
        let total_demand: f64 = plants.iter().map(|(_, d)| d).sum();

        // ===== 变量 =====
        let mut vars = ProblemVariables::new();
        let x: Vec<Vec<Variable>> = candidates
            .iter()
            .map(|_| plants.iter().map(|_| vars.add(variable().min(0.0))).collect())
            .collect();

        // ===== 目标 =====
        let mut objective = Expression::default();
        let coefficients: Vec<f64> = candidates.iter().map(|c| c.coefficient(params)).collect();
        for (si, coef) in coefficients.iter().enumerate() {
            for &var in &x[si] {
                objective += *coef * var;
            }
        }

        // ===== 约束 =====
        let mut constraints: Vec<Constraint> = Vec::new();

        // 需求
        for (pj, (_, demand)) in plants.iter().enumerate() {
            let demand = *demand;
            let received: Expression = x.iter().map(|row| row[pj]).sum();
            if cap_demand {
                let cap = received.clone();
                constraints.push(constraint!(cap <= demand));
            }
            constraints.push(constraint!(received >= demand));
        }

        // 产能 (排除/低质量供应商产能为 0)
        for (si, c) in candidates.iter().enumerate() {
            let capacity = c.capacity;
            let supplied: Expression = x[si].iter().copied().sum();
            constraints.push(constraint!(supplied <= capacity));
        }

        // 全局份额上限
        if params.max_share_supplier < 1.0 {
            let limit = params.max_share_supplier * total_demand;
            for row in &x {
                let supplied: Expression = row.iter().copied().sum();
                constraints.push(constraint!(supplied <= limit));
            }
        }

        // 单工厂份额上限
        if params.max_share_per_plant_supplier < 1.0 {
            for row in &x {
                for (pj, (_, demand)) in plants.iter().enumerate() {
                    let limit = params.max_share_per_plant_supplier * demand;
                    let cell = row[pj];
                    constraints.push(constraint!(cell <= limit));
                }
            }
        }

        // 单供应商最低总量
        if params.min_total_supplier > 0.0 {
            let floor = params.min_total_supplier;
            for row in &x {
                let supplied: Expression = row.iter().copied().sum();
                constraints.push(constraint!(supplied >= floor));
            }
        }

        // 区域份额
        let regions: BTreeSet<&str> = candidates.iter().map(|c| c.region.as_str()).collect();
        for region in regions {
            let members: Vec<usize> = (0..candidates.len())
                .filter(|&si| candidates[si].region == region)
                .collect();
            let region_total = || -> Expression {
                members
                    .iter()
                    .flat_map(|&si| x[si].iter().copied())
                    .sum()
            };
            if let Some(&share) = params.region_min_shares.get(region) {
                if share > 0.0 {
                    let floor = share * total_demand;
                    let total = region_total();
                    constraints.push(constraint!(total >= floor));
                }
            }
            if let Some(&share) = params.region_max_shares.get(region) {
                if share < 1.0 {
                    let limit = share * total_demand;
                    let total = region_total();
                    constraints.push(constraint!(total <= limit));
                }
            }
        }

        // 总排放上限
        if let Some(max_emission) = params.max_total_emission {
            let mut emission = Expression::default();
            for (si, c) in candidates.iter().enumerate() {
                for &var in &x[si] {
                    emission += c.emission * var;
                }
            }
            constraints.push(constraint!(emission <= max_emission));
        }

        debug!(
            suppliers = candidates.len(),
            plants = plants.len(),
            constraints = constraints.len(),
            "分配模型构建完成"
        );

        // ===== 求解 =====
        let mut model = vars.maximise(objective).using(microlp);
        for c in constraints {
            model = model.with(c);
        }
        let solution = match model.solve() {
            Ok(solution) => solution,
            Err(err) => {
                let status = status_of(&err);
                warn!(status = %status, error = %err, "分配模型求解失败");
                return AllocationResult::unsolved(status);
            }
        };

        let mut rows = Vec::new();
        let mut objective_value = 0.0;
        for (si, c) in candidates.iter().enumerate() {
            for (pj, (plant_id, _)) in plants.iter().enumerate() {
                let q = solution.value(x[si][pj]);
                objective_value += coefficients[si] * q;
                if q > QUANTITY_TOLERANCE {
                    rows.push(AllocationRow {
                        supplier_id: c.supplier_id.clone(),
                        plant_id: plant_id.clone(),
                        quantity: q,
                        region: c.region.clone(),
                    });
                }
            }
        }
        rows.sort_by(|a, b| {
            a.plant_id
                .cmp(&b.plant_id)
                .then_with(|| a.supplier_id.cmp(&b.supplier_id))
        });

        debug!(rows = rows.len(), objective = objective_value, "分配求解完成");

        AllocationResult {
            status: SolverStatus::Optimal,
            rows,
            objective: Some(objective_value),
        }
    }
}

/// 工厂去重 (首条保留), 需求非有限/负数按 0
fn dedup_plants(plants: &[Plant]) -> Vec<(String, f64)> {
    let mut seen = HashSet::new();
    plants
        .iter()
        .filter_map(|p| {
            let id = normalize_label(&p.plant_id);
            seen.insert(id.clone()).then(|| (id, non_negative(p.demand)))
        })
        .collect()
}

/// 解析质量分/区域, 并按排除名单与质量下限将产能置 0
fn build_candidates(
    suppliers: &[AllocationSupplier],
    ranking: &SupplierRanking,
    params: &AllocationParams,
) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let unique: Vec<&AllocationSupplier> = suppliers
        .iter()
        .filter(|s| seen.insert(normalize_label(&s.supplier_id)))
        .collect();

    let scores: Vec<f64> = unique
        .iter()
        .map(|s| {
            let id = normalize_label(&s.supplier_id);
            ranking
                .score_of(&id)
                .or(s.quality_score)
                .filter(|v| v.is_finite())
                .unwrap_or(0.0)
        })
        .collect();
    let max_score = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let max_score = if max_score > 0.0 { max_score } else { 1.0 };

    let excluded: HashSet<String> = params
        .excluded_suppliers
        .iter()
        .map(|s| normalize_label(s))
        .collect();

    unique
        .into_iter()
        .zip(scores)
        .map(|(s, score)| {
            let supplier_id = normalize_label(&s.supplier_id);
            let region = s
                .region
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .or_else(|| ranking.get(&supplier_id).map(|r| r.region.clone()))
                .unwrap_or_default();
            let qn = score / max_score;
            let mut capacity = non_negative(s.capacity);
            if excluded.contains(&supplier_id) || qn < params.min_quality_norm {
                debug!(supplier_id = %supplier_id, qn, "供应商被排除或低于质量下限, 产能置 0");
                capacity = 0.0;
            }
            Candidate {
                supplier_id,
                region,
                qn,
                unit_cost: non_negative(s.unit_cost),
                emission: non_negative(s.emission_score),
                capacity,
            }
        })
        .collect()
}
