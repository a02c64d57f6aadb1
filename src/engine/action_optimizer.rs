// ==========================================
// 供应商风险决策支持系统 - 缓解措施组合优化
// ==========================================
// 职责: 在成本/工时预算下选择缓解措施组合
// - 加权和选择: max w_te·TE − w_cost·Cost − w_mh·MH
// - ε-约束前沿: 对每个 TE 目标 min Cost s.t. TE ≥ 目标
// 决策变量: 每个措施一个二元变量
// 红线: 不可行以状态返回, 选择为空、合计为 0
// ==========================================

use crate::config::analysis_profile::ActionBudget;
use crate::domain::types::SolverStatus;
use crate::engine::hor::ActionEffect;
use crate::engine::lp::{is_selected, status_of};
use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, Solution, SolverModel, Variable,
};
use serde::Serialize;

/// 自动生成前沿目标的数量
pub const DEFAULT_TARGET_COUNT: usize = 10;

// ==========================================
// 输出
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionSelection {
    pub status: SolverStatus,
    pub selected: Vec<ActionEffect>,
    pub total_te: f64,
    pub total_cost: f64,
    pub total_manhours: f64,
}

impl ActionSelection {
    fn empty(status: SolverStatus) -> Self {
        Self {
            status,
            selected: Vec::new(),
            total_te: 0.0,
            total_cost: 0.0,
            total_manhours: 0.0,
        }
    }

    pub fn action_ids(&self) -> Vec<&str> {
        self.selected.iter().map(|a| a.action_id.as_str()).collect()
    }
}

/// ε-约束前沿行
///
/// 不可行行保留 te = 0, cost/manhours 为 None
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontierRow {
    pub target_te: f64,
    pub status: SolverStatus,
    pub te: f64,
    pub cost: Option<f64>,
    pub manhours: Option<f64>,
    pub actions: Vec<String>,
}

/// 措施数值清洗 (非有限按 0)
#[derive(Clone, Copy)]
struct Coeffs {
    te: f64,
    cost: f64,
    manhours: f64,
}

fn coeffs(a: &ActionEffect) -> Coeffs {
    let f = |v: f64| if v.is_finite() { v } else { 0.0 };
    Coeffs {
        te: f(a.te),
        cost: f(a.cost),
        manhours: f(a.manhours),
    }
}

// ==========================================
// ActionOptimizer
// ==========================================
pub struct ActionOptimizer {
    // 无状态引擎
}

impl Default for ActionOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionOptimizer {
    pub fn new() -> Self {
        Self {}
    }

    /// 加权和选择
    ///
    /// # 参数
    /// - `actions`: 阶段2 的措施有效度表
    /// - `budget`: 预算 (未配置时取总量的 60%) 与目标权重
    pub fn select(&self, actions: &[ActionEffect], budget: &ActionBudget) -> ActionSelection {
        if actions.is_empty() {
            return ActionSelection::empty(SolverStatus::NotSolved);
        }
        let c: Vec<Coeffs> = actions.iter().map(coeffs).collect();
        let (budget_cost, budget_mh) = resolve_budget(&c, budget);

        let mut vars = ProblemVariables::new();
        let x: Vec<Variable> = c.iter().map(|_| vars.add(variable().binary())).collect();
        let (te, cost, mh) = linear_totals(&c, &x);

        let objective = budget.w_te * te - budget.w_cost * cost.clone() - budget.w_manhours * mh.clone();
        let model = vars
            .maximise(objective)
            .using(microlp)
            .with(constraint!(cost <= budget_cost))
            .with(constraint!(mh <= budget_mh));

        match model.solve() {
            Ok(solution) => {
                let selected: Vec<ActionEffect> = actions
                    .iter()
                    .zip(&x)
                    .filter(|(_, var)| is_selected(solution.value(**var)))
                    .map(|(a, _)| a.clone())
                    .collect();
                let picked: Vec<Coeffs> = selected.iter().map(coeffs).collect();
                tracing::debug!(selected = selected.len(), budget_cost, budget_mh, "措施选择完成");
                ActionSelection {
                    status: SolverStatus::Optimal,
                    total_te: picked.iter().map(|c| c.te).sum(),
                    total_cost: picked.iter().map(|c| c.cost).sum(),
                    total_manhours: picked.iter().map(|c| c.manhours).sum(),
                    selected,
                }
            }
            Err(err) => {
                let status = status_of(&err);
                tracing::warn!(status = %status, error = %err, "措施选择不可行");
                ActionSelection::empty(status)
            }
        }
    }

    /// ε-约束前沿
    ///
    /// # 参数
    /// - `targets`: TE 目标列表
    ///
    /// # 返回
    /// 可行行按成本升序在前, 不可行行按目标顺序在后
    pub fn frontier(
        &self,
        actions: &[ActionEffect],
        budget: &ActionBudget,
        targets: &[f64],
    ) -> Vec<FrontierRow> {
        if actions.is_empty() {
            return Vec::new();
        }
        let c: Vec<Coeffs> = actions.iter().map(coeffs).collect();
        let (budget_cost, budget_mh) = resolve_budget(&c, budget);

        let rows: Vec<FrontierRow> = targets
            .iter()
            .map(|&target| self.solve_target(actions, &c, target, budget_cost, budget_mh))
            .collect();

        let (mut feasible, infeasible): (Vec<FrontierRow>, Vec<FrontierRow>) =
            rows.into_iter().partition(|r| r.status.is_solved());
        feasible.sort_by(|a, b| {
            a.cost
                .unwrap_or(f64::INFINITY)
                .total_cmp(&b.cost.unwrap_or(f64::INFINITY))
        });
        feasible.extend(infeasible);
        feasible
    }

    fn solve_target(
        &self,
        actions: &[ActionEffect],
        c: &[Coeffs],
        target: f64,
        budget_cost: f64,
        budget_mh: f64,
    ) -> FrontierRow {
        let mut vars = ProblemVariables::new();
        let x: Vec<Variable> = c.iter().map(|_| vars.add(variable().binary())).collect();
        let (te, cost, mh) = linear_totals(c, &x);

        let model = vars
            .minimise(cost.clone())
            .using(microlp)
            .with(constraint!(te >= target))
            .with(constraint!(mh <= budget_mh))
            .with(constraint!(cost <= budget_cost));

        match model.solve() {
            Ok(solution) => {
                let mut row = FrontierRow {
                    target_te: target,
                    status: SolverStatus::Optimal,
                    te: 0.0,
                    cost: Some(0.0),
                    manhours: Some(0.0),
                    actions: Vec::new(),
                };
                for ((a, k), &var) in actions.iter().zip(c).zip(&x) {
                    if is_selected(solution.value(var)) {
                        row.te += k.te;
                        row.cost = row.cost.map(|v| v + k.cost);
                        row.manhours = row.manhours.map(|v| v + k.manhours);
                        row.actions.push(a.action_id.clone());
                    }
                }
                row
            }
            Err(err) => {
                let status = status_of(&err);
                tracing::debug!(target, status = %status, "前沿目标不可达");
                FrontierRow {
                    target_te: target,
                    status,
                    te: 0.0,
                    cost: None,
                    manhours: None,
                    actions: Vec::new(),
                }
            }
        }
    }
}

fn resolve_budget(c: &[Coeffs], budget: &ActionBudget) -> (f64, f64) {
    let total_cost: f64 = c.iter().map(|k| k.cost).sum();
    let total_mh: f64 = c.iter().map(|k| k.manhours).sum();
    budget.resolve(total_cost, total_mh)
}

fn linear_totals(c: &[Coeffs], x: &[Variable]) -> (Expression, Expression, Expression) {
    let mut te = Expression::default();
    let mut cost = Expression::default();
    let mut mh = Expression::default();
    for (k, &var) in c.iter().zip(x) {
        te += k.te * var;
        cost += k.cost * var;
        mh += k.manhours * var;
    }
    (te, cost, mh)
}

/// 默认 TE 目标: 在总 TE 的 20% 到 95% 之间等距取 10 个
pub fn default_targets(actions: &[ActionEffect]) -> Vec<f64> {
    let total: f64 = actions.iter().map(|a| coeffs(a).te).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    let lo = total * 0.2;
    let hi = total * 0.95;
    let step = (hi - lo) / (DEFAULT_TARGET_COUNT - 1) as f64;
    (0..DEFAULT_TARGET_COUNT).map(|i| lo + step * i as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn effect(id: &str, te: f64, cost: f64, manhours: f64) -> ActionEffect {
        ActionEffect {
            action_id: id.to_string(),
            te,
            difficulty: 1.0,
            cost,
            manhours,
            etd: te,
        }
    }

    fn actions() -> Vec<ActionEffect> {
        vec![
            effect("M1", 300.0, 100.0, 40.0),
            effect("M2", 250.0, 150.0, 60.0),
            effect("M3", 120.0, 80.0, 35.0),
        ]
    }

    fn budget(cost: f64, mh: f64) -> ActionBudget {
        ActionBudget {
            budget_cost: Some(cost),
            budget_manhours: Some(mh),
            w_te: 1.0,
            w_cost: 0.0,
            w_manhours: 0.0,
        }
    }

    #[test]
    fn test_select_respects_budgets() {
        let sel = ActionOptimizer::new().select(&actions(), &budget(200.0, 100.0));
        assert_eq!(sel.status, SolverStatus::Optimal);
        assert!(sel.total_cost <= 200.0 + 1e-9);
        assert!(sel.total_manhours <= 100.0 + 1e-9);
        // M1 + M3: TE 420, cost 180, MH 75
        assert_eq!(sel.action_ids(), vec!["M1", "M3"]);
        assert_relative_eq!(sel.total_te, 420.0);
    }

    #[test]
    fn test_select_default_budget_is_share_of_totals() {
        // 预算 = 0.6 × 330 = 198 / 0.6 × 135 = 81
        let b = ActionBudget {
            w_cost: 0.0,
            w_manhours: 0.0,
            ..Default::default()
        };
        let sel = ActionOptimizer::new().select(&actions(), &b);
        assert!(sel.total_cost <= 198.0 + 1e-9);
        assert!(sel.total_manhours <= 81.0 + 1e-9);
        assert_relative_eq!(sel.total_te, 420.0);
    }

    #[test]
    fn test_select_infeasible_budget() {
        let sel = ActionOptimizer::new().select(&actions(), &budget(-1.0, 100.0));
        assert_eq!(sel.status, SolverStatus::Infeasible);
        assert!(sel.selected.is_empty());
        assert_eq!(sel.total_cost, 0.0);
    }

    #[test]
    fn test_frontier_monotone_and_ordered() {
        let targets = [550.0, 100.0, 300.0, 10_000.0, 420.0];
        let rows = ActionOptimizer::new().frontier(&actions(), &budget(1000.0, 1000.0), &targets);
        assert_eq!(rows.len(), targets.len());

        let feasible: Vec<&FrontierRow> = rows.iter().filter(|r| r.status.is_solved()).collect();
        assert_eq!(feasible.len(), 4);
        for pair in feasible.windows(2) {
            assert!(pair[0].cost.unwrap() <= pair[1].cost.unwrap());
            assert!(pair[0].target_te <= pair[1].target_te);
        }
        for r in &feasible {
            assert!(r.te >= r.target_te - 1e-9);
        }
        // 目标 100 的最低成本方案是 M3
        assert_eq!(feasible[0].actions, vec!["M3".to_string()]);

        let last = rows.last().unwrap();
        assert_eq!(last.status, SolverStatus::Infeasible);
        assert_eq!(last.te, 0.0);
        assert_eq!(last.cost, None);
    }

    #[test]
    fn test_frontier_equal_cost_keeps_target_order() {
        // 三个目标都由 M3 (成本 80) 满足
        let targets = [50.0, 110.0, 80.0];
        let rows = ActionOptimizer::new().frontier(&actions(), &budget(1000.0, 1000.0), &targets);

        assert!(rows.iter().all(|r| r.status.is_solved()));
        assert!(rows.iter().all(|r| r.cost == Some(80.0)));
        let order: Vec<f64> = rows.iter().map(|r| r.target_te).collect();
        assert_eq!(order, vec![50.0, 110.0, 80.0]);
    }

    #[test]
    fn test_default_targets() {
        let t = default_targets(&actions());
        assert_eq!(t.len(), DEFAULT_TARGET_COUNT);
        assert_relative_eq!(t[0], 670.0 * 0.2);
        assert_relative_eq!(t[9], 670.0 * 0.95, epsilon = 1e-9);
        assert!(default_targets(&[]).is_empty());
    }

    #[test]
    fn test_empty_actions() {
        let opt = ActionOptimizer::new();
        assert_eq!(
            opt.select(&[], &ActionBudget::default()).status,
            SolverStatus::NotSolved
        );
        assert!(opt.frontier(&[], &ActionBudget::default(), &[1.0]).is_empty());
    }
}
