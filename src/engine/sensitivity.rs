// ==========================================
// 供应商风险决策支持系统 - 敏感性分析 (龙卷风 / OAT)
// ==========================================
// 职责: 逐个扰动事件严重度与因子发生度, 观察总 TE 变化
// 输出: {parameter, base, new, delta} 按 delta 降序
// ==========================================

use crate::domain::hor::{MitigationAction, RiskAgent, RiskEvent};
use crate::domain::matrix::LabeledMatrix;
use crate::engine::hor::HorEngine;
use serde::Serialize;

/// 默认扰动比例
pub const DEFAULT_PERTURBATION: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TornadoRow {
    pub parameter: String,       // "severity:<id>" / "occurrence:<id>"
    pub base: f64,
    pub new: f64,
    pub delta: f64,              // |new - base|
}

/// 龙卷风分析所需的 HOR 输入
pub struct HorInputs<'a> {
    pub events: &'a [RiskEvent],
    pub agents: &'a [RiskAgent],
    pub risk_matrix: &'a LabeledMatrix,
    pub effectiveness: &'a LabeledMatrix,
    pub actions: &'a [MitigationAction],
}

impl HorInputs<'_> {
    fn is_empty(&self) -> bool {
        self.events.is_empty()
            || self.agents.is_empty()
            || self.risk_matrix.is_empty()
            || self.effectiveness.is_empty()
            || self.actions.is_empty()
    }
}

pub struct SensitivityAnalyzer {
    hor: HorEngine,
}

impl Default for SensitivityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SensitivityAnalyzer {
    pub fn new() -> Self {
        Self {
            hor: HorEngine::new(),
        }
    }

    fn total_te(&self, events: &[RiskEvent], agents: &[RiskAgent], inputs: &HorInputs) -> f64 {
        let (_, detail) = self.hor.run(
            events,
            agents,
            inputs.risk_matrix,
            inputs.effectiveness,
            inputs.actions,
        );
        detail.total_te()
    }

    /// 单因素扰动
    ///
    /// # 参数
    /// - `perturbation`: 扰动比例 p, 参数乘以 (1 + p)
    ///
    /// # 返回
    /// 任一输入为空时返回空表
    pub fn tornado(&self, inputs: &HorInputs, perturbation: f64) -> Vec<TornadoRow> {
        if inputs.is_empty() {
            return Vec::new();
        }
        let factor = 1.0 + perturbation;
        let base = self.total_te(inputs.events, inputs.agents, inputs);

        let mut rows = Vec::with_capacity(inputs.events.len() + inputs.agents.len());
        for (i, e) in inputs.events.iter().enumerate() {
            let mut events = inputs.events.to_vec();
            events[i].severity *= factor;
            let new = self.total_te(&events, inputs.agents, inputs);
            rows.push(row(format!("severity:{}", e.event_id.trim()), base, new));
        }
        for (i, a) in inputs.agents.iter().enumerate() {
            let mut agents = inputs.agents.to_vec();
            agents[i].occurrence *= factor;
            let new = self.total_te(inputs.events, &agents, inputs);
            rows.push(row(format!("occurrence:{}", a.agent_id.trim()), base, new));
        }

        rows.sort_by(|a, b| b.delta.total_cmp(&a.delta));
        tracing::debug!(parameters = rows.len(), base, perturbation, "龙卷风分析完成");
        rows
    }
}

fn row(parameter: String, base: f64, new: f64) -> TornadoRow {
    TornadoRow {
        parameter,
        base,
        new,
        delta: (new - base).abs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn labels(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tornado_ranks_by_delta() {
        let events = vec![RiskEvent::new("E1", 7.0), RiskEvent::new("E2", 5.0)];
        let agents = vec![RiskAgent::new("A1", 6.0), RiskAgent::new("A2", 2.0)];
        let r = LabeledMatrix::from_rows(
            labels(&["E1", "E2"]),
            labels(&["A1", "A2"]),
            &[vec![3.0, 0.0], vec![0.0, 1.0]],
        );
        let e = LabeledMatrix::from_rows(labels(&["M1"]), labels(&["A1", "A2"]), &[vec![1.0, 1.0]]);
        let actions = vec![MitigationAction::new("M1", 1.0, 10.0, 1.0)];
        let inputs = HorInputs {
            events: &events,
            agents: &agents,
            risk_matrix: &r,
            effectiveness: &e,
            actions: &actions,
        };

        let rows = SensitivityAnalyzer::new().tornado(&inputs, DEFAULT_PERTURBATION);
        assert_eq!(rows.len(), 4);

        // 基准 TE = 3·7·6 + 1·5·2 = 136
        assert_relative_eq!(rows[0].base, 136.0);
        // E1 与 A1 的扰动都使 TE 增加 12.6
        assert_relative_eq!(rows[0].delta, 12.6, epsilon = 1e-9);
        assert_relative_eq!(rows[1].delta, 12.6, epsilon = 1e-9);
        let mut top: Vec<&str> = rows[..2].iter().map(|r| r.parameter.as_str()).collect();
        top.sort();
        assert_eq!(top, vec!["occurrence:A1", "severity:E1"]);
        assert_relative_eq!(rows[3].delta, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_tornado_empty_inputs() {
        let inputs = HorInputs {
            events: &[],
            agents: &[],
            risk_matrix: &LabeledMatrix::empty(),
            effectiveness: &LabeledMatrix::empty(),
            actions: &[],
        };
        assert!(SensitivityAnalyzer::new().tornado(&inputs, 0.1).is_empty());
    }
}
