// ==========================================
// 供应商风险决策支持系统 - House of Risk 传播引擎
// ==========================================
// 职责: 两阶段风险传播
// - 阶段1: 加权风险矩阵 + 因子总风险潜值 (ARP)
// - 阶段2: 缓解措施总有效度 (TE) 与 有效度/难度比 (ETD)
// 红线: 任何输入为空均返回形状正确的空结果, 不报错
// ==========================================

use crate::domain::hor::{MitigationAction, RiskAgent, RiskEvent};
use crate::domain::matrix::{normalize_label, LabeledMatrix, LabeledSeries};
use crate::engine::alignment::{AlignmentWarning, MatrixAligner};
use nalgebra::DVector;
use serde::Serialize;

/// 难度下限, 防止除零
pub const DIFFICULTY_FLOOR: f64 = 1e-9;

// ==========================================
// 阶段1 输出
// ==========================================
#[derive(Debug, Clone, Default, Serialize)]
pub struct HorStage1Result {
    pub weighted: LabeledMatrix,              // 事件 × 因子, R × severity
    pub arp: LabeledSeries,                   // 因子 -> ARP (按因子主列表顺序)
    pub warnings: Vec<AlignmentWarning>,      // R 对齐告警
}

impl HorStage1Result {
    pub fn is_empty(&self) -> bool {
        self.arp.is_empty()
    }

    /// 事件对加权矩阵的贡献 (行和)
    pub fn event_contributions(&self) -> LabeledSeries {
        self.weighted.row_sums()
    }
}

// ==========================================
// 阶段2 输出
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionEffect {
    pub action_id: String,
    pub te: f64,            // 总有效度
    pub difficulty: f64,
    pub cost: f64,
    pub manhours: f64,
    pub etd: f64,           // TE / max(difficulty, ε)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MitigationDetail {
    pub rows: Vec<ActionEffect>,              // 按 ETD 降序
    pub warnings: Vec<AlignmentWarning>,      // E 对齐告警
}

impl MitigationDetail {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_te(&self) -> f64 {
        self.rows.iter().map(|r| r.te).sum()
    }

    pub fn get(&self, action_id: &str) -> Option<&ActionEffect> {
        self.rows.iter().find(|r| r.action_id == action_id)
    }
}

// ==========================================
// HorEngine - House of Risk 传播引擎
// ==========================================
pub struct HorEngine {
    aligner: MatrixAligner,
}

impl Default for HorEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HorEngine {
    pub fn new() -> Self {
        Self {
            aligner: MatrixAligner::new(),
        }
    }

    // ==========================================
    // 阶段1
    // ==========================================

    /// 计算加权风险矩阵与 ARP
    ///
    /// # 参数
    /// - `events`: 风险事件 (severity)
    /// - `agents`: 风险因子 (occurrence)
    /// - `risk_matrix`: R, 事件 × 因子 相关强度 {0,1,2,3}
    ///
    /// # 返回
    /// weighted[e,a] = R[e,a] × severity[e];
    /// ARP[a] = Σ_e weighted[e,a] × occurrence[a]
    pub fn stage1(
        &self,
        events: &[RiskEvent],
        agents: &[RiskAgent],
        risk_matrix: &LabeledMatrix,
    ) -> HorStage1Result {
        if events.is_empty() || agents.is_empty() || risk_matrix.is_empty() {
            tracing::debug!("HOR 阶段1 输入为空, 返回空结果");
            return HorStage1Result::default();
        }

        let (event_ids, severity) = first_values(events.iter().map(|e| (&e.event_id, e.severity)));
        let (agent_ids, occurrence) =
            first_values(agents.iter().map(|a| (&a.agent_id, a.occurrence)));

        let aligned = self.aligner.align(risk_matrix, &event_ids, &agent_ids, 0.0);
        let r = aligned.matrix.data();

        // 行缩放: 每个事件行乘以其严重度
        let mut weighted = r.clone();
        for (i, sev) in severity.iter().enumerate() {
            weighted.row_mut(i).scale_mut(*sev);
        }

        let arp_values: Vec<f64> = (0..agent_ids.len())
            .map(|j| weighted.column(j).sum() * occurrence[j])
            .collect();

        tracing::debug!(
            events = event_ids.len(),
            agents = agent_ids.len(),
            "HOR 阶段1 完成"
        );

        HorStage1Result {
            weighted: LabeledMatrix::new(event_ids, agent_ids.clone(), weighted)
                .unwrap_or_else(LabeledMatrix::empty),
            arp: LabeledSeries::new(agent_ids, arp_values),
            warnings: aligned.warnings,
        }
    }

    // ==========================================
    // 阶段2
    // ==========================================

    /// 计算措施总有效度
    ///
    /// # 参数
    /// - `effectiveness`: E, 措施 × 因子 有效度 [0,1] (方向颠倒时自动转置)
    /// - `arp`: 阶段1 的 ARP
    /// - `actions`: 措施主数据 (difficulty / cost / manhours)
    ///
    /// # 返回
    /// MitigationDetail (按 ETD 降序; 同值保持措施主列表顺序)
    pub fn stage2(
        &self,
        effectiveness: &LabeledMatrix,
        arp: &LabeledSeries,
        actions: &[MitigationAction],
    ) -> MitigationDetail {
        if effectiveness.is_empty() || arp.is_empty() || actions.is_empty() {
            tracing::debug!("HOR 阶段2 输入为空, 返回空结果");
            return MitigationDetail::default();
        }

        let mut seen = std::collections::HashSet::new();
        let actions: Vec<MitigationAction> = actions
            .iter()
            .filter_map(|a| {
                let id = normalize_label(&a.action_id);
                seen.insert(id.clone()).then(|| MitigationAction {
                    action_id: id,
                    ..a.clone()
                })
            })
            .collect();
        let action_ids: Vec<String> = actions.iter().map(|a| a.action_id.clone()).collect();

        let aligned = self
            .aligner
            .align(effectiveness, &action_ids, &arp.labels, 0.0);
        // 对齐后的列顺序与 arp.labels 去重后一致
        let arp_vec = DVector::from_iterator(
            aligned.matrix.ncols(),
            aligned
                .matrix
                .col_labels()
                .iter()
                .map(|l| arp.get(l).unwrap_or(0.0)),
        );
        let te = aligned.matrix.data() * arp_vec;

        let mut rows: Vec<ActionEffect> = actions
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let difficulty = if a.difficulty.is_finite() {
                    a.difficulty.max(DIFFICULTY_FLOOR)
                } else {
                    1.0
                };
                let te = te[i];
                ActionEffect {
                    action_id: a.action_id.clone(),
                    te,
                    difficulty,
                    cost: finite_or_zero(a.cost),
                    manhours: finite_or_zero(a.manhours),
                    etd: te / difficulty,
                }
            })
            .collect();

        rows.sort_by(|a, b| b.etd.total_cmp(&a.etd));

        tracing::debug!(actions = rows.len(), "HOR 阶段2 完成");

        MitigationDetail {
            rows,
            warnings: aligned.warnings,
        }
    }

    /// 两阶段串联
    pub fn run(
        &self,
        events: &[RiskEvent],
        agents: &[RiskAgent],
        risk_matrix: &LabeledMatrix,
        effectiveness: &LabeledMatrix,
        actions: &[MitigationAction],
    ) -> (HorStage1Result, MitigationDetail) {
        let s1 = self.stage1(events, agents, risk_matrix);
        let detail = self.stage2(effectiveness, &s1.arp, actions);
        (s1, detail)
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// 标识符去重 (首条保留), 返回 (id 列表, 对应数值)
fn first_values<'a, I>(items: I) -> (Vec<String>, Vec<f64>)
where
    I: Iterator<Item = (&'a String, f64)>,
{
    let mut seen = std::collections::HashSet::new();
    let mut ids = Vec::new();
    let mut values = Vec::new();
    for (id, v) in items {
        let id = normalize_label(id);
        if seen.insert(id.clone()) {
            ids.push(id);
            values.push(finite_or_zero(v));
        }
    }
    (ids, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn sample_stage1() -> HorStage1Result {
        let events = vec![
            RiskEvent::new("E1", 7.0),
            RiskEvent::new("E2", 5.0),
            RiskEvent::new("E3", 8.0),
        ];
        let agents = vec![
            RiskAgent::new("A1", 6.0),
            RiskAgent::new("A2", 7.0),
            RiskAgent::new("A3", 5.0),
        ];
        let r = LabeledMatrix::from_rows(
            labels(&["E1", "E2", "E3"]),
            labels(&["A1", "A2", "A3"]),
            &[vec![2.0, 1.0, 0.0], vec![1.0, 3.0, 2.0], vec![0.0, 2.0, 1.0]],
        );
        HorEngine::new().stage1(&events, &agents, &r)
    }

    #[test]
    fn test_stage1_weighted_and_arp() {
        let s1 = sample_stage1();
        // weighted[E2,A2] = 3 × 5
        assert_eq!(s1.weighted.get("E2", "A2"), Some(15.0));
        // ARP[A1] = (14 + 5 + 0) × 6
        assert_eq!(s1.arp.get("A1"), Some(114.0));
        // ARP[A2] = (7 + 15 + 16) × 7
        assert_eq!(s1.arp.get("A2"), Some(266.0));
        // ARP[A3] = (0 + 10 + 8) × 5
        assert_eq!(s1.arp.get("A3"), Some(90.0));
        assert_eq!(s1.arp.labels, labels(&["A1", "A2", "A3"]));
    }

    #[test]
    fn test_stage1_empty_inputs() {
        let engine = HorEngine::new();
        let s1 = engine.stage1(&[], &[RiskAgent::new("A1", 1.0)], &LabeledMatrix::empty());
        assert!(s1.is_empty());
        assert!(s1.weighted.is_empty());
    }

    #[test]
    fn test_stage2_te_and_etd() {
        let s1 = sample_stage1();
        // E 以 因子 × 措施 方向给出, 对齐时转置
        let e = LabeledMatrix::from_rows(
            labels(&["A1", "A2", "A3"]),
            labels(&["M1", "M2"]),
            &[vec![1.0, 0.0], vec![0.5, 0.0], vec![0.0, 1.0]],
        );
        let actions = vec![
            MitigationAction::new("M1", 2.0, 100.0, 10.0),
            MitigationAction::new("M2", 0.0, 50.0, 5.0),
        ];
        let detail = HorEngine::new().stage2(&e, &s1.arp, &actions);

        let m1 = detail.get("M1").unwrap();
        assert_eq!(m1.te, 114.0 + 133.0);
        assert_eq!(m1.etd, m1.te / 2.0);

        // 难度为 0 时使用下限
        let m2 = detail.get("M2").unwrap();
        assert_eq!(m2.te, 90.0);
        assert_eq!(m2.difficulty, DIFFICULTY_FLOOR);
        assert_eq!(detail.rows[0].action_id, "M2");
    }

    #[test]
    fn test_stage2_empty_effectiveness() {
        let s1 = sample_stage1();
        let detail = HorEngine::new().stage2(
            &LabeledMatrix::empty(),
            &s1.arp,
            &[MitigationAction::new("M1", 1.0, 0.0, 0.0)],
        );
        assert!(detail.is_empty());
    }
}
