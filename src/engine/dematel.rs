// ==========================================
// 供应商风险决策支持系统 - DEMATEL 引擎
// ==========================================
// 职责: 由受访者加权的子准则两两影响评分构建总关系矩阵
// 输入: 受访者权重 + 子准则全集 + 影响边
// 输出: A / X / (I-X) / (I-X)^-1 / T, 影响度 r, 被影响度 c, alpha
// ==========================================
// 规则:
// - A[i,j] = Σ score×weight / Σ weight (i≠j, 无边为 0)
// - alpha = 1 / max(最大行和, 最大列和), 最大值为 0 时 alpha = 1
// - T = X (I - X)^-1, 奇异时改用 Moore-Penrose 伪逆
// ==========================================

use crate::domain::matrix::{normalize_label, unique_labels, LabeledMatrix, LabeledSeries};
use crate::domain::network::{InfluenceEdge, Respondent};
use crate::domain::types::CausalRole;
use nalgebra::DMatrix;
use serde::Serialize;
use std::collections::HashMap;

/// 伪逆奇异值截断阈值
const PINV_EPS: f64 = 1e-12;

// ==========================================
// DematelResult - DEMATEL 输出
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct DematelResult {
    pub a: LabeledMatrix,                 // 平均影响矩阵
    pub x: LabeledMatrix,                 // 归一化矩阵
    pub i_minus_x: LabeledMatrix,         // I - X
    pub i_minus_x_inv: LabeledMatrix,     // (I - X)^-1
    pub t: LabeledMatrix,                 // 总关系矩阵
    pub r: LabeledSeries,                 // 行和: 施加的影响
    pub c: LabeledSeries,                 // 列和: 接受的影响
    pub alpha: f64,
    pub used_pseudo_inverse: bool,        // (I - X) 奇异, 使用了伪逆
}

impl Default for DematelResult {
    fn default() -> Self {
        Self {
            a: LabeledMatrix::empty(),
            x: LabeledMatrix::empty(),
            i_minus_x: LabeledMatrix::empty(),
            i_minus_x_inv: LabeledMatrix::empty(),
            t: LabeledMatrix::empty(),
            r: LabeledSeries::empty(),
            c: LabeledSeries::empty(),
            alpha: 1.0,
            used_pseudo_inverse: false,
        }
    }
}

/// 子准则因果定位
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CausalPosition {
    pub sub_id: String,
    pub prominence: f64, // r + c
    pub relation: f64,   // r - c
    pub role: CausalRole,
}

impl DematelResult {
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// 关系度 r - c (正为净原因, 负为净结果)
    pub fn relation(&self) -> LabeledSeries {
        self.r.minus(&self.c)
    }

    /// 中心度 r + c
    pub fn prominence(&self) -> LabeledSeries {
        self.r.plus(&self.c)
    }

    /// 各子准则的因果定位 (按子准则顺序)
    pub fn causal_positions(&self) -> Vec<CausalPosition> {
        let relation = self.relation();
        let prominence = self.prominence();
        relation
            .iter()
            .zip(prominence.values.iter())
            .map(|((sub, rel), prom)| CausalPosition {
                sub_id: sub.to_string(),
                prominence: *prom,
                relation: rel,
                role: CausalRole::from_relation(rel),
            })
            .collect()
    }
}

// ==========================================
// DematelEngine
// ==========================================
pub struct DematelEngine {
    // 无状态引擎
}

impl Default for DematelEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DematelEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// 构建 DEMATEL 矩阵
    ///
    /// # 参数
    /// - `respondents`: 受访者 (权重)
    /// - `sub_ids`: 子准则全集 (矩阵行列顺序)
    /// - `edges`: 影响边; 自影响、未知子准则、未知受访者的边被丢弃
    ///
    /// # 返回
    /// DematelResult; 任一输入为空时返回全空结果 (alpha = 1)
    pub fn build<S: AsRef<str>>(
        &self,
        respondents: &[Respondent],
        sub_ids: &[S],
        edges: &[InfluenceEdge],
    ) -> DematelResult {
        if respondents.is_empty() || sub_ids.is_empty() || edges.is_empty() {
            tracing::debug!("DEMATEL 输入为空, 返回空结果");
            return DematelResult::default();
        }

        let subs = unique_labels(sub_ids);
        let n = subs.len();
        let index: HashMap<&str, usize> =
            subs.iter().enumerate().map(|(i, s)| (s.as_str(), i)).collect();

        let mut weight_of: HashMap<String, f64> = HashMap::new();
        for r in respondents {
            weight_of
                .entry(normalize_label(&r.respondent_id))
                .or_insert(r.weight);
        }

        // 1. 平均影响矩阵 A
        let mut sum = DMatrix::<f64>::zeros(n, n);
        let mut cnt = DMatrix::<f64>::zeros(n, n);
        let mut skipped = 0usize;

        for e in edges {
            let from = normalize_label(&e.from_sub);
            let to = normalize_label(&e.to_sub);
            let (i, j) = match (index.get(from.as_str()), index.get(to.as_str())) {
                (Some(&i), Some(&j)) if i != j => (i, j),
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            let w = match weight_of.get(&normalize_label(&e.respondent_id)) {
                Some(&w) if w.is_finite() && w > 0.0 => w,
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            if !e.score.is_finite() {
                skipped += 1;
                continue;
            }
            let score = e.score.clamp(0.0, 4.0);
            sum[(i, j)] += score * w;
            cnt[(i, j)] += w;
        }
        if skipped > 0 {
            tracing::debug!(skipped, "DEMATEL 丢弃无效影响边");
        }

        let a = DMatrix::from_fn(n, n, |i, j| {
            if cnt[(i, j)] > 0.0 {
                sum[(i, j)] / cnt[(i, j)]
            } else {
                0.0
            }
        });

        // 2. 归一化
        let max_row = (0..n).map(|i| a.row(i).sum()).fold(0.0_f64, f64::max);
        let max_col = (0..n).map(|j| a.column(j).sum()).fold(0.0_f64, f64::max);
        let max_val = max_row.max(max_col);
        let alpha = if max_val > 0.0 { 1.0 / max_val } else { 1.0 };
        let x = &a * alpha;

        // 3. 总关系矩阵
        let identity = DMatrix::<f64>::identity(n, n);
        let i_minus_x = &identity - &x;
        let (inv, used_pseudo_inverse) = invert_or_pinv(&i_minus_x);
        let t = &x * &inv;

        let label = |m: DMatrix<f64>| {
            LabeledMatrix::new(subs.clone(), subs.clone(), m).unwrap_or_else(LabeledMatrix::empty)
        };
        let t = label(t);
        let r = t.row_sums();
        let c = t.col_sums();

        tracing::debug!(subs = n, alpha, used_pseudo_inverse, "DEMATEL 完成");

        DematelResult {
            a: label(a),
            x: label(x),
            i_minus_x: label(i_minus_x),
            i_minus_x_inv: label(inv),
            t,
            r,
            c,
            alpha,
            used_pseudo_inverse,
        }
    }
}

/// 求逆; 奇异 (或结果非有限) 时回退到伪逆
fn invert_or_pinv(m: &DMatrix<f64>) -> (DMatrix<f64>, bool) {
    if let Some(inv) = m.clone().try_inverse() {
        if inv.iter().all(|v| v.is_finite()) {
            return (inv, false);
        }
    }
    tracing::warn!("(I - X) 奇异, 使用伪逆");
    let (r, c) = m.shape();
    let pinv = m
        .clone()
        .pseudo_inverse(PINV_EPS)
        .unwrap_or_else(|_| DMatrix::zeros(c, r));
    (pinv, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn subs() -> Vec<String> {
        vec!["S1".into(), "S2".into(), "S3".into()]
    }

    fn sample() -> DematelResult {
        let respondents = vec![Respondent::new("R1", 1.0), Respondent::new("R2", 3.0)];
        let edges = vec![
            InfluenceEdge::new("R1", "S1", "S2", 4.0),
            InfluenceEdge::new("R2", "S1", "S2", 0.0),
            InfluenceEdge::new("R1", "S2", "S3", 2.0),
            InfluenceEdge::new("R2", "S3", "S1", 3.0),
            InfluenceEdge::new("R1", "S1", "S1", 4.0), // 自影响, 丢弃
            InfluenceEdge::new("RX", "S2", "S1", 4.0), // 未知受访者, 丢弃
        ];
        DematelEngine::new().build(&respondents, &subs(), &edges)
    }

    #[test]
    fn test_weighted_average_matrix() {
        let d = sample();
        // (4×1 + 0×3) / (1 + 3)
        assert_relative_eq!(d.a.get("S1", "S2").unwrap(), 1.0);
        assert_relative_eq!(d.a.get("S2", "S3").unwrap(), 2.0);
        assert_relative_eq!(d.a.get("S3", "S1").unwrap(), 3.0);
        assert_eq!(d.a.get("S1", "S1"), Some(0.0));
        assert_eq!(d.a.get("S2", "S1"), Some(0.0));
        // 最大行和 = 3, 最大列和 = 3
        assert_relative_eq!(d.alpha, 1.0 / 3.0);
        assert!(!d.used_pseudo_inverse);
    }

    #[test]
    fn test_total_relation_round_trip() {
        let d = sample();
        let n = 3;
        let t = d.t.data();
        let identity = DMatrix::<f64>::identity(n, n);
        let recovered = t * (&identity + t).try_inverse().unwrap();
        let x = d.x.data();
        for i in 0..n {
            for j in 0..n {
                assert_relative_eq!(recovered[(i, j)], x[(i, j)], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_r_c_are_row_and_column_sums() {
        let d = sample();
        let t = d.t.data();
        for i in 0..3 {
            assert_relative_eq!(d.r.values[i], t.row(i).sum(), epsilon = 1e-12);
            assert_relative_eq!(d.c.values[i], t.column(i).sum(), epsilon = 1e-12);
        }
        let rel_sum: f64 = d.relation().values.iter().sum();
        assert_relative_eq!(rel_sum, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_singular_uses_pseudo_inverse() {
        // 两节点互相满分影响: X = [[0,1],[1,0]], I - X 奇异
        let respondents = vec![Respondent::new("R1", 1.0)];
        let edges = vec![
            InfluenceEdge::new("R1", "S1", "S2", 4.0),
            InfluenceEdge::new("R1", "S2", "S1", 4.0),
        ];
        let d = DematelEngine::new().build(&respondents, &["S1", "S2"], &edges);
        assert!(d.used_pseudo_inverse);
        assert!(d.t.data().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_empty_inputs() {
        let d = DematelEngine::new().build(&[], &subs(), &[]);
        assert!(d.is_empty());
        assert_eq!(d.alpha, 1.0);
        assert!(d.r.is_empty());
    }
}
