// ==========================================
// 供应商风险决策支持系统 - DANP 权重求解器
// ==========================================
// 职责: 由 DEMATEL 总关系矩阵 T 推导子准则全局权重
// 输入: T (子准则 × 子准则) + 准则 -> 子准则 分组
// 输出: T_alpha_c / W_un / Td / T_alpha_d / W_alpha / W_limit / gw
// ==========================================
// 步骤:
// 1. T 行归一化 (准则块内的行, 除以整行和; 行和为 0 时除数取 1)
// 2. 转置得未加权超矩阵 W_un
// 3. 准则层聚合 Td[a,b] = T 在 rows(a) × cols(b) 块上的均值
// 4. Td 行归一化 -> T_alpha_d
// 5. W_alpha = W_un 按 T_alpha_d[ci, cj] 缩放
// 6. W_alpha 列归一化
// 7. 极限超矩阵: M <- M² 反复平方 (最多 120 次, 变化 < 1e-12 提前停止)
// 8. gw = W_limit 行均值, 归一化为和 1
// 注: 120 次内未收敛时取最后一次迭代结果, 不视为错误
// ==========================================

use crate::domain::matrix::{normalize_label, unique_labels, LabeledMatrix, LabeledSeries};
use crate::domain::network::{group_by_criterion, Subcriterion};
use crate::engine::alignment::MatrixAligner;
use nalgebra::DMatrix;
use serde::Serialize;
use std::collections::HashMap;

/// 极限超矩阵最大平方次数
pub const MAX_LIMIT_ITERATIONS: usize = 120;
/// 收敛阈值 (逐元素最大绝对变化)
pub const LIMIT_TOLERANCE: f64 = 1e-12;

// ==========================================
// DanpResult
// ==========================================
#[derive(Debug, Clone, Default, Serialize)]
pub struct DanpResult {
    pub t_alpha_c: LabeledMatrix,
    pub w_un: LabeledMatrix,
    pub td: LabeledMatrix,
    pub t_alpha_d: LabeledMatrix,
    pub w_alpha: LabeledMatrix,
    pub w_limit: LabeledMatrix,
    pub gw: LabeledSeries,           // 子准则全局权重
    pub iterations: usize,           // 实际平方次数
    pub converged: bool,
}

impl DanpResult {
    pub fn is_empty(&self) -> bool {
        self.gw.is_empty()
    }

    /// 准则层权重 (子准则全局权重按准则求和, 按准则顺序)
    pub fn criterion_weights(
        &self,
        criteria: &[String],
        subcriteria: &[Subcriterion],
    ) -> LabeledSeries {
        let values = group_by_criterion(criteria, subcriteria)
            .iter()
            .map(|(_, members)| members.iter().filter_map(|s| self.gw.get(s)).sum())
            .collect();
        LabeledSeries::new(criteria.to_vec(), values)
    }
}

// ==========================================
// DanpSolver
// ==========================================
pub struct DanpSolver {
    aligner: MatrixAligner,
}

impl Default for DanpSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DanpSolver {
    pub fn new() -> Self {
        Self {
            aligner: MatrixAligner::new(),
        }
    }

    /// 求解 DANP 权重
    ///
    /// # 参数
    /// - `t`: DEMATEL 总关系矩阵
    /// - `subcriteria`: 子准则 (含所属准则, 决定矩阵行列顺序)
    /// - `criteria`: 准则标识符列表
    ///
    /// # 返回
    /// DanpResult; T / 子准则 / 准则 任一为空时返回全空结果
    pub fn solve<C: AsRef<str>>(
        &self,
        t: &LabeledMatrix,
        subcriteria: &[Subcriterion],
        criteria: &[C],
    ) -> DanpResult {
        if t.is_empty() || subcriteria.is_empty() || criteria.is_empty() {
            tracing::debug!("DANP 输入为空, 返回空结果");
            return DanpResult::default();
        }

        let crits = unique_labels(criteria);
        let mut seen = std::collections::HashSet::new();
        let subcriteria: Vec<Subcriterion> = subcriteria
            .iter()
            .map(|s| Subcriterion {
                sub_id: normalize_label(&s.sub_id),
                criterion_id: normalize_label(&s.criterion_id),
                ..s.clone()
            })
            .filter(|s| seen.insert(s.sub_id.clone()))
            .collect();
        let subs: Vec<String> = subcriteria.iter().map(|s| s.sub_id.clone()).collect();
        let n = subs.len();
        let k = crits.len();

        let pos: HashMap<&str, usize> =
            subs.iter().enumerate().map(|(i, s)| (s.as_str(), i)).collect();
        let crit_pos: HashMap<&str, usize> =
            crits.iter().enumerate().map(|(i, c)| (c.as_str(), i)).collect();
        // 每个准则包含的子准则位置
        let blocks: Vec<Vec<usize>> = group_by_criterion(&crits, &subcriteria)
            .into_iter()
            .map(|(_, members)| members.iter().filter_map(|s| pos.get(s).copied()).collect())
            .collect();

        let t = self.aligner.align(t, &subs, &subs, 0.0).matrix.into_data();

        // 1. T_alpha_c
        let mut t_alpha_c = t.clone();
        for &i in blocks.iter().flatten() {
            let row_sum = t.row(i).sum();
            let divisor = if row_sum == 0.0 { 1.0 } else { row_sum };
            t_alpha_c.row_mut(i).unscale_mut(divisor);
        }

        // 2. W_un
        let w_un = t_alpha_c.transpose();

        // 3. Td
        let td = DMatrix::from_fn(k, k, |a, b| block_mean(&t, &blocks[a], &blocks[b]));

        // 4. T_alpha_d
        let mut t_alpha_d = td.clone();
        for a in 0..k {
            let row_sum = td.row(a).sum();
            let divisor = if row_sum == 0.0 { 1.0 } else { row_sum };
            t_alpha_d.row_mut(a).unscale_mut(divisor);
        }

        // 5. W_alpha
        let mut w_alpha = w_un.clone();
        for (col, sub) in subcriteria.iter().enumerate() {
            let cj = match crit_pos.get(sub.criterion_id.as_str()) {
                Some(&cj) => cj,
                None => continue,
            };
            for (ci, rows) in blocks.iter().enumerate() {
                let factor = t_alpha_d[(ci, cj)];
                for &row in rows {
                    w_alpha[(row, col)] *= factor;
                }
            }
        }

        // 6. 列归一化 (和为 0 的列置 0)
        for j in 0..n {
            let col_sum = w_alpha.column(j).sum();
            if col_sum != 0.0 && col_sum.is_finite() {
                w_alpha.column_mut(j).unscale_mut(col_sum);
            } else {
                w_alpha.column_mut(j).fill(0.0);
            }
        }

        // 7. 极限超矩阵
        let (w_limit, iterations, converged) = limit_supermatrix(&w_alpha);
        if !converged {
            tracing::warn!(iterations, "极限超矩阵未在上限内收敛, 使用最后一次迭代");
        }

        // 8. 全局权重
        let labeled = |m: DMatrix<f64>, rows: &[String], cols: &[String]| {
            LabeledMatrix::new(rows.to_vec(), cols.to_vec(), m).unwrap_or_else(LabeledMatrix::empty)
        };
        let w_limit = labeled(w_limit, &subs, &subs);
        let mut gw = w_limit.row_means();
        let total = gw.sum();
        if total > 0.0 {
            gw.values.iter_mut().for_each(|v| *v /= total);
        }

        tracing::debug!(subs = n, criteria = k, iterations, converged, "DANP 完成");

        DanpResult {
            t_alpha_c: labeled(t_alpha_c, &subs, &subs),
            w_un: labeled(w_un, &subs, &subs),
            td: labeled(td, &crits, &crits),
            t_alpha_d: labeled(t_alpha_d, &crits, &crits),
            w_alpha: labeled(w_alpha, &subs, &subs),
            w_limit,
            gw,
            iterations,
            converged,
        }
    }
}

/// 块均值; 空块为 0
fn block_mean(t: &DMatrix<f64>, rows: &[usize], cols: &[usize]) -> f64 {
    if rows.is_empty() || cols.is_empty() {
        return 0.0;
    }
    let mut sum = 0.0;
    for &i in rows {
        for &j in cols {
            sum += t[(i, j)];
        }
    }
    sum / (rows.len() * cols.len()) as f64
}

/// 反复平方求极限矩阵
///
/// # 返回
/// (极限矩阵, 平方次数, 是否收敛)
pub fn limit_supermatrix(w: &DMatrix<f64>) -> (DMatrix<f64>, usize, bool) {
    let mut m = w.clone();
    for iteration in 1..=MAX_LIMIT_ITERATIONS {
        let m2 = &m * &m;
        let delta = (&m2 - &m).amax();
        m = m2;
        if delta < LIMIT_TOLERANCE {
            return (m, iteration, true);
        }
    }
    (m, MAX_LIMIT_ITERATIONS, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::network::{InfluenceEdge, Respondent};
    use crate::engine::dematel::DematelEngine;
    use approx::assert_relative_eq;

    fn network() -> (Vec<String>, Vec<Subcriterion>, LabeledMatrix) {
        let criteria = vec!["C1".to_string(), "C2".to_string()];
        let subcriteria = vec![
            Subcriterion::new("S1", "C1"),
            Subcriterion::new("S2", "C1"),
            Subcriterion::new("S3", "C2"),
            Subcriterion::new("S4", "C2"),
        ];
        let subs: Vec<String> = subcriteria.iter().map(|s| s.sub_id.clone()).collect();
        let mut edges = Vec::new();
        let scores = [
            [0.0, 3.0, 2.0, 1.0],
            [1.0, 0.0, 4.0, 2.0],
            [2.0, 1.0, 0.0, 3.0],
            [3.0, 2.0, 1.0, 0.0],
        ];
        for (i, from) in subs.iter().enumerate() {
            for (j, to) in subs.iter().enumerate() {
                if i != j {
                    edges.push(InfluenceEdge::new("R1", from, to, scores[i][j]));
                }
            }
        }
        let d = DematelEngine::new().build(&[Respondent::new("R1", 1.0)], &subs, &edges);
        (criteria, subcriteria, d.t)
    }

    #[test]
    fn test_global_weights_sum_to_one() {
        let (criteria, subcriteria, t) = network();
        let res = DanpSolver::new().solve(&t, &subcriteria, &criteria);

        assert_eq!(res.gw.len(), 4);
        assert!(res.gw.values.iter().all(|v| *v >= 0.0));
        assert_relative_eq!(res.gw.sum(), 1.0, epsilon = 1e-9);
        assert!(res.converged);
    }

    #[test]
    fn test_w_alpha_columns_are_stochastic() {
        let (criteria, subcriteria, t) = network();
        let res = DanpSolver::new().solve(&t, &subcriteria, &criteria);
        let w = res.w_alpha.data();
        for j in 0..w.ncols() {
            assert_relative_eq!(w.column(j).sum(), 1.0, epsilon = 1e-12);
        }
        // T_alpha_d 行和为 1
        let td = res.t_alpha_d.data();
        for a in 0..td.nrows() {
            assert_relative_eq!(td.row(a).sum(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_td_is_block_mean() {
        let (criteria, subcriteria, t) = network();
        let res = DanpSolver::new().solve(&t, &subcriteria, &criteria);
        let expected = (t.get("S1", "S3").unwrap()
            + t.get("S1", "S4").unwrap()
            + t.get("S2", "S3").unwrap()
            + t.get("S2", "S4").unwrap())
            / 4.0;
        assert_relative_eq!(res.td.get("C1", "C2").unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_criterion_weights_sum_to_one() {
        let (criteria, subcriteria, t) = network();
        let res = DanpSolver::new().solve(&t, &subcriteria, &criteria);
        let cw = res.criterion_weights(&criteria, &subcriteria);
        assert_relative_eq!(cw.sum(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_limit_of_permutation_reaches_identity() {
        // 置换矩阵平方后为 I, 再平方保持 I; 收敛在第 2 次
        let p = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]);
        let (m, iterations, converged) = limit_supermatrix(&p);
        assert!(converged);
        assert_eq!(iterations, 2);
        assert_eq!(m, DMatrix::identity(2, 2));
    }

    #[test]
    fn test_padded_sub_ids_collapse_to_one() {
        let subs = ["S1", "S2", "S3"];
        let edges = vec![
            InfluenceEdge::new("R1", "S1", "S2", 3.0),
            InfluenceEdge::new("R1", "S2", "S3", 2.0),
            InfluenceEdge::new("R1", "S3", "S1", 1.0),
            InfluenceEdge::new("R1", "S2", "S1", 1.0),
        ];
        let t = DematelEngine::new()
            .build(&[Respondent::new("R1", 1.0)], &subs, &edges)
            .t;
        let subcriteria = vec![
            Subcriterion::new("S1", "C1"),
            Subcriterion::new(" S1", "C1"),
            Subcriterion::new("\u{feff}S2", " C1"),
            Subcriterion::new("S3", "C2"),
        ];

        let res = DanpSolver::new().solve(&t, &subcriteria, &["C1", "C2"]);
        assert_eq!(res.gw.labels, vec!["S1", "S2", "S3"]);
        assert_relative_eq!(res.gw.sum(), 1.0, epsilon = 1e-9);
        assert_eq!(res.td.row_labels().to_vec(), vec!["C1", "C2"]);
    }

    #[test]
    fn test_empty_inputs() {
        let res = DanpSolver::new().solve(&LabeledMatrix::empty(), &[], &["C1"]);
        assert!(res.is_empty());
        assert!(res.w_limit.is_empty());
    }
}
