// ==========================================
// 供应商风险决策支持系统 - 矩阵对齐引擎
// ==========================================
// 职责: 将矩阵的行/列标签对齐到两份主数据标识符列表
// 输入: 原始矩阵 + 行主列表 + 列主列表 + 填充值
// 输出: 行标签 == 行主列表, 列标签 == 列主列表 (同序) 的矩阵
// ==========================================
// 方向检测: 比较标签交集大小, 行标签更像列主列表 (且列标签更像
// 行主列表) 时先转置. 持平时不转置, 但非零持平会产生歧义告警.
// ==========================================

use crate::domain::matrix::{normalize_label, unique_labels, LabeledMatrix};
use nalgebra::DMatrix;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

// ==========================================
// 对齐告警
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Axis {
    Rows,
    Cols,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlignmentWarning {
    /// 行/列与两份主列表的命中数相同且非零, 方向无法确定 (按不转置处理)
    AmbiguousOrientation {
        row_hits_row_master: usize,
        row_hits_col_master: usize,
        col_hits_col_master: usize,
        col_hits_row_master: usize,
    },
    /// 某一轴的标签与两份主列表均无交集, 该轴数据全部丢失
    DisjointLabels { axis: Axis },
}

// ==========================================
// AlignmentOutcome - 对齐结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct AlignmentOutcome {
    pub matrix: LabeledMatrix,
    pub transposed: bool,             // 是否执行了自动转置
    pub missing_rows: Vec<String>,    // 主列表中有、输入中无 (已填充)
    pub missing_cols: Vec<String>,
    pub dropped_rows: Vec<String>,    // 输入中有、主列表中无 (已丢弃)
    pub dropped_cols: Vec<String>,
    pub warnings: Vec<AlignmentWarning>,
}

impl AlignmentOutcome {
    /// 无告警且无填充/丢弃
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
            && self.missing_rows.is_empty()
            && self.missing_cols.is_empty()
            && self.dropped_rows.is_empty()
            && self.dropped_cols.is_empty()
    }
}

fn hits(labels: &[String], master: &HashSet<&str>) -> usize {
    labels
        .iter()
        .filter(|l| master.contains(l.as_str()))
        .collect::<HashSet<_>>()
        .len()
}

/// 标签 -> 首次出现位置
fn first_positions(labels: &[String]) -> HashMap<&str, usize> {
    let mut map = HashMap::with_capacity(labels.len());
    for (i, l) in labels.iter().enumerate() {
        map.entry(l.as_str()).or_insert(i);
    }
    map
}

// ==========================================
// MatrixAligner - 矩阵对齐引擎
// ==========================================
pub struct MatrixAligner {
    // 无状态引擎
}

impl Default for MatrixAligner {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixAligner {
    pub fn new() -> Self {
        Self {}
    }

    /// 对齐矩阵到主列表
    ///
    /// # 参数
    /// - `matrix`: 原始矩阵 (标签可能含空白/BOM, 方向可能颠倒)
    /// - `row_master`: 行主列表 (输出行顺序)
    /// - `col_master`: 列主列表 (输出列顺序)
    /// - `fill`: 缺失单元格填充值
    ///
    /// # 返回
    /// AlignmentOutcome (始终给出结果, 歧义只告警不纠正)
    pub fn align<R: AsRef<str>, C: AsRef<str>>(
        &self,
        matrix: &LabeledMatrix,
        row_master: &[R],
        col_master: &[C],
        fill: f64,
    ) -> AlignmentOutcome {
        let row_master = unique_labels(row_master);
        let col_master = unique_labels(col_master);

        let mut rows: Vec<String> = matrix.row_labels().iter().map(|l| normalize_label(l)).collect();
        let mut cols: Vec<String> = matrix.col_labels().iter().map(|l| normalize_label(l)).collect();
        let mut data = matrix.data().clone();

        // 1. 方向检测
        let row_set: HashSet<&str> = row_master.iter().map(String::as_str).collect();
        let col_set: HashSet<&str> = col_master.iter().map(String::as_str).collect();

        let rr = hits(&rows, &row_set);
        let rc = hits(&rows, &col_set);
        let cc = hits(&cols, &col_set);
        let cr = hits(&cols, &row_set);

        let mut warnings = Vec::new();
        let transposed = rc > rr && cr > cc;
        if transposed {
            tracing::debug!(rr, rc, cc, cr, "矩阵方向颠倒, 自动转置");
            std::mem::swap(&mut rows, &mut cols);
            data = data.transpose();
        } else if row_set != col_set && ((rr == rc && rr > 0) || (cc == cr && cc > 0)) {
            tracing::warn!(rr, rc, cc, cr, "矩阵方向检测持平, 按不转置处理");
            warnings.push(AlignmentWarning::AmbiguousOrientation {
                row_hits_row_master: rr,
                row_hits_col_master: rc,
                col_hits_col_master: cc,
                col_hits_row_master: cr,
            });
        }

        // 2. 交集为空的轴 (输入非空时) 视为有损
        if !rows.is_empty() && !row_master.is_empty() && rr.max(rc) == 0 {
            tracing::warn!("矩阵行标签与主列表无交集");
            warnings.push(AlignmentWarning::DisjointLabels { axis: Axis::Rows });
        }
        if !cols.is_empty() && !col_master.is_empty() && cc.max(cr) == 0 {
            tracing::warn!("矩阵列标签与主列表无交集");
            warnings.push(AlignmentWarning::DisjointLabels { axis: Axis::Cols });
        }

        // 3. 重建: 缺失补 fill, 多余丢弃, 按主列表排序
        let row_pos = first_positions(&rows);
        let col_pos = first_positions(&cols);

        let aligned = DMatrix::from_fn(row_master.len(), col_master.len(), |i, j| {
            match (
                row_pos.get(row_master[i].as_str()),
                col_pos.get(col_master[j].as_str()),
            ) {
                (Some(&si), Some(&sj)) => {
                    let v = data[(si, sj)];
                    if v.is_finite() {
                        v
                    } else {
                        fill
                    }
                }
                _ => fill,
            }
        });

        let missing_rows = row_master
            .iter()
            .filter(|l| !row_pos.contains_key(l.as_str()))
            .cloned()
            .collect();
        let missing_cols = col_master
            .iter()
            .filter(|l| !col_pos.contains_key(l.as_str()))
            .cloned()
            .collect();
        let dropped_rows = unique_labels(&rows)
            .into_iter()
            .filter(|l| !row_set.contains(l.as_str()))
            .collect();
        let dropped_cols = unique_labels(&cols)
            .into_iter()
            .filter(|l| !col_set.contains(l.as_str()))
            .collect();

        let matrix = LabeledMatrix::new(row_master, col_master, aligned)
            .unwrap_or_else(LabeledMatrix::empty);

        AlignmentOutcome {
            matrix,
            transposed,
            missing_rows,
            missing_cols,
            dropped_rows,
            dropped_cols,
            warnings,
        }
    }
}
