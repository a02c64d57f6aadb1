// ==========================================
// 供应商风险决策支持系统 - 带标签矩阵 / 序列
// ==========================================
// 职责: 以标识符 (而非位置下标) 为键的矩阵与序列值类型
// 存储: nalgebra::DMatrix<f64>
// ==========================================

use nalgebra::DMatrix;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

/// 标识符标准化: 去除 BOM + 首尾空白
pub fn normalize_label(raw: &str) -> String {
    raw.replace('\u{feff}', "").trim().to_string()
}

/// 去重并保持首次出现顺序
pub fn unique_labels<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(labels.len());
    for l in labels {
        let n = normalize_label(l.as_ref());
        if seen.insert(n.clone()) {
            out.push(n);
        }
    }
    out
}

// ==========================================
// LabeledMatrix - 带行/列标签的矩阵
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMatrix {
    rows: Vec<String>,
    cols: Vec<String>,
    data: DMatrix<f64>,
}

impl LabeledMatrix {
    /// 由标签与数据构造
    ///
    /// 数据维度与标签数量不一致时返回 None
    pub fn new(rows: Vec<String>, cols: Vec<String>, data: DMatrix<f64>) -> Option<Self> {
        if data.nrows() != rows.len() || data.ncols() != cols.len() {
            return None;
        }
        Some(Self { rows, cols, data })
    }

    /// 以常数填充构造
    pub fn filled(rows: Vec<String>, cols: Vec<String>, fill: f64) -> Self {
        let data = DMatrix::from_element(rows.len(), cols.len(), fill);
        Self { rows, cols, data }
    }

    /// 由行向量构造 (行长度不足的位置以 0 填充)
    pub fn from_rows(rows: Vec<String>, cols: Vec<String>, values: &[Vec<f64>]) -> Self {
        let data = DMatrix::from_fn(rows.len(), cols.len(), |i, j| {
            values
                .get(i)
                .and_then(|r| r.get(j))
                .copied()
                .unwrap_or(0.0)
        });
        Self { rows, cols, data }
    }

    /// 空矩阵
    pub fn empty() -> Self {
        Self::filled(Vec::new(), Vec::new(), 0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.cols.is_empty()
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.cols.len()
    }

    pub fn row_labels(&self) -> &[String] {
        &self.rows
    }

    pub fn col_labels(&self) -> &[String] {
        &self.cols
    }

    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    pub fn into_data(self) -> DMatrix<f64> {
        self.data
    }

    pub fn row_index(&self, label: &str) -> Option<usize> {
        self.rows.iter().position(|r| r == label)
    }

    pub fn col_index(&self, label: &str) -> Option<usize> {
        self.cols.iter().position(|c| c == label)
    }

    /// 按标签取值
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let i = self.row_index(row)?;
        let j = self.col_index(col)?;
        Some(self.data[(i, j)])
    }

    /// 按位置取值
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.data[(i, j)]
    }

    /// 按标签写值 (标签不存在时返回 false)
    pub fn set(&mut self, row: &str, col: &str, value: f64) -> bool {
        match (self.row_index(row), self.col_index(col)) {
            (Some(i), Some(j)) => {
                self.data[(i, j)] = value;
                true
            }
            _ => false,
        }
    }

    /// 以相同标签替换数据
    pub fn with_data(&self, data: DMatrix<f64>) -> Option<Self> {
        Self::new(self.rows.clone(), self.cols.clone(), data)
    }

    /// 转置 (行列标签互换)
    pub fn transpose(&self) -> Self {
        Self {
            rows: self.cols.clone(),
            cols: self.rows.clone(),
            data: self.data.transpose(),
        }
    }

    /// 行和序列 (按行标签)
    pub fn row_sums(&self) -> LabeledSeries {
        let values = (0..self.nrows()).map(|i| self.data.row(i).sum()).collect();
        LabeledSeries::new(self.rows.clone(), values)
    }

    /// 列和序列 (按列标签)
    pub fn col_sums(&self) -> LabeledSeries {
        let values = (0..self.ncols())
            .map(|j| self.data.column(j).sum())
            .collect();
        LabeledSeries::new(self.cols.clone(), values)
    }

    /// 行均值序列
    pub fn row_means(&self) -> LabeledSeries {
        let n = self.ncols();
        let values = (0..self.nrows())
            .map(|i| {
                if n == 0 {
                    0.0
                } else {
                    self.data.row(i).sum() / n as f64
                }
            })
            .collect();
        LabeledSeries::new(self.rows.clone(), values)
    }

    /// 导出为行向量
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.nrows())
            .map(|i| self.data.row(i).iter().copied().collect())
            .collect()
    }
}

impl Default for LabeledMatrix {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for LabeledMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("LabeledMatrix", 3)?;
        st.serialize_field("rows", &self.rows)?;
        st.serialize_field("cols", &self.cols)?;
        st.serialize_field("values", &self.to_rows())?;
        st.end()
    }
}

// ==========================================
// LabeledSeries - 带标签序列
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabeledSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl LabeledSeries {
    /// 构造 (values 长度不足时以 0 补齐, 多余部分截断)
    pub fn new(labels: Vec<String>, mut values: Vec<f64>) -> Self {
        values.resize(labels.len(), 0.0);
        Self { labels, values }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.values[i])
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// 标签 -> 值 映射
    pub fn to_map(&self) -> HashMap<String, f64> {
        self.iter().map(|(l, v)| (l.to_string(), v)).collect()
    }

    /// 按值降序排列的 (标签, 值) 列表, 同值保持原顺序
    pub fn sorted_desc(&self) -> Vec<(String, f64)> {
        let mut pairs: Vec<(String, f64)> = self.iter().map(|(l, v)| (l.to_string(), v)).collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
        pairs
    }

    /// 逐元素相减 (按 self 的标签顺序, 缺失按 0)
    pub fn minus(&self, other: &LabeledSeries) -> LabeledSeries {
        let values = self
            .iter()
            .map(|(l, v)| v - other.get(l).unwrap_or(0.0))
            .collect();
        LabeledSeries::new(self.labels.clone(), values)
    }

    /// 逐元素相加 (按 self 的标签顺序, 缺失按 0)
    pub fn plus(&self, other: &LabeledSeries) -> LabeledSeries {
        let values = self
            .iter()
            .map(|(l, v)| v + other.get(l).unwrap_or(0.0))
            .collect();
        LabeledSeries::new(self.labels.clone(), values)
    }
}
