// ==========================================
// 供应商风险决策支持系统 - 供应商评分引擎
// ==========================================
// 职责: 评分记录经 DANP 全局权重聚合为供应商综合得分并排名
// 输入: 评分 + 受访者权重 + 全局权重 gw + 供应商主数据 + 过滤条件
// 输出: 排名表 + 供应商 × 子准则 聚合矩阵
// ==========================================
// 规则:
// - 受访者权重归一化 (非有限或和 ≤ 0 时回退为等权)
// - 评分裁剪到 [1,5], 乘以受访者权重, 按 (供应商, 子准则) 求和后 / 5
// - 聚合矩阵列对齐到 gw (缺失列为 0), 得分 = Σ agg × gw
// 红线: 无可用评分时, 有主数据则每个供应商输出 0 分行, 否则为空表
// ==========================================

use crate::domain::matrix::{normalize_label, LabeledMatrix, LabeledSeries};
use crate::domain::network::{Respondent, Subcriterion};
use crate::domain::supplier::{Rating, RatingFilters, Supplier};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 评分上下限
const RATING_MIN: f64 = 1.0;
const RATING_MAX: f64 = 5.0;

// ==========================================
// 排名输出
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSupplier {
    pub rank: usize,             // 从 1 开始
    pub supplier_id: String,
    pub score: f64,
    pub region: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SupplierRanking {
    pub rows: Vec<RankedSupplier>,       // 按得分降序
    pub aggregated: LabeledMatrix,       // 供应商 × 子准则, [0,1]
}

impl SupplierRanking {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, supplier_id: &str) -> Option<&RankedSupplier> {
        self.rows.iter().find(|r| r.supplier_id == supplier_id)
    }

    pub fn score_of(&self, supplier_id: &str) -> Option<f64> {
        self.get(supplier_id).map(|r| r.score)
    }

    /// 得分序列 (按排名顺序)
    pub fn scores(&self) -> LabeledSeries {
        LabeledSeries::new(
            self.rows.iter().map(|r| r.supplier_id.clone()).collect(),
            self.rows.iter().map(|r| r.score).collect(),
        )
    }

    pub fn max_score(&self) -> Option<f64> {
        self.rows.iter().map(|r| r.score).reduce(f64::max)
    }

    /// 供应商在各子准则上的得分贡献 agg[s, sub] × gw[sub] (按 gw 顺序)
    ///
    /// 供应商不在聚合矩阵中时返回 None
    pub fn contributions_by_sub(&self, supplier_id: &str, gw: &LabeledSeries) -> Option<LabeledSeries> {
        let i = self.aggregated.row_index(supplier_id)?;
        let values = gw
            .iter()
            .map(|(sub, w)| {
                self.aggregated
                    .col_index(sub)
                    .map(|j| self.aggregated.at(i, j) * w)
                    .unwrap_or(0.0)
            })
            .collect();
        Some(LabeledSeries::new(gw.labels.clone(), values))
    }

    /// 子准则贡献按所属准则汇总 (按准则首次出现顺序)
    pub fn contributions_by_criterion(
        &self,
        supplier_id: &str,
        gw: &LabeledSeries,
        subcriteria: &[Subcriterion],
    ) -> Option<LabeledSeries> {
        let by_sub = self.contributions_by_sub(supplier_id, gw)?;
        let crit_of: HashMap<&str, &str> = subcriteria
            .iter()
            .map(|s| (s.sub_id.as_str(), s.criterion_id.as_str()))
            .collect();

        let mut labels: Vec<String> = Vec::new();
        let mut values: Vec<f64> = Vec::new();
        for (sub, v) in by_sub.iter() {
            let Some(crit) = crit_of.get(sub) else {
                continue;
            };
            match labels.iter().position(|l| l == crit) {
                Some(i) => values[i] += v,
                None => {
                    labels.push(crit.to_string());
                    values.push(v);
                }
            }
        }
        Some(LabeledSeries::new(labels, values))
    }
}

/// 评分时间趋势点
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub time_period: String,
    pub mean_rating: f64,
    pub count: usize,
}

// ==========================================
// SupplierScorer
// ==========================================
pub struct SupplierScorer {
    // 无状态引擎
}

impl Default for SupplierScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SupplierScorer {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算供应商综合得分与排名
    ///
    /// # 参数
    /// - `ratings`: 评分记录
    /// - `respondents`: 受访者 (权重)
    /// - `gw`: DANP 子准则全局权重
    /// - `suppliers`: 供应商主数据 (区域/名称, 以及空结果时的 0 分行)
    /// - `filters`: 等值过滤条件
    pub fn score(
        &self,
        ratings: &[Rating],
        respondents: &[Respondent],
        gw: &LabeledSeries,
        suppliers: &[Supplier],
        filters: &RatingFilters,
    ) -> SupplierRanking {
        if ratings.is_empty() || respondents.is_empty() || gw.is_empty() {
            tracing::debug!("评分输入为空, 输出 0 分排名");
            return zero_ranking(suppliers);
        }

        let weights = respondent_weights(respondents);
        let sub_pos: HashMap<&str, usize> = gw
            .labels
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_str(), i))
            .collect();

        // 供应商 -> 子准则位置 -> 加权评分和 (供应商按标识符排序)
        let mut sums: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut matched = 0usize;
        for r in ratings.iter().filter(|r| filters.matches(r)) {
            matched += 1;
            if !r.rating.is_finite() {
                continue;
            }
            let supplier = normalize_label(&r.supplier_id);
            let row = sums
                .entry(supplier)
                .or_insert_with(|| vec![0.0; gw.len()]);
            let w = weights
                .get(normalize_label(&r.respondent_id).as_str())
                .copied()
                .unwrap_or(0.0);
            if let Some(&j) = sub_pos.get(normalize_label(&r.sub_id).as_str()) {
                row[j] += r.rating.clamp(RATING_MIN, RATING_MAX) * w;
            }
        }

        if matched == 0 {
            tracing::debug!(filters = ?filters, "过滤后无评分, 输出 0 分排名");
            return zero_ranking(suppliers);
        }

        let supplier_ids: Vec<String> = sums.keys().cloned().collect();
        let agg = DMatrix::from_fn(supplier_ids.len(), gw.len(), |i, j| {
            sums[&supplier_ids[i]][j] / RATING_MAX
        });
        let gw_vec = nalgebra::DVector::from_column_slice(&gw.values);
        let scores = &agg * gw_vec;

        let mut scored: Vec<(String, f64)> = supplier_ids
            .iter()
            .cloned()
            .zip(scores.iter().copied())
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let aggregated = LabeledMatrix::new(supplier_ids, gw.labels.clone(), agg)
            .unwrap_or_else(LabeledMatrix::empty);

        tracing::debug!(suppliers = scored.len(), ratings = matched, "供应商评分完成");

        SupplierRanking {
            rows: attach_master(scored, suppliers),
            aggregated,
        }
    }
}

/// 受访者权重归一化 (标识符 -> 权重, 和为 1)
pub fn respondent_weights(respondents: &[Respondent]) -> HashMap<String, f64> {
    let mut ids: Vec<String> = Vec::new();
    let mut raw: Vec<f64> = Vec::new();
    for r in respondents {
        let id = normalize_label(&r.respondent_id);
        if !ids.contains(&id) {
            ids.push(id);
            raw.push(r.weight);
        }
    }

    let total: f64 = raw.iter().sum();
    if raw.iter().any(|w| !w.is_finite()) || total <= 0.0 || !total.is_finite() {
        tracing::warn!("受访者权重无效, 回退为等权");
        raw = vec![1.0; ids.len()];
    }
    let total: f64 = raw.iter().sum();
    ids.into_iter()
        .zip(raw)
        .map(|(id, w)| (id, w / total))
        .collect()
}

fn zero_ranking(suppliers: &[Supplier]) -> SupplierRanking {
    let mut seen = std::collections::HashSet::new();
    let scored = suppliers
        .iter()
        .map(|s| normalize_label(&s.supplier_id))
        .filter(|id| seen.insert(id.clone()))
        .map(|id| (id, 0.0))
        .collect();
    SupplierRanking {
        rows: attach_master(scored, suppliers),
        aggregated: LabeledMatrix::empty(),
    }
}

/// 左连接供应商主数据并编号
fn attach_master(scored: Vec<(String, f64)>, suppliers: &[Supplier]) -> Vec<RankedSupplier> {
    let mut master: HashMap<String, &Supplier> = HashMap::new();
    for s in suppliers {
        master.entry(normalize_label(&s.supplier_id)).or_insert(s);
    }
    scored
        .into_iter()
        .enumerate()
        .map(|(i, (supplier_id, score))| {
            let m = master.get(&supplier_id);
            RankedSupplier {
                rank: i + 1,
                region: m.map(|s| s.region.trim().to_string()).unwrap_or_default(),
                name: m.and_then(|s| s.name.clone()),
                supplier_id,
                score,
            }
        })
        .collect()
}

/// 单个供应商按时间段的平均评分 (时间段升序; 无时间段的评分忽略)
pub fn rating_trend(ratings: &[Rating], supplier_id: &str) -> Vec<TrendPoint> {
    let mut acc: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for r in ratings {
        if normalize_label(&r.supplier_id) != supplier_id || !r.rating.is_finite() {
            continue;
        }
        let Some(period) = r.time_period.as_deref().map(str::trim).filter(|p| !p.is_empty()) else {
            continue;
        };
        let e = acc.entry(period.to_string()).or_insert((0.0, 0));
        e.0 += r.rating;
        e.1 += 1;
    }
    acc.into_iter()
        .map(|(time_period, (sum, count))| TrendPoint {
            time_period,
            mean_rating: sum / count as f64,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn gw() -> LabeledSeries {
        LabeledSeries::new(
            vec!["S1".into(), "S2".into(), "S3".into()],
            vec![0.5, 0.3, 0.2],
        )
    }

    fn respondents() -> Vec<Respondent> {
        vec![Respondent::new("R1", 1.0), Respondent::new("R2", 3.0)]
    }

    fn suppliers() -> Vec<Supplier> {
        vec![
            Supplier::new("SUP1", "North"),
            Supplier::new("SUP2", "South"),
            Supplier::new("SUP3", "East"),
        ]
    }

    fn full_ratings(supplier: &str, value: f64) -> Vec<Rating> {
        let mut out = Vec::new();
        for sub in ["S1", "S2", "S3"] {
            for resp in ["R1", "R2"] {
                out.push(Rating::new(supplier, sub, resp, value));
            }
        }
        out
    }

    #[test]
    fn test_all_fives_score_one() {
        let mut ratings = full_ratings("SUP1", 5.0);
        ratings.extend(full_ratings("SUP2", 3.0));
        let ranking = SupplierScorer::new().score(
            &ratings,
            &respondents(),
            &gw(),
            &suppliers(),
            &RatingFilters::default(),
        );

        assert_eq!(ranking.rows.len(), 2);
        assert_eq!(ranking.rows[0].supplier_id, "SUP1");
        assert_eq!(ranking.rows[0].rank, 1);
        assert_eq!(ranking.rows[0].region, "North");
        assert_relative_eq!(ranking.rows[0].score, 1.0, epsilon = 1e-12);
        assert_relative_eq!(ranking.score_of("SUP2").unwrap(), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_respondent_weighting_and_clipping() {
        // R1 (0.25) 打 9 -> 裁剪为 5; R2 (0.75) 打 1
        let ratings = vec![
            Rating::new("SUP1", "S1", "R1", 9.0),
            Rating::new("SUP1", "S1", "R2", 1.0),
        ];
        let ranking = SupplierScorer::new().score(
            &ratings,
            &respondents(),
            &gw(),
            &suppliers(),
            &RatingFilters::default(),
        );
        let expected_agg = (5.0 * 0.25 + 1.0 * 0.75) / 5.0;
        assert_relative_eq!(ranking.aggregated.get("SUP1", "S1").unwrap(), expected_agg);
        assert_relative_eq!(ranking.rows[0].score, expected_agg * 0.5);
    }

    #[test]
    fn test_invalid_weights_fall_back_to_uniform() {
        let w = respondent_weights(&[Respondent::new("R1", 0.0), Respondent::new("R2", 0.0)]);
        assert_relative_eq!(w["R1"], 0.5);
        assert_relative_eq!(w["R2"], 0.5);
        let w = respondent_weights(&[Respondent::new("R1", f64::NAN), Respondent::new("R2", 2.0)]);
        assert_relative_eq!(w["R2"], 0.5);
    }

    #[test]
    fn test_filters_exhausted_gives_zero_rows() {
        let ratings = full_ratings("SUP1", 4.0);
        let filters = RatingFilters {
            plant_id: Some("P9".into()),
            ..Default::default()
        };
        let ranking =
            SupplierScorer::new().score(&ratings, &respondents(), &gw(), &suppliers(), &filters);
        assert_eq!(ranking.rows.len(), 3);
        assert!(ranking.rows.iter().all(|r| r.score == 0.0));
        assert!(ranking.aggregated.is_empty());

        let ranking = SupplierScorer::new().score(&ratings, &respondents(), &gw(), &[], &filters);
        assert!(ranking.is_empty());
    }

    #[test]
    fn test_contributions() {
        let ratings = full_ratings("SUP1", 5.0);
        let ranking = SupplierScorer::new().score(
            &ratings,
            &respondents(),
            &gw(),
            &suppliers(),
            &RatingFilters::default(),
        );
        let by_sub = ranking.contributions_by_sub("SUP1", &gw()).unwrap();
        assert_relative_eq!(by_sub.get("S2").unwrap(), 0.3, epsilon = 1e-12);

        let subs = vec![
            Subcriterion::new("S1", "C1"),
            Subcriterion::new("S2", "C1"),
            Subcriterion::new("S3", "C2"),
        ];
        let by_crit = ranking
            .contributions_by_criterion("SUP1", &gw(), &subs)
            .unwrap();
        assert_relative_eq!(by_crit.get("C1").unwrap(), 0.8, epsilon = 1e-12);
        assert_relative_eq!(by_crit.get("C2").unwrap(), 0.2, epsilon = 1e-12);
        assert!(ranking.contributions_by_sub("SUP9", &gw()).is_none());
    }

    #[test]
    fn test_rating_trend_by_period() {
        let mut a = Rating::new("SUP1", "S1", "R1", 4.0);
        a.time_period = Some("2024-Q2".into());
        let mut b = Rating::new("SUP1", "S2", "R1", 2.0);
        b.time_period = Some("2024-Q1".into());
        let mut c = Rating::new("SUP1", "S3", "R2", 3.0);
        c.time_period = Some("2024-Q1".into());
        let d = Rating::new("SUP1", "S3", "R2", 5.0);

        let trend = rating_trend(&[a, b, c, d], "SUP1");
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].time_period, "2024-Q1");
        assert_relative_eq!(trend[0].mean_rating, 2.5);
        assert_eq!(trend[1].count, 1);
    }
}
