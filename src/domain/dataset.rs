// ==========================================
// 供应商风险决策支持系统 - 输入数据集
// ==========================================
// 职责: 汇总全部输入表; 提供引用完整性修复 (sanitize)
// 规则:
// - 主键去重 (首条保留)
// - 数值截断到合法区间
// - 无效 子准则->准则 引用重映射到第一个准则
// - 悬空外键的影响边 / 评分记录直接过滤
// ==========================================

use crate::domain::hor::{MitigationAction, RiskAgent, RiskEvent};
use crate::domain::matrix::{normalize_label, LabeledMatrix};
use crate::domain::network::{Criterion, InfluenceEdge, Respondent, Subcriterion};
use crate::domain::supplier::{AllocationSupplier, Plant, Rating, Supplier};
use serde::Serialize;
use std::collections::HashSet;

// ==========================================
// Dataset - 全部输入表
// ==========================================
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dataset {
    // ===== House of Risk =====
    pub events: Vec<RiskEvent>,
    pub agents: Vec<RiskAgent>,
    pub risk_matrix: LabeledMatrix,       // R: 事件 × 因子 (可能方向颠倒, 由对齐处理)
    pub actions: Vec<MitigationAction>,
    pub effectiveness: LabeledMatrix,     // E: 措施 × 因子 (可能方向颠倒)

    // ===== 评价网络 =====
    pub respondents: Vec<Respondent>,
    pub criteria: Vec<Criterion>,
    pub subcriteria: Vec<Subcriterion>,
    pub edges: Vec<InfluenceEdge>,

    // ===== 供应商 =====
    pub suppliers: Vec<Supplier>,
    pub ratings: Vec<Rating>,
    pub plants: Vec<Plant>,
    pub allocation_suppliers: Vec<AllocationSupplier>,
}

// ==========================================
// SanitizeReport - 修复日志
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SanitizeLevel {
    Ok,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanitizeEntry {
    pub table: String,
    pub level: SanitizeLevel,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SanitizeReport {
    pub entries: Vec<SanitizeEntry>,
}

impl SanitizeReport {
    fn push(&mut self, table: &str, level: SanitizeLevel, message: String) {
        if level == SanitizeLevel::Warn {
            tracing::warn!(table = table, "{}", message);
        } else {
            tracing::debug!(table = table, "{}", message);
        }
        self.entries.push(SanitizeEntry {
            table: table.to_string(),
            level,
            message,
        });
    }

    pub fn warnings(&self) -> impl Iterator<Item = &SanitizeEntry> {
        self.entries.iter().filter(|e| e.level == SanitizeLevel::Warn)
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }
}

/// 截断到区间; 非有限值取下界
fn clamp_finite(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        lo
    }
}

/// 按主键去重 (首条保留), 返回丢弃数量
fn dedup_by_key<T, F>(items: &mut Vec<T>, key: F) -> usize
where
    F: Fn(&T) -> String,
{
    let before = items.len();
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(key(item)));
    before - items.len()
}

impl Dataset {
    // ==========================================
    // 引用完整性修复
    // ==========================================

    /// 就地修复数据集并返回修复日志
    pub fn sanitize(&mut self) -> SanitizeReport {
        let mut report = SanitizeReport::default();

        self.trim_identifiers();
        self.dedup_primary_keys(&mut report);
        self.clamp_values(&mut report);
        self.repair_criterion_refs(&mut report);
        self.filter_dangling_edges(&mut report);
        self.filter_dangling_ratings(&mut report);

        report
    }

    /// 标识符去空白 / BOM
    fn trim_identifiers(&mut self) {
        for e in &mut self.events {
            e.event_id = normalize_label(&e.event_id);
        }
        for a in &mut self.agents {
            a.agent_id = normalize_label(&a.agent_id);
        }
        for a in &mut self.actions {
            a.action_id = normalize_label(&a.action_id);
        }
        for r in &mut self.respondents {
            r.respondent_id = normalize_label(&r.respondent_id);
        }
        for c in &mut self.criteria {
            c.criterion_id = normalize_label(&c.criterion_id);
        }
        for s in &mut self.subcriteria {
            s.sub_id = normalize_label(&s.sub_id);
            s.criterion_id = normalize_label(&s.criterion_id);
        }
        for e in &mut self.edges {
            e.respondent_id = normalize_label(&e.respondent_id);
            e.from_sub = normalize_label(&e.from_sub);
            e.to_sub = normalize_label(&e.to_sub);
        }
        for s in &mut self.suppliers {
            s.supplier_id = normalize_label(&s.supplier_id);
            s.region = s.region.trim().to_string();
        }
        for r in &mut self.ratings {
            r.supplier_id = normalize_label(&r.supplier_id);
            r.sub_id = normalize_label(&r.sub_id);
            r.respondent_id = normalize_label(&r.respondent_id);
            for dim in [&mut r.plant_id, &mut r.time_period, &mut r.cheese_type] {
                if let Some(v) = dim.as_mut() {
                    *v = v.trim().to_string();
                }
            }
        }
        for p in &mut self.plants {
            p.plant_id = normalize_label(&p.plant_id);
        }
        for s in &mut self.allocation_suppliers {
            s.supplier_id = normalize_label(&s.supplier_id);
        }
    }

    fn dedup_primary_keys(&mut self, report: &mut SanitizeReport) {
        let mut note = |table: &str, key: &str, dropped: usize| {
            if dropped > 0 {
                report.push(
                    table,
                    SanitizeLevel::Warn,
                    format!("dropped {} duplicate {}", dropped, key),
                );
            }
        };
        note("hor_events", "event_id", dedup_by_key(&mut self.events, |e| e.event_id.clone()));
        note("hor_agents", "agent_id", dedup_by_key(&mut self.agents, |a| a.agent_id.clone()));
        note("hor_actions", "action_id", dedup_by_key(&mut self.actions, |a| a.action_id.clone()));
        note(
            "respondents",
            "respondent_id",
            dedup_by_key(&mut self.respondents, |r| r.respondent_id.clone()),
        );
        note(
            "criteria",
            "criterion_id",
            dedup_by_key(&mut self.criteria, |c| c.criterion_id.clone()),
        );
        note("subcriteria", "sub_id", dedup_by_key(&mut self.subcriteria, |s| s.sub_id.clone()));
        note(
            "suppliers",
            "supplier_id",
            dedup_by_key(&mut self.suppliers, |s| s.supplier_id.clone()),
        );
        note("allocation_plants", "plant_id", dedup_by_key(&mut self.plants, |p| p.plant_id.clone()));
        note(
            "allocation_suppliers",
            "supplier_id",
            dedup_by_key(&mut self.allocation_suppliers, |s| s.supplier_id.clone()),
        );
    }

    fn clamp_values(&mut self, report: &mut SanitizeReport) {
        for e in &mut self.events {
            e.severity = clamp_finite(e.severity, 1.0, 10.0);
        }
        for a in &mut self.agents {
            a.occurrence = clamp_finite(a.occurrence, 1.0, 10.0);
        }
        for a in &mut self.actions {
            a.difficulty = clamp_finite(a.difficulty, 1.0, 5.0);
            a.cost = clamp_finite(a.cost, 0.0, f64::MAX);
            a.manhours = clamp_finite(a.manhours, 0.0, f64::MAX);
        }
        for r in &mut self.respondents {
            r.weight = clamp_finite(r.weight, 0.0, f64::MAX);
        }
        for e in &mut self.edges {
            e.score = clamp_finite(e.score, 0.0, 4.0);
        }
        for r in &mut self.ratings {
            r.rating = clamp_finite(r.rating, 1.0, 5.0);
        }
        for p in &mut self.plants {
            p.demand = clamp_finite(p.demand, 0.0, f64::MAX);
        }
        for s in &mut self.allocation_suppliers {
            s.capacity = clamp_finite(s.capacity, 0.0, f64::MAX);
            s.unit_cost = clamp_finite(s.unit_cost, 0.0, f64::MAX);
            s.emission_score = clamp_finite(s.emission_score, 0.0, f64::MAX);
        }

        // R 取整到 {0,1,2,3}; E 截断到 [0,1]
        if !self.risk_matrix.is_empty() {
            let data = self
                .risk_matrix
                .data()
                .map(|v| clamp_finite(v, 0.0, 3.0).trunc());
            if let Some(m) = self.risk_matrix.with_data(data) {
                self.risk_matrix = m;
            }
        }
        if !self.effectiveness.is_empty() {
            let data = self.effectiveness.data().map(|v| clamp_finite(v, 0.0, 1.0));
            if let Some(m) = self.effectiveness.with_data(data) {
                self.effectiveness = m;
            }
        }
        report.push("*", SanitizeLevel::Ok, "numeric ranges clamped".to_string());
    }

    fn repair_criterion_refs(&mut self, report: &mut SanitizeReport) {
        let first = match self.criteria.first() {
            Some(c) => c.criterion_id.clone(),
            None => return,
        };
        let valid: HashSet<&str> = self.criteria.iter().map(|c| c.criterion_id.as_str()).collect();

        let mut fixed = 0;
        for s in &mut self.subcriteria {
            if !valid.contains(s.criterion_id.as_str()) {
                s.criterion_id = first.clone();
                fixed += 1;
            }
        }
        if fixed > 0 {
            report.push(
                "subcriteria",
                SanitizeLevel::Warn,
                format!("fixed {} invalid criterion_id to {}", fixed, first),
            );
        }
    }

    fn filter_dangling_edges(&mut self, report: &mut SanitizeReport) {
        let respondents: HashSet<String> =
            self.respondents.iter().map(|r| r.respondent_id.clone()).collect();
        let subs: HashSet<String> = self.subcriteria.iter().map(|s| s.sub_id.clone()).collect();

        let before = self.edges.len();
        self.edges.retain(|e| {
            respondents.contains(&e.respondent_id)
                && subs.contains(&e.from_sub)
                && subs.contains(&e.to_sub)
        });
        let dropped = before - self.edges.len();
        if dropped > 0 {
            report.push(
                "dematel_edges",
                SanitizeLevel::Warn,
                format!("dropped {} edges with unknown respondent/sub-criterion", dropped),
            );
        }

        let before = self.edges.len();
        self.edges.retain(|e| !e.is_self_influence());
        let dropped = before - self.edges.len();
        if dropped > 0 {
            report.push(
                "dematel_edges",
                SanitizeLevel::Warn,
                format!("dropped {} self-influence edges", dropped),
            );
        }
    }

    fn filter_dangling_ratings(&mut self, report: &mut SanitizeReport) {
        let suppliers: HashSet<String> =
            self.suppliers.iter().map(|s| s.supplier_id.clone()).collect();
        let subs: HashSet<String> = self.subcriteria.iter().map(|s| s.sub_id.clone()).collect();
        let respondents: HashSet<String> =
            self.respondents.iter().map(|r| r.respondent_id.clone()).collect();

        let before = self.ratings.len();
        self.ratings.retain(|r| {
            suppliers.contains(&r.supplier_id)
                && subs.contains(&r.sub_id)
                && respondents.contains(&r.respondent_id)
        });
        let dropped = before - self.ratings.len();
        if dropped > 0 {
            report.push(
                "supplier_ratings",
                SanitizeLevel::Warn,
                format!("dropped {} ratings with unknown supplier/sub-criterion/respondent", dropped),
            );
        }
    }

    // ==========================================
    // 主数据标识符列表
    // ==========================================

    pub fn event_ids(&self) -> Vec<String> {
        self.events.iter().map(|e| e.event_id.clone()).collect()
    }

    pub fn agent_ids(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.agent_id.clone()).collect()
    }

    pub fn action_ids(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.action_id.clone()).collect()
    }

    pub fn sub_ids(&self) -> Vec<String> {
        self.subcriteria.iter().map(|s| s.sub_id.clone()).collect()
    }

    pub fn criterion_ids(&self) -> Vec<String> {
        self.criteria.iter().map(|c| c.criterion_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Dataset {
        Dataset {
            respondents: vec![Respondent::new("R1", 1.0)],
            criteria: vec![Criterion::new("C1"), Criterion::new("C2")],
            subcriteria: vec![Subcriterion::new("S1", "C1"), Subcriterion::new("S2", "CX")],
            edges: vec![
                InfluenceEdge::new("R1", "S1", "S2", 9.0),
                InfluenceEdge::new("R9", "S1", "S2", 2.0),
                InfluenceEdge::new("R1", "S1", "S7", 2.0),
            ],
            suppliers: vec![Supplier::new(" SUP1 ", "North"), Supplier::new("SUP1", "South")],
            ratings: vec![
                Rating::new("SUP1", "S1", "R1", 7.0),
                Rating::new("SUP9", "S1", "R1", 3.0),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_sanitize_repairs_references() {
        let mut ds = base();
        let report = ds.sanitize();

        // 无效准则引用 -> 第一个准则
        assert_eq!(ds.subcriteria[1].criterion_id, "C1");
        // 悬空边过滤, 分数截断
        assert_eq!(ds.edges.len(), 1);
        assert_eq!(ds.edges[0].score, 4.0);
        // 供应商去重 (首条保留, 去空白)
        assert_eq!(ds.suppliers.len(), 1);
        assert_eq!(ds.suppliers[0].region, "North");
        // 评分过滤 + 截断
        assert_eq!(ds.ratings.len(), 1);
        assert_eq!(ds.ratings[0].rating, 5.0);
        assert!(report.has_warnings());
    }

    #[test]
    fn test_sanitize_drops_self_influence() {
        let mut ds = base();
        ds.edges.push(InfluenceEdge::new("R1", " S1", "S1 ", 3.0));
        let report = ds.sanitize();

        assert_eq!(ds.edges.len(), 1);
        assert!(ds.edges.iter().all(|e| e.from_sub != e.to_sub));
        assert!(report
            .warnings()
            .any(|w| w.message.contains("self-influence")));
    }

    #[test]
    fn test_sanitize_truncates_risk_matrix() {
        let mut ds = Dataset {
            risk_matrix: LabeledMatrix::from_rows(
                vec!["E1".into()],
                vec!["A1".into(), "A2".into(), "A3".into()],
                &[vec![2.7, -1.0, 8.0]],
            ),
            ..Default::default()
        };
        ds.sanitize();
        assert_eq!(ds.risk_matrix.get("E1", "A1"), Some(2.0));
        assert_eq!(ds.risk_matrix.get("E1", "A2"), Some(0.0));
        assert_eq!(ds.risk_matrix.get("E1", "A3"), Some(3.0));
    }
}
