// ==========================================
// 供应商风险决策支持系统 - 自动洞察
// ==========================================
// 职责: 将一次分析运行的结果汇总为结构化要点
// 规则: 某部分输入为空时跳过该部分, 不输出占位要点
// ==========================================

use crate::engine::allocation::{region_shares, AllocationResult};
use crate::engine::danp::DanpResult;
use crate::engine::dematel::DematelResult;
use crate::engine::hor::{HorStage1Result, MitigationDetail};
use crate::engine::supplier_scorer::SupplierRanking;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsightSection {
    Hor,
    Mitigation,
    Dematel,
    Danp,
    Suppliers,
    Allocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightItem {
    pub label: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub section: InsightSection,
    pub message: String,
    pub items: Vec<InsightItem>,
}

impl Insight {
    fn new(section: InsightSection, headline: &str, items: Vec<InsightItem>) -> Self {
        let listed = items
            .iter()
            .map(|i| match i.value {
                Some(v) => format!("{} ({:.3})", i.label, v),
                None => i.label.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            section,
            message: format!("{}: {}", headline, listed),
            items,
        }
    }
}

/// 洞察输入 (一次完整运行的各阶段结果)
pub struct InsightInputs<'a> {
    pub stage1: &'a HorStage1Result,
    pub mitigation: &'a MitigationDetail,
    pub dematel: &'a DematelResult,
    pub danp: &'a DanpResult,
    pub ranking: &'a SupplierRanking,
    pub allocation: &'a AllocationResult,
}

fn top(pairs: Vec<(String, f64)>, n: usize, with_value: bool) -> Vec<InsightItem> {
    pairs
        .into_iter()
        .take(n)
        .map(|(label, v)| InsightItem {
            label,
            value: with_value.then_some(v),
        })
        .collect()
}

/// 生成洞察要点
pub fn auto_insights(inputs: &InsightInputs) -> Vec<Insight> {
    let mut out = Vec::new();

    // HOR
    if !inputs.stage1.weighted.is_empty() {
        let items = top(inputs.stage1.event_contributions().sorted_desc(), 1, false);
        out.push(Insight::new(InsightSection::Hor, "加权风险贡献最大的事件", items));
    }
    if !inputs.stage1.arp.is_empty() {
        let items = top(inputs.stage1.arp.sorted_desc(), 3, true);
        out.push(Insight::new(InsightSection::Hor, "ARP 最高的三个风险因子", items));
    }

    // 缓解措施 (rows 已按 ETD 降序)
    if !inputs.mitigation.is_empty() {
        let pairs = inputs
            .mitigation
            .rows
            .iter()
            .map(|r| (r.action_id.clone(), r.etd))
            .collect();
        out.push(Insight::new(
            InsightSection::Mitigation,
            "ETD 最高的措施",
            top(pairs, 3, true),
        ));
    }

    // DEMATEL
    if !inputs.dematel.r.is_empty() {
        let relation = inputs.dematel.relation().sorted_desc();
        let cause = top(relation.clone(), 3, true);
        let mut effect_pairs = relation;
        effect_pairs.reverse();
        let effect = top(effect_pairs, 3, true);
        out.push(Insight::new(InsightSection::Dematel, "净原因子准则", cause));
        out.push(Insight::new(InsightSection::Dematel, "净结果子准则", effect));
    }

    // DANP
    if !inputs.danp.gw.is_empty() {
        let items = top(inputs.danp.gw.sorted_desc(), 5, true);
        out.push(Insight::new(InsightSection::Danp, "全局权重最高的子准则", items));
    }

    // 供应商
    if !inputs.ranking.is_empty() {
        let pairs = inputs
            .ranking
            .rows
            .iter()
            .map(|r| (r.supplier_id.clone(), r.score))
            .collect();
        out.push(Insight::new(
            InsightSection::Suppliers,
            "排名靠前的供应商",
            top(pairs, 5, false),
        ));
    }

    // 分配
    let shares = region_shares(inputs.allocation);
    if !shares.is_empty() {
        let pairs = shares.into_iter().map(|s| (s.region, s.share)).collect();
        out.push(Insight::new(
            InsightSection::Allocation,
            "供应量占比最大的区域",
            top(pairs, 3, true),
        ));
    }

    out
}
