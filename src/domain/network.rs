// ==========================================
// 供应商风险决策支持系统 - 评价网络领域模型
// ==========================================
// 职责: 受访者 / 准则 / 子准则 / 影响边 (DEMATEL 输入)
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Respondent - 受访专家
// ==========================================
// 权重在使用前统一归一化为和为 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Respondent {
    pub respondent_id: String,   // 受访者ID (唯一)
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub weight: f64,             // 权重 > 0
}

impl Respondent {
    pub fn new(respondent_id: &str, weight: f64) -> Self {
        Self {
            respondent_id: respondent_id.to_string(),
            name: None,
            role: None,
            weight,
        }
    }
}

// ==========================================
// Criterion - 准则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub criterion_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Criterion {
    pub fn new(criterion_id: &str) -> Self {
        Self {
            criterion_id: criterion_id.to_string(),
            name: None,
        }
    }
}

// ==========================================
// Subcriterion - 子准则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcriterion {
    pub sub_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub criterion_id: String,    // 所属准则 (外键)
}

impl Subcriterion {
    pub fn new(sub_id: &str, criterion_id: &str) -> Self {
        Self {
            sub_id: sub_id.to_string(),
            name: None,
            criterion_id: criterion_id.to_string(),
        }
    }
}

// ==========================================
// InfluenceEdge - 子准则间影响评分
// ==========================================
// from == to 为无效自影响, 计算时丢弃
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceEdge {
    pub respondent_id: String,
    pub from_sub: String,
    pub to_sub: String,
    pub score: f64,              // 评分 [0,4]
}

impl InfluenceEdge {
    pub fn new(respondent_id: &str, from_sub: &str, to_sub: &str, score: f64) -> Self {
        Self {
            respondent_id: respondent_id.to_string(),
            from_sub: from_sub.to_string(),
            to_sub: to_sub.to_string(),
            score,
        }
    }

    pub fn is_self_influence(&self) -> bool {
        self.from_sub == self.to_sub
    }
}

/// 子准则 -> 准则 分组 (按准则列表顺序, 组内保持子准则顺序)
pub fn group_by_criterion<'a>(
    criteria: &[String],
    subcriteria: &'a [Subcriterion],
) -> Vec<(String, Vec<&'a str>)> {
    criteria
        .iter()
        .map(|c| {
            let members = subcriteria
                .iter()
                .filter(|s| &s.criterion_id == c)
                .map(|s| s.sub_id.as_str())
                .collect();
            (c.clone(), members)
        })
        .collect()
}
