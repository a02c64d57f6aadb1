// ==========================================
// 供应商风险决策支持系统 - House of Risk 领域模型
// ==========================================
// 职责: 风险事件 / 风险因子 / 缓解措施 实体
// 矩阵: R (事件 × 因子), E (措施 × 因子) 使用 LabeledMatrix 表示
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// RiskEvent - 风险事件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEvent {
    pub event_id: String,        // 事件ID (唯一)
    #[serde(default)]
    pub name: Option<String>,    // 名称
    pub severity: f64,           // 严重度 [1,10]
}

impl RiskEvent {
    pub fn new(event_id: &str, severity: f64) -> Self {
        Self {
            event_id: event_id.to_string(),
            name: None,
            severity,
        }
    }
}

// ==========================================
// RiskAgent - 风险因子
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAgent {
    pub agent_id: String,        // 因子ID (唯一)
    #[serde(default)]
    pub name: Option<String>,    // 名称
    pub occurrence: f64,         // 发生度 [1,10]
}

impl RiskAgent {
    pub fn new(agent_id: &str, occurrence: f64) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            name: None,
            occurrence,
        }
    }
}

// ==========================================
// MitigationAction - 缓解措施
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MitigationAction {
    pub action_id: String,       // 措施ID (唯一)
    #[serde(default)]
    pub name: Option<String>,    // 名称
    pub difficulty: f64,         // 实施难度 [1,5]
    pub cost: f64,               // 成本 ≥ 0
    pub manhours: f64,           // 工时 ≥ 0
}

impl MitigationAction {
    pub fn new(action_id: &str, difficulty: f64, cost: f64, manhours: f64) -> Self {
        Self {
            action_id: action_id.to_string(),
            name: None,
            difficulty,
            cost,
            manhours,
        }
    }
}
