// ==========================================
// 供应商风险决策支持系统 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 求解状态 (Solver Status)
// ==========================================
// 不可行/未求解以状态返回, 不抛出错误
// 序列化格式: SCREAMING_SNAKE_CASE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverStatus {
    Optimal,    // 最优
    Feasible,   // 可行 (非证明最优)
    Infeasible, // 不可行
    Unbounded,  // 无界
    NotSolved,  // 输入为空, 未建模
    Error,      // 求解器内部错误
}

impl SolverStatus {
    /// 是否得到可用解
    pub fn is_solved(&self) -> bool {
        matches!(self, SolverStatus::Optimal | SolverStatus::Feasible)
    }
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverStatus::Optimal => write!(f, "OPTIMAL"),
            SolverStatus::Feasible => write!(f, "FEASIBLE"),
            SolverStatus::Infeasible => write!(f, "INFEASIBLE"),
            SolverStatus::Unbounded => write!(f, "UNBOUNDED"),
            SolverStatus::NotSolved => write!(f, "NOT_SOLVED"),
            SolverStatus::Error => write!(f, "ERROR"),
        }
    }
}

// ==========================================
// 因果角色 (Causal Role)
// ==========================================
// 依据 DEMATEL 关系度 r - c 的符号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CausalRole {
    Cause,   // 净原因 (r - c > 0)
    Effect,  // 净结果 (r - c < 0)
    Neutral, // r - c == 0
}

impl CausalRole {
    pub fn from_relation(relation: f64) -> Self {
        if relation > 0.0 {
            CausalRole::Cause
        } else if relation < 0.0 {
            CausalRole::Effect
        } else {
            CausalRole::Neutral
        }
    }
}

impl fmt::Display for CausalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CausalRole::Cause => write!(f, "CAUSE"),
            CausalRole::Effect => write!(f, "EFFECT"),
            CausalRole::Neutral => write!(f, "NEUTRAL"),
        }
    }
}
