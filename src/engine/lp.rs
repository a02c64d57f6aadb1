// ==========================================
// 供应商风险决策支持系统 - 线性规划公共工具
// ==========================================
// 求解器: good_lp + microlp (纯 Rust, 阻塞调用)
// ==========================================

use crate::domain::types::SolverStatus;
use good_lp::ResolutionError;

/// 求解错误 -> 求解状态
pub fn status_of(err: &ResolutionError) -> SolverStatus {
    match err {
        ResolutionError::Infeasible => SolverStatus::Infeasible,
        ResolutionError::Unbounded => SolverStatus::Unbounded,
        _ => SolverStatus::Error,
    }
}

/// 二元变量取值判定阈值
pub const BINARY_THRESHOLD: f64 = 0.5;

pub fn is_selected(value: f64) -> bool {
    value >= BINARY_THRESHOLD
}
