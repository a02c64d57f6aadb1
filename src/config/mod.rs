// ==========================================
// 供应商风险决策支持系统 - 配置层
// ==========================================
// 职责: 分析参数的类型定义与持久化
// 存储: config_kv 表
// ==========================================

pub mod analysis_profile;
pub mod config_manager;

// 重导出核心配置
pub use analysis_profile::{ActionBudget, AllocationParams, AnalysisConfig, DEFAULT_BUDGET_RATIO};
pub use config_manager::{config_keys, ConfigManager};
