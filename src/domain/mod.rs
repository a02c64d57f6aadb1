// ==========================================
// 供应商风险决策支持系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、带标签矩阵
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod dataset;
pub mod hor;
pub mod matrix;
pub mod network;
pub mod supplier;
pub mod types;

// 重导出核心类型
pub use dataset::{Dataset, SanitizeReport};
pub use hor::{MitigationAction, RiskAgent, RiskEvent};
pub use matrix::{normalize_label, unique_labels, LabeledMatrix, LabeledSeries};
pub use network::{Criterion, InfluenceEdge, Respondent, Subcriterion};
pub use supplier::{AllocationSupplier, Plant, Rating, RatingFilters, Supplier};
pub use types::{CausalRole, SolverStatus};
