// ==========================================
// 供应商风险决策支持系统 - 供应分配优化引擎
// ==========================================
// 职责: 多工厂需求在供应商之间的线性规划分配
// 输入: 工厂需求 + 供应经济参数 + 供应商排名 + 分配参数
// 输出: (供应商, 工厂, 数量, 区域) 分配表 + 求解状态
// ==========================================
// 红线: 不可行/退化模型返回同结构空结果, 不报错
// ==========================================

mod solver;
mod kpi;


pub use solver::{AllocationOptimizer, AllocationResult, AllocationRow, QUANTITY_TOLERANCE};
pub use kpi::{compute_kpis, region_shares, AllocationKpis, RegionShare};
