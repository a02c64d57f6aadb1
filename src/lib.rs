// ==========================================
// 供应商风险决策支持系统 - 核心库
// ==========================================
// 方法: House of Risk / DEMATEL / DANP / 线性规划
// 技术栈: Rust + nalgebra + good_lp + SQLite
// 系统定位: 决策支持系统 (人工最终控制权)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与带标签矩阵
pub mod domain;

// 引擎层 - 分析与优化
pub mod engine;

// 导入层 - CSV 模板
pub mod importer;

// 数据仓储层 - 情景存储
pub mod repository;

// 配置层 - 分析参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域
pub use domain::{
    Dataset, LabeledMatrix, LabeledSeries, MitigationAction, RiskAgent, RiskEvent,
    SanitizeReport, SolverStatus,
};

// 引擎
pub use engine::{
    ActionOptimizer, AllocationOptimizer, AnalysisPipeline, AnalysisReport, DanpSolver,
    DematelEngine, HorEngine, MatrixAligner, ScenarioSimulator, SensitivityAnalyzer,
    SupplierScorer,
};

// 配置
pub use config::{AnalysisConfig, ConfigManager};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "供应商风险决策支持系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
