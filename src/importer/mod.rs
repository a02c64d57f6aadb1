// ==========================================
// 供应商风险决策支持系统 - 导入层
// ==========================================
// 职责: 从 CSV 模板目录读取数据集
// 支持: CSV
// ==========================================

pub mod error;
pub mod file_parser;
pub mod template_loader;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, RawRecord, RawTable};
pub use template_loader::{ensure_minimal_templates, load_template_dir, template_files};
