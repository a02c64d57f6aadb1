// ==========================================
// 供应商风险决策支持系统 - 命令行入口
// ==========================================
// 用法: supplier-risk-dss [template_dir] [config_db]
// 流程: 补齐模板 -> 加载 -> 修复 -> 读取配置 -> 分析 -> 输出 JSON
// ==========================================

use anyhow::{Context, Result};
use std::path::PathBuf;
use supplier_risk_dss::config::ConfigManager;
use supplier_risk_dss::db::default_db_path;
use supplier_risk_dss::engine::AnalysisPipeline;
use supplier_risk_dss::importer::{ensure_minimal_templates, load_template_dir};
use supplier_risk_dss::{logging, APP_NAME, VERSION};

const DEFAULT_TEMPLATE_DIR: &str = "templates";

fn main() -> Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let template_dir = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_TEMPLATE_DIR.to_string()));
    let db_path = args.next().map(PathBuf::from).unwrap_or_else(default_db_path);

    tracing::info!("==================================================");
    tracing::info!("{} v{}", APP_NAME, VERSION);
    tracing::info!("==================================================");
    tracing::info!(templates = %template_dir.display(), db = %db_path.display(), "启动参数");

    // 模板
    ensure_minimal_templates(&template_dir)
        .with_context(|| format!("无法准备模板目录 {}", template_dir.display()))?;
    let mut data = load_template_dir(&template_dir)
        .with_context(|| format!("无法加载模板目录 {}", template_dir.display()))?;

    let fixes = data.sanitize();
    tracing::info!(
        entries = fixes.entries.len(),
        warnings = fixes.warnings().count(),
        "数据修复完成"
    );

    // 配置
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("无法创建数据目录 {}", parent.display()))?;
    }
    let db_str = db_path
        .to_str()
        .with_context(|| format!("数据库路径不是有效 UTF-8: {}", db_path.display()))?;
    let config = ConfigManager::new(db_str)
        .and_then(|mgr| mgr.load_analysis_config())
        .context("无法读取分析配置")?;

    // 分析
    let analysis = AnalysisPipeline::new().run(&data, &config);

    let json = serde_json::to_string_pretty(&analysis).context("报告序列化失败")?;
    println!("{}", json);
    Ok(())
}
