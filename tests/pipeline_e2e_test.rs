// ==========================================
// 端到端测试: 模板目录 -> 导入 -> 分析 -> 情景
// ==========================================

use approx::assert_relative_eq;
use supplier_risk_dss::engine::{compare_rankings, ScenarioSimulator, ScenarioState, WhatIf};
use supplier_risk_dss::importer::{ensure_minimal_templates, load_template_dir};
use supplier_risk_dss::{AnalysisConfig, AnalysisPipeline, AnalysisReport, Dataset};
use tempfile::TempDir;

fn demo_dataset() -> (TempDir, Dataset) {
    supplier_risk_dss::logging::init_test();
    let dir = TempDir::new().unwrap();
    let written = ensure_minimal_templates(dir.path()).unwrap();
    assert!(!written.is_empty());

    let mut data = load_template_dir(dir.path()).unwrap();
    data.sanitize();
    (dir, data)
}

fn run_demo() -> (Dataset, AnalysisReport) {
    let (_dir, data) = demo_dataset();
    let report = AnalysisPipeline::new().run(&data, &AnalysisConfig::default());
    (data, report)
}

#[test]
fn test_demo_templates_produce_full_report() {
    let (data, report) = run_demo();

    // HOR
    assert_eq!(report.hor_stage1.arp.len(), 3);
    assert_relative_eq!(report.hor_stage1.arp.get("A2").unwrap(), 266.0);
    assert_eq!(report.mitigation.rows.len(), 3);

    // 权重
    assert_relative_eq!(report.danp.gw.sum(), 1.0, epsilon = 1e-9);
    assert_eq!(report.causal_positions.len(), data.subcriteria.len());

    // 排名与分配
    assert_eq!(report.ranking.rows.len(), 4);
    assert!(report.allocation.status.is_solved());
    assert_relative_eq!(report.allocation.total_quantity(), 220.0, epsilon = 1e-6);
    assert!(!report.region_shares.is_empty());

    // 措施
    assert!(report.action_selection.status.is_solved());
    assert!(report.action_selection.total_cost <= 0.6 * 330.0 + 1e-6);
    assert!(report.action_selection.total_manhours <= 0.6 * 135.0 + 1e-6);
    assert_eq!(report.frontier.len(), 10);

    // 敏感性: 3 个事件 + 3 个因子
    assert_eq!(report.tornado.len(), 6);
    assert!(report
        .tornado
        .windows(2)
        .all(|w| w[0].delta >= w[1].delta));

    assert!(!report.insights.is_empty());
}

#[test]
fn test_report_serializes_to_json() {
    let (_, report) = run_demo();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["run_id"].as_str().unwrap(), report.run_id);
    assert!(json["tornado"].is_array());
    assert!(json["frontier"].is_array());
}

#[test]
fn test_template_bootstrap_does_not_overwrite() {
    let dir = TempDir::new().unwrap();
    let first = ensure_minimal_templates(dir.path()).unwrap();
    let second = ensure_minimal_templates(dir.path()).unwrap();
    assert!(!first.is_empty());
    assert!(second.is_empty());
}

#[test]
fn test_what_if_scenario_changes_scores_not_order_of_ids() {
    let (data, report) = run_demo();

    let base = ScenarioState::capture(&report.danp.gw, &AnalysisConfig::default());
    let mut tweaked = base.clone();
    tweaked.what_if = WhatIf {
        subs: vec!["S1".to_string()],
        factor: 3.0,
    };

    let sim = ScenarioSimulator::new();
    let before = sim.simulate(&base, &data);
    let after = sim.simulate(&tweaked, &data);

    // 调整后权重仍归一
    assert_relative_eq!(after.gw.sum(), 1.0, epsilon = 1e-9);
    assert!(after.gw.get("S1").unwrap() > before.gw.get("S1").unwrap());

    let deltas = compare_rankings(&before.ranking, &after.ranking);
    assert_eq!(deltas.len(), 4);
    for d in &deltas {
        assert_relative_eq!(d.delta, d.score_new - d.score_base, epsilon = 1e-12);
    }
}
