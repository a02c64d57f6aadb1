// ==========================================
// 配置与情景持久化集成测试
// ==========================================
// 测试目标: config_kv 读写、情景保存/重开数据库后加载
// ==========================================

mod helpers;

use helpers::DatasetBuilder;
use std::sync::{Arc, Mutex};
use supplier_risk_dss::config::{config_keys, AnalysisConfig, ConfigManager};
use supplier_risk_dss::db::open_sqlite_connection;
use supplier_risk_dss::engine::{ScenarioSimulator, ScenarioState, WhatIf};
use supplier_risk_dss::repository::ScenarioRepository;
use tempfile::NamedTempFile;

fn open_shared(path: &str) -> Arc<Mutex<rusqlite::Connection>> {
    Arc::new(Mutex::new(open_sqlite_connection(path).unwrap()))
}

#[test]
fn test_config_and_scenarios_share_one_database() {
    let file = NamedTempFile::new().unwrap();
    let path = file.path().to_str().unwrap();
    let conn = open_shared(path);

    let config = ConfigManager::from_connection(conn.clone()).unwrap();
    config
        .set_config_value(config_keys::ALLOC_EXCLUDED_SUPPLIERS, r#"["SUP3"]"#)
        .unwrap();
    let cfg = config.load_analysis_config().unwrap();
    assert_eq!(cfg.allocation.excluded_suppliers, vec!["SUP3"]);

    let repo = ScenarioRepository::new(conn).unwrap();
    let mut state = ScenarioState::capture(&Default::default(), &cfg);
    state.what_if = WhatIf {
        subs: vec!["S1".to_string()],
        factor: 2.0,
    };
    let saved = repo.save("Excl SUP3 / S1×2", &state).unwrap();
    assert_eq!(saved.name, "Excl_SUP3_S1_2");

    // 重新打开数据库
    let reopened = ScenarioRepository::new(open_shared(path)).unwrap();
    let listed = reopened.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Excl_SUP3_S1_2");

    let loaded = reopened.load("Excl_SUP3_S1_2").unwrap().unwrap();
    assert_eq!(loaded.state, state);
    assert_eq!(loaded.saved_at, saved.saved_at);
}

#[test]
fn test_saving_same_name_overwrites() {
    let file = NamedTempFile::new().unwrap();
    let repo = ScenarioRepository::new(open_shared(file.path().to_str().unwrap())).unwrap();

    let mut state = ScenarioState::default();
    repo.save("base", &state).unwrap();
    state.what_if.factor = 1.5;
    repo.save("base", &state).unwrap();

    assert_eq!(repo.list().unwrap().len(), 1);
    assert_eq!(repo.load("base").unwrap().unwrap().state.what_if.factor, 1.5);
}

#[test]
fn test_loaded_scenario_simulates() {
    let data = DatasetBuilder::full().build();
    let file = NamedTempFile::new().unwrap();
    let repo = ScenarioRepository::new(open_shared(file.path().to_str().unwrap())).unwrap();

    let gw = supplier_risk_dss::LabeledSeries::new(
        helpers::test_data_builder::labels(&["S1", "S2", "S3", "S4"]),
        vec![0.25, 0.25, 0.25, 0.25],
    );
    let state = ScenarioState::capture(&gw, &AnalysisConfig::default());
    repo.save("uniform", &state).unwrap();

    let loaded = repo.load("uniform").unwrap().unwrap();
    let outcome = ScenarioSimulator::new().simulate(&loaded.state, &data);
    assert_eq!(outcome.ranking.rows[0].supplier_id, "SUP1");
    assert!(outcome.allocation.status.is_solved());
    assert!((outcome.allocation.total_quantity() - 220.0).abs() < 1e-6);
}
