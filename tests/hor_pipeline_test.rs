// ==========================================
// HOR 两阶段集成测试
// ==========================================
// 测试目标: ARP / TE / ETD 计算与矩阵自动对齐
// ==========================================

mod helpers;

use approx::assert_relative_eq;
use helpers::DatasetBuilder;
use supplier_risk_dss::engine::alignment::AlignmentWarning;
use supplier_risk_dss::engine::HorEngine;

#[test]
fn test_arp_follows_agent_order_and_formula() {
    let data = DatasetBuilder::new().with_hor().build();
    let s1 = HorEngine::new().stage1(&data.events, &data.agents, &data.risk_matrix);

    assert_eq!(s1.arp.labels, vec!["A1", "A2", "A3"]);
    // ARP[A2] = (1·7 + 3·5 + 2·8) × 7
    assert_relative_eq!(s1.arp.get("A2").unwrap(), 266.0);
    assert_relative_eq!(s1.arp.get("A1").unwrap(), 114.0);
    assert_relative_eq!(s1.arp.get("A3").unwrap(), 90.0);
    assert!(s1.arp.values.iter().all(|v| *v >= 0.0));
}

#[test]
fn test_transposed_risk_matrix_gives_same_arp() {
    let data = DatasetBuilder::new().with_hor().build();
    let engine = HorEngine::new();
    let base = engine.stage1(&data.events, &data.agents, &data.risk_matrix);
    let flipped = engine.stage1(&data.events, &data.agents, &data.risk_matrix.transpose());

    for (a, b) in base.arp.values.iter().zip(&flipped.arp.values) {
        assert_relative_eq!(*a, *b);
    }
}

#[test]
fn test_stage2_te_and_etd() {
    let data = DatasetBuilder::new().with_hor().build();
    let (_, detail) = HorEngine::new().run(
        &data.events,
        &data.agents,
        &data.risk_matrix,
        &data.effectiveness,
        &data.actions,
    );

    // E 以 因子 × 措施 方向给出, 被自动转置
    assert_eq!(detail.rows.len(), 3);
    let m1 = detail.get("M1").unwrap();
    let m2 = detail.get("M2").unwrap();
    let m3 = detail.get("M3").unwrap();
    assert_relative_eq!(m1.te, 286.8, epsilon = 1e-9);
    assert_relative_eq!(m2.te, 359.4, epsilon = 1e-9);
    assert_relative_eq!(m3.te, 212.6, epsilon = 1e-9);

    for row in &detail.rows {
        assert!(row.te >= 0.0);
        assert_relative_eq!(row.etd, row.te / row.difficulty, epsilon = 1e-9);
    }

    // 按 ETD 降序
    let order: Vec<&str> = detail.rows.iter().map(|r| r.action_id.as_str()).collect();
    assert_eq!(order, vec!["M2", "M1", "M3"]);
}

#[test]
fn test_extra_matrix_columns_are_dropped() {
    let mut data = DatasetBuilder::new().with_hor().build();
    data.agents.pop(); // A3 不在主列表中
    let s1 = HorEngine::new().stage1(&data.events, &data.agents, &data.risk_matrix);

    assert_eq!(s1.arp.labels, vec!["A1", "A2"]);
    assert_relative_eq!(s1.arp.get("A2").unwrap(), 266.0);
    assert!(s1.warnings.is_empty());
}

#[test]
fn test_disjoint_matrix_is_warned() {
    let data = DatasetBuilder::new().with_hor().build();
    let agents = vec![supplier_risk_dss::RiskAgent::new("Z1", 5.0)];
    let s1 = HorEngine::new().stage1(&data.events, &agents, &data.risk_matrix);

    assert_eq!(s1.arp.len(), 1);
    assert_relative_eq!(s1.arp.get("Z1").unwrap(), 0.0);
    assert!(s1
        .warnings
        .iter()
        .any(|w| matches!(w, AlignmentWarning::DisjointLabels { .. })));
}

#[test]
fn test_empty_inputs_give_empty_results() {
    let data = DatasetBuilder::new().build();
    let (s1, detail) = HorEngine::new().run(
        &data.events,
        &data.agents,
        &data.risk_matrix,
        &data.effectiveness,
        &data.actions,
    );
    assert!(s1.is_empty());
    assert!(detail.is_empty());
}
