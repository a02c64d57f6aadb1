// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use supplier_risk_dss::domain::dataset::Dataset;
use supplier_risk_dss::domain::hor::{MitigationAction, RiskAgent, RiskEvent};
use supplier_risk_dss::domain::matrix::LabeledMatrix;
use supplier_risk_dss::domain::network::{Criterion, InfluenceEdge, Respondent, Subcriterion};
use supplier_risk_dss::domain::supplier::{AllocationSupplier, Plant, Rating, Supplier};

pub fn labels(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

// ==========================================
// DatasetBuilder
// ==========================================

/// 按区块拼装 Dataset
///
/// 各区块的数据与演示模板一致:
/// - HOR: 3 事件 (7,5,8) × 3 因子 (6,7,5), 3 措施
/// - 网络: 2 受访者, 2 准则 / 4 子准则
/// - 供应商: SUP1..SUP4, 2 工厂 (100, 120)
#[derive(Default)]
pub struct DatasetBuilder {
    data: Dataset,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hor(mut self) -> Self {
        self.data.events = vec![
            RiskEvent::new("E1", 7.0),
            RiskEvent::new("E2", 5.0),
            RiskEvent::new("E3", 8.0),
        ];
        self.data.agents = vec![
            RiskAgent::new("A1", 6.0),
            RiskAgent::new("A2", 7.0),
            RiskAgent::new("A3", 5.0),
        ];
        self.data.risk_matrix = LabeledMatrix::from_rows(
            labels(&["E1", "E2", "E3"]),
            labels(&["A1", "A2", "A3"]),
            &[
                vec![2.0, 1.0, 0.0],
                vec![1.0, 3.0, 2.0],
                vec![0.0, 2.0, 1.0],
            ],
        );
        self.data.actions = vec![
            MitigationAction::new("M1", 3.0, 100.0, 40.0),
            MitigationAction::new("M2", 2.0, 150.0, 60.0),
            MitigationAction::new("M3", 4.0, 80.0, 35.0),
        ];
        // 因子 × 措施 方向
        self.data.effectiveness = LabeledMatrix::from_rows(
            labels(&["A1", "A2", "A3"]),
            labels(&["M1", "M2", "M3"]),
            &[
                vec![0.8, 0.5, 0.3],
                vec![0.6, 0.9, 0.4],
                vec![0.4, 0.7, 0.8],
            ],
        );
        self
    }

    pub fn with_network(mut self) -> Self {
        self.data.respondents = vec![Respondent::new("R1", 1.0), Respondent::new("R2", 3.0)];
        self.data.criteria = vec![Criterion::new("C1"), Criterion::new("C2")];
        self.data.subcriteria = vec![
            Subcriterion::new("S1", "C1"),
            Subcriterion::new("S2", "C1"),
            Subcriterion::new("S3", "C2"),
            Subcriterion::new("S4", "C2"),
        ];

        let subs = ["S1", "S2", "S3", "S4"];
        let mut edges = Vec::new();
        for (k, r) in ["R1", "R2"].iter().enumerate() {
            for (i, from) in subs.iter().enumerate() {
                for (j, to) in subs.iter().enumerate() {
                    if i != j {
                        let score = ((i + 2 * j + k) % 4 + 1) as f64;
                        edges.push(InfluenceEdge::new(r, from, to, score));
                    }
                }
            }
        }
        self.data.edges = edges;
        self
    }

    pub fn with_suppliers(mut self) -> Self {
        self.data.suppliers = vec![
            Supplier::new("SUP1", "North"),
            Supplier::new("SUP2", "South"),
            Supplier::new("SUP3", "East"),
            Supplier::new("SUP4", "West"),
        ];

        let subs = ["S1", "S2", "S3", "S4"];
        let mut ratings = Vec::new();
        for (a, sup) in ["SUP1", "SUP2", "SUP3", "SUP4"].iter().enumerate() {
            for (b, sub) in subs.iter().enumerate() {
                for (c, r) in ["R1", "R2"].iter().enumerate() {
                    // SUP1 全部满分
                    let rating = if a == 0 { 5.0 } else { (1 + (a + b + c) % 4) as f64 };
                    ratings.push(Rating::new(sup, sub, r, rating));
                }
            }
        }
        self.data.ratings = ratings;

        self.data.plants = vec![Plant::new("PlantA", 100.0), Plant::new("PlantB", 120.0)];
        self.data.allocation_suppliers = vec![
            AllocationSupplier::new("SUP1", 150.0, 4.5, 0.6),
            AllocationSupplier::new("SUP2", 120.0, 4.2, 0.8),
            AllocationSupplier::new("SUP3", 90.0, 4.0, 1.0),
            AllocationSupplier::new("SUP4", 80.0, 4.1, 0.7),
        ];
        self
    }

    pub fn full() -> Self {
        Self::new().with_hor().with_network().with_suppliers()
    }

    pub fn build(self) -> Dataset {
        self.data
    }
}
