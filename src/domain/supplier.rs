// ==========================================
// 供应商风险决策支持系统 - 供应商领域模型
// ==========================================
// 职责: 供应商 / 评分记录 / 工厂需求 / 供应经济参数
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Supplier - 供应商主数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub supplier_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub region: String,          // 区域 (缺省为空串)
}

impl Supplier {
    pub fn new(supplier_id: &str, region: &str) -> Self {
        Self {
            supplier_id: supplier_id.to_string(),
            name: None,
            region: region.to_string(),
        }
    }
}

// ==========================================
// Rating - 供应商评分记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub supplier_id: String,
    pub sub_id: String,
    pub respondent_id: String,
    pub rating: f64,                     // 评分 [1,5]

    // ===== 可选过滤维度 =====
    #[serde(default)]
    pub plant_id: Option<String>,
    #[serde(default)]
    pub time_period: Option<String>,
    #[serde(default)]
    pub cheese_type: Option<String>,
}

impl Rating {
    pub fn new(supplier_id: &str, sub_id: &str, respondent_id: &str, rating: f64) -> Self {
        Self {
            supplier_id: supplier_id.to_string(),
            sub_id: sub_id.to_string(),
            respondent_id: respondent_id.to_string(),
            rating,
            plant_id: None,
            time_period: None,
            cheese_type: None,
        }
    }
}

// ==========================================
// RatingFilters - 评分等值过滤条件
// ==========================================
// 值为 None / 空串 / "ALL" 表示不过滤该维度
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingFilters {
    #[serde(default)]
    pub plant_id: Option<String>,
    #[serde(default)]
    pub time_period: Option<String>,
    #[serde(default)]
    pub cheese_type: Option<String>,
}

impl RatingFilters {
    fn active(value: &Option<String>) -> Option<&str> {
        match value.as_deref().map(str::trim) {
            None | Some("") | Some("ALL") => None,
            Some(v) => Some(v),
        }
    }

    /// 评分记录是否满足全部过滤条件
    pub fn matches(&self, rating: &Rating) -> bool {
        let check = |filter: &Option<String>, value: &Option<String>| match Self::active(filter) {
            None => true,
            Some(want) => value.as_deref() == Some(want),
        };
        check(&self.plant_id, &rating.plant_id)
            && check(&self.time_period, &rating.time_period)
            && check(&self.cheese_type, &rating.cheese_type)
    }

    pub fn is_empty(&self) -> bool {
        Self::active(&self.plant_id).is_none()
            && Self::active(&self.time_period).is_none()
            && Self::active(&self.cheese_type).is_none()
    }
}

// ==========================================
// Plant - 工厂需求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub plant_id: String,
    pub demand: f64,             // 需求量 ≥ 0
}

impl Plant {
    pub fn new(plant_id: &str, demand: f64) -> Self {
        Self {
            plant_id: plant_id.to_string(),
            demand,
        }
    }
}

// ==========================================
// AllocationSupplier - 供应经济参数视图
// ==========================================
// 与 Supplier 通过 supplier_id 关联
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSupplier {
    pub supplier_id: String,
    pub capacity: f64,                   // 产能 ≥ 0
    pub unit_cost: f64,                  // 单位成本 ≥ 0
    #[serde(default)]
    pub emission_score: f64,             // 排放评分 ≥ 0
    #[serde(default)]
    pub quality_score: Option<f64>,      // 原始质量分 (无评分排名时回退)
    #[serde(default)]
    pub region: Option<String>,          // 区域 (缺省时取供应商主数据)
}

impl AllocationSupplier {
    pub fn new(supplier_id: &str, capacity: f64, unit_cost: f64, emission_score: f64) -> Self {
        Self {
            supplier_id: supplier_id.to_string(),
            capacity,
            unit_cost,
            emission_score,
            quality_score: None,
            region: None,
        }
    }
}
