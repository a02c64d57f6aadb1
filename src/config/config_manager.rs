// ==========================================
// 供应商风险决策支持系统 - 配置管理器
// ==========================================
// 职责: 分析参数的加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// 规则: 缺失的键取默认值; 格式错误的值记 warn 并取默认值
// ==========================================

use crate::config::analysis_profile::{ActionBudget, AllocationParams, AnalysisConfig};
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::supplier::RatingFilters;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例 (config_kv 表不存在时自动创建)
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 会对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn.lock()?;
            configure_sqlite_connection(&guard)?;
            guard.execute_batch(
                "CREATE TABLE IF NOT EXISTS config_kv (
                    scope_id TEXT NOT NULL,
                    key      TEXT NOT NULL,
                    value    TEXT NOT NULL,
                    PRIMARY KEY (scope_id, key)
                );",
            )?;
        }
        Ok(Self { conn })
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.conn.lock()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.conn.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 删除配置值（恢复默认）
    pub fn remove_config_value(&self, key: &str) -> RepositoryResult<bool> {
        let conn = self.conn.lock()?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
        )?;
        Ok(affected > 0)
    }

    /// 获取所有 global 配置的快照
    pub fn config_snapshot(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.conn.lock()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    // ===== 类型化读取 =====

    fn get_f64(&self, key: &str, default: f64) -> RepositoryResult<f64> {
        Ok(match self.get_config_value(key)? {
            None => default,
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => v,
                _ => {
                    tracing::warn!(config_key = key, raw_value = %raw, "数值配置格式错误，使用默认值");
                    default
                }
            },
        })
    }

    fn get_opt_f64(&self, key: &str) -> RepositoryResult<Option<f64>> {
        Ok(match self.get_config_value(key)? {
            None => None,
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Some(v),
                _ => {
                    tracing::warn!(config_key = key, raw_value = %raw, "数值配置格式错误，视为未设置");
                    None
                }
            },
        })
    }

    fn get_bool(&self, key: &str, default: bool) -> RepositoryResult<bool> {
        Ok(match self.get_config_value(key)? {
            None => default,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    tracing::warn!(config_key = key, raw_value = %raw, "布尔配置格式错误，使用默认值");
                    default
                }
            },
        })
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str, default: T) -> RepositoryResult<T> {
        Ok(match self.get_config_value(key)? {
            None => default,
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|_| {
                tracing::warn!(config_key = key, raw_value = %raw, "JSON 配置格式错误，使用默认值");
                default
            }),
        })
    }

    fn get_opt_string(&self, key: &str) -> RepositoryResult<Option<String>> {
        Ok(self
            .get_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    /// 分配优化参数
    pub fn get_allocation_params(&self) -> RepositoryResult<AllocationParams> {
        let d = AllocationParams::default();
        Ok(AllocationParams {
            qwt: self.get_f64(config_keys::ALLOC_QWT, d.qwt)?,
            cwt: self.get_f64(config_keys::ALLOC_CWT, d.cwt)?,
            rwt: self.get_f64(config_keys::ALLOC_RWT, d.rwt)?,
            ewt: self.get_f64(config_keys::ALLOC_EWT, d.ewt)?,
            preferred_regions: self
                .get_json(config_keys::ALLOC_PREFERRED_REGIONS, d.preferred_regions)?,
            max_share_supplier: self
                .get_f64(config_keys::ALLOC_MAX_SHARE_SUPPLIER, d.max_share_supplier)?,
            max_share_per_plant_supplier: self.get_f64(
                config_keys::ALLOC_MAX_SHARE_PER_PLANT,
                d.max_share_per_plant_supplier,
            )?,
            min_total_supplier: self
                .get_f64(config_keys::ALLOC_MIN_TOTAL_SUPPLIER, d.min_total_supplier)?,
            excluded_suppliers: self
                .get_json(config_keys::ALLOC_EXCLUDED_SUPPLIERS, d.excluded_suppliers)?,
            min_quality_norm: self
                .get_f64(config_keys::ALLOC_MIN_QUALITY_NORM, d.min_quality_norm)?,
            region_min_shares: self
                .get_json(config_keys::ALLOC_REGION_MIN_SHARES, d.region_min_shares)?,
            region_max_shares: self
                .get_json(config_keys::ALLOC_REGION_MAX_SHARES, d.region_max_shares)?,
            max_total_emission: self.get_opt_f64(config_keys::ALLOC_MAX_TOTAL_EMISSION)?,
            allow_oversupply: self
                .get_bool(config_keys::ALLOC_ALLOW_OVERSUPPLY, d.allow_oversupply)?,
        })
    }

    /// 措施预算与目标权重
    pub fn get_action_budget(&self) -> RepositoryResult<ActionBudget> {
        let d = ActionBudget::default();
        Ok(ActionBudget {
            budget_cost: self.get_opt_f64(config_keys::ACTION_BUDGET_COST)?,
            budget_manhours: self.get_opt_f64(config_keys::ACTION_BUDGET_MANHOURS)?,
            w_te: self.get_f64(config_keys::ACTION_W_TE, d.w_te)?,
            w_cost: self.get_f64(config_keys::ACTION_W_COST, d.w_cost)?,
            w_manhours: self.get_f64(config_keys::ACTION_W_MANHOURS, d.w_manhours)?,
        })
    }

    /// ε 前沿目标（JSON 数组；缺失或格式错误时为空，由引擎自动生成）
    pub fn get_epsilon_targets(&self) -> RepositoryResult<Vec<f64>> {
        self.get_json(config_keys::EPSILON_TARGETS, Vec::new())
    }

    pub fn get_sensitivity_perturbation(&self) -> RepositoryResult<f64> {
        self.get_f64(
            config_keys::SENSITIVITY_PERTURBATION,
            AnalysisConfig::default().sensitivity_perturbation,
        )
    }

    pub fn get_rating_filters(&self) -> RepositoryResult<RatingFilters> {
        Ok(RatingFilters {
            plant_id: self.get_opt_string(config_keys::FILTER_PLANT_ID)?,
            time_period: self.get_opt_string(config_keys::FILTER_TIME_PERIOD)?,
            cheese_type: self.get_opt_string(config_keys::FILTER_CHEESE_TYPE)?,
        })
    }

    /// 加载完整分析参数
    pub fn load_analysis_config(&self) -> RepositoryResult<AnalysisConfig> {
        Ok(AnalysisConfig {
            filters: self.get_rating_filters()?,
            allocation: self.get_allocation_params()?,
            action_budget: self.get_action_budget()?,
            epsilon_targets: self.get_epsilon_targets()?,
            sensitivity_perturbation: self.get_sensitivity_perturbation()?,
        })
    }

    /// 将完整分析参数写回 config_kv（单事务）
    ///
    /// # 返回
    /// 写入的配置项数量（值为 None 的键被删除，不计入）
    pub fn apply_analysis_config(&self, config: &AnalysisConfig) -> RepositoryResult<usize> {
        let a = &config.allocation;
        let b = &config.action_budget;
        let f = &config.filters;

        let entries: Vec<(&str, Option<String>)> = vec![
            (config_keys::ALLOC_QWT, Some(a.qwt.to_string())),
            (config_keys::ALLOC_CWT, Some(a.cwt.to_string())),
            (config_keys::ALLOC_RWT, Some(a.rwt.to_string())),
            (config_keys::ALLOC_EWT, Some(a.ewt.to_string())),
            (
                config_keys::ALLOC_PREFERRED_REGIONS,
                Some(serde_json::to_string(&a.preferred_regions)?),
            ),
            (
                config_keys::ALLOC_MAX_SHARE_SUPPLIER,
                Some(a.max_share_supplier.to_string()),
            ),
            (
                config_keys::ALLOC_MAX_SHARE_PER_PLANT,
                Some(a.max_share_per_plant_supplier.to_string()),
            ),
            (
                config_keys::ALLOC_MIN_TOTAL_SUPPLIER,
                Some(a.min_total_supplier.to_string()),
            ),
            (
                config_keys::ALLOC_EXCLUDED_SUPPLIERS,
                Some(serde_json::to_string(&a.excluded_suppliers)?),
            ),
            (
                config_keys::ALLOC_MIN_QUALITY_NORM,
                Some(a.min_quality_norm.to_string()),
            ),
            (
                config_keys::ALLOC_REGION_MIN_SHARES,
                Some(serde_json::to_string(&a.region_min_shares)?),
            ),
            (
                config_keys::ALLOC_REGION_MAX_SHARES,
                Some(serde_json::to_string(&a.region_max_shares)?),
            ),
            (
                config_keys::ALLOC_MAX_TOTAL_EMISSION,
                a.max_total_emission.map(|v| v.to_string()),
            ),
            (
                config_keys::ALLOC_ALLOW_OVERSUPPLY,
                Some(a.allow_oversupply.to_string()),
            ),
            (config_keys::ACTION_BUDGET_COST, b.budget_cost.map(|v| v.to_string())),
            (
                config_keys::ACTION_BUDGET_MANHOURS,
                b.budget_manhours.map(|v| v.to_string()),
            ),
            (config_keys::ACTION_W_TE, Some(b.w_te.to_string())),
            (config_keys::ACTION_W_COST, Some(b.w_cost.to_string())),
            (config_keys::ACTION_W_MANHOURS, Some(b.w_manhours.to_string())),
            (
                config_keys::EPSILON_TARGETS,
                Some(serde_json::to_string(&config.epsilon_targets)?),
            ),
            (
                config_keys::SENSITIVITY_PERTURBATION,
                Some(config.sensitivity_perturbation.to_string()),
            ),
            (config_keys::FILTER_PLANT_ID, f.plant_id.clone()),
            (config_keys::FILTER_TIME_PERIOD, f.time_period.clone()),
            (config_keys::FILTER_CHEESE_TYPE, f.cheese_type.clone()),
        ];

        let mut conn = self.conn.lock()?;
        let tx = conn.transaction()?;
        let mut count = 0;
        for (key, value) in entries {
            match value {
                Some(v) => {
                    count += tx.execute(
                        "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
                         ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3",
                        params![GLOBAL_SCOPE, key, v],
                    )?;
                }
                None => {
                    tx.execute(
                        "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                        params![GLOBAL_SCOPE, key],
                    )?;
                }
            }
        }
        tx.commit()?;

        tracing::info!(entries = count, "分析参数已写入 config_kv");
        Ok(count)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 分配优化
    pub const ALLOC_QWT: &str = "allocation/qwt";
    pub const ALLOC_CWT: &str = "allocation/cwt";
    pub const ALLOC_RWT: &str = "allocation/rwt";
    pub const ALLOC_EWT: &str = "allocation/ewt";
    pub const ALLOC_PREFERRED_REGIONS: &str = "allocation/preferred_regions"; // JSON 数组
    pub const ALLOC_MAX_SHARE_SUPPLIER: &str = "allocation/max_share_supplier";
    pub const ALLOC_MAX_SHARE_PER_PLANT: &str = "allocation/max_share_per_plant_supplier";
    pub const ALLOC_MIN_TOTAL_SUPPLIER: &str = "allocation/min_total_supplier";
    pub const ALLOC_EXCLUDED_SUPPLIERS: &str = "allocation/excluded_suppliers"; // JSON 数组
    pub const ALLOC_MIN_QUALITY_NORM: &str = "allocation/min_quality_norm";
    pub const ALLOC_REGION_MIN_SHARES: &str = "allocation/region_min_shares"; // JSON 对象
    pub const ALLOC_REGION_MAX_SHARES: &str = "allocation/region_max_shares"; // JSON 对象
    pub const ALLOC_MAX_TOTAL_EMISSION: &str = "allocation/max_total_emission";
    pub const ALLOC_ALLOW_OVERSUPPLY: &str = "allocation/allow_oversupply";

    // 措施组合
    pub const ACTION_BUDGET_COST: &str = "action/budget_cost";
    pub const ACTION_BUDGET_MANHOURS: &str = "action/budget_manhours";
    pub const ACTION_W_TE: &str = "action/w_te";
    pub const ACTION_W_COST: &str = "action/w_cost";
    pub const ACTION_W_MANHOURS: &str = "action/w_manhours";
    pub const EPSILON_TARGETS: &str = "action/epsilon_targets"; // JSON 数组

    // 敏感性
    pub const SENSITIVITY_PERTURBATION: &str = "sensitivity/perturbation";

    // 评分过滤
    pub const FILTER_PLANT_ID: &str = "filter/plant_id";
    pub const FILTER_TIME_PERIOD: &str = "filter/time_period";
    pub const FILTER_CHEESE_TYPE: &str = "filter/cheese_type";
}
