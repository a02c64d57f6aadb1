// ==========================================
// 供应商风险决策支持系统 - 情景仓储
// ==========================================
// 职责: 命名情景的保存/列举/加载/删除
// 存储: saved_scenario 表 (name 为规范化后的 slug, state 为 JSON)
// ==========================================

use crate::engine::scenario::ScenarioState;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// slug 最大长度
pub const MAX_SLUG_LEN: usize = 64;

/// 情景名规范化
///
/// 连续的非 `[A-Za-z0-9_-]` 字符替换为单个 `_`，截断至 64 字符；
/// 结果为空时以当前时间 `%Y%m%d_%H%M%S` 代替
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_run = false;
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            slug.push(ch);
            in_run = false;
        } else if !in_run {
            slug.push('_');
            in_run = true;
        }
    }
    // slug 只含 ASCII, 按字节截断安全
    slug.truncate(MAX_SLUG_LEN);

    if slug.is_empty() {
        Utc::now().format("%Y%m%d_%H%M%S").to_string()
    } else {
        slug
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedScenario {
    pub name: String,
    pub saved_at: DateTime<Utc>,
    pub state: ScenarioState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub name: String,
    pub saved_at: DateTime<Utc>,
}

pub struct ScenarioRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScenarioRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS saved_scenario (
              name TEXT PRIMARY KEY,
              saved_at TEXT NOT NULL,
              state_json TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_saved_scenario_saved_at ON saved_scenario(saved_at DESC);
            "#,
        )?;
        Ok(())
    }

    /// 保存情景（同名覆盖）
    ///
    /// # 返回
    /// 实际使用的 slug
    pub fn save(&self, name: &str, state: &ScenarioState) -> RepositoryResult<SavedScenario> {
        let saved = SavedScenario {
            name: slugify(name),
            saved_at: Utc::now(),
            state: state.clone(),
        };
        let state_json = serde_json::to_string(&saved.state)?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO saved_scenario (name, saved_at, state_json) VALUES (?1, ?2, ?3)
            ON CONFLICT(name) DO UPDATE SET saved_at = ?2, state_json = ?3
            "#,
            params![saved.name, saved.saved_at.to_rfc3339(), state_json],
        )?;

        tracing::info!(scenario = %saved.name, "情景已保存");
        Ok(saved)
    }

    /// 列举全部情景（按名称排序）
    pub fn list(&self) -> RepositoryResult<Vec<ScenarioSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT name, saved_at FROM saved_scenario ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (name, saved_at) = row?;
            out.push(ScenarioSummary {
                name,
                saved_at: parse_timestamp(&saved_at)?,
            });
        }
        Ok(out)
    }

    /// 加载情景（名称先规范化；不存在时返回 None）
    pub fn load(&self, name: &str) -> RepositoryResult<Option<SavedScenario>> {
        let slug = slugify(name);
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                "SELECT saved_at, state_json FROM saved_scenario WHERE name = ?1",
                params![slug],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((saved_at, state_json)) => Ok(Some(SavedScenario {
                name: slug,
                saved_at: parse_timestamp(&saved_at)?,
                state: serde_json::from_str(&state_json)?,
            })),
        }
    }

    /// 删除情景
    ///
    /// # 返回
    /// 是否删除了记录
    pub fn delete(&self, name: &str) -> RepositoryResult<bool> {
        let slug = slugify(name);
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM saved_scenario WHERE name = ?1", params![slug])?;
        Ok(affected > 0)
    }
}

fn parse_timestamp(raw: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepositoryError::ValidationError(format!("saved_at={}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_replaces_runs() {
        assert_eq!(slugify("  Q1 plan: high/risk  "), "Q1_plan_high_risk");
        assert_eq!(slugify("base-case_v2"), "base-case_v2");
        assert_eq!(slugify("a..b"), "a_b");
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "x".repeat(100);
        assert_eq!(slugify(&long).len(), MAX_SLUG_LEN);
    }

    #[test]
    fn test_slugify_empty_falls_back_to_timestamp() {
        let slug = slugify("   ");
        assert_eq!(slug.len(), 15);
        assert!(slug.chars().all(|c| c.is_ascii_digit() || c == '_'));
    }

    #[test]
    fn test_save_load_delete_in_memory() {
        let conn = Connection::open_in_memory().unwrap();
        let repo = ScenarioRepository::new(Arc::new(Mutex::new(conn))).unwrap();

        let state = ScenarioState::default();
        let saved = repo.save("my scenario", &state).unwrap();
        assert_eq!(saved.name, "my_scenario");

        let loaded = repo.load("my scenario").unwrap().unwrap();
        assert_eq!(loaded.state, state);
        assert_eq!(repo.list().unwrap().len(), 1);

        assert!(repo.delete("my_scenario").unwrap());
        assert!(repo.load("my_scenario").unwrap().is_none());
        assert!(!repo.delete("my_scenario").unwrap());
    }
}
