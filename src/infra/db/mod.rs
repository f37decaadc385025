//! Usage: SQLite connection setup, schema migrations, and common DB helpers.

mod migrations;

use crate::app_paths;
use crate::shared::error::db_err;
use crate::shared::error::AppResult;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DB_FILE_NAME: &str = "integrato.db";
const BUSY_TIMEOUT_DEFAULT: Duration = Duration::from_millis(2000);
const POOL_MAX_SIZE_DEFAULT: u32 = 4;
const POOL_MIN_IDLE_DEFAULT: u32 = 1;
const POOL_CONNECTION_TIMEOUT_DEFAULT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct DbRuntimeConfig {
    busy_timeout: Duration,
    pool_max_size: u32,
    pool_min_idle: u32,
    pool_connection_timeout: Duration,
}

impl DbRuntimeConfig {
    fn from_env() -> Self {
        Self::from_env_get(|key| env::var(key).ok())
    }

    fn from_env_get(mut get: impl FnMut(&str) -> Option<String>) -> Self {
        let busy_timeout = get("INTEGRATO_DB_BUSY_TIMEOUT_MS")
            .as_deref()
            .and_then(parse_u64_trimmed)
            .filter(|v| *v > 0)
            .map(Duration::from_millis)
            .unwrap_or(BUSY_TIMEOUT_DEFAULT);

        let pool_max_size = get("INTEGRATO_DB_POOL_MAX_SIZE")
            .as_deref()
            .and_then(parse_u32_trimmed)
            .filter(|v| *v > 0)
            .unwrap_or(POOL_MAX_SIZE_DEFAULT);

        let pool_min_idle_raw = get("INTEGRATO_DB_POOL_MIN_IDLE")
            .as_deref()
            .and_then(parse_u32_trimmed)
            .unwrap_or(POOL_MIN_IDLE_DEFAULT);
        let pool_min_idle = pool_min_idle_raw.min(pool_max_size);

        let pool_connection_timeout = get("INTEGRATO_DB_POOL_CONNECTION_TIMEOUT_MS")
            .as_deref()
            .and_then(parse_u64_trimmed)
            .filter(|v| *v > 0)
            .map(Duration::from_millis)
            .unwrap_or(POOL_CONNECTION_TIMEOUT_DEFAULT);

        Self {
            busy_timeout,
            pool_max_size,
            pool_min_idle,
            pool_connection_timeout,
        }
    }
}

fn parse_u32_trimmed(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<u32>().ok()
}

fn parse_u64_trimmed(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<u64>().ok()
}

#[derive(Clone)]
pub(crate) struct Db {
    pool: Pool<SqliteConnectionManager>,
}

impl Db {
    pub(crate) fn open_connection(
        &self,
    ) -> AppResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| db_err!("failed to get connection from pool: {e}"))
    }
}

pub fn db_path<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<PathBuf> {
    Ok(app_paths::app_data_dir(app)?.join(DB_FILE_NAME))
}

pub fn init<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<Db> {
    init_at(&db_path(app)?)
}

/// Pool construction against an explicit path; integration tests point this
/// at a temp directory instead of the real app data dir.
pub(crate) fn init_at(path: &Path) -> AppResult<Db> {
    let path_hint = path.to_string_lossy().to_string();

    let config = DbRuntimeConfig::from_env();
    tracing::info!(
        busy_timeout_ms = config.busy_timeout.as_millis(),
        pool_max_size = config.pool_max_size,
        pool_min_idle = config.pool_min_idle,
        pool_connection_timeout_ms = config.pool_connection_timeout.as_millis(),
        "sqlite runtime config"
    );

    let manager = SqliteConnectionManager::file(path).with_init({
        let config = config.clone();
        move |conn| {
            conn.busy_timeout(config.busy_timeout)?;
            configure_connection(conn)
        }
    });

    let pool = Pool::builder()
        .max_size(config.pool_max_size)
        .min_idle(Some(config.pool_min_idle))
        .connection_timeout(config.pool_connection_timeout)
        .build(manager)
        .map_err(|e| db_err!("failed to create db pool: {e}"))?;
    let mut conn = pool
        .get()
        .map_err(|e| db_err!("failed to get startup connection: {e}"))?;

    migrations::apply_migrations(&mut conn)
        .map_err(|e| format!("sqlite migration failed at {path_hint}: {e}"))?;

    Ok(Db { pool })
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA synchronous = NORMAL;
PRAGMA temp_store = MEMORY;
"#,
    )?;

    Ok(())
}

#[cfg(test)]
pub(crate) fn open_test_db() -> (tempfile::TempDir, Db) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = init_at(&dir.path().join(DB_FILE_NAME)).expect("test db init");
    (dir, db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn db_runtime_config_defaults_match_constants() {
        let cfg = DbRuntimeConfig::from_env_get(|_| None);
        assert_eq!(cfg.busy_timeout, BUSY_TIMEOUT_DEFAULT);
        assert_eq!(cfg.pool_max_size, POOL_MAX_SIZE_DEFAULT);
        assert_eq!(cfg.pool_min_idle, POOL_MIN_IDLE_DEFAULT);
        assert_eq!(cfg.pool_connection_timeout, POOL_CONNECTION_TIMEOUT_DEFAULT);
    }

    #[test]
    fn db_runtime_config_parses_env_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("INTEGRATO_DB_BUSY_TIMEOUT_MS", "1500"),
            ("INTEGRATO_DB_POOL_MAX_SIZE", "12"),
            ("INTEGRATO_DB_POOL_MIN_IDLE", "10"),
            ("INTEGRATO_DB_POOL_CONNECTION_TIMEOUT_MS", "2500"),
        ]);
        let cfg = DbRuntimeConfig::from_env_get(|key| vars.get(key).map(|v| (*v).to_string()));
        assert_eq!(cfg.busy_timeout, Duration::from_millis(1500));
        assert_eq!(cfg.pool_max_size, 12);
        assert_eq!(cfg.pool_min_idle, 10);
        assert_eq!(cfg.pool_connection_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn db_runtime_config_clamps_min_idle_to_max_size() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("INTEGRATO_DB_POOL_MAX_SIZE", "2"),
            ("INTEGRATO_DB_POOL_MIN_IDLE", "10"),
        ]);
        let cfg = DbRuntimeConfig::from_env_get(|key| vars.get(key).map(|v| (*v).to_string()));
        assert_eq!(cfg.pool_max_size, 2);
        assert_eq!(cfg.pool_min_idle, 2);
    }

    #[test]
    fn db_runtime_config_ignores_invalid_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("INTEGRATO_DB_BUSY_TIMEOUT_MS", "0"),
            ("INTEGRATO_DB_POOL_MAX_SIZE", "nope"),
            ("INTEGRATO_DB_POOL_CONNECTION_TIMEOUT_MS", ""),
        ]);
        let cfg = DbRuntimeConfig::from_env_get(|key| vars.get(key).map(|v| (*v).to_string()));
        assert_eq!(cfg.busy_timeout, BUSY_TIMEOUT_DEFAULT);
        assert_eq!(cfg.pool_max_size, POOL_MAX_SIZE_DEFAULT);
        assert_eq!(cfg.pool_connection_timeout, POOL_CONNECTION_TIMEOUT_DEFAULT);
    }

    #[test]
    fn init_at_creates_schema_and_pool() {
        let (_dir, db) = open_test_db();
        let conn = db.open_connection().expect("connection");
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('auth_session', 'agent_sessions')",
                [],
                |row| row.get(0),
            )
            .expect("schema query");
        assert_eq!(count, 2);
    }
}
