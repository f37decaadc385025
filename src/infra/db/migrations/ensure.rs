//! Usage: Idempotent schema patches that run on every startup.
//!
//! Unlike versioned migrations these must be safe to apply repeatedly; they
//! repair installs whose migration run was interrupted midway.

use rusqlite::Connection;

pub(super) fn apply_ensure_patches(conn: &mut Connection) -> crate::shared::error::AppResult<()> {
    ensure_agent_sessions_table(conn)?;
    Ok(())
}

fn ensure_agent_sessions_table(conn: &Connection) -> crate::shared::error::AppResult<()> {
    conn.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS agent_sessions (
  agent_type TEXT PRIMARY KEY,
  session_id TEXT NOT NULL,
  updated_at INTEGER NOT NULL
);
"#,
    )
    .map_err(|e| format!("failed to ensure agent_sessions table: {e}"))?;
    Ok(())
}
