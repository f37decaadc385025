//! Usage: v2 adds per-agent chat session tracking.

use rusqlite::Connection;

pub(super) fn migrate_v1_to_v2(conn: &mut Connection) -> crate::shared::error::AppResult<()> {
    let tx = conn
        .transaction()
        .map_err(|e| format!("failed to start sqlite transaction: {e}"))?;

    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS agent_sessions (
  agent_type TEXT PRIMARY KEY,
  session_id TEXT NOT NULL,
  updated_at INTEGER NOT NULL
);
"#,
    )
    .map_err(|e| format!("failed to apply v1->v2 migration: {e}"))?;

    super::set_user_version(&tx, 2)?;
    tx.commit()
        .map_err(|e| format!("failed to commit sqlite transaction: {e}"))?;
    Ok(())
}
