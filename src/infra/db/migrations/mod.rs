//! Usage: SQLite schema migrations (user_version + incremental upgrades).

mod baseline_v1;
mod ensure;
mod v1_to_v2;

use rusqlite::Connection;

const LATEST_SCHEMA_VERSION: i64 = 2;
const MAX_COMPAT_SCHEMA_VERSION: i64 = 4;

pub(super) fn apply_migrations(conn: &mut Connection) -> crate::shared::error::AppResult<()> {
    let mut user_version = read_user_version(conn)?;

    if user_version < 0 || user_version > MAX_COMPAT_SCHEMA_VERSION {
        return Err(format!(
            "unsupported sqlite schema version: user_version={user_version} (expected 0..={MAX_COMPAT_SCHEMA_VERSION})"
        )
        .into());
    }

    let start_version = user_version;

    // Fresh install: create complete schema at v1
    if user_version == 0 {
        baseline_v1::create_baseline_v1(conn)?;
        user_version = read_user_version(conn)?;
        tracing::info!(to_version = user_version, "sqlite baseline schema created");
    }

    while user_version < LATEST_SCHEMA_VERSION {
        let from_version = user_version;
        match user_version {
            1 => v1_to_v2::migrate_v1_to_v2(conn)?,
            v => {
                tracing::error!(
                    version = v,
                    "unsupported sqlite schema version during migration"
                );
                return Err(format!(
                    "unsupported sqlite schema version: user_version={v} (expected 0..={MAX_COMPAT_SCHEMA_VERSION})"
                )
                .into());
            }
        }
        user_version = read_user_version(conn)?;
        tracing::info!(
            from_version = from_version,
            to_version = user_version,
            "sqlite migration step completed"
        );
    }

    if start_version < user_version {
        tracing::info!(
            from_version = start_version,
            to_version = user_version,
            "sqlite migrations completed"
        );
    }

    // Idempotent ensure patches (always run)
    ensure::apply_ensure_patches(conn)?;

    // Normalize dev builds back to LATEST_SCHEMA_VERSION
    let user_version = read_user_version(conn)?;
    if user_version > LATEST_SCHEMA_VERSION {
        let tx = conn
            .transaction()
            .map_err(|e| format!("failed to start sqlite transaction: {e}"))?;
        set_user_version(&tx, LATEST_SCHEMA_VERSION)?;
        tx.commit()
            .map_err(|e| format!("failed to commit sqlite transaction: {e}"))?;
    }

    Ok(())
}

fn read_user_version(conn: &Connection) -> crate::shared::error::AppResult<i64> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| format!("failed to read sqlite user_version: {e}").into())
}

pub(super) fn set_user_version(
    tx: &rusqlite::Transaction<'_>,
    version: i64,
) -> crate::shared::error::AppResult<()> {
    tx.pragma_update(None, "user_version", version)
        .map_err(|e| format!("failed to update sqlite user_version: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests;
