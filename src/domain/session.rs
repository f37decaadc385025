//! Usage: Signed-in session persistence (current user + bearer token pair).

use crate::shared::error::db_err;
use crate::shared::error::AppResult;
use crate::shared::time::now_unix_seconds;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub bio: String,
    pub location: String,
    pub birth_date: Option<String>,
    pub is_email_verified: bool,
    pub date_joined: String,
    pub last_login: Option<String>,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: 0,
            username: String::new(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            full_name: String::new(),
            avatar: None,
            bio: String::new(),
            location: String::new(),
            birth_date: None,
            is_email_verified: false,
            date_joined: String::new(),
            last_login: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthTokens {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub user: User,
    pub tokens: AuthTokens,
}

fn normalize_token(raw: &str, field: &str) -> AppResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(format!("SEC_INVALID_INPUT: {field} is required").into());
    }
    Ok(value.to_string())
}

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<(String, String, String), rusqlite::Error> {
    Ok((
        row.get("user_json")?,
        row.get("access_token")?,
        row.get("refresh_token")?,
    ))
}

pub(crate) fn load(conn: &Connection) -> AppResult<Option<Session>> {
    let row = conn
        .query_row(
            "SELECT user_json, access_token, refresh_token FROM auth_session WHERE id = 1",
            [],
            row_to_session,
        )
        .optional()
        .map_err(|e| db_err!("failed to load auth session: {e}"))?;

    let Some((user_json, access, refresh)) = row else {
        return Ok(None);
    };

    let user: User = serde_json::from_str(&user_json)
        .map_err(|e| format!("SYSTEM_ERROR: stored session user is invalid json: {e}"))?;

    Ok(Some(Session {
        user,
        tokens: AuthTokens { access, refresh },
    }))
}

pub(crate) fn save(conn: &Connection, session: &Session) -> AppResult<()> {
    let access = normalize_token(&session.tokens.access, "access token")?;
    let refresh = normalize_token(&session.tokens.refresh, "refresh token")?;
    let user_json = serde_json::to_string(&session.user)
        .map_err(|e| format!("SYSTEM_ERROR: failed to serialize session user: {e}"))?;
    let now = now_unix_seconds();

    conn.execute(
        r#"
INSERT INTO auth_session (id, user_json, access_token, refresh_token, created_at, updated_at)
VALUES (1, ?1, ?2, ?3, ?4, ?4)
ON CONFLICT (id) DO UPDATE SET
  user_json = excluded.user_json,
  access_token = excluded.access_token,
  refresh_token = excluded.refresh_token,
  updated_at = excluded.updated_at
"#,
        params![user_json, access, refresh, now],
    )
    .map_err(|e| db_err!("failed to save auth session: {e}"))?;
    Ok(())
}

pub(crate) fn update_access_token(conn: &Connection, access: &str) -> AppResult<bool> {
    let access = normalize_token(access, "access token")?;
    let changed = conn
        .execute(
            "UPDATE auth_session SET access_token = ?1, updated_at = ?2 WHERE id = 1",
            params![access, now_unix_seconds()],
        )
        .map_err(|e| db_err!("failed to update access token: {e}"))?;
    Ok(changed > 0)
}

pub(crate) fn update_tokens(conn: &Connection, access: &str, refresh: &str) -> AppResult<bool> {
    let access = normalize_token(access, "access token")?;
    let refresh = normalize_token(refresh, "refresh token")?;
    let changed = conn
        .execute(
            "UPDATE auth_session SET access_token = ?1, refresh_token = ?2, updated_at = ?3 WHERE id = 1",
            params![access, refresh, now_unix_seconds()],
        )
        .map_err(|e| db_err!("failed to update token pair: {e}"))?;
    Ok(changed > 0)
}

pub(crate) fn update_user(conn: &Connection, user: &User) -> AppResult<bool> {
    let user_json = serde_json::to_string(user)
        .map_err(|e| format!("SYSTEM_ERROR: failed to serialize session user: {e}"))?;
    let changed = conn
        .execute(
            "UPDATE auth_session SET user_json = ?1, updated_at = ?2 WHERE id = 1",
            params![user_json, now_unix_seconds()],
        )
        .map_err(|e| db_err!("failed to update session user: {e}"))?;
    Ok(changed > 0)
}

pub(crate) fn clear(conn: &Connection) -> AppResult<bool> {
    let changed = conn
        .execute("DELETE FROM auth_session WHERE id = 1", [])
        .map_err(|e| db_err!("failed to clear auth session: {e}"))?;
    Ok(changed > 0)
}

#[cfg(test)]
pub(crate) fn test_session(access: &str, refresh: &str) -> Session {
    Session {
        user: User {
            id: 7,
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            full_name: "Ada Lovelace".to_string(),
            ..User::default()
        },
        tokens: AuthTokens {
            access: access.to_string(),
            refresh: refresh.to_string(),
        },
    }
}
