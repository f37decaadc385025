//! Usage: Authentication and session Tauri commands.

use crate::api::paths;
use crate::api::types::MessageBody;
use crate::app_state::{DbInitState, SessionState};
use crate::blocking;
use crate::commands::api_context;
use crate::domain::session::{AuthTokens, Session, User};
use crate::shared::error::AppResult;
use crate::shared::mutex_ext::MutexExt;
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AuthStatus {
    pub authenticated: bool,
    pub user: Option<User>,
}

/// Login/register response: tokens plus the signed-in user.
#[derive(Debug, Clone, Deserialize)]
struct AuthResponse {
    user: User,
    access: String,
    refresh: String,
    #[serde(default)]
    message: String,
}

fn require_text(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("SEC_INVALID_INPUT: {field} is required").into());
    }
    Ok(value.to_string())
}

fn require_matching_passwords(first: &str, second: &str) -> AppResult<()> {
    if first != second {
        return Err("SEC_INVALID_INPUT: passwords do not match".into());
    }
    Ok(())
}

async fn store_auth_response(
    handle: crate::app_state::SessionHandle,
    response: AuthResponse,
) -> AppResult<User> {
    let session = Session {
        user: response.user,
        tokens: AuthTokens {
            access: response.access,
            refresh: response.refresh,
        },
    };
    let user = session.user.clone();
    blocking::run("auth_store_session", move || handle.set_session(session)).await?;
    if !response.message.is_empty() {
        tracing::debug!("auth endpoint message: {}", response.message);
    }
    Ok(user)
}

#[tauri::command]
pub(crate) fn auth_status_get(
    session_state: tauri::State<'_, SessionState>,
) -> AuthStatus {
    let session = session_state.0.lock_or_recover();
    AuthStatus {
        authenticated: session.is_some(),
        user: session.as_ref().map(|s| s.user.clone()),
    }
}

#[tauri::command]
pub(crate) async fn auth_login(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    email: String,
    password: String,
) -> Result<User, String> {
    let email = require_text(&email, "email")?;
    let password = require_text(&password, "password")?;

    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let response: AuthResponse = client
        .public(
            Method::POST,
            paths::AUTH_LOGIN,
            Some(serde_json::json!({ "email": email, "password": password })),
        )
        .await
        .map_err(String::from)?;

    store_auth_response(handle, response).await.map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn auth_register(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    username: String,
    email: String,
    password1: String,
    password2: String,
    first_name: Option<String>,
    last_name: Option<String>,
) -> Result<User, String> {
    let username = require_text(&username, "username")?;
    let email = require_text(&email, "email")?;
    let password1 = require_text(&password1, "password")?;
    require_matching_passwords(&password1, password2.trim()).map_err(String::from)?;

    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let response: AuthResponse = client
        .public(
            Method::POST,
            paths::AUTH_REGISTER,
            Some(serde_json::json!({
                "username": username,
                "email": email,
                "password1": password1,
                "password2": password1,
                "first_name": first_name.as_deref().unwrap_or("").trim(),
                "last_name": last_name.as_deref().unwrap_or("").trim(),
            })),
        )
        .await
        .map_err(String::from)?;

    store_auth_response(handle, response).await.map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn auth_logout(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
) -> Result<bool, String> {
    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;

    // Server-side logout is best-effort; local credentials go away regardless.
    if let Some(session) = handle.snapshot() {
        let result: AppResult<MessageBody> = client
            .public(
                Method::POST,
                paths::AUTH_LOGOUT,
                Some(serde_json::json!({ "access": session.tokens.access })),
            )
            .await;
        if let Err(err) = result {
            tracing::debug!("server logout failed (ignored): {}", err);
        }
    }

    blocking::run("auth_logout_clear", move || {
        crate::api::client::SessionStore::clear(&handle)
    })
    .await
    .map(|_| true)
    .map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn auth_refresh(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
) -> Result<bool, String> {
    use crate::api::client::SessionStore;

    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let Some(refresh) = handle.refresh_token() else {
        handle.clear()?;
        return Err("AUTH_RELOGIN_REQUIRED: no refresh token stored".to_string());
    };

    match client.refresh_tokens(&refresh).await {
        Ok(tokens) => {
            match tokens.refresh.as_deref() {
                Some(rotated) => handle.store_tokens(&tokens.access, rotated)?,
                None => handle.store_access_token(&tokens.access)?,
            }
            Ok(true)
        }
        Err(err) => {
            tracing::warn!("manual token refresh failed: {}", err);
            handle.clear()?;
            Err("AUTH_RELOGIN_REQUIRED: token refresh failed".to_string())
        }
    }
}

#[tauri::command]
pub(crate) async fn auth_user_get(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
) -> Result<User, String> {
    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let user: User = client
        .get(&handle, paths::AUTH_USER, Vec::new())
        .await
        .map_err(String::from)?;

    let stored = user.clone();
    blocking::run("auth_user_store", move || handle.set_user(stored)).await?;
    Ok(user)
}

#[tauri::command]
pub(crate) async fn auth_change_password(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    old_password: String,
    new_password1: String,
    new_password2: String,
) -> Result<String, String> {
    let old_password = require_text(&old_password, "old password")?;
    let new_password = require_text(&new_password1, "new password")?;
    require_matching_passwords(&new_password, new_password2.trim()).map_err(String::from)?;

    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let body: MessageBody = client
        .post(
            &handle,
            paths::AUTH_CHANGE_PASSWORD,
            serde_json::json!({
                "old_password": old_password,
                "new_password": new_password,
                "confirm_password": new_password,
            }),
        )
        .await
        .map_err(String::from)?;
    Ok(body.message)
}

#[tauri::command]
pub(crate) async fn auth_password_reset_request(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    email: String,
) -> Result<String, String> {
    let email = require_text(&email, "email")?;

    let (client, _handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let body: MessageBody = client
        .public(
            Method::POST,
            paths::AUTH_PASSWORD_RESET,
            Some(serde_json::json!({ "email": email })),
        )
        .await
        .map_err(String::from)?;
    Ok(body.message)
}

#[tauri::command]
pub(crate) async fn auth_password_reset_confirm(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    uidb64: String,
    token: String,
    new_password: String,
    confirm_password: String,
) -> Result<String, String> {
    let uidb64 = require_text(&uidb64, "uid")?;
    let token = require_text(&token, "token")?;
    let new_password = require_text(&new_password, "new password")?;
    require_matching_passwords(&new_password, confirm_password.trim()).map_err(String::from)?;

    let (client, _handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let body: MessageBody = client
        .public(
            Method::POST,
            &paths::auth_password_reset_confirm(&uidb64, &token),
            Some(serde_json::json!({
                "new_password": new_password,
                "confirm_password": new_password,
            })),
        )
        .await
        .map_err(String::from)?;
    Ok(body.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_text_trims_and_rejects_blank() {
        assert_eq!(require_text(" ada@example.com ", "email").unwrap(), "ada@example.com");
        let err = require_text("  ", "email").expect_err("must fail");
        assert!(err.to_string().contains("email is required"));
    }

    #[test]
    fn mismatched_passwords_are_rejected() {
        assert!(require_matching_passwords("a", "a").is_ok());
        assert!(require_matching_passwords("a", "b").is_err());
    }
}
