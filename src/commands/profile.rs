//! Usage: User profile Tauri commands.

use crate::api::paths;
use crate::api::types::MessageBody;
use crate::app_state::{DbInitState, SessionState};
use crate::blocking;
use crate::commands::api_context;
use crate::domain::session::User;

#[tauri::command]
pub(crate) async fn profile_get(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
) -> Result<User, String> {
    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    client
        .get(&handle, paths::USERS_PROFILE, Vec::new())
        .await
        .map_err(Into::into)
}

#[tauri::command]
#[allow(clippy::too_many_arguments)]
pub(crate) async fn profile_update(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    first_name: Option<String>,
    last_name: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    birth_date: Option<String>,
) -> Result<User, String> {
    let mut body = serde_json::Map::new();
    if let Some(first_name) = first_name {
        body.insert("first_name".into(), first_name.trim().into());
    }
    if let Some(last_name) = last_name {
        body.insert("last_name".into(), last_name.trim().into());
    }
    if let Some(bio) = bio {
        body.insert("bio".into(), bio.trim().into());
    }
    if let Some(location) = location {
        body.insert("location".into(), location.trim().into());
    }
    if let Some(birth_date) = birth_date.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        body.insert("birth_date".into(), birth_date.into());
    }
    if body.is_empty() {
        return Err("SEC_INVALID_INPUT: profile update has no fields to change".to_string());
    }

    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let user: User = client
        .patch(&handle, paths::USERS_PROFILE, serde_json::Value::Object(body))
        .await
        .map_err(String::from)?;

    // Keep the cached session's user in step with the server.
    let stored = user.clone();
    blocking::run("profile_update_store", move || handle.set_user(stored)).await?;
    Ok(user)
}

#[tauri::command]
pub(crate) async fn profile_delete_account(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
) -> Result<String, String> {
    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let body: MessageBody = client
        .delete(&handle, paths::USERS_PROFILE)
        .await
        .map_err(String::from)?;

    blocking::run("profile_delete_clear_session", move || {
        crate::api::client::SessionStore::clear(&handle)
    })
    .await?;
    Ok(body.message)
}

#[tauri::command]
pub(crate) async fn profile_verify_email(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    token: String,
) -> Result<String, String> {
    let token = token.trim().to_string();
    if token.is_empty() {
        return Err("SEC_INVALID_INPUT: token is required".to_string());
    }

    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let body: MessageBody = client
        .post(
            &handle,
            paths::USERS_VERIFY_EMAIL,
            serde_json::json!({ "token": token }),
        )
        .await
        .map_err(String::from)?;
    Ok(body.message)
}

#[tauri::command]
pub(crate) async fn profile_resend_verification(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
) -> Result<String, String> {
    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let body: MessageBody = client
        .post(
            &handle,
            paths::USERS_RESEND_VERIFICATION,
            serde_json::json!({}),
        )
        .await
        .map_err(String::from)?;
    Ok(body.message)
}
