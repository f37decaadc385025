//! Usage: Integration dashboard and OAuth connect Tauri commands.

use crate::api::client::{ApiClient, QueryPairs};
use crate::api::oauth_callback::{self, OAuthCallbackPayload, DEFAULT_CALLBACK_PORT};
use crate::api::paths;
use crate::api::types::{MessageBody, Paginated};
use crate::app_state::{DbInitState, SessionHandle, SessionState};
use crate::commands::api_context;
use crate::domain::calendar::validate_page_size;
use crate::domain::integrations::{
    self, Integration, IntegrationStats, ProviderInfo, SyncLog, SyncType,
};
use crate::shared::error::AppResult;
use serde::{Deserialize, Serialize};
use std::process::Command;
use tauri::Emitter;
use tokio::{task, time::Duration};

/// How long the loopback listener waits for the user to finish in the browser.
const OAUTH_CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

pub(crate) const EVENT_OAUTH_PROGRESS: &str = "integrations:oauth-progress";
/// Fired on every exit path of the connect flow so the UI always returns to
/// the integrations view, success or not.
pub(crate) const EVENT_OAUTH_FINISHED: &str = "integrations:oauth-finished";

#[derive(Debug, Clone, Deserialize)]
struct OAuthInitiateResponse {
    oauth_url: String,
    state: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OAuthCompleteResponse {
    integration: Integration,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct DeletedData {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub calendar_events: u64,
    #[serde(default)]
    pub email_messages: u64,
    #[serde(default)]
    pub sync_logs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct DeleteSummary {
    #[serde(default)]
    pub message: String,
    pub deleted_data: DeletedData,
}

fn emit_progress(app: &tauri::AppHandle, provider: &str, step: &str) {
    let _ = app.emit(
        EVENT_OAUTH_PROGRESS,
        serde_json::json!({ "provider": provider, "step": step }),
    );
}

fn emit_finished(app: &tauri::AppHandle, provider: &str, ok: bool) {
    let _ = app.emit(
        EVENT_OAUTH_FINISHED,
        serde_json::json!({ "provider": provider, "ok": ok }),
    );
}

#[tauri::command]
pub(crate) async fn integrations_list(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
) -> Result<Vec<Integration>, String> {
    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    client
        .get(&handle, paths::INTEGRATIONS, QueryPairs::new())
        .await
        .map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn integrations_stats_get(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
) -> Result<IntegrationStats, String> {
    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    client
        .get(&handle, paths::INTEGRATIONS_STATS, QueryPairs::new())
        .await
        .map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn integrations_providers_list(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
) -> Result<Vec<ProviderInfo>, String> {
    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    match client
        .get::<Vec<ProviderInfo>>(&handle, paths::INTEGRATIONS_PROVIDERS, QueryPairs::new())
        .await
    {
        Ok(providers) => Ok(providers),
        Err(err) if err.code() == "AUTH_RELOGIN_REQUIRED" => Err(err.into()),
        Err(err) => {
            // The catalog is static enough to render offline.
            tracing::warn!("provider listing unavailable, using local catalog: {}", err);
            Ok(integrations::provider_catalog())
        }
    }
}

/// Full OAuth connect flow: initiate with the backend, hand off to the
/// browser, catch the loopback redirect, forward the code for completion.
#[tauri::command]
pub(crate) async fn integration_oauth_connect(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    provider: String,
) -> Result<Integration, String> {
    let provider = provider.trim().to_string();
    if !integrations::is_known_provider(&provider) {
        return Err("SEC_INVALID_INPUT: unknown provider".to_string());
    }

    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;

    let listener = oauth_callback::bind_callback_listener(DEFAULT_CALLBACK_PORT)
        .await
        .map_err(String::from)?;
    let redirect_uri = oauth_callback::redirect_uri(listener.port());

    let initiate: OAuthInitiateResponse = client
        .post(
            &handle,
            paths::OAUTH_INITIATE,
            serde_json::json!({ "provider": provider, "redirect_uri": redirect_uri }),
        )
        .await
        .map_err(String::from)?;

    emit_progress(&app, &provider, "waiting_callback");
    let expected_state = initiate.state;
    let callback_task = task::spawn(async move {
        oauth_callback::wait_for_callback(listener, &expected_state, OAUTH_CALLBACK_TIMEOUT).await
    });
    // Yield once so the callback task is parked on accept() before the
    // browser can possibly redirect.
    task::yield_now().await;

    if let Err(err) = open_browser(&initiate.oauth_url) {
        callback_task.abort();
        emit_finished(&app, &provider, false);
        return Err(err.to_string());
    }

    let payload = match callback_task.await {
        Ok(Ok(payload)) => payload,
        Ok(Err(err)) => {
            emit_finished(&app, &provider, false);
            return Err(err.to_string());
        }
        Err(err) => {
            emit_finished(&app, &provider, false);
            return Err(format!("SYSTEM_ERROR: oauth callback task failed: {err}"));
        }
    };

    emit_progress(&app, &provider, "completing");
    let result = complete_connect(&client, &handle, &provider, payload).await;
    emit_finished(&app, &provider, result.is_ok());
    result.map_err(Into::into)
}

/// Applies the callback contract: provider `error` or a missing `code`/`state`
/// is terminal, the provider identifier comes from the second `:`-separated
/// segment of `state`, and `{code, provider, state}` goes to the backend.
async fn complete_connect(
    client: &ApiClient,
    handle: &SessionHandle,
    requested_provider: &str,
    payload: OAuthCallbackPayload,
) -> AppResult<Integration> {
    if let Some(error) = payload.error.as_deref() {
        let description = payload
            .error_description
            .as_deref()
            .unwrap_or("authorization was not granted");
        return Err(format!("SYSTEM_ERROR: provider returned error={error}: {description}").into());
    }

    let code = payload
        .code
        .ok_or_else(|| "SEC_INVALID_INPUT: oauth callback missing code".to_string())?;
    let state = payload
        .state
        .ok_or_else(|| "SEC_INVALID_INPUT: oauth callback missing state".to_string())?;

    let provider = integrations::provider_from_state(&state)?;
    if provider != requested_provider {
        tracing::warn!(
            requested = requested_provider,
            from_state = %provider,
            "oauth state names a different provider; forwarding the state's value"
        );
    }

    let response: OAuthCompleteResponse = client
        .post(
            handle,
            paths::OAUTH_CALLBACK,
            serde_json::json!({ "code": code, "provider": provider, "state": state }),
        )
        .await?;
    if !response.message.is_empty() {
        tracing::info!(provider = %provider, "{}", response.message);
    }
    Ok(response.integration)
}

#[tauri::command]
pub(crate) async fn integration_disconnect(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    integration_id: i64,
) -> Result<String, String> {
    if integration_id <= 0 {
        return Err("SEC_INVALID_INPUT: invalid integration id".to_string());
    }
    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let body: MessageBody = client
        .delete(&handle, &paths::integration_disconnect(integration_id))
        .await
        .map_err(String::from)?;
    Ok(body.message)
}

#[tauri::command]
pub(crate) async fn integration_delete(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    integration_id: i64,
) -> Result<DeleteSummary, String> {
    if integration_id <= 0 {
        return Err("SEC_INVALID_INPUT: invalid integration id".to_string());
    }
    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    client
        .delete(&handle, &paths::integration_delete(integration_id))
        .await
        .map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn integration_sync_run(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    integration_id: i64,
    sync_type: String,
) -> Result<String, String> {
    if integration_id <= 0 {
        return Err("SEC_INVALID_INPUT: invalid integration id".to_string());
    }
    let sync_type = SyncType::parse_strict(&sync_type)
        .ok_or_else(|| "SEC_INVALID_INPUT: sync_type must be calendar|email|full".to_string())?;

    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let body: MessageBody = client
        .post(
            &handle,
            &paths::integration_sync(integration_id),
            serde_json::json!({ "sync_type": sync_type.as_str() }),
        )
        .await
        .map_err(String::from)?;
    Ok(body.message)
}

#[tauri::command]
pub(crate) async fn sync_logs_list(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    integration_id: Option<i64>,
    sync_type: Option<String>,
    status: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
) -> Result<Paginated<SyncLog>, String> {
    validate_page_size(page_size).map_err(String::from)?;

    let mut query = QueryPairs::new();
    if let Some(id) = integration_id {
        if id <= 0 {
            return Err("SEC_INVALID_INPUT: invalid integration id".to_string());
        }
        query.push(("integration", id.to_string()));
    }
    if let Some(sync_type) = sync_type.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        let sync_type = SyncType::parse_strict(sync_type)
            .ok_or_else(|| "SEC_INVALID_INPUT: sync_type must be calendar|email|full".to_string())?;
        query.push(("sync_type", sync_type.as_str().to_string()));
    }
    if let Some(status) = status.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        query.push(("status", status.to_string()));
    }
    if let Some(page) = page {
        query.push(("page", page.to_string()));
    }
    if let Some(page_size) = page_size {
        query.push(("page_size", page_size.to_string()));
    }

    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    client
        .get(&handle, paths::SYNC_LOGS, query)
        .await
        .map_err(Into::into)
}

fn open_browser(url: &str) -> AppResult<()> {
    #[cfg(target_os = "windows")]
    {
        build_windows_open_browser_command(url)
            .spawn()
            .map_err(|e| format!("SYSTEM_ERROR: failed to open browser: {e}"))?;
        return Ok(());
    }

    #[cfg(target_os = "macos")]
    {
        Command::new("open")
            .arg(url)
            .spawn()
            .map_err(|e| format!("SYSTEM_ERROR: failed to open browser: {e}"))?;
        return Ok(());
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        Command::new("xdg-open")
            .arg(url)
            .spawn()
            .map_err(|e| format!("SYSTEM_ERROR: failed to open browser: {e}"))?;
        return Ok(());
    }

    #[allow(unreachable_code)]
    Err("SYSTEM_ERROR: browser open is unsupported on this platform"
        .to_string()
        .into())
}

#[cfg(target_os = "windows")]
fn build_windows_open_browser_command(url: &str) -> Command {
    let mut cmd = Command::new("rundll32.exe");
    // Use the Windows URL protocol handler directly to force the default
    // browser; `explorer <url>` opens File Explorer for some URL shapes.
    cmd.arg("url.dll,FileProtocolHandler").arg(url);
    cmd
}

#[cfg(all(test, target_os = "windows"))]
mod windows_open_browser_tests {
    use super::build_windows_open_browser_command;
    use std::ffi::OsStr;

    #[test]
    fn windows_browser_command_uses_protocol_handler() {
        let cmd = build_windows_open_browser_command("https://example.com/auth?x=1&y=2");

        assert_eq!(cmd.get_program(), OsStr::new("rundll32.exe"));
        let args = cmd
            .get_args()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            args,
            vec![
                "url.dll,FileProtocolHandler",
                "https://example.com/auth?x=1&y=2"
            ]
        );
    }
}
