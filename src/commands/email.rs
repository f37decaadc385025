//! Usage: Email viewer Tauri commands.

use crate::api::paths;
use crate::api::types::Paginated;
use crate::app_state::{DbInitState, SessionState};
use crate::commands::api_context;
use crate::domain::email::{self, EmailFilter, EmailMessage, EmailQuery};
use crate::infra::settings;

#[tauri::command]
#[allow(clippy::too_many_arguments)]
pub(crate) async fn email_messages_list(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    provider: Option<String>,
    is_read: Option<bool>,
    is_important: Option<bool>,
    search: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
) -> Result<Paginated<EmailMessage>, String> {
    let page_size = match page_size {
        Some(size) => Some(size),
        None => settings::read(&app).ok().map(|s| s.default_page_size),
    };
    let query = EmailQuery {
        provider,
        is_read,
        is_important,
        search,
        page,
        page_size,
    }
    .to_query()
    .map_err(String::from)?;

    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    client
        .get(&handle, paths::EMAIL_MESSAGES, query)
        .await
        .map_err(Into::into)
}

/// Instant narrowing of an already-fetched page while the user types.
#[tauri::command]
pub(crate) fn email_messages_narrow(
    messages: Vec<EmailMessage>,
    is_read: Option<bool>,
    is_important: Option<bool>,
    search: Option<String>,
) -> Vec<EmailMessage> {
    let filter = EmailFilter {
        is_read,
        is_important,
        search,
    };
    messages
        .into_iter()
        .filter(|message| email::message_matches(message, &filter))
        .collect()
}

#[tauri::command]
pub(crate) async fn email_message_get(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    message_id: i64,
) -> Result<EmailMessage, String> {
    if message_id <= 0 {
        return Err("SEC_INVALID_INPUT: invalid message id".to_string());
    }
    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    client
        .get(&handle, &paths::email_message(message_id), Vec::new())
        .await
        .map_err(Into::into)
}
