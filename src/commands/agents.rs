//! Usage: Agent chat Tauri commands.

use crate::api::paths;
use crate::app_state::{ensure_db_ready, DbInitState, SessionState};
use crate::blocking;
use crate::commands::api_context;
use crate::domain::agents::{
    self, AgentChatTurn, AgentInfo, AgentKind, ChatReply, ANONYMOUS_USER_ID,
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
struct ChatbotReply {
    #[serde(default)]
    response: String,
}

#[tauri::command]
pub(crate) fn agents_list() -> Vec<AgentInfo> {
    agents::agent_catalog()
}

#[tauri::command]
pub(crate) async fn agent_chat_send(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    agent_type: String,
    message: String,
) -> Result<AgentChatTurn, String> {
    let kind = AgentKind::parse_strict(&agent_type)
        .ok_or_else(|| "SEC_INVALID_INPUT: unknown agent_type".to_string())?;
    let message = message.trim().to_string();
    if message.is_empty() {
        return Err("SEC_INVALID_INPUT: message is required".to_string());
    }

    let db = ensure_db_ready(app.clone(), db_state.inner()).await?;
    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;

    let session_id = blocking::run("agent_chat_session_load", {
        let db = db.clone();
        move || {
            let conn = db.open_connection()?;
            agents::stored_session_id(&conn, kind)
        }
    })
    .await?;

    let user_id = handle
        .current_user()
        .map(|user| user.id.to_string())
        .unwrap_or_else(|| ANONYMOUS_USER_ID.to_string());

    let reply: ChatReply = client
        .post(
            &handle,
            paths::AGENTS_CHAT,
            serde_json::json!({
                "message": message,
                "agent_type": kind.as_str(),
                "session_id": session_id,
                "user_id": user_id,
            }),
        )
        .await
        .map_err(String::from)?;

    let remembered = reply.session_id.clone();
    blocking::run("agent_chat_session_store", move || {
        let conn = db.open_connection()?;
        agents::remember_session_id(&conn, kind, &remembered)
    })
    .await?;

    Ok(agents::interpret_reply(kind, reply))
}

#[tauri::command]
pub(crate) async fn agent_session_clear(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    agent_type: String,
) -> Result<bool, String> {
    let kind = AgentKind::parse_strict(&agent_type)
        .ok_or_else(|| "SEC_INVALID_INPUT: unknown agent_type".to_string())?;

    let db = ensure_db_ready(app, db_state.inner()).await?;
    blocking::run("agent_session_clear", move || {
        let conn = db.open_connection()?;
        agents::clear_session_id(&conn, kind)
    })
    .await
    .map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn chatbot_send(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    message: String,
) -> Result<String, String> {
    let message = message.trim().to_string();
    if message.is_empty() {
        return Err("SEC_INVALID_INPUT: message is required".to_string());
    }

    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let reply: ChatbotReply = client
        .post(
            &handle,
            paths::CHATBOT,
            serde_json::json!({ "message": message }),
        )
        .await
        .map_err(String::from)?;
    Ok(reply.response)
}
