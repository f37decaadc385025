pub(crate) mod agents;
pub(crate) mod app;
pub(crate) mod auth;
pub(crate) mod calendar;
pub(crate) mod email;
pub(crate) mod github;
pub(crate) mod integrations;
pub(crate) mod profile;
pub(crate) mod settings;

pub(crate) use agents::*;
pub(crate) use app::*;
pub(crate) use auth::*;
pub(crate) use calendar::*;
pub(crate) use email::*;
pub(crate) use github::*;
pub(crate) use integrations::*;
pub(crate) use profile::*;
pub(crate) use settings::*;

use crate::api::client::ApiClient;
use crate::app_state::{ensure_db_ready, DbInitState, SessionHandle, SessionState};
use crate::shared::error::AppResult;

/// Everything a backend-facing command needs: a configured client plus the
/// session handle the refresh contract works against.
pub(crate) async fn api_context(
    app: &tauri::AppHandle,
    db_state: &DbInitState,
    session_state: &SessionState,
) -> AppResult<(ApiClient, SessionHandle)> {
    let db = ensure_db_ready(app.clone(), db_state).await?;
    let client = ApiClient::from_app(app)?;
    Ok((client, SessionHandle::new(app.clone(), db, session_state)))
}
