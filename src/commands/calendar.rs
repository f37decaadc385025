//! Usage: Calendar viewer Tauri commands.

use crate::api::paths;
use crate::api::types::Paginated;
use crate::app_state::{DbInitState, SessionState};
use crate::commands::api_context;
use crate::domain::calendar::{self, CalendarEvent, EventFilter, EventQuery};
use crate::infra::settings;
use std::collections::HashMap;

#[tauri::command]
#[allow(clippy::too_many_arguments)]
pub(crate) async fn calendar_events_list(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    provider: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    search: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
) -> Result<Paginated<CalendarEvent>, String> {
    let page_size = match page_size {
        Some(size) => Some(size),
        None => settings::read(&app).ok().map(|s| s.default_page_size),
    };
    let query = EventQuery {
        provider,
        start_date,
        end_date,
        search,
        page,
        page_size,
    }
    .to_query()
    .map_err(String::from)?;

    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    client
        .get(&handle, paths::CALENDAR_EVENTS, query)
        .await
        .map_err(Into::into)
}

/// Instant narrowing of an already-fetched page while the user types, no
/// round trip. `providers_by_integration` comes from the integrations list
/// the view already holds.
#[tauri::command]
pub(crate) fn calendar_events_narrow(
    events: Vec<CalendarEvent>,
    providers_by_integration: HashMap<i64, String>,
    provider: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    search: Option<String>,
) -> Vec<CalendarEvent> {
    let filter = EventFilter {
        provider,
        start_date,
        end_date,
        search,
    };
    events
        .into_iter()
        .filter(|event| {
            let provider_of = providers_by_integration
                .get(&event.integration)
                .map(String::as_str)
                .unwrap_or("");
            calendar::event_matches(event, provider_of, &filter)
        })
        .collect()
}

#[tauri::command]
pub(crate) async fn calendar_event_get(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    event_id: i64,
) -> Result<CalendarEvent, String> {
    if event_id <= 0 {
        return Err("SEC_INVALID_INPUT: invalid event id".to_string());
    }
    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    client
        .get(&handle, &paths::calendar_event(event_id), Vec::new())
        .await
        .map_err(Into::into)
}
