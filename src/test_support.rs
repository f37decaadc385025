//! Usage: Public test helpers for integration tests.

use std::path::PathBuf;

fn serialize_json(
    value: impl serde::Serialize,
) -> crate::shared::error::AppResult<serde_json::Value> {
    Ok(serde_json::to_value(value)
        .map_err(|e| format!("SYSTEM_ERROR: failed to serialize json: {e}"))?)
}

pub fn app_data_dir<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
) -> crate::shared::error::AppResult<PathBuf> {
    crate::infra::app_paths::app_data_dir(app)
}

pub fn db_path<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
) -> crate::shared::error::AppResult<PathBuf> {
    crate::infra::db::db_path(app)
}

pub fn init_db<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
) -> crate::shared::error::AppResult<()> {
    crate::infra::db::init(app).map(|_| ())
}

pub fn provider_catalog_json() -> crate::shared::error::AppResult<serde_json::Value> {
    serialize_json(crate::domain::integrations::provider_catalog())
}

pub fn agent_catalog_json() -> crate::shared::error::AppResult<serde_json::Value> {
    serialize_json(crate::domain::agents::agent_catalog())
}

pub fn oauth_provider_from_state(state: &str) -> crate::shared::error::AppResult<String> {
    crate::domain::integrations::provider_from_state(state)
}
