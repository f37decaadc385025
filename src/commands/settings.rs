//! Usage: App settings related Tauri commands.

use crate::blocking;
use crate::infra::settings::{self, AppSettings, Theme};

#[tauri::command]
#[specta::specta]
pub(crate) async fn settings_get(app: tauri::AppHandle) -> Result<AppSettings, String> {
    blocking::run("settings_get", move || settings::read(&app))
        .await
        .map_err(Into::into)
}

#[tauri::command]
#[specta::specta]
pub(crate) async fn settings_set(
    app: tauri::AppHandle,
    settings: AppSettings,
) -> Result<AppSettings, String> {
    blocking::run("settings_set", move || settings::write(&app, &settings))
        .await
        .map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn settings_theme_set(
    app: tauri::AppHandle,
    theme: String,
) -> Result<Theme, String> {
    let theme = Theme::parse_strict(&theme)
        .ok_or_else(|| "SEC_INVALID_INPUT: theme must be light|dark".to_string())?;
    blocking::run("settings_theme_set", move || {
        let mut current = settings::read(&app)?;
        current.theme = theme;
        settings::write(&app, &current).map(|saved| saved.theme)
    })
    .await
    .map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn settings_theme_toggle(app: tauri::AppHandle) -> Result<Theme, String> {
    blocking::run("settings_theme_toggle", move || {
        let mut current = settings::read(&app)?;
        current.theme = current.theme.toggled();
        settings::write(&app, &current).map(|saved| saved.theme)
    })
    .await
    .map_err(Into::into)
}
