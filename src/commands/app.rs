//! Usage: App-level Tauri commands (about, data dir, toasts, frontend error reports).

use crate::app::notice::{self, Notice, NoticeLevel};
use crate::app_paths;
use crate::infra::settings;

#[derive(Debug, Clone, serde::Serialize)]
pub(crate) struct AboutInfo {
    pub name: &'static str,
    pub version: &'static str,
}

#[tauri::command]
pub(crate) fn app_about_get() -> AboutInfo {
    AboutInfo {
        name: "Integrato",
        version: env!("CARGO_PKG_VERSION"),
    }
}

#[tauri::command]
pub(crate) fn app_data_dir_get(app: tauri::AppHandle) -> Result<String, String> {
    app_paths::app_data_dir(&app)
        .map(|dir| dir.to_string_lossy().to_string())
        .map_err(Into::into)
}

#[tauri::command]
pub(crate) fn notice_send(
    app: tauri::AppHandle,
    level: String,
    title: String,
    message: Option<String>,
    duration_ms: Option<u32>,
) -> Result<Notice, String> {
    let level = NoticeLevel::parse_strict(&level)
        .ok_or_else(|| "SEC_INVALID_INPUT: level must be success|error|warning|info".to_string())?;
    let duration_ms = match duration_ms {
        Some(value) => value,
        None => settings::read(&app).map(|s| s.notice_duration_ms).unwrap_or(5000),
    };

    notice::send(&app, level, &title, message.as_deref().unwrap_or(""), duration_ms)
        .map_err(Into::into)
}

#[tauri::command]
pub(crate) fn app_frontend_error_report(message: String, stack: Option<String>) {
    tracing::error!(
        stack = stack.as_deref().unwrap_or(""),
        "frontend error: {}",
        message
    );
}
