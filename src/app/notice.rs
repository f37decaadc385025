//! Usage: Ephemeral toast notices pushed to the webview.

use crate::shared::error::AppResult;
use rand::RngCore;
use serde::Serialize;
use tauri::Emitter;

pub(crate) const EVENT_NOTICE: &str = "app:notice";
const MAX_TITLE_LEN: usize = 120;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
    Warning,
    Info,
}

impl NoticeLevel {
    pub(crate) fn parse_strict(raw: &str) -> Option<Self> {
        match raw.trim() {
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub id: String,
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
    /// 0 means sticky: the UI keeps the toast until dismissed.
    pub duration_ms: u32,
}

fn random_notice_id() -> String {
    use rand::rngs::OsRng;
    let mut bytes = [0u8; 8];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub(crate) fn build(
    level: NoticeLevel,
    title: &str,
    message: &str,
    duration_ms: u32,
) -> AppResult<Notice> {
    let title = title.trim();
    if title.is_empty() {
        return Err("SEC_INVALID_INPUT: notice title is required".into());
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(format!("SEC_INVALID_INPUT: notice title must be <= {MAX_TITLE_LEN} chars").into());
    }

    Ok(Notice {
        id: random_notice_id(),
        level,
        title: title.to_string(),
        message: message.trim().to_string(),
        duration_ms,
    })
}

pub(crate) fn send<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
    level: NoticeLevel,
    title: &str,
    message: &str,
    duration_ms: u32,
) -> AppResult<Notice> {
    let notice = build(level, title, message, duration_ms)?;
    let _ = app.emit(EVENT_NOTICE, notice.clone());
    Ok(notice)
}
