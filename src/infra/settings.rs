//! Usage: Persisted application settings (schema + read/write helpers).

use crate::app_paths;
use crate::shared::error::AppResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{OnceLock, RwLock};
use std::time::{Duration, Instant};

pub const SCHEMA_VERSION: u32 = 3;
const SCHEMA_VERSION_ADD_NOTICE_DURATION: u32 = 2;
const SCHEMA_VERSION_ADD_AUTO_START: u32 = 3;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
/// Matches the 10s request timeout the web client shipped with.
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u32 = 10;
const MAX_REQUEST_TIMEOUT_SECONDS: u32 = 300;
const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_NOTICE_DURATION_MS: u32 = 5000;
const MAX_NOTICE_DURATION_MS: u32 = 60_000;
const CACHE_TTL: Duration = Duration::from_secs(5);

#[derive(Clone)]
struct CachedSettings {
    data: AppSettings,
    last_updated: Instant,
}

static SETTINGS_CACHE: OnceLock<RwLock<Option<CachedSettings>>> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, specta::Type)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
}

impl Default for Theme {
    fn default() -> Self {
        Self::Light
    }
}

impl Theme {
    pub(crate) fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub(crate) fn parse_strict(raw: &str) -> Option<Self> {
        match raw.trim() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, specta::Type)]
#[serde(default)]
pub struct AppSettings {
    pub schema_version: u32,
    /// Base URL of the Integrato backend, without a trailing slash.
    pub api_base_url: String,
    pub theme: Theme,
    pub request_timeout_seconds: u32,
    pub default_page_size: u32,
    pub notice_duration_ms: u32,
    pub auto_start: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            theme: Theme::default(),
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
            default_page_size: DEFAULT_PAGE_SIZE,
            notice_duration_ms: DEFAULT_NOTICE_DURATION_MS,
            auto_start: false,
        }
    }
}

fn sanitize_api_base_url(settings: &mut AppSettings) -> bool {
    let trimmed = settings.api_base_url.trim().trim_end_matches('/');
    let normalized = if trimmed.is_empty() {
        DEFAULT_API_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    };

    if settings.api_base_url != normalized {
        settings.api_base_url = normalized;
        return true;
    }
    false
}

fn sanitize_request_timeout(settings: &mut AppSettings) -> bool {
    let mut changed = false;
    if settings.request_timeout_seconds == 0 {
        settings.request_timeout_seconds = DEFAULT_REQUEST_TIMEOUT_SECONDS;
        changed = true;
    }
    if settings.request_timeout_seconds > MAX_REQUEST_TIMEOUT_SECONDS {
        settings.request_timeout_seconds = MAX_REQUEST_TIMEOUT_SECONDS;
        changed = true;
    }
    changed
}

fn sanitize_page_size(settings: &mut AppSettings) -> bool {
    let mut changed = false;
    if settings.default_page_size == 0 {
        settings.default_page_size = DEFAULT_PAGE_SIZE;
        changed = true;
    }
    if settings.default_page_size > MAX_PAGE_SIZE {
        settings.default_page_size = MAX_PAGE_SIZE;
        changed = true;
    }
    changed
}

fn sanitize_notice_duration(settings: &mut AppSettings) -> bool {
    // 0 is a valid value: sticky notices that require an explicit dismiss.
    if settings.notice_duration_ms > MAX_NOTICE_DURATION_MS {
        settings.notice_duration_ms = MAX_NOTICE_DURATION_MS;
        return true;
    }
    false
}

/// Generic schema migration helper for versions that only bump `schema_version`.
///
/// Returns `true` if the settings were modified (i.e. migration was applied).
fn migrate_bump_schema_version(
    settings: &mut AppSettings,
    schema_version_present: bool,
    target_version: u32,
) -> bool {
    if schema_version_present && settings.schema_version >= target_version {
        return false;
    }

    let mut changed = false;

    // If schema_version is missing, force a write to persist schema_version so we don't keep
    // "migrating" on every startup.
    if !schema_version_present {
        changed = true;
    }

    if settings.schema_version != target_version {
        settings.schema_version = target_version;
        changed = true;
    }

    changed
}

fn migrate_add_notice_duration(settings: &mut AppSettings, schema_version_present: bool) -> bool {
    // v2: Add toast auto-dismiss duration (default 5000ms).
    migrate_bump_schema_version(
        settings,
        schema_version_present,
        SCHEMA_VERSION_ADD_NOTICE_DURATION,
    )
}

fn migrate_add_auto_start(settings: &mut AppSettings, schema_version_present: bool) -> bool {
    // v3: Add launch-at-login toggle (default disabled).
    migrate_bump_schema_version(
        settings,
        schema_version_present,
        SCHEMA_VERSION_ADD_AUTO_START,
    )
}

fn migrate_and_sanitize(settings: &mut AppSettings, schema_version_present: bool) -> bool {
    let mut changed = false;
    changed |= migrate_add_notice_duration(settings, schema_version_present);
    changed |= migrate_add_auto_start(settings, schema_version_present);
    changed |= sanitize_api_base_url(settings);
    changed |= sanitize_request_timeout(settings);
    changed |= sanitize_page_size(settings);
    changed |= sanitize_notice_duration(settings);
    changed
}

fn settings_path<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<PathBuf> {
    Ok(app_paths::app_data_dir(app)?.join("settings.json"))
}

fn parse_settings_json(content: &str) -> AppResult<(AppSettings, bool)> {
    let raw: serde_json::Value =
        serde_json::from_str(content).map_err(|e| format!("failed to parse settings.json: {e}"))?;
    let schema_version_present = raw.get("schema_version").is_some();
    let settings: AppSettings =
        serde_json::from_value(raw).map_err(|e| format!("failed to parse settings.json: {e}"))?;
    Ok((settings, schema_version_present))
}

fn cache_store(settings: &AppSettings) {
    let cache = SETTINGS_CACHE.get_or_init(|| RwLock::new(None));
    if let Ok(mut guard) = cache.write() {
        *guard = Some(CachedSettings {
            data: settings.clone(),
            last_updated: Instant::now(),
        });
    }
}

pub fn read<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<AppSettings> {
    let cache = SETTINGS_CACHE.get_or_init(|| RwLock::new(None));

    if let Ok(guard) = cache.read() {
        if let Some(cached) = guard.as_ref() {
            if cached.last_updated.elapsed() < CACHE_TTL {
                return Ok(cached.data.clone());
            }
        }
    }

    let path = settings_path(app)?;

    if !path.exists() {
        let settings = AppSettings::default();
        let _ = write(app, &settings);
        return Ok(settings);
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("failed to read settings: {e}"))?;
    let (mut settings, schema_version_present) = parse_settings_json(&content)?;

    if migrate_and_sanitize(&mut settings, schema_version_present) {
        // Best-effort: persist the repaired file so the migration runs once.
        let _ = write(app, &settings);
    } else {
        cache_store(&settings);
    }

    Ok(settings)
}

pub fn write<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
    settings: &AppSettings,
) -> AppResult<AppSettings> {
    let mut settings = settings.clone();
    settings.schema_version = SCHEMA_VERSION;
    migrate_and_sanitize(&mut settings, true);

    let path = settings_path(app)?;
    let content = serde_json::to_string_pretty(&settings)
        .map_err(|e| format!("failed to serialize settings: {e}"))?;
    std::fs::write(&path, content).map_err(|e| format!("failed to write settings: {e}"))?;

    cache_store(&settings);
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let settings = AppSettings::default();
        assert_eq!(settings.schema_version, SCHEMA_VERSION);
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(
            settings.request_timeout_seconds,
            DEFAULT_REQUEST_TIMEOUT_SECONDS
        );
        assert_eq!(settings.default_page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(settings.notice_duration_ms, DEFAULT_NOTICE_DURATION_MS);
        assert!(!settings.auto_start);
    }

    #[test]
    fn theme_toggle_flips_between_light_and_dark() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::parse_strict("dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse_strict("blue"), None);
    }

    #[test]
    fn sanitize_trims_trailing_slash_from_base_url() {
        let mut settings = AppSettings {
            api_base_url: "https://api.example.com/api/".to_string(),
            ..AppSettings::default()
        };
        assert!(sanitize_api_base_url(&mut settings));
        assert_eq!(settings.api_base_url, "https://api.example.com/api");
    }

    #[test]
    fn sanitize_restores_default_base_url_when_blank() {
        let mut settings = AppSettings {
            api_base_url: "   ".to_string(),
            ..AppSettings::default()
        };
        assert!(sanitize_api_base_url(&mut settings));
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let mut settings = AppSettings {
            request_timeout_seconds: 10_000,
            default_page_size: 0,
            notice_duration_ms: 600_000,
            ..AppSettings::default()
        };
        assert!(migrate_and_sanitize(&mut settings, true));
        assert_eq!(settings.request_timeout_seconds, MAX_REQUEST_TIMEOUT_SECONDS);
        assert_eq!(settings.default_page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(settings.notice_duration_ms, MAX_NOTICE_DURATION_MS);
    }

    #[test]
    fn zero_notice_duration_means_sticky_and_survives_sanitize() {
        let mut settings = AppSettings {
            notice_duration_ms: 0,
            ..AppSettings::default()
        };
        assert!(!sanitize_notice_duration(&mut settings));
        assert_eq!(settings.notice_duration_ms, 0);
    }

    #[test]
    fn missing_schema_version_forces_migration_write() {
        let (mut settings, schema_version_present) =
            parse_settings_json(r#"{"theme": "dark"}"#).expect("parse");
        assert!(!schema_version_present);
        assert!(migrate_and_sanitize(&mut settings, schema_version_present));
        assert_eq!(settings.schema_version, SCHEMA_VERSION);
        assert_eq!(settings.theme, Theme::Dark);
    }

    #[test]
    fn old_schema_version_is_bumped_to_latest() {
        let (mut settings, schema_version_present) =
            parse_settings_json(r#"{"schema_version": 1}"#).expect("parse");
        assert!(schema_version_present);
        assert!(migrate_and_sanitize(&mut settings, schema_version_present));
        assert_eq!(settings.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn current_schema_version_is_left_alone() {
        let raw = serde_json::to_string(&AppSettings::default()).expect("serialize");
        let (mut settings, schema_version_present) = parse_settings_json(&raw).expect("parse");
        assert!(schema_version_present);
        assert!(!migrate_and_sanitize(&mut settings, schema_version_present));
    }
}
