//! Usage: Resolve (and create) the per-user application data directory.

use crate::shared::error::AppResult;
use std::path::PathBuf;
use tauri::Manager;

/// Override for the dot-directory name, used by dev builds to keep test data
/// away from a production install.
const DOTDIR_ENV: &str = "INTEGRATO_DOTDIR_NAME";
const DEFAULT_DOTDIR: &str = ".integrato";

pub fn app_data_dir<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<PathBuf> {
    let dotdir = std::env::var(DOTDIR_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_DOTDIR.to_string());

    let home = app
        .path()
        .home_dir()
        .map_err(|e| format!("SYSTEM_ERROR: failed to resolve home dir: {e}"))?;
    let dir = home.join(dotdir);

    std::fs::create_dir_all(&dir)
        .map_err(|e| format!("SYSTEM_ERROR: failed to create app data dir: {e}"))?;
    Ok(dir)
}

pub(crate) fn logs_dir<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<PathBuf> {
    let dir = app_data_dir(app)?.join("logs");
    std::fs::create_dir_all(&dir)
        .map_err(|e| format!("SYSTEM_ERROR: failed to create logs dir: {e}"))?;
    Ok(dir)
}
