mod api;
mod app;
mod commands;
mod domain;
mod infra;
mod shared;
pub mod test_support;

pub(crate) use app::app_state;
pub(crate) use infra::{app_paths, db, settings};
pub(crate) use shared::blocking;

use app_state::{ensure_db_ready, DbInitState, SessionState};
use commands::*;
use tauri::Manager;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let builder = tauri::Builder::default()
        .manage(DbInitState::default())
        .manage(SessionState::default())
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_clipboard_manager::init());

    #[cfg(desktop)]
    let builder = builder
        .plugin(tauri_plugin_autostart::Builder::new().build())
        .plugin(tauri_plugin_notification::init())
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            if let Some(window) = app.get_webview_window("main") {
                let _ = window.show();
                let _ = window.set_focus();
            }
        }));

    builder
        .setup(|app| {
            crate::app::logging::init(app.handle());

            // Global panic hook: write panics to the disk logs for post-mortem
            // diagnosis. The payload is intentionally NOT logged, it may carry
            // user content.
            std::panic::set_hook(Box::new(|panic_info| {
                let location = panic_info
                    .location()
                    .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                    .unwrap_or_else(|| "unknown".to_string());
                tracing::error!(
                    location = %location,
                    "PANIC: application panicked at {location}. Check the log file for context leading up to this panic."
                );
            }));

            let app_handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                let db_state = app_handle.state::<DbInitState>();
                let db = match ensure_db_ready(app_handle.clone(), db_state.inner()).await {
                    Ok(db) => db,
                    Err(err) => {
                        tracing::error!("database initialization failed: {}", err);
                        return;
                    }
                };

                let hydrated = blocking::run("startup_session_hydrate", {
                    let app_handle = app_handle.clone();
                    move || {
                        let session_state = app_handle.state::<SessionState>();
                        app_state::hydrate_session(&db, session_state.inner())
                    }
                })
                .await;
                match hydrated {
                    Ok(found) => {
                        tracing::info!(session_present = found, "session store hydrated")
                    }
                    Err(err) => tracing::warn!("session hydrate failed: {}", err),
                }

                match blocking::run("startup_read_settings", {
                    let app_handle = app_handle.clone();
                    move || settings::read(&app_handle)
                })
                .await
                {
                    Ok(cfg) => {
                        tracing::info!(api_base_url = %cfg.api_base_url, "settings loaded")
                    }
                    Err(err) => tracing::warn!("settings read failed, using defaults: {}", err),
                }
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            settings_get,
            settings_set,
            settings_theme_set,
            settings_theme_toggle,
            app_about_get,
            app_data_dir_get,
            notice_send,
            app_frontend_error_report,
            auth_status_get,
            auth_login,
            auth_register,
            auth_logout,
            auth_refresh,
            auth_user_get,
            auth_change_password,
            auth_password_reset_request,
            auth_password_reset_confirm,
            integrations_list,
            integrations_stats_get,
            integrations_providers_list,
            integration_oauth_connect,
            integration_disconnect,
            integration_delete,
            integration_sync_run,
            sync_logs_list,
            calendar_events_list,
            calendar_events_narrow,
            calendar_event_get,
            email_messages_list,
            email_messages_narrow,
            email_message_get,
            github_connection_check,
            github_repositories_list,
            github_repository_create,
            github_repository_get,
            github_repository_update,
            github_repository_delete,
            github_repository_branches_list,
            github_repository_commits_list,
            github_repository_collaborators_list,
            github_collaborator_add,
            github_repository_contents_list,
            agents_list,
            agent_chat_send,
            agent_session_clear,
            chatbot_send,
            profile_get,
            profile_update,
            profile_delete_account,
            profile_verify_email,
            profile_resend_verification
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

/// Specta type export configuration.
///
/// Uses `tauri_specta::Builder` to export TypeScript bindings for the subset of
/// Tauri commands annotated with `#[specta::specta]`.
/// Currently only the `settings` module is registered (POC / gradual migration).
///
/// Run `cargo test export_bindings -- --ignored` to regenerate `dist/generated/bindings.ts`.
#[cfg(test)]
#[test]
#[ignore = "run manually: cargo test export_bindings -- --ignored"]
fn export_bindings() {
    let builder =
        tauri_specta::Builder::<tauri::Wry>::new().commands(tauri_specta::collect_commands![
            commands::settings::settings_get,
            commands::settings::settings_set
        ]);

    builder
        .export(
            specta_typescript::Typescript::default(),
            "dist/generated/bindings.ts",
        )
        .expect("failed to export specta TypeScript bindings");
}
