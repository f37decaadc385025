//! Usage: Shared Tauri state: DB initialization gate and the signed-in session store.

use crate::api::client::SessionStore;
use crate::domain::session::{self, Session, User};
use crate::shared::error::AppResult;
use crate::shared::mutex_ext::MutexExt;
use crate::{blocking, db};
use std::sync::{Arc, Mutex};
use tauri::Emitter;
use tokio::sync::OnceCell;

/// Emitted when the stored credentials are gone for good; the webview routes
/// to the login view on it.
pub(crate) const EVENT_AUTH_LOGOUT: &str = "auth:logout";

#[derive(Default)]
pub(crate) struct DbInitState(pub(crate) OnceCell<AppResult<db::Db>>);

pub(crate) async fn ensure_db_ready(
    app: tauri::AppHandle,
    state: &DbInitState,
) -> AppResult<db::Db> {
    state
        .0
        .get_or_init(|| async move { blocking::run("db_init", move || db::init(&app)).await })
        .await
        .clone()
}

/// In-memory mirror of the persisted session; hydrated once at startup.
#[derive(Default)]
pub(crate) struct SessionState(pub(crate) Arc<Mutex<Option<Session>>>);

pub(crate) fn hydrate_session(db: &db::Db, state: &SessionState) -> AppResult<bool> {
    let conn = db.open_connection()?;
    let loaded = session::load(&conn)?;
    let found = loaded.is_some();
    *state.0.lock_or_recover() = loaded;
    Ok(found)
}

/// Couples the in-memory session with its SQLite row and the logout event.
/// This is the production `SessionStore` the API client works against.
#[derive(Clone)]
pub(crate) struct SessionHandle {
    app: tauri::AppHandle,
    db: db::Db,
    cache: Arc<Mutex<Option<Session>>>,
}

impl SessionHandle {
    pub(crate) fn new(app: tauri::AppHandle, db: db::Db, state: &SessionState) -> Self {
        Self {
            app,
            db,
            cache: Arc::clone(&state.0),
        }
    }

    pub(crate) fn snapshot(&self) -> Option<Session> {
        self.cache.lock_or_recover().clone()
    }

    pub(crate) fn current_user(&self) -> Option<User> {
        self.cache
            .lock_or_recover()
            .as_ref()
            .map(|session| session.user.clone())
    }

    pub(crate) fn set_session(&self, new_session: Session) -> AppResult<()> {
        let conn = self.db.open_connection()?;
        session::save(&conn, &new_session)?;
        *self.cache.lock_or_recover() = Some(new_session);
        Ok(())
    }

    pub(crate) fn set_user(&self, user: User) -> AppResult<()> {
        let conn = self.db.open_connection()?;
        session::update_user(&conn, &user)?;
        if let Some(active) = self.cache.lock_or_recover().as_mut() {
            active.user = user;
        }
        Ok(())
    }
}

impl SessionStore for SessionHandle {
    fn access_token(&self) -> Option<String> {
        self.cache
            .lock_or_recover()
            .as_ref()
            .map(|session| session.tokens.access.clone())
    }

    fn refresh_token(&self) -> Option<String> {
        self.cache
            .lock_or_recover()
            .as_ref()
            .map(|session| session.tokens.refresh.clone())
    }

    fn store_access_token(&self, access: &str) -> AppResult<()> {
        let conn = self.db.open_connection()?;
        session::update_access_token(&conn, access)?;
        if let Some(active) = self.cache.lock_or_recover().as_mut() {
            active.tokens.access = access.to_string();
        }
        Ok(())
    }

    fn store_tokens(&self, access: &str, refresh: &str) -> AppResult<()> {
        let conn = self.db.open_connection()?;
        session::update_tokens(&conn, access, refresh)?;
        if let Some(active) = self.cache.lock_or_recover().as_mut() {
            active.tokens.access = access.to_string();
            active.tokens.refresh = refresh.to_string();
        }
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        let conn = self.db.open_connection()?;
        session::clear(&conn)?;
        *self.cache.lock_or_recover() = None;
        let _ = self.app.emit(EVENT_AUTH_LOGOUT, ());
        Ok(())
    }
}
