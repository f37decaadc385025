//! Usage: Typed HTTP access to the Integrato backend (bearer attach + single refresh retry).

use crate::api::paths;
use crate::shared::error::{AppError, AppResult};
use crate::shared::security::mask_token;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const ERROR_DETAIL_MAX_CHARS: usize = 240;
const ERROR_BODY_SNIPPET_MAX_CHARS: usize = 500;

pub(crate) type QueryPairs = Vec<(&'static str, String)>;

/// Access to the stored session for authenticated calls.
///
/// `app_state::SessionHandle` is the production implementation (SQLite-backed,
/// emits the forced-logout event on clear); tests use an in-memory stub.
pub(crate) trait SessionStore: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    fn store_access_token(&self, access: &str) -> AppResult<()>;
    fn store_tokens(&self, access: &str, refresh: &str) -> AppResult<()>;
    /// Drop the session everywhere (memory + disk) and signal the UI to show login.
    fn clear(&self) -> AppResult<()>;
}

#[derive(Debug, Clone)]
pub(crate) struct RefreshedTokens {
    pub(crate) access: String,
    pub(crate) refresh: Option<String>,
}

pub(crate) struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub(crate) fn new(base_url: &str, request_timeout: Duration) -> AppResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err("SEC_INVALID_INPUT: api base url is required".into());
        }

        let http = reqwest::Client::builder()
            .user_agent(format!("integrato-desktop/{}", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| format!("SYSTEM_ERROR: http client init failed: {e}"))?;

        Ok(Self { http, base_url })
    }

    pub(crate) fn from_app<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<Self> {
        let settings = crate::settings::read(app)?;
        Self::new(
            &settings.api_base_url,
            Duration::from_secs(u64::from(settings.request_timeout_seconds)),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Option<&Value>,
        bearer: Option<&str>,
    ) -> AppResult<reqwest::Response> {
        let mut request = self.http.request(method, self.url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        request
            .send()
            .await
            .map_err(|e| AppError::new("API_UNREACHABLE", format!("request to {path} failed: {e}")))
    }

    /// Unauthenticated call (login, register, password reset). No bearer, no refresh.
    pub(crate) async fn public<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> AppResult<T> {
        let response = self.send_once(method, path, &[], body.as_ref(), None).await?;
        read_json(path, response).await
    }

    /// Authenticated call carrying the stored access token.
    ///
    /// On 401 this makes exactly one refresh attempt with the stored refresh
    /// token, then replays the original request once with the new access
    /// token. The replay goes through `send_once` directly, so a second 401 is
    /// a terminal error rather than another refresh. A failed refresh clears
    /// the session, which forces the UI back to the login view.
    pub(crate) async fn authed<T: DeserializeOwned>(
        &self,
        session: &dyn SessionStore,
        method: Method,
        path: &str,
        query: QueryPairs,
        body: Option<Value>,
    ) -> AppResult<T> {
        let access = session.access_token();
        let response = self
            .send_once(method.clone(), path, &query, body.as_ref(), access.as_deref())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return read_json(path, response).await;
        }

        let Some(refresh) = session.refresh_token() else {
            session.clear()?;
            return Err(relogin_required("no refresh token stored"));
        };

        let tokens = match self.refresh_tokens(&refresh).await {
            Ok(tokens) => tokens,
            Err(err) => {
                tracing::warn!(path, "token refresh failed: {}", err);
                session.clear()?;
                return Err(relogin_required("token refresh failed"));
            }
        };
        match tokens.refresh.as_deref() {
            Some(rotated) => session.store_tokens(&tokens.access, rotated)?,
            None => session.store_access_token(&tokens.access)?,
        }
        tracing::debug!(
            path,
            access = %mask_token(&tokens.access),
            "access token refreshed; replaying original request"
        );

        let retry = self
            .send_once(method, path, &query, body.as_ref(), Some(tokens.access.as_str()))
            .await?;
        read_json(path, retry).await
    }

    pub(crate) async fn refresh_tokens(&self, refresh_token: &str) -> AppResult<RefreshedTokens> {
        let body = serde_json::json!({ "refresh": refresh_token });
        let response = self
            .send_once(Method::POST, paths::AUTH_TOKEN_REFRESH, &[], Some(&body), None)
            .await?;
        let value: Value = read_json(paths::AUTH_TOKEN_REFRESH, response).await?;

        let access = value
            .get("access")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| "SYSTEM_ERROR: token refresh response missing access".to_string())?
            .to_string();
        let refresh = value
            .get("refresh")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        Ok(RefreshedTokens { access, refresh })
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        session: &dyn SessionStore,
        path: &str,
        query: QueryPairs,
    ) -> AppResult<T> {
        self.authed(session, Method::GET, path, query, None).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        session: &dyn SessionStore,
        path: &str,
        body: Value,
    ) -> AppResult<T> {
        self.authed(session, Method::POST, path, Vec::new(), Some(body))
            .await
    }

    pub(crate) async fn patch<T: DeserializeOwned>(
        &self,
        session: &dyn SessionStore,
        path: &str,
        body: Value,
    ) -> AppResult<T> {
        self.authed(session, Method::PATCH, path, Vec::new(), Some(body))
            .await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(
        &self,
        session: &dyn SessionStore,
        path: &str,
    ) -> AppResult<T> {
        self.authed(session, Method::DELETE, path, Vec::new(), None)
            .await
    }
}

fn relogin_required(reason: &str) -> AppError {
    AppError::new(
        "AUTH_RELOGIN_REQUIRED",
        format!("session expired ({reason}); sign in again"),
    )
}

async fn read_json<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> AppResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| format!("SYSTEM_ERROR: response read failed for {path}: {e}"))?;

    if !status.is_success() {
        return Err(api_error(path, status, &body));
    }

    serde_json::from_str(&body)
        .map_err(|e| format!("SYSTEM_ERROR: response json invalid for {path}: {e}").into())
}

fn status_code_label(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "API_BAD_REQUEST",
        401 => "API_UNAUTHORIZED",
        403 => "API_FORBIDDEN",
        404 => "API_NOT_FOUND",
        409 => "API_CONFLICT",
        500..=599 => "API_SERVER_ERROR",
        _ => "API_ERROR",
    }
}

fn api_error(path: &str, status: StatusCode, body: &str) -> AppError {
    let mut msg = format!("{path} returned status={}", status.as_u16());
    if let Some(detail) = parse_error_detail(body) {
        msg.push_str(" detail=");
        msg.push_str(detail.chars().take(ERROR_DETAIL_MAX_CHARS).collect::<String>().as_str());
    }
    msg.push_str(" body=");
    msg.push_str(sanitize_error_body_snippet(body).as_str());
    AppError::new(status_code_label(status), msg)
}

/// Pull the human-readable detail out of the backend's error envelopes
/// (`{"error": ...}`, `{"message": ...}`, `{"detail": ...}`, or DRF
/// field-error maps).
fn parse_error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    for key in ["error", "message", "detail"] {
        if let Some(text) = object.get(key).and_then(Value::as_str) {
            let text = text.trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }

    // DRF serializer errors: {"field": ["msg", ...], ...}
    for (field, errors) in object {
        if let Some(first) = errors.as_array().and_then(|list| list.first()).and_then(Value::as_str)
        {
            return Some(format!("{field}: {first}"));
        }
    }

    None
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lc = key.trim().to_ascii_lowercase();
    key_lc.contains("token")
        || key_lc.contains("secret")
        || key_lc.contains("password")
        || key_lc == "authorization"
}

fn redact_sensitive_json_fields(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                if is_sensitive_key(key) {
                    if let Some(raw) = nested.as_str() {
                        *nested = Value::String(mask_token(raw));
                        continue;
                    }
                }
                redact_sensitive_json_fields(nested);
            }
        }
        Value::Array(items) => {
            for nested in items {
                redact_sensitive_json_fields(nested);
            }
        }
        _ => {}
    }
}

fn sanitize_error_body_snippet(body: &str) -> String {
    if let Ok(mut value) = serde_json::from_str::<Value>(body) {
        redact_sensitive_json_fields(&mut value);
        if let Ok(encoded) = serde_json::to_string(&value) {
            return encoded.chars().take(ERROR_BODY_SNIPPET_MAX_CHARS).collect();
        }
    }
    body.chars().take(ERROR_BODY_SNIPPET_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use wiremock::matchers::{body_json, header, method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Probe {
        ok: bool,
    }

    struct TestSession {
        access: Mutex<Option<String>>,
        refresh: Mutex<Option<String>>,
        cleared: AtomicBool,
    }

    impl TestSession {
        fn with_tokens(access: &str, refresh: Option<&str>) -> Self {
            Self {
                access: Mutex::new(Some(access.to_string())),
                refresh: Mutex::new(refresh.map(str::to_string)),
                cleared: AtomicBool::new(false),
            }
        }

        fn was_cleared(&self) -> bool {
            self.cleared.load(Ordering::SeqCst)
        }

        fn current_access(&self) -> Option<String> {
            self.access.lock().unwrap().clone()
        }
    }

    impl SessionStore for TestSession {
        fn access_token(&self) -> Option<String> {
            self.access.lock().unwrap().clone()
        }

        fn refresh_token(&self) -> Option<String> {
            self.refresh.lock().unwrap().clone()
        }

        fn store_access_token(&self, access: &str) -> AppResult<()> {
            *self.access.lock().unwrap() = Some(access.to_string());
            Ok(())
        }

        fn store_tokens(&self, access: &str, refresh: &str) -> AppResult<()> {
            *self.access.lock().unwrap() = Some(access.to_string());
            *self.refresh.lock().unwrap() = Some(refresh.to_string());
            Ok(())
        }

        fn clear(&self) -> AppResult<()> {
            *self.access.lock().unwrap() = None;
            *self.refresh.lock().unwrap() = None;
            self.cleared.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), Duration::from_secs(5)).expect("client")
    }

    #[tokio::test]
    async fn authed_request_attaches_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/auth/user/"))
            .and(header("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let session = TestSession::with_tokens("access-1", Some("refresh-1"));
        let probe: Probe = client_for(&server)
            .get(&session, paths::AUTH_USER, Vec::new())
            .await
            .expect("response");
        assert!(probe.ok);
    }

    #[tokio::test]
    async fn unauthorized_response_refreshes_once_and_replays() {
        let server = MockServer::start().await;

        // Stale token is rejected, the refreshed one is accepted.
        Mock::given(method("GET"))
            .and(url_path("/integrations/"))
            .and(header("authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401).set_body_json(
                serde_json::json!({"detail": "Given token not valid for any token type"}),
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(url_path("/auth/token/refresh/"))
            .and(body_json(serde_json::json!({"refresh": "refresh-1"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"access": "fresh"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(url_path("/integrations/"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let session = TestSession::with_tokens("stale", Some("refresh-1"));
        let probe: Probe = client_for(&server)
            .get(&session, paths::INTEGRATIONS, Vec::new())
            .await
            .expect("replayed response");

        assert!(probe.ok);
        assert_eq!(session.current_access().as_deref(), Some("fresh"));
        assert!(!session.was_cleared());
    }

    #[tokio::test]
    async fn rotated_refresh_token_is_stored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/integrations/"))
            .and(header("authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(url_path("/auth/token/refresh/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"access": "fresh", "refresh": "refresh-2"}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(url_path("/integrations/"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let session = TestSession::with_tokens("stale", Some("refresh-1"));
        let _: Probe = client_for(&server)
            .get(&session, paths::INTEGRATIONS, Vec::new())
            .await
            .expect("replayed response");
        assert_eq!(
            session.refresh.lock().unwrap().as_deref(),
            Some("refresh-2")
        );
    }

    #[tokio::test]
    async fn failed_refresh_clears_session_and_forces_relogin() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/integrations/"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(url_path("/auth/token/refresh/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(
                serde_json::json!({"detail": "Token is invalid or expired"}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let session = TestSession::with_tokens("stale", Some("refresh-1"));
        let err = client_for(&server)
            .get::<Probe>(&session, paths::INTEGRATIONS, Vec::new())
            .await
            .expect_err("must fail");

        assert_eq!(err.code(), "AUTH_RELOGIN_REQUIRED");
        assert!(session.was_cleared());
    }

    #[tokio::test]
    async fn missing_refresh_token_clears_session_without_network_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/integrations/"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(url_path("/auth/token/refresh/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let session = TestSession::with_tokens("stale", None);
        let err = client_for(&server)
            .get::<Probe>(&session, paths::INTEGRATIONS, Vec::new())
            .await
            .expect_err("must fail");

        assert_eq!(err.code(), "AUTH_RELOGIN_REQUIRED");
        assert!(session.was_cleared());
    }

    #[tokio::test]
    async fn second_unauthorized_after_replay_is_terminal_not_another_refresh() {
        let server = MockServer::start().await;
        // Every request 401s regardless of token; the refresh endpoint keeps
        // handing out "valid" tokens. Exactly one refresh may happen.
        Mock::given(method("GET"))
            .and(url_path("/integrations/"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(url_path("/auth/token/refresh/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"access": "fresh"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let session = TestSession::with_tokens("stale", Some("refresh-1"));
        let err = client_for(&server)
            .get::<Probe>(&session, paths::INTEGRATIONS, Vec::new())
            .await
            .expect_err("must fail");

        assert_eq!(err.code(), "API_UNAUTHORIZED");
        assert!(!session.was_cleared());
    }

    #[tokio::test]
    async fn error_body_detail_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(url_path("/integrations/oauth/initiate/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                serde_json::json!({"error": "Provider is required"}),
            ))
            .mount(&server)
            .await;

        let session = TestSession::with_tokens("access-1", Some("refresh-1"));
        let err = client_for(&server)
            .post::<Probe>(&session, paths::OAUTH_INITIATE, serde_json::json!({}))
            .await
            .expect_err("must fail");

        assert_eq!(err.code(), "API_BAD_REQUEST");
        assert!(err.to_string().contains("Provider is required"));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = ApiClient::new("http://localhost:8000/api/", Duration::from_secs(5))
            .expect("client");
        assert_eq!(client.url("/auth/login/"), "http://localhost:8000/api/auth/login/");
    }

    #[test]
    fn sensitive_fields_are_masked_in_error_snippets() {
        let raw = r#"{"detail": "nope", "refresh_token": "abcd1234xyz9876", "nested": {"password": "hunter2-long"}}"#;
        let snippet = sanitize_error_body_snippet(raw);
        assert!(!snippet.contains("abcd1234xyz9876"));
        assert!(!snippet.contains("hunter2-long"));
        assert!(snippet.contains("nope"));
    }

    #[test]
    fn drf_field_errors_are_flattened_into_detail() {
        let detail = parse_error_detail(r#"{"email": ["This field is required."]}"#);
        assert_eq!(detail.as_deref(), Some("email: This field is required."));
    }
}
