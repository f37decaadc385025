//! Usage: One-shot localhost listener for the provider OAuth redirect.
//!
//! The backend builds the authorization URL; this module only catches the
//! browser redirect, parses the query string, and checks the `state` echo.

use crate::shared::error::AppResult;
use crate::shared::security::constant_time_eq;
use reqwest::Url;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub(crate) const CALLBACK_PATH: &str = "/integrations/callback";
pub(crate) const DEFAULT_CALLBACK_PORT: u16 = 41723;

const SUCCESS_HTML: &str = "<html><body><h1>Integration connected</h1><p>You may close this window and return to Integrato.</p></body></html>";
const ERROR_HTML: &str = "<html><body><h1>Integration failed</h1><p>You may close this window and retry from Integrato.</p></body></html>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OAuthCallbackPayload {
    pub(crate) code: Option<String>,
    pub(crate) state: Option<String>,
    pub(crate) error: Option<String>,
    pub(crate) error_description: Option<String>,
}

#[derive(Debug)]
pub(crate) struct BoundCallbackListener {
    port: u16,
    listener_v4: TcpListener,
    listener_v6: Option<TcpListener>,
}

impl BoundCallbackListener {
    pub(crate) fn port(&self) -> u16 {
        self.port
    }
}

pub(crate) fn redirect_uri(port: u16) -> String {
    format!("http://127.0.0.1:{port}{CALLBACK_PATH}")
}

/// Bind the preferred port, falling back to an OS-assigned one when taken.
/// The redirect URI is sent to the backend per flow, so any port works.
pub(crate) async fn bind_callback_listener(
    preferred_port: u16,
) -> AppResult<BoundCallbackListener> {
    match try_bind_on_port(preferred_port).await {
        Ok(bound) => Ok(bound),
        Err(preferred_err) if preferred_port == 0 => Err(format!(
            "SYSTEM_ERROR: oauth callback bind failed: {preferred_err}"
        )
        .into()),
        Err(preferred_err) => match try_bind_on_port(0).await {
            Ok(bound) => {
                tracing::warn!(
                    preferred_port,
                    fallback_port = bound.port,
                    "preferred oauth callback port unavailable: {preferred_err}"
                );
                Ok(bound)
            }
            Err(fallback_err) => Err(format!(
                "SYSTEM_ERROR: oauth callback bind failed: {preferred_err}; fallback_dynamic_port: {fallback_err}"
            )
            .into()),
        },
    }
}

async fn try_bind_on_port(port: u16) -> Result<BoundCallbackListener, String> {
    let listener_v4 = TcpListener::bind(("127.0.0.1", port))
        .await
        .map_err(|err| format!("127.0.0.1:{port} ({err})"))?;
    let port = listener_v4
        .local_addr()
        .map_err(|err| format!("127.0.0.1:{port} (local_addr failed: {err})"))?
        .port();

    // Same port on ::1 is best-effort; some hosts have IPv6 disabled.
    let listener_v6 = TcpListener::bind(("::1", port)).await.ok();

    Ok(BoundCallbackListener {
        port,
        listener_v4,
        listener_v6,
    })
}

pub(crate) async fn wait_for_callback(
    mut listener: BoundCallbackListener,
    expected_state: &str,
    timeout: Duration,
) -> AppResult<OAuthCallbackPayload> {
    let accept_future = async {
        match listener.listener_v6.as_mut() {
            Some(v6) => {
                tokio::select! {
                    result = listener.listener_v4.accept() => result,
                    result = v6.accept() => result,
                }
            }
            None => listener.listener_v4.accept().await,
        }
    };

    let (mut socket, _) = tokio::time::timeout(timeout, accept_future)
        .await
        .map_err(|_| "SYSTEM_ERROR: oauth callback timed out".to_string())?
        .map_err(|e| format!("SYSTEM_ERROR: oauth callback accept failed: {e}"))?;

    let mut buffer = vec![0u8; 8192];
    let size = socket
        .read(&mut buffer)
        .await
        .map_err(|e| format!("SYSTEM_ERROR: oauth callback read failed: {e}"))?;
    if size == 0 {
        return Err("SYSTEM_ERROR: oauth callback request is empty"
            .to_string()
            .into());
    }

    let request = String::from_utf8_lossy(&buffer[..size]);
    let target = extract_request_target(request.as_ref())?;
    let payload = parse_callback_target(target);

    let is_error = payload.as_ref().map(|p| p.error.is_some()).unwrap_or(true);
    let body = if is_error { ERROR_HTML } else { SUCCESS_HTML };
    let status = if is_error {
        "HTTP/1.1 400 Bad Request"
    } else {
        "HTTP/1.1 200 OK"
    };
    let response = format!(
        "{status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;

    let payload = payload?;
    validate_state(&payload, expected_state)?;
    Ok(payload)
}

fn extract_request_target(request: &str) -> AppResult<&str> {
    let mut lines = request.lines();
    let first = lines
        .next()
        .ok_or_else(|| "SYSTEM_ERROR: oauth callback malformed request".to_string())?;
    let mut parts = first.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();
    if method != "GET" || target.is_empty() {
        return Err("SYSTEM_ERROR: oauth callback must be GET"
            .to_string()
            .into());
    }
    Ok(target)
}

pub(crate) fn parse_callback_target(target: &str) -> AppResult<OAuthCallbackPayload> {
    let url = Url::parse(&format!("http://127.0.0.1{target}"))
        .map_err(|e| format!("SYSTEM_ERROR: invalid oauth callback target: {e}"))?;

    if url.path() != CALLBACK_PATH {
        return Err("SYSTEM_ERROR: invalid oauth callback path"
            .to_string()
            .into());
    }

    let mut code: Option<String> = None;
    let mut state: Option<String> = None;
    let mut error: Option<String> = None;
    let mut error_description: Option<String> = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            "error" => error = Some(value.to_string()),
            "error_description" => error_description = Some(value.to_string()),
            _ => {}
        }
    }

    if code.is_none() && error.is_none() {
        return Err("SYSTEM_ERROR: oauth callback missing code/error"
            .to_string()
            .into());
    }

    Ok(OAuthCallbackPayload {
        code,
        state,
        error,
        error_description,
    })
}

fn validate_state(payload: &OAuthCallbackPayload, expected_state: &str) -> AppResult<()> {
    // A provider error page may redirect without echoing state; the error is
    // surfaced to the user either way, so only non-error callbacks are strict.
    if payload.error.is_some() && payload.state.is_none() {
        return Ok(());
    }

    let state = payload
        .state
        .as_deref()
        .ok_or_else(|| "SYSTEM_ERROR: oauth callback missing state".to_string())?;
    if !constant_time_eq(state.as_bytes(), expected_state.as_bytes()) {
        return Err("SEC_INVALID_INPUT: oauth callback state mismatch"
            .to_string()
            .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_callback_target_extracts_code_and_state() {
        let payload =
            parse_callback_target("/integrations/callback?code=abc123&state=7%3Agithub%3A99")
                .expect("payload");
        assert_eq!(payload.code.as_deref(), Some("abc123"));
        assert_eq!(payload.state.as_deref(), Some("7:github:99"));
        assert!(payload.error.is_none());
    }

    #[test]
    fn parse_callback_target_accepts_provider_error() {
        let payload = parse_callback_target(
            "/integrations/callback?error=access_denied&error_description=denied&state=xyz",
        )
        .expect("payload");
        assert_eq!(payload.error.as_deref(), Some("access_denied"));
        assert_eq!(payload.error_description.as_deref(), Some("denied"));
        assert_eq!(payload.state.as_deref(), Some("xyz"));
    }

    #[test]
    fn parse_callback_target_rejects_other_paths() {
        let err = parse_callback_target("/callback?code=abc&state=xyz").expect_err("should fail");
        assert!(err.to_string().contains("invalid oauth callback path"));
    }

    #[test]
    fn parse_callback_target_requires_code_or_error() {
        let err = parse_callback_target("/integrations/callback?state=xyz").expect_err("fail");
        assert!(err.to_string().contains("missing code/error"));
    }

    #[test]
    fn validate_state_rejects_mismatch() {
        let payload = OAuthCallbackPayload {
            code: Some("abc".to_string()),
            state: Some("foo".to_string()),
            error: None,
            error_description: None,
        };
        let err = validate_state(&payload, "bar").expect_err("should fail");
        assert!(err.to_string().contains("state mismatch"));
    }

    #[test]
    fn validate_state_requires_state_for_success_callbacks() {
        let payload = OAuthCallbackPayload {
            code: Some("abc".to_string()),
            state: None,
            error: None,
            error_description: None,
        };
        let err = validate_state(&payload, "bar").expect_err("should fail");
        assert!(err.to_string().contains("missing state"));
    }

    #[test]
    fn validate_state_tolerates_stateless_provider_errors() {
        let payload = OAuthCallbackPayload {
            code: None,
            state: None,
            error: Some("access_denied".to_string()),
            error_description: None,
        };
        assert!(validate_state(&payload, "expected").is_ok());
    }

    #[test]
    fn redirect_uri_targets_loopback_callback_path() {
        assert_eq!(
            redirect_uri(41723),
            "http://127.0.0.1:41723/integrations/callback"
        );
    }

    #[tokio::test]
    async fn wait_for_callback_round_trips_a_redirect() {
        let listener = bind_callback_listener(0).await.expect("bind");
        let port = listener.port();

        let server = tokio::spawn(async move {
            wait_for_callback(listener, "expected-state", Duration::from_secs(5)).await
        });

        let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
            .await
            .expect("connect");
        stream
            .write_all(
                b"GET /integrations/callback?code=the-code&state=expected-state HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n",
            )
            .await
            .expect("write");
        let mut response = Vec::new();
        let _ = stream.read_to_end(&mut response).await;
        let response = String::from_utf8_lossy(&response);
        assert!(response.starts_with("HTTP/1.1 200 OK"));

        let payload = server.await.expect("join").expect("payload");
        assert_eq!(payload.code.as_deref(), Some("the-code"));
        assert_eq!(payload.state.as_deref(), Some("expected-state"));
    }
}
