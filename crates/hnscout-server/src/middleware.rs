use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer-token settings for the write endpoints.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<Vec<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth config from the `HNSCOUT_API_KEYS` list.
    ///
    /// An empty list disables auth in development and fails startup anywhere
    /// else.
    pub fn from_keys(keys: &[String], is_development: bool) -> anyhow::Result<Self> {
        if keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "HNSCOUT_API_KEYS not set; bearer auth disabled in development environment"
                );
                return Ok(Self {
                    api_keys: Arc::new(Vec::new()),
                    enabled: false,
                });
            }

            anyhow::bail!(
                "HNSCOUT_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }

        Ok(Self {
            api_keys: Arc::new(keys.to_vec()),
            enabled: true,
        })
    }

    fn allows(&self, token: &str) -> bool {
        self.api_keys
            .iter()
            .any(|key| bool::from(key.as_bytes().ct_eq(token.as_bytes())))
    }
}

#[derive(Debug, Clone)]
struct TriggerWindow {
    opened_at: Instant,
    admitted: usize,
}

/// Caps how often `POST /api/v1/runs` is accepted.
///
/// Sits behind bearer auth, so only authenticated triggers are counted, in
/// fixed windows. A request refused here does not consume a slot.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<TriggerWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(TriggerWindow {
                opened_at: Instant::now(),
                admitted: 0,
            })),
        }
    }

    /// Take a slot in the current window, opening a new window if the old
    /// one has expired.
    async fn admit(&self) -> bool {
        let mut current = self.state.lock().await;
        if current.opened_at.elapsed() >= self.window {
            current.opened_at = Instant::now();
            current.admitted = 0;
        }
        if current.admitted >= self.max_requests {
            return false;
        }
        current.admitted += 1;
        true
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

fn reject(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    (
        status,
        Json(MiddlewareErrorBody {
            error: MiddlewareError { code, message },
        }),
    )
        .into_response()
}

const MAX_REQUEST_ID_LEN: usize = 128;

/// Tag each request with an id for log correlation.
///
/// A caller-supplied `x-request-id` is kept when it is non-empty and at most
/// 128 bytes; otherwise a fresh `UUIDv4` is used. The id goes into the
/// request extensions as [`RequestId`] and back out on the response header.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing Bearer token auth when enabled.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    match extract_bearer_token(req.headers().get(AUTHORIZATION)) {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => reject(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid bearer token",
        ),
    }
}

/// Refuse run triggers beyond the configured per-window budget.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    if !rate_limit.admit().await {
        tracing::warn!("run trigger rate limit exceeded");
        return reject(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "too many run triggers; try again later",
        );
    }

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn auth_state_disables_when_no_keys_in_dev() {
        let state = AuthState::from_keys(&[], true).expect("dev should allow missing keys");
        assert!(!state.enabled);
    }

    #[tokio::test]
    async fn rate_limit_admits_up_to_budget_per_window() {
        let limiter = RateLimitState::new(2, Duration::from_secs(60));
        assert!(limiter.admit().await);
        assert!(limiter.admit().await);
        assert!(!limiter.admit().await);
    }

    #[tokio::test]
    async fn rate_limit_reopens_after_window_expires() {
        let limiter = RateLimitState::new(1, Duration::from_millis(20));
        assert!(limiter.admit().await);
        assert!(!limiter.admit().await);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.admit().await);
    }

    #[test]
    fn auth_state_requires_keys_outside_dev() {
        assert!(AuthState::from_keys(&[], false).is_err());
    }

    #[test]
    fn auth_state_matches_only_configured_keys() {
        let keys = vec!["alpha".to_string(), "beta".to_string()];
        let state = AuthState::from_keys(&keys, false).expect("keys present");
        assert!(state.enabled);
        assert!(state.allows("beta"));
        assert!(!state.allows("bet"));
        assert!(!state.allows("gamma"));
    }
}
