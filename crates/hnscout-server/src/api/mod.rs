mod discoveries;
mod runs;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use hnscout_db::StateStore;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};
use crate::runner::RunService;

const MAX_LIMIT: i64 = 200;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StateStore>,
    /// `None` when no classifier is configured; runs can't be triggered.
    pub runner: Option<Arc<RunService>>,
    pub report_limit: u32,
    pub report_days: u32,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    store: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Clamp a caller-supplied page size to `1..=200`, falling back to `default`.
pub(super) fn normalize_limit(limit: Option<i64>, default: u32) -> u32 {
    let limit = limit.unwrap_or_else(|| i64::from(default)).clamp(1, MAX_LIMIT);
    u32::try_from(limit).unwrap_or(default)
}

pub(super) fn map_db_error(request_id: String, error: &hnscout_db::DbError) -> ApiError {
    tracing::error!(error = %error, "store query failed");
    ApiError::new(request_id, "internal_error", "store query failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/runs", post(runs::trigger_run))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/discoveries", get(discoveries::list_discoveries))
        .route("/api/v1/runs", get(runs::list_runs));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    store: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        store: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(10, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use hnscout_core::{
        DetectionThresholds, DiscoveryRecord, Item, ItemKind, ProcessedRecord, Verdict,
    };
    use hnscout_db::MemoryStore;
    use hnscout_detect::{Classifier, ClassifyError};
    use hnscout_hn::HnError;
    use hnscout_pipeline::{ContentSource, Pipeline};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    struct StaticSource {
        items: Vec<Item>,
    }

    #[async_trait]
    impl ContentSource for StaticSource {
        async fn fetch_between(&self, _start: i64, _end: i64) -> Result<Vec<Item>, HnError> {
            Ok(self.items.clone())
        }
    }

    struct StartupClassifier;

    #[async_trait]
    impl Classifier for StartupClassifier {
        async fn classify(&self, item: &Item) -> Result<Verdict, ClassifyError> {
            Ok(Verdict {
                kind: ItemKind::Startup,
                confidence: 0.9,
                name: format!("Startup {}", item.id),
                innovation_score: 7.0,
                ..Verdict::default()
            })
        }
    }

    fn story(id: i64, score: i64) -> Item {
        Item {
            id,
            title: format!("Show HN: Thing {id}"),
            url: Some(format!("https://thing{id}.dev")),
            author: Some("founder".to_string()),
            score,
            comments: 4,
            created_at: Utc::now().timestamp() - 3_600,
        }
    }

    async fn seed_discovery(store: &MemoryStore, id: i64, innovation_score: f64) {
        let item = story(id, 80);
        let verdict = Verdict {
            kind: ItemKind::Startup,
            name: format!("Seed {id}"),
            innovation_score,
            ..Verdict::default()
        };
        let now = Utc::now();
        let inserted = store
            .put_accepted(
                &ProcessedRecord::accepted(&item, verdict.kind, now),
                &DiscoveryRecord::from_verdict(id, &verdict, now),
            )
            .await
            .expect("seed discovery");
        assert!(inserted);
    }

    fn runner(store: Arc<MemoryStore>, items: Vec<Item>) -> Arc<RunService> {
        let pipeline = Pipeline::new(
            store,
            Arc::new(StartupClassifier),
            DetectionThresholds::default(),
        );
        let source = Arc::new(StaticSource { items });
        Arc::new(RunService::new(pipeline, source, 7, CancellationToken::new()))
    }

    fn app_state(store: Arc<MemoryStore>, runner: Option<Arc<RunService>>) -> AppState {
        AppState {
            store,
            runner,
            report_limit: 50,
            report_days: 7,
        }
    }

    fn app(state: AppState, keys: &[String]) -> Router {
        let auth = AuthState::from_keys(keys, true).expect("auth");
        build_app(state, auth, default_rate_limit_state())
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&body).expect("json parse");
        (status, json)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    fn post_runs(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::POST).uri("/api/v1/runs");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).expect("request")
    }

    #[test]
    fn normalize_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_limit(None, 50), 50);
        assert_eq!(normalize_limit(Some(0), 50), 1);
        assert_eq!(normalize_limit(Some(-3), 50), 1);
        assert_eq!(normalize_limit(Some(1_000), 50), 200);
        assert_eq!(normalize_limit(Some(25), 50), 25);
    }

    #[test]
    fn api_error_codes_map_to_statuses() {
        let cases = [
            ("validation_error", StatusCode::BAD_REQUEST),
            ("conflict", StatusCode::CONFLICT),
            ("unavailable", StatusCode::SERVICE_UNAVAILABLE),
            ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            let response = ApiError::new("req-1", code, "message").into_response();
            assert_eq!(response.status(), status, "code {code}");
        }
    }

    #[tokio::test]
    async fn health_reports_ok_and_echoes_request_id() {
        let store = Arc::new(MemoryStore::new());
        let request = Request::builder()
            .uri("/api/v1/health")
            .header("x-request-id", "req-abc")
            .body(Body::empty())
            .expect("request");

        let response = app(app_state(store, None), &[])
            .oneshot(request)
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
            Some("req-abc")
        );
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["meta"]["request_id"], "req-abc");
    }

    #[tokio::test]
    async fn blank_request_id_is_replaced_with_generated_one() {
        let store = Arc::new(MemoryStore::new());
        let request = Request::builder()
            .uri("/api/v1/health")
            .header("x-request-id", "   ")
            .body(Body::empty())
            .expect("request");

        let (_, json) = send(app(app_state(store, None), &[]), request).await;

        let id = json["meta"]["request_id"].as_str().expect("request id");
        assert_eq!(id.len(), 36, "expected a generated uuid, got {id:?}");
    }

    #[tokio::test]
    async fn unauthenticated_triggers_do_not_use_rate_limit_budget() {
        let store = Arc::new(MemoryStore::new());
        let runner = runner(Arc::clone(&store), Vec::new());
        let _held = runner.try_acquire().expect("lock is free");
        let keys = vec!["secret".to_string()];
        let auth = AuthState::from_keys(&keys, false).expect("auth");
        let app = build_app(
            app_state(store, Some(runner)),
            auth,
            RateLimitState::new(1, Duration::from_secs(60)),
        );

        let (denied, _) = send(app.clone(), post_runs(Some("wrong"))).await;
        let (first, _) = send(app.clone(), post_runs(Some("secret"))).await;
        let (second, json) = send(app, post_runs(Some("secret"))).await;

        assert_eq!(denied, StatusCode::UNAUTHORIZED);
        assert_eq!(first, StatusCode::CONFLICT);
        assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["error"]["code"], "rate_limited");
    }

    #[tokio::test]
    async fn health_degrades_when_store_is_unavailable() {
        let store = Arc::new(MemoryStore::new());
        store.set_unavailable(true);

        let (status, json) = send(
            app(app_state(store, None), &[]),
            get_request("/api/v1/health"),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["data"]["status"], "degraded");
        assert_eq!(json["data"]["store"], "unavailable");
    }

    #[tokio::test]
    async fn discoveries_returns_snapshot_best_first() {
        let store = Arc::new(MemoryStore::new());
        seed_discovery(&store, 1, 6.0).await;
        seed_discovery(&store, 2, 9.5).await;
        seed_discovery(&store, 3, 7.25).await;

        let (status, json) = send(
            app(app_state(store, None), &[]),
            get_request("/api/v1/discoveries?limit=2&days=3"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["metadata"]["since_days"], 3);
        let ids: Vec<i64> = json["data"]["discoveries"]
            .as_array()
            .expect("discoveries array")
            .iter()
            .filter_map(|d| d["id"].as_i64())
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn discoveries_rejects_out_of_range_days() {
        let store = Arc::new(MemoryStore::new());

        let (status, json) = send(
            app(app_state(store, None), &[]),
            get_request("/api/v1/discoveries?days=0"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn discoveries_maps_store_failure_to_500() {
        let store = Arc::new(MemoryStore::new());
        store.set_unavailable(true);

        let (status, json) = send(
            app(app_state(store, None), &[]),
            get_request("/api/v1/discoveries"),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["code"], "internal_error");
    }

    #[tokio::test]
    async fn trigger_requires_bearer_token_when_keys_configured() {
        let store = Arc::new(MemoryStore::new());
        let runner = runner(Arc::clone(&store), Vec::new());
        let keys = vec!["secret".to_string()];

        let (missing, _) = send(
            app(app_state(Arc::clone(&store), Some(Arc::clone(&runner))), &keys),
            post_runs(None),
        )
        .await;
        let (wrong, json) = send(
            app(app_state(store, Some(runner)), &keys),
            post_runs(Some("nope")),
        )
        .await;

        assert_eq!(missing, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["code"], "unauthorized");
    }

    #[tokio::test]
    async fn trigger_starts_run_and_records_it() {
        let store = Arc::new(MemoryStore::new());
        let runner = runner(Arc::clone(&store), vec![story(11, 120), story(12, 3)]);
        let keys = vec!["secret".to_string()];

        let (status, json) = send(
            app(app_state(Arc::clone(&store), Some(Arc::clone(&runner))), &keys),
            post_runs(Some("secret")),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(json["data"]["status"], "started");

        runner.wait_idle().await;

        let (status, json) = send(
            app(app_state(Arc::clone(&store), None), &keys),
            get_request("/api/v1/runs?limit=5"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let runs = json["data"].as_array().expect("runs array");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0]["status"], "completed");
        assert_eq!(runs[0]["accepted"], 1);
        assert!(store.discovery(11).await.is_some());
        assert!(store.processed(12).await.is_none());
    }

    #[tokio::test]
    async fn trigger_conflicts_while_a_run_is_in_progress() {
        let store = Arc::new(MemoryStore::new());
        let runner = runner(Arc::clone(&store), Vec::new());
        let _held = runner.try_acquire().expect("lock is free");

        let (status, json) = send(
            app(app_state(Arc::clone(&store), Some(Arc::clone(&runner))), &[]),
            post_runs(None),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"]["code"], "conflict");
        assert!(!runner.run_if_idle("scheduler").await);
        assert!(store.list_runs(10).await.expect("list runs").is_empty());
    }

    #[tokio::test]
    async fn trigger_unavailable_without_classifier() {
        let store = Arc::new(MemoryStore::new());

        let (status, json) = send(app(app_state(store, None), &[]), post_runs(None)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"]["code"], "unavailable");
    }
}
