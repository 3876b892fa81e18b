mod edits;
mod stores;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use salesmap_core::{EditHistoryLog, SalespersonRecord, Workspace};
use salesmap_storage::Storage;

use crate::middleware::{request_id, RequestId};

/// Everything the handlers mutate, behind one lock: the working set, the
/// bounded history, and the roster used for edit re-resolution. One writer
/// at a time; concurrent edits from two sessions are last-write-wins on the
/// backing store (the accepted single-operator limitation).
pub struct SharedState {
    pub workspace: Workspace,
    pub history: EditHistoryLog,
    pub roster: Vec<SalespersonRecord>,
}

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<RwLock<SharedState>>,
    pub storage: Arc<Storage>,
    pub history_path: Arc<PathBuf>,
}

impl AppState {
    #[must_use]
    pub fn new(
        workspace: Workspace,
        history: EditHistoryLog,
        roster: Vec<SalespersonRecord>,
        storage: Storage,
        history_path: PathBuf,
    ) -> Self {
        Self {
            shared: Arc::new(RwLock::new(SharedState {
                workspace,
                history,
                roster,
            })),
            storage: Arc::new(storage),
            history_path: Arc::new(history_path),
        }
    }
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

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    backend: &'static str,
    records: usize,
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
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "save_failed" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(50).clamp(1, 200)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/stores", get(stores::list_stores))
        .route("/api/v1/stores/facets", get(stores::list_facets))
        .route(
            "/api/v1/stores/{store_id}/salesperson",
            put(edits::update_salesperson),
        )
        .route("/api/v1/history", get(edits::list_history))
        .route("/api/v1/history/export", get(edits::export_history))
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
    let shared = state.shared.read().await;
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            backend: state.storage.backend_kind(),
            records: shared.workspace.records().len(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}
