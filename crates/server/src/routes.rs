use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use common::types::Health;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use crate::observability;
use crate::openapi::ApiDoc;
use crate::startup::AppState;

pub mod evidence;
pub mod payments;

#[utoipa::path(
    get, path = "/health", tag = "health",
    responses((status = 200, description = "Service is up", body = crate::openapi::HealthResponse))
)]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics() -> impl IntoResponse {
    observability::encode_metrics()
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router: payment CRUD, evidence upload/download and ops endpoints
pub fn build_router(state: AppState, cors: CorsLayer, max_body_bytes: usize) -> Router {
    let payments = Router::new()
        .route("/payments/create", post(payments::create_payment))
        .route("/payments/update/:payment_id", put(payments::update_payment))
        .route("/payments/delete/:payment_id", delete(payments::delete_payment))
        .route("/payments/get_payments", get(payments::get_payments))
        .route("/payments/upload_evidence/:payment_id", post(evidence::upload_evidence))
        .route("/payments/download_evidence/:payment_id", get(evidence::download_evidence))
        // route_layer 之后 MatchedPath 才可用
        .route_layer(middleware::from_fn(observability::track_http));

    let ops = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/docs/openapi.json", get(openapi_json));

    ops.merge(payments)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
