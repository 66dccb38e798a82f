use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec, IntCounter,
    IntCounterVec, TextEncoder,
};

// Prometheus metrics (default registry)
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "payments_http_requests_total",
        "HTTP requests by route and status",
        &["method", "route", "status"]
    )
    .expect("register http_requests_total")
});

pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "payments_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "route"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("register http_request_duration")
});

pub static PAYMENTS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("payments_created_total", "Payments created through the API")
        .expect("register payments_created_total")
});

pub static EVIDENCE_UPLOADED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("payments_evidence_uploaded_total", "Evidence files uploaded")
        .expect("register evidence_uploaded_total")
});

pub static CSV_ROWS_INGESTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("payments_csv_rows_ingested_total", "Payments inserted from the CSV seed")
        .expect("register csv_rows_ingested_total")
});

/// 按匹配路由记录请求数与耗时，避免路径参数造成标签爆炸
pub async fn track_http(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    HTTP_REQUESTS_TOTAL.with_label_values(&[&method, &route, &status]).inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &route])
        .observe(started.elapsed().as_secs_f64());
    response
}

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
