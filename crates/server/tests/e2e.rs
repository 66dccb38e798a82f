use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use server::{routes, AppState};
use service::evidence::repository::memory::InMemoryEvidenceRepository;
use service::payment::repository::memory::InMemoryPaymentRepository;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

struct TestApp {
    base_url: String,
}

// 真实 TCP 监听 + 内存仓储，不依赖 MongoDB
async fn start_server() -> anyhow::Result<TestApp> {
    let state = AppState::new(
        Arc::new(InMemoryPaymentRepository::default()),
        Arc::new(InMemoryEvidenceRepository::default()),
    );
    let app: Router = routes::build_router(state, CorsLayer::very_permissive(), 4 * 1024 * 1024);
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });

    Ok(TestApp { base_url })
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = reqwest::get(format!("{}/health", app.base_url)).await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_payment_lifecycle() -> anyhow::Result<()> {
    let app = start_server().await?;
    let client = reqwest::Client::new();

    let created: Value = client
        .post(format!("{}/payments/create", app.base_url))
        .json(&json!({
            "payee_first_name": "Marta",
            "payee_last_name": "Silva",
            "payee_payment_status": "pending",
            "payee_added_date_utc": "2024-03-10T08:30:00Z",
            "payee_due_date": "2099-12-31",
            "payee_address_line_1": "Rua Augusta 1",
            "payee_city": "Porto",
            "payee_country": "Portugal",
            "payee_postal_code": "4000-001",
            "payee_phone_number": "+351222000000",
            "payee_email": "marta@example.com",
            "currency": "EUR",
            "due_amount": 250.0
        }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let id = created["payment_id"].as_str().unwrap_or_default().to_string();
    assert_eq!(id.len(), 24);

    let part = reqwest::multipart::Part::bytes(b"receipt-bytes".to_vec())
        .file_name("receipt.png")
        .mime_str("image/png")?;
    let form = reqwest::multipart::Form::new().part("file", part);
    let uploaded: Value = client
        .post(format!("{}/payments/upload_evidence/{}", app.base_url, id))
        .multipart(form)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(uploaded["file_id"], json!(id));

    let res = client
        .get(format!("{}/payments/download_evidence/{}", app.base_url, id))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(res.bytes().await?.as_ref(), b"receipt-bytes");

    let listed: Value = client
        .get(format!("{}/payments/get_payments", app.base_url))
        .query(&[("payee_city", "Porto")])
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(listed["payments"][0]["payee_payment_status"], "completed");
    assert_eq!(listed["payments"][0]["total_due"], json!(250.0));

    let res = client
        .delete(format!("{}/payments/delete/{}", app.base_url, id))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    Ok(())
}
