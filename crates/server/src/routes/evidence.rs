use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use models::evidence::DEFAULT_FILE_TYPE;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::JsonApiError;
use crate::observability::EVIDENCE_UPLOADED_TOTAL;
use crate::startup::AppState;

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadedEvidence {
    pub file_id: String,
}

struct UploadedFile {
    name: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// 读取第一个名为 `file` 的字段，其它字段忽略
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<UploadedFile>, JsonApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| JsonApiError::bad_request(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or("evidence").to_string();
        let content_type = field.content_type().unwrap_or(DEFAULT_FILE_TYPE).to_string();
        let bytes = field.bytes().await.map_err(|e| JsonApiError::bad_request(e.to_string()))?;
        return Ok(Some(UploadedFile { name, content_type, bytes: bytes.to_vec() }));
    }
    Ok(None)
}

#[utoipa::path(
    post, path = "/payments/upload_evidence/{payment_id}", tag = "evidence",
    params(("payment_id" = String, Path, description = "Payment ObjectId (hex)")),
    request_body(content = crate::openapi::EvidenceUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Stored; payment marked completed", body = UploadedEvidence),
        (status = 400, description = "Invalid id or missing file"),
        (status = 404, description = "Payment not found")
    )
)]
pub async fn upload_evidence(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<UploadedEvidence>, JsonApiError> {
    let file = read_file_field(&mut multipart)
        .await?
        .ok_or_else(|| JsonApiError::bad_request(format!("Missing multipart field '{FILE_FIELD}'")))?;
    let file_id = state
        .evidence
        .upload(&payment_id, &file.name, &file.content_type, file.bytes)
        .await?;
    EVIDENCE_UPLOADED_TOTAL.inc();
    Ok(Json(UploadedEvidence { file_id }))
}

#[utoipa::path(
    get, path = "/payments/download_evidence/{payment_id}", tag = "evidence",
    params(("payment_id" = String, Path, description = "Payment ObjectId (hex)")),
    responses(
        (status = 200, description = "Evidence file", content_type = "application/octet-stream"),
        (status = 400, description = "Stored file is empty"),
        (status = 404, description = "Evidence not found")
    )
)]
pub async fn download_evidence(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<Response, JsonApiError> {
    let evidence = state.evidence.download(&payment_id).await?;
    let headers = [
        (header::CONTENT_TYPE, evidence.file_type.clone()),
        (header::CONTENT_DISPOSITION, evidence.content_disposition()),
    ];
    Ok((headers, evidence.file_data.bytes).into_response())
}
