use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(ToSchema)]
pub struct MessageDoc {
    pub message: String,
}

#[derive(ToSchema)]
pub struct ErrorDoc {
    pub error: String,
    pub detail: Option<String>,
}

/// Multipart form for evidence upload
#[derive(ToSchema)]
pub struct EvidenceUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::payments::create_payment,
        crate::routes::payments::update_payment,
        crate::routes::payments::delete_payment,
        crate::routes::payments::get_payments,
        crate::routes::evidence::upload_evidence,
        crate::routes::evidence::download_evidence,
    ),
    components(
        schemas(
            HealthResponse,
            MessageDoc,
            ErrorDoc,
            EvidenceUploadForm,
            models::PaymentCreateRequest,
            models::PaymentView,
            crate::routes::payments::CreatedPayment,
            crate::routes::payments::PaymentList,
            crate::routes::evidence::UploadedEvidence,
        )
    ),
    tags(
        (name = "health"),
        (name = "payments"),
        (name = "evidence")
    )
)]
pub struct ApiDoc;
