use axum::{
    extract::{Path, Query, State},
    Json,
};
use common::types::Message;
use models::{PaymentCreateRequest, PaymentUpdateRequest, PaymentView};
use serde::{Deserialize, Serialize};
use service::{pagination::Pagination, payment::PaymentQuery};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::errors::JsonApiError;
use crate::observability::PAYMENTS_CREATED_TOTAL;
use crate::startup::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPaymentsParams {
    /// Exact country match
    pub payee_country: Option<String>,
    /// Exact city match
    pub payee_city: Option<String>,
    /// Case-insensitive substring over the remaining text fields
    pub search: Option<String>,
    pub skip: Option<i64>,
    /// Page size, clamped to 1..=100
    pub limit: Option<i64>,
}

impl From<ListPaymentsParams> for PaymentQuery {
    fn from(p: ListPaymentsParams) -> Self {
        PaymentQuery {
            payee_country: p.payee_country,
            payee_city: p.payee_city,
            search: p.search,
            pagination: Pagination::from_query(p.skip, p.limit),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedPayment {
    pub payment_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentList {
    pub payments: Vec<PaymentView>,
}

#[utoipa::path(
    post, path = "/payments/create", tag = "payments",
    request_body = PaymentCreateRequest,
    responses(
        (status = 200, description = "Created", body = CreatedPayment),
        (status = 400, description = "Validation Error"),
        (status = 422, description = "Malformed body"),
        (status = 500, description = "Database Error")
    )
)]
pub async fn create_payment(
    State(state): State<AppState>,
    Json(req): Json<PaymentCreateRequest>,
) -> Result<Json<CreatedPayment>, JsonApiError> {
    let payment_id = state.payments.create(req).await?;
    PAYMENTS_CREATED_TOTAL.inc();
    Ok(Json(CreatedPayment { payment_id }))
}

#[utoipa::path(
    put, path = "/payments/update/{payment_id}", tag = "payments",
    params(("payment_id" = String, Path, description = "Payment ObjectId (hex)")),
    request_body = PaymentCreateRequest,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Invalid id or body"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
    Json(req): Json<PaymentUpdateRequest>,
) -> Result<Json<Message>, JsonApiError> {
    state.payments.update(&payment_id, req).await?;
    Ok(Json(Message::new("Payment updated successfully")))
}

#[utoipa::path(
    delete, path = "/payments/delete/{payment_id}", tag = "payments",
    params(("payment_id" = String, Path, description = "Payment ObjectId (hex)")),
    responses(
        (status = 200, description = "Deleted together with its evidence"),
        (status = 400, description = "Invalid id"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<Json<Message>, JsonApiError> {
    state.payments.delete(&payment_id).await?;
    Ok(Json(Message::new("Payment and related evidence deleted successfully")))
}

#[utoipa::path(
    get, path = "/payments/get_payments", tag = "payments",
    params(ListPaymentsParams),
    responses(
        (status = 200, description = "Payments sorted by due date, newest first", body = PaymentList),
        (status = 500, description = "Database Error")
    )
)]
pub async fn get_payments(
    State(state): State<AppState>,
    Query(params): Query<ListPaymentsParams>,
) -> Result<Json<PaymentList>, JsonApiError> {
    let query = PaymentQuery::from(params);
    let payments = state.payments.list(&query).await?;
    info!(count = payments.len(), "list payments");
    Ok(Json(PaymentList { payments }))
}
