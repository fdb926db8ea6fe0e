use super::common::{ActorId, PaginationParams};
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::payments::{
    CreatePaymentRequest, PaymentFilter, PaymentListResponse, PaymentResponse, PaymentService,
};
use crate::ApiResponse;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, utoipa::IntoParams)]
pub struct PaymentListFilter {
    /// Filter by settled invoice
    pub invoice_id: Option<Uuid>,
    /// Filter by paying party
    pub party_id: Option<Uuid>,
}

fn payment_service(state: &AppState) -> PaymentService {
    PaymentService::new(state.db.clone(), Arc::new(state.event_sender.clone()))
}

/// Record a payment against an invoice or a party
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = crate::ApiResponse<PaymentResponse>),
        (status = 400, description = "Bad request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Invoice or party not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Payment exceeds outstanding balance", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn record_payment(
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentResponse>>), ServiceError> {
    let service = payment_service(&state);
    let response = service.create_payment(request, actor_id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

/// Get payment by ID
#[utoipa::path(
    get,
    path = "/api/v1/payments/:payment_id",
    params(
        ("payment_id" = Uuid, Path, description = "Payment ID")
    ),
    responses(
        (status = 200, description = "Payment details", body = crate::ApiResponse<PaymentResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<ApiResponse<PaymentResponse>>, ServiceError> {
    let service = payment_service(&state);
    let response = service.get_payment(payment_id).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// List payments with pagination and filtering
#[utoipa::path(
    get,
    path = "/api/v1/payments",
    params(PaginationParams, PaymentListFilter),
    responses(
        (status = 200, description = "Payment listing", body = crate::ApiResponse<PaymentListResponse>)
    ),
    tag = "Payments"
)]
pub async fn list_payments(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<PaymentListFilter>,
) -> Result<Json<ApiResponse<PaymentListResponse>>, ServiceError> {
    let (page, per_page) = params.clamp(
        state.config.api_default_page_size,
        state.config.api_max_page_size,
    );

    let service = payment_service(&state);
    let response = service
        .list_payments(
            PaymentFilter {
                invoice_id: filter.invoice_id,
                party_id: filter.party_id,
            },
            page,
            per_page,
        )
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Reverse a payment, rolling its amount back off the invoice
#[utoipa::path(
    delete,
    path = "/api/v1/payments/:payment_id",
    params(
        ("payment_id" = Uuid, Path, description = "Payment ID")
    ),
    responses(
        (status = 204, description = "Payment reversed"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn reverse_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
    ActorId(actor_id): ActorId,
) -> Result<StatusCode, ServiceError> {
    let service = payment_service(&state);
    service.delete_payment(payment_id, actor_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Payment routes
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(record_payment))
        .route("/", get(list_payments))
        .route("/:payment_id", get(get_payment).delete(reverse_payment))
}
