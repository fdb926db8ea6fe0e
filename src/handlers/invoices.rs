use super::common::{ActorId, PaginationParams};
use crate::entities::invoice::PaymentStatus;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::consignments::ConsignmentResponse;
use crate::services::documents::DocumentResponse;
use crate::services::invoices::{
    CreateInvoiceRequest, InvoiceDetailResponse, InvoiceFilter, InvoiceListResponse,
    InvoiceResponse, InvoiceService, UpdateInvoiceRequest,
};
use crate::services::payments::{PaymentResponse, PaymentService};
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
pub struct EligibleConsignmentsQuery {
    /// Party whose delivered, uninvoiced consignments to list
    pub party_id: Uuid,
}

#[derive(Debug, Deserialize, Serialize, utoipa::IntoParams)]
pub struct InvoiceListFilter {
    /// Filter by billed party
    pub party_id: Option<Uuid>,
    /// Filter by payment status (Pending, Partial, Paid, Overdue)
    #[param(example = "Pending")]
    pub payment_status: Option<String>,
}

fn invoice_service(state: &AppState) -> InvoiceService {
    InvoiceService::new(
        state.db.clone(),
        Arc::new(state.event_sender.clone()),
        state.document_renderer.clone(),
        state.config.invoice_due_days,
    )
}

/// Create an invoice over delivered consignments
#[utoipa::path(
    post,
    path = "/api/v1/invoices",
    request_body = CreateInvoiceRequest,
    responses(
        (status = 201, description = "Invoice created", body = crate::ApiResponse<InvoiceDetailResponse>),
        (status = 400, description = "Bad request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Party or consignment not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Consignment not billable", body = crate::errors::ErrorResponse)
    ),
    tag = "Invoices"
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InvoiceDetailResponse>>), ServiceError> {
    let service = invoice_service(&state);
    let response = service.create_invoice(request, actor_id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

/// Delivered, uninvoiced consignments billable to a party
#[utoipa::path(
    get,
    path = "/api/v1/invoices/eligible-consignments",
    params(EligibleConsignmentsQuery),
    responses(
        (status = 200, description = "Billable consignments", body = crate::ApiResponse<Vec<ConsignmentResponse>>),
        (status = 404, description = "Party not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Invoices"
)]
pub async fn eligible_consignments(
    State(state): State<AppState>,
    Query(query): Query<EligibleConsignmentsQuery>,
) -> Result<Json<ApiResponse<Vec<ConsignmentResponse>>>, ServiceError> {
    let service = invoice_service(&state);
    let response = service.eligible_for_invoicing(query.party_id).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Get invoice by ID, with line items
#[utoipa::path(
    get,
    path = "/api/v1/invoices/:invoice_id",
    params(
        ("invoice_id" = Uuid, Path, description = "Invoice ID")
    ),
    responses(
        (status = 200, description = "Invoice with items", body = crate::ApiResponse<InvoiceDetailResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Invoices"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<ApiResponse<InvoiceDetailResponse>>, ServiceError> {
    let service = invoice_service(&state);
    let response = service.get_invoice(invoice_id).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// List invoices with pagination and filtering
#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    params(PaginationParams, InvoiceListFilter),
    responses(
        (status = 200, description = "Invoice listing", body = crate::ApiResponse<InvoiceListResponse>),
        (status = 400, description = "Bad filter", body = crate::errors::ErrorResponse)
    ),
    tag = "Invoices"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<InvoiceListFilter>,
) -> Result<Json<ApiResponse<InvoiceListResponse>>, ServiceError> {
    let (page, per_page) = params.clamp(
        state.config.api_default_page_size,
        state.config.api_max_page_size,
    );

    let payment_status = match filter.payment_status {
        Some(value) => Some(parse_payment_status(&value)?),
        None => None,
    };

    let service = invoice_service(&state);
    let response = service
        .list_invoices(
            InvoiceFilter {
                party_id: filter.party_id,
                payment_status,
            },
            page,
            per_page,
        )
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Update an invoice that has no recorded payments
#[utoipa::path(
    put,
    path = "/api/v1/invoices/:invoice_id",
    params(
        ("invoice_id" = Uuid, Path, description = "Invoice ID")
    ),
    request_body = UpdateInvoiceRequest,
    responses(
        (status = 200, description = "Invoice updated", body = crate::ApiResponse<InvoiceResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Payments already recorded", body = crate::errors::ErrorResponse)
    ),
    tag = "Invoices"
)]
pub async fn update_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    ActorId(actor_id): ActorId,
    Json(request): Json<UpdateInvoiceRequest>,
) -> Result<Json<ApiResponse<InvoiceResponse>>, ServiceError> {
    let service = invoice_service(&state);
    let response = service.update_invoice(invoice_id, request, actor_id).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Delete an invoice, releasing its consignments for re-invoicing
#[utoipa::path(
    delete,
    path = "/api/v1/invoices/:invoice_id",
    params(
        ("invoice_id" = Uuid, Path, description = "Invoice ID")
    ),
    responses(
        (status = 204, description = "Invoice deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Payments already recorded", body = crate::errors::ErrorResponse)
    ),
    tag = "Invoices"
)]
pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    ActorId(actor_id): ActorId,
) -> Result<StatusCode, ServiceError> {
    let service = invoice_service(&state);
    service.delete_invoice(invoice_id, actor_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Payments recorded against an invoice
#[utoipa::path(
    get,
    path = "/api/v1/invoices/:invoice_id/payments",
    params(
        ("invoice_id" = Uuid, Path, description = "Invoice ID")
    ),
    responses(
        (status = 200, description = "Payments for invoice", body = crate::ApiResponse<Vec<PaymentResponse>>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Invoices"
)]
pub async fn invoice_payments(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<PaymentResponse>>>, ServiceError> {
    let service = PaymentService::new(state.db.clone(), Arc::new(state.event_sender.clone()));
    let response = service.list_for_invoice(invoice_id).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Location of the printable invoice document
#[utoipa::path(
    get,
    path = "/api/v1/invoices/:invoice_id/document",
    params(
        ("invoice_id" = Uuid, Path, description = "Invoice ID")
    ),
    responses(
        (status = 200, description = "Document location", body = crate::ApiResponse<DocumentResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Invoices"
)]
pub async fn invoice_document(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<ApiResponse<DocumentResponse>>, ServiceError> {
    let service = invoice_service(&state);
    let response = service.invoice_document(invoice_id).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Invoice routes
pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_invoice))
        .route("/", get(list_invoices))
        .route("/eligible-consignments", get(eligible_consignments))
        .route(
            "/:invoice_id",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
        .route("/:invoice_id/payments", get(invoice_payments))
        .route("/:invoice_id/document", get(invoice_document))
}

fn parse_payment_status(value: &str) -> Result<PaymentStatus, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::ValidationError(
            "payment_status filter cannot be empty".to_string(),
        ));
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "pending" => Ok(PaymentStatus::Pending),
        "partial" => Ok(PaymentStatus::Partial),
        "paid" => Ok(PaymentStatus::Paid),
        "overdue" => Ok(PaymentStatus::Overdue),
        other => Err(ServiceError::ValidationError(format!(
            "invalid payment status filter: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_payment_status_is_case_insensitive() {
        assert_eq!(parse_payment_status("PAID").unwrap(), PaymentStatus::Paid);
        assert_eq!(
            parse_payment_status("overdue").unwrap(),
            PaymentStatus::Overdue
        );
    }

    #[test]
    fn parse_payment_status_rejects_unknown_values() {
        assert!(parse_payment_status("settled").is_err());
    }
}
