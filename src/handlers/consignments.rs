use super::common::{ActorId, PaginationParams};
use crate::entities::consignment::ConsignmentStatus;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::consignments::{
    ConsignmentFilter, ConsignmentListResponse, ConsignmentResponse, ConsignmentService,
    CreateConsignmentRequest, StatusCount, StatusHistoryEntry, UpdateConsignmentRequest,
};
use crate::services::documents::DocumentResponse;
use crate::ApiResponse;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "status": "Loaded",
    "remarks": "Loaded at Bhiwandi godown"
}))]
pub struct TransitionStatusRequest {
    /// Target status (Booked, Loaded, In Transit, Delivered, Settled, Cancelled)
    #[schema(example = "Loaded")]
    pub status: String,
    /// Free-form note recorded on the history row
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::IntoParams)]
pub struct ConsignmentListFilter {
    /// Filter by lifecycle status
    #[param(example = "In Transit")]
    pub status: Option<String>,
    /// Filter by consignor party
    pub consignor_id: Option<Uuid>,
    /// Filter by consignee party
    pub consignee_id: Option<Uuid>,
    /// Filter by vehicle
    pub vehicle_id: Option<Uuid>,
    /// Filter by invoicing state
    pub is_invoiced: Option<bool>,
}

fn consignment_service(state: &AppState) -> ConsignmentService {
    ConsignmentService::new(
        state.db.clone(),
        Arc::new(state.event_sender.clone()),
        state.document_renderer.clone(),
    )
}

/// Book a new consignment
#[utoipa::path(
    post,
    path = "/api/v1/consignments",
    request_body = CreateConsignmentRequest,
    responses(
        (status = 201, description = "Consignment booked", body = crate::ApiResponse<ConsignmentResponse>),
        (status = 400, description = "Bad request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Party or vehicle not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Consignments"
)]
pub async fn book_consignment(
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    Json(request): Json<CreateConsignmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ConsignmentResponse>>), ServiceError> {
    let service = consignment_service(&state);
    let response = service.create_consignment(request, actor_id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

/// Get consignment by ID
#[utoipa::path(
    get,
    path = "/api/v1/consignments/:consignment_id",
    params(
        ("consignment_id" = Uuid, Path, description = "Consignment ID")
    ),
    responses(
        (status = 200, description = "Consignment details", body = crate::ApiResponse<ConsignmentResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Consignments"
)]
pub async fn get_consignment(
    State(state): State<AppState>,
    Path(consignment_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ConsignmentResponse>>, ServiceError> {
    let service = consignment_service(&state);
    let response = service.get_consignment(consignment_id).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// List consignments with pagination and filtering
#[utoipa::path(
    get,
    path = "/api/v1/consignments",
    params(PaginationParams, ConsignmentListFilter),
    responses(
        (status = 200, description = "Consignment listing", body = crate::ApiResponse<ConsignmentListResponse>),
        (status = 400, description = "Bad filter", body = crate::errors::ErrorResponse)
    ),
    tag = "Consignments"
)]
pub async fn list_consignments(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<ConsignmentListFilter>,
) -> Result<Json<ApiResponse<ConsignmentListResponse>>, ServiceError> {
    let (page, per_page) = params.clamp(
        state.config.api_default_page_size,
        state.config.api_max_page_size,
    );

    let status = match filter.status {
        Some(value) => Some(parse_status(&value)?),
        None => None,
    };

    let service = consignment_service(&state);
    let response = service
        .list_consignments(
            ConsignmentFilter {
                status,
                consignor_id: filter.consignor_id,
                consignee_id: filter.consignee_id,
                vehicle_id: filter.vehicle_id,
                is_invoiced: filter.is_invoiced,
            },
            page,
            per_page,
        )
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Consignments booked today
#[utoipa::path(
    get,
    path = "/api/v1/consignments/today",
    responses(
        (status = 200, description = "Today's bookings", body = crate::ApiResponse<Vec<ConsignmentResponse>>)
    ),
    tag = "Consignments"
)]
pub async fn todays_bookings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ConsignmentResponse>>>, ServiceError> {
    let service = consignment_service(&state);
    let response = service.todays_bookings().await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Consignments still on the road (Booked, Loaded or In Transit)
#[utoipa::path(
    get,
    path = "/api/v1/consignments/pending-deliveries",
    responses(
        (status = 200, description = "Undelivered consignments", body = crate::ApiResponse<Vec<ConsignmentResponse>>)
    ),
    tag = "Consignments"
)]
pub async fn pending_deliveries(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ConsignmentResponse>>>, ServiceError> {
    let service = consignment_service(&state);
    let response = service.pending_deliveries().await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Count of active consignments per lifecycle status
#[utoipa::path(
    get,
    path = "/api/v1/consignments/status-summary",
    responses(
        (status = 200, description = "Counts keyed by status", body = crate::ApiResponse<Vec<StatusCount>>)
    ),
    tag = "Consignments"
)]
pub async fn status_summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<StatusCount>>>, ServiceError> {
    let service = consignment_service(&state);
    let response = service.status_summary().await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Update a consignment that has not been invoiced
#[utoipa::path(
    put,
    path = "/api/v1/consignments/:consignment_id",
    params(
        ("consignment_id" = Uuid, Path, description = "Consignment ID")
    ),
    request_body = UpdateConsignmentRequest,
    responses(
        (status = 200, description = "Consignment updated", body = crate::ApiResponse<ConsignmentResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Consignment already invoiced", body = crate::errors::ErrorResponse)
    ),
    tag = "Consignments"
)]
pub async fn update_consignment(
    State(state): State<AppState>,
    Path(consignment_id): Path<Uuid>,
    ActorId(actor_id): ActorId,
    Json(request): Json<UpdateConsignmentRequest>,
) -> Result<Json<ApiResponse<ConsignmentResponse>>, ServiceError> {
    let service = consignment_service(&state);
    let response = service
        .update_consignment(consignment_id, request, actor_id)
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Move a consignment along its lifecycle
#[utoipa::path(
    post,
    path = "/api/v1/consignments/:consignment_id/status",
    params(
        ("consignment_id" = Uuid, Path, description = "Consignment ID")
    ),
    request_body = TransitionStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = crate::ApiResponse<ConsignmentResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Transition not permitted", body = crate::errors::ErrorResponse)
    ),
    tag = "Consignments"
)]
pub async fn transition_status(
    State(state): State<AppState>,
    Path(consignment_id): Path<Uuid>,
    ActorId(actor_id): ActorId,
    Json(request): Json<TransitionStatusRequest>,
) -> Result<Json<ApiResponse<ConsignmentResponse>>, ServiceError> {
    let new_status = parse_status(&request.status)?;

    let service = consignment_service(&state);
    let response = service
        .transition_status(consignment_id, new_status, request.remarks, actor_id)
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Delete a consignment that has not been invoiced
#[utoipa::path(
    delete,
    path = "/api/v1/consignments/:consignment_id",
    params(
        ("consignment_id" = Uuid, Path, description = "Consignment ID")
    ),
    responses(
        (status = 204, description = "Consignment deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Consignment already invoiced", body = crate::errors::ErrorResponse)
    ),
    tag = "Consignments"
)]
pub async fn delete_consignment(
    State(state): State<AppState>,
    Path(consignment_id): Path<Uuid>,
    ActorId(actor_id): ActorId,
) -> Result<StatusCode, ServiceError> {
    let service = consignment_service(&state);
    service.delete_consignment(consignment_id, actor_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Chronological status history of a consignment
#[utoipa::path(
    get,
    path = "/api/v1/consignments/:consignment_id/history",
    params(
        ("consignment_id" = Uuid, Path, description = "Consignment ID")
    ),
    responses(
        (status = 200, description = "Status history rows", body = crate::ApiResponse<Vec<StatusHistoryEntry>>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Consignments"
)]
pub async fn status_history(
    State(state): State<AppState>,
    Path(consignment_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<StatusHistoryEntry>>>, ServiceError> {
    let service = consignment_service(&state);
    let response = service.status_history(consignment_id).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Location of the printable consignment note
#[utoipa::path(
    get,
    path = "/api/v1/consignments/:consignment_id/document",
    params(
        ("consignment_id" = Uuid, Path, description = "Consignment ID")
    ),
    responses(
        (status = 200, description = "Document location", body = crate::ApiResponse<DocumentResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Consignments"
)]
pub async fn consignment_note(
    State(state): State<AppState>,
    Path(consignment_id): Path<Uuid>,
) -> Result<Json<ApiResponse<DocumentResponse>>, ServiceError> {
    let service = consignment_service(&state);
    let response = service.consignment_note(consignment_id).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Consignment routes
pub fn consignment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(book_consignment))
        .route("/", get(list_consignments))
        .route("/today", get(todays_bookings))
        .route("/pending-deliveries", get(pending_deliveries))
        .route("/status-summary", get(status_summary))
        .route(
            "/:consignment_id",
            get(get_consignment)
                .put(update_consignment)
                .delete(delete_consignment),
        )
        .route("/:consignment_id/status", post(transition_status))
        .route("/:consignment_id/history", get(status_history))
        .route("/:consignment_id/document", get(consignment_note))
}

fn parse_status(value: &str) -> Result<ConsignmentStatus, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::ValidationError(
            "status cannot be empty".to_string(),
        ));
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "booked" => Ok(ConsignmentStatus::Booked),
        "loaded" => Ok(ConsignmentStatus::Loaded),
        "in transit" | "in_transit" | "in-transit" => Ok(ConsignmentStatus::InTransit),
        "delivered" => Ok(ConsignmentStatus::Delivered),
        "settled" => Ok(ConsignmentStatus::Settled),
        "cancelled" | "canceled" => Ok(ConsignmentStatus::Cancelled),
        other => Err(ServiceError::ValidationError(format!(
            "invalid consignment status: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_accepts_spelling_variants() {
        assert_eq!(
            parse_status("In Transit").unwrap(),
            ConsignmentStatus::InTransit
        );
        assert_eq!(
            parse_status("in_transit").unwrap(),
            ConsignmentStatus::InTransit
        );
        assert_eq!(
            parse_status("canceled").unwrap(),
            ConsignmentStatus::Cancelled
        );
    }

    #[test]
    fn parse_status_rejects_unknown_values() {
        assert!(parse_status("teleported").is_err());
        assert!(parse_status("  ").is_err());
    }
}
