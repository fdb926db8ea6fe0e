use super::common::ActorId;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::amendments::{AmendmentResponse, AmendmentService, ProposeAmendmentRequest};
use crate::ApiResponse;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

fn amendment_service(state: &AppState) -> AmendmentService {
    AmendmentService::new(state.db.clone(), Arc::new(state.event_sender.clone()))
}

/// Propose a monetary amendment against an invoice or consignment
#[utoipa::path(
    post,
    path = "/api/v1/amendments",
    request_body = ProposeAmendmentRequest,
    responses(
        (status = 201, description = "Amendment proposed", body = crate::ApiResponse<AmendmentResponse>),
        (status = 400, description = "Bad request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Target not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Amendments"
)]
pub async fn propose_amendment(
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    Json(request): Json<ProposeAmendmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AmendmentResponse>>), ServiceError> {
    let service = amendment_service(&state);
    let response = service.propose_amendment(request, actor_id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

/// Get amendment by ID
#[utoipa::path(
    get,
    path = "/api/v1/amendments/:amendment_id",
    params(
        ("amendment_id" = Uuid, Path, description = "Amendment ID")
    ),
    responses(
        (status = 200, description = "Amendment details", body = crate::ApiResponse<AmendmentResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Amendments"
)]
pub async fn get_amendment(
    State(state): State<AppState>,
    Path(amendment_id): Path<Uuid>,
) -> Result<Json<ApiResponse<AmendmentResponse>>, ServiceError> {
    let service = amendment_service(&state);
    let response = service.get_amendment(amendment_id).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Pending amendments awaiting approval, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/amendments/pending",
    responses(
        (status = 200, description = "Pending amendments", body = crate::ApiResponse<Vec<AmendmentResponse>>)
    ),
    tag = "Amendments"
)]
pub async fn pending_amendments(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AmendmentResponse>>>, ServiceError> {
    let service = amendment_service(&state);
    let response = service.list_pending().await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Approve a pending amendment, applying it to the invoice total
#[utoipa::path(
    post,
    path = "/api/v1/amendments/:amendment_id/approve",
    params(
        ("amendment_id" = Uuid, Path, description = "Amendment ID")
    ),
    responses(
        (status = 200, description = "Amendment approved", body = crate::ApiResponse<AmendmentResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Already processed", body = crate::errors::ErrorResponse)
    ),
    tag = "Amendments"
)]
pub async fn approve_amendment(
    State(state): State<AppState>,
    Path(amendment_id): Path<Uuid>,
    ActorId(actor_id): ActorId,
) -> Result<Json<ApiResponse<AmendmentResponse>>, ServiceError> {
    let service = amendment_service(&state);
    let response = service.approve_amendment(amendment_id, actor_id).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Reject a pending amendment, discarding it
#[utoipa::path(
    post,
    path = "/api/v1/amendments/:amendment_id/reject",
    params(
        ("amendment_id" = Uuid, Path, description = "Amendment ID")
    ),
    responses(
        (status = 204, description = "Amendment rejected"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Already processed", body = crate::errors::ErrorResponse)
    ),
    tag = "Amendments"
)]
pub async fn reject_amendment(
    State(state): State<AppState>,
    Path(amendment_id): Path<Uuid>,
    ActorId(actor_id): ActorId,
) -> Result<StatusCode, ServiceError> {
    let service = amendment_service(&state);
    service.reject_amendment(amendment_id, actor_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Amendment routes
pub fn amendment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(propose_amendment))
        .route("/pending", get(pending_amendments))
        .route("/:amendment_id", get(get_amendment))
        .route("/:amendment_id/approve", post(approve_amendment))
        .route("/:amendment_id/reject", post(reject_amendment))
}
