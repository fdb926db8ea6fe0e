use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, Iterable, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::consignment::{self, ConsignmentStatus};
use crate::entities::consignment_status_history;
use crate::entities::audit_log::AuditAction;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::metrics::{CONSIGNMENTS_BOOKED, CONSIGNMENTS_DELIVERED, CONSIGNMENT_STATUS_CHANGES};
use crate::services::audit::{snapshot, AuditLogger};
use crate::services::directory::DirectoryService;
use crate::services::documents::{DocumentRenderer, DocumentResponse};
use crate::services::{money, sequences, statuses};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateConsignmentRequest {
    #[schema(example = "2025-03-01")]
    pub gr_date: NaiveDate,
    pub consignor_id: Uuid,
    pub consignee_id: Uuid,
    pub vehicle_id: Uuid,
    #[validate(length(min = 1, max = 120, message = "Origin must be between 1 and 120 characters"))]
    #[schema(example = "Mumbai")]
    pub origin: String,
    #[validate(length(
        min = 1,
        max = 120,
        message = "Destination must be between 1 and 120 characters"
    ))]
    #[schema(example = "Delhi")]
    pub destination: String,
    #[schema(example = "1200.5")]
    pub weight_kg: Decimal,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    #[schema(example = 10)]
    pub quantity: i32,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    #[schema(example = "1000")]
    pub freight_amount: Decimal,
    #[schema(example = "50")]
    pub surcharge: Decimal,
    #[schema(example = "0")]
    pub other_charges: Decimal,
    #[schema(example = "20")]
    pub gr_charge: Decimal,
    #[validate(length(max = 500, message = "Remarks must be at most 500 characters"))]
    pub remarks: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateConsignmentRequest {
    pub gr_date: Option<NaiveDate>,
    pub consignor_id: Option<Uuid>,
    pub consignee_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    #[validate(length(min = 1, max = 120, message = "Origin must be between 1 and 120 characters"))]
    pub origin: Option<String>,
    #[validate(length(
        min = 1,
        max = 120,
        message = "Destination must be between 1 and 120 characters"
    ))]
    pub destination: Option<String>,
    pub weight_kg: Option<Decimal>,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: Option<i32>,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    pub freight_amount: Option<Decimal>,
    pub surcharge: Option<Decimal>,
    pub other_charges: Option<Decimal>,
    pub gr_charge: Option<Decimal>,
    #[validate(length(max = 500, message = "Remarks must be at most 500 characters"))]
    pub remarks: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConsignmentResponse {
    pub id: Uuid,
    pub gr_number: String,
    pub gr_date: NaiveDate,
    pub consignor_id: Uuid,
    pub consignee_id: Uuid,
    pub vehicle_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub route: String,
    pub weight_kg: Decimal,
    pub quantity: i32,
    pub description: Option<String>,
    pub freight_amount: Decimal,
    pub surcharge: Decimal,
    pub other_charges: Decimal,
    pub gr_charge: Decimal,
    pub total_amount: Decimal,
    pub amount_in_words: String,
    pub status: String,
    pub booked_at: DateTime<Utc>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub in_transit_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,
    pub is_invoiced: bool,
    pub invoice_id: Option<Uuid>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConsignmentListResponse {
    pub consignments: Vec<ConsignmentResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusHistoryEntry {
    pub id: Uuid,
    pub consignment_id: Uuid,
    pub from_status: Option<String>,
    pub to_status: String,
    pub remarks: Option<String>,
    pub changed_by: Uuid,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

/// Optional filters for consignment listings.
#[derive(Debug, Default)]
pub struct ConsignmentFilter {
    pub status: Option<ConsignmentStatus>,
    pub consignor_id: Option<Uuid>,
    pub consignee_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub is_invoiced: Option<bool>,
}

/// Manages the consignment lifecycle: booking, edits, status transitions and
/// soft deletion, with an append-only status history.
#[derive(Clone)]
pub struct ConsignmentService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    directory: DirectoryService,
    audit: AuditLogger,
    renderer: Arc<dyn DocumentRenderer>,
}

impl ConsignmentService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        let directory = DirectoryService::new(db_pool.clone());
        let audit = AuditLogger::new(db_pool.clone());
        Self {
            db_pool,
            event_sender,
            directory,
            audit,
            renderer,
        }
    }

    /// Books a new consignment: allocates the GR code, computes the freight
    /// total and opens the status history with a Booked row.
    #[instrument(skip(self, request, actor_id), fields(consignor_id = %request.consignor_id, consignee_id = %request.consignee_id))]
    pub async fn create_consignment(
        &self,
        request: CreateConsignmentRequest,
        actor_id: Uuid,
    ) -> Result<ConsignmentResponse, ServiceError> {
        request.validate()?;
        money::ensure_non_negative("weight_kg", request.weight_kg)?;
        money::ensure_non_negative("freight_amount", request.freight_amount)?;
        money::ensure_non_negative("surcharge", request.surcharge)?;
        money::ensure_non_negative("other_charges", request.other_charges)?;
        money::ensure_non_negative("gr_charge", request.gr_charge)?;

        self.directory.require_party(request.consignor_id).await?;
        self.directory.require_party(request.consignee_id).await?;
        self.directory.require_vehicle(request.vehicle_id).await?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let consignment_id = Uuid::new_v4();

        let total_amount = money::consignment_total(
            request.freight_amount,
            request.surcharge,
            request.other_charges,
            request.gr_charge,
        );

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for consignment booking");
            ServiceError::DatabaseError(e)
        })?;

        let gr_number = sequences::next_gr_number(&txn).await?;

        let active_model = consignment::ActiveModel {
            id: Set(consignment_id),
            gr_number: Set(gr_number.clone()),
            gr_date: Set(request.gr_date),
            consignor_id: Set(request.consignor_id),
            consignee_id: Set(request.consignee_id),
            vehicle_id: Set(request.vehicle_id),
            origin: Set(request.origin),
            destination: Set(request.destination),
            weight_kg: Set(request.weight_kg),
            quantity: Set(request.quantity),
            description: Set(request.description),
            freight_amount: Set(request.freight_amount),
            surcharge: Set(request.surcharge),
            other_charges: Set(request.other_charges),
            gr_charge: Set(request.gr_charge),
            total_amount: Set(total_amount),
            amount_in_words: Set(money::amount_in_words(total_amount)),
            status: Set(ConsignmentStatus::Booked),
            booked_at: Set(now),
            loaded_at: Set(None),
            in_transit_at: Set(None),
            delivered_at: Set(None),
            settled_at: Set(None),
            is_invoiced: Set(false),
            invoice_id: Set(None),
            remarks: Set(request.remarks),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let model = active_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, gr_number = %gr_number, "Failed to insert consignment");
            ServiceError::DatabaseError(e)
        })?;

        self.append_history(&txn, consignment_id, None, ConsignmentStatus::Booked, None, actor_id)
            .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, gr_number = %gr_number, "Failed to commit consignment booking");
            ServiceError::DatabaseError(e)
        })?;

        info!(consignment_id = %consignment_id, gr_number = %gr_number, total = %total_amount, "Consignment booked");
        CONSIGNMENTS_BOOKED.inc();

        self.audit
            .record(
                "consignments",
                consignment_id,
                AuditAction::Create,
                None,
                snapshot(&model),
                actor_id,
            )
            .await;

        if let Err(e) = self
            .event_sender
            .send(Event::ConsignmentBooked(consignment_id))
            .await
        {
            warn!(error = %e, consignment_id = %consignment_id, "Failed to send consignment booked event");
        }

        Ok(model_to_response(model))
    }

    /// Fetches one active consignment.
    #[instrument(skip(self), fields(consignment_id = %consignment_id))]
    pub async fn get_consignment(
        &self,
        consignment_id: Uuid,
    ) -> Result<ConsignmentResponse, ServiceError> {
        let model = self.require_active(&*self.db_pool, consignment_id).await?;
        Ok(model_to_response(model))
    }

    /// Lists active consignments, newest first.
    #[instrument(skip(self, filter))]
    pub async fn list_consignments(
        &self,
        filter: ConsignmentFilter,
        page: u64,
        per_page: u64,
    ) -> Result<ConsignmentListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        let mut query = consignment::Entity::find_active();
        if let Some(status) = filter.status {
            query = query.filter(consignment::Column::Status.eq(status));
        }
        if let Some(consignor_id) = filter.consignor_id {
            query = query.filter(consignment::Column::ConsignorId.eq(consignor_id));
        }
        if let Some(consignee_id) = filter.consignee_id {
            query = query.filter(consignment::Column::ConsigneeId.eq(consignee_id));
        }
        if let Some(vehicle_id) = filter.vehicle_id {
            query = query.filter(consignment::Column::VehicleId.eq(vehicle_id));
        }
        if let Some(is_invoiced) = filter.is_invoiced {
            query = query.filter(consignment::Column::IsInvoiced.eq(is_invoiced));
        }

        let paginator = query
            .order_by_desc(consignment::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count consignments");
            ServiceError::DatabaseError(e)
        })?;

        let consignments = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, page, per_page, "Failed to fetch consignments page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(ConsignmentListResponse {
            consignments: consignments.into_iter().map(model_to_response).collect(),
            total,
            page,
            per_page,
        })
    }

    /// Consignments whose GR is dated today.
    #[instrument(skip(self))]
    pub async fn todays_bookings(&self) -> Result<Vec<ConsignmentResponse>, ServiceError> {
        let today = Utc::now().date_naive();
        let rows = consignment::Entity::find_active()
            .filter(consignment::Column::GrDate.eq(today))
            .order_by_desc(consignment::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;
        Ok(rows.into_iter().map(model_to_response).collect())
    }

    /// Consignments still on the road: Booked, Loaded or In Transit.
    #[instrument(skip(self))]
    pub async fn pending_deliveries(&self) -> Result<Vec<ConsignmentResponse>, ServiceError> {
        let rows = consignment::Entity::find_active()
            .filter(consignment::Column::Status.is_in([
                ConsignmentStatus::Booked,
                ConsignmentStatus::Loaded,
                ConsignmentStatus::InTransit,
            ]))
            .order_by_desc(consignment::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;
        Ok(rows.into_iter().map(model_to_response).collect())
    }

    /// Count of active consignments per status.
    #[instrument(skip(self))]
    pub async fn status_summary(&self) -> Result<Vec<StatusCount>, ServiceError> {
        let db = &*self.db_pool;
        let mut summary = Vec::new();
        for status in ConsignmentStatus::iter() {
            let count = consignment::Entity::find_active()
                .filter(consignment::Column::Status.eq(status))
                .count(db)
                .await
                .map_err(ServiceError::DatabaseError)?;
            summary.push(StatusCount {
                status: status.to_string(),
                count,
            });
        }
        Ok(summary)
    }

    /// Applies a merge patch to a consignment that has not been invoiced yet.
    /// Freight totals are recomputed whenever any amount field changes.
    #[instrument(skip(self, request, actor_id), fields(consignment_id = %consignment_id))]
    pub async fn update_consignment(
        &self,
        consignment_id: Uuid,
        request: UpdateConsignmentRequest,
        actor_id: Uuid,
    ) -> Result<ConsignmentResponse, ServiceError> {
        request.validate()?;
        for (field, value) in [
            ("weight_kg", request.weight_kg),
            ("freight_amount", request.freight_amount),
            ("surcharge", request.surcharge),
            ("other_charges", request.other_charges),
            ("gr_charge", request.gr_charge),
        ] {
            if let Some(value) = value {
                money::ensure_non_negative(field, value)?;
            }
        }

        if let Some(consignor_id) = request.consignor_id {
            self.directory.require_party(consignor_id).await?;
        }
        if let Some(consignee_id) = request.consignee_id {
            self.directory.require_party(consignee_id).await?;
        }
        if let Some(vehicle_id) = request.vehicle_id {
            self.directory.require_vehicle(vehicle_id).await?;
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for consignment update");
            ServiceError::DatabaseError(e)
        })?;

        let model = self.require_active_for_update(&txn, consignment_id).await?;
        if model.is_invoiced {
            return Err(ServiceError::Conflict(format!(
                "cannot modify consignment {}: it is covered by an invoice",
                model.gr_number
            )));
        }

        let old_snapshot = snapshot(&model);

        let amounts_changed = request.freight_amount.is_some()
            || request.surcharge.is_some()
            || request.other_charges.is_some()
            || request.gr_charge.is_some();

        let freight_amount = request.freight_amount.unwrap_or(model.freight_amount);
        let surcharge = request.surcharge.unwrap_or(model.surcharge);
        let other_charges = request.other_charges.unwrap_or(model.other_charges);
        let gr_charge = request.gr_charge.unwrap_or(model.gr_charge);

        let mut active: consignment::ActiveModel = model.into();
        if let Some(gr_date) = request.gr_date {
            active.gr_date = Set(gr_date);
        }
        if let Some(consignor_id) = request.consignor_id {
            active.consignor_id = Set(consignor_id);
        }
        if let Some(consignee_id) = request.consignee_id {
            active.consignee_id = Set(consignee_id);
        }
        if let Some(vehicle_id) = request.vehicle_id {
            active.vehicle_id = Set(vehicle_id);
        }
        if let Some(origin) = request.origin {
            active.origin = Set(origin);
        }
        if let Some(destination) = request.destination {
            active.destination = Set(destination);
        }
        if let Some(weight_kg) = request.weight_kg {
            active.weight_kg = Set(weight_kg);
        }
        if let Some(quantity) = request.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(remarks) = request.remarks {
            active.remarks = Set(Some(remarks));
        }
        if amounts_changed {
            let total_amount =
                money::consignment_total(freight_amount, surcharge, other_charges, gr_charge);
            active.freight_amount = Set(freight_amount);
            active.surcharge = Set(surcharge);
            active.other_charges = Set(other_charges);
            active.gr_charge = Set(gr_charge);
            active.total_amount = Set(total_amount);
            active.amount_in_words = Set(money::amount_in_words(total_amount));
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&txn).await.map_err(|e| {
            error!(error = %e, consignment_id = %consignment_id, "Failed to update consignment");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, consignment_id = %consignment_id, "Failed to commit consignment update");
            ServiceError::DatabaseError(e)
        })?;

        info!(consignment_id = %consignment_id, "Consignment updated");

        self.audit
            .record(
                "consignments",
                consignment_id,
                AuditAction::Update,
                old_snapshot,
                snapshot(&updated),
                actor_id,
            )
            .await;

        if let Err(e) = self
            .event_sender
            .send(Event::ConsignmentUpdated(consignment_id))
            .await
        {
            warn!(error = %e, consignment_id = %consignment_id, "Failed to send consignment updated event");
        }

        Ok(model_to_response(updated))
    }

    /// Moves a consignment along the status machine, stamping the matching
    /// timestamp and appending a history row.
    #[instrument(skip(self, remarks, actor_id), fields(consignment_id = %consignment_id, new_status = %new_status))]
    pub async fn transition_status(
        &self,
        consignment_id: Uuid,
        new_status: ConsignmentStatus,
        remarks: Option<String>,
        actor_id: Uuid,
    ) -> Result<ConsignmentResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for status transition");
            ServiceError::DatabaseError(e)
        })?;

        let model = self.require_active_for_update(&txn, consignment_id).await?;
        let old_status = model.status;
        statuses::validate_transition(old_status, new_status)?;

        let mut active: consignment::ActiveModel = model.into();
        active.status = Set(new_status);
        match new_status {
            ConsignmentStatus::Loaded => active.loaded_at = Set(Some(now)),
            ConsignmentStatus::InTransit => active.in_transit_at = Set(Some(now)),
            ConsignmentStatus::Delivered => active.delivered_at = Set(Some(now)),
            ConsignmentStatus::Settled => active.settled_at = Set(Some(now)),
            ConsignmentStatus::Booked | ConsignmentStatus::Cancelled => {}
        }
        active.updated_at = Set(Some(now));

        let updated = active.update(&txn).await.map_err(|e| {
            error!(error = %e, consignment_id = %consignment_id, "Failed to update consignment status");
            ServiceError::DatabaseError(e)
        })?;

        self.append_history(
            &txn,
            consignment_id,
            Some(old_status),
            new_status,
            remarks,
            actor_id,
        )
        .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, consignment_id = %consignment_id, "Failed to commit status transition");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            consignment_id = %consignment_id,
            from = %old_status,
            to = %new_status,
            "Consignment status changed"
        );
        CONSIGNMENT_STATUS_CHANGES.inc();
        if new_status == ConsignmentStatus::Delivered {
            CONSIGNMENTS_DELIVERED.inc();
        }

        self.audit
            .record(
                "consignments",
                consignment_id,
                AuditAction::StatusChange,
                Some(serde_json::json!({ "status": old_status })),
                Some(serde_json::json!({ "status": new_status })),
                actor_id,
            )
            .await;

        if let Err(e) = self
            .event_sender
            .send(Event::ConsignmentStatusChanged {
                consignment_id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await
        {
            warn!(error = %e, consignment_id = %consignment_id, "Failed to send status changed event");
        }

        Ok(model_to_response(updated))
    }

    /// Soft-deletes a consignment that has not been invoiced.
    #[instrument(skip(self, actor_id), fields(consignment_id = %consignment_id))]
    pub async fn delete_consignment(
        &self,
        consignment_id: Uuid,
        actor_id: Uuid,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for consignment delete");
            ServiceError::DatabaseError(e)
        })?;

        let model = self.require_active_for_update(&txn, consignment_id).await?;
        if model.is_invoiced {
            return Err(ServiceError::Conflict(format!(
                "cannot delete consignment {}: it is covered by an invoice",
                model.gr_number
            )));
        }

        let old_snapshot = snapshot(&model);

        let mut active: consignment::ActiveModel = model.into();
        active.is_deleted = Set(true);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await.map_err(|e| {
            error!(error = %e, consignment_id = %consignment_id, "Failed to soft-delete consignment");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, consignment_id = %consignment_id, "Failed to commit consignment delete");
            ServiceError::DatabaseError(e)
        })?;

        info!(consignment_id = %consignment_id, "Consignment deleted");

        self.audit
            .record(
                "consignments",
                consignment_id,
                AuditAction::Delete,
                old_snapshot,
                None,
                actor_id,
            )
            .await;

        if let Err(e) = self
            .event_sender
            .send(Event::ConsignmentDeleted(consignment_id))
            .await
        {
            warn!(error = %e, consignment_id = %consignment_id, "Failed to send consignment deleted event");
        }

        Ok(())
    }

    /// Chronological status history of a consignment.
    #[instrument(skip(self), fields(consignment_id = %consignment_id))]
    pub async fn status_history(
        &self,
        consignment_id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, ServiceError> {
        let db = &*self.db_pool;
        self.require_active(db, consignment_id).await?;

        let rows = consignment_status_history::Entity::find()
            .filter(consignment_status_history::Column::ConsignmentId.eq(consignment_id))
            .order_by_asc(consignment_status_history::Column::ChangedAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(rows
            .into_iter()
            .map(|row| StatusHistoryEntry {
                id: row.id,
                consignment_id: row.consignment_id,
                from_status: row.from_status.map(|s| s.to_string()),
                to_status: row.to_status.to_string(),
                remarks: row.remarks,
                changed_by: row.changed_by,
                changed_at: row.changed_at,
            })
            .collect())
    }

    /// Renders the consignment note (GR) document and returns its location.
    #[instrument(skip(self), fields(consignment_id = %consignment_id))]
    pub async fn consignment_note(
        &self,
        consignment_id: Uuid,
    ) -> Result<DocumentResponse, ServiceError> {
        let db = &*self.db_pool;
        let model = self.require_active(db, consignment_id).await?;
        let document_path = self.renderer.render_consignment_note(&model).await?;
        Ok(DocumentResponse { document_path })
    }

    async fn require_active<C>(
        &self,
        conn: &C,
        consignment_id: Uuid,
    ) -> Result<consignment::Model, ServiceError>
    where
        C: sea_orm::ConnectionTrait,
    {
        consignment::Entity::find_active()
            .filter(consignment::Column::Id.eq(consignment_id))
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(consignment_id = %consignment_id, "Consignment not found");
                ServiceError::NotFound(format!("Consignment {} not found", consignment_id))
            })
    }

    /// Locked variant for transactional flows; the row lock holds until the
    /// caller's transaction ends.
    async fn require_active_for_update<C>(
        &self,
        conn: &C,
        consignment_id: Uuid,
    ) -> Result<consignment::Model, ServiceError>
    where
        C: sea_orm::ConnectionTrait,
    {
        consignment::Entity::find_active_for_update()
            .filter(consignment::Column::Id.eq(consignment_id))
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(consignment_id = %consignment_id, "Consignment not found");
                ServiceError::NotFound(format!("Consignment {} not found", consignment_id))
            })
    }

    async fn append_history<C>(
        &self,
        conn: &C,
        consignment_id: Uuid,
        from_status: Option<ConsignmentStatus>,
        to_status: ConsignmentStatus,
        remarks: Option<String>,
        actor_id: Uuid,
    ) -> Result<(), ServiceError>
    where
        C: sea_orm::ConnectionTrait,
    {
        let history = consignment_status_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            consignment_id: Set(consignment_id),
            from_status: Set(from_status),
            to_status: Set(to_status),
            remarks: Set(remarks),
            changed_by: Set(actor_id),
            changed_at: Set(Utc::now()),
        };
        history.insert(conn).await.map_err(|e| {
            error!(error = %e, consignment_id = %consignment_id, "Failed to append status history");
            ServiceError::DatabaseError(e)
        })?;
        Ok(())
    }
}

impl From<consignment::Model> for ConsignmentResponse {
    fn from(model: consignment::Model) -> Self {
        model_to_response(model)
    }
}

fn model_to_response(model: consignment::Model) -> ConsignmentResponse {
    let route = model.route();
    ConsignmentResponse {
        id: model.id,
        gr_number: model.gr_number,
        gr_date: model.gr_date,
        consignor_id: model.consignor_id,
        consignee_id: model.consignee_id,
        vehicle_id: model.vehicle_id,
        origin: model.origin,
        destination: model.destination,
        route,
        weight_kg: model.weight_kg,
        quantity: model.quantity,
        description: model.description,
        freight_amount: model.freight_amount,
        surcharge: model.surcharge,
        other_charges: model.other_charges,
        gr_charge: model.gr_charge,
        total_amount: model.total_amount,
        amount_in_words: model.amount_in_words,
        status: model.status.to_string(),
        booked_at: model.booked_at,
        loaded_at: model.loaded_at,
        in_transit_at: model.in_transit_at,
        delivered_at: model.delivered_at,
        settled_at: model.settled_at,
        is_invoiced: model.is_invoiced,
        invoice_id: model.invoice_id,
        remarks: model.remarks,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
