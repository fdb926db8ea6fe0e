use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::audit_log::AuditAction;
use crate::entities::payment_amendment::{self, AmendmentType};
use crate::entities::{consignment, invoice};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::metrics::{AMENDMENTS_APPROVED, AMENDMENTS_PROPOSED, AMENDMENTS_REJECTED};
use crate::services::audit::{snapshot, AuditLogger};
use crate::services::money;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ProposeAmendmentRequest {
    /// Amend this invoice's total. Mutually exclusive with `consignment_id`.
    pub invoice_id: Option<Uuid>,
    /// Record an amendment against this consignment. Mutually exclusive with `invoice_id`.
    pub consignment_id: Option<Uuid>,
    #[schema(value_type = String, example = "Discount")]
    pub amendment_type: AmendmentType,
    #[schema(example = "100")]
    pub amount: Decimal,
    #[validate(length(min = 1, max = 500, message = "Reason must be 1 to 500 characters"))]
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AmendmentResponse {
    pub id: Uuid,
    pub invoice_id: Option<Uuid>,
    pub consignment_id: Option<Uuid>,
    pub amendment_type: String,
    pub amount: Decimal,
    pub reason: String,
    pub proposed_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Two-step monetary corrections: anyone proposes, an approver applies.
/// Only approval has a monetary effect, and only for invoice-targeted
/// amendments.
#[derive(Clone)]
pub struct AmendmentService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    audit: AuditLogger,
}

impl AmendmentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let audit = AuditLogger::new(db_pool.clone());
        Self {
            db_pool,
            event_sender,
            audit,
        }
    }

    /// Proposes an amendment against an active invoice or consignment.
    /// The proposal itself changes no amounts.
    #[instrument(skip(self, request, actor_id), fields(amount = %request.amount))]
    pub async fn propose_amendment(
        &self,
        request: ProposeAmendmentRequest,
        actor_id: Uuid,
    ) -> Result<AmendmentResponse, ServiceError> {
        request.validate()?;

        match (request.invoice_id, request.consignment_id) {
            (Some(_), Some(_)) | (None, None) => {
                return Err(ServiceError::ValidationError(
                    "exactly one of invoice_id and consignment_id must be set".to_string(),
                ));
            }
            _ => {}
        }

        match request.amendment_type {
            AmendmentType::AdditionalCharge | AmendmentType::Discount => {
                money::ensure_positive("amount", request.amount)?;
            }
            AmendmentType::Correction => {}
        }

        let db = &*self.db_pool;
        let amendment_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for amendment proposal");
            ServiceError::DatabaseError(e)
        })?;

        if let Some(invoice_id) = request.invoice_id {
            invoice::Entity::find_active()
                .filter(invoice::Column::Id.eq(invoice_id))
                .one(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Invoice {} not found", invoice_id))
                })?;
        }
        if let Some(consignment_id) = request.consignment_id {
            consignment::Entity::find_active()
                .filter(consignment::Column::Id.eq(consignment_id))
                .one(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Consignment {} not found", consignment_id))
                })?;
        }

        let model = payment_amendment::ActiveModel {
            id: Set(amendment_id),
            invoice_id: Set(request.invoice_id),
            consignment_id: Set(request.consignment_id),
            amendment_type: Set(request.amendment_type),
            amount: Set(request.amount),
            reason: Set(request.reason),
            proposed_by: Set(actor_id),
            approved_by: Set(None),
            approved_at: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, amendment_id = %amendment_id, "Failed to insert amendment");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, amendment_id = %amendment_id, "Failed to commit amendment proposal");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            amendment_id = %amendment_id,
            amendment_type = %model.amendment_type,
            amount = %model.amount,
            "Amendment proposed"
        );
        AMENDMENTS_PROPOSED.inc();

        self.audit
            .record(
                "payment_amendments",
                amendment_id,
                AuditAction::Create,
                None,
                snapshot(&model),
                actor_id,
            )
            .await;

        if let Err(e) = self
            .event_sender
            .send(Event::AmendmentProposed(amendment_id))
            .await
        {
            warn!(error = %e, amendment_id = %amendment_id, "Failed to send amendment proposed event");
        }

        Ok(model_to_response(model))
    }

    /// Approves a pending amendment, applying the signed delta to the target
    /// invoice's total. Approval is exactly-once: a second call is a
    /// Conflict, keyed on `approved_at`.
    #[instrument(skip(self, actor_id), fields(amendment_id = %amendment_id))]
    pub async fn approve_amendment(
        &self,
        amendment_id: Uuid,
        actor_id: Uuid,
    ) -> Result<AmendmentResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for amendment approval");
            ServiceError::DatabaseError(e)
        })?;

        let model = self.require_pending_for_update(&txn, amendment_id).await?;
        let old_snapshot = snapshot(&model);

        if let Some(invoice_id) = model.invoice_id {
            let invoice_model = invoice::Entity::find_active_for_update()
                .filter(invoice::Column::Id.eq(invoice_id))
                .one(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Invoice {} not found", invoice_id))
                })?;

            let delta = signed_delta(model.amendment_type, model.amount);
            let total_amount = invoice_model.total_amount + delta;
            if total_amount < invoice_model.paid_amount {
                return Err(ServiceError::Conflict(format!(
                    "cannot approve amendment {}: invoice {} total would fall below the amount already paid",
                    amendment_id, invoice_model.invoice_number
                )));
            }

            let balance_amount = total_amount - invoice_model.paid_amount;
            let payment_status = money::derive_payment_status(
                total_amount,
                invoice_model.paid_amount,
                invoice_model.due_date,
                Utc::now().date_naive(),
            );

            let mut active: invoice::ActiveModel = invoice_model.into();
            active.total_amount = Set(total_amount);
            active.balance_amount = Set(balance_amount);
            active.amount_in_words = Set(money::amount_in_words(total_amount));
            active.payment_status = Set(payment_status);
            active.updated_at = Set(Some(now));
            active.update(&txn).await.map_err(|e| {
                error!(error = %e, invoice_id = %invoice_id, "Failed to apply amendment to invoice");
                ServiceError::DatabaseError(e)
            })?;
        }

        let mut active: payment_amendment::ActiveModel = model.into();
        active.approved_by = Set(Some(actor_id));
        active.approved_at = Set(Some(now));
        let approved = active.update(&txn).await.map_err(|e| {
            error!(error = %e, amendment_id = %amendment_id, "Failed to stamp amendment approval");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, amendment_id = %amendment_id, "Failed to commit amendment approval");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            amendment_id = %amendment_id,
            amendment_type = %approved.amendment_type,
            "Amendment approved"
        );
        AMENDMENTS_APPROVED.inc();

        self.audit
            .record(
                "payment_amendments",
                amendment_id,
                AuditAction::Update,
                old_snapshot,
                snapshot(&approved),
                actor_id,
            )
            .await;

        if let Err(e) = self
            .event_sender
            .send(Event::AmendmentApproved {
                amendment_id,
                invoice_id: approved.invoice_id,
            })
            .await
        {
            warn!(error = %e, amendment_id = %amendment_id, "Failed to send amendment approved event");
        }

        Ok(model_to_response(approved))
    }

    /// Rejects a pending amendment by deleting the row outright. Approved
    /// amendments cannot be rejected; the pending check and the delete run
    /// under one row lock so a racing approval cannot slip between them.
    #[instrument(skip(self, actor_id), fields(amendment_id = %amendment_id))]
    pub async fn reject_amendment(
        &self,
        amendment_id: Uuid,
        actor_id: Uuid,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for amendment rejection");
            ServiceError::DatabaseError(e)
        })?;

        let model = self.require_pending_for_update(&txn, amendment_id).await?;
        let old_snapshot = snapshot(&model);

        model.delete(&txn).await.map_err(|e| {
            error!(error = %e, amendment_id = %amendment_id, "Failed to delete amendment");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, amendment_id = %amendment_id, "Failed to commit amendment rejection");
            ServiceError::DatabaseError(e)
        })?;

        info!(amendment_id = %amendment_id, "Amendment rejected");
        AMENDMENTS_REJECTED.inc();

        self.audit
            .record(
                "payment_amendments",
                amendment_id,
                AuditAction::Delete,
                old_snapshot,
                None,
                actor_id,
            )
            .await;

        if let Err(e) = self
            .event_sender
            .send(Event::AmendmentRejected(amendment_id))
            .await
        {
            warn!(error = %e, amendment_id = %amendment_id, "Failed to send amendment rejected event");
        }

        Ok(())
    }

    /// Fetches one amendment, approved or pending.
    #[instrument(skip(self), fields(amendment_id = %amendment_id))]
    pub async fn get_amendment(&self, amendment_id: Uuid) -> Result<AmendmentResponse, ServiceError> {
        let db = &*self.db_pool;
        let model = self.require_amendment(db, amendment_id).await?;
        Ok(model_to_response(model))
    }

    /// The approval work queue: pending amendments, oldest first.
    #[instrument(skip(self))]
    pub async fn list_pending(&self) -> Result<Vec<AmendmentResponse>, ServiceError> {
        let db = &*self.db_pool;

        let amendments = payment_amendment::Entity::find()
            .filter(payment_amendment::Column::ApprovedAt.is_null())
            .order_by_asc(payment_amendment::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(amendments.into_iter().map(model_to_response).collect())
    }

    async fn require_amendment<C>(
        &self,
        conn: &C,
        amendment_id: Uuid,
    ) -> Result<payment_amendment::Model, ServiceError>
    where
        C: sea_orm::ConnectionTrait,
    {
        payment_amendment::Entity::find_by_id(amendment_id)
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(amendment_id = %amendment_id, "Amendment not found");
                ServiceError::NotFound(format!("Amendment {} not found", amendment_id))
            })
    }

    /// Locked fetch plus the exactly-once gate, for approve and reject.
    /// The row lock holds until the caller's transaction ends: whichever of
    /// two racing calls waits here sees the other's outcome, as a stamped
    /// `approved_at` (Conflict) or a deleted row (NotFound).
    async fn require_pending_for_update<C>(
        &self,
        conn: &C,
        amendment_id: Uuid,
    ) -> Result<payment_amendment::Model, ServiceError>
    where
        C: sea_orm::ConnectionTrait,
    {
        let model = payment_amendment::Entity::find_for_update()
            .filter(payment_amendment::Column::Id.eq(amendment_id))
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(amendment_id = %amendment_id, "Amendment not found");
                ServiceError::NotFound(format!("Amendment {} not found", amendment_id))
            })?;
        if model.is_approved() {
            return Err(ServiceError::Conflict(format!(
                "amendment {} has already been processed",
                amendment_id
            )));
        }
        Ok(model)
    }
}

/// The delta an approved amendment applies to an invoice total.
/// Corrections carry their own sign.
fn signed_delta(amendment_type: AmendmentType, amount: Decimal) -> Decimal {
    match amendment_type {
        AmendmentType::AdditionalCharge => amount,
        AmendmentType::Discount => -amount,
        AmendmentType::Correction => amount,
    }
}

fn model_to_response(model: payment_amendment::Model) -> AmendmentResponse {
    AmendmentResponse {
        id: model.id,
        invoice_id: model.invoice_id,
        consignment_id: model.consignment_id,
        amendment_type: model.amendment_type.to_string(),
        amount: model.amount,
        reason: model.reason,
        proposed_by: model.proposed_by,
        approved_by: model.approved_by,
        approved_at: model.approved_at,
        created_at: model.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn additional_charge_increases_the_total() {
        assert_eq!(
            signed_delta(AmendmentType::AdditionalCharge, dec!(500)),
            dec!(500)
        );
    }

    #[test]
    fn discount_decreases_the_total() {
        assert_eq!(signed_delta(AmendmentType::Discount, dec!(100)), dec!(-100));
    }

    #[test]
    fn correction_keeps_its_stored_sign() {
        assert_eq!(signed_delta(AmendmentType::Correction, dec!(-25)), dec!(-25));
        assert_eq!(signed_delta(AmendmentType::Correction, dec!(40)), dec!(40));
    }

    #[test]
    fn approval_reads_lock_amendment_and_invoice_rows_on_postgres() {
        let amendment_sql = payment_amendment::Entity::find_for_update()
            .filter(payment_amendment::Column::Id.eq(Uuid::new_v4()))
            .build(DbBackend::Postgres)
            .to_string();
        let invoice_sql = invoice::Entity::find_active_for_update()
            .filter(invoice::Column::Id.eq(Uuid::new_v4()))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(
            amendment_sql.ends_with("FOR UPDATE"),
            "unexpected SQL: {amendment_sql}"
        );
        assert!(
            invoice_sql.ends_with("FOR UPDATE"),
            "unexpected SQL: {invoice_sql}"
        );
    }
}
