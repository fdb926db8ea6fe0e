use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::audit_log::AuditAction;
use crate::entities::invoice;
use crate::entities::payment::{self, PaymentMode};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::metrics::{PAYMENTS_RECORDED, PAYMENTS_REVERSED};
use crate::services::audit::{snapshot, AuditLogger};
use crate::services::directory::DirectoryService;
use crate::services::{money, sequences};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePaymentRequest {
    /// Settles this invoice. Mutually exclusive with `party_id`.
    pub invoice_id: Option<Uuid>,
    /// Unapplied credit held against this party. Mutually exclusive with `invoice_id`.
    pub party_id: Option<Uuid>,
    #[schema(example = "1600")]
    pub amount: Decimal,
    #[schema(example = "2025-03-10")]
    pub payment_date: NaiveDate,
    #[schema(value_type = String, example = "UPI")]
    pub payment_mode: PaymentMode,
    #[validate(length(max = 100, message = "Reference number must be at most 100 characters"))]
    pub reference_number: Option<String>,
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub payment_number: String,
    pub invoice_id: Option<Uuid>,
    pub party_id: Option<Uuid>,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_mode: String,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentListResponse {
    pub payments: Vec<PaymentResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Optional filters for payment listings.
#[derive(Debug, Default)]
pub struct PaymentFilter {
    pub invoice_id: Option<Uuid>,
    pub party_id: Option<Uuid>,
}

/// Records payment receipts and keeps invoice paid/balance amounts and the
/// derived payment status in step, both on receipt and on reversal.
#[derive(Clone)]
pub struct PaymentService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    directory: DirectoryService,
    audit: AuditLogger,
}

impl PaymentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let directory = DirectoryService::new(db_pool.clone());
        let audit = AuditLogger::new(db_pool.clone());
        Self {
            db_pool,
            event_sender,
            directory,
            audit,
        }
    }

    /// Records a payment. Invoice payments may not exceed the outstanding
    /// balance; party payments are held as unapplied credit and touch no
    /// invoice.
    #[instrument(skip(self, request, actor_id), fields(amount = %request.amount))]
    pub async fn create_payment(
        &self,
        request: CreatePaymentRequest,
        actor_id: Uuid,
    ) -> Result<PaymentResponse, ServiceError> {
        request.validate()?;
        money::ensure_positive("amount", request.amount)?;

        match (request.invoice_id, request.party_id) {
            (Some(_), Some(_)) | (None, None) => {
                return Err(ServiceError::ValidationError(
                    "exactly one of invoice_id and party_id must be set".to_string(),
                ));
            }
            _ => {}
        }

        if let Some(party_id) = request.party_id {
            self.directory.require_party(party_id).await?;
        }

        let db = &*self.db_pool;
        let now = Utc::now();
        let payment_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for payment creation");
            ServiceError::DatabaseError(e)
        })?;

        if let Some(invoice_id) = request.invoice_id {
            // Locked read: overlapping payments against one invoice serialize
            // here, so the balance check always sees the latest paid amount.
            let invoice_model = invoice::Entity::find_active_for_update()
                .filter(invoice::Column::Id.eq(invoice_id))
                .one(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?
                .ok_or_else(|| {
                    warn!(invoice_id = %invoice_id, "Invoice not found for payment");
                    ServiceError::NotFound(format!("Invoice {} not found", invoice_id))
                })?;

            if request.amount > invoice_model.balance_amount {
                return Err(ServiceError::Conflict(format!(
                    "payment of {} exceeds outstanding balance {} on invoice {}",
                    request.amount, invoice_model.balance_amount, invoice_model.invoice_number
                )));
            }

            let paid_amount = invoice_model.paid_amount + request.amount;
            let balance_amount = invoice_model.total_amount - paid_amount;
            let payment_status = money::derive_payment_status(
                invoice_model.total_amount,
                paid_amount,
                invoice_model.due_date,
                Utc::now().date_naive(),
            );

            let mut active: invoice::ActiveModel = invoice_model.into();
            active.paid_amount = Set(paid_amount);
            active.balance_amount = Set(balance_amount);
            active.payment_status = Set(payment_status);
            active.updated_at = Set(Some(now));
            active.update(&txn).await.map_err(|e| {
                error!(error = %e, invoice_id = %invoice_id, "Failed to apply payment to invoice");
                ServiceError::DatabaseError(e)
            })?;
        }

        let payment_number = sequences::next_payment_number(&txn).await?;

        let model = payment::ActiveModel {
            id: Set(payment_id),
            payment_number: Set(payment_number.clone()),
            invoice_id: Set(request.invoice_id),
            party_id: Set(request.party_id),
            amount: Set(request.amount),
            payment_date: Set(request.payment_date),
            payment_mode: Set(request.payment_mode),
            reference_number: Set(request.reference_number),
            notes: Set(request.notes),
            is_deleted: Set(false),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, payment_number = %payment_number, "Failed to insert payment");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, payment_number = %payment_number, "Failed to commit payment creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            payment_id = %payment_id,
            payment_number = %payment_number,
            amount = %model.amount,
            "Payment recorded"
        );
        PAYMENTS_RECORDED.inc();

        self.audit
            .record(
                "payments",
                payment_id,
                AuditAction::Create,
                None,
                snapshot(&model),
                actor_id,
            )
            .await;

        if let Err(e) = self
            .event_sender
            .send(Event::PaymentRecorded {
                payment_id,
                invoice_id: model.invoice_id,
            })
            .await
        {
            warn!(error = %e, payment_id = %payment_id, "Failed to send payment recorded event");
        }

        Ok(model_to_response(model))
    }

    /// Fetches one active payment.
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn get_payment(&self, payment_id: Uuid) -> Result<PaymentResponse, ServiceError> {
        let db = &*self.db_pool;
        let model = self.require_active(db, payment_id).await?;
        Ok(model_to_response(model))
    }

    /// Lists active payments, newest first.
    #[instrument(skip(self, filter))]
    pub async fn list_payments(
        &self,
        filter: PaymentFilter,
        page: u64,
        per_page: u64,
    ) -> Result<PaymentListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        let mut query = payment::Entity::find_active();
        if let Some(invoice_id) = filter.invoice_id {
            query = query.filter(payment::Column::InvoiceId.eq(invoice_id));
        }
        if let Some(party_id) = filter.party_id {
            query = query.filter(payment::Column::PartyId.eq(party_id));
        }

        let paginator = query
            .order_by_desc(payment::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count payments");
            ServiceError::DatabaseError(e)
        })?;

        let payments = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, page, per_page, "Failed to fetch payments page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(PaymentListResponse {
            payments: payments.into_iter().map(model_to_response).collect(),
            total,
            page,
            per_page,
        })
    }

    /// All active payments recorded against one invoice, oldest first.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn list_for_invoice(
        &self,
        invoice_id: Uuid,
    ) -> Result<Vec<PaymentResponse>, ServiceError> {
        let db = &*self.db_pool;

        invoice::Entity::find_active()
            .filter(invoice::Column::Id.eq(invoice_id))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))?;

        let payments = payment::Entity::find_active()
            .filter(payment::Column::InvoiceId.eq(invoice_id))
            .order_by_asc(payment::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(payments.into_iter().map(model_to_response).collect())
    }

    /// Reverses a payment. The receipt is soft-deleted and, for invoice
    /// payments, the invoice amounts and status roll back as if the payment
    /// had never been recorded.
    #[instrument(skip(self, actor_id), fields(payment_id = %payment_id))]
    pub async fn delete_payment(&self, payment_id: Uuid, actor_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for payment reversal");
            ServiceError::DatabaseError(e)
        })?;

        let model = self.require_active_for_update(&txn, payment_id).await?;
        let old_snapshot = snapshot(&model);

        if let Some(invoice_id) = model.invoice_id {
            let invoice_model = invoice::Entity::find_active_for_update()
                .filter(invoice::Column::Id.eq(invoice_id))
                .one(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?
                .ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "invoice {} missing for payment {}",
                        invoice_id, model.payment_number
                    ))
                })?;

            let paid_amount = invoice_model.paid_amount - model.amount;
            let balance_amount = invoice_model.total_amount - paid_amount;
            let payment_status = money::derive_payment_status(
                invoice_model.total_amount,
                paid_amount,
                invoice_model.due_date,
                Utc::now().date_naive(),
            );

            let mut active: invoice::ActiveModel = invoice_model.into();
            active.paid_amount = Set(paid_amount);
            active.balance_amount = Set(balance_amount);
            active.payment_status = Set(payment_status);
            active.updated_at = Set(Some(now));
            active.update(&txn).await.map_err(|e| {
                error!(error = %e, invoice_id = %invoice_id, "Failed to roll payment back off invoice");
                ServiceError::DatabaseError(e)
            })?;
        }

        let payment_number = model.payment_number.clone();
        let mut active: payment::ActiveModel = model.into();
        active.is_deleted = Set(true);
        active.update(&txn).await.map_err(|e| {
            error!(error = %e, payment_id = %payment_id, "Failed to soft-delete payment");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, payment_id = %payment_id, "Failed to commit payment reversal");
            ServiceError::DatabaseError(e)
        })?;

        info!(payment_id = %payment_id, payment_number = %payment_number, "Payment reversed");
        PAYMENTS_REVERSED.inc();

        self.audit
            .record(
                "payments",
                payment_id,
                AuditAction::Delete,
                old_snapshot,
                None,
                actor_id,
            )
            .await;

        if let Err(e) = self.event_sender.send(Event::PaymentReversed(payment_id)).await {
            warn!(error = %e, payment_id = %payment_id, "Failed to send payment reversed event");
        }

        Ok(())
    }

    async fn require_active<C>(
        &self,
        conn: &C,
        payment_id: Uuid,
    ) -> Result<payment::Model, ServiceError>
    where
        C: sea_orm::ConnectionTrait,
    {
        payment::Entity::find_active()
            .filter(payment::Column::Id.eq(payment_id))
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(payment_id = %payment_id, "Payment not found");
                ServiceError::NotFound(format!("Payment {} not found", payment_id))
            })
    }

    /// Locked variant for transactional flows; the row lock holds until the
    /// caller's transaction ends. A payment reversed by a racing call fails
    /// the active filter after the lock wait and reports NotFound.
    async fn require_active_for_update<C>(
        &self,
        conn: &C,
        payment_id: Uuid,
    ) -> Result<payment::Model, ServiceError>
    where
        C: sea_orm::ConnectionTrait,
    {
        payment::Entity::find_active_for_update()
            .filter(payment::Column::Id.eq(payment_id))
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(payment_id = %payment_id, "Payment not found");
                ServiceError::NotFound(format!("Payment {} not found", payment_id))
            })
    }
}

fn model_to_response(model: payment::Model) -> PaymentResponse {
    PaymentResponse {
        id: model.id,
        payment_number: model.payment_number,
        invoice_id: model.invoice_id,
        party_id: model.party_id,
        amount: model.amount,
        payment_date: model.payment_date,
        payment_mode: model.payment_mode.to_string(),
        reference_number: model.reference_number,
        notes: model.notes,
        created_at: model.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn balance_check_locks_the_invoice_row_on_postgres() {
        let sql = invoice::Entity::find_active_for_update()
            .filter(invoice::Column::Id.eq(Uuid::new_v4()))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.ends_with("FOR UPDATE"), "unexpected SQL: {sql}");
    }

    #[test]
    fn reversal_locks_the_payment_row_on_postgres() {
        let sql = payment::Entity::find_active_for_update()
            .filter(payment::Column::Id.eq(Uuid::new_v4()))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.ends_with("FOR UPDATE"), "unexpected SQL: {sql}");
    }

    #[test]
    fn lock_clause_is_elided_on_sqlite() {
        let sql = invoice::Entity::find_active_for_update()
            .filter(invoice::Column::Id.eq(Uuid::new_v4()))
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(!sql.contains("FOR UPDATE"), "unexpected SQL: {sql}");
    }
}
