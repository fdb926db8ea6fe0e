use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::audit_log::AuditAction;
use crate::entities::consignment::{self, ConsignmentStatus};
use crate::entities::invoice::{self, PaymentStatus};
use crate::entities::{invoice_item, payment, vehicle};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::metrics::{INVOICES_CREATED, INVOICES_DELETED};
use crate::services::audit::{snapshot, AuditLogger};
use crate::services::consignments::ConsignmentResponse;
use crate::services::directory::DirectoryService;
use crate::services::documents::{DocumentRenderer, DocumentResponse};
use crate::services::{money, sequences};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateInvoiceRequest {
    pub party_id: Uuid,
    #[validate(length(min = 1, message = "At least one consignment is required"))]
    pub consignment_ids: Vec<Uuid>,
    #[schema(example = "30")]
    pub gr_charge: Decimal,
    #[schema(example = "2025-03-05")]
    pub invoice_date: NaiveDate,
    /// Defaults to invoice_date plus the configured credit period.
    pub due_date: Option<NaiveDate>,
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateInvoiceRequest {
    pub gr_charge: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub party_id: Uuid,
    pub party_name: String,
    pub party_address: String,
    pub party_gstin: Option<String>,
    pub subtotal: Decimal,
    pub gr_charge: Decimal,
    pub total_amount: Decimal,
    pub amount_in_words: String,
    pub paid_amount: Decimal,
    pub balance_amount: Decimal,
    pub payment_status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InvoiceItemResponse {
    pub id: Uuid,
    pub consignment_id: Uuid,
    pub gr_number: String,
    pub gr_date: NaiveDate,
    pub vehicle_number: String,
    pub route: String,
    pub quantity: i32,
    pub rate: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InvoiceDetailResponse {
    pub invoice: InvoiceResponse,
    pub items: Vec<InvoiceItemResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InvoiceListResponse {
    pub invoices: Vec<InvoiceResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Optional filters for invoice listings.
#[derive(Debug, Default)]
pub struct InvoiceFilter {
    pub party_id: Option<Uuid>,
    pub payment_status: Option<PaymentStatus>,
}

/// Aggregates delivered consignments into invoices with frozen line-item
/// snapshots, and keeps the derived monetary fields consistent.
#[derive(Clone)]
pub struct InvoiceService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    directory: DirectoryService,
    audit: AuditLogger,
    renderer: Arc<dyn DocumentRenderer>,
    default_due_days: i64,
}

impl InvoiceService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        renderer: Arc<dyn DocumentRenderer>,
        default_due_days: i64,
    ) -> Self {
        let directory = DirectoryService::new(db_pool.clone());
        let audit = AuditLogger::new(db_pool.clone());
        Self {
            db_pool,
            event_sender,
            directory,
            audit,
            renderer,
            default_due_days,
        }
    }

    /// Delivered, uninvoiced consignments where the party is consignor or
    /// consignee. This is the pick list for invoice creation.
    #[instrument(skip(self), fields(party_id = %party_id))]
    pub async fn eligible_for_invoicing(
        &self,
        party_id: Uuid,
    ) -> Result<Vec<ConsignmentResponse>, ServiceError> {
        self.directory.require_party(party_id).await?;

        let rows = consignment::Entity::find_active()
            .filter(consignment::Column::Status.eq(ConsignmentStatus::Delivered))
            .filter(consignment::Column::IsInvoiced.eq(false))
            .filter(
                Condition::any()
                    .add(consignment::Column::ConsignorId.eq(party_id))
                    .add(consignment::Column::ConsigneeId.eq(party_id)),
            )
            .order_by_asc(consignment::Column::GrDate)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(rows.into_iter().map(ConsignmentResponse::from).collect())
    }

    /// Creates an invoice over the given consignments. Eligibility is
    /// re-checked under row locks inside the transaction so neither a stale
    /// pick list nor a concurrent invoice can bill the same consignment
    /// twice.
    #[instrument(skip(self, request, actor_id), fields(party_id = %request.party_id, consignments = request.consignment_ids.len()))]
    pub async fn create_invoice(
        &self,
        request: CreateInvoiceRequest,
        actor_id: Uuid,
    ) -> Result<InvoiceDetailResponse, ServiceError> {
        request.validate()?;
        money::ensure_non_negative("gr_charge", request.gr_charge)?;

        let mut unique_ids = request.consignment_ids.clone();
        unique_ids.sort();
        unique_ids.dedup();
        if unique_ids.len() != request.consignment_ids.len() {
            return Err(ServiceError::ValidationError(
                "consignment_ids contains duplicates".to_string(),
            ));
        }

        let party = self.directory.require_party(request.party_id).await?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let invoice_id = Uuid::new_v4();
        let due_date = request
            .due_date
            .unwrap_or(request.invoice_date + Duration::days(self.default_due_days));

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for invoice creation");
            ServiceError::DatabaseError(e)
        })?;

        let consignments = consignment::Entity::find_active_for_update()
            .filter(consignment::Column::Id.is_in(request.consignment_ids.clone()))
            .all(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if consignments.len() != request.consignment_ids.len() {
            return Err(ServiceError::NotFound(
                "One or more consignments not found".to_string(),
            ));
        }

        for c in &consignments {
            if c.is_invoiced {
                return Err(ServiceError::Conflict(format!(
                    "consignment {} is already covered by an invoice",
                    c.gr_number
                )));
            }
            if c.status != ConsignmentStatus::Delivered {
                return Err(ServiceError::Conflict(format!(
                    "consignment {} is not delivered yet",
                    c.gr_number
                )));
            }
        }

        let vehicle_ids: Vec<Uuid> = consignments.iter().map(|c| c.vehicle_id).collect();
        let vehicle_numbers: HashMap<Uuid, String> = vehicle::Entity::find()
            .filter(vehicle::Column::Id.is_in(vehicle_ids))
            .all(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .into_iter()
            .map(|v| (v.id, v.vehicle_number))
            .collect();

        let subtotal: Decimal = consignments.iter().map(|c| c.total_amount).sum();
        let total_amount = money::invoice_total(subtotal, request.gr_charge);

        let invoice_number = sequences::next_invoice_number(&txn).await?;

        let invoice_model = invoice::ActiveModel {
            id: Set(invoice_id),
            invoice_number: Set(invoice_number.clone()),
            invoice_date: Set(request.invoice_date),
            due_date: Set(due_date),
            party_id: Set(party.id),
            party_name: Set(party.name.clone()),
            party_address: Set(format!("{}, {}, {}", party.address, party.city, party.state)),
            party_gstin: Set(party.gstin.clone()),
            subtotal: Set(subtotal),
            gr_charge: Set(request.gr_charge),
            total_amount: Set(total_amount),
            amount_in_words: Set(money::amount_in_words(total_amount)),
            paid_amount: Set(Decimal::ZERO),
            balance_amount: Set(total_amount),
            payment_status: Set(PaymentStatus::Pending),
            notes: Set(request.notes),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, invoice_number = %invoice_number, "Failed to insert invoice");
            ServiceError::DatabaseError(e)
        })?;

        let mut items = Vec::with_capacity(consignments.len());
        for c in consignments {
            let vehicle_number = vehicle_numbers.get(&c.vehicle_id).cloned().ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "vehicle {} missing for consignment {}",
                    c.vehicle_id, c.gr_number
                ))
            })?;

            let item = invoice_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                invoice_id: Set(invoice_id),
                consignment_id: Set(c.id),
                gr_number: Set(c.gr_number.clone()),
                gr_date: Set(c.gr_date),
                vehicle_number: Set(vehicle_number),
                route: Set(c.route()),
                quantity: Set(c.quantity),
                rate: Set(c.total_amount),
                amount: Set(c.total_amount),
                created_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, gr_number = %c.gr_number, "Failed to insert invoice item");
                ServiceError::DatabaseError(e)
            })?;
            items.push(item);

            let mut linked: consignment::ActiveModel = c.into();
            linked.is_invoiced = Set(true);
            linked.invoice_id = Set(Some(invoice_id));
            linked.updated_at = Set(Some(now));
            linked.update(&txn).await.map_err(|e| {
                error!(error = %e, invoice_id = %invoice_id, "Failed to link consignment to invoice");
                ServiceError::DatabaseError(e)
            })?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, invoice_number = %invoice_number, "Failed to commit invoice creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            invoice_id = %invoice_id,
            invoice_number = %invoice_number,
            subtotal = %subtotal,
            total = %total_amount,
            items = items.len(),
            "Invoice created"
        );
        INVOICES_CREATED.inc();

        self.audit
            .record(
                "invoices",
                invoice_id,
                AuditAction::Create,
                None,
                snapshot(&invoice_model),
                actor_id,
            )
            .await;

        if let Err(e) = self
            .event_sender
            .send(Event::InvoiceCreated {
                invoice_id,
                consignment_count: items.len(),
            })
            .await
        {
            warn!(error = %e, invoice_id = %invoice_id, "Failed to send invoice created event");
        }

        Ok(InvoiceDetailResponse {
            invoice: model_to_response(invoice_model),
            items: items.into_iter().map(item_to_response).collect(),
        })
    }

    /// Fetches one active invoice with its line items.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<InvoiceDetailResponse, ServiceError> {
        let db = &*self.db_pool;
        let model = self.require_active(db, invoice_id).await?;

        let items = invoice_item::Entity::find()
            .filter(invoice_item::Column::InvoiceId.eq(invoice_id))
            .order_by_asc(invoice_item::Column::GrNumber)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(InvoiceDetailResponse {
            invoice: model_to_response(model),
            items: items.into_iter().map(item_to_response).collect(),
        })
    }

    /// Lists active invoices, newest first.
    #[instrument(skip(self, filter))]
    pub async fn list_invoices(
        &self,
        filter: InvoiceFilter,
        page: u64,
        per_page: u64,
    ) -> Result<InvoiceListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        let mut query = invoice::Entity::find_active();
        if let Some(party_id) = filter.party_id {
            query = query.filter(invoice::Column::PartyId.eq(party_id));
        }
        if let Some(payment_status) = filter.payment_status {
            query = query.filter(invoice::Column::PaymentStatus.eq(payment_status));
        }

        let paginator = query
            .order_by_desc(invoice::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count invoices");
            ServiceError::DatabaseError(e)
        })?;

        let invoices = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, page, per_page, "Failed to fetch invoices page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(InvoiceListResponse {
            invoices: invoices.into_iter().map(model_to_response).collect(),
            total,
            page,
            per_page,
        })
    }

    /// Updates the structural fields of an invoice that has no payments.
    /// A gr_charge change recomputes the derived totals.
    #[instrument(skip(self, request, actor_id), fields(invoice_id = %invoice_id))]
    pub async fn update_invoice(
        &self,
        invoice_id: Uuid,
        request: UpdateInvoiceRequest,
        actor_id: Uuid,
    ) -> Result<InvoiceResponse, ServiceError> {
        request.validate()?;
        if let Some(gr_charge) = request.gr_charge {
            money::ensure_non_negative("gr_charge", gr_charge)?;
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for invoice update");
            ServiceError::DatabaseError(e)
        })?;

        let model = self.require_active_for_update(&txn, invoice_id).await?;
        self.ensure_no_payments(&txn, &model).await?;

        let old_snapshot = snapshot(&model);
        let due_date = request.due_date.unwrap_or(model.due_date);

        let mut active: invoice::ActiveModel = model.clone().into();
        if let Some(gr_charge) = request.gr_charge {
            let total_amount = money::invoice_total(model.subtotal, gr_charge);
            active.gr_charge = Set(gr_charge);
            active.total_amount = Set(total_amount);
            active.balance_amount = Set(total_amount - model.paid_amount);
            active.amount_in_words = Set(money::amount_in_words(total_amount));
        }
        if let Some(new_due) = request.due_date {
            active.due_date = Set(new_due);
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }

        let total_amount = request
            .gr_charge
            .map(|gr| money::invoice_total(model.subtotal, gr))
            .unwrap_or(model.total_amount);
        active.payment_status = Set(money::derive_payment_status(
            total_amount,
            model.paid_amount,
            due_date,
            Utc::now().date_naive(),
        ));
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&txn).await.map_err(|e| {
            error!(error = %e, invoice_id = %invoice_id, "Failed to update invoice");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, invoice_id = %invoice_id, "Failed to commit invoice update");
            ServiceError::DatabaseError(e)
        })?;

        info!(invoice_id = %invoice_id, "Invoice updated");

        self.audit
            .record(
                "invoices",
                invoice_id,
                AuditAction::Update,
                old_snapshot,
                snapshot(&updated),
                actor_id,
            )
            .await;

        Ok(model_to_response(updated))
    }

    /// Deletes an invoice with no payments: the invoice is soft-deleted, its
    /// item snapshots are removed and the consignments become re-invoicable.
    #[instrument(skip(self, actor_id), fields(invoice_id = %invoice_id))]
    pub async fn delete_invoice(&self, invoice_id: Uuid, actor_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for invoice delete");
            ServiceError::DatabaseError(e)
        })?;

        let model = self.require_active_for_update(&txn, invoice_id).await?;
        self.ensure_no_payments(&txn, &model).await?;

        let old_snapshot = snapshot(&model);

        invoice_item::Entity::delete_many()
            .filter(invoice_item::Column::InvoiceId.eq(invoice_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, invoice_id = %invoice_id, "Failed to delete invoice items");
                ServiceError::DatabaseError(e)
            })?;

        consignment::Entity::update_many()
            .col_expr(consignment::Column::IsInvoiced, Expr::value(false))
            .col_expr(consignment::Column::InvoiceId, Expr::value(None::<Uuid>))
            .col_expr(consignment::Column::UpdatedAt, Expr::value(Some(now)))
            .filter(consignment::Column::InvoiceId.eq(invoice_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, invoice_id = %invoice_id, "Failed to unlink consignments");
                ServiceError::DatabaseError(e)
            })?;

        let mut active: invoice::ActiveModel = model.into();
        active.is_deleted = Set(true);
        active.updated_at = Set(Some(now));
        active.update(&txn).await.map_err(|e| {
            error!(error = %e, invoice_id = %invoice_id, "Failed to soft-delete invoice");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, invoice_id = %invoice_id, "Failed to commit invoice delete");
            ServiceError::DatabaseError(e)
        })?;

        info!(invoice_id = %invoice_id, "Invoice deleted");
        INVOICES_DELETED.inc();

        self.audit
            .record(
                "invoices",
                invoice_id,
                AuditAction::Delete,
                old_snapshot,
                None,
                actor_id,
            )
            .await;

        if let Err(e) = self.event_sender.send(Event::InvoiceDeleted(invoice_id)).await {
            warn!(error = %e, invoice_id = %invoice_id, "Failed to send invoice deleted event");
        }

        Ok(())
    }

    /// Renders the printable invoice document and returns its location.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn invoice_document(
        &self,
        invoice_id: Uuid,
    ) -> Result<DocumentResponse, ServiceError> {
        let db = &*self.db_pool;
        let model = self.require_active(db, invoice_id).await?;
        let document_path = self.renderer.render_invoice(&model).await?;
        Ok(DocumentResponse { document_path })
    }

    async fn require_active<C>(
        &self,
        conn: &C,
        invoice_id: Uuid,
    ) -> Result<invoice::Model, ServiceError>
    where
        C: sea_orm::ConnectionTrait,
    {
        invoice::Entity::find_active()
            .filter(invoice::Column::Id.eq(invoice_id))
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(invoice_id = %invoice_id, "Invoice not found");
                ServiceError::NotFound(format!("Invoice {} not found", invoice_id))
            })
    }

    /// Locked variant for transactional flows; the row lock holds until the
    /// caller's transaction ends.
    async fn require_active_for_update<C>(
        &self,
        conn: &C,
        invoice_id: Uuid,
    ) -> Result<invoice::Model, ServiceError>
    where
        C: sea_orm::ConnectionTrait,
    {
        invoice::Entity::find_active_for_update()
            .filter(invoice::Column::Id.eq(invoice_id))
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(invoice_id = %invoice_id, "Invoice not found");
                ServiceError::NotFound(format!("Invoice {} not found", invoice_id))
            })
    }

    async fn ensure_no_payments<C>(
        &self,
        conn: &C,
        model: &invoice::Model,
    ) -> Result<(), ServiceError>
    where
        C: sea_orm::ConnectionTrait,
    {
        let payments = payment::Entity::find_active()
            .filter(payment::Column::InvoiceId.eq(model.id))
            .count(conn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if payments > 0 {
            return Err(ServiceError::Conflict(format!(
                "cannot modify invoice {}: payments have been recorded against it",
                model.invoice_number
            )));
        }
        Ok(())
    }
}

fn model_to_response(model: invoice::Model) -> InvoiceResponse {
    InvoiceResponse {
        id: model.id,
        invoice_number: model.invoice_number,
        invoice_date: model.invoice_date,
        due_date: model.due_date,
        party_id: model.party_id,
        party_name: model.party_name,
        party_address: model.party_address,
        party_gstin: model.party_gstin,
        subtotal: model.subtotal,
        gr_charge: model.gr_charge,
        total_amount: model.total_amount,
        amount_in_words: model.amount_in_words,
        paid_amount: model.paid_amount,
        balance_amount: model.balance_amount,
        payment_status: model.payment_status.to_string(),
        notes: model.notes,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn item_to_response(model: invoice_item::Model) -> InvoiceItemResponse {
    InvoiceItemResponse {
        id: model.id,
        consignment_id: model.consignment_id,
        gr_number: model.gr_number,
        gr_date: model.gr_date,
        vehicle_number: model.vehicle_number,
        route: model.route,
        quantity: model.quantity,
        rate: model.rate,
        amount: model.amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn eligibility_recheck_locks_consignment_rows_on_postgres() {
        let sql = consignment::Entity::find_active_for_update()
            .filter(consignment::Column::Id.is_in(vec![Uuid::new_v4()]))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.ends_with("FOR UPDATE"), "unexpected SQL: {sql}");
    }

    #[test]
    fn invoice_guard_reads_lock_the_row_on_postgres() {
        let sql = invoice::Entity::find_active_for_update()
            .filter(invoice::Column::Id.eq(Uuid::new_v4()))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.ends_with("FOR UPDATE"), "unexpected SQL: {sql}");
    }

    #[test]
    fn lock_clause_is_elided_on_sqlite() {
        let sql = consignment::Entity::find_active_for_update()
            .filter(consignment::Column::Id.is_in(vec![Uuid::new_v4()]))
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(!sql.contains("FOR UPDATE"), "unexpected SQL: {sql}");
    }
}
