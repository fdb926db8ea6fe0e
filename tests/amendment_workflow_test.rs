//! Tests for the amendment propose/approve/reject workflow and the monetary
//! effect approval has on invoice totals.

mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use freightdesk_api::{
    entities::{
        consignment::ConsignmentStatus, payment::PaymentMode,
        payment_amendment::AmendmentType,
    },
    errors::ServiceError,
    services::{
        amendments::ProposeAmendmentRequest,
        consignments::{ConsignmentResponse, CreateConsignmentRequest},
        invoices::{CreateInvoiceRequest, InvoiceResponse},
        payments::CreatePaymentRequest,
    },
};

async fn delivered_consignment(app: &TestApp, vehicle_number: &str) -> ConsignmentResponse {
    let service = app.consignment_service();
    let actor = Uuid::new_v4();

    let consignor = app.seed_party("Sharma Trading Co").await;
    let consignee = app.seed_party("Gupta Textiles Pvt Ltd").await;
    let vehicle = app.seed_vehicle(vehicle_number).await;

    let consignment = service
        .create_consignment(
            CreateConsignmentRequest {
                gr_date: Utc::now().date_naive(),
                consignor_id: consignor.id,
                consignee_id: consignee.id,
                vehicle_id: vehicle.id,
                origin: "Jaipur".to_string(),
                destination: "Mumbai".to_string(),
                weight_kg: dec!(1200),
                quantity: 10,
                description: None,
                freight_amount: dec!(1500),
                surcharge: dec!(50),
                other_charges: dec!(0),
                gr_charge: dec!(20),
                remarks: None,
            },
            actor,
        )
        .await
        .expect("booking");

    for status in [
        ConsignmentStatus::Loaded,
        ConsignmentStatus::InTransit,
        ConsignmentStatus::Delivered,
    ] {
        service
            .transition_status(consignment.id, status, None, actor)
            .await
            .expect("walk to Delivered");
    }

    service
        .get_consignment(consignment.id)
        .await
        .expect("fetch delivered consignment")
}

/// Delivered consignment invoiced at 1600 (1570 subtotal + 30 GR charge).
async fn invoiced_sixteen_hundred(app: &TestApp) -> InvoiceResponse {
    let consignment = delivered_consignment(app, "RJ14GA1234").await;
    let detail = app
        .invoice_service()
        .create_invoice(
            CreateInvoiceRequest {
                party_id: consignment.consignor_id,
                consignment_ids: vec![consignment.id],
                gr_charge: dec!(30),
                invoice_date: Utc::now().date_naive(),
                due_date: None,
                notes: None,
            },
            Uuid::new_v4(),
        )
        .await
        .expect("invoice creation");
    assert_eq!(detail.invoice.total_amount, dec!(1600));
    detail.invoice
}

fn discount_on(invoice_id: Uuid, amount: Decimal) -> ProposeAmendmentRequest {
    ProposeAmendmentRequest {
        invoice_id: Some(invoice_id),
        consignment_id: None,
        amendment_type: AmendmentType::Discount,
        amount,
        reason: "loyalty discount agreed on phone".to_string(),
    }
}

#[tokio::test]
async fn proposal_starts_pending_and_lists() {
    let app = TestApp::new().await;
    let amendments = app.amendment_service();
    let proposer = Uuid::new_v4();

    let invoice = invoiced_sixteen_hundred(&app).await;

    let amendment = amendments
        .propose_amendment(discount_on(invoice.id, dec!(100)), proposer)
        .await
        .expect("proposal");

    assert_eq!(amendment.invoice_id, Some(invoice.id));
    assert_eq!(amendment.amendment_type, "Discount");
    assert_eq!(amendment.proposed_by, proposer);
    assert!(amendment.approved_by.is_none());
    assert!(amendment.approved_at.is_none());

    let pending = amendments.list_pending().await.expect("pending list");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, amendment.id);
}

#[tokio::test]
async fn approving_a_discount_lowers_the_invoice_total() {
    let app = TestApp::new().await;
    let amendments = app.amendment_service();
    let invoices = app.invoice_service();
    let approver = Uuid::new_v4();

    let invoice = invoiced_sixteen_hundred(&app).await;

    let amendment = amendments
        .propose_amendment(discount_on(invoice.id, dec!(100)), Uuid::new_v4())
        .await
        .expect("proposal");

    let approved = amendments
        .approve_amendment(amendment.id, approver)
        .await
        .expect("approval");
    assert_eq!(approved.approved_by, Some(approver));
    assert!(approved.approved_at.is_some());

    let amended = invoices
        .get_invoice(invoice.id)
        .await
        .expect("fetch amended invoice");
    assert_eq!(amended.invoice.total_amount, dec!(1500));
    assert_eq!(amended.invoice.balance_amount, dec!(1500));
    // The components the total was built from stay as billed.
    assert_eq!(amended.invoice.subtotal, dec!(1570));
    assert_eq!(amended.invoice.gr_charge, dec!(30));
    assert_eq!(
        amended.invoice.amount_in_words,
        "One Thousand Five Hundred Rupees Only"
    );

    let pending = amendments.list_pending().await.expect("pending list");
    assert!(pending.is_empty());
}

#[tokio::test]
async fn additional_charge_raises_the_invoice_total() {
    let app = TestApp::new().await;
    let amendments = app.amendment_service();
    let invoices = app.invoice_service();

    let invoice = invoiced_sixteen_hundred(&app).await;

    let amendment = amendments
        .propose_amendment(
            ProposeAmendmentRequest {
                invoice_id: Some(invoice.id),
                consignment_id: None,
                amendment_type: AmendmentType::AdditionalCharge,
                amount: dec!(250),
                reason: "detention charges at unloading".to_string(),
            },
            Uuid::new_v4(),
        )
        .await
        .expect("proposal");

    amendments
        .approve_amendment(amendment.id, Uuid::new_v4())
        .await
        .expect("approval");

    let amended = invoices
        .get_invoice(invoice.id)
        .await
        .expect("fetch amended invoice");
    assert_eq!(amended.invoice.total_amount, dec!(1850));
}

#[tokio::test]
async fn corrections_carry_their_own_sign() {
    let app = TestApp::new().await;
    let amendments = app.amendment_service();
    let invoices = app.invoice_service();

    let invoice = invoiced_sixteen_hundred(&app).await;

    let amendment = amendments
        .propose_amendment(
            ProposeAmendmentRequest {
                invoice_id: Some(invoice.id),
                consignment_id: None,
                amendment_type: AmendmentType::Correction,
                amount: dec!(-50),
                reason: "arithmetic slip on the printed copy".to_string(),
            },
            Uuid::new_v4(),
        )
        .await
        .expect("proposal");

    amendments
        .approve_amendment(amendment.id, Uuid::new_v4())
        .await
        .expect("approval");

    let amended = invoices
        .get_invoice(invoice.id)
        .await
        .expect("fetch amended invoice");
    assert_eq!(amended.invoice.total_amount, dec!(1550));
}

#[tokio::test]
async fn amendments_are_approved_exactly_once() {
    let app = TestApp::new().await;
    let amendments = app.amendment_service();

    let invoice = invoiced_sixteen_hundred(&app).await;

    let amendment = amendments
        .propose_amendment(discount_on(invoice.id, dec!(100)), Uuid::new_v4())
        .await
        .expect("proposal");

    amendments
        .approve_amendment(amendment.id, Uuid::new_v4())
        .await
        .expect("first approval");

    let result = amendments
        .approve_amendment(amendment.id, Uuid::new_v4())
        .await;
    assert_matches!(result, Err(ServiceError::Conflict(_)));

    // An approved amendment cannot be rejected either.
    let result = amendments.reject_amendment(amendment.id, Uuid::new_v4()).await;
    assert_matches!(result, Err(ServiceError::Conflict(_)));
}

#[tokio::test]
async fn rejection_discards_the_proposal() {
    let app = TestApp::new().await;
    let amendments = app.amendment_service();
    let invoices = app.invoice_service();

    let invoice = invoiced_sixteen_hundred(&app).await;

    let amendment = amendments
        .propose_amendment(discount_on(invoice.id, dec!(100)), Uuid::new_v4())
        .await
        .expect("proposal");

    amendments
        .reject_amendment(amendment.id, Uuid::new_v4())
        .await
        .expect("rejection");

    let result = amendments.get_amendment(amendment.id).await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));

    // A rejected amendment can no longer be approved.
    let result = amendments
        .approve_amendment(amendment.id, Uuid::new_v4())
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));

    let untouched = invoices
        .get_invoice(invoice.id)
        .await
        .expect("fetch invoice after rejection");
    assert_eq!(untouched.invoice.total_amount, dec!(1600));
}

#[tokio::test]
async fn approval_cannot_push_the_total_below_the_amount_paid() {
    let app = TestApp::new().await;
    let amendments = app.amendment_service();
    let payments = app.payment_service();

    let invoice = invoiced_sixteen_hundred(&app).await;

    payments
        .create_payment(
            CreatePaymentRequest {
                invoice_id: Some(invoice.id),
                party_id: None,
                amount: dec!(1600),
                payment_date: Utc::now().date_naive(),
                payment_mode: PaymentMode::Cash,
                reference_number: None,
                notes: None,
            },
            Uuid::new_v4(),
        )
        .await
        .expect("full payment");

    let amendment = amendments
        .propose_amendment(discount_on(invoice.id, dec!(200)), Uuid::new_v4())
        .await
        .expect("proposal");

    let result = amendments
        .approve_amendment(amendment.id, Uuid::new_v4())
        .await;
    assert_matches!(result, Err(ServiceError::Conflict(_)));
}

#[tokio::test]
async fn proposal_validates_target_and_amount() {
    let app = TestApp::new().await;
    let amendments = app.amendment_service();
    let proposer = Uuid::new_v4();

    let invoice = invoiced_sixteen_hundred(&app).await;
    let consignment = delivered_consignment(&app, "RJ14GB5678").await;

    // Both targets set.
    let result = amendments
        .propose_amendment(
            ProposeAmendmentRequest {
                invoice_id: Some(invoice.id),
                consignment_id: Some(consignment.id),
                amendment_type: AmendmentType::Discount,
                amount: dec!(10),
                reason: "ambiguous target".to_string(),
            },
            proposer,
        )
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    // No target at all.
    let result = amendments
        .propose_amendment(
            ProposeAmendmentRequest {
                invoice_id: None,
                consignment_id: None,
                amendment_type: AmendmentType::Discount,
                amount: dec!(10),
                reason: "missing target".to_string(),
            },
            proposer,
        )
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    // Discounts must be positive; corrections may be negative.
    let result = amendments
        .propose_amendment(discount_on(invoice.id, dec!(-10)), proposer)
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    // Unknown invoice.
    let result = amendments
        .propose_amendment(discount_on(Uuid::new_v4(), dec!(10)), proposer)
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn consignment_amendments_record_without_monetary_effect() {
    let app = TestApp::new().await;
    let amendments = app.amendment_service();
    let consignments = app.consignment_service();
    let approver = Uuid::new_v4();

    let consignment = delivered_consignment(&app, "RJ14GA1234").await;

    let amendment = amendments
        .propose_amendment(
            ProposeAmendmentRequest {
                invoice_id: None,
                consignment_id: Some(consignment.id),
                amendment_type: AmendmentType::Discount,
                amount: dec!(75),
                reason: "damaged carton noted at delivery".to_string(),
            },
            Uuid::new_v4(),
        )
        .await
        .expect("proposal");

    let approved = amendments
        .approve_amendment(amendment.id, approver)
        .await
        .expect("approval");
    assert_eq!(approved.approved_by, Some(approver));
    assert_eq!(approved.consignment_id, Some(consignment.id));

    let untouched = consignments
        .get_consignment(consignment.id)
        .await
        .expect("fetch consignment after approval");
    assert_eq!(untouched.total_amount, consignment.total_amount);
}
