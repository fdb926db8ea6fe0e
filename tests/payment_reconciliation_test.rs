//! Tests for payment recording and reversal, and the derived invoice
//! payment status that follows the running paid/balance amounts.

mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use freightdesk_api::{
    entities::{consignment::ConsignmentStatus, payment::PaymentMode},
    errors::ServiceError,
    services::{
        consignments::CreateConsignmentRequest,
        invoices::{CreateInvoiceRequest, InvoiceResponse, UpdateInvoiceRequest},
        payments::CreatePaymentRequest,
    },
};

/// Book, deliver and invoice a single consignment. The consignment itself is
/// worth 1070; the invoice GR charge absorbs the difference so the invoice
/// comes out at exactly `total`.
async fn invoice_for(app: &TestApp, total: Decimal) -> InvoiceResponse {
    let consignments = app.consignment_service();
    let invoices = app.invoice_service();
    let actor = Uuid::new_v4();

    let consignor = app.seed_party("Sharma Trading Co").await;
    let consignee = app.seed_party("Gupta Textiles Pvt Ltd").await;
    let vehicle = app.seed_vehicle("RJ14GA1234").await;

    let freight = dec!(1000);
    let surcharge = dec!(50);
    let gr_charge = dec!(20);
    let invoice_gr_charge = total - (freight + surcharge + gr_charge);

    let consignment = consignments
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
                freight_amount: freight,
                surcharge,
                other_charges: dec!(0),
                gr_charge,
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
        consignments
            .transition_status(consignment.id, status, None, actor)
            .await
            .expect("walk to Delivered");
    }

    let detail = invoices
        .create_invoice(
            CreateInvoiceRequest {
                party_id: consignor.id,
                consignment_ids: vec![consignment.id],
                gr_charge: invoice_gr_charge,
                invoice_date: Utc::now().date_naive(),
                due_date: None,
                notes: None,
            },
            actor,
        )
        .await
        .expect("invoice creation");

    assert_eq!(detail.invoice.total_amount, total);
    detail.invoice
}

fn payment_request(invoice_id: Uuid, amount: Decimal) -> CreatePaymentRequest {
    CreatePaymentRequest {
        invoice_id: Some(invoice_id),
        party_id: None,
        amount,
        payment_date: Utc::now().date_naive(),
        payment_mode: PaymentMode::Upi,
        reference_number: Some("UTR-778899".to_string()),
        notes: None,
    }
}

#[tokio::test]
async fn full_payment_settles_the_invoice() {
    let app = TestApp::new().await;
    let payments = app.payment_service();
    let invoices = app.invoice_service();
    let actor = Uuid::new_v4();

    let invoice = invoice_for(&app, dec!(1600)).await;

    let payment = payments
        .create_payment(payment_request(invoice.id, dec!(1600)), actor)
        .await
        .expect("payment should record");

    assert_eq!(payment.payment_number, "PAY0001");
    assert_eq!(payment.amount, dec!(1600));
    assert_eq!(payment.payment_mode, "UPI");

    let settled = invoices
        .get_invoice(invoice.id)
        .await
        .expect("fetch settled invoice");
    assert_eq!(settled.invoice.paid_amount, dec!(1600));
    assert_eq!(settled.invoice.balance_amount, dec!(0));
    assert_eq!(settled.invoice.payment_status, "Paid");
}

#[tokio::test]
async fn partial_payments_accumulate() {
    let app = TestApp::new().await;
    let payments = app.payment_service();
    let invoices = app.invoice_service();
    let actor = Uuid::new_v4();

    let invoice = invoice_for(&app, dec!(1600)).await;

    payments
        .create_payment(payment_request(invoice.id, dec!(600)), actor)
        .await
        .expect("first instalment");

    let after_first = invoices
        .get_invoice(invoice.id)
        .await
        .expect("fetch after first instalment");
    assert_eq!(after_first.invoice.paid_amount, dec!(600));
    assert_eq!(after_first.invoice.balance_amount, dec!(1000));
    assert_eq!(after_first.invoice.payment_status, "Partial");

    payments
        .create_payment(payment_request(invoice.id, dec!(1000)), actor)
        .await
        .expect("second instalment");

    let after_second = invoices
        .get_invoice(invoice.id)
        .await
        .expect("fetch after second instalment");
    assert_eq!(after_second.invoice.paid_amount, dec!(1600));
    assert_eq!(after_second.invoice.balance_amount, dec!(0));
    assert_eq!(after_second.invoice.payment_status, "Paid");
}

#[tokio::test]
async fn overpayment_is_rejected() {
    let app = TestApp::new().await;
    let payments = app.payment_service();
    let actor = Uuid::new_v4();

    let invoice = invoice_for(&app, dec!(1600)).await;

    payments
        .create_payment(payment_request(invoice.id, dec!(1500)), actor)
        .await
        .expect("instalment");

    let result = payments
        .create_payment(payment_request(invoice.id, dec!(200)), actor)
        .await;
    assert_matches!(result, Err(ServiceError::Conflict(_)));
}

#[tokio::test]
async fn payment_requires_exactly_one_target() {
    let app = TestApp::new().await;
    let payments = app.payment_service();
    let actor = Uuid::new_v4();

    let invoice = invoice_for(&app, dec!(1600)).await;
    let party = app.seed_party("Verma Agro Industries").await;

    let mut both = payment_request(invoice.id, dec!(100));
    both.party_id = Some(party.id);
    let result = payments.create_payment(both, actor).await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    let mut neither = payment_request(invoice.id, dec!(100));
    neither.invoice_id = None;
    let result = payments.create_payment(neither, actor).await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn party_payments_hold_unapplied_credit() {
    let app = TestApp::new().await;
    let payments = app.payment_service();
    let actor = Uuid::new_v4();

    let party = app.seed_party("Verma Agro Industries").await;

    let payment = payments
        .create_payment(
            CreatePaymentRequest {
                invoice_id: None,
                party_id: Some(party.id),
                amount: dec!(5000),
                payment_date: Utc::now().date_naive(),
                payment_mode: PaymentMode::BankTransfer,
                reference_number: None,
                notes: Some("advance against March bookings".to_string()),
            },
            actor,
        )
        .await
        .expect("party payment should record");

    assert_eq!(payment.invoice_id, None);
    assert_eq!(payment.party_id, Some(party.id));
    assert_eq!(payment.payment_mode, "Bank Transfer");

    let result = payments
        .create_payment(
            CreatePaymentRequest {
                invoice_id: None,
                party_id: Some(Uuid::new_v4()),
                amount: dec!(100),
                payment_date: Utc::now().date_naive(),
                payment_mode: PaymentMode::Cash,
                reference_number: None,
                notes: None,
            },
            actor,
        )
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn reversal_rolls_the_invoice_back() {
    let app = TestApp::new().await;
    let payments = app.payment_service();
    let invoices = app.invoice_service();
    let actor = Uuid::new_v4();

    let invoice = invoice_for(&app, dec!(1600)).await;

    let payment = payments
        .create_payment(payment_request(invoice.id, dec!(1600)), actor)
        .await
        .expect("payment");

    payments
        .delete_payment(payment.id, actor)
        .await
        .expect("reversal");

    let rolled_back = invoices
        .get_invoice(invoice.id)
        .await
        .expect("fetch after reversal");
    assert_eq!(rolled_back.invoice.paid_amount, dec!(0));
    assert_eq!(rolled_back.invoice.balance_amount, dec!(1600));
    assert_eq!(rolled_back.invoice.payment_status, "Pending");

    let result = payments.get_payment(payment.id).await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn reversing_one_instalment_leaves_the_rest_applied() {
    let app = TestApp::new().await;
    let payments = app.payment_service();
    let invoices = app.invoice_service();
    let actor = Uuid::new_v4();

    let invoice = invoice_for(&app, dec!(1600)).await;

    let first = payments
        .create_payment(payment_request(invoice.id, dec!(600)), actor)
        .await
        .expect("first instalment");
    payments
        .create_payment(payment_request(invoice.id, dec!(1000)), actor)
        .await
        .expect("second instalment");

    payments
        .delete_payment(first.id, actor)
        .await
        .expect("reverse first instalment");

    let remaining = invoices
        .get_invoice(invoice.id)
        .await
        .expect("fetch after partial reversal");
    assert_eq!(remaining.invoice.paid_amount, dec!(1000));
    assert_eq!(remaining.invoice.balance_amount, dec!(600));
    assert_eq!(remaining.invoice.payment_status, "Partial");

    let listed = payments
        .list_for_invoice(invoice.id)
        .await
        .expect("payments for invoice");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].amount, dec!(1000));
}

#[tokio::test]
async fn overdue_surfaces_once_the_due_date_passes() {
    let app = TestApp::new().await;
    let payments = app.payment_service();
    let invoices = app.invoice_service();
    let actor = Uuid::new_v4();

    let invoice = invoice_for(&app, dec!(1600)).await;

    let overdue = invoices
        .update_invoice(
            invoice.id,
            UpdateInvoiceRequest {
                due_date: Some(Utc::now().date_naive() - Duration::days(1)),
                ..Default::default()
            },
            actor,
        )
        .await
        .expect("push due date into the past");
    assert_eq!(overdue.payment_status, "Overdue");

    // A part payment takes precedence over the overdue marker.
    payments
        .create_payment(payment_request(invoice.id, dec!(100)), actor)
        .await
        .expect("part payment");
    let partial = invoices
        .get_invoice(invoice.id)
        .await
        .expect("fetch after part payment");
    assert_eq!(partial.invoice.payment_status, "Partial");
}

#[tokio::test]
async fn recorded_payments_lock_the_invoice() {
    let app = TestApp::new().await;
    let payments = app.payment_service();
    let invoices = app.invoice_service();
    let actor = Uuid::new_v4();

    let invoice = invoice_for(&app, dec!(1600)).await;

    let payment = payments
        .create_payment(payment_request(invoice.id, dec!(600)), actor)
        .await
        .expect("instalment");

    let result = invoices
        .update_invoice(
            invoice.id,
            UpdateInvoiceRequest {
                gr_charge: Some(dec!(100)),
                ..Default::default()
            },
            actor,
        )
        .await;
    assert_matches!(result, Err(ServiceError::Conflict(_)));

    let result = invoices.delete_invoice(invoice.id, actor).await;
    assert_matches!(result, Err(ServiceError::Conflict(_)));

    // Reversing the payment unlocks the invoice again.
    payments
        .delete_payment(payment.id, actor)
        .await
        .expect("reversal");
    invoices
        .update_invoice(
            invoice.id,
            UpdateInvoiceRequest {
                gr_charge: Some(dec!(100)),
                ..Default::default()
            },
            actor,
        )
        .await
        .expect("update after reversal");
}

#[tokio::test]
async fn unknown_invoice_is_reported_on_listing() {
    let app = TestApp::new().await;
    let payments = app.payment_service();

    let result = payments.list_for_invoice(Uuid::new_v4()).await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}
