//! End-to-end tests for the consignment lifecycle:
//! booking, status walk to settlement, cancellation, updates and deletion.

mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use chrono::Utc;
use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

use freightdesk_api::{
    entities::{consignment::ConsignmentStatus, vehicle},
    errors::ServiceError,
    services::consignments::{CreateConsignmentRequest, UpdateConsignmentRequest},
};

fn booking_request(consignor: Uuid, consignee: Uuid, vehicle: Uuid) -> CreateConsignmentRequest {
    CreateConsignmentRequest {
        gr_date: Utc::now().date_naive(),
        consignor_id: consignor,
        consignee_id: consignee,
        vehicle_id: vehicle,
        origin: "Jaipur".to_string(),
        destination: "Mumbai".to_string(),
        weight_kg: dec!(1200),
        quantity: 10,
        description: Some("Marble slabs".to_string()),
        freight_amount: dec!(1000),
        surcharge: dec!(50),
        other_charges: dec!(0),
        gr_charge: dec!(20),
        remarks: None,
    }
}

#[tokio::test]
async fn booking_allocates_gr_number_and_computes_totals() {
    let app = TestApp::new().await;
    let service = app.consignment_service();

    let consignor = app.seed_party("Sharma Trading Co").await;
    let consignee = app.seed_party("Gupta Textiles Pvt Ltd").await;
    let vehicle = app.seed_vehicle("RJ14GA1234").await;

    let consignment = service
        .create_consignment(
            booking_request(consignor.id, consignee.id, vehicle.id),
            Uuid::new_v4(),
        )
        .await
        .expect("booking should succeed");

    assert_eq!(consignment.gr_number, "GR0001");
    assert_eq!(consignment.status, "Booked");
    assert_eq!(consignment.total_amount, dec!(1070));
    assert_eq!(
        consignment.amount_in_words,
        "One Thousand Seventy Rupees Only"
    );
    assert_eq!(consignment.route, "Jaipur - Mumbai");
    assert!(!consignment.is_invoiced);
    assert!(consignment.invoice_id.is_none());
    assert!(consignment.loaded_at.is_none());
    assert!(consignment.delivered_at.is_none());
}

#[tokio::test]
async fn gr_numbers_increment_per_booking() {
    let app = TestApp::new().await;
    let service = app.consignment_service();

    let consignor = app.seed_party("Consignor").await;
    let consignee = app.seed_party("Consignee").await;
    let vehicle = app.seed_vehicle("RJ14GA1234").await;

    let first = service
        .create_consignment(
            booking_request(consignor.id, consignee.id, vehicle.id),
            Uuid::new_v4(),
        )
        .await
        .expect("first booking");
    let second = service
        .create_consignment(
            booking_request(consignor.id, consignee.id, vehicle.id),
            Uuid::new_v4(),
        )
        .await
        .expect("second booking");

    assert_eq!(first.gr_number, "GR0001");
    assert_eq!(second.gr_number, "GR0002");
}

#[tokio::test]
async fn booking_rejects_unknown_masters() {
    let app = TestApp::new().await;
    let service = app.consignment_service();

    let consignee = app.seed_party("Consignee").await;
    let vehicle = app.seed_vehicle("RJ14GA1234").await;

    let result = service
        .create_consignment(
            booking_request(Uuid::new_v4(), consignee.id, vehicle.id),
            Uuid::new_v4(),
        )
        .await;

    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn booking_rejects_negative_amounts() {
    let app = TestApp::new().await;
    let service = app.consignment_service();

    let consignor = app.seed_party("Consignor").await;
    let consignee = app.seed_party("Consignee").await;
    let vehicle = app.seed_vehicle("RJ14GA1234").await;

    let mut request = booking_request(consignor.id, consignee.id, vehicle.id);
    request.freight_amount = dec!(-1);

    let result = service.create_consignment(request, Uuid::new_v4()).await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn status_walk_reaches_settled_and_stamps_times() {
    let app = TestApp::new().await;
    let service = app.consignment_service();
    let actor = Uuid::new_v4();

    let consignor = app.seed_party("Consignor").await;
    let consignee = app.seed_party("Consignee").await;
    let vehicle = app.seed_vehicle("RJ14GA1234").await;

    let consignment = service
        .create_consignment(
            booking_request(consignor.id, consignee.id, vehicle.id),
            actor,
        )
        .await
        .expect("booking");

    for status in [
        ConsignmentStatus::Loaded,
        ConsignmentStatus::InTransit,
        ConsignmentStatus::Delivered,
        ConsignmentStatus::Settled,
    ] {
        service
            .transition_status(consignment.id, status, None, actor)
            .await
            .expect("transition should be legal");
    }

    let settled = service
        .get_consignment(consignment.id)
        .await
        .expect("fetch after walk");
    assert_eq!(settled.status, "Settled");
    assert!(settled.loaded_at.is_some());
    assert!(settled.in_transit_at.is_some());
    assert!(settled.delivered_at.is_some());
    assert!(settled.settled_at.is_some());

    let history = service
        .status_history(consignment.id)
        .await
        .expect("status history");
    assert_eq!(history.len(), 5);
    assert_eq!(history[0].from_status, None);
    assert_eq!(history[0].to_status, "Booked");
    assert_eq!(history[4].from_status.as_deref(), Some("Delivered"));
    assert_eq!(history[4].to_status, "Settled");
}

#[tokio::test]
async fn illegal_status_jump_is_rejected() {
    let app = TestApp::new().await;
    let service = app.consignment_service();
    let actor = Uuid::new_v4();

    let consignor = app.seed_party("Consignor").await;
    let consignee = app.seed_party("Consignee").await;
    let vehicle = app.seed_vehicle("RJ14GA1234").await;

    let consignment = service
        .create_consignment(
            booking_request(consignor.id, consignee.id, vehicle.id),
            actor,
        )
        .await
        .expect("booking");

    let result = service
        .transition_status(consignment.id, ConsignmentStatus::Delivered, None, actor)
        .await;
    assert_matches!(result, Err(ServiceError::InvalidStatusTransition(_)));

    let unchanged = service
        .get_consignment(consignment.id)
        .await
        .expect("fetch after rejected transition");
    assert_eq!(unchanged.status, "Booked");
}

#[tokio::test]
async fn cancelled_consignments_accept_no_further_transitions() {
    let app = TestApp::new().await;
    let service = app.consignment_service();
    let actor = Uuid::new_v4();

    let consignor = app.seed_party("Consignor").await;
    let consignee = app.seed_party("Consignee").await;
    let vehicle = app.seed_vehicle("RJ14GA1234").await;

    let consignment = service
        .create_consignment(
            booking_request(consignor.id, consignee.id, vehicle.id),
            actor,
        )
        .await
        .expect("booking");

    service
        .transition_status(
            consignment.id,
            ConsignmentStatus::Cancelled,
            Some("customer withdrew".to_string()),
            actor,
        )
        .await
        .expect("cancellation from Booked is legal");

    let result = service
        .transition_status(consignment.id, ConsignmentStatus::Loaded, None, actor)
        .await;
    assert_matches!(result, Err(ServiceError::InvalidStatusTransition(_)));
}

#[tokio::test]
async fn update_recomputes_totals_and_words() {
    let app = TestApp::new().await;
    let service = app.consignment_service();
    let actor = Uuid::new_v4();

    let consignor = app.seed_party("Consignor").await;
    let consignee = app.seed_party("Consignee").await;
    let vehicle = app.seed_vehicle("RJ14GA1234").await;

    let consignment = service
        .create_consignment(
            booking_request(consignor.id, consignee.id, vehicle.id),
            actor,
        )
        .await
        .expect("booking");

    let updated = service
        .update_consignment(
            consignment.id,
            UpdateConsignmentRequest {
                freight_amount: Some(dec!(1500)),
                ..Default::default()
            },
            actor,
        )
        .await
        .expect("update should succeed");

    assert_eq!(updated.total_amount, dec!(1570));
    assert_eq!(
        updated.amount_in_words,
        "One Thousand Five Hundred Seventy Rupees Only"
    );
    assert_eq!(updated.gr_number, consignment.gr_number);
}

#[tokio::test]
async fn delete_soft_deletes_and_hides_the_consignment() {
    let app = TestApp::new().await;
    let service = app.consignment_service();
    let actor = Uuid::new_v4();

    let consignor = app.seed_party("Consignor").await;
    let consignee = app.seed_party("Consignee").await;
    let vehicle = app.seed_vehicle("RJ14GA1234").await;

    let consignment = service
        .create_consignment(
            booking_request(consignor.id, consignee.id, vehicle.id),
            actor,
        )
        .await
        .expect("booking");

    service
        .delete_consignment(consignment.id, actor)
        .await
        .expect("delete should succeed");

    let result = service.get_consignment(consignment.id).await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));

    let result = service
        .transition_status(consignment.id, ConsignmentStatus::Loaded, None, actor)
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn operational_views_reflect_statuses() {
    let app = TestApp::new().await;
    let service = app.consignment_service();
    let actor = Uuid::new_v4();

    let consignor = app.seed_party("Consignor").await;
    let consignee = app.seed_party("Consignee").await;
    let vehicle = app.seed_vehicle("RJ14GA1234").await;

    let first = service
        .create_consignment(
            booking_request(consignor.id, consignee.id, vehicle.id),
            actor,
        )
        .await
        .expect("first booking");
    let second = service
        .create_consignment(
            booking_request(consignor.id, consignee.id, vehicle.id),
            actor,
        )
        .await
        .expect("second booking");

    for status in [
        ConsignmentStatus::Loaded,
        ConsignmentStatus::InTransit,
        ConsignmentStatus::Delivered,
    ] {
        service
            .transition_status(second.id, status, None, actor)
            .await
            .expect("walk to Delivered");
    }

    let today = service.todays_bookings().await.expect("todays bookings");
    assert_eq!(today.len(), 2);

    let pending = service
        .pending_deliveries()
        .await
        .expect("pending deliveries");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, first.id);

    let summary = service.status_summary().await.expect("status summary");
    let booked = summary
        .iter()
        .find(|entry| entry.status == "Booked")
        .expect("booked bucket");
    let delivered = summary
        .iter()
        .find(|entry| entry.status == "Delivered")
        .expect("delivered bucket");
    assert_eq!(booked.count, 1);
    assert_eq!(delivered.count, 1);
}

#[tokio::test]
async fn duplicate_vehicle_number_surfaces_as_conflict() {
    let app = TestApp::new().await;
    app.seed_vehicle("RJ14GA1234").await;

    let duplicate = vehicle::ActiveModel {
        id: Set(Uuid::new_v4()),
        vehicle_number: Set("RJ14GA1234".to_string()),
        vehicle_type: Set("Truck".to_string()),
        capacity_kg: Set(None),
        owner_name: Set(None),
        is_deleted: Set(false),
        created_at: Set(Utc::now()),
    }
    .insert(&*app.state.db)
    .await;

    let err = ServiceError::from(duplicate.expect_err("unique index rejects the duplicate"));
    assert_eq!(err.status_code(), StatusCode::CONFLICT);
    assert_eq!(
        err.response_message(),
        "Conflict: duplicate value for a unique field"
    );
}

#[tokio::test]
async fn consignment_note_renders_a_document_path() {
    let app = TestApp::new().await;
    let service = app.consignment_service();

    let consignor = app.seed_party("Consignor").await;
    let consignee = app.seed_party("Consignee").await;
    let vehicle = app.seed_vehicle("RJ14GA1234").await;

    let consignment = service
        .create_consignment(
            booking_request(consignor.id, consignee.id, vehicle.id),
            Uuid::new_v4(),
        )
        .await
        .expect("booking");

    let document = service
        .consignment_note(consignment.id)
        .await
        .expect("note should render");
    assert_eq!(
        document.document_path,
        "documents/consignment-notes/GR0001.pdf"
    );
}
