// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    middleware,
    response::Response,
    Router,
};
use chrono::Utc;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use freightdesk_api::{
    config::AppConfig,
    db,
    entities::{party, vehicle},
    events::{self, EventSender},
    services::{
        amendments::AmendmentService,
        consignments::ConsignmentService,
        documents::{DocumentRenderer, PathOnlyRenderer},
        invoices::InvoiceService,
        payments::PaymentService,
    },
    AppState,
};

/// Helper harness for spinning up an application state backed by an in-memory
/// SQLite database. Each TestApp owns its own database; the pool is pinned to
/// a single connection so the in-memory schema survives across calls.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let document_renderer: Arc<dyn DocumentRenderer> =
            Arc::new(PathOnlyRenderer::default());

        let state = AppState {
            db: Arc::new(pool),
            config: cfg,
            event_sender,
            document_renderer,
        };

        let router = Router::new()
            .nest("/api/v1", freightdesk_api::api_v1_routes())
            .nest("/health", freightdesk_api::handlers::health::health_routes())
            .layer(middleware::from_fn(
                freightdesk_api::request_id::request_id_middleware,
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    pub fn consignment_service(&self) -> ConsignmentService {
        ConsignmentService::new(
            self.state.db.clone(),
            Arc::new(self.state.event_sender.clone()),
            self.state.document_renderer.clone(),
        )
    }

    pub fn invoice_service(&self) -> InvoiceService {
        InvoiceService::new(
            self.state.db.clone(),
            Arc::new(self.state.event_sender.clone()),
            self.state.document_renderer.clone(),
            self.state.config.invoice_due_days,
        )
    }

    pub fn payment_service(&self) -> PaymentService {
        PaymentService::new(
            self.state.db.clone(),
            Arc::new(self.state.event_sender.clone()),
        )
    }

    pub fn amendment_service(&self) -> AmendmentService {
        AmendmentService::new(
            self.state.db.clone(),
            Arc::new(self.state.event_sender.clone()),
        )
    }

    /// Insert a party master row directly.
    pub async fn seed_party(&self, name: &str) -> party::Model {
        let record = party::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            address: Set("Plot 14, Transport Nagar".to_string()),
            city: Set("Jaipur".to_string()),
            state: Set("Rajasthan".to_string()),
            gstin: Set(Some("08AABCS1429B1ZT".to_string())),
            phone: Set(Some("+91-98290-10101".to_string())),
            is_deleted: Set(false),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        record
            .insert(&*self.state.db)
            .await
            .expect("failed to seed party")
    }

    /// Insert a vehicle master row directly.
    pub async fn seed_vehicle(&self, vehicle_number: &str) -> vehicle::Model {
        let record = vehicle::ActiveModel {
            id: Set(Uuid::new_v4()),
            vehicle_number: Set(vehicle_number.to_string()),
            vehicle_type: Set("Truck".to_string()),
            capacity_kg: Set(Some(dec!(9000))),
            owner_name: Set(Some("Ramesh Yadav".to_string())),
            is_deleted: Set(false),
            created_at: Set(Utc::now()),
        };

        record
            .insert(&*self.state.db)
            .await
            .expect("failed to seed vehicle")
    }

    /// Issue a request against the router without an actor header.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.dispatch(method, uri, body, None).await
    }

    /// Issue a request carrying an `x-actor-id` header.
    pub async fn request_as(
        &self,
        actor_id: Uuid,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.dispatch(method, uri, body, Some(actor_id)).await
    }

    async fn dispatch(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        actor_id: Option<Uuid>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(actor_id) = actor_id {
            builder = builder.header("x-actor-id", actor_id.to_string());
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request build"),
            None => builder.body(Body::empty()).expect("request build"),
        };

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request dispatch")
    }
}
