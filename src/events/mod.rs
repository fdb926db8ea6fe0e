use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Consignment events
    ConsignmentBooked(Uuid),
    ConsignmentUpdated(Uuid),
    ConsignmentDeleted(Uuid),
    ConsignmentStatusChanged {
        consignment_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Invoice events
    InvoiceCreated {
        invoice_id: Uuid,
        consignment_count: usize,
    },
    InvoiceDeleted(Uuid),

    // Payment events
    PaymentRecorded {
        payment_id: Uuid,
        invoice_id: Option<Uuid>,
    },
    PaymentReversed(Uuid),

    // Amendment events
    AmendmentProposed(Uuid),
    AmendmentApproved {
        amendment_id: Uuid,
        invoice_id: Option<Uuid>,
    },
    AmendmentRejected(Uuid),
}

// Function to process incoming events and distribute them to registered event handlers.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::ConsignmentStatusChanged {
                consignment_id,
                ref old_status,
                ref new_status,
            } => {
                if let Err(e) =
                    handle_status_changed(consignment_id, old_status, new_status).await
                {
                    warn!(
                        "Failed to handle status change event: consignment_id={}, error={}",
                        consignment_id, e
                    );
                }
            }
            Event::InvoiceCreated {
                invoice_id,
                consignment_count,
            } => {
                info!(
                    "Invoice {} created covering {} consignments",
                    invoice_id, consignment_count
                );
            }
            Event::PaymentRecorded {
                payment_id,
                invoice_id,
            } => {
                info!(
                    "Payment {} recorded (invoice: {:?})",
                    payment_id, invoice_id
                );
            }
            Event::PaymentReversed(payment_id) => {
                warn!("Payment {} reversed", payment_id);
            }
            Event::AmendmentApproved {
                amendment_id,
                invoice_id,
            } => {
                info!(
                    "Amendment {} approved (invoice: {:?})",
                    amendment_id, invoice_id
                );
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    warn!("Event processing loop has ended");
}

// Handler functions for specific events
async fn handle_status_changed(
    consignment_id: Uuid,
    old_status: &str,
    new_status: &str,
) -> Result<(), String> {
    info!(
        "Consignment {} moved {} -> {}",
        consignment_id, old_status, new_status
    );

    // Delivery is the trigger consignees care about; a notification
    // integration would hook in here.
    if new_status == "Delivered" {
        info!("Consignment {} delivered and ready to invoice", consignment_id);
    }

    Ok(())
}
