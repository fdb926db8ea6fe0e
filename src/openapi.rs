use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FreightDesk API",
        version = "0.2.0",
        description = r#"
# FreightDesk Back-Office API

Back-office API for a road freight operator: consignment bookings with a
GR-number lifecycle, invoice aggregation over delivered consignments,
payment reconciliation and an amendment approval workflow.

## Actor Attribution

Mutating endpoints read the `X-Actor-Id` header (a UUID) to attribute the
change in the audit trail. Requests without the header are recorded against
the nil actor.

## Error Handling

Errors use a consistent envelope with appropriate HTTP status codes:

```json
{
  "error": "Conflict",
  "message": "cannot delete consignment GR0042: it is covered by an invoice",
  "request_id": "8e1f...",
  "timestamp": "2025-03-05T10:00:00Z"
}
```

## Pagination

List endpoints accept `page` (default 1) and `per_page` (default 20,
capped by server configuration).
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Consignments", description = "Consignment booking and lifecycle endpoints"),
        (name = "Invoices", description = "Invoice aggregation endpoints"),
        (name = "Payments", description = "Payment reconciliation endpoints"),
        (name = "Amendments", description = "Amendment approval workflow endpoints"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        // Consignments
        crate::handlers::consignments::book_consignment,
        crate::handlers::consignments::get_consignment,
        crate::handlers::consignments::list_consignments,
        crate::handlers::consignments::todays_bookings,
        crate::handlers::consignments::pending_deliveries,
        crate::handlers::consignments::status_summary,
        crate::handlers::consignments::update_consignment,
        crate::handlers::consignments::transition_status,
        crate::handlers::consignments::delete_consignment,
        crate::handlers::consignments::status_history,
        crate::handlers::consignments::consignment_note,

        // Invoices
        crate::handlers::invoices::create_invoice,
        crate::handlers::invoices::eligible_consignments,
        crate::handlers::invoices::get_invoice,
        crate::handlers::invoices::list_invoices,
        crate::handlers::invoices::update_invoice,
        crate::handlers::invoices::delete_invoice,
        crate::handlers::invoices::invoice_payments,
        crate::handlers::invoices::invoice_document,

        // Payments
        crate::handlers::payments::record_payment,
        crate::handlers::payments::get_payment,
        crate::handlers::payments::list_payments,
        crate::handlers::payments::reverse_payment,

        // Amendments
        crate::handlers::amendments::propose_amendment,
        crate::handlers::amendments::get_amendment,
        crate::handlers::amendments::pending_amendments,
        crate::handlers::amendments::approve_amendment,
        crate::handlers::amendments::reject_amendment,

        // Health intentionally omitted from OpenAPI paths
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,

            // Consignment types
            crate::services::consignments::CreateConsignmentRequest,
            crate::services::consignments::UpdateConsignmentRequest,
            crate::services::consignments::ConsignmentResponse,
            crate::services::consignments::ConsignmentListResponse,
            crate::services::consignments::StatusHistoryEntry,
            crate::services::consignments::StatusCount,
            crate::handlers::consignments::TransitionStatusRequest,

            // Invoice types
            crate::services::invoices::CreateInvoiceRequest,
            crate::services::invoices::UpdateInvoiceRequest,
            crate::services::invoices::InvoiceResponse,
            crate::services::invoices::InvoiceItemResponse,
            crate::services::invoices::InvoiceDetailResponse,
            crate::services::invoices::InvoiceListResponse,

            // Payment types
            crate::services::payments::CreatePaymentRequest,
            crate::services::payments::PaymentResponse,
            crate::services::payments::PaymentListResponse,

            // Amendment types
            crate::services::amendments::ProposeAmendmentRequest,
            crate::services::amendments::AmendmentResponse,

            // Document types
            crate::services::documents::DocumentResponse,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_covers_the_api() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("FreightDesk API"));
        assert!(json.contains("/api/v1/consignments"));
        assert!(json.contains("/api/v1/invoices"));
        assert!(json.contains("/api/v1/payments"));
        assert!(json.contains("/api/v1/amendments"));
    }
}
