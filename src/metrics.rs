use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, Encoder, Histogram, IntCounter, TextEncoder,
};
use std::time::Instant;
use tracing::trace;

lazy_static! {
    // HTTP metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounter = register_int_counter!(
        "http_requests_total",
        "Total number of HTTP requests"
    )
    .expect("metric can be created");

    pub static ref HTTP_REQUESTS_SUCCESS: IntCounter = register_int_counter!(
        "http_requests_success_total",
        "Total number of successful HTTP requests"
    )
    .expect("metric can be created");

    pub static ref HTTP_REQUESTS_ERROR: IntCounter = register_int_counter!(
        "http_requests_error_total",
        "Total number of failed HTTP requests"
    )
    .expect("metric can be created");

    pub static ref HTTP_REQUEST_DURATION: Histogram = register_histogram!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds"
    )
    .expect("metric can be created");

    // Business metrics
    pub static ref CONSIGNMENTS_BOOKED: IntCounter = register_int_counter!(
        "consignments_booked_total",
        "Total number of consignments booked"
    )
    .expect("metric can be created");

    pub static ref CONSIGNMENT_STATUS_CHANGES: IntCounter = register_int_counter!(
        "consignment_status_changes_total",
        "Total number of consignment status transitions applied"
    )
    .expect("metric can be created");

    pub static ref CONSIGNMENTS_DELIVERED: IntCounter = register_int_counter!(
        "consignments_delivered_total",
        "Total number of consignments marked delivered"
    )
    .expect("metric can be created");

    pub static ref INVOICES_CREATED: IntCounter = register_int_counter!(
        "invoices_created_total",
        "Total number of invoices created"
    )
    .expect("metric can be created");

    pub static ref INVOICES_DELETED: IntCounter = register_int_counter!(
        "invoices_deleted_total",
        "Total number of invoices deleted"
    )
    .expect("metric can be created");

    pub static ref PAYMENTS_RECORDED: IntCounter = register_int_counter!(
        "payments_recorded_total",
        "Total number of payments recorded"
    )
    .expect("metric can be created");

    pub static ref PAYMENTS_REVERSED: IntCounter = register_int_counter!(
        "payments_reversed_total",
        "Total number of payments reversed"
    )
    .expect("metric can be created");

    pub static ref AMENDMENTS_PROPOSED: IntCounter = register_int_counter!(
        "amendments_proposed_total",
        "Total number of amendments proposed"
    )
    .expect("metric can be created");

    pub static ref AMENDMENTS_APPROVED: IntCounter = register_int_counter!(
        "amendments_approved_total",
        "Total number of amendments approved"
    )
    .expect("metric can be created");

    pub static ref AMENDMENTS_REJECTED: IntCounter = register_int_counter!(
        "amendments_rejected_total",
        "Total number of amendments rejected"
    )
    .expect("metric can be created");
}

/// Record one completed HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, started: Instant) {
    HTTP_REQUESTS_TOTAL.inc();

    trace!(
        http.method = method,
        http.path = path,
        http.status = status,
        latency_secs = started.elapsed().as_secs_f64(),
        "recording HTTP request metrics"
    );

    if status < 400 {
        HTTP_REQUESTS_SUCCESS.inc();
    } else {
        HTTP_REQUESTS_ERROR.inc();
    }

    HTTP_REQUEST_DURATION.observe(started.elapsed().as_secs_f64());
}

/// Gather all registered metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_and_increment() {
        CONSIGNMENTS_BOOKED.inc();
        assert!(CONSIGNMENTS_BOOKED.get() > 0);
    }

    #[test]
    fn gather_produces_text_exposition() {
        HTTP_REQUESTS_TOTAL.inc();
        let text = gather_metrics().unwrap();
        assert!(text.contains("http_requests_total"));
    }
}
