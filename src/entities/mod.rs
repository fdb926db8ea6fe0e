pub mod audit_log;
pub mod consignment;
pub mod consignment_status_history;
pub mod invoice;
pub mod invoice_item;
pub mod party;
pub mod payment;
pub mod payment_amendment;
pub mod sequence_counter;
pub mod vehicle;
