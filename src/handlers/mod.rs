pub mod amendments;
pub mod common;
pub mod consignments;
pub mod health;
pub mod invoices;
pub mod payments;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;
