// Core lifecycle services
pub mod amendments;
pub mod consignments;
pub mod invoices;
pub mod payments;

// Pure helpers shared by the lifecycle services
pub mod money;
pub mod sequences;
pub mod statuses;

// Collaborator shims
pub mod audit;
pub mod directory;
pub mod documents;
