pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_parties_table;
mod m20250301_000002_create_vehicles_table;
mod m20250301_000003_create_consignments_table;
mod m20250301_000004_create_consignment_status_history_table;
mod m20250301_000005_create_invoices_table;
mod m20250301_000006_create_invoice_items_table;
mod m20250301_000007_create_payments_table;
mod m20250301_000008_create_payment_amendments_table;
mod m20250301_000009_create_sequence_counters_table;
mod m20250301_000010_create_audit_logs_table;
mod m20250615_000011_add_lookup_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_parties_table::Migration),
            Box::new(m20250301_000002_create_vehicles_table::Migration),
            Box::new(m20250301_000003_create_consignments_table::Migration),
            Box::new(m20250301_000004_create_consignment_status_history_table::Migration),
            Box::new(m20250301_000005_create_invoices_table::Migration),
            Box::new(m20250301_000006_create_invoice_items_table::Migration),
            Box::new(m20250301_000007_create_payments_table::Migration),
            Box::new(m20250301_000008_create_payment_amendments_table::Migration),
            Box::new(m20250301_000009_create_sequence_counters_table::Migration),
            Box::new(m20250301_000010_create_audit_logs_table::Migration),
            Box::new(m20250615_000011_add_lookup_indexes::Migration),
        ]
    }
}
