//! Seed data script - populates the database with demo master data
//!
//! Run with: cargo run --bin seed-data -- [--database-url <url>]
//!
//! This creates:
//! - 6 parties (consignors and consignees with GSTIN details)
//! - 8 vehicles across the common fleet types
//!
//! Consignments, invoices and payments are created through the API so the
//! GR/invoice number sequences stay consistent.

use clap::Parser;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use tracing::info;
use uuid::Uuid;

use chrono::Utc;
use freightdesk_api::db;
use freightdesk_api::entities::{party, vehicle};

#[derive(Parser)]
#[command(name = "seed-data", about = "Populate FreightDesk with demo master data", version)]
struct Cli {
    /// Database to seed; falls back to DATABASE_URL, then a local sqlite file
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();

    info!("=== FreightDesk API Seed Data ===");
    info!("Creating demo parties and vehicles...\n");

    let database_url = cli
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://freightdesk.db?mode=rwc".to_string());

    info!("Connecting to database: {}", database_url);
    let db = db::establish_connection(&database_url).await?;
    info!("Connected!\n");

    info!("Creating parties...");
    let parties = create_parties(&db).await?;
    info!("  Created {} parties", parties.len());

    info!("Creating vehicles...");
    let vehicles = create_vehicles(&db).await?;
    info!("  Created {} vehicles", vehicles.len());

    info!("\n=== Seed Data Complete ===");
    info!("Book consignments against the seeded masters:");
    info!("  curl http://localhost:8080/api/v1/consignments");
    info!("  curl http://localhost:8080/api/v1/invoices");
    info!("");
    info!("Or explore interactively at: http://localhost:8080/swagger-ui");

    Ok(())
}

async fn create_parties(db: &sea_orm::DatabaseConnection) -> anyhow::Result<Vec<party::Model>> {
    let parties_data = vec![
        (
            "Sharma Trading Co",
            "Plot 14, Transport Nagar",
            "Jaipur",
            "Rajasthan",
            Some("08AABCS1429B1ZT"),
            Some("+91-98290-10101"),
        ),
        (
            "Gupta Textiles Pvt Ltd",
            "52 Industrial Estate, Phase II",
            "Surat",
            "Gujarat",
            Some("24AAACG7582L1Z6"),
            Some("+91-98250-20202"),
        ),
        (
            "Mehta Steel Works",
            "Gate 3, MIDC Taloja",
            "Navi Mumbai",
            "Maharashtra",
            Some("27AABCM3041P1ZD"),
            Some("+91-98200-30303"),
        ),
        (
            "Verma Agro Industries",
            "NH-44, Mandi Road",
            "Ludhiana",
            "Punjab",
            Some("03AADCV8891Q1ZX"),
            None,
        ),
        (
            "Iyer Electronics",
            "118 Anna Salai",
            "Chennai",
            "Tamil Nadu",
            Some("33AABCI5677K1Z2"),
            Some("+91-98400-50505"),
        ),
        (
            "Kumar Distributors",
            "7 Park Street",
            "Kolkata",
            "West Bengal",
            None,
            Some("+91-98300-60606"),
        ),
    ];

    let mut created = Vec::new();
    let now = Utc::now();

    for (name, address, city, state, gstin, phone) in parties_data {
        let record = party::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            address: Set(address.to_string()),
            city: Set(city.to_string()),
            state: Set(state.to_string()),
            gstin: Set(gstin.map(|g| g.to_string())),
            phone: Set(phone.map(|p| p.to_string())),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let model = record.insert(db).await?;
        created.push(model);
    }

    Ok(created)
}

async fn create_vehicles(db: &sea_orm::DatabaseConnection) -> anyhow::Result<Vec<vehicle::Model>> {
    let vehicles_data = vec![
        ("RJ14GA1234", "Truck", Some(dec!(9000)), Some("Ramesh Yadav")),
        ("GJ05BT5678", "Truck", Some(dec!(16000)), Some("Patel Roadlines")),
        ("MH43AJ9012", "Trailer", Some(dec!(25000)), Some("Mehta Steel Works")),
        ("PB10CD3456", "Truck", Some(dec!(12000)), None),
        ("TN09EF7890", "Container", Some(dec!(18000)), Some("Iyer Logistics")),
        ("WB23GH2345", "LCV", Some(dec!(3500)), Some("Kumar Distributors")),
        ("RJ27JK6789", "Tempo", Some(dec!(1500)), Some("Sharma Trading Co")),
        ("MH12LM0123", "Truck", None, None),
    ];

    let mut created = Vec::new();
    let now = Utc::now();

    for (vehicle_number, vehicle_type, capacity_kg, owner_name) in vehicles_data {
        let record = vehicle::ActiveModel {
            id: Set(Uuid::new_v4()),
            vehicle_number: Set(vehicle_number.to_string()),
            vehicle_type: Set(vehicle_type.to_string()),
            capacity_kg: Set(capacity_kg),
            owner_name: Set(owner_name.map(|o| o.to_string())),
            is_deleted: Set(false),
            created_at: Set(now),
        };

        let model = record.insert(db).await?;
        created.push(model);
    }

    Ok(created)
}
