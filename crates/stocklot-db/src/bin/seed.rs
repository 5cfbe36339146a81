//! # Seed Data Generator
//!
//! Populates the database with demo batches for development, then runs a
//! sample sale and transfer so the ledger has realistic history to browse.
//!
//! ## Usage
//! ```bash
//! # Generate 200 batches (default)
//! cargo run -p stocklot-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p stocklot-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p stocklot-db --bin seed -- --db ./data/stocklot.db
//! ```
//!
//! ## Generated Data
//! Pharmacy-flavored lots spread across two locations (1 = main store,
//! 2 = warehouse):
//! - Product ids cycle through a small demo catalog
//! - About a third of the lots have no expiration (non-perishables)
//! - Expirations spread over the next 24 months, entry dates over the last 6
//! - Costs $0.50-$25.00, SRP at a 25-60% markup

use chrono::{Duration, NaiveDate, Utc};
use std::env;
use stocklot_core::{ConsumeRequest, NewBatch, TransferLineRequest, TransferRequest};
use stocklot_db::{Database, DbConfig};

/// Demo catalog: (product_id, label, perishable).
const CATALOG: &[(i64, &str, bool)] = &[
    (101, "Paracetamol 500mg", true),
    (102, "Amoxicillin 250mg", true),
    (103, "Ibuprofen 200mg", true),
    (104, "Cetirizine 10mg", true),
    (105, "Omeprazole 20mg", true),
    (106, "Vitamin C 1000mg", true),
    (107, "Cough Syrup 120ml", true),
    (108, "Insulin Pen", true),
    (201, "Digital Thermometer", false),
    (202, "Bandage Roll", false),
    (203, "Surgical Mask 50s", false),
    (204, "Alcohol 70% 500ml", false),
];

const LOCATIONS: &[i64] = &[1, 2];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./stocklot_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("StockLot Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of batches to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./stocklot_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 StockLot Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Batches:  {}", count);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing batches
    let existing = db.batches().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} batches", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Generate batches
    println!();
    println!("Generating batches...");

    let today = Utc::now().date_naive();
    let receiving = db.receiving();
    let mut generated = 0;
    let start = std::time::Instant::now();

    for seed in 0..count {
        let batch = generate_batch(seed, today);
        let reference = format!("GRN-{:05}", seed);

        if let Err(e) = receiving.receive(&batch, Some(&reference), "seed").await {
            eprintln!("Failed to insert {}: {}", batch.batch_reference, e);
            continue;
        }

        generated += 1;

        if generated % 50 == 0 {
            println!("  Generated {} batches...", generated);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} batches in {:?}", generated, elapsed);

    // Demo sale: FIFO-consume a few units of the first catalog product
    println!();
    println!("Running demo sale...");
    let (product_id, label, _) = CATALOG[0];
    let before = db.stock().available_quantity(product_id, 1).await?;
    let debits = db
        .consumption()
        .consume(&ConsumeRequest {
            product_id,
            location_id: 1,
            quantity: 3,
            reference_no: "SALE-DEMO-1".to_string(),
            notes: None,
            actor: "seed".to_string(),
        })
        .await?;
    println!(
        "  Sold 3x {} from {} batch(es); availability {} -> {}",
        label,
        debits.len(),
        before,
        db.stock().available_quantity(product_id, 1).await?
    );

    // Demo transfer: warehouse -> main store
    println!();
    println!("Running demo transfer...");
    let (product_id, label, _) = CATALOG[1];
    let outcome = db
        .transfer_engine()
        .transfer(&TransferRequest {
            source_location_id: 2,
            destination_location_id: 1,
            transfer_date: today,
            transferred_by: "seed".to_string(),
            lines: vec![TransferLineRequest {
                product_id,
                quantity: 2,
            }],
        })
        .await?;
    println!(
        "  Transfer #{} ({:?}): moved 2x {} via {} lot(s)",
        outcome.header.id,
        outcome.header.status,
        label,
        outcome.details.len()
    );

    // Availability summary
    println!();
    println!("Availability by location:");
    for (product_id, label, _) in CATALOG.iter().take(4) {
        let rows = db.stock().available_by_location(*product_id).await?;
        let summary: Vec<String> = rows
            .iter()
            .map(|r| format!("L{}={}", r.location_id, r.available_quantity))
            .collect();
        println!("  {:>22}: {}", label, summary.join("  "));
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single batch with realistic data.
fn generate_batch(seed: usize, today: NaiveDate) -> NewBatch {
    let (product_id, _, perishable) = CATALOG[seed % CATALOG.len()];
    let location_id = LOCATIONS[(seed / CATALOG.len()) % LOCATIONS.len()];

    // Entry dates spread over the last ~6 months
    let entry_date = today - Duration::days(((seed * 13) % 180) as i64);

    // Perishables expire within the next 24 months; the rest never do
    let expiration_date = if perishable {
        Some(today + Duration::days((30 + (seed * 37) % 700) as i64))
    } else {
        None
    };

    // Cost $0.50 - $25.00, SRP at a 25-60% markup
    let unit_cost_cents = 50 + ((seed * 29) % 2450) as i64;
    let markup_pct = 125 + ((seed * 7) % 35) as i64;
    let srp_cents = unit_cost_cents * markup_pct / 100;

    NewBatch {
        product_id,
        location_id,
        batch_reference: format!("PO-{:04}-{:03}", product_id, seed),
        quantity: (5 + (seed * 11) % 96) as i64,
        unit_cost_cents,
        srp_cents,
        expiration_date,
        entry_date,
    }
}
