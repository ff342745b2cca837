//! Database seeder for Kvitto development and testing.
//!
//! Seeds a spread of expense records across two owner profiles so reports,
//! filters, and exports have something to chew on locally.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use kvitto_core::record::{Category, ExpenseRecord};
use kvitto_db::RecordRepository;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = Arc::new(
        kvitto_db::connect(&database_url)
            .await
            .expect("Failed to connect to database"),
    );

    println!("Seeding expense records...");
    seed_expense_records(db).await;

    println!("Seeding complete!");
}

/// Deterministic IDs so re-running the seeder is idempotent.
fn seed_id(n: u32) -> Uuid {
    Uuid::parse_str(&format!("00000000-0000-0000-0000-0000000001{n:02}"))
        .expect("valid seed uuid")
}

#[allow(clippy::too_many_lines)]
async fn seed_expense_records(db: Arc<DatabaseConnection>) {
    let repo = RecordRepository::new(db);

    let records = [
        seed_record(
            seed_id(1),
            "alice",
            "Cafe Aurora",
            (2024, 1, 9),
            "42.00",
            Some("2.00"),
            "Meals",
            Some("client breakfast"),
        ),
        seed_record(
            seed_id(2),
            "alice",
            "Nordic Rail",
            (2024, 1, 22),
            "89.50",
            None,
            "Travel",
            Some("site visit"),
        ),
        seed_record(
            seed_id(3),
            "alice",
            "Paperworks",
            (2024, 2, 3),
            "31.75",
            Some("1.51"),
            "Office Supplies",
            None,
        ),
        seed_record(
            seed_id(4),
            "alice",
            "Hotel Nord",
            (2024, 2, 17),
            "260.00",
            None,
            "Lodging",
            Some("two nights, conference"),
        ),
        seed_record(
            seed_id(5),
            "alice",
            "City Fuel",
            (2024, 3, 5),
            "64.20",
            Some("3.06"),
            "Fuel",
            None,
        ),
        seed_record(
            seed_id(6),
            "bob",
            "Cafe Aurora",
            (2024, 1, 15),
            "18.90",
            None,
            "Meals",
            None,
        ),
        seed_record(
            seed_id(7),
            "bob",
            "Kraft Tools",
            (2024, 3, 28),
            "412.00",
            Some("19.62"),
            "Equipment",
            Some("replacement drill"),
        ),
        seed_record(
            seed_id(8),
            "bob",
            "Ledger & Brook",
            (2024, 4, 11),
            "300.00",
            None,
            "Professional Services",
            Some("quarterly bookkeeping"),
        ),
    ];

    for record in records {
        let exists = repo
            .find_by_id(record.id, &record.owner)
            .await
            .expect("Failed to query expense record")
            .is_some();
        if exists {
            println!("  Record {} already exists, skipping...", record.id);
            continue;
        }

        repo.insert(&record)
            .await
            .expect("Failed to insert expense record");
        println!(
            "  Seeded {} / {} / {}",
            record.owner, record.merchant, record.amount
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn seed_record(
    id: Uuid,
    owner: &str,
    merchant: &str,
    date: (i32, u32, u32),
    amount: &str,
    tax: Option<&str>,
    category: &str,
    notes: Option<&str>,
) -> ExpenseRecord {
    ExpenseRecord {
        id,
        owner: owner.to_string(),
        image_key: None,
        merchant: merchant.to_string(),
        transaction_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("valid date"),
        amount: parse_money(amount),
        tax: tax.map(parse_money),
        category: Category::from_label(category),
        notes: notes.map(ToString::to_string),
    }
}

fn parse_money(value: &str) -> Decimal {
    value.parse().expect("valid decimal literal")
}
