//! Database seeder for bursary development and testing.
//!
//! Seeds one academic session with three terms, a class, a tuition fee, and
//! the account that collects it. Running it twice is a no-op.
//!
//! Usage: cargo run --bin seeder

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

use bursary_db::repositories::{
    AcademicError, AccountRepository, CalendarRepository, CreateAccountInput, CreateSessionInput,
    CreateTermInput, PaymentTypeRepository,
};

const SESSION_NAME: &str = "2025/2026";
const TERMS: [(&str, (i32, u32, u32), (i32, u32, u32)); 3] = [
    ("First Term", (2025, 9, 8), (2025, 12, 12)),
    ("Second Term", (2026, 1, 5), (2026, 4, 2)),
    ("Third Term", (2026, 4, 27), (2026, 7, 24)),
];
const CLASSES: [&str; 3] = ["JSS 1", "JSS 2", "JSS 3"];
const TUITION_FEE: i64 = 50_000;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = bursary_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding academic calendar...");
    seed_calendar(&db).await;

    println!("Seeding classes...");
    seed_classes(&db).await;

    println!("Seeding tuition fee and account...");
    seed_tuition(&db).await;

    println!("Seeding complete!");
}

fn date((year, month, day): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

/// Seeds the session and its terms.
async fn seed_calendar(db: &DatabaseConnection) {
    let calendar = CalendarRepository::new(db.clone());

    let existing = calendar
        .list_sessions()
        .await
        .expect("Failed to list sessions");
    if existing.iter().any(|s| s.session.name == SESSION_NAME) {
        println!("  Session {SESSION_NAME} already exists, skipping...");
        return;
    }

    let session = calendar
        .create_session(CreateSessionInput {
            name: SESSION_NAME.to_string(),
            ordinal: None,
        })
        .await
        .expect("Failed to create session");
    println!("  Created session {SESSION_NAME}");

    for (name, start, end) in TERMS {
        calendar
            .create_term(CreateTermInput {
                session_id: session.id,
                name: name.to_string(),
                ordinal: None,
                start_date: date(start),
                end_date: date(end),
                next_term_date: None,
            })
            .await
            .expect("Failed to create term");
        println!("  Created {name}");
    }
}

/// Seeds the junior secondary classes.
async fn seed_classes(db: &DatabaseConnection) {
    let calendar = CalendarRepository::new(db.clone());

    for name in CLASSES {
        match calendar.create_class(name).await {
            Ok(_) => println!("  Created class {name}"),
            Err(AcademicError::DuplicateClass(_)) => {
                println!("  Class {name} already exists, skipping...");
            }
            Err(e) => panic!("Failed to create class {name}: {e}"),
        }
    }
}

/// Seeds the tuition payment type and links it to the school fees account.
async fn seed_tuition(db: &DatabaseConnection) {
    let payment_types = PaymentTypeRepository::new(db.clone());
    let existing = payment_types
        .list_payment_types()
        .await
        .expect("Failed to list payment types");
    if existing.iter().any(|p| p.name == "Tuition") {
        println!("  Tuition already exists, skipping...");
        return;
    }

    let tuition = payment_types
        .create_payment_type(
            "Tuition",
            Decimal::from(TUITION_FEE),
            Some("Termly tuition fee".to_string()),
        )
        .await
        .expect("Failed to create payment type");

    let accounts = AccountRepository::new(db.clone());
    let account = accounts
        .create_account(CreateAccountInput {
            name: "School Fees".to_string(),
            owner: Some("Bursar".to_string()),
            ..Default::default()
        })
        .await
        .expect("Failed to create account");

    accounts
        .link_payment_type(tuition.id, account.id)
        .await
        .expect("Failed to link payment type to account");
    println!("  Linked Tuition to {}", account.name);
}
