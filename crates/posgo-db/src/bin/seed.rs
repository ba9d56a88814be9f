//! # Seed Data Generator
//!
//! Writes a demo trading day into the database, for development and for the
//! demo template store.
//!
//! ## Usage
//! ```bash
//! # Seed one closed day into the demo template store
//! cargo run -p posgo-db --bin seed
//!
//! # Several days, leaving today's shift open
//! cargo run -p posgo-db --bin seed -- --days 5 --open
//!
//! # Specify database path and store
//! cargo run -p posgo-db --bin seed -- --db ./data/posgo.db --store store-1
//! ```
//!
//! ## Generated Day
//! - OPEN with a float of 100.00
//! - A handful of cash, card, yape and split sales
//! - One OUT "compra de hielo" of 20.00
//! - CLOSE with the expected cash counted

use chrono::{DateTime, Duration, Utc};
use std::env;
use uuid::Uuid;

use posgo_core::shift::{apply, CashAction, ShiftState, TransitionContext};
use posgo_core::totals::compute_totals;
use posgo_core::{
    CartLine, CashMovement, CashShift, Money, PaymentLine, PaymentMethod, Transaction,
    DEMO_TEMPLATE_ID,
};
use posgo_db::{CashGateway, Database, DbConfig};

/// Demo catalog: (name, price in cents)
const PRODUCTS: &[(&str, i64)] = &[
    ("Inca Kola 500ml", 250),
    ("Agua San Luis 625ml", 150),
    ("Pan francés x5", 100),
    ("Leche Gloria 400g", 420),
    ("Hielo 3kg", 450),
    ("Arroz Costeño 1kg", 560),
    ("Galletas Soda Field", 80),
    ("Atún Florida", 690),
];

/// Payment methods cycled through by the generated sales
const METHODS: &[&str] = &["cash", "card", "cash", "yape", "plin", "cash"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut days: u32 = 1;
    let mut leave_open = false;
    let mut db_path = String::from("./posgo_dev.db");
    let mut store_id = String::from(DEMO_TEMPLATE_ID);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" | "-n" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(1);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--store" | "-s" => {
                if i + 1 < args.len() {
                    store_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--open" => leave_open = true,
            "--help" | "-h" => {
                println!("PosGo Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --days <N>      Closed days to generate (default: 1)");
                println!("      --open          Leave a shift open after the last day");
                println!("  -d, --db <PATH>     Database file path (default: ./posgo_dev.db)");
                println!("  -s, --store <ID>    Store id (default: demo template)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 PosGo Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Store:    {}", store_id);
    println!("Days:     {}", days);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let gateway = db.cash_gateway(store_id.as_str());

    if gateway.get_shifts().await?.iter().any(|s| s.is_open()) {
        println!("⚠ Store already has an open shift");
        println!("  Skipping seed; close it first or use another --store.");
        return Ok(());
    }

    let first_day = Utc::now() - Duration::days(i64::from(days));

    for day in 0..days {
        let opened_at = first_day + Duration::days(i64::from(day));
        let (shift, sales) = seed_day(&gateway, opened_at, day as usize, true).await?;
        println!("✓ Day {}: shift {} with {} sales", day + 1, shift.id, sales);
    }

    if leave_open {
        let (shift, sales) = seed_day(&gateway, Utc::now(), days as usize, false).await?;
        println!("✓ Open shift {} with {} sales", shift.id, sales);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Runs one shift through OPEN, sales, an OUT and (optionally) CLOSE.
async fn seed_day(
    gateway: &impl CashGateway,
    opened_at: DateTime<Utc>,
    seed: usize,
    close: bool,
) -> Result<(CashShift, usize), Box<dyn std::error::Error>> {
    let opened = apply(
        ShiftState::None,
        &CashAction::Open {
            amount: Some(100.0),
        },
        context(opened_at),
    )?;
    gateway
        .commit_transition(opened.shift.as_ref(), &opened.movement)
        .await?;

    let mut shift = opened
        .shift
        .ok_or("OPEN produced no shift record")?;
    let mut movements: Vec<CashMovement> = vec![opened.movement];
    let mut transactions = Vec::new();

    let sales = 4 + seed % 4;
    for n in 0..sales {
        let sold_at = opened_at + Duration::minutes(30 * (n as i64 + 1));
        let transaction = generate_sale(&shift.id, sold_at, seed * 10 + n);
        gateway.save_transaction(&transaction).await?;
        transactions.push(transaction);
    }

    let out = apply(
        ShiftState::Open(&shift),
        &CashAction::Out {
            amount: Some(20.0),
            description: "compra de hielo".to_string(),
        },
        context(opened_at + Duration::minutes(45)),
    )?;
    gateway
        .commit_transition(out.shift.as_ref(), &out.movement)
        .await?;
    movements.push(out.movement);

    if close {
        let expected = compute_totals(Some(&shift), &movements, &transactions).cash;
        let closed = apply(
            ShiftState::Open(&shift),
            &CashAction::Close {
                amount: Some(expected.to_decimal()),
            },
            context(opened_at + Duration::hours(9)),
        )?;
        gateway
            .commit_transition(closed.shift.as_ref(), &closed.movement)
            .await?;
        if let Some(updated) = closed.shift {
            shift = updated;
        }
    }

    Ok((shift, sales))
}

fn context(now: DateTime<Utc>) -> TransitionContext {
    TransitionContext::new(
        now,
        Uuid::new_v4().to_string(),
        Uuid::new_v4().to_string(),
    )
}

/// Generates a single sale with one to three cart lines.
fn generate_sale(shift_id: &str, date: DateTime<Utc>, seed: usize) -> Transaction {
    let items: Vec<CartLine> = (0..1 + seed % 3)
        .map(|k| {
            let (name, price) = PRODUCTS[(seed * 7 + k * 3) % PRODUCTS.len()];
            CartLine {
                id: format!("demo-product-{}", (seed * 7 + k * 3) % PRODUCTS.len()),
                name: name.to_string(),
                price: Money::from_cents(price),
                quantity: 1 + ((seed + k) % 3) as i64,
                selected_variant_id: None,
            }
        })
        .collect();

    let total: Money = items.iter().map(CartLine::line_total).sum();
    let method = PaymentMethod::from(METHODS[seed % METHODS.len()]);

    // every fifth sale is split between cash and card
    let payments = (seed % 5 == 4).then(|| {
        let cash = Money::from_cents(total.cents() / 2);
        vec![
            PaymentLine {
                method: PaymentMethod::Cash,
                amount: cash,
            },
            PaymentLine {
                method: PaymentMethod::Card,
                amount: total - cash,
            },
        ]
    });

    Transaction {
        id: Uuid::new_v4().to_string(),
        date,
        items,
        subtotal: total,
        tax: Money::zero(),
        discount: Money::zero(),
        total,
        payment_method: Some(method),
        payments,
        shift_id: Some(shift_id.to_string()),
    }
}
