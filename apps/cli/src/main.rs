//! # Warung POS CLI
//!
//! Terminal front end for the checkout pipeline.
//!
//! ## Usage
//! ```text
//! warung                      # interactive till session
//! warung seed                 # load a demo catalog
//! warung low-stock            # replenishment list
//! warung daily [DATE]         # one day's sales rolled up
//! warung top-products --days 7
//! warung movements --limit 20
//! ```
//!
//! This binary is a thin adapter: every rule lives in warung-core or
//! warung-db; here we only parse input and print results.

mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use warung_core::{Money, ProductInput, TaxRate};
use warung_db::{Database, DbConfig};

// =============================================================================
// Arguments
// =============================================================================

#[derive(Parser)]
#[command(name = "warung", version, about = "Terminal point of sale")]
struct Cli {
    /// Path to the SQLite database file.
    #[arg(long, default_value = "./warung.db")]
    db: PathBuf,

    /// Tax rate as a percentage (default 11, PPN).
    #[arg(long, value_name = "PERCENT")]
    tax_rate: Option<f64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive till session (the default when no command is given).
    Pos,
    /// Loads a small demo catalog into the database.
    Seed,
    /// Lists products at or below their low-stock threshold.
    LowStock,
    /// One day's sales rolled up (defaults to today, UTC).
    Daily { date: Option<NaiveDate> },
    /// Per-product sales over the last N days, best sellers first.
    TopProducts {
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
    /// Recent stock movements, newest first.
    Movements {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

// =============================================================================
// Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so receipts and tables stay clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let tax_rate = match cli.tax_rate {
        Some(pct) => TaxRate::from_percentage(pct).context("invalid --tax-rate")?,
        None => TaxRate::default(),
    };

    let db = Database::new(DbConfig::new(&cli.db))
        .await
        .with_context(|| format!("opening database at {}", cli.db.display()))?;

    match cli.command.unwrap_or(Command::Pos) {
        Command::Pos => session::run(&db, tax_rate).await?,
        Command::Seed => seed(&db).await?,
        Command::LowStock => low_stock(&db).await?,
        Command::Daily { date } => daily(&db, date.unwrap_or_else(|| Utc::now().date_naive())).await?,
        Command::TopProducts { days } => top_products(&db, days).await?,
        Command::Movements { limit } => movements(&db, limit).await?,
    }

    db.close().await;
    Ok(())
}

// =============================================================================
// Subcommands
// =============================================================================

async fn seed(db: &Database) -> Result<()> {
    let demo: &[(&str, &str, i64, i64, i64)] = &[
        ("8991002101234", "Indomie Goreng", 250_000, 350_000, 50),
        ("8996001600146", "Teh Botol Sosro 450ml", 300_000, 500_000, 24),
        ("8998866200578", "Kopi Kapal Api 65g", 900_000, 1_300_000, 12),
        ("8992761111125", "Aqua 600ml", 200_000, 400_000, 48),
        ("8992753100155", "Sabun Lifebuoy", 350_000, 550_000, 20),
        ("8992696404441", "Beras Premium 5kg", 6_000_000, 7_500_000, 8),
    ];

    let products = db.products();
    let mut inserted = 0;
    for (barcode, name, capital, selling, qty) in demo {
        let input = ProductInput::new(
            *barcode,
            *name,
            Money::from_cents(*capital),
            Money::from_cents(*selling),
            *qty,
        );
        match products.insert(&input).await {
            Ok(p) => {
                inserted += 1;
                println!("  + {} ({})", p.name, p.barcode);
            }
            Err(warung_db::DbError::DuplicateBarcode { barcode }) => {
                println!("  = {barcode} already present, skipped");
            }
            Err(e) => return Err(e).context("seeding demo catalog"),
        }
    }
    println!("Seeded {inserted} products.");
    Ok(())
}

async fn low_stock(db: &Database) -> Result<()> {
    let low = db.products().list_low_stock().await?;
    if low.is_empty() {
        println!("No products below their threshold.");
        return Ok(());
    }
    println!("{:<30} {:>8} {:>10}", "Product", "Stock", "Threshold");
    for alert in low.iter().map(warung_core::LowStockAlert::from) {
        println!(
            "{:<30} {:>8} {:>10}",
            alert.name, alert.quantity, alert.threshold
        );
    }
    Ok(())
}

async fn daily(db: &Database, date: NaiveDate) -> Result<()> {
    let summary = db.sales().daily_summary(date).await?;
    println!("Sales for {}", summary.date);
    println!("  Transactions: {}", summary.transactions);
    println!("  Items sold:   {}", summary.items_sold);
    println!("  Subtotal:     {}", Money::from_cents(summary.subtotal_cents).formatted());
    println!("  Tax:          {}", Money::from_cents(summary.tax_cents).formatted());
    println!("  Revenue:      {}", summary.revenue().formatted());
    Ok(())
}

async fn top_products(db: &Database, days: i64) -> Result<()> {
    let end = Utc::now() + Duration::minutes(1);
    let start = end - Duration::days(days);
    let rows = db.sales().product_sales(start, end).await?;
    if rows.is_empty() {
        println!("No sales in the last {days} days.");
        return Ok(());
    }
    println!("{:<30} {:>8} {:>14}", "Product", "Sold", "Revenue");
    for row in rows {
        println!(
            "{:<30} {:>8} {:>14}",
            row.product_name,
            row.quantity_sold,
            Money::from_cents(row.revenue_cents).formatted()
        );
    }
    Ok(())
}

async fn movements(db: &Database, limit: i64) -> Result<()> {
    let entries = db.inventory_log().recent(limit).await?;
    if entries.is_empty() {
        println!("No stock movements recorded.");
        return Ok(());
    }
    println!(
        "{:<20} {:<12} {:>8} {:>8} {:>8}",
        "Date", "Action", "Before", "Change", "After"
    );
    for entry in entries {
        println!(
            "{:<20} {:<12} {:>8} {:>8} {:>8}",
            entry.date.format("%Y-%m-%d %H:%M:%S"),
            format!("{:?}", entry.action).to_lowercase(),
            entry.previous_qty,
            entry.change_qty,
            entry.new_qty
        );
    }
    Ok(())
}
