//! # Interactive Till Session
//!
//! Line-oriented REPL for the cashier: scan items into the cart, review
//! it, check out, manage the catalog. One cart per session; checkout
//! clears it on success and leaves it intact on failure.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use tracing::debug;

use warung_core::{
    generate_barcode, Cart, LineRef, Money, PaymentMethod, ProductInput, Receipt, StoreInfo,
    TaxRate, Totals,
};
use warung_db::{Database, DbError};

const CASHIER: &str = "Admin";

const HELP: &str = "\
Commands:
  scan <barcode> [qty]     add a product to the cart
  search <text>            find products by name or barcode
  cart                     show the cart and running totals
  qty <line> <quantity>    change a line's quantity (0 removes it)
  remove <line|barcode>    remove a line
  clear                    empty the cart
  checkout [payment]       commit the sale (cash, credit, debit, qris)
  add                      add a product to the catalog
  restock <barcode> <qty>  add stock
  low                      list products below their threshold
  help                     show this help
  exit                     leave the session";

/// Runs the interactive session until EOF or `exit`.
pub async fn run(db: &Database, tax_rate: TaxRate) -> Result<()> {
    let mut cart = Cart::new();
    println!("Warung POS - PPN {}%. Type 'help' for commands.", tax_rate.percent_label());

    let stdin = io::stdin();
    loop {
        print!("pos> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else { continue };
        let args: Vec<&str> = parts.collect();

        let result = match command {
            "scan" => scan(db, &mut cart, &args).await,
            "search" => search(db, &args).await,
            "cart" => {
                show_cart(&cart, tax_rate);
                Ok(())
            }
            "qty" => set_quantity(&mut cart, &args),
            "remove" => remove(&mut cart, &args),
            "clear" => {
                cart.clear();
                println!("Cart cleared.");
                Ok(())
            }
            "checkout" => checkout(db, &mut cart, tax_rate, &args).await,
            "add" => add_product(db, &stdin).await,
            "restock" => restock(db, &args).await,
            "low" => low_stock(db).await,
            "help" => {
                println!("{HELP}");
                Ok(())
            }
            "exit" | "quit" => break,
            other => {
                println!("Unknown command '{other}'. Type 'help'.");
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("Error: {e}");
        }
    }

    Ok(())
}

// =============================================================================
// Cart Commands
// =============================================================================

async fn scan(db: &Database, cart: &mut Cart, args: &[&str]) -> Result<()> {
    let Some(barcode) = args.first() else {
        println!("Usage: scan <barcode> [qty]");
        return Ok(());
    };
    let quantity: i64 = match args.get(1) {
        Some(raw) => match raw.parse() {
            Ok(q) => q,
            Err(_) => {
                println!("Quantity must be a number.");
                return Ok(());
            }
        },
        None => 1,
    };

    let Some(product) = db.products().get_by_barcode(barcode).await? else {
        println!("No product with barcode {barcode}.");
        return Ok(());
    };

    match cart.add_product(&product, quantity) {
        Ok(()) => {
            debug!(barcode = %product.barcode, quantity, "Scanned");
            println!(
                "{} x{} @ {} (subtotal {})",
                product.name,
                quantity,
                product.selling_price().formatted(),
                cart.subtotal().formatted()
            );
        }
        Err(e) => println!("{e}"),
    }
    Ok(())
}

fn set_quantity(cart: &mut Cart, args: &[&str]) -> Result<()> {
    let (Some(raw_line), Some(raw_qty)) = (args.first(), args.get(1)) else {
        println!("Usage: qty <line> <quantity>");
        return Ok(());
    };
    let (Ok(line_no), Ok(quantity)) = (raw_line.parse::<usize>(), raw_qty.parse::<i64>()) else {
        println!("Line and quantity must be numbers.");
        return Ok(());
    };
    if line_no == 0 {
        println!("Lines are numbered from 1.");
        return Ok(());
    }
    match cart.set_quantity(&LineRef::Index(line_no - 1), quantity) {
        Ok(()) => println!("Updated."),
        Err(e) => println!("{e}"),
    }
    Ok(())
}

fn remove(cart: &mut Cart, args: &[&str]) -> Result<()> {
    let Some(target) = args.first() else {
        println!("Usage: remove <line|barcode>");
        return Ok(());
    };
    let line_ref = match target.parse::<usize>() {
        Ok(n) if n >= 1 && n <= cart.len() => LineRef::Index(n - 1),
        _ => LineRef::Barcode(target.to_string()),
    };
    match cart.remove_line(&line_ref) {
        Ok(line) => println!("Removed {}.", line.name),
        Err(e) => println!("{e}"),
    }
    Ok(())
}

fn show_cart(cart: &Cart, tax_rate: TaxRate) {
    if cart.is_empty() {
        println!("Cart is empty.");
        return;
    }
    for (i, line) in cart.lines().iter().enumerate() {
        println!(
            "{:>2}. {:<28} {:>3} x {:>10} = {:>12}",
            i + 1,
            line.name,
            line.quantity,
            line.unit_price().formatted(),
            line.line_total().formatted()
        );
    }
    let totals = Totals::compute(cart, tax_rate);
    println!("    Subtotal: {:>12}", totals.subtotal.formatted());
    println!(
        "    PPN {}%: {:>12}",
        tax_rate.percent_label(),
        totals.tax.formatted()
    );
    println!("    TOTAL:    {:>12}", totals.total.formatted());
}

async fn checkout(
    db: &Database,
    cart: &mut Cart,
    tax_rate: TaxRate,
    args: &[&str],
) -> Result<()> {
    let payment_method = if args.is_empty() {
        PaymentMethod::Cash
    } else {
        match PaymentMethod::parse(&args.join(" ")) {
            Ok(m) => m,
            Err(e) => {
                println!("{e}");
                return Ok(());
            }
        }
    };

    let request = warung_db::CheckoutRequest::new(payment_method, tax_rate);
    match db.checkout().commit(cart, &request).await {
        Ok(outcome) => {
            let receipt = Receipt::from_sale(
                StoreInfo::default(),
                CASHIER,
                &outcome.sale,
                &outcome.items,
                tax_rate,
            );
            println!("{}", receipt.render());
            // Only a committed sale empties the cart
            cart.clear();
        }
        Err(e) => println!("Checkout failed: {e}"),
    }
    Ok(())
}

// =============================================================================
// Catalog Commands
// =============================================================================

async fn search(db: &Database, args: &[&str]) -> Result<()> {
    if args.is_empty() {
        println!("Usage: search <text>");
        return Ok(());
    }
    let hits = db.products().search(&args.join(" "), 20).await?;
    if hits.is_empty() {
        println!("No matches.");
        return Ok(());
    }
    for product in hits {
        println!(
            "{:<16} {:<28} {:>10}  stock {}",
            product.barcode,
            product.name,
            product.selling_price().formatted(),
            product.quantity
        );
    }
    Ok(())
}

async fn add_product(db: &Database, stdin: &io::Stdin) -> Result<()> {
    let barcode = {
        let entered = prompt(stdin, "Barcode (empty to generate): ")?;
        if entered.is_empty() {
            let generated = generate_barcode();
            println!("Generated barcode {generated}");
            generated
        } else {
            entered
        }
    };
    let name = prompt(stdin, "Name: ")?;
    let Some(capital) = Money::parse(&prompt(stdin, "Capital price: ")?) else {
        println!("Not a valid amount.");
        return Ok(());
    };
    let Some(selling) = Money::parse(&prompt(stdin, "Selling price: ")?) else {
        println!("Not a valid amount.");
        return Ok(());
    };
    let Ok(quantity) = prompt(stdin, "Initial stock: ")?.parse::<i64>() else {
        println!("Not a valid quantity.");
        return Ok(());
    };

    let input = ProductInput::new(barcode, name, capital, selling, quantity);
    match db.products().insert(&input).await {
        Ok(product) => println!("Added {} ({}).", product.name, product.barcode),
        Err(DbError::DuplicateBarcode { barcode }) => {
            println!("A product with barcode {barcode} already exists.")
        }
        Err(e) => println!("{e}"),
    }
    Ok(())
}

async fn restock(db: &Database, args: &[&str]) -> Result<()> {
    let (Some(barcode), Some(raw_qty)) = (args.first(), args.get(1)) else {
        println!("Usage: restock <barcode> <qty>");
        return Ok(());
    };
    let Ok(quantity) = raw_qty.parse::<i64>() else {
        println!("Quantity must be a number.");
        return Ok(());
    };
    let Some(product) = db.products().get_by_barcode(barcode).await? else {
        println!("No product with barcode {barcode}.");
        return Ok(());
    };
    match db.products().restock(&product.id, quantity).await {
        Ok(updated) => println!("{} now has {} in stock.", updated.name, updated.quantity),
        Err(e) => println!("{e}"),
    }
    Ok(())
}

async fn low_stock(db: &Database) -> Result<()> {
    let low = db.products().list_low_stock().await?;
    if low.is_empty() {
        println!("No products below their threshold.");
        return Ok(());
    }
    for alert in low.iter().map(warung_core::LowStockAlert::from) {
        println!(
            "{:<28} stock {} (threshold {})",
            alert.name, alert.quantity, alert.threshold
        );
    }
    Ok(())
}

fn prompt(stdin: &io::Stdin, label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
