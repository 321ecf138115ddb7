//! # Demo Restaurant Seeder
//!
//! Builds a small restaurant in a database and prints what the costing and
//! ledger layers make of it.
//!
//! ## Usage
//! ```bash
//! # Uses the configured database (fogon.toml / FOGON_DB_PATH)
//! cargo run -p fogon-db --bin seed
//!
//! # Throwaway run
//! cargo run -p fogon-db --bin seed -- --db :memory:
//!
//! # Explicit config file
//! cargo run -p fogon-db --bin seed -- --config ./fogon.toml
//! ```
//!
//! ## What It Creates
//! - Raw materials: pan, carne, tomate, vinagre, azúcar
//! - Salsa de la casa (PREPARED, yield 100) made from tomate, vinagre, azúcar
//! - Hamburguesa (PREPARED, yield 10) made from pan, carne, salsa
//! - Bodega principal, stocked through one goods receipt
//!
//! Then it refreshes the recipe costs, sells two hamburguesas and prints the
//! trial balance.

use std::env;
use std::path::PathBuf;

use fogon_core::inventory::{GoodsReceipt, ReceiptLine};
use fogon_core::{Product, ProductType, RecipeItemInput};
use fogon_db::{AppConfig, Database, NewProduct};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut db_override: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_override = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Fogón demo seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -d, --db <PATH>      Database file, or :memory:");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = AppConfig::load(config_path)?;
    if let Some(path) = db_override {
        config.database.path = path;
    }
    config.validate()?;
    config.init_tracing();

    match &config.source {
        Some(file) => info!(?file, "Configuration loaded"),
        None => info!("No config file found, using defaults and environment"),
    }
    info!(path = ?config.database.path, "Opening database");
    let db = Database::new(config.db_config()).await?;

    if db.products().get_by_sku("HAMBURGUESA").await?.is_some() {
        println!("⚠ Demo restaurant already present. Delete the database to regenerate.");
        return Ok(());
    }

    // Catalog
    let products = db.products();
    let raw = |sku: &str, name: &str| NewProduct::new(sku, name, ProductType::Raw);
    let pan = products.create(&raw("PAN", "Pan brioche")).await?;
    let carne = products.create(&raw("CARNE", "Carne de res 150 g")).await?;
    let tomate = products.create(&raw("TOMATE", "Tomate chonto (g)")).await?;
    let vinagre = products.create(&raw("VINAGRE", "Vinagre (ml)")).await?;
    let azucar = products.create(&raw("AZUCAR", "Azúcar (g)")).await?;
    let salsa = products
        .create(&NewProduct::new("SALSA", "Salsa de la casa", ProductType::Prepared))
        .await?;
    let hamburguesa = products
        .create(
            &NewProduct::new("HAMBURGUESA", "Hamburguesa clásica", ProductType::Prepared)
                .price_cents(1_800_000),
        )
        .await?;

    // Recipes
    let recipes = db.recipes();
    recipes
        .save_recipe(
            &salsa.id,
            100.0,
            &[
                RecipeItemInput::new(&tomate.id, 60.0),
                RecipeItemInput::new(&vinagre.id, 10.0),
                RecipeItemInput::new(&azucar.id, 15.0),
            ],
        )
        .await?;
    recipes
        .save_recipe(
            &hamburguesa.id,
            10.0,
            &[
                RecipeItemInput::new(&pan.id, 1.0),
                RecipeItemInput::new(&carne.id, 1.0),
                RecipeItemInput::new(&salsa.id, 0.05),
            ],
        )
        .await?;

    // Stock arrives; the receipt sets the raw material costs
    let inventory = db.inventory();
    let bodega = inventory.create_warehouse("BOD-1", "Bodega principal").await?;
    let receipt = GoodsReceipt {
        warehouse_id: bodega.id.clone(),
        reference: Some("FAC-0001".to_string()),
        lines: vec![
            ReceiptLine::new(&pan.id, 50.0, 500.0),
            ReceiptLine::new(&carne.id, 50.0, 2000.0),
            ReceiptLine::new(&tomate.id, 6000.0, 100.0),
            ReceiptLine::new(&vinagre.id, 1000.0, 250.0),
            ReceiptLine::new(&azucar.id, 2000.0, 100.0),
        ],
    };
    let received = inventory.receive_goods(&receipt).await?;
    println!("✓ Received {} lines (FAC-0001)", received.movements.len());

    recipes.refresh_cost(&salsa.id).await?;
    let cost = recipes.refresh_cost(&hamburguesa.id).await?;

    println!();
    println!("Cost of {}", hamburguesa.name);
    for item in &cost.breakdown {
        let unit = item
            .unit_cost
            .map(|c| format!("{c:>10.2}"))
            .unwrap_or_else(|| format!("{:>10}", "-"));
        let nested = if item.is_nested { " (recipe)" } else { "" };
        println!(
            "  {:<24} {:>8} × {} = {:>10.2}{}",
            item.ingredient_name, item.quantity, unit, item.total_cost, nested
        );
    }
    match cost.calculated_cost {
        Some(unit_cost) => println!("  Unit cost: {unit_cost:.2}"),
        None => println!("  Unit cost unavailable: {:?}", cost.errors),
    }

    // Two burgers sold
    let sale = inventory
        .consume_for_sale(&bodega.id, &hamburguesa.id, 2.0, Some("VENTA-0001"))
        .await?;
    println!();
    println!(
        "✓ Sold 2 × {}: {} ingredient movements, cost of sales {}",
        hamburguesa.name,
        sale.movements.len(),
        sale.cost_of_sales
    );
    print_levels(&db, &bodega.id, &[&pan, &carne, &tomate]).await?;

    let tb = db.ledger().trial_balance().await?;
    println!();
    println!("Trial balance");
    for row in &tb.rows {
        println!(
            "  {} {:<28} {:>14} {:>14} {:>14}",
            row.account_code,
            row.account_name.as_deref().unwrap_or(""),
            row.debits.to_string(),
            row.credits.to_string(),
            row.balance.to_string()
        );
    }
    println!(
        "  {:<33} {:>14} {:>14}  {}",
        "Totals",
        tb.total_debits.to_string(),
        tb.total_credits.to_string(),
        if tb.is_balanced { "balanced" } else { "NOT BALANCED" }
    );

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

async fn print_levels(
    db: &Database,
    warehouse_id: &str,
    products: &[&Product],
) -> Result<(), Box<dyn std::error::Error>> {
    for product in products {
        let quantity = db
            .inventory()
            .stock_level(warehouse_id, &product.id, None)
            .await?
            .map(|level| level.quantity)
            .unwrap_or(0.0);
        println!("  {:<24} on hand {quantity}", product.name);
    }
    Ok(())
}
