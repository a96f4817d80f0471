//! Seed the catalog with sample products for local development.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::info;

use bazaar_server::db;

const SAMPLE_PRODUCTS: &[(&str, &str, &str, i32)] = &[
    ("Teapot", "24.00", "Stoneware teapot, 1.2 litres", 40),
    ("Espresso cup", "8.50", "Double-walled glass espresso cup", 120),
    ("Coffee grinder", "64.99", "Conical burr grinder, 40 settings", 15),
    ("Loose leaf tea", "12.25", "Darjeeling second flush, 100g tin", 80),
    ("Pour-over kettle", "39.00", "Gooseneck kettle with thermometer", 25),
];

/// Insert sample products into an empty catalog.
///
/// Refuses to run against a catalog that already has products, so a seed
/// cannot silently duplicate data.
///
/// # Errors
///
/// Returns an error if `BAZAAR_DATABASE_URL` is unset or the database
/// rejects a statement.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;

    info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await?;
    if count > 0 {
        return Err(format!("catalog already has {count} products, not seeding").into());
    }

    for (name, price, description, stock) in SAMPLE_PRODUCTS {
        let price = Decimal::from_str(price)?;
        sqlx::query(
            "INSERT INTO products (name, price, description, stock) VALUES ($1, $2, $3, $4)",
        )
        .bind(name)
        .bind(price)
        .bind(description)
        .bind(stock)
        .execute(&pool)
        .await?;
        info!(product = name, "Seeded product");
    }

    info!(count = SAMPLE_PRODUCTS.len(), "Seeding complete!");
    Ok(())
}
