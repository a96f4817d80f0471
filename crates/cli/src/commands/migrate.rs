//! Database migration command.
//!
//! Migration files live in `crates/server/migrations/` and are embedded in
//! the binary at compile time, so the CLI can migrate any reachable database
//! without a source checkout.

use tracing::info;

use bazaar_server::db;

/// Run database migrations.
///
/// # Errors
///
/// Returns an error if `BAZAAR_DATABASE_URL` is unset, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;

    info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
