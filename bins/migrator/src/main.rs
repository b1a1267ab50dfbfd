//! Database migration runner for Splitledger.
//!
//! Usage:
//!   migrator up      - Run all pending migrations
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations

use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use splitledger_db::migration::Migrator;
use splitledger_shared::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = splitledger_db::connect(&config.database.url)
        .await
        .context("failed to connect to the database")?;

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());
    match command.as_str() {
        "up" => Migrator::up(&db, None).await.context("migration up failed")?,
        "down" => Migrator::down(&db, Some(1))
            .await
            .context("migration down failed")?,
        "fresh" => Migrator::fresh(&db).await.context("migration fresh failed")?,
        "status" => Migrator::status(&db)
            .await
            .context("migration status failed")?,
        other => anyhow::bail!("unknown command: {other} (expected up|down|fresh|status)"),
    }

    tracing::info!(command = %command, "migrator finished");
    Ok(())
}
