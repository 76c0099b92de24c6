use migration::Migrator;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::prelude::*;
use std::error::Error;
use tracing::{error, info};

use crate::config::DatabaseConfig;

async fn connect() -> Result<DatabaseConnection, Box<dyn Error>> {
    let config = DatabaseConfig::from_env()?;
    info!("Connecting to database: {}", config.name);

    Database::connect(&config.url).await.map_err(|e| {
        error!("Failed to connect to database: {}", e);
        Box::new(e) as Box<dyn Error>
    })
}

/// Execute the migrate command
pub async fn execute(steps: Option<u32>) -> Result<(), Box<dyn Error>> {
    let connection = connect().await?;

    let files = Migrator::get_migration_files();
    info!("Found {} migration files", files.len());

    match steps {
        Some(n) => info!("Running {} migrations", n),
        None => info!("Running all pending migrations"),
    }

    Migrator::up(&connection, steps).await.map_err(|e| {
        error!("Failed to run migrations: {:?}", e);
        e
    })?;

    info!("Migrations applied");
    Ok(())
}

/// Drop every table and re-apply all migrations
pub async fn reset() -> Result<(), Box<dyn Error>> {
    let connection = connect().await?;

    info!("Resetting database schema");
    Migrator::fresh(&connection).await.map_err(|e| {
        error!("Failed to reset database: {:?}", e);
        e
    })?;

    info!("Database reset complete");
    Ok(())
}

/// Log applied and pending migrations
pub async fn status() -> Result<(), Box<dyn Error>> {
    let connection = connect().await?;

    let applied = Migrator::get_applied_migrations(&connection).await?;
    let pending = Migrator::get_pending_migrations(&connection).await?;

    info!("{} applied, {} pending", applied.len(), pending.len());
    for m in &applied {
        info!("applied: {}", m.name());
    }
    for m in &pending {
        info!("pending: {}", m.name());
    }

    Ok(())
}
