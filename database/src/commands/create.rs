use sea_orm::{ConnectionTrait, Database, DbBackend, Statement};
use std::error::Error;
use tracing::{error, info};

use crate::config::DatabaseConfig;

/// Execute the create command
pub async fn execute(name: Option<String>) -> Result<(), Box<dyn Error>> {
    let config = DatabaseConfig::from_env()?;
    let db_name = name.unwrap_or(config.name);

    if !is_valid_identifier(&db_name) {
        error!("Refusing to create database with name '{}'", db_name);
        return Err(format!("Invalid database name: {}", db_name).into());
    }

    info!("Creating database: {}", db_name);

    // Connect to the maintenance database, the target may not exist yet
    let maintenance_url = format!("{}/postgres", config.server_url);
    let connection = Database::connect(&maintenance_url).await.map_err(|e| {
        error!("Failed to connect to database server: {}", e);
        e
    })?;

    let existing = connection
        .query_one(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT 1 FROM pg_database WHERE datname = $1",
            [db_name.clone().into()],
        ))
        .await?;

    if existing.is_some() {
        info!("Database '{}' already exists", db_name);
        return Ok(());
    }

    connection
        .execute(Statement::from_string(
            DbBackend::Postgres,
            format!("CREATE DATABASE \"{}\"", db_name),
        ))
        .await
        .map_err(|e| {
            error!("Failed to create database: {}", e);
            e
        })?;

    info!("Database '{}' created successfully", db_name);
    Ok(())
}

fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 63
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
