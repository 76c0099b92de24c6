// Database connection pooling management

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

use crate::config::ApiConfig;
use crate::db::error::DbError;
use crate::db::repositories::Repositories;

/// Database connection pool for managing Sea-ORM connections
pub struct DbPool {
    pool: DatabaseConnection,
}

impl DbPool {
    /// Creates a new database connection pool from API configuration
    pub async fn new(config: &ApiConfig) -> Result<Self, DbError> {
        let acquire_timeout_secs: u64 = 8;
        let idle_timeout_secs: u64 = 300;
        let connect_timeout_secs: u64 = 10;

        let conn_opts = ConnectOptions::new(config.database_url.clone())
            .max_connections(config.db_pool_max)
            .min_connections(config.db_pool_min.min(config.db_pool_max))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .idle_timeout(Duration::from_secs(idle_timeout_secs))
            .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
            .sqlx_logging(false)
            .to_owned();

        Database::connect(conn_opts)
            .await
            .map(|pool| DbPool { pool })
            .map_err(|e| DbError::ConnectionError(e.to_string()))
    }

    /// Wraps an already established connection (used by tests and embedders)
    pub fn from_connection(pool: DatabaseConnection) -> Self {
        DbPool { pool }
    }

    /// Creates repository instances for database operations
    pub fn repositories(&self) -> Repositories {
        Repositories::new(self.pool.clone())
    }
}
