// Health check service implementation

use serde::Serialize;

use crate::db::Repositories;

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub database: bool,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.database
    }
}

pub struct HealthChecker<'a> {
    repos: &'a Repositories,
}

impl<'a> HealthChecker<'a> {
    pub fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    pub async fn check(&self) -> HealthReport {
        let database = match self.repos.db().ping().await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("Database ping failed: {}", err);
                false
            }
        };
        HealthReport {
            status: if database { "ok" } else { "degraded" },
            database,
        }
    }
}
