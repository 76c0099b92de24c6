// Database layer: connection pool, error classification and repositories

pub mod error;
pub mod pool;
pub mod repositories;

pub use error::DbError;
pub use pool::DbPool;
pub use repositories::Repositories;
