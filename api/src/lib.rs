// Dynamic asset-type field schema engine

pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

pub use config::{ApiConfig, EngineSettings};
pub use error::{SchemaError, SchemaResult};
