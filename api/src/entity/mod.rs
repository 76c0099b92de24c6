//! Entity module for database models

pub mod asset_field_values;
pub mod asset_type_fields;
pub mod asset_types;
pub mod assets;
pub mod field_types;
