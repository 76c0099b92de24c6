// Business logic service implementations

pub mod asset_type_service;
pub mod field_service;
pub mod field_type_catalog;
pub mod field_validator;
pub mod health;
pub mod presets;
pub mod reconciler;
pub mod record_projector;
pub mod slug;

pub use asset_type_service::AssetTypeService;
pub use field_service::FieldService;
pub use field_type_catalog::FieldTypeCatalog;
pub use reconciler::FieldReconciler;
pub use record_projector::RecordProjector;
