// Handlers for the field type catalog

use axum::{extract::State, http::StatusCode, Json};

use crate::entity::field_types;
use crate::error::SchemaResult;
use crate::handlers::AppState;
use crate::models::FieldTypePayload;
use crate::services::FieldTypeCatalog;

/// GET /field-types
pub async fn list_field_types(
    State(state): State<AppState>,
) -> SchemaResult<Json<Vec<field_types::Model>>> {
    let catalog = FieldTypeCatalog::new(&state.repositories, &state.settings);
    Ok(Json(catalog.list().await?))
}

/// POST /field-types
pub async fn create_field_type(
    State(state): State<AppState>,
    Json(payload): Json<FieldTypePayload>,
) -> SchemaResult<(StatusCode, Json<field_types::Model>)> {
    let catalog = FieldTypeCatalog::new(&state.repositories, &state.settings);
    let created = catalog.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /field-types/ensure-defaults
pub async fn ensure_defaults(
    State(state): State<AppState>,
) -> SchemaResult<Json<Vec<field_types::Model>>> {
    let catalog = FieldTypeCatalog::new(&state.repositories, &state.settings);
    Ok(Json(catalog.ensure_defaults().await?))
}
