// Handlers for individual asset-type field definitions

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::entity::asset_type_fields;
use crate::error::SchemaResult;
use crate::handlers::{Actor, AppState};
use crate::models::{DeletedResponse, FieldPayload};
use crate::services::field_service::FieldWithType;
use crate::services::FieldService;

/// GET /asset-types/{id}/fields
pub async fn list_fields(
    State(state): State<AppState>,
    Path(asset_type_id): Path<String>,
) -> SchemaResult<Json<Vec<FieldWithType>>> {
    let service = FieldService::new(&state.repositories, &state.settings);
    Ok(Json(service.list_fields(&asset_type_id).await?))
}

/// POST /asset-types/{id}/fields
pub async fn create_field(
    State(state): State<AppState>,
    Path(asset_type_id): Path<String>,
    actor: Actor,
    Json(payload): Json<FieldPayload>,
) -> SchemaResult<(StatusCode, Json<asset_type_fields::Model>)> {
    let service = FieldService::new(&state.repositories, &state.settings);
    let field = service
        .create_field(&asset_type_id, &payload, actor.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(field)))
}

/// PUT /asset-types/{id}/fields/{field_id}
pub async fn update_field(
    State(state): State<AppState>,
    Path((asset_type_id, field_id)): Path<(String, String)>,
    actor: Actor,
    Json(patch): Json<FieldPayload>,
) -> SchemaResult<Json<asset_type_fields::Model>> {
    let service = FieldService::new(&state.repositories, &state.settings);
    let field = service
        .update_field(&asset_type_id, &field_id, &patch, actor.as_deref())
        .await?;
    Ok(Json(field))
}

/// DELETE /asset-types/{id}/fields/{field_id}
pub async fn delete_field(
    State(state): State<AppState>,
    Path((asset_type_id, field_id)): Path<(String, String)>,
) -> SchemaResult<Json<DeletedResponse>> {
    let service = FieldService::new(&state.repositories, &state.settings);
    service.delete_field(&asset_type_id, &field_id).await?;
    Ok(Json(DeletedResponse::new(field_id)))
}
