// Handlers for asset records and their field values

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::SchemaResult;
use crate::handlers::AppState;
use crate::models::AssignValuesRequest;
use crate::services::record_projector::{AssetRecord, AssignOutcome};
use crate::services::RecordProjector;

/// GET /assets/{id}/record
pub async fn get_record(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
) -> SchemaResult<Json<AssetRecord>> {
    let projector = RecordProjector::new(&state.repositories);
    Ok(Json(projector.project(&asset_id).await?))
}

/// PUT /assets/{id}/values
pub async fn assign_values(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
    Json(request): Json<AssignValuesRequest>,
) -> SchemaResult<Json<AssignOutcome>> {
    let projector = RecordProjector::new(&state.repositories);
    let values = request.into_values();
    Ok(Json(projector.assign_values(&asset_id, &values).await?))
}
