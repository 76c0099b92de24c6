// Handlers for the asset type registry

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::entity::{asset_types, assets};
use crate::error::SchemaResult;
use crate::handlers::AppState;
use crate::models::{AssetTypeInput, AssetTypeListQuery, DeletedResponse, RegisterAssetRequest};
use crate::services::asset_type_service::AssetTypeSummary;
use crate::services::AssetTypeService;

/// GET /asset-types?q=...
pub async fn list_asset_types(
    State(state): State<AppState>,
    Query(params): Query<AssetTypeListQuery>,
) -> SchemaResult<Json<Vec<AssetTypeSummary>>> {
    let service = AssetTypeService::new(&state.repositories);
    Ok(Json(service.list(params.q.as_deref()).await?))
}

/// POST /asset-types
pub async fn create_asset_type(
    State(state): State<AppState>,
    Json(input): Json<AssetTypeInput>,
) -> SchemaResult<(StatusCode, Json<asset_types::Model>)> {
    let service = AssetTypeService::new(&state.repositories);
    Ok((StatusCode::CREATED, Json(service.create(&input).await?)))
}

/// GET /asset-types/{id}
pub async fn get_asset_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> SchemaResult<Json<asset_types::Model>> {
    let service = AssetTypeService::new(&state.repositories);
    Ok(Json(service.get(&id).await?))
}

/// PUT /asset-types/{id}
pub async fn update_asset_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<AssetTypeInput>,
) -> SchemaResult<Json<asset_types::Model>> {
    let service = AssetTypeService::new(&state.repositories);
    Ok(Json(service.update(&id, &input).await?))
}

/// DELETE /asset-types/{id}
pub async fn delete_asset_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> SchemaResult<Json<DeletedResponse>> {
    let service = AssetTypeService::new(&state.repositories);
    service.delete(&id).await?;
    Ok(Json(DeletedResponse::new(id)))
}

/// POST /asset-types/{id}/assets
pub async fn register_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RegisterAssetRequest>,
) -> SchemaResult<(StatusCode, Json<assets::Model>)> {
    let service = AssetTypeService::new(&state.repositories);
    let asset = service.register_asset(&id, request.label.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(asset)))
}
