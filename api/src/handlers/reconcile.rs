// Handlers for preset state and field reconciliation

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::SchemaResult;
use crate::handlers::{Actor, AppState};
use crate::models::ReconcileRequest;
use crate::services::reconciler::{PresetStateView, ReconcileReport};
use crate::services::FieldReconciler;

/// GET /asset-types/{id}/presets
pub async fn preset_state(
    State(state): State<AppState>,
    Path(asset_type_id): Path<String>,
) -> SchemaResult<Json<PresetStateView>> {
    let reconciler = FieldReconciler::new(&state.repositories, &state.settings);
    Ok(Json(reconciler.preset_state(&asset_type_id).await?))
}

/// POST /asset-types/{id}/reconcile
/// Item failures come back inside the report with status `saved_with_warnings`
pub async fn reconcile(
    State(state): State<AppState>,
    Path(asset_type_id): Path<String>,
    actor: Actor,
    Json(request): Json<ReconcileRequest>,
) -> SchemaResult<Json<ReconcileReport>> {
    let reconciler = FieldReconciler::new(&state.repositories, &state.settings);
    let report = reconciler
        .reconcile(&asset_type_id, &request, actor.as_deref())
        .await?;
    Ok(Json(report))
}
