// Handlers Module
// This module contains the API endpoint handlers and the router that mounts them

pub mod asset_types;
pub mod assets;
pub mod field_types;
pub mod fields;
pub mod health;
pub mod reconcile;

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post, put},
    Router,
};

use crate::config::EngineSettings;
use crate::db::Repositories;

/// Header carrying the acting user's id for audit columns
pub const ACTOR_HEADER: &str = "x-user-id";

/// Shared state handed to every handler
pub struct AppContext {
    pub repositories: Repositories,
    pub settings: EngineSettings,
}

impl AppContext {
    pub fn new(repositories: Repositories, settings: EngineSettings) -> Self {
        Self {
            repositories,
            settings,
        }
    }
}

// Type alias for the application state
pub type AppState = Arc<AppContext>;

/// Acting user taken from `X-User-Id`; absent or blank means anonymous
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor(pub Option<String>);

impl Actor {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Ok(Actor(actor))
    }
}

/// All schema engine routes bound to `state`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/field-types",
            get(field_types::list_field_types).post(field_types::create_field_type),
        )
        .route(
            "/field-types/ensure-defaults",
            post(field_types::ensure_defaults),
        )
        .route(
            "/asset-types",
            get(asset_types::list_asset_types).post(asset_types::create_asset_type),
        )
        .route(
            "/asset-types/{id}",
            get(asset_types::get_asset_type)
                .put(asset_types::update_asset_type)
                .delete(asset_types::delete_asset_type),
        )
        .route(
            "/asset-types/{id}/fields",
            get(fields::list_fields).post(fields::create_field),
        )
        .route(
            "/asset-types/{id}/fields/{field_id}",
            put(fields::update_field).delete(fields::delete_field),
        )
        .route("/asset-types/{id}/presets", get(reconcile::preset_state))
        .route("/asset-types/{id}/reconcile", post(reconcile::reconcile))
        .route("/asset-types/{id}/assets", post(asset_types::register_asset))
        .route("/assets/{id}/record", get(assets::get_record))
        .route("/assets/{id}/values", put(assets::assign_values))
        .with_state(state)
}
