// Slug normalisation and collision-free allocation

use std::future::Future;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use sea_orm::ConnectionTrait;
use serde_json::json;
use tracing::warn;

use crate::db::repositories::{AssetTypeFieldRepository, FieldTypeRepository};
use crate::db::DbError;
use crate::error::{SchemaError, SchemaResult};

/// Upper bound on `base-N` probes before giving up with a conflict
pub const MAX_SLUG_PROBES: u32 = 1000;

pub const EMPTY_SLUG_MESSAGE: &str = "Field name must contain at least one letter or digit";

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s-]").expect("static slug pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static slug pattern"));
static DASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("static slug pattern"));

/// Normalise free text into a URL/storage-safe slug.
///
/// `slugify("Asset Life (Years)") == "asset-life-years"`. Applying it twice is a no-op.
pub fn slugify(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let dashed = WHITESPACE.replace_all(&stripped, "-");
    DASHES.replace_all(&dashed, "-").into_owned()
}

/// A namespace in which slugs must be unique
#[async_trait]
pub trait SlugScope: Send + Sync {
    async fn is_taken(&self, candidate: &str) -> Result<bool, DbError>;
}

/// Global scope of the field type catalog
pub struct FieldTypeSlugs<'a, C> {
    repo: &'a FieldTypeRepository,
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> FieldTypeSlugs<'a, C> {
    pub fn new(repo: &'a FieldTypeRepository, conn: &'a C) -> Self {
        Self { repo, conn }
    }
}

#[async_trait]
impl<'a, C: ConnectionTrait> SlugScope for FieldTypeSlugs<'a, C> {
    async fn is_taken(&self, candidate: &str) -> Result<bool, DbError> {
        self.repo.slug_exists(self.conn, candidate).await
    }
}

/// Per asset type scope, optionally ignoring the field being renamed
pub struct AssetTypeFieldSlugs<'a, C> {
    repo: &'a AssetTypeFieldRepository,
    conn: &'a C,
    asset_type_id: &'a str,
    exclude_field_id: Option<&'a str>,
}

impl<'a, C: ConnectionTrait> AssetTypeFieldSlugs<'a, C> {
    pub fn new(repo: &'a AssetTypeFieldRepository, conn: &'a C, asset_type_id: &'a str) -> Self {
        Self {
            repo,
            conn,
            asset_type_id,
            exclude_field_id: None,
        }
    }

    pub fn excluding(mut self, field_id: &'a str) -> Self {
        self.exclude_field_id = Some(field_id);
        self
    }
}

#[async_trait]
impl<'a, C: ConnectionTrait> SlugScope for AssetTypeFieldSlugs<'a, C> {
    async fn is_taken(&self, candidate: &str) -> Result<bool, DbError> {
        self.repo
            .slug_taken(self.conn, self.asset_type_id, candidate, self.exclude_field_id)
            .await
    }
}

/// First free slug among `base`, `base-1`, `base-2`, ...
pub async fn resolve_unique<S>(scope: &S, base: &str) -> SchemaResult<String>
where
    S: SlugScope + ?Sized,
{
    if base.is_empty() {
        return Err(SchemaError::Validation(vec![EMPTY_SLUG_MESSAGE.to_string()]));
    }

    if !scope.is_taken(base).await? {
        return Ok(base.to_string());
    }

    for i in 1..=MAX_SLUG_PROBES {
        let candidate = format!("{}-{}", base, i);
        if !scope.is_taken(&candidate).await? {
            return Ok(candidate);
        }
    }

    Err(SchemaError::conflict(
        "Unable to allocate a unique slug",
        json!({ "base": base, "probes": MAX_SLUG_PROBES }),
    ))
}

/// Re-runs a whole probe+insert attempt when a concurrent writer claimed the
/// slug between probe and commit.
pub async fn with_slug_retry<T, F, Fut>(attempts: u32, mut attempt: F) -> SchemaResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SchemaResult<T>>,
{
    let attempts = attempts.max(1);
    let mut tries = 0;

    loop {
        tries += 1;
        match attempt().await {
            Err(err) if err.is_unique_violation() && tries < attempts => {
                warn!(attempt = tries, "Slug claimed concurrently, retrying: {}", err);
            }
            Err(err) if err.is_unique_violation() => {
                return Err(SchemaError::conflict(
                    "slug must be unique",
                    json!({ "attempts": tries }),
                ));
            }
            other => return other,
        }
    }
}
