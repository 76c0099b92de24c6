// Preset/custom field reconciliation for an asset type

use std::collections::{BTreeMap, HashMap};

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::EngineSettings;
use crate::db::Repositories;
use crate::entity::{asset_type_fields, field_types};
use crate::error::{SchemaError, SchemaResult};
use crate::services::field_service::FieldService;
use crate::services::field_validator::FieldPayload;
use crate::services::presets::{DateRuleSettings, MatchKind, Preset, PresetLibrary};

/// Desired state of one preset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetSelection {
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub rules: DateRuleSettings,
}

/// A new custom field requested alongside the presets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldRequest {
    pub name: String,
    pub field_type_id: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(flatten)]
    pub rules: DateRuleSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileRequest {
    #[serde(default)]
    pub presets: BTreeMap<String, PresetSelection>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldRequest>,
}

/// Stored field with its resolved field type
#[derive(Debug, Clone)]
pub struct ExistingField {
    pub field: asset_type_fields::Model,
    pub field_type: Option<field_types::Model>,
}

impl ExistingField {
    fn type_slug(&self) -> Option<&str> {
        self.field_type.as_ref().map(|ft| ft.slug.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldOperation {
    Create {
        item: String,
        payload: FieldPayload,
        slug_base: Option<String>,
    },
    Update {
        item: String,
        field_id: String,
        patch: FieldPayload,
    },
    Delete {
        item: String,
        field_id: String,
    },
}

impl FieldOperation {
    pub fn item(&self) -> &str {
        match self {
            FieldOperation::Create { item, .. }
            | FieldOperation::Update { item, .. }
            | FieldOperation::Delete { item, .. } => item,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            FieldOperation::Create { .. } => OperationKind::Create,
            FieldOperation::Update { .. } => OperationKind::Update,
            FieldOperation::Delete { .. } => OperationKind::Delete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
    /// Rejected while planning, nothing was attempted
    Plan,
}

/// A custom field answered by selecting a preset instead
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub custom_name: String,
    pub preset_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    pub item: String,
    pub operation: OperationKind,
    pub field_id: Option<String>,
    pub success: bool,
    pub errors: Vec<String>,
}

impl ItemOutcome {
    fn failed(item: impl Into<String>, operation: OperationKind, errors: Vec<String>) -> Self {
        Self {
            item: item.into(),
            operation,
            field_id: None,
            success: false,
            errors,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    pub operations: Vec<FieldOperation>,
    pub rejected: Vec<ItemOutcome>,
    pub redirects: Vec<Redirect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStatus {
    Saved,
    SavedWithWarnings,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub status: ReconcileStatus,
    pub outcomes: Vec<ItemOutcome>,
    /// "item: message" lines for every failed item
    pub failures: Vec<String>,
    pub redirects: Vec<Redirect>,
}

impl ReconcileReport {
    fn new(outcomes: Vec<ItemOutcome>, redirects: Vec<Redirect>) -> Self {
        let failures: Vec<String> = outcomes
            .iter()
            .filter(|o| !o.success)
            .flat_map(|o| o.errors.iter().map(move |e| format!("{}: {}", o.item, e)))
            .collect();
        let status = if outcomes.iter().all(|o| o.success) {
            ReconcileStatus::Saved
        } else {
            ReconcileStatus::SavedWithWarnings
        };
        Self {
            status,
            outcomes,
            failures,
            redirects,
        }
    }
}

/// Preset currently backing state, as an editor would preload it
#[derive(Debug, Clone, Serialize)]
pub struct PresetStateEntry {
    pub key: String,
    pub label: String,
    pub field_type_slug: String,
    pub selected: bool,
    pub required: bool,
    pub field_id: Option<String>,
    pub matched_by: Option<MatchKind>,
    #[serde(flatten)]
    pub rules: DateRuleSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresetStateView {
    pub presets: Vec<PresetStateEntry>,
    pub custom_fields: Vec<asset_type_fields::Model>,
}

/// Assign each stored field to at most one preset; a slug match outranks a
/// label+type match for the same preset.
fn classify<'e>(
    library: &PresetLibrary,
    existing: &'e [ExistingField],
) -> HashMap<&'static str, (&'e ExistingField, MatchKind)> {
    let mut matched: HashMap<&'static str, (&ExistingField, MatchKind)> = HashMap::new();

    for candidate in existing {
        let Some((preset, kind)) = library.match_field(&candidate.field, candidate.type_slug()) else {
            continue;
        };
        match matched.get(preset.key) {
            Some((_, MatchKind::Slug)) => {}
            Some((_, MatchKind::LabelAndType)) if kind == MatchKind::LabelAndType => {}
            _ => {
                matched.insert(preset.key, (candidate, kind));
            }
        }
    }

    matched
}

fn rules_differ(current: Option<&Value>, desired: &serde_json::Map<String, Value>) -> bool {
    match current.and_then(Value::as_object) {
        Some(current) => current != desired,
        None => !desired.is_empty(),
    }
}

/// Pure diff of desired state against stored fields.
///
/// `catalog` resolves preset field type slugs and custom field types.
pub fn plan(
    library: &PresetLibrary,
    catalog: &[field_types::Model],
    existing: &[ExistingField],
    request: &ReconcileRequest,
) -> ReconcilePlan {
    let mut result = ReconcilePlan::default();
    let type_by_slug: HashMap<String, &field_types::Model> = catalog
        .iter()
        .map(|ft| (ft.slug.to_lowercase(), ft))
        .collect();
    let type_by_id: HashMap<&str, &field_types::Model> =
        catalog.iter().map(|ft| (ft.id.as_str(), ft)).collect();

    let base = existing
        .iter()
        .map(|f| f.field.display_order)
        .max()
        .map_or(0, |max| max + 1);

    for key in request.presets.keys() {
        if library.get(key).is_none() {
            result.rejected.push(ItemOutcome::failed(
                key.clone(),
                OperationKind::Plan,
                vec![format!("Unknown preset '{}'", key)],
            ));
        }
    }

    // Custom fields that duplicate a preset become a selection of that preset
    let mut desired: HashMap<&str, PresetSelection> = request
        .presets
        .iter()
        .map(|(k, v)| (k.as_str(), v.clone()))
        .collect();
    let mut customs = Vec::new();
    for (index, custom) in request.custom_fields.iter().enumerate() {
        let type_slug = type_by_id.get(custom.field_type_id.as_str()).map(|ft| ft.slug.as_str());
        match library.match_label(&custom.name, type_slug) {
            Some(preset) => {
                let selection = desired.entry(preset.key).or_default();
                selection.selected = true;
                selection.required = custom.required;
                if selection.rules.is_empty() {
                    selection.rules = custom.rules.clone();
                }
                result.redirects.push(Redirect {
                    custom_name: custom.name.clone(),
                    preset_key: preset.key.to_string(),
                });
            }
            None => customs.push((index, custom)),
        }
    }

    let matched = classify(library, existing);

    for (index, preset) in library.presets().iter().enumerate() {
        let selection = desired.get(preset.key).cloned().unwrap_or_default();
        let current = matched.get(preset.key).map(|(f, _)| *f);

        match (selection.selected, current) {
            (true, None) => match type_by_slug.get(preset.field_type_slug) {
                None => result.rejected.push(ItemOutcome::failed(
                    preset.label,
                    OperationKind::Plan,
                    vec![format!("field type '{}' missing", preset.field_type_slug)],
                )),
                Some(field_type) => result.operations.push(FieldOperation::Create {
                    item: preset.label.to_string(),
                    payload: preset_payload(preset, field_type, &selection, base + index as i32),
                    slug_base: Some(preset.key.to_string()),
                }),
            },
            (true, Some(current)) => {
                let mut patch = FieldPayload::default();
                if current.field.is_required != selection.required {
                    patch.is_required = Some(Value::Bool(selection.required));
                }
                if preset.is_date() {
                    let desired_rules =
                        selection.rules.merge_into(current.field.validation_rules.as_ref());
                    if rules_differ(current.field.validation_rules.as_ref(), &desired_rules) {
                        patch.validation_rules = Some(Value::Object(desired_rules));
                    }
                }
                if patch != FieldPayload::default() {
                    result.operations.push(FieldOperation::Update {
                        item: preset.label.to_string(),
                        field_id: current.field.id.clone(),
                        patch,
                    });
                }
            }
            (false, Some(current)) => result.operations.push(FieldOperation::Delete {
                item: preset.label.to_string(),
                field_id: current.field.id.clone(),
            }),
            (false, None) => {}
        }
    }

    let custom_base = base + library.len() as i32;
    for (index, custom) in customs {
        let mut payload = FieldPayload::new(custom.name.clone(), custom.field_type_id.clone())
            .required(custom.required)
            .display_order(custom_base + index as i32);
        if let Some(options) = &custom.options {
            payload = payload.options(options.iter().map(|o| o.trim().to_string()));
        }
        let is_date = type_by_id
            .get(custom.field_type_id.as_str())
            .map_or(false, |ft| ft.slug.eq_ignore_ascii_case("date"));
        if is_date && !custom.rules.is_empty() {
            payload = payload.rules(custom.rules.to_rules());
        }
        result.operations.push(FieldOperation::Create {
            item: custom.name.clone(),
            payload,
            slug_base: None,
        });
    }

    result
}

fn preset_payload(
    preset: &Preset,
    field_type: &field_types::Model,
    selection: &PresetSelection,
    display_order: i32,
) -> FieldPayload {
    let mut payload = FieldPayload::new(preset.label, field_type.id.clone())
        .required(selection.required)
        .display_order(display_order);
    if field_type.has_options && !preset.options.is_empty() {
        payload = payload.options(preset.options.iter().copied());
    }
    if preset.is_date() && !selection.rules.is_empty() {
        payload = payload.rules(selection.rules.to_rules());
    }
    payload
}

pub struct FieldReconciler<'a> {
    repos: &'a Repositories,
    settings: &'a EngineSettings,
    library: PresetLibrary,
}

impl<'a> FieldReconciler<'a> {
    pub fn new(repos: &'a Repositories, settings: &'a EngineSettings) -> Self {
        Self {
            repos,
            settings,
            library: PresetLibrary::standard(),
        }
    }

    pub fn with_library(mut self, library: PresetLibrary) -> Self {
        self.library = library;
        self
    }

    async fn load_existing(&self, asset_type_id: &str) -> SchemaResult<Vec<ExistingField>> {
        let conn = self.repos.db();
        self.repos
            .asset_types
            .find_by_id(conn, asset_type_id)
            .await?
            .ok_or_else(|| SchemaError::not_found(format!("Asset type {}", asset_type_id)))?;

        let rows = self.repos.fields.find_with_types(conn, asset_type_id).await?;
        Ok(rows
            .into_iter()
            .map(|(field, field_type)| ExistingField { field, field_type })
            .collect())
    }

    /// Bring the asset type's fields in line with `request`.
    ///
    /// Item failures are reported in the result; only failures while loading the
    /// current state abort the batch.
    pub async fn reconcile(
        &self,
        asset_type_id: &str,
        request: &ReconcileRequest,
        actor: Option<&str>,
    ) -> SchemaResult<ReconcileReport> {
        let existing = self.load_existing(asset_type_id).await?;
        let catalog = self.repos.field_types.find_all(self.repos.db()).await?;

        let ReconcilePlan {
            operations,
            rejected,
            redirects,
        } = plan(&self.library, &catalog, &existing, request);

        info!(
            "Reconciling asset type {}: {} operations, {} rejected, {} redirects",
            asset_type_id,
            operations.len(),
            rejected.len(),
            redirects.len()
        );

        let service = FieldService::new(self.repos, self.settings);
        let service = &service;
        let applied: Vec<ItemOutcome> = stream::iter(operations)
            .map(|op| apply(service, asset_type_id, op, actor))
            .buffered(self.settings.reconcile_concurrency.max(1))
            .collect()
            .await;

        let mut outcomes = rejected;
        outcomes.extend(applied);

        let report = ReconcileReport::new(outcomes, redirects);
        if report.status == ReconcileStatus::SavedWithWarnings {
            warn!(
                "Asset type {} saved with warnings: {}",
                asset_type_id,
                report.failures.join("; ")
            );
        }
        Ok(report)
    }

    pub async fn preset_state(&self, asset_type_id: &str) -> SchemaResult<PresetStateView> {
        let existing = self.load_existing(asset_type_id).await?;
        let matched = classify(&self.library, &existing);

        let presets = self
            .library
            .presets()
            .iter()
            .map(|preset| {
                let current = matched.get(preset.key);
                PresetStateEntry {
                    key: preset.key.to_string(),
                    label: preset.label.to_string(),
                    field_type_slug: preset.field_type_slug.to_string(),
                    selected: current.is_some(),
                    required: current.map_or(false, |(f, _)| f.field.is_required),
                    field_id: current.map(|(f, _)| f.field.id.clone()),
                    matched_by: current.map(|(_, kind)| *kind),
                    rules: current
                        .map(|(f, _)| DateRuleSettings::from_rules(f.field.validation_rules.as_ref()))
                        .unwrap_or_default(),
                }
            })
            .collect();

        let backing: Vec<&str> = matched.values().map(|(f, _)| f.field.id.as_str()).collect();
        let custom_fields = existing
            .iter()
            .filter(|f| !backing.contains(&f.field.id.as_str()))
            .map(|f| f.field.clone())
            .collect();

        Ok(PresetStateView {
            presets,
            custom_fields,
        })
    }
}

async fn apply(
    service: &FieldService<'_>,
    asset_type_id: &str,
    operation: FieldOperation,
    actor: Option<&str>,
) -> ItemOutcome {
    let item = operation.item().to_string();
    let kind = operation.kind();

    let result = match &operation {
        FieldOperation::Create {
            payload, slug_base, ..
        } => service
            .create_field_with_slug_base(asset_type_id, payload, slug_base.as_deref(), actor)
            .await
            .map(|f| Some(f.id)),
        FieldOperation::Update {
            field_id, patch, ..
        } => service
            .update_field(asset_type_id, field_id, patch, actor)
            .await
            .map(|f| Some(f.id)),
        FieldOperation::Delete { field_id, .. } => service
            .delete_field(asset_type_id, field_id)
            .await
            .map(|_| Some(field_id.clone())),
    };

    match result {
        Ok(field_id) => ItemOutcome {
            item,
            operation: kind,
            field_id,
            success: true,
            errors: vec![],
        },
        Err(err) => {
            warn!("Reconcile {:?} '{}' failed: {}", kind, item, err);
            let mut outcome = ItemOutcome::failed(item, kind, err.messages());
            if let FieldOperation::Update { field_id, .. } | FieldOperation::Delete { field_id, .. } =
                &operation
            {
                outcome.field_id = Some(field_id.clone());
            }
            outcome
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn catalog() -> Vec<field_types::Model> {
        let now = Utc::now();
        ["text", "textarea", "number", "date", "url", "currency", "select"]
            .iter()
            .map(|slug| field_types::Model {
                id: format!("ft-{slug}"),
                name: slug.to_string(),
                slug: slug.to_string(),
                description: None,
                has_options: *slug == "select",
                validation_rules: None,
                created_at: now,
                updated_at: now,
            })
            .collect()
    }

    fn existing(name: &str, slug: &str, type_slug: &str, order: i32) -> ExistingField {
        let now = Utc::now();
        let field_type = catalog().into_iter().find(|ft| ft.slug == type_slug);
        ExistingField {
            field: asset_type_fields::Model {
                id: format!("f-{slug}"),
                asset_type_id: "t".into(),
                field_type_id: format!("ft-{type_slug}"),
                name: name.into(),
                slug: slug.into(),
                description: None,
                is_required: false,
                default_value: None,
                options: None,
                validation_rules: None,
                display_order: order,
                created_by: None,
                updated_by: None,
                created_at: now,
                updated_at: now,
            },
            field_type,
        }
    }

    fn select(keys: &[(&str, bool)]) -> ReconcileRequest {
        ReconcileRequest {
            presets: keys
                .iter()
                .map(|(k, required)| {
                    (
                        k.to_string(),
                        PresetSelection {
                            selected: true,
                            required: *required,
                            rules: DateRuleSettings::default(),
                        },
                    )
                })
                .collect(),
            custom_fields: vec![],
        }
    }

    #[test]
    fn creates_selected_presets_after_existing_fields() {
        let current = vec![existing("Serial", "serial", "text", 4)];
        let plan = plan(
            &PresetLibrary::standard(),
            &catalog(),
            &current,
            &select(&[("condition", true)]),
        );

        assert_eq!(plan.operations.len(), 1);
        match &plan.operations[0] {
            FieldOperation::Create {
                payload, slug_base, ..
            } => {
                assert_eq!(slug_base.as_deref(), Some("condition"));
                assert_eq!(payload.options, Some(json!(["New", "Good", "Fair", "Poor"])));
                assert_eq!(payload.is_required, Some(json!(true)));
                // base 5 + catalog index 9
                assert_eq!(payload.display_order, Some(json!(14)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unchanged_selection_plans_nothing() {
        let current = vec![existing("Location", "location", "text", 0)];
        let plan = plan(
            &PresetLibrary::standard(),
            &catalog(),
            &current,
            &select(&[("location", false)]),
        );
        assert!(plan.operations.is_empty());
        assert!(plan.rejected.is_empty());
    }

    #[test]
    fn required_toggle_updates_only_that_attribute() {
        let current = vec![existing("Location", "location", "text", 0)];
        let plan = plan(
            &PresetLibrary::standard(),
            &catalog(),
            &current,
            &select(&[("location", true)]),
        );
        assert_eq!(
            plan.operations,
            vec![FieldOperation::Update {
                item: "Location".into(),
                field_id: "f-location".into(),
                patch: FieldPayload {
                    is_required: Some(json!(true)),
                    ..FieldPayload::default()
                },
            }]
        );
    }

    #[test]
    fn deselected_match_is_deleted() {
        let current = vec![existing("Supplier", "supplier", "text", 0)];
        let plan = plan(
            &PresetLibrary::standard(),
            &catalog(),
            &current,
            &ReconcileRequest::default(),
        );
        assert_eq!(
            plan.operations,
            vec![FieldOperation::Delete {
                item: "Supplier".into(),
                field_id: "f-supplier".into(),
            }]
        );
    }

    #[test]
    fn date_rules_update_when_settings_change() {
        let mut serviced = existing("Last serviced", "last_serviced", "date", 0);
        serviced.field.validation_rules = Some(json!({ "reminder_lead_days": 7, "note": "keep" }));
        let mut request = select(&[("last_serviced", false)]);
        request.presets.get_mut("last_serviced").unwrap().rules = DateRuleSettings {
            requires_document_slug: Some("service_report".into()),
            requires_document_required: true,
            reminder_lead_days: Some(7),
        };

        let plan = plan(&PresetLibrary::standard(), &catalog(), &[serviced], &request);
        match &plan.operations[..] {
            [FieldOperation::Update { patch, .. }] => {
                assert_eq!(patch.is_required, None);
                assert_eq!(
                    patch.validation_rules,
                    Some(json!({
                        "note": "keep",
                        "requires_document_slug": "service_report",
                        "requires_document_required": true,
                        "reminder_lead_days": 7
                    }))
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn custom_field_matching_preset_is_redirected() {
        let request = ReconcileRequest {
            presets: BTreeMap::new(),
            custom_fields: vec![CustomFieldRequest {
                name: "purchase PRICE".into(),
                field_type_id: "ft-currency".into(),
                required: true,
                options: None,
                rules: DateRuleSettings::default(),
            }],
        };
        let plan = plan(&PresetLibrary::standard(), &catalog(), &[], &request);

        assert_eq!(
            plan.redirects,
            vec![Redirect {
                custom_name: "purchase PRICE".into(),
                preset_key: "purchase_price".into(),
            }]
        );
        match &plan.operations[..] {
            [FieldOperation::Create {
                item, slug_base, ..
            }] => {
                assert_eq!(item, "Purchase price");
                assert_eq!(slug_base.as_deref(), Some("purchase_price"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn same_label_other_type_stays_custom() {
        let request = ReconcileRequest {
            presets: BTreeMap::new(),
            custom_fields: vec![CustomFieldRequest {
                name: "Purchase price".into(),
                field_type_id: "ft-text".into(),
                required: false,
                options: None,
                rules: DateRuleSettings::default(),
            }],
        };
        let plan = plan(&PresetLibrary::standard(), &catalog(), &[], &request);
        assert!(plan.redirects.is_empty());
        match &plan.operations[..] {
            [FieldOperation::Create {
                payload, slug_base, ..
            }] => {
                assert_eq!(slug_base, &None);
                // base 0 + library 14 + submission 0
                assert_eq!(payload.display_order, Some(json!(14)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_preset_and_missing_type_are_rejected() {
        let mut request = select(&[("no_such_preset", false), ("department", false)]);
        request.presets.get_mut("department").unwrap().selected = true;
        let catalog: Vec<_> = catalog().into_iter().filter(|ft| ft.slug != "text").collect();

        let plan = plan(&PresetLibrary::standard(), &catalog, &[], &request);
        assert!(plan.operations.is_empty());
        let messages: Vec<String> = plan
            .rejected
            .iter()
            .flat_map(|o| o.errors.clone())
            .collect();
        assert_eq!(
            messages,
            vec!["Unknown preset 'no_such_preset'", "field type 'text' missing"]
        );
    }

    #[test]
    fn slug_match_wins_over_label_match_for_same_preset() {
        let current = vec![
            existing("Location", "site", "text", 0),
            existing("Where", "location", "text", 1),
        ];
        let matched = classify(&PresetLibrary::standard(), &current);
        let (field, kind) = matched.get("location").unwrap();
        assert_eq!(field.field.id, "f-location");
        assert_eq!(*kind, MatchKind::Slug);
    }
}
