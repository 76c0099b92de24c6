// Structural validation of field definitions and field type payloads
//
// Payload attributes stay raw JSON so shape errors are reported together.
// Absent is `None`; present, including an explicit `null`, is `Some`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::entity::{asset_type_fields, field_types};
use crate::error::{SchemaError, SchemaResult};
use crate::services::slug::{slugify, EMPTY_SLUG_MESSAGE};

pub const RULE_REQUIRES_DOCUMENT_SLUG: &str = "requires_document_slug";
pub const RULE_REQUIRES_DOCUMENT_REQUIRED: &str = "requires_document_required";
pub const RULE_REMINDER_LEAD_DAYS: &str = "reminder_lead_days";
pub const RULE_MAX_LENGTH: &str = "maxLength";
pub const RULE_MIN: &str = "min";
pub const RULE_MAX: &str = "max";

/// Keeps explicit `null` distinguishable from an absent key
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Candidate attributes of an asset-type field, as submitted
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldPayload {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub field_type_id: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub is_required: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub default_value: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub options: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub validation_rules: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub display_order: Option<Value>,
}

impl FieldPayload {
    pub fn new(name: impl Into<String>, field_type_id: impl Into<String>) -> Self {
        Self {
            name: Some(Value::String(name.into())),
            field_type_id: Some(Value::String(field_type_id.into())),
            ..Self::default()
        }
    }

    pub fn required(mut self, is_required: bool) -> Self {
        self.is_required = Some(Value::Bool(is_required));
        self
    }

    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(Value::Array(
            options.into_iter().map(|o| Value::String(o.into())).collect(),
        ));
        self
    }

    pub fn rules(mut self, rules: Map<String, Value>) -> Self {
        self.validation_rules = Some(Value::Object(rules));
        self
    }

    pub fn display_order(mut self, order: i32) -> Self {
        self.display_order = Some(Value::from(order));
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(Value::String(description.into()));
        self
    }

    /// The persisted record expressed as a fully populated payload
    pub fn from_model(model: &asset_type_fields::Model) -> Self {
        Self {
            name: Some(Value::String(model.name.clone())),
            field_type_id: Some(Value::String(model.field_type_id.clone())),
            description: Some(model.description.clone().map_or(Value::Null, Value::String)),
            is_required: Some(Value::Bool(model.is_required)),
            default_value: Some(model.default_value.clone().map_or(Value::Null, Value::String)),
            options: Some(model.options.clone().unwrap_or(Value::Null)),
            validation_rules: Some(model.validation_rules.clone().unwrap_or(Value::Null)),
            display_order: Some(Value::from(model.display_order)),
        }
    }

    /// `self` with every attribute present in `patch` replaced
    pub fn overlay(&self, patch: &FieldPayload) -> FieldPayload {
        fn pick(base: &Option<Value>, patch: &Option<Value>) -> Option<Value> {
            patch.clone().or_else(|| base.clone())
        }

        FieldPayload {
            name: pick(&self.name, &patch.name),
            field_type_id: pick(&self.field_type_id, &patch.field_type_id),
            description: pick(&self.description, &patch.description),
            is_required: pick(&self.is_required, &patch.is_required),
            default_value: pick(&self.default_value, &patch.default_value),
            options: pick(&self.options, &patch.options),
            validation_rules: pick(&self.validation_rules, &patch.validation_rules),
            display_order: pick(&self.display_order, &patch.display_order),
        }
    }

    /// Trimmed name when it is a non-empty string
    pub fn name_str(&self) -> Option<&str> {
        self.name
            .as_ref()
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    pub fn field_type_id_str(&self) -> Option<&str> {
        self.field_type_id
            .as_ref()
            .and_then(Value::as_str)
            .filter(|id| !id.trim().is_empty())
    }
}

/// Outcome of a validation pass; `errors` is never partial
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn into_result(self) -> SchemaResult<()> {
        if self.valid {
            Ok(())
        } else {
            Err(SchemaError::Validation(self.errors))
        }
    }
}

fn is_non_negative_integer(value: &Value) -> bool {
    value.as_u64().is_some()
}

/// Validate a field definition against its resolved field type.
///
/// `field_type` is `None` when the id could not be resolved; the call site reports
/// that separately as an invalid reference.
pub fn validate_field_definition(
    payload: &FieldPayload,
    field_type: Option<&field_types::Model>,
) -> ValidationReport {
    let mut errors = Vec::new();

    match payload.name_str() {
        None => errors.push("Field name is required".to_string()),
        Some(name) if slugify(name).is_empty() => errors.push(EMPTY_SLUG_MESSAGE.to_string()),
        Some(_) => {}
    }

    if payload.field_type_id_str().is_none() {
        errors.push("Field type ID is required".to_string());
    }

    if let Some(description) = &payload.description {
        if !(description.is_null() || description.is_string()) {
            errors.push("Description must be a string".to_string());
        }
    }

    if let Some(is_required) = &payload.is_required {
        if !is_required.is_boolean() {
            errors.push("is_required must be a boolean".to_string());
        }
    }

    if let Some(order) = &payload.display_order {
        if order.as_u64().map_or(true, |o| o > i32::MAX as u64) {
            errors.push("display_order must be a non-negative integer".to_string());
        }
    }

    let options = payload.options.as_ref().filter(|o| !o.is_null());
    if let Some(options) = options {
        match options.as_array() {
            None => errors.push("Options must be an array".to_string()),
            Some(items) => {
                let invalid = items
                    .iter()
                    .any(|item| item.as_str().map_or(true, |s| s.trim().is_empty()));
                if invalid {
                    errors.push("Each option must be a non-empty string".to_string());
                }
                let distinct: HashSet<String> = items.iter().map(Value::to_string).collect();
                if distinct.len() != items.len() {
                    errors.push("Options must be unique".to_string());
                }
            }
        }
    }

    if field_type.map_or(false, |ft| ft.has_options) {
        let option_items = options.and_then(Value::as_array);
        if option_items.map_or(true, |items| items.is_empty()) {
            errors.push("Options are required for this field type".to_string());
        }

        if let Some(default) = payload.default_value.as_ref().filter(|d| !d.is_null()) {
            let member = option_items.map_or(false, |items| items.contains(default));
            if !member {
                errors.push("Default value must be one of the provided options".to_string());
            }
        }
    }

    if let Some(rules) = payload.validation_rules.as_ref().filter(|r| !r.is_null()) {
        match rules.as_object() {
            None => errors.push("Validation rules must be an object".to_string()),
            Some(rules) => errors.extend(rule_shape_errors(rules)),
        }
    }

    ValidationReport::from_errors(errors)
}

/// Shape checks for the named constraints understood by the rule handlers
fn rule_shape_errors(rules: &Map<String, Value>) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(slug) = rules.get(RULE_REQUIRES_DOCUMENT_SLUG).filter(|v| !v.is_null()) {
        if slug.as_str().map_or(true, |s| s.trim().is_empty()) {
            errors.push(format!("{} must be a non-empty string", RULE_REQUIRES_DOCUMENT_SLUG));
        }
    }

    if let Some(flag) = rules.get(RULE_REQUIRES_DOCUMENT_REQUIRED).filter(|v| !v.is_null()) {
        if !flag.is_boolean() {
            errors.push(format!("{} must be a boolean", RULE_REQUIRES_DOCUMENT_REQUIRED));
        }
    }

    if let Some(days) = rules.get(RULE_REMINDER_LEAD_DAYS).filter(|v| !v.is_null()) {
        if !is_non_negative_integer(days) {
            errors.push(format!("{} must be a non-negative integer", RULE_REMINDER_LEAD_DAYS));
        }
    }

    for key in [RULE_MIN, RULE_MAX] {
        if let Some(bound) = rules.get(key).filter(|v| !v.is_null()) {
            if !bound.is_number() {
                errors.push(format!("{} must be a number", key));
            }
        }
    }

    errors
}

/// A validated definition, converted to the persisted representation
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type_id: String,
    pub description: Option<String>,
    pub is_required: bool,
    pub default_value: Option<String>,
    pub options: Option<Value>,
    pub validation_rules: Option<Value>,
    pub display_order: Option<i32>,
}

impl FieldDefinition {
    /// Validate `payload` and convert it; all messages are returned on failure
    pub fn try_from_payload(
        payload: &FieldPayload,
        field_type: Option<&field_types::Model>,
    ) -> SchemaResult<Self> {
        validate_field_definition(payload, field_type).into_result()?;

        let not_null = |v: &Option<Value>| v.clone().filter(|v| !v.is_null());

        Ok(Self {
            name: payload.name_str().unwrap_or_default().to_string(),
            field_type_id: payload.field_type_id_str().unwrap_or_default().to_string(),
            description: not_null(&payload.description)
                .and_then(|d| d.as_str().map(str::to_string)),
            is_required: payload
                .is_required
                .as_ref()
                .and_then(Value::as_bool)
                .unwrap_or(false),
            default_value: not_null(&payload.default_value).map(|v| match v {
                Value::String(s) => s,
                other => other.to_string(),
            }),
            options: not_null(&payload.options),
            validation_rules: not_null(&payload.validation_rules),
            display_order: payload
                .display_order
                .as_ref()
                .and_then(Value::as_i64)
                .and_then(|o| i32::try_from(o).ok()),
        })
    }
}

/// Candidate attributes of a new field type
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldTypePayload {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub slug: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub has_options: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub validation_rules: Option<Value>,
}

impl FieldTypePayload {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(Value::String(name.into())),
            ..Self::default()
        }
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(Value::String(slug.into()));
        self
    }

    pub fn has_options(mut self, has_options: bool) -> Self {
        self.has_options = Some(Value::Bool(has_options));
        self
    }

    pub fn rules(mut self, rules: Value) -> Self {
        self.validation_rules = Some(rules);
        self
    }

    pub fn name_str(&self) -> Option<&str> {
        self.name
            .as_ref()
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    /// Explicit slug, if one was supplied and is not null
    pub fn slug_str(&self) -> Option<&str> {
        self.slug.as_ref().and_then(Value::as_str)
    }
}

pub fn validate_field_type_payload(payload: &FieldTypePayload) -> ValidationReport {
    let mut errors = Vec::new();

    match payload.name_str() {
        None => errors.push("Name is required".to_string()),
        Some(name) if payload.slug_str().is_none() && slugify(name).is_empty() => {
            errors.push("Name must contain at least one letter or digit".to_string())
        }
        Some(_) => {}
    }

    if let Some(slug) = payload.slug.as_ref().filter(|s| !s.is_null()) {
        match slug.as_str() {
            None => errors.push("Slug must be a string".to_string()),
            Some(s) if slugify(s).is_empty() => {
                errors.push("Slug must contain at least one letter or digit".to_string())
            }
            Some(_) => {}
        }
    }

    if let Some(has_options) = &payload.has_options {
        if !has_options.is_boolean() {
            errors.push("has_options must be a boolean".to_string());
        }
    }

    if let Some(rules) = payload.validation_rules.as_ref().filter(|r| !r.is_null()) {
        if !rules.is_object() {
            errors.push("validation_rules must be an object".to_string());
        }
    }

    if let Some(description) = payload.description.as_ref().filter(|d| !d.is_null()) {
        if !description.is_string() {
            errors.push("Description must be a string".to_string());
        }
    }

    ValidationReport::from_errors(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn field_type(slug: &str, has_options: bool) -> field_types::Model {
        field_types::Model {
            id: format!("ft-{slug}"),
            name: slug.to_string(),
            slug: slug.to_string(),
            description: None,
            has_options,
            validation_rules: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn payload(value: Value) -> FieldPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accumulates_every_error() {
        let select = field_type("select", true);
        let report = validate_field_definition(
            &payload(json!({
                "name": "   ",
                "is_required": "yes",
                "display_order": -1,
                "options": ["a", "", "a"],
                "default_value": "z",
                "validation_rules": [1, 2]
            })),
            Some(&select),
        );

        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec![
                "Field name is required",
                "Field type ID is required",
                "is_required must be a boolean",
                "display_order must be a non-negative integer",
                "Each option must be a non-empty string",
                "Options must be unique",
                "Default value must be one of the provided options",
                "Validation rules must be an object",
            ]
        );
    }

    #[test]
    fn options_must_be_array_and_present_for_option_types() {
        let select = field_type("select", true);
        let report = validate_field_definition(
            &payload(json!({ "name": "Condition", "field_type_id": "ft", "options": "New" })),
            Some(&select),
        );
        assert_eq!(
            report.errors,
            vec!["Options must be an array", "Options are required for this field type"]
        );

        let report = validate_field_definition(
            &FieldPayload::new("Condition", "ft").options(Vec::<String>::new()),
            Some(&select),
        );
        assert_eq!(report.errors, vec!["Options are required for this field type"]);
    }

    #[test]
    fn empty_options_and_stray_default_reported_together() {
        let select = field_type("select", true);
        let report = validate_field_definition(
            &payload(json!({
                "name": "Condition",
                "field_type_id": "ft",
                "options": [],
                "default_value": "x"
            })),
            Some(&select),
        );
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec![
                "Options are required for this field type",
                "Default value must be one of the provided options",
            ]
        );
    }

    #[test]
    fn duplicate_options_rejected() {
        let select = field_type("select", true);
        let report = validate_field_definition(
            &FieldPayload::new("Color", "ft").options(["Red", "Blue", "Red"]),
            Some(&select),
        );
        assert_eq!(report.errors, vec!["Options must be unique"]);
    }

    #[test]
    fn default_value_must_be_an_option() {
        let select = field_type("select", true);
        let ok = FieldPayload::new("Condition", "ft")
            .options(["New", "Good"])
            .default_value("Good");
        assert!(validate_field_definition(&ok, Some(&select)).valid);

        let null_default = payload(json!({
            "name": "Condition",
            "field_type_id": "ft",
            "options": ["New"],
            "default_value": null
        }));
        assert!(validate_field_definition(&null_default, Some(&select)).valid);
    }

    #[test]
    fn plain_types_accept_minimal_payload() {
        let text = field_type("text", false);
        let report = validate_field_definition(&FieldPayload::new("Serial", "ft"), Some(&text));
        assert_eq!(report, ValidationReport { valid: true, errors: vec![] });
    }

    #[test]
    fn punctuation_only_name_is_reported() {
        let text = field_type("text", false);
        let report = validate_field_definition(&FieldPayload::new("!!!", "ft"), Some(&text));
        assert_eq!(report.errors, vec![EMPTY_SLUG_MESSAGE]);
    }

    #[test]
    fn rule_shapes_are_checked() {
        let date = field_type("date", false);
        let mut rules = Map::new();
        rules.insert(RULE_REQUIRES_DOCUMENT_SLUG.into(), json!(""));
        rules.insert(RULE_REQUIRES_DOCUMENT_REQUIRED.into(), json!("true"));
        rules.insert(RULE_REMINDER_LEAD_DAYS.into(), json!(-3));
        rules.insert(RULE_MAX.into(), json!("ten"));

        let report =
            validate_field_definition(&FieldPayload::new("Expiry", "ft").rules(rules), Some(&date));
        assert_eq!(
            report.errors,
            vec![
                "requires_document_slug must be a non-empty string",
                "requires_document_required must be a boolean",
                "reminder_lead_days must be a non-negative integer",
                "max must be a number",
            ]
        );
    }

    #[test]
    fn overlay_keeps_absent_and_clears_explicit_null() {
        let now = Utc::now();
        let existing = asset_type_fields::Model {
            id: "f1".into(),
            asset_type_id: "t1".into(),
            field_type_id: "ft".into(),
            name: "Notes".into(),
            slug: "notes".into(),
            description: Some("free text".into()),
            is_required: true,
            default_value: None,
            options: None,
            validation_rules: Some(json!({ "maxLength": 10 })),
            display_order: 3,
            created_by: None,
            updated_by: None,
            created_at: now,
            updated_at: now,
        };

        let patch = payload(json!({ "description": null, "is_required": false }));
        let merged = FieldPayload::from_model(&existing).overlay(&patch);
        let def = FieldDefinition::try_from_payload(&merged, Some(&field_type("text", false))).unwrap();

        assert_eq!(def.name, "Notes");
        assert_eq!(def.description, None);
        assert!(!def.is_required);
        assert_eq!(def.validation_rules, Some(json!({ "maxLength": 10 })));
        assert_eq!(def.display_order, Some(3));
    }

    #[test]
    fn null_is_required_is_rejected() {
        let report = validate_field_definition(
            &payload(json!({ "name": "A", "field_type_id": "ft", "is_required": null })),
            None,
        );
        assert_eq!(report.errors, vec!["is_required must be a boolean"]);
    }

    #[test]
    fn field_type_payload_checks() {
        let report = validate_field_type_payload(&serde_json::from_value(json!({
            "name": "",
            "has_options": "no",
            "validation_rules": [],
            "description": 5
        })).unwrap());
        assert_eq!(
            report.errors,
            vec![
                "Name is required",
                "has_options must be a boolean",
                "validation_rules must be an object",
                "Description must be a string",
            ]
        );

        assert!(validate_field_type_payload(&FieldTypePayload::new("Color").has_options(true)).valid);
    }
}
