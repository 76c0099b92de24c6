// Asset value coercion, storage encoding, record validation and projection

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, TransactionTrait};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use url::Url;
use validator::ValidateEmail;

use crate::db::{DbError, Repositories};
use crate::entity::{asset_type_fields, field_types};
use crate::error::{SchemaError, SchemaResult};
use crate::services::field_validator::{
    RULE_MAX, RULE_MAX_LENGTH, RULE_MIN, RULE_REMINDER_LEAD_DAYS,
    RULE_REQUIRES_DOCUMENT_REQUIRED, RULE_REQUIRES_DOCUMENT_SLUG,
};

pub const DEFAULT_MAX_TEXT_LENGTH: u64 = 2000;

/// Storage/coercion behaviour selected by the field type slug
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Textarea,
    Number,
    Currency,
    Boolean,
    Date,
    Datetime,
    Email,
    Url,
    Select,
    Multiselect,
}

impl ValueKind {
    /// Unknown catalog entries behave like free text
    pub fn from_slug(slug: &str) -> Self {
        match slug.to_ascii_lowercase().as_str() {
            "textarea" => ValueKind::Textarea,
            "number" => ValueKind::Number,
            "currency" => ValueKind::Currency,
            "boolean" => ValueKind::Boolean,
            "date" => ValueKind::Date,
            "datetime" => ValueKind::Datetime,
            "email" => ValueKind::Email,
            "url" => ValueKind::Url,
            "select" => ValueKind::Select,
            "multiselect" => ValueKind::Multiselect,
            _ => ValueKind::Text,
        }
    }
}

/// A field definition together with its catalog entry
#[derive(Debug, Clone)]
pub struct ResolvedField {
    pub field: asset_type_fields::Model,
    pub field_type: Option<field_types::Model>,
}

impl ResolvedField {
    pub fn new(field: asset_type_fields::Model, field_type: Option<field_types::Model>) -> Self {
        Self { field, field_type }
    }

    pub fn kind(&self) -> ValueKind {
        self.field_type
            .as_ref()
            .map(|ft| ValueKind::from_slug(&ft.slug))
            .unwrap_or(ValueKind::Text)
    }

    pub fn slug(&self) -> &str {
        &self.field.slug
    }

    pub fn field_type_slug(&self) -> Option<&str> {
        self.field_type.as_ref().map(|ft| ft.slug.as_str())
    }

    /// Field-level rule first, then the field type's rule
    fn numeric_rule(&self, key: &str) -> Option<f64> {
        self.field
            .rule(key)
            .and_then(Value::as_f64)
            .or_else(|| {
                self.field_type
                    .as_ref()
                    .and_then(|ft| ft.validation_rules.as_ref())
                    .and_then(|rules| rules.get(key))
                    .and_then(Value::as_f64)
            })
    }

    fn max_length(&self) -> u64 {
        self.field
            .rule(RULE_MAX_LENGTH)
            .and_then(Value::as_u64)
            .or_else(|| self.field_type.as_ref().and_then(|ft| ft.rule_u64(RULE_MAX_LENGTH)))
            .unwrap_or(DEFAULT_MAX_TEXT_LENGTH)
    }
}

/// A coerced value
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Empty,
    Text(String),
    Number(f64),
    Currency(Decimal),
    Boolean(bool),
    Date(NaiveDate),
    Datetime(DateTime<FixedOffset>),
    Multi(Vec<String>),
}

impl TypedValue {
    pub fn is_empty(&self) -> bool {
        match self {
            TypedValue::Empty => true,
            TypedValue::Text(s) => s.trim().is_empty(),
            TypedValue::Multi(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Calendar date for reminder computation
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            TypedValue::Date(d) => Some(*d),
            TypedValue::Datetime(dt) => Some(dt.date_naive()),
            _ => None,
        }
    }

    /// Text stored in `asset_field_values.value`
    pub fn encode(&self) -> Option<String> {
        match self {
            TypedValue::Empty => None,
            TypedValue::Text(s) => Some(s.clone()),
            TypedValue::Number(n) => Some(format_number(*n)),
            TypedValue::Currency(d) => Some(d.to_string()),
            TypedValue::Boolean(b) => Some(b.to_string()),
            TypedValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            TypedValue::Datetime(dt) => Some(dt.to_rfc3339()),
            TypedValue::Multi(items) => serde_json::to_string(items).ok(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Decode stored text back to the JSON shape clients submit
pub fn decode_value(kind: ValueKind, stored: Option<&str>) -> Value {
    let Some(raw) = stored else {
        return Value::Null;
    };

    match kind {
        ValueKind::Boolean => Value::Bool(raw.eq_ignore_ascii_case("true")),
        ValueKind::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        ValueKind::Multiselect => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => Value::Array(items),
            _ if raw.trim().is_empty() => Value::Array(vec![]),
            _ => Value::Array(vec![Value::String(raw.to_string())]),
        },
        // Currency stays textual so no precision is lost
        _ => Value::String(raw.to_string()),
    }
}

fn scalar_text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn check_bounds(field: &ResolvedField, n: f64) -> Result<(), String> {
    let slug = field.slug();
    if let Some(min) = field.numeric_rule(RULE_MIN) {
        if n < min {
            return Err(format!("{} must be at least {}", slug, min));
        }
    }
    if let Some(max) = field.numeric_rule(RULE_MAX) {
        if n > max {
            return Err(format!("{} must be at most {}", slug, max));
        }
    }
    Ok(())
}

fn is_email(s: &str) -> bool {
    s.to_string().validate_email()
}

fn is_web_url(s: &str) -> bool {
    Url::parse(s)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}

/// Coerce a raw JSON value against the field's type, options and numeric rules.
///
/// `null`, empty strings and empty arrays coerce to [`TypedValue::Empty`]; presence
/// is judged separately by [`validate_record`].
pub fn validate_value(field: &ResolvedField, raw: &Value) -> Result<TypedValue, String> {
    let slug = field.slug();

    match raw {
        Value::Null => return Ok(TypedValue::Empty),
        Value::String(s) if s.trim().is_empty() => return Ok(TypedValue::Empty),
        Value::Array(items) if items.is_empty() => return Ok(TypedValue::Empty),
        _ => {}
    }

    match field.kind() {
        ValueKind::Number => {
            let n = match raw {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }
            .filter(|n| n.is_finite())
            .ok_or_else(|| format!("{} must be a number", slug))?;
            check_bounds(field, n)?;
            Ok(TypedValue::Number(n))
        }
        ValueKind::Currency => {
            let d = scalar_text(raw)
                .filter(|_| !raw.is_boolean())
                .and_then(|s| Decimal::from_str(&s).ok())
                .ok_or_else(|| format!("{} must be a number", slug))?;
            if let Some(n) = d.to_f64() {
                check_bounds(field, n)?;
            }
            Ok(TypedValue::Currency(d))
        }
        ValueKind::Boolean => match raw {
            Value::Bool(b) => Ok(TypedValue::Boolean(*b)),
            Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(TypedValue::Boolean(true)),
            Value::String(s) if s.trim().eq_ignore_ascii_case("false") => {
                Ok(TypedValue::Boolean(false))
            }
            _ => Err(format!("{} must be true or false", slug)),
        },
        ValueKind::Date => raw
            .as_str()
            .map(str::trim)
            .filter(|s| s.len() == 10)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .map(TypedValue::Date)
            .ok_or_else(|| format!("{} must be YYYY-MM-DD", slug)),
        ValueKind::Datetime => raw
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(TypedValue::Datetime)
            .ok_or_else(|| format!("{} must be an RFC 3339 timestamp", slug)),
        ValueKind::Email => raw
            .as_str()
            .map(str::trim)
            .filter(|s| is_email(s))
            .map(|s| TypedValue::Text(s.to_string()))
            .ok_or_else(|| format!("{} must be a valid email address", slug)),
        ValueKind::Url => raw
            .as_str()
            .map(str::trim)
            .filter(|s| is_web_url(s))
            .map(|s| TypedValue::Text(s.to_string()))
            .ok_or_else(|| format!("{} must be a valid URL", slug)),
        ValueKind::Select => {
            let choice = scalar_text(raw).ok_or_else(|| format!("{} must be a valid option", slug))?;
            let options = field.field.option_list();
            if !options.is_empty() && !options.contains(&choice) {
                return Err(format!("{} must be a valid option", slug));
            }
            Ok(TypedValue::Text(choice))
        }
        ValueKind::Multiselect => {
            let items = raw
                .as_array()
                .ok_or_else(|| format!("{} must be an array", slug))?;
            let options = field.field.option_list();
            let mut chosen = Vec::with_capacity(items.len());
            let mut invalid = Vec::new();
            for item in items {
                match item.as_str() {
                    Some(s) if options.is_empty() || options.iter().any(|o| o == s) => {
                        chosen.push(s.to_string())
                    }
                    _ => invalid.push(format!(
                        "{} contains invalid option {}",
                        slug,
                        item
                    )),
                }
            }
            if invalid.is_empty() {
                Ok(TypedValue::Multi(chosen))
            } else {
                Err(invalid.join("; "))
            }
        }
        ValueKind::Text | ValueKind::Textarea => {
            let text = match raw {
                Value::String(s) => s.clone(),
                Value::Number(_) | Value::Bool(_) => raw.to_string(),
                _ => return Err(format!("{} must be text", slug)),
            };
            let max = field.max_length();
            if text.chars().count() as u64 > max {
                return Err(format!("{} is too long (max {} chars)", slug, max));
            }
            Ok(TypedValue::Text(text))
        }
    }
}

/// Outcome of one rule evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum RuleEffect {
    Warning(String),
    Error(String),
    Reminder(NaiveDate),
}

/// Everything a rule handler may look at
pub struct RuleContext<'a> {
    pub field: &'a ResolvedField,
    pub value: &'a TypedValue,
    pub rules: &'a Map<String, Value>,
    /// Coerced values of the whole record by slug
    pub record: &'a HashMap<String, TypedValue>,
}

/// Interprets one named constraint inside `validation_rules`
pub trait RuleHandler: Send + Sync {
    fn key(&self) -> &'static str;
    fn evaluate(&self, ctx: &RuleContext<'_>, rule: &Value) -> Vec<RuleEffect>;
}

/// A populated field demands a non-empty value in another field
pub struct RequiresDocumentRule;

impl RuleHandler for RequiresDocumentRule {
    fn key(&self) -> &'static str {
        RULE_REQUIRES_DOCUMENT_SLUG
    }

    fn evaluate(&self, ctx: &RuleContext<'_>, rule: &Value) -> Vec<RuleEffect> {
        let Some(document_slug) = rule.as_str().map(str::trim).filter(|s| !s.is_empty()) else {
            return vec![];
        };
        if ctx.value.is_empty() {
            return vec![];
        }

        let has_document = ctx
            .record
            .get(document_slug)
            .map_or(false, |v| !v.is_empty());
        if has_document {
            return vec![];
        }

        let message = format!(
            "{} requires a document in '{}'",
            ctx.field.field.name, document_slug
        );
        let hard = ctx
            .rules
            .get(RULE_REQUIRES_DOCUMENT_REQUIRED)
            .and_then(Value::as_bool)
            .unwrap_or(false);

        if hard {
            vec![RuleEffect::Error(message)]
        } else {
            vec![RuleEffect::Warning(message)]
        }
    }
}

/// Reminder date = date value minus the lead time in days
pub struct ReminderLeadDaysRule;

impl RuleHandler for ReminderLeadDaysRule {
    fn key(&self) -> &'static str {
        RULE_REMINDER_LEAD_DAYS
    }

    fn evaluate(&self, ctx: &RuleContext<'_>, rule: &Value) -> Vec<RuleEffect> {
        let (Some(date), Some(days)) = (ctx.value.as_date(), rule.as_u64()) else {
            return vec![];
        };
        let Ok(days) = i64::try_from(days) else {
            return vec![];
        };
        date.checked_sub_signed(Duration::days(days))
            .map(|d| vec![RuleEffect::Reminder(d)])
            .unwrap_or_default()
    }
}

/// Rule handlers keyed by rule name; unknown keys are ignored
pub struct RuleRegistry {
    handlers: Vec<Box<dyn RuleHandler>>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        let mut registry = Self { handlers: Vec::new() };
        registry.register(Box::new(RequiresDocumentRule));
        registry.register(Box::new(ReminderLeadDaysRule));
        registry
    }
}

impl RuleRegistry {
    pub fn register(&mut self, handler: Box<dyn RuleHandler>) {
        self.handlers.retain(|h| h.key() != handler.key());
        self.handlers.push(handler);
    }

    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<RuleEffect> {
        self.handlers
            .iter()
            .filter_map(|h| ctx.rules.get(h.key()).map(|rule| h.evaluate(ctx, rule)))
            .flatten()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reminder {
    pub field_slug: String,
    pub reminder_date: NaiveDate,
}

/// Result of checking a whole record against its field definitions
#[derive(Debug, Clone, Default)]
pub struct RecordValidation {
    /// Names of required fields without a value
    pub missing: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub reminders: Vec<Reminder>,
    pub typed: HashMap<String, TypedValue>,
}

impl RecordValidation {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty() && self.errors.is_empty()
    }

    pub fn into_result(self) -> SchemaResult<Self> {
        if self.is_valid() {
            return Ok(self);
        }
        let mut messages: Vec<String> = self
            .missing
            .iter()
            .map(|name| format!("{} is required", name))
            .collect();
        messages.extend(self.errors.iter().cloned());
        Err(SchemaError::Validation(messages))
    }
}

fn is_missing(kind: ValueKind, raw: Option<&Value>) -> bool {
    match kind {
        ValueKind::Boolean => false,
        ValueKind::Multiselect => !matches!(raw, Some(Value::Array(items)) if !items.is_empty()),
        _ => match raw {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        },
    }
}

/// Check presence, coercion and cross-field rules for `values` keyed by slug
pub fn validate_record(
    fields: &[ResolvedField],
    values: &Map<String, Value>,
    registry: &RuleRegistry,
) -> RecordValidation {
    let mut outcome = RecordValidation::default();

    for field in fields {
        let raw = values.get(field.slug());
        if field.field.is_required && is_missing(field.kind(), raw) {
            outcome.missing.push(field.field.name.clone());
        }
        match validate_value(field, raw.unwrap_or(&Value::Null)) {
            Ok(typed) => {
                outcome.typed.insert(field.slug().to_string(), typed);
            }
            Err(message) => outcome.errors.push(message),
        }
    }

    let empty_rules = Map::new();
    for field in fields {
        let Some(value) = outcome.typed.get(field.slug()) else {
            continue;
        };
        let rules = field
            .field
            .validation_rules
            .as_ref()
            .and_then(Value::as_object)
            .unwrap_or(&empty_rules);
        let ctx = RuleContext {
            field,
            value,
            rules,
            record: &outcome.typed,
        };
        let effects = registry.evaluate(&ctx);
        for effect in effects {
            match effect {
                RuleEffect::Warning(w) => outcome.warnings.push(w),
                RuleEffect::Error(e) => outcome.errors.push(e),
                RuleEffect::Reminder(date) => outcome.reminders.push(Reminder {
                    field_slug: field.slug().to_string(),
                    reminder_date: date,
                }),
            }
        }
    }

    outcome
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectedField {
    pub field_id: String,
    pub slug: String,
    pub name: String,
    pub field_type: Option<String>,
    pub is_required: bool,
    pub display_order: i32,
    pub value: Value,
    pub reminder_date: Option<NaiveDate>,
}

/// An asset's values decoded against its active field definitions
#[derive(Debug, Clone, Serialize)]
pub struct AssetRecord {
    pub asset_id: String,
    pub asset_type_id: Option<String>,
    pub label: Option<String>,
    pub complete: bool,
    pub missing: Vec<String>,
    /// Stored values that no longer satisfy their definition
    pub invalid: Vec<String>,
    pub warnings: Vec<String>,
    pub fields: Vec<ProjectedField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignOutcome {
    pub record: AssetRecord,
    pub warnings: Vec<String>,
}

pub struct RecordProjector<'a> {
    repos: &'a Repositories,
    registry: RuleRegistry,
}

impl<'a> RecordProjector<'a> {
    pub fn new(repos: &'a Repositories) -> Self {
        Self {
            repos,
            registry: RuleRegistry::default(),
        }
    }

    pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Number of stored values referencing the field
    pub async fn delete_guard(&self, field_id: &str) -> SchemaResult<u64> {
        self.delete_guard_in(self.repos.db(), field_id).await
    }

    /// [`Self::delete_guard`] on a caller-owned connection or transaction
    pub async fn delete_guard_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        field_id: &str,
    ) -> SchemaResult<u64> {
        Ok(self.repos.values.count_for_field(conn, field_id).await?)
    }

    async fn load_fields<C: ConnectionTrait>(
        &self,
        conn: &C,
        asset_type_id: Option<&str>,
    ) -> SchemaResult<Vec<ResolvedField>> {
        let Some(asset_type_id) = asset_type_id else {
            return Ok(vec![]);
        };
        let rows = self.repos.fields.find_with_types(conn, asset_type_id).await?;
        Ok(rows
            .into_iter()
            .map(|(field, field_type)| ResolvedField::new(field, field_type))
            .collect())
    }

    async fn stored_values<C: ConnectionTrait>(
        &self,
        conn: &C,
        asset_id: &str,
        fields: &[ResolvedField],
    ) -> SchemaResult<Map<String, Value>> {
        let by_id: HashMap<&str, &ResolvedField> =
            fields.iter().map(|f| (f.field.id.as_str(), f)).collect();
        let rows = self.repos.values.find_for_asset(conn, asset_id).await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                by_id.get(row.asset_type_field_id.as_str()).map(|field| {
                    (
                        field.slug().to_string(),
                        decode_value(field.kind(), row.value.as_deref()),
                    )
                })
            })
            .collect())
    }

    fn build_record(
        asset: &crate::entity::assets::Model,
        fields: &[ResolvedField],
        values: &Map<String, Value>,
        validation: &RecordValidation,
    ) -> AssetRecord {
        let projected = fields
            .iter()
            .map(|field| ProjectedField {
                field_id: field.field.id.clone(),
                slug: field.slug().to_string(),
                name: field.field.name.clone(),
                field_type: field.field_type_slug().map(str::to_string),
                is_required: field.field.is_required,
                display_order: field.field.display_order,
                value: values.get(field.slug()).cloned().unwrap_or(Value::Null),
                reminder_date: validation
                    .reminders
                    .iter()
                    .find(|r| r.field_slug == field.slug())
                    .map(|r| r.reminder_date),
            })
            .collect();

        AssetRecord {
            asset_id: asset.id.clone(),
            asset_type_id: asset.asset_type_id.clone(),
            label: asset.label.clone(),
            complete: validation.is_valid(),
            missing: validation.missing.clone(),
            invalid: validation.errors.clone(),
            warnings: validation.warnings.clone(),
            fields: projected,
        }
    }

    /// Decoded values for every active field in display order
    pub async fn project(&self, asset_id: &str) -> SchemaResult<AssetRecord> {
        let conn = self.repos.db();
        let asset = self
            .repos
            .assets
            .find_by_id(conn, asset_id)
            .await?
            .ok_or_else(|| SchemaError::not_found(format!("Asset {}", asset_id)))?;

        let fields = self.load_fields(conn, asset.asset_type_id.as_deref()).await?;
        let values = self.stored_values(conn, asset_id, &fields).await?;
        let validation = validate_record(&fields, &values, &self.registry);

        Ok(Self::build_record(&asset, &fields, &values, &validation))
    }

    /// Merge `patch` over the stored values, validate the whole record and upsert
    /// the patched fields atomically. Unknown slugs are skipped with a warning.
    pub async fn assign_values(
        &self,
        asset_id: &str,
        patch: &Map<String, Value>,
    ) -> SchemaResult<AssignOutcome> {
        let txn = self.repos.db().begin().await.map_err(DbError::from)?;

        let asset = self
            .repos
            .assets
            .find_by_id(&txn, asset_id)
            .await?
            .ok_or_else(|| SchemaError::not_found(format!("Asset {}", asset_id)))?;

        let fields = self.load_fields(&txn, asset.asset_type_id.as_deref()).await?;
        let mut values = self.stored_values(&txn, asset_id, &fields).await?;

        let mut warnings = Vec::new();
        let mut touched = Vec::new();
        for (slug, value) in patch {
            match fields.iter().find(|f| f.slug() == slug) {
                Some(field) => {
                    values.insert(slug.clone(), value.clone());
                    touched.push(field);
                }
                None => {
                    warn!("Ignoring unknown field '{}' for asset {}", slug, asset_id);
                    warnings.push(format!("Unknown field '{}' ignored", slug));
                }
            }
        }

        let validation = validate_record(&fields, &values, &self.registry).into_result()?;
        warnings.extend(validation.warnings.iter().cloned());

        for field in &touched {
            let encoded = validation
                .typed
                .get(field.slug())
                .and_then(TypedValue::encode);
            self.repos
                .values
                .upsert(&txn, asset_id, &field.field.id, encoded)
                .await?;
        }

        txn.commit().await.map_err(DbError::from)?;
        info!("Assigned {} values to asset {}", touched.len(), asset_id);

        // Re-decode what was written so the response mirrors storage
        let stored: Map<String, Value> = fields
            .iter()
            .map(|f| {
                let encoded = validation.typed.get(f.slug()).and_then(TypedValue::encode);
                (f.slug().to_string(), decode_value(f.kind(), encoded.as_deref()))
            })
            .collect();

        Ok(AssignOutcome {
            record: Self::build_record(&asset, &fields, &stored, &validation),
            warnings,
        })
    }
}

/// Conflict raised when a field still has values
pub fn field_in_use(field_id: &str, values_count: u64) -> SchemaError {
    SchemaError::conflict(
        "Cannot delete field that has values assigned",
        json!({ "values_count": values_count, "field_id": field_id }),
    )
}
