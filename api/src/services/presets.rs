// Standard preset library and the preset matching rule

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::asset_type_fields;
use crate::services::field_validator::{
    RULE_REMINDER_LEAD_DAYS, RULE_REQUIRES_DOCUMENT_REQUIRED, RULE_REQUIRES_DOCUMENT_SLUG,
};

/// A named, pre-designed field offered for every asset type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preset {
    pub key: &'static str,
    pub label: &'static str,
    pub field_type_slug: &'static str,
    pub options: &'static [&'static str],
}

impl Preset {
    const fn new(key: &'static str, label: &'static str, field_type_slug: &'static str) -> Self {
        Self {
            key,
            label,
            field_type_slug,
            options: &[],
        }
    }

    pub fn is_date(&self) -> bool {
        self.field_type_slug.eq_ignore_ascii_case("date")
    }
}

const STANDARD_PRESETS: &[Preset] = &[
    Preset::new("asset_life_years", "Asset life (years)", "number"),
    Preset::new("warranty_terms", "Warranty terms", "textarea"),
    Preset::new("last_serviced", "Last serviced", "date"),
    Preset::new("next_service_date", "Next Service Date", "date"),
    Preset::new("documentation_url", "Documentation URL", "url"),
    Preset::new("location", "Location", "text"),
    Preset::new("vehicle_accessories", "Vehicle Accessories", "textarea"),
    Preset::new("supplier", "Supplier", "text"),
    Preset::new("purchase_price", "Purchase price", "currency"),
    Preset {
        key: "condition",
        label: "Condition",
        field_type_slug: "select",
        options: &["New", "Good", "Fair", "Poor"],
    },
    Preset::new("warranty_expiry", "Warranty expiry", "date"),
    Preset::new("maintenance_interval_days", "Maintenance interval (days)", "number"),
    Preset::new("barcode_tag", "Tag / Barcode", "text"),
    Preset::new("department", "Department", "text"),
];

/// How an existing field was recognised as a preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Slug,
    LabelAndType,
}

#[derive(Debug, Clone)]
pub struct PresetLibrary {
    presets: Vec<Preset>,
}

impl Default for PresetLibrary {
    fn default() -> Self {
        Self::standard()
    }
}

impl PresetLibrary {
    pub fn standard() -> Self {
        Self::new(STANDARD_PRESETS.to_vec())
    }

    pub fn new(presets: Vec<Preset>) -> Self {
        Self { presets }
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.key == key)
    }

    /// Slug equal to a preset key wins; otherwise the trimmed name must equal the
    /// preset label and the field type must be the preset's type.
    pub fn match_field(
        &self,
        field: &asset_type_fields::Model,
        field_type_slug: Option<&str>,
    ) -> Option<(&Preset, MatchKind)> {
        self.presets
            .iter()
            .find(|p| field.slug.eq_ignore_ascii_case(p.key))
            .map(|p| (p, MatchKind::Slug))
            .or_else(|| {
                self.match_label(&field.name, field_type_slug)
                    .map(|p| (p, MatchKind::LabelAndType))
            })
    }

    /// Label and type match, used both for existing fields and for new custom requests
    pub fn match_label(&self, name: &str, field_type_slug: Option<&str>) -> Option<&Preset> {
        let name = name.trim().to_lowercase();
        let type_slug = field_type_slug?;
        self.presets.iter().find(|p| {
            p.label.trim().to_lowercase() == name && p.field_type_slug.eq_ignore_ascii_case(type_slug)
        })
    }
}

/// Document-link and reminder settings carried by date fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRuleSettings {
    #[serde(default)]
    pub requires_document_slug: Option<String>,
    #[serde(default)]
    pub requires_document_required: bool,
    #[serde(default)]
    pub reminder_lead_days: Option<u32>,
}

impl DateRuleSettings {
    pub fn is_empty(&self) -> bool {
        self.to_rules().is_empty()
    }

    fn document_slug(&self) -> Option<&str> {
        self.requires_document_slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Only meaningful keys are emitted: the required flag only alongside a
    /// document slug, the lead time only when positive.
    pub fn to_rules(&self) -> Map<String, Value> {
        let mut rules = Map::new();
        if let Some(slug) = self.document_slug() {
            rules.insert(RULE_REQUIRES_DOCUMENT_SLUG.into(), Value::String(slug.to_string()));
            rules.insert(
                RULE_REQUIRES_DOCUMENT_REQUIRED.into(),
                Value::Bool(self.requires_document_required),
            );
        }
        if let Some(days) = self.reminder_lead_days.filter(|d| *d > 0) {
            rules.insert(RULE_REMINDER_LEAD_DAYS.into(), Value::from(days));
        }
        rules
    }

    /// Read settings back from stored rules, accepting legacy key spellings
    pub fn from_rules(rules: Option<&Value>) -> Self {
        let Some(rules) = rules.and_then(Value::as_object) else {
            return Self::default();
        };

        let first = |keys: &[&str]| keys.iter().find_map(|k| rules.get(*k).filter(|v| !v.is_null()));

        let requires_document_slug = first(&[RULE_REQUIRES_DOCUMENT_SLUG, "require_document_slug"])
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let requires_document_required = first(&[
            RULE_REQUIRES_DOCUMENT_REQUIRED,
            "require_document_required",
            "document_required",
        ])
        .map(|v| match v {
            Value::Bool(b) => *b,
            Value::String(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        })
        .unwrap_or(false);

        let reminder_lead_days = first(&[RULE_REMINDER_LEAD_DAYS, "reminderDays", "reminder_days"])
            .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())))
            .and_then(|d| u32::try_from(d).ok())
            .filter(|d| *d > 0);

        Self {
            requires_document_slug,
            requires_document_required,
            reminder_lead_days,
        }
    }

    /// `existing` with the managed keys replaced by these settings; other keys survive
    pub fn merge_into(&self, existing: Option<&Value>) -> Map<String, Value> {
        let mut merged = existing
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        for key in [
            RULE_REQUIRES_DOCUMENT_SLUG,
            RULE_REQUIRES_DOCUMENT_REQUIRED,
            RULE_REMINDER_LEAD_DAYS,
            "require_document_slug",
            "require_document_required",
            "document_required",
            "reminderDays",
            "reminder_days",
        ] {
            merged.remove(key);
        }
        merged.extend(self.to_rules());
        merged
    }
}
