mod common;

use std::collections::BTreeMap;

use asset_schema_api::services::field_validator::FieldPayload;
use asset_schema_api::services::presets::{DateRuleSettings, MatchKind, Preset, PresetLibrary};
use asset_schema_api::services::reconciler::{
    CustomFieldRequest, OperationKind, PresetSelection, ReconcileRequest, ReconcileStatus,
};
use asset_schema_api::services::{FieldReconciler, RecordProjector};
use serde_json::{json, Map};

fn selected(required: bool) -> PresetSelection {
    PresetSelection {
        selected: true,
        required,
        rules: DateRuleSettings::default(),
    }
}

fn request(presets: &[(&str, PresetSelection)]) -> ReconcileRequest {
    ReconcileRequest {
        presets: presets
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<BTreeMap<_, _>>(),
        custom_fields: vec![],
    }
}

#[tokio::test]
async fn second_pass_is_a_no_op() {
    let db = common::setup_with_defaults().await;
    let laptop = db.asset_type("Laptop").await;
    let reconciler = FieldReconciler::new(&db.repos, &db.settings);

    let serviced = PresetSelection {
        selected: true,
        required: false,
        rules: DateRuleSettings {
            requires_document_slug: Some("service_report".into()),
            requires_document_required: false,
            reminder_lead_days: Some(14),
        },
    };
    let desired = request(&[
        ("location", selected(true)),
        ("condition", selected(false)),
        ("last_serviced", serviced),
    ]);

    let first = reconciler
        .reconcile(&laptop.id, &desired, Some("admin"))
        .await
        .unwrap();
    assert_eq!(first.status, ReconcileStatus::Saved);
    assert_eq!(first.outcomes.len(), 3);
    assert!(first
        .outcomes
        .iter()
        .all(|o| o.success && o.operation == OperationKind::Create));

    let second = reconciler
        .reconcile(&laptop.id, &desired, Some("admin"))
        .await
        .unwrap();
    assert_eq!(second.status, ReconcileStatus::Saved);
    assert!(second.outcomes.is_empty());

    let fields = db.fields().list_fields(&laptop.id).await.unwrap();
    let slugs: Vec<&str> = fields.iter().map(|f| f.field.slug.as_str()).collect();
    assert_eq!(slugs, vec!["last_serviced", "location", "condition"]);

    let condition = &fields[2].field;
    assert_eq!(condition.options, Some(json!(["New", "Good", "Fair", "Poor"])));
    assert_eq!(condition.created_by.as_deref(), Some("admin"));
    assert_eq!(
        fields[0].field.validation_rules,
        Some(json!({
            "requires_document_slug": "service_report",
            "requires_document_required": false,
            "reminder_lead_days": 14
        }))
    );
}

#[tokio::test]
async fn required_toggle_updates_in_place() {
    let db = common::setup_with_defaults().await;
    let laptop = db.asset_type("Laptop").await;
    let reconciler = FieldReconciler::new(&db.repos, &db.settings);

    reconciler
        .reconcile(&laptop.id, &request(&[("supplier", selected(false))]), None)
        .await
        .unwrap();
    let before = db.fields().list_fields(&laptop.id).await.unwrap();

    let report = reconciler
        .reconcile(&laptop.id, &request(&[("supplier", selected(true))]), None)
        .await
        .unwrap();
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].operation, OperationKind::Update);

    let after = db.fields().list_fields(&laptop.id).await.unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].field.id, before[0].field.id);
    assert!(after[0].field.is_required);
}

#[tokio::test]
async fn slug_match_takes_priority() {
    let db = common::setup_with_defaults().await;
    let laptop = db.asset_type("Laptop").await;
    let text = db.field_type("text").await;

    // Named like the preset but slugged elsewhere
    let by_label = db
        .fields()
        .create_field_with_slug_base(&laptop.id, &FieldPayload::new("Location", text.id.clone()), Some("site"), None)
        .await
        .unwrap();
    let by_slug = db
        .fields()
        .create_field_with_slug_base(&laptop.id, &FieldPayload::new("Where", text.id.clone()), Some("location"), None)
        .await
        .unwrap();
    assert_eq!(by_label.slug, "site");

    let state = FieldReconciler::new(&db.repos, &db.settings)
        .preset_state(&laptop.id)
        .await
        .unwrap();
    let location = state.presets.iter().find(|p| p.key == "location").unwrap();
    assert!(location.selected);
    assert_eq!(location.field_id.as_deref(), Some(by_slug.id.as_str()));
    assert_eq!(location.matched_by, Some(MatchKind::Slug));

    let custom: Vec<&str> = state.custom_fields.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(custom, vec![by_label.id.as_str()]);
}

#[tokio::test]
async fn failed_item_is_reported_and_retried_alone() {
    let db = common::setup_with_defaults().await;
    let laptop = db.asset_type("Laptop").await;
    let reconciler = FieldReconciler::new(&db.repos, &db.settings);

    reconciler
        .reconcile(&laptop.id, &request(&[("supplier", selected(false))]), None)
        .await
        .unwrap();

    let asset = db.asset(&laptop.id).await;
    let mut values = Map::new();
    values.insert("supplier".into(), json!("Acme"));
    RecordProjector::new(&db.repos)
        .assign_values(&asset.id, &values)
        .await
        .unwrap();

    // Drop supplier (has a value), add department
    let desired = request(&[("department", selected(false))]);
    let report = reconciler.reconcile(&laptop.id, &desired, None).await.unwrap();

    assert_eq!(report.status, ReconcileStatus::SavedWithWarnings);
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(
        report.failures,
        vec!["Supplier: Cannot delete field that has values assigned"]
    );
    let created = report
        .outcomes
        .iter()
        .find(|o| o.operation == OperationKind::Create)
        .unwrap();
    assert!(created.success);

    let retry = reconciler.reconcile(&laptop.id, &desired, None).await.unwrap();
    assert_eq!(retry.status, ReconcileStatus::SavedWithWarnings);
    assert_eq!(retry.outcomes.len(), 1);
    assert_eq!(retry.outcomes[0].item, "Supplier");
    assert_eq!(retry.outcomes[0].operation, OperationKind::Delete);

    let slugs: Vec<String> = db
        .fields()
        .list_fields(&laptop.id)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.field.slug)
        .collect();
    assert_eq!(slugs, vec!["supplier", "department"]);
}

#[tokio::test]
async fn custom_fields_are_created_or_redirected() {
    let db = common::setup_with_defaults().await;
    let laptop = db.asset_type("Laptop").await;
    let currency = db.field_type("currency").await;
    let select = db.field_type("select").await;

    let desired = ReconcileRequest {
        presets: BTreeMap::new(),
        custom_fields: vec![
            CustomFieldRequest {
                name: "purchase price".into(),
                field_type_id: currency.id.clone(),
                required: true,
                options: None,
                rules: DateRuleSettings::default(),
            },
            CustomFieldRequest {
                name: "Colour".into(),
                field_type_id: select.id.clone(),
                required: false,
                options: Some(vec![" Black ".into(), "Silver".into()]),
                rules: DateRuleSettings::default(),
            },
            CustomFieldRequest {
                name: "Grade".into(),
                field_type_id: select.id.clone(),
                required: false,
                options: None,
                rules: DateRuleSettings::default(),
            },
        ],
    };

    let report = FieldReconciler::new(&db.repos, &db.settings)
        .reconcile(&laptop.id, &desired, None)
        .await
        .unwrap();

    assert_eq!(report.redirects.len(), 1);
    assert_eq!(report.redirects[0].preset_key, "purchase_price");
    assert_eq!(report.status, ReconcileStatus::SavedWithWarnings);
    assert_eq!(
        report.failures,
        vec!["Grade: Options are required for this field type"]
    );

    let fields = db.fields().list_fields(&laptop.id).await.unwrap();
    let price = fields.iter().find(|f| f.field.slug == "purchase_price").unwrap();
    assert!(price.field.is_required);
    assert_eq!(price.field.name, "Purchase price");

    let colour = fields.iter().find(|f| f.field.slug == "colour").unwrap();
    assert_eq!(colour.field.options, Some(json!(["Black", "Silver"])));
    // Custom fields follow every preset slot
    assert_eq!(colour.field.display_order, 14 + 1);
}

#[tokio::test]
async fn resubmitted_custom_fields_are_created_again() {
    let db = common::setup_with_defaults().await;
    let printer = db.asset_type("Printer").await;
    let text = db.field_type("text").await;

    let desired = ReconcileRequest {
        presets: BTreeMap::new(),
        custom_fields: vec![
            CustomFieldRequest {
                name: "Location".into(),
                field_type_id: text.id.clone(),
                required: false,
                options: None,
                rules: DateRuleSettings::default(),
            },
            CustomFieldRequest {
                name: "Toner model".into(),
                field_type_id: text.id.clone(),
                required: false,
                options: None,
                rules: DateRuleSettings::default(),
            },
        ],
    };
    let reconciler = FieldReconciler::new(&db.repos, &db.settings);

    reconciler.reconcile(&printer.id, &desired, None).await.unwrap();
    let second = reconciler.reconcile(&printer.id, &desired, None).await.unwrap();

    assert_eq!(second.status, ReconcileStatus::Saved);
    assert_eq!(second.outcomes.len(), 1);
    assert_eq!(second.outcomes[0].operation, OperationKind::Create);

    let fields = db.fields().list_fields(&printer.id).await.unwrap();
    let mut slugs: Vec<&str> = fields.iter().map(|f| f.field.slug.as_str()).collect();
    slugs.sort_unstable();
    assert_eq!(slugs, vec!["location", "toner-model", "toner-model-1"]);
}

#[tokio::test]
async fn unknown_asset_type_aborts() {
    let db = common::setup_with_defaults().await;
    let result = FieldReconciler::new(&db.repos, &db.settings)
        .reconcile("missing", &ReconcileRequest::default(), None)
        .await;
    assert!(matches!(
        result,
        Err(asset_schema_api::error::SchemaError::NotFound(_))
    ));
}

#[tokio::test]
async fn custom_library_limits_known_presets() {
    let db = common::setup_with_defaults().await;
    let laptop = db.asset_type("Laptop").await;
    let library = PresetLibrary::new(vec![Preset {
        key: "asset_tag",
        label: "Asset tag",
        field_type_slug: "text",
        options: &[],
    }]);
    let reconciler = FieldReconciler::new(&db.repos, &db.settings).with_library(library);

    let report = reconciler
        .reconcile(
            &laptop.id,
            &request(&[("asset_tag", selected(true)), ("location", selected(false))]),
            None,
        )
        .await
        .unwrap();

    assert_eq!(report.status, ReconcileStatus::SavedWithWarnings);
    assert_eq!(report.failures, vec!["location: Unknown preset 'location'"]);
    let fields = db.fields().list_fields(&laptop.id).await.unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].field.slug, "asset_tag");
    assert!(fields[0].field.is_required);
}

#[tokio::test]
#[ignore = "needs a Postgres database in TEST_POSTGRES_URL"]
async fn concurrent_apply_keeps_plan_order() {
    let db = common::setup_postgres(4).await;
    let name = format!("Vehicle {}", uuid::Uuid::new_v4());
    let vehicle = db.asset_type(&name).await;
    let reconciler = FieldReconciler::new(&db.repos, &db.settings);

    let desired = request(&[
        ("department", selected(false)),
        ("asset_life_years", selected(true)),
        ("supplier", selected(false)),
        ("warranty_terms", selected(false)),
        ("location", selected(true)),
    ]);

    let first = reconciler.reconcile(&vehicle.id, &desired, None).await.unwrap();
    assert_eq!(first.status, ReconcileStatus::Saved);
    let items: Vec<&str> = first.outcomes.iter().map(|o| o.item.as_str()).collect();
    assert_eq!(
        items,
        vec!["Asset life (years)", "Warranty terms", "Location", "Supplier", "Department"]
    );
    assert!(first
        .outcomes
        .iter()
        .all(|o| o.success && o.operation == OperationKind::Create));

    let fields = db.fields().list_fields(&vehicle.id).await.unwrap();
    let placed: Vec<(&str, i32)> = fields
        .iter()
        .map(|f| (f.field.slug.as_str(), f.field.display_order))
        .collect();
    assert_eq!(
        placed,
        vec![
            ("asset_life_years", 0),
            ("warranty_terms", 1),
            ("location", 5),
            ("supplier", 7),
            ("department", 13),
        ]
    );

    let second = reconciler.reconcile(&vehicle.id, &desired, None).await.unwrap();
    assert!(second.outcomes.is_empty());
}
