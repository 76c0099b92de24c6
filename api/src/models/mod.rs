// API request/response models

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use crate::services::asset_type_service::AssetTypeInput;
pub use crate::services::field_validator::{FieldPayload, FieldTypePayload};
pub use crate::services::reconciler::ReconcileRequest;

/// `?q=` name filter for the asset type list
#[derive(Debug, Deserialize, Default)]
pub struct AssetTypeListQuery {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RegisterAssetRequest {
    #[serde(default)]
    pub label: Option<String>,
}

/// Values keyed by field slug; either wrapped in `values` or sent bare
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AssignValuesRequest {
    Wrapped { values: Map<String, Value> },
    Bare(Map<String, Value>),
}

impl AssignValuesRequest {
    pub fn into_values(self) -> Map<String, Value> {
        match self {
            AssignValuesRequest::Wrapped { values } => values,
            AssignValuesRequest::Bare(values) => values,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: String,
    pub deleted: bool,
}

impl DeletedResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            deleted: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn assign_values_accepts_both_shapes() {
        let wrapped: AssignValuesRequest =
            serde_json::from_value(json!({ "values": { "serial": "A1" } })).unwrap();
        assert_eq!(wrapped.into_values().get("serial"), Some(&json!("A1")));

        let bare: AssignValuesRequest =
            serde_json::from_value(json!({ "serial": "A1", "cost": 3 })).unwrap();
        assert_eq!(bare.into_values().len(), 2);
    }
}
