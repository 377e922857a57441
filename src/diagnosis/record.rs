use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::DiagnosisKind;

/// Placeholder shown for history fields missing from a stored record.
pub const UNKNOWN_FIELD: &str = "Không xác định";

/// One stored screening, as persisted under `diagnoses/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    pub user_name: String,
    #[serde(rename = "type")]
    pub kind: DiagnosisKind,
    pub inputs: Map<String, Value>,
    pub result: String,
    pub timestamp: String,
}

impl DiagnosisRecord {
    /// Line shown after a prediction: `"{user}: {result}"`.
    pub fn display_line(&self) -> String {
        format!("{}: {}", self.user_name, self.result)
    }
}

/// Read-only history row. Tolerates records written by other clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    pub user_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub result: String,
    pub timestamp: String,
}

impl HistoryEntry {
    pub fn from_value(id: &str, value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_FIELD)
                .to_string()
        };
        Self {
            id: id.to_string(),
            user_name: text("user_name"),
            kind: text("type"),
            result: text("result"),
            timestamp: text("timestamp"),
        }
    }
}
