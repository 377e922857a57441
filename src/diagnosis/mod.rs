//! Diagnosis types, form schemas and the feature encoder.
//!
//! Each diagnosis type has a fixed list of fields. The list order is the
//! feature order its classifier was trained on, so the schema doubles as
//! the encoding contract.

pub mod encoder;
pub mod record;
pub mod schema;

pub use encoder::*;
pub use record::*;
pub use schema::*;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The three screening flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosisKind {
    Heart,
    Depression,
    Obesity,
}

impl DiagnosisKind {
    pub const ALL: [DiagnosisKind; 3] = [Self::Heart, Self::Depression, Self::Obesity];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heart => "heart",
            Self::Depression => "depression",
            Self::Obesity => "obesity",
        }
    }

    /// Form title shown to the user.
    pub fn title(self) -> &'static str {
        match self {
            Self::Heart => "Kiểm tra tim mạch",
            Self::Depression => "Chuẩn đoán trầm cảm",
            Self::Obesity => "Chuẩn đoán bệnh béo phì",
        }
    }

    /// Ordered field list; also the feature order.
    pub fn schema(self) -> &'static [FieldSpec] {
        match self {
            Self::Heart => schema::HEART_FIELDS,
            Self::Depression => schema::DEPRESSION_FIELDS,
            Self::Obesity => schema::OBESITY_FIELDS,
        }
    }

    pub fn feature_len(self) -> usize {
        self.schema().len()
    }
}

impl fmt::Display for DiagnosisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown diagnosis type: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for DiagnosisKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heart" => Ok(Self::Heart),
            "depression" => Ok(Self::Depression),
            "obesity" => Ok(Self::Obesity),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}
