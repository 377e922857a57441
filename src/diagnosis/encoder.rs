//! Form values → feature vector.
//!
//! The client submits choice fields as their numeric code (`null` or a
//! missing key means the field was left at its placeholder). Every field
//! is checked before anything is encoded; a single bad field blocks the
//! whole submission.

use serde::Serialize;
use serde_json::{Map, Value};

use super::{DiagnosisKind, FieldKind, FieldSpec};

/// Ordered model input, one value per schema field.
pub type FeatureVector = Vec<f64>;

/// Result of a successful encode: what the model sees and what gets stored.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedForm {
    pub features: FeatureVector,
    /// Canonical field name → persisted value (choices as `"Label (code)"`).
    pub inputs: Map<String, Value>,
}

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: &'static str,
    pub problem: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Please complete every required field ({} invalid)", .0.len())]
    Invalid(Vec<FieldIssue>),

    #[error("Stored value {value} for `{field}` is not one of the known options")]
    UnknownStoredOption { field: &'static str, value: String },

    #[error("Stored value for `{field}` is missing or has the wrong type")]
    MalformedStoredValue { field: &'static str },
}

/// Validate and encode raw form values for one diagnosis type.
pub fn encode(kind: DiagnosisKind, raw: &Map<String, Value>) -> Result<EncodedForm, EncodeError> {
    let schema = kind.schema();
    let mut features = Vec::with_capacity(schema.len());
    let mut inputs = Map::new();
    let mut issues = Vec::new();

    for field in schema {
        match encode_field(field, raw.get(field.name)) {
            Ok((feature, stored)) => {
                features.push(feature);
                inputs.insert(field.name.to_string(), stored);
            }
            Err(problem) => issues.push(FieldIssue {
                field: field.name,
                problem,
            }),
        }
    }

    if !issues.is_empty() {
        return Err(EncodeError::Invalid(issues));
    }

    Ok(EncodedForm { features, inputs })
}

fn encode_field(field: &FieldSpec, value: Option<&Value>) -> Result<(f64, Value), String> {
    let value = match value {
        None | Some(Value::Null) => {
            return Err(match field.kind {
                FieldKind::Choice { .. } => "a selection is required".to_string(),
                _ => "a value is required".to_string(),
            })
        }
        Some(v) => v,
    };

    match field.kind {
        FieldKind::Integer { min, max } => {
            let n = as_whole_number(value).ok_or("expected a whole number")?;
            if n < min || max.is_some_and(|max| n > max) {
                return Err(range_message(min as f64, max.map(|m| m as f64)));
            }
            Ok((n as f64, Value::from(n)))
        }
        FieldKind::Decimal { min, max } => {
            let x = value
                .as_f64()
                .filter(|x| x.is_finite())
                .ok_or("expected a number")?;
            if x < min || max.is_some_and(|max| x > max) {
                return Err(range_message(min, max));
            }
            Ok((x, Value::from(x)))
        }
        FieldKind::Choice { options } => {
            let code = as_whole_number(value).ok_or("expected an option code")?;
            let choice = options
                .iter()
                .find(|c| c.code == code)
                .ok_or_else(|| format!("{code} is not one of the options"))?;
            Ok((code as f64, Value::String(choice.display())))
        }
    }
}

fn as_whole_number(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let x = value.as_f64()?;
    (x.is_finite() && x.fract() == 0.0 && x.abs() < i64::MAX as f64).then_some(x as i64)
}

fn range_message(min: f64, max: Option<f64>) -> String {
    match max {
        Some(max) => format!("must be between {min} and {max}"),
        None => format!("must be at least {min}"),
    }
}

/// Turn a persisted `inputs` mapping back into submit-shaped values.
///
/// Used to prefill the admin edit form. A stored choice whose text is not
/// in the option list is reported, not defaulted.
pub fn decode_stored(
    kind: DiagnosisKind,
    inputs: &Map<String, Value>,
) -> Result<Map<String, Value>, EncodeError> {
    let mut raw = Map::new();

    for field in kind.schema() {
        let stored = inputs
            .get(field.name)
            .ok_or(EncodeError::MalformedStoredValue { field: field.name })?;

        let value = match field.kind {
            FieldKind::Integer { .. } | FieldKind::Decimal { .. } => {
                if !stored.is_number() {
                    return Err(EncodeError::MalformedStoredValue { field: field.name });
                }
                stored.clone()
            }
            FieldKind::Choice { .. } => {
                let text = stored
                    .as_str()
                    .ok_or(EncodeError::MalformedStoredValue { field: field.name })?;
                let choice = field.option_by_display(text).ok_or_else(|| {
                    EncodeError::UnknownStoredOption {
                        field: field.name,
                        value: text.to_string(),
                    }
                })?;
                Value::from(choice.code)
            }
        };
        raw.insert(field.name.to_string(), value);
    }

    Ok(raw)
}
