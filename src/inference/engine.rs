use std::path::Path;

use serde::Serialize;

use super::{find_artifact, load_classifier, result_message, Classifier, InferenceError, StandardScaler};
use crate::diagnosis::DiagnosisKind;

/// Artifact file stems inside the models directory.
pub const HEART_MODEL: &str = "heart";
pub const DEPRESSION_MODEL: &str = "depression";
pub const OBESITY_MODEL: &str = "obesity";
pub const OBESITY_SCALER: &str = "obesity_scaler.json";

/// Outcome of one prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prediction {
    pub class_id: i64,
    pub message: &'static str,
}

/// The three screening models, loaded once and shared read-only.
pub struct InferenceEngine {
    heart: Box<dyn Classifier>,
    depression: Box<dyn Classifier>,
    obesity: Box<dyn Classifier>,
    obesity_scaler: StandardScaler,
}

impl InferenceEngine {
    pub fn new(
        heart: Box<dyn Classifier>,
        depression: Box<dyn Classifier>,
        obesity: Box<dyn Classifier>,
        obesity_scaler: StandardScaler,
    ) -> Result<Self, InferenceError> {
        let engine = Self {
            heart,
            depression,
            obesity,
            obesity_scaler,
        };
        engine.check_shapes()?;
        Ok(engine)
    }

    /// Load every artifact from `models_dir`.
    pub fn load(models_dir: &Path) -> Result<Self, InferenceError> {
        let heart = load_classifier(&find_artifact(models_dir, HEART_MODEL)?)?;
        let depression = load_classifier(&find_artifact(models_dir, DEPRESSION_MODEL)?)?;
        let obesity = load_classifier(&find_artifact(models_dir, OBESITY_MODEL)?)?;
        let obesity_scaler = StandardScaler::load(&models_dir.join(OBESITY_SCALER))?;

        let engine = Self::new(heart, depression, obesity, obesity_scaler)?;
        tracing::info!(dir = %models_dir.display(), "Screening models loaded");
        Ok(engine)
    }

    /// Artifacts that declare their width must match the form schema.
    fn check_shapes(&self) -> Result<(), InferenceError> {
        let declared = [
            (DiagnosisKind::Heart, self.heart.input_len()),
            (DiagnosisKind::Depression, self.depression.input_len()),
            (DiagnosisKind::Obesity, self.obesity.input_len()),
            (DiagnosisKind::Obesity, Some(self.obesity_scaler.len())),
        ];
        for (kind, width) in declared {
            if let Some(got) = width {
                if got != kind.feature_len() {
                    return Err(InferenceError::DimensionMismatch {
                        expected: kind.feature_len(),
                        got,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn predict(&self, kind: DiagnosisKind, features: &[f64]) -> Result<Prediction, InferenceError> {
        if features.len() != kind.feature_len() {
            return Err(InferenceError::DimensionMismatch {
                expected: kind.feature_len(),
                got: features.len(),
            });
        }

        let class_id = match kind {
            DiagnosisKind::Heart => self.heart.predict(features)?,
            DiagnosisKind::Depression => self.depression.predict(features)?,
            DiagnosisKind::Obesity => {
                let scaled = self.obesity_scaler.transform(features)?;
                self.obesity.predict(&scaled)?
            }
        };

        tracing::debug!(%kind, class_id, "Prediction");

        Ok(Prediction {
            class_id,
            message: result_message(kind, class_id),
        })
    }
}
