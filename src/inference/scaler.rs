use std::path::Path;

use serde::Deserialize;

use super::InferenceError;

/// Fitted standardization: `(x - mean) / scale`, per feature.
///
/// A zero scale (constant feature during fitting) leaves the centred
/// value unscaled.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, InferenceError> {
        let scaler = Self { mean, scale };
        if scaler.mean.is_empty() || scaler.mean.len() != scaler.scale.len() {
            return Err(InferenceError::Runtime(format!(
                "scaler has {} means and {} scales",
                scaler.mean.len(),
                scaler.scale.len()
            )));
        }
        Ok(scaler)
    }

    /// Load from a JSON file `{"mean": [...], "scale": [...]}`.
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        if !path.exists() {
            return Err(InferenceError::ArtifactNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        let parsed: StandardScaler =
            serde_json::from_slice(&bytes).map_err(|e| InferenceError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Self::new(parsed.mean, parsed.scale).map_err(|e| InferenceError::InvalidArtifact {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    pub fn transform(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if features.len() != self.mean.len() {
            return Err(InferenceError::DimensionMismatch {
                expected: self.mean.len(),
                got: features.len(),
            });
        }
        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| {
                let centred = x - m;
                if *s == 0.0 {
                    centred
                } else {
                    centred / s
                }
            })
            .collect())
    }
}
