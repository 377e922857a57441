use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::InferenceError;

/// A pre-trained classifier: feature vector in, class id out.
///
/// Implementations are immutable after load and safe to share across
/// threads; prediction is a pure function of the input.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<i64, InferenceError>;

    /// Number of features the model was trained on, when the artifact says.
    fn input_len(&self) -> Option<usize>;
}

// ═══════════════════════════════════════════════════════════
// JSON artifacts
// ═══════════════════════════════════════════════════════════

/// Linear decision function, as exported from a logistic regression or
/// linear SVM.
///
/// With two classes and one coefficient row the sign of `w·x + b` picks
/// `classes[1]` (positive) or `classes[0]`. Otherwise there is one row per
/// class and the highest score wins.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearClassifier {
    classes: Vec<i64>,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

impl LinearClassifier {
    pub fn new(
        classes: Vec<i64>,
        coefficients: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    ) -> Result<Self, InferenceError> {
        let model = Self {
            classes,
            coefficients,
            intercepts,
        };
        model.validate().map_err(InferenceError::InvalidModel)?;
        Ok(model)
    }

    fn width(&self) -> usize {
        self.coefficients.first().map_or(0, Vec::len)
    }

    fn validate(&self) -> Result<(), String> {
        if self.classes.len() < 2 {
            return Err("need at least two classes".into());
        }
        let binary = self.classes.len() == 2 && self.coefficients.len() == 1;
        if !binary && self.coefficients.len() != self.classes.len() {
            return Err(format!(
                "{} coefficient rows for {} classes",
                self.coefficients.len(),
                self.classes.len()
            ));
        }
        if self.intercepts.len() != self.coefficients.len() {
            return Err("one intercept per coefficient row expected".into());
        }
        let width = self.width();
        if width == 0 || self.coefficients.iter().any(|row| row.len() != width) {
            return Err("coefficient rows must be non-empty and equally long".into());
        }
        Ok(())
    }

    fn score(row: &[f64], intercept: f64, features: &[f64]) -> f64 {
        row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + intercept
    }
}

impl Classifier for LinearClassifier {
    fn predict(&self, features: &[f64]) -> Result<i64, InferenceError> {
        let expected = self.width();
        if features.len() != expected {
            return Err(InferenceError::DimensionMismatch {
                expected,
                got: features.len(),
            });
        }

        if let ([row], [intercept], [negative, positive]) =
            (&self.coefficients[..], &self.intercepts[..], &self.classes[..])
        {
            let score = Self::score(row, *intercept, features);
            return Ok(if score > 0.0 { *positive } else { *negative });
        }

        let best = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| Self::score(row, *b, features))
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, s)| if s > best.1 { (i, s) } else { best })
            .0;
        self.classes
            .get(best)
            .copied()
            .ok_or_else(|| InferenceError::Runtime("no class for best score".into()))
    }

    fn input_len(&self) -> Option<usize> {
        Some(self.width())
    }
}

/// k-nearest-neighbours over stored training samples (Euclidean distance).
///
/// Majority vote among the `k` closest samples; on a tied vote the label
/// of the closest tied neighbour wins.
#[derive(Debug, Clone, Deserialize)]
pub struct KnnClassifier {
    k: usize,
    samples: Vec<Vec<f64>>,
    labels: Vec<i64>,
}

impl KnnClassifier {
    pub fn new(
        k: usize,
        samples: Vec<Vec<f64>>,
        labels: Vec<i64>,
    ) -> Result<Self, InferenceError> {
        let model = Self { k, samples, labels };
        model.validate().map_err(InferenceError::InvalidModel)?;
        Ok(model)
    }

    fn width(&self) -> usize {
        self.samples.first().map_or(0, Vec::len)
    }

    fn validate(&self) -> Result<(), String> {
        if self.k == 0 {
            return Err("k must be at least 1".into());
        }
        if self.samples.is_empty() {
            return Err("no training samples".into());
        }
        if self.samples.len() != self.labels.len() {
            return Err(format!(
                "{} samples but {} labels",
                self.samples.len(),
                self.labels.len()
            ));
        }
        let width = self.width();
        if width == 0 || self.samples.iter().any(|s| s.len() != width) {
            return Err("samples must be non-empty and equally long".into());
        }
        Ok(())
    }
}

impl Classifier for KnnClassifier {
    fn predict(&self, features: &[f64]) -> Result<i64, InferenceError> {
        let expected = self.width();
        if features.len() != expected {
            return Err(InferenceError::DimensionMismatch {
                expected,
                got: features.len(),
            });
        }

        let mut neighbours: Vec<(f64, i64)> = self
            .samples
            .iter()
            .zip(&self.labels)
            .map(|(sample, label)| {
                let d2: f64 = sample.iter().zip(features).map(|(a, b)| (a - b).powi(2)).sum();
                (d2, *label)
            })
            .collect();
        neighbours.sort_by(|a, b| a.0.total_cmp(&b.0));
        neighbours.truncate(self.k);

        let votes = |label: i64| neighbours.iter().filter(|(_, l)| *l == label).count();
        let top = neighbours.iter().map(|(_, l)| votes(*l)).max().unwrap_or(0);

        neighbours
            .iter()
            .find(|(_, l)| votes(*l) == top)
            .map(|(_, l)| *l)
            .ok_or_else(|| InferenceError::Runtime("no neighbours".into()))
    }

    fn input_len(&self) -> Option<usize> {
        Some(self.width())
    }
}

/// On-disk JSON artifact, tagged by `kind`.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ClassifierArtifact {
    Linear(LinearClassifier),
    Knn(KnnClassifier),
}

fn load_json_classifier(path: &Path) -> Result<Box<dyn Classifier>, InferenceError> {
    let bytes = std::fs::read(path)?;
    let invalid = |reason: String| InferenceError::InvalidArtifact {
        path: path.to_path_buf(),
        reason,
    };

    let artifact: ClassifierArtifact =
        serde_json::from_slice(&bytes).map_err(|e| invalid(e.to_string()))?;

    match artifact {
        ClassifierArtifact::Linear(model) => {
            model.validate().map_err(invalid)?;
            Ok(Box::new(model))
        }
        ClassifierArtifact::Knn(model) => {
            model.validate().map_err(invalid)?;
            Ok(Box::new(model))
        }
    }
}

/// Locate `{stem}.json` or `{stem}.onnx` inside `dir`.
pub fn find_artifact(dir: &Path, stem: &str) -> Result<PathBuf, InferenceError> {
    let json = dir.join(format!("{stem}.json"));
    if json.exists() {
        return Ok(json);
    }
    let onnx = dir.join(format!("{stem}.onnx"));
    if onnx.exists() {
        return Ok(onnx);
    }
    Err(InferenceError::ArtifactNotFound(json))
}

/// Load a classifier, dispatching on the file extension.
pub fn load_classifier(path: &Path) -> Result<Box<dyn Classifier>, InferenceError> {
    if !path.exists() {
        return Err(InferenceError::ArtifactNotFound(path.to_path_buf()));
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some("onnx") => load_onnx(path),
        _ => load_json_classifier(path),
    }
}

#[cfg(feature = "onnx-models")]
fn load_onnx(path: &Path) -> Result<Box<dyn Classifier>, InferenceError> {
    Ok(Box::new(onnx::OnnxClassifier::load(path)?))
}

#[cfg(not(feature = "onnx-models"))]
fn load_onnx(path: &Path) -> Result<Box<dyn Classifier>, InferenceError> {
    Err(InferenceError::InvalidArtifact {
        path: path.to_path_buf(),
        reason: "ONNX models need the `onnx-models` feature".into(),
    })
}

// ═══════════════════════════════════════════════════════════
// ONNX classifier, behind `onnx-models` feature
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-models")]
mod onnx {
    use super::{Classifier, InferenceError};
    use ort::session::Session;
    use std::path::Path;
    use std::sync::Mutex;

    /// Classifier exported to ONNX (e.g. via skl2onnx).
    ///
    /// Input is a single `[1, n]` float32 tensor; the first output is the
    /// int64 label. `Session::run` needs `&mut self`, hence the Mutex.
    pub struct OnnxClassifier {
        session: Mutex<Session>,
    }

    impl OnnxClassifier {
        pub fn load(path: &Path) -> Result<Self, InferenceError> {
            let session = Session::builder()
                .map_err(|e: ort::Error| InferenceError::Runtime(e.to_string()))?
                .with_intra_threads(1)
                .map_err(|e: ort::Error| InferenceError::Runtime(e.to_string()))?
                .commit_from_file(path)
                .map_err(|e: ort::Error| InferenceError::InvalidArtifact {
                    path: path.to_path_buf(),
                    reason: format!("ONNX load failed: {e}"),
                })?;

            tracing::info!("ONNX classifier loaded from {}", path.display());

            Ok(Self {
                session: Mutex::new(session),
            })
        }
    }

    impl Classifier for OnnxClassifier {
        fn predict(&self, features: &[f64]) -> Result<i64, InferenceError> {
            use ort::value::TensorRef;

            let row: Vec<f32> = features.iter().map(|&x| x as f32).collect();
            let input = ndarray::Array2::from_shape_vec((1, row.len()), row)
                .map_err(|e| InferenceError::Runtime(e.to_string()))?;
            let tensor = TensorRef::from_array_view(&input)
                .map_err(|e| InferenceError::Runtime(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| InferenceError::Runtime("Session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![tensor])
                .map_err(|e| InferenceError::Runtime(format!("ONNX inference failed: {e}")))?;

            let (_shape, labels) = outputs[0]
                .try_extract_tensor::<i64>()
                .map_err(|e| InferenceError::Runtime(format!("Label extraction: {e}")))?;

            labels
                .first()
                .copied()
                .ok_or_else(|| InferenceError::Runtime("Empty label output".to_string()))
        }

        fn input_len(&self) -> Option<usize> {
            None
        }
    }
}

#[cfg(feature = "onnx-models")]
pub use onnx::OnnxClassifier;

/// Classifier that always answers the same class. For tests and dry runs.
pub struct MockClassifier {
    class: i64,
}

impl MockClassifier {
    pub fn returning(class: i64) -> Self {
        Self { class }
    }
}

impl Classifier for MockClassifier {
    fn predict(&self, _features: &[f64]) -> Result<i64, InferenceError> {
        Ok(self.class)
    }

    fn input_len(&self) -> Option<usize> {
        None
    }
}
