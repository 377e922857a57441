//! Classifier adapters for the three screening models.
//!
//! Models are opaque: a fixed-length numeric vector goes in, an integer
//! class comes out. Artifacts are loaded once into an [`InferenceEngine`]
//! and shared read-only by every request.

pub mod classifier;
pub mod engine;
pub mod messages;
pub mod scaler;

pub use classifier::*;
pub use engine::*;
pub use messages::*;
pub use scaler::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Model artifact not found: {0}")]
    ArtifactNotFound(PathBuf),

    #[error("Invalid model artifact {path}: {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Feature vector has {got} values, model expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Model runtime error: {0}")]
    Runtime(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
