//! Model loading and batch inference
//!
//! A trained model lives on disk as a JSON artifact (see [`artifact`]). The
//! model declares the feature columns it was trained on; [`inference::Predictor`]
//! selects exactly those columns from the feature table and appends the
//! `LMP Forecast` column.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::forecast::FeatureError;

pub mod artifact;
pub mod inference;
pub mod models;

#[cfg(feature = "ml")]
pub mod smartcore;

pub use artifact::{load_model, ModelArtifact};
pub use inference::Predictor;
pub use models::{LinearRegressionModel, MLModel};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot read model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode model file {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("feature count mismatch: expected {expected}, got {got}")]
    Shape { expected: usize, got: usize },

    #[error(transparent)]
    Features(#[from] FeatureError),

    #[error("model backend error: {0}")]
    Backend(String),
}

/// ML Model Type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModelType {
    LinearRegression,
    RandomForest,
}

/// Model metadata stored next to the parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    pub model_id: String,
    pub model_type: ModelType,
    pub version: String,
    pub trained_at: chrono::DateTime<chrono::Utc>,
    pub training_samples: usize,
    #[serde(default)]
    pub validation_metrics: Option<ValidationMetrics>,
    /// Input columns, in the order the model expects them
    pub feature_names: Vec<String>,
}

/// Validation Metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ValidationMetrics {
    pub mae: f64,  // Mean Absolute Error
    pub rmse: f64, // Root Mean Square Error
    pub r2: f64,   // R-squared
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_without_metrics_deserializes() {
        let json = r#"{"model_id":"m","model_type":"LinearRegression","version":"1",
            "trained_at":"2024-06-01T00:00:00Z","training_samples":10,"feature_names":["LMP"]}"#;
        let meta: ModelMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.validation_metrics, None);
        assert_eq!(meta.feature_names, vec!["LMP".to_string()]);
    }

    #[test]
    fn test_metadata_reads_recorded_metrics() {
        let json = r#"{"model_id":"m","model_type":"RandomForest","version":"1",
            "trained_at":"2024-06-01T00:00:00Z","training_samples":10,
            "validation_metrics":{"mae":1.5,"rmse":2.0,"r2":0.8},"feature_names":["hour"]}"#;
        let meta: ModelMetadata = serde_json::from_str(json).unwrap();
        let metrics = meta.validation_metrics.unwrap();
        assert_eq!(metrics.mae, 1.5);
        assert_eq!(metrics.r2, 0.8);
    }
}
