//! ML Model Definitions

use super::{ModelError, ModelMetadata, ModelType};
use serde::{Deserialize, Serialize};

/// Trait for ML models
pub trait MLModel: Send + Sync {
    /// Predict one value from a feature row ordered like `feature_names()`
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError>;

    /// Predict every row in one call
    fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        rows.iter().map(|r| self.predict(r)).collect()
    }

    fn metadata(&self) -> &ModelMetadata;

    fn model_type(&self) -> ModelType {
        self.metadata().model_type
    }

    fn feature_names(&self) -> &[String] {
        &self.metadata().feature_names
    }
}

/// Ordinary linear model: `intercept + sum(coefficient_i * feature_i)`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearRegressionModel {
    pub metadata: ModelMetadata,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegressionModel {
    pub fn new(
        coefficients: Vec<f64>,
        intercept: f64,
        metadata: ModelMetadata,
    ) -> Result<Self, ModelError> {
        let model = Self {
            metadata,
            coefficients,
            intercept,
        };
        model.check_shape()?;
        Ok(model)
    }

    /// One coefficient per declared feature
    pub fn check_shape(&self) -> Result<(), ModelError> {
        if self.coefficients.len() != self.metadata.feature_names.len() {
            return Err(ModelError::Shape {
                expected: self.metadata.feature_names.len(),
                got: self.coefficients.len(),
            });
        }
        Ok(())
    }
}

impl MLModel for LinearRegressionModel {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.coefficients.len() {
            return Err(ModelError::Shape {
                expected: self.coefficients.len(),
                got: features.len(),
            });
        }

        Ok(features
            .iter()
            .zip(self.coefficients.iter())
            .map(|(f, c)| f * c)
            .sum::<f64>()
            + self.intercept)
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

#[cfg(test)]
pub(crate) fn linear_metadata(feature_names: &[&str]) -> ModelMetadata {
    ModelMetadata {
        model_id: "test_linear".to_string(),
        model_type: ModelType::LinearRegression,
        version: "0.1.0".to_string(),
        trained_at: chrono::Utc::now(),
        training_samples: 100,
        validation_metrics: None,
        feature_names: feature_names.iter().map(|s| s.to_string()).collect(),
    }
}
