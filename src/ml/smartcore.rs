//! SmartCore random forest regressor
//!
//! The fitted forest is stored in the JSON artifact as bincode bytes and
//! restored on load.

use super::{models::MLModel, ModelError, ModelMetadata};
use serde::{Deserialize, Serialize};

use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

#[derive(Debug, Serialize, Deserialize)]
pub struct SmartcoreRandomForest {
    pub metadata: ModelMetadata,
    #[serde(skip)]
    model: Option<Forest>,
    /// bincode-encoded forest
    model_bytes: Vec<u8>,
    pub n_trees: usize,
    pub max_depth: Option<usize>,
}

impl SmartcoreRandomForest {
    /// Decodes the forest from `model_bytes` after deserialization.
    pub fn restore(&mut self) -> Result<(), ModelError> {
        let model: Forest = bincode::deserialize(&self.model_bytes)
            .map_err(|e| ModelError::Backend(format!("cannot decode random forest: {e}")))?;
        self.model = Some(model);
        Ok(())
    }

    fn forest(&self) -> Result<&Forest, ModelError> {
        self.model
            .as_ref()
            .ok_or_else(|| ModelError::Backend("random forest not restored".to_string()))
    }
}

fn dense(rows: &[Vec<f64>], n_features: usize) -> Result<DenseMatrix<f64>, ModelError> {
    let mut flat = Vec::with_capacity(rows.len() * n_features);
    for row in rows {
        if row.len() != n_features {
            return Err(ModelError::Shape {
                expected: n_features,
                got: row.len(),
            });
        }
        flat.extend_from_slice(row);
    }
    Ok(DenseMatrix::new(rows.len(), n_features, flat, false))
}

impl MLModel for SmartcoreRandomForest {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        let mut out = self.predict_batch(&[features.to_vec()])?;
        out.pop()
            .ok_or_else(|| ModelError::Backend("model returned no prediction".to_string()))
    }

    fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let x = dense(rows, self.metadata.feature_names.len())?;
        self.forest()?
            .predict(&x)
            .map_err(|e| ModelError::Backend(format!("random forest prediction failed: {e:?}")))
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
