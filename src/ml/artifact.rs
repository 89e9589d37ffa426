//! On-disk model artifact
//!
//! ```json
//! { "kind": "linear",
//!   "metadata": { "model_id": "...", "feature_names": ["LMP", "hour"], ... },
//!   "coefficients": [1.0, 0.0],
//!   "intercept": 1.0 }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::{models::MLModel, LinearRegressionModel, ModelError};

#[cfg(feature = "ml")]
use super::smartcore::SmartcoreRandomForest;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearRegressionModel),
    #[cfg(feature = "ml")]
    RandomForest(SmartcoreRandomForest),
}

impl ModelArtifact {
    pub fn from_json(path: &Path, json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json).map_err(|source| ModelError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks the parameters and hands out a ready model.
    pub fn into_model(self) -> Result<Box<dyn MLModel>, ModelError> {
        match self {
            ModelArtifact::Linear(model) => {
                model.check_shape()?;
                Ok(Box::new(model))
            }
            #[cfg(feature = "ml")]
            ModelArtifact::RandomForest(mut model) => {
                model.restore()?;
                Ok(Box::new(model))
            }
        }
    }
}

/// Reads and validates the model stored at `path`.
pub fn load_model(path: impl AsRef<Path>) -> Result<Box<dyn MLModel>, ModelError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let model = ModelArtifact::from_json(path, &json)?.into_model()?;

    info!(
        path = %path.display(),
        model_id = %model.metadata().model_id,
        model_type = ?model.model_type(),
        features = model.feature_names().len(),
        "loaded model"
    );
    Ok(model)
}
