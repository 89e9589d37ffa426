//! Batch inference over the feature table

use std::path::Path;
use tracing::{info, warn};

use super::{artifact::load_model, models::MLModel, ModelError, ModelMetadata};
use crate::domain::FORECAST_COLUMN;
use crate::forecast::FeatureTable;

/// Runs one loaded model against assembled feature tables.
pub struct Predictor {
    model: Box<dyn MLModel>,
}

impl Predictor {
    pub fn new(model: Box<dyn MLModel>) -> Self {
        Self { model }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        Ok(Self::new(load_model(path)?))
    }

    pub fn metadata(&self) -> &ModelMetadata {
        self.model.metadata()
    }

    /// Appends `LMP Forecast` to `table` and returns the number of predicted rows.
    ///
    /// Only rows with every model feature present are predicted; the others
    /// stay missing. A table with no complete row gets an all-missing column.
    pub fn predict_table(&self, table: &mut FeatureTable) -> Result<usize, ModelError> {
        let matrix = table.select_complete(self.model.feature_names())?;
        let mut forecast = vec![None; table.len()];

        if matrix.is_empty() {
            warn!(
                rows = table.len(),
                model_id = %self.metadata().model_id,
                "no row has every model feature, forecast is empty"
            );
            table.insert_column(FORECAST_COLUMN, forecast)?;
            return Ok(0);
        }

        let predictions = self.model.predict_batch(&matrix.rows)?;
        if predictions.len() != matrix.len() {
            return Err(ModelError::Shape {
                expected: matrix.len(),
                got: predictions.len(),
            });
        }
        for (&row, value) in matrix.row_indices.iter().zip(predictions) {
            forecast[row] = Some(value);
        }
        table.insert_column(FORECAST_COLUMN, forecast)?;

        info!(
            rows = table.len(),
            predicted = matrix.len(),
            dropped = table.len() - matrix.len(),
            model_id = %self.metadata().model_id,
            "predicted LMP"
        );
        Ok(matrix.len())
    }
}
