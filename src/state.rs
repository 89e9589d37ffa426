use std::sync::Arc;

use crate::config::Config;
use crate::dashboard::charts::{price_figure, Figure};
use crate::forecast::ForecastResult;

/// Shared, read-only state handed to every request handler.
///
/// The forecast is computed once before the server starts; handlers only
/// read it, so no locking is needed.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub forecast: Arc<ForecastResult>,
    /// Built once; the price chart never changes after startup
    pub price_figure: Arc<Figure>,
}

impl AppState {
    pub fn new(config: Config, forecast: ForecastResult) -> Self {
        let price_figure = price_figure(&forecast.table);
        Self {
            config: Arc::new(config),
            forecast: Arc::new(forecast),
            price_figure: Arc::new(price_figure),
        }
    }
}
