use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::BTreeMap;
use tracing::info;

use super::{
    fetch_price_series, fetch_station_weather, FeatureAssembler, FeatureTable, ForecastWindow,
    LmpSource, MarketDataClient, NwsClient, WeatherSource,
};
use crate::config::Config;
use crate::domain::{GridPoint, JoinPolicy};
use crate::ml::Predictor;

/// Pipeline parameters taken from configuration
#[derive(Debug, Clone)]
pub struct ForecastSettings {
    pub location: String,
    pub stations: BTreeMap<String, GridPoint>,
    pub horizon_days: u32,
    pub tz: Tz,
    pub max_interp_hours: usize,
    pub lag_hours: usize,
    pub join_policy: JoinPolicy,
}

impl ForecastSettings {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self {
            location: cfg.prices.location.clone(),
            stations: cfg.weather.stations.clone(),
            horizon_days: cfg.forecast.horizon_days,
            tz: cfg.forecast.tz()?,
            max_interp_hours: cfg.forecast.max_interp_hours,
            lag_hours: cfg.forecast.lag_hours,
            join_policy: cfg.forecast.join_policy,
        })
    }
}

/// Everything one pipeline run produced. Immutable once built.
#[derive(Debug, Clone)]
pub struct ForecastResult {
    pub generated_at: DateTime<Utc>,
    pub window: ForecastWindow,
    pub location: String,
    pub model_id: String,
    pub predicted_rows: usize,
    pub table: FeatureTable,
}

pub struct ForecastEngine {
    pub prices: Box<dyn LmpSource>,
    pub weather: Box<dyn WeatherSource>,
    pub predictor: Predictor,
    pub settings: ForecastSettings,
}

impl ForecastEngine {
    pub fn new(
        prices: Box<dyn LmpSource>,
        weather: Box<dyn WeatherSource>,
        predictor: Predictor,
        settings: ForecastSettings,
    ) -> Self {
        Self {
            prices,
            weather,
            predictor,
            settings,
        }
    }

    /// HTTP clients and the model file named by `cfg`.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let prices = MarketDataClient::new(&cfg.prices).context("building market data client")?;
        let weather = NwsClient::new(&cfg.weather).context("building weather client")?;
        let predictor = Predictor::from_path(&cfg.model.path)
            .with_context(|| format!("loading model from {}", cfg.model.path.display()))?;
        Ok(Self::new(
            Box::new(prices),
            Box::new(weather),
            predictor,
            ForecastSettings::from_config(cfg)?,
        ))
    }

    /// Fetch, assemble and predict for the window around `now`.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<ForecastResult> {
        let s = &self.settings;
        let window = ForecastWindow::for_horizon(now, s.horizon_days);
        info!(
            start = %window.start,
            end = %window.end,
            hours = window.hours(),
            location = %s.location,
            stations = s.stations.len(),
            "starting forecast run"
        );

        let price = fetch_price_series(self.prices.as_ref(), &s.location, &window, s.tz)
            .await
            .context("fetching LMP")?;
        let weather = fetch_station_weather(
            self.weather.as_ref(),
            &s.stations,
            &window,
            s.tz,
            s.max_interp_hours,
        )
        .await
        .context("fetching weather")?;

        let mut table = FeatureAssembler::new(s.join_policy, s.lag_hours)
            .assemble(price, weather)
            .context("assembling features")?;
        let predicted_rows = self
            .predictor
            .predict_table(&mut table)
            .context("predicting LMP")?;

        info!(
            rows = table.len(),
            predicted = predicted_rows,
            "forecast run complete"
        );
        Ok(ForecastResult {
            generated_at: now,
            window,
            location: s.location.clone(),
            model_id: self.predictor.metadata().model_id.clone(),
            predicted_rows,
            table,
        })
    }
}
