//! Hourly weather forecasts from the weather.gov gridpoint API
//!
//! Each configured station is a forecast grid cell. Its hourly periods are
//! reduced to three variables, resampled onto an hourly grid and gap-filled
//! over short outages only.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::Deserialize;
use std::{collections::BTreeMap, time::Duration};
use strum::IntoEnumIterator;
use tracing::{debug, info};

use super::{FetchError, ForecastWindow, HourlySeries};
use crate::config::WeatherConfig;
use crate::domain::{station_column, GridPoint, WeatherObservation, WeatherVariable};

/// Source of hourly forecast periods for one grid cell.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn hourly_forecast(&self, grid: &GridPoint) -> Result<Vec<ForecastPeriod>, FetchError>;
}

/// One period of `properties.periods` in the hourly forecast document
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPeriod {
    pub start_time: DateTime<FixedOffset>,
    pub temperature: Option<f64>,
    #[serde(default)]
    pub temperature_unit: Option<String>,
    #[serde(default)]
    pub relative_humidity: Option<QuantitativeValue>,
    /// e.g. `"12 mph"`
    pub wind_speed: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantitativeValue {
    #[serde(default)]
    pub unit_code: Option<String>,
    pub value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HourlyForecastResponse {
    properties: HourlyForecastProperties,
}

#[derive(Debug, Deserialize)]
struct HourlyForecastProperties {
    periods: Vec<ForecastPeriod>,
}

/// weather.gov API client
pub struct NwsClient {
    client: reqwest::Client,
    base_url: String,
}

impl NwsClient {
    pub fn new(cfg: &WeatherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&cfg.user_agent)
            .map_err(|e| FetchError::Url(format!("bad user agent {:?}: {e}", cfg.user_agent)))?;
        headers.insert(USER_AGENT, agent);
        headers.insert(ACCEPT, HeaderValue::from_static("application/geo+json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_seconds))
            .default_headers(headers)
            .build()
            .map_err(|source| FetchError::Request {
                url: cfg.base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: cfg.base_url.clone(),
        })
    }
}

#[async_trait]
impl WeatherSource for NwsClient {
    async fn hourly_forecast(&self, grid: &GridPoint) -> Result<Vec<ForecastPeriod>, FetchError> {
        let url = gridpoint_url(&self.base_url, grid);
        debug!(%url, "fetching hourly forecast");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;
        let status = resp.status();
        let body = resp.text().await.map_err(|source| FetchError::Request {
            url: url.clone(),
            source,
        })?;
        if !status.is_success() {
            return Err(FetchError::Status { url, status, body });
        }

        let parsed: HourlyForecastResponse =
            serde_json::from_str(&body).map_err(|source| FetchError::Decode { url, source })?;
        Ok(parsed.properties.periods)
    }
}

pub fn gridpoint_url(base_url: &str, grid: &GridPoint) -> String {
    format!(
        "{}/gridpoints/{}/{},{}/forecast/hourly",
        base_url.trim_end_matches('/'),
        grid.office,
        grid.grid_x,
        grid.grid_y
    )
}

/// Parses `"<number> mph"`. Any other unit is rejected.
pub fn parse_wind_speed(raw: &str) -> Result<f64, FetchError> {
    raw.trim()
        .strip_suffix("mph")
        .map(str::trim)
        .and_then(|n| n.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| FetchError::WindSpeed(raw.to_string()))
}

fn temperature_f(value: Option<f64>, unit: Option<&str>) -> Result<Option<f64>, FetchError> {
    match unit {
        None | Some("F") => Ok(value),
        Some("C") => Ok(value.map(|c| c * 9.0 / 5.0 + 32.0)),
        Some(other) => Err(FetchError::TemperatureUnit(other.to_string())),
    }
}

/// Unwraps nested values, parses units and moves the timestamp into `tz`.
pub fn normalize_period(period: &ForecastPeriod, tz: Tz) -> Result<WeatherObservation, FetchError> {
    Ok(WeatherObservation {
        timestamp: period.start_time.with_timezone(&tz),
        temperature_f: temperature_f(period.temperature, period.temperature_unit.as_deref())?,
        relative_humidity: period.relative_humidity.as_ref().and_then(|q| q.value),
        wind_speed_mph: Some(parse_wind_speed(&period.wind_speed)?),
    })
}

/// Turns one station's periods into one hourly series per variable.
///
/// Periods at or after the window end are dropped before resampling.
pub fn station_series(
    station: &str,
    periods: &[ForecastPeriod],
    window: &ForecastWindow,
    tz: Tz,
    max_gap_hours: usize,
) -> Result<Vec<HourlySeries>, FetchError> {
    let observations = periods
        .iter()
        .map(|p| normalize_period(p, tz))
        .collect::<Result<Vec<_>, _>>()?;
    let cutoff = window.end.with_timezone(&tz);
    let observations: Vec<_> = observations
        .into_iter()
        .filter(|o| o.timestamp < cutoff)
        .collect();

    WeatherVariable::iter()
        .map(|variable| {
            let points = observations.iter().map(|o| (o.timestamp, o.value(variable)));
            HourlySeries::resample_mean(station_column(variable, station), points)
                .map(|s| s.interpolate_linear(max_gap_hours))
                .map_err(|e| FetchError::Timestamp(e.to_string()))
        })
        .collect()
}

/// Fetches every station in name order, one request at a time.
pub async fn fetch_station_weather(
    source: &dyn WeatherSource,
    stations: &BTreeMap<String, GridPoint>,
    window: &ForecastWindow,
    tz: Tz,
    max_gap_hours: usize,
) -> Result<Vec<HourlySeries>, FetchError> {
    let mut all = Vec::with_capacity(stations.len() * 3);
    for (station, grid) in stations {
        let periods = source.hourly_forecast(grid).await?;
        let series = station_series(station, &periods, window, tz, max_gap_hours)?;
        info!(
            station = %station,
            office = %grid.office,
            periods = periods.len(),
            hours = series.first().map(HourlySeries::len).unwrap_or(0),
            "fetched hourly weather forecast"
        );
        all.extend(series);
    }
    Ok(all)
}
