use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use chrono_tz::Tz;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{FetchError, ForecastWindow, HourlySeries};
use crate::config::PricesConfig;
use crate::domain::{Market, PriceObservation, LMP_COLUMN};

/// Source of day-ahead LMP rows for one pricing node.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LmpSource: Send + Sync {
    async fn fetch_lmp(
        &self,
        location: &str,
        window: &ForecastWindow,
    ) -> Result<Vec<LmpRow>, FetchError>;
}

/// One row of the market-data feed. Extra columns (`Energy`, `Congestion`,
/// `Loss`, `Market`) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LmpRow {
    #[serde(rename = "Time")]
    pub time: DateTime<FixedOffset>,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "LMP")]
    pub lmp: f64,
}

/// HTTP client for a gridstatus-shaped LMP feed.
#[derive(Clone)]
pub struct MarketDataClient {
    base_url: String,
    market: Market,
    client: reqwest::Client,
}

impl MarketDataClient {
    pub fn new(cfg: &PricesConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("lmp-forecast/0.1"));
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_seconds))
            .default_headers(headers)
            .build()
            .map_err(|source| FetchError::Request {
                url: cfg.base_url.clone(),
                source,
            })?;
        Ok(Self {
            base_url: cfg.base_url.clone(),
            market: cfg.market,
            client,
        })
    }

    fn url_for(&self, location: &str, window: &ForecastWindow) -> Result<reqwest::Url, FetchError> {
        let base = format!("{}/lmp", self.base_url.trim_end_matches('/'));
        let start = window.start.to_rfc3339_opts(SecondsFormat::Secs, true);
        let end = window.end.to_rfc3339_opts(SecondsFormat::Secs, true);
        reqwest::Url::parse_with_params(
            &base,
            &[
                ("market", self.market.as_ref()),
                ("location", location),
                ("start", start.as_str()),
                ("end", end.as_str()),
            ],
        )
        .map_err(|e| FetchError::Url(format!("{base}: {e}")))
    }
}

#[async_trait]
impl LmpSource for MarketDataClient {
    async fn fetch_lmp(
        &self,
        location: &str,
        window: &ForecastWindow,
    ) -> Result<Vec<LmpRow>, FetchError> {
        let url = self.url_for(location, window)?;
        debug!(%url, "fetching day-ahead LMP");

        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;
        let status = resp.status();
        let body = resp.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

/// Keeps the rows for `location` and converts their timestamps to `tz`.
pub fn observations(rows: Vec<LmpRow>, location: &str, tz: Tz) -> Vec<PriceObservation> {
    rows.into_iter()
        .filter(|r| r.location == location)
        .map(|r| PriceObservation {
            timestamp: r.time.with_timezone(&tz),
            location: r.location,
            lmp: r.lmp,
        })
        .collect()
}

/// Fetches the window for one location as an hourly `LMP` series.
///
/// Rows outside the window are dropped and duplicate hours averaged. Zero
/// rows for the location is an error.
pub async fn fetch_price_series(
    source: &dyn LmpSource,
    location: &str,
    window: &ForecastWindow,
    tz: Tz,
) -> Result<HourlySeries, FetchError> {
    let rows = source.fetch_lmp(location, window).await?;
    let total = rows.len();
    let obs: Vec<_> = observations(rows, location, tz)
        .into_iter()
        .filter(|o| window.contains(&o.timestamp))
        .collect();
    if obs.is_empty() {
        return Err(FetchError::NoRows(location.to_string()));
    }

    let series = HourlySeries::resample_mean(
        LMP_COLUMN,
        obs.into_iter().map(|o| (o.timestamp, Some(o.lmp))),
    )
    .map_err(|e| FetchError::Timestamp(e.to_string()))?;

    info!(
        location,
        rows = total,
        hours = series.len(),
        start = ?series.first(),
        "fetched day-ahead LMP"
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(time: &str, location: &str, lmp: f64) -> LmpRow {
        LmpRow {
            time: DateTime::parse_from_rfc3339(time).unwrap(),
            location: location.to_string(),
            lmp,
        }
    }

    fn window() -> ForecastWindow {
        ForecastWindow::for_horizon(Utc.with_ymd_and_hms(2024, 6, 2, 9, 0, 0).unwrap(), 2)
    }

    #[test]
    fn test_row_deserializes_gridstatus_shape() {
        let json = r#"[{"Time":"2024-06-01T00:00:00-07:00","Interval Start":"2024-06-01T00:00:00-07:00",
            "Market":"DAY_AHEAD_HOURLY","Location":"SHILOH3_7_N002","Location Type":"Node",
            "LMP":31.5,"Energy":30.1,"Congestion":0.0,"Loss":1.4}]"#;
        let rows: Vec<LmpRow> = serde_json::from_str(json).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].location, "SHILOH3_7_N002");
        assert_eq!(rows[0].lmp, 31.5);
    }

    #[test]
    fn test_observations_filter_and_convert() {
        let rows = vec![
            row("2024-06-01T08:00:00Z", "A", 10.0),
            row("2024-06-01T08:00:00Z", "B", 99.0),
        ];
        let obs = observations(rows, "A", Tz::Etc__GMTPlus8);
        assert_eq!(obs.len(), 1);
        assert_eq!(
            obs[0].timestamp,
            Tz::Etc__GMTPlus8.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(obs[0].timestamp.to_rfc3339(), "2024-06-01T00:00:00-08:00");
    }

    #[test]
    fn test_url_carries_window_and_market() {
        let client = MarketDataClient::new(&crate::config::Config::default().prices).unwrap();
        let url = client.url_for("SHILOH3_7_N002", &window()).unwrap();
        let query = url.query().unwrap();
        assert!(url.path().ends_with("/lmp"));
        assert!(query.contains("market=DAY_AHEAD_HOURLY"));
        assert!(query.contains("location=SHILOH3_7_N002"));
        assert!(query.contains("start=2024-06-01T00%3A00%3A00Z"));
        assert!(query.contains("end=2024-06-04T00%3A00%3A00Z"));
    }

    #[tokio::test]
    async fn test_fetch_price_series_from_mock() {
        let mut source = MockLmpSource::new();
        source
            .expect_fetch_lmp()
            .withf(|loc, _| loc == "A")
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    row("2024-06-01T08:00:00Z", "A", 10.0),
                    row("2024-06-01T09:00:00Z", "A", 12.0),
                    row("2024-06-01T11:00:00Z", "A", 14.0),
                    row("2024-06-01T11:00:00Z", "B", 1.0),
                ])
            });

        let series = fetch_price_series(&source, "A", &window(), Tz::Etc__GMTPlus8)
            .await
            .unwrap();
        assert_eq!(series.name(), "LMP");
        assert_eq!(series.values(), &[Some(10.0), Some(12.0), None, Some(14.0)]);
    }

    #[tokio::test]
    async fn test_fetch_price_series_fails_without_rows() {
        let mut source = MockLmpSource::new();
        source
            .expect_fetch_lmp()
            .returning(|_, _| Ok(vec![row("2024-06-01T08:00:00Z", "OTHER", 1.0)]));

        let err = fetch_price_series(&source, "A", &window(), Tz::UTC)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NoRows(loc) if loc == "A"));
    }
}
