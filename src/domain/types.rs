use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

// ============================================================================
// Column Names
// ============================================================================

/// Day-ahead price column, as named by the market-data feed
pub const LMP_COLUMN: &str = "LMP";
/// Model output column
pub const FORECAST_COLUMN: &str = "LMP Forecast";
pub const HOUR_COLUMN: &str = "hour";
pub const MONTH_COLUMN: &str = "month";

/// Name of the lagged price column, e.g. `LMP_lag48`
pub fn lag_column(lag_hours: usize) -> String {
    format!("{LMP_COLUMN}_lag{lag_hours}")
}

/// Name of a per-station weather column, e.g. `temperature_la`
pub fn station_column(variable: WeatherVariable, station: &str) -> String {
    format!("{}_{}", variable.as_ref(), station)
}

// ============================================================================
// Market Data
// ============================================================================

/// Day-ahead market session requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Market {
    DayAheadHourly,
}

/// One hourly LMP observation, normalized to the target time zone
#[derive(Debug, Clone, PartialEq)]
pub struct PriceObservation {
    pub timestamp: DateTime<Tz>,
    pub location: String,
    pub lmp: f64,
}

// ============================================================================
// Weather
// ============================================================================

/// Weather variables extracted from each hourly forecast period
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum WeatherVariable {
    /// Degrees Fahrenheit
    Temperature,
    /// Percent
    RelativeHumidity,
    /// Miles per hour
    WindSpeed,
}

/// Forecast grid cell of the weather service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPoint {
    /// Forecast office code, e.g. `LOX`
    pub office: String,
    pub grid_x: u32,
    pub grid_y: u32,
}

impl GridPoint {
    pub fn new(office: impl Into<String>, grid_x: u32, grid_y: u32) -> Self {
        Self {
            office: office.into(),
            grid_x,
            grid_y,
        }
    }
}

/// One hourly forecast period after unit normalization
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherObservation {
    pub timestamp: DateTime<Tz>,
    pub temperature_f: Option<f64>,
    pub relative_humidity: Option<f64>,
    pub wind_speed_mph: Option<f64>,
}

impl WeatherObservation {
    pub fn value(&self, variable: WeatherVariable) -> Option<f64> {
        match variable {
            WeatherVariable::Temperature => self.temperature_f,
            WeatherVariable::RelativeHumidity => self.relative_humidity,
            WeatherVariable::WindSpeed => self.wind_speed_mph,
        }
    }
}

// ============================================================================
// Feature Assembly
// ============================================================================

/// Which timestamps make up the feature table index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JoinPolicy {
    /// Hours covered by the price series
    #[default]
    Left,
    /// Hours covered by every series
    Inner,
    /// Hours covered by any series
    Outer,
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_weather_variable_names() {
        let names: Vec<String> = WeatherVariable::iter().map(|v| v.to_string()).collect();
        assert_eq!(names, vec!["temperature", "relativeHumidity", "windSpeed"]);
        assert_eq!(
            WeatherVariable::from_str("relativeHumidity").unwrap(),
            WeatherVariable::RelativeHumidity
        );
        assert!(WeatherVariable::from_str("pressure").is_err());
    }

    #[test]
    fn test_column_names() {
        assert_eq!(station_column(WeatherVariable::WindSpeed, "sf"), "windSpeed_sf");
        assert_eq!(lag_column(48), "LMP_lag48");
    }

    #[test]
    fn test_market_wire_name() {
        assert_eq!(Market::DayAheadHourly.as_ref(), "DAY_AHEAD_HOURLY");
        let m: Market = serde_json::from_str("\"DAY_AHEAD_HOURLY\"").unwrap();
        assert_eq!(m, Market::DayAheadHourly);
        assert!(serde_json::from_str::<Market>("\"REAL_TIME_15_MIN\"").is_err());
    }

    #[test]
    fn test_join_policy_default() {
        assert_eq!(JoinPolicy::default(), JoinPolicy::Left);
        let p: JoinPolicy = serde_json::from_str("\"outer\"").unwrap();
        assert_eq!(p, JoinPolicy::Outer);
    }
}
