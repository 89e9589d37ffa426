use thiserror::Error;

/// Failures while pulling price or weather data from a provider.
///
/// None of these are retried; the pipeline fails fast.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure (connect, timeout, TLS).
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with a non-success status.
    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    /// The body did not match the expected document shape.
    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid url: {0}")]
    Url(String),

    #[error("no LMP rows for location {0}")]
    NoRows(String),

    #[error("unrecognized wind speed {0:?}, expected \"<number> mph\"")]
    WindSpeed(String),

    #[error("unsupported temperature unit {0:?}")]
    TemperatureUnit(String),

    #[error("invalid timestamp: {0}")]
    Timestamp(String),
}

/// Failures while shaping series into the feature table.
#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("duplicate column {0}")]
    DuplicateColumn(String),

    #[error("column {name} has {got} values, table has {expected} rows")]
    LengthMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("time index error: {0}")]
    Index(String),
}
