use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{
    api::error::ApiError,
    dashboard::{
        charts::{weather_figure, Figure},
        DEFAULT_VARIABLE,
    },
    domain::WeatherVariable,
    forecast::ForecastWindow,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/figures/price", get(get_price_figure))
        .route("/figures/weather", get(get_weather_figure))
        .route("/forecast", get(get_forecast))
}

/// GET /api/v1/figures/price
pub async fn get_price_figure(State(st): State<AppState>) -> Json<Figure> {
    Json(st.price_figure.as_ref().clone())
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub variable: Option<String>,
}

/// GET /api/v1/figures/weather?variable=windSpeed
pub async fn get_weather_figure(
    State(st): State<AppState>,
    Query(q): Query<WeatherQuery>,
) -> Result<Json<Figure>, ApiError> {
    let variable = match q.variable.as_deref() {
        None => DEFAULT_VARIABLE,
        Some(name) => WeatherVariable::from_str(name)
            .map_err(|_| ApiError::BadRequest(format!("unknown weather variable {name:?}")))?,
    };
    Ok(Json(weather_figure(&st.forecast.table, variable)))
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub generated_at: DateTime<Utc>,
    pub window: ForecastWindow,
    pub location: String,
    pub model_id: String,
    pub predicted_rows: usize,
    pub columns: Vec<String>,
    pub rows: Vec<ForecastRow>,
}

/// One table row; `values` follows `columns`
#[derive(Debug, Serialize)]
pub struct ForecastRow {
    pub timestamp: String,
    pub values: Vec<Option<f64>>,
}

/// GET /api/v1/forecast
pub async fn get_forecast(State(st): State<AppState>) -> Json<ForecastResponse> {
    let f = st.forecast.as_ref();
    let table = &f.table;
    let rows = table
        .index()
        .iter()
        .enumerate()
        .map(|(i, ts)| ForecastRow {
            timestamp: ts.to_rfc3339(),
            values: table.columns().iter().map(|c| c.values[i]).collect(),
        })
        .collect();

    Json(ForecastResponse {
        generated_at: f.generated_at,
        window: f.window,
        location: f.location.clone(),
        model_id: f.model_id.clone(),
        predicted_rows: f.predicted_rows,
        columns: table.column_names().map(str::to_string).collect(),
        rows,
    })
}
