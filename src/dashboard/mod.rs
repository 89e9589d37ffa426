//! Single-page dashboard
//!
//! The page embeds the price figure and the initial weather figure as Plotly
//! JSON. Changing the dropdown fetches `/api/v1/figures/weather` and redraws
//! the weather chart in place.

pub mod charts;

use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::error;

use crate::domain::WeatherVariable;
use crate::state::AppState;
use charts::weather_figure;

pub const DEFAULT_VARIABLE: WeatherVariable = WeatherVariable::Temperature;

#[derive(Debug, Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub title: String,
    pub location: String,
    pub generated_at: String,
    pub model_id: String,
    pub price_figure_json: String,
    pub weather_figure_json: String,
    pub variables: Vec<VariableOption>,
}

#[derive(Debug)]
pub struct VariableOption {
    pub name: String,
    pub selected: bool,
}

impl VariableOption {
    fn all(selected: WeatherVariable) -> Vec<Self> {
        WeatherVariable::iter()
            .map(|v| Self {
                name: v.to_string(),
                selected: v == selected,
            })
            .collect()
    }
}

/// JSON safe to place inside a `<script>` element
pub fn script_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn render(state: &AppState) -> Result<String, String> {
    let forecast = &state.forecast;
    let weather = weather_figure(&forecast.table, DEFAULT_VARIABLE);

    let template = DashboardTemplate {
        title: "LMP Forecast".to_string(),
        location: forecast.location.clone(),
        generated_at: forecast.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        model_id: forecast.model_id.clone(),
        price_figure_json: script_json(state.price_figure.as_ref()).map_err(|e| e.to_string())?,
        weather_figure_json: script_json(&weather).map_err(|e| e.to_string())?,
        variables: VariableOption::all(DEFAULT_VARIABLE),
    };
    template.render().map_err(|e| e.to_string())
}

pub async fn dashboard_handler(State(state): State<AppState>) -> impl IntoResponse {
    match render(&state) {
        Ok(html) => Html(html),
        Err(e) => {
            error!(error = %e, "Template render error");
            Html(format!("<h1>Error rendering dashboard: {e}</h1>"))
        }
    }
}
