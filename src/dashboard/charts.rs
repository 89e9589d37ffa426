//! Plotly figure JSON built from the forecast table
//!
//! Only the subset of the plotly.js schema the dashboard uses is modelled.
//! Missing values serialize as `null`, which plotly draws as a gap.

use serde::Serialize;

use crate::domain::{WeatherVariable, FORECAST_COLUMN, LMP_COLUMN};
use crate::forecast::FeatureTable;

/// Plotly's G10 qualitative palette
pub const G10: [&str; 10] = [
    "#3366CC", "#DC3912", "#FF9900", "#109618", "#990099", "#0099C6", "#DD4477", "#66AA00",
    "#B82E2E", "#316395",
];

const X_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Scatter>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scatter {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    pub x: Vec<String>,
    pub y: Vec<Option<f64>>,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Text,
    pub xaxis: Axis,
    pub yaxis: Axis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: Text,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub text: String,
}

impl Layout {
    fn new(title: &str, y_title: &str) -> Self {
        Self {
            title: Text { text: title.to_string() },
            xaxis: Axis {
                title: Text { text: "Time".to_string() },
            },
            yaxis: Axis {
                title: Text { text: y_title.to_string() },
            },
        }
    }
}

/// Local wall-clock timestamps of the table index
fn x_values(table: &FeatureTable) -> Vec<String> {
    table
        .index()
        .iter()
        .map(|ts| ts.format(X_FORMAT).to_string())
        .collect()
}

fn column_or_gap(table: &FeatureTable, name: &str) -> Vec<Option<f64>> {
    table
        .column(name)
        .map(<[Option<f64>]>::to_vec)
        .unwrap_or_else(|| vec![None; table.len()])
}

/// `LMP Actual` against `LMP Forecast`
pub fn price_figure(table: &FeatureTable) -> Figure {
    let x = x_values(table);
    Figure {
        data: vec![
            Scatter {
                kind: "scatter",
                name: "LMP Actual".to_string(),
                mode: Some("lines"),
                x: x.clone(),
                y: column_or_gap(table, LMP_COLUMN),
                line: Line { color: G10[0] },
            },
            Scatter {
                kind: "scatter",
                name: "LMP Forecast".to_string(),
                mode: None,
                x,
                y: column_or_gap(table, FORECAST_COLUMN),
                line: Line { color: G10[1] },
            },
        ],
        layout: Layout::new("Day-Ahead LMP", "$/MWh"),
    }
}

/// One line per column whose name contains the variable name
pub fn weather_figure(table: &FeatureTable, variable: WeatherVariable) -> Figure {
    let x = x_values(table);
    let data = table
        .columns_matching(variable.as_ref())
        .enumerate()
        .map(|(i, col)| Scatter {
            kind: "scatter",
            name: col.name.clone(),
            mode: Some("lines"),
            x: x.clone(),
            y: col.values.clone(),
            line: Line {
                color: G10[i % G10.len()],
            },
        })
        .collect();

    Figure {
        data,
        layout: Layout::new(variable.as_ref(), unit_label(variable)),
    }
}

fn unit_label(variable: WeatherVariable) -> &'static str {
    match variable {
        WeatherVariable::Temperature => "°F",
        WeatherVariable::RelativeHumidity => "%",
        WeatherVariable::WindSpeed => "mph",
    }
}
