//! Feature table assembly
//!
//! Joins the price series and every station's weather series onto one hourly
//! index, then derives calendar and lag features from it.

use chrono::{DateTime, Datelike, Timelike};
use chrono_tz::Tz;
use tracing::debug;

use super::series::{hourly_range, shift};
use super::{FeatureError, HourlySeries};
use crate::domain::{lag_column, JoinPolicy, HOUR_COLUMN, LMP_COLUMN, MONTH_COLUMN};

/// One named column of the feature table
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Wide table keyed by a contiguous hourly index. Column order is insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    index: Vec<DateTime<Tz>>,
    columns: Vec<Column>,
}

/// Complete rows of a column selection
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub feature_names: Vec<String>,
    /// Table row each matrix row came from
    pub row_indices: Vec<usize>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FeatureTable {
    /// Joins `series` on the hourly index chosen by `policy`.
    ///
    /// The first series anchors [`JoinPolicy::Left`]. Empty series take no
    /// part in picking the index but still get a column.
    pub fn join(series: &[HourlySeries], policy: JoinPolicy) -> Result<Self, FeatureError> {
        let index = match join_range(series, policy) {
            Some((first, last)) => {
                let len = usize::try_from((last - first).num_hours() + 1)
                    .map_err(|e| FeatureError::Index(e.to_string()))?;
                hourly_range(first, len)
            }
            None => Vec::new(),
        };

        let mut table = Self {
            index,
            columns: Vec::with_capacity(series.len()),
        };
        for s in series {
            let values = table.index.iter().map(|ts| s.value_at(ts)).collect();
            table.insert_column(s.name(), values)?;
        }
        Ok(table)
    }

    pub fn index(&self) -> &[DateTime<Tz>] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Columns whose name contains `needle`, in table order.
    pub fn columns_matching<'a>(&'a self, needle: &'a str) -> impl Iterator<Item = &'a Column> {
        self.columns.iter().filter(move |c| c.name.contains(needle))
    }

    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), FeatureError> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(FeatureError::LengthMismatch {
                name,
                expected: self.index.len(),
                got: values.len(),
            });
        }
        if self.column(&name).is_some() {
            return Err(FeatureError::DuplicateColumn(name));
        }
        self.columns.push(Column { name, values });
        Ok(())
    }

    /// `hour` (0-23) and `month` (1-12) of each index timestamp, in the index zone.
    pub fn add_calendar_features(&mut self) -> Result<(), FeatureError> {
        let hours = self.index.iter().map(|ts| Some(f64::from(ts.hour()))).collect();
        let months = self.index.iter().map(|ts| Some(f64::from(ts.month()))).collect();
        self.insert_column(HOUR_COLUMN, hours)?;
        self.insert_column(MONTH_COLUMN, months)
    }

    /// Adds `{source}_lag{lag}` holding `source` shifted `lag` rows later.
    pub fn add_lag_feature(&mut self, source: &str, lag: usize) -> Result<String, FeatureError> {
        let values = self
            .column(source)
            .ok_or_else(|| FeatureError::MissingColumns(vec![source.to_string()]))?;
        let lagged = shift(values, lag);
        let name = if source == LMP_COLUMN {
            lag_column(lag)
        } else {
            format!("{source}_lag{lag}")
        };
        self.insert_column(name.clone(), lagged)?;
        Ok(name)
    }

    /// Selects `names` in the given order and keeps only rows where every
    /// selected value is present.
    pub fn select_complete(&self, names: &[String]) -> Result<FeatureMatrix, FeatureError> {
        let missing: Vec<String> = names
            .iter()
            .filter(|n| self.column(n).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(FeatureError::MissingColumns(missing));
        }

        let selected: Vec<&[Option<f64>]> = names.iter().filter_map(|n| self.column(n)).collect();
        let mut row_indices = Vec::new();
        let mut rows = Vec::new();
        for i in 0..self.len() {
            let row: Option<Vec<f64>> = selected.iter().map(|col| col[i]).collect();
            if let Some(row) = row {
                row_indices.push(i);
                rows.push(row);
            }
        }

        Ok(FeatureMatrix {
            feature_names: names.to_vec(),
            row_indices,
            rows,
        })
    }
}

fn join_range(series: &[HourlySeries], policy: JoinPolicy) -> Option<(DateTime<Tz>, DateTime<Tz>)> {
    let ranges = series.iter().filter_map(|s| Some((s.first()?, s.last()?)));
    match policy {
        JoinPolicy::Left => series.first().and_then(|s| Some((s.first()?, s.last()?))),
        JoinPolicy::Inner => {
            let (first, last) = ranges.reduce(|(af, al), (f, l)| (af.max(f), al.min(l)))?;
            (first <= last).then_some((first, last))
        }
        JoinPolicy::Outer => ranges.reduce(|(af, al), (f, l)| (af.min(f), al.max(l))),
    }
}

/// Builds the model-ready table from the fetched series.
#[derive(Debug, Clone, Copy)]
pub struct FeatureAssembler {
    pub policy: JoinPolicy,
    pub lag_hours: usize,
}

impl FeatureAssembler {
    pub fn new(policy: JoinPolicy, lag_hours: usize) -> Self {
        Self { policy, lag_hours }
    }

    /// `LMP`, then every weather column, then `hour`, `month`, `LMP_lag{n}`.
    pub fn assemble(
        &self,
        price: HourlySeries,
        weather: Vec<HourlySeries>,
    ) -> Result<FeatureTable, FeatureError> {
        let mut series = Vec::with_capacity(weather.len() + 1);
        series.push(price.with_name(LMP_COLUMN));
        series.extend(weather);

        let mut table = FeatureTable::join(&series, self.policy)?;
        table.add_calendar_features()?;
        let lag = table.add_lag_feature(LMP_COLUMN, self.lag_hours)?;

        debug!(
            rows = table.len(),
            columns = table.columns().len(),
            policy = %self.policy,
            lag = %lag,
            first = ?table.index().first(),
            "assembled feature table"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32, hour: u32) -> DateTime<Tz> {
        Tz::Etc__GMTPlus8
            .with_ymd_and_hms(2024, 6, day, hour, 0, 0)
            .unwrap()
    }

    fn series(name: &str, start: DateTime<Tz>, values: &[f64]) -> HourlySeries {
        HourlySeries::from_values(name, start, values.iter().copied().map(Some).collect()).unwrap()
    }

    #[test]
    fn test_left_join_keeps_price_hours() {
        let price = series("LMP", ts(1, 0), &[1.0, 2.0, 3.0, 4.0]);
        let weather = series("temperature_la", ts(1, 2), &[60.0, 61.0, 62.0, 63.0]);

        let table = FeatureTable::join(&[price, weather], JoinPolicy::Left).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.index()[0], ts(1, 0));
        assert_eq!(
            table.column("temperature_la").unwrap(),
            &[None, None, Some(60.0), Some(61.0)]
        );
    }

    #[test]
    fn test_inner_and_outer_join() {
        let price = series("LMP", ts(1, 0), &[1.0, 2.0, 3.0, 4.0]);
        let weather = series("temperature_la", ts(1, 2), &[60.0, 61.0, 62.0, 63.0]);
        let both = [price, weather];

        let inner = FeatureTable::join(&both, JoinPolicy::Inner).unwrap();
        assert_eq!(inner.index(), &[ts(1, 2), ts(1, 3)]);
        assert_eq!(inner.column("LMP").unwrap(), &[Some(3.0), Some(4.0)]);

        let outer = FeatureTable::join(&both, JoinPolicy::Outer).unwrap();
        assert_eq!(outer.len(), 6);
        assert_eq!(outer.column("LMP").unwrap()[4], None);
        assert_eq!(outer.column("temperature_la").unwrap()[5], Some(63.0));
    }

    #[test]
    fn test_inner_join_without_overlap_is_empty() {
        let price = series("LMP", ts(1, 0), &[1.0]);
        let weather = series("temperature_la", ts(2, 0), &[60.0]);
        let table = FeatureTable::join(&[price, weather], JoinPolicy::Inner).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 2);
    }

    #[test]
    fn test_calendar_features_use_index_zone() {
        // 2024-06-30 23:00 at UTC-8 is already July in UTC
        let price = series("LMP", ts(30, 23), &[5.0]);
        let mut table = FeatureTable::join(&[price], JoinPolicy::Left).unwrap();
        table.add_calendar_features().unwrap();
        assert_eq!(table.column("hour").unwrap(), &[Some(23.0)]);
        assert_eq!(table.column("month").unwrap(), &[Some(6.0)]);
    }

    #[test]
    fn test_lag_feature() {
        let values: Vec<f64> = (0..100u32).map(f64::from).collect();
        let price = series("LMP", ts(1, 0), &values);
        let mut table = FeatureTable::join(&[price], JoinPolicy::Left).unwrap();
        let name = table.add_lag_feature("LMP", 48).unwrap();
        assert_eq!(name, "LMP_lag48");

        let lag = table.column("LMP_lag48").unwrap();
        let lmp = table.column("LMP").unwrap();
        assert!(lag[..48].iter().all(Option::is_none));
        for i in 48..100 {
            assert_eq!(lag[i], lmp[i - 48]);
        }
    }

    #[test]
    fn test_duplicate_and_length_checks() {
        let price = series("LMP", ts(1, 0), &[1.0, 2.0]);
        let mut table = FeatureTable::join(&[price], JoinPolicy::Left).unwrap();
        assert_eq!(
            table.insert_column("LMP", vec![None, None]),
            Err(FeatureError::DuplicateColumn("LMP".to_string()))
        );
        assert!(matches!(
            table.insert_column("x", vec![None]),
            Err(FeatureError::LengthMismatch { expected: 2, got: 1, .. })
        ));
    }

    #[test]
    fn test_select_complete_drops_incomplete_rows() {
        let price = series("LMP", ts(1, 0), &[1.0, 2.0, 3.0, 4.0]);
        let weather = HourlySeries::from_values(
            "windSpeed_sd",
            ts(1, 0),
            vec![Some(5.0), None, Some(7.0), Some(8.0)],
        )
        .unwrap();
        let table = FeatureTable::join(&[price, weather], JoinPolicy::Left).unwrap();

        let names = vec!["windSpeed_sd".to_string(), "LMP".to_string()];
        let m = table.select_complete(&names).unwrap();
        assert_eq!(m.row_indices, vec![0, 2, 3]);
        assert_eq!(m.rows[1], vec![7.0, 3.0]);
        assert_eq!(m.len(), table.len() - 1);

        let err = table
            .select_complete(&["LMP".to_string(), "humidity".to_string()])
            .unwrap_err();
        assert_eq!(err, FeatureError::MissingColumns(vec!["humidity".to_string()]));
    }

    #[test]
    fn test_assemble_column_set() {
        let price = series("prices", ts(1, 0), &[1.0, 2.0, 3.0]);
        let weather = vec![
            series("temperature_la", ts(1, 0), &[60.0, 61.0, 62.0]),
            series("windSpeed_la", ts(1, 0), &[3.0, 4.0, 5.0]),
        ];
        let table = FeatureAssembler::new(JoinPolicy::Left, 2)
            .assemble(price, weather)
            .unwrap();

        let names: Vec<&str> = table.column_names().collect();
        assert_eq!(
            names,
            vec!["LMP", "temperature_la", "windSpeed_la", "hour", "month", "LMP_lag2"]
        );
        assert_eq!(table.column("LMP_lag2").unwrap(), &[None, None, Some(1.0)]);
        assert_eq!(table.columns_matching("temperature").count(), 1);
        assert_eq!(table.columns_matching("LMP").count(), 2);
    }
}
