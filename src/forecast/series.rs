//! Hourly time series on a strict grid.
//!
//! Every [`HourlySeries`] holds exactly one slot per hour between its first and
//! last timestamp. Missing hours are `None`, never dropped, so row offsets are
//! hour offsets.

use chrono::{DateTime, Duration, DurationRound};
use chrono_tz::Tz;
use std::collections::BTreeMap;

use super::FeatureError;

#[derive(Debug, Clone, PartialEq)]
pub struct HourlySeries {
    name: String,
    index: Vec<DateTime<Tz>>,
    values: Vec<Option<f64>>,
}

impl HourlySeries {
    /// Series starting at `start` (floored to the hour) with one value per hour.
    pub fn from_values(
        name: impl Into<String>,
        start: DateTime<Tz>,
        values: Vec<Option<f64>>,
    ) -> Result<Self, FeatureError> {
        let start = floor_hour(start)?;
        let index = hourly_range(start, values.len());
        Ok(Self {
            name: name.into(),
            index,
            values,
        })
    }

    /// Buckets irregular observations into hours and averages each bucket.
    ///
    /// Missing observations do not count toward the mean; an hour with no
    /// present value is `None`. The grid runs from the earliest to the latest
    /// occupied hour.
    pub fn resample_mean<I>(name: impl Into<String>, points: I) -> Result<Self, FeatureError>
    where
        I: IntoIterator<Item = (DateTime<Tz>, Option<f64>)>,
    {
        let mut buckets: BTreeMap<DateTime<Tz>, (f64, usize)> = BTreeMap::new();
        for (ts, value) in points {
            let bucket = buckets.entry(floor_hour(ts)?).or_insert((0.0, 0));
            if let Some(v) = value.filter(|v| v.is_finite()) {
                bucket.0 += v;
                bucket.1 += 1;
            }
        }

        let name = name.into();
        let (Some(first), Some(last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
            return Ok(Self {
                name,
                index: Vec::new(),
                values: Vec::new(),
            });
        };

        let len = usize::try_from((*last - *first).num_hours() + 1)
            .map_err(|e| FeatureError::Index(e.to_string()))?;
        let index = hourly_range(*first, len);
        let values = index
            .iter()
            .map(|ts| match buckets.get(ts) {
                Some((sum, n)) if *n > 0 => Some(sum / *n as f64),
                _ => None,
            })
            .collect();

        Ok(Self {
            name,
            index,
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn index(&self) -> &[DateTime<Tz>] {
        &self.index
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn first(&self) -> Option<DateTime<Tz>> {
        self.index.first().copied()
    }

    pub fn last(&self) -> Option<DateTime<Tz>> {
        self.index.last().copied()
    }

    /// Value at an exact grid hour; `None` off-grid, out of range, or missing.
    pub fn value_at(&self, ts: &DateTime<Tz>) -> Option<f64> {
        let first = self.first()?;
        let offset = *ts - first;
        if offset < Duration::zero() || offset != Duration::hours(offset.num_hours()) {
            return None;
        }
        let i = usize::try_from(offset.num_hours()).ok()?;
        self.values.get(i).copied().flatten()
    }

    /// Fills interior runs of at most `max_gap` missing hours by linear
    /// interpolation between the bounding values.
    ///
    /// Longer runs stay missing as a whole. Leading and trailing runs have only
    /// one neighbour and are never filled.
    pub fn interpolate_linear(mut self, max_gap: usize) -> Self {
        let mut prev: Option<(usize, f64)> = None;
        let mut i = 0;
        while i < self.values.len() {
            match self.values[i] {
                Some(v) => {
                    prev = Some((i, v));
                    i += 1;
                }
                None => {
                    let gap_start = i;
                    while i < self.values.len() && self.values[i].is_none() {
                        i += 1;
                    }
                    let gap = i - gap_start;
                    if let (Some((lo, a)), Some(b)) = (prev, self.values.get(i).copied().flatten()) {
                        if gap <= max_gap {
                            let span = (i - lo) as f64;
                            for j in gap_start..i {
                                let t = (j - lo) as f64 / span;
                                self.values[j] = Some(a + (b - a) * t);
                            }
                        }
                    }
                }
            }
        }
        self
    }

}

/// Shift values `periods` rows later, filling the head with `None`.
pub fn shift(values: &[Option<f64>], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| i.checked_sub(periods).and_then(|j| values[j]))
        .collect()
}

pub fn floor_hour(ts: DateTime<Tz>) -> Result<DateTime<Tz>, FeatureError> {
    ts.duration_trunc(Duration::hours(1))
        .map_err(|e| FeatureError::Index(format!("cannot floor {ts} to the hour: {e}")))
}

pub fn hourly_range(start: DateTime<Tz>, len: usize) -> Vec<DateTime<Tz>> {
    (0..len)
        .map(|i| start + Duration::hours(i as i64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Etc::GMTPlus8;

    fn at(h: u32, m: u32) -> DateTime<Tz> {
        Tz::Etc__GMTPlus8
            .with_ymd_and_hms(2024, 6, 1, h, m, 0)
            .unwrap()
    }

    fn series(values: Vec<Option<f64>>) -> HourlySeries {
        HourlySeries::from_values("x", at(0, 0), values).unwrap()
    }

    #[test]
    fn test_resample_one_row_per_hour() {
        let points = vec![
            (at(0, 10), Some(10.0)),
            (at(0, 40), Some(20.0)),
            (at(3, 0), Some(40.0)),
            (at(5, 59), Some(60.0)),
        ];
        let s = HourlySeries::resample_mean("t", points).unwrap();

        assert_eq!(s.len(), 6);
        assert_eq!(s.first(), Some(at(0, 0)));
        assert_eq!(s.last(), Some(at(5, 0)));
        assert_eq!(
            s.values(),
            &[Some(15.0), None, None, Some(40.0), None, Some(60.0)]
        );
        for pair in s.index().windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::hours(1));
        }
    }

    #[test]
    fn test_resample_skips_missing_in_mean() {
        let points = vec![(at(1, 0), None), (at(1, 30), Some(4.0)), (at(2, 0), None)];
        let s = HourlySeries::resample_mean("t", points).unwrap();
        assert_eq!(s.values(), &[Some(4.0), None]);
    }

    #[test]
    fn test_resample_empty() {
        let s = HourlySeries::resample_mean("t", Vec::<(DateTime<Tz>, Option<f64>)>::new()).unwrap();
        assert!(s.is_empty());
        assert_eq!(s.first(), None);
    }

    #[test]
    fn test_interpolate_fills_short_gaps() {
        let s = series(vec![Some(0.0), None, None, None, None, Some(10.0)]).interpolate_linear(4);
        assert_eq!(
            s.values(),
            &[Some(0.0), Some(2.0), Some(4.0), Some(6.0), Some(8.0), Some(10.0)]
        );
    }

    #[test]
    fn test_interpolate_leaves_long_gaps() {
        let values = vec![Some(0.0), None, None, None, None, None, Some(12.0), None, Some(14.0)];
        let s = series(values).interpolate_linear(4);
        assert_eq!(
            s.values(),
            &[Some(0.0), None, None, None, None, None, Some(12.0), Some(13.0), Some(14.0)]
        );
    }

    #[test]
    fn test_interpolate_never_extrapolates() {
        let s = series(vec![None, Some(1.0), None, Some(3.0), None]).interpolate_linear(4);
        assert_eq!(s.values(), &[None, Some(1.0), Some(2.0), Some(3.0), None]);
    }

    #[test]
    fn test_value_at() {
        let s = series(vec![Some(1.0), Some(2.0), None, Some(4.0)]);
        assert_eq!(s.value_at(&at(1, 0)), Some(2.0));
        assert_eq!(s.value_at(&at(1, 30)), None);
        assert_eq!(s.value_at(&at(2, 0)), None);
        assert_eq!(s.value_at(&at(9, 0)), None);

        let utc_same_instant = at(3, 0).with_timezone(&chrono::Utc).with_timezone(&Tz::UTC);
        assert_eq!(s.value_at(&utc_same_instant), Some(4.0));
    }

    #[test]
    fn test_shift() {
        let values = vec![Some(1.0), Some(2.0), None, Some(4.0)];
        assert_eq!(shift(&values, 2), vec![None, None, Some(1.0), Some(2.0)]);
        assert_eq!(shift(&values, 0), values);
        assert_eq!(shift(&values, 10), vec![None; 4]);
    }

    #[test]
    fn test_floor_hour_in_fixed_zone() {
        let ts = GMTPlus8.with_ymd_and_hms(2024, 6, 1, 7, 59, 59).unwrap();
        let floored = floor_hour(ts.with_timezone(&Tz::Etc__GMTPlus8)).unwrap();
        assert_eq!(floored, at(7, 0));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn values() -> impl Strategy<Value = Vec<Option<f64>>> {
            proptest::collection::vec(proptest::option::of(-500.0f64..500.0), 0..120)
        }

        proptest! {
            #[test]
            fn shift_is_an_exact_row_offset(values in values(), lag in 0usize..80) {
                let shifted = shift(&values, lag);
                prop_assert_eq!(shifted.len(), values.len());
                for (i, v) in shifted.iter().enumerate() {
                    if i < lag {
                        prop_assert!(v.is_none());
                    } else {
                        prop_assert_eq!(*v, values[i - lag]);
                    }
                }
            }

            #[test]
            fn interpolation_fills_only_bounded_interior_gaps(values in values(), max_gap in 0usize..6) {
                let filled = series(values.clone()).interpolate_linear(max_gap);
                let out = filled.values();
                prop_assert_eq!(out.len(), values.len());

                let present: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_some()).collect();
                for (i, (before, after)) in values.iter().zip(out).enumerate() {
                    if before.is_some() {
                        prop_assert_eq!(before, after);
                        continue;
                    }
                    let lo = present.iter().rev().find(|&&p| p < i);
                    let hi = present.iter().find(|&&p| p > i);
                    let fillable = match (lo, hi) {
                        (Some(&lo), Some(&hi)) => hi - lo - 1 <= max_gap,
                        _ => false,
                    };
                    prop_assert_eq!(after.is_some(), fillable);
                }
            }
        }
    }
}
