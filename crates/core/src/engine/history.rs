//! Statistical summaries over recorded yield observations.
//!
//! Every function here is a pure read of an observation snapshot. Persistent
//! stores that cannot push these queries into their own engine delegate here so
//! there is a single definition of each aggregate.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::observation::YieldObservation;

pub use crate::domain::crop::ValueRange;

pub const DEFAULT_BEST_CONDITIONS_LIMIT: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionRanges {
    pub temperature: ValueRange,
    pub rainfall: ValueRange,
    pub humidity: ValueRange,
}

impl ConditionRanges {
    pub fn contains(&self, observation: &YieldObservation) -> bool {
        let conditions = &observation.conditions;
        self.temperature.contains(conditions.temperature)
            && self.rainfall.contains(conditions.rainfall)
            && self.humidity.contains(conditions.humidity)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimalConditionsSummary {
    pub avg_yield: f64,
    pub avg_temperature: f64,
    pub avg_rainfall: f64,
    pub avg_humidity: f64,
    pub avg_soil_ph: f64,
    pub count: usize,
}

/// Borrowed view over observations in storage (append) order.
#[derive(Clone, Copy, Debug)]
pub struct YieldHistory<'a> {
    observations: &'a [YieldObservation],
}

impl<'a> YieldHistory<'a> {
    pub fn new(observations: &'a [YieldObservation]) -> Self {
        Self { observations }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Mean yield for crop, location and season from `since_year` onward.
    /// Zero when nothing matches.
    pub fn average_yield(&self, crop: &str, location: &str, season: &str, since_year: i32) -> f64 {
        let yields: Vec<f64> = self
            .observations
            .iter()
            .filter(|observation| {
                observation.crop_name.0 == crop
                    && observation.location_name.0 == location
                    && observation.season == season
                    && observation.year >= since_year
            })
            .map(|observation| observation.actual_yield)
            .collect();

        mean(&yields).unwrap_or(0.0)
    }

    pub fn max_yield(&self, crop: &str, location: &str) -> Option<f64> {
        self.observations
            .iter()
            .filter(|observation| {
                observation.crop_name.0 == crop && observation.location_name.0 == location
            })
            .map(|observation| observation.actual_yield)
            .max_by(f64::total_cmp)
    }

    /// Highest-yielding observations for `crop` inside `ranges`. Ties keep
    /// storage order.
    pub fn best_conditions(
        &self,
        crop: &str,
        ranges: &ConditionRanges,
        limit: usize,
    ) -> Vec<&'a YieldObservation> {
        let mut matching: Vec<&'a YieldObservation> = self
            .observations
            .iter()
            .filter(|observation| observation.crop_name.0 == crop && ranges.contains(observation))
            .collect();

        // Stable sort keeps storage order among equal yields.
        matching.sort_by(|left, right| right.actual_yield.total_cmp(&left.actual_yield));
        matching.truncate(limit);
        matching
    }

    /// Averages over the crop's observations that beat the crop's own mean.
    /// `None` when the crop has no observations or none exceed the mean.
    pub fn optimal_conditions(&self, crop: &str) -> Option<OptimalConditionsSummary> {
        let for_crop: Vec<&YieldObservation> =
            self.observations.iter().filter(|observation| observation.crop_name.0 == crop).collect();

        let yields: Vec<f64> = for_crop.iter().map(|observation| observation.actual_yield).collect();
        let crop_mean = mean(&yields)?;

        let above: Vec<&YieldObservation> = for_crop
            .into_iter()
            .filter(|observation| observation.actual_yield > crop_mean)
            .collect();
        if above.is_empty() {
            return None;
        }

        let average = |pick: fn(&YieldObservation) -> f64| {
            above.iter().map(|observation| pick(observation)).collect::<CompensatedSum>().mean()
        };

        Some(OptimalConditionsSummary {
            avg_yield: average(|observation| observation.actual_yield),
            avg_temperature: average(|observation| observation.conditions.temperature),
            avg_rainfall: average(|observation| observation.conditions.rainfall),
            avg_humidity: average(|observation| observation.conditions.humidity),
            avg_soil_ph: average(|observation| observation.conditions.soil_ph),
            count: above.len(),
        })
    }

    /// Crop, location and season records, most recent year first.
    pub fn history(&self, crop: &str, location: &str, season: &str) -> Vec<&'a YieldObservation> {
        let mut records: Vec<&'a YieldObservation> = self
            .observations
            .iter()
            .filter(|observation| {
                observation.crop_name.0 == crop
                    && observation.location_name.0 == location
                    && observation.season == season
            })
            .collect();
        records.sort_by(|left, right| right.year.cmp(&left.year).then(left.id.cmp(&right.id)));
        records
    }

    pub fn for_crop(&self, crop: &str) -> Vec<&'a YieldObservation> {
        self.newest_first(|observation| observation.crop_name.0 == crop)
    }

    pub fn for_location(&self, location: &str) -> Vec<&'a YieldObservation> {
        self.newest_first(|observation| observation.location_name.0 == location)
    }

    pub fn farmer_history(&self, farmer_id: &str) -> Vec<&'a YieldObservation> {
        self.newest_first(|observation| observation.farmer_id.as_deref() == Some(farmer_id))
    }

    pub fn distinct_crops(&self) -> Vec<String> {
        self.observations
            .iter()
            .map(|observation| observation.crop_name.0.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn distinct_locations(&self) -> Vec<String> {
        self.observations
            .iter()
            .map(|observation| observation.location_name.0.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn newest_first(
        &self,
        predicate: impl Fn(&YieldObservation) -> bool,
    ) -> Vec<&'a YieldObservation> {
        let mut records: Vec<&'a YieldObservation> =
            self.observations.iter().filter(|observation| predicate(observation)).collect();
        records.sort_by(|left, right| newest_first_order(left, right));
        records
    }
}

fn newest_first_order(left: &YieldObservation, right: &YieldObservation) -> Ordering {
    right.created_at.cmp(&left.created_at).then(right.id.cmp(&left.id))
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().copied().collect::<CompensatedSum>().mean())
    }
}

/// Kahan-Babuska-Neumaier running sum, the same scheme SQLite's `AVG` uses, so
/// in-memory and SQL aggregates agree at the mean boundary.
#[derive(Clone, Copy, Debug, Default)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
    count: usize,
}

impl CompensatedSum {
    fn add(&mut self, value: f64) {
        let total = self.sum + value;
        if self.sum.abs() > value.abs() {
            self.compensation += (self.sum - total) + value;
        } else {
            self.compensation += (value - total) + self.sum;
        }
        self.sum = total;
        self.count += 1;
    }

    fn total(&self) -> f64 {
        if self.compensation.is_nan() {
            self.sum
        } else {
            self.sum + self.compensation
        }
    }

    /// NaN when empty; callers check emptiness first.
    fn mean(&self) -> f64 {
        self.total() / self.count as f64
    }
}

impl FromIterator<f64> for CompensatedSum {
    fn from_iter<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut sum = Self::default();
        for value in values {
            sum.add(value);
        }
        sum
    }
}
