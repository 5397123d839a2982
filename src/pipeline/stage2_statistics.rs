use serde::Serialize;

use crate::model::entry::{Column, Run, recorded};
use crate::model::thresholds::ValidationProfile;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitStatistics {
    pub column: Column,
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub is_acceleration_split: bool,
    pub bounds: Bounds,
}

impl SplitStatistics {
    pub fn coefficient_of_variation(&self) -> Option<f64> {
        (self.mean > 0.0).then(|| self.std_dev / self.mean * 100.0)
    }
}

/// Bounds for one run. Never reused for another run: bounds are only
/// meaningful against the entries they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStatistics {
    pub run_id: u32,
    pub splits: Vec<Option<SplitStatistics>>,
    pub finish: Option<SplitStatistics>,
}

impl RunStatistics {
    pub fn split(&self, idx: usize) -> Option<&SplitStatistics> {
        self.splits.get(idx).and_then(|s| s.as_ref())
    }

    pub fn column(&self, column: Column) -> Option<&SplitStatistics> {
        match column {
            Column::Split(idx) => self.split(idx),
            Column::Finish => self.finish.as_ref(),
        }
    }

    pub fn is_acceleration(&self, column: Column) -> bool {
        self.column(column)
            .is_some_and(|s| s.is_acceleration_split)
    }
}

pub fn run_stage2(run: &Run, num_splits: usize, profile: &ValidationProfile) -> RunStatistics {
    let sampled = run
        .entries
        .iter()
        .filter(|e| e.status.is_valid())
        .collect::<Vec<_>>();

    let mut splits = Vec::with_capacity(num_splits);
    for idx in 0..num_splits {
        let values = sampled
            .iter()
            .filter_map(|e| recorded(e.split(idx)))
            .collect::<Vec<_>>();
        splits.push(split_statistics(idx, &values, profile));
    }

    let finish_values = sampled
        .iter()
        .filter_map(|e| recorded(e.finish))
        .collect::<Vec<_>>();
    let finish = finish_statistics(&finish_values, profile);

    RunStatistics {
        run_id: run.id,
        splits,
        finish,
    }
}

/// Mean and population standard deviation.
pub fn sample_moments(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

pub fn split_statistics(
    idx: usize,
    values: &[f64],
    profile: &ValidationProfile,
) -> Option<SplitStatistics> {
    let (mean, std_dev) = sample_moments(values)?;
    let is_acceleration_split = mean < profile.accel_mean_max && std_dev < profile.accel_std_max;
    let bounds = if is_acceleration_split {
        acceleration_bounds(mean, profile)
    } else {
        adaptive_bounds(
            mean,
            std_dev,
            profile.min_split_time,
            profile.max_split_time,
            profile,
        )
    };
    Some(build(Column::Split(idx), values, mean, std_dev, is_acceleration_split, bounds))
}

pub fn finish_statistics(values: &[f64], profile: &ValidationProfile) -> Option<SplitStatistics> {
    let (mean, std_dev) = sample_moments(values)?;
    let bounds = adaptive_bounds(
        mean,
        std_dev,
        profile.min_finish_time,
        profile.max_finish_time,
        profile,
    );
    Some(build(Column::Finish, values, mean, std_dev, false, bounds))
}

/// Relative window around the mean; start gates cluster near zero, where a
/// z-score band is meaningless.
pub fn acceleration_bounds(mean: f64, profile: &ValidationProfile) -> Bounds {
    let w = profile.accel_relative_window;
    Bounds {
        lower: (mean * (1.0 - w)).max(profile.min_accel_time),
        upper: mean * (1.0 + w),
    }
}

/// z-score band clamped to `[min_allowed, max_allowed]`.
///
/// Known limitation: the sample still contains the outliers it is meant to
/// catch, so a single wild value inflates the band.
pub fn adaptive_bounds(
    mean: f64,
    std_dev: f64,
    min_allowed: f64,
    max_allowed: f64,
    profile: &ValidationProfile,
) -> Bounds {
    let z = if std_dev < profile.low_variance_std {
        profile.z_score * profile.low_variance_widening
    } else {
        profile.z_score
    };
    Bounds {
        lower: (mean - z * std_dev).max(min_allowed),
        upper: (mean + z * std_dev).min(max_allowed),
    }
}

fn build(
    column: Column,
    values: &[f64],
    mean: f64,
    std_dev: f64,
    is_acceleration_split: bool,
    bounds: Bounds,
) -> SplitStatistics {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    SplitStatistics {
        column,
        count: values.len(),
        mean,
        std_dev,
        min,
        max,
        is_acceleration_split,
        bounds,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_statistics.rs"]
mod tests;
