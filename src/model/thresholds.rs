use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationProfile {
    pub mode: ProfileMode,

    // acceleration split detection
    pub accel_mean_max: f64,
    pub accel_std_max: f64,
    pub accel_relative_window: f64,
    pub min_accel_time: f64,

    // regular splits and finish
    pub z_score: f64,
    pub low_variance_std: f64,
    pub low_variance_widening: f64,
    pub min_split_time: f64,
    pub max_split_time: f64,
    pub min_finish_time: f64,
    pub max_finish_time: f64,

    // ranking cells
    pub accel_opacity: f64,
    pub regular_opacity: f64,

    // session and athlete checks
    pub high_cv_percent: f64,
    pub suspicious_section_sigma: f64,
    pub large_split_change: f64,
    pub large_finish_change: f64,
    pub large_run_average_change: f64,
    pub steady_run_average_change: f64,
    pub consistent_score: f64,
    pub inconsistent_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileMode {
    Standard,
    Strict,
}

impl ProfileMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ProfileMode::Standard => "standard",
            ProfileMode::Strict => "strict",
        }
    }
}

impl ValidationProfile {
    pub fn standard_v1() -> Self {
        Self {
            mode: ProfileMode::Standard,
            accel_mean_max: 5.0,
            accel_std_max: 0.5,
            accel_relative_window: 0.5,
            min_accel_time: 0.5,
            z_score: 2.5,
            low_variance_std: 0.1,
            low_variance_widening: 1.5,
            min_split_time: 3.0,
            max_split_time: 180.0,
            min_finish_time: 3.0,
            max_finish_time: 180.0,
            accel_opacity: 0.6,
            regular_opacity: 0.5,
            high_cv_percent: 15.0,
            suspicious_section_sigma: 2.0,
            large_split_change: 2.0,
            large_finish_change: 3.0,
            large_run_average_change: 2.0,
            steady_run_average_change: 0.5,
            consistent_score: 90.0,
            inconsistent_score: 70.0,
        }
    }

    /// Short training courses: splits above 35 s are treated as timing faults.
    /// Finish bounds keep the standard ceiling.
    pub fn strict_v1() -> Self {
        let mut base = Self::standard_v1();
        base.mode = ProfileMode::Strict;
        base.max_split_time = 35.0;
        base
    }

    pub fn check(&self) -> Result<(), String> {
        if !(self.min_split_time > 0.0 && self.min_split_time < self.max_split_time) {
            return Err(format!(
                "split time window is empty: min {} >= max {}",
                self.min_split_time, self.max_split_time
            ));
        }
        if !(self.min_accel_time > 0.0) {
            return Err("minimum acceleration split time must be positive".to_string());
        }
        if !(self.min_finish_time > 0.0 && self.min_finish_time < self.max_finish_time) {
            return Err(format!(
                "finish time window is empty: min {} >= max {}",
                self.min_finish_time, self.max_finish_time
            ));
        }
        if !(self.suspicious_section_sigma > 0.0) {
            return Err("suspicious section sigma must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/thresholds.rs"]
mod tests;
