pub mod json;
pub mod palette;
pub mod text;

use serde::Serialize;

/// Labels and provenance shared by every rendered output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportMeta {
    pub tool: String,
    pub version: String,
    pub input: String,
    pub profile: String,
    pub title: Option<String>,
    pub session: Option<String>,
    pub event: Option<String>,
}

impl ReportMeta {
    pub fn heading(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| "Training Session Timing Report".to_string())
    }
}

/// Sub-second values keep milliseconds, minutes render as `M:SS.ss`.
pub fn format_time(seconds: f64) -> String {
    if seconds < 1.0 {
        return format!("{seconds:.3}");
    }
    if seconds < 60.0 {
        return format!("{seconds:.2}");
    }
    let centis = (seconds * 100.0).round() as u64;
    let minutes = centis / 6000;
    let rem = centis % 6000;
    format!("{}:{:02}.{:02}", minutes, rem / 100, rem % 100)
}

/// Signed difference using the same precision rules as [`format_time`].
pub fn format_diff(diff: f64) -> String {
    let sign = if diff < 0.0 { '-' } else { '+' };
    format!("{sign}{}", format_time(diff.abs()))
}

pub fn format_opt_time(value: Option<f64>) -> String {
    value.map(format_time).unwrap_or_default()
}

pub fn format_opt_f64(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_default()
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
