use crate::model::entry::TimeValue;

const NO_TIME_TOKENS: &[&str] = &["DNF", "DSQ", "DNS", "", "0"];

/// Parses a time cell into seconds.
///
/// Accepts `SS.fff` or `M:SS.fff`. Status sentinels, blanks, the literal `0`
/// and anything malformed yield `None`; this never fails the ingestion.
pub fn parse_time_value(token: &str) -> TimeValue {
    let token = token.trim();
    let upper = token.to_ascii_uppercase();
    if NO_TIME_TOKENS.contains(&upper.as_str()) {
        return None;
    }

    match token.split_once(':') {
        Some((minutes, seconds)) => {
            if seconds.contains(':') {
                return None;
            }
            let minutes = parse_component(minutes)?;
            let seconds = parse_component(seconds)?;
            let total = minutes * 60.0 + seconds;
            total.is_finite().then_some(total)
        }
        None => parse_component(token),
    }
}

// Digits and a decimal point only: rejects signs, exponents, inf and NaN.
fn parse_component(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let value = raw.parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/time_value.rs"]
mod tests;
