use std::path::Path;

pub mod export;
pub mod reader;
pub mod roster;
pub mod time_value;

use crate::model::entry::Session;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("no valid timing data: {0}")]
    NoTimingData(String),
}

pub fn load_session(path: &Path) -> Result<Session, InputError> {
    if !path.is_file() {
        return Err(InputError::MissingInput(format!(
            "timing export {} does not exist",
            path.display()
        )));
    }
    let reader = reader::open_maybe_gz(path)?;
    let session = export::parse_timing_export(reader)
        .map_err(|e| match e {
            InputError::NoTimingData(detail) => {
                InputError::NoTimingData(format!("{}: {detail}", path.display()))
            }
            other => other,
        })?;

    tracing::info!(
        path = %path.display(),
        runs = session.runs.len(),
        entries = session.entry_count(),
        splits = session.num_splits,
        "loaded timing export"
    );
    Ok(session)
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
