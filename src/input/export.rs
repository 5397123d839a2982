use std::collections::BTreeMap;
use std::io::BufRead;

use crate::input::InputError;
use crate::input::reader::read_line_lossy;
use crate::input::time_value::parse_time_value;
use crate::model::entry::{EntryStatus, Run, RunEntry, Session, normalize_bib};

pub const FIELD_SEPARATOR: char = '>';
const HEADER_MARKER: &str = "Bib#";

/// Column positions discovered from the export header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub bib: Option<usize>,
    pub run: Option<usize>,
    pub finish: Option<usize>,
    pub status: Option<usize>,
    pub splits: Vec<usize>,
    pub split_labels: Vec<String>,
}

impl ColumnMap {
    /// First match wins; checks run in a fixed order so that a label such as
    /// "Finish Time" is never taken for a split.
    pub fn from_header(line: &str) -> Self {
        let mut map = ColumnMap::default();
        for (idx, raw) in line.split(FIELD_SEPARATOR).enumerate() {
            let label = raw.trim();
            let lower = label.to_ascii_lowercase();
            if lower.contains("bib") {
                map.bib.get_or_insert(idx);
            } else if lower.contains("run") {
                map.run.get_or_insert(idx);
            } else if lower.contains("finish time") {
                map.finish.get_or_insert(idx);
            } else if lower.contains("status") {
                map.status.get_or_insert(idx);
            } else if lower.contains("split") {
                map.splits.push(idx);
                map.split_labels.push(label.to_string());
            }
        }
        map
    }

    pub fn num_splits(&self) -> usize {
        self.splits.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RowSkip {
    TooFewFields,
    MissingColumn(&'static str),
    MissingRunNumber,
    InvalidRunNumber(String),
    MissingBib,
    NoTimes,
}

impl std::fmt::Display for RowSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowSkip::TooFewFields => write!(f, "too few fields"),
            RowSkip::MissingColumn(name) => write!(f, "no {name} field"),
            RowSkip::MissingRunNumber => write!(f, "empty run number"),
            RowSkip::InvalidRunNumber(raw) => write!(f, "run number {raw:?} is not an integer"),
            RowSkip::MissingBib => write!(f, "empty bib"),
            RowSkip::NoTimes => write!(f, "no times and no status"),
        }
    }
}

/// Groups data rows by run number. Rows that cannot be mapped are skipped
/// with a warning; only an export without a single usable row is an error.
pub fn parse_timing_export<R: BufRead>(mut reader: R) -> Result<Session, InputError> {
    let mut raw = Vec::new();
    let mut buf = String::new();
    let mut columns: Option<ColumnMap> = None;
    let mut runs: BTreeMap<u32, Vec<RunEntry>> = BTreeMap::new();
    let mut line_no = 0usize;
    let mut skipped = 0usize;

    while read_line_lossy(&mut reader, &mut raw, &mut buf)? {
        line_no += 1;
        let line = buf.trim();
        if line.is_empty() {
            continue;
        }

        if columns.is_none() {
            if line.contains(HEADER_MARKER) {
                let map = ColumnMap::from_header(line);
                tracing::debug!(
                    line = line_no,
                    splits = map.num_splits(),
                    "found export header"
                );
                columns = Some(map);
            }
            continue;
        }
        let Some(map) = columns.as_ref() else {
            continue;
        };

        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        match parse_row(map, &fields) {
            Ok((run_id, entry)) => runs.entry(run_id).or_default().push(entry),
            Err(reason) => {
                skipped += 1;
                tracing::warn!(line = line_no, %reason, "skipping timing row");
            }
        }
    }

    let Some(map) = columns else {
        return Err(InputError::NoTimingData(format!(
            "no header line containing {HEADER_MARKER:?}"
        )));
    };
    if runs.is_empty() {
        return Err(InputError::NoTimingData("no usable rows".to_string()));
    }
    if skipped > 0 {
        tracing::info!(skipped, "timing rows skipped during ingestion");
    }

    Ok(Session {
        num_splits: map.num_splits(),
        split_labels: map.split_labels,
        runs: runs
            .into_iter()
            .map(|(id, entries)| Run { id, entries })
            .collect(),
    })
}

fn parse_row(map: &ColumnMap, fields: &[&str]) -> Result<(u32, RunEntry), RowSkip> {
    if fields.len() <= 1 {
        return Err(RowSkip::TooFewFields);
    }

    let run_idx = map.run.ok_or(RowSkip::MissingColumn("run"))?;
    let run_raw = fields
        .get(run_idx)
        .ok_or(RowSkip::MissingColumn("run"))?
        .trim();
    if run_raw.is_empty() {
        return Err(RowSkip::MissingRunNumber);
    }
    let run_id = run_raw
        .parse::<u32>()
        .map_err(|_| RowSkip::InvalidRunNumber(run_raw.to_string()))?;

    let bib_idx = map.bib.ok_or(RowSkip::MissingColumn("bib"))?;
    let bib = fields
        .get(bib_idx)
        .ok_or(RowSkip::MissingColumn("bib"))?
        .trim();
    if bib.is_empty() {
        return Err(RowSkip::MissingBib);
    }

    let splits = map
        .splits
        .iter()
        .map(|&idx| fields.get(idx).and_then(|cell| parse_time_value(cell)))
        .collect::<Vec<_>>();
    let finish = map
        .finish
        .and_then(|idx| fields.get(idx))
        .and_then(|cell| parse_time_value(cell));

    let status_raw = map
        .status
        .and_then(|idx| fields.get(idx))
        .map(|cell| cell.trim())
        .unwrap_or("");
    let status = match EntryStatus::from_token(status_raw) {
        Some(status) => status,
        None => {
            tracing::warn!(bib, status = status_raw, "unknown status token; treating as finisher");
            EntryStatus::Valid
        }
    };

    let entry = RunEntry::new(normalize_bib(bib), splits, finish).with_status(status);
    if status.is_valid() && !entry.has_any_time() {
        return Err(RowSkip::NoTimes);
    }
    Ok((run_id, entry))
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/export.rs"]
mod tests;
