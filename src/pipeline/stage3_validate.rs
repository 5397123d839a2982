use std::borrow::Borrow;

use serde::Serialize;

use crate::model::entry::{EntryStatus, Run, RunEntry, recorded};
use crate::pipeline::stage2_statistics::RunStatistics;

/// A run after classification. Entries keep their ingestion order so that
/// ranking ties resolve by file order; use [`ValidatedRun::presentation_order`]
/// for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedRun {
    pub id: u32,
    pub entries: Vec<RunEntry>,
}

impl ValidatedRun {
    pub fn presentation_order(&self) -> Vec<usize> {
        presentation_order(&self.entries)
    }

    pub fn count(&self, status: EntryStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }
}

pub fn run_stage3(run: &Run, stats: &RunStatistics) -> ValidatedRun {
    ValidatedRun {
        id: run.id,
        entries: run
            .entries
            .iter()
            .map(|e| validate_entry(e, stats))
            .collect(),
    }
}

/// Returns the classified copy of `entry`; the input is left untouched.
pub fn validate_entry(entry: &RunEntry, stats: &RunStatistics) -> RunEntry {
    let mut out = entry.clone();
    if entry.status == EntryStatus::Dns {
        return out;
    }

    let violations = find_violations(entry, stats);
    if violations.is_empty() {
        return out;
    }
    if !entry.status.is_officiated_out() {
        out.status = EntryStatus::Err;
    }
    out.error_notes.extend(violations);
    out
}

fn find_violations(entry: &RunEntry, stats: &RunStatistics) -> Vec<String> {
    let mut notes = Vec::new();
    let mut last_valid: Option<(usize, f64)> = None;

    for (idx, value) in entry.splits.iter().enumerate() {
        let Some(value) = recorded(*value) else {
            continue;
        };
        if let Some(split) = stats.split(idx) {
            if !split.bounds.contains(value) {
                notes.push(format!(
                    "Split {}: {:.2}s outside bounds [{:.2}, {:.2}]",
                    idx + 1,
                    value,
                    split.bounds.lower,
                    split.bounds.upper
                ));
                continue;
            }
        }
        if let Some((prev_idx, prev)) = last_valid {
            if value <= prev {
                notes.push(format!(
                    "Invalid progression: split {} ({:.2}) -> split {} ({:.2})",
                    prev_idx + 1,
                    prev,
                    idx + 1,
                    value
                ));
                continue;
            }
        }
        last_valid = Some((idx, value));
    }

    if let Some(finish) = recorded(entry.finish) {
        if let Some(bounds) = stats.finish.as_ref().map(|f| f.bounds) {
            if !bounds.contains(finish) {
                notes.push(format!(
                    "Finish: {:.2}s outside bounds [{:.2}, {:.2}]",
                    finish, bounds.lower, bounds.upper
                ));
            }
        }
        if let Some((idx, last)) = last_valid {
            if finish <= last {
                notes.push(format!(
                    "Finish ({:.2}) not after split {} ({:.2})",
                    finish,
                    idx + 1,
                    last
                ));
            }
        }
    }

    notes
}

/// Valid entries first, then DNF/DSQ/DNS/ERR; each group by finish time with
/// missing finishes last. Stable, so equal keys keep file order.
pub fn presentation_order<E: Borrow<RunEntry>>(entries: &[E]) -> Vec<usize> {
    let mut order = (0..entries.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| {
        let ea = entries[a].borrow();
        let eb = entries[b].borrow();
        let ka = (!ea.status.is_valid(), ea.finish.unwrap_or(f64::INFINITY));
        let kb = (!eb.status.is_valid(), eb.finish.unwrap_or(f64::INFINITY));
        ka.0.cmp(&kb.0).then_with(|| ka.1.total_cmp(&kb.1))
    });
    order
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_validate.rs"]
mod tests;
