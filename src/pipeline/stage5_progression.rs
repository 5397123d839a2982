use std::collections::BTreeMap;

use crate::model::entry::{RunEntry, recorded};
use crate::model::progression::{AthleteProgression, RunTime, Trend};
use crate::model::thresholds::ValidationProfile;
use crate::pipeline::stage3_validate::ValidatedRun;
use crate::report::format_diff;

#[derive(Debug, Clone, Default)]
struct Accumulator {
    runs_entered: usize,
    split_history: Vec<Vec<RunTime>>,
    finish_history: Vec<RunTime>,
    split_best: Vec<Option<f64>>,
    split_improvements: Vec<u32>,
    finish_best: Option<f64>,
    finish_improvements: u32,
}

impl Accumulator {
    fn new(num_splits: usize) -> Self {
        Self {
            split_history: vec![Vec::new(); num_splits],
            split_best: vec![None; num_splits],
            split_improvements: vec![0; num_splits],
            ..Self::default()
        }
    }

    fn observe(&mut self, run_id: u32, entry: &RunEntry) {
        self.runs_entered += 1;

        if entry.status.contributes_splits() {
            for idx in 0..self.split_history.len() {
                let Some(value) = recorded(entry.split(idx)) else {
                    continue;
                };
                self.split_history[idx].push(RunTime { run_id, value });
                if improves(self.split_best[idx], value) {
                    self.split_best[idx] = Some(value);
                    self.split_improvements[idx] += 1;
                }
            }
        }

        if entry.status.contributes_finish() {
            if let Some(value) = recorded(entry.finish) {
                self.finish_history.push(RunTime { run_id, value });
                if improves(self.finish_best, value) {
                    self.finish_best = Some(value);
                    self.finish_improvements += 1;
                }
            }
        }
    }
}

fn improves(best: Option<f64>, value: f64) -> bool {
    best.is_none_or(|b| value < b)
}

/// Folds all runs, in ascending run order, into one record per bib. Reads
/// the runs only; calling it twice on the same runs gives the same map.
pub fn run_stage5<'a>(
    runs: impl IntoIterator<Item = &'a ValidatedRun>,
    num_splits: usize,
    profile: &ValidationProfile,
) -> BTreeMap<String, AthleteProgression> {
    let mut ordered = runs.into_iter().collect::<Vec<_>>();
    ordered.sort_by_key(|r| r.id);

    let mut acc: BTreeMap<String, Accumulator> = BTreeMap::new();
    for run in ordered {
        for entry in &run.entries {
            acc.entry(entry.bib.clone())
                .or_insert_with(|| Accumulator::new(num_splits))
                .observe(run.id, entry);
        }
    }

    acc.into_iter()
        .map(|(bib, a)| {
            let progression = finalize(bib.clone(), a, profile);
            (bib, progression)
        })
        .collect()
}

fn finalize(bib: String, acc: Accumulator, profile: &ValidationProfile) -> AthleteProgression {
    let split_values = acc
        .split_history
        .iter()
        .map(|h| values(h))
        .collect::<Vec<_>>();
    let finish_values = values(&acc.finish_history);

    let warnings = progression_warnings(&acc.split_history, &acc.finish_history, profile);

    AthleteProgression {
        bib,
        runs_entered: acc.runs_entered,
        completed_runs: acc.finish_history.len(),
        per_split_best: acc.split_best,
        finish_best: acc.finish_best,
        per_split_improvement_count: acc.split_improvements,
        finish_improvement_count: acc.finish_improvements,
        per_split_consistency: split_values.iter().map(|v| consistency_score(v)).collect(),
        finish_consistency: consistency_score(&finish_values),
        per_split_trend: split_values.iter().map(|v| classify_trend(v)).collect(),
        trend: classify_trend(&finish_values),
        average_finish: mean(&finish_values),
        improvement_rate: improvement_rate(&finish_values),
        best_run: best_run(&acc.finish_history),
        split_history: acc.split_history,
        finish_history: acc.finish_history,
        warnings,
    }
}

fn values(history: &[RunTime]) -> Vec<f64> {
    history.iter().map(|t| t.value).collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// `100 / (1 + population variance)`, undefined below two observations.
pub fn consistency_score(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(100.0 / (1.0 + variance))
}

pub fn classify_trend(values: &[f64]) -> Trend {
    if values.len() < 3 {
        return Trend::InsufficientData;
    }
    let diffs = values.windows(2).map(|w| w[1] - w[0]).collect::<Vec<_>>();
    if diffs.iter().all(|d| *d <= 0.0) {
        Trend::Improving
    } else if diffs.iter().all(|d| *d >= 0.0) {
        Trend::Worsening
    } else {
        Trend::Variable
    }
}

/// Percentage gained from the first finish to the best one.
fn improvement_rate(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let first = values[0];
    let best = values.iter().copied().fold(f64::INFINITY, f64::min);
    Some((first - best) / first * 100.0)
}

fn best_run(history: &[RunTime]) -> Option<u32> {
    let mut best: Option<&RunTime> = None;
    for t in history {
        if best.is_none_or(|b| t.value < b.value) {
            best = Some(t);
        }
    }
    best.map(|t| t.run_id)
}

fn progression_warnings(
    split_history: &[Vec<RunTime>],
    finish_history: &[RunTime],
    profile: &ValidationProfile,
) -> Vec<String> {
    let mut warnings = Vec::new();

    for (idx, history) in split_history.iter().enumerate() {
        for pair in history.windows(2) {
            let change = pair[1].value - pair[0].value;
            if change.abs() > profile.large_split_change {
                warnings.push(format!(
                    "Large time change in Split {} between runs {} and {}: {}",
                    idx + 1,
                    pair[0].run_id,
                    pair[1].run_id,
                    format_diff(change)
                ));
            }
        }
    }

    for pair in finish_history.windows(2) {
        let change = pair[1].value - pair[0].value;
        if change.abs() > profile.large_finish_change {
            warnings.push(format!(
                "Large finish time change between runs {} and {}: {}",
                pair[0].run_id,
                pair[1].run_id,
                format_diff(change)
            ));
        }
    }

    if classify_trend(&values(finish_history)) == Trend::Worsening {
        warnings.push(
            "Consistent pattern of increasing times; possible fatigue or equipment issue"
                .to_string(),
        );
    }

    warnings
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_progression.rs"]
mod tests;
