use std::collections::BTreeMap;

pub mod stage2_statistics;
pub mod stage3_validate;
pub mod stage4_rank;
pub mod stage5_progression;
pub mod stage6_session;
pub mod stage7_report;

use crate::model::entry::{EntryStatus, Session};
use crate::model::progression::AthleteProgression;
use crate::model::thresholds::ValidationProfile;
use stage2_statistics::{RunStatistics, run_stage2};
use stage3_validate::{ValidatedRun, run_stage3};
use stage4_rank::{RunRanking, run_stage4};
use stage5_progression::run_stage5;
use stage6_session::{SessionOverview, run_stage6};

#[derive(Debug, Clone)]
pub struct ProcessedRun {
    pub run: ValidatedRun,
    pub statistics: RunStatistics,
    pub ranking: RunRanking,
}

#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub num_splits: usize,
    pub split_labels: Vec<String>,
    /// Ascending by run id.
    pub runs: Vec<ProcessedRun>,
    pub progression: BTreeMap<String, AthleteProgression>,
    pub overview: SessionOverview,
}

impl SessionOutcome {
    pub fn error_count(&self) -> usize {
        self.runs.iter().map(|r| r.run.count(EntryStatus::Err)).sum()
    }
}

/// Runs every stage over a loaded session. Each run is validated and ranked
/// against its own statistics only.
pub fn process_session(session: &Session, profile: &ValidationProfile) -> SessionOutcome {
    let num_splits = session.num_splits;

    let mut runs = Vec::with_capacity(session.runs.len());
    for run in &session.runs {
        let statistics = run_stage2(run, num_splits, profile);
        let validated = run_stage3(run, &statistics);
        let ranking = run_stage4(&validated, &statistics, num_splits, profile);
        tracing::info!(
            run = run.id,
            entries = validated.entries.len(),
            valid = validated.count(EntryStatus::Valid),
            err = validated.count(EntryStatus::Err),
            "validated run"
        );
        runs.push(ProcessedRun {
            run: validated,
            statistics,
            ranking,
        });
    }

    let progression = run_stage5(runs.iter().map(|r| &r.run), num_splits, profile);
    tracing::info!(athletes = progression.len(), "aggregated progression");

    let pairs = runs
        .iter()
        .map(|r| (&r.run, &r.statistics))
        .collect::<Vec<_>>();
    let overview = run_stage6(&pairs, profile);
    if !overview.anomalies.is_empty() {
        tracing::warn!(count = overview.anomalies.len(), "session anomalies detected");
    }
    let suspicious = overview
        .runs
        .iter()
        .flat_map(|r| &r.sections)
        .map(|s| s.suspicious().count())
        .sum::<usize>();
    if suspicious > 0 {
        tracing::info!(suspicious, "section times beyond the sigma limit");
    }

    SessionOutcome {
        num_splits,
        split_labels: session.split_labels.clone(),
        runs,
        progression,
        overview,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/mod.rs"]
mod tests;
