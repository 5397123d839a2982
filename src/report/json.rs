use std::collections::BTreeMap;

use serde::Serialize;

use crate::input::roster::RosterLookup;
use crate::model::progression::AthleteProgression;
use crate::model::thresholds::ValidationProfile;
use crate::pipeline::SessionOutcome;
use crate::pipeline::stage2_statistics::RunStatistics;
use crate::pipeline::stage6_session::{RunCategories, RunOverview};
use crate::report::ReportMeta;

#[derive(Debug, Serialize)]
pub struct SessionSummary<'a> {
    pub meta: &'a ReportMeta,
    pub profile: &'a ValidationProfile,
    pub totals: Totals,
    pub split_labels: &'a [String],
    pub runs: Vec<RunSummary<'a>>,
    pub anomalies: &'a [String],
    pub trend_notes: &'a [String],
    pub categories: &'a [RunCategories],
    pub progression: BTreeMap<&'a str, AthleteSummary<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Totals {
    pub runs: usize,
    pub entries: usize,
    pub athletes: usize,
    pub errors: usize,
    pub completion_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub overview: &'a RunOverview,
    pub statistics: &'a RunStatistics,
}

#[derive(Debug, Serialize)]
pub struct AthleteSummary<'a> {
    pub name: String,
    pub team: String,
    pub completion_rate: f64,
    pub notes: Vec<&'static str>,
    #[serde(flatten)]
    pub progression: &'a AthleteProgression,
}

pub fn build_summary<'a>(
    outcome: &'a SessionOutcome,
    categories: &'a [RunCategories],
    roster: &dyn RosterLookup,
    profile: &'a ValidationProfile,
    meta: &'a ReportMeta,
) -> SessionSummary<'a> {
    let runs = outcome
        .runs
        .iter()
        .zip(&outcome.overview.runs)
        .map(|(r, overview)| RunSummary {
            overview,
            statistics: &r.statistics,
        })
        .collect();

    let progression = outcome
        .progression
        .iter()
        .map(|(bib, p)| {
            (
                bib.as_str(),
                AthleteSummary {
                    name: roster.display_name(bib),
                    team: roster.team(bib),
                    completion_rate: p.completion_rate(),
                    notes: p.performance_notes(profile.consistent_score, profile.inconsistent_score),
                    progression: p,
                },
            )
        })
        .collect();

    SessionSummary {
        meta,
        profile,
        totals: Totals {
            runs: outcome.runs.len(),
            entries: outcome.runs.iter().map(|r| r.run.entries.len()).sum(),
            athletes: outcome.overview.athletes,
            errors: outcome.error_count(),
            completion_rate: outcome.overview.completion_rate,
        },
        split_labels: &outcome.split_labels,
        runs,
        anomalies: &outcome.overview.anomalies,
        trend_notes: &outcome.overview.trend_notes,
        categories,
        progression,
    }
}

pub fn render_summary_json(summary: &SessionSummary<'_>) -> serde_json::Result<String> {
    let mut json = serde_json::to_string_pretty(summary)?;
    json.push('\n');
    Ok(json)
}
