use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::input::roster::RosterLookup;
use crate::model::category::Category;
use crate::model::entry::{Column, EntryStatus, RunEntry, recorded};
use crate::model::thresholds::ValidationProfile;
use crate::pipeline::stage2_statistics::{RunStatistics, sample_moments};
use crate::pipeline::stage3_validate::{ValidatedRun, presentation_order};
use crate::report::format_diff;

pub const NO_ISSUES: &str = "No significant issues";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestFinish {
    pub bib: String,
    pub time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusCounts {
    pub valid: usize,
    pub dnf: usize,
    pub dsq: usize,
    pub dns: usize,
    pub err: usize,
}

impl StatusCounts {
    fn of(run: &ValidatedRun) -> Self {
        Self {
            valid: run.count(EntryStatus::Valid),
            dnf: run.count(EntryStatus::Dnf),
            dsq: run.count(EntryStatus::Dsq),
            dns: run.count(EntryStatus::Dns),
            err: run.count(EntryStatus::Err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOverview {
    pub run_id: u32,
    pub total_entries: usize,
    pub finishers: usize,
    pub completion_rate: f64,
    pub average_finish: Option<f64>,
    /// Slowest minus fastest finish; needs at least two finishers.
    pub finish_range: Option<f64>,
    pub best_finish: Option<BestFinish>,
    pub statuses: StatusCounts,
    pub notable_events: Vec<String>,
    pub high_variation: Vec<String>,
    pub sections: Vec<SectionStatistics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionTime {
    pub bib: String,
    pub time: f64,
    pub suspicious: bool,
}

/// Times between two consecutive recorded marks (`S1-S2`, ..., `Sn-F`) of
/// VALID entries in one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionStatistics {
    pub label: String,
    pub from: Column,
    pub to: Column,
    pub best: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub range: f64,
    pub times: Vec<SectionTime>,
}

impl SectionStatistics {
    pub fn suspicious(&self) -> impl Iterator<Item = &SectionTime> {
        self.times.iter().filter(|t| t.suspicious)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOverview {
    pub runs: Vec<RunOverview>,
    pub athletes: usize,
    pub completion_rate: f64,
    pub anomalies: Vec<String>,
    pub trend_notes: Vec<String>,
}

pub fn run_overview(
    run: &ValidatedRun,
    stats: &RunStatistics,
    profile: &ValidationProfile,
) -> RunOverview {
    let mut finishes: Vec<(&str, f64)> = Vec::new();
    let mut notable_events = Vec::new();
    for entry in &run.entries {
        if entry.status.contributes_finish() {
            if let Some(f) = recorded(entry.finish) {
                finishes.push((entry.bib.as_str(), f));
            }
        }
        for note in &entry.error_notes {
            notable_events.push(format!("Bib {}: {note}", entry.bib));
        }
    }

    let total_entries = run.entries.len();
    let completion_rate = if total_entries == 0 {
        0.0
    } else {
        finishes.len() as f64 / total_entries as f64 * 100.0
    };
    let average_finish = (!finishes.is_empty())
        .then(|| finishes.iter().map(|(_, f)| f).sum::<f64>() / finishes.len() as f64);

    let mut best: Option<(&str, f64)> = None;
    let mut slowest = f64::NEG_INFINITY;
    for &(bib, f) in &finishes {
        if best.is_none_or(|(_, b)| f < b) {
            best = Some((bib, f));
        }
        slowest = slowest.max(f);
    }
    let finish_range = match best {
        Some((_, fastest)) if finishes.len() >= 2 => Some(slowest - fastest),
        _ => None,
    };

    RunOverview {
        run_id: run.id,
        total_entries,
        finishers: finishes.len(),
        completion_rate,
        average_finish,
        finish_range,
        best_finish: best.map(|(bib, time)| BestFinish {
            bib: bib.to_string(),
            time,
        }),
        statuses: StatusCounts::of(run),
        notable_events,
        high_variation: high_variation(stats, profile),
        sections: section_statistics(run, profile),
    }
}

fn mark_label(column: Column) -> String {
    match column {
        Column::Split(idx) => format!("S{}", idx + 1),
        Column::Finish => "F".to_string(),
    }
}

/// Groups section times by their bounding marks. A missing split joins its
/// neighbours into one wider section (`S1-S3`). Times more than
/// `suspicious_section_sigma` population deviations from the section mean
/// are flagged.
pub fn section_statistics(
    run: &ValidatedRun,
    profile: &ValidationProfile,
) -> Vec<SectionStatistics> {
    let mut grouped: BTreeMap<(Column, Column), Vec<(&str, f64)>> = BTreeMap::new();
    for entry in run.entries.iter().filter(|e| e.status.is_valid()) {
        let marks = entry
            .splits
            .iter()
            .enumerate()
            .filter_map(|(idx, v)| recorded(*v).map(|v| (Column::Split(idx), v)))
            .chain(recorded(entry.finish).map(|f| (Column::Finish, f)))
            .collect::<Vec<_>>();
        for pair in marks.windows(2) {
            let ((from, start), (to, end)) = (pair[0], pair[1]);
            if end > start {
                grouped
                    .entry((from, to))
                    .or_default()
                    .push((entry.bib.as_str(), end - start));
            }
        }
    }

    grouped
        .into_iter()
        .filter_map(|((from, to), times)| {
            let values = times.iter().map(|(_, t)| *t).collect::<Vec<_>>();
            let (mean, std_dev) = sample_moments(&values)?;
            let best = values.iter().copied().fold(f64::INFINITY, f64::min);
            let worst = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let limit = profile.suspicious_section_sigma * std_dev;
            Some(SectionStatistics {
                label: format!("{}-{}", mark_label(from), mark_label(to)),
                from,
                to,
                best,
                mean,
                std_dev,
                range: worst - best,
                times: times
                    .into_iter()
                    .map(|(bib, time)| SectionTime {
                        bib: bib.to_string(),
                        time,
                        suspicious: (time - mean).abs() > limit,
                    })
                    .collect(),
            })
        })
        .collect()
}

/// Non-acceleration columns whose coefficient of variation exceeds the
/// profile limit.
pub fn high_variation(stats: &RunStatistics, profile: &ValidationProfile) -> Vec<String> {
    let columns = (0..stats.splits.len())
        .map(Column::Split)
        .chain(std::iter::once(Column::Finish));
    let mut out = Vec::new();
    for column in columns {
        let Some(s) = stats.column(column) else {
            continue;
        };
        if s.is_acceleration_split {
            continue;
        }
        if let Some(cv) = s.coefficient_of_variation() {
            if cv > profile.high_cv_percent {
                out.push(format!(
                    "High variation in {} times (CV: {cv:.1}%)",
                    column.label()
                ));
            }
        }
    }
    out
}

pub fn run_stage6(
    runs: &[(&ValidatedRun, &RunStatistics)],
    profile: &ValidationProfile,
) -> SessionOverview {
    let overviews = runs
        .iter()
        .map(|(run, stats)| run_overview(run, stats, profile))
        .collect::<Vec<_>>();

    let athletes = runs
        .iter()
        .flat_map(|(run, _)| run.entries.iter().map(|e| e.bib.as_str()))
        .collect::<BTreeSet<_>>()
        .len();
    let total = overviews.iter().map(|o| o.total_entries).sum::<usize>();
    let finished = overviews.iter().map(|o| o.finishers).sum::<usize>();
    let completion_rate = if total == 0 {
        0.0
    } else {
        finished as f64 / total as f64 * 100.0
    };

    let averages = overviews
        .iter()
        .filter_map(|o| o.average_finish.map(|a| (o.run_id, a)))
        .collect::<Vec<_>>();

    SessionOverview {
        anomalies: average_anomalies(&averages, profile),
        trend_notes: trend_notes(&averages, profile),
        runs: overviews,
        athletes,
        completion_rate,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryEntry {
    pub bib: String,
    pub status: EntryStatus,
    /// Finish position inside the category; VALID entries with a finish only.
    pub rank: Option<usize>,
    pub split: Option<f64>,
    pub split_diff: Option<f64>,
    pub finish: Option<f64>,
    pub finish_diff: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryStats {
    pub athletes: usize,
    pub finishers: usize,
    pub completion_rate: f64,
    pub average_finish: Option<f64>,
    pub best_finish: Option<f64>,
    pub finish_range: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySection {
    pub category: Category,
    /// Fastest first split among VALID entries.
    pub best_split: Option<f64>,
    pub best_finish: Option<f64>,
    pub entries: Vec<CategoryEntry>,
    pub stats: CategoryStats,
}

/// Women minus men. `None` where either category lacks the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryComparison {
    pub completion_rate: Option<f64>,
    pub average_finish: Option<f64>,
    pub best_finish: Option<f64>,
    pub finish_range: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunCategories {
    pub run_id: u32,
    pub sections: Vec<CategorySection>,
    pub comparison: CategoryComparison,
}

impl RunCategories {
    pub fn section(&self, category: Category) -> Option<&CategorySection> {
        self.sections.iter().find(|s| s.category == category)
    }
}

/// Splits every run by roster category. Runs without a single categorised
/// entry are left out.
pub fn category_overview<'a>(
    runs: impl IntoIterator<Item = &'a ValidatedRun>,
    roster: &dyn RosterLookup,
) -> Vec<RunCategories> {
    let mut out = Vec::new();
    for run in runs {
        let sections = Category::ALL
            .into_iter()
            .filter_map(|category| {
                let members = run
                    .entries
                    .iter()
                    .filter(|e| roster.category(&e.bib) == Some(category))
                    .collect::<Vec<_>>();
                (!members.is_empty()).then(|| category_section(category, &members))
            })
            .collect::<Vec<_>>();
        if sections.is_empty() {
            continue;
        }
        let mut categories = RunCategories {
            run_id: run.id,
            sections,
            comparison: CategoryComparison::default(),
        };
        categories.comparison = compare_categories(
            categories.section(Category::Women).map(|s| &s.stats),
            categories.section(Category::Men).map(|s| &s.stats),
        );
        out.push(categories);
    }
    out
}

pub fn category_section(category: Category, members: &[&RunEntry]) -> CategorySection {
    let ranked_finish = |e: &RunEntry| {
        if e.status.contributes_finish() {
            recorded(e.finish)
        } else {
            None
        }
    };
    let best_split = members
        .iter()
        .filter(|e| e.status.is_valid())
        .filter_map(|e| recorded(e.split(0)))
        .reduce(f64::min);
    let finishes = members
        .iter()
        .filter_map(|e| ranked_finish(*e))
        .collect::<Vec<_>>();
    let best_finish = finishes.iter().copied().reduce(f64::min);

    let mut rank = 0;
    let entries = presentation_order(members)
        .into_iter()
        .map(|idx| {
            let e = members[idx];
            let finish = ranked_finish(e);
            let split = recorded(e.split(0));
            CategoryEntry {
                bib: e.bib.clone(),
                status: e.status,
                rank: finish.map(|_| {
                    rank += 1;
                    rank
                }),
                split,
                split_diff: split
                    .filter(|_| e.status.contributes_splits())
                    .zip(best_split)
                    .map(|(s, b)| s - b),
                finish,
                finish_diff: finish.zip(best_finish).map(|(f, b)| f - b),
            }
        })
        .collect();

    let athletes = members.len();
    let worst_finish = finishes.iter().copied().reduce(f64::max);
    let stats = CategoryStats {
        athletes,
        finishers: finishes.len(),
        completion_rate: finishes.len() as f64 / athletes.max(1) as f64 * 100.0,
        average_finish: (!finishes.is_empty())
            .then(|| finishes.iter().sum::<f64>() / finishes.len() as f64),
        best_finish,
        finish_range: match (best_finish, worst_finish) {
            (Some(best), Some(worst)) if finishes.len() >= 2 => Some(worst - best),
            _ => None,
        },
    };

    CategorySection {
        category,
        best_split,
        best_finish,
        entries,
        stats,
    }
}

pub fn compare_categories(
    women: Option<&CategoryStats>,
    men: Option<&CategoryStats>,
) -> CategoryComparison {
    CategoryComparison {
        completion_rate: difference(
            women.map(|s| s.completion_rate),
            men.map(|s| s.completion_rate),
        ),
        average_finish: difference(
            women.and_then(|s| s.average_finish),
            men.and_then(|s| s.average_finish),
        ),
        best_finish: difference(
            women.and_then(|s| s.best_finish),
            men.and_then(|s| s.best_finish),
        ),
        finish_range: difference(
            women.and_then(|s| s.finish_range),
            men.and_then(|s| s.finish_range),
        ),
    }
}

fn difference(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? - b?)
}

fn average_anomalies(averages: &[(u32, f64)], profile: &ValidationProfile) -> Vec<String> {
    averages
        .windows(2)
        .filter_map(|w| {
            let change = w[1].1 - w[0].1;
            (change.abs() > profile.large_run_average_change).then(|| {
                format!(
                    "Significant change in average finish between runs {} and {}: {}",
                    w[0].0,
                    w[1].0,
                    format_diff(change)
                )
            })
        })
        .collect()
}

fn trend_notes(averages: &[(u32, f64)], profile: &ValidationProfile) -> Vec<String> {
    if averages.len() < 2 {
        return Vec::new();
    }
    let diffs = averages
        .windows(2)
        .map(|w| w[1].1 - w[0].1)
        .collect::<Vec<_>>();

    let mut notes = Vec::new();
    if diffs.iter().all(|d| *d <= 0.0) {
        notes.push("Consistent improvement throughout session".to_string());
    } else if diffs.iter().all(|d| *d >= 0.0) {
        notes.push("Times gradually increased; possible fatigue effect".to_string());
    }

    let mean_change = diffs.iter().map(|d| d.abs()).sum::<f64>() / diffs.len() as f64;
    if mean_change < profile.steady_run_average_change {
        notes.push("Very consistent performance across runs".to_string());
    } else if mean_change > profile.large_run_average_change {
        notes.push("High variation between runs; conditions may have changed".to_string());
    }
    notes
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_session.rs"]
mod tests;
