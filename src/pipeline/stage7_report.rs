use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::input::roster::RosterLookup;
use crate::model::category::Category;
use crate::model::entry::{Column, recorded};
use crate::model::thresholds::ValidationProfile;
use crate::pipeline::SessionOutcome;
use crate::pipeline::stage6_session::{RunCategories, category_overview};
use crate::report::json::{build_summary, render_summary_json};
use crate::report::palette::fill_for;
use crate::report::text::{render_report_text, render_validation_log};
use crate::report::{
    ReportMeta, format_diff, format_opt_f64, format_opt_time, format_time,
};

pub struct Stage7Input<'a> {
    pub outcome: &'a SessionOutcome,
    pub roster: &'a dyn RosterLookup,
    pub profile: &'a ValidationProfile,
    pub meta: &'a ReportMeta,
}

#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub runs_tsv: PathBuf,
    pub progression_tsv: PathBuf,
    pub summary_json: PathBuf,
    pub report_txt: PathBuf,
    pub validation_log: PathBuf,
    pub categories_tsv: PathBuf,
    pub category_comparison_tsv: PathBuf,
}

pub fn write_reports(input: &Stage7Input<'_>, out_dir: &Path) -> std::io::Result<ReportPaths> {
    fs::create_dir_all(out_dir)?;
    let paths = ReportPaths {
        runs_tsv: out_dir.join("runs.tsv"),
        progression_tsv: out_dir.join("progression.tsv"),
        summary_json: out_dir.join("summary.json"),
        report_txt: out_dir.join("report.txt"),
        validation_log: out_dir.join("validation.log"),
        categories_tsv: out_dir.join("categories.tsv"),
        category_comparison_tsv: out_dir.join("category_comparison.tsv"),
    };

    let categories = category_overview(input.outcome.runs.iter().map(|r| &r.run), input.roster);
    tracing::debug!(runs = categories.len(), "category overview built");

    write_runs_tsv(input, &paths.runs_tsv)?;
    write_progression_tsv(input, &paths.progression_tsv)?;
    write_categories_tsv(input, &categories, &paths.categories_tsv)?;
    write_category_comparison_tsv(&categories, &paths.category_comparison_tsv)?;

    let summary = build_summary(
        input.outcome,
        &categories,
        input.roster,
        input.profile,
        input.meta,
    );
    write_text(&paths.summary_json, &render_summary_json(&summary)?)?;

    let report = render_report_text(
        input.outcome,
        &categories,
        input.roster,
        input.profile,
        input.meta,
    );
    write_text(&paths.report_txt, &report)?;

    let log = render_validation_log(input.outcome, input.roster, input.meta);
    write_text(&paths.validation_log, &log)?;

    tracing::info!(dir = %out_dir.display(), "reports written");
    Ok(paths)
}

fn columns(num_splits: usize) -> Vec<Column> {
    (0..num_splits)
        .map(Column::Split)
        .chain(std::iter::once(Column::Finish))
        .collect()
}

fn column_key(column: Column) -> String {
    match column {
        Column::Split(idx) => format!("split{}", idx + 1),
        Column::Finish => "finish".to_string(),
    }
}

fn write_runs_tsv(input: &Stage7Input<'_>, path: &Path) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    let columns = columns(input.outcome.num_splits);

    let mut header = vec![
        "run".to_string(),
        "position".to_string(),
        "bib".to_string(),
        "name".to_string(),
        "team".to_string(),
        "status".to_string(),
    ];
    for &column in &columns {
        let key = column_key(column);
        header.push(key.clone());
        header.push(format!("{key}_diff"));
        header.push(format!("{key}_rank"));
        header.push(format!("{key}_fill"));
    }
    header.push("notes".to_string());
    writeln!(w, "{}", header.join("\t"))?;

    for processed in &input.outcome.runs {
        let run = &processed.run;
        for (position, idx) in run.presentation_order().into_iter().enumerate() {
            let entry = &run.entries[idx];
            let ranks = &processed.ranking.entries[idx];
            let mut row = vec![
                run.id.to_string(),
                (position + 1).to_string(),
                entry.bib.clone(),
                input.roster.display_name(&entry.bib),
                input.roster.team(&entry.bib),
                entry.status.as_str().to_string(),
            ];
            for &column in &columns {
                row.push(format_opt_time(recorded(entry.value(column))));
                match ranks.cell(column) {
                    Some(cell) => {
                        row.push(format_diff(cell.diff_to_best));
                        row.push(format!("{}/{}", cell.rank, cell.total_ranked));
                        row.push(fill_for(cell).to_hex());
                    }
                    None => row.extend(std::iter::repeat_n(String::new(), 3)),
                }
            }
            row.push(entry.error_notes.join("; "));
            writeln!(w, "{}", row.join("\t"))?;
        }
    }
    w.flush()
}

fn write_progression_tsv(input: &Stage7Input<'_>, path: &Path) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    let num_splits = input.outcome.num_splits;
    let profile = input.profile;

    let mut header = [
        "bib",
        "name",
        "team",
        "runs_entered",
        "completed_runs",
        "completion_rate",
        "finish_best",
        "best_run",
        "average_finish",
        "improvement_rate",
        "finish_improvements",
        "finish_consistency",
        "trend",
    ]
    .map(str::to_string)
    .to_vec();
    for idx in 0..num_splits {
        let key = column_key(Column::Split(idx));
        header.push(format!("{key}_best"));
        header.push(format!("{key}_improvements"));
        header.push(format!("{key}_consistency"));
        header.push(format!("{key}_trend"));
    }
    header.push("notes".to_string());
    header.push("warnings".to_string());
    writeln!(w, "{}", header.join("\t"))?;

    for (bib, p) in &input.outcome.progression {
        let mut row = vec![
            bib.clone(),
            input.roster.display_name(bib),
            input.roster.team(bib),
            p.runs_entered.to_string(),
            p.completed_runs.to_string(),
            format!("{:.1}", p.completion_rate()),
            format_opt_time(p.finish_best),
            p.best_run.map(|r| r.to_string()).unwrap_or_default(),
            format_opt_time(p.average_finish),
            format_opt_f64(p.improvement_rate, 2),
            p.finish_improvement_count.to_string(),
            format_opt_f64(p.finish_consistency, 1),
            p.trend.as_str().to_string(),
        ];
        for idx in 0..num_splits {
            row.push(
                p.per_split_best
                    .get(idx)
                    .copied()
                    .flatten()
                    .map(format_time)
                    .unwrap_or_default(),
            );
            row.push(
                p.per_split_improvement_count
                    .get(idx)
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
            );
            row.push(format_opt_f64(
                p.per_split_consistency.get(idx).copied().flatten(),
                1,
            ));
            row.push(
                p.per_split_trend
                    .get(idx)
                    .map(|t| t.as_str().to_string())
                    .unwrap_or_default(),
            );
        }
        row.push(
            p.performance_notes(profile.consistent_score, profile.inconsistent_score)
                .join("; "),
        );
        row.push(p.warnings.join("; "));
        writeln!(w, "{}", row.join("\t"))?;
    }
    w.flush()
}

fn write_categories_tsv(
    input: &Stage7Input<'_>,
    categories: &[RunCategories],
    path: &Path,
) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(
        w,
        "run\tcategory\trank\tbib\tname\tstatus\tsplit1\tsplit1_diff\tfinish\tfinish_diff"
    )?;
    for run in categories {
        for section in &run.sections {
            for e in &section.entries {
                let row = [
                    run.run_id.to_string(),
                    section.category.as_str().to_string(),
                    e.rank.map(|r| r.to_string()).unwrap_or_default(),
                    e.bib.clone(),
                    input.roster.display_name(&e.bib),
                    e.status.as_str().to_string(),
                    format_opt_time(e.split),
                    e.split_diff.map(format_diff).unwrap_or_default(),
                    format_opt_time(e.finish),
                    e.finish_diff.map(format_diff).unwrap_or_default(),
                ];
                writeln!(w, "{}", row.join("\t"))?;
            }
        }
    }
    w.flush()
}

fn write_category_comparison_tsv(
    categories: &[RunCategories],
    path: &Path,
) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "run\tmetric\twomen\tmen\tdifference")?;
    for run in categories {
        let women = run.section(Category::Women).map(|s| &s.stats);
        let men = run.section(Category::Men).map(|s| &s.stats);
        let cmp = &run.comparison;
        let rows = [
            (
                "athletes",
                women.map(|s| s.athletes.to_string()),
                men.map(|s| s.athletes.to_string()),
                None,
            ),
            (
                "completion_rate",
                women.map(|s| format!("{:.1}", s.completion_rate)),
                men.map(|s| format!("{:.1}", s.completion_rate)),
                cmp.completion_rate.map(|d| format!("{d:+.1}")),
            ),
            (
                "average_finish",
                women.and_then(|s| s.average_finish).map(format_time),
                men.and_then(|s| s.average_finish).map(format_time),
                cmp.average_finish.map(format_diff),
            ),
            (
                "best_finish",
                women.and_then(|s| s.best_finish).map(format_time),
                men.and_then(|s| s.best_finish).map(format_time),
                cmp.best_finish.map(format_diff),
            ),
            (
                "finish_range",
                women.and_then(|s| s.finish_range).map(format_time),
                men.and_then(|s| s.finish_range).map(format_time),
                cmp.finish_range.map(format_diff),
            ),
        ];
        for (metric, women, men, diff) in rows {
            writeln!(
                w,
                "{}\t{metric}\t{}\t{}\t{}",
                run.run_id,
                women.unwrap_or_default(),
                men.unwrap_or_default(),
                diff.unwrap_or_default()
            )?;
        }
    }
    w.flush()
}

fn write_text(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(contents.as_bytes())?;
    w.flush()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage7_report.rs"]
mod tests;
