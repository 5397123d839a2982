use crate::input::roster::RosterLookup;
use crate::model::thresholds::ValidationProfile;
use crate::pipeline::SessionOutcome;
use crate::pipeline::stage6_session::{NO_ISSUES, RunCategories, RunOverview};
use crate::report::{
    ReportMeta, format_diff, format_opt_f64, format_opt_time, format_percent, format_time,
};

pub fn render_report_text(
    outcome: &SessionOutcome,
    categories: &[RunCategories],
    roster: &dyn RosterLookup,
    profile: &ValidationProfile,
    meta: &ReportMeta,
) -> String {
    let mut out = String::new();
    let heading = meta.heading();
    out.push_str(&format!("{heading}\n"));
    out.push_str(&format!("{}\n", "=".repeat(heading.chars().count())));
    if let Some(event) = &meta.event {
        out.push_str(&format!("Event: {event}\n"));
    }
    if let Some(session) = &meta.session {
        out.push_str(&format!("Session: {session}\n"));
    }
    out.push_str(&format!("Input: {}\n", meta.input));
    out.push_str(&format!("Profile: {}\n\n", meta.profile));

    let overview = &outcome.overview;
    out.push_str("1. Session overview\n");
    out.push_str(&format!("Runs: {}\n", outcome.runs.len()));
    out.push_str(&format!("Athletes: {}\n", overview.athletes));
    out.push_str(&format!(
        "Completion rate: {}\n",
        format_percent(overview.completion_rate)
    ));
    out.push_str(&format!("Entries flagged ERR: {}\n\n", outcome.error_count()));

    out.push_str("2. Runs\n");
    for run in &overview.runs {
        push_run(&mut out, run, roster);
    }
    out.push('\n');

    out.push_str("3. Session trends\n");
    if overview.trend_notes.is_empty() {
        out.push_str("No significant patterns\n");
    }
    for note in &overview.trend_notes {
        out.push_str(&format!("- {note}\n"));
    }
    for anomaly in &overview.anomalies {
        out.push_str(&format!("! {anomaly}\n"));
    }
    out.push('\n');

    out.push_str("4. Athlete progression\n");
    for (bib, p) in &outcome.progression {
        let team = roster.team(bib);
        let team = if team.is_empty() {
            String::new()
        } else {
            format!(" ({team})")
        };
        let best = match (p.finish_best, p.best_run) {
            (Some(t), Some(run)) => format!("best {} (run {run})", format_time(t)),
            _ => "no valid finish".to_string(),
        };
        out.push_str(&format!(
            "Bib {bib} {}{team}: {}/{} runs completed, {best}, trend {}, consistency {}\n",
            roster.display_name(bib),
            p.completed_runs,
            p.runs_entered,
            p.trend.as_str(),
            format_opt_f64(p.finish_consistency, 1),
        ));
        let notes = p.performance_notes(profile.consistent_score, profile.inconsistent_score);
        if !notes.is_empty() {
            out.push_str(&format!("  {}\n", notes.join("; ")));
        }
        for warning in &p.warnings {
            out.push_str(&format!("  ! {warning}\n"));
        }
    }

    if !categories.is_empty() {
        out.push_str("\n5. Categories\n");
        for run in categories {
            push_categories(&mut out, run, roster);
        }
    }

    out
}

fn push_categories(out: &mut String, run: &RunCategories, roster: &dyn RosterLookup) {
    out.push_str(&format!("Run {}\n", run.run_id));
    for section in &run.sections {
        let stats = &section.stats;
        out.push_str(&format!(
            "  {}: {}/{} finished ({})",
            section.category.as_str(),
            stats.finishers,
            stats.athletes,
            format_percent(stats.completion_rate)
        ));
        if let Some(avg) = stats.average_finish {
            out.push_str(&format!(", average {}", format_time(avg)));
        }
        if let Some(best) = stats.best_finish {
            out.push_str(&format!(", best {}", format_time(best)));
        }
        out.push('\n');
        for e in &section.entries {
            let rank = e.rank.map(|r| format!("{r}.")).unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "    {rank} Bib {} {} [{}] split {} ({}) finish {} ({})\n",
                e.bib,
                roster.display_name(&e.bib),
                e.status.as_str(),
                format_opt_time(e.split),
                e.split_diff.map(format_diff).unwrap_or_default(),
                format_opt_time(e.finish),
                e.finish_diff.map(format_diff).unwrap_or_default(),
            ));
        }
    }
    let cmp = &run.comparison;
    if cmp.average_finish.is_some() {
        out.push_str(&format!(
            "  Women vs Men: completion {}, average {}, best {}, range {}\n",
            cmp.completion_rate
                .map(|d| format!("{d:+.1}%"))
                .unwrap_or_else(|| "n/a".to_string()),
            cmp.average_finish.map(format_diff).unwrap_or_else(|| "n/a".to_string()),
            cmp.best_finish.map(format_diff).unwrap_or_else(|| "n/a".to_string()),
            cmp.finish_range.map(format_diff).unwrap_or_else(|| "n/a".to_string()),
        ));
    }
}

fn push_run(out: &mut String, run: &RunOverview, roster: &dyn RosterLookup) {
    out.push_str(&format!(
        "Run {}: {}/{} finished ({})",
        run.run_id,
        run.finishers,
        run.total_entries,
        format_percent(run.completion_rate)
    ));
    if let Some(avg) = run.average_finish {
        out.push_str(&format!(", average {}", format_time(avg)));
    }
    if let Some(range) = run.finish_range {
        out.push_str(&format!(", range {range:.2}"));
    }
    if let Some(best) = &run.best_finish {
        out.push_str(&format!(
            ", best {} (Bib {} {})",
            format_time(best.time),
            best.bib,
            roster.display_name(&best.bib)
        ));
    }
    out.push('\n');

    let s = &run.statuses;
    out.push_str(&format!(
        "  Statuses: VALID {}, DNF {}, DSQ {}, DNS {}, ERR {}\n",
        s.valid, s.dnf, s.dsq, s.dns, s.err
    ));
    for note in &run.high_variation {
        out.push_str(&format!("  {note}\n"));
    }
    for section in &run.sections {
        out.push_str(&format!(
            "  Section {}: best {}, mean {}, std {:.2}, range {:.2} ({} times)\n",
            section.label,
            format_time(section.best),
            format_time(section.mean),
            section.std_dev,
            section.range,
            section.times.len()
        ));
        for t in section.suspicious() {
            out.push_str(&format!(
                "    suspicious: Bib {} {} ({})\n",
                t.bib,
                roster.display_name(&t.bib),
                format_time(t.time)
            ));
        }
    }
    if run.notable_events.is_empty() {
        out.push_str(&format!("  {NO_ISSUES}\n"));
    } else {
        out.push_str(&format!("  Notes: {}\n", run.notable_events.join("; ")));
    }
}

/// Error notes grouped by run and bib, followed by session anomalies.
pub fn render_validation_log(
    outcome: &SessionOutcome,
    roster: &dyn RosterLookup,
    meta: &ReportMeta,
) -> String {
    let mut out = String::new();
    out.push_str("Validation Log\n");
    out.push_str(&format!("Input: {}\n", meta.input));
    out.push_str(&format!("Profile: {}\n\n", meta.profile));

    let mut any = false;
    for processed in &outcome.runs {
        let flagged = processed
            .run
            .entries
            .iter()
            .filter(|e| !e.error_notes.is_empty())
            .collect::<Vec<_>>();
        if flagged.is_empty() {
            continue;
        }
        any = true;
        out.push_str(&format!("Run {}\n", processed.run.id));
        for entry in flagged {
            out.push_str(&format!(
                "  Bib {} ({}) [{}]\n",
                entry.bib,
                roster.display_name(&entry.bib),
                entry.status.as_str()
            ));
            for note in &entry.error_notes {
                out.push_str(&format!("    - {note}\n"));
            }
        }
    }
    if !any {
        out.push_str("No validation issues found\n");
    }

    let overview = &outcome.overview;
    let anomalies = overview
        .runs
        .iter()
        .flat_map(|run| {
            run.high_variation
                .iter()
                .map(move |note| format!("Run {}: {note}", run.run_id))
        })
        .chain(overview.anomalies.iter().cloned())
        .collect::<Vec<_>>();
    if !anomalies.is_empty() {
        out.push_str("\nSession anomalies\n");
        for anomaly in &anomalies {
            out.push_str(&format!("  - {anomaly}\n"));
        }
    }
    out
}
