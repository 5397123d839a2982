use super::*;
use crate::input::roster::Roster;
use crate::pipeline::stage2_statistics::{finish_statistics, split_statistics};

fn open_stats(run_id: u32) -> RunStatistics {
    RunStatistics {
        run_id,
        splits: Vec::new(),
        finish: None,
    }
}

fn run_with_finishes(id: u32, finishes: &[f64]) -> ValidatedRun {
    ValidatedRun {
        id,
        entries: finishes
            .iter()
            .enumerate()
            .map(|(i, f)| RunEntry::new((i + 1).to_string(), vec![], Some(*f)))
            .collect(),
    }
}

#[test]
fn test_run_overview_counts() {
    let profile = ValidationProfile::standard_v1();
    let mut err = RunEntry::new("4", vec![], Some(70.0)).with_status(EntryStatus::Err);
    err.error_notes.push("Finish: 70.00s outside bounds [40.00, 60.00]".to_string());
    let run = ValidatedRun {
        id: 1,
        entries: vec![
            RunEntry::new("1", vec![], Some(50.0)),
            RunEntry::new("2", vec![], Some(54.0)),
            RunEntry::new("3", vec![], None).with_status(EntryStatus::Dnf),
            err,
        ],
    };
    let o = run_overview(&run, &open_stats(1), &profile);
    assert_eq!(o.total_entries, 4);
    assert_eq!(o.finishers, 2);
    assert_eq!(o.completion_rate, 50.0);
    assert_eq!(o.average_finish, Some(52.0));
    assert_eq!(o.finish_range, Some(4.0));
    assert_eq!(o.best_finish.as_ref().map(|b| b.bib.as_str()), Some("1"));
    assert_eq!(o.statuses.dnf, 1);
    assert_eq!(o.statuses.err, 1);
    assert_eq!(o.notable_events.len(), 1);
    assert!(o.notable_events[0].starts_with("Bib 4: Finish"));
}

#[test]
fn test_single_finisher_has_no_range() {
    let profile = ValidationProfile::standard_v1();
    let o = run_overview(&run_with_finishes(2, &[48.0]), &open_stats(2), &profile);
    assert_eq!(o.finish_range, None);
    assert_eq!(o.best_finish.map(|b| b.time), Some(48.0));
    assert!(o.notable_events.is_empty());
}

#[test]
fn test_high_variation_skips_acceleration_columns() {
    let profile = ValidationProfile::standard_v1();
    let stats = RunStatistics {
        run_id: 1,
        splits: vec![
            split_statistics(0, &[0.95, 1.02, 0.98], &profile),
            split_statistics(1, &[10.0, 20.0], &profile),
        ],
        finish: finish_statistics(&[50.0, 51.0], &profile),
    };
    let notes = high_variation(&stats, &profile);
    assert_eq!(notes, vec!["High variation in Split 2 times (CV: 33.3%)".to_string()]);
}

#[test]
fn test_session_anomalies_and_trend() {
    let profile = ValidationProfile::standard_v1();
    let runs = [
        run_with_finishes(1, &[50.0, 52.0]),
        run_with_finishes(2, &[53.0, 55.0]),
        run_with_finishes(3, &[54.0, 55.0]),
    ];
    let stats = [open_stats(1), open_stats(2), open_stats(3)];
    let pairs = runs.iter().zip(stats.iter()).collect::<Vec<_>>();
    let session = run_stage6(&pairs, &profile);

    assert_eq!(session.runs.len(), 3);
    assert_eq!(session.athletes, 2);
    assert_eq!(session.completion_rate, 100.0);
    assert_eq!(session.anomalies.len(), 1);
    assert!(session.anomalies[0].contains("runs 1 and 2"));
    assert!(session.anomalies[0].ends_with("+3.00"));
    assert_eq!(
        session.trend_notes,
        vec!["Times gradually increased; possible fatigue effect".to_string()]
    );
}

#[test]
fn test_steady_session() {
    let profile = ValidationProfile::standard_v1();
    let runs = [run_with_finishes(1, &[50.0]), run_with_finishes(2, &[49.8])];
    let stats = [open_stats(1), open_stats(2)];
    let pairs = runs.iter().zip(stats.iter()).collect::<Vec<_>>();
    let session = run_stage6(&pairs, &profile);
    assert!(session.anomalies.is_empty());
    assert_eq!(
        session.trend_notes,
        vec![
            "Consistent improvement throughout session".to_string(),
            "Very consistent performance across runs".to_string(),
        ]
    );
}

fn split_run(rows: &[(&str, f64, f64, f64)]) -> ValidatedRun {
    ValidatedRun {
        id: 1,
        entries: rows
            .iter()
            .map(|&(bib, s1, s2, f)| RunEntry::new(bib, vec![Some(s1), Some(s2)], Some(f)))
            .collect(),
    }
}

#[test]
fn test_section_times_flag_beyond_two_sigma() {
    let profile = ValidationProfile::standard_v1();
    let mut rows = (1..=7)
        .map(|i| (i.to_string(), 10.0, 20.0, 30.0))
        .collect::<Vec<_>>();
    rows.push(("8".to_string(), 10.0, 19.0, 30.0));
    rows.push(("9".to_string(), 11.0, 20.0, 30.0));
    rows.push(("10".to_string(), 9.0, 21.0, 30.0));
    let rows = rows
        .iter()
        .map(|(b, s1, s2, f)| (b.as_str(), *s1, *s2, *f))
        .collect::<Vec<_>>();
    let sections = section_statistics(&split_run(&rows), &profile);

    assert_eq!(
        sections.iter().map(|s| s.label.as_str()).collect::<Vec<_>>(),
        vec!["S1-S2", "S2-F"]
    );
    let middle = &sections[0];
    assert_eq!(middle.times.len(), 10);
    assert_eq!(middle.best, 9.0);
    assert_eq!(middle.range, 3.0);
    assert!((middle.mean - 10.0).abs() < 1e-9);
    assert!((middle.std_dev - 0.6f64.sqrt()).abs() < 1e-9);
    // 12.0 is 2.0 from the mean (> 2 x 0.775); 9.0 is only 1.0 away.
    let flagged = middle.suspicious().map(|t| t.bib.as_str()).collect::<Vec<_>>();
    assert_eq!(flagged, vec!["10"]);
}

#[test]
fn test_section_times_use_valid_entries_only() {
    let profile = ValidationProfile::standard_v1();
    let mut run = split_run(&[("1", 10.0, 20.0, 30.0), ("2", 10.0, 21.0, 31.0)]);
    run.entries.extend([
        RunEntry::new("3", vec![Some(10.0), Some(40.0)], None).with_status(EntryStatus::Dnf),
        RunEntry::new("4", vec![Some(12.0), None], Some(33.0)),
        RunEntry::new("5", vec![Some(10.0), Some(9.0)], Some(30.0)).with_status(EntryStatus::Err),
    ]);

    let sections = section_statistics(&run, &profile);
    let labels = sections.iter().map(|s| s.label.as_str()).collect::<Vec<_>>();
    assert_eq!(labels, vec!["S1-S2", "S1-F", "S2-F"]);
    assert_eq!(sections[0].times.len(), 2);
    assert_eq!(sections[1].times[0].bib, "4");
    assert_eq!(sections[1].times[0].time, 21.0);
    // identical times have zero spread and nothing is flagged
    assert_eq!(sections[2].std_dev, 0.0);
    assert_eq!(sections[2].suspicious().count(), 0);

    let o = run_overview(&run, &open_stats(1), &profile);
    assert_eq!(o.sections, sections);
}

const CATEGORY_ROSTER: &str = r#"{
    "GS": [
        {"name": "Ann", "bib": 1, "gender": "F"},
        {"name": "Bea", "bib": 2, "gender": "F"},
        {"name": "Cia", "bib": 3, "gender": "F"},
        {"name": "Dan", "bib": 4, "gender": "M"},
        {"name": "Eli", "bib": 5, "gender": "M"},
        {"name": "Fay", "bib": 6}
    ]
}"#;

fn category_run() -> ValidatedRun {
    ValidatedRun {
        id: 2,
        entries: vec![
            RunEntry::new("1", vec![Some(10.4)], Some(52.0)),
            RunEntry::new("2", vec![Some(10.0)], Some(50.0)),
            RunEntry::new("3", vec![Some(9.8)], None).with_status(EntryStatus::Dnf),
            RunEntry::new("4", vec![Some(9.5)], Some(48.0)),
            RunEntry::new("5", vec![Some(9.9)], Some(47.5)),
            RunEntry::new("6", vec![Some(9.0)], Some(45.0)),
        ],
    }
}

#[test]
fn test_category_sections_rank_by_finish() {
    let roster = Roster::from_json_str(CATEGORY_ROSTER).unwrap();
    let run = category_run();
    let overview = category_overview([&run], &roster);
    assert_eq!(overview.len(), 1);
    let categories = &overview[0];
    assert_eq!(categories.run_id, 2);
    assert_eq!(categories.sections.len(), 2);

    let women = categories.section(Category::Women).unwrap();
    let bibs = women.entries.iter().map(|e| e.bib.as_str()).collect::<Vec<_>>();
    assert_eq!(bibs, vec!["2", "1", "3"]);
    assert_eq!(
        women.entries.iter().map(|e| e.rank).collect::<Vec<_>>(),
        vec![Some(1), Some(2), None]
    );
    // the DNF split is shown but the best split comes from VALID entries
    assert_eq!(women.best_split, Some(10.0));
    let dnf = &women.entries[2];
    assert_eq!(dnf.split, Some(9.8));
    assert!((dnf.split_diff.unwrap() + 0.2).abs() < 1e-9);
    assert_eq!(dnf.finish, None);
    assert!((women.entries[1].split_diff.unwrap() - 0.4).abs() < 1e-9);
    assert_eq!(women.entries[1].finish_diff, Some(2.0));

    let men = categories.section(Category::Men).unwrap();
    assert_eq!(men.entries[0].bib, "5");
    assert_eq!(men.best_finish, Some(47.5));
    // bib 6 has no gender and stays out of both sections
    assert!(categories.sections.iter().all(|s| s.entries.iter().all(|e| e.bib != "6")));
}

#[test]
fn test_category_comparison_stats() {
    let roster = Roster::from_json_str(CATEGORY_ROSTER).unwrap();
    let overview = category_overview([&category_run()], &roster);
    let categories = &overview[0];

    let women = &categories.section(Category::Women).unwrap().stats;
    assert_eq!(women.athletes, 3);
    assert_eq!(women.finishers, 2);
    assert!((women.completion_rate - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(women.average_finish, Some(51.0));
    assert_eq!(women.best_finish, Some(50.0));
    assert_eq!(women.finish_range, Some(2.0));

    let men = &categories.section(Category::Men).unwrap().stats;
    assert_eq!(men.completion_rate, 100.0);
    assert_eq!(men.average_finish, Some(47.75));
    assert_eq!(men.finish_range, Some(0.5));

    let cmp = &categories.comparison;
    assert!((cmp.completion_rate.unwrap() + 100.0 / 3.0).abs() < 1e-9);
    assert_eq!(cmp.average_finish, Some(3.25));
    assert_eq!(cmp.best_finish, Some(2.5));
    assert_eq!(cmp.finish_range, Some(1.5));
}

#[test]
fn test_single_category_has_no_comparison() {
    let roster =
        Roster::from_json_str(r#"{"GS": [{"name": "Ann", "bib": 1, "gender": "F"}]}"#).unwrap();
    let overview = category_overview([&category_run()], &roster);
    assert_eq!(overview[0].sections.len(), 1);
    assert_eq!(overview[0].comparison, CategoryComparison::default());

    let nobody = Roster::from_json_str(r#"{"GS": [{"name": "Fay", "bib": 6}]}"#).unwrap();
    assert!(category_overview([&category_run()], &nobody).is_empty());
}
