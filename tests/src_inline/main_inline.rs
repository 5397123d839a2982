use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("splitqc_main_test_{}_{}", std::process::id(), id));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(std::iter::once("kira-splitqc").chain(args.iter().copied()))
}

fn run_args(cli: Cli) -> RunArgs {
    match cli.command {
        Command::Run(args) => args,
        other => panic!("expected run, got {other:?}"),
    }
}

#[test]
fn test_run_defaults_to_standard_profile() {
    let cli = parse(&["run", "--input", "export.txt", "--out", "out"]).unwrap();
    assert_eq!(cli.verbose, 0);
    let config = build_config(run_args(cli)).unwrap();
    assert_eq!(config.profile, ValidationProfile::standard_v1());
    assert_eq!(config.input, PathBuf::from("export.txt"));
    assert!(config.roster.is_none());
    assert!(config.recent_names.is_none());
}

#[test]
fn test_strict_profile_and_overrides() {
    let cli = parse(&[
        "-vv",
        "run",
        "--input",
        "export.txt.gz",
        "--out",
        "out",
        "--profile",
        "strict",
        "--min-accel-time",
        "0.4",
        "--title",
        "GS Training",
    ])
    .unwrap();
    assert_eq!(cli.verbose, 2);
    let config = build_config(run_args(cli)).unwrap();
    assert_eq!(config.profile.max_split_time, 35.0);
    assert_eq!(config.profile.min_accel_time, 0.4);
    assert_eq!(config.title.as_deref(), Some("GS Training"));
}

#[test]
fn test_inverted_split_window_is_rejected() {
    let cli = parse(&[
        "run",
        "--input",
        "export.txt",
        "--out",
        "out",
        "--min-split-time",
        "50",
        "--max-split-time",
        "40",
    ])
    .unwrap();
    let err = build_config(run_args(cli)).unwrap_err();
    assert!(err.starts_with("invalid thresholds"));
}

#[test]
fn test_missing_required_args() {
    assert!(parse(&["run", "--input", "export.txt"]).is_err());
    assert!(parse(&["run", "--input", "a", "--out", "b", "--profile", "lenient"]).is_err());
}

#[test]
fn test_verbosity_levels() {
    assert_eq!(logging::level_for(0), "info");
    assert_eq!(logging::level_for(1), "debug");
    assert_eq!(logging::level_for(5), "trace");
}

#[test]
fn test_suggest_subcommand_args() {
    let cli = parse(&["suggest", "--recent-names", "names.json", "an"]).unwrap();
    let Command::Suggest(args) = cli.command else {
        panic!("expected suggest");
    };
    assert_eq!(args.recent_names, PathBuf::from("names.json"));
    assert_eq!(args.prefix, "an");
    assert!(parse(&["suggest", "an"]).is_err());
}

#[test]
fn test_run_session_updates_recent_names() {
    let dir = make_temp_dir();
    let export = dir.join("export.txt");
    std::fs::write(
        &export,
        "Bib#>Run>Split 1>Finish Time>Status\n1>1>10.0>55.32>\n2>1>10.2>54.10>\n7>1>10.1>54.50>\n",
    )
    .unwrap();
    let roster = dir.join("roster.json");
    std::fs::write(
        &roster,
        r#"{"GS": [{"name": "Ann Berg", "bib": 1}, {"name": "Bea Lund", "bib": 2}]}"#,
    )
    .unwrap();
    let recent = dir.join("recent_names.json");
    std::fs::write(&recent, r#"["Bea Lund", "Cid Dahl"]"#).unwrap();

    let out = dir.join("out");
    let (export, roster, recent_arg, out_arg) = (
        export.display().to_string(),
        roster.display().to_string(),
        recent.display().to_string(),
        out.display().to_string(),
    );
    let cli = parse(&[
        "run",
        "--input",
        &export,
        "--out",
        &out_arg,
        "--roster",
        &roster,
        "--recent-names",
        &recent_arg,
    ])
    .unwrap();
    run_session(build_config(run_args(cli)).unwrap()).unwrap();

    let saved: Vec<String> =
        serde_json::from_str(&std::fs::read_to_string(&recent).unwrap()).unwrap();
    assert_eq!(saved, vec!["Cid Dahl", "Ann Berg", "Bea Lund"]);
    assert!(out.join("runs.tsv").is_file());
}
