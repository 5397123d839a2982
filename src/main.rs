mod input;
mod logging;
mod model;
mod pipeline;
mod report;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::input::load_session;
use crate::input::roster::{RecentNames, Roster};
use crate::model::thresholds::ValidationProfile;
use crate::pipeline::process_session;
use crate::pipeline::stage7_report::{Stage7Input, write_reports};
use crate::report::ReportMeta;

#[derive(Parser, Debug)]
#[command(author, version, about = "Validate, rank and track alpine training timing runs", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a timing export and write reports
    Run(RunArgs),
    /// Suggest remembered athlete names for a prefix
    Suggest(SuggestArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Timing export (plain text or .gz)
    #[arg(long, value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Output directory
    #[arg(long, value_hint = ValueHint::DirPath)]
    out: PathBuf,

    /// Team roster JSON
    #[arg(long, value_hint = ValueHint::FilePath)]
    roster: Option<PathBuf>,

    /// Recent-name memory (JSON list); roster names seen in the session are
    /// remembered and written back
    #[arg(long, value_hint = ValueHint::FilePath)]
    recent_names: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ProfileArg::Standard)]
    profile: ProfileArg,

    /// Upper clamp for split bounds, seconds
    #[arg(long)]
    max_split_time: Option<f64>,

    /// Lower clamp for split bounds, seconds
    #[arg(long)]
    min_split_time: Option<f64>,

    /// Floor for acceleration split bounds, seconds
    #[arg(long)]
    min_accel_time: Option<f64>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    session: Option<String>,

    #[arg(long)]
    event: Option<String>,
}

#[derive(Args, Debug)]
struct SuggestArgs {
    /// Recent-name memory (JSON list)
    #[arg(long, value_hint = ValueHint::FilePath)]
    recent_names: PathBuf,

    /// Case-insensitive name prefix
    prefix: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ProfileArg {
    Standard,
    Strict,
}

#[derive(Debug, Clone)]
struct RunConfig {
    input: PathBuf,
    out_dir: PathBuf,
    roster: Option<PathBuf>,
    recent_names: Option<PathBuf>,
    profile: ValidationProfile,
    title: Option<String>,
    session: Option<String>,
    event: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Run(args) => run_session(build_config(args)?),
        Command::Suggest(args) => suggest(&args),
    }
}

fn run_session(config: RunConfig) -> Result<(), String> {
    let session = load_session(&config.input).map_err(|e| e.to_string())?;
    let roster = match &config.roster {
        Some(path) => Roster::load(path).map_err(|e| e.to_string())?,
        None => Roster::empty(),
    };

    let outcome = process_session(&session, &config.profile);

    let meta = ReportMeta {
        tool: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        input: config.input.display().to_string(),
        profile: config.profile.mode.as_str().to_string(),
        title: config.title.clone(),
        session: config.session.clone(),
        event: config.event.clone(),
    };
    let input = Stage7Input {
        outcome: &outcome,
        roster: &roster,
        profile: &config.profile,
        meta: &meta,
    };
    write_reports(&input, &config.out_dir)
        .map_err(|e| format!("failed to write reports to {}: {e}", config.out_dir.display()))?;

    if let Some(path) = &config.recent_names {
        let mut recent = RecentNames::load(path).map_err(|e| e.to_string())?;
        let bibs = outcome
            .runs
            .iter()
            .flat_map(|r| r.run.entries.iter().map(|e| e.bib.as_str()));
        let remembered = recent.remember_bibs(bibs, &roster);
        recent.save(path).map_err(|e| e.to_string())?;
        tracing::info!(
            path = %path.display(),
            remembered,
            total = recent.len(),
            "updated recent names"
        );
    }

    println!(
        "{} runs, {} entries, {} ERR, {} athletes -> {}",
        outcome.runs.len(),
        session.entry_count(),
        outcome.error_count(),
        outcome.overview.athletes,
        config.out_dir.display()
    );
    Ok(())
}

fn suggest(args: &SuggestArgs) -> Result<(), String> {
    let recent = RecentNames::load(&args.recent_names).map_err(|e| e.to_string())?;
    if recent.is_empty() {
        tracing::warn!(path = %args.recent_names.display(), "no remembered names");
    }
    for name in recent.suggest(&args.prefix) {
        println!("{name}");
    }
    Ok(())
}

fn build_config(args: RunArgs) -> Result<RunConfig, String> {
    let mut profile = match args.profile {
        ProfileArg::Standard => ValidationProfile::standard_v1(),
        ProfileArg::Strict => ValidationProfile::strict_v1(),
    };
    if let Some(v) = args.max_split_time {
        profile.max_split_time = v;
    }
    if let Some(v) = args.min_split_time {
        profile.min_split_time = v;
    }
    if let Some(v) = args.min_accel_time {
        profile.min_accel_time = v;
    }
    profile.check().map_err(|e| format!("invalid thresholds: {e}"))?;

    Ok(RunConfig {
        input: args.input,
        out_dir: args.out,
        roster: args.roster,
        recent_names: args.recent_names,
        profile,
        title: args.title,
        session: args.session,
        event: args.event,
    })
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
