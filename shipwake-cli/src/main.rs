use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use miette::{IntoDiagnostic, Result, WrapErr};
use shipwake_core::{EncounterEngine, EncounterSummary, VesselEncounter};

mod input;
mod report;

use report::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Grid scan for all encounter types
    Detect(RunArgs),
    /// Timestamp-matched ship-to-ship transfer pass
    Sts(RunArgs),
    /// Both passes, reported as aggregate statistics
    Summary(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// JSON array of vessel trips
    #[arg(short, long)]
    trips: PathBuf,

    /// JSON detection config; fields left out keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scan start, epoch milliseconds (default: first sample)
    #[arg(long)]
    start: Option<i64>,

    /// Scan end, epoch milliseconds (default: last sample)
    #[arg(long)]
    end: Option<i64>,

    /// Only report encounters involving this vessel
    #[arg(long)]
    vessel: Option<String>,

    /// Worker threads for pair-wise work
    #[arg(short, long, default_value_t = 1)]
    workers: usize,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_builder = env_logger::Builder::new();
    log_builder
        .filter_level(cli.verbose.log_level_filter())
        .format_timestamp_millis()
        .init();

    let (args, text) = match &cli.command {
        Command::Detect(args) => (args, run(args, Pass::Grid)?),
        Command::Sts(args) => (args, run(args, Pass::Sts)?),
        Command::Summary(args) => (args, run(args, Pass::Summary)?),
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, text)
                .into_diagnostic()
                .wrap_err_with(|| format!("Unable to write {}", path.display()))?;
            log::info!("Wrote results to {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Pass {
    Grid,
    Sts,
    Summary,
}

fn run(args: &RunArgs, pass: Pass) -> Result<String> {
    let config = input::load_config(args.config.as_deref())?;
    let trips = input::load_trips(&args.trips)?;
    let range = input::resolve_range(&trips, args.start, args.end)?;

    let engine = EncounterEngine::new(config)
        .into_diagnostic()?
        .with_workers(args.workers);

    let mut encounters: Vec<VesselEncounter> = match pass {
        Pass::Grid => engine.detect_encounters(&trips, range.start, range.end),
        Pass::Sts => engine.detect_sts_transfers(&trips, range),
        Pass::Summary => engine.detect_all(&trips, range),
    };
    if let Some(vessel) = &args.vessel {
        encounters = filter_vessel(encounters, vessel);
    }

    let text = match (pass, args.format) {
        (Pass::Summary, OutputFormat::Json) => {
            report::to_json(&EncounterSummary::from_encounters(&encounters)).into_diagnostic()?
        }
        (Pass::Summary, OutputFormat::Table) => report::summary_table(&EncounterSummary::from_encounters(&encounters)),
        (_, OutputFormat::Json) => report::to_json(&encounters).into_diagnostic()?,
        (_, OutputFormat::Table) => report::encounters_table(&encounters),
    };

    Ok(if text.ends_with('\n') { text } else { text + "\n" })
}

fn filter_vessel(encounters: Vec<VesselEncounter>, vessel: &str) -> Vec<VesselEncounter> {
    let total = encounters.len();
    let kept: Vec<_> = encounters.into_iter().filter(|e| e.involves(vessel)).collect();
    log::debug!("{} of {} encounters involve {}", kept.len(), total, vessel);
    kept
}
