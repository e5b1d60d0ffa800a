//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - loads the engine configuration and applies CLI overrides
//! - fetches or generates sequences
//! - runs the conjecture engine
//! - prints reports and writes optional exports

use std::path::Path;

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::{AnalyzeArgs, BatchArgs, Cli, Command, EngineArgs, OutputArgs, SelftestArgs, TermsArgs};
use crate::data::{BFileStore, OeisClient, TermStore};
use crate::domain::{EngineConfig, Sequence, SequenceReport};
use crate::error::AppError;
use crate::fit::ConjectureEngine;
use crate::io::{MarkdownPublisher, Publisher};

pub mod pipeline;

/// Entry point for the `conj` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_tracing(log_filter(None, cli.verbose));

    let base = crate::io::load_engine_config(cli.config.as_deref())?;

    match cli.command {
        Command::Terms(args) => handle_terms(base, args),
        Command::Analyze(args) => handle_analyze(base, args),
        Command::Batch(args) => handle_batch(base, args),
        Command::Selftest(args) => handle_selftest(base, args),
    }
}

/// Load `.env` (or `env_file`), then build the log filter, so a `RUST_LOG`
/// set in the file is honoured.
fn log_filter(env_file: Option<&Path>, verbose: bool) -> EnvFilter {
    // A missing .env is fine.
    let _ = match env_file {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn init_tracing(filter: EnvFilter) {
    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Apply CLI overrides to the file configuration and build the engine.
pub fn build_engine(mut config: EngineConfig, overrides: &EngineArgs) -> Result<ConjectureEngine, AppError> {
    overrides.apply(&mut config);
    Ok(ConjectureEngine::new(config)?)
}

fn handle_terms(base: EngineConfig, args: TermsArgs) -> Result<(), AppError> {
    let engine = build_engine(base, &args.engine)?;
    let terms = crate::io::parse_term_list(&args.terms)?;
    let sequence = Sequence::new(args.id, terms, args.offset);

    let report = pipeline::analyze_one(&engine, &sequence);
    print!("{}", crate::report::format_report(&report));
    write_outputs(&engine, &args.output, std::slice::from_ref(&report))?;

    match report {
        SequenceReport::Skipped { reason, .. } => Err(AppError::new(3, reason)),
        SequenceReport::Analyzed(_) => Ok(()),
    }
}

fn handle_analyze(base: EngineConfig, args: AnalyzeArgs) -> Result<(), AppError> {
    let engine = build_engine(base, &args.engine)?;
    for id in &args.ids {
        crate::io::validate_id(id)?;
    }
    let store = open_store(args.bfile_dir)?;

    let reports = pipeline::analyze_ids(&engine, store.as_ref(), &args.ids);
    for report in &reports {
        println!("{}", crate::report::format_report(report));
    }
    write_outputs(&engine, &args.output, &reports)
}

fn handle_batch(base: EngineConfig, args: BatchArgs) -> Result<(), AppError> {
    let engine = build_engine(base, &args.engine)?;
    let ids = crate::io::read_candidates(&args.candidates)?;
    let store = open_store(args.bfile_dir)?;

    let reports = pipeline::analyze_ids(&engine, store.as_ref(), &ids);
    print!("{}", crate::report::format_batch_table(&reports));
    write_outputs(&engine, &args.output, &reports)
}

fn handle_selftest(base: EngineConfig, args: SelftestArgs) -> Result<(), AppError> {
    let engine = build_engine(base, &args.engine)?;
    let run = pipeline::run_selftest(&engine, args.count, args.seed);

    print!("{}", crate::report::format_selftest(&run.tallies));
    println!();
    print!("{}", crate::report::format_batch_table(&run.reports));
    write_outputs(&engine, &args.output, &run.reports)
}

fn open_store(bfile_dir: Option<std::path::PathBuf>) -> Result<Box<dyn TermStore>, AppError> {
    Ok(match bfile_dir {
        Some(dir) => Box::new(BFileStore::new(dir)),
        None => Box::new(OeisClient::from_env()?),
    })
}

/// JSON export and markdown reports, when requested.
fn write_outputs(engine: &ConjectureEngine, output: &OutputArgs, reports: &[SequenceReport]) -> Result<(), AppError> {
    let now = Utc::now();
    if let Some(path) = &output.export {
        crate::io::write_reports_json(path, reports, engine.config(), now)?;
        eprintln!("Wrote {} reports to {}", reports.len(), path.display());
    }
    if let Some(dir) = &output.reports_dir {
        let publisher = MarkdownPublisher::new(dir, now);
        for report in reports {
            if let SequenceReport::Analyzed(analysis) = report {
                if let Some(conjecture) = analysis.outcome.conjecture() {
                    publisher.publish(analysis, conjecture)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_are_validated() {
        let args = EngineArgs {
            ratio: Some(1.5),
            ..EngineArgs::default()
        };
        let err = build_engine(EngineConfig::default(), &args).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn env_file_log_level_reaches_the_filter() {
        let preset = std::env::var("RUST_LOG").ok();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "RUST_LOG=seq_conjecture=trace\n").unwrap();

        let filter = log_filter(Some(&path), false);
        let expected = preset.unwrap_or_else(|| "seq_conjecture=trace".to_string());
        assert_eq!(filter.to_string(), expected);
    }

    #[test]
    fn terms_command_reads_squares_from_index_one() {
        let cli = Cli::parse_from([
            "conj",
            "terms",
            "1,4,9,16,25,36,49,64,81,100",
            "--min-length",
            "5",
            "--ratio",
            "0.6",
        ]);
        let Command::Terms(args) = cli.command else {
            panic!("expected terms");
        };
        let engine = build_engine(EngineConfig::default(), &args.engine).unwrap();
        let terms = crate::io::parse_term_list(&args.terms).unwrap();
        let report = pipeline::analyze_one(&engine, &Sequence::new(args.id, terms, args.offset));
        assert_eq!(report.conjecture().unwrap().formula, "a(n) = n^2");
    }

    #[test]
    fn outputs_cover_export_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let engine = build_engine(EngineConfig::default(), &EngineArgs::default()).unwrap();
        let reports = pipeline::analyze_batch(
            &engine,
            &[
                Sequence::new("A000027", (1..=12).collect(), 1),
                Sequence::new("A000000", vec![1, 2], 0),
            ],
        );
        let output = OutputArgs {
            export: Some(dir.path().join("out.json")),
            reports_dir: Some(dir.path().join("md")),
        };
        write_outputs(&engine, &output, &reports).unwrap();

        assert!(dir.path().join("out.json").exists());
        assert!(dir.path().join("md").join("A000027.md").exists());
        assert!(!dir.path().join("md").join("A000000.md").exists());
    }
}
