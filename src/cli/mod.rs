//! Command-line parsing for the conjecture engine.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{EngineConfig, ModelKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "conj", version, about = "Integer-sequence conjecture engine")]
pub struct Cli {
    /// Engine configuration file (TOML). Defaults to $CONJ_CONFIG, then config/settings.toml.
    #[arg(long, global = true, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Log per-trial diagnostics (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a list of terms given on the command line.
    Terms(TermsArgs),
    /// Fetch sequences by OEIS id (local b-files or oeis.org) and analyze them.
    Analyze(AnalyzeArgs),
    /// Analyze every id in a JSON candidate list, in parallel.
    Batch(BatchArgs),
    /// Generate synthetic sequences of every family plus noise and report recovery rates.
    Selftest(SelftestArgs),
}

#[derive(Debug, Args)]
pub struct TermsArgs {
    /// Terms, comma or space separated (e.g. "1,4,9,16,25,36,49,64").
    #[arg(value_name = "TERMS", allow_hyphen_values = true)]
    pub terms: String,

    /// Index of the first term (OEIS lists mostly start at 1).
    #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
    pub offset: i64,

    /// Name used in reports.
    #[arg(long, default_value = "input")]
    pub id: String,

    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// OEIS ids (e.g. A000045).
    #[arg(value_name = "ID", required = true)]
    pub ids: Vec<String>,

    /// Read b-files from this directory instead of oeis.org.
    #[arg(long, value_name = "DIR")]
    pub bfile_dir: Option<PathBuf>,

    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// JSON array of OEIS ids.
    #[arg(long, value_name = "JSON", default_value = "data/candidate_sequences.json")]
    pub candidates: PathBuf,

    /// Read b-files from this directory instead of oeis.org.
    #[arg(long, value_name = "DIR")]
    pub bfile_dir: Option<PathBuf>,

    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct SelftestArgs {
    /// Number of synthetic sequences.
    #[arg(long, default_value_t = 40)]
    pub count: usize,

    /// Random seed for sequence generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Overrides applied on top of the configuration file.
#[derive(Debug, Args, Clone, Default)]
pub struct EngineArgs {
    /// Sequences with fewer terms are skipped.
    #[arg(long)]
    pub min_length: Option<usize>,

    /// Highest polynomial degree to try.
    #[arg(long)]
    pub max_degree: Option<usize>,

    /// Highest recurrence order to try.
    #[arg(long)]
    pub max_order: Option<usize>,

    /// Leading fraction of terms used for fitting (rest is held out).
    #[arg(long)]
    pub ratio: Option<f64>,

    /// Absolute tolerance on held-out predictions.
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Relative residual tolerance on fit terms.
    #[arg(long)]
    pub fit_tolerance: Option<f64>,

    /// Largest denominator for rational coefficients.
    #[arg(long)]
    pub max_denominator: Option<u32>,

    /// Families to try, in order (e.g. --families polynomial,recurrence).
    #[arg(long, value_enum, value_delimiter = ',')]
    pub families: Option<Vec<ModelKind>>,

    /// Wall-clock budget per sequence, in milliseconds.
    #[arg(long)]
    pub budget_ms: Option<u64>,
}

impl EngineArgs {
    pub fn apply(&self, config: &mut EngineConfig) {
        if let Some(v) = self.min_length {
            config.min_sequence_length = v;
        }
        if let Some(v) = self.max_degree {
            config.max_poly_degree_to_test = v;
        }
        if let Some(v) = self.max_order {
            config.max_recurrence_depth_to_test = v;
        }
        if let Some(v) = self.ratio {
            config.verification_ratio = v;
        }
        if let Some(v) = self.epsilon {
            config.epsilon = v;
        }
        if let Some(v) = self.fit_tolerance {
            config.fit_tolerance = v;
        }
        if let Some(v) = self.max_denominator {
            config.max_denominator = v;
        }
        if let Some(v) = &self.families {
            config.trial_order = v.clone();
        }
        if let Some(v) = self.budget_ms {
            config.time_budget_ms = Some(v);
        }
    }
}

#[derive(Debug, Args, Clone, Default)]
pub struct OutputArgs {
    /// Write every analysis to a JSON file.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Write a markdown report per conjecture into this directory.
    #[arg(long, value_name = "DIR")]
    pub reports_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let cli = Cli::parse_from([
            "conj",
            "terms",
            "1,4,9",
            "--ratio",
            "0.6",
            "--families",
            "polynomial,recurrence",
        ]);
        let Command::Terms(args) = cli.command else {
            panic!("expected terms");
        };
        let mut config = EngineConfig::default();
        args.engine.apply(&mut config);
        assert_eq!(config.verification_ratio, 0.6);
        assert_eq!(
            config.trial_order,
            vec![ModelKind::Polynomial, ModelKind::LinearRecurrence]
        );
        assert_eq!(config.epsilon, EngineConfig::default().epsilon);
    }

    #[test]
    fn negative_terms_and_offset_parse() {
        let cli = Cli::parse_from(["conj", "-v", "terms", "-1,2,-3", "--offset", "-2"]);
        assert!(cli.verbose);
        let Command::Terms(args) = cli.command else {
            panic!("expected terms");
        };
        assert_eq!(args.terms, "-1,2,-3");
        assert_eq!(args.offset, -2);
    }

    #[test]
    fn terms_offset_defaults_to_one() {
        let cli = Cli::parse_from(["conj", "terms", "1,4,9"]);
        let Command::Terms(args) = cli.command else {
            panic!("expected terms");
        };
        assert_eq!(args.offset, 1);
    }
}
