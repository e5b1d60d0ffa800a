//! Shared analysis pipeline used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch -> length check -> engine -> per-sequence report
//!
//! Sequences are analyzed in parallel with rayon; the output order always
//! matches the input order, and no sequence is ever dropped.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::data::{SyntheticSequence, TermStore, generate_suite};
use crate::domain::{Outcome, Sequence, SequenceReport};
use crate::error::EngineError;
use crate::fit::ConjectureEngine;
use crate::report::{SelfTestTally, tally_selftest};

/// Analyze one sequence, turning expected failures into a skipped report.
pub fn analyze_one(engine: &ConjectureEngine, sequence: &Sequence) -> SequenceReport {
    let min_len = engine.config().min_sequence_length;
    if sequence.len() < min_len {
        let reason = format!("only {} terms, need at least {min_len}", sequence.len());
        warn!(sequence = %sequence.id, "skipped: {reason}");
        return SequenceReport::Skipped {
            sequence_id: sequence.id.clone(),
            reason,
        };
    }

    match engine.analyze(sequence) {
        Ok(analysis) => {
            match &analysis.outcome {
                Outcome::Conjecture(c) => {
                    info!(sequence = %sequence.id, formula = %c.formula, "conjecture found")
                }
                Outcome::NoConjecture { budget_exhausted } => info!(
                    sequence = %sequence.id,
                    trials = analysis.trials.len(),
                    budget_exhausted = *budget_exhausted,
                    "no conjecture"
                ),
            }
            SequenceReport::Analyzed(analysis)
        }
        Err(err @ EngineError::InsufficientData(_)) => {
            warn!(sequence = %sequence.id, "skipped: {err}");
            SequenceReport::Skipped {
                sequence_id: sequence.id.clone(),
                reason: err.to_string(),
            }
        }
        Err(err) => {
            warn!(sequence = %sequence.id, "analysis failed: {err}");
            SequenceReport::Skipped {
                sequence_id: sequence.id.clone(),
                reason: err.to_string(),
            }
        }
    }
}

/// Analyze many sequences in parallel, preserving input order.
pub fn analyze_batch(engine: &ConjectureEngine, sequences: &[Sequence]) -> Vec<SequenceReport> {
    sequences.par_iter().map(|s| analyze_one(engine, s)).collect()
}

/// Fetch each id from `store` (sequentially, to be polite to remote stores),
/// then analyze in parallel. Fetch failures become skipped reports.
pub fn analyze_ids(engine: &ConjectureEngine, store: &dyn TermStore, ids: &[String]) -> Vec<SequenceReport> {
    let fetched: Vec<Result<Sequence, SequenceReport>> = ids
        .iter()
        .map(|id| {
            store.fetch(id).map_err(|err| {
                warn!(sequence = %id, "fetch failed: {err}");
                SequenceReport::Skipped {
                    sequence_id: id.clone(),
                    reason: err.to_string(),
                }
            })
        })
        .collect();

    fetched
        .into_par_iter()
        .map(|item| match item {
            Ok(sequence) => analyze_one(engine, &sequence),
            Err(skipped) => skipped,
        })
        .collect()
}

/// Output of `conj selftest`.
#[derive(Debug, Clone)]
pub struct SelfTestRun {
    pub suite: Vec<SyntheticSequence>,
    pub reports: Vec<SequenceReport>,
    pub tallies: Vec<SelfTestTally>,
}

pub fn run_selftest(engine: &ConjectureEngine, count: usize, seed: u64) -> SelfTestRun {
    let suite = generate_suite(count, seed);
    let sequences: Vec<Sequence> = suite.iter().map(|s| s.sequence.clone()).collect();
    let reports = analyze_batch(engine, &sequences);
    let tallies = tally_selftest(&suite, &reports);
    SelfTestRun {
        suite,
        reports,
        tallies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EngineConfig;
    use crate::error::AppError;

    struct MapStore(Vec<Sequence>);

    impl TermStore for MapStore {
        fn fetch(&self, id: &str) -> Result<Sequence, AppError> {
            self.0
                .iter()
                .find(|s| s.id == id)
                .cloned()
                .ok_or_else(|| AppError::new(4, format!("{id} not found")))
        }
    }

    fn engine() -> ConjectureEngine {
        ConjectureEngine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn short_sequences_are_skipped_not_dropped() {
        let reports = analyze_batch(
            &engine(),
            &[
                Sequence::new("short", vec![1, 2, 3], 0),
                Sequence::new("odd", (0..12).map(|n| 2 * n + 1).collect(), 0),
            ],
        );
        assert_eq!(reports.len(), 2);
        assert!(matches!(&reports[0], SequenceReport::Skipped { reason, .. } if reason.contains("only 3 terms")));
        assert_eq!(reports[1].conjecture().unwrap().formula, "a(n) = 2*n + 1");
    }

    #[test]
    fn fetch_failures_keep_their_slot() {
        let store = MapStore(vec![Sequence::new("A000027", (1..=12).collect(), 1)]);
        let ids = vec!["A999999".to_string(), "A000027".to_string()];
        let reports = analyze_ids(&engine(), &store, &ids);
        assert_eq!(reports[0].sequence_id(), "A999999");
        assert!(matches!(reports[0], SequenceReport::Skipped { .. }));
        assert_eq!(reports[1].conjecture().unwrap().formula, "a(n) = n");
    }

    #[test]
    fn selftest_runs_every_family() {
        let run = run_selftest(&engine(), 8, 11);
        assert_eq!(run.reports.len(), 8);
        let total: usize = run.tallies.iter().map(|t| t.generated).sum();
        assert_eq!(total, 8);
        // every structured sequence is recovered by some family
        for t in run.tallies.iter().filter(|t| t.family.is_some()) {
            assert_eq!(t.conjectured, t.generated, "{t:?}");
        }
    }
}
