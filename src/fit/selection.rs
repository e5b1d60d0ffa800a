//! Conjecture selection over an explicit trial plan.
//!
//! The plan lists every `(family, complexity)` pair in the order they are tried:
//! families in `EngineConfig::trial_order`, complexities ascending within each
//! family. The first candidate that survives verification wins and the search
//! stops, so a simpler model always beats a more complex one that also fits.
//!
//! Per-trial failures (ill-conditioned systems, degenerate exponential bases,
//! coefficients that do not round cleanly) are recorded and skipped. Only
//! `InsufficientData` aborts the run for a sequence.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::domain::{
    Analysis, Conjecture, EngineConfig, Outcome, Sequence, Trial, TrialRecord, TrialStatus,
};
use crate::error::EngineError;
use crate::fit::fitter::{FitOptions, fitter_for};
use crate::fit::partition::partition;
use crate::fit::verifier::verify;
use crate::report::formula::{FormulaStyle, render_formula};

/// Validated configuration plus the derived fitter options.
///
/// Holds no per-sequence state, so one engine can be shared across threads.
#[derive(Debug, Clone)]
pub struct ConjectureEngine {
    config: EngineConfig,
    options: FitOptions,
}

impl ConjectureEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let options = FitOptions::from(&config);
        Ok(Self { config, options })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Every trial for a fit window of `fit_len` terms, in the order they run.
    pub fn trial_plan(&self, fit_len: usize) -> Vec<Trial> {
        self.config
            .trial_order
            .iter()
            .flat_map(|&kind| {
                fitter_for(kind)
                    .complexities(fit_len, &self.config)
                    .into_iter()
                    .map(move |complexity| Trial { kind, complexity })
            })
            .collect()
    }

    /// Search for a conjecture for `sequence`.
    ///
    /// Returns `Err` only for `InsufficientData`; "no conjecture" is an
    /// `Ok(Analysis)` with `Outcome::NoConjecture`.
    pub fn analyze(&self, sequence: &Sequence) -> Result<Analysis, EngineError> {
        let started = Instant::now();
        let budget = self.config.time_budget_ms.map(Duration::from_millis);

        let part = partition(sequence, self.config.verification_ratio, &self.config.trial_order)?;
        let plan = self.trial_plan(part.fit_len());
        let mut trials = Vec::with_capacity(plan.len());
        let mut outcome = Outcome::NoConjecture {
            budget_exhausted: false,
        };

        for trial in plan {
            if budget.is_some_and(|b| started.elapsed() >= b) {
                debug!(
                    sequence = %sequence.id,
                    attempted = trials.len(),
                    "time budget exhausted"
                );
                outcome = Outcome::NoConjecture {
                    budget_exhausted: true,
                };
                break;
            }

            match fitter_for(trial.kind).attempt(&part, trial.complexity, &self.options) {
                Ok(model) => {
                    let verification = verify(&model, &part, self.config.epsilon);
                    if verification.all_within_tolerance {
                        trials.push(record(trial, TrialStatus::Verified));
                        outcome = Outcome::Conjecture(Conjecture {
                            sequence_id: sequence.id.clone(),
                            formula: render_formula(&model, FormulaStyle::Plain),
                            model,
                            verification,
                        });
                        break;
                    }
                    debug!(
                        sequence = %sequence.id,
                        kind = %trial.kind,
                        complexity = trial.complexity,
                        max_abs_error = verification.max_absolute_error,
                        "candidate rejected by verifier"
                    );
                    trials.push(record(
                        trial,
                        TrialStatus::RejectedByVerifier {
                            max_absolute_error: verification.max_absolute_error,
                        },
                    ));
                }
                Err(err) if err.is_trial_local() => {
                    debug!(
                        sequence = %sequence.id,
                        kind = %trial.kind,
                        complexity = trial.complexity,
                        "trial skipped: {err}"
                    );
                    trials.push(record(trial, TrialStatus::Skipped { reason: err.to_string() }));
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Analysis {
            sequence_id: sequence.id.clone(),
            n_terms: sequence.len(),
            fit_len: part.fit_len(),
            verify_len: part.verify_len(),
            outcome,
            trials,
        })
    }
}

fn record(trial: Trial, status: TrialStatus) -> TrialRecord {
    TrialRecord {
        kind: trial.kind,
        complexity: trial.complexity,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;

    fn engine(config: EngineConfig) -> ConjectureEngine {
        ConjectureEngine::new(config).unwrap()
    }

    #[test]
    fn trial_plan_follows_family_order_then_complexity() {
        let e = engine(EngineConfig {
            max_poly_degree_to_test: 2,
            max_recurrence_depth_to_test: 2,
            ..EngineConfig::default()
        });
        let plan: Vec<(ModelKind, usize)> = e.trial_plan(8).iter().map(|t| (t.kind, t.complexity)).collect();
        assert_eq!(
            plan,
            vec![
                (ModelKind::Polynomial, 0),
                (ModelKind::Polynomial, 1),
                (ModelKind::Polynomial, 2),
                (ModelKind::LinearRecurrence, 1),
                (ModelKind::LinearRecurrence, 2),
                (ModelKind::Exponential, 1),
            ]
        );

        let reordered = engine(EngineConfig {
            trial_order: vec![ModelKind::Exponential, ModelKind::Polynomial],
            max_poly_degree_to_test: 1,
            ..EngineConfig::default()
        });
        let kinds: Vec<ModelKind> = reordered.trial_plan(8).iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![ModelKind::Exponential, ModelKind::Polynomial, ModelKind::Polynomial]
        );
    }

    #[test]
    fn squares_give_degree_two() {
        let e = engine(EngineConfig {
            min_sequence_length: 5,
            verification_ratio: 0.6,
            ..EngineConfig::default()
        });
        let seq = Sequence::new("squares", (1..=10).map(|n| n * n).collect(), 1);
        let analysis = e.analyze(&seq).unwrap();
        let conj = analysis.outcome.conjecture().unwrap();
        assert_eq!(conj.model.kind, ModelKind::Polynomial);
        assert_eq!(conj.model.complexity, 2);
        assert_eq!(conj.formula, "a(n) = n^2");
        assert_eq!(analysis.fit_len, 6);
        // degrees 0 and 1 were tried and failed before degree 2
        assert_eq!(analysis.trials.len(), 3);
        assert_eq!(analysis.trials[2].status, TrialStatus::Verified);
    }

    #[test]
    fn polynomial_wins_over_recurrence() {
        // 2n + 1 also satisfies a(n) = 2a(n-1) - a(n-2)
        let seq = Sequence::new("odd", (0..12).map(|n| 2 * n + 1).collect(), 0);
        let conj = engine(EngineConfig::default()).analyze(&seq).unwrap();
        let model = &conj.outcome.conjecture().unwrap().model;
        assert_eq!((model.kind, model.complexity), (ModelKind::Polynomial, 1));
    }

    #[test]
    fn fibonacci_is_order_two_recurrence() {
        let mut terms = vec![0i64, 1];
        for i in 2..30 {
            terms.push(terms[i - 1] + terms[i - 2]);
        }
        let analysis = engine(EngineConfig::default())
            .analyze(&Sequence::new("fib", terms, 0))
            .unwrap();
        let conj = analysis.outcome.conjecture().unwrap();
        assert_eq!(conj.formula, "a(n) = a(n-1) + a(n-2)");
        assert!(
            analysis
                .trials
                .iter()
                .filter(|t| t.kind == ModelKind::Polynomial)
                .all(|t| t.status != TrialStatus::Verified)
        );
    }

    #[test]
    fn zero_budget_reports_exhaustion() {
        let e = engine(EngineConfig {
            time_budget_ms: Some(0),
            ..EngineConfig::default()
        });
        let seq = Sequence::new("sq", (0..20).map(|n| n * n).collect(), 0);
        let analysis = e.analyze(&seq).unwrap();
        assert_eq!(
            analysis.outcome,
            Outcome::NoConjecture {
                budget_exhausted: true
            }
        );
        assert!(analysis.trials.is_empty());
    }

    #[test]
    fn too_short_sequence_is_insufficient_data() {
        let seq = Sequence::new("short", vec![1, 2], 0);
        let err = engine(EngineConfig::default()).analyze(&seq).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientData(_)));
    }

    #[test]
    fn invalid_config_is_refused() {
        let err = ConjectureEngine::new(EngineConfig {
            verification_ratio: 1.0,
            ..EngineConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }
}
