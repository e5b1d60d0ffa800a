//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between the selector, verifier and encoder without copies of the terms
//! - exported to JSON for downstream reporting
//! - compared bit-for-bit across repeated runs

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::math::Rational;

/// An ordered integer sequence as supplied by a term store.
///
/// `terms[i]` is `a(index_offset + i)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub id: String,
    pub terms: Vec<i64>,
    pub index_offset: i64,
}

impl Sequence {
    pub fn new(id: impl Into<String>, terms: Vec<i64>, index_offset: i64) -> Self {
        Self {
            id: id.into(),
            terms,
            index_offset,
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Model family.
///
/// The declaration order is the default trial order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// `a(n) = Σ c_j n^j`
    Polynomial,
    /// `a(n) = Σ c_j a(n-j)`
    #[value(name = "recurrence")]
    #[serde(alias = "recurrence")]
    LinearRecurrence,
    /// `a(n) = A·B^n + C`
    Exponential,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::Polynomial,
        ModelKind::LinearRecurrence,
        ModelKind::Exponential,
    ];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Polynomial => "polynomial",
            ModelKind::LinearRecurrence => "linear recurrence",
            ModelKind::Exponential => "exponential",
        }
    }

    /// Name of the complexity parameter for this family.
    pub fn complexity_label(self) -> &'static str {
        match self {
            ModelKind::Polynomial => "degree",
            ModelKind::LinearRecurrence => "order",
            ModelKind::Exponential => "class",
        }
    }

    /// Fewest fit terms for which the simplest member of the family can be tried.
    pub fn min_fit_points(self) -> usize {
        match self {
            ModelKind::Polynomial => 2,
            ModelKind::LinearRecurrence => 2,
            ModelKind::Exponential => 3,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Single complexity class used by the exponential family.
pub const EXPONENTIAL_COMPLEXITY: usize = 1;

/// One entry in the trial plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    pub kind: ModelKind,
    pub complexity: usize,
}

/// A fitted model whose coefficients reproduce the fit window exactly.
///
/// Coefficient layout by kind:
/// - polynomial: `[c_0, c_1, .., c_d]`, ascending powers of `n`
/// - linear recurrence: `[c_1, .., c_k]` for `a(n) = Σ c_j a(n-j)`
/// - exponential: `[A, B, C]` for `a(n) = A·B^n + C`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCandidate {
    pub kind: ModelKind,
    pub complexity: usize,
    pub coefficients: Vec<Rational>,
}

/// Outcome of checking a candidate against the held-out terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub candidate: ModelCandidate,
    pub max_absolute_error: f64,
    pub all_within_tolerance: bool,
    pub checked_terms: usize,
}

/// A verified model for a sequence. Terminal artifact of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conjecture {
    pub sequence_id: String,
    pub model: ModelCandidate,
    pub formula: String,
    pub verification: VerificationResult,
}

/// What happened to a single trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrialStatus {
    Verified,
    RejectedByVerifier { max_absolute_error: f64 },
    Skipped { reason: String },
}

/// Per-trial diagnostics kept alongside the outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub kind: ModelKind,
    pub complexity: usize,
    #[serde(flatten)]
    pub status: TrialStatus,
}

/// Result of one engine invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Conjecture(Conjecture),
    /// Every trial in the plan was attempted (or the budget ran out) and none verified.
    NoConjecture { budget_exhausted: bool },
}

impl Outcome {
    pub fn conjecture(&self) -> Option<&Conjecture> {
        match self {
            Outcome::Conjecture(c) => Some(c),
            Outcome::NoConjecture { .. } => None,
        }
    }
}

/// Outcome plus diagnostics for one sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub sequence_id: String,
    pub n_terms: usize,
    pub fit_len: usize,
    pub verify_len: usize,
    pub outcome: Outcome,
    pub trials: Vec<TrialRecord>,
}

/// Engine configuration, read-only for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Sequences shorter than this are reported as skipped by the driver.
    pub min_sequence_length: usize,
    pub max_poly_degree_to_test: usize,
    pub max_recurrence_depth_to_test: usize,
    /// Leading fraction of the terms used for fitting.
    pub verification_ratio: f64,
    /// Absolute tolerance for held-out predictions.
    pub epsilon: f64,
    /// Relative residual tolerance for fit terms (and for coefficient rounding).
    pub fit_tolerance: f64,
    /// Upper bound on the condition number of the equilibrated design matrix.
    pub max_condition_number: f64,
    /// Largest denominator allowed when rounding coefficients to rationals.
    pub max_denominator: u32,
    /// Family order of the trial plan.
    pub trial_order: Vec<ModelKind>,
    /// Optional wall-clock budget per sequence.
    pub time_budget_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_sequence_length: 8,
            max_poly_degree_to_test: 10,
            max_recurrence_depth_to_test: 10,
            verification_ratio: 0.8,
            epsilon: 1e-9,
            fit_tolerance: 1e-6,
            max_condition_number: 1e12,
            max_denominator: 5040,
            trial_order: ModelKind::ALL.to_vec(),
            time_budget_ms: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        let r = self.verification_ratio;
        if !(r.is_finite() && r > 0.0 && r < 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "verification_ratio must lie in (0, 1), got {r}"
            )));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0 && self.epsilon < 0.5) {
            return Err(EngineError::InvalidConfig(format!(
                "epsilon must lie in (0, 0.5), got {}",
                self.epsilon
            )));
        }
        if !(self.fit_tolerance.is_finite() && self.fit_tolerance > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "fit_tolerance must be positive, got {}",
                self.fit_tolerance
            )));
        }
        if !(self.max_condition_number.is_finite() && self.max_condition_number >= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "max_condition_number must be >= 1, got {}",
                self.max_condition_number
            )));
        }
        if self.max_denominator == 0 {
            return Err(EngineError::InvalidConfig("max_denominator must be >= 1".to_string()));
        }
        if self.trial_order.is_empty() {
            return Err(EngineError::InvalidConfig("trial_order must not be empty".to_string()));
        }
        for (i, kind) in self.trial_order.iter().enumerate() {
            if self.trial_order[..i].contains(kind) {
                return Err(EngineError::InvalidConfig(format!(
                    "trial_order lists {kind} more than once"
                )));
            }
        }
        Ok(())
    }
}

/// Driver-level result for one requested sequence. The driver never drops a
/// sequence: anything that cannot be analyzed is reported as skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SequenceReport {
    Analyzed(Analysis),
    Skipped { sequence_id: String, reason: String },
}

impl SequenceReport {
    pub fn sequence_id(&self) -> &str {
        match self {
            SequenceReport::Analyzed(a) => &a.sequence_id,
            SequenceReport::Skipped { sequence_id, .. } => sequence_id,
        }
    }

    pub fn conjecture(&self) -> Option<&Conjecture> {
        match self {
            SequenceReport::Analyzed(a) => a.outcome.conjecture(),
            SequenceReport::Skipped { .. } => None,
        }
    }
}
