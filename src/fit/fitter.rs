//! Common fitting interface and the acceptance discipline shared by all families.
//!
//! Each family implements [`Fitter`]: given the fit window and a complexity it
//! produces at most one candidate. A candidate is only produced when:
//!
//! 1. the linear system is well conditioned and solves to finite values,
//! 2. the float solution reproduces every fit term within `fit_tolerance`,
//! 3. every coefficient is a rational with denominator `<= max_denominator`,
//!    either snapped from the float solution or computed exactly,
//! 4. the rational model reproduces every fit term exactly.
//!
//! Any failure is a trial-local `EngineError`; the selector skips the trial.

use nalgebra::{DMatrix, DVector};

use crate::domain::{EngineConfig, ModelCandidate, ModelKind};
use crate::error::EngineError;
use crate::fit::exponential::ExponentialFitter;
use crate::fit::partition::Partition;
use crate::fit::polynomial::PolynomialFitter;
use crate::fit::recurrence::RecurrenceFitter;
use crate::math::{Rational, max_relative_residual, solve_least_squares};
use crate::models::reproduces;

/// Numerical knobs the fitters need, derived once from `EngineConfig`.
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub fit_tolerance: f64,
    pub max_condition_number: f64,
    pub max_denominator: i128,
}

impl From<&EngineConfig> for FitOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            fit_tolerance: config.fit_tolerance,
            max_condition_number: config.max_condition_number,
            max_denominator: i128::from(config.max_denominator),
        }
    }
}

/// One model family.
pub trait Fitter: Sync {
    fn kind(&self) -> ModelKind;

    /// Complexities worth trying on a fit window of `fit_len` terms, ascending.
    fn complexities(&self, fit_len: usize, config: &EngineConfig) -> Vec<usize>;

    /// Fit the family at `complexity` to the fit window of `partition`.
    fn attempt(
        &self,
        partition: &Partition<'_>,
        complexity: usize,
        opts: &FitOptions,
    ) -> Result<ModelCandidate, EngineError>;
}

static POLYNOMIAL: PolynomialFitter = PolynomialFitter;
static RECURRENCE: RecurrenceFitter = RecurrenceFitter;
static EXPONENTIAL: ExponentialFitter = ExponentialFitter;

/// The fitter implementing `kind`.
pub fn fitter_for(kind: ModelKind) -> &'static dyn Fitter {
    match kind {
        ModelKind::Polynomial => &POLYNOMIAL,
        ModelKind::LinearRecurrence => &RECURRENCE,
        ModelKind::Exponential => &EXPONENTIAL,
    }
}

/// Solve `x β ≈ y` and require the solution to reproduce `y` within tolerance.
pub(crate) fn solve_and_check(
    kind: ModelKind,
    complexity: usize,
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    opts: &FitOptions,
) -> Result<DVector<f64>, EngineError> {
    let beta = solve_guarded(kind, complexity, x, y, opts)?;
    check_residual(kind, complexity, x, y, &beta, opts)?;
    Ok(beta)
}

/// Solve `x β ≈ y`, refusing ill-conditioned or non-finite systems.
pub(crate) fn solve_guarded(
    kind: ModelKind,
    complexity: usize,
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    opts: &FitOptions,
) -> Result<DVector<f64>, EngineError> {
    solve_least_squares(x, y, opts.max_condition_number)
        .map_err(|e| EngineError::unstable(kind, complexity, e.to_string()))
}

pub(crate) fn check_residual(
    kind: ModelKind,
    complexity: usize,
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    beta: &DVector<f64>,
    opts: &FitOptions,
) -> Result<(), EngineError> {
    let residual = max_relative_residual(x, y, beta);
    if !(residual <= opts.fit_tolerance) {
        return Err(EngineError::unstable(
            kind,
            complexity,
            format!("fit residual {residual:.3e} exceeds tolerance {:.1e}", opts.fit_tolerance),
        ));
    }
    Ok(())
}

/// Snap float coefficients to rationals and require exact reproduction of the
/// fit window `fit[from..]`, where `fit[0]` is `a(index_offset)`.
pub(crate) fn snap_and_accept(
    kind: ModelKind,
    complexity: usize,
    raw: &[f64],
    fit: &[i64],
    index_offset: i64,
    from: usize,
    opts: &FitOptions,
) -> Result<ModelCandidate, EngineError> {
    let coefficients = raw
        .iter()
        .map(|&v| {
            Rational::approximate(v, opts.max_denominator, opts.fit_tolerance).ok_or_else(|| {
                EngineError::unstable(
                    kind,
                    complexity,
                    format!(
                        "coefficient {v:e} has no rational with denominator <= {}",
                        opts.max_denominator
                    ),
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    accept_exact(kind, complexity, coefficients, fit, index_offset, from, opts)
}

/// Accept exact rational coefficients if every denominator is within
/// `max_denominator` and the model reproduces `fit[from..]` exactly.
pub(crate) fn accept_exact(
    kind: ModelKind,
    complexity: usize,
    coefficients: Vec<Rational>,
    fit: &[i64],
    index_offset: i64,
    from: usize,
    opts: &FitOptions,
) -> Result<ModelCandidate, EngineError> {
    if let Some(c) = coefficients.iter().find(|c| c.denom() > opts.max_denominator) {
        return Err(EngineError::unstable(
            kind,
            complexity,
            format!("coefficient {c} has denominator above {}", opts.max_denominator),
        ));
    }

    let candidate = ModelCandidate {
        kind,
        complexity,
        coefficients,
    };

    if !reproduces(&candidate, fit, index_offset, from) {
        return Err(EngineError::unstable(
            kind,
            complexity,
            "rational coefficients do not reproduce the fit terms exactly",
        ));
    }
    Ok(candidate)
}
