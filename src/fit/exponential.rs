//! Exponential family: `a(n) = A·B^n + C`.
//!
//! The model is nonlinear in `B` only. For a fixed `B` it is linear in `(A, C)`,
//! so the many-point fit is a one-dimensional search over `B` with an ordinary
//! least squares solve for `(A, C)` at every trial `B`.
//!
//! Two strategies, picked by the number of fit points:
//! - [`ExponentialStrategy::ThreePoint`]: closed form from three equally spaced terms
//! - [`ExponentialStrategy::LeastSquares`]: three-point seed, then a bounded
//!   golden-section refinement of `B` over all fit terms

use nalgebra::{DMatrix, DVector};

use crate::domain::{EXPONENTIAL_COMPLEXITY, EngineConfig, ModelCandidate, ModelKind};
use crate::error::EngineError;
use crate::fit::fitter::{FitOptions, Fitter, snap_and_accept, solve_and_check};
use crate::fit::partition::Partition;
use crate::math::{max_relative_residual, solve_least_squares};

const KIND: ModelKind = ModelKind::Exponential;

/// Bases this close to 0 or 1 are degenerate.
const DEGENERATE_BASE: f64 = 1e-9;
/// Relative half-width of the refinement bracket around the seed base.
const REFINE_SPAN: f64 = 0.01;
const GOLDEN_ITERATIONS: usize = 80;
const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// How `(A, B, C)` is obtained from the fit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExponentialStrategy {
    ThreePoint,
    LeastSquares,
}

impl ExponentialStrategy {
    pub fn for_fit_len(fit_len: usize) -> Self {
        if fit_len <= 3 {
            ExponentialStrategy::ThreePoint
        } else {
            ExponentialStrategy::LeastSquares
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExponentialFitter;

impl Fitter for ExponentialFitter {
    fn kind(&self) -> ModelKind {
        KIND
    }

    fn complexities(&self, fit_len: usize, _config: &EngineConfig) -> Vec<usize> {
        if fit_len >= KIND.min_fit_points() {
            vec![EXPONENTIAL_COMPLEXITY]
        } else {
            Vec::new()
        }
    }

    fn attempt(
        &self,
        partition: &Partition<'_>,
        complexity: usize,
        opts: &FitOptions,
    ) -> Result<ModelCandidate, EngineError> {
        let fit = partition.fit_terms();
        let m = fit.len();
        if m < KIND.min_fit_points() {
            return Err(EngineError::invalid_params(
                KIND,
                format!("{m} fit terms cannot determine A, B and C"),
            ));
        }

        let indices: Vec<i64> = (0..m).map(|i| partition.index_of(i)).collect();
        let y = DVector::from_iterator(m, fit.iter().map(|&v| v as f64));
        let seeds = three_point(fit, indices[0])
            .map_err(|reason| EngineError::invalid_params(KIND, reason))?;

        let raw = match ExponentialStrategy::for_fit_len(m) {
            ExponentialStrategy::ThreePoint => {
                let best = seeds
                    .into_iter()
                    .map(|abc| (abc, residual_of(&indices, &y, abc)))
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(abc, _)| abc)
                    .ok_or_else(|| EngineError::invalid_params(KIND, "no admissible base"))?;
                let residual = residual_of(&indices, &y, best);
                if !(residual <= opts.fit_tolerance) {
                    return Err(EngineError::unstable(
                        KIND,
                        complexity,
                        format!("fit residual {residual:.3e} exceeds tolerance {:.1e}", opts.fit_tolerance),
                    ));
                }
                best
            }
            ExponentialStrategy::LeastSquares => {
                let base = seeds
                    .iter()
                    .map(|&[_, b, _]| refine_base(b, &indices, &y, opts.max_condition_number))
                    .filter_map(|b| projected_score(&indices, &y, b, opts.max_condition_number).map(|s| (b, s)))
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(b, _)| b)
                    .ok_or_else(|| {
                        EngineError::unstable(KIND, complexity, "no seed base yields a solvable projection")
                    })?;
                check_base(base)?;
                let x = design(&indices, base);
                let beta = solve_and_check(KIND, complexity, &x, &y, opts)?;
                [beta[0], base, beta[1]]
            }
        };

        let candidate = snap_and_accept(KIND, complexity, &raw, fit, partition.index_offset(), 0, opts)?;
        let [a, b, _] = candidate.coefficients.as_slice() else {
            return Err(EngineError::invalid_params(KIND, "expected three coefficients"));
        };
        if b.is_zero() || b.is_one() {
            return Err(EngineError::invalid_params(KIND, format!("base rounds to {b}")));
        }
        if a.is_zero() {
            return Err(EngineError::invalid_params(KIND, "amplitude rounds to 0"));
        }
        Ok(candidate)
    }
}

/// Closed-form `[A, B, C]` from the terms at positions `0, h, 2h`, `h = (m-1)/2`.
///
/// With `r = (a2 - a1) / (a1 - a0) = B^h`: `A = (a1 - a0) / (B^n0 (r - 1))` and
/// `C = a0 - A B^n0`. An even `h` leaves the sign of `B` open, so both roots are
/// returned.
fn three_point(fit: &[i64], n0: i64) -> Result<Vec<[f64; 3]>, String> {
    let h = (fit.len() - 1) / 2;
    let (y0, y1, y2) = (fit[0] as f64, fit[h] as f64, fit[2 * h] as f64);
    let d1 = y1 - y0;
    let d2 = y2 - y1;
    if d1 == 0.0 {
        return Err("first difference vanishes, base is undetermined".to_string());
    }
    let ratio = d2 / d1;
    if ratio == 0.0 {
        return Err("second difference vanishes, base is 0".to_string());
    }

    let root = ratio.abs().powf(1.0 / h as f64);
    let bases = match (ratio < 0.0, h % 2 == 0) {
        (true, true) => return Err(format!("B^{h} = {ratio} is negative, base is complex")),
        (true, false) => vec![-root],
        (false, true) => vec![root, -root],
        (false, false) => vec![root],
    };

    let solutions: Vec<[f64; 3]> = bases
        .into_iter()
        .filter(|&b| check_base(b).is_ok())
        .filter_map(|b| {
            let scale = base_pow(b, n0);
            let a = d1 / (scale * (ratio - 1.0));
            let c = y0 - a * scale;
            (a.is_finite() && c.is_finite()).then_some([a, b, c])
        })
        .collect();

    if solutions.is_empty() {
        Err(format!("B^{h} = {ratio} only admits degenerate bases"))
    } else {
        Ok(solutions)
    }
}

fn check_base(b: f64) -> Result<(), EngineError> {
    if !b.is_finite() || b.abs() < DEGENERATE_BASE || (b - 1.0).abs() < DEGENERATE_BASE {
        Err(EngineError::invalid_params(KIND, format!("degenerate base {b}")))
    } else {
        Ok(())
    }
}

fn base_pow(b: f64, n: i64) -> f64 {
    match i32::try_from(n) {
        Ok(e) => b.powi(e),
        Err(_) => b.powf(n as f64),
    }
}

/// Design `[B^n, 1]` over the fit indices.
fn design(indices: &[i64], b: f64) -> DMatrix<f64> {
    DMatrix::from_fn(indices.len(), 2, |i, j| if j == 0 { base_pow(b, indices[i]) } else { 1.0 })
}

fn residual_of(indices: &[i64], y: &DVector<f64>, [a, b, c]: [f64; 3]) -> f64 {
    let beta = DVector::from_row_slice(&[a, c]);
    let r = max_relative_residual(&design(indices, b), y, &beta);
    if r.is_nan() { f64::INFINITY } else { r }
}

/// Sum of squared relative residuals with `(A, C)` solved for the given `B`.
fn projected_score(indices: &[i64], y: &DVector<f64>, b: f64, max_condition_number: f64) -> Option<f64> {
    let x = design(indices, b);
    let beta = solve_least_squares(&x, y, max_condition_number).ok()?;
    let fitted = &x * beta;
    let score: f64 = fitted
        .iter()
        .zip(y.iter())
        .map(|(f, yi)| ((yi - f) / yi.abs().max(1.0)).powi(2))
        .sum();
    score.is_finite().then_some(score)
}

/// Golden-section search for `B` in a bracket around `seed` that does not cross
/// 0 or 1. Returns `seed` unless a strictly better base is found.
fn refine_base(seed: f64, indices: &[i64], y: &DVector<f64>, max_condition_number: f64) -> f64 {
    let score = |b: f64| projected_score(indices, y, b, max_condition_number).unwrap_or(f64::INFINITY);

    let (p, q) = (seed * (1.0 - REFINE_SPAN), seed * (1.0 + REFINE_SPAN));
    let (mut lo, mut hi) = (p.min(q), p.max(q));
    if seed > 1.0 {
        lo = lo.max(1.0 + DEGENERATE_BASE);
    } else if seed > 0.0 {
        hi = hi.min(1.0 - DEGENERATE_BASE);
    }

    let mut x1 = hi - INV_PHI * (hi - lo);
    let mut x2 = lo + INV_PHI * (hi - lo);
    let (mut f1, mut f2) = (score(x1), score(x2));
    for _ in 0..GOLDEN_ITERATIONS {
        if f1 <= f2 {
            hi = x2;
            (x2, f2) = (x1, f1);
            x1 = hi - INV_PHI * (hi - lo);
            f1 = score(x1);
        } else {
            lo = x1;
            (x1, f1) = (x2, f2);
            x2 = lo + INV_PHI * (hi - lo);
            f2 = score(x2);
        }
    }

    let (best, best_score) = if f1 <= f2 { (x1, f1) } else { (x2, f2) };
    if best_score < score(seed) { best } else { seed }
}
