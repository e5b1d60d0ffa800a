//! Least squares solver with a conditioning guard.
//!
//! Every fitter in this crate reduces to a small linear system `X β ≈ y`:
//! a Vandermonde matrix for polynomials, a lagged-term matrix for recurrences,
//! and a two-column `[B^n, 1]` design for the exponential family once `B` is fixed.
//!
//! Implementation choices:
//! - Rows are scaled by `1 / max_j |x_ij|`, the same trick as weighting rows by
//!   `sqrt(w_i)`: late rows of a fast-growing sequence do not drown out the early
//!   ones. The scale depends on the design only, so the conditioning check does
//!   not move with the data.
//! - Columns are then equilibrated (scaled to unit norm) before factorizing. Raw
//!   powers `n^j` and raw sequence terms span many orders of magnitude, and the
//!   conditioning check is only meaningful on the scaled matrix.
//! - We use SVD so the same routine covers square (exact) and tall
//!   (least-squares) systems. Nalgebra's `QR::solve` only handles square systems.
//! - The condition number is `σ_max / σ_min` of the equilibrated matrix; systems
//!   above the caller's threshold are refused rather than solved.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Why a linear solve was refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    /// Fewer rows than unknowns.
    #[error("underdetermined system ({rows} rows, {cols} unknowns)")]
    Underdetermined { rows: usize, cols: usize },
    /// A design column is identically zero.
    #[error("design column {0} is identically zero")]
    ZeroColumn(usize),
    #[error("ill-conditioned system (condition number {condition_number:.3e})")]
    IllConditioned { condition_number: f64 },
    #[error("solver produced non-finite values")]
    NonFinite,
}

/// Solve `x β ≈ y` in the least-squares sense (exactly when `x` is square).
///
/// Returns the solution in the original (unscaled) column basis.
pub fn solve_least_squares(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    max_condition_number: f64,
) -> Result<DVector<f64>, SolveError> {
    let (rows, cols) = x.shape();
    if rows < cols || cols == 0 {
        return Err(SolveError::Underdetermined { rows, cols });
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(SolveError::NonFinite);
    }

    let mut scaled = x.clone();
    let mut rhs = y.clone();
    for i in 0..rows {
        let s = scaled.row(i).amax();
        if s > 0.0 {
            scaled.row_mut(i).scale_mut(1.0 / s);
            rhs[i] /= s;
        }
    }

    let mut scales = Vec::with_capacity(cols);
    for j in 0..cols {
        let norm = scaled.column(j).norm();
        if norm == 0.0 {
            return Err(SolveError::ZeroColumn(j));
        }
        scaled.column_mut(j).scale_mut(1.0 / norm);
        scales.push(norm);
    }

    let svd = scaled.svd(true, true);
    let sigma_max = svd.singular_values.max();
    let sigma_min = svd.singular_values.min();
    let condition_number = if sigma_min > 0.0 {
        sigma_max / sigma_min
    } else {
        f64::INFINITY
    };
    if !(condition_number <= max_condition_number) {
        return Err(SolveError::IllConditioned { condition_number });
    }

    let beta = svd
        .solve(&rhs, sigma_max * f64::EPSILON)
        .map_err(|_| SolveError::NonFinite)?;
    let beta = DVector::from_iterator(cols, beta.iter().zip(&scales).map(|(b, s)| b / s));

    if beta.iter().all(|v| v.is_finite()) {
        Ok(beta)
    } else {
        Err(SolveError::NonFinite)
    }
}

/// Largest relative residual `|y_i - (xβ)_i| / max(1, |y_i|)`.
pub fn max_relative_residual(x: &DMatrix<f64>, y: &DVector<f64>, beta: &DVector<f64>) -> f64 {
    let fitted = x * beta;
    fitted
        .iter()
        .zip(y.iter())
        .map(|(f, yi)| (yi - f).abs() / yi.abs().max(1.0))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y, 1e12).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
        assert!(max_relative_residual(&x, &y, &beta) < 1e-12);
    }

    #[test]
    fn square_system_is_solved_exactly() {
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[3.0, 5.0]);
        let beta = solve_least_squares(&x, &y, 1e12).unwrap();
        assert!((beta[0] - 1.0).abs() < 1e-12);
        assert!((beta[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn collinear_columns_are_refused() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        match solve_least_squares(&x, &y, 1e12) {
            Err(SolveError::IllConditioned { .. }) => {}
            other => panic!("expected ill-conditioned, got {other:?}"),
        }
    }

    #[test]
    fn conditioning_ignores_the_right_hand_side() {
        // Same design, right-hand sides twelve orders of magnitude apart.
        let x = DMatrix::from_fn(6, 3, |i, j| ((i as f64) / 5.0 - 0.5).powi(j as i32));
        let small = DVector::from_fn(6, |i, _| i as f64);
        let large = small.scale(1e12);
        let tight = 1e3;
        assert!(solve_least_squares(&x, &small, tight).is_ok());
        assert!(solve_least_squares(&x, &large, tight).is_ok());
        let err = solve_least_squares(&x, &large, 1.0).unwrap_err();
        assert!(err.to_string().starts_with("ill-conditioned system"), "{err}");
    }

    #[test]
    fn zero_column_and_wide_systems_are_refused() {
        let x = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 0.0, 2.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0]);
        let err = solve_least_squares(&x, &y, 1e12).unwrap_err();
        assert_eq!(err, SolveError::ZeroColumn(0));
        assert_eq!(err.to_string(), "design column 0 is identically zero");

        let wide = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        let y1 = DVector::from_row_slice(&[1.0]);
        assert!(matches!(
            solve_least_squares(&wide, &y1, 1e12),
            Err(SolveError::Underdetermined { rows: 1, cols: 2 })
        ));
    }
}
