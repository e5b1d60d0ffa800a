//! Polynomial family: `a(n) = Σ_{j=0..d} c_j n^j`.
//!
//! Two passes over the fit window:
//!
//! - A float least-squares fit in the centred variable `t = (n - c) / h`, where
//!   `c` is the middle index of the window and `h` its half-width, so `t` spans
//!   `[-1, 1]`. This is the conditioning guard; its residual only labels a
//!   rejection. A raw Vandermonde matrix in `n` reaches condition numbers near
//!   `1e12` at degree 10, the centred one stays around `1e4` wherever the
//!   window sits.
//! - The coefficients themselves come from exact Newton interpolation of the
//!   first `d+1` fit terms, expanded into the monomial basis in `n`. The
//!   interpolant is unique, so the model is accepted iff it reproduces every
//!   remaining fit term.

use nalgebra::{DMatrix, DVector};

use crate::domain::{EngineConfig, ModelCandidate, ModelKind};
use crate::error::EngineError;
use crate::fit::fitter::{FitOptions, Fitter, accept_exact, check_residual, solve_guarded};
use crate::fit::partition::Partition;
use crate::math::Rational;
use crate::models::fill_polynomial_row;

#[derive(Debug, Clone, Copy, Default)]
pub struct PolynomialFitter;

impl Fitter for PolynomialFitter {
    fn kind(&self) -> ModelKind {
        ModelKind::Polynomial
    }

    fn complexities(&self, fit_len: usize, config: &EngineConfig) -> Vec<usize> {
        (0..=config.max_poly_degree_to_test)
            .take_while(|d| d + 1 <= fit_len)
            .collect()
    }

    fn attempt(
        &self,
        partition: &Partition<'_>,
        degree: usize,
        opts: &FitOptions,
    ) -> Result<ModelCandidate, EngineError> {
        let fit = partition.fit_terms();
        let m = fit.len();
        let p = degree + 1;
        if m < p {
            return Err(EngineError::unstable(
                ModelKind::Polynomial,
                degree,
                format!("{m} fit terms cannot determine {p} coefficients"),
            ));
        }

        let half_width = ((m - 1) as f64 / 2.0).max(1.0);
        let centre = partition.index_offset() as f64 + (m - 1) as f64 / 2.0;
        let mut x = DMatrix::<f64>::zeros(m, p);
        let mut row = vec![0.0; p];
        for i in 0..m {
            let t = (partition.index_of(i) as f64 - centre) / half_width;
            fill_polynomial_row(t, &mut row);
            for (j, v) in row.iter().enumerate() {
                x[(i, j)] = *v;
            }
        }
        let y = DVector::from_iterator(m, fit.iter().map(|&v| v as f64));
        let beta = solve_guarded(ModelKind::Polynomial, degree, &x, &y, opts)?;

        let coefficients = interpolate(&fit[..p], partition.index_offset()).ok_or_else(|| {
            EngineError::unstable(ModelKind::Polynomial, degree, "exact interpolation overflows i128")
        })?;
        accept_exact(
            ModelKind::Polynomial,
            degree,
            coefficients,
            fit,
            partition.index_offset(),
            0,
            opts,
        )
        // A large float residual says more about the degree than the exact miss.
        .map_err(|err| check_residual(ModelKind::Polynomial, degree, &x, &y, &beta, opts).err().unwrap_or(err))
    }
}

/// Monomial coefficients of the polynomial through `(n0 + i, values[i])`.
///
/// Newton forward differences give `Σ_k Δ^k a(n0) / k! · Π_{i<k} (n - n0 - i)`;
/// each product is expanded as it grows.
fn interpolate(values: &[i64], n0: i64) -> Option<Vec<Rational>> {
    let p = values.len();
    let mut diffs: Vec<i128> = values.iter().map(|&v| i128::from(v)).collect();
    let mut coefficients = vec![Rational::ZERO; p];
    // Π_{i<k} (n - n0 - i), lowest power first
    let mut basis: Vec<i128> = vec![1];
    let mut factorial: i128 = 1;

    for k in 0..p {
        if k > 0 {
            factorial = factorial.checked_mul(k as i128)?;
            for i in 0..p - k {
                diffs[i] = diffs[i + 1].checked_sub(diffs[i])?;
            }
        }
        let lead = Rational::new(diffs[0], factorial)?;
        for (c, &b) in coefficients.iter_mut().zip(&basis) {
            *c = c.checked_add(&lead.checked_mul(&Rational::from_int(b))?)?;
        }

        if k + 1 < p {
            let root = i128::from(n0).checked_add(k as i128)?;
            let mut next = vec![0i128; basis.len() + 1];
            for (j, &b) in basis.iter().enumerate() {
                next[j + 1] = next[j + 1].checked_add(b)?;
                next[j] = next[j].checked_sub(b.checked_mul(root)?)?;
            }
            basis = next;
        }
    }
    Some(coefficients)
}
