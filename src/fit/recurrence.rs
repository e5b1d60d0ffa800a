//! Homogeneous linear recurrences: `a(i) = Σ_{j=1..k} c_j a(i-j)`.
//!
//! Every fit position with `k` predecessors inside the fit window contributes one
//! row. Order `k` is only tried when there are at least `k` such rows, so the
//! system is never underdetermined: `k` rows is solved exactly, more rows in the
//! least-squares sense. When the float coefficients do not snap cleanly, the
//! first `k` rows are solved again over the rationals.

use nalgebra::{DMatrix, DVector};

use crate::domain::{EngineConfig, ModelCandidate, ModelKind};
use crate::error::EngineError;
use crate::fit::fitter::{FitOptions, Fitter, accept_exact, check_residual, snap_and_accept, solve_guarded};
use crate::fit::partition::Partition;
use crate::math::{Rational, solve_exact};
use crate::models::fill_recurrence_row;

const KIND: ModelKind = ModelKind::LinearRecurrence;

#[derive(Debug, Clone, Copy, Default)]
pub struct RecurrenceFitter;

impl Fitter for RecurrenceFitter {
    fn kind(&self) -> ModelKind {
        KIND
    }

    fn complexities(&self, fit_len: usize, config: &EngineConfig) -> Vec<usize> {
        (1..=config.max_recurrence_depth_to_test)
            .take_while(|&k| fit_len >= 2 * k)
            .collect()
    }

    fn attempt(
        &self,
        partition: &Partition<'_>,
        order: usize,
        opts: &FitOptions,
    ) -> Result<ModelCandidate, EngineError> {
        let fit = partition.fit_terms();
        let rows = fit.len().saturating_sub(order);
        if order == 0 || rows < order {
            return Err(EngineError::unstable(
                KIND,
                order,
                format!("{rows} rows cannot determine {order} coefficients"),
            ));
        }

        let mut x = DMatrix::<f64>::zeros(rows, order);
        let mut y = DVector::<f64>::zeros(rows);
        let mut row = vec![0.0; order];
        for r in 0..rows {
            let i = order + r;
            fill_recurrence_row(fit, i, &mut row);
            for (j, v) in row.iter().enumerate() {
                x[(r, j)] = *v;
            }
            y[r] = fit[i] as f64;
        }

        let index_offset = partition.index_offset();
        let beta = solve_guarded(KIND, order, &x, &y, opts)?;
        let snapped = check_residual(KIND, order, &x, &y, &beta, opts)
            .and_then(|()| snap_and_accept(KIND, order, beta.as_slice(), fit, index_offset, order, opts));
        match snapped {
            Ok(model) => Ok(model),
            // Large coefficients can drift past the snapping tolerance; the first
            // `order` rows determine them exactly.
            Err(err) => match exact_coefficients(fit, order) {
                Some(coefficients) => accept_exact(KIND, order, coefficients, fit, index_offset, order, opts)
                    .map_err(|_| err),
                None => Err(err),
            },
        }
    }
}

/// Solve the first `order` recurrence rows over the rationals.
fn exact_coefficients(fit: &[i64], order: usize) -> Option<Vec<Rational>> {
    let rows: Vec<Vec<Rational>> = (order..2 * order)
        .map(|i| (0..order).map(|j| Rational::from(fit[i - 1 - j])).collect())
        .collect();
    let rhs = (order..2 * order).map(|i| Rational::from(fit[i])).collect();
    solve_exact(rows, rhs)
}
