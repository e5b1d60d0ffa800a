//! Model evaluation for the polynomial / recurrence / exponential families.
//!
//! The fitters rely on two primitive operations:
//! - build a design row for a given abscissa or index (for least squares)
//! - predict `a(n)` exactly given rational coefficients (for acceptance and verification)
//!
//! These are implemented here for each model kind.

use crate::domain::{ModelCandidate, ModelKind};
use crate::math::Rational;

/// Fill the polynomial design row `[1, x, x^2, .., x^d]` (length `out.len()`).
pub fn fill_polynomial_row(x: f64, out: &mut [f64]) {
    let mut power = 1.0;
    for slot in out.iter_mut() {
        *slot = power;
        power *= x;
    }
}

/// Fill the recurrence design row `[a(i-1), a(i-2), .., a(i-k)]` (length `out.len()`).
///
/// # Panics
/// Panics if `i < out.len()`. Callers only build rows with `k` preceding terms.
pub fn fill_recurrence_row(terms: &[i64], i: usize, out: &mut [f64]) {
    for (j, slot) in out.iter_mut().enumerate() {
        *slot = terms[i - 1 - j] as f64;
    }
}

/// Predict `a(n)` exactly.
///
/// `preceding` holds the actual terms before `n` (most recent last); only the
/// recurrence family reads it. Returns `None` if the model cannot be evaluated
/// at `n` (too few preceding terms, malformed coefficients) or the evaluation
/// overflows.
pub fn predict(model: &ModelCandidate, n: i64, preceding: &[i64]) -> Option<Rational> {
    match model.kind {
        ModelKind::Polynomial => predict_polynomial(&model.coefficients, n),
        ModelKind::LinearRecurrence => predict_recurrence(&model.coefficients, preceding),
        ModelKind::Exponential => predict_exponential(&model.coefficients, n),
    }
}

fn predict_polynomial(coefficients: &[Rational], n: i64) -> Option<Rational> {
    // Horner, highest power first.
    let x = Rational::from(n);
    let mut acc = Rational::ZERO;
    for c in coefficients.iter().rev() {
        acc = acc.checked_mul(&x)?.checked_add(c)?;
    }
    Some(acc)
}

fn predict_recurrence(coefficients: &[Rational], preceding: &[i64]) -> Option<Rational> {
    let k = coefficients.len();
    if k == 0 || preceding.len() < k {
        return None;
    }
    let mut acc = Rational::ZERO;
    for (j, c) in coefficients.iter().enumerate() {
        let prev = Rational::from(preceding[preceding.len() - 1 - j]);
        acc = acc.checked_add(&c.checked_mul(&prev)?)?;
    }
    Some(acc)
}

fn predict_exponential(coefficients: &[Rational], n: i64) -> Option<Rational> {
    let [a, b, c] = coefficients else {
        return None;
    };
    a.checked_mul(&b.checked_pow(n)?)?.checked_add(c)
}

/// `true` if `model` reproduces every term of `terms[from..]` exactly, where
/// `terms[0]` is `a(index_offset)`.
pub fn reproduces(model: &ModelCandidate, terms: &[i64], index_offset: i64, from: usize) -> bool {
    (from..terms.len()).all(|i| {
        let n = index_offset + i as i64;
        matches!(
            predict(model, n, &terms[..i]),
            Some(p) if p == Rational::from(terms[i])
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i128]) -> Vec<Rational> {
        values.iter().map(|&v| Rational::from_int(v)).collect()
    }

    #[test]
    fn polynomial_row_and_prediction_agree() {
        let model = ModelCandidate {
            kind: ModelKind::Polynomial,
            complexity: 2,
            coefficients: ints(&[1, -1, 3]),
        };
        let mut row = [0.0; 3];
        fill_polynomial_row(4.0, &mut row);
        assert_eq!(row, [1.0, 4.0, 16.0]);
        assert_eq!(predict(&model, 4, &[]), Some(Rational::from_int(45)));
    }

    #[test]
    fn recurrence_uses_preceding_terms() {
        let fib = ModelCandidate {
            kind: ModelKind::LinearRecurrence,
            complexity: 2,
            coefficients: ints(&[1, 1]),
        };
        let terms = [0, 1, 1, 2, 3, 5];
        assert_eq!(predict(&fib, 6, &terms), Some(Rational::from_int(8)));
        assert_eq!(predict(&fib, 1, &terms[..1]), None);
        assert!(reproduces(&fib, &terms, 0, 2));

        let mut row = [0.0; 2];
        fill_recurrence_row(&terms, 5, &mut row);
        assert_eq!(row, [3.0, 2.0]);
    }

    #[test]
    fn exponential_handles_rational_parameters() {
        // (3^n - 1) / 2
        let model = ModelCandidate {
            kind: ModelKind::Exponential,
            complexity: 1,
            coefficients: vec![
                Rational::new(1, 2).unwrap(),
                Rational::from_int(3),
                Rational::new(-1, 2).unwrap(),
            ],
        };
        assert_eq!(predict(&model, 3, &[]), Some(Rational::from_int(13)));
        assert!(reproduces(&model, &[0, 1, 4, 13, 40], 0, 0));
        assert!(!reproduces(&model, &[0, 1, 4, 13, 41], 0, 0));
    }
}
