//! Held-out verification.
//!
//! A candidate is evaluated at every index of the verify partition. Recurrences
//! read the actual preceding terms, which may lie in the fit window. A term
//! passes when the prediction is within `epsilon` of the actual value and rounds
//! to exactly that integer.

use crate::domain::{ModelCandidate, VerificationResult};
use crate::fit::partition::Partition;
use crate::math::Rational;
use crate::models::predict;

pub fn verify(candidate: &ModelCandidate, partition: &Partition<'_>, epsilon: f64) -> VerificationResult {
    let all = partition.all_terms();
    let mut max_absolute_error = 0.0f64;
    let mut all_within_tolerance = true;

    for pos in partition.split()..all.len() {
        let actual = all[pos];
        let (error, exact) = match predict(candidate, partition.index_of(pos), &all[..pos]) {
            Some(p) => {
                let error = p
                    .checked_sub(&Rational::from(actual))
                    .map(|d| d.to_f64().abs())
                    .unwrap_or(f64::INFINITY);
                (error, p.round() == i128::from(actual))
            }
            // Not evaluable here (overflow): counts as a miss.
            None => (f64::INFINITY, false),
        };
        max_absolute_error = max_absolute_error.max(error);
        if !(error <= epsilon && exact) {
            all_within_tolerance = false;
        }
    }

    VerificationResult {
        candidate: candidate.clone(),
        max_absolute_error,
        all_within_tolerance,
        checked_terms: partition.verify_len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelKind, Sequence};
    use crate::fit::partition::partition;

    fn poly(coefficients: &[i128]) -> ModelCandidate {
        ModelCandidate {
            kind: ModelKind::Polynomial,
            complexity: coefficients.len() - 1,
            coefficients: coefficients.iter().map(|&c| Rational::from_int(c)).collect(),
        }
    }

    #[test]
    fn squares_verify_on_held_out_terms() {
        let seq = Sequence::new("sq", (1..=10).map(|n| n * n).collect(), 1);
        let p = partition(&seq, 0.6, &ModelKind::ALL).unwrap();
        let result = verify(&poly(&[0, 0, 1]), &p, 1e-9);
        assert!(result.all_within_tolerance);
        assert_eq!(result.max_absolute_error, 0.0);
        assert_eq!(result.checked_terms, 4);
    }

    #[test]
    fn single_wrong_term_fails() {
        let mut terms: Vec<i64> = (0..10).map(|n| 2 * n + 1).collect();
        terms[9] += 1;
        let seq = Sequence::new("odd", terms, 0);
        let p = partition(&seq, 0.8, &ModelKind::ALL).unwrap();
        let result = verify(&poly(&[1, 2]), &p, 1e-9);
        assert!(!result.all_within_tolerance);
        assert_eq!(result.max_absolute_error, 1.0);
    }

    #[test]
    fn fractional_prediction_is_not_exact() {
        let seq = Sequence::new("s", vec![0, 0, 0, 0, 0], 0);
        let p = partition(&seq, 0.8, &ModelKind::ALL).unwrap();
        let half = ModelCandidate {
            kind: ModelKind::Polynomial,
            complexity: 0,
            coefficients: vec![Rational::new(1, 2).unwrap()],
        };
        // Within a generous epsilon, but 1/2 does not round to 0.
        let result = verify(&half, &p, 0.6);
        assert!(!result.all_within_tolerance);
    }

    #[test]
    fn recurrence_reads_terms_from_fit_window() {
        let seq = Sequence::new("fib", vec![1, 1, 2, 3, 5, 8, 13, 21, 34, 55], 0);
        let p = partition(&seq, 0.8, &ModelKind::ALL).unwrap();
        let fib = ModelCandidate {
            kind: ModelKind::LinearRecurrence,
            complexity: 2,
            coefficients: vec![Rational::ONE, Rational::ONE],
        };
        let result = verify(&fib, &p, 1e-9);
        assert!(result.all_within_tolerance);
        assert_eq!(result.checked_terms, 2);
    }
}
