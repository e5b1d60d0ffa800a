//! Fit / verify split of a sequence.
//!
//! The split is computed once per engine run and shared by every trial, so a
//! model is always judged on terms it was not fitted to.

use crate::domain::{ModelKind, Sequence};
use crate::error::EngineError;

/// Slack added before flooring `N * r`, so ratios such as `0.29 * 100` that land
/// just below an integer in binary floating point still split where expected.
const SPLIT_SLACK: f64 = 1e-9;

/// A sequence split into a leading fit window and trailing held-out terms.
///
/// Borrows the terms; `fit_terms() ++ verify_terms()` is always the full sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition<'a> {
    terms: &'a [i64],
    split: usize,
    index_offset: i64,
}

impl<'a> Partition<'a> {
    pub fn fit_terms(&self) -> &'a [i64] {
        &self.terms[..self.split]
    }

    pub fn verify_terms(&self) -> &'a [i64] {
        &self.terms[self.split..]
    }

    /// The whole sequence, for models that read preceding terms.
    pub fn all_terms(&self) -> &'a [i64] {
        self.terms
    }

    pub fn fit_len(&self) -> usize {
        self.split
    }

    pub fn verify_len(&self) -> usize {
        self.terms.len() - self.split
    }

    /// Position of the first held-out term within `all_terms()`.
    pub fn split(&self) -> usize {
        self.split
    }

    /// Absolute index `n` of `all_terms()[pos]`.
    pub fn index_of(&self, pos: usize) -> i64 {
        self.index_offset + pos as i64
    }

    pub fn index_offset(&self) -> i64 {
        self.index_offset
    }
}

/// Number of leading terms that go into the fit window.
pub fn fit_len_for(n_terms: usize, verification_ratio: f64) -> usize {
    let raw = (n_terms as f64 * verification_ratio + SPLIT_SLACK).floor();
    (raw.max(0.0) as usize).min(n_terms)
}

/// Split `sequence` into fit and verify partitions.
///
/// Fails with `InsufficientData` if the verify partition would be empty or if the
/// fit window is smaller than the smallest family in `families` can use.
pub fn partition<'a>(
    sequence: &'a Sequence,
    verification_ratio: f64,
    families: &[ModelKind],
) -> Result<Partition<'a>, EngineError> {
    let n = sequence.terms.len();
    let split = fit_len_for(n, verification_ratio);
    let min_fit = families
        .iter()
        .map(|k| k.min_fit_points())
        .min()
        .unwrap_or(ModelKind::Polynomial.min_fit_points());

    if split < min_fit {
        return Err(EngineError::InsufficientData(format!(
            "{}: fit window has {split} of {n} terms, need at least {min_fit}",
            sequence.id
        )));
    }
    if split >= n {
        return Err(EngineError::InsufficientData(format!(
            "{}: no terms left for verification ({n} terms, ratio {verification_ratio})",
            sequence.id
        )));
    }

    Ok(Partition {
        terms: &sequence.terms,
        split,
        index_offset: sequence.index_offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn squares_split_six_four() {
        let seq = Sequence::new("sq", (1..=10).map(|n| n * n).collect(), 1);
        let p = partition(&seq, 0.6, &ModelKind::ALL).unwrap();
        assert_eq!(p.fit_terms(), &[1, 4, 9, 16, 25, 36]);
        assert_eq!(p.verify_terms(), &[49, 64, 81, 100]);
        assert_eq!(p.index_of(p.split()), 7);
    }

    #[test]
    fn ratio_that_floors_just_below_integer() {
        assert_eq!(fit_len_for(100, 0.29), 29);
        assert_eq!(fit_len_for(10, 0.7), 7);
    }

    #[test]
    fn too_short_is_insufficient_data() {
        let seq = Sequence::new("short", vec![1, 2, 3], 0);
        // floor(3 * 0.5) = 1 fit term
        assert!(matches!(
            partition(&seq, 0.5, &ModelKind::ALL),
            Err(EngineError::InsufficientData(_))
        ));
        // floor(3 * 0.9) = 2 fit terms, 1 verify term
        assert!(partition(&seq, 0.9, &ModelKind::ALL).is_ok());
        // exponential alone needs three fit points
        assert!(partition(&seq, 0.9, &[ModelKind::Exponential]).is_err());
    }

    #[test]
    fn empty_verify_partition_is_insufficient_data() {
        let seq = Sequence::new("s", vec![1, 2, 3, 4], 0);
        assert_eq!(partition(&seq, 0.99, &ModelKind::ALL).unwrap().verify_len(), 1);
        assert!(matches!(
            partition(&seq, 0.999_999_999_9, &ModelKind::ALL),
            Err(EngineError::InsufficientData(_))
        ));
    }

    proptest! {
        #[test]
        fn partition_preserves_order_and_terms(
            terms in prop::collection::vec(any::<i64>(), 0..200),
            ratio in 0.01f64..0.99,
            offset in -5i64..5,
        ) {
            let seq = Sequence::new("p", terms.clone(), offset);
            if let Ok(p) = partition(&seq, ratio, &ModelKind::ALL) {
                let mut joined = p.fit_terms().to_vec();
                joined.extend_from_slice(p.verify_terms());
                prop_assert_eq!(joined, terms.clone());
                prop_assert_eq!(p.fit_len() + p.verify_len(), terms.len());
                prop_assert!(p.fit_len() >= 2 && p.verify_len() >= 1);
                prop_assert_eq!(p.fit_len(), fit_len_for(terms.len(), ratio));
            } else {
                let split = fit_len_for(terms.len(), ratio);
                prop_assert!(split < 2 || split >= terms.len());
            }
        }
    }
}
