//! Synthetic sequences for the self-test.
//!
//! Each generated sequence comes from a known family (or is pure noise), so the
//! engine's recovery and false-positive rates can be measured without network
//! access. Generation is deterministic for a given seed.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Uniform;

use crate::domain::{ModelKind, Sequence};

/// Terms per synthetic sequence.
pub const SYNTH_TERMS: usize = 30;
const NOISE_BOUND: i64 = 1000;
const MAX_REDRAWS: usize = 32;

/// A generated sequence and the family it was drawn from (`None` for noise).
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSequence {
    pub sequence: Sequence,
    pub family: Option<ModelKind>,
}

/// `count` sequences cycling polynomial, recurrence, exponential, noise.
pub fn generate_suite(count: usize, seed: u64) -> Vec<SyntheticSequence> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let id = format!("synth-{i:04}");
            let (terms, offset, family) = match i % 4 {
                0 => (polynomial_terms(&mut rng), 1, Some(ModelKind::Polynomial)),
                1 => (recurrence_terms(&mut rng), 0, Some(ModelKind::LinearRecurrence)),
                2 => (exponential_terms(&mut rng), 0, Some(ModelKind::Exponential)),
                _ => (noise_terms(&mut rng), 0, None),
            };
            SyntheticSequence {
                sequence: Sequence::new(id, terms, offset),
                family,
            }
        })
        .collect()
}

/// Degree 0..=4, integer coefficients in -9..=9, n = 1..=SYNTH_TERMS.
pub fn polynomial_terms(rng: &mut StdRng) -> Vec<i64> {
    let degree = rng.gen_range(0..=4usize);
    let mut coefficients: Vec<i64> = (0..=degree).map(|_| rng.gen_range(-9..=9)).collect();
    if coefficients[degree] == 0 {
        coefficients[degree] = 1;
    }
    (1..=SYNTH_TERMS as i64)
        .map(|n| coefficients.iter().rev().fold(0i64, |acc, c| acc * n + c))
        .collect()
}

/// Order 1..=3 with small coefficients; redrawn until every term fits in `i64`.
pub fn recurrence_terms(rng: &mut StdRng) -> Vec<i64> {
    for _ in 0..MAX_REDRAWS {
        let order = rng.gen_range(1..=3usize);
        let mut coefficients: Vec<i64> = (0..order).map(|_| rng.gen_range(-2..=2)).collect();
        if coefficients[order - 1] == 0 {
            coefficients[order - 1] = 1;
        }
        let seeds: Vec<i64> = (0..order).map(|_| rng.gen_range(-5..=5)).collect();
        if let Some(terms) = run_recurrence(&coefficients, seeds) {
            return terms;
        }
    }
    // Fibonacci fits comfortably.
    run_recurrence(&[1, 1], vec![0, 1]).unwrap_or_default()
}

fn run_recurrence(coefficients: &[i64], mut terms: Vec<i64>) -> Option<Vec<i64>> {
    while terms.len() < SYNTH_TERMS {
        let i = terms.len();
        let mut next = 0i64;
        for (j, c) in coefficients.iter().enumerate() {
            next = next.checked_add(c.checked_mul(terms[i - 1 - j])?)?;
        }
        terms.push(next);
    }
    Some(terms)
}

/// `A·B^n + C` with `|B| in 2..=4`.
pub fn exponential_terms(rng: &mut StdRng) -> Vec<i64> {
    let mut a = rng.gen_range(-5..=5i64);
    if a == 0 {
        a = 1;
    }
    let magnitude = rng.gen_range(2..=4i64);
    let b = if rng.gen_bool(0.25) { -magnitude } else { magnitude };
    let c = rng.gen_range(-10..=10i64);
    // 5 * 4^29 < 2^61
    (0..SYNTH_TERMS as u32).map(|n| a * b.pow(n) + c).collect()
}

/// Independent uniform integers.
pub fn noise_terms(rng: &mut StdRng) -> Vec<i64> {
    let dist = Uniform::new_inclusive(-NOISE_BOUND, NOISE_BOUND);
    (0..SYNTH_TERMS).map(|_| dist.sample(rng)).collect()
}
