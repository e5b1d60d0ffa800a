//! Exact rational numbers over `i128`.
//!
//! Fitted coefficients come out of the least-squares solver as floats. Before a
//! candidate is accepted, each coefficient is snapped to a nearby low-denominator
//! rational and the model is re-evaluated exactly, so acceptance never depends
//! on floating-point round-off.
//!
//! All arithmetic is checked: an overflow yields `None` and the caller treats the
//! prediction as failed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Magnitude beyond which an `f64` carries no fractional information.
const F64_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0; // 2^53

/// Largest magnitude we accept when converting from `f64`.
const F64_CONVERT_LIMIT: f64 = 1e36;

/// Continued-fraction expansion depth cap.
const MAX_CF_TERMS: usize = 64;

/// A reduced fraction `num/den` with `den > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Rational {
    num: i128,
    den: i128,
}

impl Rational {
    pub const ZERO: Rational = Rational { num: 0, den: 1 };
    pub const ONE: Rational = Rational { num: 1, den: 1 };

    /// Build `num/den` in lowest terms. Returns `None` for a zero denominator
    /// or when normalizing the sign would overflow.
    pub fn new(num: i128, den: i128) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let g = gcd(num, den);
        let (mut num, mut den) = (num / g as i128, den / g as i128);
        if den < 0 {
            num = num.checked_neg()?;
            den = den.checked_neg()?;
        }
        Some(Self { num, den })
    }

    pub const fn from_int(value: i128) -> Self {
        Self { num: value, den: 1 }
    }

    pub fn numer(&self) -> i128 {
        self.num
    }

    pub fn denom(&self) -> i128 {
        self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    pub fn is_integer(&self) -> bool {
        self.den == 1
    }

    pub fn is_one(&self) -> bool {
        self.num == 1 && self.den == 1
    }

    pub fn is_negative(&self) -> bool {
        self.num < 0
    }

    pub fn checked_abs(&self) -> Option<Self> {
        Some(Self {
            num: self.num.checked_abs()?,
            den: self.den,
        })
    }

    pub fn checked_neg(&self) -> Option<Self> {
        Some(Self {
            num: self.num.checked_neg()?,
            den: self.den,
        })
    }

    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        let g = gcd(self.den, other.den) as i128;
        let lhs = self.num.checked_mul(other.den / g)?;
        let rhs = other.num.checked_mul(self.den / g)?;
        let den = (self.den / g).checked_mul(other.den)?;
        Self::new(lhs.checked_add(rhs)?, den)
    }

    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        self.checked_add(&other.checked_neg()?)
    }

    pub fn checked_mul(&self, other: &Self) -> Option<Self> {
        // Cross-reduce first to keep intermediates small.
        let g1 = gcd(self.num, other.den) as i128;
        let g2 = gcd(other.num, self.den) as i128;
        let num = (self.num / g1).checked_mul(other.num / g2)?;
        let den = (self.den / g2).checked_mul(other.den / g1)?;
        Self::new(num, den)
    }

    pub fn checked_div(&self, other: &Self) -> Option<Self> {
        if other.is_zero() {
            return None;
        }
        let recip = Self::new(other.den, other.num)?;
        self.checked_mul(&recip)
    }

    /// `self^exp` for a signed exponent. `0^negative` is `None`.
    pub fn checked_pow(&self, exp: i64) -> Option<Self> {
        let base = if exp < 0 {
            if self.is_zero() {
                return None;
            }
            Self::new(self.den, self.num)?
        } else {
            *self
        };
        let e = u32::try_from(exp.unsigned_abs()).ok()?;
        Some(Self {
            num: base.num.checked_pow(e)?,
            den: base.den.checked_pow(e)?,
        })
    }

    /// Nearest integer, halves rounded away from zero.
    pub fn round(&self) -> i128 {
        let q = self.num.div_euclid(self.den);
        let r = self.num.rem_euclid(self.den);
        // r in [0, den): compare r against den - r.
        match r.cmp(&(self.den - r)) {
            std::cmp::Ordering::Less => q,
            std::cmp::Ordering::Greater => q + 1,
            std::cmp::Ordering::Equal => {
                if self.num < 0 {
                    q
                } else {
                    q + 1
                }
            }
        }
    }

    pub fn to_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Best rational approximation of `x` with denominator at most `max_den`.
    ///
    /// Walks the continued-fraction convergents of `x` and returns the first one
    /// within `tol * max(1, |x|)` of `x`. Returns `None` when no convergent with an
    /// admissible denominator is close enough, or when `x` is not finite.
    pub fn approximate(x: f64, max_den: i128, tol: f64) -> Option<Self> {
        if !x.is_finite() || x.abs() > F64_CONVERT_LIMIT || max_den < 1 {
            return None;
        }
        let bound = tol * x.abs().max(1.0);
        if x.abs() >= F64_INTEGER_LIMIT {
            return Some(Self::from_int(x.round() as i128));
        }

        let a0 = x.floor();
        let (mut h_prev, mut h) = (1i128, a0 as i128);
        let (mut k_prev, mut k) = (0i128, 1i128);
        let mut frac = x - a0;

        for _ in 0..MAX_CF_TERMS {
            if (x - h as f64 / k as f64).abs() <= bound {
                return Self::new(h, k);
            }
            if frac.abs() < f64::EPSILON {
                break;
            }
            let inv = 1.0 / frac;
            if !inv.is_finite() || inv > F64_INTEGER_LIMIT {
                break;
            }
            let a = inv.floor();
            frac = inv - a;
            let a = a as i128;

            let h_next = a.checked_mul(h)?.checked_add(h_prev)?;
            let k_next = a.checked_mul(k)?.checked_add(k_prev)?;
            if k_next > max_den {
                break;
            }
            (h_prev, h) = (h, h_next);
            (k_prev, k) = (k, k_next);
        }
        None
    }
}

impl From<i64> for Rational {
    fn from(value: i64) -> Self {
        Self::from_int(value as i128)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

impl From<Rational> for String {
    fn from(value: Rational) -> Self {
        value.to_string()
    }
}

impl FromStr for Rational {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (num, den) = match s.split_once('/') {
            Some((n, d)) => (n.trim(), d.trim()),
            None => (s, "1"),
        };
        let num: i128 = num.parse().map_err(|e| format!("Invalid numerator in '{s}': {e}"))?;
        let den: i128 = den.parse().map_err(|e| format!("Invalid denominator in '{s}': {e}"))?;
        Rational::new(num, den).ok_or_else(|| format!("Invalid rational '{s}'"))
    }
}

impl TryFrom<String> for Rational {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Solve the square system `rows · x = rhs` exactly by Gaussian elimination.
///
/// Returns `None` if the system is singular, not square, or an intermediate
/// value overflows `i128`.
pub fn solve_exact(mut rows: Vec<Vec<Rational>>, mut rhs: Vec<Rational>) -> Option<Vec<Rational>> {
    let n = rhs.len();
    if rows.len() != n || rows.iter().any(|r| r.len() != n) {
        return None;
    }

    for col in 0..n {
        let pivot = (col..n).find(|&r| !rows[r][col].is_zero())?;
        rows.swap(col, pivot);
        rhs.swap(col, pivot);
        for r in col + 1..n {
            if rows[r][col].is_zero() {
                continue;
            }
            let factor = rows[r][col].checked_div(&rows[col][col])?;
            for j in col..n {
                let delta = factor.checked_mul(&rows[col][j])?;
                rows[r][j] = rows[r][j].checked_sub(&delta)?;
            }
            rhs[r] = rhs[r].checked_sub(&factor.checked_mul(&rhs[col])?)?;
        }
    }

    let mut x = vec![Rational::ZERO; n];
    for i in (0..n).rev() {
        let mut acc = rhs[i];
        for j in i + 1..n {
            acc = acc.checked_sub(&rows[i][j].checked_mul(&x[j])?)?;
        }
        x[i] = acc.checked_div(&rows[i][i])?;
    }
    Some(x)
}

fn gcd(a: i128, b: i128) -> u128 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    // gcd(0, 0) only arises for 0/0, which `new` rejects before dividing.
    a.max(1)
}
