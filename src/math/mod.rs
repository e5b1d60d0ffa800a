//! Mathematical utilities: conditioned least squares and exact rationals.

pub mod ols;
pub mod rational;

pub use ols::*;
pub use rational::*;
