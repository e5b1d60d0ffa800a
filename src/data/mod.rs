//! Sequence sources.
//!
//! - local b-file directory (`local`)
//! - OEIS over HTTP (`oeis`)
//! - synthetic sequences for self-tests (`synth`)

use crate::domain::Sequence;
use crate::error::AppError;

pub mod local;
pub mod oeis;
pub mod synth;

pub use local::*;
pub use oeis::*;
pub use synth::*;

/// Anything that can supply the terms of a sequence by id.
pub trait TermStore {
    fn fetch(&self, id: &str) -> Result<Sequence, AppError>;
}
