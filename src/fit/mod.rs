//! Model fitting and conjecture selection.
//!
//! Responsibilities:
//!
//! - split a sequence into fit / verify partitions
//! - fit polynomial, linear-recurrence and exponential models to the fit window
//! - verify candidates on held-out terms and pick the first that generalizes

pub mod exponential;
pub mod fitter;
pub mod partition;
pub mod polynomial;
pub mod recurrence;
pub mod selection;
pub mod verifier;

pub use fitter::*;
pub use partition::*;
pub use selection::*;
pub use verifier::*;
