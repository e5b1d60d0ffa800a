//! Model family implementations.
//!
//! Models are implemented as small, pure functions so that fitting and
//! verification code can stay generic over the family.

pub mod model;

pub use model::*;
