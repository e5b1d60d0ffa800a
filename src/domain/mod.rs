//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - the input sequence (`Sequence`) and configuration (`EngineConfig`)
//! - model families and trial plan entries (`ModelKind`, `Trial`)
//! - engine outputs (`ModelCandidate`, `VerificationResult`, `Conjecture`, `Analysis`)

pub mod types;

pub use types::*;
