//! `seq-conjecture` library crate.
//!
//! The binary (`conj`) is a thin wrapper around this library so that:
//!
//! - the engine is testable without spawning processes
//! - term stores and publishers can be swapped without touching the fitters

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
