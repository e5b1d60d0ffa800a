//! Input/output helpers.
//!
//! - b-file parsing and id validation (`bfile`)
//! - candidate id lists and inline term lists (`candidates`)
//! - engine configuration files (`settings`)
//! - JSON exports (`export`)
//! - markdown conjecture reports (`publish`)

pub mod bfile;
pub mod candidates;
pub mod export;
pub mod publish;
pub mod settings;

pub use bfile::*;
pub use candidates::*;
pub use export::*;
pub use publish::*;
pub use settings::*;
