//! Reporting utilities: formula rendering, batch tallies and formatted output.

use serde::Serialize;

use crate::data::SyntheticSequence;
use crate::domain::{ModelKind, Outcome, SequenceReport};

pub mod format;
pub mod formula;

pub use format::*;
pub use formula::*;

/// Counts over a batch of reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub conjectures: usize,
    pub no_conjecture: usize,
    pub budget_exhausted: usize,
    pub skipped: usize,
}

impl BatchSummary {
    pub fn from_reports(reports: &[SequenceReport]) -> Self {
        let mut s = BatchSummary {
            total: reports.len(),
            ..BatchSummary::default()
        };
        for r in reports {
            match r {
                SequenceReport::Skipped { .. } => s.skipped += 1,
                SequenceReport::Analyzed(a) => match &a.outcome {
                    Outcome::Conjecture(_) => s.conjectures += 1,
                    Outcome::NoConjecture { budget_exhausted } => {
                        s.no_conjecture += 1;
                        if *budget_exhausted {
                            s.budget_exhausted += 1;
                        }
                    }
                },
            }
        }
        s
    }
}

/// Self-test counts for one generating family (`None` = noise).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfTestTally {
    pub family: Option<ModelKind>,
    pub generated: usize,
    /// Sequences for which any conjecture was found.
    pub conjectured: usize,
    /// Conjectures whose family matches the generating family.
    pub same_family: usize,
}

/// Tally self-test outcomes; `reports[i]` must belong to `suite[i]`.
pub fn tally_selftest(suite: &[SyntheticSequence], reports: &[SequenceReport]) -> Vec<SelfTestTally> {
    let families = [
        Some(ModelKind::Polynomial),
        Some(ModelKind::LinearRecurrence),
        Some(ModelKind::Exponential),
        None,
    ];
    families
        .into_iter()
        .map(|family| {
            let mut tally = SelfTestTally {
                family,
                generated: 0,
                conjectured: 0,
                same_family: 0,
            };
            for (synth, report) in suite.iter().zip(reports) {
                if synth.family != family {
                    continue;
                }
                tally.generated += 1;
                if let Some(c) = report.conjecture() {
                    tally.conjectured += 1;
                    if Some(c.model.kind) == family {
                        tally.same_family += 1;
                    }
                }
            }
            tally
        })
        .collect()
}
