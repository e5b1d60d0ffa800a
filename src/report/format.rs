//! Formatted terminal output and markdown reports.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized

use chrono::{DateTime, Utc};

use crate::domain::{Analysis, Conjecture, Outcome, SequenceReport, TrialStatus};
use crate::report::formula::{FormulaStyle, render_formula};
use crate::report::{BatchSummary, SelfTestTally};

/// Full per-sequence summary: partition sizes, every trial, and the outcome.
pub fn format_analysis(analysis: &Analysis) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} ===\n", analysis.sequence_id));
    out.push_str(&format!(
        "Terms: n={} | fit={} | verify={}\n",
        analysis.n_terms, analysis.fit_len, analysis.verify_len
    ));

    out.push_str("\nTrials:\n");
    for t in &analysis.trials {
        let label = format!("{} {} {}", t.kind.display_name(), t.kind.complexity_label(), t.complexity);
        let (mark, detail) = match &t.status {
            TrialStatus::Verified => ("*", "verified".to_string()),
            TrialStatus::RejectedByVerifier { max_absolute_error } => {
                (" ", format!("rejected on held-out terms (max |err| {max_absolute_error:.3e})"))
            }
            TrialStatus::Skipped { reason } => (" ", format!("skipped: {reason}")),
        };
        out.push_str(&format!("{mark} {:<28} {detail}\n", truncate(&label, 28)));
    }
    if analysis.trials.is_empty() {
        out.push_str("  (none)\n");
    }

    out.push('\n');
    match &analysis.outcome {
        Outcome::Conjecture(c) => {
            out.push_str(&format!("Conjecture: {}\n", c.formula));
            out.push_str(&format!(
                "- {} ({} {})\n",
                c.model.kind.display_name(),
                c.model.kind.complexity_label(),
                c.model.complexity
            ));
            out.push_str(&format!("- coefficients: {}\n", fmt_coefficients(c)));
            out.push_str(&format!(
                "- verified on {} held-out terms (max |err| {:.3e})\n",
                c.verification.checked_terms, c.verification.max_absolute_error
            ));
        }
        Outcome::NoConjecture { budget_exhausted: true } => {
            out.push_str(&format!(
                "No conjecture found (time budget exhausted after {} trials).\n",
                analysis.trials.len()
            ));
        }
        Outcome::NoConjecture { budget_exhausted: false } => {
            out.push_str(&format!(
                "No conjecture found ({} trials attempted).\n",
                analysis.trials.len()
            ));
        }
    }

    out
}

pub fn format_report(report: &SequenceReport) -> String {
    match report {
        SequenceReport::Analyzed(a) => format_analysis(a),
        SequenceReport::Skipped { sequence_id, reason } => {
            format!("=== {sequence_id} ===\nSkipped: {reason}\n")
        }
    }
}

/// One row per sequence plus a totals line.
pub fn format_batch_table(reports: &[SequenceReport]) -> String {
    let mut out = String::new();
    out.push_str(format!("{:<14} {:>6} {:<14} {:<40}\n", "id", "terms", "result", "formula").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<14} {:-<6} {:-<14} {:-<40}\n", "", "", "", "").trim_end());
    out.push('\n');

    for r in reports {
        let (terms, result, detail) = match r {
            SequenceReport::Analyzed(a) => match &a.outcome {
                Outcome::Conjecture(c) => (a.n_terms.to_string(), "conjecture", c.formula.clone()),
                Outcome::NoConjecture { budget_exhausted: true } => {
                    (a.n_terms.to_string(), "budget", String::new())
                }
                Outcome::NoConjecture { budget_exhausted: false } => {
                    (a.n_terms.to_string(), "none", String::new())
                }
            },
            SequenceReport::Skipped { reason, .. } => ("-".to_string(), "skipped", reason.clone()),
        };
        out.push_str(
            format!(
                "{:<14} {:>6} {:<14} {}\n",
                truncate(r.sequence_id(), 14),
                terms,
                result,
                detail
            )
            .trim_end(),
        );
        out.push('\n');
    }

    let s = BatchSummary::from_reports(reports);
    out.push_str(&format!(
        "\n{} sequences: {} conjectures, {} without conjecture ({} out of time), {} skipped\n",
        s.total, s.conjectures, s.no_conjecture, s.budget_exhausted, s.skipped
    ));
    out
}

pub fn format_selftest(tallies: &[SelfTestTally]) -> String {
    let mut out = String::new();
    out.push_str("=== conj selftest ===\n");
    out.push_str(format!("{:<20} {:>9} {:>11} {:>11}\n", "family", "generated", "conjecture", "same family").trim_end());
    out.push('\n');
    for t in tallies {
        let name = t.family.map(|k| k.display_name()).unwrap_or("noise");
        out.push_str(&format!(
            "{:<20} {:>9} {:>11} {:>11}\n",
            name, t.generated, t.conjectured, t.same_family
        ));
    }
    out
}

/// Markdown report for a published conjecture.
pub fn render_markdown(analysis: &Analysis, conjecture: &Conjecture, generated_at: DateTime<Utc>) -> String {
    let id = &conjecture.sequence_id;
    let latex = render_formula(&conjecture.model, FormulaStyle::Latex);
    let m = &conjecture.model;

    let mut out = String::new();
    out.push_str(&format!("# Conjecture for sequence {id}\n\n"));
    if crate::io::bfile::validate_id(id).is_ok() {
        out.push_str(&format!("Sequence: [{id}](https://oeis.org/{id})\n\n"));
    }
    out.push_str("## Formula\n\n");
    out.push_str(&format!("- **Type:** {}\n", m.kind.display_name()));
    out.push_str(&format!(
        "- **Complexity:** {} {}\n",
        m.kind.complexity_label(),
        m.complexity
    ));
    out.push_str(&format!("- **Formula:** `{}`\n", conjecture.formula));
    out.push_str(&format!("- **Formula (LaTeX):** ${latex}$\n"));
    out.push_str(&format!("- **Coefficients:** {}\n\n", fmt_coefficients(conjecture)));
    out.push_str("## Verification\n\n");
    out.push_str(&format!(
        "Fitted on the first {} of {} terms and checked exactly against the remaining {} \
         (max absolute error {:.3e}).\n\n",
        analysis.fit_len,
        analysis.n_terms,
        conjecture.verification.checked_terms,
        conjecture.verification.max_absolute_error
    ));
    out.push_str("---\n");
    out.push_str(&format!("*Generated by conj on {}.*\n", generated_at.format("%Y-%m-%d %H:%M UTC")));
    out
}

fn fmt_coefficients(c: &Conjecture) -> String {
    let parts: Vec<String> = c.model.coefficients.iter().map(|r| r.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::domain::{EngineConfig, Sequence};
    use crate::fit::ConjectureEngine;

    fn squares_analysis() -> Analysis {
        let engine = ConjectureEngine::new(EngineConfig {
            verification_ratio: 0.6,
            ..EngineConfig::default()
        })
        .unwrap();
        engine
            .analyze(&Sequence::new("A000290", (1..=10).map(|n| n * n).collect(), 1))
            .unwrap()
    }

    #[test]
    fn analysis_summary_lists_trials_and_formula() {
        let text = format_analysis(&squares_analysis());
        assert!(text.contains("=== A000290 ==="));
        assert!(text.contains("Terms: n=10 | fit=6 | verify=4"));
        assert!(text.contains("* polynomial degree 2"));
        assert!(text.contains("Conjecture: a(n) = n^2"));
        assert!(text.contains("coefficients: [0, 0, 1]"));
    }

    #[test]
    fn batch_table_keeps_order_and_totals() {
        let reports = vec![
            SequenceReport::Analyzed(squares_analysis()),
            SequenceReport::Skipped {
                sequence_id: "A000001".to_string(),
                reason: "only 3 terms".to_string(),
            },
        ];
        let text = format_batch_table(&reports);
        let a = text.find("A000290").unwrap();
        let b = text.find("A000001").unwrap();
        assert!(a < b);
        assert!(text.contains("2 sequences: 1 conjectures, 0 without conjecture (0 out of time), 1 skipped"));
    }

    #[test]
    fn markdown_report_has_latex_and_link() {
        let analysis = squares_analysis();
        let conj = analysis.outcome.conjecture().unwrap();
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let md = render_markdown(&analysis, conj, at);
        assert!(md.contains("[A000290](https://oeis.org/A000290)"));
        assert!(md.contains("$a(n) = n^{2}$"));
        assert!(md.contains("first 6 of 10 terms"));
        assert!(md.contains("2025-01-02 03:04 UTC"));
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("A000045", 14), "A000045");
        assert_eq!(truncate("synthetic-sequence", 8), "synthet.");
    }
}
