//! Canonical formula strings for fitted models.
//!
//! Rendering is a pure function of the coefficients: terms go from the highest
//! power (or most recent lag) down, zero terms are dropped, unit coefficients are
//! elided and signs are folded into ` + ` / ` - ` separators. Two runs on the same
//! sequence therefore produce byte-identical reports.

use crate::domain::{ModelCandidate, ModelKind};
use crate::math::Rational;

/// Output flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaStyle {
    /// `a(n) = 3*n^2 - n + 1`
    Plain,
    /// `a(n) = 3 n^{2} - n + 1`
    Latex,
}

/// Render `model` as `a(n) = ...`.
pub fn render_formula(model: &ModelCandidate, style: FormulaStyle) -> String {
    let rhs = match model.kind {
        ModelKind::Polynomial => polynomial(&model.coefficients, style),
        ModelKind::LinearRecurrence => recurrence(&model.coefficients, style),
        ModelKind::Exponential => exponential(&model.coefficients, style),
    };
    format!("a(n) = {rhs}")
}

fn polynomial(coefficients: &[Rational], style: FormulaStyle) -> String {
    let terms = coefficients.iter().enumerate().rev().map(|(power, c)| {
        let body = match (power, style) {
            (0, _) => None,
            (1, _) => Some("n".to_string()),
            (p, FormulaStyle::Plain) => Some(format!("n^{p}")),
            (p, FormulaStyle::Latex) => Some(format!("n^{{{p}}}")),
        };
        (*c, body)
    });
    let glue = match style {
        FormulaStyle::Plain => "*",
        FormulaStyle::Latex => " ",
    };
    join_terms(terms, style, glue)
}

fn recurrence(coefficients: &[Rational], style: FormulaStyle) -> String {
    let terms = coefficients
        .iter()
        .enumerate()
        .map(|(j, c)| (*c, Some(format!("a(n-{})", j + 1))));
    join_terms(terms, style, product_glue(style))
}

fn exponential(coefficients: &[Rational], style: FormulaStyle) -> String {
    let [a, b, c] = coefficients else {
        return "0".to_string();
    };
    let power = match style {
        FormulaStyle::Plain => format!("{}^n", base(b, style)),
        FormulaStyle::Latex => format!("{}^{{n}}", base(b, style)),
    };
    join_terms([(*a, Some(power)), (*c, None)], style, product_glue(style))
}

fn product_glue(style: FormulaStyle) -> &'static str {
    match style {
        FormulaStyle::Plain => "*",
        FormulaStyle::Latex => r" \cdot ",
    }
}

/// The base of `B^n`, parenthesised unless it is a positive integer.
fn base(b: &Rational, style: FormulaStyle) -> String {
    let sign = if b.is_negative() { "-" } else { "" };
    let text = format!("{sign}{}", magnitude(b, style));
    if b.is_integer() && !b.is_negative() {
        text
    } else {
        match style {
            FormulaStyle::Plain => format!("({text})"),
            FormulaStyle::Latex => format!(r"\left({text}\right)"),
        }
    }
}

fn magnitude(c: &Rational, style: FormulaStyle) -> String {
    let num = c.numer().unsigned_abs();
    let den = c.denom();
    match style {
        _ if den == 1 => num.to_string(),
        FormulaStyle::Plain => format!("{num}/{den}"),
        FormulaStyle::Latex => format!(r"\frac{{{num}}}{{{den}}}"),
    }
}

/// Join `(coefficient, body)` pairs; a `None` body is a constant term.
fn join_terms(
    terms: impl IntoIterator<Item = (Rational, Option<String>)>,
    style: FormulaStyle,
    glue: &str,
) -> String {
    let mut out = String::new();
    for (c, body) in terms {
        if c.is_zero() {
            continue;
        }
        let text = match body {
            None => magnitude(&c, style),
            Some(body) if c.numer().unsigned_abs() == 1 && c.denom() == 1 => body,
            Some(body) => format!("{}{glue}{body}", magnitude(&c, style)),
        };
        match (out.is_empty(), c.is_negative()) {
            (true, false) => out.push_str(&text),
            (true, true) => {
                out.push('-');
                out.push_str(&text);
            }
            (false, false) => {
                out.push_str(" + ");
                out.push_str(&text);
            }
            (false, true) => {
                out.push_str(" - ");
                out.push_str(&text);
            }
        }
    }
    if out.is_empty() {
        out.push('0');
    }
    out
}
