//! OEIS b-file parsing.
//!
//! A b-file lists one term per line as `n a(n)`. Blank lines and `#` comments
//! are ignored. The first index becomes the sequence offset and every following
//! index must be the previous one plus one.
//!
//! Terms are `i64`. Many b-files outgrow that (Fibonacci past index 92, powers
//! of two past 62); parsing stops at the first such term and keeps the prefix.

use std::num::IntErrorKind;

use tracing::warn;

use crate::domain::Sequence;
use crate::error::AppError;

/// Validate an OEIS A-number (`A` followed by at least six digits).
pub fn validate_id(id: &str) -> Result<(), AppError> {
    let digits = id.strip_prefix('A').unwrap_or("");
    if digits.len() >= 6 && digits.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AppError::new(2, format!("Invalid OEIS id '{id}' (expected e.g. A000045).")))
    }
}

/// File name of the b-file for `id`: `A000045` -> `b000045.txt`.
pub fn bfile_name(id: &str) -> Result<String, AppError> {
    validate_id(id)?;
    Ok(format!("b{}.txt", &id[1..]))
}

/// Parse b-file text into a sequence named `id`.
pub fn parse_bfile(id: &str, text: &str) -> Result<Sequence, AppError> {
    let mut terms = Vec::new();
    let mut offset = None;
    let mut expected = 0i64;

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let lineno = lineno + 1;
        let mut fields = line.split_whitespace();
        let (Some(n_raw), Some(v_raw)) = (fields.next(), fields.next()) else {
            return Err(AppError::new(
                2,
                format!("{id}: line {lineno}: expected 'n a(n)', got '{line}'"),
            ));
        };

        let n: i64 = n_raw
            .parse()
            .map_err(|e| AppError::new(2, format!("{id}: line {lineno}: invalid index '{n_raw}': {e}")))?;
        let value: i64 = match v_raw.parse() {
            Ok(v) => v,
            Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
                if offset.is_none() {
                    return Err(AppError::new(
                        2,
                        format!("{id}: line {lineno}: term '{v_raw}' does not fit in 64 bits"),
                    ));
                }
                warn!(
                    sequence = id,
                    index = n,
                    kept = terms.len(),
                    "b-file term does not fit in 64 bits; keeping the terms before it"
                );
                break;
            }
            Err(e) => {
                return Err(AppError::new(2, format!("{id}: line {lineno}: term '{v_raw}': {e}")));
            }
        };

        match offset {
            None => offset = Some(n),
            Some(_) if n != expected => {
                return Err(AppError::new(
                    2,
                    format!("{id}: line {lineno}: index {n} breaks the run (expected {expected})"),
                ));
            }
            Some(_) => {}
        }
        expected = n.saturating_add(1);
        terms.push(value);
    }

    let Some(index_offset) = offset else {
        return Err(AppError::new(2, format!("{id}: b-file contains no terms")));
    };
    Ok(Sequence::new(id, terms, index_offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offset_and_skips_comments() {
        let text = "# A000290\n# squares\n\n1 1\n2 4\n3 9\n  4   16  \n";
        let seq = parse_bfile("A000290", text).unwrap();
        assert_eq!(seq.index_offset, 1);
        assert_eq!(seq.terms, vec![1, 4, 9, 16]);
        assert_eq!(seq.id, "A000290");
    }

    #[test]
    fn negative_terms_and_zero_offset() {
        let seq = parse_bfile("A1", "0 -3\n1 0\n2 -7\n").unwrap();
        assert_eq!(seq.index_offset, 0);
        assert_eq!(seq.terms, vec![-3, 0, -7]);
    }

    #[test]
    fn gaps_are_rejected() {
        let err = parse_bfile("A1", "0 1\n1 1\n3 2\n").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("expected 2"), "{err}");
    }

    #[test]
    fn oversized_first_term_is_rejected() {
        let err = parse_bfile("A1", "0 123456789012345678901234567890\n1 1\n").unwrap_err();
        assert!(err.to_string().contains("64 bits"), "{err}");
    }

    #[test]
    fn fibonacci_is_cut_before_the_first_oversized_term() {
        let mut text = String::from("# A000045\n");
        let (mut a, mut b) = (0u128, 1u128);
        for n in 0..100 {
            text.push_str(&format!("{n} {a}\n"));
            (a, b) = (b, a + b);
        }
        let seq = parse_bfile("A000045", &text).unwrap();
        // F(92) = 7540113804746346429 is the last Fibonacci number below 2^63
        assert_eq!(seq.terms.len(), 93);
        assert_eq!(seq.index_offset, 0);
        assert_eq!(seq.terms.last(), Some(&7_540_113_804_746_346_429));
    }

    #[test]
    fn empty_and_malformed_files() {
        assert!(parse_bfile("A1", "# nothing\n").is_err());
        assert!(parse_bfile("A1", "0\n").is_err());
        assert!(parse_bfile("A1", "0 x\n").is_err());
    }

    #[test]
    fn ids_and_file_names() {
        assert_eq!(bfile_name("A000045").unwrap(), "b000045.txt");
        assert_eq!(bfile_name("A1234567").unwrap(), "b1234567.txt");
        assert!(validate_id("A12345").is_err());
        assert!(validate_id("B000045").is_err());
        assert!(validate_id("../etc").is_err());
    }
}
