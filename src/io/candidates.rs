//! Candidate lists and inline term lists.

use std::path::Path;

use crate::error::AppError;
use crate::io::bfile::validate_id;

/// Read a JSON array of OEIS ids, e.g. `["A000045", "A000290"]`.
pub fn read_candidates(path: &Path) -> Result<Vec<String>, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::new(4, format!("Failed to read candidates '{}': {e}", path.display())))?;
    let ids: Vec<String> = serde_json::from_str(&text)
        .map_err(|e| AppError::new(2, format!("Candidates '{}' is not a JSON id list: {e}", path.display())))?;
    for id in &ids {
        validate_id(id)?;
    }
    Ok(ids)
}

/// Parse `1, 4, 9, 16` (commas and/or whitespace) into terms.
pub fn parse_term_list(raw: &str) -> Result<Vec<i64>, AppError> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<i64>()
                .map_err(|e| AppError::new(2, format!("Invalid term '{t}': {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_lists_accept_commas_and_spaces() {
        assert_eq!(parse_term_list("1,4, 9  16").unwrap(), vec![1, 4, 9, 16]);
        assert_eq!(parse_term_list(" -1 , 0 ").unwrap(), vec![-1, 0]);
        assert!(parse_term_list("1, two").is_err());
    }

    #[test]
    fn candidates_file_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"["A000045", "A000290"]"#).unwrap();
        assert_eq!(read_candidates(&good).unwrap(), vec!["A000045", "A000290"]);

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"["A000045", "fib"]"#).unwrap();
        assert_eq!(read_candidates(&bad).unwrap_err().exit_code(), 2);
    }
}
