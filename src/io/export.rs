//! Export analyses to JSON.
//!
//! The export carries the configuration it was produced with, so a result file
//! is enough to reproduce a run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{EngineConfig, SequenceReport};
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct ExportFile<'a> {
    tool: &'static str,
    generated_at: DateTime<Utc>,
    config: &'a EngineConfig,
    reports: &'a [SequenceReport],
}

/// Write every report as pretty JSON.
pub fn write_reports_json(
    path: &Path,
    reports: &[SequenceReport],
    config: &EngineConfig,
    generated_at: DateTime<Utc>,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export '{}': {e}", path.display())))?;
    let export = ExportFile {
        tool: "conj",
        generated_at,
        config,
        reports,
    };
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &export)
        .map_err(|e| AppError::new(4, format!("Failed to write export '{}': {e}", path.display())))?;
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to write export '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Analysis, Outcome};

    #[test]
    fn export_contains_every_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let reports = vec![
            SequenceReport::Analyzed(Analysis {
                sequence_id: "A1".to_string(),
                n_terms: 10,
                fit_len: 8,
                verify_len: 2,
                outcome: Outcome::NoConjecture {
                    budget_exhausted: false,
                },
                trials: Vec::new(),
            }),
            SequenceReport::Skipped {
                sequence_id: "A2".to_string(),
                reason: "too short".to_string(),
            },
        ];

        write_reports_json(&path, &reports, &EngineConfig::default(), Utc::now()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let out = value["reports"].as_array().unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["kind"], "analyzed");
        assert_eq!(out[0]["outcome"]["result"], "no_conjecture");
        assert_eq!(out[1]["kind"], "skipped");
        assert_eq!(value["config"]["max_denominator"], 5040);
    }
}
