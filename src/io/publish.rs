//! Publishing conjectures as markdown reports.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::{Analysis, Conjecture};
use crate::error::AppError;
use crate::report::render_markdown;

/// Destination for verified conjectures.
pub trait Publisher {
    /// Publish one conjecture; returns where it went.
    fn publish(&self, analysis: &Analysis, conjecture: &Conjecture) -> Result<PathBuf, AppError>;
}

/// Writes `<dir>/<sequence id>.md`.
#[derive(Debug, Clone)]
pub struct MarkdownPublisher {
    dir: PathBuf,
    generated_at: DateTime<Utc>,
}

impl MarkdownPublisher {
    pub fn new(dir: impl Into<PathBuf>, generated_at: DateTime<Utc>) -> Self {
        Self {
            dir: dir.into(),
            generated_at,
        }
    }
}

impl Publisher for MarkdownPublisher {
    fn publish(&self, analysis: &Analysis, conjecture: &Conjecture) -> Result<PathBuf, AppError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            AppError::new(4, format!("Failed to create reports dir '{}': {e}", self.dir.display()))
        })?;
        let file_name: String = conjecture
            .sequence_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let path = self.dir.join(format!("{file_name}.md"));
        std::fs::write(&path, render_markdown(analysis, conjecture, self.generated_at))
            .map_err(|e| AppError::new(4, format!("Failed to write report '{}': {e}", path.display())))?;
        info!(sequence = %conjecture.sequence_id, path = %path.display(), "report written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EngineConfig, Sequence};
    use crate::fit::ConjectureEngine;

    #[test]
    fn writes_one_file_per_conjecture() {
        let dir = tempfile::tempdir().unwrap();
        let reports = dir.path().join("reports");
        let engine = ConjectureEngine::new(EngineConfig::default()).unwrap();
        let analysis = engine
            .analyze(&Sequence::new("A005408", (0..20).map(|n| 2 * n + 1).collect(), 0))
            .unwrap();
        let conj = analysis.outcome.conjecture().unwrap();

        let path = MarkdownPublisher::new(&reports, Utc::now())
            .publish(&analysis, conj)
            .unwrap();
        assert_eq!(path, reports.join("A005408.md"));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("`a(n) = 2*n + 1`"));
    }
}
