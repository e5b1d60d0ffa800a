//! b-files read from a local directory.

use std::path::PathBuf;

use tracing::debug;

use crate::data::TermStore;
use crate::domain::Sequence;
use crate::error::AppError;
use crate::io::bfile::{bfile_name, parse_bfile};

/// A directory of `bNNNNNN.txt` files.
#[derive(Debug, Clone)]
pub struct BFileStore {
    dir: PathBuf,
}

impl BFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TermStore for BFileStore {
    fn fetch(&self, id: &str) -> Result<Sequence, AppError> {
        let path = self.dir.join(bfile_name(id)?);
        debug!(path = %path.display(), "reading b-file");
        let text = std::fs::read_to_string(&path)
            .map_err(|e| AppError::new(4, format!("Failed to read b-file '{}': {e}", path.display())))?;
        parse_bfile(id, &text)
    }
}
