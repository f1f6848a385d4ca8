use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output path has no parent directory: {0}")]
    NoParent(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Atomically replaces one file by writing a sibling temp file then renaming it.
///
/// Readers of the target never observe a half-written document.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    target: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(target: PathBuf) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn write(&self, content: &str) -> Result<(), PersistError> {
        let dir = match self.target.parent() {
            Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
            Some(parent) => parent,
            None => {
                return Err(PersistError::NoParent(
                    self.target.display().to_string(),
                ))
            }
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&self.target).map_err(|e| PersistError::Io(e.error))?;
        Ok(())
    }
}
