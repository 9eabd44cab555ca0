use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::MergeError;

/// Destination for the rendered document
pub trait FeedSink {
    fn write(&self, document: &str) -> Result<(), MergeError>;
}

/// Writes the document to a file, creating parent directories and
/// replacing whatever was there before
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FeedSink for FileSink {
    fn write(&self, document: &str) -> Result<(), MergeError> {
        let fail = |source: std::io::Error| MergeError::Output {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent).map_err(fail)?;
            }
        }
        fs::write(&self.path, document).map_err(fail)?;

        tracing::debug!(path = %self.path.display(), bytes = document.len(), "Wrote merged feed");
        Ok(())
    }
}

/// Keeps the last written document in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    document: Mutex<Option<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> Option<String> {
        self.document
            .lock()
            .map(|doc| doc.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl FeedSink for MemorySink {
    fn write(&self, document: &str) -> Result<(), MergeError> {
        let mut slot = self
            .document
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(document.to_string());
        Ok(())
    }
}
