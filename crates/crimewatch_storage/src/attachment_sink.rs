#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use crimewatch_kernel_contracts::report::AttachmentRef;
use tracing::debug;

use crate::StorageError;

/// Directory of uploaded blobs. Same-named uploads overwrite each other.
#[derive(Debug, Clone)]
pub struct AttachmentSink {
    dir: PathBuf,
}

impl AttachmentSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|err| StorageError::io(&self.dir, err))
    }

    /// Writes `bytes` unchanged under the final component of `filename`.
    ///
    /// Returns `None` when there is nothing to store: an empty name, a name with no usable
    /// final component, or an empty body.
    pub fn store(&self, filename: &str, bytes: &[u8]) -> Result<Option<AttachmentRef>, StorageError> {
        if filename.is_empty() || bytes.is_empty() {
            return Ok(None);
        }
        let Some(name) = final_component(filename) else {
            return Ok(None);
        };
        self.ensure_dir()?;
        let path = self.dir.join(name);
        fs::write(&path, bytes).map_err(|err| StorageError::io(&path, err))?;
        debug!(path = %path.display(), bytes = bytes.len(), "stored attachment");
        Ok(Some(AttachmentRef::Stored(path.display().to_string())))
    }
}

fn final_component(filename: &str) -> Option<&str> {
    let name = filename.rsplit(['/', '\\']).next()?.trim();
    match name {
        "" | "." | ".." => None,
        _ => Some(name),
    }
}
