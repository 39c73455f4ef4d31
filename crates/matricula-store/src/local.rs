//! Progress persisted as a single JSON file on local disk.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use matricula_core::ProgressStore;
use tempfile::NamedTempFile;
use tracing::info;

use crate::backend::{ProgressBackend, decode, encode};
use crate::StoreError;

/// File name used when no path is configured, relative to the working directory.
pub const DEFAULT_PROGRESS_FILE: &str = "validation_progress.json";

/// Local JSON file backend.
///
/// Saves go through a temporary file in the same directory followed by a
/// rename, so a crash mid-save leaves the previous file intact.
pub struct LocalFileBackend {
    path: PathBuf,
}

impl LocalFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for LocalFileBackend {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_FILE)
    }
}

#[async_trait]
impl ProgressBackend for LocalFileBackend {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn load(&self) -> Result<ProgressStore, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let store = decode(&bytes)?;
                info!(
                    path = %self.path.display(),
                    documents = store.document_names().count(),
                    "loaded progress"
                );
                Ok(store)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no saved progress, starting empty");
                Ok(ProgressStore::new())
            }
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    async fn save(&self, store: &ProgressStore) -> Result<(), StoreError> {
        let bytes = encode(store)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| StoreError::Other(format!("save task failed: {e}")))??;
        info!(path = %self.path.display(), "saved progress");
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let io_err = |source: std::io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
