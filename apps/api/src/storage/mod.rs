//! Blob storage for base documents, stored images and generated outputs.

pub mod s3;

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

pub use s3::S3Storage;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Bytes stored at `path`, `None` when nothing is there.
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>>;

    async fn save(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;
}

/// Rejects absolute paths and parent traversal. Paths are always relative
/// to the storage root.
pub fn validate_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        bail!("storage path is empty");
    }
    if path.starts_with('/') || path.starts_with('\\') {
        bail!("storage path '{path}' must be relative");
    }
    let valid = Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !valid {
        bail!("storage path '{path}' escapes the storage root");
    }
    Ok(())
}

/// Filesystem storage rooted at a directory.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        validate_path(path)?;
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl DocumentStorage for LocalStorage {
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", full.display())),
        }
    }

    async fn save(&self, path: &str, bytes: Vec<u8>, _content_type: &str) -> Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .with_context(|| format!("writing {}", full.display()))?;
        Ok(())
    }
}
