//! File listing from a local directory.
//!
//! Useful for studios that keep proofs on a shared drive and for offline
//! work. The folder reference is a path relative to the provider root.

use async_trait::async_trait;
use proofing_core::error::{ProofingError, Result};
use proofing_core::gallery::{CandidatePhoto, FileListingProvider};
use std::path::{Component, Path, PathBuf};
use tokio::task;

#[derive(Debug, Clone)]
pub struct LocalDirectoryProvider {
    root: PathBuf,
}

impl LocalDirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves a folder reference under the root. References escaping the
    /// root resolve to `None`.
    fn resolve(&self, folder_reference: &str) -> Option<PathBuf> {
        let relative = Path::new(folder_reference);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return None;
        }
        Some(self.root.join(relative))
    }

    fn list_sync(dir: &Path) -> Result<Vec<CandidatePhoto>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(dir).map_err(|e| {
            ProofingError::io(format!("Failed to read '{}': {}", dir.display(), e))
        })?;

        let mut photos = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_image = mime_guess::from_path(&path)
                .first()
                .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE);
            if !is_image {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            let url = format!("file://{}", path.display());
            photos.push(CandidatePhoto {
                id: name.clone(),
                name,
                thumbnail_url: url.clone(),
                full_res_url: url,
            });
        }

        photos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(photos)
    }
}

#[async_trait]
impl FileListingProvider for LocalDirectoryProvider {
    async fn list(&self, folder_reference: &str) -> Result<Vec<CandidatePhoto>> {
        let folder_reference = folder_reference.trim();
        if folder_reference.is_empty() {
            return Ok(Vec::new());
        }
        let Some(dir) = self.resolve(folder_reference) else {
            tracing::warn!(folder = %folder_reference, "Folder reference escapes the photo root");
            return Ok(Vec::new());
        };

        task::spawn_blocking(move || Self::list_sync(&dir))
            .await
            .map_err(|e| ProofingError::io(format!("Failed to spawn blocking task: {}", e)))?
    }
}
