//! Candidate photo loading with explicit empty and failed states.

use proofing_core::gallery::{FileListingProvider, GalleryState};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct GalleryLoader {
    provider: Arc<dyn FileListingProvider>,
    state: RwLock<GalleryState>,
    folder: RwLock<Option<String>>,
}

impl GalleryLoader {
    pub fn new(provider: Arc<dyn FileListingProvider>) -> Self {
        Self {
            provider,
            state: RwLock::new(GalleryState::Loading),
            folder: RwLock::new(None),
        }
    }

    pub async fn state(&self) -> GalleryState {
        self.state.read().await.clone()
    }

    /// Lists the folder and records the outcome.
    ///
    /// Provider errors end in `Failed` rather than an `Err`, so the view can
    /// offer a retry while the rest of the session keeps working.
    pub async fn load(&self, folder_reference: &str) -> GalleryState {
        *self.folder.write().await = Some(folder_reference.to_string());
        *self.state.write().await = GalleryState::Loading;

        let state = match self.provider.list(folder_reference).await {
            Ok(photos) if photos.is_empty() => {
                tracing::info!(folder = %folder_reference, "Gallery folder is empty");
                GalleryState::Empty
            }
            Ok(photos) => {
                tracing::debug!(folder = %folder_reference, count = photos.len(), "Gallery loaded");
                GalleryState::Ready { photos }
            }
            Err(e) => {
                tracing::warn!(folder = %folder_reference, "Gallery listing failed: {}", e);
                GalleryState::Failed {
                    message: e.to_string(),
                }
            }
        };

        *self.state.write().await = state.clone();
        state
    }

    /// Lists the last folder again. Returns `None` if nothing was loaded yet.
    pub async fn retry(&self) -> Option<GalleryState> {
        let folder = self.folder.read().await.clone()?;
        Some(self.load(&folder).await)
    }
}
