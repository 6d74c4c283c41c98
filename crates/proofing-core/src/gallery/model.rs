use serde::{Deserialize, Serialize};

/// A photo the client may select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePhoto {
    /// Provider-assigned id, used as key in the selection map.
    pub id: String,
    /// File name as stored by the provider.
    pub name: String,
    /// Small preview for grid views.
    pub thumbnail_url: String,
    /// Full-resolution link for the lightbox.
    pub full_res_url: String,
}

/// What the gallery region shows after a listing attempt.
///
/// An empty folder is not an error: it gets its own state so the client can
/// be told to contact the studio instead of seeing a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GalleryState {
    /// Listing has not finished yet.
    Loading,
    /// Photos are available.
    Ready { photos: Vec<CandidatePhoto> },
    /// The folder is empty or not configured.
    Empty,
    /// The provider failed; a manual retry is offered.
    Failed { message: String },
}

impl GalleryState {
    pub fn photos(&self) -> &[CandidatePhoto] {
        match self {
            GalleryState::Ready { photos } => photos,
            _ => &[],
        }
    }

    pub fn can_retry(&self) -> bool {
        matches!(self, GalleryState::Failed { .. })
    }
}
