//! Gallery domain module.
//!
//! Candidate photos are read-only input to the selection flow. They come
//! from an external file-storage location through a `FileListingProvider`.

mod model;
mod provider;

pub use model::{CandidatePhoto, GalleryState};
pub use provider::FileListingProvider;
