//! File listing provider trait.

use async_trait::async_trait;

use super::model::CandidatePhoto;
use crate::error::Result;

/// Lists candidate photos for a folder reference in external file storage.
///
/// # Implementation Notes
///
/// An empty or misconfigured folder reference must yield `Ok(vec![])`, not
/// an error. Errors are reserved for transport or provider failures.
#[async_trait]
pub trait FileListingProvider: Send + Sync {
    /// Lists the photos stored under `folder_reference`.
    async fn list(&self, folder_reference: &str) -> Result<Vec<CandidatePhoto>>;
}
