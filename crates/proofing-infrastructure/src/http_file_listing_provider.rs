//! File listing over the storage provider's HTTP API.
//!
//! Expects a paginated JSON listing:
//!
//! ```text
//! GET {api_base_url}/folders/{folder_reference}/files?pageToken=...
//! { "files": [{ "id", "name", "mimeType", "thumbnailLink", "contentLink" }],
//!   "nextPageToken": "..." }
//! ```

use async_trait::async_trait;
use proofing_core::config::StorageApiConfig;
use proofing_core::error::{ProofingError, Result};
use proofing_core::gallery::{CandidatePhoto, FileListingProvider};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Upper bound on pages fetched for one folder.
const MAX_PAGES: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingPage {
    #[serde(default)]
    files: Vec<RemoteFile>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteFile {
    id: String,
    name: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    thumbnail_link: Option<String>,
    #[serde(default)]
    content_link: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpFileListingProvider {
    client: Client,
    config: StorageApiConfig,
}

impl HttpFileListingProvider {
    pub fn new(config: StorageApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| ProofingError::provider(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.api_base_url.trim_end_matches('/')
    }

    fn folder_url(&self, folder_reference: &str) -> String {
        format!("{}/folders/{}/files", self.base_url(), folder_reference)
    }

    async fn fetch_page(
        &self,
        folder_reference: &str,
        page_token: Option<&str>,
    ) -> Result<Option<ListingPage>> {
        let mut request = self.client.get(self.folder_url(folder_reference));
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProofingError::provider(format!("File listing request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProofingError::provider(format!(
                "File listing failed with status {}: {}",
                status, error_text
            )));
        }

        let page = response.json::<ListingPage>().await.map_err(|e| {
            ProofingError::provider(format!("Failed to parse file listing: {}", e))
        })?;
        Ok(Some(page))
    }

    fn to_candidate(&self, file: RemoteFile) -> Option<CandidatePhoto> {
        if !is_image(file.mime_type.as_deref(), &file.name) {
            return None;
        }
        let full_res_url = file
            .content_link
            .unwrap_or_else(|| format!("{}/files/{}/content", self.base_url(), file.id));
        let thumbnail_url = file.thumbnail_link.unwrap_or_else(|| full_res_url.clone());

        Some(CandidatePhoto {
            id: file.id,
            name: file.name,
            thumbnail_url,
            full_res_url,
        })
    }
}

/// Accepts `image/*` by declared type, falling back to the file extension.
fn is_image(mime_type: Option<&str>, name: &str) -> bool {
    match mime_type {
        Some(mime) => mime.starts_with("image/"),
        None => mime_guess::from_path(name)
            .first()
            .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE),
    }
}

#[async_trait]
impl FileListingProvider for HttpFileListingProvider {
    async fn list(&self, folder_reference: &str) -> Result<Vec<CandidatePhoto>> {
        let folder_reference = folder_reference.trim();
        if folder_reference.is_empty() || !self.config.is_configured() {
            tracing::debug!("File listing skipped: folder or storage API not configured");
            return Ok(Vec::new());
        }

        let mut photos = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let Some(page) = self
                .fetch_page(folder_reference, page_token.as_deref())
                .await?
            else {
                tracing::info!(folder = %folder_reference, "Folder not found, treating as empty");
                return Ok(Vec::new());
            };

            photos.extend(page.files.into_iter().filter_map(|f| self.to_candidate(f)));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => return Ok(photos),
            }
        }

        tracing::warn!(folder = %folder_reference, "File listing truncated after {} pages", MAX_PAGES);
        Ok(photos)
    }
}
