//! Metadata Resolver: manifest, folder and info.json lookups over HTTP.
//!
//! Every public call is best-effort. Failures are logged and come back as
//! empty/`None`; nothing is cached, so each call hits the site again.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::manifest::{FolderDescriptor, FolderInfo, Manifest};
use crate::urls::SiteUrls;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct Library {
    client: reqwest::Client,
    urls: SiteUrls,
}

impl Library {
    pub fn new(urls: SiteUrls) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, urls }
    }

    pub fn urls(&self) -> &SiteUrls {
        &self.urls
    }

    /// GET `url` as text, requiring a 2xx status.
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.text().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let body = self.fetch_text(url).await?;
        serde_json::from_str(&body).map_err(|source| FetchError::Parse {
            url: url.to_string(),
            source,
        })
    }

    pub async fn fetch_manifest(&self) -> Result<Manifest, FetchError> {
        self.get_json(&self.urls.manifest_url()).await
    }

    pub async fn load_manifest(&self) -> Option<Manifest> {
        match self.fetch_manifest().await {
            Ok(manifest) => {
                debug!("manifest: {} folders", manifest.folders.len());
                Some(manifest)
            }
            Err(e) => {
                warn!("manifest unavailable: {}", e);
                None
            }
        }
    }

    /// Folder names in manifest order; empty when the manifest can't be read.
    pub async fn list_folders(&self) -> Vec<String> {
        self.load_manifest()
            .await
            .map(|m| m.folder_names())
            .unwrap_or_default()
    }

    /// Descriptor for `name` (exact match against the manifest).
    pub async fn load_folder(&self, name: &str) -> Option<FolderDescriptor> {
        let manifest = self.load_manifest().await?;
        let found = manifest.find(name).cloned();
        if found.is_none() {
            debug!("folder {:?} not in manifest", name);
        }
        found
    }

    /// The folder's `info.json`, if it exists and parses.
    pub async fn load_supplemental_info(&self, name: &str) -> Option<FolderInfo> {
        match self.get_json(&self.urls.info_url(name)).await {
            Ok(info) => Some(info),
            Err(e) => {
                debug!("no info.json for {:?}: {}", name, e);
                None
            }
        }
    }
}
