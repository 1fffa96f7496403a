use std::path::{Path, PathBuf};
use anyhow::Context;
use reqwest::Url;
use time::OffsetDateTime;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use crate::errors::ServiceError;
use crate::services::new_record_id;

pub const MAX_FILES_PER_UPLOAD: usize = 100;

const REMOTE_FILE_EXTENSION: &str = "jpg";

/// Turns uploaded bytes or remote images into files under the upload root and
/// hands back the stored file name, which doubles as the photo reference.
pub struct UploadCoordinator {
    upload_dir: PathBuf,
    http_client: reqwest::Client,
    max_remote_fetch_bytes: u64,
}

impl UploadCoordinator {
    pub fn new(upload_dir: PathBuf, http_client: reqwest::Client, max_remote_fetch_bytes: u64) -> Self {
        Self {
            upload_dir,
            http_client,
            max_remote_fetch_bytes,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub async fn ensure_upload_dir(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .with_context(|| format!("Failed to create upload directory {}", self.upload_dir.display()))
    }

    /// Stores the bytes under a fresh name that keeps the original extension.
    pub async fn from_bytes(&self, original_name: &str, bytes: &[u8]) -> Result<String, ServiceError> {
        let file_id = match extension_of(original_name) {
            Some(ext) => format!("{}.{}", new_record_id(), ext),
            None => new_record_id(),
        };
        self.store(&file_id, bytes).await?;

        Ok(file_id)
    }

    /// Downloads `link` and stores it as `photo<millis>-<id>.jpg`. Any fetch
    /// problem fails the whole call; nothing is written in that case.
    pub async fn from_remote_url(&self, link: &str) -> Result<String, ServiceError> {
        let url = Url::parse(link.trim())
            .map_err(|_| ServiceError::validation("link", "must be an absolute URL"))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ServiceError::validation("link", "must be an http or https URL"));
        }

        let bytes = self.fetch(url).await?;

        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let file_id = format!("photo{}-{}.{}", millis, new_record_id(), REMOTE_FILE_EXTENSION);
        self.store(&file_id, &bytes).await?;

        Ok(file_id)
    }

    async fn fetch(&self, url: Url) -> Result<Vec<u8>, ServiceError> {
        let mut response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to fetch {} due to: {}", url, e);
                ServiceError::Fetch(format!("could not reach {}", url.host_str().unwrap_or_default()))
            })?;

        if !response.status().is_success() {
            warn!("Remote fetch of {} answered with {}", url, response.status());
            return Err(ServiceError::Fetch(format!("remote answered {}", response.status())));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ServiceError::Fetch(e.to_string()))?
        {
            if (bytes.len() + chunk.len()) as u64 > self.max_remote_fetch_bytes {
                return Err(ServiceError::Fetch(format!(
                    "remote file exceeds {} bytes",
                    self.max_remote_fetch_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(bytes)
    }

    /// Never overwrites: a name that already exists is an error.
    async fn store(&self, file_id: &str, bytes: &[u8]) -> Result<(), ServiceError> {
        let path = self.upload_dir.join(file_id);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        info!("Stored upload {} ({} bytes)", file_id, bytes.len());

        Ok(())
    }
}

/// The part after the last dot, lowercased, if it is plain ASCII alphanumeric.
fn extension_of(original_name: &str) -> Option<String> {
    let (_, ext) = original_name.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
