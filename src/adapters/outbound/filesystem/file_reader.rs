use crate::adapters::outbound::network::{NvdMapper, NvdResponse};
use crate::application::dto::UploadRequest;
use crate::ports::outbound::{FeedBatch, SbomReader, VulnerabilityFeed};
use crate::shared::security::{validate_regular_file, validate_upload_size};
use crate::shared::Result;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum size of a local vulnerability feed file (512 MB)
const MAX_FEED_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// FileSystemReader adapter for loading SBOM documents from disk
pub struct FileSystemReader;

impl FileSystemReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileSystemReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads a file after the security checks:
/// - Reject symbolic links and non-regular files
/// - Check the size limit before reading
fn safe_read(path: &Path, description: &str, max_bytes: u64) -> Result<Vec<u8>> {
    validate_regular_file(path, description)?;

    let size = fs::metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {} metadata: {}", description, e))?
        .len();
    validate_upload_size(size, &path.display().to_string(), max_bytes)?;

    fs::read(path).map_err(|e| anyhow::anyhow!("Failed to read {}: {}", description, e))
}

impl SbomReader for FileSystemReader {
    fn read_sbom(&self, path: &Path, max_bytes: u64) -> Result<UploadRequest> {
        let content = safe_read(path, "SBOM", max_bytes)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(UploadRequest::new(filename, content))
    }
}

/// NvdFeedFile adapter reading an NVD CVE API 2.0 response saved to disk
pub struct NvdFeedFile {
    path: PathBuf,
}

impl NvdFeedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl VulnerabilityFeed for NvdFeedFile {
    async fn fetch(&self) -> Result<FeedBatch> {
        let content = safe_read(&self.path, "vulnerability feed", MAX_FEED_FILE_SIZE)?;
        let response: NvdResponse = serde_json::from_slice(&content).map_err(|e| {
            anyhow::anyhow!(
                "Failed to parse vulnerability feed {}: {}",
                self.path.display(),
                e
            )
        })?;

        let batch = NvdMapper::map_response(response);
        tracing::info!(
            path = %self.path.display(),
            fetched = batch.vulnerabilities.len(),
            rejected = batch.rejected,
            "loaded vulnerability feed file"
        );
        Ok(batch)
    }
}
