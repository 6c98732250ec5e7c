use crate::application::dto::UploadRequest;
use crate::shared::Result;
use std::path::Path;

/// SbomReader port for loading an SBOM upload from a local path
pub trait SbomReader {
    /// Reads an SBOM file into an upload request
    ///
    /// # Arguments
    /// * `path` - Path to the SBOM document
    /// * `max_bytes` - Size limit enforced before the content is read
    ///
    /// # Errors
    /// Returns an error if the path is not a regular file, is a symbolic link,
    /// exceeds the size limit or cannot be read
    fn read_sbom(&self, path: &Path, max_bytes: u64) -> Result<UploadRequest>;
}
