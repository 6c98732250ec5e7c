use crate::shared::Result;
use std::fs;
use std::path::Path;

/// Maximum accepted SBOM upload size (50 MiB)
/// This prevents DoS attacks via excessively large documents
pub const MAX_UPLOAD_SIZE: u64 = 50 * 1024 * 1024;

/// File extensions accepted for SBOM uploads
pub const ALLOWED_EXTENSIONS: [&str; 2] = ["json", "xml"];

/// Validates that a path is not a symbolic link
///
/// # Security
/// This function uses `symlink_metadata()` instead of `metadata()` to ensure
/// we check the symlink itself, not the target it points to.
///
/// # Arguments
/// * `path` - The path to validate
/// * `operation` - Description of the operation (e.g., "read", "write") for error messages
///
/// # Errors
/// Returns an error if the path is a symbolic link or if metadata cannot be read
pub fn validate_not_symlink(path: &Path, operation: &str) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read metadata for {} operation on {}: {}",
            operation,
            path.display(),
            e
        )
    })?;

    if metadata.is_symlink() {
        anyhow::bail!(
            "Security: {} is a symbolic link. For security reasons, {} operations on symbolic links are not allowed.",
            path.display(),
            operation
        );
    }

    Ok(())
}

/// Validates that a path exists and is a regular file (not a directory or symlink)
///
/// # Arguments
/// * `path` - The path to validate
/// * `file_description` - Description of the file (e.g., "SBOM", "vulnerability feed")
///
/// # Errors
/// Returns an error if:
/// - The path doesn't exist
/// - The path is a symbolic link
/// - The path is not a regular file
pub fn validate_regular_file(path: &Path, file_description: &str) -> Result<()> {
    let metadata = fs::symlink_metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {} metadata: {}", file_description, e))?;

    if metadata.is_symlink() {
        anyhow::bail!(
            "Security: {} is a symbolic link. For security reasons, symbolic links are not allowed.",
            path.display()
        );
    }

    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }

    Ok(())
}

/// Validates an upload size is within acceptable limits
///
/// # Arguments
/// * `size` - The size of the upload in bytes
/// * `name` - The file name (for error messages)
/// * `max_size` - Maximum allowed size in bytes
///
/// # Errors
/// Returns an error if the size exceeds the maximum
pub fn validate_upload_size(size: u64, name: &str, max_size: u64) -> Result<()> {
    if size > max_size {
        anyhow::bail!(
            "Security: {} is too large ({} bytes). Maximum allowed size is {} bytes.",
            name,
            size,
            max_size
        );
    }
    Ok(())
}

/// Validates that a file name carries one of the accepted SBOM extensions
///
/// The comparison is case-insensitive.
pub fn validate_sbom_extension(filename: &str) -> Result<()> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => anyhow::bail!(
            "Unsupported file type: {}. Only .json and .xml SBOM documents are accepted.",
            filename
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_validate_not_symlink_regular_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("bom.json");
        fs::write(&file_path, "{}").unwrap();

        assert!(validate_not_symlink(&file_path, "read").is_ok());
    }

    #[test]
    fn test_validate_not_symlink_nonexistent() {
        let path = PathBuf::from("/nonexistent/bom.json");
        assert!(validate_not_symlink(&path, "read").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_not_symlink_rejects_link() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("bom.json");
        let link = temp_dir.path().join("link.json");
        fs::write(&target, "{}").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let result = validate_not_symlink(&link, "read");
        assert!(result.unwrap_err().to_string().contains("symbolic link"));
    }

    #[test]
    fn test_validate_regular_file_is_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = validate_regular_file(temp_dir.path(), "SBOM");
        assert!(result.unwrap_err().to_string().contains("not a regular file"));
    }

    #[test]
    fn test_validate_upload_size_within_limit() {
        assert!(validate_upload_size(1000, "bom.json", MAX_UPLOAD_SIZE).is_ok());
        assert!(validate_upload_size(MAX_UPLOAD_SIZE, "bom.json", MAX_UPLOAD_SIZE).is_ok());
    }

    #[test]
    fn test_validate_upload_size_exceeds_limit() {
        let result = validate_upload_size(MAX_UPLOAD_SIZE + 1, "bom.json", MAX_UPLOAD_SIZE);
        assert!(result.unwrap_err().to_string().contains("too large"));
    }

    #[test]
    fn test_max_upload_size_constant() {
        assert_eq!(MAX_UPLOAD_SIZE, 52_428_800);
    }

    #[test]
    fn test_validate_sbom_extension() {
        assert!(validate_sbom_extension("bom.json").is_ok());
        assert!(validate_sbom_extension("bom.XML").is_ok());
        assert!(validate_sbom_extension("spdx.Json").is_ok());
        assert!(validate_sbom_extension("bom.yaml").is_err());
        assert!(validate_sbom_extension("bom").is_err());
    }
}
