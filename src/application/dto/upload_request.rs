/// UploadRequest - Raw SBOM upload as received from a caller
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Declared file name; its extension selects the document encoding
    pub filename: String,
    /// Raw document bytes
    pub content: Vec<u8>,
}

impl UploadRequest {
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
        }
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}
