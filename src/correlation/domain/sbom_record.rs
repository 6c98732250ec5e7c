use super::component::ComponentSet;
use super::fingerprint::ContentFingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SbomId(Uuid);

impl SbomId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> crate::shared::Result<Self> {
        Ok(Self(Uuid::parse_str(value)?))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SbomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SBOM dialect detected from document content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SbomFormat {
    CycloneDx,
    Spdx,
}

impl SbomFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SbomFormat::CycloneDx => "cyclonedx",
            SbomFormat::Spdx => "spdx",
        }
    }
}

impl fmt::Display for SbomFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalizer output: the canonical components plus document metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSbom {
    pub format: SbomFormat,
    pub spec_version: Option<String>,
    pub serial_number: Option<String>,
    pub components: ComponentSet,
}

/// Stored source record of an accepted upload, unique on fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SbomRecord {
    pub id: SbomId,
    pub filename: String,
    pub format: SbomFormat,
    pub spec_version: Option<String>,
    pub fingerprint: ContentFingerprint,
    pub uploaded_at: DateTime<Utc>,
    pub components: ComponentSet,
}

impl SbomRecord {
    pub fn new(filename: String, fingerprint: ContentFingerprint, parsed: ParsedSbom) -> Self {
        Self {
            id: SbomId::generate(),
            filename,
            format: parsed.format,
            spec_version: parsed.spec_version,
            fingerprint,
            uploaded_at: Utc::now(),
            components: parsed.components,
        }
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}
