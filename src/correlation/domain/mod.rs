pub mod component;
pub mod fingerprint;
pub mod sbom_record;
pub mod scan;
pub mod version;
pub mod vulnerability;

pub use component::{Component, ComponentSet, NormalizedName};
pub use fingerprint::ContentFingerprint;
pub use sbom_record::{ParsedSbom, SbomFormat, SbomId, SbomRecord};
pub use scan::{
    CompletedScan, ComponentMatch, MatchResult, MatchedVulnerability, ScanJob, ScanResult,
    ScanResultId, ScanStatus, ScanVulnerability, SeverityCounts,
};
pub use version::ReleaseVersion;
pub use vulnerability::{CpeMatchCriterion, CpeName, CvssScore, Severity, Vulnerability};
