mod sbom_normalizer;
mod version_range;
mod vulnerability_matcher;

pub use sbom_normalizer::{DocumentEncoding, SbomNormalizer};
pub use version_range::is_in_range;
pub use vulnerability_matcher::VulnerabilityMatcher;
