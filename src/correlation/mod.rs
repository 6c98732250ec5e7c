/// Correlation domain: canonical SBOM model, CPE matching and scan lifecycle types
pub mod domain;
pub mod policies;
pub mod services;
