use serde::{Deserialize, Serialize};

/// Matching path used by scan workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanEngine {
    /// Built-in CPE matcher over the stored vulnerabilities
    #[default]
    Matcher,
    /// External scanning tool
    External,
}

impl std::str::FromStr for ScanEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "matcher" => Ok(ScanEngine::Matcher),
            "external" | "trivy" => Ok(ScanEngine::External),
            _ => Err(format!(
                "Invalid engine: {}. Please specify 'matcher' or 'external'",
                s
            )),
        }
    }
}

impl std::fmt::Display for ScanEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanEngine::Matcher => write!(f, "matcher"),
            ScanEngine::External => write!(f, "external"),
        }
    }
}
