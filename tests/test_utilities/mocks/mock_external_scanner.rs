use async_trait::async_trait;
use sbom_vuln_scanner::correlation::domain::MatchedVulnerability;
use sbom_vuln_scanner::ports::outbound::DbRefreshStatus;
use sbom_vuln_scanner::prelude::*;
use sbom_vuln_scanner::shared::error::ScanToolError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Mock ExternalScanner returning canned findings or a canned failure
///
/// Findings are keyed by component name; every component of the scanned set
/// whose name has findings is reported with them.
#[derive(Clone, Default)]
pub struct MockExternalScanner {
    findings: Vec<(String, Vulnerability)>,
    failure: Option<ScanToolError>,
    pub scan_calls: Arc<AtomicUsize>,
}

impl MockExternalScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_finding(mut self, component_name: &str, vulnerability: Vulnerability) -> Self {
        self.findings
            .push((component_name.to_string(), vulnerability));
        self
    }

    pub fn failing(error: ScanToolError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn scan_count(&self) -> usize {
        self.scan_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExternalScanner for MockExternalScanner {
    async fn scan(
        &self,
        components: &ComponentSet,
        _timeout: Duration,
    ) -> std::result::Result<MatchResult, ScanToolError> {
        self.scan_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let mut result = MatchResult::new(components.len());
        for component in components.iter() {
            let matched: Vec<MatchedVulnerability> = self
                .findings
                .iter()
                .filter(|(name, _)| name == component.name())
                .map(|(_, vulnerability)| MatchedVulnerability {
                    vulnerability: vulnerability.clone(),
                    matched_cpe: Some("mock-target".to_string()),
                })
                .collect();
            result.record(component.clone(), matched);
        }
        Ok(result)
    }

    async fn refresh_database(&self, _timeout: Duration) -> DbRefreshStatus {
        match &self.failure {
            Some(error) => DbRefreshStatus::failed(None, error.to_string()),
            None => DbRefreshStatus::Success {
                updated_at: chrono::Utc::now(),
                cache_dir: "/tmp/mock-cache".into(),
                message: "Database refreshed".to_string(),
            },
        }
    }

    async fn is_available(&self) -> bool {
        self.failure.is_none()
    }
}
