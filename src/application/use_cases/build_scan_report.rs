use crate::application::read_models::{ScanReport, ScanReportBuilder};
use crate::correlation::domain::SbomId;
use crate::ports::outbound::{ScanStore, StoreSession};
use crate::shared::error::ScanError;
use std::collections::HashMap;

/// BuildScanReportUseCase - Assembles the report of an SBOM's latest scan
///
/// # Type Parameters
/// * `S` - ScanStore implementation
pub struct BuildScanReportUseCase<S> {
    store: S,
}

impl<S: ScanStore> BuildScanReportUseCase<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Builds the report of the most recent scan of `sbom_id`
    ///
    /// # Returns
    /// `None` when the SBOM has never been scanned
    pub async fn execute(&self, sbom_id: SbomId) -> Result<Option<ScanReport>, ScanError> {
        let session = self.store.open_session().await.map_err(ScanError::Store)?;

        let record = session
            .get_sbom(sbom_id)
            .await
            .map_err(ScanError::Store)?
            .ok_or_else(|| ScanError::SbomNotFound {
                sbom_id: sbom_id.to_string(),
            })?;

        let Some(result) = session.latest_scan(sbom_id).await.map_err(ScanError::Store)? else {
            return Ok(None);
        };

        let links = session
            .scan_vulnerabilities(result.id)
            .await
            .map_err(ScanError::Store)?;

        let mut vulnerabilities = HashMap::new();
        for link in &links {
            if vulnerabilities.contains_key(&link.vulnerability_id) {
                continue;
            }
            if let Some(vulnerability) = session
                .get_vulnerability(&link.vulnerability_id)
                .await
                .map_err(ScanError::Store)?
            {
                vulnerabilities.insert(link.vulnerability_id.clone(), vulnerability);
            }
        }

        Ok(Some(ScanReportBuilder::build(
            &result,
            Some(record.filename),
            &links,
            &vulnerabilities,
        )))
    }
}
