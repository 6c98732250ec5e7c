//! NVD CVE API 2.0 response model and its mapping to vulnerability records

use crate::correlation::domain::{CpeMatchCriterion, CvssScore, Severity, Vulnerability};
use crate::ports::outbound::FeedBatch;
use crate::shared::timestamp::parse_lenient;
use serde::Deserialize;

/// One page of the CVE API
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NvdResponse {
    #[serde(default)]
    pub total_results: usize,
    #[serde(default)]
    pub vulnerabilities: Vec<NvdItem>,
}

#[derive(Debug, Deserialize)]
pub struct NvdItem {
    #[serde(default)]
    cve: NvdCve,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NvdCve {
    id: Option<String>,
    published: Option<String>,
    last_modified: Option<String>,
    #[serde(default)]
    descriptions: Vec<NvdDescription>,
    #[serde(default)]
    metrics: NvdMetrics,
    #[serde(default)]
    configurations: Vec<NvdConfiguration>,
    #[serde(default)]
    references: Vec<NvdReference>,
}

#[derive(Debug, Deserialize)]
struct NvdDescription {
    lang: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct NvdMetrics {
    #[serde(rename = "cvssMetricV31", default)]
    v31: Vec<NvdMetric>,
    #[serde(rename = "cvssMetricV30", default)]
    v30: Vec<NvdMetric>,
    #[serde(rename = "cvssMetricV2", default)]
    v2: Vec<NvdMetric>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NvdMetric {
    cvss_data: NvdCvssData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NvdCvssData {
    base_score: Option<f64>,
    vector_string: Option<String>,
    base_severity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NvdConfiguration {
    #[serde(default)]
    nodes: Vec<NvdNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NvdNode {
    #[serde(default)]
    cpe_match: Vec<NvdCpeMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NvdCpeMatch {
    #[serde(default)]
    vulnerable: bool,
    criteria: Option<String>,
    version_start_including: Option<String>,
    version_start_excluding: Option<String>,
    version_end_including: Option<String>,
    version_end_excluding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NvdReference {
    url: Option<String>,
}

/// Maps NVD records to vulnerabilities
///
/// CPE criteria are validated here, once, so the matcher never sees a
/// malformed criterion coming from the feed.
pub struct NvdMapper;

impl NvdMapper {
    /// Maps every record of a page; records without a CVE id are rejected
    pub fn map_response(response: NvdResponse) -> FeedBatch {
        let mut batch = FeedBatch::default();
        for item in response.vulnerabilities {
            match Self::map_item(item) {
                Some(vulnerability) => batch.vulnerabilities.push(vulnerability),
                None => batch.rejected += 1,
            }
        }
        batch
    }

    pub fn map_item(item: NvdItem) -> Option<Vulnerability> {
        let cve = item.cve;
        let Some(cve_id) = cve.id.filter(|id| !id.trim().is_empty()) else {
            tracing::warn!("NVD record without CVE id, skipping");
            return None;
        };

        let (severity, score, vector) = Self::select_metric(&cve.metrics);
        let description = cve
            .descriptions
            .into_iter()
            .find(|d| d.lang == "en")
            .map(|d| d.value)
            .unwrap_or_default();

        let mut vulnerability = Vulnerability::new(cve_id, severity)
            .with_description(description)
            .with_cvss(score.and_then(|s| CvssScore::new(s).ok()), vector);

        for node in cve.configurations.into_iter().flat_map(|c| c.nodes) {
            for entry in node.cpe_match.into_iter().filter(|m| m.vulnerable) {
                match Self::map_criterion(entry) {
                    Some(criterion) => vulnerability.cpe_match.push(criterion),
                    None => tracing::warn!(
                        cve_id = %vulnerability.cve_id,
                        "dropping malformed CPE criterion"
                    ),
                }
            }
        }

        vulnerability.references = cve.references.into_iter().filter_map(|r| r.url).collect();
        vulnerability.published_date = cve.published.as_deref().and_then(parse_lenient);
        vulnerability.modified_date = cve.last_modified.as_deref().and_then(parse_lenient);
        Some(vulnerability)
    }

    /// v3.1, then v3.0, then v2; v2 carries no label so severity comes from the score
    fn select_metric(metrics: &NvdMetrics) -> (Severity, Option<f64>, Option<String>) {
        if let Some(metric) = metrics.v31.first().or_else(|| metrics.v30.first()) {
            let data = &metric.cvss_data;
            return (
                Severity::parse_loose(data.base_severity.as_deref()),
                data.base_score,
                data.vector_string.clone(),
            );
        }
        if let Some(metric) = metrics.v2.first() {
            let data = &metric.cvss_data;
            let severity = data
                .base_score
                .map(Severity::from_cvss_score)
                .unwrap_or(Severity::Unknown);
            return (severity, data.base_score, data.vector_string.clone());
        }
        (Severity::Unknown, None, None)
    }

    fn map_criterion(entry: NvdCpeMatch) -> Option<CpeMatchCriterion> {
        let criterion = CpeMatchCriterion::validated(entry.criteria?)?;

        Some(criterion.with_bounds(
            entry.version_start_including,
            entry.version_start_excluding,
            entry.version_end_including,
            entry.version_end_excluding,
        ))
    }
}
