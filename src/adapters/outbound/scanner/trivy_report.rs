//! Trivy JSON report model and its mapping to a match result

use crate::correlation::domain::{
    Component, CvssScore, MatchResult, MatchedVulnerability, Severity, Vulnerability,
};
use crate::shared::error::ScanToolError;
use crate::shared::timestamp::parse_lenient;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct TrivyReport {
    #[serde(default)]
    results: Vec<TrivyTarget>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TrivyTarget {
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    vulnerabilities: Option<Vec<TrivyFinding>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TrivyFinding {
    #[serde(rename = "VulnerabilityID")]
    vulnerability_id: Option<String>,
    pkg_name: Option<String>,
    installed_version: Option<String>,
    fixed_version: Option<String>,
    title: Option<String>,
    description: Option<String>,
    severity: Option<String>,
    #[serde(rename = "CVSS", default)]
    cvss: HashMap<String, TrivyCvss>,
    #[serde(default)]
    references: Vec<String>,
    published_date: Option<String>,
    last_modified_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TrivyCvss {
    #[serde(rename = "V3Score")]
    v3_score: Option<f64>,
    #[serde(rename = "V3Vector")]
    v3_vector: Option<String>,
}

impl TrivyReport {
    pub(super) fn parse(stdout: &[u8]) -> Result<Self, ScanToolError> {
        serde_json::from_slice(stdout).map_err(|e| ScanToolError::MalformedOutput {
            details: e.to_string(),
        })
    }

    /// Maps the report onto a match result.
    ///
    /// Findings are grouped per (package, installed version); `total_components`
    /// is the size of the scanned component set, not taken from the tool.
    pub(super) fn into_match_result(self, total_components: usize) -> MatchResult {
        let mut grouped: Vec<((String, String), Vec<MatchedVulnerability>)> = Vec::new();

        for target in self.results {
            let target_name = target.target.unwrap_or_else(|| "unknown".to_string());
            for finding in target.vulnerabilities.unwrap_or_default() {
                let key = (
                    finding
                        .pkg_name
                        .clone()
                        .unwrap_or_else(|| Component::UNKNOWN.to_string()),
                    finding
                        .installed_version
                        .clone()
                        .unwrap_or_else(|| Component::UNKNOWN.to_string()),
                );
                let matched = MatchedVulnerability {
                    vulnerability: finding.into_vulnerability(),
                    matched_cpe: Some(target_name.clone()),
                };
                match grouped.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, list)) => list.push(matched),
                    None => grouped.push((key, vec![matched])),
                }
            }
        }

        let mut result = MatchResult::new(total_components);
        for ((name, version), vulnerabilities) in grouped {
            result.record(
                Component::new(name, version, None, Component::DEFAULT_TYPE.to_string()),
                vulnerabilities,
            );
        }
        result
    }
}

impl TrivyFinding {
    fn into_vulnerability(self) -> Vulnerability {
        let (score, vector) = self
            .cvss
            .get("nvd")
            .map(|nvd| (nvd.v3_score, nvd.v3_vector.clone()))
            .unwrap_or((None, None));
        let cvss_score = score.and_then(|s| CvssScore::new(s).ok());

        let description = self
            .description
            .filter(|d| !d.is_empty())
            .or(self.title)
            .unwrap_or_default();

        let mut vulnerability = Vulnerability::new(
            self.vulnerability_id
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            Severity::parse_loose(self.severity.as_deref()),
        )
        .with_description(description)
        .with_cvss(cvss_score, vector.filter(|v| !v.is_empty()));
        vulnerability.references = self.references;
        vulnerability.published_date = self.published_date.as_deref().and_then(parse_lenient);
        vulnerability.modified_date = self.last_modified_date.as_deref().and_then(parse_lenient);
        vulnerability.fixed_version = self.fixed_version.filter(|v| !v.is_empty());
        vulnerability
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"{
        "SchemaVersion": 2,
        "Results": [
            {
                "Target": "sbom-abc.json",
                "Vulnerabilities": [
                    {
                        "VulnerabilityID": "CVE-2021-44228",
                        "PkgName": "log4j-core",
                        "InstalledVersion": "2.14.1",
                        "FixedVersion": "2.15.0",
                        "Title": "Remote code injection in Log4j",
                        "Description": "",
                        "Severity": "CRITICAL",
                        "CVSS": {"nvd": {"V3Score": 10.0, "V3Vector": "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:C/C:H/I:H/A:H"}},
                        "References": ["https://nvd.nist.gov/vuln/detail/CVE-2021-44228"],
                        "PublishedDate": "2021-12-10T10:15:09Z"
                    },
                    {
                        "VulnerabilityID": "CVE-2021-45046",
                        "PkgName": "log4j-core",
                        "InstalledVersion": "2.14.1",
                        "Severity": "CRITICAL"
                    },
                    {
                        "VulnerabilityID": "CVE-2022-0778",
                        "PkgName": "openssl",
                        "InstalledVersion": "1.1.1k",
                        "Severity": "weird"
                    }
                ]
            },
            {"Target": "empty"}
        ]
    }"#;

    #[test]
    fn test_maps_findings_grouped_by_package_version() {
        let result = TrivyReport::parse(REPORT.as_bytes())
            .unwrap()
            .into_match_result(5);

        assert_eq!(result.total_components(), 5);
        assert_eq!(result.vulnerable_count(), 2);
        assert_eq!(result.total_vulnerabilities(), 3);
        assert_eq!(result.severity_counts().critical, 2);
        assert_eq!(result.severity_counts().unknown, 1);

        let log4j = &result.matches()[0];
        assert_eq!(log4j.component.name(), "log4j-core");
        let first = &log4j.vulnerabilities[0];
        assert_eq!(first.matched_cpe.as_deref(), Some("sbom-abc.json"));
        assert_eq!(first.vulnerability.description, "Remote code injection in Log4j");
        assert_eq!(first.vulnerability.cvss_score.unwrap().value(), 10.0);
        assert_eq!(first.vulnerability.fixed_version.as_deref(), Some("2.15.0"));
        assert!(first.vulnerability.published_date.is_some());
    }

    #[test]
    fn test_unparsable_dates_dropped_not_fatal() {
        let report = br#"{"Results": [{"Target": "bom.json", "Vulnerabilities": [{
            "VulnerabilityID": "CVE-2021-44228",
            "PkgName": "log4j-core",
            "InstalledVersion": "2.14.1",
            "Severity": "CRITICAL",
            "PublishedDate": "10 Dec 2021",
            "LastModifiedDate": "2023-11-07T03:39:36.747"
        }]}]}"#;
        let result = TrivyReport::parse(report).unwrap().into_match_result(1);

        assert_eq!(result.vulnerable_count(), 1);
        let vulnerability = &result.matches()[0].vulnerabilities[0].vulnerability;
        assert!(vulnerability.published_date.is_none());
        assert_eq!(
            vulnerability.modified_date.unwrap().to_rfc3339(),
            "2023-11-07T03:39:36.747+00:00"
        );
    }

    #[test]
    fn test_report_without_results() {
        let result = TrivyReport::parse(br#"{"SchemaVersion": 2}"#)
            .unwrap()
            .into_match_result(3);
        assert_eq!(result.vulnerable_count(), 0);
        assert_eq!(result.total_components(), 3);
    }

    #[test]
    fn test_malformed_output() {
        let err = TrivyReport::parse(b"not json").unwrap_err();
        assert!(matches!(err, ScanToolError::MalformedOutput { .. }));
    }
}
