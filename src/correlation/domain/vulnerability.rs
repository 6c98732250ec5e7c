use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity bucket of a vulnerability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Unknown,
    ];

    /// Parses a severity label case-insensitively.
    /// Absent or unrecognized labels land in the `Unknown` bucket.
    pub fn parse_loose(label: Option<&str>) -> Self {
        match label.map(|l| l.trim().to_ascii_uppercase()).as_deref() {
            Some("CRITICAL") => Severity::Critical,
            Some("HIGH") => Severity::High,
            Some("MEDIUM") | Some("MODERATE") => Severity::Medium,
            Some("LOW") => Severity::Low,
            _ => Severity::Unknown,
        }
    }

    /// Derives a severity from a CVSS base score (v2 has no severity label)
    pub fn from_cvss_score(score: f64) -> Self {
        if score >= 9.0 {
            Severity::Critical
        } else if score >= 7.0 {
            Severity::High
        } else if score >= 4.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CVSS base score in the range 0.0..=10.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CvssScore(f64);

impl CvssScore {
    pub fn new(score: f64) -> crate::shared::Result<Self> {
        if !score.is_finite() || !(0.0..=10.0).contains(&score) {
            anyhow::bail!("CVSS score must be between 0.0 and 10.0, got {}", score);
        }
        Ok(Self(score))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for CvssScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Vendor and product fields of a CPE 2.3 formatted string.
///
/// Only the colon-delimited positions used for matching are kept:
/// `cpe:2.3:<part>:<vendor>:<product>:<version>:...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpeName {
    part: String,
    vendor: String,
    product: String,
}

impl CpeName {
    pub const PREFIX: &'static str = "cpe:2.3:";
    const MIN_FIELDS: usize = 5;

    /// Splits a CPE string on `:` and takes vendor and product from the
    /// fourth and fifth fields, lowercased. Returns `None` when the string
    /// has fewer than five fields.
    pub fn parse(criteria: &str) -> Option<Self> {
        let fields: Vec<&str> = criteria.split(':').collect();
        if fields.len() < Self::MIN_FIELDS {
            return None;
        }
        Some(Self {
            part: fields[2].to_lowercase(),
            vendor: fields[3].to_lowercase(),
            product: fields[4].to_lowercase(),
        })
    }

    /// Stricter form used at ingestion time: also requires the `cpe:2.3:` prefix
    pub fn parse_strict(criteria: &str) -> Option<Self> {
        if !criteria.to_ascii_lowercase().starts_with(Self::PREFIX) {
            return None;
        }
        Self::parse(criteria)
    }

    pub fn part(&self) -> &str {
        &self.part
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn product(&self) -> &str {
        &self.product
    }
}

/// One CPE applicability statement of a vulnerability with its optional
/// version bounds.
///
/// The CPE string is split into part/vendor/product once, when the criterion
/// is built. Blank bounds are stored as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "CpeMatchCriterionRecord")]
pub struct CpeMatchCriterion {
    criteria: String,
    #[serde(skip)]
    cpe: Option<CpeName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_start_including: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_start_excluding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_end_including: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_end_excluding: Option<String>,
}

/// Serialized shape of a criterion, as found in NVD `cpeMatch` entries
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CpeMatchCriterionRecord {
    criteria: String,
    #[serde(default)]
    version_start_including: Option<String>,
    #[serde(default)]
    version_start_excluding: Option<String>,
    #[serde(default)]
    version_end_including: Option<String>,
    #[serde(default)]
    version_end_excluding: Option<String>,
}

impl From<CpeMatchCriterionRecord> for CpeMatchCriterion {
    fn from(record: CpeMatchCriterionRecord) -> Self {
        let mut criterion = Self::new(record.criteria);
        criterion.version_start_including = non_blank(record.version_start_including);
        criterion.version_start_excluding = non_blank(record.version_start_excluding);
        criterion.version_end_including = non_blank(record.version_end_including);
        criterion.version_end_excluding = non_blank(record.version_end_excluding);
        criterion
    }
}

fn non_blank(bound: Option<String>) -> Option<String> {
    bound.filter(|b| !b.trim().is_empty())
}

impl CpeMatchCriterion {
    /// Builds a criterion, splitting the CPE string leniently. A string with
    /// too few fields is kept but never matches.
    pub fn new(criteria: impl Into<String>) -> Self {
        let criteria = criteria.into();
        let cpe = CpeName::parse(&criteria);
        Self {
            criteria,
            cpe,
            version_start_including: None,
            version_start_excluding: None,
            version_end_including: None,
            version_end_excluding: None,
        }
    }

    /// Builds a criterion only when the CPE string is a well-formed CPE 2.3 name
    pub fn validated(criteria: impl Into<String>) -> Option<Self> {
        let criteria = criteria.into();
        let cpe = CpeName::parse_strict(&criteria)?;
        let mut criterion = Self::new(criteria);
        criterion.cpe = Some(cpe);
        Some(criterion)
    }

    pub fn with_start_including(mut self, version: impl Into<String>) -> Self {
        self.version_start_including = non_blank(Some(version.into()));
        self
    }

    pub fn with_start_excluding(mut self, version: impl Into<String>) -> Self {
        self.version_start_excluding = non_blank(Some(version.into()));
        self
    }

    pub fn with_end_including(mut self, version: impl Into<String>) -> Self {
        self.version_end_including = non_blank(Some(version.into()));
        self
    }

    pub fn with_end_excluding(mut self, version: impl Into<String>) -> Self {
        self.version_end_excluding = non_blank(Some(version.into()));
        self
    }

    /// Sets all four bounds at once; blank values count as absent
    pub fn with_bounds(
        mut self,
        start_including: Option<String>,
        start_excluding: Option<String>,
        end_including: Option<String>,
        end_excluding: Option<String>,
    ) -> Self {
        self.version_start_including = non_blank(start_including);
        self.version_start_excluding = non_blank(start_excluding);
        self.version_end_including = non_blank(end_including);
        self.version_end_excluding = non_blank(end_excluding);
        self
    }

    pub fn criteria(&self) -> &str {
        &self.criteria
    }

    /// Parsed CPE fields, `None` for a malformed criterion
    pub fn cpe(&self) -> Option<&CpeName> {
        self.cpe.as_ref()
    }

    pub fn start_including(&self) -> Option<&str> {
        self.version_start_including.as_deref()
    }

    pub fn start_excluding(&self) -> Option<&str> {
        self.version_start_excluding.as_deref()
    }

    pub fn end_including(&self) -> Option<&str> {
        self.version_end_including.as_deref()
    }

    pub fn end_excluding(&self) -> Option<&str> {
        self.version_end_excluding.as_deref()
    }

    pub fn has_bounds(&self) -> bool {
        self.version_start_including.is_some()
            || self.version_start_excluding.is_some()
            || self.version_end_including.is_some()
            || self.version_end_excluding.is_some()
    }
}

/// A known vulnerability keyed by its CVE identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub cve_id: String,
    pub severity: Severity,
    pub cvss_score: Option<CvssScore>,
    pub cvss_vector: Option<String>,
    pub description: String,
    pub published_date: Option<DateTime<Utc>>,
    pub modified_date: Option<DateTime<Utc>>,
    pub cpe_match: Vec<CpeMatchCriterion>,
    pub references: Vec<String>,
    /// First release without the vulnerability, when the source reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_version: Option<String>,
}

impl Vulnerability {
    pub fn new(cve_id: impl Into<String>, severity: Severity) -> Self {
        Self {
            cve_id: cve_id.into(),
            severity,
            cvss_score: None,
            cvss_vector: None,
            description: String::new(),
            published_date: None,
            modified_date: None,
            cpe_match: Vec::new(),
            references: Vec::new(),
            fixed_version: None,
        }
    }

    pub fn with_cpe_match(mut self, criterion: CpeMatchCriterion) -> Self {
        self.cpe_match.push(criterion);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_cvss(mut self, score: Option<CvssScore>, vector: Option<String>) -> Self {
        self.cvss_score = score;
        self.cvss_vector = vector;
        self
    }

    /// Vulnerabilities without CPE criteria never match a component
    pub fn is_matchable(&self) -> bool {
        !self.cpe_match.is_empty()
    }
}
