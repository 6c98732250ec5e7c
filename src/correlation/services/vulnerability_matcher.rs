use super::version_range::is_in_range;
use crate::correlation::domain::{
    Component, ComponentSet, CpeMatchCriterion, MatchResult, MatchedVulnerability, NormalizedName,
    Vulnerability,
};

/// VulnerabilityMatcher - Correlates components with CPE-bearing vulnerabilities
///
/// Pure service: no I/O, no storage. A component matches a vulnerability when
/// any one of the vulnerability's CPE criteria passes both the name check and
/// the version range check.
pub struct VulnerabilityMatcher;

impl VulnerabilityMatcher {
    /// Matches every component against the candidate vulnerabilities
    ///
    /// # Arguments
    /// * `components` - Canonical components of one SBOM
    /// * `candidates` - Vulnerabilities to test; those without CPE criteria are ignored
    ///
    /// # Returns
    /// MatchResult with per-component matches and severity tallies
    pub fn match_components(
        components: &ComponentSet,
        candidates: &[Vulnerability],
    ) -> MatchResult {
        let mut result = MatchResult::new(components.len());
        let matchable: Vec<&Vulnerability> =
            candidates.iter().filter(|v| v.is_matchable()).collect();

        for component in components {
            let found = Self::match_component(component, &matchable);
            if !found.is_empty() {
                tracing::debug!(
                    component = %component,
                    matches = found.len(),
                    "component matched vulnerabilities"
                );
            }
            result.record(component.clone(), found);
        }

        result
    }

    fn match_component(
        component: &Component,
        candidates: &[&Vulnerability],
    ) -> Vec<MatchedVulnerability> {
        let name = component.normalized_name();
        if name.is_empty() {
            return Vec::new();
        }

        candidates
            .iter()
            .filter_map(|vulnerability| {
                // first passing criterion wins
                vulnerability
                    .cpe_match
                    .iter()
                    .find(|criterion| Self::criterion_matches(&name, component.version(), criterion))
                    .map(|criterion| MatchedVulnerability {
                        vulnerability: (*vulnerability).clone(),
                        matched_cpe: Some(criterion.criteria().to_string()),
                    })
            })
            .collect()
    }

    fn criterion_matches(name: &NormalizedName, version: &str, criterion: &CpeMatchCriterion) -> bool {
        let Some(cpe) = criterion.cpe() else {
            tracing::debug!(criteria = criterion.criteria(), "skipping malformed CPE criterion");
            return false;
        };

        Self::is_name_eligible(name, cpe.vendor(), cpe.product()) && is_in_range(version, criterion)
    }

    /// Name eligibility: product contained in the name or the name contained
    /// in the product, the vendor contained in the name, or the literal
    /// `<vendor>_<product>` contained in the name. Empty fields never match.
    pub fn is_name_eligible(name: &NormalizedName, vendor: &str, product: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        let product_match =
            !product.is_empty() && (name.contains(product) || product.contains(name.as_str()));
        let vendor_match = !vendor.is_empty() && name.contains(vendor);
        let combined_match = !vendor.is_empty()
            && !product.is_empty()
            && name.contains(&format!("{}_{}", vendor, product));

        product_match || vendor_match || combined_match
    }
}
