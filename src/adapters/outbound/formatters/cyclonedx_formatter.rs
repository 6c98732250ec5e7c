use crate::correlation::domain::ComponentSet;
use crate::shared::Result;
use serde::Serialize;
use std::collections::HashSet;

const SPEC_VERSION: &str = "1.5";

#[derive(Debug, Serialize)]
struct Bom<'a> {
    #[serde(rename = "bomFormat")]
    bom_format: &'static str,
    #[serde(rename = "specVersion")]
    spec_version: &'static str,
    version: u32,
    #[serde(rename = "serialNumber")]
    serial_number: String,
    metadata: Metadata,
    components: Vec<Component<'a>>,
}

#[derive(Debug, Serialize)]
struct Metadata {
    timestamp: String,
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct Tool {
    name: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct Component<'a> {
    #[serde(rename = "bom-ref")]
    bom_ref: String,
    #[serde(rename = "type")]
    component_type: &'a str,
    name: &'a str,
    version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    purl: Option<&'a str>,
}

/// CycloneDxFormatter adapter rendering a canonical component set as CycloneDX 1.5 JSON
///
/// The external scanner consumes this document regardless of the dialect
/// the SBOM was uploaded in.
pub struct CycloneDxFormatter;

impl CycloneDxFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&self, components: &ComponentSet) -> Result<String> {
        let bom = Bom {
            bom_format: "CycloneDX",
            spec_version: SPEC_VERSION,
            version: 1,
            serial_number: format!("urn:uuid:{}", uuid::Uuid::new_v4()),
            metadata: Metadata {
                timestamp: chrono::Utc::now().to_rfc3339(),
                tools: vec![Tool {
                    name: env!("CARGO_PKG_NAME"),
                    version: env!("CARGO_PKG_VERSION"),
                }],
            },
            components: self.build_components(components),
        };

        serde_json::to_string_pretty(&bom).map_err(Into::into)
    }

    /// bom-refs must be unique within a document; a repeated purl gets the
    /// component's position appended
    fn build_components<'a>(&self, components: &'a ComponentSet) -> Vec<Component<'a>> {
        let mut used = HashSet::new();
        components
            .iter()
            .enumerate()
            .map(|(index, c)| {
                let position = index + 1;
                let mut bom_ref = c
                    .package_url()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("component-{}", position));
                if used.contains(&bom_ref) {
                    bom_ref = format!("{}#{}", bom_ref, position);
                }
                used.insert(bom_ref.clone());

                Component {
                    bom_ref,
                    component_type: c.component_type(),
                    name: c.name(),
                    version: c.version(),
                    purl: c.package_url(),
                }
            })
            .collect()
    }
}

impl Default for CycloneDxFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::domain::Component;
    use crate::correlation::services::SbomNormalizer;

    fn components() -> ComponentSet {
        ComponentSet::new(vec![
            Component::new(
                "requests".into(),
                "2.31.0".into(),
                Some("pkg:pypi/requests@2.31.0".into()),
                "library".into(),
            ),
            Component::new("openssl".into(), "1.1.1k".into(), None, "library".into()),
        ])
    }

    #[test]
    fn test_canonical_document_structure() {
        let json = CycloneDxFormatter::new().format(&components()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["bomFormat"], "CycloneDX");
        assert_eq!(parsed["specVersion"], "1.5");
        assert!(parsed["serialNumber"].as_str().unwrap().starts_with("urn:uuid:"));
        assert_eq!(parsed["components"][0]["bom-ref"], "pkg:pypi/requests@2.31.0");
        assert_eq!(parsed["components"][1]["bom-ref"], "component-2");
        assert!(parsed["components"][1].get("purl").is_none());
    }

    #[test]
    fn test_repeated_purl_gets_unique_bom_ref() {
        let purl = "pkg:pypi/requests@2.31.0";
        let repeated = ComponentSet::new(vec![
            Component::new("requests".into(), "2.31.0".into(), Some(purl.into()), "library".into()),
            Component::new("requests".into(), "2.31.0".into(), Some(purl.into()), "library".into()),
            Component::new("zlib".into(), "1.2.11".into(), None, "library".into()),
        ]);
        let json = CycloneDxFormatter::new().format(&repeated).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        let refs: Vec<&str> = parsed["components"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["bom-ref"].as_str().unwrap())
            .collect();
        assert_eq!(refs, vec![purl, "pkg:pypi/requests@2.31.0#2", "component-3"]);
        assert_eq!(parsed["components"][1]["purl"], purl);
    }

    #[test]
    fn test_canonical_document_normalizes_back_to_same_components() {
        let original = components();
        let json = CycloneDxFormatter::new().format(&original).unwrap();
        let parsed = SbomNormalizer::parse(json.as_bytes(), None).unwrap();
        assert_eq!(parsed.components, original);
    }

    #[test]
    fn test_empty_component_set() {
        let json = CycloneDxFormatter::new()
            .format(&ComponentSet::default())
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["components"].as_array().unwrap().len(), 0);
    }
}
