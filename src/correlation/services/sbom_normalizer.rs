use crate::correlation::domain::{Component, ComponentSet, ParsedSbom, SbomFormat};
use crate::shared::error::SbomParseError;
use serde_json::{Map, Value};
use std::path::Path;

/// Serialization of an SBOM document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEncoding {
    Json,
    Xml,
}

impl DocumentEncoding {
    /// Declared encoding from a file name extension (case-insensitive)
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())?
            .to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(DocumentEncoding::Json),
            "xml" => Some(DocumentEncoding::Xml),
            _ => None,
        }
    }

    fn sniff(text: &str) -> Option<Self> {
        match text.trim_start().chars().next() {
            Some('{') | Some('[') => Some(DocumentEncoding::Json),
            Some('<') => Some(DocumentEncoding::Xml),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DocumentEncoding::Json => "JSON",
            DocumentEncoding::Xml => "XML",
        }
    }
}

/// SbomNormalizer - Parses CycloneDX and SPDX documents into canonical components
///
/// Both formats are accepted in JSON and XML. The dialect is detected from
/// document content; the declared encoding only selects the parser. A
/// document is either fully accepted or rejected with a `SbomParseError`.
pub struct SbomNormalizer;

impl SbomNormalizer {
    /// Parses raw SBOM bytes
    ///
    /// # Arguments
    /// * `bytes` - Raw document content
    /// * `hint` - Declared encoding, usually from the upload's extension.
    ///   When absent the encoding is sniffed from the first significant character.
    ///
    /// # Returns
    /// ParsedSbom with the detected format, spec version and components
    pub fn parse(
        bytes: &[u8],
        hint: Option<DocumentEncoding>,
    ) -> Result<ParsedSbom, SbomParseError> {
        let text = std::str::from_utf8(bytes).map_err(|e| SbomParseError::InvalidEncoding {
            details: e.to_string(),
        })?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let encoding = hint
            .or_else(|| DocumentEncoding::sniff(text))
            .ok_or_else(|| SbomParseError::InvalidJson {
                details: "document is neither JSON nor XML".to_string(),
            })?;

        let parsed = match encoding {
            DocumentEncoding::Json => Self::parse_json(text)?,
            DocumentEncoding::Xml => Self::parse_xml(text)?,
        };

        tracing::debug!(
            format = %parsed.format,
            encoding = encoding.label(),
            components = parsed.components.len(),
            "SBOM normalized"
        );
        Ok(parsed)
    }

    fn parse_json(text: &str) -> Result<ParsedSbom, SbomParseError> {
        let data: Value = serde_json::from_str(text).map_err(|e| SbomParseError::InvalidJson {
            details: e.to_string(),
        })?;
        let unknown = || SbomParseError::UnknownFormat {
            encoding: DocumentEncoding::Json.label().to_string(),
        };
        let document = data.as_object().ok_or_else(unknown)?;

        if document.get("bomFormat").and_then(Value::as_str) == Some("CycloneDX") {
            let components = Self::json_entries(document, "components", SbomFormat::CycloneDx)?
                .into_iter()
                .map(|entry| {
                    Component::with_defaults(
                        scalar_field(entry, "name"),
                        scalar_field(entry, "version"),
                        scalar_field(entry, "purl"),
                        scalar_field(entry, "type"),
                    )
                })
                .collect();

            return Ok(ParsedSbom {
                format: SbomFormat::CycloneDx,
                spec_version: scalar_field(document, "specVersion"),
                serial_number: scalar_field(document, "serialNumber"),
                components,
            });
        }

        if document.contains_key("spdxVersion") {
            // SPDX packages carry no package URL field we rely on
            let components = Self::json_entries(document, "packages", SbomFormat::Spdx)?
                .into_iter()
                .map(|entry| {
                    Component::with_defaults(
                        scalar_field(entry, "name"),
                        scalar_field(entry, "versionInfo"),
                        None,
                        None,
                    )
                })
                .collect();

            return Ok(ParsedSbom {
                format: SbomFormat::Spdx,
                spec_version: scalar_field(document, "spdxVersion"),
                serial_number: None,
                components,
            });
        }

        Err(unknown())
    }

    /// Entries of a top-level array; absent or null means no entries
    fn json_entries<'a>(
        document: &'a Map<String, Value>,
        key: &str,
        format: SbomFormat,
    ) -> Result<Vec<&'a Map<String, Value>>, SbomParseError> {
        let malformed = |details: String| SbomParseError::MalformedDocument {
            format: format.to_string(),
            details,
        };

        match document.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    item.as_object()
                        .ok_or_else(|| malformed(format!("{}[{}] is not an object", key, index)))
                })
                .collect(),
            Some(_) => Err(malformed(format!("'{}' is not an array", key))),
        }
    }

    fn parse_xml(text: &str) -> Result<ParsedSbom, SbomParseError> {
        let document =
            roxmltree::Document::parse(text).map_err(|e| SbomParseError::InvalidXml {
                details: e.to_string(),
            })?;
        let root = document.root_element();
        let namespace = root.tag_name().namespace().unwrap_or_default();
        let tag = format!("{}{}", namespace, root.tag_name().name()).to_lowercase();

        if tag.contains("cyclonedx") {
            let components = root
                .descendants()
                .filter(|node| node.is_element() && node.tag_name().name() == "component")
                .filter(|node| {
                    node.parent_element()
                        .is_some_and(|parent| parent.tag_name().name() == "components")
                })
                .map(|node| {
                    Component::with_defaults(
                        child_text(node, "name"),
                        child_text(node, "version"),
                        child_text(node, "purl"),
                        node.attribute("type").map(str::to_string),
                    )
                })
                .collect();

            return Ok(ParsedSbom {
                format: SbomFormat::CycloneDx,
                spec_version: namespace_version(namespace),
                serial_number: root.attribute("serialNumber").map(str::to_string),
                components,
            });
        }

        if tag.contains("spdx") {
            let components = root
                .descendants()
                .filter(|node| node.is_element() && node.tag_name().name() == "Package")
                .map(|node| {
                    Component::with_defaults(
                        child_text(node, "name"),
                        child_text(node, "versionInfo"),
                        None,
                        None,
                    )
                })
                .collect();

            return Ok(ParsedSbom {
                format: SbomFormat::Spdx,
                spec_version: child_text(root, "spdxVersion")
                    .or_else(|| root.attribute("spdxVersion").map(str::to_string)),
                serial_number: None,
                components,
            });
        }

        Err(SbomParseError::UnknownFormat {
            encoding: DocumentEncoding::Xml.label().to_string(),
        })
    }
}

/// String value of a field; numbers are rendered as text, anything else is absent
fn scalar_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Text of the first direct child element with the given local name
fn child_text(node: roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == name)
        .map(|child| child.text().unwrap_or_default().trim().to_string())
}

/// `http://cyclonedx.org/schema/bom/1.5` -> `1.5`
fn namespace_version(namespace: &str) -> Option<String> {
    namespace
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit() || c == '.'))
        .map(str::to_string)
}
