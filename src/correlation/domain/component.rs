use serde::{Deserialize, Serialize};

/// Canonical software component extracted from an SBOM entry.
///
/// Immutable once produced by the normalizer. Two components are the same
/// component when all four fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Component {
    name: String,
    version: String,
    package_url: Option<String>,
    component_type: String,
}

impl Component {
    pub const UNKNOWN: &'static str = "unknown";
    pub const DEFAULT_TYPE: &'static str = "library";

    pub fn new(
        name: String,
        version: String,
        package_url: Option<String>,
        component_type: String,
    ) -> Self {
        Self {
            name,
            version,
            package_url,
            component_type,
        }
    }

    /// Builds a component applying the `"unknown"` / `"library"` defaults
    /// for absent fields.
    pub fn with_defaults(
        name: Option<String>,
        version: Option<String>,
        package_url: Option<String>,
        component_type: Option<String>,
    ) -> Self {
        Self::new(
            name.unwrap_or_else(|| Self::UNKNOWN.to_string()),
            version.unwrap_or_else(|| Self::UNKNOWN.to_string()),
            package_url,
            component_type.unwrap_or_else(|| Self::DEFAULT_TYPE.to_string()),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn package_url(&self) -> Option<&str> {
        self.package_url.as_deref()
    }

    pub fn component_type(&self) -> &str {
        &self.component_type
    }

    pub fn normalized_name(&self) -> NormalizedName {
        NormalizedName::from_name(&self.name)
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Matching key derived from a component name.
///
/// Lowercased, every run of characters outside `[a-z0-9]` collapsed to a
/// single underscore, leading and trailing underscores stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedName(String);

impl NormalizedName {
    pub fn from_name(name: &str) -> Self {
        let mut normalized = String::with_capacity(name.len());
        let mut pending_separator = false;

        for c in name.chars().flat_map(char::to_lowercase) {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                if pending_separator && !normalized.is_empty() {
                    normalized.push('_');
                }
                pending_separator = false;
                normalized.push(c);
            } else {
                pending_separator = true;
            }
        }

        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.0.contains(needle)
    }
}

impl std::fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered collection of components produced from one SBOM document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentSet {
    components: Vec<Component>,
}

impl ComponentSet {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Component> {
        self.components.iter()
    }

    pub fn as_slice(&self) -> &[Component] {
        &self.components
    }
}

impl FromIterator<Component> for ComponentSet {
    fn from_iter<I: IntoIterator<Item = Component>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ComponentSet {
    type Item = &'a Component;
    type IntoIter = std::slice::Iter<'a, Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}
