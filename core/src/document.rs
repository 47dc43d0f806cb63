//! Document tree types for service documents and the unified output.
//!
//! Every document is a generic [`serde_yaml::Value`]. Its [`Mapping`] keeps
//! keys in insertion order, which is what makes the written output
//! reproducible for a given input order.
//!
//! [`UnifiedDocument`] is the mutable accumulator the mergers write into.
//! It only ever grows: paths, components, and tags can be added but never
//! replaced or removed. [`UnifiedDocument::freeze`] turns it into a
//! read-only [`FrozenDocument`] that the validator and writer consume.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Sequence, Value};

/// OpenAPI version stamped on the unified document.
pub const OPENAPI_VERSION: &str = "3.1.0";
/// `info.title` of the unified document.
pub const UNIFIED_TITLE: &str = "Mock Server API";
/// `info.version` of the unified document.
pub const UNIFIED_VERSION: &str = "1.0.0";
/// `info.description` of the unified document.
pub const UNIFIED_DESCRIPTION: &str = "Unified Mock Server API specification";
/// URL of the single `servers` entry.
pub const UNIFIED_SERVER_URL: &str = "http://localhost:8000";

/// One of the reusable-definition groups under `components`.
///
/// Only these four categories are merged. Declaration order is the order in
/// which they appear in the unified document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentCategory {
    Schemas,
    Responses,
    Parameters,
    RequestBodies,
}

impl ComponentCategory {
    /// All merged categories, in output order.
    pub const ALL: [ComponentCategory; 4] = [
        ComponentCategory::Schemas,
        ComponentCategory::Responses,
        ComponentCategory::Parameters,
        ComponentCategory::RequestBodies,
    ];

    /// Returns the key used under `components` in OpenAPI documents.
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentCategory::Schemas => "schemas",
            ComponentCategory::Responses => "responses",
            ComponentCategory::Parameters => "parameters",
            ComponentCategory::RequestBodies => "requestBodies",
        }
    }

    /// Parses a `components` key, returning `None` for categories that are
    /// not merged (e.g. `securitySchemes`).
    ///
    /// ```
    /// use openapi_merge_core::ComponentCategory;
    ///
    /// assert_eq!(
    ///     ComponentCategory::from_name("requestBodies"),
    ///     Some(ComponentCategory::RequestBodies)
    /// );
    /// assert_eq!(ComponentCategory::from_name("securitySchemes"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.as_str() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single loaded per-service document.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDocument {
    /// Namespace token derived from the file stem.
    pub service: String,
    /// File the document was read from, if it came from disk.
    pub source: Option<PathBuf>,
    /// Parsed document tree.
    pub document: Value,
}

impl ServiceDocument {
    /// Creates an in-memory service document.
    ///
    /// No shape check is applied. The mergers leave out entries whose keys
    /// under `paths` or a component category are not strings, reporting each
    /// as [`MergeEvent::KeyIgnored`](crate::MergeEvent::KeyIgnored).
    pub fn new(service: impl Into<String>, document: Value) -> Self {
        Self {
            service: service.into(),
            source: None,
            document,
        }
    }

    /// Records the file this document was loaded from.
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The `paths` section, if present and a mapping.
    pub fn paths(&self) -> Option<&Mapping> {
        self.document.get("paths").and_then(Value::as_mapping)
    }

    /// The whole `components` section, if present and a mapping.
    pub fn components(&self) -> Option<&Mapping> {
        self.document.get("components").and_then(Value::as_mapping)
    }

    /// The entries of one component category, if present and a mapping.
    pub fn component_category(&self, category: ComponentCategory) -> Option<&Mapping> {
        self.components()
            .and_then(|components| components.get(category.as_str()))
            .and_then(Value::as_mapping)
    }

    /// The `tags` section, or an empty slice when absent.
    pub fn tags(&self) -> &[Value] {
        self.document
            .get("tags")
            .and_then(Value::as_sequence)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Counters collected while merging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub services: usize,
    pub paths_added: usize,
    pub paths_skipped: usize,
    pub components_added: usize,
    pub components_identical: usize,
    pub components_aliased: usize,
    pub components_skipped: usize,
    pub tags_added: usize,
}

/// The unified document under construction.
///
/// # Examples
///
/// ```
/// use openapi_merge_core::UnifiedDocument;
/// use serde_yaml::Value;
///
/// let mut unified = UnifiedDocument::new();
/// assert!(unified.insert_path("/users/items".into(), Value::Null));
/// // Existing entries are never overwritten.
/// assert!(!unified.insert_path("/users/items".into(), Value::Bool(true)));
///
/// let frozen = unified.freeze();
/// assert!(frozen.as_value()["components"]["schemas"].as_mapping().unwrap().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedDocument {
    tags: Sequence,
    paths: Mapping,
    components: [Mapping; 4],
    stats: MergeStats,
}

impl Default for UnifiedDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl UnifiedDocument {
    /// Creates the empty skeleton.
    pub fn new() -> Self {
        Self {
            tags: Sequence::new(),
            paths: Mapping::new(),
            components: Default::default(),
            stats: MergeStats::default(),
        }
    }

    /// Returns `true` if `path` is already a key in `paths`.
    pub fn contains_path(&self, path: &str) -> bool {
        self.paths.contains_key(path)
    }

    /// Inserts a path entry unless the key already exists.
    ///
    /// Returns `true` when the entry was inserted.
    pub fn insert_path(&mut self, path: String, operations: Value) -> bool {
        if self.contains_path(&path) {
            return false;
        }
        self.paths.insert(Value::String(path), operations);
        true
    }

    /// Looks up a component by name within a category.
    pub fn component(&self, category: ComponentCategory, name: &str) -> Option<&Value> {
        self.components[category.index()].get(name)
    }

    /// Inserts a component unless the name is already taken in its category.
    ///
    /// Returns `true` when the entry was inserted.
    pub fn insert_component(
        &mut self,
        category: ComponentCategory,
        name: String,
        component: Value,
    ) -> bool {
        let entries = &mut self.components[category.index()];
        if entries.contains_key(name.as_str()) {
            return false;
        }
        entries.insert(Value::String(name), component);
        true
    }

    /// Returns `true` if a structurally identical tag is already present.
    pub fn contains_tag(&self, tag: &Value) -> bool {
        self.tags.contains(tag)
    }

    /// Appends a tag unless a structurally identical one exists.
    ///
    /// Returns `true` when the tag was appended.
    pub fn push_tag(&mut self, tag: Value) -> bool {
        if self.contains_tag(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn paths(&self) -> &Mapping {
        &self.paths
    }

    pub fn components(&self, category: ComponentCategory) -> &Mapping {
        &self.components[category.index()]
    }

    pub fn tags(&self) -> &[Value] {
        &self.tags
    }

    pub fn stats(&self) -> &MergeStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut MergeStats {
        &mut self.stats
    }

    /// Assembles the final document tree and ends the mutable phase.
    pub fn freeze(self) -> FrozenDocument {
        let mut info = Mapping::new();
        info.insert("title".into(), UNIFIED_TITLE.into());
        info.insert("version".into(), UNIFIED_VERSION.into());
        info.insert("description".into(), UNIFIED_DESCRIPTION.into());

        let mut server = Mapping::new();
        server.insert("url".into(), UNIFIED_SERVER_URL.into());

        let mut components = Mapping::new();
        for (category, entries) in ComponentCategory::ALL.into_iter().zip(self.components) {
            components.insert(category.as_str().into(), Value::Mapping(entries));
        }

        let mut root = Mapping::new();
        root.insert("openapi".into(), OPENAPI_VERSION.into());
        root.insert("info".into(), Value::Mapping(info));
        root.insert(
            "servers".into(),
            Value::Sequence(vec![Value::Mapping(server)]),
        );
        root.insert("tags".into(), Value::Sequence(self.tags));
        root.insert("paths".into(), Value::Mapping(self.paths));
        root.insert("components".into(), Value::Mapping(components));

        FrozenDocument {
            value: Value::Mapping(root),
            stats: self.stats,
        }
    }
}

/// A unified document that can no longer be modified.
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenDocument {
    value: Value,
    stats: MergeStats,
}

impl FrozenDocument {
    /// The complete document tree.
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Counters collected while the document was being merged.
    pub fn stats(&self) -> &MergeStats {
        &self.stats
    }
}

/// Derives the service identifier from a document path (its file stem).
pub fn service_identifier(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|stem| stem.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_skeleton_has_every_section() {
        let frozen = UnifiedDocument::new().freeze();
        let root = frozen.as_value();

        assert_eq!(root["openapi"].as_str(), Some(OPENAPI_VERSION));
        assert_eq!(root["info"]["title"].as_str(), Some(UNIFIED_TITLE));
        assert_eq!(root["info"]["version"].as_str(), Some(UNIFIED_VERSION));
        assert_eq!(root["servers"].as_sequence().map(Vec::len), Some(1));
        assert_eq!(root["tags"].as_sequence().map(Vec::len), Some(0));
        assert_eq!(root["paths"].as_mapping().map(Mapping::len), Some(0));
        for category in ComponentCategory::ALL {
            let entries = root["components"][category.as_str()].as_mapping();
            assert_eq!(entries.map(Mapping::len), Some(0), "{category}");
        }
    }

    #[test]
    fn test_top_level_key_order_is_fixed() {
        let frozen = UnifiedDocument::new().freeze();
        let keys: Vec<&str> = frozen
            .as_value()
            .as_mapping()
            .unwrap()
            .keys()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(
            keys,
            ["openapi", "info", "servers", "tags", "paths", "components"]
        );
    }

    #[test]
    fn test_insert_component_never_overwrites() {
        let mut unified = UnifiedDocument::new();
        assert!(unified.insert_component(
            ComponentCategory::Schemas,
            "Widget".into(),
            Value::from("first"),
        ));
        assert!(!unified.insert_component(
            ComponentCategory::Schemas,
            "Widget".into(),
            Value::from("second"),
        ));
        assert_eq!(
            unified.component(ComponentCategory::Schemas, "Widget"),
            Some(&Value::from("first"))
        );
        // Same name in another category is a separate entry.
        assert!(unified.insert_component(
            ComponentCategory::Responses,
            "Widget".into(),
            Value::from("response"),
        ));
    }

    #[test]
    fn test_push_tag_uses_structural_equality() {
        let mut unified = UnifiedDocument::new();
        let tag: Value = serde_yaml::from_str("name: users\ndescription: Users").unwrap();
        assert!(unified.push_tag(tag.clone()));
        assert!(!unified.push_tag(tag));
        let other: Value = serde_yaml::from_str("name: users\ndescription: Other").unwrap();
        assert!(unified.push_tag(other));
        assert_eq!(unified.tags().len(), 2);
    }

    #[test]
    fn test_category_names_round_trip() {
        for category in ComponentCategory::ALL {
            assert_eq!(ComponentCategory::from_name(category.as_str()), Some(category));
        }
    }

    #[test]
    fn test_service_identifier_is_file_stem() {
        assert_eq!(
            service_identifier(Path::new("/tmp/specs/billing.yaml")),
            Some("billing")
        );
    }
}
