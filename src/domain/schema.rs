//! Canonical tag schema
//!
//! Every definition source (verbose or shorthand taglib entries, single-tag
//! files, scanned directories, embedded renderer schemas) is normalized into
//! these types before anything else looks at it.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Reserved property that collects every attribute absorbed by a wildcard
pub const WILDCARD_PROPERTY: &str = "*";

/// Default property of an attribute literally named `*`
pub const LITERAL_STAR_PROPERTY: &str = "asterisk";

/// Name of a declared attribute
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeName {
    /// Matches exactly one attribute name
    Literal(String),
    /// Matches any attribute not otherwise declared
    Wildcard,
}

impl AttributeName {
    pub fn literal(name: impl Into<String>) -> Self {
        AttributeName::Literal(name.into())
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeName::Literal(name) => write!(f, "{}", name),
            AttributeName::Wildcard => write!(f, "@*"),
        }
    }
}

impl Serialize for AttributeName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Schema of one declared attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeSchema {
    pub name: AttributeName,

    /// Open type identifier (`string`, `expression`, ...)
    pub type_id: String,

    /// Property on the renderer input that receives the value
    pub target_property: String,

    pub required: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AttributeSchema {
    /// Literal attribute with the default camelCase target property
    pub fn new(name: impl Into<String>, type_id: impl Into<String>) -> Self {
        let name = name.into();
        AttributeSchema {
            target_property: default_target_property(&name),
            name: AttributeName::Literal(name),
            type_id: type_id.into(),
            required: false,
            description: None,
        }
    }

    pub fn wildcard(type_id: impl Into<String>) -> Self {
        AttributeSchema {
            name: AttributeName::Wildcard,
            type_id: type_id.into(),
            target_property: WILDCARD_PROPERTY.to_string(),
            required: false,
            description: None,
        }
    }
}

/// Whether a nested tag resolves to one object or an ordered sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    Single,
    Array,
}

/// A child tag scoped to a parent, declared on the parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedTagDeclaration {
    /// Property under which resolved children are exposed
    pub parent_attribute: String,
    pub child_tag: String,
    pub cardinality: Cardinality,
    pub child_schema: TagSchema,
}

/// Attributes and nested tags of a tag, without its implementation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagSchema {
    pub attributes: BTreeMap<AttributeName, AttributeSchema>,
    /// Keyed by child tag local name
    pub nested_tags: BTreeMap<String, NestedTagDeclaration>,
}

impl TagSchema {
    pub fn wildcard(&self) -> Option<&AttributeSchema> {
        self.attributes.get(&AttributeName::Wildcard)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.get(&AttributeName::Literal(name.to_string()))
    }

    /// Nested declaration whose property is `property`
    pub fn nested_by_property(&self, property: &str) -> Option<&NestedTagDeclaration> {
        self.nested_tags
            .values()
            .find(|n| n.parent_attribute == property)
    }
}

/// How a tag is rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "target")]
pub enum Implementation {
    Renderer(PathBuf),
    Template(PathBuf),
    /// No renderer of its own; supplies a value to the named parent
    Nested(String),
}

impl Implementation {
    pub fn kind(&self) -> &'static str {
        match self {
            Implementation::Renderer(_) => "renderer",
            Implementation::Template(_) => "template",
            Implementation::Nested(_) => "nested",
        }
    }
}

/// Precedence of a taglib: lower ranks win
///
/// `level` counts directories upward from the template; `slot` orders the
/// sources found at one level (0 for the directory's own taglib, then
/// package taglibs by package name).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DiscoveryRank {
    pub level: usize,
    pub slot: usize,
}

impl DiscoveryRank {
    pub fn new(level: usize, slot: usize) -> Self {
        DiscoveryRank { level, slot }
    }
}

impl fmt::Display for DiscoveryRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.level, self.slot)
    }
}

/// Where a definition came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub source: PathBuf,
    pub rank: DiscoveryRank,
}

impl Provenance {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Provenance {
            source: source.into(),
            rank: DiscoveryRank::default(),
        }
    }
}

/// Schema and implementation binding of one custom tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagDefinition {
    /// `ui-tabs`, or `ui-tabs.tab` for nested tags
    pub name: String,
    pub implementation: Implementation,
    pub schema: TagSchema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub provenance: Provenance,
}

impl TagDefinition {
    pub fn new(
        name: impl Into<String>,
        implementation: Implementation,
        schema: TagSchema,
        source: impl Into<PathBuf>,
    ) -> Self {
        TagDefinition {
            name: name.into(),
            implementation,
            schema,
            description: None,
            provenance: Provenance::new(source),
        }
    }

    pub fn is_nested(&self) -> bool {
        matches!(self.implementation, Implementation::Nested(_))
    }

    /// True when both definitions bind the same schema and implementation
    pub fn same_shape(&self, other: &TagDefinition) -> bool {
        self.name == other.name
            && self.implementation == other.implementation
            && self.schema == other.schema
            && self.description == other.description
    }
}

/// Tag definitions produced by one load operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Taglib {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: PathBuf,
    pub rank: DiscoveryRank,
    pub tags: BTreeMap<String, TagDefinition>,
}

impl Taglib {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Taglib {
            id: None,
            source: source.into(),
            rank: DiscoveryRank::default(),
            tags: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&TagDefinition> {
        self.tags.get(name)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Stamp a discovery rank on the taglib and every definition in it
    pub fn ranked(mut self, rank: DiscoveryRank) -> Self {
        self.rank = rank;
        for def in self.tags.values_mut() {
            def.provenance.rank = rank;
        }
        self
    }
}

/// Input property an attribute maps to unless configured otherwise
///
/// A literal `*` attribute stays off the wildcard's reserved property.
pub fn default_target_property(name: &str) -> String {
    if name == WILDCARD_PROPERTY {
        LITERAL_STAR_PROPERTY.to_string()
    } else {
        camel_case(name)
    }
}

/// `foo-bar-baz` to `fooBarBaz`
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '-' {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("name"), "name");
        assert_eq!(camel_case("data-item-id"), "dataItemId");
        assert_eq!(camel_case("-leading"), "leading");
    }

    #[test]
    fn test_default_target_property() {
        assert_eq!(default_target_property("data-id"), "dataId");
        assert_eq!(default_target_property("*"), LITERAL_STAR_PROPERTY);
        assert_eq!(AttributeSchema::new("*", "string").target_property, "asterisk");
        assert_eq!(AttributeSchema::wildcard("string").target_property, WILDCARD_PROPERTY);
    }

    #[test]
    fn test_rank_ordering() {
        let near_direct = DiscoveryRank::new(0, 0);
        let near_package = DiscoveryRank::new(0, 3);
        let far_direct = DiscoveryRank::new(1, 0);
        assert!(near_direct < near_package);
        assert!(near_package < far_direct);
    }

    #[test]
    fn test_ranked_stamps_definitions() {
        let mut taglib = Taglib::new("/a/marko.json");
        taglib.tags.insert(
            "x".to_string(),
            TagDefinition::new(
                "x",
                Implementation::Renderer(PathBuf::from("/a/x.js")),
                TagSchema::default(),
                "/a/marko.json",
            ),
        );
        let taglib = taglib.ranked(DiscoveryRank::new(2, 1));
        assert_eq!(taglib.rank, DiscoveryRank::new(2, 1));
        assert_eq!(taglib.tags["x"].provenance.rank, DiscoveryRank::new(2, 1));
    }

    #[test]
    fn test_wildcard_sorts_after_literals() {
        let mut schema = TagSchema::default();
        schema
            .attributes
            .insert(AttributeName::Wildcard, AttributeSchema::wildcard("string"));
        schema.attributes.insert(
            AttributeName::literal("name"),
            AttributeSchema::new("name", "string"),
        );
        let names: Vec<String> = schema.attributes.keys().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["name", "@*"]);
        assert!(schema.wildcard().is_some());
    }
}
