//! Tag usages in a parsed template and the renderer input they resolve to

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Position of a tag or attribute in a template source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        SourceLocation {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// One attribute written on a tag usage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeUsage {
    pub name: String,
    /// Expression source text, passed through untouched
    pub value: String,
    pub location: SourceLocation,
}

impl AttributeUsage {
    pub fn new(name: impl Into<String>, value: impl Into<String>, location: SourceLocation) -> Self {
        AttributeUsage {
            name: name.into(),
            value: value.into(),
            location,
        }
    }
}

/// Content inside a tag body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyNode {
    Text(String),
    Tag(TagOccurrence),
}

impl BodyNode {
    fn is_blank_text(&self) -> bool {
        matches!(self, BodyNode::Text(text) if text.trim().is_empty())
    }
}

/// One usage of a custom tag in a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagOccurrence {
    pub name: String,
    pub location: SourceLocation,
    pub attributes: Vec<AttributeUsage>,
    /// `None` for a tag written without a body, `Some(vec![])` for an explicitly empty one
    pub body: Option<Vec<BodyNode>>,
}

impl TagOccurrence {
    pub fn new(name: impl Into<String>, location: SourceLocation) -> Self {
        TagOccurrence {
            name: name.into(),
            location,
            attributes: Vec::new(),
            body: None,
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        let location = self.location.clone();
        self.attributes
            .push(AttributeUsage::new(name, value, location));
        self
    }

    pub fn with_body(mut self, body: Vec<BodyNode>) -> Self {
        self.body = Some(body);
        self
    }
}

/// Value of one property on a renderer input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum InputValue {
    Expression(String),
    /// Attributes absorbed by the wildcard, by attribute name
    Wildcard(BTreeMap<String, String>),
    Nested(Box<ResolvedInput>),
    Repeated(Vec<ResolvedInput>),
}

/// Structured input handed to a renderer (or to a parent, for nested tags)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedInput {
    pub tag: String,
    pub properties: BTreeMap<String, InputValue>,
    /// Present only when the usage had body content
    pub render_body: Option<Vec<BodyNode>>,
}

impl ResolvedInput {
    pub fn get(&self, property: &str) -> Option<&InputValue> {
        self.properties.get(property)
    }

    pub fn expression(&self, property: &str) -> Option<&str> {
        match self.properties.get(property) {
            Some(InputValue::Expression(expr)) => Some(expr),
            _ => None,
        }
    }
}

/// Split a parent body into nested-tag usages and the remaining content
///
/// `is_nested` receives each child tag and returns the local name of the
/// nested tag it stands for. Blank text around nested tags is dropped.
pub(crate) fn split_body<F>(
    body: &[BodyNode],
    mut is_nested: F,
) -> (Vec<(String, &TagOccurrence)>, Vec<BodyNode>)
where
    F: FnMut(&TagOccurrence) -> Option<String>,
{
    let mut nested = Vec::new();
    let mut rest = Vec::new();

    for node in body {
        match node {
            BodyNode::Tag(occurrence) => match is_nested(occurrence) {
                Some(local) => nested.push((local, occurrence)),
                None => rest.push(node.clone()),
            },
            BodyNode::Text(_) => rest.push(node.clone()),
        }
    }

    if !nested.is_empty() {
        rest.retain(|node| !node.is_blank_text());
    }

    (nested, rest)
}
