//! Taglib definition loading
//!
//! Reads `marko-taglib.json` style documents and single-tag files and
//! normalizes both accepted shapes into the canonical schema:
//!
//! ```text
//! { "tags": { "my-hello": { "renderer": "./hello.js",
//!                           "attributes": { "name": "string" } } } }
//!
//! { "<my-hello>": { "renderer": "./hello.js", "@name": "string" } }
//! ```
//!
//! Paths inside a definition are resolved against the directory of the file
//! that contains them.

use super::config::DiscoveryConfig;
use super::fs::FileSystem;
use super::scanner::DirectoryScanner;
use crate::domain::nested::parse_declaration_key;
use crate::domain::schema::{
    default_target_property, AttributeName, AttributeSchema, Cardinality, Implementation,
    NestedTagDeclaration, TagDefinition, TagSchema, Taglib,
};
use crate::error::{ConfigError, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

const DEFAULT_TYPE: &str = "string";

/// A tag entry as written, before its implementation is resolved
#[derive(Debug)]
enum TagEntry<'v> {
    /// Path to a single-tag definition file
    InlinePath(PathBuf),
    /// Inline definition naming a renderer
    InlineSchema(&'v Map<String, Value>),
    /// Inline definition naming a compiled template
    TemplateRef(&'v Map<String, Value>),
}

impl<'v> TagEntry<'v> {
    fn classify(tag: &str, value: &'v Value, origin: &Path) -> Result<Self> {
        match value {
            Value::String(path) => Ok(TagEntry::InlinePath(base_dir(origin).join(path))),
            Value::Object(body) if body.contains_key("template") => Ok(TagEntry::TemplateRef(body)),
            Value::Object(body) => Ok(TagEntry::InlineSchema(body)),
            _ => Err(ConfigError::InvalidTagEntry {
                path: origin.to_path_buf(),
                tag: tag.to_string(),
            }
            .into()),
        }
    }
}

/// Where a body is being parsed, which decides the keys it may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Tag,
    /// Child schema of `@name <child>` declarations
    Nested,
    /// Entry of a verbose `nested-tags` map
    NestedVerbose,
}

/// Normalized contents of one tag body
#[derive(Debug, Default)]
pub(crate) struct TagBody {
    pub renderer: Option<PathBuf>,
    pub template: Option<PathBuf>,
    pub description: Option<String>,
    pub schema: TagSchema,
}

impl TagBody {
    /// Implementation named in the body itself
    pub fn explicit_implementation(&self, tag: &str, origin: &Path) -> Result<Option<Implementation>> {
        match (&self.renderer, &self.template) {
            (Some(renderer), None) => Ok(Some(Implementation::Renderer(renderer.clone()))),
            (None, Some(template)) => Ok(Some(Implementation::Template(template.clone()))),
            (None, None) => Ok(None),
            (Some(renderer), Some(template)) => Err(ConfigError::AmbiguousImplementation {
                path: origin.to_path_buf(),
                tag: tag.to_string(),
                candidates: vec![renderer.clone(), template.clone()],
            }
            .into()),
        }
    }

    pub fn into_definition(
        self,
        tag: &str,
        implementation: Implementation,
        origin: &Path,
    ) -> TagDefinition {
        TagDefinition {
            description: self.description,
            ..TagDefinition::new(tag, implementation, self.schema, origin)
        }
    }
}

/// Parses taglib and tag definition files into canonical form
pub struct TaglibLoader<'a> {
    fs: &'a dyn FileSystem,
    config: &'a DiscoveryConfig,
}

impl<'a> TaglibLoader<'a> {
    pub fn new(fs: &'a dyn FileSystem, config: &'a DiscoveryConfig) -> Self {
        TaglibLoader { fs, config }
    }

    /// Load a taglib definition file
    pub fn load_file(&self, path: &Path) -> Result<Taglib> {
        debug!(path = %path.display(), "Loading taglib");
        let contents = self.fs.read_to_string(path)?;
        self.load_str(&contents, path)
    }

    /// Load a taglib from source text, as if read from `path`
    pub fn load_str(&self, contents: &str, path: &Path) -> Result<Taglib> {
        let value = parse_json(contents, path)?;
        self.load_value(&value, path)
    }

    /// Load a taglib from an already parsed document
    pub fn load_value(&self, value: &Value, path: &Path) -> Result<Taglib> {
        let root = value.as_object().ok_or_else(|| ConfigError::Parse {
            path: path.to_path_buf(),
            message: "taglib must be a JSON object".to_string(),
        })?;

        let mut taglib = Taglib::new(path);
        let mut scan_roots = Vec::new();

        for (key, entry) in root {
            if let Some(name) = shorthand_tag_name(key) {
                let def = self.load_entry(name, entry, path)?;
                insert_tag(&mut taglib, def, path)?;
                continue;
            }

            match key.as_str() {
                "tags" => {
                    let tags = entry.as_object().ok_or_else(|| ConfigError::Parse {
                        path: path.to_path_buf(),
                        message: "\"tags\" must be an object".to_string(),
                    })?;
                    for (name, entry) in tags {
                        let def = self.load_entry(name, entry, path)?;
                        insert_tag(&mut taglib, def, path)?;
                    }
                }
                "tags-dir" => scan_roots = tags_dir_roots(entry, path)?,
                "taglib-id" => taglib.id = Some(expect_string(entry, key, path)?),
                _ => {
                    return Err(ConfigError::UnknownProperty {
                        path: path.to_path_buf(),
                        context: "taglib".to_string(),
                        property: key.clone(),
                    }
                    .into())
                }
            }
        }

        if !scan_roots.is_empty() {
            let scanned = DirectoryScanner::new(self.fs, self.config).scan(&scan_roots)?;
            for def in scanned.tags.into_values() {
                if taglib.tags.contains_key(&def.name) {
                    return Err(ConfigError::DuplicateTag {
                        path: path.to_path_buf(),
                        tag: def.name,
                    }
                    .into());
                }
                taglib.tags.insert(def.name.clone(), def);
            }
        }

        Ok(taglib)
    }

    /// Load a standalone single-tag definition file
    ///
    /// Without an explicit `renderer` or `template`, the implementation is
    /// inferred from convention files next to the tag file.
    pub fn load_tag_file(&self, tag: &str, path: &Path) -> Result<TagDefinition> {
        debug!(tag, path = %path.display(), "Loading tag file");
        let contents = self.fs.read_to_string(path)?;
        let value = parse_json(&contents, path)?;
        let body = value.as_object().ok_or_else(|| ConfigError::Parse {
            path: path.to_path_buf(),
            message: "tag definition must be a JSON object".to_string(),
        })?;

        let body = self.parse_tag_body(tag, body, path)?;
        let implementation = match body.explicit_implementation(tag, path)? {
            Some(implementation) => implementation,
            None => DirectoryScanner::new(self.fs, self.config)
                .convention_implementation(tag, base_dir(path), path)?,
        };

        Ok(body.into_definition(tag, implementation, path))
    }

    fn load_entry(&self, tag: &str, entry: &Value, origin: &Path) -> Result<TagDefinition> {
        match TagEntry::classify(tag, entry, origin)? {
            TagEntry::InlinePath(path) => self.load_tag_file(tag, &path),
            TagEntry::InlineSchema(body) | TagEntry::TemplateRef(body) => {
                let body = self.parse_tag_body(tag, body, origin)?;
                let implementation = body.explicit_implementation(tag, origin)?.ok_or_else(|| {
                    ConfigError::MissingImplementation {
                        path: origin.to_path_buf(),
                        tag: tag.to_string(),
                    }
                })?;
                Ok(body.into_definition(tag, implementation, origin))
            }
        }
    }

    /// Normalize a tag body (inline entry, tag file, or embedded schema)
    pub(crate) fn parse_tag_body(
        &self,
        tag: &str,
        body: &Map<String, Value>,
        origin: &Path,
    ) -> Result<TagBody> {
        parse_body(tag, body, origin, BodyKind::Tag)
    }
}

fn parse_body(tag: &str, body: &Map<String, Value>, origin: &Path, kind: BodyKind) -> Result<TagBody> {
    let mut parsed = TagBody::default();

    for (key, value) in body {
        if let Some(attr) = key.strip_prefix('@') {
            add_attribute(&mut parsed.schema, tag, attr, value, origin, true)?;
            continue;
        }

        match (key.as_str(), kind) {
            ("renderer", BodyKind::Tag) => {
                parsed.renderer = Some(base_dir(origin).join(expect_string(value, key, origin)?));
            }
            ("template", BodyKind::Tag) => {
                parsed.template = Some(base_dir(origin).join(expect_string(value, key, origin)?));
            }
            ("description", _) => parsed.description = Some(expect_string(value, key, origin)?),
            ("attributes", _) => {
                let attributes = value.as_object().ok_or_else(|| ConfigError::Parse {
                    path: origin.to_path_buf(),
                    message: format!("attributes of <{}> must be an object", tag),
                })?;
                for (name, attr) in attributes {
                    add_attribute(&mut parsed.schema, tag, name, attr, origin, false)?;
                }
            }
            ("nested-tags", _) => {
                let nested = value.as_object().ok_or_else(|| ConfigError::Parse {
                    path: origin.to_path_buf(),
                    message: format!("nested-tags of <{}> must be an object", tag),
                })?;
                for (child, decl) in nested {
                    add_verbose_nested(&mut parsed.schema, tag, child, decl, origin)?;
                }
            }
            ("target-property" | "is-repeated", BodyKind::NestedVerbose) => {}
            _ => {
                return Err(ConfigError::UnknownProperty {
                    path: origin.to_path_buf(),
                    context: format!("<{}>", tag),
                    property: key.clone(),
                }
                .into())
            }
        }
    }

    check_target_properties(&parsed.schema, tag, origin)?;
    Ok(parsed)
}

/// Add one attribute entry; `shorthand` is true for `@name` keys
fn add_attribute(
    schema: &mut TagSchema,
    tag: &str,
    key: &str,
    value: &Value,
    origin: &Path,
    shorthand: bool,
) -> Result<()> {
    let declaration = parse_declaration_key(key).map_err(|_| ConfigError::InvalidNestedDeclaration {
        path: origin.to_path_buf(),
        tag: tag.to_string(),
        key: key.to_string(),
    })?;

    if let Some(decl) = declaration {
        let body = value.as_object().ok_or_else(|| ConfigError::InvalidNestedDeclaration {
            path: origin.to_path_buf(),
            tag: tag.to_string(),
            key: key.to_string(),
        })?;
        let child_name = format!("{}.{}", tag, decl.child_tag);
        let child = parse_body(&child_name, body, origin, BodyKind::Nested)?;
        return insert_nested(
            schema,
            tag,
            NestedTagDeclaration {
                parent_attribute: decl.property,
                child_tag: decl.child_tag,
                cardinality: decl.cardinality,
                child_schema: child.schema,
            },
            origin,
        );
    }

    let name = if shorthand && key == "*" {
        AttributeName::Wildcard
    } else {
        AttributeName::literal(key)
    };
    let attr = attribute_schema(name, value, tag, origin)?;
    trace!(tag, attribute = %attr.name, type_id = %attr.type_id, "Normalized attribute");

    match schema.attributes.get(&attr.name) {
        Some(existing) if *existing != attr => Err(ConfigError::AttributeConflict {
            path: origin.to_path_buf(),
            tag: tag.to_string(),
            attribute: attr.name.to_string(),
        }
        .into()),
        Some(_) => Ok(()),
        None => {
            schema.attributes.insert(attr.name.clone(), attr);
            Ok(())
        }
    }
}

fn attribute_schema(
    name: AttributeName,
    value: &Value,
    tag: &str,
    origin: &Path,
) -> Result<AttributeSchema> {
    let mut attr = match &name {
        AttributeName::Wildcard => AttributeSchema::wildcard(DEFAULT_TYPE),
        AttributeName::Literal(literal) => AttributeSchema::new(literal.as_str(), DEFAULT_TYPE),
    };
    let invalid = |reason: &str| ConfigError::InvalidAttribute {
        path: origin.to_path_buf(),
        tag: tag.to_string(),
        attribute: name.to_string(),
        reason: reason.to_string(),
    };

    match value {
        Value::String(type_id) => attr.type_id = type_id.clone(),
        Value::Object(options) => {
            let mut target_property = None;
            let mut preserve_name = false;
            for (key, option) in options {
                match key.as_str() {
                    "type" => {
                        attr.type_id = option
                            .as_str()
                            .ok_or_else(|| invalid("\"type\" must be a string"))?
                            .to_string()
                    }
                    "required" => {
                        attr.required = option
                            .as_bool()
                            .ok_or_else(|| invalid("\"required\" must be a boolean"))?
                    }
                    "target-property" => {
                        target_property = Some(
                            option
                                .as_str()
                                .ok_or_else(|| invalid("\"target-property\" must be a string"))?
                                .to_string(),
                        )
                    }
                    "preserve-name" => {
                        preserve_name = option
                            .as_bool()
                            .ok_or_else(|| invalid("\"preserve-name\" must be a boolean"))?
                    }
                    "description" => {
                        attr.description = Some(
                            option
                                .as_str()
                                .ok_or_else(|| invalid("\"description\" must be a string"))?
                                .to_string(),
                        )
                    }
                    _ => {
                        return Err(ConfigError::UnknownProperty {
                            path: origin.to_path_buf(),
                            context: format!("attribute '{}' of <{}>", name, tag),
                            property: key.clone(),
                        }
                        .into())
                    }
                }
            }

            if let AttributeName::Literal(literal) = &name {
                attr.target_property = match (target_property, preserve_name) {
                    (Some(target), _) => target,
                    (None, true) => literal.clone(),
                    (None, false) => default_target_property(literal),
                };
            } else if target_property.is_some() {
                return Err(invalid("the wildcard always maps to \"*\"").into());
            }
        }
        _ => return Err(invalid("expected a type name or an options object").into()),
    }

    Ok(attr)
}

fn add_verbose_nested(
    schema: &mut TagSchema,
    tag: &str,
    child: &str,
    value: &Value,
    origin: &Path,
) -> Result<()> {
    let invalid = || ConfigError::InvalidNestedDeclaration {
        path: origin.to_path_buf(),
        tag: tag.to_string(),
        key: child.to_string(),
    };
    let body = value.as_object().ok_or_else(invalid)?;

    let parent_attribute = match body.get("target-property") {
        Some(Value::String(target)) => target.clone(),
        Some(_) => return Err(invalid().into()),
        None => child.to_string(),
    };
    let cardinality = match body.get("is-repeated") {
        Some(Value::Bool(true)) => Cardinality::Array,
        Some(Value::Bool(false)) | None => Cardinality::Single,
        Some(_) => return Err(invalid().into()),
    };

    let child_name = format!("{}.{}", tag, child);
    let parsed = parse_body(&child_name, body, origin, BodyKind::NestedVerbose)?;
    insert_nested(
        schema,
        tag,
        NestedTagDeclaration {
            parent_attribute,
            child_tag: child.to_string(),
            cardinality,
            child_schema: parsed.schema,
        },
        origin,
    )
}

fn insert_nested(
    schema: &mut TagSchema,
    tag: &str,
    decl: NestedTagDeclaration,
    origin: &Path,
) -> Result<()> {
    match schema.nested_tags.get(&decl.child_tag) {
        Some(existing) if *existing != decl => Err(ConfigError::AttributeConflict {
            path: origin.to_path_buf(),
            tag: tag.to_string(),
            attribute: decl.parent_attribute,
        }
        .into()),
        Some(_) => Ok(()),
        None => {
            schema.nested_tags.insert(decl.child_tag.clone(), decl);
            Ok(())
        }
    }
}

/// Every attribute and nested tag must land on its own input property
fn check_target_properties(schema: &TagSchema, tag: &str, origin: &Path) -> Result<()> {
    let mut seen = HashSet::new();
    let targets = schema
        .attributes
        .values()
        .map(|a| a.target_property.as_str())
        .chain(schema.nested_tags.values().map(|n| n.parent_attribute.as_str()));

    for target in targets {
        if !seen.insert(target) {
            return Err(ConfigError::TargetPropertyConflict {
                path: origin.to_path_buf(),
                tag: tag.to_string(),
                property: target.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

fn insert_tag(taglib: &mut Taglib, def: TagDefinition, origin: &Path) -> Result<()> {
    match taglib.tags.get(&def.name) {
        Some(existing) if existing.same_shape(&def) => Ok(()),
        Some(_) => Err(ConfigError::DuplicateTag {
            path: origin.to_path_buf(),
            tag: def.name,
        }
        .into()),
        None => {
            taglib.tags.insert(def.name.clone(), def);
            Ok(())
        }
    }
}

fn tags_dir_roots(value: &Value, origin: &Path) -> Result<Vec<PathBuf>> {
    let base = base_dir(origin);
    match value {
        Value::String(dir) => Ok(vec![base.join(dir)]),
        Value::Array(dirs) => dirs
            .iter()
            .map(|dir| expect_string(dir, "tags-dir", origin).map(|dir| base.join(dir)))
            .collect(),
        _ => Err(ConfigError::Parse {
            path: origin.to_path_buf(),
            message: "\"tags-dir\" must be a path or a list of paths".to_string(),
        }
        .into()),
    }
}

/// `<my-tag>` to `my-tag`
fn shorthand_tag_name(key: &str) -> Option<&str> {
    key.strip_prefix('<')?.strip_suffix('>')
}

fn expect_string(value: &Value, key: &str, origin: &Path) -> Result<String> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        ConfigError::Parse {
            path: origin.to_path_buf(),
            message: format!("\"{}\" must be a string", key),
        }
        .into()
    })
}

pub(crate) fn parse_json(contents: &str, path: &Path) -> Result<Value> {
    serde_json::from_str(contents).map_err(|e| {
        ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
        .into()
    })
}

pub(crate) fn base_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("/"))
}
