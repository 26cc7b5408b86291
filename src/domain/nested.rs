//! Nested tags: declaration syntax, child definitions and occurrence resolution
//!
//! A parent declares nested tags with attribute keys such as `@tabs <tab>[]`.
//! Each declaration yields a child definition `parent.child` without a
//! renderer of its own. When a template uses the parent, child usages in its
//! body are collected into the declared property as one object (`single`) or
//! an ordered sequence (`array`).

use super::attributes::AttributeValidator;
use super::occurrence::{split_body, InputValue, ResolvedInput, TagOccurrence};
use super::registry::TagRegistry;
use super::schema::{
    Cardinality, Implementation, NestedTagDeclaration, Provenance, TagDefinition, TagSchema,
    Taglib, WILDCARD_PROPERTY,
};
use crate::error::{ConfigError, ResolutionError, Result, ValidationError};
use regex::Regex;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::trace;

/// `name <child>` or `name <child>[]`, with the leading `@` already removed
fn declaration_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^([A-Za-z_$][A-Za-z0-9_$-]*)\s+<([A-Za-z][A-Za-z0-9_:-]*)>(\[\])?$").unwrap()
    })
}

/// Parsed form of a nested-tag attribute key
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DeclarationKey {
    pub property: String,
    pub child_tag: String,
    pub cardinality: Cardinality,
}

/// Parse an attribute key carrying a child tag reference
///
/// Returns `None` for keys without a `<...>` annotation (plain attributes).
/// A key that has one but does not match the syntax is an error.
pub(crate) fn parse_declaration_key(key: &str) -> std::result::Result<Option<DeclarationKey>, ()> {
    if !key.contains('<') {
        return Ok(None);
    }

    let caps = declaration_regex().captures(key.trim()).ok_or(())?;
    Ok(Some(DeclarationKey {
        property: caps[1].to_string(),
        child_tag: caps[2].to_string(),
        cardinality: if caps.get(3).is_some() {
            Cardinality::Array
        } else {
            Cardinality::Single
        },
    }))
}

pub struct NestedTagResolver;

impl NestedTagResolver {
    /// Add a derived child definition for every nested declaration in the taglib
    pub fn expand(mut taglib: Taglib) -> Result<Taglib> {
        let mut derived = Vec::new();
        for def in taglib.tags.values() {
            Self::derive_children(&def.name, &def.schema, &def.provenance, &mut derived);
        }

        for child in derived {
            if taglib.tags.contains_key(&child.name) {
                return Err(ConfigError::DuplicateTag {
                    path: taglib.source.clone(),
                    tag: child.name,
                }
                .into());
            }
            trace!(tag = %child.name, "Derived nested tag");
            taglib.tags.insert(child.name.clone(), child);
        }

        Ok(taglib)
    }

    /// Definition of the child declared by `decl` on `parent`
    pub fn child_definition(parent: &TagDefinition, decl: &NestedTagDeclaration) -> TagDefinition {
        TagDefinition {
            name: format!("{}.{}", parent.name, decl.child_tag),
            implementation: Implementation::Nested(parent.name.clone()),
            schema: decl.child_schema.clone(),
            description: None,
            provenance: parent.provenance.clone(),
        }
    }

    fn derive_children(
        parent: &str,
        schema: &TagSchema,
        provenance: &Provenance,
        out: &mut Vec<TagDefinition>,
    ) {
        for decl in schema.nested_tags.values() {
            let name = format!("{}.{}", parent, decl.child_tag);
            Self::derive_children(&name, &decl.child_schema, provenance, out);
            out.push(TagDefinition {
                name,
                implementation: Implementation::Nested(parent.to_string()),
                schema: decl.child_schema.clone(),
                description: None,
                provenance: provenance.clone(),
            });
        }
    }

    /// Resolve one usage of `def` into the input its renderer receives
    ///
    /// Attributes are validated first. Child usages named `<def.name>.<child>`
    /// are taken out of the body and collected per declaration; the rest of
    /// the body becomes `render_body`.
    pub fn resolve(
        registry: &TagRegistry,
        def: &TagDefinition,
        occurrence: &TagOccurrence,
    ) -> Result<ResolvedInput> {
        let binding =
            AttributeValidator::validate(def, &occurrence.attributes, &occurrence.location)?;

        let mut properties = BTreeMap::new();
        for (attr, usage) in &binding.declared {
            properties.insert(
                attr.target_property.clone(),
                InputValue::Expression(usage.value.clone()),
            );
        }
        if !binding.wildcard.is_empty() {
            let absorbed = binding
                .wildcard
                .iter()
                .map(|u| (u.name.clone(), u.value.clone()))
                .collect();
            properties.insert(WILDCARD_PROPERTY.to_string(), InputValue::Wildcard(absorbed));
        }

        let prefix = format!("{}.", def.name);
        let (children, rest) = match &occurrence.body {
            Some(body) => {
                let (children, rest) = split_body(body, |occ| {
                    occ.name
                        .strip_prefix(&prefix)
                        .filter(|local| !local.contains('.'))
                        .map(str::to_string)
                });
                (children, Some((rest, body.is_empty())))
            }
            None => (Vec::new(), None),
        };

        if let Some((_, occ)) = children
            .iter()
            .find(|(local, _)| !def.schema.nested_tags.contains_key(local))
        {
            return Err(ValidationError::UnknownTag {
                tag: occ.name.clone(),
                location: occ.location.clone(),
            }
            .into());
        }

        for decl in def.schema.nested_tags.values() {
            let direct = binding.nested_value(&decl.parent_attribute);
            let matching: Vec<&TagOccurrence> = children
                .iter()
                .filter(|(local, _)| *local == decl.child_tag)
                .map(|(_, occ)| *occ)
                .collect();

            if let (Some(_), Some(first)) = (direct, matching.first()) {
                return Err(ResolutionError::AmbiguousSource {
                    tag: def.name.clone(),
                    property: decl.parent_attribute.clone(),
                    location: first.location.clone(),
                }
                .into());
            }

            let value = match decl.cardinality {
                Cardinality::Single => {
                    if let Some(extra) = matching.get(1) {
                        return Err(ResolutionError::CardinalityViolation {
                            tag: def.name.clone(),
                            child: decl.child_tag.clone(),
                            location: extra.location.clone(),
                        }
                        .into());
                    }
                    match (matching.first(), direct) {
                        (Some(occ), _) => Some(InputValue::Nested(Box::new(
                            Self::resolve_child(registry, def, decl, occ)?,
                        ))),
                        (None, Some(usage)) => Some(InputValue::Expression(usage.value.clone())),
                        (None, None) => None,
                    }
                }
                Cardinality::Array => match direct {
                    Some(usage) => Some(InputValue::Expression(usage.value.clone())),
                    None => Some(InputValue::Repeated(
                        matching
                            .iter()
                            .map(|occ| Self::resolve_child(registry, def, decl, occ))
                            .collect::<Result<Vec<_>>>()?,
                    )),
                },
            };

            if let Some(value) = value {
                properties.insert(decl.parent_attribute.clone(), value);
            }
        }

        let render_body = rest.and_then(|(rest, was_empty)| {
            if !rest.is_empty() || was_empty {
                Some(rest)
            } else {
                None
            }
        });

        Ok(ResolvedInput {
            tag: def.name.clone(),
            properties,
            render_body,
        })
    }

    fn resolve_child(
        registry: &TagRegistry,
        parent: &TagDefinition,
        decl: &NestedTagDeclaration,
        occurrence: &TagOccurrence,
    ) -> Result<ResolvedInput> {
        let child = match registry.get(&occurrence.name) {
            Some(def) if def.is_nested() => Cow::Borrowed(def),
            _ => Cow::Owned(Self::child_definition(parent, decl)),
        };
        Self::resolve(registry, &child, occurrence)
    }
}
