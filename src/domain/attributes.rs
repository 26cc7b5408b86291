//! Attribute usage validation against a tag's declared schema

use super::occurrence::{AttributeUsage, SourceLocation};
use super::schema::{AttributeName, AttributeSchema, NestedTagDeclaration, TagDefinition};
use crate::error::{Result, ValidationError};
use std::collections::HashSet;

/// Where each used attribute ends up
#[derive(Debug, Default)]
pub struct AttributeBinding<'a> {
    /// Attributes matching a literal declaration
    pub declared: Vec<(&'a AttributeSchema, &'a AttributeUsage)>,
    /// Attributes supplying a nested-tag property directly
    pub nested: Vec<(&'a NestedTagDeclaration, &'a AttributeUsage)>,
    /// Attributes absorbed by the wildcard, in usage order
    pub wildcard: Vec<&'a AttributeUsage>,
}

impl<'a> AttributeBinding<'a> {
    pub fn nested_value(&self, property: &str) -> Option<&'a AttributeUsage> {
        self.nested
            .iter()
            .find(|(decl, _)| decl.parent_attribute == property)
            .map(|(_, usage)| *usage)
    }
}

/// Static schema-versus-usage check; values are never inspected
pub struct AttributeValidator;

impl AttributeValidator {
    /// Check the attribute names used on one occurrence of `def`
    ///
    /// `at` is the location of the tag itself, reported for missing
    /// required attributes.
    pub fn validate<'a>(
        def: &'a TagDefinition,
        usages: &'a [AttributeUsage],
        at: &SourceLocation,
    ) -> Result<AttributeBinding<'a>> {
        let schema = &def.schema;
        let mut binding = AttributeBinding::default();
        let mut seen = HashSet::new();

        for usage in usages {
            if !seen.insert(usage.name.as_str()) {
                return Err(ValidationError::DuplicateAttribute {
                    tag: def.name.clone(),
                    attribute: usage.name.clone(),
                    location: usage.location.clone(),
                }
                .into());
            }

            if let Some(attr) = schema.attribute(&usage.name) {
                binding.declared.push((attr, usage));
            } else if let Some(nested) = schema.nested_by_property(&usage.name) {
                binding.nested.push((nested, usage));
            } else if schema.wildcard().is_some() {
                binding.wildcard.push(usage);
            } else {
                return Err(ValidationError::UnknownAttribute {
                    tag: def.name.clone(),
                    attribute: usage.name.clone(),
                    location: usage.location.clone(),
                }
                .into());
            }
        }

        for attr in schema.attributes.values().filter(|a| a.required) {
            let present = match &attr.name {
                AttributeName::Literal(name) => seen.contains(name.as_str()),
                // at least one attribute must be absorbed
                AttributeName::Wildcard => !binding.wildcard.is_empty(),
            };
            if !present {
                return Err(ValidationError::MissingRequired {
                    tag: def.name.clone(),
                    attribute: attr.name.to_string(),
                    location: at.clone(),
                }
                .into());
            }
        }

        Ok(binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{Cardinality, Implementation, TagSchema};
    use crate::error::TaglibError;
    use std::path::PathBuf;

    fn loc(line: u32) -> SourceLocation {
        SourceLocation::new("/proj/page.marko", line, 1)
    }

    fn usage(name: &str, line: u32) -> AttributeUsage {
        AttributeUsage::new(name, "x", loc(line))
    }

    fn hello(with_wildcard: bool) -> TagDefinition {
        let mut schema = TagSchema::default();
        let name = AttributeSchema::new("name", "string");
        schema.attributes.insert(name.name.clone(), name);
        if with_wildcard {
            let wildcard = AttributeSchema::wildcard("string");
            schema.attributes.insert(wildcard.name.clone(), wildcard);
        }
        TagDefinition::new(
            "my-hello",
            Implementation::Renderer(PathBuf::from("/proj/renderer.js")),
            schema,
            "/proj/marko-taglib.json",
        )
    }

    #[test]
    fn test_declared_attribute_passes() {
        let def = hello(false);
        let usages = vec![usage("name", 1)];
        let binding = AttributeValidator::validate(&def, &usages, &loc(1)).unwrap();
        assert_eq!(binding.declared.len(), 1);
        assert!(binding.wildcard.is_empty());
    }

    #[test]
    fn test_undeclared_attribute_without_wildcard_fails() {
        let def = hello(false);
        let usages = vec![usage("name", 1), usage("foo", 2)];
        let err = AttributeValidator::validate(&def, &usages, &loc(1)).unwrap_err();
        match err {
            TaglibError::Validation(ValidationError::UnknownAttribute {
                tag,
                attribute,
                location,
            }) => {
                assert_eq!(tag, "my-hello");
                assert_eq!(attribute, "foo");
                assert_eq!(location.line, 2);
            }
            other => panic!("Expected UnknownAttribute, got {:?}", other),
        }
    }

    #[test]
    fn test_wildcard_absorbs_undeclared() {
        let def = hello(true);
        let usages = vec![usage("name", 1), usage("class", 1), usage("data-id", 1)];
        let binding = AttributeValidator::validate(&def, &usages, &loc(1)).unwrap();
        assert_eq!(binding.declared.len(), 1);
        let absorbed: Vec<&str> = binding.wildcard.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(absorbed, vec!["class", "data-id"]);
    }

    #[test]
    fn test_duplicate_usage_fails() {
        let def = hello(true);
        let usages = vec![usage("name", 1), usage("name", 3)];
        let err = AttributeValidator::validate(&def, &usages, &loc(1)).unwrap_err();
        assert!(matches!(
            err,
            TaglibError::Validation(ValidationError::DuplicateAttribute { .. })
        ));
    }

    #[test]
    fn test_missing_required_reports_tag_location() {
        let mut def = hello(false);
        let required = AttributeSchema {
            required: true,
            ..AttributeSchema::new("title", "string")
        };
        def.schema.attributes.insert(required.name.clone(), required);

        let usages = vec![usage("name", 4)];
        let err = AttributeValidator::validate(&def, &usages, &loc(9)).unwrap_err();
        match err {
            TaglibError::Validation(ValidationError::MissingRequired {
                attribute,
                location,
                ..
            }) => {
                assert_eq!(attribute, "title");
                assert_eq!(location.line, 9);
            }
            other => panic!("Expected MissingRequired, got {:?}", other),
        }
    }

    #[test]
    fn test_required_wildcard_met_by_absorbed_attribute() {
        let mut def = hello(false);
        let wildcard = AttributeSchema {
            required: true,
            ..AttributeSchema::wildcard("string")
        };
        def.schema.attributes.insert(wildcard.name.clone(), wildcard);

        let usages = vec![usage("foo", 1)];
        let binding = AttributeValidator::validate(&def, &usages, &loc(1)).unwrap();
        assert_eq!(binding.wildcard.len(), 1);

        let usages = vec![usage("name", 1)];
        let err = AttributeValidator::validate(&def, &usages, &loc(1)).unwrap_err();
        assert!(matches!(
            err,
            TaglibError::Validation(ValidationError::MissingRequired { ref attribute, .. }) if attribute == "@*"
        ));
    }

    #[test]
    fn test_literal_star_matched_by_name_beside_wildcard() {
        let mut def = hello(true);
        let star = AttributeSchema::new("*", "string");
        def.schema.attributes.insert(star.name.clone(), star);

        let usages = vec![usage("*", 1), usage("foo", 1)];
        let binding = AttributeValidator::validate(&def, &usages, &loc(1)).unwrap();

        assert_eq!(binding.declared.len(), 1);
        assert_eq!(binding.declared[0].0.target_property, "asterisk");
        let absorbed: Vec<&str> = binding.wildcard.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(absorbed, vec!["foo"]);
    }

    #[test]
    fn test_nested_property_accepted_as_attribute() {
        let mut def = hello(false);
        def.schema.nested_tags.insert(
            "tab".to_string(),
            NestedTagDeclaration {
                parent_attribute: "tabs".to_string(),
                child_tag: "tab".to_string(),
                cardinality: Cardinality::Array,
                child_schema: TagSchema::default(),
            },
        );
        let usages = vec![usage("tabs", 1)];
        let binding = AttributeValidator::validate(&def, &usages, &loc(1)).unwrap();
        assert!(binding.nested_value("tabs").is_some());
    }
}
