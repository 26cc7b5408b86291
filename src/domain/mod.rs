//! Domain layer - Tag schema model and resolution rules

pub mod attributes;
pub mod nested;
pub mod occurrence;
pub mod registry;
pub mod schema;

pub use attributes::{AttributeBinding, AttributeValidator};
pub use nested::NestedTagResolver;
pub use occurrence::{
    AttributeUsage, BodyNode, InputValue, ResolvedInput, SourceLocation, TagOccurrence,
};
pub use registry::TagRegistry;
pub use schema::{
    AttributeName, AttributeSchema, Cardinality, DiscoveryRank, Implementation,
    NestedTagDeclaration, Provenance, TagDefinition, TagSchema, Taglib, WILDCARD_PROPERTY,
};
