//! taglib-engine - Custom tag resolution for a component template compiler
//!
//! Discovers the taglibs visible to a template by walking up its
//! directory tree, merges them into a precedence-ordered registry, and
//! validates and resolves individual tag usages against it.

pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::TaglibError;
