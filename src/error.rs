//! Error types for taglib-engine

use crate::domain::SourceLocation;
use std::path::PathBuf;
use thiserror::Error;

/// Malformed definitions, missing or ambiguous implementations, scan layout violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration file {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("Tag <{tag}> in {path} must be an object or a path to a tag file")]
    InvalidTagEntry { path: PathBuf, tag: String },

    #[error("Unknown property '{property}' in {context} ({path})")]
    UnknownProperty {
        path: PathBuf,
        context: String,
        property: String,
    },

    #[error("Tag <{tag}> in {path} has neither a renderer nor a template")]
    MissingImplementation { path: PathBuf, tag: String },

    #[error("Tag <{tag}> in {path} has more than one implementation: {}", display_paths(.candidates))]
    AmbiguousImplementation {
        path: PathBuf,
        tag: String,
        candidates: Vec<PathBuf>,
    },

    #[error("Attribute '{attribute}' of <{tag}> is declared twice with different schemas ({path})")]
    AttributeConflict {
        path: PathBuf,
        tag: String,
        attribute: String,
    },

    #[error("Tag <{tag}> maps more than one attribute to property '{property}' ({path})")]
    TargetPropertyConflict {
        path: PathBuf,
        tag: String,
        property: String,
    },

    #[error("Invalid attribute '{attribute}' on <{tag}> in {path}: {reason}")]
    InvalidAttribute {
        path: PathBuf,
        tag: String,
        attribute: String,
        reason: String,
    },

    #[error("Invalid nested tag declaration '{key}' on <{tag}> in {path}")]
    InvalidNestedDeclaration {
        path: PathBuf,
        tag: String,
        key: String,
    },

    #[error("Tag <{tag}> is defined more than once in {path}")]
    DuplicateTag { path: PathBuf, tag: String },

    #[error("Tag <{tag}> in {path} has both a tag file and an embedded schema")]
    DuplicateSchema { path: PathBuf, tag: String },

    #[error("Invalid embedded schema in {path}: {message}")]
    EmbeddedSchema { path: PathBuf, message: String },

    #[error("Tags directory does not exist: {path}")]
    MissingDirectory { path: PathBuf },

    #[error("Template path must be absolute: {path}")]
    RelativeTemplatePath { path: PathBuf },
}

/// Attribute usage that does not fit the tag's declared schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{location}: unknown tag <{tag}>")]
    UnknownTag {
        tag: String,
        location: SourceLocation,
    },

    #[error("{location}: attribute '{attribute}' is not declared by <{tag}>")]
    UnknownAttribute {
        tag: String,
        attribute: String,
        location: SourceLocation,
    },

    #[error("{location}: attribute '{attribute}' is used more than once on <{tag}>")]
    DuplicateAttribute {
        tag: String,
        attribute: String,
        location: SourceLocation,
    },

    #[error("{location}: <{tag}> requires attribute '{attribute}'")]
    MissingRequired {
        tag: String,
        attribute: String,
        location: SourceLocation,
    },
}

/// Ambiguities found while resolving nested tags or merging taglibs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("{location}: <{tag}> allows a single <{child}> but found another")]
    CardinalityViolation {
        tag: String,
        child: String,
        location: SourceLocation,
    },

    #[error("{location}: property '{property}' of <{tag}> is supplied both as an attribute and as nested tags")]
    AmbiguousSource {
        tag: String,
        property: String,
        location: SourceLocation,
    },

    #[error("Tag <{tag}> is defined by both {} and {} at the same discovery rank", .first.display(), .second.display())]
    RankCollision {
        tag: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Main error type for taglib-engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaglibError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

impl TaglibError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            TaglibError::Config(_) => 2,
            TaglibError::Validation(_) => 3,
            TaglibError::Resolution(_) => 4,
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn display_with_suggestions(&self) -> String {
        match self {
            TaglibError::Config(ConfigError::MissingImplementation { .. }) => {
                format!(
                    "{}\n\n\
                    Suggestions:\n\
                    • Add a \"renderer\" or \"template\" entry to the tag definition\n\
                    • Place a renderer.js or template.marko next to the tag file",
                    self
                )
            }
            TaglibError::Config(ConfigError::AmbiguousImplementation { .. }) => {
                format!(
                    "{}\n\n\
                    Suggestions:\n\
                    • Keep exactly one renderer or template file per tag directory",
                    self
                )
            }
            TaglibError::Validation(ValidationError::UnknownAttribute { tag, .. }) => {
                format!(
                    "{}\n\n\
                    Suggestions:\n\
                    • Check the attribute spelling\n\
                    • Declare the attribute in the definition of <{}>\n\
                    • Declare \"@*\" to accept any attribute",
                    self, tag
                )
            }
            TaglibError::Resolution(ResolutionError::RankCollision { .. }) => {
                format!(
                    "{}\n\n\
                    Suggestions:\n\
                    • Rename one of the tags\n\
                    • Move one definition to a nearer or farther directory",
                    self
                )
            }
            _ => self.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            message: err.to_string(),
        }
        .into()
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type using TaglibError
pub type Result<T> = std::result::Result<T, TaglibError>;
