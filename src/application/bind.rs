//! Tag binding use case

use crate::domain::{NestedTagResolver, ResolvedInput, TagOccurrence, TagRegistry};
use crate::error::{Result, ValidationError};
use tracing::trace;

/// Validates one tag usage and resolves it into renderer input
pub struct TagBindingService;

impl TagBindingService {
    /// Bind `occurrence` against the registry of the template it appears in
    pub fn bind(registry: &TagRegistry, occurrence: &TagOccurrence) -> Result<ResolvedInput> {
        let def = registry
            .get(&occurrence.name)
            .ok_or_else(|| ValidationError::UnknownTag {
                tag: occurrence.name.clone(),
                location: occurrence.location.clone(),
            })?;

        trace!(tag = %def.name, source = %def.provenance.source.display(), "Binding tag");
        NestedTagResolver::resolve(registry, def, occurrence)
    }
}
