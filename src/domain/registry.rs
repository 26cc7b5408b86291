//! Merged tag registry for one compile pass

use super::schema::{Implementation, TagDefinition, Taglib};
use crate::error::{ResolutionError, Result};
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::debug;

/// Read-only mapping from qualified tag name to its winning definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagRegistry {
    tags: BTreeMap<String, TagDefinition>,
}

impl TagRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge taglibs by discovery rank
    ///
    /// The input order is irrelevant: taglibs are folded from best (lowest)
    /// rank to worst, a definition already present from a better rank
    /// shadows later ones outright, and two definitions of one name at the
    /// same rank are an error. A nested tag survives only while every
    /// parent up its chain is the winning definition that declared it.
    pub fn merge<I>(taglibs: I) -> Result<Self>
    where
        I: IntoIterator<Item = Taglib>,
    {
        let mut taglibs: Vec<Taglib> = taglibs.into_iter().collect();
        taglibs.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.source.cmp(&b.source)));

        let mut tags: BTreeMap<String, TagDefinition> = BTreeMap::new();
        for taglib in taglibs {
            for (name, def) in taglib.tags {
                match tags.entry(name) {
                    Entry::Vacant(slot) => {
                        slot.insert(def);
                    }
                    Entry::Occupied(existing) => {
                        let winner = existing.get();
                        if winner.provenance.rank == def.provenance.rank {
                            return Err(ResolutionError::RankCollision {
                                tag: existing.key().clone(),
                                first: winner.provenance.source.clone(),
                                second: def.provenance.source,
                            }
                            .into());
                        }
                        debug!(
                            tag = %existing.key(),
                            winner = %winner.provenance.source.display(),
                            shadowed = %def.provenance.source.display(),
                            "Shadowed tag definition"
                        );
                    }
                }
            }
        }

        let orphaned: Vec<String> = tags
            .values()
            .filter(|def| !attached_to_winner(&tags, def))
            .map(|def| def.name.clone())
            .collect();
        for name in orphaned {
            debug!(tag = %name, "Dropped nested tag of a shadowed parent");
            tags.remove(&name);
        }

        Ok(TagRegistry { tags })
    }

    /// Get a tag by qualified name
    pub fn get(&self, name: &str) -> Option<&TagDefinition> {
        self.tags.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    /// Qualified names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagDefinition> {
        self.tags.values()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// True when `def` is not nested, or its parent chain came from the same source
fn attached_to_winner(tags: &BTreeMap<String, TagDefinition>, def: &TagDefinition) -> bool {
    let mut current = def;
    while let Implementation::Nested(parent_name) = &current.implementation {
        let Some(parent) = tags.get(parent_name) else {
            return false;
        };
        let declared = current
            .name
            .strip_prefix(parent_name.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .is_some_and(|local| parent.schema.nested_tags.contains_key(local));
        if !declared || parent.provenance != current.provenance {
            return false;
        }
        current = parent;
    }
    true
}
