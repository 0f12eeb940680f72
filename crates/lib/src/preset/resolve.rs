//! Entry lookup and inheritance merging.
//!
//! # Algorithm
//!
//! 1. Find the first entry called `name` of the requested kind, scanning the
//!    documents in load order
//! 2. Resolve each parent listed in `inherits` the same way and deep-merge the
//!    results left to right onto an empty mapping
//! 3. Deep-merge the entry's own keys on top
//! 4. Drop `inherits` and `hidden`
//! 5. Expand `${name}` tokens once, over the fully merged tree
//!
//! Parents are always looked up in the same kind as the child. The chain of
//! entries currently being merged is tracked so that a loop is reported as
//! [`PresetError::InheritanceCycle`] instead of recursing forever. A diamond
//! (two parents sharing an ancestor) is not a loop.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use super::types::{ConfigDocument, ConfigEntry, EntryKind, MergedConfig, PresetError};
use crate::consts::{HELP_PRESET, MAX_INHERITANCE_DEPTH};
use crate::substitute::{Substitutions, expand_tree};
use crate::tree::{ConfigTree, deep_merge, merge_all};

/// Keys that only steer resolution and never reach the merged tree.
const RESOLUTION_KEYS: [&str; 2] = ["inherits", "hidden"];

/// First entry of `kind` named `name` across `documents`.
pub fn find_entry<'a>(name: &str, kind: EntryKind, documents: &'a [ConfigDocument]) -> Option<&'a ConfigEntry> {
  documents.iter().find_map(|doc| doc.find(kind, name))
}

/// Resolve `name` into its final parameter tree.
pub fn resolve(
  name: &str,
  kind: EntryKind,
  documents: &[ConfigDocument],
  subs: &Substitutions,
) -> Result<MergedConfig, PresetError> {
  debug!(preset = %name, kind = %kind, "resolving preset");
  let mut chain = Vec::new();
  let merged = merge_with_inheritance(name, kind, documents, &mut chain)?;
  Ok(expand_tree(merged, subs))
}

fn merge_with_inheritance(
  name: &str,
  kind: EntryKind,
  documents: &[ConfigDocument],
  chain: &mut Vec<String>,
) -> Result<ConfigTree, PresetError> {
  if chain.iter().any(|n| n == name) || chain.len() >= MAX_INHERITANCE_DEPTH {
    chain.push(name.to_string());
    return Err(PresetError::InheritanceCycle {
      chain: chain.join(" -> "),
    });
  }

  let entry = find_entry(name, kind, documents).ok_or_else(|| PresetError::EntryNotFound {
    name: name.to_string(),
    kind,
  })?;

  chain.push(name.to_string());
  let parents = entry
    .inherits
    .iter()
    .map(|parent| {
      trace!(preset = %name, parent = %parent, "merging parent");
      merge_with_inheritance(parent, kind, documents, chain)
    })
    .collect::<Result<Vec<_>, _>>()?;
  chain.pop();

  let mut merged = deep_merge(merge_all(parents), entry.payload.clone());
  for key in RESOLUTION_KEYS {
    merged.remove(key);
  }

  Ok(merged)
}

/// Every visible entry name across all kinds, `help` first and the rest sorted.
pub fn list_names(documents: &[ConfigDocument]) -> Vec<String> {
  let names: BTreeSet<&str> = documents
    .iter()
    .flat_map(|doc| EntryKind::ALL.into_iter().flat_map(move |kind| doc.entries(kind)))
    .filter(|entry| !entry.hidden && entry.name != HELP_PRESET)
    .map(|entry| entry.name.as_str())
    .collect();

  std::iter::once(HELP_PRESET)
    .chain(names)
    .map(str::to_string)
    .collect()
}
