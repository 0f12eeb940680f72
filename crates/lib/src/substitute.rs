//! `${name}` substitution over configuration values.
//!
//! Substitution is a single, non-recursive scan: each `${identifier}` whose
//! identifier is known to the [`Substitutions`] table is replaced by its value,
//! and the replacement text is never scanned again. Unknown names and anything
//! that does not form a complete `${identifier}` token are kept verbatim.
//!
//! Identifiers are one or more alphanumeric or `_` characters.
//!
//! # Example
//!
//! ```
//! use presetci_lib::substitute::{Substitutions, expand};
//!
//! let subs = Substitutions::new().with("presetName", "debug");
//! assert_eq!(expand("out/${presetName}/${unknown}", &subs), "out/debug/${unknown}");
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use crate::platform::os::Os;
use crate::tree::{ConfigTree, Mapping};

/// Fixed set of names available to one resolution call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
  values: BTreeMap<String, String>,
}

impl Substitutions {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add or replace a variable.
  pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
    self.values.insert(name.to_string(), value.into());
    self
  }

  /// The standard table for resolving `preset` under the source root `root`.
  ///
  /// Provides `sourceDir`, `sourceParentDir`, `sourceDirName`, `presetName`
  /// and, on supported hosts, `hostSystemName`.
  pub fn for_preset(root: &Path, preset: &str) -> Self {
    let parent = root.parent().map(|p| p.display().to_string()).unwrap_or_default();
    let dir_name = root
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();

    let subs = Self::new()
      .with("sourceDir", root.display().to_string())
      .with("sourceParentDir", parent)
      .with("sourceDirName", dir_name)
      .with("presetName", preset);

    match Os::current() {
      Some(os) => subs.with("hostSystemName", os.host_system_name()),
      None => subs,
    }
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.values.get(name).map(String::as_str)
  }
}

fn is_ident_char(c: char) -> bool {
  c.is_alphanumeric() || c == '_'
}

/// Expand every known `${name}` token in `input`.
pub fn expand(input: &str, subs: &Substitutions) -> String {
  let mut result = String::with_capacity(input.len());
  let mut rest = input;

  while let Some(start) = rest.find("${") {
    result.push_str(&rest[..start]);
    let after = &rest[start + 2..];

    let ident_len = after
      .char_indices()
      .find(|&(_, c)| !is_ident_char(c))
      .map(|(i, _)| i)
      .unwrap_or(after.len());

    // A token needs a non-empty identifier directly followed by `}`
    if ident_len > 0 && after[ident_len..].starts_with('}') {
      let name = &after[..ident_len];
      match subs.get(name) {
        Some(value) => result.push_str(value),
        None => {
          result.push_str("${");
          result.push_str(name);
          result.push('}');
        }
      }
      rest = &after[ident_len + 1..];
    } else {
      result.push_str("${");
      rest = after;
    }
  }

  result.push_str(rest);
  result
}

/// Expand every string in a tree, mapping keys included.
///
/// When two keys expand to the same text the later one (in key order) wins.
pub fn expand_tree(tree: ConfigTree, subs: &Substitutions) -> ConfigTree {
  match tree {
    ConfigTree::String(s) => ConfigTree::String(expand(&s, subs)),
    ConfigTree::Sequence(items) => ConfigTree::Sequence(items.into_iter().map(|item| expand_tree(item, subs)).collect()),
    ConfigTree::Mapping(map) => {
      let expanded: Mapping = map
        .into_iter()
        .map(|(key, value)| (expand(&key, subs), expand_tree(value, subs)))
        .collect();
      ConfigTree::Mapping(expanded)
    }
    scalar => scalar,
  }
}
