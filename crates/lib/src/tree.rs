//! The configuration value tree and its merge semantics.
//!
//! Every preset payload is held as a [`ConfigTree`]. Merging is done by
//! [`deep_merge`]:
//! - Mappings: merged key by key, recursing when both sides hold a mapping
//! - Sequences: replaced wholesale (never element-wise)
//! - Scalars and null: the override wins

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Mapping node of a [`ConfigTree`].
pub type Mapping = BTreeMap<String, ConfigTree>;

/// A structured configuration value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigTree {
  #[default]
  Null,
  Bool(bool),
  Number(Number),
  String(String),
  Sequence(Vec<ConfigTree>),
  Mapping(Mapping),
}

impl ConfigTree {
  /// An empty mapping, the identity element of [`deep_merge`] for presets.
  pub fn empty_mapping() -> Self {
    ConfigTree::Mapping(Mapping::new())
  }

  pub fn is_null(&self) -> bool {
    matches!(self, ConfigTree::Null)
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      ConfigTree::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      ConfigTree::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_sequence(&self) -> Option<&[ConfigTree]> {
    match self {
      ConfigTree::Sequence(items) => Some(items),
      _ => None,
    }
  }

  pub fn as_mapping(&self) -> Option<&Mapping> {
    match self {
      ConfigTree::Mapping(map) => Some(map),
      _ => None,
    }
  }

  pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
    match self {
      ConfigTree::Mapping(map) => Some(map),
      _ => None,
    }
  }

  /// Look up a key when this node is a mapping.
  pub fn get(&self, key: &str) -> Option<&ConfigTree> {
    self.as_mapping().and_then(|map| map.get(key))
  }

  /// Follow a sequence of keys through nested mappings.
  pub fn get_path(&self, path: &[&str]) -> Option<&ConfigTree> {
    path.iter().try_fold(self, |node, key| node.get(key))
  }

  /// Remove a key when this node is a mapping.
  pub fn remove(&mut self, key: &str) -> Option<ConfigTree> {
    self.as_mapping_mut().and_then(|map| map.remove(key))
  }

  /// Render a scalar as the text a cache variable would hold.
  ///
  /// Strings are returned as-is, booleans and numbers in their JSON form.
  /// Null and containers have no scalar text.
  pub fn scalar_text(&self) -> Option<String> {
    match self {
      ConfigTree::String(s) => Some(s.clone()),
      ConfigTree::Bool(b) => Some(b.to_string()),
      ConfigTree::Number(n) => Some(n.to_string()),
      _ => None,
    }
  }
}

impl From<&str> for ConfigTree {
  fn from(value: &str) -> Self {
    ConfigTree::String(value.to_string())
  }
}

impl From<String> for ConfigTree {
  fn from(value: String) -> Self {
    ConfigTree::String(value)
  }
}

impl From<bool> for ConfigTree {
  fn from(value: bool) -> Self {
    ConfigTree::Bool(value)
  }
}

impl From<i64> for ConfigTree {
  fn from(value: i64) -> Self {
    ConfigTree::Number(value.into())
  }
}

impl From<Mapping> for ConfigTree {
  fn from(value: Mapping) -> Self {
    ConfigTree::Mapping(value)
  }
}

impl From<Vec<ConfigTree>> for ConfigTree {
  fn from(value: Vec<ConfigTree>) -> Self {
    ConfigTree::Sequence(value)
  }
}

impl fmt::Display for ConfigTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match serde_json::to_string(self) {
      Ok(json) => f.write_str(&json),
      Err(_) => Err(fmt::Error),
    }
  }
}

/// Deep merge `overlay` on top of `base`.
pub fn deep_merge(base: ConfigTree, overlay: ConfigTree) -> ConfigTree {
  match (base, overlay) {
    (ConfigTree::Mapping(mut base_map), ConfigTree::Mapping(overlay_map)) => {
      for (key, overlay_value) in overlay_map {
        let merged = match base_map.remove(&key) {
          Some(base_value) => deep_merge(base_value, overlay_value),
          None => overlay_value,
        };
        base_map.insert(key, merged);
      }
      ConfigTree::Mapping(base_map)
    }
    (_, overlay) => overlay,
  }
}

/// Merge a list of trees left to right, later entries winning.
pub fn merge_all(trees: impl IntoIterator<Item = ConfigTree>) -> ConfigTree {
  trees.into_iter().fold(ConfigTree::empty_mapping(), deep_merge)
}
