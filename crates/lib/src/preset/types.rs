//! Preset documents, entries and the errors raised while reading them.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::tree::ConfigTree;

/// Final parameter tree of one entry after inheritance and substitution.
pub type MergedConfig = ConfigTree;

/// Errors raised while loading or resolving presets.
#[derive(Debug, Error)]
pub enum PresetError {
  /// The document could not be read (usually: it does not exist).
  #[error("failed to read preset file {}: {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The document is not valid JSON.
  #[error("failed to parse preset file {}: {message}", .path.display())]
  Parse { path: PathBuf, message: String },

  /// The document is JSON but an entry or collection has the wrong shape.
  #[error("invalid preset data in {}: {message}", .path.display())]
  InvalidEntry { path: PathBuf, message: String },

  /// No loaded document declares the requested entry.
  #[error("preset '{name}' not found in {kind}")]
  EntryNotFound { name: String, kind: EntryKind },

  /// The `inherits` chain loops back on itself or never ends.
  #[error("inheritance cycle detected: {chain}")]
  InheritanceCycle { chain: String },
}

impl PresetError {
  /// Whether this error means the input documents themselves are broken.
  pub fn is_parse_error(&self) -> bool {
    matches!(
      self,
      PresetError::Read { .. } | PresetError::Parse { .. } | PresetError::InvalidEntry { .. }
    )
  }
}

/// The collections a preset document may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryKind {
  Configure,
  Build,
  Test,
  Package,
  Workflow,
}

impl EntryKind {
  pub const ALL: [EntryKind; 5] = [
    EntryKind::Configure,
    EntryKind::Build,
    EntryKind::Test,
    EntryKind::Package,
    EntryKind::Workflow,
  ];

  /// Top-level document key holding this collection.
  pub fn key(&self) -> &'static str {
    match self {
      EntryKind::Configure => "configurePresets",
      EntryKind::Build => "buildPresets",
      EntryKind::Test => "testPresets",
      EntryKind::Package => "packagePresets",
      EntryKind::Workflow => "workflowPresets",
    }
  }

  pub fn from_key(key: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|kind| kind.key() == key)
  }
}

impl fmt::Display for EntryKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.key())
  }
}

/// One named entry of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
  pub name: String,
  /// Parents in merge order. A single string in the document becomes one element.
  pub inherits: Vec<String>,
  pub hidden: bool,
  /// Every declared key of the entry, `name`, `inherits` and `hidden` included.
  pub payload: ConfigTree,
}

impl ConfigEntry {
  /// Build an entry from its raw object.
  pub fn from_tree(payload: ConfigTree, path: &Path) -> Result<Self, PresetError> {
    let invalid = |message: String| PresetError::InvalidEntry {
      path: path.to_path_buf(),
      message,
    };

    if payload.as_mapping().is_none() {
      return Err(invalid(format!("entry must be an object, found {payload}")));
    }

    let name = match payload.get("name") {
      Some(ConfigTree::String(name)) => name.clone(),
      Some(other) => return Err(invalid(format!("entry name must be a string, found {other}"))),
      None => return Err(invalid("entry without a name".to_string())),
    };

    let inherits = match payload.get("inherits") {
      None | Some(ConfigTree::Null) => Vec::new(),
      Some(ConfigTree::String(parent)) => vec![parent.clone()],
      Some(ConfigTree::Sequence(items)) => items
        .iter()
        .map(|item| {
          item
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| invalid(format!("'{name}' inherits from a non-string value {item}")))
        })
        .collect::<Result<_, _>>()?,
      Some(other) => return Err(invalid(format!("'{name}' has invalid inherits value {other}"))),
    };

    let hidden = match payload.get("hidden") {
      None | Some(ConfigTree::Null) => false,
      Some(ConfigTree::Bool(hidden)) => *hidden,
      Some(other) => return Err(invalid(format!("'{name}' has non-boolean hidden value {other}"))),
    };

    Ok(Self {
      name,
      inherits,
      hidden,
      payload,
    })
  }
}

/// A parsed preset file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
  /// Where the document was read from; includes resolve against its parent.
  pub path: PathBuf,
  /// Include paths, relative to the document's directory, in declared order.
  pub include: Vec<String>,
  pub collections: BTreeMap<EntryKind, Vec<ConfigEntry>>,
}

impl ConfigDocument {
  /// Parse document text read from `path`.
  pub fn parse(path: &Path, text: &str) -> Result<Self, PresetError> {
    let root: ConfigTree = serde_json::from_str(text).map_err(|e| PresetError::Parse {
      path: path.to_path_buf(),
      message: e.to_string(),
    })?;
    let invalid = |message: String| PresetError::InvalidEntry {
      path: path.to_path_buf(),
      message,
    };

    let Some(map) = root.as_mapping() else {
      return Err(invalid("top level must be an object".to_string()));
    };

    let include = match map.get("include") {
      None | Some(ConfigTree::Null) => Vec::new(),
      Some(ConfigTree::Sequence(items)) => items
        .iter()
        .map(|item| {
          item
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| invalid(format!("include entries must be strings, found {item}")))
        })
        .collect::<Result<_, _>>()?,
      Some(other) => return Err(invalid(format!("include must be a list, found {other}"))),
    };

    let mut collections = BTreeMap::new();
    for kind in EntryKind::ALL {
      let Some(value) = map.get(kind.key()) else {
        continue;
      };
      let Some(items) = value.as_sequence() else {
        return Err(invalid(format!("{kind} must be a list")));
      };
      let entries = items
        .iter()
        .map(|item| ConfigEntry::from_tree(item.clone(), path))
        .collect::<Result<Vec<_>, _>>()?;
      collections.insert(kind, entries);
    }

    Ok(Self {
      path: path.to_path_buf(),
      include,
      collections,
    })
  }

  /// Entries of one collection, empty when the document does not declare it.
  pub fn entries(&self, kind: EntryKind) -> &[ConfigEntry] {
    self.collections.get(&kind).map(Vec::as_slice).unwrap_or_default()
  }

  /// First entry of `kind` called `name`.
  pub fn find(&self, kind: EntryKind, name: &str) -> Option<&ConfigEntry> {
    self.entries(kind).iter().find(|entry| entry.name == name)
  }
}
