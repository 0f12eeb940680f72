//! Preset documents and their resolution.
//!
//! - [`store`] loads a preset file and walks its `include` graph
//! - [`resolve`] merges an entry with its inheritance chain
//! - [`view`] projects a merged entry into typed values
//!
//! [`Workspace`] ties the three together for one source tree. Every call
//! reloads the documents from disk, so edits made between two calls are always
//! observed.

pub mod resolve;
pub mod store;
pub mod types;
pub mod view;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::{DEFAULT_CACHE_PREFIX, DEFAULT_PRESET_FILE, DEFAULT_VENDOR_NAMESPACE, HELP_PRESET};
use crate::substitute::Substitutions;

pub use resolve::list_names;
pub use types::{ConfigDocument, ConfigEntry, EntryKind, MergedConfig, PresetError};
pub use view::ConfigView;

/// A source tree and the preset file describing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
  root: PathBuf,
  preset_file: PathBuf,
  vendor: String,
  cache_prefix: String,
}

impl Workspace {
  /// A workspace rooted at `root`, reading `<root>/CMakePresets.json`.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    let root = root.into();
    Self {
      preset_file: root.join(DEFAULT_PRESET_FILE),
      root,
      vendor: DEFAULT_VENDOR_NAMESPACE.to_string(),
      cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
    }
  }

  /// Read presets from `path` instead. Relative paths are taken from the root.
  pub fn with_preset_file(mut self, path: impl AsRef<Path>) -> Self {
    self.preset_file = self.root.join(path);
    self
  }

  /// Key of the block under `vendor` holding presetci settings.
  pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
    self.vendor = vendor.into();
    self
  }

  /// Prefix of the `<PREFIX>_TESTING`-style cache variables.
  pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.cache_prefix = prefix.into();
    self
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn preset_file(&self) -> &Path {
    &self.preset_file
  }

  pub fn vendor(&self) -> &str {
    &self.vendor
  }

  pub fn cache_prefix(&self) -> &str {
    &self.cache_prefix
  }

  /// Where a preset without `binaryDir` builds.
  pub fn default_build_directory(&self, preset: &str) -> PathBuf {
    self.root.join("output").join("build").join(preset)
  }

  /// Load the preset file and everything it includes.
  pub fn load_documents(&self) -> Result<Vec<ConfigDocument>, PresetError> {
    store::load_all(&self.preset_file)
  }

  /// Resolve a configure preset.
  pub fn resolve(&self, name: &str) -> Result<MergedConfig, PresetError> {
    self.resolve_kind(name, EntryKind::Configure)
  }

  pub fn resolve_kind(&self, name: &str, kind: EntryKind) -> Result<MergedConfig, PresetError> {
    let documents = self.load_documents()?;
    resolve::resolve(name, kind, &documents, &Substitutions::for_preset(&self.root, name))
  }

  /// Visible preset names, `help` first.
  pub fn list_names(&self) -> Result<Vec<String>, PresetError> {
    Ok(list_names(&self.load_documents()?))
  }

  /// Whether `name` is `help` or a visible preset.
  pub fn contains(&self, name: &str) -> Result<bool, PresetError> {
    Ok(self.list_names()?.iter().any(|n| n == name))
  }

  /// Resolve a configure preset into a [`ConfigView`].
  ///
  /// `help` always succeeds and does not read the preset file.
  pub fn view(&self, name: &str) -> Result<ConfigView, PresetError> {
    if name == HELP_PRESET {
      return Ok(ConfigView::help(self));
    }

    let documents = self.load_documents()?;
    let subs = Substitutions::for_preset(&self.root, name);
    let merged = resolve::resolve(name, EntryKind::Configure, &documents, &subs)?;
    let names = list_names(&documents);
    debug!(preset = %name, "preset resolved");
    Ok(ConfigView::new(name, merged, self, &names))
  }
}
