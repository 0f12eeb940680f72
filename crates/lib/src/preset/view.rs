//! Typed, read-only projection of one merged preset.

use std::fmt;
use std::path::PathBuf;

use tracing::warn;

use super::Workspace;
use super::types::{MergedConfig, PresetError};
use crate::consts::HELP_PRESET;
use crate::platform::default_archive_format;
use crate::tree::ConfigTree;

const TRUTHY: [&str; 4] = ["ON", "True", "true", "1"];

/// Whether a cache or vendor value counts as enabled.
fn truthy(value: &ConfigTree) -> bool {
  match value {
    ConfigTree::Bool(b) => *b,
    ConfigTree::Number(n) => n.as_i64() == Some(1),
    ConfigTree::String(s) => TRUTHY.contains(&s.as_str()),
    _ => false,
  }
}

/// Cache variables come as `"X": "v"` or as `"X": {"type": .., "value": "v"}`.
fn cache_value(value: &ConfigTree) -> Option<&ConfigTree> {
  match value {
    ConfigTree::Mapping(_) => value.get("value"),
    other => Some(other),
  }
}

/// One resolved preset with the derived values actions need.
///
/// A view is an immutable snapshot; resolving the companion release preset
/// produces a second, independent view.
#[derive(Debug, Clone)]
pub struct ConfigView {
  name: String,
  tree: MergedConfig,
  workspace: Workspace,
  release_preset: Option<String>,
}

impl ConfigView {
  /// Wrap a merged tree. `known_names` validates the release preset reference.
  pub fn new(name: &str, tree: MergedConfig, workspace: &Workspace, known_names: &[String]) -> Self {
    let mut view = Self {
      name: name.to_string(),
      tree,
      workspace: workspace.clone(),
      release_preset: None,
    };

    if let Some(release) = view.vendor_str("release_preset").map(str::to_string) {
      if known_names.contains(&release) {
        view.release_preset = Some(release);
      } else {
        warn!(preset = %name, release = %release, "release preset is not a known preset, ignoring");
      }
    }

    view
  }

  /// The synthetic `help` view. Never reads the preset file.
  pub fn help(workspace: &Workspace) -> Self {
    Self {
      name: HELP_PRESET.to_string(),
      tree: ConfigTree::empty_mapping(),
      workspace: workspace.clone(),
      release_preset: None,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn is_help(&self) -> bool {
    self.name == HELP_PRESET
  }

  /// The merged tree this view was built from.
  pub fn raw(&self) -> &MergedConfig {
    &self.tree
  }

  pub fn workspace(&self) -> &Workspace {
    &self.workspace
  }

  fn cache(&self, key: &str) -> Option<&ConfigTree> {
    self.tree.get_path(&["cacheVariables", key]).and_then(cache_value)
  }

  fn cache_text(&self, key: &str) -> Option<String> {
    self.cache(key).and_then(ConfigTree::scalar_text)
  }

  fn project_flag(&self, suffix: &str) -> Option<&ConfigTree> {
    self.cache(&format!("{}_{suffix}", self.workspace.cache_prefix()))
  }

  fn vendor(&self, key: &str) -> Option<&ConfigTree> {
    self.tree.get_path(&["vendor", self.workspace.vendor(), key])
  }

  fn vendor_str(&self, key: &str) -> Option<&str> {
    self.vendor(key).and_then(ConfigTree::as_str).filter(|s| !s.is_empty())
  }

  pub fn generator(&self) -> Option<&str> {
    self.tree.get("generator").and_then(ConfigTree::as_str)
  }

  /// `CMAKE_BUILD_TYPE`, else the `;`-separated `CMAKE_CONFIGURATION_TYPES`.
  pub fn build_types(&self) -> Vec<String> {
    if let Some(build_type) = self.cache_text("CMAKE_BUILD_TYPE") {
      return vec![build_type];
    }
    self
      .cache_text("CMAKE_CONFIGURATION_TYPES")
      .map(|types| {
        types
          .split(';')
          .filter(|t| !t.is_empty())
          .map(str::to_string)
          .collect()
      })
      .unwrap_or_default()
  }

  pub fn compiler(&self) -> Option<String> {
    self.cache_text("CMAKE_CXX_COMPILER")
  }

  pub fn run_tests(&self) -> bool {
    self.project_flag("TESTING").is_none_or(truthy)
  }

  pub fn run_coverage(&self) -> bool {
    self.project_flag("ENABLE_COVERAGE").is_some_and(truthy) && self.run_tests()
  }

  /// Documentation needs a release configuration to document.
  pub fn run_documentation(&self) -> bool {
    match self.project_flag("ENABLE_DOCUMENTATION") {
      None => true,
      Some(v) => {
        truthy(v)
          && (self.build_types().iter().any(|t| t == "Release") || self.release_preset.is_some())
      }
    }
  }

  pub fn run_package(&self) -> bool {
    self
      .project_flag("PACKAGE_NAME")
      .and_then(ConfigTree::scalar_text)
      .is_some_and(|name| !name.is_empty())
  }

  /// `registry/namespace/image`, leaving out empty parts. Empty without an image.
  pub fn container_image(&self) -> String {
    let Some(image) = self.vendor_str("docker_image") else {
      return String::new();
    };
    [self.vendor_str("docker_registry"), self.vendor_str("docker_namespace"), Some(image)]
      .into_iter()
      .flatten()
      .collect::<Vec<_>>()
      .join("/")
  }

  pub fn container_parameters(&self) -> Option<&str> {
    self.vendor_str("docker_parameters")
  }

  pub fn archive_format(&self) -> &str {
    self.vendor_str("archive_format").unwrap_or(default_archive_format())
  }

  pub fn release_preset(&self) -> Option<&str> {
    self.release_preset.as_deref()
  }

  pub fn publish_doc(&self) -> bool {
    self.vendor("publish_doc").is_some_and(truthy)
  }

  /// `binaryDir` when set, else `<root>/output/build/<name>`.
  pub fn build_directory(&self) -> PathBuf {
    match self.tree.get("binaryDir").and_then(ConfigTree::as_str) {
      Some(dir) => PathBuf::from(dir),
      None => self.workspace.default_build_directory(&self.name),
    }
  }

  /// Resolve the release preset afresh. `None` when no release preset is configured.
  pub fn release_view(&self) -> Result<Option<ConfigView>, PresetError> {
    self
      .release_preset
      .as_deref()
      .map(|release| self.workspace.view(release))
      .transpose()
  }

  pub fn release_build_directory(&self) -> Result<Option<PathBuf>, PresetError> {
    Ok(self.release_view()?.map(|view| view.build_directory()))
  }
}

impl fmt::Display for ConfigView {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "ConfigView: {}", self.name)?;
    if self.is_help() {
      return Ok(());
    }
    if let Some(generator) = self.generator() {
      writeln!(f, "  generator = {generator}")?;
    }
    let build_types = self.build_types();
    if !build_types.is_empty() {
      writeln!(f, "  build_types = {}", build_types.join(", "))?;
    }
    if let Some(compiler) = self.compiler() {
      writeln!(f, "  compiler = {compiler}")?;
    }
    writeln!(f, "  build_directory = {}", self.build_directory().display())?;
    let image = self.container_image();
    if !image.is_empty() {
      writeln!(f, "  container_image = {image}")?;
    }
    if let Some(params) = self.container_parameters() {
      writeln!(f, "  container_parameters = {params}")?;
    }
    writeln!(f, "  archive_format = {}", self.archive_format())?;
    if let Some(release) = self.release_preset() {
      writeln!(f, "  release_preset = {release}")?;
    }
    write!(
      f,
      "  run_tests = {}, run_coverage = {}, run_documentation = {}, run_package = {}, publish_doc = {}",
      self.run_tests(),
      self.run_coverage(),
      self.run_documentation(),
      self.run_package(),
      self.publish_doc()
    )
  }
}

#[cfg(test)]
mod tests {
  use std::path::Path;

  use super::*;
  use serde_json::json;

  fn workspace() -> Workspace {
    Workspace::new("/work/project")
  }

  fn view(value: serde_json::Value) -> ConfigView {
    view_with_names(value, &[])
  }

  fn view_with_names(value: serde_json::Value, names: &[&str]) -> ConfigView {
    let tree: ConfigTree = serde_json::from_value(value).unwrap();
    let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    ConfigView::new("linux-debug", tree, &workspace(), &names)
  }

  #[test]
  fn defaults_on_empty_tree() {
    let v = view(json!({}));

    assert_eq!(v.name(), "linux-debug");
    assert_eq!(v.generator(), None);
    assert!(v.build_types().is_empty());
    assert_eq!(v.compiler(), None);
    assert!(v.run_tests());
    assert!(!v.run_coverage());
    assert!(v.run_documentation());
    assert!(!v.run_package());
    assert!(!v.publish_doc());
    assert_eq!(v.container_image(), "");
    assert_eq!(v.release_preset(), None);
    assert_eq!(v.archive_format(), default_archive_format());
    assert_eq!(v.build_directory(), Path::new("/work/project/output/build/linux-debug"));
  }

  #[test]
  fn cmake_fields() {
    let v = view(json!({
      "generator": "Ninja",
      "binaryDir": "/tmp/out",
      "cacheVariables": {
        "CMAKE_BUILD_TYPE": "Debug",
        "CMAKE_CONFIGURATION_TYPES": "Debug;Release",
        "CMAKE_CXX_COMPILER": {"type": "FILEPATH", "value": "clang++"}
      }
    }));

    assert_eq!(v.generator(), Some("Ninja"));
    assert_eq!(v.build_types(), vec!["Debug"]);
    assert_eq!(v.compiler().as_deref(), Some("clang++"));
    assert_eq!(v.build_directory(), Path::new("/tmp/out"));
  }

  #[test]
  fn configuration_types_split() {
    let v = view(json!({"cacheVariables": {"CMAKE_CONFIGURATION_TYPES": "Debug;;Release"}}));
    assert_eq!(v.build_types(), vec!["Debug", "Release"]);
  }

  #[test]
  fn project_flags_use_prefix() {
    let v = view(json!({"cacheVariables": {
      "PROJECT_TESTING": "OFF",
      "PROJECT_ENABLE_COVERAGE": "ON",
      "PROJECT_PACKAGE_NAME": "engine"
    }}));

    assert!(!v.run_tests());
    assert!(!v.run_coverage(), "coverage needs tests");
    assert!(v.run_package());
  }

  #[test]
  fn custom_prefix_and_vendor() {
    let tree: ConfigTree = serde_json::from_value(json!({
      "cacheVariables": {"OWL_ENABLE_COVERAGE": true},
      "vendor": {"silmaen": {"docker_image": "builder"}}
    }))
    .unwrap();
    let ws = workspace().with_vendor("silmaen").with_cache_prefix("OWL");

    let v = ConfigView::new("p", tree, &ws, &[]);

    assert!(v.run_coverage());
    assert_eq!(v.container_image(), "builder");
  }

  #[test]
  fn documentation_needs_release() {
    let debug = view(json!({"cacheVariables": {
      "CMAKE_BUILD_TYPE": "Debug",
      "PROJECT_ENABLE_DOCUMENTATION": "ON"
    }}));
    assert!(!debug.run_documentation());

    let release = view(json!({"cacheVariables": {
      "CMAKE_BUILD_TYPE": "Release",
      "PROJECT_ENABLE_DOCUMENTATION": "true"
    }}));
    assert!(release.run_documentation());

    let with_companion = view_with_names(
      json!({
        "cacheVariables": {"CMAKE_BUILD_TYPE": "Debug", "PROJECT_ENABLE_DOCUMENTATION": "1"},
        "vendor": {"presetci": {"release_preset": "linux-release"}}
      }),
      &["help", "linux-release"],
    );
    assert!(with_companion.run_documentation());

    let disabled = view(json!({"cacheVariables": {
      "CMAKE_BUILD_TYPE": "Release",
      "PROJECT_ENABLE_DOCUMENTATION": "OFF"
    }}));
    assert!(!disabled.run_documentation());
  }

  #[test]
  fn container_image_joins_non_empty_parts() {
    let full = view(json!({"vendor": {"presetci": {
      "docker_registry": "registry.example.com",
      "docker_namespace": "team",
      "docker_image": "builder:1"
    }}}));
    assert_eq!(full.container_image(), "registry.example.com/team/builder:1");

    let no_namespace = view(json!({"vendor": {"presetci": {
      "docker_registry": "registry.example.com",
      "docker_namespace": "",
      "docker_image": "builder:1"
    }}}));
    assert_eq!(no_namespace.container_image(), "registry.example.com/builder:1");

    let no_image = view(json!({"vendor": {"presetci": {"docker_registry": "r"}}}));
    assert_eq!(no_image.container_image(), "");
  }

  #[test]
  fn vendor_values() {
    let v = view(json!({"vendor": {"presetci": {
      "archive_format": "7z",
      "publish_doc": "ON",
      "docker_parameters": "--privileged"
    }}}));

    assert_eq!(v.archive_format(), "7z");
    assert!(v.publish_doc());
    assert_eq!(v.container_parameters(), Some("--privileged"));
  }

  #[test]
  fn unknown_release_preset_is_dropped() {
    let v = view_with_names(
      json!({"vendor": {"presetci": {"release_preset": "ghost"}}}),
      &["help", "linux-debug"],
    );
    assert_eq!(v.release_preset(), None);
    assert!(v.release_view().unwrap().is_none());
  }

  #[test]
  fn help_view_is_empty_and_valid() {
    let v = ConfigView::help(&Workspace::new("/does/not/exist"));

    assert!(v.is_help());
    assert_eq!(v.raw(), &ConfigTree::empty_mapping());
    assert!(v.release_view().unwrap().is_none());
  }

  #[test]
  fn display_lists_present_fields() {
    let v = view(json!({"generator": "Ninja", "cacheVariables": {"CMAKE_BUILD_TYPE": "Debug"}}));
    let text = v.to_string();

    assert!(text.starts_with("ConfigView: linux-debug"));
    assert!(text.contains("generator = Ninja"));
    assert!(text.contains("build_types = Debug"));
    assert!(!text.contains("container_image"));
  }

  #[test]
  fn truthy_values() {
    for yes in [json!("ON"), json!("True"), json!("true"), json!("1"), json!(true), json!(1)] {
      assert!(truthy(&serde_json::from_value(yes.clone()).unwrap()), "{yes}");
    }
    for no in [json!("OFF"), json!("yes"), json!(false), json!(0), json!(null)] {
      assert!(!truthy(&serde_json::from_value(no.clone()).unwrap()), "{no}");
    }
  }
}
