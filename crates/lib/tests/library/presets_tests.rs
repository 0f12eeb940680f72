//! End-to-end preset resolution over files on disk.

use std::fs;
use std::path::Path;

use presetci_lib::preset::{PresetError, Workspace};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
  let path = root.join(rel);
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, content).unwrap();
}

/// A root file including a shared base that itself includes the root back.
fn layered_root() -> TempDir {
  let temp = TempDir::new().unwrap();
  write(
    temp.path(),
    "CMakePresets.json",
    r#"{
      "version": 6,
      "include": ["cmake/base.json", "cmake/missing.json"],
      "configurePresets": [
        {
          "name": "gcc-debug",
          "inherits": ["ninja", "gcc"],
          "cacheVariables": {"CMAKE_BUILD_TYPE": "Debug", "PROJECT_TESTING": "ON"}
        },
        {
          "name": "gcc-release",
          "inherits": "gcc-debug",
          "cacheVariables": {"CMAKE_BUILD_TYPE": "Release"},
          "vendor": {"presetci": {"docker_image": "builder:1", "docker_namespace": "ci"}}
        }
      ]
    }"#,
  );
  write(
    temp.path(),
    "cmake/base.json",
    r#"{
      "version": 6,
      "include": ["../CMakePresets.json"],
      "configurePresets": [
        {
          "name": "ninja",
          "hidden": true,
          "generator": "Ninja",
          "binaryDir": "${sourceDir}/build/${presetName}"
        },
        {
          "name": "gcc",
          "hidden": true,
          "generator": "Unix Makefiles",
          "cacheVariables": {"CMAKE_CXX_COMPILER": "g++", "CMAKE_BUILD_TYPE": "RelWithDebInfo"},
          "vendor": {"presetci": {"release_preset": "gcc-release"}}
        }
      ]
    }"#,
  );
  temp
}

#[test]
fn includes_and_inheritance_resolve_together() {
  let temp = layered_root();
  let ws = Workspace::new(temp.path());

  let view = ws.view("gcc-debug").unwrap();

  // Later parents win over earlier ones, the entry wins over both.
  assert_eq!(view.generator(), Some("Unix Makefiles"));
  assert_eq!(view.build_types(), vec!["Debug".to_string()]);
  assert_eq!(view.compiler().as_deref(), Some("g++"));
  assert!(view.run_tests());
  assert_eq!(view.build_directory(), temp.path().join("build/gcc-debug"));
  assert_eq!(view.release_preset(), Some("gcc-release"));
}

#[test]
fn substitution_uses_requested_name_through_the_chain() {
  let temp = layered_root();
  let ws = Workspace::new(temp.path());

  let release = ws.view("gcc-debug").unwrap().release_view().unwrap().unwrap();

  assert_eq!(release.name(), "gcc-release");
  assert_eq!(release.build_directory(), temp.path().join("build/gcc-release"));
  assert_eq!(release.build_types(), vec!["Release".to_string()]);
  assert_eq!(release.container_image(), "ci/builder:1");
}

#[test]
fn listing_spans_all_documents() {
  let temp = layered_root();
  let ws = Workspace::new(temp.path());

  assert_eq!(ws.list_names().unwrap(), vec!["help", "gcc-debug", "gcc-release"]);
}

#[test]
fn malformed_include_is_a_parse_error() {
  let temp = layered_root();
  write(temp.path(), "cmake/base.json", "{ \"configurePresets\": [");
  let ws = Workspace::new(temp.path());

  let err = ws.view("gcc-debug").unwrap_err();

  assert!(err.is_parse_error(), "{err}");
}

#[test]
fn cycle_across_documents() {
  let temp = TempDir::new().unwrap();
  write(
    temp.path(),
    "CMakePresets.json",
    r#"{"include": ["other.json"], "configurePresets": [{"name": "a", "inherits": "b"}]}"#,
  );
  write(
    temp.path(),
    "other.json",
    r#"{"configurePresets": [{"name": "b", "inherits": "a"}]}"#,
  );
  let ws = Workspace::new(temp.path());

  let err = ws.view("a").unwrap_err();

  match err {
    PresetError::InheritanceCycle { chain } => assert_eq!(chain, "a -> b -> a"),
    other => panic!("expected a cycle, got {other}"),
  }
}
