//! CLI smoke tests for presetci.
//!
//! These tests run the binary against scratch preset files and check exit
//! codes and the lines it prints.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the presetci binary with a clean logging environment.
fn presetci_cmd() -> Command {
  let mut cmd = cargo_bin_cmd!("presetci");
  cmd
    .env_remove("RUST_LOG")
    .env_remove("TEAMCITY_VERSION")
    .env_remove("PRESETCI_ROOT")
    .env_remove("PRESETCI_PRESET_FILE")
    .env_remove("PRESETCI_VENDOR")
    .env_remove("PRESETCI_PREFIX");
  cmd
}

const PRESETS: &str = r#"{
  "version": 6,
  "configurePresets": [
    {
      "name": "base",
      "hidden": true,
      "generator": "Ninja",
      "binaryDir": "${sourceDir}/out/${presetName}"
    },
    {"name": "linux-debug", "inherits": "base", "cacheVariables": {"CMAKE_BUILD_TYPE": "Debug"}},
    {"name": "linux-release", "inherits": "base", "cacheVariables": {"CMAKE_BUILD_TYPE": "Release"}}
  ]
}"#;

/// Create a temp source root holding `CMakePresets.json`.
fn temp_root(content: &str) -> TempDir {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join("CMakePresets.json"), content).unwrap();
  temp
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  presetci_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"))
    .stdout(predicate::str::contains("--preset-file"));
}

#[test]
fn version_flag_works() {
  presetci_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("presetci"));
}

#[test]
fn missing_positionals_is_usage_error() {
  presetci_cmd().arg("Build").assert().code(2);
}

// =============================================================================
// Help action
// =============================================================================

#[test]
fn help_overview_lists_actions_and_presets() {
  let temp = temp_root(PRESETS);

  presetci_cmd()
    .current_dir(temp.path())
    .args(["Help", "help"])
    .assert()
    .success()
    .stderr(predicate::str::contains("- Build:"))
    .stderr(predicate::str::contains("- Clean:"))
    .stderr(predicate::str::contains("- linux-debug"))
    .stderr(predicate::str::contains("- linux-release"))
    .stderr(predicate::str::contains("- base").not());
}

#[test]
fn help_describes_preset() {
  let temp = temp_root(PRESETS);

  presetci_cmd()
    .arg("--root")
    .arg(temp.path())
    .args(["Help", "linux-debug"])
    .assert()
    .success()
    .stderr(predicate::str::contains("ConfigView: linux-debug"))
    .stderr(predicate::str::contains("native environment"))
    .stderr(predicate::str::contains("linux-debug"));
}

#[test]
fn root_from_environment() {
  let temp = temp_root(PRESETS);

  presetci_cmd()
    .env("PRESETCI_ROOT", temp.path())
    .args(["Help", "linux-release"])
    .assert()
    .success()
    .stderr(predicate::str::contains("ConfigView: linux-release"));
}

#[test]
fn custom_preset_file() {
  let temp = TempDir::new().unwrap();
  std::fs::create_dir(temp.path().join("ci")).unwrap();
  std::fs::write(temp.path().join("ci/presets.json"), PRESETS).unwrap();

  presetci_cmd()
    .arg("--root")
    .arg(temp.path())
    .args(["--preset-file", "ci/presets.json", "Help", "linux-debug"])
    .assert()
    .success();
}

#[test]
fn quiet_hides_info() {
  let temp = temp_root(PRESETS);

  presetci_cmd()
    .current_dir(temp.path())
    .args(["-q", "Help", "help"])
    .assert()
    .success()
    .stderr(predicate::str::contains("Available actions").not());
}

#[test]
fn teamcity_service_messages() {
  let temp = temp_root(PRESETS);

  presetci_cmd()
    .current_dir(temp.path())
    .env("TEAMCITY_VERSION", "2024.1")
    .args(["Help", "help"])
    .assert()
    .success()
    .stderr(predicate::str::contains("##teamcity[message text='Available actions:']"));
}

// =============================================================================
// Name validation
// =============================================================================

#[test]
fn unknown_action_lists_choices() {
  let temp = temp_root(PRESETS);

  presetci_cmd()
    .current_dir(temp.path())
    .args(["Deploy", "linux-debug"])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("unknown action 'Deploy'"))
    .stderr(predicate::str::contains("Build"))
    .stderr(predicate::str::contains("Test"));
}

#[test]
fn unknown_preset_lists_choices() {
  let temp = temp_root(PRESETS);

  presetci_cmd()
    .current_dir(temp.path())
    .args(["Build", "windows-debug"])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("unknown preset 'windows-debug'"))
    .stderr(predicate::str::contains("linux-debug"));
}

#[test]
fn hidden_preset_is_rejected() {
  let temp = temp_root(PRESETS);

  presetci_cmd()
    .current_dir(temp.path())
    .args(["Help", "base"])
    .assert()
    .code(2);
}

#[test]
fn missing_preset_file_fails() {
  let temp = TempDir::new().unwrap();

  presetci_cmd()
    .current_dir(temp.path())
    .args(["Help", "linux-debug"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to list presets"));
}

#[test]
fn malformed_preset_file_fails() {
  let temp = temp_root("{ not json");

  presetci_cmd()
    .current_dir(temp.path())
    .args(["Clean", "linux-debug"])
    .assert()
    .code(1);
}

// =============================================================================
// Clean & Test
// =============================================================================

#[test]
fn clean_removes_build_directory() {
  let temp = temp_root(PRESETS);
  let build_dir = temp.path().join("out/linux-debug");
  std::fs::create_dir_all(build_dir.join("CMakeFiles")).unwrap();

  presetci_cmd()
    .current_dir(temp.path())
    .args(["Clean", "linux-debug"])
    .assert()
    .success()
    .stderr(predicate::str::contains("completed with result: 0"));

  assert!(!build_dir.exists());
  assert!(temp.path().join("CMakePresets.json").exists());
}

#[test]
fn clean_without_build_directory_succeeds() {
  let temp = temp_root(PRESETS);

  presetci_cmd()
    .current_dir(temp.path())
    .args(["Clean", "linux-release"])
    .assert()
    .success();
}

#[test]
fn test_without_build_directory_fails() {
  let temp = temp_root(PRESETS);

  presetci_cmd()
    .current_dir(temp.path())
    .args(["Test", "linux-debug"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("build directory does not exist"))
    .stderr(predicate::str::contains("Action 'Test' failed with exit code: 1"));
}

#[test]
fn extra_arguments_after_separator() {
  let temp = temp_root(PRESETS);

  presetci_cmd()
    .current_dir(temp.path())
    .args(["-v", "Help", "linux-debug", "--", "--dry-run", "--token=abc"])
    .assert()
    .success()
    .stderr(predicate::str::contains("extra argument"));
}
