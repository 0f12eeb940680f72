//! Test utilities for presetci-lib.
//!
//! Helpers for tests that need stand-ins for external tools such as `cmake`
//! and `ctest`. Tools are small `/bin/sh` scripts, so these helpers are
//! unix-only.

use std::ffi::OsString;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A fake executable that records each invocation's arguments.
pub struct FakeTool {
  dir: PathBuf,
  name: String,
}

impl FakeTool {
  /// Create `<temp>/bin/<name>` running `body` after logging `$*`.
  pub fn new(temp: &TempDir, name: &str, body: &str) -> Self {
    let dir = temp.path().join("bin");
    fs::create_dir_all(&dir).unwrap();

    let tool = Self {
      dir,
      name: name.to_string(),
    };
    let script = format!(
      "#!/bin/sh\necho \"$*\" >> '{}'\n{body}\n",
      tool.calls_file().display()
    );
    let path = tool.dir.join(name);
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    tool
  }

  /// Directory holding the tool, for prepending to `PATH`.
  pub fn dir(&self) -> &Path {
    &self.dir
  }

  fn calls_file(&self) -> PathBuf {
    self.dir.join(format!("{}.calls", self.name))
  }

  /// Arguments of every invocation so far, one string per call.
  pub fn calls(&self) -> Vec<String> {
    fs::read_to_string(self.calls_file())
      .map(|text| text.lines().map(str::to_string).collect())
      .unwrap_or_default()
  }
}

/// The current `PATH` with `dir` in front.
pub fn path_with(dir: &Path) -> OsString {
  let current = std::env::var_os("PATH").unwrap_or_default();
  let paths = std::iter::once(dir.to_path_buf()).chain(std::env::split_paths(&current));
  std::env::join_paths(paths).unwrap()
}

/// Returns the shell command line running `script`.
pub fn shell_cmd(script: &str) -> Vec<String> {
  vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()]
}
