use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::preset::{ConfigView, PresetError};

/// Errors raised while dispatching or running an action.
#[derive(Debug, Error)]
pub enum ActionError {
  /// No registered action has this name.
  #[error("unknown action '{name}', expected one of: {}", .available.join(", "))]
  UnknownAction { name: String, available: Vec<String> },

  #[error(transparent)]
  Preset(#[from] PresetError),

  #[error("build directory does not exist: {}", .0.display())]
  MissingBuildDirectory(PathBuf),

  #[error("I/O error on {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// A named operation run against one resolved preset.
pub trait Action {
  /// Name used on the command line.
  fn name(&self) -> &'static str;

  /// One-line summary for listings.
  fn description(&self) -> &'static str;

  /// Run the action and return a process exit code.
  fn run(&self, view: &ConfigView, args: &ActionArgs) -> i32;
}

/// Extra `--key=value` and `--flag` arguments given after `--`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionArgs {
  values: BTreeMap<String, String>,
}

impl ActionArgs {
  /// Parse extra arguments. Tokens not starting with `--` are ignored.
  ///
  /// ```
  /// use presetci_lib::action::ActionArgs;
  ///
  /// let args = ActionArgs::parse(["--token=abc=def", "--dry-run", "stray"]);
  /// assert_eq!(args.get("token"), Some("abc=def"));
  /// assert!(args.flag("dry-run"));
  /// assert_eq!(args.len(), 2);
  /// ```
  pub fn parse<I, S>(extra: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let values = extra
      .into_iter()
      .filter_map(|arg| {
        let rest = arg.as_ref().strip_prefix("--")?;
        if rest.is_empty() {
          return None;
        }
        Some(match rest.split_once('=') {
          Some((key, value)) => (key.to_string(), value.to_string()),
          None => (rest.to_string(), "true".to_string()),
        })
      })
      .collect();
    Self { values }
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.values.get(key).map(String::as_str)
  }

  /// Whether `--key` was given, or `--key=` with a truthy value.
  pub fn flag(&self, key: &str) -> bool {
    self.get(key).is_some_and(|v| matches!(v, "true" | "1" | "ON" | "yes"))
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }
}
