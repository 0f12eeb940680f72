//! Actions runnable against a preset.
//!
//! The set of actions is fixed at startup: [`ActionRegistry::builtin`] builds
//! one handler per action and keys it by name. Dispatching resolves the preset
//! into a [`ConfigView`] and hands it to the handler.
//!
//! # Built-in actions
//!
//! - `Help` lists actions and presets, or summarises one preset
//! - `Clean` removes the preset's build directory
//! - `Build` configures with `cmake --preset` and builds every build type,
//!   honouring `--target=` and `--jobs=` extra arguments
//! - `Test` runs `ctest` in the build directory

pub mod actions;
mod types;

pub use types::*;

use std::collections::BTreeMap;

use tracing::{debug, error, info};

use crate::preset::{ConfigView, Workspace};
use actions::{BuildAction, CleanAction, HelpAction, TestAction};

/// Name → handler map built once per process.
pub struct ActionRegistry {
  actions: BTreeMap<&'static str, Box<dyn Action>>,
}

impl ActionRegistry {
  pub fn empty() -> Self {
    Self {
      actions: BTreeMap::new(),
    }
  }

  /// Registry with every built-in action.
  pub fn builtin() -> Self {
    let mut registry = Self::empty();
    registry.register(Box::new(BuildAction));
    registry.register(Box::new(CleanAction));
    registry.register(Box::new(TestAction));

    let mut listing: Vec<(&'static str, &'static str)> = registry
      .actions
      .values()
      .map(|action| (action.name(), action.description()))
      .collect();
    listing.push((HelpAction::NAME, HelpAction::DESCRIPTION));
    listing.sort();
    registry.register(Box::new(HelpAction::new(listing)));

    registry
  }

  /// Add a handler, replacing any previous one with the same name.
  pub fn register(&mut self, action: Box<dyn Action>) {
    self.actions.insert(action.name(), action);
  }

  /// Action names, sorted.
  pub fn names(&self) -> Vec<String> {
    self.actions.keys().map(|name| name.to_string()).collect()
  }

  pub fn get(&self, name: &str) -> Result<&dyn Action, ActionError> {
    self
      .actions
      .get(name)
      .map(Box::as_ref)
      .ok_or_else(|| ActionError::UnknownAction {
        name: name.to_string(),
        available: self.names(),
      })
  }

  /// Resolve `preset` and run `action` against it.
  ///
  /// Returns the action's exit code. Only an unknown action or a preset that
  /// fails to resolve is an error.
  pub fn dispatch(
    &self,
    action: &str,
    preset: &str,
    workspace: &Workspace,
    args: &ActionArgs,
  ) -> Result<i32, ActionError> {
    let handler = self.get(action)?;
    let view: ConfigView = workspace.view(preset)?;
    debug!(action = %action, preset = %preset, "dispatching action");

    let code = handler.run(&view, args);
    if code != 0 {
      error!("Action '{action}' failed with exit code: {code}");
    } else {
      info!("Action '{action}' completed with result: {code}");
    }
    Ok(code)
  }
}

impl Default for ActionRegistry {
  fn default() -> Self {
    Self::builtin()
  }
}
