use std::fs;

use tracing::info;

use super::exit_code;
use crate::action::{Action, ActionArgs, ActionError};
use crate::preset::ConfigView;

/// Removes the build directory of a preset.
pub struct CleanAction;

impl CleanAction {
  fn clean(&self, view: &ConfigView) -> Result<i32, ActionError> {
    let build_dir = view.build_directory();
    info!(preset = %view.name(), "cleaning build artifacts");

    if build_dir.exists() {
      fs::remove_dir_all(&build_dir).map_err(|source| ActionError::Io {
        path: build_dir.clone(),
        source,
      })?;
      info!("Removed build directory: {}", build_dir.display());
    } else {
      info!("No build directory to remove: {}", build_dir.display());
    }
    Ok(0)
  }
}

impl Action for CleanAction {
  fn name(&self) -> &'static str {
    "Clean"
  }

  fn description(&self) -> &'static str {
    "Remove the build directory"
  }

  fn run(&self, view: &ConfigView, _args: &ActionArgs) -> i32 {
    exit_code(self.clean(view))
  }
}
