use tracing::{debug, error, info};

use crate::action::{Action, ActionArgs};
use crate::preset::ConfigView;

/// Lists actions and presets, or describes one preset.
pub struct HelpAction {
  actions: Vec<(&'static str, &'static str)>,
}

impl HelpAction {
  pub const NAME: &'static str = "Help";
  pub const DESCRIPTION: &'static str = "List actions and presets, or describe a preset";

  /// `actions` is the `(name, description)` listing shown for `help`.
  pub fn new(actions: Vec<(&'static str, &'static str)>) -> Self {
    Self { actions }
  }

  fn describe(&self, view: &ConfigView) -> i32 {
    info!("{view}");
    let image = view.container_image();
    if image.is_empty() {
      info!("Will be run in native environment.");
    } else {
      info!("Will be run in container image: `{image}`");
    }
    info!("Build dir: {}", view.build_directory().display());
    debug!("raw config: {}", view.raw());
    0
  }

  fn overview(&self, view: &ConfigView) -> i32 {
    info!("Available actions:");
    for (name, description) in &self.actions {
      info!("- {name}: {description}");
    }

    match view.workspace().list_names() {
      Ok(presets) => {
        info!("Available presets:");
        for preset in presets {
          info!("- {preset}");
        }
      }
      Err(err) => error!("cannot list presets: {err}"),
    }

    info!("Run `presetci Help <preset>` to get information about a specific preset.");
    0
  }
}

impl Action for HelpAction {
  fn name(&self) -> &'static str {
    Self::NAME
  }

  fn description(&self) -> &'static str {
    Self::DESCRIPTION
  }

  fn run(&self, view: &ConfigView, args: &ActionArgs) -> i32 {
    for (key, value) in args.iter() {
      debug!(key = %key, value = %value, "extra argument");
    }
    if view.is_help() {
      self.overview(view)
    } else {
      self.describe(view)
    }
  }
}
