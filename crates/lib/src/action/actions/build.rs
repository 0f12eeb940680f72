use tracing::{error, info};

use super::exit_code;
use crate::action::{Action, ActionArgs, ActionError};
use crate::preset::ConfigView;
use crate::run::{CommandLine, CommandRunner, DetectionMode, TracingSink};

/// Configures and builds a preset with CMake.
///
/// Reads `--target=<name>` and `--jobs=<n>` from the extra arguments and passes
/// them to every `cmake --build` as `--target` and `--parallel`.
pub struct BuildAction;

impl BuildAction {
  /// Output mode for `cmake --build`: Ninja prints progress lines, other generators colours.
  fn build_mode(view: &ConfigView) -> DetectionMode {
    match view.generator() {
      Some(generator) if generator.contains("Ninja") => DetectionMode::ToolProgress,
      _ => DetectionMode::Color,
    }
  }

  fn configure_command(view: &ConfigView) -> CommandLine {
    let root = view.workspace().root().display().to_string();
    let command = CommandLine::new(["cmake", "--preset", view.name(), "-S", root.as_str()]);
    match view.generator().filter(|g| !g.is_empty()) {
      Some(generator) => command.arg("-G").arg(generator),
      None => command,
    }
  }

  fn build_commands(view: &ConfigView, args: &ActionArgs) -> Vec<CommandLine> {
    let build_dir = view.build_directory().display().to_string();
    let mut base = CommandLine::new(["cmake", "--build", build_dir.as_str()]);
    if let Some(target) = args.get("target").filter(|t| !t.is_empty()) {
      base = base.arg("--target").arg(target);
    }
    if let Some(jobs) = args.get("jobs").filter(|j| !j.is_empty()) {
      base = base.arg("--parallel").arg(jobs);
    }
    let build_types = view.build_types();
    if build_types.is_empty() {
      return vec![base];
    }
    build_types
      .into_iter()
      .map(|build_type| base.clone().arg("--config").arg(build_type))
      .collect()
  }

  fn build(&self, view: &ConfigView, args: &ActionArgs) -> Result<i32, ActionError> {
    info!(preset = %view.name(), "building project");
    let runner = CommandRunner::new().current_dir(view.workspace().root());

    let configure = runner.run(Self::configure_command(view), DetectionMode::Color, &mut TracingSink);
    if configure != 0 {
      error!("CMake configuration failed.");
      return Ok(configure);
    }

    let build_dir = view.build_directory();
    if !build_dir.exists() {
      return Err(ActionError::MissingBuildDirectory(build_dir));
    }

    let mode = Self::build_mode(view);
    for command in Self::build_commands(view, args) {
      let code = runner.run(command, mode, &mut TracingSink);
      if code != 0 {
        error!("CMake build failed.");
        return Ok(code);
      }
    }
    Ok(0)
  }
}

impl Action for BuildAction {
  fn name(&self) -> &'static str {
    "Build"
  }

  fn description(&self) -> &'static str {
    "Configure and build the preset with CMake"
  }

  fn run(&self, view: &ConfigView, args: &ActionArgs) -> i32 {
    exit_code(self.build(view, args))
  }
}
