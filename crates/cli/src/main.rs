mod logging;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use presetci_lib::action::{ActionArgs, ActionRegistry};
use presetci_lib::consts::HELP_PRESET;
use presetci_lib::preset::Workspace;
use tracing::debug;

use crate::output::{print_choices, print_error};

/// Exit code for names rejected before any action runs.
const USAGE_EXIT_CODE: i32 = 2;

/// presetci - run CI actions against CMake presets
#[derive(Parser, Debug)]
#[command(name = "presetci")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Action to run (`Help` lists them)
  action: String,

  /// Preset to run the action against, or `help`
  preset: String,

  /// More output; repeat for more
  #[arg(short, long, action = ArgAction::Count)]
  verbose: u8,

  /// Less output; repeat for less
  #[arg(short, long, action = ArgAction::Count)]
  quiet: u8,

  /// Source root holding the preset file (default: current directory)
  #[arg(long, env = "PRESETCI_ROOT")]
  root: Option<PathBuf>,

  /// Preset file, relative to the root
  #[arg(long, env = "PRESETCI_PRESET_FILE")]
  preset_file: Option<PathBuf>,

  /// Namespace of the `vendor` block read by actions
  #[arg(long, env = "PRESETCI_VENDOR")]
  vendor: Option<String>,

  /// Prefix of the project's cache variables
  #[arg(long, env = "PRESETCI_PREFIX")]
  prefix: Option<String>,

  /// Extra `--key=value` arguments passed to the action
  #[arg(last = true)]
  extra: Vec<String>,
}

impl Cli {
  fn verbosity(&self) -> i16 {
    i16::from(self.verbose) - i16::from(self.quiet)
  }

  fn workspace(&self) -> Result<Workspace> {
    let root = match &self.root {
      Some(root) => root.clone(),
      None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    let mut workspace = Workspace::new(root);
    if let Some(file) = &self.preset_file {
      workspace = workspace.with_preset_file(file);
    }
    if let Some(vendor) = &self.vendor {
      workspace = workspace.with_vendor(vendor);
    }
    if let Some(prefix) = &self.prefix {
      workspace = workspace.with_cache_prefix(prefix);
    }
    Ok(workspace)
  }
}

fn main() {
  let cli = Cli::parse();
  logging::init(cli.verbosity());

  let code = match run(&cli) {
    Ok(code) => code,
    Err(err) => {
      print_error(&format!("{err:#}"));
      1
    }
  };
  std::process::exit(code);
}

fn run(cli: &Cli) -> Result<i32> {
  let registry = ActionRegistry::builtin();
  let workspace = cli.workspace()?;

  let actions = registry.names();
  if !actions.contains(&cli.action) {
    print_error(&format!("unknown action '{}'", cli.action));
    print_choices("Available actions", &actions);
    return Ok(USAGE_EXIT_CODE);
  }

  if cli.preset != HELP_PRESET {
    let presets = workspace
      .list_names()
      .with_context(|| format!("Failed to list presets in {}", workspace.preset_file().display()))?;
    if !presets.contains(&cli.preset) {
      print_error(&format!("unknown preset '{}'", cli.preset));
      print_choices("Available presets", &presets);
      return Ok(USAGE_EXIT_CODE);
    }
  }

  let args = ActionArgs::parse(&cli.extra);
  debug!(root = %workspace.root().display(), extra = args.len(), "workspace ready");

  registry
    .dispatch(&cli.action, &cli.preset, &workspace, &args)
    .with_context(|| format!("Failed to run {} on preset '{}'", cli.action, cli.preset))
}
