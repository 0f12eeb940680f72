//! Running external tools and forwarding their output.
//!
//! [`CommandRunner::run`] spawns a command with piped stdout and stderr,
//! classifies each line with a [`LineClassifier`] created for that run, strips
//! terminal decorations and hands the clean line with its [`Severity`] to a
//! [`LineSink`]. Lines from stderr are never reported below
//! [`Severity::Warning`].
//!
//! Failures to start the command (missing executable, spawn error, broken
//! pipe) are reported to the sink as a single error line and turned into exit
//! code 1. Otherwise the child's own exit code is returned unchanged.

pub mod ansi;
pub mod classify;
pub mod sink;
mod stream;

use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

use thiserror::Error;
use tracing::{debug, info};

pub use ansi::strip_ansi;
pub use classify::{ClassifierState, DetectionMode, LineClassifier, Severity, classify};
pub use sink::{ExecutionResult, LineSink, OutputLine, Tee, TracingSink};
pub use stream::StreamKind;

/// Exit code reported when the command could not be run at all.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Errors raised before or while running a command.
#[derive(Debug, Error)]
pub enum RunError {
  /// The program is not a file and not found on `PATH`.
  #[error("command not found: {program}. Make sure it's installed and in PATH")]
  ExecutableNotFound { program: String },

  #[error("empty command")]
  EmptyCommand,

  #[error("failed to start '{command}': {source}")]
  Spawn {
    command: String,
    #[source]
    source: io::Error,
  },

  /// Reading the child's output or waiting for it failed.
  #[error("error running command '{command}': {source}")]
  Io {
    command: String,
    #[source]
    source: io::Error,
  },
}

/// A program and its arguments.
///
/// A single string is split on whitespace; no shell quoting is understood.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandLine(Vec<String>);

impl CommandLine {
  pub fn new<I, S>(tokens: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self(tokens.into_iter().map(Into::into).collect())
  }

  /// Append one argument.
  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.0.push(arg.into());
    self
  }

  pub fn program(&self) -> Option<&str> {
    self.0.first().map(String::as_str)
  }

  pub fn args(&self) -> &[String] {
    self.0.get(1..).unwrap_or_default()
  }

  pub fn tokens(&self) -> &[String] {
    &self.0
  }
}

impl fmt::Display for CommandLine {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0.join(" "))
  }
}

impl From<&str> for CommandLine {
  fn from(value: &str) -> Self {
    Self::new(value.split_whitespace())
  }
}

impl From<String> for CommandLine {
  fn from(value: String) -> Self {
    Self::from(value.as_str())
  }
}

impl From<Vec<String>> for CommandLine {
  fn from(value: Vec<String>) -> Self {
    Self(value)
  }
}

impl From<&[&str]> for CommandLine {
  fn from(value: &[&str]) -> Self {
    Self::new(value.iter().copied())
  }
}

impl<const N: usize> From<[&str; N]> for CommandLine {
  fn from(value: [&str; N]) -> Self {
    Self::new(value)
  }
}

/// Reaps the child on every path out of a run.
struct ChildGuard {
  child: Child,
  reaped: bool,
}

impl ChildGuard {
  fn new(child: Child) -> Self {
    Self { child, reaped: false }
  }

  fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
    let status = self.child.try_wait()?;
    self.reaped |= status.is_some();
    Ok(status)
  }

  fn wait(&mut self) -> io::Result<ExitStatus> {
    let status = self.child.wait()?;
    self.reaped = true;
    Ok(status)
  }
}

impl Drop for ChildGuard {
  fn drop(&mut self) {
    if !self.reaped {
      let _ = self.child.kill();
      let _ = self.child.wait();
    }
  }
}

/// Classify a raw line, apply the stderr floor and hand the stripped text on.
fn forward_line(classifier: &mut LineClassifier, sink: &mut dyn LineSink, kind: StreamKind, line: &str) {
  let mut severity = classifier.classify(line);
  if kind == StreamKind::Stderr {
    severity = severity.max(Severity::Warning);
  }
  sink.emit(&strip_ansi(line), severity);
}

/// Exit code of a finished child. Signal deaths map to `128 + signal` as shells do.
fn exit_code(status: ExitStatus) -> i32 {
  if let Some(code) = status.code() {
    return code;
  }
  #[cfg(unix)]
  {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = status.signal() {
      return 128 + signal;
    }
  }
  FAILURE_EXIT_CODE
}

#[cfg(windows)]
const EXECUTABLE_EXTENSIONS: &[&str] = &["", ".exe", ".cmd", ".bat"];
#[cfg(not(windows))]
const EXECUTABLE_EXTENSIONS: &[&str] = &[""];

fn is_executable(path: &Path) -> bool {
  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    path
      .metadata()
      .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
  }
  #[cfg(not(unix))]
  {
    path.is_file()
  }
}

/// Locate `program` the way the OS would when spawning it.
///
/// Names containing a path separator are checked directly (relative to `cwd`
/// when given); bare names are searched on `search_path`.
pub fn find_executable(program: &str, search_path: Option<&OsString>, cwd: Option<&Path>) -> Option<PathBuf> {
  let candidates = |base: PathBuf| {
    EXECUTABLE_EXTENSIONS.iter().map(move |ext| {
      let mut name = base.clone().into_os_string();
      name.push(ext);
      PathBuf::from(name)
    })
  };

  let as_path = Path::new(program);
  if as_path.components().count() > 1 || as_path.is_absolute() {
    let base = match cwd {
      Some(cwd) if as_path.is_relative() => cwd.join(as_path),
      _ => as_path.to_path_buf(),
    };
    return candidates(base).find(|c| is_executable(c));
  }

  env::split_paths(search_path?)
    .flat_map(|dir| candidates(dir.join(program)))
    .find(|c| is_executable(c))
}

/// Spawns commands and streams their classified output.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
  cwd: Option<PathBuf>,
  env: BTreeMap<String, String>,
}

impl CommandRunner {
  pub fn new() -> Self {
    Self::default()
  }

  /// Run commands from `dir` instead of the current directory.
  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  /// Extra environment for every spawned command.
  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  fn search_path(&self) -> Option<OsString> {
    match self.env.get("PATH") {
      Some(path) => Some(OsString::from(path)),
      None => env::var_os("PATH"),
    }
  }

  fn command(&self, command: &CommandLine) -> Result<Command, RunError> {
    let program = command.program().ok_or(RunError::EmptyCommand)?;
    let executable = find_executable(program, self.search_path().as_ref(), self.cwd.as_deref()).ok_or_else(|| {
      RunError::ExecutableNotFound {
        program: program.to_string(),
      }
    })?;
    debug!(program = %program, path = %executable.display(), "resolved executable");

    let mut cmd = Command::new(executable);
    cmd.args(command.args()).envs(&self.env).env("PYTHONUNBUFFERED", "1");
    if let Some(cwd) = &self.cwd {
      cmd.current_dir(cwd);
    }
    Ok(cmd)
  }

  /// Run `command`, reporting every output line to `sink`.
  ///
  /// Never fails: problems starting or reading the command are reported to the
  /// sink as one [`Severity::Error`] line and yield exit code 1.
  pub fn run(&self, command: impl Into<CommandLine>, mode: DetectionMode, sink: &mut dyn LineSink) -> i32 {
    match self.try_run(command, mode, sink) {
      Ok(code) => code,
      Err(err) => {
        sink.emit(&err.to_string(), Severity::Error);
        FAILURE_EXIT_CODE
      }
    }
  }

  /// Like [`CommandRunner::run`] but returns start and I/O failures as errors.
  pub fn try_run(
    &self,
    command: impl Into<CommandLine>,
    mode: DetectionMode,
    sink: &mut dyn LineSink,
  ) -> Result<i32, RunError> {
    let command = command.into();
    info!("Running command: {command}");

    let mut cmd = self.command(&command)?;
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    if mode == DetectionMode::Color {
      cmd.env("CLICOLOR_FORCE", "1");
    }

    let mut child = cmd.spawn().map_err(|source| RunError::Spawn {
      command: command.to_string(),
      source,
    })?;
    let pipes = (child.stdout.take(), child.stderr.take());
    let mut guard = ChildGuard::new(child);
    let io_error = |source: io::Error| RunError::Io {
      command: command.to_string(),
      source,
    };

    let (Some(stdout), Some(stderr)) = pipes else {
      return Err(io_error(io::Error::other("child output pipes were not created")));
    };

    let mut classifier = LineClassifier::new(mode);
    stream::pump(
      stdout,
      stderr,
      &mut || Ok(guard.try_wait()?.is_some()),
      &mut |kind: StreamKind, line: &str| forward_line(&mut classifier, &mut *sink, kind, line),
    )
    .map_err(io_error)?;

    let status = guard.wait().map_err(io_error)?;
    let code = exit_code(status);
    debug!(command = %command, code, "command finished");
    Ok(code)
  }

  /// Run `command` and return its exit code with every forwarded line.
  ///
  /// Lines are also logged through [`TracingSink`].
  pub fn run_captured(&self, command: impl Into<CommandLine>, mode: DetectionMode) -> ExecutionResult {
    let mut lines: Vec<OutputLine> = Vec::new();
    let exit_code = self.run(
      command,
      mode,
      &mut Tee {
        inner: TracingSink,
        lines: &mut lines,
      },
    );
    ExecutionResult { exit_code, lines }
  }

  /// Run `command` with stderr folded into stdout and return the raw text.
  ///
  /// Nothing is classified or forwarded. Failures to start are logged and give
  /// `(1, "")`.
  pub fn capture(&self, command: impl Into<CommandLine>) -> (i32, String) {
    match self.try_capture(command) {
      Ok(result) => result,
      Err(err) => {
        tracing::error!("{err}");
        (FAILURE_EXIT_CODE, String::new())
      }
    }
  }

  fn try_capture(&self, command: impl Into<CommandLine>) -> Result<(i32, String), RunError> {
    let command = command.into();
    let io_error = |source: io::Error| RunError::Io {
      command: command.to_string(),
      source,
    };

    let mut cmd = self.command(&command)?;
    let (mut reader, writer) = io::pipe().map_err(io_error)?;
    cmd.stdout(writer.try_clone().map_err(io_error)?).stderr(writer);

    let child = cmd.spawn().map_err(|source| RunError::Spawn {
      command: command.to_string(),
      source,
    })?;
    // The builder holds the write ends; the read below only ends once they are closed
    drop(cmd);
    let mut guard = ChildGuard::new(child);

    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(io_error)?;
    let status = guard.wait().map_err(io_error)?;

    Ok((exit_code(status), String::from_utf8_lossy(&bytes).into_owned()))
  }
}
