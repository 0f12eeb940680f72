//! Destinations for classified tool output.

use tracing::{debug, error, info, warn};

use super::classify::Severity;
use crate::consts::TOOL_LOG_TARGET;

/// Receives each forwarded line, already stripped of decorations.
pub trait LineSink {
  fn emit(&mut self, line: &str, severity: Severity);
}

/// Forwards lines to `tracing` under the `presetci::tool` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LineSink for TracingSink {
  fn emit(&mut self, line: &str, severity: Severity) {
    match severity {
      Severity::Debug => debug!(target: TOOL_LOG_TARGET, "{line}"),
      Severity::Info => info!(target: TOOL_LOG_TARGET, "{line}"),
      Severity::Warning => warn!(target: TOOL_LOG_TARGET, "{line}"),
      Severity::Error | Severity::Critical => error!(target: TOOL_LOG_TARGET, "{line}"),
    }
  }
}

/// One line as delivered to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
  pub text: String,
  pub severity: Severity,
}

impl LineSink for Vec<OutputLine> {
  fn emit(&mut self, line: &str, severity: Severity) {
    self.push(OutputLine {
      text: line.to_string(),
      severity,
    });
  }
}

impl<S: LineSink + ?Sized> LineSink for &mut S {
  fn emit(&mut self, line: &str, severity: Severity) {
    (**self).emit(line, severity)
  }
}

/// Records lines while passing them on to another sink.
pub struct Tee<'a, S: LineSink> {
  pub inner: S,
  pub lines: &'a mut Vec<OutputLine>,
}

impl<S: LineSink> LineSink for Tee<'_, S> {
  fn emit(&mut self, line: &str, severity: Severity) {
    self.lines.emit(line, severity);
    self.inner.emit(line, severity);
  }
}

/// Exit code and every line seen, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
  pub exit_code: i32,
  pub lines: Vec<OutputLine>,
}

impl ExecutionResult {
  pub fn success(&self) -> bool {
    self.exit_code == 0
  }

  /// Lines at `severity` or above.
  pub fn at_least(&self, severity: Severity) -> impl Iterator<Item = &OutputLine> {
    self.lines.iter().filter(move |line| line.severity >= severity)
  }
}
