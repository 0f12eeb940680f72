//! Severity classification of tool output lines.
//!
//! Three [`DetectionMode`]s are supported:
//!
//! - **Content**: keyword search. `error`, `failed`, `failure`, `fatal` and
//!   `exception` mean [`Severity::Error`]; `warning`, `warn` and `deprecated`
//!   mean [`Severity::Warning`]. A `0 tests failed` style summary is always
//!   [`Severity::Info`].
//! - **Color**: follows the SGR colour codes the tool prints. Red sets the
//!   current and following lines to error, yellow to warning, and a reset or
//!   green code returns the *following* lines to info. This mode carries state
//!   from one line to the next in a [`ClassifierState`].
//! - **ToolProgress**: everything is an error unless it looks like ninja/make
//!   progress chatter.
//!
//! [`classify`] is pure: the caller owns the state and threads it through.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Log severity of one line, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
  Debug,
  #[default]
  Info,
  Warning,
  Error,
  Critical,
}

impl Severity {
  pub fn as_str(&self) -> &'static str {
    match self {
      Severity::Debug => "DEBUG",
      Severity::Info => "INFO",
      Severity::Warning => "WARNING",
      Severity::Error => "ERROR",
      Severity::Critical => "CRITICAL",
    }
  }
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// How a line's severity is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectionMode {
  #[default]
  Content,
  Color,
  /// Ninja/make style progress output.
  ToolProgress,
}

/// Colour-mode state: the severity of this line and of the lines after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassifierState {
  pub current: Severity,
  pub next: Severity,
}

static ZERO_FAILURES: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\b0\s+(tests?|errors?)\s+(failed|error)").expect("invalid zero-failure regex")
});

static ERROR_WORDS: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\b(error|failed|failure|fatal|exception)\b").expect("invalid error keyword regex")
});

static WARNING_WORDS: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\b(warning|warn|deprecated)\b").expect("invalid warning keyword regex"));

static SGR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b\[([0-9;]*)m").expect("invalid SGR regex"));

/// Lines that are harmless progress output in tool-progress mode.
static PROGRESS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
  [
    r"^\[(\d+)/(\d+)\]",
    r"^\[\s*\d+%\]",
    r"^\s*Building ",
    r"^\s*Linking ",
    r"^CPack:.*",
    r"^Scanning dependencies of target .*",
    r"^ Importing .*",
    r"^ninja: no work to do\.",
  ]
  .into_iter()
  .map(|pattern| Regex::new(pattern).expect("invalid progress regex"))
  .collect()
});

/// Net colour effect of one SGR sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sgr {
  Red,
  Yellow,
  Reset,
}

/// Parameters apply left to right, so `0;31` ends red and `31;0` ends reset.
/// An empty parameter list or parameter means `0`.
fn sgr_effect(params: &str) -> Option<Sgr> {
  if params.is_empty() {
    return Some(Sgr::Reset);
  }
  params.split(';').fold(None, |effect, param| {
    let code = if param.is_empty() { Ok(0) } else { param.parse::<u8>() };
    match code {
      Ok(31 | 91) => Some(Sgr::Red),
      Ok(33 | 93) => Some(Sgr::Yellow),
      Ok(0 | 32 | 92) => Some(Sgr::Reset),
      _ => effect,
    }
  })
}

/// Colour families found in the SGR sequences of a line.
#[derive(Debug, Default)]
struct Colors {
  red: bool,
  yellow: bool,
  reset: bool,
}

fn scan_colors(line: &str) -> Colors {
  let mut colors = Colors::default();
  for caps in SGR.captures_iter(line) {
    let params = caps.get(1).map_or("", |m| m.as_str());
    match sgr_effect(params) {
      Some(Sgr::Red) => colors.red = true,
      Some(Sgr::Yellow) => colors.yellow = true,
      Some(Sgr::Reset) => colors.reset = true,
      None => {}
    }
  }
  colors
}

fn classify_content(line: &str) -> Severity {
  if ZERO_FAILURES.is_match(line) {
    Severity::Info
  } else if ERROR_WORDS.is_match(line) {
    Severity::Error
  } else if WARNING_WORDS.is_match(line) {
    Severity::Warning
  } else {
    Severity::Info
  }
}

fn classify_progress(line: &str) -> Severity {
  if PROGRESS_PATTERNS.iter().any(|re| re.is_match(line)) {
    Severity::Info
  } else {
    Severity::Error
  }
}

fn classify_color(line: &str, state: ClassifierState) -> ClassifierState {
  let mut state = ClassifierState {
    current: state.next,
    next: state.next,
  };
  let colors = scan_colors(line);

  if colors.red {
    state.current = Severity::Error;
    state.next = Severity::Error;
  } else if colors.yellow {
    state.current = Severity::Warning;
    state.next = Severity::Warning;
  }
  // Evaluated after red/yellow: `\x1b[31merror\x1b[0m` is an error line
  // followed by info lines.
  if colors.reset {
    state.next = Severity::Info;
  }

  state
}

/// Classify one raw line (decorations included).
///
/// Content and tool-progress modes return `state` unchanged.
pub fn classify(line: &str, mode: DetectionMode, state: ClassifierState) -> (Severity, ClassifierState) {
  match mode {
    DetectionMode::Content => (classify_content(line), state),
    DetectionMode::ToolProgress => (classify_progress(line), state),
    DetectionMode::Color => {
      let state = classify_color(line, state);
      (state.current, state)
    }
  }
}

/// A classifier bound to one mode and owning its state.
///
/// Create one per command run so colour state never leaks between runs.
#[derive(Debug, Clone, Default)]
pub struct LineClassifier {
  mode: DetectionMode,
  state: ClassifierState,
}

impl LineClassifier {
  pub fn new(mode: DetectionMode) -> Self {
    Self {
      mode,
      state: ClassifierState::default(),
    }
  }

  pub fn mode(&self) -> DetectionMode {
    self.mode
  }

  pub fn state(&self) -> ClassifierState {
    self.state
  }

  pub fn classify(&mut self, line: &str) -> Severity {
    let (severity, state) = classify(line, self.mode, self.state);
    self.state = state;
    severity
  }
}
