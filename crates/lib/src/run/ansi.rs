//! Removal of terminal escape sequences.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// 7-bit C1 escape sequences: `ESC`, one byte in `@`..`_`, CSI parameter and
/// intermediate bytes, and a final byte.
static ANSI_ESCAPE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\x1b[@-_][0-?]*[ -/]*[@-~]").expect("invalid ANSI escape regex"));

/// Strip colour and cursor sequences, borrowing when there is nothing to strip.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
  ANSI_ESCAPE.replace_all(text, "")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strips_colors() {
    assert_eq!(strip_ansi("\x1b[31merror\x1b[0m: boom"), "error: boom");
    assert_eq!(strip_ansi("\x1b[1;33mwarn\x1b[m"), "warn");
  }

  #[test]
  fn strips_cursor_movement() {
    assert_eq!(strip_ansi("\x1b[2K\x1b[1Gprogress"), "progress");
  }

  #[test]
  fn plain_text_is_borrowed() {
    assert!(matches!(strip_ansi("plain text"), Cow::Borrowed("plain text")));
  }

  #[test]
  fn brackets_without_escape_are_kept() {
    assert_eq!(strip_ansi("[3/10] Building"), "[3/10] Building");
  }
}
