//! Terminal status lines for the CLI.

use owo_colors::{OwoColorize, Stream};

pub mod symbols {
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

/// Print the accepted values after a rejected name.
pub fn print_choices(label: &str, choices: &[String]) {
  eprintln!("{label}:");
  for choice in choices {
    eprintln!(
      "  {} {}",
      symbols::INFO.if_supports_color(Stream::Stderr, |s| s.blue()),
      choice
    );
  }
}
