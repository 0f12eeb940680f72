//! Subscriber setup for the `presetci` binary.
//!
//! Plain runs get the compact fmt layer on stderr. Under TeamCity every event
//! becomes a `##teamcity[message ...]` service message so the build log keeps
//! its severities.

use std::fmt::{self, Write as _};

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Set by TeamCity agents in every build step.
pub const TEAMCITY_ENV: &str = "TEAMCITY_VERSION";

/// Level for `verbosity` = number of `-v` minus number of `-q`.
pub fn level_for(verbosity: i16) -> LevelFilter {
  match verbosity {
    i16::MIN..=-2 => LevelFilter::ERROR,
    -1 => LevelFilter::WARN,
    0 => LevelFilter::INFO,
    1 => LevelFilter::DEBUG,
    _ => LevelFilter::TRACE,
  }
}

/// Install the global subscriber. `RUST_LOG` overrides the verbosity flags.
pub fn init(verbosity: i16) {
  let filter = EnvFilter::builder()
    .with_default_directive(level_for(verbosity).into())
    .from_env_lossy();

  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr);

  if std::env::var_os(TEAMCITY_ENV).is_some() {
    builder.event_format(TeamCityFormat).init();
  } else {
    builder.without_time().with_target(false).init();
  }
}

/// Formats events as TeamCity service messages.
pub struct TeamCityFormat;

impl TeamCityFormat {
  fn status(level: &Level) -> Option<&'static str> {
    match *level {
      Level::ERROR => Some("ERROR"),
      Level::WARN => Some("WARNING"),
      _ => None,
    }
  }
}

impl<S, N> FormatEvent<S, N> for TeamCityFormat
where
  S: Subscriber + for<'a> LookupSpan<'a>,
  N: for<'a> FormatFields<'a> + 'static,
{
  fn format_event(
    &self,
    ctx: &FmtContext<'_, S, N>,
    mut writer: Writer<'_>,
    event: &Event<'_>,
  ) -> fmt::Result {
    let mut text = String::new();
    ctx.format_fields(Writer::new(&mut text), event)?;

    write!(writer, "##teamcity[message text='{}'", escape(&text))?;
    if let Some(status) = Self::status(event.metadata().level()) {
      write!(writer, " status='{status}'")?;
    }
    writeln!(writer, "]")
  }
}

/// Escape a value for use inside a service message attribute.
pub fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '|' => out.push_str("||"),
      '\'' => out.push_str("|'"),
      '\n' => out.push_str("|n"),
      '\r' => out.push_str("|r"),
      '[' => out.push_str("|["),
      ']' => out.push_str("|]"),
      _ => out.push(c),
    }
  }
  out
}
