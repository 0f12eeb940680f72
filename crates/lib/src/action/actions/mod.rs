//! Built-in action handlers.
//!
//! Each handler is a thin wrapper around one external tool invocation,
//! run through [`crate::run::CommandRunner`] with output forwarded to tracing.

mod build;
mod clean;
mod help;

pub use build::BuildAction;
pub use clean::CleanAction;
pub use help::HelpAction;
pub use test::TestAction;

use tracing::error;

use super::ActionError;

/// Turn an action's internal result into its exit code, logging failures.
pub(crate) fn exit_code(result: Result<i32, ActionError>) -> i32 {
  match result {
    Ok(code) => code,
    Err(err) => {
      error!("{err}");
      1
    }
  }
}
