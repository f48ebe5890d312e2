//! Command-name contract for logging spans.

use crate::cli::parse::Commands;

/// Command name string used as the `command` field of CLI log events.
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init { .. } => "init",
        Commands::Info { .. } => "info",
        Commands::Inspect { .. } => "inspect",
        Commands::Verify { .. } => "verify",
        Commands::Demo { .. } => "demo",
    }
}
