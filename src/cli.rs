//! CLI domain: parse, route, help, output, and presentation only.
//! No digest logic here; the route table dispatches to the access layer.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands, InspectFormat};
pub use presentation::{
    format_info_text, format_inspect_json, format_inspect_text, format_verify_text, InspectRow,
    ResourceInfo,
};
pub use route::RunContext;
