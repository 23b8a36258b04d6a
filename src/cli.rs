//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to the workspace service.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat, StatusCommands, TreatTarget};
pub use presentation::{
    format_clean_result_text, format_info_result_text, format_init_result_text,
    format_section_heading, format_state, format_status_result_text, format_status_show_text,
    format_treat_result_text, format_update_result_text, format_verify_result_text, to_json,
};
pub use route::RunContext;
