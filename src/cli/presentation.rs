//! CLI presentation: text and json formatters per command family.

mod repository;
mod shared;
mod status;
mod treat;

pub use repository::{format_info_result_text, format_init_result_text, format_update_result_text};
pub use shared::{format_section_heading, format_state, to_json};
pub use status::{
    format_clean_result_text, format_status_result_text, format_status_show_text,
    format_verify_result_text,
};
pub use treat::format_treat_result_text;
