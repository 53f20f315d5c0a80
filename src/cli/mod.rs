//! CLI command handling

pub mod classify;
pub mod handle;
pub mod input;
pub mod output;

pub use classify::*;
pub use handle::{handle_event, HandleArgs};
pub use input::read_event;
pub use output::format_output;
