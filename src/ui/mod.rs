//! Chat UI components for the terminal interface

pub mod app;
pub mod commands;
pub mod composer;
pub mod history;

pub use commands::{ParsedCommand, SlashCommand, get_help_text};
pub use composer::Composer;
pub use history::HistoryView;
