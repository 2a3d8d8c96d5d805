//! Command-line surface: subcommands and the interactive menu

pub mod commands;
pub mod menu;
