//! CLI command handlers.

pub mod config;
pub mod locate;
pub mod login;
pub mod search;
pub mod shell;
