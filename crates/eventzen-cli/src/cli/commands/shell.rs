//! Interactive shell command handler.

use anyhow::{Context, Result};
use eventzen_core::config::Config;

/// Must run inside an entered tokio runtime.
pub fn run(config: &Config) -> Result<()> {
    eventzen_tui::run_shell(config).context("interactive shell failed")
}
