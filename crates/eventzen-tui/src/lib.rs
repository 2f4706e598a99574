//! Full-screen EventZen shell.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod overlays;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, Write, stderr, stdout};

use anyhow::Result;
use eventzen_core::config::Config;
pub use features::{auth, location, nav, search};
pub use runtime::{Services, ShellRuntime};
use tracing::info;

/// Runs the interactive shell until the user quits.
///
/// # Errors
/// Returns an error if stdout is not a terminal, a client cannot be built
/// from the config, or the terminal fails.
pub fn run_shell(config: &Config) -> Result<()> {
    if !stdout().is_terminal() {
        anyhow::bail!(
            "The EventZen shell requires a terminal.\n\
             Use `eventzen locate` or `eventzen search <query>` for non-interactive use."
        );
    }

    let services = Services::from_config(config)?;
    info!(
        location_source = config.location.source.display_name(),
        "starting shell"
    );

    let mut runtime = ShellRuntime::new(services)?;
    runtime.run()?;
    drop(runtime);

    writeln!(stderr(), "Goodbye!")?;
    Ok(())
}
