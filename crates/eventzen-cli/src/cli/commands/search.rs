//! Search command handler.

use anyhow::Result;
use eventzen_tui::search;
use tracing::info;

pub fn run(query: &str) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        anyhow::bail!("Search query is empty");
    }
    info!(query, "search submitted");
    println!("{}", search::acknowledgment(query));
    Ok(())
}
