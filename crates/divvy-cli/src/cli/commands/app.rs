//! Default command: the interactive app.

use anyhow::Result;
use divvy_core::config::Config;

pub async fn run(config: &Config, deep_link_code: Option<String>) -> Result<()> {
    divvy_tui::run(config, deep_link_code).await
}
