//! Initialize command.

use console::style;

use autoverify::config::Settings;
use autoverify::repository::{redact_url_password, DbContext};

/// Create the database schema.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    let ctx = DbContext::from_url(&settings.database_url)?;
    ctx.init_schema().await?;

    println!(
        "{} Initialized schema in {}",
        style("✓").green(),
        redact_url_password(&settings.database_url)
    );

    Ok(())
}
