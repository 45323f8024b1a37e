use crate::core::settings::Settings;
use anyhow::{Context, Result};

pub fn run(settings: &Settings) -> Result<()> {
    settings.validate()?;

    let rendered = toml::to_string_pretty(settings).context("Failed to render settings")?;
    println!("{}", rendered.trim_end());
    println!();

    match settings.validate_endpoints() {
        Ok(()) => println!("Configuration is valid"),
        Err(e) => println!("Configuration is incomplete for the daemon: {}", e),
    }

    Ok(())
}
