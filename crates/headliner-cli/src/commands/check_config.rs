use anyhow::Result;

use headliner_core::AppConfig;

pub fn run(config: &AppConfig) -> Result<()> {
    println!("{}\n", config.summary());
    config.validate()?;
    println!("Configuration is valid.");
    Ok(())
}
