//! Configuration inspection commands

use anyhow::Result;
use clap::Subcommand;
use serde_json::Value;

use errbeacon_client::Dsn;
use errbeacon_core::config::sanitize;
use errbeacon_core::ports::SettingsProvider;

use crate::settings::FileSettings;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the sanitized delivery configuration
    Show,
    /// Check whether the configuration allows delivery
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        let raw = FileSettings::new(config_path).raw_config();

        match self {
            ConfigCommand::Show => {
                let Some(config) = sanitize(&raw) else {
                    println!("Telemetry is disabled (missing `enabled` flag or `dsn`).");
                    return Ok(());
                };
                println!("Remote SDK options:");
                println!(
                    "{}",
                    serde_json::to_string_pretty(&Value::Object(config.sdk_options().clone()))?
                );
                println!();
                println!("Local behavior:");
                println!("  auto hook:        {}", config.auto_hook);
                println!("  message logging:  {}", config.log_messages_enabled);
                println!("  breadcrumb limit: {}", config.breadcrumb_limit());
                match &config.js_loader_url {
                    Some(url) => println!("  loader URL:       {url}"),
                    None => println!("  loader URL:       (none)"),
                }
                Ok(())
            }
            ConfigCommand::Validate => {
                let Some(config) = sanitize(&raw) else {
                    println!("DISABLED: delivery requires `enabled` and a non-empty `dsn`.");
                    return Ok(());
                };
                match Dsn::parse(&config.dsn) {
                    Ok(dsn) => {
                        println!("OK: reports go to project {}", dsn.project_id());
                        println!("    endpoint {}", dsn.store_url());
                    }
                    Err(err) => {
                        println!("INVALID: {err}");
                    }
                }
                Ok(())
            }
        }
    }
}
