//! Snippet rendering command

use anyhow::Result;
use clap::Args;

use errbeacon_core::config::sanitize;
use errbeacon_core::ports::SettingsProvider;
use errbeacon_core::scope::UserIdentity;
use errbeacon_inject::{build_snippet, ViewerSession};

use crate::settings::FileSettings;

#[derive(Debug, Args)]
pub struct SnippetCommand {
    /// Render for an authenticated viewer with this user id
    #[arg(long)]
    user_id: Option<String>,

    /// Username of the authenticated viewer
    #[arg(long)]
    username: Option<String>,

    /// Treat the viewer as a guest account
    #[arg(long)]
    guest: bool,
}

impl SnippetCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        let raw = FileSettings::new(config_path).raw_config();
        let Some(config) = sanitize(&raw) else {
            println!("Telemetry is disabled, nothing to inject.");
            return Ok(());
        };

        let viewer = self.user_id.as_ref().map(|id| ViewerSession {
            user: UserIdentity {
                id: Some(id.clone()),
                username: self.username.clone(),
                ..UserIdentity::default()
            },
            authenticated: true,
            guest: self.guest,
        });

        match build_snippet(&config, viewer.as_ref()) {
            Some(snippet) => print!("{snippet}"),
            None => println!("No loader URL configured, nothing to inject."),
        }
        Ok(())
    }
}
