//! `config` subcommand.

use crate::{config::SocleConfig, ctx::StContext, errors::StResult};
use clap::Args;
use inquire::{Password, PasswordDisplayMode, Text};
use nu_ansi_term::Color;

/// CLI arguments for the `config` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct ConfigCmd;

impl ConfigCmd {
    /// Run the `config` subcommand.
    pub fn run(self, _ctx: StContext<'_>) -> StResult<()> {
        let path = SocleConfig::path()?;
        let mut config = SocleConfig::load_from(&path)?;

        // An empty answer keeps the existing token.
        let token = Password::new("GitHub personal access token:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .with_help_message("Leave empty to keep the current token.")
            .prompt()?;
        if !token.is_empty() {
            config.github_token = token;
        }
        let remote = Text::new("Remote to push to:")
            .with_default(&config.remote)
            .prompt()?;
        config.remote = remote;

        config.save_to(&path)?;
        println!(
            "Settings written to `{}`.",
            Color::Blue.paint(path.display().to_string())
        );
        Ok(())
    }
}
