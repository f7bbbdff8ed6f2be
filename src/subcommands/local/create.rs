//! `create` subcommand.

use crate::{ctx::StContext, errors::StResult, git::RepositoryExt};
use clap::Args;
use nu_ansi_term::Color;

/// CLI arguments for the `create` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct CreateCmd {
    /// Name of the new branch to create.
    #[clap(index = 1)]
    branch_name: Option<String>,
    /// Commit staged changes to the new branch with this message.
    #[clap(short, long)]
    message: Option<String>,
    /// Stage every change in the working tree before committing. Requires `--message`.
    #[clap(short, long, requires = "message")]
    all: bool,
}

impl CreateCmd {
    /// Run the `create` subcommand.
    pub fn run(self, mut ctx: StContext<'_>) -> StResult<()> {
        let parent = ctx.repository.current_branch_name()?;

        // Prompt the user for the name of their new branch, or use the provided name.
        let branch_name = match self.branch_name {
            Some(name) => name,
            None => inquire::Text::new("Name of new branch:").prompt()?,
        };

        if self.all {
            ctx.repository.stage_all()?;
        }
        ctx.create_branch(&branch_name, self.message.as_deref())?;

        println!(
            "Created and tracked new branch `{}` on top of `{}`.",
            Color::Green.paint(&branch_name),
            Color::Yellow.paint(&parent)
        );
        Ok(())
    }
}
