//! `track` subcommand.

use crate::{ctx::StContext, errors::StResult, git::RepositoryExt};
use clap::Args;
use nu_ansi_term::Color;

/// CLI arguments for the `track` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct TrackCmd {
    /// Name of the parent branch. Prompted for if omitted.
    #[clap(index = 1)]
    parent: Option<String>,
}

impl TrackCmd {
    /// Run the `track` subcommand.
    pub fn run(self, mut ctx: StContext<'_>) -> StResult<()> {
        let current = ctx.repository.current_branch_name()?;

        // Prompt the user to select the parent branch, or use the provided name.
        let parent = match self.parent {
            Some(parent) => parent,
            None => {
                let candidates = ctx
                    .repository
                    .local_branch_names()?
                    .into_iter()
                    .filter(|b| *b != current)
                    .collect::<Vec<_>>();
                let prompt = format!("Select the parent of `{}`", Color::Blue.paint(&current));
                inquire::Select::new(prompt.as_str(), candidates).prompt()?
            }
        };

        ctx.track(&current, &parent)?;

        println!(
            "Tracked `{}` on top of `{}`.",
            Color::Green.paint(&current),
            Color::Yellow.paint(&parent)
        );
        if ctx.needs_restack(&current)? {
            println!("`{}` needs restacking. Run `socle restack`.", current);
        }
        Ok(())
    }
}
