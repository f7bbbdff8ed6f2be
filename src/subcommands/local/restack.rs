//! `restack` subcommand.

use crate::{ctx::StContext, errors::StResult, restack::RebaseMode};
use clap::Args;
use nu_ansi_term::Color;

/// CLI arguments for the `restack` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct RestackCmd {
    /// Pass `--update-refs` to `git rebase`, moving branches embedded in each rebased range.
    #[clap(long)]
    update_refs: bool,
}

impl RestackCmd {
    /// Run the `restack` subcommand.
    pub fn run(self, ctx: StContext<'_>) -> StResult<()> {
        let mode = if self.update_refs {
            RebaseMode::UpdateRefs
        } else {
            RebaseMode::Plain
        };

        let restacked = ctx.restack_current(mode)?;
        if restacked.is_empty() {
            println!("Stack is up to date.");
        }
        for branch in restacked {
            println!("Restacked `{}`.", Color::Green.paint(branch));
        }
        Ok(())
    }
}
