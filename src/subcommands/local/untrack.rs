//! `untrack` subcommand.

use crate::{ctx::StContext, errors::StResult, git::RepositoryExt};
use clap::Args;
use nu_ansi_term::Color;

/// CLI arguments for the `untrack` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct UntrackCmd {
    /// Name of the branch to untrack. Defaults to the current branch.
    #[clap(index = 1)]
    branch_name: Option<String>,
}

impl UntrackCmd {
    /// Run the `untrack` subcommand.
    pub fn run(self, mut ctx: StContext<'_>) -> StResult<()> {
        let branch_name = match self.branch_name {
            Some(name) => name,
            None => ctx.repository.current_branch_name()?,
        };

        let children = ctx.untrack(&branch_name)?;

        println!("Untracked `{}`.", Color::Blue.paint(&branch_name));
        for child in children {
            println!("Re-linked `{}` to the parent of `{}`.", child, branch_name);
        }
        Ok(())
    }
}
