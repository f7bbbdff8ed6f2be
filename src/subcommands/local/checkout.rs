//! `checkout` subcommand.

use crate::{ctx::StContext, errors::StResult, git::RepositoryExt};
use clap::Args;

/// CLI arguments for the `checkout` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct CheckoutCmd {
    /// Name of the branch to check out.
    #[clap(index = 1)]
    branch_name: Option<String>,
}

impl CheckoutCmd {
    /// Run the `checkout` subcommand.
    pub fn run(self, ctx: StContext<'_>) -> StResult<()> {
        let branch_name = match self.branch_name {
            Some(name) => name,
            None => {
                let branches = ctx.display_branches()?;
                inquire::Select::new("Select a branch to checkout", branches)
                    .with_formatter(&|f| f.value.branch_name.clone())
                    .prompt()?
                    .branch_name
            }
        };

        ctx.repository.checkout_branch(&branch_name)
    }
}
