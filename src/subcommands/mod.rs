//! The subcommands for the `socle` application.

use crate::{ctx::StContext, errors::StResult};
use clap::Subcommand;

mod local;
use local::{CheckoutCmd, ConfigCmd, CreateCmd, LogCmd, RestackCmd, TrackCmd, UntrackCmd};

mod remote;
use remote::SubmitCmd;

#[derive(Debug, Clone, Eq, PartialEq, Subcommand)]
pub enum Subcommands {
    /// Print a tree of all tracked stacks.
    #[clap(aliases = ["l", "ls"])]
    Log(LogCmd),
    /// Checkout a branch that is tracked with `socle`.
    #[clap(alias = "co")]
    Checkout(CheckoutCmd),
    /// Create a new branch on top of the current one, and track it.
    #[clap(alias = "c")]
    Create(CreateCmd),
    /// Track the current branch on top of a parent branch.
    #[clap(alias = "tr")]
    Track(TrackCmd),
    /// Stop tracking a branch. Its children are re-linked to its parent.
    #[clap(alias = "ut")]
    Untrack(UntrackCmd),
    /// Rebase every branch of the current stack that has fallen behind its parent.
    #[clap(alias = "r")]
    Restack(RestackCmd),
    /// Write the user settings file, prompting for each value.
    Config(ConfigCmd),
    /// Submit the current stack to GitHub, opening or re-basing a pull request per branch.
    #[clap(alias = "s")]
    Submit(SubmitCmd),
}

impl Subcommands {
    /// Run the subcommand with the given context.
    pub async fn run(self, ctx: StContext<'_>) -> StResult<()> {
        match self {
            Self::Log(args) => args.run(ctx),
            Self::Checkout(args) => args.run(ctx),
            Self::Create(args) => args.run(ctx),
            Self::Track(args) => args.run(ctx),
            Self::Untrack(args) => args.run(ctx),
            Self::Restack(args) => args.run(ctx),
            Self::Config(args) => args.run(ctx),
            Self::Submit(args) => args.run(ctx).await,
        }
    }
}
