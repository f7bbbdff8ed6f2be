//! `submit` subcommand.

use crate::{
    config::SocleConfig,
    ctx::{StContext, SubmitReport, SubmitStackOptions},
    errors::StResult,
    git::RepositoryExt,
    remote::{GitHubRemote, InteractivePrompt, PrMetadataPrompt, ScriptedPrompt},
};
use clap::Args;
use nu_ansi_term::Color;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// CLI arguments for the `submit` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct SubmitCmd {
    /// Open new pull requests as drafts.
    #[clap(long)]
    draft: bool,
    /// Restack each branch onto its parent before submitting it.
    #[clap(long)]
    restack: bool,
    /// Do not push branches to the remote before submitting.
    #[clap(long)]
    no_push: bool,
    /// Title new pull requests after their branch and leave the body empty, without prompting.
    #[clap(long)]
    no_prompt: bool,
    /// GitHub personal access token. Overrides the token in the settings file.
    #[clap(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

impl SubmitCmd {
    /// Run the `submit` subcommand.
    pub async fn run(self, mut ctx: StContext<'_>) -> StResult<()> {
        let config = SocleConfig::load()?;
        let token = config.token(self.token.as_deref())?;
        let (owner, repo) = ctx.repository.owner_and_repository(&config.remote)?;

        // Interrupting the process aborts the in-flight API call.
        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        let api = GitHubRemote::new(
            token,
            owner.clone(),
            repo.clone(),
            config.api_timeout(),
            cancel,
        )?;
        let options = SubmitStackOptions {
            draft: self.draft || config.draft,
            restack: self.restack || config.restack,
            push_remote: (!self.no_push).then(|| config.remote.clone()),
        };
        debug!(?options, %owner, %repo, "Submitting stack");

        let scripted = ScriptedPrompt::default();
        let prompt: &dyn PrMetadataPrompt = if self.no_prompt {
            &scripted
        } else {
            &InteractivePrompt
        };
        let report = ctx.submit_stack(&api, prompt, &options).await?;
        Self::print_report(&report, &owner, &repo);
        Ok(())
    }

    /// Prints one line per submitted branch, followed by any warnings.
    fn print_report(report: &SubmitReport, owner: &str, repo: &str) {
        if report.branches.is_empty() {
            println!("Nothing to submit. Track a branch on top of another with `socle track`.");
            return;
        }

        for submitted in &report.branches {
            let restacked = if submitted.restacked {
                " (restacked)"
            } else {
                ""
            };
            match &submitted.pull_request {
                Some(pr) => {
                    let link = pr.url.clone().unwrap_or_else(|| {
                        format!("https://github.com/{}/{}/pull/{}", owner, repo, pr.number)
                    });
                    let draft = if pr.draft { " (draft)" } else { "" };
                    println!(
                        "`{}` -> `{}`{}{} @ {}",
                        Color::Green.paint(&pr.head),
                        Color::Yellow.paint(&pr.base),
                        draft,
                        restacked,
                        Color::Blue.paint(link)
                    );
                }
                None => println!(
                    "`{}` has no changes against `{}`; skipped.{}",
                    Color::Green.paint(&submitted.branch),
                    Color::Yellow.paint(&submitted.parent),
                    restacked
                ),
            }
        }

        for warning in &report.warnings {
            println!("{} {}", Color::Yellow.bold().paint("warning:"), warning);
        }
    }
}
