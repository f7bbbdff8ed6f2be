//! Submission of a whole stack: restack, push, pull requests, then stack comments.

use super::StContext;
use crate::{
    constants::STACK_COMMENT_MARKER,
    errors::{StError, StResult},
    git::RepositoryExt,
    remote::{
        ensure_stack_comment, render_stack_comment, submit_branch, PrMetadataPrompt,
        PullRequestInfo, RemoteApi, SubmitOptions,
    },
    restack::{restack_branch, RebaseMode},
    store::ConfigStore,
    tree::{full_stack_for_submit, StackGraph},
};
use tracing::{debug, info, warn};

/// Options for [StContext::submit_stack].
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SubmitStackOptions {
    /// Open new pull requests as drafts.
    pub draft: bool,
    /// Restack each branch onto its parent before submitting it.
    pub restack: bool,
    /// Remote to push branches to before submitting. Branches are not pushed when [None].
    pub push_remote: Option<String>,
}

/// The outcome of submitting one branch.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SubmittedBranch {
    /// The branch name.
    pub branch: String,
    /// The parent the pull request is based on.
    pub parent: String,
    /// The branch's pull request, or [None] if it had no changes to submit.
    pub pull_request: Option<PullRequestInfo>,
    /// Whether the branch was restacked before submission.
    pub restacked: bool,
}

/// The outcome of [StContext::submit_stack].
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SubmitReport {
    /// Per-branch outcomes, in the order branches were processed.
    pub branches: Vec<SubmittedBranch>,
    /// Non-fatal inconsistencies corrected while reconciling stack comments.
    pub warnings: Vec<String>,
}

impl<'a, S: ConfigStore> StContext<'a, S> {
    /// Submits the stack containing the checked-out branch.
    ///
    /// The stack is the chain from its base to the current branch plus every descendant of the
    /// current branch. Branches are processed one at a time, each after its parent. Processing
    /// stops at the first error; branches already submitted keep their remote state. Once every
    /// pull request is reconciled, each one's stack comment is brought up to date.
    ///
    /// A stack with nothing beyond its base yields an empty report.
    pub async fn submit_stack<A, P>(
        &mut self,
        api: &A,
        prompt: &P,
        options: &SubmitStackOptions,
    ) -> StResult<SubmitReport>
    where
        A: RemoteApi + ?Sized,
        P: PrMetadataPrompt + ?Sized,
    {
        let original = self.repository.current_branch_name()?;
        let chain = self.current_chain()?;
        let (stack, graph) = full_stack_for_submit(&self.store, chain)?;
        if stack.len() <= 1 {
            debug!(branch = %original, "Nothing to submit");
            return Ok(SubmitReport::default());
        }
        if options.restack {
            self.check_cleanliness()?;
        }

        // Discovery order is not topological; put parents first before touching anything.
        let stack = graph.parent_first(&stack);
        let result = self
            .submit_in_order(api, prompt, options, &stack, &graph)
            .await;

        // A paused rebase owns the working tree until the user resolves it.
        if matches!(result, Err(StError::RebaseConflict(_))) {
            return result;
        }
        let restored = self.return_to(&original);
        let report = match (result, restored) {
            (Ok(report), Ok(())) => report,
            (Ok(_), Err(e)) => return Err(e),
            (Err(e), Ok(())) => return Err(e),
            (Err(e), Err(restore)) => {
                warn!(branch = %original, error = %restore, "Could not return to original branch");
                return Err(e);
            }
        };

        info!(
            branches = report.branches.len(),
            pull_requests = report
                .branches
                .iter()
                .filter(|b| b.pull_request.is_some())
                .count(),
            "Submitted stack"
        );
        Ok(report)
    }

    /// Restacks, pushes and submits each branch of `stack` in order, then reconciles the stack
    /// comment of every branch that has a pull request.
    async fn submit_in_order<A, P>(
        &mut self,
        api: &A,
        prompt: &P,
        options: &SubmitStackOptions,
        stack: &[String],
        graph: &StackGraph,
    ) -> StResult<SubmitReport>
    where
        A: RemoteApi + ?Sized,
        P: PrMetadataPrompt + ?Sized,
    {
        let base = &stack[0];
        let submit_options = SubmitOptions {
            draft: options.draft,
        };

        let mut report = SubmitReport::default();
        for branch in stack {
            let Some(parent) = graph.parent(branch) else {
                continue;
            };

            let restacked = options.restack
                && restack_branch(self.repository, branch, parent, RebaseMode::Plain)?;
            if let Some(remote) = &options.push_remote {
                self.repository.push_branch(branch, remote)?;
            }

            let pull_request = submit_branch(
                &mut self.store,
                self.repository,
                api,
                prompt,
                branch,
                parent,
                submit_options,
            )
            .await?;

            report.branches.push(SubmittedBranch {
                branch: branch.clone(),
                parent: parent.to_string(),
                pull_request,
                restacked,
            });
        }

        let prs = report
            .branches
            .iter()
            .filter_map(|b| Some((b.branch.clone(), b.pull_request.as_ref()?.number)))
            .collect::<Vec<_>>();
        for (branch, number) in &prs {
            let body = render_stack_comment(STACK_COMMENT_MARKER, base, &prs, branch);
            let outcome = ensure_stack_comment(
                &mut self.store,
                api,
                branch,
                *number,
                &body,
                STACK_COMMENT_MARKER,
            )
            .await?;
            debug!(
                %branch,
                comment_id = outcome.comment_id,
                created = outcome.created,
                "Stack comment reconciled"
            );
            report.warnings.extend(outcome.warnings);
        }

        Ok(report)
    }

    /// Checks out `branch` unless it is already checked out.
    fn return_to(&self, branch: &str) -> StResult<()> {
        if self.repository.current_branch_name()? != branch {
            self.repository.checkout_branch(branch)?;
        }
        Ok(())
    }
}
