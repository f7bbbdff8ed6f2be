//! Reconciliation of a branch's pull request against the remote.

use super::{NewPullRequest, PrMetadataPrompt, PullRequestInfo, RemoteApi};
use crate::{
    constants::PR_NUMBER_KEY,
    errors::{StError, StResult},
    git::RepositoryExt,
    store::{branch_key, ConfigStore},
};
use git2::Repository;
use tracing::{debug, error, info};

/// Options for [submit_branch].
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct SubmitOptions {
    /// Open new pull requests as drafts.
    pub draft: bool,
}

/// Ensures `branch` has an open pull request based on `parent`.
///
/// 1. If a pull request number is recorded, fetch it. If the remote no longer knows it, the record
///    is cleared and submission falls through to creation. Otherwise its base is corrected to
///    `parent` if needed, and it is returned.
/// 2. If `branch` has no content difference from `parent`, nothing is created and [None] is
///    returned; hosts refuse empty pull requests.
/// 3. Otherwise a title and body are collected from `prompt`, the pull request is opened, and its
///    number is recorded.
///
/// Every read and existence check happens before any mutating call, so re-submitting an
/// unchanged branch performs no writes.
///
/// ## Returns
/// - `Ok(Some(_))` - The branch's pull request.
/// - `Ok(None)` - The branch has nothing to submit.
/// - `Err(StError::CriticalPersistenceDrift)` - The pull request was created remotely but its
///   number could not be recorded.
/// - `Err(_)` - Any other failure.
pub async fn submit_branch<S, A, P>(
    store: &mut S,
    repository: &Repository,
    api: &A,
    prompt: &P,
    branch: &str,
    parent: &str,
    options: SubmitOptions,
) -> StResult<Option<PullRequestInfo>>
where
    S: ConfigStore + ?Sized,
    A: RemoteApi + ?Sized,
    P: PrMetadataPrompt + ?Sized,
{
    if let Some(number) = store.pr_number(branch)? {
        match api.get_pull(number).await? {
            Some(pr) if pr.base == parent => {
                debug!(branch, number, "Pull request is up to date");
                return Ok(Some(pr));
            }
            Some(pr) => {
                info!(branch, number, from = %pr.base, to = parent, "Updating pull request base");
                return api.update_pull_base(number, parent).await.map(Some);
            }
            None => {
                info!(branch, number, "Recorded pull request no longer exists; clearing it");
                store.clear_pr_number(branch)?;
            }
        }
    }

    if !repository.has_diff(parent, branch)? {
        info!(branch, parent, "No changes against parent; skipping pull request");
        return Ok(None);
    }

    let metadata = prompt.pr_metadata(branch, parent)?;
    let pr = api
        .create_pull(NewPullRequest {
            title: metadata.title,
            body: metadata.body,
            head: branch.to_string(),
            base: parent.to_string(),
            draft: options.draft,
        })
        .await?;
    info!(branch, number = pr.number, "Opened pull request");

    if let Err(e) = store.set_pr_number(branch, pr.number) {
        let key = branch_key(branch, PR_NUMBER_KEY);
        error!(branch, number = pr.number, %key, error = %e, "Failed to record pull request number");
        return Err(StError::CriticalPersistenceDrift {
            action: format!("Opening pull request #{}", pr.number),
            branch: branch.to_string(),
            key,
            value: pr.number.to_string(),
            source: Box::new(e),
        });
    }

    Ok(Some(pr))
}
