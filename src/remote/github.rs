//! [RemoteApi] implementation for GitHub, backed by [octocrab].

use super::{CommentInfo, CommentPage, NewPullRequest, PullRequestInfo, RemoteApi};
use crate::{
    constants::COMMENTS_PER_PAGE,
    errors::{StError, StResult},
};
use async_trait::async_trait;
use octocrab::{
    models::{issues::Comment, pulls::PullRequest, CommentId},
    Octocrab,
};
use std::{future::Future, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// A GitHub client scoped to a single repository.
///
/// Every call is bounded by a client-side timeout and aborted if the cancellation token fires.
/// Calls are never retried.
pub struct GitHubRemote {
    client: Octocrab,
    owner: String,
    repo: String,
    timeout: Duration,
    cancel: CancellationToken,
}

impl GitHubRemote {
    /// Creates a new [GitHubRemote] for `owner/repo`, authenticated with `token`.
    pub fn new(
        token: String,
        owner: String,
        repo: String,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> StResult<Self> {
        let client = Octocrab::builder().personal_token(token).build()?;
        Ok(Self {
            client,
            owner,
            repo,
            timeout,
            cancel,
        })
    }

    /// Runs `fut` under the client timeout and cancellation token.
    async fn call<T, F>(&self, op: &'static str, fut: F) -> StResult<T>
    where
        F: Future<Output = octocrab::Result<T>> + Send,
    {
        trace!(op, owner = %self.owner, repo = %self.repo, "GitHub API call");
        tokio::select! {
            _ = self.cancel.cancelled() => Err(StError::Cancelled(op)),
            res = tokio::time::timeout(self.timeout, fut) => match res {
                Ok(res) => res.map_err(Into::into),
                Err(_) => Err(StError::ApiTimeout { op, secs: self.timeout.as_secs() }),
            },
        }
    }
}

/// Returns `true` if `err` is a GitHub `404 Not Found` response.
fn is_not_found(err: &StError) -> bool {
    matches!(
        err,
        StError::Octocrab(octocrab::Error::GitHub { source, .. })
            if source.status_code.as_u16() == 404
    )
}

impl From<PullRequest> for PullRequestInfo {
    fn from(pr: PullRequest) -> Self {
        Self {
            number: pr.number,
            base: pr.base.ref_field,
            head: pr.head.ref_field,
            url: pr.html_url.map(|u| u.to_string()),
            draft: pr.draft.unwrap_or_default(),
        }
    }
}

impl From<Comment> for CommentInfo {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id.0,
            body: comment.body.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl RemoteApi for GitHubRemote {
    async fn get_pull(&self, number: u64) -> StResult<Option<PullRequestInfo>> {
        let pulls = self.client.pulls(&self.owner, &self.repo);
        match self.call("get_pull", pulls.get(number)).await {
            Ok(pr) => Ok(Some(pr.into())),
            Err(e) if is_not_found(&e) => {
                debug!(number, "Pull request not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn create_pull(&self, request: NewPullRequest) -> StResult<PullRequestInfo> {
        let pulls = self.client.pulls(&self.owner, &self.repo);
        let create = pulls
            .create(request.title, request.head, request.base)
            .body(request.body)
            .draft(request.draft)
            .send();
        Ok(self.call("create_pull", create).await?.into())
    }

    async fn update_pull_base(&self, number: u64, base: &str) -> StResult<PullRequestInfo> {
        let pulls = self.client.pulls(&self.owner, &self.repo);
        let update = pulls.update(number).base(base).send();
        Ok(self.call("update_pull_base", update).await?.into())
    }

    async fn list_comments(&self, number: u64, page: u32) -> StResult<CommentPage> {
        let issues = self.client.issues(&self.owner, &self.repo);
        let list = issues
            .list_comments(number)
            .per_page(COMMENTS_PER_PAGE)
            .page(page)
            .send();
        let page = self.call("list_comments", list).await?;

        Ok(CommentPage {
            has_next: page.next.is_some(),
            comments: page.items.into_iter().map(Into::into).collect(),
        })
    }

    async fn create_comment(&self, number: u64, body: &str) -> StResult<CommentInfo> {
        let issues = self.client.issues(&self.owner, &self.repo);
        let create = issues.create_comment(number, body);
        Ok(self.call("create_comment", create).await?.into())
    }

    async fn update_comment(&self, id: u64, body: &str) -> StResult<CommentInfo> {
        let issues = self.client.issues(&self.owner, &self.repo);
        let update = issues.update_comment(CommentId(id), body);
        Ok(self.call("update_comment", update).await?.into())
    }
}
