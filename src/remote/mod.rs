//! The remote code-hosting surface used by `socle`, and the reconcilers that keep local records
//! in step with it.

use crate::errors::StResult;
use async_trait::async_trait;

mod github;
pub use github::GitHubRemote;

mod prompt;
pub use prompt::{InteractivePrompt, PrMetadataPrompt, ScriptedPrompt};

mod submit;
pub use submit::{submit_branch, SubmitOptions};

mod comment;
pub use comment::{ensure_stack_comment, render_stack_comment};

#[cfg(test)]
pub(crate) mod fake;

/// A pull request, as seen by `socle`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PullRequestInfo {
    /// The pull request number.
    pub number: u64,
    /// The name of the branch the pull request merges into.
    pub base: String,
    /// The name of the branch the pull request merges from.
    pub head: String,
    /// The web URL of the pull request, if the remote reported one.
    pub url: Option<String>,
    /// Whether the pull request is a draft.
    pub draft: bool,
}

/// A request to open a new pull request.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NewPullRequest {
    /// Title of the pull request.
    pub title: String,
    /// Body of the pull request.
    pub body: String,
    /// Branch to merge from.
    pub head: String,
    /// Branch to merge into.
    pub base: String,
    /// Whether to open the pull request as a draft.
    pub draft: bool,
}

/// A comment on a pull request.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CommentInfo {
    /// The comment id.
    pub id: u64,
    /// The comment body.
    pub body: String,
}

/// One page of a pull request's comments.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct CommentPage {
    /// The comments on this page.
    pub comments: Vec<CommentInfo>,
    /// Whether another page follows.
    pub has_next: bool,
}

/// The operations `socle` performs against a code-hosting service.
///
/// Pages are numbered from 1.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Fetches pull request `number`. Returns [None] if the remote reports it does not exist.
    async fn get_pull(&self, number: u64) -> StResult<Option<PullRequestInfo>>;

    /// Opens a new pull request.
    async fn create_pull(&self, request: NewPullRequest) -> StResult<PullRequestInfo>;

    /// Changes the base branch of pull request `number`.
    async fn update_pull_base(&self, number: u64, base: &str) -> StResult<PullRequestInfo>;

    /// Lists one page of the comments on pull request `number`.
    async fn list_comments(&self, number: u64, page: u32) -> StResult<CommentPage>;

    /// Posts a new comment on pull request `number`.
    async fn create_comment(&self, number: u64, body: &str) -> StResult<CommentInfo>;

    /// Replaces the body of comment `id`.
    async fn update_comment(&self, id: u64, body: &str) -> StResult<CommentInfo>;
}
