//! An in-memory [RemoteApi] that records every call, for tests.

use super::{CommentInfo, CommentPage, NewPullRequest, PullRequestInfo, RemoteApi};
use crate::errors::{StError, StResult};
use async_trait::async_trait;
use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

/// The kinds of calls made against a [FakeRemote].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Call {
    GetPull,
    CreatePull,
    UpdatePullBase,
    ListComments,
    CreateComment,
    UpdateComment,
}

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub(crate) pulls: BTreeMap<u64, PullRequestInfo>,
    /// Comments keyed by pull request number.
    pub(crate) comments: BTreeMap<u64, Vec<CommentInfo>>,
    pub(crate) calls: Vec<Call>,
    pub(crate) next_pull: u64,
    pub(crate) next_comment: u64,
    /// Calls of these kinds fail with a timeout.
    pub(crate) failing: Vec<Call>,
}

/// An in-memory remote. Comments are served two per page to exercise pagination.
#[derive(Debug)]
pub(crate) struct FakeRemote {
    state: Mutex<FakeState>,
}

impl Default for FakeRemote {
    fn default() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_pull: 1,
                next_comment: 1000,
                ..Default::default()
            }),
        }
    }
}

impl FakeRemote {
    const PAGE_SIZE: usize = 2;

    pub(crate) fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Returns how many calls of `kind` were made.
    pub(crate) fn count(&self, kind: Call) -> usize {
        self.state().calls.iter().filter(|c| **c == kind).count()
    }

    /// Returns the number of mutating calls made.
    pub(crate) fn mutations(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    Call::CreatePull | Call::UpdatePullBase | Call::CreateComment | Call::UpdateComment
                )
            })
            .count()
    }

    /// Seeds a pull request and returns its number.
    pub(crate) fn add_pull(&self, head: &str, base: &str) -> u64 {
        let mut state = self.state();
        let number = state.next_pull;
        state.next_pull += 1;
        state.pulls.insert(
            number,
            PullRequestInfo {
                number,
                base: base.to_string(),
                head: head.to_string(),
                url: None,
                draft: false,
            },
        );
        number
    }

    /// Seeds a comment on pull request `number` and returns its id.
    pub(crate) fn add_comment(&self, number: u64, body: &str) -> u64 {
        let mut state = self.state();
        let id = state.next_comment;
        state.next_comment += 1;
        state.comments.entry(number).or_default().push(CommentInfo {
            id,
            body: body.to_string(),
        });
        id
    }

    /// Returns the comments on pull request `number`.
    pub(crate) fn comments(&self, number: u64) -> Vec<CommentInfo> {
        self.state().comments.get(&number).cloned().unwrap_or_default()
    }

    fn record(&self, call: Call) -> StResult<MutexGuard<'_, FakeState>> {
        let mut state = self.state();
        state.calls.push(call);
        if state.failing.contains(&call) {
            return Err(StError::ApiTimeout { op: "fake", secs: 0 });
        }
        Ok(state)
    }
}

#[async_trait]
impl RemoteApi for FakeRemote {
    async fn get_pull(&self, number: u64) -> StResult<Option<PullRequestInfo>> {
        let state = self.record(Call::GetPull)?;
        Ok(state.pulls.get(&number).cloned())
    }

    async fn create_pull(&self, request: NewPullRequest) -> StResult<PullRequestInfo> {
        let mut state = self.record(Call::CreatePull)?;
        let number = state.next_pull;
        state.next_pull += 1;

        let pr = PullRequestInfo {
            number,
            base: request.base,
            head: request.head,
            url: Some(format!("https://github.com/o/r/pull/{}", number)),
            draft: request.draft,
        };
        state.pulls.insert(number, pr.clone());
        Ok(pr)
    }

    async fn update_pull_base(&self, number: u64, base: &str) -> StResult<PullRequestInfo> {
        let mut state = self.record(Call::UpdatePullBase)?;
        let pr = state
            .pulls
            .get_mut(&number)
            .ok_or_else(|| anyhow::anyhow!("no pull request #{}", number))?;
        pr.base = base.to_string();
        Ok(pr.clone())
    }

    async fn list_comments(&self, number: u64, page: u32) -> StResult<CommentPage> {
        let state = self.record(Call::ListComments)?;
        let all = state.comments.get(&number).cloned().unwrap_or_default();
        let start = (page.max(1) as usize - 1) * Self::PAGE_SIZE;

        Ok(CommentPage {
            comments: all.iter().skip(start).take(Self::PAGE_SIZE).cloned().collect(),
            has_next: all.len() > start + Self::PAGE_SIZE,
        })
    }

    async fn create_comment(&self, number: u64, body: &str) -> StResult<CommentInfo> {
        let mut state = self.record(Call::CreateComment)?;
        let id = state.next_comment;
        state.next_comment += 1;

        let comment = CommentInfo {
            id,
            body: body.to_string(),
        };
        state.comments.entry(number).or_default().push(comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, id: u64, body: &str) -> StResult<CommentInfo> {
        let mut state = self.record(Call::UpdateComment)?;
        let comment = state
            .comments
            .values_mut()
            .flatten()
            .find(|c| c.id == id)
            .ok_or_else(|| anyhow::anyhow!("no comment {}", id))?;
        comment.body = body.to_string();
        Ok(comment.clone())
    }
}
