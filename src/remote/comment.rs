//! Reconciliation of the stack status comment on a pull request.
//!
//! Each pull request in a stack carries one comment tagged with a marker. The marker search over
//! the live comment list is authoritative; the recorded comment id is only bookkeeping and is
//! corrected whenever it disagrees with what the search finds.

use super::RemoteApi;
use crate::{
    constants::COMMENT_ID_KEY,
    errors::{StError, StResult},
    store::{branch_key, ConfigStore},
};
use itertools::Itertools;
use tracing::{debug, error, info, warn};

/// The result of a successful [ensure_stack_comment].
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct CommentOutcome {
    /// The id of the stack comment after reconciliation.
    pub comment_id: u64,
    /// Whether a new comment was posted.
    pub created: bool,
    /// Inconsistencies that were tolerated along the way.
    pub warnings: Vec<String>,
}

/// Ensures pull request `pr_number` of `branch` carries exactly one up-to-date stack comment.
///
/// | recorded | found | action                                   |
/// |----------|-------|------------------------------------------|
/// | none     | none  | create, record new id                    |
/// | none     | F     | record F, update F                       |
/// | S        | none  | clear S, create, record new id           |
/// | S        | F ≠ S | record F, update F                       |
/// | S        | F = S | update F                                 |
///
/// Failing to read the recorded id, or to clear a stale one, is tolerated and reported in
/// [CommentOutcome::warnings]. Failing to record a new or corrected id after a successful remote
/// call is a [StError::CriticalPersistenceDrift].
pub async fn ensure_stack_comment<S, A>(
    store: &mut S,
    api: &A,
    branch: &str,
    pr_number: u64,
    body: &str,
    marker: &str,
) -> StResult<CommentOutcome>
where
    S: ConfigStore + ?Sized,
    A: RemoteApi + ?Sized,
{
    let mut warnings = Vec::new();

    let stored = match store.comment_id(branch) {
        Ok(id) => id,
        Err(e) => {
            warnings.push(format!("Could not read stack comment id for `{}`: {}", branch, e));
            None
        }
    };
    let found = find_marked_comment(api, pr_number, marker).await?;
    debug!(branch, pr_number, ?stored, ?found, "Reconciling stack comment");

    let outcome = match (stored, found) {
        (stored, None) => {
            if let Some(stale) = stored {
                info!(branch, stale, "Recorded stack comment no longer exists");
                if let Err(e) = store.clear_comment_id(branch) {
                    warnings.push(format!(
                        "Could not clear stale stack comment id {} for `{}`: {}",
                        stale, branch, e
                    ));
                }
            }

            let comment = api.create_comment(pr_number, body).await?;
            info!(branch, pr_number, id = comment.id, "Posted stack comment");
            record(store, branch, comment.id, "Posting stack comment")?;
            CommentOutcome {
                comment_id: comment.id,
                created: true,
                warnings,
            }
        }
        (stored, Some(found)) => {
            if stored != Some(found) {
                debug!(branch, ?stored, found, "Correcting recorded stack comment id");
                record(store, branch, found, "Locating stack comment")?;
            }

            api.update_comment(found, body).await?;
            CommentOutcome {
                comment_id: found,
                created: false,
                warnings,
            }
        }
    };

    for warning in &outcome.warnings {
        warn!("{}", warning);
    }
    Ok(outcome)
}

/// Records `id` as the stack comment of `branch`, escalating failure to a persistence drift error.
fn record<S: ConfigStore + ?Sized>(
    store: &mut S,
    branch: &str,
    id: u64,
    action: &str,
) -> StResult<()> {
    store.set_comment_id(branch, id).map_err(|e| {
        let key = branch_key(branch, COMMENT_ID_KEY);
        error!(branch, id, %key, error = %e, "Failed to record stack comment id");
        StError::CriticalPersistenceDrift {
            action: action.to_string(),
            branch: branch.to_string(),
            key,
            value: id.to_string(),
            source: Box::new(e),
        }
    })
}

/// Pages through the comments of `pr_number` in order and returns the id of the first one whose
/// body contains `marker`.
async fn find_marked_comment<A: RemoteApi + ?Sized>(
    api: &A,
    pr_number: u64,
    marker: &str,
) -> StResult<Option<u64>> {
    let mut page = 1;
    loop {
        let comments = api.list_comments(pr_number, page).await?;
        if let Some(comment) = comments.comments.iter().find(|c| c.body.contains(marker)) {
            return Ok(Some(comment.id));
        }
        if !comments.has_next {
            return Ok(None);
        }
        page += 1;
    }
}

/// Renders the stack status comment for `current` within `stack`.
///
/// `stack` lists `(branch, pr_number)` pairs ordered base to tip; it is rendered tip first, with
/// `base` at the bottom.
pub fn render_stack_comment(
    marker: &str,
    base: &str,
    stack: &[(String, u64)],
    current: &str,
) -> String {
    let entries = stack
        .iter()
        .rev()
        .map(|(branch, number)| {
            let pointer = (branch == current).then_some(" 👈").unwrap_or_default();
            format!("* **#{}**{}", number, pointer)
        })
        .join("\n");

    format!(
        "{}\n### 📚 Stack\n\n{}\n* `{}`\n\n<sub>Managed by `socle`. Do not edit this comment.</sub>\n",
        marker, entries, base
    )
}

#[cfg(test)]
mod test {
    use super::{ensure_stack_comment, render_stack_comment};
    use crate::{
        errors::StError,
        remote::fake::{Call, FakeRemote},
        store::{ConfigStore, MemoryStore},
    };

    const MARKER: &str = "<!-- marker -->";

    fn body(text: &str) -> String {
        format!("{}\n{}", MARKER, text)
    }

    #[tokio::test]
    async fn creates_when_nothing_exists() {
        let api = FakeRemote::default();
        let mut store = MemoryStore::default();

        let outcome = ensure_stack_comment(&mut store, &api, "a", 1, &body("v1"), MARKER)
            .await
            .unwrap();
        assert!(outcome.created);
        assert!(outcome.warnings.is_empty());
        assert_eq!(store.comment_id("a").unwrap(), Some(outcome.comment_id));
        assert_eq!(api.comments(1).len(), 1);
    }

    #[tokio::test]
    async fn adopts_an_unrecorded_comment() {
        let api = FakeRemote::default();
        let found = api.add_comment(1, &body("old"));
        let mut store = MemoryStore::default();

        let outcome = ensure_stack_comment(&mut store, &api, "a", 1, &body("new"), MARKER)
            .await
            .unwrap();
        assert!(!outcome.created);
        assert_eq!(outcome.comment_id, found);
        assert_eq!(store.comment_id("a").unwrap(), Some(found));
        assert_eq!(api.comments(1)[0].body, body("new"));
        assert_eq!(api.count(Call::CreateComment), 0);
    }

    #[tokio::test]
    async fn replaces_a_stale_id_then_converges() {
        let api = FakeRemote::default();
        api.add_comment(1, "unrelated");
        let mut store = MemoryStore::default();
        store.set_comment_id("a", 555).unwrap();

        let first = ensure_stack_comment(&mut store, &api, "a", 1, &body("v1"), MARKER)
            .await
            .unwrap();
        assert!(first.created);
        assert_ne!(first.comment_id, 555);
        assert_eq!(store.comment_id("a").unwrap(), Some(first.comment_id));
        assert_eq!(api.count(Call::CreateComment), 1);

        ensure_stack_comment(&mut store, &api, "a", 1, &body("v2"), MARKER)
            .await
            .unwrap();
        let third = ensure_stack_comment(&mut store, &api, "a", 1, &body("v3"), MARKER)
            .await
            .unwrap();
        assert!(!third.created);
        assert_eq!(third.comment_id, first.comment_id);
        assert_eq!(api.count(Call::CreateComment), 1);
        assert_eq!(api.count(Call::UpdateComment), 2);
        assert_eq!(api.comments(1).len(), 2);
    }

    #[tokio::test]
    async fn corrects_a_drifted_id() {
        let api = FakeRemote::default();
        let stale = api.add_comment(1, "unrelated");
        let found = api.add_comment(1, &body("v1"));
        let mut store = MemoryStore::default();
        store.set_comment_id("a", stale).unwrap();

        let outcome = ensure_stack_comment(&mut store, &api, "a", 1, &body("v2"), MARKER)
            .await
            .unwrap();
        assert_eq!(outcome.comment_id, found);
        assert_eq!(store.comment_id("a").unwrap(), Some(found));
        assert_eq!(api.comments(1)[0].body, "unrelated");
    }

    #[tokio::test]
    async fn searches_every_page() {
        let api = FakeRemote::default();
        for i in 0..5 {
            api.add_comment(7, &format!("chatter {}", i));
        }
        let found = api.add_comment(7, &body("v1"));
        let mut store = MemoryStore::default();

        let outcome = ensure_stack_comment(&mut store, &api, "a", 7, &body("v2"), MARKER)
            .await
            .unwrap();
        assert_eq!(outcome.comment_id, found);
        assert_eq!(api.count(Call::ListComments), 3);
    }

    #[tokio::test]
    async fn tolerates_read_and_clear_failures() {
        let api = FakeRemote::default();
        let mut store = MemoryStore {
            fail_get: true,
            ..Default::default()
        };
        let outcome = ensure_stack_comment(&mut store, &api, "a", 1, &body("v1"), MARKER)
            .await
            .unwrap();
        assert!(outcome.created);
        assert_eq!(outcome.warnings.len(), 1);

        let api = FakeRemote::default();
        let mut store = MemoryStore {
            fail_unset: true,
            ..Default::default()
        };
        store.set_comment_id("a", 555).unwrap();
        let outcome = ensure_stack_comment(&mut store, &api, "a", 1, &body("v1"), MARKER)
            .await
            .unwrap();
        assert!(outcome.created);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(store.comment_id("a").unwrap(), Some(outcome.comment_id));
    }

    #[tokio::test]
    async fn failing_to_record_is_critical() {
        let api = FakeRemote::default();
        let mut store = MemoryStore {
            fail_set: true,
            ..Default::default()
        };

        let err = ensure_stack_comment(&mut store, &api, "a", 1, &body("v1"), MARKER)
            .await
            .unwrap_err();
        assert!(matches!(err, StError::CriticalPersistenceDrift { .. }));
        assert_eq!(api.count(Call::CreateComment), 1);
    }

    #[tokio::test]
    async fn api_failures_are_fatal() {
        let api = FakeRemote::default();
        api.state().failing.push(Call::CreateComment);
        let mut store = MemoryStore::default();

        assert!(ensure_stack_comment(&mut store, &api, "a", 1, &body("v1"), MARKER)
            .await
            .is_err());
        assert_eq!(store.comment_id("a").unwrap(), None);
    }

    #[test]
    fn renders_tip_first_with_pointer() {
        let stack = vec![("a".to_string(), 1), ("b".to_string(), 2)];
        let rendered = render_stack_comment(MARKER, "main", &stack, "a");

        assert!(rendered.starts_with(MARKER));
        let b = rendered.find("**#2**").unwrap();
        let a = rendered.find("**#1** 👈").unwrap();
        let main = rendered.find("`main`").unwrap();
        assert!(b < a && a < main);
    }
}
