//! Restack detection and rebasing.
//!
//! A branch needs restacking when its parent has moved on since it was last rebased. Rebasing is
//! delegated to the `git` binary, since `git2` cannot drive an interactive-capable rebase that the
//! user can pick up with `git rebase --continue`. A failed rebase is classified by probing the
//! on-disk rebase markers: if they are present, the rebase paused on conflicts and is left for the
//! user to resolve; otherwise it failed outright.

use crate::{
    errors::{StError, StResult},
    git::{command_output, RepositoryExt},
};
use git2::Repository;
use tracing::{debug, info, warn};

/// Returns `true` if `child` must be rebased onto the current tip of `parent`.
///
/// A branch is up to date iff its merge-base with the parent is the parent's current tip. Any other
/// merge-base means the parent advanced, or the child was never based on it.
///
/// ## Returns
/// - `Ok(bool)` - Whether `child` needs restacking.
/// - `Err(_)` - If either branch's tip or the merge-base could not be resolved. An unknown
///   relationship is never reported as "up to date".
pub fn needs_restack(repository: &Repository, parent: &str, child: &str) -> StResult<bool> {
    let parent_tip = repository.branch_tip(parent)?;
    let merge_base = repository.merge_base_of(parent, child)?;
    Ok(merge_base != parent_tip)
}

/// The flavor of rebase to perform.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum RebaseMode {
    /// `git rebase <target>`.
    #[default]
    Plain,
    /// `git rebase --update-refs <target>`, which also moves any branch refs contained within the
    /// rebased range.
    UpdateRefs,
}

impl RebaseMode {
    fn args<'a>(&self, target: &'a str) -> Vec<&'a str> {
        match self {
            RebaseMode::Plain => vec!["rebase", target],
            RebaseMode::UpdateRefs => vec!["rebase", "--update-refs", target],
        }
    }
}

/// Rebases the checked-out branch onto `target`, which may be a branch name or a commit.
///
/// ## Returns
/// - `Ok(())` - The rebase completed cleanly.
/// - `Err(StError::RebaseConflict)` - The rebase paused on conflicts. The repository is left
///   mid-rebase for the user to resolve.
/// - `Err(StError::RebaseFailed)` - The rebase failed for any other reason, with `git`'s output.
pub fn rebase_onto(repository: &Repository, target: &str, mode: RebaseMode) -> StResult<()> {
    let branch = repository.current_branch_name()?;
    let args = mode.args(target);
    debug!(%branch, target, ?mode, "Rebasing");

    let output = repository.git(&args)?;
    if output.status.success() {
        return Ok(());
    }

    if repository.rebase_in_progress() {
        warn!(%branch, target, "Rebase paused on conflicts");
        return Err(StError::RebaseConflict(branch));
    }

    Err(StError::RebaseFailed {
        target: target.to_string(),
        output: command_output(&output),
    })
}

/// Checks out `branch` and rebases it onto the current tip of `parent`, if it needs restacking.
///
/// ## Returns
/// - `Ok(true)` - The branch was rebased.
/// - `Ok(false)` - The branch was already up to date.
/// - `Err(_)` - See [rebase_onto].
pub fn restack_branch(
    repository: &Repository,
    branch: &str,
    parent: &str,
    mode: RebaseMode,
) -> StResult<bool> {
    if !needs_restack(repository, parent, branch)? {
        debug!(branch, parent, "Branch is up to date");
        return Ok(false);
    }

    let target = repository.branch_tip(parent)?.to_string();
    repository.checkout_branch(branch)?;
    rebase_onto(repository, &target, mode)?;

    info!(branch, parent, "Restacked branch");
    Ok(true)
}

#[cfg(test)]
mod test {
    use super::{needs_restack, rebase_onto, restack_branch, RebaseMode};
    use crate::{errors::StError, git::RepositoryExt, test_util::TestRepo};

    /// `main -> feature-a -> feature-b`, each with one commit, with `main` checked out.
    fn stacked_repo() -> TestRepo {
        let test = TestRepo::new();
        test.branch("feature-a");
        test.commit_file("a.txt", "a\n", "feature a");
        test.branch("feature-b");
        test.commit_file("b.txt", "b\n", "feature b");
        test.checkout("main");
        test
    }

    #[test]
    fn restack_cascades_down_the_stack() {
        let test = stacked_repo();
        let repo = &test.repo;

        assert!(!needs_restack(repo, "main", "feature-a").unwrap());
        assert!(!needs_restack(repo, "feature-a", "feature-b").unwrap());

        test.commit_file("main.txt", "main\n", "main advances");
        assert!(needs_restack(repo, "main", "feature-a").unwrap());
        assert!(!needs_restack(repo, "feature-a", "feature-b").unwrap());

        test.checkout("feature-a");
        let main_tip = repo.branch_tip("main").unwrap().to_string();
        rebase_onto(repo, &main_tip, RebaseMode::Plain).unwrap();

        assert!(!needs_restack(repo, "main", "feature-a").unwrap());
        assert!(needs_restack(repo, "feature-a", "feature-b").unwrap());

        assert!(restack_branch(repo, "feature-b", "feature-a", RebaseMode::Plain).unwrap());
        assert!(!needs_restack(repo, "feature-a", "feature-b").unwrap());
        assert!(!restack_branch(repo, "feature-b", "feature-a", RebaseMode::Plain).unwrap());
        assert_eq!(repo.current_branch_name().unwrap(), "feature-b");
    }

    #[test]
    fn update_refs_moves_embedded_branches() {
        let test = stacked_repo();
        let repo = &test.repo;
        test.commit_file("main.txt", "main\n", "main advances");

        test.checkout("feature-b");
        rebase_onto(repo, "main", RebaseMode::UpdateRefs).unwrap();

        assert!(!needs_restack(repo, "main", "feature-a").unwrap());
        assert!(!needs_restack(repo, "feature-a", "feature-b").unwrap());
    }

    #[test]
    fn conflicts_pause_the_rebase() {
        let test = TestRepo::new();
        let repo = &test.repo;
        test.branch("feature");
        test.commit_file("README.md", "feature\n", "feature edit");
        test.checkout("main");
        test.commit_file("README.md", "main\n", "main edit");

        assert!(matches!(
            restack_branch(repo, "feature", "main", RebaseMode::Plain),
            Err(StError::RebaseConflict(branch)) if branch == "feature"
        ));
        assert!(repo.rebase_in_progress());
    }

    #[test]
    fn other_failures_carry_git_output() {
        let test = stacked_repo();
        test.checkout("feature-a");

        match rebase_onto(&test.repo, "does-not-exist", RebaseMode::Plain) {
            Err(StError::RebaseFailed { target, output }) => {
                assert_eq!(target, "does-not-exist");
                assert!(!output.is_empty());
            }
            other => panic!("expected RebaseFailed, got {:?}", other),
        }
        assert!(!test.repo.rebase_in_progress());
    }

    #[test]
    fn unknown_relationships_are_errors() {
        let test = stacked_repo();
        assert!(matches!(
            needs_restack(&test.repo, "main", "missing"),
            Err(StError::BranchNotFound(_))
        ));
    }
}
