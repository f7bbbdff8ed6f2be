//! Tracking, creation and restacking of branches within the [StContext].

use super::StContext;
use crate::{
    errors::{StError, StResult},
    git::RepositoryExt,
    restack::{needs_restack, restack_branch, RebaseMode},
    store::ConfigStore,
    tree::StackGraph,
};
use tracing::{debug, info};

impl<'a, S: ConfigStore> StContext<'a, S> {
    /// Returns the chain of branches from the base of the current branch's stack to the current
    /// branch, inclusive.
    pub fn current_chain(&self) -> StResult<Vec<String>> {
        let current = self.repository.current_branch_name()?;
        Ok(self.graph()?.chain_to(&current))
    }

    /// Returns the current chain extended with every descendant of the current branch, ordered so
    /// that each branch follows its parent.
    pub fn current_stack(&self) -> StResult<(Vec<String>, StackGraph)> {
        let current = self.repository.current_branch_name()?;
        let graph = self.graph()?;
        let mut stack = graph.chain_to(&current);
        for descendant in graph.descendants(&current) {
            if !stack.contains(&descendant) {
                stack.push(descendant);
            }
        }
        let stack = graph.parent_first(&stack);
        Ok((stack, graph))
    }

    /// Returns `true` if `branch` has a tracked parent and must be rebased onto it.
    pub fn needs_restack(&self, branch: &str) -> StResult<bool> {
        match self.store.parent(branch)? {
            Some(parent) => needs_restack(self.repository, &parent, branch),
            None => Ok(false),
        }
    }

    /// Fails if a rebase is paused or the working tree is dirty.
    pub fn check_cleanliness(&self) -> StResult<()> {
        if self.repository.rebase_in_progress() {
            return Err(StError::RebaseInProgress);
        }
        if !self.repository.is_working_tree_clean()? {
            return Err(StError::WorkingTreeDirty);
        }
        Ok(())
    }

    /// Tracks `branch` on top of `parent`.
    pub fn track(&mut self, branch: &str, parent: &str) -> StResult<()> {
        for name in [branch, parent] {
            if !self.repository.branch_exists(name) {
                return Err(StError::BranchNotFound(name.to_string()));
            }
        }
        if self.graph()?.would_cycle(branch, parent) {
            return Err(StError::TrackingCycle {
                branch: branch.to_string(),
                parent: parent.to_string(),
            });
        }

        self.store.set_parent(branch, parent)?;
        info!(branch, parent, "Tracked branch");
        Ok(())
    }

    /// Stops tracking `branch`, forgetting its pull request and comment, and re-links its children
    /// to its parent.
    ///
    /// ## Returns
    /// - `Ok(children)` - The children that were re-linked.
    pub fn untrack(&mut self, branch: &str) -> StResult<Vec<String>> {
        let graph = self.graph()?;
        if !graph.contains(branch) {
            return Err(StError::BranchNotTracked(branch.to_string()));
        }

        let parent = graph.parent(branch).map(ToOwned::to_owned);
        let children = graph.children(branch).to_vec();
        for child in &children {
            match &parent {
                Some(parent) => self.store.set_parent(child, parent)?,
                None => self.store.clear_parent(child)?,
            }
        }

        self.store.clear_parent(branch)?;
        self.store.clear_pr_number(branch)?;
        self.store.clear_comment_id(branch)?;
        info!(branch, ?children, "Untracked branch");
        Ok(children)
    }

    /// Creates `branch_name` at `HEAD`, checks it out, and tracks it on top of the branch that was
    /// checked out. If `message` is given, staged changes are committed to the new branch.
    pub fn create_branch(&mut self, branch_name: &str, message: Option<&str>) -> StResult<()> {
        let parent = self.repository.current_branch_name()?;
        self.repository.validate_branch_name(branch_name)?;
        if self.repository.branch_exists(branch_name) {
            return Err(anyhow::anyhow!("Branch `{}` already exists.", branch_name).into());
        }

        self.repository.create_branch_at_head(branch_name)?;
        self.repository.checkout_branch(branch_name)?;
        self.store.set_parent(branch_name, &parent)?;
        debug!(branch = branch_name, %parent, "Created branch");

        if let Some(message) = message {
            let oid = self.repository.commit_staged(message)?;
            debug!(branch = branch_name, %oid, "Committed staged changes");
        }
        Ok(())
    }

    /// Restacks every branch in `branches` whose parent is tracked, in order.
    ///
    /// The cascade halts at the first failure. A [StError::RebaseConflict] leaves the repository
    /// mid-rebase for the user; branches processed before it keep their new positions.
    ///
    /// ## Returns
    /// - `Ok(restacked)` - The branches that were rebased.
    pub fn restack_branches(&self, branches: &[String], mode: RebaseMode) -> StResult<Vec<String>> {
        let mut restacked = Vec::new();
        for branch in branches {
            let Some(parent) = self.store.parent(branch)? else {
                continue;
            };
            if restack_branch(self.repository, branch, &parent, mode)? {
                restacked.push(branch.clone());
            }
        }
        Ok(restacked)
    }

    /// Restacks the current stack and returns to the branch that was checked out.
    pub fn restack_current(&self, mode: RebaseMode) -> StResult<Vec<String>> {
        self.check_cleanliness()?;
        let original = self.repository.current_branch_name()?;
        let (stack, _) = self.current_stack()?;

        let restacked = match self.restack_branches(&stack, mode) {
            Err(StError::RebaseConflict(branch)) => return Err(StError::RebaseConflict(branch)),
            result => result,
        };
        if self.repository.current_branch_name()? != original {
            self.repository.checkout_branch(&original)?;
        }
        restacked
    }
}

#[cfg(test)]
mod test {
    use crate::{
        ctx::StContext,
        errors::StError,
        git::RepositoryExt,
        restack::RebaseMode,
        store::{ConfigStore, MemoryStore},
        test_util::TestRepo,
    };

    #[test]
    fn track_rejects_cycles_and_missing_branches() {
        let test = TestRepo::new();
        test.branch("a");
        test.branch("b");
        let mut ctx = StContext::with_store(&test.repo, MemoryStore::default());

        ctx.track("a", "main").unwrap();
        ctx.track("b", "a").unwrap();
        assert!(matches!(
            ctx.track("a", "b"),
            Err(StError::TrackingCycle { .. })
        ));
        assert!(matches!(
            ctx.track("a", "missing"),
            Err(StError::BranchNotFound(_))
        ));
        assert_eq!(ctx.current_chain().unwrap(), vec!["main", "a", "b"]);
    }

    #[test]
    fn untrack_relinks_children() {
        let test = TestRepo::new();
        test.branch("a");
        test.branch("b");
        let mut ctx = StContext::with_store(&test.repo, MemoryStore::default());
        ctx.track("a", "main").unwrap();
        ctx.track("b", "a").unwrap();
        ctx.store.set_pr_number("a", 3).unwrap();

        assert_eq!(ctx.untrack("a").unwrap(), vec!["b"]);
        assert_eq!(ctx.store.parent("b").unwrap().as_deref(), Some("main"));
        assert_eq!(ctx.store.parent("a").unwrap(), None);
        assert_eq!(ctx.store.pr_number("a").unwrap(), None);
        assert!(matches!(
            ctx.untrack("a"),
            Err(StError::BranchNotTracked(_))
        ));
    }

    #[test]
    fn create_tracks_on_top_of_current() {
        let test = TestRepo::new();
        let mut ctx = StContext::with_store(&test.repo, MemoryStore::default());

        ctx.create_branch("a", None).unwrap();
        std::fs::write(test.path().join("a.txt"), "a\n").unwrap();
        test.repo.stage_all().unwrap();
        ctx.create_branch("b", Some("add a.txt")).unwrap();

        assert_eq!(test.repo.current_branch_name().unwrap(), "b");
        assert_eq!(ctx.store.parent("b").unwrap().as_deref(), Some("a"));
        assert!(test.repo.has_diff("a", "b").unwrap());
        assert!(ctx.create_branch("a", None).is_err());
        assert!(matches!(
            ctx.create_branch("bad..name", None),
            Err(StError::InvalidBranchName(_))
        ));
    }

    #[test]
    fn restack_current_cascades_and_returns() {
        let test = TestRepo::new();
        let mut ctx = StContext::with_store(&test.repo, MemoryStore::default());
        ctx.create_branch("a", None).unwrap();
        test.commit_file("a.txt", "a\n", "a");
        ctx.create_branch("b", None).unwrap();
        test.commit_file("b.txt", "b\n", "b");

        test.checkout("main");
        test.commit_file("main.txt", "main\n", "main advances");
        test.checkout("a");
        assert!(ctx.needs_restack("a").unwrap());
        assert!(!ctx.needs_restack("main").unwrap());

        let restacked = ctx.restack_current(RebaseMode::Plain).unwrap();
        assert_eq!(restacked, vec!["a", "b"]);
        assert_eq!(test.repo.current_branch_name().unwrap(), "a");
        assert!(!ctx.needs_restack("a").unwrap());
        assert!(!ctx.needs_restack("b").unwrap());
    }

    #[test]
    fn restack_refuses_dirty_trees() {
        let test = TestRepo::new();
        let ctx = StContext::with_store(&test.repo, MemoryStore::default());
        std::fs::write(test.path().join("README.md"), "dirty\n").unwrap();
        assert!(matches!(
            ctx.restack_current(RebaseMode::Plain),
            Err(StError::WorkingTreeDirty)
        ));
    }
}
