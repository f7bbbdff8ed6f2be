//! Utilities for interacting with `git` repositories for the `socle` application.

use crate::errors::{StError, StResult};
use git2::{build::CheckoutBuilder, Branch, BranchType, Oid, Repository, StatusOptions};
use std::{
    env,
    process::{Command, Output},
};
use tracing::{debug, trace};

/// Returns the repository for the current working directory, and [None] if
/// the current working directory is not within a git repository or an error
/// occurs.
pub fn active_repository() -> Option<Repository> {
    Repository::discover(env::current_dir().ok()?).ok()
}

/// Extension trait for the [Repository] type to expose helper functions related to
/// repository management.
///
/// This is the whole version control surface `socle` depends on. Operations that `libgit2`
/// supports are performed in-process; rebasing and pushing shell out to `git`.
pub trait RepositoryExt {
    /// Returns the name of the current branch.
    ///
    /// ## Returns
    /// - `Ok(String)` - The name of the current branch.
    /// - `Err(StError::DetachedHead)` - If `HEAD` does not point at a local branch.
    fn current_branch_name(&self) -> StResult<String>;

    /// Returns the names of all local branches, sorted.
    fn local_branch_names(&self) -> StResult<Vec<String>>;

    /// Returns `true` if a local branch named `branch_name` exists.
    fn branch_exists(&self, branch_name: &str) -> bool;

    /// Validates `branch_name` as a git branch name.
    fn validate_branch_name(&self, branch_name: &str) -> StResult<()>;

    /// Creates a new branch named `branch_name` pointing at the `HEAD` commit.
    fn create_branch_at_head(&self, branch_name: &str) -> StResult<Branch<'_>>;

    /// Checks out a branch with the given `branch_name`.
    ///
    /// ## Takes
    /// - `branch_name` - The name of the branch to checkout.
    ///
    /// ## Returns
    /// - `Result<()>` - The result of the operation.
    fn checkout_branch(&self, branch_name: &str) -> StResult<()>;

    /// Returns the [Oid] of the commit at the tip of `branch_name`.
    fn branch_tip(&self, branch_name: &str) -> StResult<Oid>;

    /// Returns the merge-base of two local branches.
    fn merge_base_of(&self, a: &str, b: &str) -> StResult<Oid>;

    /// Returns `true` if `head` changes anything since it diverged from `base`, i.e. the
    /// `base...head` diff is non-empty. Commits on `base` alone never count.
    fn has_diff(&self, base: &str, head: &str) -> StResult<bool>;

    /// Stages all changes in the working tree.
    fn stage_all(&self) -> StResult<()>;

    /// Commits the index on top of `HEAD` with the given `message`.
    fn commit_staged(&self, message: &str) -> StResult<Oid>;

    /// Returns `true` if the working tree has no modified, staged or conflicted tracked files.
    fn is_working_tree_clean(&self) -> StResult<bool>;

    /// Returns `true` if a rebase is paused in the repository, as signalled by the
    /// `rebase-merge` or `rebase-apply` directories within the git directory.
    fn rebase_in_progress(&self) -> bool;

    /// Runs `git` with `args` in the repository's working directory, capturing its output.
    fn git(&self, args: &[&str]) -> StResult<Output>;

    /// Pushes `branch_name` to `remote`, setting the upstream.
    fn push_branch(&self, branch_name: &str, remote: &str) -> StResult<()>;

    /// Returns the GitHub owner and repository name of `remote`.
    fn owner_and_repository(&self, remote: &str) -> StResult<(String, String)>;
}

impl RepositoryExt for Repository {
    fn current_branch_name(&self) -> StResult<String> {
        let head = self.head().map_err(|e| match e.code() {
            git2::ErrorCode::UnbornBranch => StError::DetachedHead,
            _ => e.into(),
        })?;
        if !head.is_branch() {
            return Err(StError::DetachedHead);
        }
        head.shorthand()
            .map(ToOwned::to_owned)
            .ok_or(StError::DetachedHead)
    }

    fn local_branch_names(&self) -> StResult<Vec<String>> {
        let mut names = self
            .branches(Some(BranchType::Local))?
            .map(|b| -> StResult<Option<String>> {
                let (b, _) = b?;
                Ok(b.name()?.map(ToOwned::to_owned))
            })
            .filter_map(Result::transpose)
            .collect::<StResult<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }

    fn branch_exists(&self, branch_name: &str) -> bool {
        self.find_branch(branch_name, BranchType::Local).is_ok()
    }

    fn validate_branch_name(&self, branch_name: &str) -> StResult<()> {
        if Branch::name_is_valid(branch_name)? {
            Ok(())
        } else {
            Err(StError::InvalidBranchName(branch_name.to_string()))
        }
    }

    fn create_branch_at_head(&self, branch_name: &str) -> StResult<Branch<'_>> {
        self.validate_branch_name(branch_name)?;
        let head_commit = self.head()?.peel_to_commit()?;
        self.branch(branch_name, &head_commit, false)
            .map_err(Into::into)
    }

    fn checkout_branch(&self, branch_name: &str) -> StResult<()> {
        let refname = format!("refs/heads/{}", branch_name);
        let target = self
            .revparse_single(&refname)
            .map_err(|_| StError::BranchNotFound(branch_name.to_string()))?;

        self.checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;
        self.set_head(&refname)?;
        debug!(branch = branch_name, "Checked out branch");

        Ok(())
    }

    fn branch_tip(&self, branch_name: &str) -> StResult<Oid> {
        let branch = self
            .find_branch(branch_name, BranchType::Local)
            .map_err(|_| StError::BranchNotFound(branch_name.to_string()))?;
        Ok(branch.get().peel_to_commit()?.id())
    }

    fn merge_base_of(&self, a: &str, b: &str) -> StResult<Oid> {
        let (a_tip, b_tip) = (self.branch_tip(a)?, self.branch_tip(b)?);
        self.merge_base(a_tip, b_tip).map_err(Into::into)
    }

    fn has_diff(&self, base: &str, head: &str) -> StResult<bool> {
        let base_tree = self.find_commit(self.merge_base_of(base, head)?)?.tree()?;
        let head_tree = self.find_commit(self.branch_tip(head)?)?.tree()?;
        let diff = self.diff_tree_to_tree(Some(&base_tree), Some(&head_tree), None)?;
        Ok(diff.deltas().len() > 0)
    }

    fn stage_all(&self) -> StResult<()> {
        let mut index = self.index()?;
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)?;
        index.write()?;
        Ok(())
    }

    fn commit_staged(&self, message: &str) -> StResult<Oid> {
        let mut index = self.index()?;
        let tree = self.find_tree(index.write_tree()?)?;
        let head_commit = self.head()?.peel_to_commit()?;
        let signature = self.signature()?;

        self.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&head_commit],
        )
        .map_err(Into::into)
    }

    fn is_working_tree_clean(&self) -> StResult<bool> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);
        Ok(self.statuses(Some(&mut opts))?.is_empty())
    }

    fn rebase_in_progress(&self) -> bool {
        let git_dir = self.path();
        git_dir.join("rebase-merge").exists() || git_dir.join("rebase-apply").exists()
    }

    fn git(&self, args: &[&str]) -> StResult<Output> {
        let workdir = self.workdir().unwrap_or_else(|| self.path());
        trace!(?args, "Running git");

        Command::new("git")
            .args(args)
            .current_dir(workdir)
            .output()
            .map_err(Into::into)
    }

    fn push_branch(&self, branch_name: &str, remote: &str) -> StResult<()> {
        let args = ["push", "--force-with-lease", "-u", remote, branch_name];
        let output = self.git(&args)?;
        if !output.status.success() {
            return Err(StError::GitCommand {
                args: args.join(" "),
                output: command_output(&output),
            });
        }
        debug!(branch = branch_name, remote, "Pushed branch");
        Ok(())
    }

    fn owner_and_repository(&self, remote: &str) -> StResult<(String, String)> {
        let remote = self.find_remote(remote)?;
        let url = remote
            .url()
            .ok_or_else(|| StError::RemoteUrl("<non-utf8>".to_string()))?;
        parse_github_slug(url).ok_or_else(|| StError::RemoteUrl(url.to_string()))
    }
}

/// Combines the stdout and stderr of a finished `git` process for diagnostics.
pub(crate) fn command_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{}{}", stdout, stderr).trim().to_string()
}

/// Parses the `(owner, repo)` pair out of a GitHub remote URL, in either the SSH
/// (`git@github.com:owner/repo.git`) or HTTPS (`https://github.com/owner/repo`) form.
fn parse_github_slug(url: &str) -> Option<(String, String)> {
    let path = url
        .strip_prefix("git@github.com:")
        .or_else(|| url.strip_prefix("ssh://git@github.com/"))
        .or_else(|| url.strip_prefix("https://github.com/"))
        .or_else(|| url.strip_prefix("http://github.com/"))?;
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let (owner, repo) = path.split_once('/')?;
    (!owner.is_empty() && !repo.is_empty() && !repo.contains('/'))
        .then(|| (owner.to_string(), repo.to_string()))
}
