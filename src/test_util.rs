//! Shared fixtures for tests that need a real repository.

use crate::git::RepositoryExt;
use git2::{Oid, Repository, RepositoryInitOptions};
use std::path::Path;
use tempfile::TempDir;

/// A throwaway repository with `main` checked out and a single initial commit.
pub(crate) struct TestRepo {
    pub(crate) dir: TempDir,
    pub(crate) repo: Repository,
}

impl TestRepo {
    pub(crate) fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &opts).unwrap();

        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Socle Test").unwrap();
            config.set_str("user.email", "test@socle.dev").unwrap();
        }

        let test = Self { dir, repo };
        test.commit_file("README.md", "# test\n", "initial commit");
        test
    }

    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `contents` to `name` and commits it on top of `HEAD`.
    pub(crate) fn commit_file(&self, name: &str, contents: &str, message: &str) -> Oid {
        std::fs::write(self.path().join(name), contents).unwrap();

        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let signature = self.repo.signature().unwrap();

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents = parent.iter().collect::<Vec<_>>();
        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap()
    }

    /// Creates `name` at `HEAD` and checks it out.
    pub(crate) fn branch(&self, name: &str) {
        self.repo.create_branch_at_head(name).unwrap();
        self.repo.checkout_branch(name).unwrap();
    }

    pub(crate) fn checkout(&self, name: &str) {
        self.repo.checkout_branch(name).unwrap();
    }

    /// Adds a bare repository as the `origin` remote. The returned directory must outlive the test.
    pub(crate) fn add_origin(&self) -> TempDir {
        let remote_dir = TempDir::new().unwrap();
        Repository::init_bare(remote_dir.path()).unwrap();
        self.repo
            .remote("origin", remote_dir.path().to_str().unwrap())
            .unwrap();
        remote_dir
    }
}
