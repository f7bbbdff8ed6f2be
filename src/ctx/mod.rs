//! The in-memory context of the `socle` application.

use crate::{
    errors::StResult,
    store::{ConfigStore, GitConfigStore},
    tree::StackGraph,
};
use git2::Repository;

mod fmt;

mod stack_management;

mod submit;
pub use submit::{SubmitReport, SubmitStackOptions};

/// The in-memory context of the `socle` application: a repository and its persisted stack state.
pub struct StContext<'a, S = GitConfigStore> {
    /// The repository associated with the context.
    pub repository: &'a Repository,
    /// The persisted stack state of the repository.
    pub store: S,
}

impl<'a> StContext<'a> {
    /// Opens the context for `repository`, backed by its local git config.
    pub fn open(repository: &'a Repository) -> StResult<Self> {
        Ok(Self {
            repository,
            store: GitConfigStore::open(repository)?,
        })
    }
}

impl<'a, S: ConfigStore> StContext<'a, S> {
    /// Creates a context over an arbitrary [ConfigStore].
    pub fn with_store(repository: &'a Repository, store: S) -> Self {
        Self { repository, store }
    }

    /// Loads the current [StackGraph] from the store.
    pub fn graph(&self) -> StResult<StackGraph> {
        StackGraph::load(&self.store)
    }
}
