//! Repository-scoped persisted state for `socle`, stored in the repository's local git config.
//!
//! Three keys are kept per branch:
//! - `branch.<name>.socle-parent` - the name of the branch's parent.
//! - `branch.<name>.pr-number` - the number of the branch's pull request.
//! - `branch.<name>.comment-id` - the id of the stack status comment on that pull request.
//!
//! An absent key is reported as [StError::ConfigKeyNotFound], distinct from I/O failures.

use crate::{
    constants::{COMMENT_ID_KEY, PARENT_KEY, PR_NUMBER_KEY},
    errors::{OptionalExt, StError, StResult},
};
use git2::{Config, ConfigLevel, ErrorCode, Repository};
use std::collections::BTreeMap;
use tracing::trace;

/// Returns the config key for `suffix` scoped to `branch`.
pub fn branch_key(branch: &str, suffix: &str) -> String {
    format!("branch.{}.{}", branch, suffix)
}

/// Extracts the branch name from a key of the form `branch.<name>.<suffix>`.
fn branch_from_key<'k>(key: &'k str, suffix: &str) -> Option<&'k str> {
    key.strip_prefix("branch.")?
        .strip_suffix(suffix)?
        .strip_suffix('.')
        .filter(|name| !name.is_empty())
}

/// A persisted key-value store scoped to a repository.
///
/// Implementors provide the raw string operations; the typed accessors for parent pointers,
/// pull request numbers and comment ids are provided on top of them.
pub trait ConfigStore {
    /// Reads the value of `key`. Fails with [StError::ConfigKeyNotFound] if it is absent.
    fn get(&self, key: &str) -> StResult<String>;

    /// Writes `value` to `key`.
    fn set(&mut self, key: &str, value: &str) -> StResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn unset(&mut self, key: &str) -> StResult<()>;

    /// Returns all `branch.<name>.<suffix>` entries as a map of branch name to value.
    fn branch_entries(&self, suffix: &str) -> StResult<BTreeMap<String, String>>;

    /// Returns the tracked parent of `branch`, if any.
    fn parent(&self, branch: &str) -> StResult<Option<String>> {
        self.get(&branch_key(branch, PARENT_KEY)).optional()
    }

    /// Records `parent` as the parent of `branch`.
    fn set_parent(&mut self, branch: &str, parent: &str) -> StResult<()> {
        self.set(&branch_key(branch, PARENT_KEY), parent)
    }

    /// Removes the parent pointer of `branch`.
    fn clear_parent(&mut self, branch: &str) -> StResult<()> {
        self.unset(&branch_key(branch, PARENT_KEY))
    }

    /// Returns every persisted parent pointer as a map of child to parent.
    fn parent_edges(&self) -> StResult<BTreeMap<String, String>> {
        self.branch_entries(PARENT_KEY)
    }

    /// Returns the pull request number recorded for `branch`, if any.
    fn pr_number(&self, branch: &str) -> StResult<Option<u64>> {
        self.get_u64(&branch_key(branch, PR_NUMBER_KEY))
    }

    /// Records the pull request number for `branch`.
    fn set_pr_number(&mut self, branch: &str, number: u64) -> StResult<()> {
        self.set(&branch_key(branch, PR_NUMBER_KEY), &number.to_string())
    }

    /// Removes the pull request number of `branch`.
    fn clear_pr_number(&mut self, branch: &str) -> StResult<()> {
        self.unset(&branch_key(branch, PR_NUMBER_KEY))
    }

    /// Returns the stack comment id recorded for `branch`, if any.
    fn comment_id(&self, branch: &str) -> StResult<Option<u64>> {
        self.get_u64(&branch_key(branch, COMMENT_ID_KEY))
    }

    /// Records the stack comment id for `branch`.
    fn set_comment_id(&mut self, branch: &str, id: u64) -> StResult<()> {
        self.set(&branch_key(branch, COMMENT_ID_KEY), &id.to_string())
    }

    /// Removes the stack comment id of `branch`.
    fn clear_comment_id(&mut self, branch: &str) -> StResult<()> {
        self.unset(&branch_key(branch, COMMENT_ID_KEY))
    }

    /// Reads `key` as an unsigned integer. Zero is treated as absent.
    fn get_u64(&self, key: &str) -> StResult<Option<u64>> {
        let Some(raw) = self.get(key).optional()? else {
            return Ok(None);
        };
        let value = raw.trim().parse::<u64>().map_err(|e| {
            anyhow::anyhow!("Config key `{}` holds non-numeric value `{}`: {}", key, raw, e)
        })?;
        Ok((value != 0).then_some(value))
    }
}

/// A [ConfigStore] backed by the local (`.git/config`) level of a repository's git config.
pub struct GitConfigStore {
    config: Config,
}

impl GitConfigStore {
    /// Opens the local-level git config of `repository`.
    pub fn open(repository: &Repository) -> StResult<Self> {
        let config = repository.config()?.open_level(ConfigLevel::Local)?;
        Ok(Self { config })
    }
}

impl ConfigStore for GitConfigStore {
    fn get(&self, key: &str) -> StResult<String> {
        match self.config.get_string(key) {
            Ok(value) => Ok(value),
            Err(e) if e.code() == ErrorCode::NotFound => {
                Err(StError::ConfigKeyNotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> StResult<()> {
        trace!(key, value, "Writing config entry");
        self.config.set_str(key, value).map_err(Into::into)
    }

    fn unset(&mut self, key: &str) -> StResult<()> {
        trace!(key, "Removing config entry");
        match self.config.remove(key) {
            Err(e) if e.code() != ErrorCode::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn branch_entries(&self, suffix: &str) -> StResult<BTreeMap<String, String>> {
        let pattern = format!(r"^branch\..*\.{}$", suffix);
        let mut entries = self.config.entries(Some(&pattern))?;

        let mut map = BTreeMap::new();
        while let Some(entry) = entries.next() {
            let entry = entry?;
            let (Some(key), Some(value)) = (entry.name(), entry.value()) else {
                continue;
            };
            if let Some(branch) = branch_from_key(key, suffix) {
                map.insert(branch.to_string(), value.to_string());
            }
        }
        Ok(map)
    }
}

/// An in-memory [ConfigStore] with failure injection, for tests.
#[cfg(test)]
#[derive(Default, Debug, Clone)]
pub(crate) struct MemoryStore {
    pub(crate) values: BTreeMap<String, String>,
    /// Reads fail with an I/O error when set.
    pub(crate) fail_get: bool,
    /// Writes fail with an I/O error when set.
    pub(crate) fail_set: bool,
    /// Removals fail with an I/O error when set.
    pub(crate) fail_unset: bool,
}

#[cfg(test)]
impl MemoryStore {
    fn io_error(op: &str) -> StError {
        std::io::Error::new(std::io::ErrorKind::Other, format!("injected {} failure", op)).into()
    }
}

#[cfg(test)]
impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> StResult<String> {
        if self.fail_get {
            return Err(Self::io_error("get"));
        }
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| StError::ConfigKeyNotFound(key.to_string()))
    }

    fn set(&mut self, key: &str, value: &str) -> StResult<()> {
        if self.fail_set {
            return Err(Self::io_error("set"));
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn unset(&mut self, key: &str) -> StResult<()> {
        if self.fail_unset {
            return Err(Self::io_error("unset"));
        }
        self.values.remove(key);
        Ok(())
    }

    fn branch_entries(&self, suffix: &str) -> StResult<BTreeMap<String, String>> {
        if self.fail_get {
            return Err(Self::io_error("get"));
        }
        Ok(self
            .values
            .iter()
            .filter_map(|(k, v)| Some((branch_from_key(k, suffix)?.to_string(), v.clone())))
            .collect())
    }
}
