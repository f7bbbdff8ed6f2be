//! Error types for the `socle` application.

use nu_ansi_term::Color;
use thiserror::Error;

/// Errors that can occur while managing stacks with `socle`.
///
/// The first group of variants are sentinels that callers branch on. The remainder wrap
/// failures from collaborators (`git`, the GitHub API, the terminal) or describe user errors.
#[derive(Error, Debug)]
pub enum StError {
    /// A repository-scoped config key is absent.
    #[error("Config key `{0}` not found.")]
    ConfigKeyNotFound(String),
    /// A rebase paused on conflicts. The cascade is halted until the user resolves them.
    #[error(
        "Rebase of `{}` paused on conflicts. Resolve them, run `git rebase --continue`, then re-run the command.",
        Color::Blue.paint(.0)
    )]
    RebaseConflict(String),
    /// The user interrupted an interactive prompt.
    #[error("Operation cancelled by user.")]
    UserCancelled,
    /// A remote mutation succeeded, but recording it locally failed.
    #[error(
        "CRITICAL: {action} succeeded remotely for branch `{branch}`, but persisting `{key}` failed: {source}. \
         Record it manually with `git config {key} {value}` to avoid duplicates on the next run."
    )]
    CriticalPersistenceDrift {
        /// Description of the remote mutation that succeeded.
        action: String,
        /// The branch whose record could not be written.
        branch: String,
        /// The config key that failed to persist.
        key: String,
        /// The value that should have been written.
        value: String,
        /// The underlying persistence failure.
        source: Box<StError>,
    },

    /// A rebase failed for a reason other than conflicts.
    #[error("Rebase onto `{target}` failed:\n{output}")]
    RebaseFailed {
        /// The rebase target.
        target: String,
        /// Diagnostic output from `git`.
        output: String,
    },
    /// A rebase is already paused in the working tree.
    #[error("A rebase is in progress. Finish or abort it before continuing.")]
    RebaseInProgress,
    /// A `git` subprocess exited unsuccessfully.
    #[error("`git {args}` failed:\n{output}")]
    GitCommand {
        /// Arguments passed to `git`.
        args: String,
        /// Diagnostic output from `git`.
        output: String,
    },
    /// A remote API call exceeded the client-side timeout.
    #[error("GitHub API call `{op}` timed out after {secs}s.")]
    ApiTimeout {
        /// The operation that timed out.
        op: &'static str,
        /// The timeout, in seconds.
        secs: u64,
    },
    /// A remote API call was cancelled.
    #[error("GitHub API call `{0}` was cancelled.")]
    Cancelled(&'static str),
    /// The branch is not tracked.
    #[error("Branch `{}` is not tracked with `socle`. Track it first with `socle track`.", Color::Blue.paint(.0))]
    BranchNotTracked(String),
    /// The branch does not exist locally.
    #[error("Branch `{}` does not exist.", Color::Blue.paint(.0))]
    BranchNotFound(String),
    /// The branch name is not a valid git reference name.
    #[error("`{0}` is not a valid branch name.")]
    InvalidBranchName(String),
    /// Tracking the branch would introduce a cycle.
    #[error("Tracking `{branch}` on top of `{parent}` would create a cycle.")]
    TrackingCycle {
        /// The branch being tracked.
        branch: String,
        /// The requested parent.
        parent: String,
    },
    /// `HEAD` does not point at a branch.
    #[error("Cannot operate on a detached HEAD.")]
    DetachedHead,
    /// The working tree has uncommitted changes.
    #[error("The working tree is dirty. Commit or stash your changes first.")]
    WorkingTreeDirty,
    /// The remote URL is not a GitHub URL.
    #[error("Could not determine the GitHub owner and repository from remote URL `{0}`.")]
    RemoteUrl(String),
    /// No GitHub token is configured.
    #[error("No GitHub token found. Set `GITHUB_TOKEN` or `github-token` in `{0}`.")]
    MissingToken(String),

    /// A [git2::Error] occurred.
    #[error("libgit2 error: {0}")]
    Git2(#[from] git2::Error),
    /// An [octocrab::Error] occurred.
    #[error("GitHub API error: {0}")]
    Octocrab(#[from] octocrab::Error),
    /// An [inquire::InquireError] other than cancellation occurred.
    #[error("inquire error: {0}")]
    Inquire(inquire::InquireError),
    /// A [std::io::Error] occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The user settings file could not be parsed.
    #[error("failed to parse settings: {0}")]
    TomlDe(#[from] toml::de::Error),
    /// The user settings could not be serialized.
    #[error("failed to serialize settings: {0}")]
    TomlSer(#[from] toml::ser::Error),
    /// An [anyhow::Error] occurred.
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<inquire::InquireError> for StError {
    fn from(e: inquire::InquireError) -> Self {
        match e {
            inquire::InquireError::OperationCanceled
            | inquire::InquireError::OperationInterrupted => StError::UserCancelled,
            other => StError::Inquire(other),
        }
    }
}

impl StError {
    /// Returns `true` if the error signals an absent config key.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StError::ConfigKeyNotFound(_))
    }
}

/// A result type for `socle` operations.
pub type StResult<T> = Result<T, StError>;

/// Converts a [StError::ConfigKeyNotFound] result into [None], passing through other errors.
pub(crate) trait OptionalExt<T> {
    /// Maps a "not found" error to `Ok(None)`.
    fn optional(self) -> StResult<Option<T>>;
}

impl<T> OptionalExt<T> for StResult<T> {
    fn optional(self) -> StResult<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{OptionalExt, StError, StResult};

    #[test]
    fn inquire_cancellation_is_user_cancelled() {
        let err: StError = inquire::InquireError::OperationCanceled.into();
        assert!(matches!(err, StError::UserCancelled));

        let err: StError = inquire::InquireError::OperationInterrupted.into();
        assert!(matches!(err, StError::UserCancelled));

        let err: StError = inquire::InquireError::NotTTY.into();
        assert!(matches!(err, StError::Inquire(_)));
    }

    #[test]
    fn optional_only_swallows_not_found() {
        let missing: StResult<u64> = Err(StError::ConfigKeyNotFound("k".into()));
        assert!(missing.optional().unwrap().is_none());

        let present: StResult<u64> = Ok(7);
        assert_eq!(present.optional().unwrap(), Some(7));

        let failed: StResult<u64> = Err(StError::DetachedHead);
        assert!(failed.optional().is_err());
    }
}
