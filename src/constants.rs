//! Constants for the `socle` application.

use nu_ansi_term::Color;

/// Name of the user settings file, relative to the home directory.
pub(crate) const SOCLE_CFG_FILE_NAME: &str = ".socle.toml";

/// Config key suffix holding a branch's parent, i.e. `branch.<name>.socle-parent`.
pub(crate) const PARENT_KEY: &str = "socle-parent";
/// Config key suffix holding a branch's pull request number.
pub(crate) const PR_NUMBER_KEY: &str = "pr-number";
/// Config key suffix holding the id of a branch's stack status comment.
pub(crate) const COMMENT_ID_KEY: &str = "comment-id";

/// Marker embedded in the stack status comment, used to find it again across runs.
pub(crate) const STACK_COMMENT_MARKER: &str = "<!-- socle:stack-comment -->";

/// Default client-side timeout for GitHub API calls, in seconds.
pub(crate) const DEFAULT_API_TIMEOUT_SECS: u64 = 10;
/// Page size used when listing pull request comments.
pub(crate) const COMMENTS_PER_PAGE: u8 = 100;

/// Default remote to push branches to.
pub(crate) const DEFAULT_REMOTE: &str = "origin";

pub(crate) const COLORS: [Color; 6] = [
    Color::Blue,
    Color::Cyan,
    Color::Green,
    Color::Red,
    Color::Yellow,
    Color::Purple,
];

pub(crate) const FILLED_CIRCLE: char = '●';
pub(crate) const EMPTY_CIRCLE: char = '○';
pub(crate) const BOTTOM_LEFT_BOX: char = '└';
pub(crate) const LEFT_FORK_BOX: char = '├';
pub(crate) const VERTICAL_BOX: char = '│';
pub(crate) const HORIZONTAL_BOX: char = '─';
