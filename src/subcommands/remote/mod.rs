//! Subcommands pertaining to remote stack management.

mod submit;
pub use submit::SubmitCmd;
