//! Subcommands pertaining to local stack management.

mod log;
pub use log::LogCmd;

mod create;
pub use create::CreateCmd;

mod checkout;
pub use checkout::CheckoutCmd;

mod restack;
pub use restack::RestackCmd;

mod track;
pub use track::TrackCmd;

mod untrack;
pub use untrack::UntrackCmd;

mod config;
pub use config::ConfigCmd;
