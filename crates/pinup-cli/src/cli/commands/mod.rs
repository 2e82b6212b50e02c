//! CLI command handlers.

mod upload;

pub use upload::run_upload;
