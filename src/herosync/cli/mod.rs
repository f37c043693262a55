//! Terminal client for the herosync library.
//!
//! For the overall architecture, see the crate-level documentation of `herosync`.
//!
//! - `commands`: context setup, dispatch and exit codes
//! - `print`: colored output of messages, listings and the status report
//! - `setup`: argument parsing via clap

mod commands;
mod print;
pub mod setup;

pub use commands::run;
