//! ahkforge-cli: file access and presentation for the ahkforge kernel.
//!
//! The binary is thin; everything it does lives here so it can be tested
//! against in-memory writers:
//!
//! - **args**: clap definitions
//! - **app**: `check`, `fix`, `extract`, `payload` and `rules`
//! - **files**: directory expansion, reading and writing scripts
//! - **report**: colored text and JSON rendering
//! - **shell**: the interactive session

pub mod app;
pub mod args;
pub mod files;
pub mod report;
pub mod shell;

pub use app::{App, FixOptions, Output};
pub use args::{Cli, Command};
