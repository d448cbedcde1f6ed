//! Silence removal over files and directories.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;

pub use cli::{Cli, Invocation};
pub use config::CliConfig;
pub use error::{CliError, CliResult};
pub use orchestrator::{BatchSummary, FileOutcome, Orchestrator};
