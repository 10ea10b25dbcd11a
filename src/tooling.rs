//! Tooling & Integration Layer
//!
//! CLI for descriptor management and dry-run inspection of dispatch.

pub mod cli;
pub mod format;

pub use cli::{AgentCommands, Cli, CliContext, Commands};
