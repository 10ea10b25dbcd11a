//! Agent descriptors: declarative records loaded from disk.
//!
//! Descriptors are data consumed by a fixed runtime; nothing here loads or
//! executes code found on disk.

pub mod commands;
pub mod domain;
pub mod parser;
pub mod prompt;
pub mod registry;
pub mod repository;

pub use commands::AgentCommandService;
pub use domain::{
    AgentDescriptor, Capability, DescriptorSummary, IssueKind, ValidationIssue, ValidationResult,
};
pub use parser::DescriptorFormat;
pub use prompt::{resolve_prompt_path, PromptCache};
pub use registry::{AgentMap, AgentRegistry, LoadStats};
pub use repository::{AgentRepository, DirectoryAgentRepository, StoredDescriptor};
