//! Agent repository port and adapters.

pub mod contract;
pub mod directory;

pub use contract::{AgentRepository, StoredDescriptor};
pub use directory::DirectoryAgentRepository;
