use crate::agent::parser::DescriptorFormat;
use crate::error::ApiError;
use std::path::{Path, PathBuf};

/// Descriptor file content as read from a repository, not yet parsed.
#[derive(Debug, Clone)]
pub struct StoredDescriptor {
    /// Filename stem; the identity every lookup uses.
    pub agent_id: String,
    pub path: PathBuf,
    pub format: DescriptorFormat,
    pub content: String,
}

pub trait AgentRepository: Send + Sync {
    /// Read every descriptor file, sorted by filename.
    fn list(&self) -> Result<Vec<StoredDescriptor>, ApiError>;
    /// Read the descriptor file for one id, if present.
    fn find(&self, agent_id: &str) -> Result<Option<StoredDescriptor>, ApiError>;
    fn path_for(&self, agent_id: &str, format: DescriptorFormat) -> PathBuf;
    fn save(
        &self,
        agent_id: &str,
        content: &str,
        format: DescriptorFormat,
    ) -> Result<PathBuf, ApiError>;
    fn delete(&self, agent_id: &str) -> Result<PathBuf, ApiError>;
    /// Directory this repository scans.
    fn root(&self) -> &Path;
}
