pub mod capability;
pub mod descriptor;
pub mod validation;

pub use capability::{Capability, ALLOWED_MODELS, ALLOWED_TOOLS, DEFAULT_MODEL};
pub use descriptor::{AgentDescriptor, DescriptorSummary, ListField, RawDescriptor};
pub use validation::{
    build_descriptor, validate_descriptor, IssueKind, ValidationIssue, ValidationResult,
};
