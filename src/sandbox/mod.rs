//! Execution sandbox: per-invocation context and the checks run against it.

pub mod context;
pub mod path;
pub mod policy;

pub use context::{ExecutionContext, ExecutionLimits, RequestScope};
pub use policy::{check_paths, check_task_capabilities};
