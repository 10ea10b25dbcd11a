//! Invocation detection and payload splicing.

pub mod detector;
pub mod payload;

pub use detector::{CommandSet, Invocation, InvocationDetector};
pub use payload::{extract_user_text, inject_context, payload_shape, PayloadShape};
