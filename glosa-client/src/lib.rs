//! Client runtime for the glosa correction service
//!
//! Wraps the two external collaborators (analysis and patch) behind a
//! blocking HTTP client and owns the review cycle that ties document
//! snapshots to decision state.

mod review;
mod service_client;

pub use review::ReviewCycle;
pub use service_client::{is_error_code, CorrectedDocuments, CorrectionClient};

/// Result type alias re-exported for client callers
pub type Result<T> = glosa_core::Result<T>;
