//! Glosa Core - Coupled XML/JSON document review
//!
//! This library provides the core functionality for exploring a UBL-style
//! XML envelope (with documents embedded in CDATA) alongside its companion
//! JSON record set, addressing fields by path, searching both trees, and
//! assembling an operator-reviewed change set for an external patch
//! service.

pub mod config;
pub mod correction;
pub mod error;
pub mod normalize;
pub mod path;
pub mod search;
pub mod tree;
pub mod xml;

pub use config::Config;
pub use correction::{
    ChangeEntry, CorrectionProposal, CorrectionSession, Decision, DecisionCounts,
    ManualCorrection, TargetFormat,
};
pub use error::GlosaError;
pub use normalize::{normalize_analysis, AnalysisOutcome, ManualReviewItem, ValidationFault};
pub use search::{expansion_closure, search, search_json, ExpansionState};
pub use tree::{TreeNode, EMBEDDED_SEGMENT};
pub use xml::parse_tree;

/// Result type alias for glosa operations
pub type Result<T> = std::result::Result<T, GlosaError>;
