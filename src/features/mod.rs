//! Feature extraction for clicked elements
//!
//! - geometry: vertical position and sibling index
//! - context: nearest preceding headings
//! - record: the FeatureRecord stored with every example

pub mod context;
pub mod geometry;
pub mod record;

pub use context::{collect_context_headings, normalize_whitespace};
pub use geometry::{sibling_index, vertical_position_percent};
pub use record::{AncestorSummary, FeatureRecord, build_features};
