//! The labeling modal and the candidate labels it offers
//!
//! - candidates: context headings extended with the fallback vocabulary
//! - modal: single-instance decision UI resolving through a one-shot channel
//! - render: panel markup for live pages

pub mod candidates;
pub mod modal;
pub mod render;

pub use candidates::assemble_candidates;
pub use modal::{LabelChoice, LabelingModal, OtherField, OverlayHandles, PendingLabel, Selection, Submission};
pub use render::render_panel;
