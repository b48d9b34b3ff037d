//! DOM model the labeler operates on
//!
//! This module provides:
//! - ElementNode: Representation of DOM elements, including the class value normalization
//! - DomTree: Element tree snapshot with viewport metrics and path navigation
//! - Document: Page model with overlay surface and capture-phase click dispatch

pub mod document;
pub mod element;
pub mod tree;

pub use document::{
    BACKDROP_ELEMENT_ID, ClickEvent, ClickListener, ClickTarget, DEFAULT_ACTION_HISTORY, Document, ListenerId,
    OverlayId, OverlayKind, PANEL_ELEMENT_ID, Surface,
};
pub use element::{BoundingBox, ClassValue, ElementNode};
pub use tree::{DomTree, NodePath, Viewport};
