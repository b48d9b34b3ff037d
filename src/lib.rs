//! # session-labeler
//!
//! Interactive in-page labeling of webpage regions. Click an element of a live page, pick
//! the session it belongs to ("Menu", "Hero", "Rodape", a nearby heading, or free text) and
//! the element's structural features are stored together with that label as a training
//! example. Examples are exported as `ux_examples.json` and can be sent to an upload
//! endpoint.
//!
//! ## Features
//!
//! - **Feature extraction**: tag, classes, id, text, ancestors, vertical position, sibling
//!   index and nearby headings of any element
//! - **Labeling modal**: single-instance decision UI seeded with context headings plus a
//!   fallback vocabulary, with a free-text "Other" option
//! - **Click coordination**: capture-phase interception with explicit Armed/Inert modes and
//!   idempotent initialization
//! - **Browser driver**: runs the whole flow in a real Chrome tab over CDP
//! - **Upload collaborator**: authenticated multipart endpoint and client
//!
//! ## Running a session
//!
//! ```bash
//! # Label a page in a visible browser, writing ux_examples.json to ./data
//! cargo run -- label https://example.com --output data
//!
//! # Receive exported datasets
//! UPLOAD_TOKEN=secret cargo run -- serve-upload --dir uploads
//! ```
//!
//! ## Library Usage
//!
//! The labeling flow runs on an owned page model, so it works without a browser:
//!
//! ```rust
//! use session_labeler::config::LabelingConfig;
//! use session_labeler::dom::{ClickTarget, Document, DomTree, ElementNode, Viewport};
//! use session_labeler::session::{ClickCoordinator, SubmitOutcome};
//!
//! # fn main() -> session_labeler::Result<()> {
//! let body = ElementNode::new("body").with_children(vec![
//!     ElementNode::new("h2").with_text("Planos"),
//!     ElementNode::new("a").with_id("cta").with_text("Assine").with_bounding_box(0.0, 300.0, 80.0, 20.0),
//! ]);
//! let tree = DomTree::new(ElementNode::new("html").with_children(vec![body]))
//!     .with_viewport(Viewport::new(0.0, 1000.0, 1000.0));
//! let mut document = Document::new(tree);
//!
//! let coordinator = ClickCoordinator::new(LabelingConfig::default());
//! coordinator.init(&mut document);
//!
//! let cta = document.tree().find_by_id("cta").expect("cta exists");
//! document.dispatch_click(ClickTarget::Element(cta));
//!
//! if let SubmitOutcome::Recorded { label, total } = coordinator.submit(&mut document)? {
//!     assert_eq!(label.as_str(), "Planos");
//!     assert_eq!(total, 1);
//! }
//! println!("{}", coordinator.export_json()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`dom`]: page model, overlay surface and click dispatch
//! - [`features`]: feature extraction for clicked elements
//! - [`labeling`]: candidate labels and the labeling modal
//! - [`session`]: click coordinator and example store
//! - [`browser`]: Chrome session and the live labeling driver
//! - [`upload`]: upload endpoint and client
//! - [`config`]: TOML configuration
//! - [`error`]: Error types and result aliases

pub mod browser;
pub mod config;
pub mod dom;
pub mod error;
pub mod features;
pub mod labeling;
pub mod session;
pub mod upload;

pub use browser::{BrowserSession, ConnectionOptions, DriverOptions, LabelingDriver, LaunchOptions};
pub use config::{LabelerConfig, load_config};
pub use dom::{ClassValue, Document, DomTree, ElementNode, NodePath};
pub use error::{LabelerError, Result};
pub use features::{FeatureRecord, build_features};
pub use labeling::{LabelChoice, LabelingModal};
pub use session::{ClickCoordinator, Example, ExampleStore, Mode, SubmitOutcome};
pub use upload::UploadReport;
