//! Labeling session: click coordination and the examples it records

pub mod coordinator;
pub mod store;

pub use coordinator::{ClickCoordinator, Mode, SubmitOutcome};
pub use store::{EXPORT_FILE_NAME, Example, ExampleStore};
