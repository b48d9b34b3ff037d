use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the labeling session, the browser driver and the upload collaborator
#[derive(Debug, Error)]
pub enum LabelerError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("JavaScript evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Failed to parse DOM: {0}")]
    DomParseFailed(String),

    #[error("No labeling modal is open")]
    NoOpenModal,

    #[error("Candidate {index} does not exist ({available} offered)")]
    NoSuchCandidate { index: usize, available: usize },

    #[error("Label was discarded before the modal resolved")]
    LabelDiscarded,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Upload failed with status {status}: {body}")]
    Upload { status: u16, body: String },

    #[error("Upload request failed: {0}")]
    UploadTransport(String),

    #[error("Upload server error: {0}")]
    Server(String),
}

impl LabelerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, LabelerError>;
