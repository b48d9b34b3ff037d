//! Upload collaborator: an authenticated endpoint that stores exported datasets, and the
//! client that sends them.
//!
//! Both sides speak the same line-oriented plain-text report, see [`UploadReport`].

#[cfg(feature = "upload-client")]
pub mod client;
#[cfg(feature = "upload-server")]
pub mod server;

#[cfg(feature = "upload-client")]
pub use client::UploadClient;
#[cfg(feature = "upload-server")]
pub use server::{router, serve};

use std::fmt;
use std::path::Path;

const SAVED_PREFIX: &str = "OK\nArquivos salvos: ";
const FAILED_PREFIX: &str = "Erro ao salvar: ";

/// Names of the files an upload request saved or failed to save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub saved: Vec<String>,
    pub failed: Vec<String>,
}

impl UploadReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Parse a response body produced by [`UploadReport`]'s `Display`
    pub fn parse(body: &str) -> Option<Self> {
        if let Some(names) = body.strip_prefix(SAVED_PREFIX) {
            return Some(Self { saved: split_names(names), failed: Vec::new() });
        }
        body.strip_prefix(FAILED_PREFIX)
            .map(|names| Self { saved: Vec::new(), failed: split_names(names) })
    }
}

impl fmt::Display for UploadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_success() {
            write!(f, "{}{}", SAVED_PREFIX, self.saved.join(", "))
        } else {
            write!(f, "{}{}", FAILED_PREFIX, self.failed.join(", "))
        }
    }
}

fn split_names(names: &str) -> Vec<String> {
    names
        .trim_end()
        .split(", ")
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Final path component of a client-supplied file name; `None` when nothing usable is left
pub fn base_name(name: &str) -> Option<String> {
    Path::new(name)
        .file_name()
        .and_then(|base| base.to_str())
        .filter(|base| !base.is_empty())
        .map(str::to_string)
}
