use crate::error::{LabelerError, Result};
use crate::features::FeatureRecord;
use crate::labeling::LabelChoice;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// File name of the exported dataset
pub const EXPORT_FILE_NAME: &str = "ux_examples.json";

/// One labeled element: its features plus the confirmed session label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Example {
    #[serde(rename = "sessao")]
    session_label: LabelChoice,

    #[serde(flatten)]
    features: FeatureRecord,
}

impl Example {
    pub(crate) fn new(features: FeatureRecord, session_label: LabelChoice) -> Self {
        Self { session_label, features }
    }

    pub fn session_label(&self) -> &LabelChoice {
        &self.session_label
    }

    pub fn features(&self) -> &FeatureRecord {
        &self.features
    }
}

/// Ordered, append-only collection of examples for one labeling session
#[derive(Debug, Clone, Default)]
pub struct ExampleStore {
    examples: Vec<Example>,
}

impl ExampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, example: Example) {
        self.examples.push(example);
    }

    /// Drop every example; only a session reset does this
    pub(crate) fn clear(&mut self) {
        self.examples.clear();
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Example> {
        self.examples.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Example> {
        self.examples.iter()
    }

    /// Pretty-printed JSON array of the examples recorded so far
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.examples)?)
    }

    /// Write the current snapshot to `dir/ux_examples.json`
    pub fn write_export(&self, dir: &Path) -> Result<PathBuf> {
        let json = self.export_json()?;
        std::fs::create_dir_all(dir).map_err(|e| LabelerError::io(dir, e))?;

        let path = dir.join(EXPORT_FILE_NAME);
        std::fs::write(&path, json).map_err(|e| LabelerError::io(&path, e))?;
        log::info!("Exported {} example(s) to {}", self.len(), path.display());
        Ok(path)
    }
}
