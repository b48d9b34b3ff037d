//! Labeler configuration.
//!
//! Loaded from a TOML file (`session-labeler.toml` by default). Every field has a default,
//! except the upload token which must be set before the upload endpoint can be served.

use crate::error::{LabelerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "session-labeler.toml";

/// Minimum length of a label, after trimming
pub const MIN_LABEL_CHARS: usize = 2;

/// Upper bound for `labeling.max_candidates`
pub const MAX_CANDIDATES: usize = 10;

/// Upper bound for `labeling.max_context_headings`
pub const MAX_CONTEXT_HEADINGS: usize = 5;

/// Upper bound for `labeling.ancestor_depth`
pub const MAX_ANCESTOR_DEPTH: usize = 3;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelerConfig {
    #[serde(default)]
    pub labeling: LabelingConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub browser: BrowserConfig,
}

/// `[labeling]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelingConfig {
    /// Labels offered after the context headings, in order
    #[serde(default = "default_fallback_labels")]
    pub fallback_labels: Vec<String>,

    /// Maximum number of candidates shown in the modal
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Maximum number of context headings collected per element
    #[serde(default = "default_max_context_headings")]
    pub max_context_headings: usize,

    /// Number of ancestors summarized in each feature record
    #[serde(default = "default_ancestor_depth")]
    pub ancestor_depth: usize,

    /// Alert shown when the free-text label is too short
    #[serde(default = "default_other_label_prompt")]
    pub other_label_prompt: String,
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            fallback_labels: default_fallback_labels(),
            max_candidates: default_max_candidates(),
            max_context_headings: default_max_context_headings(),
            ancestor_depth: default_ancestor_depth(),
            other_label_prompt: default_other_label_prompt(),
        }
    }
}

fn default_fallback_labels() -> Vec<String> {
    ["Menu", "Hero", "Conteúdo", "Rodape", "Footer", "Header", "Topo"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_max_candidates() -> usize {
    MAX_CANDIDATES
}
fn default_max_context_headings() -> usize {
    MAX_CONTEXT_HEADINGS
}
fn default_ancestor_depth() -> usize {
    MAX_ANCESTOR_DEPTH
}
fn default_other_label_prompt() -> String {
    "Digite um nome para a sessão".into()
}

/// `[upload]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Shared secret expected in the `token` form field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Origins allowed to call the endpoint cross-origin
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Directory accepted files are written to
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Address the upload server binds to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Route of the upload endpoint
    #[serde(default = "default_upload_path")]
    pub path: String,

    /// Maximum accepted request body size
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            token: None,
            allowed_origins: default_allowed_origins(),
            upload_dir: default_upload_dir(),
            bind: default_bind(),
            path: default_upload_path(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl UploadConfig {
    /// The configured token, or a config error when it is missing or blank
    pub fn require_token(&self) -> Result<&str> {
        match self.token.as_deref() {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(LabelerError::config("upload.token must be set to serve or send uploads")),
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec!["https://www.ton.com.br".into()]
}
fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}
fn default_bind() -> String {
    "127.0.0.1:8080".into()
}
fn default_upload_path() -> String {
    "/upload".into()
}
fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

/// `[browser]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub headless: bool,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Delay between page polls while labeling
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Directory `ux_examples.json` is written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            window_width: default_window_width(),
            window_height: default_window_height(),
            poll_interval_ms: default_poll_interval_ms(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_window_width() -> u32 {
    1366
}
fn default_window_height() -> u32 {
    900
}
fn default_poll_interval_ms() -> u64 {
    250
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl LabelerConfig {
    /// Check invariants the labeling flow relies on
    pub fn validate(&self) -> Result<()> {
        let labeling = &self.labeling;
        if !(1..=MAX_CANDIDATES).contains(&labeling.max_candidates) {
            return Err(LabelerError::config(format!(
                "labeling.max_candidates must be between 1 and {MAX_CANDIDATES}"
            )));
        }
        if !(1..=MAX_CONTEXT_HEADINGS).contains(&labeling.max_context_headings) {
            return Err(LabelerError::config(format!(
                "labeling.max_context_headings must be between 1 and {MAX_CONTEXT_HEADINGS}"
            )));
        }
        if labeling.ancestor_depth > MAX_ANCESTOR_DEPTH {
            return Err(LabelerError::config(format!(
                "labeling.ancestor_depth must be at most {MAX_ANCESTOR_DEPTH}"
            )));
        }
        if let Some(label) = labeling
            .fallback_labels
            .iter()
            .find(|label| label.trim().chars().count() < MIN_LABEL_CHARS)
        {
            return Err(LabelerError::config(format!(
                "fallback label {label:?} is shorter than {MIN_LABEL_CHARS} characters"
            )));
        }
        if !self.upload.path.starts_with('/') {
            return Err(LabelerError::config("upload.path must start with '/'"));
        }
        Ok(())
    }
}

/// Load configuration from `path`, falling back to defaults when the file does not exist
pub fn load_config(path: Option<&Path>) -> Result<LabelerConfig> {
    let path = path.unwrap_or_else(|| Path::new(CONFIG_FILE_NAME));

    if !path.exists() {
        log::debug!("Config file {} not found, using defaults", path.display());
        return Ok(LabelerConfig::default());
    }

    load_config_from(path)
}

/// Load and validate configuration from a specific file
pub fn load_config_from(path: &Path) -> Result<LabelerConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LabelerError::io(path, e))?;

    let config: LabelerConfig = toml::from_str(&content)
        .map_err(|e| LabelerError::config(format!("failed to parse {}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

/// Write the default configuration to `path`
pub fn init_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&LabelerConfig::default()).map_err(|e| LabelerError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| LabelerError::io(path, e))?;
    log::info!("Wrote default config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LabelerConfig::default();

        assert_eq!(
            config.labeling.fallback_labels,
            vec!["Menu", "Hero", "Conteúdo", "Rodape", "Footer", "Header", "Topo"]
        );
        assert_eq!(config.labeling.max_candidates, 10);
        assert_eq!(config.labeling.max_context_headings, 5);
        assert_eq!(config.labeling.ancestor_depth, 3);
        assert_eq!(config.upload.path, "/upload");
        assert!(config.upload.token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_str = r#"
[labeling]
fallback_labels = ["Navbar", "Rodapé"]

[upload]
token = "s3cret"
allowed_origins = ["http://localhost:3000"]
"#;
        let config: LabelerConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.labeling.fallback_labels, vec!["Navbar", "Rodapé"]);
        assert_eq!(config.labeling.max_candidates, 10);
        assert_eq!(config.upload.require_token().unwrap(), "s3cret");
        assert_eq!(config.upload.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.browser.poll_interval_ms, 250);
    }

    #[test]
    fn test_require_token() {
        let mut upload = UploadConfig::default();
        assert!(upload.require_token().is_err());

        upload.token = Some("   ".into());
        assert!(upload.require_token().is_err());
    }

    #[test]
    fn test_validate_rejects_short_fallback_label() {
        let mut config = LabelerConfig::default();
        config.labeling.fallback_labels.push(" x ".into());

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("shorter than 2"));
    }

    #[test]
    fn test_validate_rejects_zero_caps() {
        let mut config = LabelerConfig::default();
        config.labeling.max_candidates = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_caps_above_record_bounds() {
        let mut config = LabelerConfig::default();
        config.labeling.max_context_headings = 8;
        assert!(config.validate().unwrap_err().to_string().contains("max_context_headings"));

        let mut config = LabelerConfig::default();
        config.labeling.ancestor_depth = 5;
        assert!(config.validate().unwrap_err().to_string().contains("ancestor_depth"));

        let mut config = LabelerConfig::default();
        config.labeling.max_candidates = 11;
        assert!(config.validate().unwrap_err().to_string().contains("max_candidates"));

        let mut config = LabelerConfig::default();
        config.labeling.ancestor_depth = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_rejects_out_of_bounds_caps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[labeling]\nmax_context_headings = 8\nancestor_depth = 5\n").unwrap();

        assert!(matches!(load_config_from(&path), Err(LabelerError::Config(_))));
    }

    #[test]
    fn test_init_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        init_config(&path).unwrap();
        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.labeling.max_candidates, 10);
        assert_eq!(loaded.upload.bind, "127.0.0.1:8080");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("missing.toml"))).unwrap();
        assert_eq!(config.labeling.ancestor_depth, 3);
    }
}
