//! Live labeling loop.
//!
//! The page runs a thin bridge (`bridge.js`) that intercepts clicks and queues the clicked
//! element's path. The driver polls the bridge, mirrors each click into a [`Document`]
//! built from a fresh DOM snapshot, lets the [`ClickCoordinator`] decide what to do with
//! it, renders the resulting modal into the page and feeds form submissions back.

use crate::browser::session::{BrowserSession, decode_json_result};
use crate::config::{BrowserConfig, LabelingConfig};
use crate::dom::{ClickTarget, Document, DomTree, NodePath};
use crate::error::{LabelerError, Result};
use crate::labeling::render::OTHER_VALUE;
use crate::labeling::{LabelingModal, render_panel};
use crate::session::{ClickCoordinator, SubmitOutcome};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const BRIDGE_SCRIPT: &str = include_str!("bridge.js");

const POLL_SCRIPT: &str =
    "typeof window.__uxl_poll === 'function' ? window.__uxl_poll() : JSON.stringify({ installed: false })";

const UNMOUNT_SCRIPT: &str = "window.__uxl_overlay && window.__uxl_overlay.unmount()";

/// Page operations the driver needs from the labeled tab
pub trait LabelingPage {
    fn navigate(&self, url: &str) -> Result<()>;

    fn wait_for_navigation(&self) -> Result<()>;

    fn evaluate(&self, script: &str) -> Result<Option<serde_json::Value>>;

    fn extract_dom(&self) -> Result<DomTree>;

    /// Evaluate a script that returns a JSON string and deserialize it
    fn evaluate_json<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        decode_json_result(self.evaluate(script)?)
    }
}

impl LabelingPage for BrowserSession {
    fn navigate(&self, url: &str) -> Result<()> {
        BrowserSession::navigate(self, url)
    }

    fn wait_for_navigation(&self) -> Result<()> {
        BrowserSession::wait_for_navigation(self)
    }

    fn evaluate(&self, script: &str) -> Result<Option<serde_json::Value>> {
        BrowserSession::evaluate(self, script)
    }

    fn extract_dom(&self) -> Result<DomTree> {
        BrowserSession::extract_dom(self)
    }
}

/// What the form in the panel reported on submit
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FormSubmission {
    /// Checked radio value: a candidate index, or the free-text marker
    pub choice: Option<String>,
    #[serde(default)]
    pub text: String,
}

/// State drained from the page on each poll
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BridgeState {
    installed: bool,
    #[serde(default)]
    training: bool,
    #[serde(default)]
    clicks: Vec<Vec<usize>>,
    #[serde(default)]
    submission: Option<FormSubmission>,
    #[serde(default)]
    export_requested: bool,
}

#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub poll_interval: Duration,

    /// Directory `ux_examples.json` is written to
    pub output_dir: PathBuf,

    /// End the session once this many examples are recorded
    pub max_examples: Option<usize>,

    /// Consecutive failed polls after which the tab is considered gone
    pub max_consecutive_failures: u32,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self::from(&BrowserConfig::default())
    }
}

impl From<&BrowserConfig> for DriverOptions {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            output_dir: config.output_dir.clone(),
            max_examples: None,
            max_consecutive_failures: 20,
        }
    }
}

impl DriverOptions {
    /// Builder method: stop after `max` examples
    pub fn max_examples(mut self, max: Option<usize>) -> Self {
        self.max_examples = max;
        self
    }

    /// Builder method: set the export directory
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

/// Summary of a finished labeling session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverReport {
    pub examples: usize,
    pub export_path: PathBuf,
}

/// Runs a labeling session against a live browser tab
pub struct LabelingDriver<P = BrowserSession> {
    page: P,
    coordinator: ClickCoordinator,
    options: DriverOptions,
    stop: Arc<AtomicBool>,
    rendered_generation: u64,
}

impl<P: LabelingPage> LabelingDriver<P> {
    pub fn new(page: P, labeling: LabelingConfig, options: DriverOptions) -> Self {
        Self {
            page,
            coordinator: ClickCoordinator::new(labeling),
            options,
            stop: Arc::new(AtomicBool::new(false)),
            rendered_generation: 0,
        }
    }

    /// Builder method: share a flag that ends [`LabelingDriver::run`] at the next poll when set
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn coordinator(&self) -> &ClickCoordinator {
        &self.coordinator
    }

    /// Open `url` and label clicks until the tab stops answering, the example limit is
    /// reached or the stop flag is set.
    ///
    /// A failing poll iteration is logged and retried; only
    /// [`DriverOptions::max_consecutive_failures`] failures in a row end the session. The
    /// dataset is written on every export request and always once more when the loop ends.
    pub fn run(&mut self, url: &str) -> Result<DriverReport> {
        self.page.navigate(url)?;
        self.page.wait_for_navigation()?;

        let mut document = Document::new(self.page.extract_dom()?);
        self.coordinator.init(&mut document);
        self.install_bridge()?;
        log::info!("Labeling {} (training mode on)", url);

        let mut failures = 0;
        while !self.stop.load(Ordering::Relaxed) {
            match self.poll_once(&mut document) {
                Ok(()) => failures = 0,
                Err(e) => {
                    failures += 1;
                    if failures >= self.options.max_consecutive_failures {
                        log::info!("Page stopped answering, ending session: {}", e);
                        break;
                    }
                    log::warn!("Labeling step failed ({}/{}): {}", failures, self.options.max_consecutive_failures, e);
                }
            }

            if let Some(max) = self.options.max_examples {
                if self.coordinator.example_count() >= max {
                    log::info!("Reached {} example(s), ending session", max);
                    break;
                }
            }

            std::thread::sleep(self.options.poll_interval);
        }

        let export_path = self.coordinator.write_export(&self.options.output_dir)?;
        Ok(DriverReport { examples: self.coordinator.example_count(), export_path })
    }

    /// One poll of the bridge and everything it reported
    fn poll_once(&mut self, document: &mut Document) -> Result<()> {
        let state: BridgeState = self.page.evaluate_json(POLL_SCRIPT)?;

        if !state.installed {
            log::info!("Page changed, reinstalling the labeling bridge");
            document.replace_tree(self.page.extract_dom()?);
            self.install_bridge()?;
            self.rendered_generation = 0;
            return self.render_modal();
        }

        self.coordinator.set_training(state.training);
        self.handle_clicks(document, state.clicks)?;
        self.render_modal()?;

        if let Some(submission) = state.submission {
            self.handle_submission(document, &submission)?;
        }

        if state.export_requested {
            self.coordinator.write_export(&self.options.output_dir)?;
        }
        Ok(())
    }

    fn install_bridge(&self) -> Result<()> {
        self.page.evaluate(BRIDGE_SCRIPT)?;
        Ok(())
    }

    fn handle_clicks(&self, document: &mut Document, clicks: Vec<Vec<usize>>) -> Result<()> {
        if clicks.is_empty() {
            return Ok(());
        }

        document.replace_tree(self.page.extract_dom()?);
        for path in clicks {
            let path = NodePath::from(path);
            log::debug!("Click on {}", path);
            document.dispatch_click(ClickTarget::Element(path));
        }
        Ok(())
    }

    /// Mount the coordinator's modal into the page when it has not been rendered yet
    fn render_modal(&mut self) -> Result<()> {
        let generation = self.coordinator.modal_generation();
        if generation == self.rendered_generation {
            return Ok(());
        }

        let html = match self.coordinator.modal() {
            Some(modal) => render_panel(&modal),
            None => return Ok(()),
        };
        self.page.evaluate(&mount_script(&html)?)?;
        self.rendered_generation = generation;
        Ok(())
    }

    fn handle_submission(&mut self, document: &mut Document, submission: &FormSubmission) -> Result<()> {
        match self.coordinator.modal_mut() {
            Some(mut modal) => apply_form(&mut modal, submission)?,
            None => {
                log::debug!("Ignoring form submission without an open modal");
                return Ok(());
            }
        }

        match self.coordinator.submit(document)? {
            SubmitOutcome::Rejected { alert } => {
                self.page.evaluate(&alert_script(&alert)?)?;
            }
            SubmitOutcome::Recorded { label, total } => {
                log::info!("Example saved as '{}'. Total examples: {}", label, total);
                self.page.evaluate(UNMOUNT_SCRIPT)?;
            }
        }
        Ok(())
    }
}

/// Mirror the page form's state into the modal before submitting it
pub fn apply_form(modal: &mut LabelingModal, submission: &FormSubmission) -> Result<()> {
    match submission.choice.as_deref() {
        Some(OTHER_VALUE) => {
            modal.select_other();
            modal.type_other(submission.text.clone());
        }
        Some(value) => {
            let index = value
                .parse::<usize>()
                .map_err(|_| LabelerError::EvaluationFailed(format!("Unexpected radio value {:?}", value)))?;
            modal.select_candidate(index)?;
        }
        None => modal.type_other(submission.text.clone()),
    }
    Ok(())
}

fn mount_script(panel_html: &str) -> Result<String> {
    Ok(format!("window.__uxl_overlay.mount({})", serde_json::to_string(panel_html)?))
}

fn alert_script(message: &str) -> Result<String> {
    Ok(format!("window.__uxl_overlay.alert({})", serde_json::to_string(message)?))
}
