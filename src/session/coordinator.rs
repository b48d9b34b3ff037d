//! Click coordinator: turns armed clicks into labeled examples.
//!
//! All session state (mode, open modal, example store, attached listener) lives in one
//! `SessionState` shared through `Rc<RefCell<..>>`. Clones of a [`ClickCoordinator`]
//! are handles to the same session, so the copy attached to a [`Document`] as a capture
//! listener and the copy the caller keeps always agree.

use crate::config::LabelingConfig;
use crate::dom::{ClickEvent, ClickListener, ClickTarget, Document, DomTree, ListenerId, Surface};
use crate::error::{LabelerError, Result};
use crate::features::{FeatureRecord, build_features};
use crate::labeling::{LabelChoice, LabelingModal, OverlayHandles, PendingLabel, Submission, assemble_candidates};
use crate::session::store::{Example, ExampleStore};
use std::cell::{Ref, RefCell, RefMut};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Whether clicks are intercepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Clicks pass through untouched
    Inert,
    /// Default click behavior is suppressed and clicked elements are labeled
    Armed,
}

impl From<bool> for Mode {
    fn from(training: bool) -> Self {
        if training { Mode::Armed } else { Mode::Inert }
    }
}

#[derive(Debug)]
enum ModalState {
    Closed,
    Open {
        modal: LabelingModal,
        features: FeatureRecord,
        pending: PendingLabel,
    },
}

#[derive(Debug)]
struct SessionState {
    config: LabelingConfig,
    mode: Mode,
    modal: ModalState,
    store: ExampleStore,
    listener: Option<ListenerId>,
    modal_generation: u64,
}

/// Outcome of [`ClickCoordinator::submit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The modal closed and one example was appended; `total` is the new store size
    Recorded { label: LabelChoice, total: usize },
    /// The typed label was too short; the modal stays open and `alert` should be shown
    Rejected { alert: String },
}

#[derive(Debug, Clone)]
pub struct ClickCoordinator {
    state: Rc<RefCell<SessionState>>,
}

impl ClickCoordinator {
    pub fn new(config: LabelingConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(SessionState {
                config,
                mode: Mode::Inert,
                modal: ModalState::Closed,
                store: ExampleStore::new(),
                listener: None,
                modal_generation: 0,
            })),
        }
    }

    /// Attach the capture listener to `document` and arm training.
    ///
    /// Any listener this session attached earlier is removed first, so calling `init`
    /// repeatedly never stacks listeners.
    pub fn init(&self, document: &mut Document) {
        let previous = self.state.borrow_mut().listener.take();
        if let Some(id) = previous {
            if document.remove_capture_listener(id) {
                log::debug!("Removed previous capture listener {:?}", id);
            }
        }

        let listener: Rc<dyn ClickListener> = Rc::new(self.clone());
        let id = document.add_capture_listener(listener);

        let mut state = self.state.borrow_mut();
        state.listener = Some(id);
        state.mode = Mode::Armed;
        log::info!("Labeling session initialized ({} example(s) kept)", state.store.len());
    }

    /// Detach the listener, close any open modal and drop every recorded example
    pub fn reset(&self, document: &mut Document) {
        let mut state = self.state.borrow_mut();
        if let Some(id) = state.listener.take() {
            document.remove_capture_listener(id);
        }
        if let ModalState::Open { modal, .. } = std::mem::replace(&mut state.modal, ModalState::Closed) {
            modal.close(document.surface_mut());
        }
        state.store.clear();
        state.mode = Mode::Inert;
        log::info!("Labeling session reset");
    }

    /// External activation toggle
    pub fn set_training(&self, training: bool) {
        let mode = Mode::from(training);
        let mut state = self.state.borrow_mut();
        if state.mode != mode {
            log::debug!("Training mode {:?} -> {:?}", state.mode, mode);
            state.mode = mode;
        }
    }

    pub fn mode(&self) -> Mode {
        self.state.borrow().mode
    }

    pub fn is_attached(&self) -> bool {
        self.state.borrow().listener.is_some()
    }

    pub fn is_modal_open(&self) -> bool {
        matches!(self.state.borrow().modal, ModalState::Open { .. })
    }

    pub fn modal_handles(&self) -> Option<OverlayHandles> {
        match &self.state.borrow().modal {
            ModalState::Open { modal, .. } => Some(modal.handles()),
            ModalState::Closed => None,
        }
    }

    /// Read access to the open modal
    pub fn modal(&self) -> Option<Ref<'_, LabelingModal>> {
        Ref::filter_map(self.state.borrow(), |state| match &state.modal {
            ModalState::Open { modal, .. } => Some(modal),
            ModalState::Closed => None,
        })
        .ok()
    }

    /// Drive the open modal's controls (radio selection, free-text field)
    pub fn modal_mut(&self) -> Option<RefMut<'_, LabelingModal>> {
        RefMut::filter_map(self.state.borrow_mut(), |state| match &mut state.modal {
            ModalState::Open { modal, .. } => Some(modal),
            ModalState::Closed => None,
        })
        .ok()
    }

    /// Counts presented modals; changes whenever a new modal replaces the visible one
    pub fn modal_generation(&self) -> u64 {
        self.state.borrow().modal_generation
    }

    pub fn example_count(&self) -> usize {
        self.state.borrow().store.len()
    }

    pub fn store(&self) -> Ref<'_, ExampleStore> {
        Ref::map(self.state.borrow(), |state| &state.store)
    }

    pub fn export_json(&self) -> Result<String> {
        self.state.borrow().store.export_json()
    }

    pub fn write_export(&self, dir: &Path) -> Result<PathBuf> {
        self.state.borrow().store.write_export(dir)
    }

    /// Submit the open modal.
    ///
    /// A valid submission closes the modal and appends exactly one example. A rejected
    /// one leaves modal and store untouched.
    pub fn submit(&self, document: &mut Document) -> Result<SubmitOutcome> {
        let mut state = self.state.borrow_mut();
        let (mut modal, features, mut pending) = match std::mem::replace(&mut state.modal, ModalState::Closed) {
            ModalState::Open { modal, features, pending } => (modal, features, pending),
            ModalState::Closed => return Err(LabelerError::NoOpenModal),
        };

        match modal.submit()? {
            Submission::Rejected { alert } => {
                log::debug!("Rejected label submission: {}", alert);
                state.modal = ModalState::Open { modal, features, pending };
                Ok(SubmitOutcome::Rejected { alert })
            }
            Submission::Resolved => {
                modal.close(document.surface_mut());
                let label = pending.try_resolve().ok_or(LabelerError::LabelDiscarded)??;

                state.store.push(Example::new(features, label.clone()));
                let total = state.store.len();
                log::info!("Recorded example #{} labeled '{}'", total, label);
                Ok(SubmitOutcome::Recorded { label, total })
            }
        }
    }
}

impl ClickListener for ClickCoordinator {
    fn on_click(&self, event: &mut ClickEvent, tree: &DomTree, surface: &mut Surface) {
        let mut state = self.state.borrow_mut();
        if state.mode == Mode::Inert {
            return;
        }

        if let ModalState::Open { modal, .. } = &state.modal {
            if modal.contains(event.target()) {
                return;
            }
        }

        let path = match event.target() {
            ClickTarget::Element(path) => path.clone(),
            ClickTarget::Overlay(id) => {
                log::debug!("Click on detached overlay node {:?} passed through", id);
                return;
            }
        };

        event.prevent_default();

        let Some(features) = build_features(tree, &path, &state.config) else {
            log::warn!("Clicked element {} is not in the current snapshot", path);
            return;
        };

        let candidates = assemble_candidates(
            &features.context_headings,
            &state.config.fallback_labels,
            state.config.max_candidates,
        );
        let prompt = state.config.other_label_prompt.clone();
        let (modal, pending) = LabelingModal::present(surface, candidates, features.vertical_position_percent, prompt);

        if matches!(state.modal, ModalState::Open { .. }) {
            log::debug!("Replacing the open modal; its label is discarded");
        }
        log::debug!("Presenting modal for <{}> at {}%", features.tag, features.vertical_position_percent);
        state.modal = ModalState::Open { modal, features, pending };
        state.modal_generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementNode, NodePath, Viewport};
    use crate::labeling::Selection;

    fn page() -> Document {
        let section = ElementNode::new("section").with_children(vec![
            ElementNode::new("h2").with_text("Planos"),
            ElementNode::new("a")
                .with_id("cta")
                .with_text("Assine já")
                .with_bounding_box(0.0, 450.0, 120.0, 40.0),
        ]);
        let body = ElementNode::new("body").with_children(vec![section]);
        let tree = DomTree::new(ElementNode::new("html").with_children(vec![body]))
            .with_viewport(Viewport::new(0.0, 1000.0, 900.0));
        Document::new(tree)
    }

    fn cta(document: &Document) -> ClickTarget {
        ClickTarget::Element(document.tree().find_by_id("cta").unwrap())
    }

    #[test]
    fn test_inert_clicks_pass_through() {
        let mut document = page();
        let coordinator = ClickCoordinator::new(LabelingConfig::default());
        coordinator.init(&mut document);
        coordinator.set_training(false);

        let target = cta(&document);
        let event = document.dispatch_click(target);

        assert!(!event.is_default_prevented());
        assert!(!coordinator.is_modal_open());
        assert_eq!(document.default_actions().len(), 1);
    }

    #[test]
    fn test_armed_click_presents_modal() {
        let mut document = page();
        let coordinator = ClickCoordinator::new(LabelingConfig::default());
        coordinator.init(&mut document);
        assert_eq!(coordinator.mode(), Mode::Armed);

        let target = cta(&document);
        let event = document.dispatch_click(target);

        assert!(event.is_default_prevented());
        assert!(document.default_actions().is_empty());
        assert!(document.surface().is_body_scroll_locked());

        let modal = coordinator.modal().unwrap();
        assert_eq!(modal.position_percent(), 45);
        assert_eq!(modal.candidates()[0], "Planos");
        assert_eq!(modal.candidates().len(), 8);
        assert_eq!(modal.selection(), Selection::Candidate(0));
    }

    #[test]
    fn test_submit_records_example_and_closes() {
        let mut document = page();
        let coordinator = ClickCoordinator::new(LabelingConfig::default());
        coordinator.init(&mut document);
        let target = cta(&document);
        document.dispatch_click(target);

        coordinator.modal_mut().unwrap().select_candidate(1).unwrap();
        let outcome = coordinator.submit(&mut document).unwrap();

        match outcome {
            SubmitOutcome::Recorded { label, total } => {
                assert_eq!(label.as_str(), "Menu");
                assert_eq!(total, 1);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(!coordinator.is_modal_open());
        assert!(document.surface().nodes().is_empty());
        assert!(!document.surface().is_body_scroll_locked());

        let store = coordinator.store();
        let example = store.get(0).unwrap();
        assert_eq!(example.features().element_id, "cta");
        assert_eq!(example.session_label().as_str(), "Menu");
    }

    #[test]
    fn test_submit_without_modal() {
        let mut document = page();
        let coordinator = ClickCoordinator::new(LabelingConfig::default());
        assert!(matches!(coordinator.submit(&mut document), Err(LabelerError::NoOpenModal)));
    }

    #[test]
    fn test_rejected_submission_keeps_modal_open() {
        let mut document = page();
        let coordinator = ClickCoordinator::new(LabelingConfig::default());
        coordinator.init(&mut document);
        let target = cta(&document);
        document.dispatch_click(target);

        {
            let mut modal = coordinator.modal_mut().unwrap();
            modal.select_other();
            modal.type_other(" x ");
        }
        let outcome = coordinator.submit(&mut document).unwrap();

        assert_eq!(outcome, SubmitOutcome::Rejected { alert: "Digite um nome para a sessão".to_string() });
        assert!(coordinator.is_modal_open());
        assert_eq!(coordinator.example_count(), 0);
        assert_eq!(document.surface().nodes().len(), 2);
    }

    #[test]
    fn test_short_fallback_label_never_resolves() {
        let body = ElementNode::new("body").with_children(vec![ElementNode::new("button").with_id("lonely")]);
        let mut document = Document::new(DomTree::new(ElementNode::new("html").with_children(vec![body])));
        let config = LabelingConfig { fallback_labels: vec!["x".to_string()], ..LabelingConfig::default() };
        let coordinator = ClickCoordinator::new(config);
        coordinator.init(&mut document);

        let target = ClickTarget::Element(document.tree().find_by_id("lonely").unwrap());
        document.dispatch_click(target);

        {
            let modal = coordinator.modal().unwrap();
            assert!(modal.candidates().is_empty());
            assert_eq!(modal.selection(), Selection::Other);
        }
        let outcome = coordinator.submit(&mut document).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Rejected { .. }));
        assert_eq!(coordinator.example_count(), 0);
    }

    #[test]
    fn test_second_page_click_replaces_modal() {
        let mut document = page();
        let coordinator = ClickCoordinator::new(LabelingConfig::default());
        coordinator.init(&mut document);

        let target = cta(&document);
        document.dispatch_click(target);
        let first = coordinator.modal_handles().unwrap();
        document.dispatch_click(ClickTarget::Element(NodePath::from(vec![0, 0, 0])));
        let second = coordinator.modal_handles().unwrap();

        assert_ne!(first, second);
        assert_eq!(coordinator.modal_generation(), 2);
        assert_eq!(document.surface().nodes().len(), 2);
        assert!(!document.surface().is_mounted(first.panel));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut document = page();
        let coordinator = ClickCoordinator::new(LabelingConfig::default());
        coordinator.init(&mut document);
        let target = cta(&document);
        document.dispatch_click(target.clone());
        coordinator.submit(&mut document).unwrap();
        document.dispatch_click(target);

        coordinator.reset(&mut document);

        assert_eq!(document.listener_count(), 0);
        assert!(!coordinator.is_attached());
        assert!(!coordinator.is_modal_open());
        assert_eq!(coordinator.example_count(), 0);
        assert_eq!(coordinator.mode(), Mode::Inert);
        assert!(document.surface().nodes().is_empty());
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(Mode::from(true), Mode::Armed);
        assert_eq!(Mode::from(false), Mode::Inert);
    }
}
