use crate::config::MIN_LABEL_CHARS;
use crate::dom::{ClickTarget, OverlayId, OverlayKind, Surface};
use crate::error::{LabelerError, Result};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// A label confirmed through the modal.
///
/// Either one of the offered candidates or free text of at least two characters after
/// trimming. There is no public way to build one from an arbitrary string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LabelChoice(String);

impl LabelChoice {
    fn candidate(text: &str) -> Self {
        Self(text.to_string())
    }

    /// Accept typed text when it is long enough once trimmed
    pub fn free_text(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (trimmed.chars().count() >= MIN_LABEL_CHARS).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LabelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LabelChoice {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Which radio option is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Candidate(usize),
    Other,
}

/// State of the free-text field next to the "Other" option
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtherField {
    pub visible: bool,
    pub focused: bool,
    pub text: String,
}

/// Overlay nodes owned by one modal instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayHandles {
    pub backdrop: OverlayId,
    pub panel: OverlayId,
}

/// Result of a submit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The label was sent to the waiting side; the modal can be closed
    Resolved,
    /// The free text was too short; the modal stays open and shows `alert`
    Rejected { alert: String },
}

/// Resolution side of a presented modal
#[derive(Debug)]
pub struct PendingLabel {
    rx: oneshot::Receiver<LabelChoice>,
}

impl PendingLabel {
    /// Non-blocking check: `None` while the modal is still waiting for a valid submission
    pub fn try_resolve(&mut self) -> Option<Result<LabelChoice>> {
        match self.rx.try_recv() {
            Ok(label) => Some(Ok(label)),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(LabelerError::LabelDiscarded)),
        }
    }
}

impl Future for PendingLabel {
    type Output = Result<LabelChoice>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.map_err(|_| LabelerError::LabelDiscarded))
    }
}

/// Blocking decision UI for one element.
///
/// Mounting removes any panel or backdrop left on the surface, so at most one modal is
/// ever visible. The only way out is a valid [`LabelingModal::submit`] followed by
/// [`LabelingModal::close`].
#[derive(Debug)]
pub struct LabelingModal {
    candidates: Vec<String>,
    position_percent: u8,
    selection: Selection,
    other: OtherField,
    handles: OverlayHandles,
    prompt: String,
    resolver: Option<oneshot::Sender<LabelChoice>>,
}

impl LabelingModal {
    /// Mount a modal offering `candidates` and return it with its pending label
    pub fn present(
        surface: &mut Surface,
        candidates: Vec<String>,
        position_percent: u8,
        prompt: impl Into<String>,
    ) -> (Self, PendingLabel) {
        let stale = surface.remove_kind(OverlayKind::Panel) + surface.remove_kind(OverlayKind::Backdrop);
        if stale > 0 {
            log::debug!("Removed {} stale overlay node(s) before presenting modal", stale);
        }

        let backdrop = surface.mount(OverlayKind::Backdrop);
        let panel = surface.mount(OverlayKind::Panel);
        surface.lock_body_scroll();

        let (selection, other) = if candidates.is_empty() {
            (Selection::Other, OtherField { visible: true, focused: true, text: String::new() })
        } else {
            (Selection::Candidate(0), OtherField::default())
        };

        let (tx, rx) = oneshot::channel();
        let modal = Self {
            candidates,
            position_percent,
            selection,
            other,
            handles: OverlayHandles { backdrop, panel },
            prompt: prompt.into(),
            resolver: Some(tx),
        };
        (modal, PendingLabel { rx })
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn position_percent(&self) -> u8 {
        self.position_percent
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn other_field(&self) -> &OtherField {
        &self.other
    }

    pub fn handles(&self) -> OverlayHandles {
        self.handles
    }

    /// Whether a click target is this modal's panel or backdrop
    pub fn contains(&self, target: &ClickTarget) -> bool {
        match target {
            ClickTarget::Overlay(id) => *id == self.handles.panel || *id == self.handles.backdrop,
            ClickTarget::Element(_) => false,
        }
    }

    /// Check one of the offered candidates; hides the free-text field
    pub fn select_candidate(&mut self, index: usize) -> Result<()> {
        if index >= self.candidates.len() {
            return Err(LabelerError::NoSuchCandidate { index, available: self.candidates.len() });
        }
        self.selection = Selection::Candidate(index);
        self.other.visible = false;
        self.other.focused = false;
        Ok(())
    }

    /// Check "Other"; reveals and focuses the free-text field
    pub fn select_other(&mut self) {
        self.selection = Selection::Other;
        self.other.visible = true;
        self.other.focused = true;
    }

    /// Replace the contents of the free-text field
    pub fn type_other(&mut self, text: impl Into<String>) {
        self.other.text = text.into();
    }

    /// Try to resolve with the current selection
    pub fn submit(&mut self) -> Result<Submission> {
        if self.resolver.is_none() {
            return Err(LabelerError::NoOpenModal);
        }

        let choice = match self.selection {
            Selection::Candidate(index) => LabelChoice::candidate(&self.candidates[index]),
            Selection::Other => match LabelChoice::free_text(&self.other.text) {
                Some(choice) => choice,
                None => {
                    self.other.focused = true;
                    return Ok(Submission::Rejected { alert: self.prompt.clone() });
                }
            },
        };

        if let Some(resolver) = self.resolver.take() {
            if resolver.send(choice).is_err() {
                log::debug!("Label resolved after its receiver was dropped");
            }
        }
        Ok(Submission::Resolved)
    }

    /// Unmount backdrop and panel and restore page scrolling
    pub fn close(self, surface: &mut Surface) {
        surface.remove(self.handles.panel);
        surface.remove(self.handles.backdrop);
        surface.unlock_body_scroll();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodePath;

    const PROMPT: &str = "Digite um nome para a sessão";

    fn candidates() -> Vec<String> {
        vec!["Planos".to_string(), "Menu".to_string()]
    }

    #[test]
    fn test_present_mounts_single_instance() {
        let mut surface = Surface::new();
        let (first, _pending) = LabelingModal::present(&mut surface, candidates(), 40, PROMPT);
        let (second, _pending) = LabelingModal::present(&mut surface, candidates(), 40, PROMPT);

        assert_eq!(surface.nodes().len(), 2);
        assert!(!surface.is_mounted(first.handles().panel));
        assert!(surface.is_mounted(second.handles().panel));
        assert!(surface.is_body_scroll_locked());
    }

    #[test]
    fn test_initial_selection() {
        let mut surface = Surface::new();
        let (modal, _pending) = LabelingModal::present(&mut surface, candidates(), 0, PROMPT);
        assert_eq!(modal.selection(), Selection::Candidate(0));
        assert!(!modal.other_field().visible);

        let (modal, _pending) = LabelingModal::present(&mut surface, Vec::new(), 0, PROMPT);
        assert_eq!(modal.selection(), Selection::Other);
        assert!(modal.other_field().visible);
    }

    #[test]
    fn test_other_field_visibility_follows_selection() {
        let mut surface = Surface::new();
        let (mut modal, _pending) = LabelingModal::present(&mut surface, candidates(), 0, PROMPT);

        modal.select_other();
        assert!(modal.other_field().visible);
        assert!(modal.other_field().focused);

        modal.select_candidate(1).unwrap();
        assert!(!modal.other_field().visible);
        assert!(matches!(
            modal.select_candidate(5),
            Err(LabelerError::NoSuchCandidate { index: 5, available: 2 })
        ));
    }

    #[tokio::test]
    async fn test_submit_candidate_resolves() {
        let mut surface = Surface::new();
        let (mut modal, pending) = LabelingModal::present(&mut surface, candidates(), 0, PROMPT);

        modal.select_candidate(1).unwrap();
        assert_eq!(modal.submit().unwrap(), Submission::Resolved);
        modal.close(&mut surface);

        assert_eq!(pending.await.unwrap().as_str(), "Menu");
        assert!(surface.nodes().is_empty());
        assert!(!surface.is_body_scroll_locked());
    }

    #[tokio::test]
    async fn test_other_text_is_trimmed() {
        let mut surface = Surface::new();
        let (mut modal, pending) = LabelingModal::present(&mut surface, candidates(), 0, PROMPT);

        modal.select_other();
        modal.type_other("  ab  ");
        assert_eq!(modal.submit().unwrap(), Submission::Resolved);

        assert_eq!(pending.await.unwrap().as_str(), "ab");
    }

    #[test]
    fn test_short_other_text_is_rejected() {
        let mut surface = Surface::new();
        let (mut modal, mut pending) = LabelingModal::present(&mut surface, candidates(), 0, PROMPT);

        modal.select_other();
        modal.type_other("a");
        modal.other.focused = false;

        assert_eq!(modal.submit().unwrap(), Submission::Rejected { alert: PROMPT.to_string() });
        assert!(modal.other_field().focused);
        assert!(pending.try_resolve().is_none());
        assert_eq!(surface.nodes().len(), 2);

        modal.type_other(" Depoimentos ");
        assert_eq!(modal.submit().unwrap(), Submission::Resolved);
        assert_eq!(pending.try_resolve().unwrap().unwrap().as_str(), "Depoimentos");
        assert!(matches!(modal.submit(), Err(LabelerError::NoOpenModal)));
    }

    #[test]
    fn test_dropped_modal_discards_label() {
        let mut surface = Surface::new();
        let (modal, mut pending) = LabelingModal::present(&mut surface, candidates(), 0, PROMPT);
        drop(modal);

        assert!(matches!(pending.try_resolve(), Some(Err(LabelerError::LabelDiscarded))));
    }

    #[test]
    fn test_contains_by_handle_identity() {
        let mut surface = Surface::new();
        let (modal, _pending) = LabelingModal::present(&mut surface, candidates(), 0, PROMPT);
        let handles = modal.handles();

        assert!(modal.contains(&ClickTarget::Overlay(handles.panel)));
        assert!(modal.contains(&ClickTarget::Overlay(handles.backdrop)));
        assert!(!modal.contains(&ClickTarget::Element(NodePath::root())));

        let stray = surface.mount(OverlayKind::Panel);
        assert!(!modal.contains(&ClickTarget::Overlay(stray)));
    }

    #[test]
    fn test_free_text_threshold() {
        assert!(LabelChoice::free_text(" a ").is_none());
        assert!(LabelChoice::free_text("").is_none());
        assert_eq!(LabelChoice::free_text("ok").unwrap().to_string(), "ok");
        assert_eq!(LabelChoice::free_text("é!").unwrap().as_ref(), "é!");
    }
}
