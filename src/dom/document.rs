//! Page model: the element tree plus everything the labeler layers on top of it.
//!
//! A [`Document`] owns the current [`DomTree`] snapshot, the overlay [`Surface`] where the
//! labeling modal mounts its backdrop and panel, and the registry of capture-phase click
//! listeners. [`Document::dispatch_click`] runs every capture listener and then performs
//! the default action unless one of them prevented it.

use crate::dom::tree::{DomTree, NodePath};
use std::rc::Rc;

/// Number of most recent default actions a [`Document`] remembers
pub const DEFAULT_ACTION_HISTORY: usize = 64;

/// Element id of the modal panel when mounted into a live page
pub const PANEL_ELEMENT_ID: &str = "__ux_session_panel";

/// Element id of the dimming backdrop when mounted into a live page
pub const BACKDROP_ELEMENT_ID: &str = "__ux_session_backdrop";

/// Handle of a node mounted on the overlay surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Backdrop,
    Panel,
}

impl OverlayKind {
    /// The element id this node carries in the page
    pub fn element_id(&self) -> &'static str {
        match self {
            OverlayKind::Backdrop => BACKDROP_ELEMENT_ID,
            OverlayKind::Panel => PANEL_ELEMENT_ID,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayNode {
    pub id: OverlayId,
    pub kind: OverlayKind,
}

/// Overlay layer above the page content
#[derive(Debug, Default)]
pub struct Surface {
    nodes: Vec<OverlayNode>,
    body_scroll_locked: bool,
    next_id: u64,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new overlay node and return its handle
    pub fn mount(&mut self, kind: OverlayKind) -> OverlayId {
        self.next_id += 1;
        let id = OverlayId(self.next_id);
        self.nodes.push(OverlayNode { id, kind });
        id
    }

    /// Remove every node of the given kind, returning how many were removed
    pub fn remove_kind(&mut self, kind: OverlayKind) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|node| node.kind != kind);
        before - self.nodes.len()
    }

    /// Remove a single node; `false` if it was no longer mounted
    pub fn remove(&mut self, id: OverlayId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|node| node.id != id);
        before != self.nodes.len()
    }

    pub fn is_mounted(&self, id: OverlayId) -> bool {
        self.nodes.iter().any(|node| node.id == id)
    }

    /// First mounted node of the given kind
    pub fn find(&self, kind: OverlayKind) -> Option<OverlayId> {
        self.nodes.iter().find(|node| node.kind == kind).map(|node| node.id)
    }

    pub fn nodes(&self) -> &[OverlayNode] {
        &self.nodes
    }

    pub fn lock_body_scroll(&mut self) {
        self.body_scroll_locked = true;
    }

    pub fn unlock_body_scroll(&mut self) {
        self.body_scroll_locked = false;
    }

    pub fn is_body_scroll_locked(&self) -> bool {
        self.body_scroll_locked
    }
}

/// What a click landed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    /// An element of the page content
    Element(NodePath),
    /// An overlay node, or any control inside it
    Overlay(OverlayId),
}

/// A click travelling through the capture listeners
#[derive(Debug, Clone)]
pub struct ClickEvent {
    target: ClickTarget,
    default_prevented: bool,
}

impl ClickEvent {
    pub fn new(target: ClickTarget) -> Self {
        Self { target, default_prevented: false }
    }

    pub fn target(&self) -> &ClickTarget {
        &self.target
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// A capture-phase click listener
pub trait ClickListener {
    fn on_click(&self, event: &mut ClickEvent, tree: &DomTree, surface: &mut Surface);
}

/// Registration handle returned by [`Document::add_capture_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A page with its overlay surface and capture listeners
pub struct Document {
    tree: DomTree,
    surface: Surface,
    capture_listeners: Vec<(ListenerId, Rc<dyn ClickListener>)>,
    next_listener_id: u64,
    default_actions: Vec<ClickTarget>,
}

impl Document {
    pub fn new(tree: DomTree) -> Self {
        Self {
            tree,
            surface: Surface::new(),
            capture_listeners: Vec::new(),
            next_listener_id: 0,
            default_actions: Vec::new(),
        }
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Swap in a fresh snapshot of the page; overlays and listeners are kept
    pub fn replace_tree(&mut self, tree: DomTree) {
        self.tree = tree;
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn add_capture_listener(&mut self, listener: Rc<dyn ClickListener>) -> ListenerId {
        self.next_listener_id += 1;
        let id = ListenerId(self.next_listener_id);
        self.capture_listeners.push((id, listener));
        log::debug!("Attached capture click listener {:?}", id);
        id
    }

    /// Detach a listener; `false` if it was not attached
    pub fn remove_capture_listener(&mut self, id: ListenerId) -> bool {
        let before = self.capture_listeners.len();
        self.capture_listeners.retain(|(existing, _)| *existing != id);
        before != self.capture_listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.capture_listeners.len()
    }

    /// Deliver a click to every capture listener, then run the default action unless prevented
    pub fn dispatch_click(&mut self, target: ClickTarget) -> ClickEvent {
        let mut event = ClickEvent::new(target);

        let listeners: Vec<Rc<dyn ClickListener>> =
            self.capture_listeners.iter().map(|(_, listener)| Rc::clone(listener)).collect();
        for listener in listeners {
            listener.on_click(&mut event, &self.tree, &mut self.surface);
        }

        if !event.is_default_prevented() {
            if self.default_actions.len() == DEFAULT_ACTION_HISTORY {
                self.default_actions.remove(0);
            }
            self.default_actions.push(event.target.clone());
        }
        event
    }

    /// Targets whose default click action ran, oldest first, bounded by [`DEFAULT_ACTION_HISTORY`]
    pub fn default_actions(&self) -> &[ClickTarget] {
        &self.default_actions
    }
}
