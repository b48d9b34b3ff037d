use crate::dom::element::ElementNode;
use crate::error::{LabelerError, Result};
use headless_chrome::Tab;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Scroll offset and document heights captured with a DOM snapshot
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    /// Vertical scroll offset of the window
    #[serde(default)]
    pub scroll_y: f64,

    /// `document.documentElement.scrollHeight` (standards mode height)
    #[serde(default)]
    pub document_element_scroll_height: f64,

    /// `document.body.scrollHeight` (quirks mode height)
    #[serde(default)]
    pub body_scroll_height: f64,
}

impl Viewport {
    pub fn new(scroll_y: f64, document_element_scroll_height: f64, body_scroll_height: f64) -> Self {
        Self { scroll_y, document_element_scroll_height, body_scroll_height }
    }

    /// Height of the scrollable document, whichever rendering mode reports it
    pub fn document_height(&self) -> f64 {
        self.document_element_scroll_height.max(self.body_scroll_height)
    }
}

/// Address of an element as child indices from the root element
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// Path of the root element
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of the `index`-th child of this node
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Path of the parent element, `None` for the root
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }

    /// Number of element siblings that precede this node
    pub fn sibling_index(&self) -> usize {
        self.0.last().copied().unwrap_or(0)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "html")?;
        for index in &self.0 {
            write!(f, " > :nth-child({})", index + 1)?;
        }
        Ok(())
    }
}

/// Snapshot of a page: the element tree rooted at `<html>` plus viewport metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomTree {
    /// Root element of the DOM tree
    pub root: ElementNode,

    /// Scroll offset and document heights at capture time
    #[serde(default)]
    pub viewport: Viewport,
}

impl DomTree {
    /// Create a new DomTree with empty viewport metrics
    pub fn new(root: ElementNode) -> Self {
        Self { root, viewport: Viewport::default() }
    }

    /// Builder method: set viewport metrics
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Build DOM tree from a browser tab
    pub fn from_tab(tab: &Arc<Tab>) -> Result<Self> {
        // The script returns a JSON string
        let js_code = include_str!("extract_dom.js");

        let result = tab
            .evaluate(js_code, false)
            .map_err(|e| LabelerError::DomParseFailed(format!("Failed to execute DOM extraction script: {}", e)))?;

        let json_value = result
            .value
            .ok_or_else(|| LabelerError::DomParseFailed("No value returned from DOM extraction".to_string()))?;

        let json_str: String = serde_json::from_value(json_value)
            .map_err(|e| LabelerError::DomParseFailed(format!("Failed to get JSON string: {}", e)))?;

        Self::from_json(&json_str)
    }

    /// Parse a snapshot produced by the extraction script
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LabelerError::DomParseFailed(format!("Failed to parse DOM JSON: {}", e)))
    }

    /// Convert the DOM tree to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LabelerError::DomParseFailed(format!("Failed to serialize DOM to JSON: {}", e)))
    }

    /// Resolve a path to its element
    pub fn get(&self, path: &NodePath) -> Option<&ElementNode> {
        path.indices()
            .iter()
            .try_fold(&self.root, |node, &index| node.children.get(index))
    }

    /// Preceding sibling elements of `path`, nearest first
    pub fn preceding_siblings<'a>(&'a self, path: &NodePath) -> impl Iterator<Item = &'a ElementNode> + use<'a> {
        let siblings = path
            .parent()
            .and_then(|parent| self.get(&parent))
            .map(|parent| &parent.children[..path.sibling_index().min(parent.children.len())])
            .unwrap_or(&[]);
        siblings.iter().rev()
    }

    /// Ancestor paths of `path`, nearest parent first
    pub fn ancestor_paths(&self, path: &NodePath) -> impl Iterator<Item = NodePath> + use<> {
        std::iter::successors(path.parent(), |p| p.parent())
    }

    /// Find the first element (document order) carrying the given id
    pub fn find_by_id(&self, id: &str) -> Option<NodePath> {
        Self::find_recursive(&self.root, NodePath::root(), &|node: &ElementNode| node.id() == Some(id))
    }

    fn find_recursive(
        node: &ElementNode,
        path: NodePath,
        predicate: &dyn Fn(&ElementNode) -> bool,
    ) -> Option<NodePath> {
        if predicate(node) {
            return Some(path);
        }

        node.children
            .iter()
            .enumerate()
            .find_map(|(i, child)| Self::find_recursive(child, path.child(i), predicate))
    }

    /// Count total elements in the tree
    pub fn count_elements(&self) -> usize {
        Self::count_elements_recursive(&self.root)
    }

    fn count_elements_recursive(node: &ElementNode) -> usize {
        1 + node.children.iter().map(Self::count_elements_recursive).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_tree() -> DomTree {
        let body = ElementNode::new("body").with_children(vec![
            ElementNode::new("header").with_children(vec![ElementNode::new("button").with_id("nav-btn")]),
            ElementNode::new("main").with_children(vec![
                ElementNode::new("h2").with_text("Planos"),
                ElementNode::new("a").with_text("Click here"),
                ElementNode::new("div").with_id("content"),
            ]),
        ]);

        DomTree::new(ElementNode::new("html").with_children(vec![ElementNode::new("head"), body]))
    }

    #[test]
    fn test_get_resolves_paths() {
        let tree = create_test_tree();

        assert!(tree.get(&NodePath::root()).unwrap().is_tag("html"));
        assert!(tree.get(&NodePath::from(vec![1, 1, 2])).unwrap().is_tag("div"));
        assert!(tree.get(&NodePath::from(vec![1, 5])).is_none());
    }

    #[test]
    fn test_node_path_navigation() {
        let path = NodePath::from(vec![1, 1, 2]);

        assert_eq!(path.sibling_index(), 2);
        assert_eq!(path.parent(), Some(NodePath::from(vec![1, 1])));
        assert_eq!(NodePath::root().parent(), None);
        assert_eq!(path.to_string(), "html > :nth-child(2) > :nth-child(2) > :nth-child(3)");
    }

    #[test]
    fn test_preceding_siblings_nearest_first() {
        let tree = create_test_tree();
        let div = tree.find_by_id("content").unwrap();

        let tags: Vec<&str> = tree.preceding_siblings(&div).map(|n| n.tag_name.as_str()).collect();
        assert_eq!(tags, vec!["a", "h2"]);

        assert_eq!(tree.preceding_siblings(&NodePath::root()).count(), 0);
    }

    #[test]
    fn test_ancestor_paths() {
        let tree = create_test_tree();
        let div = tree.find_by_id("content").unwrap();

        let tags: Vec<String> = tree
            .ancestor_paths(&div)
            .filter_map(|p| tree.get(&p).map(|n| n.tag_name.clone()))
            .collect();
        assert_eq!(tags, vec!["main", "body", "html"]);
    }

    #[test]
    fn test_count_elements() {
        let tree = create_test_tree();
        // html, head, body, header, button, main, h2, a, div
        assert_eq!(tree.count_elements(), 9);
    }

    #[test]
    fn test_viewport_document_height() {
        assert_eq!(Viewport::new(0.0, 1200.0, 900.0).document_height(), 1200.0);
        assert_eq!(Viewport::new(0.0, 0.0, 900.0).document_height(), 900.0);
    }

    #[test]
    fn test_json_roundtrip_from_extraction_format() {
        let json = r#"{
            "root": {"tag_name": "html", "children": [
                {"tag_name": "body", "class": ["a", "b"], "children": [
                    {"tag_name": "p", "text_content": "Oi", "bounding_box": {"x": 0, "y": 40, "width": 10, "height": 10}}
                ]}
            ]},
            "viewport": {"scrollY": 100, "documentElementScrollHeight": 2000, "bodyScrollHeight": 1800}
        }"#;

        let tree = DomTree::from_json(json).unwrap();
        assert_eq!(tree.viewport.scroll_y, 100.0);
        assert_eq!(tree.viewport.document_height(), 2000.0);
        assert_eq!(tree.root.children[0].class_name.normalize(), "a b");

        let json = tree.to_json().unwrap();
        assert!(json.contains("\"scrollY\""));
        assert!(DomTree::from_json("not json").is_err());
    }
}
