use crate::dom::{DomTree, NodePath};

/// Vertical position of an element as a percentage of the document height.
///
/// Uses the element's viewport-relative top plus the scroll offset, over the larger of
/// the two reported document heights. Always within `0..=100`; a document without height
/// yields 0.
pub fn vertical_position_percent(tree: &DomTree, path: &NodePath) -> u8 {
    let top = tree
        .get(path)
        .and_then(|node| node.bounding_box)
        .map(|bbox| bbox.y)
        .unwrap_or(0.0);
    let absolute_top = top + tree.viewport.scroll_y;
    let height = tree.viewport.document_height();

    if !(height > 0.0) || !absolute_top.is_finite() {
        return 0;
    }
    (100.0 * absolute_top / height).round().clamp(0.0, 100.0) as u8
}

/// 0-based index of an element among its element siblings
pub fn sibling_index(path: &NodePath) -> usize {
    path.sibling_index()
}
