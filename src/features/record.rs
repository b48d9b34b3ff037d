use crate::config::{LabelingConfig, MAX_ANCESTOR_DEPTH, MAX_CONTEXT_HEADINGS};
use crate::dom::{DomTree, ElementNode, NodePath};
use crate::features::context::collect_context_headings;
use crate::features::geometry::{sibling_index, vertical_position_percent};
use serde::{Deserialize, Serialize};

/// Summary of one ancestor of the labeled element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AncestorSummary {
    pub tag: String,
    #[serde(rename = "class")]
    pub css_classes: String,
    pub id: String,
    pub text: String,
}

impl AncestorSummary {
    fn of(node: &ElementNode) -> Self {
        Self {
            tag: node.tag_name.to_ascii_uppercase(),
            css_classes: node.class_name.normalize(),
            id: node.id().unwrap_or_default().to_string(),
            text: node.visible_text().trim().to_string(),
        }
    }
}

/// Structural and contextual features of a clicked element.
///
/// Field names in the serialized form follow the dataset format read by the trainer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureRecord {
    /// Upper-case tag name, as `tagName` reports it
    pub tag: String,

    #[serde(rename = "class")]
    pub css_classes: String,

    #[serde(rename = "id")]
    pub element_id: String,

    /// Trimmed visible text, or the trimmed form value when there is no text
    pub text: String,

    /// Nearest ancestors first
    #[serde(rename = "parents")]
    pub ancestor_chain: Vec<AncestorSummary>,

    /// Character length of the untrimmed visible text
    #[serde(rename = "length")]
    pub text_length: usize,

    #[serde(rename = "y")]
    pub vertical_position_percent: u8,

    #[serde(rename = "siblingIndex")]
    pub sibling_index: usize,

    #[serde(rename = "contextHeadings")]
    pub context_headings: Vec<String>,
}

/// Build the feature record of the element at `path`; `None` if the path does not resolve
pub fn build_features(tree: &DomTree, path: &NodePath, config: &LabelingConfig) -> Option<FeatureRecord> {
    let node = tree.get(path)?;
    let visible = node.visible_text();

    let mut text = visible.trim().to_string();
    if text.is_empty() {
        text = node.value.as_deref().unwrap_or_default().trim().to_string();
    }

    let ancestor_chain = tree
        .ancestor_paths(path)
        .take(config.ancestor_depth.min(MAX_ANCESTOR_DEPTH))
        .filter_map(|ancestor| tree.get(&ancestor))
        .map(AncestorSummary::of)
        .collect();

    Some(FeatureRecord {
        tag: node.tag_name.to_ascii_uppercase(),
        css_classes: node.class_name.normalize(),
        element_id: node.id().unwrap_or_default().to_string(),
        text,
        ancestor_chain,
        text_length: visible.chars().count(),
        vertical_position_percent: vertical_position_percent(tree, path),
        sibling_index: sibling_index(path),
        context_headings: collect_context_headings(tree, path, config.max_context_headings.min(MAX_CONTEXT_HEADINGS)),
    })
}
