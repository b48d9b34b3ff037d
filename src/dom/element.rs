use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tags whose content never contributes to rendered text
const NON_RENDERED_TAGS: [&str; 3] = ["script", "style", "noscript"];

/// Tags rendered as blocks, whose text is separated from its neighbours by a line break
const BLOCK_TAGS: [&str; 24] = [
    "address", "article", "aside", "blockquote", "div", "dl", "dd", "dt", "fieldset", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li", "main", "nav", "p",
    "section",
];

/// Class attribute as reported by the page.
///
/// HTML elements report a plain string, while SVG and some framework-managed elements
/// report a token list. Both are accepted and [`ClassValue::normalize`] always yields a
/// single space-joined string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ClassValue {
    Single(String),
    Tokens(Vec<String>),
}

impl ClassValue {
    /// Canonical string form: a single string is kept as-is, tokens are joined by one space
    pub fn normalize(&self) -> String {
        match self {
            ClassValue::Single(value) => value.clone(),
            ClassValue::Tokens(tokens) => tokens.join(" "),
        }
    }
}

impl Default for ClassValue {
    fn default() -> Self {
        ClassValue::Single(String::new())
    }
}

impl From<&str> for ClassValue {
    fn from(value: &str) -> Self {
        ClassValue::Single(value.to_string())
    }
}

impl From<String> for ClassValue {
    fn from(value: String) -> Self {
        ClassValue::Single(value)
    }
}

impl From<Vec<String>> for ClassValue {
    fn from(tokens: Vec<String>) -> Self {
        ClassValue::Tokens(tokens)
    }
}

/// Represents a DOM element node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// HTML tag name (e.g., "div", "button", "input")
    pub tag_name: String,

    /// Element attributes other than `class` (e.g., id, href, name)
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Class attribute, either a string or a token list
    #[serde(default, rename = "class")]
    pub class_name: ClassValue,

    /// Text from the element's own text nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Text as rendered by the browser (`innerText`), when it was captured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_text: Option<String>,

    /// Current value of a form control
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Child elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,

    /// Bounding box relative to the viewport (x, y, width, height)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

/// Bounding box coordinates for an element
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementNode {
    /// Create a new ElementNode
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: HashMap::new(),
            class_name: ClassValue::default(),
            text_content: None,
            rendered_text: None,
            value: None,
            children: Vec::new(),
            bounding_box: None,
        }
    }

    /// Builder method: set the id attribute
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.attributes.insert("id".to_string(), id.into());
        self
    }

    /// Builder method: set the class value
    pub fn with_class(mut self, class: impl Into<ClassValue>) -> Self {
        self.class_name = class.into();
        self
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Builder method: set form control value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Builder method: set children
    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = children;
        self
    }

    /// Builder method: set bounding box
    pub fn with_bounding_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounding_box = Some(BoundingBox { x, y, width, height });
        self
    }

    /// Get element ID
    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").map(String::as_str)
    }

    /// Check if element is a specific tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Whether this is one of the given tags (case-insensitive)
    pub fn is_any_tag(&self, tags: &[&str]) -> bool {
        tags.iter().any(|tag| self.is_tag(tag))
    }

    /// Text the user sees for this element.
    ///
    /// Prefers the browser-rendered text; otherwise concatenates own and descendant text,
    /// putting block-level children on their own line.
    pub fn visible_text(&self) -> String {
        if let Some(rendered) = &self.rendered_text {
            return rendered.clone();
        }
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if self.is_any_tag(&NON_RENDERED_TAGS) {
            return;
        }
        if let Some(text) = &self.text_content {
            out.push_str(text);
        }
        for child in &self.children {
            let block = child.is_any_tag(&BLOCK_TAGS);
            if block && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            child.collect_text(out);
            if block && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
        }
    }
}
