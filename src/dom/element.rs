use indexmap::IndexMap;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

/// Snapshot of one DOM element as captured from a rendered page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// HTML tag name (e.g., "div", "li", "input")
    pub tag_name: String,

    /// Element attributes in source order
    #[serde(default)]
    pub attributes: IndexMap<String, String>,

    /// Text held directly by the element (not by its children)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Child elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,

    /// Whether the element is rendered (not display:none / visibility:hidden)
    #[serde(default = "default_visible")]
    pub is_visible: bool,

    /// Bounding box in the owning document's viewport coordinates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,

    /// Embedded document, for iframe elements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<Box<FrameSnapshot>>,
}

fn default_visible() -> bool {
    true
}

/// Document embedded by an iframe element
///
/// `document` is `None` when the capture script could not reach into the
/// frame, which is what happens for cross-origin frames.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameSnapshot {
    pub url: String,
    #[serde(default)]
    pub document: Option<ElementNode>,
}

/// Captured page: top-level URL plus the root element of the top document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageSnapshot {
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub root: ElementNode,
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
            attributes: IndexMap::new(),
            text_content: None,
            children: Vec::new(),
            is_visible: true,
            bounding_box: None,
            frame: None,
        }
    }

    /// Build a snapshot tree from HTML markup, rooted at the `html` element.
    ///
    /// The result carries no geometry; it is meant for replaying rules
    /// against static markup.
    pub fn from_html(html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut root = Self::from_element_ref(document.root_element());
        root.simplify();
        root
    }

    fn from_element_ref(element: ElementRef<'_>) -> Self {
        let mut node = ElementNode::new(element.value().name());
        for (name, value) in element.value().attrs() {
            node.add_attribute(name, value);
        }

        let mut own_text = String::new();
        for child in element.children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                node.add_child(Self::from_element_ref(child_element));
            } else if let Some(text) = child.value().as_text() {
                own_text.push_str(text);
            }
        }

        if !own_text.trim().is_empty() {
            node.text_content = Some(own_text);
        }
        node
    }

    /// Builder method: add a single attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_attribute(key, value);
        self
    }

    /// Builder method: set the class attribute
    pub fn with_class(self, class: impl Into<String>) -> Self {
        self.with_attribute("class", class)
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Builder method: set children
    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = children;
        self
    }

    /// Builder method: append one child
    pub fn with_child(mut self, child: ElementNode) -> Self {
        self.children.push(child);
        self
    }

    /// Builder method: set visibility
    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.is_visible = visible;
        self
    }

    /// Builder method: set bounding box
    pub fn with_bounding_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounding_box = Some(BoundingBox { x, y, width, height });
        self
    }

    /// Builder method: attach an embedded document (iframe elements)
    pub fn with_frame(mut self, url: impl Into<String>, document: Option<ElementNode>) -> Self {
        self.frame = Some(Box::new(FrameSnapshot { url: url.into(), document }));
        self
    }

    /// Add a single attribute
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Add a child element
    pub fn add_child(&mut self, child: ElementNode) {
        self.children.push(child);
    }

    /// Check if element has a specific class
    pub fn has_class(&self, class_name: &str) -> bool {
        if let Some(classes) = self.attributes.get("class") {
            classes.split_whitespace().any(|c| c == class_name)
        } else {
            false
        }
    }

    /// Get element ID
    pub fn id(&self) -> Option<&String> {
        self.attributes.get("id")
    }

    /// Check if element is a specific tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Remove subtrees that never carry readable content
    pub fn simplify(&mut self) {
        self.children.retain(|child| {
            !matches!(child.tag_name.as_str(), "script" | "style" | "noscript" | "template")
        });

        for child in &mut self.children {
            child.simplify();
        }
    }

    /// Count elements in this subtree, embedded documents excluded
    pub fn count_elements(&self) -> usize {
        1 + self.children.iter().map(ElementNode::count_elements).sum::<usize>()
    }
}

impl BoundingBox {
    /// Create a new BoundingBox
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Check if the bounding box is visible (has non-zero dimensions)
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Inclusive point containment
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Grow the box by `padding` on every side
    pub fn padded(&self, padding: f64) -> Self {
        Self {
            x: self.x - padding,
            y: self.y - padding,
            width: self.width + padding * 2.0,
            height: self.height + padding * 2.0,
        }
    }

    /// Shift the box by an offset (frame origin into parent coordinates)
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy, ..*self }
    }
}
