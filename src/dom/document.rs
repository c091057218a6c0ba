//! Arena representation of one document context with CSS query support.
//!
//! Nodes are stored in pre-order, so a `NodeId` doubles as the node's
//! document-order position. Selector evaluation is delegated to `scraper`:
//! a `scraper::Html` tree is built node for node from the arena, with every
//! element tagged by its arena index, and query results are mapped back
//! through that tag. The tree is never re-parsed, so markup the HTML parser
//! would repair (a `div` inside a `p`, nested forms) keeps its captured shape.

use crate::dom::element::{BoundingBox, ElementNode, FrameSnapshot};
use crate::error::{QaError, Result};
use html5ever::tendril::StrTendril;
use html5ever::{Attribute, LocalName, Namespace, QualName};
use indexmap::IndexMap;
use scraper::node::Element;
use scraper::{Html, Node, Selector};
use serde::{Deserialize, Serialize};

/// Attribute carrying the arena index in the selector tree
const NODE_KEY_ATTR: &str = "data-qa-node";

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Pre-order index of a node inside its document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// One element of a document context
#[derive(Debug, Clone)]
pub struct DomNode {
    pub tag_name: String,
    pub attributes: IndexMap<String, String>,
    /// Text held directly by the element
    pub own_text: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub is_visible: bool,
    pub bounding_box: Option<BoundingBox>,
}

impl DomNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes().any(|c| c == class_name)
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }
}

/// A parsed, queryable document context
pub struct DomDocument {
    nodes: Vec<DomNode>,
    html: Html,
}

impl std::fmt::Debug for DomDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomDocument").field("nodes", &self.nodes.len()).finish()
    }
}

impl DomDocument {
    /// Build a document from a snapshot root.
    ///
    /// Returns the document together with the iframe elements that embed
    /// further documents, in pre-order.
    pub fn from_snapshot(root: &ElementNode) -> (Self, Vec<(NodeId, FrameSnapshot)>) {
        let mut nodes = Vec::new();
        let mut frames = Vec::new();
        Self::flatten(root, None, &mut nodes, &mut frames);

        let html = Self::build_selector_tree(&nodes);

        (Self { nodes, html }, frames)
    }

    fn flatten(
        element: &ElementNode,
        parent: Option<NodeId>,
        nodes: &mut Vec<DomNode>,
        frames: &mut Vec<(NodeId, FrameSnapshot)>,
    ) -> NodeId {
        let id = NodeId(nodes.len());
        nodes.push(DomNode {
            tag_name: element.tag_name.to_ascii_lowercase(),
            attributes: element.attributes.clone(),
            own_text: element.text_content.clone(),
            parent,
            children: Vec::new(),
            is_visible: element.is_visible,
            bounding_box: element.bounding_box,
        });

        if let Some(frame) = &element.frame {
            frames.push((id, (**frame).clone()));
        }

        for child in &element.children {
            let child_id = Self::flatten(child, Some(id), nodes, frames);
            nodes[id.0].children.push(child_id);
        }
        id
    }

    /// Mirror the arena into a `scraper` tree, parent links preserved as captured
    fn build_selector_tree(nodes: &[DomNode]) -> Html {
        let mut html = Html::new_document();
        let mut tree_ids: Vec<Option<ego_tree::NodeId>> = Vec::with_capacity(nodes.len());

        for (index, node) in nodes.iter().enumerate() {
            let element = Node::Element(selector_element(index, node));
            let parent = node.parent.and_then(|p| tree_ids.get(p.0).copied().flatten());
            let appended = match parent {
                Some(parent) => html.tree.get_mut(parent).map(|mut parent| parent.append(element).id()),
                None => Some(html.tree.root_mut().append(element).id()),
            };
            tree_ids.push(appended);
        }
        html
    }

    /// Number of elements in the document
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id.0)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Ancestors from the parent upwards
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    /// Whether `ancestor` is a strict ancestor of `id`
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Evaluate a CSS selector and return matches in document order
    pub fn select(&self, expression: &str) -> Result<Vec<NodeId>> {
        let selector = parse_selector(expression)?;
        Ok(self.select_parsed(&selector))
    }

    pub(crate) fn select_parsed(&self, selector: &Selector) -> Vec<NodeId> {
        let mut matches: Vec<NodeId> = self
            .html
            .select(selector)
            .filter_map(|element| element.value().attr(NODE_KEY_ATTR))
            .filter_map(|key| key.parse::<usize>().ok())
            .filter(|&key| key < self.nodes.len())
            .map(NodeId)
            .collect();
        matches.sort_unstable();
        matches.dedup();
        matches
    }

    /// Whether the selector matches the node
    pub fn matches(&self, id: NodeId, expression: &str) -> Result<bool> {
        Ok(self.select(expression)?.binary_search(&id).is_ok())
    }

    /// Whitespace-collapsed text of the node and its descendants
    pub fn text(&self, id: NodeId) -> String {
        let mut raw = String::new();
        self.collect_text(id, &mut raw);
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

        if !collapsed.is_empty() {
            return collapsed;
        }

        // Vector-rendered content keeps its text in accessibility attributes
        self.node(id)
            .and_then(|n| n.attr("aria-label").or_else(|| n.attr("data-acc-text")))
            .map(|label| label.split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default()
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        if let Some(text) = &node.own_text {
            out.push_str(text);
            out.push(' ');
        }
        for &child in &node.children {
            self.collect_text(child, out);
        }
    }

    /// Topmost visible node whose box contains the point.
    ///
    /// Later pre-order nodes paint over earlier ones, so the last match wins.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .rev()
            .find(|(_, node)| {
                node.is_visible
                    && node.bounding_box.is_some_and(|b| b.is_visible() && b.contains(x, y))
            })
            .map(|(index, _)| NodeId(index))
    }
}

/// Parse a CSS selector, mapping failures to `QaError::SelectorSyntax`
pub fn parse_selector(expression: &str) -> Result<Selector> {
    Selector::parse(expression).map_err(|e| QaError::SelectorSyntax {
        selector: expression.to_string(),
        reason: format!("{:?}", e),
    })
}

/// Element for the selector tree: HTML namespace, lowercase attribute names
fn selector_element(index: usize, node: &DomNode) -> Element {
    let mut attributes = vec![attribute(NODE_KEY_ATTR, &index.to_string())];
    attributes.extend(
        node.attributes
            .iter()
            .filter(|(name, _)| name.as_str() != NODE_KEY_ATTR && !name.is_empty())
            .map(|(name, value)| attribute(&name.to_ascii_lowercase(), value)),
    );
    let name = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(node.tag_name.as_str()));
    Element::new(name, attributes)
}

fn attribute(name: &str, value: &str) -> Attribute {
    Attribute {
        name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
        value: StrTendril::from_slice(value),
    }
}
