//! Canonicalization for content rendered as vector graphics.
//!
//! Some authoring tools draw slides as SVG and keep a hidden, parallel
//! "accessible" DOM with the real text for screen readers. A click on the
//! drawing lands on a `path` or `g` node that carries no text; this module
//! maps such hits onto the matching accessible-layer element.

use crate::dom::document::NodeId;
use crate::dom::page::{NodeRef, Page};

/// How a hit was canonicalized
#[derive(Debug, Clone, PartialEq)]
pub enum QuirkResolution {
    /// The semantic container exposes its text through an attribute
    AccessibleText { node: NodeRef, text: String },
    /// The container's id cross-references an accessible-layer element
    CrossReference { node: NodeRef },
    /// An accessible-layer element's box (padded) contains the point
    Spatial { node: NodeRef },
    /// Keep the original hit node
    NoMatch,
}

impl QuirkResolution {
    /// The canonical node, if one was found
    pub fn node(&self) -> Option<NodeRef> {
        match self {
            QuirkResolution::AccessibleText { node, .. }
            | QuirkResolution::CrossReference { node }
            | QuirkResolution::Spatial { node } => Some(*node),
            QuirkResolution::NoMatch => None,
        }
    }
}

/// Description of one tool's vector rendering with an accessible layer
#[derive(Debug, Clone)]
pub struct AccessibleLayerQuirk {
    /// Selector for semantic containers around drawn objects
    pub container_selector: String,
    /// Attribute holding the container's accessible text
    pub text_attribute: String,
    /// Attribute holding the container's object id
    pub xref_attribute: String,
    /// Selector for the root(s) of the accessible layer
    pub layer_selector: String,
    /// Prefix the accessible layer puts in front of object ids
    pub layer_id_prefix: String,
    /// Slack around accessible-layer boxes for spatial matching
    pub padding: f64,
}

impl Default for AccessibleLayerQuirk {
    /// Articulate Storyline player output
    fn default() -> Self {
        Self {
            container_selector: "[data-model-id], .slide-object".to_string(),
            text_attribute: "data-acc-text".to_string(),
            xref_attribute: "data-model-id".to_string(),
            layer_selector: ".acc-shadow-dom".to_string(),
            layer_id_prefix: "acc-".to_string(),
            padding: 10.0,
        }
    }
}

impl AccessibleLayerQuirk {
    /// Resolve a hit at (`x`, `y`) in `node`'s own document coordinates
    pub fn resolve(&self, page: &Page, node: NodeRef, x: f64, y: f64) -> QuirkResolution {
        let Ok(doc) = page.document(node.document) else {
            return QuirkResolution::NoMatch;
        };

        let layer_roots = match doc.select(&self.layer_selector) {
            Ok(roots) if !roots.is_empty() => roots,
            _ => return QuirkResolution::NoMatch,
        };

        // Already canonical
        if layer_roots.iter().any(|&root| root == node.node || doc.is_ancestor(root, node.node)) {
            return QuirkResolution::NoMatch;
        }

        if let Some(container) = self.nearest_container(page, node) {
            let container_node = doc.node(container);

            if let Some(text) = container_node
                .and_then(|n| n.attr(&self.text_attribute))
                .map(str::trim)
                .filter(|t| !t.is_empty())
            {
                return QuirkResolution::AccessibleText {
                    node: NodeRef::new(node.document, container),
                    text: text.to_string(),
                };
            }

            if let Some(object_id) = container_node.and_then(|n| n.attr(&self.xref_attribute)) {
                let wanted = format!("{}{}", self.layer_id_prefix, object_id);
                let found = self
                    .layer_members(page, node, &layer_roots)
                    .find(|&member| doc.node(member).and_then(|n| n.id()) == Some(wanted.as_str()));
                if let Some(member) = found {
                    return QuirkResolution::CrossReference { node: NodeRef::new(node.document, member) };
                }
            }
        }

        let spatial = self.layer_members(page, node, &layer_roots).find(|&member| {
            doc.node(member)
                .and_then(|n| n.bounding_box)
                .is_some_and(|b| b.padded(self.padding).contains(x, y))
        });
        match spatial {
            Some(member) => QuirkResolution::Spatial { node: NodeRef::new(node.document, member) },
            None => QuirkResolution::NoMatch,
        }
    }

    /// Nearest ancestor-or-self matching the container selector
    fn nearest_container(&self, page: &Page, node: NodeRef) -> Option<NodeId> {
        let containers = page.query_in(node.document, &self.container_selector).ok()?;
        std::iter::once(node)
            .chain(page.ancestors(node))
            .find(|candidate| containers.binary_search(candidate).is_ok())
            .map(|found| found.node)
    }

    /// Descendants of the accessible layer roots, in document order
    fn layer_members<'a>(
        &self,
        page: &'a Page,
        node: NodeRef,
        roots: &'a [NodeId],
    ) -> impl Iterator<Item = NodeId> + 'a {
        let doc = page.document(node.document).ok();
        doc.into_iter().flat_map(move |doc| {
            doc.node_ids().filter(move |&id| roots.iter().any(|&root| doc.is_ancestor(root, id)))
        })
    }
}
