//! Access layer over every document context reachable from a captured page.

use crate::dom::document::{DomDocument, DomNode, NodeId, parse_selector};
use crate::dom::element::{BoundingBox, ElementNode, FrameSnapshot, PageSnapshot};
use crate::error::{QaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Index of a document context in structural order (root is 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub usize);

/// Handle to an element, scoped to its owning document context.
///
/// The derived ordering is global document order: documents in structural
/// order, nodes in pre-order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub document: DocumentId,
    pub node: NodeId,
}

impl NodeRef {
    pub fn new(document: DocumentId, node: NodeId) -> Self {
        Self { document, node }
    }
}

/// Outcome of trying to reach a document context
#[derive(Debug)]
pub enum DocumentAccess {
    Accessible(DomDocument),
    Denied { reason: String },
}

/// One reachable document: the top page or an iframe's document
#[derive(Debug)]
pub struct DocumentContext {
    pub id: DocumentId,
    pub url: String,
    /// The iframe element embedding this document, `None` for the root
    pub host: Option<NodeRef>,
    pub access: DocumentAccess,
    /// Iframe elements of this document mapped to the contexts they embed
    frames: HashMap<NodeId, DocumentId>,
}

impl DocumentContext {
    pub fn is_accessible(&self) -> bool {
        matches!(self.access, DocumentAccess::Accessible(_))
    }

    /// The parsed document, or `AccessDenied` for cross-origin contexts
    pub fn document(&self) -> Result<&DomDocument> {
        match &self.access {
            DocumentAccess::Accessible(doc) => Ok(doc),
            DocumentAccess::Denied { reason } => Err(QaError::AccessDenied {
                url: self.url.clone(),
                reason: reason.clone(),
            }),
        }
    }

    /// Context embedded by an iframe element of this document
    pub fn embedded(&self, node: NodeId) -> Option<DocumentId> {
        self.frames.get(&node).copied()
    }
}

/// Point hit with the coordinates translated into the hit node's document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub node: NodeRef,
    pub x: f64,
    pub y: f64,
}

/// A captured page with all of its document contexts
#[derive(Debug)]
pub struct Page {
    url: String,
    contexts: Vec<DocumentContext>,
}

impl Page {
    /// Build every document context from a captured snapshot.
    ///
    /// Contexts are numbered depth-first: a frame's own frames come before
    /// the next sibling frame of its parent.
    pub fn from_snapshot(snapshot: &PageSnapshot) -> Self {
        let mut builder = ContextBuilder {
            top_origin: Url::parse(&snapshot.url).ok().map(|u| u.origin()),
            contexts: Vec::new(),
        };
        builder.add(snapshot.url.clone(), &snapshot.url, Some(&snapshot.root), None, None);
        let contexts = builder.contexts;

        let denied = contexts.iter().filter(|c| !c.is_accessible()).count();
        log::debug!(
            "Built page {} with {} document contexts ({} inaccessible)",
            snapshot.url,
            contexts.len(),
            denied
        );
        Self { url: snapshot.url.clone(), contexts }
    }

    /// Single-context page from markup; nodes carry no geometry
    pub fn from_html(url: impl Into<String>, html: &str) -> Self {
        let snapshot = PageSnapshot { url: url.into(), title: String::new(), root: ElementNode::from_html(html) };
        Self::from_snapshot(&snapshot)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Every context with its access outcome, in structural order
    pub fn contexts(&self) -> &[DocumentContext] {
        &self.contexts
    }

    /// Accessible contexts: root first, then same-origin iframes
    pub fn list_documents(&self) -> Vec<&DocumentContext> {
        self.contexts.iter().filter(|c| c.is_accessible()).collect()
    }

    pub fn context(&self, id: DocumentId) -> Option<&DocumentContext> {
        self.contexts.get(id.0)
    }

    pub fn document(&self, id: DocumentId) -> Result<&DomDocument> {
        self.context(id)
            .ok_or_else(|| QaError::AccessDenied {
                url: String::new(),
                reason: format!("unknown document {}", id.0),
            })?
            .document()
    }

    pub fn node(&self, node: NodeRef) -> Option<&DomNode> {
        self.document(node.document).ok()?.node(node.node)
    }

    /// Matches for `expression` across all accessible contexts, in document order.
    ///
    /// A malformed expression contributes nothing.
    pub fn query_all(&self, expression: &str) -> Vec<NodeRef> {
        let selector = match parse_selector(expression) {
            Ok(selector) => selector,
            Err(e) => {
                log::debug!("{}", e);
                return Vec::new();
            }
        };

        self.list_documents()
            .into_iter()
            .filter_map(|ctx| ctx.document().ok().map(|doc| (ctx.id, doc)))
            .flat_map(|(id, doc)| {
                doc.select_parsed(&selector).into_iter().map(move |node| NodeRef::new(id, node))
            })
            .collect()
    }

    /// Matches for `expression` in one context
    pub fn query_in(&self, document: DocumentId, expression: &str) -> Result<Vec<NodeRef>> {
        let doc = self.document(document)?;
        Ok(doc.select(expression)?.into_iter().map(|node| NodeRef::new(document, node)).collect())
    }

    /// Topmost node at a point in top-level coordinates
    pub fn resolve_at_point(&self, x: f64, y: f64) -> Option<NodeRef> {
        self.hit_test(x, y).map(|hit| hit.node)
    }

    /// Like `resolve_at_point`, also returning the point in the hit node's
    /// own document coordinates
    pub fn hit_test(&self, x: f64, y: f64) -> Option<Hit> {
        self.hit_test_in(DocumentId(0), x, y)
    }

    fn hit_test_in(&self, document: DocumentId, x: f64, y: f64) -> Option<Hit> {
        let ctx = self.context(document)?;
        let doc = ctx.document().ok()?;
        let node = doc.hit_test(x, y)?;
        let hit = Hit { node: NodeRef::new(document, node), x, y };

        let Some(embedded) = ctx.embedded(node) else {
            return Some(hit);
        };
        let embedded_ctx = self.context(embedded)?;
        if !embedded_ctx.is_accessible() {
            log::debug!("Point lands on inaccessible frame {}", embedded_ctx.url);
            return Some(hit);
        }

        let origin = doc.node(node).and_then(|n| n.bounding_box)?;
        self.hit_test_in(embedded, x - origin.x, y - origin.y).or(Some(hit))
    }

    /// Whitespace-collapsed text of a node
    pub fn text(&self, node: NodeRef) -> String {
        self.document(node.document).map(|doc| doc.text(node.node)).unwrap_or_default()
    }

    /// Box in the node's own document coordinates
    pub fn bounding_box(&self, node: NodeRef) -> Option<BoundingBox> {
        self.node(node)?.bounding_box
    }

    /// Box in top-level coordinates (iframe offsets applied)
    pub fn absolute_box(&self, node: NodeRef) -> Option<BoundingBox> {
        let mut bbox = self.bounding_box(node)?;
        let mut host = self.context(node.document)?.host;
        while let Some(h) = host {
            let host_box = self.bounding_box(h)?;
            bbox = bbox.translated(host_box.x, host_box.y);
            host = self.context(h.document)?.host;
        }
        Some(bbox)
    }

    /// Whether `ancestor` strictly contains `node`, following iframe hosts
    /// when `node` lives in an embedded document
    pub fn contains(&self, ancestor: NodeRef, node: NodeRef) -> bool {
        let mut current = node;
        loop {
            if current.document == ancestor.document {
                return self
                    .document(current.document)
                    .map(|doc| doc.is_ancestor(ancestor.node, current.node))
                    .unwrap_or(false);
            }
            match self.context(current.document).and_then(|c| c.host) {
                // The host itself counts as contained content
                Some(host) if host == ancestor => return true,
                Some(host) => current = host,
                None => return false,
            }
        }
    }

    /// Ancestors of a node within its own document, parent first
    pub fn ancestors(&self, node: NodeRef) -> Vec<NodeRef> {
        self.document(node.document)
            .map(|doc| doc.ancestors(node.node).map(|id| NodeRef::new(node.document, id)).collect())
            .unwrap_or_default()
    }
}

struct ContextBuilder {
    top_origin: Option<url::Origin>,
    contexts: Vec<DocumentContext>,
}

impl ContextBuilder {
    /// Append one context, then every context nested in it
    fn add(
        &mut self,
        url: String,
        base: &str,
        root: Option<&ElementNode>,
        host: Option<NodeRef>,
        denial: Option<String>,
    ) -> DocumentId {
        let id = DocumentId(self.contexts.len());
        let (access, frames) = match (denial, root) {
            (Some(reason), _) => (DocumentAccess::Denied { reason }, Vec::new()),
            (None, None) => (
                DocumentAccess::Denied { reason: "frame document was not captured".to_string() },
                Vec::new(),
            ),
            (None, Some(root)) => {
                let (doc, frames) = DomDocument::from_snapshot(root);
                (DocumentAccess::Accessible(doc), frames)
            }
        };
        self.contexts.push(DocumentContext { id, url, host, access, frames: HashMap::new() });

        for (host_node, frame) in frames {
            let resolved = resolve_frame_url(base, &frame.url);
            let denial = self.denial(&frame, resolved.as_ref());
            let child_base = match resolved {
                Some(url) if url.scheme() != "about" => url.to_string(),
                _ => base.to_string(),
            };
            let child = self.add(
                frame.url.clone(),
                &child_base,
                frame.document.as_ref(),
                Some(NodeRef::new(id, host_node)),
                denial,
            );
            self.contexts[id.0].frames.insert(host_node, child);
        }
        id
    }

    /// Reason a frame must be treated as inaccessible, if any
    fn denial(&self, frame: &FrameSnapshot, resolved: Option<&Url>) -> Option<String> {
        let frame_url = frame.url.trim();
        // about:blank, srcdoc and src-less frames inherit the embedder's origin
        if frame_url.is_empty() || frame_url.starts_with("about:") {
            return None;
        }
        let Some(resolved) = resolved else {
            return Some(format!("unparseable frame url {}", frame_url));
        };

        match &self.top_origin {
            Some(origin) if *origin == resolved.origin() && origin.is_tuple() => None,
            _ => Some(format!("cross-origin frame {}", resolved.origin().ascii_serialization())),
        }
    }
}

/// Absolute URL of a frame, relative ones resolved against the embedding document
fn resolve_frame_url(base: &str, frame_url: &str) -> Option<Url> {
    let frame_url = frame_url.trim();
    Url::parse(base)
        .and_then(|base| base.join(frame_url))
        .or_else(|_| Url::parse(frame_url))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed_snapshot() -> PageSnapshot {
        let inner = ElementNode::new("body")
            .with_bounding_box(0.0, 0.0, 300.0, 200.0)
            .with_child(
                ElementNode::new("p").with_class("q").with_text("Inner question").with_bounding_box(10.0, 10.0, 200.0, 20.0),
            );

        let root = ElementNode::new("body")
            .with_bounding_box(0.0, 0.0, 1000.0, 800.0)
            .with_child(ElementNode::new("p").with_class("q").with_text("Top question").with_bounding_box(10.0, 10.0, 300.0, 20.0))
            .with_child(
                ElementNode::new("iframe")
                    .with_bounding_box(100.0, 100.0, 300.0, 200.0)
                    .with_frame("/content/frame.html", Some(inner)),
            )
            .with_child(
                ElementNode::new("iframe")
                    .with_bounding_box(500.0, 100.0, 300.0, 200.0)
                    .with_frame("https://ads.example.net/slot", None),
            );

        PageSnapshot { url: "https://lms.example.com/course/7/quiz".to_string(), title: String::new(), root }
    }

    #[test]
    fn test_list_documents_skips_cross_origin() {
        let page = Page::from_snapshot(&framed_snapshot());

        assert_eq!(page.contexts().len(), 3);
        let accessible: Vec<_> = page.list_documents().iter().map(|c| c.id).collect();
        assert_eq!(accessible, vec![DocumentId(0), DocumentId(1)]);

        let denied = page.context(DocumentId(2)).unwrap();
        assert!(matches!(denied.document(), Err(QaError::AccessDenied { .. })));
        assert_eq!(denied.host, Some(NodeRef::new(DocumentId(0), NodeId(3))));
    }

    #[test]
    fn test_query_all_spans_frames_in_order() {
        let page = Page::from_snapshot(&framed_snapshot());
        let matches = page.query_all("p.q");
        assert_eq!(
            matches,
            vec![NodeRef::new(DocumentId(0), NodeId(1)), NodeRef::new(DocumentId(1), NodeId(1))]
        );
        assert_eq!(page.text(matches[1]), "Inner question");
    }

    #[test]
    fn test_query_all_invalid_selector_is_empty() {
        let page = Page::from_snapshot(&framed_snapshot());
        assert!(page.query_all("p[[").is_empty());
        assert!(page.query_in(DocumentId(0), "p[[").is_err());
    }

    #[test]
    fn test_resolve_at_point_descends_into_frames() {
        let page = Page::from_snapshot(&framed_snapshot());

        let hit = page.hit_test(120.0, 115.0).unwrap();
        assert_eq!(hit.node, NodeRef::new(DocumentId(1), NodeId(1)));
        assert_eq!((hit.x, hit.y), (20.0, 15.0));

        // Cross-origin frame resolves to its container
        let container = page.resolve_at_point(600.0, 150.0).unwrap();
        assert_eq!(container, NodeRef::new(DocumentId(0), NodeId(3)));
    }

    #[test]
    fn test_absolute_box_and_containment_across_frames() {
        let page = Page::from_snapshot(&framed_snapshot());
        let inner_q = NodeRef::new(DocumentId(1), NodeId(1));

        let abs = page.absolute_box(inner_q).unwrap();
        assert_eq!((abs.x, abs.y), (110.0, 110.0));

        let top_body = NodeRef::new(DocumentId(0), NodeId(0));
        let iframe = NodeRef::new(DocumentId(0), NodeId(2));
        assert!(page.contains(top_body, inner_q));
        assert!(page.contains(iframe, inner_q));
        assert!(!page.contains(NodeRef::new(DocumentId(0), NodeId(1)), inner_q));
    }

    #[test]
    fn test_nested_frames_are_numbered_depth_first() {
        let a1 = ElementNode::new("body").with_child(ElementNode::new("p").with_class("x").with_text("A1"));
        let a = ElementNode::new("body")
            .with_child(ElementNode::new("p").with_class("x").with_text("A"))
            .with_child(ElementNode::new("iframe").with_frame("a1", Some(a1)));
        let b = ElementNode::new("body").with_child(ElementNode::new("p").with_class("x").with_text("B"));
        let root = ElementNode::new("body")
            .with_child(ElementNode::new("iframe").with_frame("/nested/a", Some(a)))
            .with_child(ElementNode::new("iframe").with_frame("/b", Some(b)));
        let page = Page::from_snapshot(&PageSnapshot { url: "https://lms.example.com/".into(), title: String::new(), root });

        let urls: Vec<&str> = page.contexts().iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["https://lms.example.com/", "/nested/a", "a1", "/b"]);
        assert!(page.contexts().iter().all(|c| c.is_accessible()));
        assert_eq!(page.context(DocumentId(2)).unwrap().host, Some(NodeRef::new(DocumentId(1), NodeId(2))));

        let texts: Vec<String> = page.query_all(".x").into_iter().map(|n| page.text(n)).collect();
        assert_eq!(texts, vec!["A", "A1", "B"]);
    }

    #[test]
    fn test_from_html() {
        let page = Page::from_html("https://example.com/", "<div class='a'>x</div><div class='a'>y</div>");
        assert_eq!(page.query_all(".a").len(), 2);
        assert_eq!(page.list_documents().len(), 1);
    }
}
