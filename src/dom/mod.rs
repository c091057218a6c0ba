//! Document access layer
//!
//! This module turns a captured page into queryable document contexts. It includes:
//! - ElementNode / PageSnapshot: serializable snapshot of a rendered page, frames included
//! - DomDocument: arena of one document context with CSS selector evaluation
//! - Page: every reachable context, cross-context queries and point resolution
//! - AccessibleLayerQuirk: canonicalization of vector-rendered hits

pub mod document;
pub mod element;
pub mod page;
pub mod quirk;

pub use document::{DomDocument, DomNode, NodeId};
pub use element::{BoundingBox, ElementNode, FrameSnapshot, PageSnapshot};
pub use page::{DocumentAccess, DocumentContext, DocumentId, Hit, NodeRef, Page};
pub use quirk::{AccessibleLayerQuirk, QuirkResolution};

use crate::error::{QaError, Result};

/// Parse a snapshot produced by the capture script
pub fn snapshot_from_json(json: &str) -> Result<PageSnapshot> {
    serde_json::from_str(json).map_err(|e| QaError::SnapshotParse(e.to_string()))
}

/// Parse a snapshot and build its page
pub fn page_from_json(json: &str) -> Result<Page> {
    Ok(Page::from_snapshot(&snapshot_from_json(json)?))
}
