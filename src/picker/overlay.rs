//! Listener and highlight bookkeeping exposed for a host to paint.

use crate::dom::{BoundingBox, NodeRef, Page};
use crate::picker::state::{PickerState, Role};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;

/// Input listeners the picker installs on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Listener {
    PointerMove,
    Click,
    ContextMenu,
    KeyDown,
}

impl Listener {
    pub const ALL: [Listener; 4] = [Listener::PointerMove, Listener::Click, Listener::ContextMenu, Listener::KeyDown];
}

/// Which kind of highlight to paint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
    Hover,
    Match(Role),
}

/// One box to paint, in top-level coordinates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub node: NodeRef,
    pub kind: HighlightKind,
    pub bounding_box: Option<BoundingBox>,
}

#[derive(Debug, Default)]
pub struct Overlay {
    listeners: BTreeSet<Listener>,
    hover: Option<NodeRef>,
    markers: IndexMap<NodeRef, Role>,
}

impl Overlay {
    /// Install every listener; installing twice changes nothing
    pub fn install(&mut self) {
        self.listeners.extend(Listener::ALL);
    }

    /// Drop listeners, hover and markers
    pub fn uninstall(&mut self) {
        self.listeners.clear();
        self.hover = None;
        self.markers.clear();
    }

    pub fn is_listening(&self, listener: Listener) -> bool {
        self.listeners.contains(&listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// No listeners, no hover and no markers left
    pub fn is_clean(&self) -> bool {
        self.listeners.is_empty() && self.hover.is_none() && self.markers.is_empty()
    }

    pub fn hover(&self) -> Option<NodeRef> {
        self.hover
    }

    pub fn set_hover(&mut self, node: Option<NodeRef>) {
        self.hover = node;
    }

    pub fn marker(&self, node: NodeRef) -> Option<Role> {
        self.markers.get(&node).copied()
    }

    /// Re-derive match markers from the captures; later roles paint over earlier ones
    pub fn sync_markers(&mut self, state: &PickerState) {
        self.markers.clear();
        for role in Role::ALL {
            for &node in &state.capture(role).matches {
                self.markers.insert(node, role);
            }
        }
    }

    pub fn clear_markers(&mut self) {
        self.markers.clear();
        self.hover = None;
    }

    /// Boxes to paint: match markers, then the hover box
    pub fn highlights(&self, page: &Page) -> Vec<Highlight> {
        let markers = self.markers.iter().map(|(&node, &role)| Highlight {
            node,
            kind: HighlightKind::Match(role),
            bounding_box: page.absolute_box(node),
        });
        let hover = self.hover.map(|node| Highlight {
            node,
            kind: HighlightKind::Hover,
            bounding_box: page.absolute_box(node),
        });
        markers.chain(hover).collect()
    }
}
