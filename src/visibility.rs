//! Visibility Resolution
//!
//! Decides which nodes of the full upstream set are expanded (visible) and
//! which are ghosted (present but dimmed and non-interactive), from three
//! rules: the root and its direct parents are visible, sources are always
//! visible, and each user expansion reveals one more hop of ancestry.
//!
//! This is deliberately *not* a reachability computation. Visibility is
//! distance-bounded — root + 1 hop + sources + 1 extra hop per expanded
//! node — so the visible graph stays small no matter how deep the full
//! upstream set is.
//!
//! # Example
//!
//! ```rust
//! use headwater::graph::{GraphBuilder, LineageNode};
//! use headwater::visibility::{resolve, ExpansionState};
//!
//! let graph = GraphBuilder::new("root")
//!     .node(LineageNode::new("root", 0))
//!     .node(LineageNode::new("parent", 1))
//!     .node(LineageNode::new("grandparent", 2))
//!     .edge("parent", "root")
//!     .edge("grandparent", "parent")
//!     .build()
//!     .unwrap();
//!
//! let vis = resolve(&graph, &ExpansionState::new()).unwrap();
//! assert!(vis.is_visible("parent"));
//! assert!(vis.is_ghosted("grandparent"));
//! ```

use crate::error::{HeadwaterError, Result};
use crate::graph::{GraphIndex, LineageGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// The set of node IDs the user has explicitly expanded.
///
/// Grows monotonically for the lifetime of one open lineage view: there is
/// no removal API, so previously revealed ancestry never collapses. The
/// state is ephemeral — drop it when the view closes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpansionState {
    expanded: HashSet<String>,
}

impl ExpansionState {
    /// Create an empty expansion state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the user expanded a node. Returns `true` if the ID was
    /// not already expanded. IDs that never appear in the graph are legal
    /// and simply contribute nothing at resolve time.
    pub fn expand(&mut self, id: impl Into<String>) -> bool {
        self.expanded.insert(id.into())
    }

    /// Whether a node has been expanded.
    pub fn contains(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    /// Number of expanded nodes.
    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    /// Whether nothing has been expanded yet.
    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    /// Iterate the expanded IDs (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.expanded.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ExpansionState {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            expanded: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// The resolved visible/ghosted partition of a graph's node set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visibility {
    visible: HashSet<String>,
    ghosted: HashSet<String>,
}

impl Visibility {
    /// Whether the node is expanded (fully rendered and interactive).
    pub fn is_visible(&self, id: &str) -> bool {
        self.visible.contains(id)
    }

    /// Whether the node is present but dimmed and non-interactive.
    pub fn is_ghosted(&self, id: &str) -> bool {
        self.ghosted.contains(id)
    }

    /// The visible ID set.
    pub fn visible(&self) -> &HashSet<String> {
        &self.visible
    }

    /// The ghosted ID set.
    pub fn ghosted(&self) -> &HashSet<String> {
        &self.ghosted
    }
}

/// Resolve visibility for a graph and expansion state.
///
/// # Errors
///
/// [`HeadwaterError::RootNotFound`] when `metadata.root_model_id` has no
/// matching node — there is no graph to show, and the caller should abort
/// the layout pass.
pub fn resolve(graph: &LineageGraph, expansion: &ExpansionState) -> Result<Visibility> {
    let index = GraphIndex::build(graph);
    resolve_with_index(graph, &index, expansion)
}

pub(crate) fn resolve_with_index(
    graph: &LineageGraph,
    index: &GraphIndex<'_>,
    expansion: &ExpansionState,
) -> Result<Visibility> {
    let root_id = graph.root_id();
    if !index.contains(root_id) {
        return Err(HeadwaterError::RootNotFound(root_id.to_string()));
    }

    let mut visible: HashSet<String> = HashSet::new();
    visible.insert(root_id.to_string());

    // One hop from the root.
    for up in index.upstream_of(root_id) {
        visible.insert((*up).to_string());
    }

    // Sources are visible no matter how far upstream they sit.
    for node in &graph.nodes {
        if node.is_source {
            visible.insert(node.id.clone());
        }
    }

    // One extra hop of ancestry per expanded node. Expanded IDs absent from
    // the graph have no upstream entries and fall through silently.
    for id in expansion.iter() {
        for up in index.upstream_of(id) {
            visible.insert((*up).to_string());
        }
    }

    let ghosted: HashSet<String> = graph
        .nodes
        .iter()
        .filter(|n| !visible.contains(&n.id))
        .map(|n| n.id.clone())
        .collect();

    debug!(
        visible = visible.len(),
        ghosted = ghosted.len(),
        expanded = expansion.len(),
        "resolved visibility"
    );

    Ok(Visibility { visible, ghosted })
}
