//! Lineage Graph Data Model
//!
//! The upstream-dependency DAG consumed by the projection pipeline, plus the
//! reverse-adjacency index the passes share and a validating builder for
//! constructing graphs in code.
//!
//! # Features
//!
//! - **Wire contract**: [`LineageGraph`] (de)serializes the de facto JSON
//!   shape a lineage data provider returns
//! - **Reverse index**: `target -> direct upstream` lookup built once per
//!   projection pass
//! - **Data-quality tolerance**: dangling edge endpoints and duplicate node
//!   IDs in deserialized payloads are skipped and counted, never fatal
//! - **Validated construction**: [`GraphBuilder`] enforces unique IDs and
//!   the root-level invariant
//!
//! # Example
//!
//! ```rust
//! use headwater::graph::{GraphBuilder, LineageNode};
//!
//! let graph = GraphBuilder::new("rpt_orders")
//!     .layers(["staging", "marts"])
//!     .node(LineageNode::new("rpt_orders", 0).in_layer("marts"))
//!     .node(LineageNode::new("stg_orders", 1).in_layer("staging"))
//!     .node(LineageNode::new("raw_orders", 2).as_source().with_source_name("erp"))
//!     .edge("stg_orders", "rpt_orders")
//!     .edge("raw_orders", "stg_orders")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(graph.nodes.len(), 3);
//! assert_eq!(graph.metadata.root_model_id, "rpt_orders");
//! ```

use crate::error::{HeadwaterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Reserved layer name that always sorts first in band order.
pub const LAYER_SOURCES: &str = "sources";

/// Reserved layer name that always sorts last in band order.
pub const LAYER_UNASSIGNED: &str = "unassigned";

/// A node in the upstream dependency graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageNode {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub label: String,
    /// Upstream depth: 0 is the root (focal) node, increasing values are
    /// further upstream.
    pub level: u32,
    /// Optional semantic grouping key (e.g. a named pipeline stage). When no
    /// node in the graph declares a layer, layout falls back to level-only
    /// bucketing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    /// Marks raw/ingestion-origin nodes, which are always visible regardless
    /// of expansion state.
    #[serde(default, rename = "isSource")]
    pub is_source: bool,
    /// Optional source system metadata for source nodes.
    #[serde(default, rename = "sourceName", skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
}

impl LineageNode {
    /// Create a node with the given ID and level. The label defaults to the
    /// ID until overridden.
    pub fn new(id: impl Into<String>, level: u32) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            level,
            layer: None,
            is_source: false,
            source_name: None,
        }
    }

    /// Set the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Assign the node to a semantic layer.
    pub fn in_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    /// Mark the node as a raw/ingestion source.
    pub fn as_source(mut self) -> Self {
        self.is_source = true;
        self
    }

    /// Attach source system metadata.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }
}

/// A directed dependency edge: `source` is upstream of `target`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageEdge {
    /// Upstream node ID.
    pub source: String,
    /// Downstream node ID.
    pub target: String,
}

impl LineageEdge {
    /// Create an edge from an upstream node to a downstream node.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Graph-level metadata delivered alongside the node and edge lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphMetadata {
    /// ID of the focal node the lineage view is rooted at.
    pub root_model_id: String,
    /// Canonical ordering of semantic layers. `"sources"` and `"unassigned"`
    /// are reserved and always sort first/last regardless of this list.
    #[serde(default)]
    pub lineage_layers: Vec<String>,
}

/// The raw lineage graph: the input to every projection pass.
///
/// This shape is the de facto contract a lineage data provider must satisfy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageGraph {
    /// All nodes in the upstream dependency set, including the root.
    pub nodes: Vec<LineageNode>,
    /// Directed dependency edges referencing node IDs.
    pub edges: Vec<LineageEdge>,
    /// Root identity and layer ordering.
    pub metadata: GraphMetadata,
}

impl LineageGraph {
    /// Parse a graph from its JSON wire form.
    pub fn from_json(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    /// The root (focal) node ID.
    pub fn root_id(&self) -> &str {
        &self.metadata.root_model_id
    }

    /// Whether the root has zero upstream dependencies. This is the
    /// informational "no upstream" state, not an error.
    pub fn is_empty_upstream(&self) -> bool {
        !self
            .edges
            .iter()
            .any(|e| e.target == self.metadata.root_model_id)
    }

    /// Whether a node with the given ID exists.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Direct upstream neighbor IDs of a node, in input edge order. Reads
    /// the raw edge list; dangling sources are filtered out the same way
    /// the projection pipeline drops them.
    pub fn upstream_of(&self, id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.target == id && self.contains(&e.source))
            .map(|e| e.source.as_str())
            .collect()
    }

    /// Whether any node declares a semantic layer (selects layer-mode
    /// layout).
    pub fn has_layers(&self) -> bool {
        self.nodes.iter().any(|n| n.layer.is_some())
    }
}

/// Per-pass reverse-adjacency index over a [`LineageGraph`].
///
/// Built once at the start of a projection pass and shared by the three
/// passes. Duplicate node IDs and dangling edge endpoints are tolerated:
/// the first node occurrence wins, offending edges are dropped, and both
/// are counted for pass diagnostics.
pub(crate) struct GraphIndex<'a> {
    nodes: HashMap<&'a str, &'a LineageNode>,
    /// target ID -> direct upstream IDs, in input edge order.
    upstream: HashMap<&'a str, Vec<&'a str>>,
    skipped_edges: usize,
}

impl<'a> GraphIndex<'a> {
    pub(crate) fn build(graph: &'a LineageGraph) -> Self {
        let mut nodes: HashMap<&str, &LineageNode> = HashMap::with_capacity(graph.nodes.len());
        for node in &graph.nodes {
            match nodes.entry(node.id.as_str()) {
                Entry::Occupied(_) => {
                    warn!(id = %node.id, "duplicate node ID in lineage payload, keeping first");
                }
                Entry::Vacant(slot) => {
                    slot.insert(node);
                }
            }
        }

        let mut upstream: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut skipped_edges = 0usize;
        for edge in &graph.edges {
            if !nodes.contains_key(edge.source.as_str()) || !nodes.contains_key(edge.target.as_str())
            {
                warn!(
                    from = %edge.source,
                    to = %edge.target,
                    "skipping edge with dangling endpoint"
                );
                skipped_edges += 1;
                continue;
            }
            upstream
                .entry(edge.target.as_str())
                .or_default()
                .push(edge.source.as_str());
        }

        Self {
            nodes,
            upstream,
            skipped_edges,
        }
    }

    pub(crate) fn node(&self, id: &str) -> Option<&'a LineageNode> {
        self.nodes.get(id).copied()
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub(crate) fn upstream_of(&self, id: &str) -> &[&'a str] {
        self.upstream.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn skipped_edges(&self) -> usize {
        self.skipped_edges
    }
}

/// Validating builder for [`LineageGraph`].
///
/// Unlike deserialization, which tolerates data-quality defects, the builder
/// is the strict path: duplicate IDs and root-invariant violations are
/// rejected at `build()` time.
pub struct GraphBuilder {
    root_id: String,
    layers: Vec<String>,
    nodes: Vec<LineageNode>,
    edges: Vec<LineageEdge>,
}

impl GraphBuilder {
    /// Start a graph rooted at the given node ID.
    pub fn new(root_id: impl Into<String>) -> Self {
        Self {
            root_id: root_id.into(),
            layers: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Set the canonical layer ordering.
    pub fn layers<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layers = layers.into_iter().map(Into::into).collect();
        self
    }

    /// Add a node.
    pub fn node(mut self, node: LineageNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add a dependency edge (`source` upstream of `target`).
    pub fn edge(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.edges.push(LineageEdge::new(source, target));
        self
    }

    /// Validate and build the graph.
    ///
    /// # Errors
    ///
    /// - [`HeadwaterError::DuplicateId`] if two nodes share an ID
    /// - [`HeadwaterError::RootNotFound`] if the root ID has no node
    /// - [`HeadwaterError::InvalidGraph`] if the root's level is not 0
    pub fn build(self) -> Result<LineageGraph> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(HeadwaterError::DuplicateId(node.id.clone()));
            }
        }

        let root = self
            .nodes
            .iter()
            .find(|n| n.id == self.root_id)
            .ok_or_else(|| HeadwaterError::RootNotFound(self.root_id.clone()))?;
        if root.level != 0 {
            return Err(HeadwaterError::InvalidGraph(format!(
                "root '{}' must have level 0, got {}",
                root.id, root.level
            )));
        }

        Ok(LineageGraph {
            nodes: self.nodes,
            edges: self.edges,
            metadata: GraphMetadata {
                root_model_id: self.root_id,
                lineage_layers: self.layers,
            },
        })
    }
}
