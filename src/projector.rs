//! Projection Orchestration
//!
//! Runs the three passes — visibility resolution, layer/level layout, edge
//! compression — as one deterministic pipeline and bundles the render-ready
//! result.
//!
//! The pipeline is pure: given the same graph, expansion state, and
//! carried-forward manual positions it produces the same output. There is no
//! incremental patching — every expansion re-runs the whole pipeline, which
//! is the right trade at the graph sizes lineage views carry (tens to low
//! hundreds of nodes).
//!
//! # Example
//!
//! ```rust
//! use headwater::graph::{GraphBuilder, LineageNode};
//! use headwater::projector::Projector;
//! use headwater::visibility::ExpansionState;
//!
//! let graph = GraphBuilder::new("rpt")
//!     .node(LineageNode::new("rpt", 0))
//!     .node(LineageNode::new("stg", 1))
//!     .edge("stg", "rpt")
//!     .build()
//!     .unwrap();
//!
//! let projector = Projector::default();
//! let projection = projector.project(&graph, &ExpansionState::new(), None).unwrap();
//! assert_eq!(projection.nodes.len(), 2);
//! ```

use crate::compress::{compress, PlaceholderNode, RenderEdge};
use crate::error::{HeadwaterError, Result};
use crate::graph::{GraphIndex, LineageGraph};
use crate::layout::{layout, Band, LayoutConfig, Position, PositionedNode, PriorPositions};
use crate::visibility::{resolve_with_index, ExpansionState};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Diagnostics for one projection pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ProjectionStats {
    /// Expanded node count.
    pub visible: usize,
    /// Ghosted node count.
    pub ghosted: usize,
    /// Placeholders created this pass.
    pub placeholders: usize,
    /// Dangling edges dropped while indexing.
    pub skipped_edges: usize,
    /// Whether X-drift recentering fired.
    pub recentered: bool,
}

/// The render-ready output of one projection pass.
///
/// Rebuilt from scratch on every pass; node identity across passes is by ID
/// only, except for manual positions, which the projector threads through
/// when the previous projection is passed back in.
#[derive(Debug, Clone, Serialize)]
pub struct Projection {
    /// Positioned nodes, visible and ghosted.
    pub nodes: Vec<PositionedNode>,
    /// Background layer bands (empty in level mode). Render order: bands
    /// behind edges behind nodes.
    pub bands: Vec<Band>,
    /// Render edges, direct and compressed.
    pub edges: Vec<RenderEdge>,
    /// Synthetic placeholder nodes.
    pub placeholders: Vec<PlaceholderNode>,
    /// Pass diagnostics.
    pub stats: ProjectionStats,
    has_upstream: bool,
    #[serde(skip_serializing)]
    node_index: HashMap<String, usize>,
}

impl Projection {
    fn assemble(
        nodes: Vec<PositionedNode>,
        bands: Vec<Band>,
        edges: Vec<RenderEdge>,
        placeholders: Vec<PlaceholderNode>,
        stats: ProjectionStats,
        has_upstream: bool,
    ) -> Self {
        let node_index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        Self {
            nodes,
            bands,
            edges,
            placeholders,
            stats,
            has_upstream,
            node_index,
        }
    }

    /// Look up a positioned node by ID.
    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    /// Look up a placeholder by its synthetic ID.
    pub fn placeholder(&self, id: &str) -> Option<&PlaceholderNode> {
        self.placeholders.iter().find(|p| p.id == id)
    }

    /// Whether the root has any upstream dependencies. `false` is the
    /// informational "no upstream dependencies" state, not an error.
    pub fn has_upstream(&self) -> bool {
        self.has_upstream
    }

    /// Commit a drag-stop for a node: clamp the dropped Y into the node's
    /// band extent, keep X as dropped, and flag the position manual so it
    /// survives re-projection.
    ///
    /// This is the cheap path — no passes re-run, cost is independent of
    /// graph size.
    ///
    /// # Errors
    ///
    /// [`HeadwaterError::NodeNotFound`] if the ID is not in this projection.
    pub fn commit_drag(&mut self, id: &str, x: f32, y: f32) -> Result<Position> {
        let &i = self
            .node_index
            .get(id)
            .ok_or_else(|| HeadwaterError::NodeNotFound(id.to_string()))?;
        let node = &mut self.nodes[i];
        let y = match node.extent {
            Some(extent) => extent.clamp_y(y),
            None => y,
        };
        node.position = Position::new(x, y);
        node.manual = true;
        Ok(node.position)
    }

    /// Manual positions to thread into the next pass.
    pub(crate) fn manual_positions(&self) -> PriorPositions {
        self.nodes
            .iter()
            .filter(|n| n.manual)
            .map(|n| (n.id.clone(), n.position))
            .collect()
    }
}

/// The projection pipeline, configured once and reused across passes.
#[derive(Debug, Clone, Default)]
pub struct Projector {
    config: LayoutConfig,
}

impl Projector {
    /// Create a projector with the given layout configuration.
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// The layout configuration in use.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Run the full pipeline.
    ///
    /// Pass the previous projection as `prior` to preserve user-dragged
    /// positions across re-projection; fresh positions are computed for
    /// everything else.
    ///
    /// # Errors
    ///
    /// [`HeadwaterError::RootNotFound`] when the graph's root ID has no
    /// matching node.
    pub fn project(
        &self,
        graph: &LineageGraph,
        expansion: &ExpansionState,
        prior: Option<&Projection>,
    ) -> Result<Projection> {
        let index = GraphIndex::build(graph);
        let visibility = resolve_with_index(graph, &index, expansion)?;
        let has_upstream = !index.upstream_of(graph.root_id()).is_empty();

        let carried = prior.map(Projection::manual_positions).unwrap_or_default();
        let laid = layout(graph, &index, &visibility, &carried, &self.config);
        let compressed = compress(graph, &index, &visibility, &laid.nodes);

        let stats = ProjectionStats {
            visible: visibility.visible().len(),
            ghosted: visibility.ghosted().len(),
            placeholders: compressed.placeholders.len(),
            skipped_edges: index.skipped_edges(),
            recentered: laid.recentered,
        };
        debug!(
            visible = stats.visible,
            ghosted = stats.ghosted,
            placeholders = stats.placeholders,
            skipped_edges = stats.skipped_edges,
            "projection pass complete"
        );

        Ok(Projection::assemble(
            laid.nodes,
            laid.bands,
            compressed.edges,
            compressed.placeholders,
            stats,
            has_upstream,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, LineageNode};

    fn diamond_tail() -> LineageGraph {
        GraphBuilder::new("R")
            .node(LineageNode::new("R", 0))
            .node(LineageNode::new("P1", 1))
            .node(LineageNode::new("P2", 1))
            .node(LineageNode::new("G", 2))
            .node(LineageNode::new("S", 3).as_source())
            .edge("P1", "R")
            .edge("P2", "R")
            .edge("G", "P1")
            .edge("S", "G")
            .build()
            .unwrap()
    }

    #[test]
    fn test_full_pipeline() {
        let projection = Projector::default()
            .project(&diamond_tail(), &ExpansionState::new(), None)
            .unwrap();
        assert_eq!(projection.nodes.len(), 5);
        assert_eq!(projection.stats.visible, 4);
        assert_eq!(projection.stats.ghosted, 1);
        assert_eq!(projection.stats.placeholders, 1);
        assert!(projection.has_upstream());
        assert!(projection.node("G").unwrap().ghosted);
    }

    #[test]
    fn test_root_not_found_aborts() {
        let mut graph = diamond_tail();
        graph.metadata.root_model_id = "gone".to_string();
        let err = Projector::default()
            .project(&graph, &ExpansionState::new(), None)
            .unwrap_err();
        assert!(matches!(err, HeadwaterError::RootNotFound(_)));
    }

    #[test]
    fn test_empty_upstream_is_informational() {
        let graph = GraphBuilder::new("R")
            .node(LineageNode::new("R", 0))
            .build()
            .unwrap();
        let projection = Projector::default()
            .project(&graph, &ExpansionState::new(), None)
            .unwrap();
        assert!(!projection.has_upstream());
        assert_eq!(projection.nodes.len(), 1);
    }

    #[test]
    fn test_idempotent_given_same_inputs() {
        let graph = diamond_tail();
        let projector = Projector::default();
        let expansion = ExpansionState::new();

        let a = projector.project(&graph, &expansion, None).unwrap();
        let b = projector.project(&graph, &expansion, None).unwrap();
        for (na, nb) in a.nodes.iter().zip(&b.nodes) {
            assert_eq!(na.id, nb.id);
            assert_eq!(na.position, nb.position);
        }
    }

    #[test]
    fn test_manual_positions_survive_reprojection() {
        let graph = diamond_tail();
        let projector = Projector::default();
        let expansion = ExpansionState::new();

        let mut first = projector.project(&graph, &expansion, None).unwrap();
        first.commit_drag("P1", 512.0, 700.0).unwrap();

        let second = projector.project(&graph, &expansion, Some(&first)).unwrap();
        let p1 = second.node("P1").unwrap();
        assert!(p1.manual);
        assert_eq!(p1.position, first.node("P1").unwrap().position);

        // Nodes nobody touched are laid out fresh, not carried.
        assert!(!second.node("P2").unwrap().manual);
    }

    #[test]
    fn test_commit_drag_clamps_into_band() {
        let graph = GraphBuilder::new("R")
            .node(LineageNode::new("R", 0).in_layer("marts"))
            .node(LineageNode::new("P", 1).in_layer("staging"))
            .edge("P", "R")
            .build()
            .unwrap();
        let mut projection = Projector::default()
            .project(&graph, &ExpansionState::new(), None)
            .unwrap();

        let extent = projection.node("P").unwrap().extent.unwrap();
        let committed = projection.commit_drag("P", -42.0, extent.max_y + 500.0).unwrap();
        assert_eq!(committed.x, -42.0);
        assert_eq!(committed.y, extent.max_y);
        assert!(projection.node("P").unwrap().manual);
    }

    #[test]
    fn test_commit_drag_unknown_node() {
        let mut projection = Projector::default()
            .project(&diamond_tail(), &ExpansionState::new(), None)
            .unwrap();
        let err = projection.commit_drag("nope", 0.0, 0.0).unwrap_err();
        assert!(matches!(err, HeadwaterError::NodeNotFound(_)));
    }

    #[test]
    fn test_placeholder_lookup() {
        let projection = Projector::default()
            .project(&diamond_tail(), &ExpansionState::new(), None)
            .unwrap();
        let id = crate::compress::PlaceholderNode::id_for("P1");
        assert_eq!(projection.placeholder(&id).unwrap().target, "P1");
    }

    #[test]
    fn test_dangling_edges_counted() {
        let graph = GraphBuilder::new("R")
            .node(LineageNode::new("R", 0))
            .node(LineageNode::new("P", 1))
            .edge("P", "R")
            .edge("phantom", "R")
            .build()
            .unwrap();
        let projection = Projector::default()
            .project(&graph, &ExpansionState::new(), None)
            .unwrap();
        assert_eq!(projection.stats.skipped_edges, 1);
        assert_eq!(projection.edges.len(), 1);
    }
}
