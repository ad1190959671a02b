//! # Headwater - Progressive Lineage Graph Projection
//!
//! Headwater is the layout engine behind upstream-dependency ("lineage")
//! views: given a dependency DAG rooted at a focal node, it computes which
//! ancestors are visible vs ghosted, assigns every node a deterministic
//! canvas position bucketed by semantic layer or pipeline depth, and
//! compresses multi-hop chains to hidden ancestors through synthetic
//! placeholder nodes — so a host UI only has to draw what it is handed.
//!
//! ## Quick Start
//!
//! ```rust
//! use headwater::graph::{GraphBuilder, LineageNode};
//! use headwater::projector::Projector;
//! use headwater::visibility::ExpansionState;
//!
//! fn main() -> headwater::Result<()> {
//!     // The root, its parent, and a source two hops further upstream.
//!     let graph = GraphBuilder::new("rpt_orders")
//!         .node(LineageNode::new("rpt_orders", 0))
//!         .node(LineageNode::new("stg_orders", 1))
//!         .node(LineageNode::new("int_orders", 2))
//!         .node(LineageNode::new("raw_orders", 3).as_source().with_source_name("erp"))
//!         .edge("stg_orders", "rpt_orders")
//!         .edge("int_orders", "stg_orders")
//!         .edge("raw_orders", "int_orders")
//!         .build()?;
//!
//!     let projector = Projector::default();
//!     let mut expansion = ExpansionState::new();
//!
//!     // First pass: int_orders is ghosted, and a placeholder bridges the
//!     // source down to stg_orders.
//!     let projection = projector.project(&graph, &expansion, None)?;
//!     assert!(projection.node("int_orders").unwrap().ghosted);
//!     assert_eq!(projection.placeholders.len(), 1);
//!
//!     // Expanding stg_orders reveals one more hop and dissolves the
//!     // placeholder.
//!     expansion.expand("stg_orders");
//!     let projection = projector.project(&graph, &expansion, Some(&projection))?;
//!     assert!(!projection.node("int_orders").unwrap().ghosted);
//!     assert!(projection.placeholders.is_empty());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Distance-bounded visibility**: root + direct parents + sources, one
//!   extra hop per user expansion — never full reachability
//! - **Banded layout**: semantic layers become stacked background bands
//!   that double as vertical drag bounds
//! - **Edge compression**: multi-hop chains to hidden ancestors collapse
//!   into one placeholder per target, preserving honest lineage
//! - **Manual positions**: user drags survive re-projection via explicit
//!   carry-forward, no hidden state
//! - **Data-quality tolerance**: dangling edges and duplicate IDs degrade
//!   gracefully and are surfaced in pass diagnostics
//!
//! ## Sessions
//!
//! Hosts that prefer a stateful handle over threading projections manually
//! can use [`session::LineageSession`] (expansion + drag state machine) or
//! [`session::SharedSession`] for multi-threaded access.

#![warn(missing_docs)]

// ── Core ──────────────────────────────────────────────────────────────────────
// Graph data model, error taxonomy, visibility resolution.
pub mod error;
pub mod graph;
pub mod visibility;

// ── Projection pipeline ──────────────────────────────────────────────────────
// Layout, edge compression, and the orchestrating projector.
pub mod compress;
pub mod layout;
pub mod projector;

// ── Host-facing session shell ────────────────────────────────────────────────
pub mod session;

// ── Stable API ───────────────────────────────────────────────────────────────
// These types form the core stable API surface.
pub use compress::{EdgeKind, PlaceholderNode, RenderEdge};
pub use error::{ErrorCode, HeadwaterError, Recoverable, RecoveryHint, Result};
pub use graph::{GraphBuilder, GraphMetadata, LineageEdge, LineageGraph, LineageNode};
pub use layout::{Band, Extent, LayoutConfig, Position, PositionedNode};
pub use projector::{Projection, ProjectionStats, Projector};
pub use session::{LineageSession, SharedSession};
pub use visibility::{resolve, ExpansionState, Visibility};

/// Prelude module for convenient imports.
///
/// ```rust
/// use headwater::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{HeadwaterError, Result};
    pub use crate::graph::{GraphBuilder, LineageGraph, LineageNode};
    pub use crate::layout::LayoutConfig;
    pub use crate::projector::{Projection, Projector};
    pub use crate::session::LineageSession;
    pub use crate::visibility::ExpansionState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_to_end() {
        // Layered mart with a deep source chain.
        let graph = GraphBuilder::new("rpt")
            .layers(["staging", "marts"])
            .node(LineageNode::new("rpt", 0).in_layer("marts"))
            .node(LineageNode::new("stg_a", 1).in_layer("staging"))
            .node(LineageNode::new("stg_b", 1).in_layer("staging"))
            .node(LineageNode::new("int", 2).in_layer("staging"))
            .node(LineageNode::new("raw", 3).as_source().with_source_name("warehouse"))
            .edge("stg_a", "rpt")
            .edge("stg_b", "rpt")
            .edge("int", "stg_a")
            .edge("raw", "int")
            .build()
            .unwrap();

        let projector = Projector::default();
        let expansion = ExpansionState::new();
        let projection = projector.project(&graph, &expansion, None).unwrap();

        // Bands in canonical order, nodes contained in their bands.
        let order: Vec<&str> = projection.bands.iter().map(|b| b.layer.as_str()).collect();
        assert_eq!(order, vec!["sources", "staging", "marts"]);
        for node in &projection.nodes {
            let extent = node.extent.unwrap();
            assert!(node.position.y >= extent.min_y && node.position.y <= extent.max_y);
        }

        // int is ghosted but positioned; the placeholder bridges raw down
        // to stg_a.
        assert!(projection.node("int").unwrap().ghosted);
        assert_eq!(projection.placeholders.len(), 1);
        assert_eq!(projection.placeholders[0].target, "stg_a");

        // The projection serializes for the host's rendering surface.
        let json = serde_json::to_string(&projection).unwrap();
        assert!(json.contains("\"placeholders\""));
    }
}
