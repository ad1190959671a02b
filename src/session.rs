//! View Session
//!
//! Stateful shell around the pure projection pipeline, modelling one open
//! lineage view: it owns the graph, the monotonic expansion state, and the
//! current projection, and re-runs the pipeline on every expansion while
//! carrying user-dragged positions forward.
//!
//! Pointer drags go through an explicit interaction state machine
//! (`Idle -> Dragging -> commit`): transient motion never touches the
//! canonical projection, and the clamped position is persisted only at
//! commit. Ghosted nodes are non-interactive and cannot be dragged.
//!
//! Dropping the session discards the expansion state; there is no teardown
//! protocol.
//!
//! # Example
//!
//! ```rust
//! use headwater::graph::{GraphBuilder, LineageNode};
//! use headwater::layout::LayoutConfig;
//! use headwater::session::LineageSession;
//!
//! let graph = GraphBuilder::new("rpt")
//!     .node(LineageNode::new("rpt", 0))
//!     .node(LineageNode::new("stg", 1))
//!     .node(LineageNode::new("raw", 2))
//!     .edge("stg", "rpt")
//!     .edge("raw", "stg")
//!     .build()
//!     .unwrap();
//!
//! let mut session = LineageSession::open(graph, LayoutConfig::default()).unwrap();
//! assert!(session.projection().node("raw").unwrap().ghosted);
//!
//! session.expand("stg").unwrap();
//! assert!(!session.projection().node("raw").unwrap().ghosted);
//! ```

use crate::error::{HeadwaterError, Result};
use crate::graph::LineageGraph;
use crate::layout::{LayoutConfig, Position};
use crate::projector::{Projection, Projector};
use crate::visibility::ExpansionState;
use parking_lot::RwLock;
use tracing::debug;

/// Phases of a pointer-drag interaction.
#[derive(Debug, Clone, PartialEq)]
enum DragState {
    Idle,
    Dragging { id: String, current: Position },
}

/// One open lineage view: graph, expansion state, current projection, and
/// the in-flight drag interaction.
pub struct LineageSession {
    graph: LineageGraph,
    projector: Projector,
    expansion: ExpansionState,
    projection: Projection,
    drag: DragState,
}

impl LineageSession {
    /// Open a view over a graph, validating the root and producing the
    /// initial projection.
    ///
    /// # Errors
    ///
    /// [`HeadwaterError::RootNotFound`] when the graph's root ID has no
    /// matching node.
    pub fn open(graph: LineageGraph, config: LayoutConfig) -> Result<Self> {
        let projector = Projector::new(config);
        let expansion = ExpansionState::new();
        let projection = projector.project(&graph, &expansion, None)?;
        Ok(Self {
            graph,
            projector,
            expansion,
            projection,
            drag: DragState::Idle,
        })
    }

    /// The current projection.
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// The expansion state so far.
    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    /// The underlying graph.
    pub fn graph(&self) -> &LineageGraph {
        &self.graph
    }

    /// Expand a node: reveal one more hop of its ancestry and re-project.
    /// Expansion is monotonic — previously revealed nodes never collapse —
    /// and already-expanded IDs are a no-op.
    pub fn expand(&mut self, id: impl Into<String>) -> Result<&Projection> {
        let id = id.into();
        if self.expansion.expand(id.clone()) {
            debug!(id = %id, "expanding node");
            self.projection =
                self.projector
                    .project(&self.graph, &self.expansion, Some(&self.projection))?;
        }
        Ok(&self.projection)
    }

    /// Expand the node a placeholder compresses ancestry for (the click
    /// action on a placeholder).
    ///
    /// # Errors
    ///
    /// [`HeadwaterError::NodeNotFound`] when the placeholder ID is not part
    /// of the current projection.
    pub fn expand_placeholder(&mut self, placeholder_id: &str) -> Result<&Projection> {
        let target = self
            .projection
            .placeholder(placeholder_id)
            .map(|p| p.target.clone())
            .ok_or_else(|| HeadwaterError::NodeNotFound(placeholder_id.to_string()))?;
        self.expand(target)
    }

    /// Begin dragging a node.
    ///
    /// # Errors
    ///
    /// [`HeadwaterError::InvalidState`] if a drag is already in progress or
    /// the node is ghosted (non-interactive);
    /// [`HeadwaterError::NodeNotFound`] for unknown IDs.
    pub fn begin_drag(&mut self, id: &str) -> Result<()> {
        if self.drag != DragState::Idle {
            return Err(HeadwaterError::InvalidState(
                "drag already in progress".to_string(),
            ));
        }
        let node = self
            .projection
            .node(id)
            .ok_or_else(|| HeadwaterError::NodeNotFound(id.to_string()))?;
        if node.ghosted {
            return Err(HeadwaterError::InvalidState(format!(
                "node '{id}' is ghosted and non-interactive"
            )));
        }
        self.drag = DragState::Dragging {
            id: id.to_string(),
            current: node.position,
        };
        Ok(())
    }

    /// Track pointer motion during a drag. Transient: the canonical
    /// projection is untouched until commit.
    pub fn drag_to(&mut self, x: f32, y: f32) -> Result<()> {
        match &mut self.drag {
            DragState::Dragging { current, .. } => {
                *current = Position::new(x, y);
                Ok(())
            }
            DragState::Idle => Err(HeadwaterError::InvalidState(
                "no drag in progress".to_string(),
            )),
        }
    }

    /// Commit the drag: clamp the dropped position into the node's band
    /// extent, persist it as manual, and return to idle.
    pub fn commit_drag(&mut self) -> Result<Position> {
        match std::mem::replace(&mut self.drag, DragState::Idle) {
            DragState::Dragging { id, current } => {
                self.projection.commit_drag(&id, current.x, current.y)
            }
            DragState::Idle => Err(HeadwaterError::InvalidState(
                "no drag in progress".to_string(),
            )),
        }
    }

    /// Abandon the in-flight drag without persisting anything.
    pub fn cancel_drag(&mut self) {
        self.drag = DragState::Idle;
    }

    /// The node currently being dragged and its transient position, if any.
    pub fn dragging(&self) -> Option<(&str, Position)> {
        match &self.drag {
            DragState::Dragging { id, current } => Some((id.as_str(), *current)),
            DragState::Idle => None,
        }
    }
}

/// Thread-safe wrapper around [`LineageSession`] using `parking_lot::RwLock`,
/// for hosts whose UI runtime and data-fetch side live on different threads.
pub struct SharedSession {
    inner: RwLock<LineageSession>,
}

impl SharedSession {
    /// Open a shared view over a graph.
    pub fn open(graph: LineageGraph, config: LayoutConfig) -> Result<Self> {
        Ok(Self {
            inner: RwLock::new(LineageSession::open(graph, config)?),
        })
    }

    /// Snapshot the current projection (cloned).
    pub fn projection(&self) -> Projection {
        self.inner.read().projection.clone()
    }

    /// Expand a node and snapshot the resulting projection.
    pub fn expand(&self, id: impl Into<String>) -> Result<Projection> {
        let mut session = self.inner.write();
        session.expand(id)?;
        Ok(session.projection.clone())
    }

    /// Expand via placeholder click and snapshot the resulting projection.
    pub fn expand_placeholder(&self, placeholder_id: &str) -> Result<Projection> {
        let mut session = self.inner.write();
        session.expand_placeholder(placeholder_id)?;
        Ok(session.projection.clone())
    }

    /// Access the session with a read lock.
    pub fn with_read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&LineageSession) -> R,
    {
        f(&self.inner.read())
    }

    /// Access the session with a write lock.
    pub fn with_write<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut LineageSession) -> R,
    {
        f(&mut self.inner.write())
    }
}
