//! Layer/Level Layout Engine
//!
//! Assigns every node — visible and ghosted — a deterministic (x, y)
//! position, and computes the background band geometry for semantic layers.
//!
//! Two modes, selected by whether any node declares a `layer`:
//!
//! - **Layer mode**: nodes bucket into horizontal bands stacked
//!   top-to-bottom in canonical layer order (`"sources"` first,
//!   `"unassigned"` last). Within a band, higher levels (further upstream)
//!   sit nearer the band top, and a node's Y is clamped into its band — the
//!   clamp range doubles as the node's vertical drag extent.
//! - **Level mode**: the fallback inverted pyramid — sources pinned to a
//!   fixed top row, the root to a fixed bottom row, everything else spaced
//!   by level in between.
//!
//! Horizontal placement is the same in both modes: siblings of a vertical
//! bucket spread symmetrically around X = 0, manual (user-dragged) positions
//! are preserved, and X is bounded against pathological layouts.

use crate::graph::{GraphIndex, LineageGraph, LAYER_SOURCES, LAYER_UNASSIGNED};
use crate::visibility::Visibility;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// A 2D canvas position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate (grows downward, host canvas convention).
    pub y: f32,
}

impl Position {
    /// Create a position.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Vertical drag bounds for a node. Horizontal movement is unconstrained,
/// so the extent carries only the Y range of the owning layer band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    /// Topmost permitted Y.
    pub min_y: f32,
    /// Bottommost permitted Y.
    pub max_y: f32,
}

impl Extent {
    /// Clamp a Y coordinate into the extent.
    pub fn clamp_y(&self, y: f32) -> f32 {
        y.clamp(self.min_y, self.max_y)
    }
}

/// A non-interactive background strip for one semantic layer.
///
/// Rendered behind edges and nodes (z-order: bands < edges < nodes). The
/// left-pinned label re-projection as the viewport pans is a host rendering
/// concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Band {
    /// Layer name this band represents.
    pub layer: String,
    /// Display label.
    pub label: String,
    /// Left edge of the strip.
    pub x: f32,
    /// Top edge of the strip.
    pub y: f32,
    /// Strip width (effectively infinite).
    pub width: f32,
    /// Strip height.
    pub height: f32,
}

impl Band {
    /// Y coordinate of the bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// A node with its computed position, ready for rendering.
///
/// Created fresh on every projection pass; identity across passes is by
/// `id` only, except that a `manual` node's coordinates are threaded
/// through from the previous pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionedNode {
    /// Node ID.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Semantic layer, if declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    /// Upstream depth.
    pub level: u32,
    /// Computed canvas position.
    pub position: Position,
    /// Vertical drag bounds (layer mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,
    /// Present but dimmed and non-interactive.
    pub ghosted: bool,
    /// Raw/ingestion-origin node.
    pub is_source: bool,
    /// Source system metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    /// Position was set by a human drag and survives re-projection.
    pub manual: bool,
}

/// Layout constants.
///
/// Defaults match the production geometry; override individual values with
/// the `with_*` builders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Vertical distance between adjacent levels inside a band.
    pub level_spacing: f32,
    /// Horizontal distance between siblings in a bucket.
    pub sibling_spacing: f32,
    /// Minimum band height.
    pub band_min_height: f32,
    /// Maximum band height.
    pub band_max_height: f32,
    /// Height reserved for the band header.
    pub band_header_height: f32,
    /// Inner vertical padding between band edge and nodes.
    pub band_padding: f32,
    /// Gap between stacked bands.
    pub band_gap: f32,
    /// Y of the first band's top edge.
    pub band_top: f32,
    /// Band strip width (effectively infinite).
    pub band_width: f32,
    /// Bound on |X| for every node.
    pub x_clamp: f32,
    /// X-span beyond which the whole node set is re-centered.
    pub recenter_span: f32,
    /// Fixed top row for sources in level mode.
    pub source_row_y: f32,
    /// Fixed bottom row for the root in level mode.
    pub root_row_y: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            level_spacing: 110.0,
            sibling_spacing: 260.0,
            band_min_height: 140.0,
            band_max_height: 520.0,
            band_header_height: 34.0,
            band_padding: 30.0,
            band_gap: 24.0,
            band_top: 60.0,
            band_width: 100_000.0,
            x_clamp: 4_000.0,
            recenter_span: 8_000.0,
            source_row_y: 80.0,
            root_row_y: 760.0,
        }
    }
}

impl LayoutConfig {
    /// Override the level spacing.
    pub fn with_level_spacing(mut self, spacing: f32) -> Self {
        self.level_spacing = spacing;
        self
    }

    /// Override the sibling spacing.
    pub fn with_sibling_spacing(mut self, spacing: f32) -> Self {
        self.sibling_spacing = spacing;
        self
    }

    /// Override the band height bounds.
    pub fn with_band_height_bounds(mut self, min: f32, max: f32) -> Self {
        self.band_min_height = min;
        self.band_max_height = max;
        self
    }

    /// Override the level-mode row pins.
    pub fn with_level_rows(mut self, source_y: f32, root_y: f32) -> Self {
        self.source_row_y = source_y;
        self.root_row_y = root_y;
        self
    }
}

/// Output of the layout pass.
pub(crate) struct LayoutResult {
    pub nodes: Vec<PositionedNode>,
    pub bands: Vec<Band>,
    pub recentered: bool,
}

/// Manual positions carried forward from a previous pass, keyed by node ID.
pub(crate) type PriorPositions = HashMap<String, Position>;

/// The semantic layer a node lands in when layer mode is active. Unlayered
/// nodes fall into the reserved bands their nature describes.
fn effective_layer(node: &crate::graph::LineageNode) -> &str {
    match node.layer.as_deref() {
        Some(layer) => layer,
        None if node.is_source => LAYER_SOURCES,
        None => LAYER_UNASSIGNED,
    }
}

/// Canonical band order: `"sources"` first, configured layers in metadata
/// order, unlisted layers alphabetically, `"unassigned"` last. Layers no
/// node occupies are omitted entirely.
fn band_order(graph: &LineageGraph, occurring: &HashSet<&str>) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    if occurring.contains(LAYER_SOURCES) {
        order.push(LAYER_SOURCES.to_string());
    }

    for layer in &graph.metadata.lineage_layers {
        if layer == LAYER_SOURCES || layer == LAYER_UNASSIGNED {
            continue;
        }
        if occurring.contains(layer.as_str()) && !order.iter().any(|l| l == layer) {
            order.push(layer.clone());
        }
    }

    let mut extras: Vec<&str> = occurring
        .iter()
        .copied()
        .filter(|l| {
            *l != LAYER_SOURCES
                && *l != LAYER_UNASSIGNED
                && !graph.metadata.lineage_layers.iter().any(|c| c == l)
        })
        .collect();
    extras.sort_unstable();
    order.extend(extras.into_iter().map(String::from));

    if occurring.contains(LAYER_UNASSIGNED) {
        order.push(LAYER_UNASSIGNED.to_string());
    }

    order
}

pub(crate) fn layout(
    graph: &LineageGraph,
    index: &GraphIndex<'_>,
    visibility: &Visibility,
    prior: &PriorPositions,
    config: &LayoutConfig,
) -> LayoutResult {
    if graph.has_layers() {
        layout_layered(graph, index, visibility, prior, config)
    } else {
        layout_leveled(graph, index, visibility, prior, config)
    }
}

fn make_node(
    node: &crate::graph::LineageNode,
    visibility: &Visibility,
    position: Position,
    extent: Option<Extent>,
    manual: bool,
) -> PositionedNode {
    PositionedNode {
        id: node.id.clone(),
        label: node.label.clone(),
        layer: node.layer.clone(),
        level: node.level,
        position,
        extent,
        ghosted: visibility.is_ghosted(&node.id),
        is_source: node.is_source,
        source_name: node.source_name.clone(),
        manual,
    }
}

fn layout_layered(
    graph: &LineageGraph,
    index: &GraphIndex<'_>,
    visibility: &Visibility,
    prior: &PriorPositions,
    config: &LayoutConfig,
) -> LayoutResult {
    // Deduplicate against the index so payload duplicates don't get two
    // positions.
    let deduped: Vec<&crate::graph::LineageNode> = graph
        .nodes
        .iter()
        .filter(|n| index.node(&n.id).map(|first| std::ptr::eq(first, *n)) == Some(true))
        .collect();

    let occurring: HashSet<&str> = deduped.iter().map(|n| effective_layer(n)).collect();
    let order = band_order(graph, &occurring);

    // Distinct levels per layer, sorted descending: further upstream sits
    // nearer the band top.
    let mut levels_by_layer: HashMap<&str, Vec<u32>> = HashMap::new();
    for node in &deduped {
        let levels = levels_by_layer.entry(effective_layer(node)).or_default();
        if !levels.contains(&node.level) {
            levels.push(node.level);
        }
    }
    for levels in levels_by_layer.values_mut() {
        levels.sort_unstable_by(|a, b| b.cmp(a));
    }

    // Band geometry, stacked top to bottom.
    let mut bands: Vec<Band> = Vec::with_capacity(order.len());
    let mut band_index: HashMap<&str, usize> = HashMap::new();
    let mut cursor = config.band_top;
    for layer in &order {
        let level_count = levels_by_layer
            .get(layer.as_str())
            .map(|l| l.len())
            .unwrap_or(1);
        let height = (config.band_header_height
            + 2.0 * config.band_padding
            + (level_count.saturating_sub(1)) as f32 * config.level_spacing)
            .clamp(config.band_min_height, config.band_max_height);
        band_index.insert(layer.as_str(), bands.len());
        bands.push(Band {
            layer: layer.clone(),
            label: layer.clone(),
            x: -config.band_width / 2.0,
            y: cursor,
            width: config.band_width,
            height,
        });
        cursor += height + config.band_gap;
    }

    // Bucket nodes by (band, level) preserving input order for a stable
    // sibling layout across passes.
    let mut buckets: BTreeMap<(usize, u32), Vec<&crate::graph::LineageNode>> = BTreeMap::new();
    for node in &deduped {
        let band_idx = band_index[effective_layer(node)];
        buckets.entry((band_idx, node.level)).or_default().push(node);
    }

    let mut nodes: Vec<PositionedNode> = Vec::with_capacity(deduped.len());
    for ((band_idx, level), members) in &buckets {
        let band = &bands[*band_idx];
        let levels = &levels_by_layer[band.layer.as_str()];
        let level_idx = levels
            .iter()
            .position(|l| l == level)
            .expect("bucket level is recorded for its layer");

        let extent = Extent {
            min_y: band.y + config.band_padding,
            max_y: band.bottom() - config.band_padding,
        };
        let fresh_y =
            band.y + config.band_header_height + config.band_padding + level_idx as f32 * config.level_spacing;

        let count = members.len();
        for (i, node) in members.iter().enumerate() {
            let carried = prior.get(&node.id);
            let manual = carried.is_some();
            let x = carried
                .map(|p| p.x)
                .unwrap_or_else(|| (i as f32 - (count - 1) as f32 / 2.0) * config.sibling_spacing);
            let y = extent.clamp_y(carried.map(|p| p.y).unwrap_or(fresh_y));
            nodes.push(make_node(
                node,
                visibility,
                Position::new(x, y),
                Some(extent),
                manual,
            ));
        }
    }

    let recentered = recenter(&mut nodes, config);
    for node in &mut nodes {
        node.position.x = node.position.x.clamp(-config.x_clamp, config.x_clamp);
    }

    debug!(
        nodes = nodes.len(),
        bands = bands.len(),
        recentered,
        "layered layout complete"
    );

    LayoutResult {
        nodes,
        bands,
        recentered,
    }
}

fn layout_leveled(
    graph: &LineageGraph,
    index: &GraphIndex<'_>,
    visibility: &Visibility,
    prior: &PriorPositions,
    config: &LayoutConfig,
) -> LayoutResult {
    let deduped: Vec<&crate::graph::LineageNode> = graph
        .nodes
        .iter()
        .filter(|n| index.node(&n.id).map(|first| std::ptr::eq(first, *n)) == Some(true))
        .collect();

    // Sources form their own pinned top row; everything else buckets by
    // level on the inverted pyramid.
    let mut buckets: BTreeMap<(u8, u32), Vec<&crate::graph::LineageNode>> = BTreeMap::new();
    for node in &deduped {
        let key = if node.is_source { (0, 0) } else { (1, node.level) };
        buckets.entry(key).or_default().push(node);
    }

    let mut nodes: Vec<PositionedNode> = Vec::with_capacity(deduped.len());
    for ((is_row, level), members) in &buckets {
        let fresh_y = if *is_row == 0 {
            config.source_row_y
        } else {
            config.root_row_y - *level as f32 * config.level_spacing
        };

        let count = members.len();
        for (i, node) in members.iter().enumerate() {
            let carried = prior.get(&node.id);
            let manual = carried.is_some();
            let x = carried
                .map(|p| p.x)
                .unwrap_or_else(|| (i as f32 - (count - 1) as f32 / 2.0) * config.sibling_spacing);
            let y = carried.map(|p| p.y).unwrap_or(fresh_y);
            nodes.push(make_node(node, visibility, Position::new(x, y), None, manual));
        }
    }

    for node in &mut nodes {
        node.position.x = node.position.x.clamp(-config.x_clamp, config.x_clamp);
    }

    debug!(nodes = nodes.len(), "leveled layout complete");

    LayoutResult {
        nodes,
        bands: Vec::new(),
        recentered: false,
    }
}

/// Shift all X by `-(min+max)/2` when the span has drifted past the
/// threshold, so repeated expansions cannot push the graph far off origin.
/// Band geometry is left untouched.
fn recenter(nodes: &mut [PositionedNode], config: &LayoutConfig) -> bool {
    let min = nodes.iter().map(|n| OrderedFloat(n.position.x)).min();
    let max = nodes.iter().map(|n| OrderedFloat(n.position.x)).max();
    let (Some(OrderedFloat(min)), Some(OrderedFloat(max))) = (min, max) else {
        return false;
    };
    if max - min <= config.recenter_span {
        return false;
    }

    let shift = -(min + max) / 2.0;
    for node in nodes.iter_mut() {
        node.position.x += shift;
    }
    debug!(span = (max - min) as f64, shift = shift as f64, "recentered node set");
    true
}
