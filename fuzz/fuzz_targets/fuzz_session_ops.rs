#![no_main]

use arbitrary::Arbitrary;
use headwater::graph::{GraphBuilder, LineageNode};
use headwater::layout::LayoutConfig;
use headwater::session::LineageSession;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Op {
    Expand { node: u8 },
    Drag { node: u8, x: f32, y: f32 },
    ExpandPlaceholder { index: u8 },
    CancelDrag,
}

#[derive(Arbitrary, Debug)]
struct SessionInput {
    parents: Vec<u8>,
    sources: Vec<bool>,
    layered: bool,
    ops: Vec<Op>,
}

fuzz_target!(|input: SessionInput| {
    // Limit graph and op-sequence size to keep iterations fast
    if input.parents.len() > 48 || input.ops.len() > 48 {
        return;
    }

    // Build an upstream tree: node i+1 hangs off an earlier node, levels
    // follow parent depth
    let n = input.parents.len() + 1;
    let mut levels = vec![0u32; n];
    let mut builder = GraphBuilder::new("n0");
    if input.layered {
        builder = builder.layers(["bronze", "silver", "gold"]);
    }
    let mut nodes = vec![LineageNode::new("n0", 0)];
    for (i, pick) in input.parents.iter().enumerate() {
        let parent = (*pick as usize) % (i + 1);
        levels[i + 1] = levels[parent] + 1;
        let mut node = LineageNode::new(format!("n{}", i + 1), levels[i + 1]);
        if input.sources.get(i + 1).copied().unwrap_or(false) {
            node = node.as_source();
        }
        if input.layered {
            node = node.in_layer(["bronze", "silver", "gold"][(i + 1) % 3]);
        }
        nodes.push(node);
    }
    for node in nodes {
        builder = builder.node(node);
    }
    for (i, pick) in input.parents.iter().enumerate() {
        let parent = (*pick as usize) % (i + 1);
        builder = builder.edge(format!("n{}", i + 1), format!("n{parent}"));
    }
    let graph = match builder.build() {
        Ok(graph) => graph,
        Err(_) => return,
    };

    // Drive the session with arbitrary interactions. Operations against
    // ghosted nodes or out-of-order drags return errors; none may panic.
    let mut session = match LineageSession::open(graph, LayoutConfig::default()) {
        Ok(session) => session,
        Err(_) => return,
    };
    for op in &input.ops {
        match op {
            Op::Expand { node } => {
                let id = format!("n{}", *node as usize % n);
                let _ = session.expand(id);
            }
            Op::Drag { node, x, y } => {
                if !x.is_finite() || !y.is_finite() {
                    continue;
                }
                let id = format!("n{}", *node as usize % n);
                if session.begin_drag(&id).is_ok() {
                    let _ = session.drag_to(*x, *y);
                    let _ = session.commit_drag();
                }
            }
            Op::ExpandPlaceholder { index } => {
                let id = session
                    .projection()
                    .placeholders
                    .get(*index as usize)
                    .map(|p| p.id.clone());
                if let Some(id) = id {
                    let _ = session.expand_placeholder(&id);
                }
            }
            Op::CancelDrag => session.cancel_drag(),
        }

        // Band containment must hold after every interaction
        for node in &session.projection().nodes {
            if let Some(extent) = node.extent {
                assert!(node.position.y >= extent.min_y && node.position.y <= extent.max_y);
            }
        }
    }
});
