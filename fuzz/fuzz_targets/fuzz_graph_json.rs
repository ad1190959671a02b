#![no_main]

use headwater::projector::Projector;
use headwater::visibility::ExpansionState;
use headwater::LineageGraph;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Fuzz the wire-format parser and the full projection pipeline.
    // Malformed payloads must fail cleanly; parseable ones must project
    // without panicking, whatever their topology.
    if let Ok(graph) = LineageGraph::from_json(data) {
        let _ = Projector::default().project(&graph, &ExpansionState::new(), None);
    }
});
