//! Offline session example: edit a circuit against the in-memory backend,
//! save it, run an analysis and print the results.

use circuit_editor::api::{InMemoryCircuitApi, NewCircuit, STATIC_ANALYSIS};
use circuit_editor::prelude::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), CircuitEditorError> {
    let api = Arc::new(InMemoryCircuitApi::new());
    let mut editor = CircuitEditor::create(
        api,
        NewCircuit::new("RC low-pass").with_description("Offline example"),
    )
    .await?;

    let state = editor.state_mut();
    let source = state.add_component(ComponentKind::Voltage, Some(Position::new(100.0, 100.0)), None);
    let resistor = state.add_component(
        ComponentKind::Resistor,
        Some(Position::new(263.0, 97.0)),
        Some("R1".to_string()),
    );
    let capacitor = state.add_component(ComponentKind::Capacitor, Some(Position::new(420.0, 100.0)), None);
    state.add_edge(&source, &resistor, None, None);
    state.connect(
        NewEdge::new(&resistor, &capacitor).with_style(EdgeStyle::stroke("#2563eb").with_width(2.0)),
    );

    let report = editor.state().validate_circuit();
    println!("Circuit {}: {}", editor.id(), editor.record().name);
    if report.has_warnings() {
        for warning in &report.warnings {
            println!("  warning: {}", warning);
        }
    } else {
        println!("  no warnings");
    }

    let stats = editor.state().circuit_stats();
    println!("  {} components, {} connections", stats.total_nodes, stats.total_edges);

    let response = editor.analyze_circuit(STATIC_ANALYSIS).await?;
    println!("Analysis: {}", response);

    println!("{}", editor.state().export_to_api().to_json_pretty()?);
    Ok(())
}
