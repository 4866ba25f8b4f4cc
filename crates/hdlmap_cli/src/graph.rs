//! `hdlmap graph`: the instantiation hierarchy of one project.

use std::path::PathBuf;

use hdlmap_assemble::scan_tree;
use hdlmap_diagnostics::DiagnosticSink;
use hdlmap_graph::DependencyGraph;
use hdlmap_scan::ScannerRegistry;
use hdlmap_source::SourceDb;
use serde_json::json;

use crate::pipeline::{load_config, print_diagnostics};
use crate::{GlobalArgs, GraphArgs, ReportFormat};

/// Prints the graph in the requested format.
pub fn run(args: &GraphArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let root = PathBuf::from(&args.path);
    let config = load_config(global, &root)?;
    let registry = ScannerRegistry::new()?;
    let sink = DiagnosticSink::new();
    let mut db = SourceDb::new(&root);

    let result = scan_tree(&root, args.dialect, &config, &registry, &mut db, &sink);
    print_diagnostics(&sink.take_all(), &db, global);
    let project = match result {
        Ok(project) => project,
        Err(e) => {
            match e.to_diagnostic() {
                Some(diag) => print_diagnostics(&[diag], &db, global),
                None => eprintln!("error: {e}"),
            }
            return Ok(1);
        }
    };

    let text = match args.format {
        ReportFormat::Text => render_text(&project.graph),
        ReportFormat::Json => format!("{}\n", serde_json::to_string_pretty(&render_json(&project.graph))?),
    };
    print!("{text}");
    Ok(0)
}

fn render_text(graph: &DependencyGraph) -> String {
    let mut out = String::new();
    for node in graph.nodes() {
        let children: Vec<&str> = graph.children(node).iter().map(String::as_str).collect();
        if children.is_empty() {
            out.push_str(&format!("{node}\n"));
        } else {
            out.push_str(&format!("{node} -> {}\n", children.join(", ")));
        }
    }
    out.push_str(&format!("\nroots: {}\n", graph.roots().join(", ")));
    for cycle in graph.cycles() {
        out.push_str(&format!("cycle: {}\n", cycle.join(" -> ")));
    }
    for r in graph.unresolved() {
        out.push_str(&format!("unresolved: {} -> {}\n", r.parent, r.child));
    }
    out
}

fn render_json(graph: &DependencyGraph) -> serde_json::Value {
    let edges: Vec<[&str; 2]> = graph
        .nodes()
        .flat_map(|parent| graph.children(parent).iter().map(move |child| [parent, child.as_str()]))
        .collect();
    json!({
        "nodes": graph.nodes().collect::<Vec<_>>(),
        "edges": edges,
        "roots": graph.roots(),
        "cycles": graph.cycles(),
        "unresolved": graph.unresolved(),
    })
}
