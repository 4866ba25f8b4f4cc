//! `hdlmap analyze`: one project to one descriptor.

use std::path::PathBuf;

use hdlmap_assemble::{analyze_project, AnalysisRequest};
use hdlmap_diagnostics::DiagnosticSink;
use hdlmap_scan::ScannerRegistry;
use hdlmap_source::SourceDb;

use crate::pipeline::{candidate_table, load_config, print_diagnostics};
use crate::{AnalyzeArgs, GlobalArgs};

/// Runs the analysis and prints (or writes) the descriptor as JSON.
///
/// Returns 0 when a descriptor was produced, 1 otherwise. A failed
/// `--compile` does not change the exit code; it is reported as a
/// diagnostic and in the descriptor's compile record.
pub fn run(args: &AnalyzeArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let root = PathBuf::from(&args.path);
    let config = load_config(global, &root)?;
    let registry = ScannerRegistry::new()?;

    let request = AnalysisRequest {
        root: root.clone(),
        name: args.name.clone(),
        top: args.top.clone(),
        dialect: args.dialect,
        repository: args.repository.clone(),
        write: !args.dry_run,
        compile: args.compile,
    };

    let sink = DiagnosticSink::new();
    let mut db = SourceDb::new(&root);
    let result = analyze_project(&request, &config, &registry, &mut db, &sink);
    print_diagnostics(&sink.take_all(), &db, global);

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            if let Some(diag) = e.to_diagnostic() {
                print_diagnostics(&[diag], &db, global);
            } else {
                eprintln!("error: {e}");
            }
            if args.explain && !e.candidates().is_empty() {
                eprint!("{}", candidate_table(e.candidates()));
            }
            return Ok(1);
        }
    };

    if args.explain {
        eprint!("{}", candidate_table(&report.candidates));
    } else if global.verbose {
        if let Some(best) = report.candidates.first() {
            eprintln!("top '{}' scored {}: {}", best.module, best.total_score, best.explain());
        }
    }

    let json = report.descriptor.to_json(config.output.pretty)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))?;
            if !global.quiet {
                eprintln!("     Wrote {path}");
            }
        }
        None => println!("{json}"),
    }
    Ok(0)
}
