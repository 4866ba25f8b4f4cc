//! `hdlmap batch`: many projects on a worker pool.
//!
//! Each project is analysed independently. Its descriptor goes to
//! `<name>.json`, its rendered diagnostics to `<name>.log` and its outcome
//! (`OK` or `ERROR`) to `<name>.status`. One failing project never stops the
//! others.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use hdlmap_assemble::{analyze_project, AnalysisRequest};
use hdlmap_config::HdlmapConfig;
use hdlmap_diagnostics::DiagnosticSink;
use hdlmap_scan::ScannerRegistry;
use hdlmap_source::SourceDb;
use rayon::prelude::*;

use crate::pipeline::{candidate_table, load_config, render_diagnostics};
use crate::{BatchArgs, GlobalArgs};

/// One project to analyse.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Job {
    /// Output file stem, unique within the batch.
    stem: String,
    /// Directory name, passed on as the repository-name hint.
    name: String,
    root: PathBuf,
}

/// Runs every project and returns 0 if all of them succeeded.
pub fn run(args: &BatchArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(&args.out_dir);
    fs::create_dir_all(&out_dir)?;

    let config = load_config(global, Path::new("."))?;
    let registry = ScannerRegistry::new()?;
    let jobs = plan_jobs(&args.paths);
    let threads = args
        .jobs
        .or(config.batch.jobs)
        .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, |n| n.get()));

    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    tracing::info!(projects = jobs.len(), threads, "starting batch");

    let results: Vec<(String, bool)> = pool.install(|| {
        jobs.par_iter()
            .map(|job| {
                let ok = match run_one(job, &out_dir, &config, &registry, !args.dry_run) {
                    Ok(ok) => ok,
                    Err(e) => {
                        tracing::error!(project = %job.stem, error = %e, "cannot write batch outputs");
                        false
                    }
                };
                (job.stem.clone(), ok)
            })
            .collect()
    });

    let failed: Vec<&str> = results.iter().filter(|(_, ok)| !ok).map(|(n, _)| n.as_str()).collect();
    if !global.quiet {
        eprintln!(
            "  Analysed {} projects: {} ok, {} failed",
            results.len(),
            results.len() - failed.len(),
            failed.len()
        );
        for name in &failed {
            eprintln!("     ERROR {name}");
        }
    }
    Ok(if failed.is_empty() { 0 } else { 1 })
}

/// Names each project after its directory. Output stems of repeated names
/// get `-2`, `-3` and so on; the name itself is left alone.
fn plan_jobs(paths: &[String]) -> Vec<Job> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    paths
        .iter()
        .map(|p| {
            let root = PathBuf::from(p);
            let base = root
                .canonicalize()
                .ok()
                .as_deref()
                .unwrap_or(&root)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("project")
                .to_string();
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            let stem = if *count == 1 { base.clone() } else { format!("{base}-{count}") };
            Job { stem, name: base, root }
        })
        .collect()
}

/// Analyses one project and writes its three output files. Returns whether
/// the analysis produced a descriptor.
fn run_one(
    job: &Job,
    out_dir: &Path,
    config: &HdlmapConfig,
    registry: &ScannerRegistry,
    write: bool,
) -> io::Result<bool> {
    let request = AnalysisRequest {
        root: job.root.clone(),
        name: Some(job.name.clone()),
        write,
        ..AnalysisRequest::default()
    };
    let sink = DiagnosticSink::new();
    let mut db = SourceDb::new(&job.root);
    let result = analyze_project(&request, config, registry, &mut db, &sink);

    let mut diags = sink.take_all();
    let mut log = String::new();
    let ok = match result {
        Ok(report) => {
            let json = report
                .descriptor
                .to_json(config.output.pretty)
                .map_err(io::Error::other)?;
            fs::write(out_dir.join(format!("{}.json", job.stem)), format!("{json}\n"))?;
            log.push_str(&candidate_table(&report.candidates));
            true
        }
        Err(e) => {
            match e.to_diagnostic() {
                Some(diag) => diags.push(diag),
                None => log.push_str(&format!("error: {e}\n")),
            }
            log.push_str(&candidate_table(e.candidates()));
            false
        }
    };

    let rendered = render_diagnostics(&diags, &db, false);
    fs::write(out_dir.join(format!("{}.log", job.stem)), format!("{rendered}{log}"))?;
    fs::write(
        out_dir.join(format!("{}.status", job.stem)),
        if ok { "OK\n" } else { "ERROR\n" },
    )?;
    tracing::debug!(project = %job.stem, ok, "batch project finished");
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, content).unwrap();
    }

    #[test]
    fn repeated_names_get_suffixes() {
        let jobs = plan_jobs(&["/x/core".to_string(), "/y/core".to_string(), "/z/soc".to_string()]);
        let stems: Vec<&str> = jobs.iter().map(|j| j.stem.as_str()).collect();
        assert_eq!(stems, vec!["core", "core-2", "soc"]);
        let names: Vec<&str> = jobs.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["core", "core", "soc"]);
    }

    #[test]
    fn suffixed_projects_keep_their_directory_name() {
        let tmp = tempfile::tempdir().unwrap();
        let first = tmp.path().join("x/core");
        let second = tmp.path().join("y/core");
        write(&first, "rtl/cpu.v", "module cpu(input clk);\nendmodule\n");
        write(&second, "rtl/cpu.v", "module cpu(input clk);\nendmodule\n");
        let out = tmp.path().join("out");
        fs::create_dir_all(&out).unwrap();

        let jobs = plan_jobs(&[first.to_string_lossy().into_owned(), second.to_string_lossy().into_owned()]);
        let config = HdlmapConfig::default();
        let registry = ScannerRegistry::new().unwrap();
        for job in &jobs {
            assert!(run_one(job, &out, &config, &registry, false).unwrap());
        }

        let a: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("core.json")).unwrap()).unwrap();
        let b: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("core-2.json")).unwrap()).unwrap();
        assert_eq!(a["name"], "core");
        assert_eq!(b["name"], "core");
        assert_eq!(fs::read_to_string(out.join("core-2.status")).unwrap(), "OK\n");
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().join("good");
        let empty = tmp.path().join("empty");
        write(&good, "rtl/cpu.v", "module cpu(input clk);\n  alu u();\nendmodule\n");
        write(&good, "rtl/alu.v", "module alu; endmodule\n");
        fs::create_dir_all(&empty).unwrap();
        let out = tmp.path().join("out");

        let args = BatchArgs {
            paths: vec![good.to_string_lossy().into_owned(), empty.to_string_lossy().into_owned()],
            out_dir: out.to_string_lossy().into_owned(),
            jobs: Some(2),
            dry_run: true,
        };
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: None,
        };
        assert_eq!(run(&args, &global).unwrap(), 1);

        assert_eq!(fs::read_to_string(out.join("good.status")).unwrap(), "OK\n");
        assert_eq!(fs::read_to_string(out.join("empty.status")).unwrap(), "ERROR\n");
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("good.json")).unwrap()).unwrap();
        assert_eq!(json["top_module"], "cpu");
        assert!(!out.join("empty.json").exists());
        assert!(fs::read_to_string(out.join("empty.log")).unwrap().contains("E201"));
    }
}
