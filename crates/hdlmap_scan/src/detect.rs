//! Project dialect selection.

use hdlmap_common::Dialect;
use hdlmap_source::SourceTree;

/// Returns the Scala HDL flavor imported by `text`, if any.
pub fn scala_flavor(text: &str) -> Option<Dialect> {
    for line in text.lines() {
        let line = line.trim_start();
        let Some(rest) = line.strip_prefix("import") else {
            continue;
        };
        let rest = rest.trim_start();
        if rest.starts_with("chisel3") || rest.starts_with("chisel.") || rest.starts_with("freechips.") {
            return Some(Dialect::Chisel);
        }
        if rest.starts_with("spinal.") {
            return Some(Dialect::SpinalHdl);
        }
    }
    None
}

/// Chooses the dialect a project is scanned with.
///
/// An explicit override wins. Otherwise Chisel imports, then SpinalHDL
/// imports, then any Bluespec file, then the larger of the VHDL and
/// Verilog-family file counts (ties go to the Verilog family, which is
/// SystemVerilog when any `.sv` file exists). Returns `None` when the tree
/// holds no recognizable source.
pub fn detect_dialect(tree: &SourceTree, explicit: Option<Dialect>) -> Option<Dialect> {
    if explicit.is_some() {
        return explicit;
    }

    let mut scala = 0usize;
    let mut chisel = false;
    let mut spinal = false;
    let (mut bsv, mut vhdl, mut verilog, mut sv) = (0usize, 0usize, 0usize, 0usize);

    for entry in tree.sources() {
        match entry.extension().as_str() {
            "scala" => {
                scala += 1;
                if chisel {
                    continue;
                }
                let text = match std::fs::read(&entry.path) {
                    Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    Err(err) => {
                        tracing::debug!(file = %entry.relative, error = %err, "skipping unreadable file during detection");
                        continue;
                    }
                };
                match scala_flavor(&text) {
                    Some(Dialect::Chisel) => chisel = true,
                    Some(Dialect::SpinalHdl) => spinal = true,
                    _ => {}
                }
            }
            "bsv" => bsv += 1,
            "vhd" | "vhdl" => vhdl += 1,
            "v" => verilog += 1,
            "sv" => sv += 1,
            _ => {}
        }
    }

    let dialect = if chisel {
        Dialect::Chisel
    } else if spinal {
        Dialect::SpinalHdl
    } else if bsv > 0 {
        Dialect::Bluespec
    } else if verilog + sv == 0 && vhdl == 0 {
        if scala == 0 {
            return None;
        }
        Dialect::Chisel
    } else if vhdl > verilog + sv {
        Dialect::Vhdl
    } else if sv > 0 {
        Dialect::SystemVerilog
    } else {
        Dialect::Verilog
    };

    tracing::debug!(dialect = %dialect, root = %tree.root().display(), "selected project dialect");
    Some(dialect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdlmap_source::DiscoveryOptions;
    use std::fs;
    use std::path::Path;

    fn tree(files: &[(&str, &str)]) -> (tempfile::TempDir, SourceTree) {
        let dir = tempfile::tempdir().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let tree = SourceTree::discover(dir.path(), &DiscoveryOptions::default()).unwrap();
        (dir, tree)
    }

    #[test]
    fn flavor_from_imports() {
        assert_eq!(scala_flavor("package x\nimport chisel3._\n"), Some(Dialect::Chisel));
        assert_eq!(scala_flavor("  import spinal.core._"), Some(Dialect::SpinalHdl));
        assert_eq!(scala_flavor("import scala.collection._"), None);
    }

    #[test]
    fn override_wins() {
        let (_dir, tree) = tree(&[("a.v", "module a; endmodule")]);
        assert_eq!(detect_dialect(&tree, Some(Dialect::Vhdl)), Some(Dialect::Vhdl));
    }

    #[test]
    fn chisel_beats_verilog_resources() {
        let (_dir, tree) = tree(&[
            ("src/main/scala/Core.scala", "import chisel3._\nclass Core extends Module {}"),
            ("src/main/resources/ram.v", "module ram; endmodule"),
        ]);
        assert_eq!(detect_dialect(&tree, None), Some(Dialect::Chisel));
    }

    #[test]
    fn spinal_detected() {
        let (_dir, tree) = tree(&[("hw/Top.scala", "import spinal.core._\n")]);
        assert_eq!(detect_dialect(&tree, None), Some(Dialect::SpinalHdl));
    }

    #[test]
    fn majority_and_ties() {
        let (_dir, t) = tree(&[("a.vhd", ""), ("b.vhd", ""), ("c.v", "")]);
        assert_eq!(detect_dialect(&t, None), Some(Dialect::Vhdl));

        let (_dir, t) = tree(&[("a.vhd", ""), ("c.v", "")]);
        assert_eq!(detect_dialect(&t, None), Some(Dialect::Verilog));

        let (_dir, t) = tree(&[("a.v", ""), ("b.sv", "")]);
        assert_eq!(detect_dialect(&t, None), Some(Dialect::SystemVerilog));
    }

    #[test]
    fn bluespec_and_empty() {
        let (_dir, t) = tree(&[("src/Core.bsv", ""), ("verilog/x.v", ""), ("verilog/y.v", "")]);
        assert_eq!(detect_dialect(&t, None), Some(Dialect::Bluespec));

        let empty = SourceTree::from_entries(Path::new("/none"), Vec::new(), Vec::new());
        assert_eq!(detect_dialect(&empty, None), None);
    }
}
