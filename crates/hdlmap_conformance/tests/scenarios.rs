//! The reference scenarios: one per top-selection situation the resolver and
//! descriptor locator must get right.

use hdlmap_assemble::AnalysisError;
use hdlmap_conformance::{files_named, run, ProjectFixture};
use hdlmap_descriptor::Strategy;

#[test]
fn bluespec_core_over_functional_units() {
    let fx = ProjectFixture::new(&[
        ("src/ALU.bsv", "package ALU;\ninterface ALU_IFC;\n  method Bit#(32) result;\nendinterface\nmodule mkALU(ALU_IFC);\nendmodule\nendpackage\n"),
        ("src/RegFile.bsv", "package RegFile;\nmodule mkRegFile(RF_IFC);\nendmodule\nendpackage\n"),
        (
            "src/Core.bsv",
            "package Core;\nimport ALU::*;\nimport RegFile::*;\n\nmodule mkCore(Core_IFC);\n  ALU_IFC alu <- mkALU;\n  RF_IFC rf <- mkRegFile;\nendmodule\nendpackage\n",
        ),
    ]);
    let out = run(&fx.request("riscv-bsv"));
    let d = &out.report().descriptor;
    assert_eq!(d.top_module, "mkCore");
    assert_eq!(d.language, "bluespec");
    assert_eq!(d.language_version.as_deref(), Some("bsc"));
    assert_eq!(d.files, vec!["src/Core.bsv", "src/ALU.bsv", "src/RegFile.bsv"]);
    assert_eq!(d.interfaces, vec!["ALU_IFC"]);

    let candidates = &out.report().candidates;
    assert_eq!(candidates[0].module, "mkCore");
    assert!(candidates.iter().filter(|c| c.module != "mkCore").all(|c| c.flagged));
}

#[test]
fn subproject_descriptor_is_the_tops_own() {
    let sbt = "ThisBuild / scalaVersion := \"2.13.12\"\nlibraryDependencies += \"org.chipsalliance\" %% \"chisel\" % \"6.2.0\"\n";
    let fx = ProjectFixture::new(&[
        ("cpu/build.sbt", sbt),
        (
            "cpu/src/main/scala/CpuTop.scala",
            "import chisel3._\nclass CpuTop extends Module {\n  val io = IO(new Bundle {})\n  val alu = Module(new Alu)\n}\n",
        ),
        ("cpu/src/main/scala/Alu.scala", "import chisel3._\nclass Alu extends Module {\n  val io = IO(new Bundle {})\n}\n"),
        ("periph/build.sbt", sbt),
        (
            "periph/src/main/scala/Uart.scala",
            "import chisel3._\nclass Uart extends Module {\n  val io = IO(new Bundle {})\n}\n",
        ),
    ]);
    let mut request = fx.request("multi");
    request.write = true;
    let out = run(&request);
    let report = out.report();

    assert_eq!(report.descriptor.top_module, "CpuTop");
    let bd = report.build_descriptor.as_ref().unwrap();
    assert_eq!(bd.relative, "cpu/build.sbt");
    assert_eq!(bd.strategy, Strategy::Proximity);
    assert!(!bd.synthesized);
    assert_eq!(report.descriptor.build_sbt.as_deref(), Some("cpu/build.sbt"));
    assert_eq!(
        report.descriptor.main_app.as_deref(),
        Some("cpu/src/main/scala/CpuTopMain.scala")
    );
    assert!(fx.exists("cpu/src/main/scala/CpuTopMain.scala"));
    assert!(!fx.exists("build.sbt"));
    assert_eq!(files_named(fx.root(), "build.sbt").len(), 2);
}

#[test]
fn core_with_parent_beats_orphan_uart() {
    let fx = ProjectFixture::new(&[
        ("rtl/uart_tx.v", "module uart_tx(input clk, output tx);\nendmodule\n"),
        ("rtl/core.v", "module core(input clk);\n  alu u_alu(.clk(clk));\nendmodule\n"),
        ("rtl/alu.v", "module alu(input clk);\nendmodule\n"),
        ("tb/tb_core.v", "module tb_core;\n  reg clk;\n  core dut(.clk(clk));\n  initial $finish;\nendmodule\n"),
    ]);
    let out = run(&fx.request("scenario"));
    let report = out.report();
    assert_eq!(report.descriptor.top_module, "core");
    assert_eq!(report.descriptor.files, vec!["rtl/core.v", "rtl/alu.v"]);
    assert_eq!(report.descriptor.sim_files, vec!["tb/tb_core.v"]);

    let uart = report.candidates.iter().find(|c| c.module == "uart_tx").unwrap();
    assert!(uart.flagged);
}

#[test]
fn empty_tree_has_no_top() {
    let fx = ProjectFixture::new(&[("docs/README.md", "# nothing\n"), ("sw/main.c", "int main() { return 0; }\n")]);
    let out = run(&fx.request("empty"));
    match &out.result {
        Err(AnalysisError::EmptyProject { .. }) => {}
        Err(other) => panic!("expected EmptyProject, got {other}"),
        Ok(report) => panic!("expected no top, got {}", report.descriptor.top_module),
    }
}

#[test]
fn comments_only_project_is_empty() {
    let fx = ProjectFixture::new(&[("rtl/stub.v", "// module ghost(input a);\n/* endmodule */\n")]);
    let out = run(&fx.request("stub"));
    assert!(matches!(out.result, Err(AnalysisError::EmptyProject { .. })));
}
