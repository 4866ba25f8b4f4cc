//! Text of generated build descriptors and entry points.

use hdlmap_common::Dialect;
use hdlmap_config::ToolchainConfig;

/// Renders a minimal sbt build declaring the dialect's toolchain.
pub fn render_descriptor(toolchain: &ToolchainConfig, project_name: &str) -> String {
    let mut deps: Vec<String> = toolchain
        .libraries
        .iter()
        .map(|lib| format!("    \"{}\" %% \"{}\" % \"{}\"", toolchain.organization, lib, toolchain.version))
        .collect();

    let mut plugin_line = None;
    if let Some(plugin) = &toolchain.plugin {
        match toolchain.dialect {
            Dialect::Chisel => {
                plugin_line = Some(format!(
                    "addCompilerPlugin(\"{}\" % \"{}\" % \"{}\" cross CrossVersion.full)",
                    toolchain.organization, plugin, toolchain.version
                ));
            }
            _ => deps.push(format!(
                "    compilerPlugin(\"{}\" %% \"{}\" % \"{}\")",
                toolchain.organization, plugin, toolchain.version
            )),
        }
    }

    let mut out = String::new();
    out.push_str(&format!("ThisBuild / scalaVersion := \"{}\"\n", toolchain.scala_version));
    out.push_str("ThisBuild / version := \"0.1.0\"\n\n");
    out.push_str("lazy val root = (project in file(\".\"))\n");
    out.push_str("  .settings(\n");
    out.push_str(&format!("    name := \"{}\",\n", sbt_name(project_name)));
    out.push_str("    libraryDependencies ++= Seq(\n");
    out.push_str(&deps.iter().map(|d| format!("  {d}")).collect::<Vec<_>>().join(",\n"));
    out.push_str("\n    ),\n");
    if let Some(line) = plugin_line {
        out.push_str(&format!("    {line},\n"));
    }
    out.push_str("    scalacOptions ++= Seq(\"-language:reflectiveCalls\", \"-deprecation\", \"-feature\")\n");
    out.push_str("  )\n");
    out
}

fn sbt_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    if cleaned.is_empty() {
        "design".to_string()
    } else {
        cleaned
    }
}

/// Renders an application object that elaborates `top`.
///
/// `package` and `import` are optional; `import` names a package whose
/// members are imported wholesale.
pub fn render_entry(
    dialect: Dialect,
    object_name: &str,
    top: &str,
    package: Option<&str>,
    import: Option<&str>,
) -> String {
    let mut out = String::new();
    if let Some(pkg) = package {
        out.push_str(&format!("package {pkg}\n\n"));
    }
    match dialect {
        Dialect::SpinalHdl => out.push_str("import spinal.core._\n"),
        _ => out.push_str("import chisel3._\n"),
    }
    if let Some(import) = import {
        out.push_str(&format!("import {import}._\n"));
    }
    out.push('\n');
    out.push_str(&format!("object {object_name} extends App {{\n"));
    match dialect {
        Dialect::SpinalHdl => out.push_str(&format!("  SpinalVerilog(new {top}())\n")),
        _ => out.push_str(&format!(
            "  emitVerilog(new {top}(), Array(\"--target-dir\", \"generated\"))\n"
        )),
    }
    out.push_str("}\n");
    out
}
