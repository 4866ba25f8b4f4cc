//! Hardware description dialect tags.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One supported hardware-description source format.
///
/// The dialect is the scanner boundary: every dialect has exactly one
/// front-end scanner and one set of naming conventions. Ordering follows
/// declaration order and is used as the fixed tie-break order when a project
/// contains several dialects in equal measure.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Chisel (Scala embedded DSL, `chisel3`).
    Chisel,
    /// SpinalHDL (Scala embedded DSL, `spinal.core`).
    #[serde(rename = "spinalhdl")]
    SpinalHdl,
    /// Bluespec SystemVerilog (`.bsv`).
    Bluespec,
    /// SystemVerilog-2017 (`.sv`).
    #[serde(rename = "systemverilog")]
    SystemVerilog,
    /// Verilog-2005 (`.v`).
    Verilog,
    /// VHDL-2008 (`.vhd`, `.vhdl`).
    Vhdl,
}

/// Coarse grouping of dialects by how downstream tools consume them.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DialectFamily {
    /// Text HDLs fed to simulators and synthesis tools directly.
    Text,
    /// Host-language DSLs that need a build descriptor and an entry point
    /// before any HDL is produced.
    Namespace,
}

impl Dialect {
    /// All dialects in tie-break order.
    pub const ALL: [Dialect; 6] = [
        Dialect::Chisel,
        Dialect::SpinalHdl,
        Dialect::Bluespec,
        Dialect::SystemVerilog,
        Dialect::Verilog,
        Dialect::Vhdl,
    ];

    /// Returns the lowercase tag used in configuration files and output.
    pub fn tag(self) -> &'static str {
        match self {
            Dialect::Chisel => "chisel",
            Dialect::SpinalHdl => "spinalhdl",
            Dialect::Bluespec => "bluespec",
            Dialect::SystemVerilog => "systemverilog",
            Dialect::Verilog => "verilog",
            Dialect::Vhdl => "vhdl",
        }
    }

    /// Returns the family this dialect belongs to.
    pub fn family(self) -> DialectFamily {
        match self {
            Dialect::Chisel | Dialect::SpinalHdl => DialectFamily::Namespace,
            Dialect::Bluespec | Dialect::SystemVerilog | Dialect::Verilog | Dialect::Vhdl => {
                DialectFamily::Text
            }
        }
    }

    /// Returns `true` for dialects that need a build descriptor.
    pub fn is_namespace_based(self) -> bool {
        self.family() == DialectFamily::Namespace
    }

    /// Returns `true` if identifiers in this dialect are case-insensitive.
    pub fn case_insensitive(self) -> bool {
        matches!(self, Dialect::Vhdl)
    }

    /// Guesses the dialect from a file extension alone.
    ///
    /// Scala sources return `None` because Chisel and SpinalHDL share the
    /// extension; callers sniff the imports instead.
    pub fn from_extension(path: &Path) -> Option<Dialect> {
        match path.extension()?.to_str()? {
            "v" => Some(Dialect::Verilog),
            "sv" => Some(Dialect::SystemVerilog),
            "vhd" | "vhdl" => Some(Dialect::Vhdl),
            "bsv" => Some(Dialect::Bluespec),
            _ => None,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error returned when a dialect tag is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dialect '{0}' (expected one of chisel, spinalhdl, bluespec, systemverilog, verilog, vhdl)")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "chisel" => Ok(Dialect::Chisel),
            "spinalhdl" | "spinal" => Ok(Dialect::SpinalHdl),
            "bluespec" | "bsv" => Ok(Dialect::Bluespec),
            "systemverilog" | "sv" => Ok(Dialect::SystemVerilog),
            "verilog" | "v" => Ok(Dialect::Verilog),
            "vhdl" => Ok(Dialect::Vhdl),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}
