//! Entry-point placement.

use std::path::PathBuf;

use hdlmap_diagnostics::{codes, Diagnostic, DiagnosticSink};
use hdlmap_resolve::ResolvedTop;
use hdlmap_scan::lexer::{blank, skip_balanced, CommentSyntax};
use hdlmap_source::{SourceEntry, Span};
use regex::Regex;
use serde::Serialize;

use crate::error::DescriptorError;
use crate::locate::{join_rel, BuildDescriptor, DescriptorLocator};
use crate::namespace::{detect_namespace, Namespace};
use crate::template::render_entry;
use crate::write::{write_new, WriteOutcome};

/// The application object that elaborates the top module.
#[derive(Clone, Debug, Serialize)]
pub struct EntryPoint {
    /// Absolute path.
    #[serde(skip)]
    pub path: PathBuf,
    /// Path relative to the project root.
    pub relative: String,
    /// Name of the application object.
    pub object_name: String,
    /// Package the object lives in, if any.
    pub namespace: Option<String>,
    /// An existing file was used instead of writing one.
    pub reused: bool,
    /// The top's namespace was ambiguous and the default one was used.
    pub namespace_defaulted: bool,
}

/// Finds an application object in `text` whose own body instantiates `top`,
/// returning the object's name.
///
/// An object counts as an application when it extends `App` or defines
/// `main`. A `new <Top>` elsewhere in the file does not count.
fn existing_app(text: &str, top: &str) -> Option<String> {
    let blanked = blank(text, CommentSyntax::Scala);
    let object = Regex::new(r"\bobject\s+([A-Za-z_][A-Za-z0-9_]*)").ok()?;
    let extends_app = Regex::new(r"\bextends\s+App\b").ok()?;
    let main = Regex::new(r"\bdef\s+main\s*\(").ok()?;
    let new_top = Regex::new(&format!(r"\bnew\s+{}\b", regex::escape(top))).ok()?;
    let src = blanked.as_bytes();

    for c in object.captures_iter(&blanked) {
        let Some(name) = c.get(1) else {
            continue;
        };
        let Some(open) = blanked[name.end()..].find('{').map(|p| name.end() + p) else {
            continue;
        };
        let header = &blanked[name.end()..open];
        // `object A; object B {` must not attach B's body to A.
        if header.contains(';') || object.is_match(header) {
            continue;
        }
        let Some(close) = skip_balanced(src, open, b'{', b'}') else {
            continue;
        };
        let body = &blanked[open..close];
        if (extends_app.is_match(header) || main.is_match(body)) && new_top.is_match(body) {
            return Some(name.as_str().to_string());
        }
    }
    None
}

impl DescriptorLocator<'_> {
    /// Returns the nearest configured source root above `file`, if any.
    fn source_root_of(&self, file: &str) -> Option<String> {
        let comps: Vec<&str> = file.split('/').collect();
        let dirs = &comps[..comps.len().saturating_sub(1)];
        let mut best: Option<(usize, usize)> = None;
        for marker in &self.toolchain.source_roots {
            let m: Vec<&str> = marker.split('/').filter(|s| !s.is_empty()).collect();
            if m.is_empty() || m.len() > dirs.len() {
                continue;
            }
            for start in 0..=dirs.len() - m.len() {
                if dirs[start..start + m.len()] == m[..] {
                    let end = start + m.len();
                    let deeper = match best {
                        None => true,
                        Some((e, len)) => end > e || (end == e && m.len() > len),
                    };
                    if deeper {
                        best = Some((end, m.len()));
                    }
                }
            }
        }
        best.map(|(end, _)| dirs[..end].join("/"))
    }

    /// Reuses an application object that already instantiates the top, or
    /// writes one next to the top module's namespace.
    ///
    /// `scala_files` are searched in order for an object extending `App` (or
    /// defining `main`) that contains `new <Top>`. A freshly generated object
    /// is named `<Top><entry_suffix>`.
    pub fn place_entry_point(
        &self,
        top: &ResolvedTop,
        descriptor: &BuildDescriptor,
        scala_files: &[SourceEntry],
        sink: &DiagnosticSink,
    ) -> Result<EntryPoint, DescriptorError> {
        for entry in scala_files {
            let Ok(bytes) = std::fs::read(&entry.path) else {
                continue;
            };
            let text = String::from_utf8_lossy(&bytes);
            if let Some(object_name) = existing_app(&text, &top.module) {
                tracing::info!(file = %entry.relative, object = %object_name, "reusing existing entry point");
                return Ok(EntryPoint {
                    path: entry.path.clone(),
                    relative: entry.relative.clone(),
                    object_name,
                    namespace: detect_namespace(&text).declared().map(str::to_string),
                    reused: true,
                    namespace_defaulted: false,
                });
            }
        }

        let top_path = self.root.join(&top.declaring_file);
        let top_text = std::fs::read(&top_path)
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .map_err(|e| DescriptorError::Io {
                path: top_path.clone(),
                source: e,
            })?;

        let (package, import, defaulted) = match detect_namespace(&top_text) {
            Namespace::Root => (None, None, false),
            Namespace::Named(ns) => (Some(ns), None, false),
            Namespace::Chained(chain) => {
                sink.emit(
                    Diagnostic::warning(
                        codes::NAMESPACE_DEFAULTED,
                        format!(
                            "'{}' is declared under chained packages; the entry point goes in '{}'",
                            top.module, self.toolchain.default_namespace
                        ),
                        Span::DUMMY,
                    )
                    .with_path(top.declaring_file.clone())
                    .with_note(format!("the entry point imports {chain}._")),
                );
                (Some(self.toolchain.default_namespace.clone()), Some(chain), true)
            }
        };

        let source_root = self
            .source_root_of(&top.declaring_file)
            .unwrap_or_else(|| join_rel(&[descriptor.relative_dir(), "src/main/scala"]));
        let object_name = format!("{}{}", top.module, self.toolchain.entry_suffix);
        let ns_dir = package.as_deref().unwrap_or("").replace('.', "/");
        let file_name = format!("{object_name}.scala");
        let relative = join_rel(&[&source_root, &ns_dir, &file_name]);
        let path = self.root.join(&relative);

        let mut reused = false;
        if self.write {
            let content = render_entry(
                self.toolchain.dialect,
                &object_name,
                &top.module,
                package.as_deref(),
                import.as_deref(),
            );
            reused = write_new(&path, &content)? == WriteOutcome::Reused;
        }
        tracing::info!(entry = %relative, write = self.write, "placed entry point");

        Ok(EntryPoint {
            path,
            relative,
            object_name,
            namespace: package,
            reused,
            namespace_defaulted: defaulted,
        })
    }
}
