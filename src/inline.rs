//! Inlining passes.
//!
//! Each pass scans text for one family of references, resolves them through
//! a shared [`InlineSession`] and splices replacements in document order:
//!
//! 1. `css` swaps stylesheet `<link>` tags for `<style>` blocks
//! 2. `script` swaps the external module `<script>` for an inline one
//! 3. `texture` rewrites literal image paths inside that script to data URIs
//!
//! Matching is textual. A reference that looks right inside a JS comment or
//! string literal is rewritten as well; only literal paths are ever resolved.

pub mod css;
pub mod script;
pub mod texture;

use std::fmt;
use std::io;
use std::path::Path;

use crate::layout::BuildLayout;
use crate::utils;
use crate::{AssetReference, Diagnostic, InlinedAsset, ResolvedAsset};

pub use css::inline_stylesheets;
pub use script::inline_module_scripts;
pub use texture::{inline_texture_calls, inline_texture_imports};

/// Reads a located file into a [`ResolvedAsset`].
pub type AssetReader = fn(&Path) -> io::Result<ResolvedAsset>;

/// State shared by the passes of one run.
pub struct InlineSession<'a> {
    layout: &'a BuildLayout,
    reader: AssetReader,
    diagnostics: Vec<Diagnostic>,
    inlined: Vec<InlinedAsset>,
}

impl fmt::Debug for InlineSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineSession")
            .field("layout", &self.layout)
            .field("diagnostics", &self.diagnostics)
            .field("inlined", &self.inlined)
            .finish()
    }
}

impl<'a> InlineSession<'a> {
    pub fn new(layout: &'a BuildLayout) -> Self {
        Self {
            layout,
            reader: utils::read_asset,
            diagnostics: Vec::new(),
            inlined: Vec::new(),
        }
    }

    /// Replace the filesystem read used once a reference is located.
    pub fn with_reader(mut self, reader: AssetReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn layout(&self) -> &BuildLayout {
        self.layout
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        utils::emit(&mut self.diagnostics, diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn inlined(&self) -> &[InlinedAsset] {
        &self.inlined
    }

    pub fn into_parts(self) -> (Vec<InlinedAsset>, Vec<Diagnostic>) {
        (self.inlined, self.diagnostics)
    }

    /// Locate and read a reference's target under `roots`.
    ///
    /// Every failure is reported here; callers only decide what to splice.
    pub fn resolve<P: AsRef<Path>>(
        &mut self,
        reference: &AssetReference,
        roots: &[P],
    ) -> Option<ResolvedAsset> {
        let label = reference.kind.label();

        if utils::is_remote_url(&reference.path) {
            self.emit(Diagnostic::info(format!(
                "Skipping remote {label}: {}",
                reference.path
            )));
            return None;
        }

        self.emit(Diagnostic::info(format!(
            "Found {label} reference: {}",
            reference.path
        )));

        let Some(located) = utils::find_in_roots(roots, &reference.path) else {
            let searched = roots
                .iter()
                .map(|root| root.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            self.emit(
                Diagnostic::warning(format!("Missing {label}: {}", reference.path))
                    .with_context(format!("searched: {searched}")),
            );
            return None;
        };

        match (self.reader)(&located) {
            Ok(asset) => Some(asset),
            Err(e) => {
                self.emit(
                    Diagnostic::error(format!(
                        "Failed to read {label} {}: {e}",
                        reference.path
                    ))
                    .with_context(located.display().to_string()),
                );
                None
            }
        }
    }

    /// Note a successful substitution.
    pub fn record(&mut self, reference: &AssetReference, asset: &ResolvedAsset) {
        self.emit(Diagnostic::info(format!(
            "Inlined {}: {} ({} bytes)",
            reference.kind.label(),
            reference.path,
            asset.bytes.len()
        )));
        self.inlined.push(InlinedAsset {
            kind: reference.kind,
            reference: reference.path.clone(),
            source: asset.path.clone(),
            bytes: asset.bytes.len(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AssetKind, DiagnosticLevel};
    use std::fs;

    fn unreadable(_: &Path) -> io::Result<ResolvedAsset> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"))
    }

    #[test]
    fn located_but_unreadable_is_an_error_and_left_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let layout = BuildLayout::new(dir.path());
        fs::create_dir_all(layout.build_dir()).unwrap();
        fs::write(layout.build_dir().join("tex.png"), b"png").unwrap();

        let mut session = InlineSession::new(&layout).with_reader(unreadable);
        let js = "loader.load('tex.png');";
        let out = inline_texture_calls(js, &mut session);

        assert_eq!(out, js);
        assert!(session.inlined().is_empty());
        let error = session
            .diagnostics()
            .iter()
            .find(|d| d.level == DiagnosticLevel::Error)
            .expect("read failure is reported");
        assert!(error.message.contains("tex.png"));
        assert!(error.message.contains("permission denied"));
        assert_eq!(
            error.context.as_deref(),
            Some(layout.build_dir().join("tex.png").display().to_string().as_str())
        );
    }

    #[test]
    fn resolve_reads_through_default_reader() {
        let dir = tempfile::tempdir().unwrap();
        let layout = BuildLayout::new(dir.path());
        fs::create_dir_all(layout.build_dir()).unwrap();
        fs::write(layout.build_dir().join("a.css"), "p{}").unwrap();

        let mut session = InlineSession::new(&layout);
        let reference = AssetReference {
            kind: AssetKind::StylesheetLink,
            path: "a.css".into(),
            span: 0..0,
            binding: None,
        };
        let asset = session.resolve(&reference, &[layout.build_dir()]).unwrap();
        assert_eq!(asset.text(), "p{}");
    }
}
