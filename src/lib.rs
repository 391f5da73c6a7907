//! # Screensaver Bundler
//!
//! Folds a compiled multi-file web build (`dist/index.html` plus its CSS,
//! module script and textures) into one self-contained HTML document.
//!
//! The bundler never mutates the build it reads. Its only write is the final
//! `screensaver.html`, which is replaced whole on every run.
//!
//! Per-reference failures are recorded as diagnostics and the reference is
//! left untouched in the output. The only fatal condition is a missing seed
//! document.

pub mod bundle;
pub mod finalize;
pub mod inline;
pub mod layout;
pub mod utils;

use std::ops::Range;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use layout::BuildLayout;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The HTML under construction. Each stage takes it by value and hands back
/// the updated text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    html: String,
}

impl Document {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn into_string(self) -> String {
        self.html
    }

    pub fn len(&self) -> usize {
        self.html.len()
    }

    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
    }
}

impl From<String> for Document {
    fn from(html: String) -> Self {
        Self::new(html)
    }
}

// ---------------------------------------------------------------------------
// Asset References
// ---------------------------------------------------------------------------

/// What shape of reference was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    /// `<link rel="stylesheet" href="...">`
    StylesheetLink,
    /// `<script type="module" src="..."></script>`
    ModuleScript,
    /// `loader.load('tex.png')`
    TextureCall,
    /// `import tex from './tex.png'`
    TextureImport,
}

impl AssetKind {
    /// Human label used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            AssetKind::StylesheetLink => "stylesheet",
            AssetKind::ModuleScript => "module script",
            AssetKind::TextureCall => "texture",
            AssetKind::TextureImport => "texture import",
        }
    }
}

/// A located reference inside a document or script text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    pub kind: AssetKind,
    /// The literal path exactly as written.
    pub path: String,
    /// Byte range replaced on successful resolution.
    pub span: Range<usize>,
    /// Bound identifier, only set for [`AssetKind::TextureImport`].
    pub binding: Option<String>,
}

/// A reference target that was found and read.
#[derive(Debug, Clone)]
pub struct ResolvedAsset {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

impl ResolvedAsset {
    /// Contents as UTF-8 text (invalid sequences are replaced).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// Contents as a `data:` URI.
    pub fn data_uri(&self) -> String {
        utils::data_uri(self.mime, &self.bytes)
    }
}

/// Record of one successful substitution, kept for the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlinedAsset {
    pub kind: AssetKind,
    pub reference: String,
    pub source: PathBuf,
    pub bytes: usize,
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// A diagnostic emitted during bundling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
}

impl Diagnostic {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Info,
            message: message.into(),
            context: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            message: message.into(),
            context: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

// ---------------------------------------------------------------------------
// BundlePlan
// ---------------------------------------------------------------------------

/// Describes WHAT to bundle.
#[derive(Debug, Clone)]
pub struct BundlePlan {
    /// Project root holding `dist/` and `public/`.
    pub project_root: PathBuf,
}

impl BundlePlan {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    pub fn layout(&self) -> BuildLayout {
        BuildLayout::new(&self.project_root)
    }
}

// ---------------------------------------------------------------------------
// BundleOptions
// ---------------------------------------------------------------------------

/// Describes HOW to bundle.
#[derive(Debug, Clone)]
pub struct BundleOptions {
    /// Append the texture-trace script before `</body>` (default: true).
    pub trace_textures: bool,
    /// Add listeners that close the window on any user input.
    pub exit_on_input: bool,
    /// Whether to write `screensaver.html` to disk (default: true).
    pub write_to_disk: bool,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            trace_textures: true,
            exit_on_input: false,
            write_to_disk: true,
        }
    }
}

// ---------------------------------------------------------------------------
// BundleResult
// ---------------------------------------------------------------------------

/// The output of a completed run. Unresolved references do not make a run
/// fail; they show up in `diagnostics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleResult {
    /// Final merged document.
    #[serde(skip)]
    pub html: String,
    /// Where the document was (or would have been) written.
    pub output_path: PathBuf,
    /// Whether the document was actually written.
    pub written: bool,
    pub inlined: Vec<InlinedAsset>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BundleResult {
    /// Number of references that could not be resolved.
    pub fn unresolved_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.level != DiagnosticLevel::Info)
            .count()
    }
}

// ---------------------------------------------------------------------------
// BundleError
// ---------------------------------------------------------------------------

/// Errors that abort the bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("Seed document not found: {}. Run the web build first.", .path.display())]
    SeedNotFound { path: PathBuf },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Report serialization failed: {0}")]
    ReportError(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Bundle a compiled build into a single HTML document.
///
/// Stages run strictly in order:
/// 1. Load `dist/index.html` (fatal if missing)
/// 2. Inline stylesheets
/// 3. Inline the module script, rewriting texture references to data URIs
/// 4. Strip preload/icon hints and append the trace script
/// 5. Write `dist/screensaver.html` (when `write_to_disk` is set)
pub fn bundle_build(plan: BundlePlan, opts: BundleOptions) -> Result<BundleResult, BundleError> {
    bundle::execute_bundle(plan, opts)
}
