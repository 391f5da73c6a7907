//! Utility functions for the bundler.
//!
//! - Extension → MIME classification and data URI encoding
//! - Reference path normalization and root search
//! - HTML attribute extraction
//! - Span splicing and diagnostic emission

use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use base64::Engine;
use regex::Regex;

use crate::{Diagnostic, DiagnosticLevel, ResolvedAsset};

// ---------------------------------------------------------------------------
// MIME Classification
// ---------------------------------------------------------------------------

/// Extensions the texture resolver rewrites. Lowercase, without the dot.
pub const TEXTURE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Fallback for anything not in the table.
pub const GENERIC_MIME: &str = "application/octet-stream";

/// MIME type for a file extension (with or without the leading dot).
pub fn mime_for_extension(ext: &str) -> &'static str {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        _ => GENERIC_MIME,
    }
}

/// MIME type for a path, from its extension only.
pub fn mime_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(GENERIC_MIME, mime_for_extension)
}

/// Whether a literal path names a texture the resolver should inline.
pub fn is_texture_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            TEXTURE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Build `data:<mime>;base64,<payload>` with no line wrapping.
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

// ---------------------------------------------------------------------------
// Reference Paths
// ---------------------------------------------------------------------------

/// Whether a reference points off the local filesystem.
pub fn is_remote_url(reference: &str) -> bool {
    let lower = reference.trim().to_ascii_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("//")
        || lower.starts_with("data:")
        || lower.starts_with("blob:")
}

/// Turn a literal reference into a path relative to a search root.
///
/// The compiler emits root-absolute URLs (`/assets/x.css`); those resolve
/// against the root just like `./assets/x.css` or `assets/x.css`. Query
/// strings and fragments are dropped.
pub fn normalize_reference(reference: &str) -> &str {
    let mut rel = reference.trim();
    if let Some(end) = rel.find(['?', '#']) {
        rel = &rel[..end];
    }
    loop {
        if let Some(rest) = rel.strip_prefix('/') {
            rel = rest;
        } else if let Some(rest) = rel.strip_prefix("./") {
            rel = rest;
        } else {
            return rel;
        }
    }
}

/// Find the first root under which `reference` names an existing file.
pub fn find_in_roots<P: AsRef<Path>>(roots: &[P], reference: &str) -> Option<PathBuf> {
    let rel = normalize_reference(reference);
    if rel.is_empty() {
        return None;
    }
    roots
        .iter()
        .map(|root| root.as_ref().join(rel))
        .find(|candidate| candidate.is_file())
}

/// Read a located file and classify it.
pub fn read_asset(path: &Path) -> io::Result<ResolvedAsset> {
    let bytes = std::fs::read(path)?;
    Ok(ResolvedAsset {
        path: path.to_path_buf(),
        mime: mime_for_path(path),
        bytes,
    })
}

// ---------------------------------------------------------------------------
// HTML Attributes
// ---------------------------------------------------------------------------

/// Matches `name="v"`, `name='v'` or `name=v` inside a tag.
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    // A bare value never ends in `/`; that belongs to a self-closing `/>`.
    Regex::new(
        r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']*[^\s>"'/]))"#,
    )
        .expect("attribute regex is valid")
});

/// Value of attribute `name` (ASCII case-insensitive) in a single tag.
pub fn attr_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    ATTR_RE.captures_iter(tag).find_map(|cap| {
        let key = cap.get(1)?.as_str();
        if !key.eq_ignore_ascii_case(name) {
            return None;
        }
        cap.get(2)
            .or(cap.get(3))
            .or(cap.get(4))
            .map(|m| m.as_str())
    })
}

/// Whether the tag's `rel` attribute contains `token` (space-separated list).
pub fn rel_contains(tag: &str, token: &str) -> bool {
    attr_value(tag, "rel").is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|t| t.eq_ignore_ascii_case(token))
    })
}

// ---------------------------------------------------------------------------
// Splicing
// ---------------------------------------------------------------------------

/// Replace non-overlapping byte ranges of `text`. Ranges must be sorted.
pub fn splice(text: &str, replacements: &[(Range<usize>, String)]) -> String {
    let extra: usize = replacements.iter().map(|(_, r)| r.len()).sum();
    let mut out = String::with_capacity(text.len() + extra);
    let mut cursor = 0;
    for (span, replacement) in replacements {
        out.push_str(&text[cursor..span.start]);
        out.push_str(replacement);
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Log a diagnostic and keep it for the run result.
pub fn emit(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    let context = diagnostic.context.as_deref().unwrap_or("");
    match diagnostic.level {
        DiagnosticLevel::Error => tracing::error!(context, "{}", diagnostic.message),
        DiagnosticLevel::Warning => tracing::warn!(context, "{}", diagnostic.message),
        DiagnosticLevel::Info => tracing::info!("{}", diagnostic.message),
    }
    diagnostics.push(diagnostic);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
