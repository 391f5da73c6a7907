//! Final cleanup and output.
//!
//! - Strips head hints that point at files which no longer need loading
//! - Appends the hooks script (texture trace, optional exit listeners)
//! - Writes the merged document over the previous output in one step

use std::io::{self, Write};
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::utils;
use crate::{BundleOptions, Document};

/// Marker attribute on the injected hooks script.
pub const HOOKS_MARKER: &str = "data-screensaver-hooks";

/// `rel` tokens whose `<link>` tags are dropped from the output.
pub const STRIPPED_RELS: &[&str] = &["modulepreload", "preload", "icon"];

/// Wraps the texture loader so every URL it receives is logged.
pub const TEXTURE_TRACE_JS: &str = r#"
if (typeof THREE !== 'undefined' && THREE.TextureLoader) {
  const originalLoad = THREE.TextureLoader.prototype.load;
  THREE.TextureLoader.prototype.load = function (url, onLoad, onProgress, onError) {
    console.log('Loading texture:', url);
    return originalLoad.call(this, url, onLoad, onProgress, onError);
  };
}
"#;

/// Closes the window on Escape, a Ctrl/Alt chord, or any pointer input.
pub const EXIT_ON_INPUT_JS: &str = r#"
window.addEventListener('keydown', (e) => {
  if (e.key === 'Escape' || e.ctrlKey || e.altKey) {
    window.close();
  }
});
window.addEventListener('click', () => window.close());
window.addEventListener('mousemove', () => window.close());
window.addEventListener('touchstart', () => window.close());
"#;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<link\b[^>]*>").expect("link regex is valid"));

/// `<script>` and `<style>` elements. Their bodies are raw text, so markup
/// inside them (inlined code included) is never treated as tags.
static RAW_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("raw text regex is valid")
});

static HEAD_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</head\s*>").expect("head regex is valid"));

static BODY_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</body\s*>").expect("body regex is valid"));

fn raw_text_ranges(html: &str) -> Vec<Range<usize>> {
    RAW_TEXT_RE.find_iter(html).map(|m| m.range()).collect()
}

fn in_raw_text(raw: &[Range<usize>], pos: usize) -> bool {
    raw.iter().any(|r| r.contains(&pos))
}

// ---------------------------------------------------------------------------
// Head Hints
// ---------------------------------------------------------------------------

/// Remove modulepreload, preload and icon links from the document head.
///
/// Only real tags count: anything inside `<script>`/`<style>` bodies and
/// anything after the head's closing tag is kept.
pub fn strip_head_hints(doc: Document) -> Document {
    let html = doc.into_string();
    let raw = raw_text_ranges(&html);
    let head_end = HEAD_CLOSE_RE
        .find_iter(&html)
        .map(|m| m.start())
        .find(|&pos| !in_raw_text(&raw, pos))
        .unwrap_or(html.len());

    let removals: Vec<_> = LINK_RE
        .find_iter(&html[..head_end])
        .filter(|m| !in_raw_text(&raw, m.start()))
        .filter(|m| {
            STRIPPED_RELS
                .iter()
                .any(|rel| utils::rel_contains(m.as_str(), rel))
        })
        .map(|m| (m.range(), String::new()))
        .collect();

    if removals.is_empty() {
        return Document::new(html);
    }
    tracing::debug!(count = removals.len(), "stripped head hints");
    Document::new(utils::splice(&html, &removals))
}

// ---------------------------------------------------------------------------
// Hooks Script
// ---------------------------------------------------------------------------

/// The script block to append, or `None` when every hook is disabled.
pub fn hooks_script(opts: &BundleOptions) -> Option<String> {
    if !opts.trace_textures && !opts.exit_on_input {
        return None;
    }
    let mut body = String::new();
    if opts.exit_on_input {
        body.push_str(EXIT_ON_INPUT_JS);
    }
    if opts.trace_textures {
        body.push_str(TEXTURE_TRACE_JS);
    }
    Some(format!("\n<script {HOOKS_MARKER}>{body}</script>\n"))
}

/// Insert `script` before the last `</body>` tag outside script and style
/// bodies, or append it when there is none. A document that already carries
/// the hooks script is left alone.
pub fn inject_hooks(doc: Document, script: &str) -> Document {
    let html = doc.into_string();
    let raw = raw_text_ranges(&html);
    let hooks_open = format!("<script {HOOKS_MARKER}>");
    if raw.iter().any(|r| html[r.clone()].starts_with(&hooks_open)) {
        return Document::new(html);
    }

    let body_close = BODY_CLOSE_RE
        .find_iter(&html)
        .map(|m| m.start())
        .filter(|&pos| !in_raw_text(&raw, pos))
        .last();
    match body_close {
        Some(pos) => Document::new(utils::splice(&html, &[(pos..pos, script.to_string())])),
        None => Document::new(format!("{html}{script}")),
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Replace `path` with `contents` via a temporary sibling file, so readers
/// never observe a half-written document.
pub fn write_output(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
