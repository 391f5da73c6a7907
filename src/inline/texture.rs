//! Texture reference rewriting inside module script text.
//!
//! Two shapes are recognized, both with a literal path ending in a texture
//! extension:
//!
//! - call form: `loader.load('tex.png')`. Only the string literal is
//!   replaced, so the receiver and call syntax survive untouched.
//! - import form: `import tex from './tex.png'`. The statement becomes
//!   `const tex = 'data:...'`, since a data URI is not a module specifier.
//!
//! Paths built at runtime are never seen here.

use std::sync::LazyLock;

use regex::Regex;

use super::InlineSession;
use crate::utils;
use crate::{AssetKind, AssetReference};

static CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\.load\(\s*('[^'\r\n]*'|"[^"\r\n]*")\s*\)"#).expect("call regex is valid")
});

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimport\s+([A-Za-z_$][A-Za-z0-9_$]*)\s+from\s*('[^'\r\n]*'|"[^"\r\n]*")"#)
        .expect("import regex is valid")
});

/// Strip the surrounding quote pair from a matched string literal.
fn unquote(literal: &str) -> &str {
    &literal[1..literal.len() - 1]
}

/// `.load('<texture>')` calls. Spans cover the string literal, quotes included.
pub fn find_texture_calls(js: &str) -> Vec<AssetReference> {
    CALL_RE
        .captures_iter(js)
        .filter_map(|cap| {
            let literal = cap.get(1)?;
            let path = unquote(literal.as_str());
            if !utils::is_texture_path(path) {
                return None;
            }
            Some(AssetReference {
                kind: AssetKind::TextureCall,
                path: path.to_string(),
                span: literal.range(),
                binding: None,
            })
        })
        .collect()
}

/// `import <ident> from '<texture>'` statements. Spans cover the statement
/// up to the closing quote.
pub fn find_texture_imports(js: &str) -> Vec<AssetReference> {
    IMPORT_RE
        .captures_iter(js)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let binding = cap.get(1)?.as_str();
            let path = unquote(cap.get(2)?.as_str());
            if !utils::is_texture_path(path) {
                return None;
            }
            Some(AssetReference {
                kind: AssetKind::TextureImport,
                path: path.to_string(),
                span: whole.range(),
                binding: Some(binding.to_string()),
            })
        })
        .collect()
}

/// Rewrite call-form texture references to data URIs.
pub fn inline_texture_calls(js: &str, session: &mut InlineSession<'_>) -> String {
    let roots = session.layout().texture_roots();
    let mut replacements = Vec::new();

    for reference in find_texture_calls(js) {
        let Some(asset) = session.resolve(&reference, &roots) else {
            continue;
        };
        session.record(&reference, &asset);
        let quote = &js[reference.span.start..reference.span.start + 1];
        replacements.push((
            reference.span,
            format!("{quote}{}{quote}", asset.data_uri()),
        ));
    }

    utils::splice(js, &replacements)
}

/// Rewrite import-form texture references into constant bindings.
pub fn inline_texture_imports(js: &str, session: &mut InlineSession<'_>) -> String {
    let roots = session.layout().texture_roots();
    let mut replacements = Vec::new();

    for reference in find_texture_imports(js) {
        let Some(binding) = reference.binding.as_deref() else {
            continue;
        };
        let Some(asset) = session.resolve(&reference, &roots) else {
            continue;
        };
        session.record(&reference, &asset);
        let quote = if js[reference.span.clone()].ends_with('"') {
            '"'
        } else {
            '\''
        };
        replacements.push((
            reference.span.clone(),
            format!("const {binding} = {quote}{}{quote}", asset.data_uri()),
        ));
    }

    utils::splice(js, &replacements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BuildLayout;
    use crate::DiagnosticLevel;
    use pretty_assertions::assert_eq;
    use std::fs;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn project() -> (tempfile::TempDir, BuildLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = BuildLayout::new(dir.path());
        fs::create_dir_all(layout.build_dir()).unwrap();
        fs::create_dir_all(layout.static_dir()).unwrap();
        (dir, layout)
    }

    #[test]
    fn finds_calls_with_either_quote() {
        let js = r#"a.load('x.png'); b.load( "y/z.JPG" ); c.load(url); d.load('m.glb')"#;
        let refs = find_texture_calls(js);
        let paths: Vec<_> = refs.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["x.png", "y/z.JPG"]);
        assert_eq!(&js[refs[0].span.clone()], "'x.png'");
    }

    #[test]
    fn finds_imports_with_binding() {
        let js = "import earthTex from './earth.jpg';\nimport * as THREE from 'three';";
        let refs = find_texture_imports(js);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].binding.as_deref(), Some("earthTex"));
        assert_eq!(refs[0].path, "./earth.jpg");
        assert_eq!(&js[refs[0].span.clone()], "import earthTex from './earth.jpg'");
    }

    #[test]
    fn rewrites_call_literal_only() {
        let (_dir, layout) = project();
        fs::write(layout.build_dir().join("tex.png"), PNG).unwrap();

        let mut session = InlineSession::new(&layout);
        let out = inline_texture_calls("const t = loader.load('tex.png');", &mut session);

        let expected = format!(
            "const t = loader.load('{}');",
            utils::data_uri("image/png", PNG)
        );
        assert_eq!(out, expected);
        assert!(!out.contains("tex.png"));
    }

    #[test]
    fn keeps_double_quotes_on_calls() {
        let (_dir, layout) = project();
        fs::write(layout.static_dir().join("a.gif"), b"GIF89a").unwrap();

        let mut session = InlineSession::new(&layout);
        let out = inline_texture_calls(r#"new T().load("/a.gif")"#, &mut session);
        assert!(out.starts_with(r#"new T().load("data:image/gif;base64,"#));
        assert!(out.ends_with(r#"")"#));
    }

    #[test]
    fn missing_call_target_is_untouched() {
        let (_dir, layout) = project();
        let mut session = InlineSession::new(&layout);
        let js = "loader.load('nope.webp')";
        let out = inline_texture_calls(js, &mut session);

        assert_eq!(out, js);
        let warning = session
            .diagnostics()
            .iter()
            .find(|d| d.level == DiagnosticLevel::Warning)
            .expect("missing texture is reported");
        assert!(warning.message.contains("nope.webp"));
    }

    #[test]
    fn rewrites_import_to_const() {
        let (_dir, layout) = project();
        fs::write(layout.root().join("moon.jpeg"), b"jpeg").unwrap();

        let mut session = InlineSession::new(&layout);
        let out = inline_texture_imports("import moon from \"moon.jpeg\";\nuse(moon);", &mut session);

        assert_eq!(
            out,
            format!(
                "const moon = \"{}\";\nuse(moon);",
                utils::data_uri("image/jpeg", b"jpeg")
            )
        );
    }

    #[test]
    fn missing_import_target_is_untouched() {
        let (_dir, layout) = project();
        let mut session = InlineSession::new(&layout);
        let js = "import sky from './sky.png';";
        let out = inline_texture_imports(js, &mut session);
        assert_eq!(out, js);
        assert!(session
            .diagnostics()
            .iter()
            .any(|d| d.level == DiagnosticLevel::Warning && d.message.contains("./sky.png")));
    }

    #[test]
    fn build_dir_wins_over_static_dir() {
        let (_dir, layout) = project();
        fs::write(layout.build_dir().join("tex.png"), b"built").unwrap();
        fs::write(layout.static_dir().join("tex.png"), b"static").unwrap();

        let mut session = InlineSession::new(&layout);
        let out = inline_texture_calls("l.load('tex.png')", &mut session);
        assert!(out.contains(&utils::data_uri("image/png", b"built")));
        assert_eq!(session.inlined()[0].source, layout.build_dir().join("tex.png"));
    }

    #[test]
    fn remote_texture_is_skipped_quietly() {
        let (_dir, layout) = project();
        let mut session = InlineSession::new(&layout);
        let js = "l.load('https://cdn.example.com/t.png')";
        assert_eq!(inline_texture_calls(js, &mut session), js);
        assert!(session
            .diagnostics()
            .iter()
            .all(|d| d.level == DiagnosticLevel::Info));
    }
}
