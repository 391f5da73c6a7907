//! Stylesheet inlining.
//!
//! `<link rel="stylesheet" href="...">` tags resolve against the compiled
//! output directory and are replaced whole by `<style>` blocks holding the
//! file's literal text.

use std::sync::LazyLock;

use regex::Regex;

use super::InlineSession;
use crate::utils;
use crate::{AssetKind, AssetReference, Document};

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<link\b[^>]*>").expect("link regex is valid"));

/// Every stylesheet link in the document, in document order.
pub fn find_stylesheet_links(html: &str) -> Vec<AssetReference> {
    LINK_RE
        .find_iter(html)
        .filter_map(|m| {
            let tag = m.as_str();
            if !utils::rel_contains(tag, "stylesheet") {
                return None;
            }
            let href = utils::attr_value(tag, "href")?;
            Some(AssetReference {
                kind: AssetKind::StylesheetLink,
                path: href.to_string(),
                span: m.range(),
                binding: None,
            })
        })
        .collect()
}

/// Replace each resolvable stylesheet link with an embedded style block.
/// Unresolvable links stay as they are.
pub fn inline_stylesheets(doc: Document, session: &mut InlineSession<'_>) -> Document {
    let html = doc.into_string();
    let roots = [session.layout().build_dir()];

    let mut replacements = Vec::new();
    for reference in find_stylesheet_links(&html) {
        let Some(asset) = session.resolve(&reference, &roots) else {
            continue;
        };
        session.record(&reference, &asset);
        replacements.push((reference.span, format!("<style>{}</style>", asset.text())));
    }

    if replacements.is_empty() {
        return Document::new(html);
    }
    Document::new(utils::splice(&html, &replacements))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BuildLayout;
    use crate::DiagnosticLevel;
    use std::fs;

    fn project() -> (tempfile::TempDir, BuildLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = BuildLayout::new(dir.path());
        fs::create_dir_all(layout.build_dir().join("assets")).unwrap();
        (dir, layout)
    }

    #[test]
    fn finds_links_in_document_order() {
        let html = r#"<head><link rel="icon" href="f.ico"><link rel="stylesheet" href="a.css"><link href="/b.css" rel="stylesheet" crossorigin></head>"#;
        let refs = find_stylesheet_links(html);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].path, "a.css");
        assert_eq!(refs[1].path, "/b.css");
        assert_eq!(&html[refs[0].span.clone()], r#"<link rel="stylesheet" href="a.css">"#);
    }

    #[test]
    fn inlines_existing_stylesheet() {
        let (_dir, layout) = project();
        fs::write(layout.build_dir().join("assets/app.css"), "body{margin:0}").unwrap();

        let mut session = InlineSession::new(&layout);
        let doc = Document::new(
            r#"<head><link rel="stylesheet" crossorigin href="/assets/app.css"></head>"#,
        );
        let out = inline_stylesheets(doc, &mut session);

        assert_eq!(out.as_str(), "<head><style>body{margin:0}</style></head>");
        assert_eq!(session.inlined().len(), 1);
        assert_eq!(session.inlined()[0].kind, AssetKind::StylesheetLink);
    }

    #[test]
    fn missing_stylesheet_is_left_in_place() {
        let (_dir, layout) = project();
        let mut session = InlineSession::new(&layout);
        let input = r#"<link rel="stylesheet" href="gone.css">"#;
        let out = inline_stylesheets(Document::new(input), &mut session);

        assert_eq!(out.as_str(), input);
        assert!(session
            .diagnostics()
            .iter()
            .any(|d| d.level == DiagnosticLevel::Warning && d.message.contains("gone.css")));
    }

    #[test]
    fn remote_stylesheet_is_skipped() {
        let (_dir, layout) = project();
        let mut session = InlineSession::new(&layout);
        let input = r#"<link rel="stylesheet" href="https://fonts.example.com/f.css">"#;
        let out = inline_stylesheets(Document::new(input), &mut session);

        assert_eq!(out.as_str(), input);
        assert!(session
            .diagnostics()
            .iter()
            .all(|d| d.level == DiagnosticLevel::Info));
    }

    #[test]
    fn rerun_on_inlined_output_is_noop() {
        let (_dir, layout) = project();
        fs::write(layout.build_dir().join("a.css"), "p{}").unwrap();

        let mut session = InlineSession::new(&layout);
        let once = inline_stylesheets(
            Document::new(r#"<link rel="stylesheet" href="a.css">"#),
            &mut session,
        );
        let twice = inline_stylesheets(once.clone(), &mut session);
        assert_eq!(once, twice);
    }

    #[test]
    fn css_with_dollar_signs_is_copied_literally() {
        let (_dir, layout) = project();
        fs::write(layout.build_dir().join("a.css"), "a::after{content:'$1 $$'}").unwrap();

        let mut session = InlineSession::new(&layout);
        let out = inline_stylesheets(
            Document::new(r#"<link rel="stylesheet" href="a.css">"#),
            &mut session,
        );
        assert_eq!(out.as_str(), "<style>a::after{content:'$1 $$'}</style>");
    }
}
