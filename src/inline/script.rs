//! Module script inlining.
//!
//! The compiled entry loads its code through one external
//! `<script type="module" src="...">`. That tag is replaced by an inline
//! module script whose body has had its texture references rewritten.

use std::sync::LazyLock;

use regex::Regex;

use super::{texture, InlineSession};
use crate::utils;
use crate::{AssetKind, AssetReference, Document};

/// An external script tag: attributes, then an empty body.
static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>\s*</script\s*>").expect("script regex is valid")
});

/// External module scripts in document order.
pub fn find_module_scripts(html: &str) -> Vec<AssetReference> {
    SCRIPT_RE
        .find_iter(html)
        .filter_map(|m| {
            let tag = m.as_str();
            let open = &tag[..tag.find('>')? + 1];
            let is_module = utils::attr_value(open, "type")
                .is_some_and(|ty| ty.eq_ignore_ascii_case("module"));
            if !is_module {
                return None;
            }
            let src = utils::attr_value(open, "src")?;
            Some(AssetReference {
                kind: AssetKind::ModuleScript,
                path: src.to_string(),
                span: m.range(),
                binding: None,
            })
        })
        .collect()
}

/// Run both texture passes over script text: calls first, then imports.
pub fn resolve_textures(js: &str, session: &mut InlineSession<'_>) -> String {
    let js = texture::inline_texture_calls(js, session);
    texture::inline_texture_imports(&js, session)
}

/// Replace each resolvable external module script with an inline one.
pub fn inline_module_scripts(doc: Document, session: &mut InlineSession<'_>) -> Document {
    let html = doc.into_string();
    let roots = [session.layout().build_dir()];

    let mut replacements = Vec::new();
    for reference in find_module_scripts(&html) {
        let Some(asset) = session.resolve(&reference, &roots) else {
            continue;
        };
        session.record(&reference, &asset);
        let js = resolve_textures(&asset.text(), session);
        replacements.push((reference.span, format!("<script type=\"module\">{js}</script>")));
    }

    if replacements.is_empty() {
        return Document::new(html);
    }
    Document::new(utils::splice(&html, &replacements))
}
