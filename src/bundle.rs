//! Core bundling logic.
//!
//! This module orchestrates the full pipeline:
//! 1. Load the seed document (`dist/index.html`)
//! 2. Inline stylesheets
//! 3. Inline the module script and its textures
//! 4. Strip head hints and append the hooks script
//! 5. Write `dist/screensaver.html`
//!
//! Stages run one after another on a single owned [`Document`]. Nothing is
//! written until every stage has finished, and a missing seed aborts before
//! anything else happens.

use std::io;
use std::path::Path;

use crate::finalize;
use crate::inline::{self, InlineSession};
use crate::utils;
use crate::{BundleError, BundleOptions, BundlePlan, BundleResult, Diagnostic, Document};

/// Read the seed document. A missing file is the one fatal condition;
/// invalid UTF-8 is replaced rather than rejected.
pub fn load_seed(path: &Path) -> Result<Document, BundleError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Document::new(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(BundleError::SeedNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(BundleError::IoError(e)),
    }
}

/// Execute the bundle pipeline.
pub fn execute_bundle(plan: BundlePlan, opts: BundleOptions) -> Result<BundleResult, BundleError> {
    let layout = plan.layout();
    let seed_path = layout.seed_path();

    let doc = load_seed(&seed_path)?;

    let mut session = InlineSession::new(&layout);
    session.emit(Diagnostic::info(format!(
        "Bundle started: {} ({} bytes)",
        seed_path.display(),
        doc.len()
    )));

    let doc = inline::inline_stylesheets(doc, &mut session);
    let doc = inline::inline_module_scripts(doc, &mut session);

    let doc = finalize::strip_head_hints(doc);
    let doc = match finalize::hooks_script(&opts) {
        Some(script) => finalize::inject_hooks(doc, &script),
        None => doc,
    };

    let (inlined, mut diagnostics) = session.into_parts();
    let html = doc.into_string();
    let output_path = layout.output_path();

    if opts.write_to_disk {
        finalize::write_output(&output_path, &html)?;
        utils::emit(
            &mut diagnostics,
            Diagnostic::info(format!(
                "Written {} bytes to {}",
                html.len(),
                output_path.display()
            )),
        );
    }

    Ok(BundleResult {
        html,
        output_path,
        written: opts.write_to_disk,
        inlined,
        diagnostics,
    })
}

/// Serialize a run report (everything except the document itself).
pub fn report_json(result: &BundleResult) -> Result<String, BundleError> {
    Ok(serde_json::to_string_pretty(result)?)
}
