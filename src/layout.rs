//! Fixed on-disk layout of a compiled build.
//!
//! ```text
//! <root>/dist/index.html        seed document
//! <root>/dist/*.css, *.js        stylesheet and module script targets
//! <root>/dist/screensaver.html   output
//! <root>/public/                 static assets copied verbatim by the compiler
//! ```

use std::path::{Path, PathBuf};

/// Compiled output directory, relative to the project root.
pub const BUILD_DIR: &str = "dist";
/// Static assets directory, relative to the project root.
pub const STATIC_DIR: &str = "public";
/// Seed document file name inside [`BUILD_DIR`].
pub const SEED_FILE: &str = "index.html";
/// Output file name inside [`BUILD_DIR`].
pub const OUTPUT_FILE: &str = "screensaver.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    root: PathBuf,
}

impl BuildLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join(BUILD_DIR)
    }

    pub fn static_dir(&self) -> PathBuf {
        self.root.join(STATIC_DIR)
    }

    pub fn seed_path(&self) -> PathBuf {
        self.build_dir().join(SEED_FILE)
    }

    pub fn output_path(&self) -> PathBuf {
        self.build_dir().join(OUTPUT_FILE)
    }

    /// Roots searched for texture files, first existing match wins.
    pub fn texture_roots(&self) -> [PathBuf; 3] {
        [self.build_dir(), self.static_dir(), self.root.clone()]
    }
}
