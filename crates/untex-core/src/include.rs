//! Import resolution and cycle detection.
//!
//! An `@import` is textual composition: the imported file is compiled inline
//! into the same output, sharing the importer's metadata and trace.
//!
//! # Path resolution
//!
//! Relative import paths are resolved against the directory of the importing
//! file, never the process working directory:
//!
//! ```text
//! /book/main.utx          @import "chapters/one.utx"
//! /book/chapters/one.utx  @import "../shared/macros.utx"
//! ```
//!
//! resolves `/book/chapters/one.utx` and then `/book/shared/macros.utx`.
//!
//! # Cycles
//!
//! The [`ImportTrace`] holds every file currently being compiled. Entering a
//! file that is already on the trace fails with
//! [`CompileError::RecursiveImport`] before anything of it is compiled.

use std::path::{Path, PathBuf};

use crate::error::{CompileError, Result};

/// Join an import target onto the importing file's directory
///
/// Absolute targets are returned unchanged. The result is not canonical; the
/// caller canonicalises it through the filesystem before tracing it.
pub fn resolve_import_path(base_dir: &Path, target: &str) -> PathBuf {
    let target = Path::new(target);
    if target.is_absolute() {
        target.to_path_buf()
    } else {
        base_dir.join(target)
    }
}

/// Files currently open in one compilation unit, outermost first
#[derive(Debug, Clone, Default)]
pub struct ImportTrace {
    open: Vec<PathBuf>,
}

impl ImportTrace {
    /// Create an empty trace
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `path` as open
    ///
    /// Fails without modifying the trace when `path` is already open.
    pub fn enter(&mut self, path: &Path) -> Result<()> {
        if self.contains(path) {
            return Err(CompileError::RecursiveImport(path.to_path_buf()));
        }
        self.open.push(path.to_path_buf());
        Ok(())
    }

    /// Mark `path` as closed
    ///
    /// Must be called for every successful [`ImportTrace::enter`], on success
    /// and failure alike.
    pub fn leave(&mut self, path: &Path) {
        debug_assert_eq!(self.open.last().map(PathBuf::as_path), Some(path));
        self.open.pop();
    }

    /// Whether `path` is currently open
    pub fn contains(&self, path: &Path) -> bool {
        self.open.iter().any(|p| p == path)
    }
}
