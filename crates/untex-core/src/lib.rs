//! untex-core - Lightweight markup to LaTeX
//!
//! Core library for untex: parses markup sources, follows their imports and
//! streams a complete LaTeX document wrapped in a configurable template.
//!
//! # Example
//!
//! ```
//! use untex_core::{Compiler, MemoryFileSystem};
//!
//! let fs = MemoryFileSystem::new().with_file(
//!     "/notes/main.utx",
//!     ":title: Notes\n\n# Hello\n\nSome **bold** text.\n",
//! );
//!
//! let mut out = Vec::new();
//! Compiler::new(fs).compile("/notes/main.utx", &mut out)?;
//!
//! let latex = String::from_utf8(out)?;
//! assert!(latex.starts_with("\\documentclass"));
//! assert!(latex.contains("\\usepackage{hyperref}"));
//! assert!(latex.contains("Some \\textbf{bold} text."));
//! assert!(latex.ends_with("\\end{document}\n"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod fs;
pub mod include;
pub mod latex;
pub mod metadata;
pub mod parser;
pub mod sink;
pub mod stack;
pub mod template;

// Re-export main types and functions
pub use compiler::{required_packages, CompileSummary, Compiler, REQUIRED_PACKAGES};
pub use config::Settings;
pub use error::{CompileError, Result, TemplateError};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use metadata::{Metadata, TEMPLATE_KEY};
pub use parser::{parse, ParseError};
pub use template::{Asset, Package, Template, TemplateSource};
pub use untex_ast::{Event, ListKind};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
