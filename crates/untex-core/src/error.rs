//! Error types for compilation and template handling

use std::path::PathBuf;

use thiserror::Error;

use crate::parser::ParseError;

/// Errors that abort a compilation
///
/// Every variant is fatal for the compile that raised it and for every file
/// that (transitively) imported it.
#[derive(Error, Debug)]
pub enum CompileError {
    /// A source file could not be read or resolved
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source file is not valid UTF-8
    #[error("Source file is not valid UTF-8: {}", path.display())]
    Encoding { path: PathBuf },

    /// The parser rejected a source file
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// A file was imported while it was still being compiled
    #[error("Recursive import of {}", .0.display())]
    RecursiveImport(PathBuf),

    /// Template loading, resolution or asset error
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Writing to the output sink failed
    #[error("Failed to write output: {0}")]
    Write(#[source] std::io::Error),

    /// The document was ended without having been begun
    #[error("Document ended before it was begun")]
    DocumentNotBegun,
}

/// Errors raised by the template engine
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The template document is not well-formed XML
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The template document is well-formed but not a template
    #[error("Malformed template: {0}")]
    Malformed(String),

    /// A placeholder names a metadata key that was never set
    #[error("Unresolved placeholder '{key}' in {field}")]
    UnresolvedKey { key: String, field: String },

    /// A local template could not be read
    #[error("Failed to read template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A remote template could not be fetched
    #[error("Failed to fetch template {url}: {message}")]
    Fetch { url: String, message: String },

    /// Remote templates were requested but support is compiled out
    #[error("Remote templates not supported (compile with 'remote-templates' feature): {0}")]
    RemoteDisabled(String),

    /// An embedded asset could not be decoded
    #[error("Invalid asset {path}: {message}")]
    Asset { path: String, message: String },
}

/// Result type for compilation
pub type Result<T> = std::result::Result<T, CompileError>;
