//! Document templates
//!
//! A template is the skeleton a compiled body is wrapped in: document class,
//! required packages, preamble and free prefix/suffix text. One template is
//! created per compilation and goes through four steps:
//!
//! 1. [`Template::load`] from the default, a local file or a URL
//! 2. [`Template::merge`] the engine's required packages
//! 3. [`Template::resolve`] placeholders against the document metadata
//! 4. [`Template::render_prefix`] before the body and
//!    [`Template::render_suffix`] after it
//!
//! # Example
//!
//! ```
//! use untex_core::template::{Package, Template};
//! use untex_core::Metadata;
//!
//! let mut template = Template::from_xml(
//!     r#"<template><document type="article" options="{{ size }}"/></template>"#,
//! )?;
//! template.merge([Package::new("hyperref")]);
//!
//! let metadata: Metadata = [("size", "12pt")].into_iter().collect();
//! template.resolve(&metadata)?;
//!
//! let mut out = Vec::new();
//! template.render_prefix(&mut out)?;
//! assert!(String::from_utf8(out)?.starts_with("\\documentclass[12pt]{article}"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod parse;
mod source;
mod text;

use std::io::{self, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::error::TemplateError;
use crate::fs::FileSystem;
use crate::metadata::Metadata;

pub use source::{TemplateSource, DEFAULT_TEMPLATE};
pub use text::{dedent, substitute};

/// A LaTeX package reference
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Package {
    /// Package name, as in `\usepackage{name}`
    pub name: String,
    /// Comma separated options; empty for none
    pub options: String,
}

impl Package {
    /// A package without options
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: String::new(),
        }
    }

    /// A package with options
    pub fn with_options(name: impl Into<String>, options: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: options.into(),
        }
    }
}

/// Document class and the free text around the body
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentSettings {
    /// Document class, e.g. `article`
    pub class: String,
    /// Document class options
    pub options: String,
    /// Written after the package declarations
    pub preamble: String,
    /// Written right after `\begin{document}`
    pub prefix: String,
    /// Written right before `\end{document}`
    pub suffix: String,
}

/// A base64 resource shipped inside a template
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Asset {
    /// Relative path the resource is expected at
    pub path: String,
    /// Base64 body as found in the template
    pub data: String,
}

impl Asset {
    /// Decode the base64 body, ignoring embedded whitespace
    pub fn decode(&self) -> Result<Vec<u8>, TemplateError> {
        let compact: String = self.data.split_whitespace().collect();
        STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| TemplateError::Asset {
                path: self.path.clone(),
                message: e.to_string(),
            })
    }
}

/// A document skeleton
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    /// Class, options and text fields
    pub document: DocumentSettings,
    /// Packages in declaration order, unique by name
    pub packages: Vec<Package>,
    /// Embedded resources
    pub assets: Vec<Asset>,
}

impl Template {
    /// Load and parse the template at `source`
    pub fn load(source: &TemplateSource, fs: &dyn FileSystem) -> Result<Self, TemplateError> {
        let xml = source.read(fs)?;
        Self::from_xml(&xml)
    }

    /// Parse a template document
    pub fn from_xml(xml: &str) -> Result<Self, TemplateError> {
        parse::parse_template(xml)
    }

    /// The built-in template
    pub fn builtin() -> Result<Self, TemplateError> {
        Self::from_xml(DEFAULT_TEMPLATE)
    }

    /// Append `package` unless one with the same name is already listed
    ///
    /// Returns whether the package was added.
    pub fn add_package(&mut self, package: Package) -> bool {
        if self.packages.iter().any(|p| p.name == package.name) {
            debug!("Package {} already declared, keeping the first", package.name);
            return false;
        }
        self.packages.push(package);
        true
    }

    /// Add every package in order; earlier declarations win
    pub fn merge(&mut self, packages: impl IntoIterator<Item = Package>) {
        for package in packages {
            self.add_package(package);
        }
    }

    /// Strip shared indentation and substitute metadata into every text field
    ///
    /// Any placeholder naming a key absent from `metadata` is an error.
    pub fn resolve(&mut self, metadata: &Metadata) -> Result<(), TemplateError> {
        let doc = &mut self.document;

        for field in [&mut doc.preamble, &mut doc.prefix, &mut doc.suffix] {
            *field = text::trim_blank_edges(&dedent(field));
        }

        doc.class = substitute(&doc.class, metadata, "document type")?;
        doc.options = substitute(&doc.options, metadata, "document options")?;
        doc.preamble = substitute(&doc.preamble, metadata, "preamble")?;
        doc.prefix = substitute(&doc.prefix, metadata, "prefix")?;
        doc.suffix = substitute(&doc.suffix, metadata, "suffix")?;

        for package in &mut self.packages {
            let label = format!("package {}", package.name);
            package.name = substitute(&package.name, metadata, &label)?;
            package.options = substitute(&package.options, metadata, &label)?;
        }

        Ok(())
    }

    /// Write everything that precedes the body
    pub fn render_prefix<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        let doc = &self.document;
        writeln!(
            w,
            "\\documentclass{}{{{}}}",
            bracketed(&doc.options),
            doc.class
        )?;
        writeln!(w)?;

        for package in &self.packages {
            writeln!(
                w,
                "\\usepackage{}{{{}}}",
                bracketed(&package.options),
                package.name
            )?;
        }

        if !doc.preamble.is_empty() {
            writeln!(w, "{}", doc.preamble)?;
        }
        writeln!(w, "\\begin{{document}}")?;
        if !doc.prefix.is_empty() {
            writeln!(w, "{}", doc.prefix)?;
        }
        Ok(())
    }

    /// Write everything that follows the body
    pub fn render_suffix<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        if !self.document.suffix.is_empty() {
            writeln!(w, "{}", self.document.suffix)?;
        }
        writeln!(w, "\\end{{document}}")
    }
}

fn bracketed(options: &str) -> String {
    if options.is_empty() {
        String::new()
    } else {
        format!("[{}]", options)
    }
}
