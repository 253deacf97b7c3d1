//! Compilation engine
//!
//! A [`Compiler`] turns a root source file (and everything it imports) into
//! one LaTeX document written to a caller-supplied sink. Output is streamed:
//! nothing is buffered beyond what the sink itself buffers.
//!
//! All files of one compilation share a compilation unit: the sink, the
//! metadata, the import trace and the template. Each file gets its own
//! emitter with a private block stack, so lists opened in one file are
//! closed by that same file.
//!
//! Only the root file begins and ends the document. Metadata set before the
//! root begins (including by imported files) is visible to the template. An
//! imported file that produces output before that point begins the document
//! itself, with the metadata collected up to then.
//!
//! # Example
//!
//! ```
//! use untex_core::{Compiler, MemoryFileSystem};
//!
//! let fs = MemoryFileSystem::new()
//!     .with_file("/doc/main.utx", "# Hello\n\n- one\n- two\n");
//!
//! let mut out = Vec::new();
//! let summary = Compiler::new(fs).compile("/doc/main.utx", &mut out)?;
//!
//! let latex = String::from_utf8(out)?;
//! assert!(latex.contains("\\section{Hello}"));
//! assert!(latex.contains("\\begin{itemize}\n\\item one\n\\item two\n\\end{itemize}"));
//! assert_eq!(summary.bytes_written, latex.len() as u64);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use untex_ast::{Event, ListKind};

use crate::config::Settings;
use crate::error::{CompileError, Result};
use crate::fs::FileSystem;
use crate::include::{resolve_import_path, ImportTrace};
use crate::latex::{escape, section_command};
use crate::metadata::Metadata;
use crate::parser;
use crate::sink::Sink;
use crate::stack::BlockStack;
use crate::template::{Asset, Package, Template, TemplateSource};

/// Packages every compiled document declares
pub const REQUIRED_PACKAGES: [&str; 4] = ["tabularx", "color", "enumerate", "hyperref"];

/// Import depth of the root file
const ROOT_DEPTH: usize = 1;

/// Consecutive newlines after which further ones are dropped
const MAX_NEWLINES: usize = 2;

/// Outcome of a successful compilation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileSummary {
    /// Bytes written to the sink
    pub bytes_written: u64,
    /// Every compiled source file, in the order compilation started
    pub files: Vec<PathBuf>,
    /// Assets shipped with the template
    pub assets: Vec<Asset>,
}

/// Compiles source files into LaTeX
#[derive(Debug, Clone)]
pub struct Compiler<F> {
    fs: F,
    metadata: Metadata,
}

impl<F: FileSystem> Compiler<F> {
    /// Create a compiler reading sources through `fs`
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            metadata: Metadata::new(),
        }
    }

    /// Seed every compilation with `metadata`; documents may override it
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.extend(metadata.iter());
        self
    }

    /// Seed every compilation from settings
    pub fn with_settings(self, settings: &Settings) -> Self {
        self.with_metadata(settings.seed_metadata())
    }

    /// Metadata compilations start with
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Compile the file at `source` and everything it imports into `out`
    pub fn compile<W: Write>(&self, source: impl AsRef<Path>, out: W) -> Result<CompileSummary> {
        let source = source.as_ref();
        let root = self
            .fs
            .canonicalize(source)
            .map_err(|e| CompileError::Read {
                path: source.to_path_buf(),
                source: e,
            })?;
        info!("Compiling {}", root.display());

        let mut unit =
            CompilationUnit::new(&self.fs, parent_dir(&root), self.metadata.clone(), out);
        unit.compile_file(&root, ROOT_DEPTH)?;
        unit.finish()
    }

    /// Compile an already parsed event stream into `out`
    ///
    /// Imports and local template paths resolve against `base_dir`. The stream
    /// is not part of the import trace, so only cycles among the files it
    /// imports are detected.
    pub fn compile_events<W: Write>(
        &self,
        base_dir: impl AsRef<Path>,
        events: impl IntoIterator<Item = Event>,
        out: W,
    ) -> Result<CompileSummary> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let mut unit =
            CompilationUnit::new(&self.fs, base_dir.clone(), self.metadata.clone(), out);
        Emitter::new(&mut unit, base_dir, ROOT_DEPTH).run(events)?;
        unit.finish()
    }
}

/// Required packages, in declaration order
pub fn required_packages() -> impl Iterator<Item = Package> {
    REQUIRED_PACKAGES.iter().map(|name| Package::new(*name))
}

/// State shared by every file of one compilation
struct CompilationUnit<'a, W: Write> {
    fs: &'a dyn FileSystem,
    root_dir: PathBuf,
    sink: Sink<W>,
    metadata: Metadata,
    trace: ImportTrace,
    template: Option<Template>,
    files: Vec<PathBuf>,
}

impl<'a, W: Write> CompilationUnit<'a, W> {
    fn new(fs: &'a dyn FileSystem, root_dir: PathBuf, metadata: Metadata, out: W) -> Self {
        Self {
            fs,
            root_dir,
            sink: Sink::new(out),
            metadata,
            trace: ImportTrace::new(),
            template: None,
            files: Vec::new(),
        }
    }

    /// Compile one canonical path; the trace is released even on failure
    fn compile_file(&mut self, path: &Path, depth: usize) -> Result<()> {
        self.trace.enter(path)?;
        let result = self.compile_traced(path, depth);
        self.trace.leave(path);
        result
    }

    fn compile_traced(&mut self, path: &Path, depth: usize) -> Result<()> {
        debug!(depth, "Compiling {}", path.display());

        let bytes = self.fs.read_file(path).map_err(|source| CompileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let source = String::from_utf8(bytes).map_err(|_| CompileError::Encoding {
            path: path.to_path_buf(),
        })?;
        let events = parser::parse(&source).map_err(|source| CompileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        self.files.push(path.to_path_buf());
        Emitter::new(self, parent_dir(path), depth).run(events)
    }

    fn finish(mut self) -> Result<CompileSummary> {
        self.sink.flush().map_err(CompileError::Write)?;
        info!(
            bytes = self.sink.bytes_written(),
            files = self.files.len(),
            "Compilation finished"
        );
        Ok(CompileSummary {
            bytes_written: self.sink.bytes_written(),
            files: self.files,
            assets: self.template.map(|t| t.assets).unwrap_or_default(),
        })
    }
}

/// Per-file event interpreter
struct Emitter<'u, 'a, W: Write> {
    unit: &'u mut CompilationUnit<'a, W>,
    dir: PathBuf,
    depth: usize,
    blocks: BlockStack,
}

impl<'u, 'a, W: Write> Emitter<'u, 'a, W> {
    fn new(unit: &'u mut CompilationUnit<'a, W>, dir: PathBuf, depth: usize) -> Self {
        Self {
            unit,
            dir,
            depth,
            blocks: BlockStack::new(),
        }
    }

    /// Dispatch every event, then close what the file left open
    fn run(mut self, events: impl IntoIterator<Item = Event>) -> Result<()> {
        for event in events {
            self.dispatch(event)?;
        }
        self.end_all_blocks()
    }

    fn dispatch(&mut self, event: Event) -> Result<()> {
        match event {
            Event::SetMetadata { key, value } => {
                debug!("Metadata {} = {}", key, value);
                self.unit.metadata.set(key, value);
                Ok(())
            }
            Event::BeginDocument => self.begin_document(),
            Event::EndDocument => self.end_document(),
            Event::Latex { raw } => self.emit_latex(&raw),
            Event::Text { text } => self.emit_text(&text),
            Event::Newline => self.emit_newline(),
            Event::BeginBlock { name } => self.begin_block(&name),
            Event::EndBlock => self.end_block(),
            Event::EndAllBlocks => self.end_all_blocks(),
            Event::Section { title, level } => self.emit_section(&title, level),
            Event::Emphasis { text } => self.emit_wrapped(r"\textit{", &text),
            Event::Bold { text } => self.emit_wrapped(r"\textbf{", &text),
            Event::Link { url, text } => self.emit_link(&url, &text),
            Event::ListItem { kind, depth, label } => {
                self.emit_list_item(kind, depth, label.as_deref())
            }
            Event::Import { path } => self.import(&path),
        }
    }

    fn is_root(&self) -> bool {
        self.depth == ROOT_DEPTH
    }

    fn begin_document(&mut self) -> Result<()> {
        if !self.is_root() {
            return Ok(());
        }
        if self.unit.template.is_some() {
            debug!("Document already begun");
            return Ok(());
        }
        self.render_prefix()
    }

    /// Load, resolve and render the template with the metadata known so far
    fn render_prefix(&mut self) -> Result<()> {
        let source =
            TemplateSource::from_name(self.unit.metadata.template_name(), &self.unit.root_dir);
        info!("Using template {}", source);

        let mut template = Template::load(&source, self.unit.fs)?;
        template.merge(required_packages());
        template.resolve(&self.unit.metadata)?;
        template
            .render_prefix(&mut self.unit.sink)
            .map_err(CompileError::Write)?;

        self.unit.template = Some(template);
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        if !self.is_root() {
            return Ok(());
        }
        self.end_all_blocks()?;
        self.ensure_line_start()?;

        let template = self
            .unit
            .template
            .as_ref()
            .ok_or(CompileError::DocumentNotBegun)?;
        template
            .render_suffix(&mut self.unit.sink)
            .map_err(CompileError::Write)
    }

    /// Write raw LaTeX without its leading and trailing line breaks
    fn emit_latex(&mut self, raw: &str) -> Result<()> {
        let raw = raw.trim_matches(|c| c == '\n' || c == '\r');
        if raw.is_empty() {
            return Ok(());
        }
        self.write(raw)
    }

    fn emit_text(&mut self, text: &str) -> Result<()> {
        self.emit_latex(&escape(text))
    }

    /// Break the line, keeping at most one blank line in a row
    fn emit_newline(&mut self) -> Result<()> {
        if self.unit.sink.trailing_newlines() >= MAX_NEWLINES {
            return Ok(());
        }
        self.write("\n")
    }

    fn begin_block(&mut self, name: &str) -> Result<()> {
        self.ensure_line_start()?;
        self.emit_latex(&format!("\\begin{{{}}}", name))?;
        self.blocks.push(name);
        self.emit_newline()
    }

    fn end_block(&mut self) -> Result<()> {
        let Some(name) = self.blocks.pop() else {
            debug!("No open block to end");
            return Ok(());
        };
        self.ensure_line_start()?;
        self.emit_latex(&format!("\\end{{{}}}", name))?;
        self.emit_newline()
    }

    fn end_all_blocks(&mut self) -> Result<()> {
        while !self.blocks.is_empty() {
            self.end_block()?;
        }
        Ok(())
    }

    fn emit_section(&mut self, title: &str, level: usize) -> Result<()> {
        self.ensure_line_start()?;
        self.emit_latex(&format!("{}{{{}}}", section_command(level), escape(title)))
    }

    fn emit_wrapped(&mut self, command: &str, text: &str) -> Result<()> {
        self.emit_latex(command)?;
        self.emit_text(text)?;
        self.emit_latex("}")
    }

    fn emit_link(&mut self, url: &str, text: &str) -> Result<()> {
        self.emit_latex(r"\href{")?;
        self.emit_text(url)?;
        self.emit_latex("}{")?;
        self.emit_text(text)?;
        self.emit_latex("}")
    }

    /// Reconcile the block stack with the item's nesting, then open the item
    ///
    /// Depth 0 lives in one block, depth `n` in `n + 1`. When the innermost
    /// block is of another kind it is swapped for one of the requested kind.
    fn emit_list_item(&mut self, kind: ListKind, depth: usize, label: Option<&str>) -> Result<()> {
        let environment = kind.environment();
        let desired = depth + 1;

        while self.blocks.len() < desired {
            self.begin_block(environment)?;
        }
        while self.blocks.len() > desired {
            self.end_block()?;
        }
        if self.blocks.peek() != Some(environment) {
            self.end_block()?;
            self.begin_block(environment)?;
        }

        self.ensure_line_start()?;
        match label {
            Some(label) => {
                self.emit_latex(r"\item[")?;
                self.emit_text(label)?;
                self.emit_latex("] ")
            }
            None => self.emit_latex(r"\item "),
        }
    }

    fn import(&mut self, target: &str) -> Result<()> {
        let candidate = resolve_import_path(&self.dir, target);
        let path = self
            .unit
            .fs
            .canonicalize(&candidate)
            .map_err(|source| CompileError::Read {
                path: candidate,
                source,
            })?;
        debug!("Importing {}", path.display());
        self.unit.compile_file(&path, self.depth + 1)
    }

    /// Break the current line unless the output already sits at a line start
    fn ensure_line_start(&mut self) -> Result<()> {
        if self.unit.sink.at_line_start() {
            return Ok(());
        }
        self.write("\n")
    }

    fn write(&mut self, text: &str) -> Result<()> {
        if !self.is_root() && self.unit.template.is_none() {
            debug!("Imported content starts the document");
            self.render_prefix()?;
        }
        self.unit
            .sink
            .write_all(text.as_bytes())
            .map_err(CompileError::Write)
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use crate::TemplateError;

    const BARE: &str = r#"<template><document type="article"/></template>"#;

    fn bare_fs() -> MemoryFileSystem {
        MemoryFileSystem::new().with_file("/doc/bare.xml", BARE)
    }

    fn bare_compiler() -> Compiler<MemoryFileSystem> {
        let metadata: Metadata = [("template", "bare.xml")].into_iter().collect();
        Compiler::new(bare_fs()).with_metadata(metadata)
    }

    /// Compile synthetic events and return only the document body
    fn body(events: Vec<Event>) -> String {
        let mut stream = vec![Event::BeginDocument];
        stream.extend(events);
        stream.push(Event::EndDocument);

        let mut out = Vec::new();
        bare_compiler()
            .compile_events("/doc", stream, &mut out)
            .unwrap();
        let out = String::from_utf8(out).unwrap();

        let start = out.find("\\begin{document}\n").unwrap() + "\\begin{document}\n".len();
        let end = out.rfind("\\end{document}").unwrap();
        out[start..end].to_string()
    }

    fn item(kind: ListKind, depth: usize) -> Event {
        Event::item(kind, depth)
    }

    #[test]
    fn test_required_packages_order() {
        let names: Vec<String> = required_packages().map(|p| p.name).collect();
        assert_eq!(names, ["tabularx", "color", "enumerate", "hyperref"]);
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(
            body(vec![Event::text("50% of $x"), Event::Newline]),
            "50\\% of \\$x\n"
        );
    }

    #[test]
    fn test_latex_is_verbatim_and_trimmed() {
        assert_eq!(
            body(vec![Event::latex("\n\\newpage\n"), Event::Newline]),
            "\\newpage\n"
        );
    }

    #[test]
    fn test_newlines_collapse_to_one_blank_line() {
        assert_eq!(
            body(vec![
                Event::text("a"),
                Event::Newline,
                Event::Newline,
                Event::Newline,
                Event::Newline,
                Event::text("b"),
                Event::Newline,
            ]),
            "a\n\nb\n"
        );
    }

    #[test]
    fn test_inline_commands() {
        assert_eq!(
            body(vec![
                Event::Bold {
                    text: "b".to_string()
                },
                Event::text(" "),
                Event::Emphasis {
                    text: "e_1".to_string()
                },
                Event::text(" "),
                Event::Link {
                    url: "https://x.org/a_b".to_string(),
                    text: "x".to_string()
                },
                Event::Newline,
            ]),
            "\\textbf{b} \\textit{e\\_1} \\href{https://x.org/a\\_b}{x}\n"
        );
    }

    #[test]
    fn test_sections() {
        assert_eq!(
            body(vec![
                Event::Section {
                    title: "A & B".to_string(),
                    level: 0
                },
                Event::Newline,
                Event::Section {
                    title: "C".to_string(),
                    level: 2
                },
                Event::Newline,
            ]),
            "\\section{A \\& B}\n\\subsubsection{C}\n"
        );
    }

    #[test]
    fn test_nested_list() {
        assert_eq!(
            body(vec![
                item(ListKind::Unordered, 0),
                Event::text("a"),
                Event::Newline,
                item(ListKind::Unordered, 1),
                Event::text("b"),
                Event::Newline,
                item(ListKind::Unordered, 0),
                Event::text("c"),
                Event::Newline,
                Event::EndAllBlocks,
            ]),
            [
                "\\begin{itemize}",
                "\\item a",
                "\\begin{itemize}",
                "\\item b",
                "\\end{itemize}",
                "\\item c",
                "\\end{itemize}",
                "",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_list_kind_switch_at_same_depth() {
        assert_eq!(
            body(vec![
                item(ListKind::Unordered, 0),
                Event::text("a"),
                Event::Newline,
                item(ListKind::Ordered, 0),
                Event::text("b"),
                Event::Newline,
            ]),
            [
                "\\begin{itemize}",
                "\\item a",
                "\\end{itemize}",
                "\\begin{enumerate}",
                "\\item b",
                "\\end{enumerate}",
                "",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_deep_item_opens_every_level() {
        let out = body(vec![item(ListKind::Ordered, 2), Event::text("x")]);
        assert_eq!(out.matches("\\begin{enumerate}").count(), 3);
        assert_eq!(out.matches("\\end{enumerate}").count(), 3);
        assert!(out.contains("\\item x\n\\end{enumerate}"));
    }

    #[test]
    fn test_labelled_item_escapes_label() {
        let out = body(vec![
            Event::ListItem {
                kind: ListKind::Unordered,
                depth: 0,
                label: Some("#1".to_string()),
            },
            Event::text("first"),
            Event::Newline,
        ]);
        assert!(out.contains("\\item[\\#1] first\n"), "{out}");
    }

    #[test]
    fn test_blocks_balanced_at_end_of_file() {
        let out = body(vec![
            Event::BeginBlock {
                name: "center".to_string(),
            },
            Event::text("x"),
            item(ListKind::Unordered, 1),
        ]);
        assert_eq!(out.matches("\\begin{").count(), out.matches("\\end{").count());
        assert!(out.ends_with("\\end{center}\n"), "{out}");
    }

    #[test]
    fn test_end_block_on_empty_stack_is_ignored() {
        assert_eq!(body(vec![Event::EndBlock, Event::text("x")]), "x\n");
    }

    #[test]
    fn test_end_without_begin() {
        let mut out = Vec::new();
        let err = bare_compiler()
            .compile_events("/doc", [Event::text("x"), Event::EndDocument], &mut out)
            .unwrap_err();
        assert!(matches!(err, CompileError::DocumentNotBegun));
    }

    #[test]
    fn test_metadata_before_begin_reaches_template() {
        let fs = bare_fs().with_file(
            "/doc/titled.xml",
            r#"<template><document type="{{ class }}"/><prefix>\title{ {{ title }} }</prefix></template>"#,
        );
        let stream = vec![
            Event::metadata("template", "titled.xml"),
            Event::metadata("class", "report"),
            Event::metadata("title", "T"),
            Event::BeginDocument,
            Event::EndDocument,
        ];

        let mut out = Vec::new();
        Compiler::new(fs)
            .compile_events("/doc", stream, &mut out)
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("\\documentclass{report}\n"));
        assert!(out.contains("\\begin{document}\n\\title{ T }\n\\end{document}\n"));
    }

    #[test]
    fn test_unresolved_placeholder_fails() {
        let fs = MemoryFileSystem::new().with_file(
            "/doc/t.xml",
            r#"<template><document type="{{ missing }}"/></template>"#,
        );
        let metadata: Metadata = [("template", "t.xml")].into_iter().collect();
        let err = Compiler::new(fs)
            .with_metadata(metadata)
            .compile_events("/doc", [Event::BeginDocument], Vec::new())
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::Template(TemplateError::UnresolvedKey { .. })
        ));
    }

    #[test]
    fn test_bytes_written_matches_output() {
        let mut out = Vec::new();
        let summary = bare_compiler()
            .compile_events(
                "/doc",
                [Event::BeginDocument, Event::text("hi"), Event::EndDocument],
                &mut out,
            )
            .unwrap();
        assert_eq!(summary.bytes_written, out.len() as u64);
        assert!(summary.files.is_empty());
    }

    #[test]
    fn test_compile_records_files_in_order() {
        let fs = bare_fs()
            .with_file("/doc/main.utx", ":template: bare.xml\n@import a.utx\nbody\n")
            .with_file("/doc/a.utx", "@import sub/b.utx\n")
            .with_file("/doc/sub/b.utx", ":x: y\n");

        let summary = Compiler::new(fs).compile("/doc/main.utx", Vec::new()).unwrap();
        assert_eq!(
            summary.files,
            vec![
                PathBuf::from("/doc/main.utx"),
                PathBuf::from("/doc/a.utx"),
                PathBuf::from("/doc/sub/b.utx"),
            ]
        );
    }

    #[test]
    fn test_missing_root_file() {
        let err = Compiler::new(MemoryFileSystem::new())
            .compile("/nope.utx", Vec::new())
            .unwrap_err();
        assert!(matches!(err, CompileError::Read { .. }));
    }

    #[test]
    fn test_invalid_utf8_source() {
        let fs = MemoryFileSystem::new().with_file("/doc/bad.utx", vec![0xff, 0xfe, b'a']);
        let err = Compiler::new(fs).compile("/doc/bad.utx", Vec::new()).unwrap_err();
        assert!(matches!(err, CompileError::Encoding { .. }));
    }
}
