//! Integration tests for `@import`
//!
//! Path resolution, cycle detection and metadata sharing across files.

use std::path::PathBuf;

use untex_core::{CompileError, Compiler, MemoryFileSystem};

fn compile(fs: MemoryFileSystem, root: &str) -> Result<String, CompileError> {
    let mut out = Vec::new();
    Compiler::new(fs).compile(root, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn test_import_is_inlined() {
    let fs = MemoryFileSystem::new()
        .with_file("/book/main.utx", "# Book\n\n@import chapter.utx\n\nThe end.\n")
        .with_file("/book/chapter.utx", "## Chapter\n\nChapter text.\n");

    let latex = compile(fs, "/book/main.utx").unwrap();
    assert!(latex.contains(
        "\\section{Book}\n\n\\subsection{Chapter}\n\nChapter text.\n\nThe end.\n"
    ));
}

#[test]
fn test_relative_paths_follow_the_importer() {
    let fs = MemoryFileSystem::new()
        .with_file("/book/main.utx", "Main\n@import \"chapters/one.utx\"\n")
        .with_file("/book/chapters/one.utx", "One\n@import ../shared/end.utx\n")
        .with_file("/book/shared/end.utx", "End\n");

    let latex = compile(fs, "/book/main.utx").unwrap();
    assert!(latex.contains("Main\nOne\nEnd\n"));
}

#[test]
fn test_mutual_import_is_rejected() {
    let fs = MemoryFileSystem::new()
        .with_file("/doc/a.utx", "@import b.utx\n")
        .with_file("/doc/b.utx", "@import a.utx\n");

    let err = compile(fs, "/doc/a.utx").unwrap_err();
    match err {
        CompileError::RecursiveImport(path) => assert_eq!(path, PathBuf::from("/doc/a.utx")),
        other => panic!("expected a recursive import error, got {other:?}"),
    }
}

#[test]
fn test_self_import_is_rejected() {
    let fs = MemoryFileSystem::new().with_file("/doc/a.utx", "Text\n@import ./a.utx\n");
    let err = compile(fs, "/doc/a.utx").unwrap_err();
    assert!(matches!(err, CompileError::RecursiveImport(_)));
    assert!(err.to_string().contains("/doc/a.utx"));
}

#[test]
fn test_repeated_import_is_not_a_cycle() {
    let fs = MemoryFileSystem::new()
        .with_file("/doc/main.utx", "@import a.utx\n@import b.utx\n")
        .with_file("/doc/a.utx", "A\n@import shared.utx\n")
        .with_file("/doc/b.utx", "B\n@import shared.utx\n")
        .with_file("/doc/shared.utx", "Shared\n");

    let latex = compile(fs, "/doc/main.utx").unwrap();
    assert_eq!(latex.matches("Shared\n").count(), 2);
}

#[test]
fn test_missing_import() {
    let fs = MemoryFileSystem::new().with_file("/doc/main.utx", "x\n@import nope.utx\n");
    let err = compile(fs, "/doc/main.utx").unwrap_err();
    match err {
        CompileError::Read { path, .. } => assert_eq!(path, PathBuf::from("/doc/nope.utx")),
        other => panic!("expected a read error, got {other:?}"),
    }
}

#[test]
fn test_metadata_from_import_selects_template() {
    let fs = MemoryFileSystem::new()
        .with_file("/doc/main.utx", "@import meta/settings.utx\n\nBody\n")
        .with_file("/doc/meta/settings.utx", ":template: x.xml\n:title: From import\n")
        .with_file(
            "/doc/x.xml",
            r#"<template><document type="report"/><prefix>\title{ {{ title }} }</prefix></template>"#,
        );

    let latex = compile(fs, "/doc/main.utx").unwrap();
    assert!(latex.starts_with("\\documentclass{report}\n"), "{latex}");
    assert!(latex.contains("\\title{ From import }\nBody\n"));
}

#[test]
fn test_header_import_with_content_begins_document() {
    let fs = MemoryFileSystem::new()
        .with_file("/doc/main.utx", ":title: T\n@import intro.utx\n")
        .with_file("/doc/intro.utx", "Intro text\n");

    let latex = compile(fs, "/doc/main.utx").unwrap();
    assert!(latex.starts_with("\\documentclass"));
    assert!(latex.contains("\\begin{document}\nIntro text\n\\end{document}\n"));
}

#[test]
fn test_imported_list_is_closed_by_its_file() {
    let fs = MemoryFileSystem::new()
        .with_file("/doc/main.utx", "Before\n@import list.utx\nAfter\n")
        .with_file("/doc/list.utx", "- a\n\t- b\n");

    let latex = compile(fs, "/doc/main.utx").unwrap();
    assert!(latex.contains(
        "Before\n\\begin{itemize}\n\\item a\n\\begin{itemize}\n\\item b\n\\end{itemize}\n\\end{itemize}\nAfter\n"
    ));
}

#[test]
fn test_compiler_reusable_after_failure() {
    let fs = MemoryFileSystem::new()
        .with_file("/doc/a.utx", "@import b.utx\n")
        .with_file("/doc/b.utx", "@import a.utx\n")
        .with_file("/doc/ok.utx", "@import c.utx\n")
        .with_file("/doc/c.utx", "Fine\n");
    let compiler = Compiler::new(fs);

    assert!(compiler.compile("/doc/a.utx", Vec::new()).is_err());

    let mut out = Vec::new();
    let summary = compiler.compile("/doc/ok.utx", &mut out).unwrap();
    assert_eq!(summary.files.len(), 2);
    assert!(String::from_utf8(out).unwrap().contains("Fine\n"));
}
