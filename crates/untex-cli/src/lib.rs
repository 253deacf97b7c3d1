//! untex CLI - Command-line interface library
//!
//! This library provides the CLI functionality for untex:
//! - Compile: turn an untex source tree into a `.tex` file
//! - Events: dump the parsed event stream of a source as JSON
//!
//! # Library Usage
//!
//! ```ignore
//! use untex_cli::{compile_command, events_command};
//!
//! // Compile to a file with an explicit template
//! compile_command(&input, Some(&output), Some("report.xml"), &[], None)?;
//!
//! // Inspect what the parser sees
//! events_command(&input, None)?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Compile to stdout with the built-in template
//! untex notes.utx
//!
//! # Compile to a file, seeding metadata
//! untex notes.utx -o notes.tex -m author="Jane Doe" -t templates/report.xml
//!
//! # Show the event stream
//! untex notes.utx --events
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{compile_command, events_command, load_settings, run_cli, seed_metadata, Cli};
