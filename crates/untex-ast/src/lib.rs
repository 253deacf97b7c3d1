//! untex-ast - Semantic event definitions
//!
//! The parser turns untex markup into an ordered stream of [`Event`]s and the
//! compilation engine consumes that stream to emit LaTeX. Keeping the events
//! in their own crate lets the engine be driven by synthetic streams in tests
//! without going through the parser.

pub mod event;
pub mod list;

pub use event::Event;
pub use list::ListKind;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
