//! Semantic events
//!
//! Each variant corresponds to one construct recognised by the parser, in
//! document order. Events carry only what the engine needs; escaping and
//! nesting decisions are made by the engine.

use serde::{Deserialize, Serialize};

use crate::list::ListKind;

/// A parser-recognised construct dispatched to the compilation engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Record a metadata key, overwriting any earlier value
    SetMetadata { key: String, value: String },
    /// Start of the document body; wraps the output at the outermost file only
    BeginDocument,
    /// End of the document body
    EndDocument,
    /// Raw LaTeX written verbatim
    Latex { raw: String },
    /// Plain text, escaped before it is written
    Text { text: String },
    /// Request a line break; consecutive requests collapse
    Newline,
    /// Open a named environment
    BeginBlock { name: String },
    /// Close the innermost open environment
    EndBlock,
    /// Close every open environment
    EndAllBlocks,
    /// Section heading; level 0 is `\section`
    Section { title: String, level: usize },
    /// Italic text
    Emphasis { text: String },
    /// Bold text
    Bold { text: String },
    /// Hyperlink
    Link { url: String, text: String },
    /// List item at indentation depth `depth` (0 = outermost)
    ListItem {
        kind: ListKind,
        depth: usize,
        label: Option<String>,
    },
    /// Import another source file inline
    Import { path: String },
}

impl Event {
    /// Shorthand for [`Event::Text`]
    pub fn text(text: impl Into<String>) -> Self {
        Event::Text { text: text.into() }
    }

    /// Shorthand for [`Event::Latex`]
    pub fn latex(raw: impl Into<String>) -> Self {
        Event::Latex { raw: raw.into() }
    }

    /// Shorthand for [`Event::SetMetadata`]
    pub fn metadata(key: impl Into<String>, value: impl Into<String>) -> Self {
        Event::SetMetadata {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Shorthand for [`Event::Import`]
    pub fn import(path: impl Into<String>) -> Self {
        Event::Import { path: path.into() }
    }

    /// Shorthand for an unlabelled [`Event::ListItem`]
    pub fn item(kind: ListKind, depth: usize) -> Self {
        Event::ListItem {
            kind,
            depth,
            label: None,
        }
    }
}
