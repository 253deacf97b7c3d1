//! untex markup parser
//!
//! Turns source text into the ordered [`Event`] stream consumed by the
//! compiler. The grammar lives in `untex.pest`.
//!
//! # Syntax
//!
//! - Metadata: `:key: value`
//! - Sections: `# Section`, `## Subsection`, `### Subsubsection`
//! - Imports: `@import "chapter.utx"`
//! - Lists: `- bullet`, `1. numbered` or `+ numbered`, nested by one tab or
//!   two spaces per level, optional `[label]` after the marker
//! - Raw LaTeX: fenced with three backticks, or inline between single ones
//! - Inline: `**bold**`, `*emphasis*`, `[text](url)`, `\` escapes the next
//!   character
//!
//! Metadata, imports and blank lines at the top of a file form its header.
//! [`Event::BeginDocument`] is emitted right before the first line that
//! produces output, so metadata set in the header (or by files it imports)
//! is in place when the template is resolved.
//!
//! # Example
//!
//! ```
//! use untex_ast::Event;
//! use untex_core::parser;
//!
//! let events = parser::parse(":title: Notes\n\n# Intro\n")?;
//! assert_eq!(events[0], Event::metadata("title", "Notes"));
//! assert_eq!(events[1], Event::BeginDocument);
//! # Ok::<(), parser::ParseError>(())
//! ```

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;
use untex_ast::{Event, ListKind};

#[derive(Parser)]
#[grammar = "untex.pest"]
struct UntexGrammar;

/// Syntax error reported by the grammar
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ParseError(Box<pest::error::Error<Rule>>);

/// Parse a whole source file into events
pub fn parse(source: &str) -> Result<Vec<Event>, ParseError> {
    let mut pairs = UntexGrammar::parse(Rule::document, source)
        .map_err(|e| ParseError(Box::new(e)))?;

    let mut builder = EventBuilder::default();
    if let Some(document) = pairs.next() {
        for line in document.into_inner() {
            builder.line(line);
        }
    }
    Ok(builder.finish())
}

/// Accumulates events while tracking header and list state
#[derive(Debug, Default)]
struct EventBuilder {
    events: Vec<Event>,
    begun: bool,
    in_list: bool,
    /// Blank lines seen inside a list, held until it is known whether the
    /// list continues
    pending_blank: usize,
}

impl EventBuilder {
    fn line(&mut self, pair: Pair<Rule>) {
        match pair.as_rule() {
            Rule::meta => {
                let mut inner = pair.into_inner();
                let key = inner.next().map(|p| p.as_str()).unwrap_or_default();
                let value = inner.next().map(|p| p.as_str().trim()).unwrap_or_default();
                self.events.push(Event::metadata(key, value));
            }
            Rule::import => {
                let path = pair
                    .into_inner()
                    .next()
                    .map(|p| p.as_str().trim())
                    .unwrap_or_default();
                self.close_list();
                self.events.push(Event::import(path));
            }
            Rule::heading => {
                let mut inner = pair.into_inner();
                let marks = inner.next().map(|p| p.as_str().len()).unwrap_or(1);
                let title = inner.next().map(|p| p.as_str().trim()).unwrap_or_default();
                self.begin();
                self.close_list();
                self.events.push(Event::Section {
                    title: title.to_string(),
                    level: marks.saturating_sub(1),
                });
                self.events.push(Event::Newline);
            }
            Rule::list_item => {
                self.begin();
                self.list_item(pair);
            }
            Rule::raw_block => {
                let body = pair
                    .into_inner()
                    .next()
                    .map(|p| p.as_str())
                    .unwrap_or_default();
                self.begin();
                self.close_list();
                self.events.push(Event::latex(body));
                self.events.push(Event::Newline);
            }
            Rule::blank_line => {
                if self.in_list {
                    self.pending_blank += 1;
                } else if self.begun {
                    self.events.push(Event::Newline);
                }
            }
            Rule::text_line => {
                self.begin();
                for inner in pair.into_inner() {
                    match inner.as_rule() {
                        Rule::indent if inner.as_str().is_empty() => self.close_list(),
                        Rule::inline_text => {
                            self.flush_blank();
                            self.inline_text(inner);
                        }
                        _ => {}
                    }
                }
                self.events.push(Event::Newline);
            }
            _ => {}
        }
    }

    fn list_item(&mut self, pair: Pair<Rule>) {
        let mut depth = 0;
        let mut kind = ListKind::Unordered;
        let mut label = None;
        let mut text = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::indent => depth = indent_depth(inner.as_str()),
                Rule::bullet => kind = ListKind::Unordered,
                Rule::ordinal => kind = ListKind::Ordered,
                Rule::item_label => {
                    label = inner
                        .into_inner()
                        .next()
                        .map(|p| p.as_str().trim().to_string())
                        .filter(|l| !l.is_empty());
                }
                Rule::inline_text => text = Some(inner),
                _ => {}
            }
        }

        self.flush_blank();
        self.in_list = true;
        self.events.push(Event::ListItem { kind, depth, label });
        if let Some(text) = text {
            self.inline_text(text);
        }
        self.events.push(Event::Newline);
    }

    fn inline_text(&mut self, pair: Pair<Rule>) {
        for inline in pair.into_inner() {
            match inline.as_rule() {
                Rule::plain | Rule::stray => self.push_text(inline.as_str()),
                Rule::escaped => {
                    if let Some(c) = inline.into_inner().next() {
                        self.push_text(c.as_str());
                    }
                }
                Rule::raw_inline => {
                    let raw = inner_str(inline);
                    if !raw.is_empty() {
                        self.events.push(Event::latex(raw));
                    }
                }
                Rule::bold => {
                    let text = inner_str(inline);
                    self.events.push(Event::Bold { text });
                }
                Rule::emph => {
                    let text = inner_str(inline);
                    self.events.push(Event::Emphasis { text });
                }
                Rule::link => {
                    let mut parts = inline.into_inner();
                    let text = parts.next().map(|p| p.as_str()).unwrap_or_default();
                    let url = parts.next().map(|p| p.as_str()).unwrap_or_default();
                    self.events.push(Event::Link {
                        url: url.trim().to_string(),
                        text: text.to_string(),
                    });
                }
                _ => {}
            }
        }
    }

    /// Append to the previous text event when possible
    fn push_text(&mut self, text: &str) {
        if let Some(Event::Text { text: last }) = self.events.last_mut() {
            last.push_str(text);
        } else {
            self.events.push(Event::text(text));
        }
    }

    fn begin(&mut self) {
        if !self.begun {
            self.begun = true;
            self.events.push(Event::BeginDocument);
        }
    }

    fn close_list(&mut self) {
        if self.in_list {
            self.in_list = false;
            self.events.push(Event::EndAllBlocks);
        }
        self.flush_blank();
    }

    fn flush_blank(&mut self) {
        for _ in 0..std::mem::take(&mut self.pending_blank) {
            self.events.push(Event::Newline);
        }
    }

    fn finish(mut self) -> Vec<Event> {
        self.begin();
        self.close_list();
        self.events.push(Event::EndDocument);
        self.events
    }
}

fn inner_str(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default()
}

/// One tab or two spaces per level
fn indent_depth(indent: &str) -> usize {
    let tabs = indent.chars().filter(|c| *c == '\t').count();
    let spaces = indent.chars().filter(|c| *c == ' ').count();
    tabs + spaces / 2
}
