//! Text field preparation: indentation stripping and placeholder substitution

use std::sync::OnceLock;

use regex::Regex;

use crate::error::TemplateError;
use crate::metadata::Metadata;

/// Remove the indentation shared by every non-blank line
///
/// The indent is the shortest leading run of spaces/tabs found on any
/// non-blank line. It is stripped only from lines that begin with exactly
/// that run; other lines are left as they are.
pub fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(leading_whitespace)
        .min_by_key(|ws| ws.len())
        .unwrap_or("");

    if indent.is_empty() {
        return text.to_string();
    }

    text.split('\n')
        .map(|line| line.strip_prefix(indent).unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drop blank lines at the start and whitespace at the end
pub fn trim_blank_edges(text: &str) -> String {
    let mut lines: Vec<&str> = text.split('\n').collect();
    while lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    lines.join("\n").trim_end().to_string()
}

/// Replace every `{{ key }}` / `{{ .key }}` in `text` with its metadata value
///
/// Substitution is a single pass: values are inserted verbatim and never
/// expanded themselves, so the result does not depend on key order.
pub fn substitute(text: &str, metadata: &Metadata, field: &str) -> Result<String, TemplateError> {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER_RE
        .get_or_init(|| Regex::new(r"\{\{\s*\.?([A-Za-z0-9_.\-]+)\s*\}\}").unwrap());

    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in re.captures_iter(text) {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = metadata
            .get(key.as_str())
            .ok_or_else(|| TemplateError::UnresolvedKey {
                key: key.as_str().to_string(),
                field: field.to_string(),
            })?;

        out.push_str(&text[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }

    out.push_str(&text[last..]);
    Ok(out)
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start_matches([' ', '\t']).len()]
}
