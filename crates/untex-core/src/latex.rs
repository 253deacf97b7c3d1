//! LaTeX text helpers

/// Escape the ten LaTeX special characters in `text`
///
/// Every other character is passed through unchanged. The replacement is a
/// single pass, so the braces introduced for `\`, `~` and `^` are never
/// escaped a second time.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Sectioning command for `level`; 0 is `\section`, each level adds a `sub`
pub fn section_command(level: usize) -> String {
    format!(r"\{}section", "sub".repeat(level))
}
