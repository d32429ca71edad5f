//! HTML escaping for output blocks

/// Escape HTML-sensitive characters
///
/// Covers the five characters that can change meaning in element or
/// attribute context. Everything else, including non-ASCII text, passes
/// through untouched.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape twice, for sinks that decode entities once before display
pub fn escape_html_twice(input: &str) -> String {
    escape_html(&escape_html(input))
}
