//! DOT format utilities for graph visualization.
//!
//! This module provides utilities for generating DOT format output,
//! which can be rendered using Graphviz tools.

/// Escapes a string for safe use in DOT format labels.
///
/// Besides quotes, backslashes and newlines this also escapes the characters that
/// delimit fields in record-shaped nodes (`<`, `>`, `{`, `}` and `|`), because operation
/// descriptions routinely contain generic types and string concatenations.
///
/// # Arguments
///
/// * `s` - The string to escape
///
/// # Returns
///
/// A new string with all special characters properly escaped.
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::utils::escape_dot;
///
/// let escaped = escape_dot("List<T>");
/// assert_eq!(escaped, "List\\<T\\>");
/// ```
#[must_use]
pub fn escape_dot(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            '<' | '>' | '{' | '}' | '|' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
