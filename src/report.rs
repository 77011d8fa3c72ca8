//! Diagnostic rendering for the command line
//!
//! Messages follow the `file:line:col: error: message` shape. Color is
//! applied with crossterm styling and can be turned off for plain output.

use crate::parser::parse::ParseError;
use crate::resolver::errors::ResolveError;
use crossterm::style::Stylize;

fn label(color: bool) -> String {
    if color {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

fn position(text: String, color: bool) -> String {
    if color {
        text.bold().to_string()
    } else {
        text
    }
}

/// One syntax error in `file`.
pub fn render_parse_error(file: &str, err: &ParseError, color: bool) -> String {
    let at = format!("{}:{}:{}:", file, err.location.line, err.location.column);
    format!("{} {} {}", position(at, color), label(color), err.message)
}

/// A failed resolution, with one line per syntax error for parse failures.
pub fn render_resolve_error(err: &ResolveError, color: bool) -> String {
    match err {
        ResolveError::Parse { name, diagnostics } => {
            let mut lines: Vec<String> = diagnostics
                .iter()
                .map(|d| render_parse_error(name, d, color))
                .collect();
            lines.push(format!("{} {}", label(color), err));
            lines.join("\n")
        }
        ResolveError::Io { .. } | ResolveError::Cycle { .. } => {
            format!("{} {}", label(color), err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::SourceLocation;

    #[test]
    fn test_plain_parse_error() {
        let err = ParseError::new("expected type, found ';'", SourceLocation::new(4, 12));
        assert_eq!(
            render_parse_error("main.lem", &err, false),
            "main.lem:4:12: error: expected type, found ';'"
        );
    }

    #[test]
    fn test_colored_output_keeps_message() {
        let err = ParseError::new("expected ';'", SourceLocation::new(1, 1));
        let text = render_parse_error("a.lem", &err, true);

        assert!(text.contains("\u{1b}["));
        assert!(text.ends_with("expected ';'"));
    }

    #[test]
    fn test_parse_failure_lists_every_error() {
        let err = ResolveError::Parse {
            name: "b.lem".to_string(),
            diagnostics: vec![
                ParseError::new("first", SourceLocation::new(1, 1)),
                ParseError::new("second", SourceLocation::new(2, 5)),
            ],
        };
        let text = render_resolve_error(&err, false);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "b.lem:2:5: error: second");
        assert_eq!(lines[2], "error: b.lem: 2 syntax error(s)");
    }
}
