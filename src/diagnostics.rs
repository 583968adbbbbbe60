use std::fmt::Write;
use std::ops::Range;

use colored::Colorize;

/// A single-line region of a named source listing. Lines and columns are
/// 1-based, the column range is half-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub file: String,
    pub line: u32,
    pub cols: Range<u32>,
}

impl Span {
    pub fn new(file: &str, line: u32, cols: Range<u32>) -> Self {
        Span {
            file: file.to_owned(),
            line,
            cols,
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.cols.start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Warning,
    Error,
}

impl Level {
    fn header(self) -> colored::ColoredString {
        match self {
            Level::Warning => "warning".yellow().bold(),
            Level::Error => "error".red().bold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub span: Option<Span>,
    pub note: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            level: Level::Error,
            message: message.into(),
            span: None,
            note: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            level: Level::Warning,
            message: message.into(),
            span: None,
            note: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Renders the diagnostic against its source listing:
    ///
    /// ```text
    /// error: some message
    ///   --> listing:19:21
    ///    |
    /// 19 |     list_into_inner(list, dest2);
    ///    |                     ^^^^
    ///    |
    ///    = note: some note
    /// ```
    ///
    /// Colors follow the global `colored` override, so `--no-color` turns
    /// them off everywhere at once.
    pub fn render(&self, source: &str) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "{}: {}", self.level.header(), self.message);

        let Some(span) = &self.span else {
            if let Some(note) = &self.note {
                let _ = writeln!(out, "  = {}: {}", "note".bold(), note);
            }
            return out;
        };

        let _ = writeln!(out, "  --> {}", span);

        let line_no = span.line.to_string();
        let padding = " ".repeat(line_no.len());

        if let Some(line) = source.lines().nth(span.line as usize - 1) {
            let mut arrows = " ".repeat(span.cols.start.saturating_sub(1) as usize);
            arrows.push_str(&"^".repeat(span.cols.len().max(1)));

            let _ = writeln!(out, "{} |", padding);
            let _ = writeln!(out, "{} | {}", line_no, line);
            let _ = writeln!(out, "{} | {}", padding, arrows.red().bold());
        }

        if let Some(note) = &self.note {
            let _ = writeln!(out, "{} |", padding);
            let _ = writeln!(out, "{} = {}: {}", padding, "note".bold(), note);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn renders_span_and_note() {
        plain();

        let source = "fn main() {\n    drop(x);\n}\n";
        let diag = Diagnostic::error("use of moved value: `x`")
            .with_span(Span::new("listing", 2, 10..11))
            .with_note("`x` was moved earlier");

        let expected = "\
error: use of moved value: `x`
  --> listing:2:10
  |
2 |     drop(x);
  |          ^
  |
  = note: `x` was moved earlier
";
        assert_eq!(diag.render(source), expected);
    }

    #[test]
    fn renders_without_span() {
        plain();

        let diag = Diagnostic::warning("something odd").with_note("just saying");
        assert_eq!(
            diag.render(""),
            "warning: something odd\n  = note: just saying\n"
        );
    }

    #[test]
    fn span_display() {
        let span = Span::new("demo", 4, 9..13);
        assert_eq!(span.to_string(), "demo:4:9");
    }

    #[test]
    fn out_of_range_line_skips_the_snippet() {
        plain();

        let diag = Diagnostic::error("boom").with_span(Span::new("listing", 99, 1..2));
        assert_eq!(diag.render("one line\n"), "error: boom\n  --> listing:99:1\n");
    }
}
