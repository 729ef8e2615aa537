//! Diagnostics: the shared `Diagnostic` value and its two renderers
//! (`spec.md` §7 "user-visible failure").
//!
//! Every layer (Lex/Parse/Resolve/Analyze) produces its own typed error;
//! the Driver converts each into a `Diagnostic` at the boundary where it
//! still has file/position context, exactly as §7's propagation rule
//! requires ("typed errors bubble up and are formatted at the boundary
//! layer that has file/position context"). Grounded on the teacher's
//! `[dependencies]` table, which already declares `termcolor` +
//! `terminal_size` + `atty` for terminal-aware reporting even though the
//! teacher's own binaries lean on plain `println!`; this is where this
//! crate actually exercises them.

use std::io::Write as _;

use termcolor::{Color, ColorSpec, StandardStream, WriteColor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn color(self) -> Color {
        match self {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// One reportable condition, file/line/column plus an optional one-line
/// source excerpt to underline (`spec.md` §7: "an ASCII-underlined source
/// excerpt").
#[derive(Debug, Clone, serde::Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file_name: String,
    pub line: u32,
    pub column: u32,
    pub length: u32,
    pub message: String,
    pub source_line: Option<String>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: impl Into<String>,
        file_name: impl Into<String>,
        line: u32,
        column: u32,
        length: u32,
        message: impl Into<String>,
        source_text: Option<&str>,
    ) -> Self {
        let source_line = source_text.and_then(|text| text.lines().nth(line.saturating_sub(1) as usize)).map(str::to_string);
        Self {
            severity,
            code: code.into(),
            file_name: file_name.into(),
            line,
            column,
            length: length.max(1),
            message: message.into(),
            source_line,
        }
    }
}

/// Whether ANSI color is written, mirroring the `--color=auto|always|never`
/// flag (`SPEC_FULL.md` §4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    fn resolve(self) -> termcolor::ColorChoice {
        match self {
            ColorChoice::Always => termcolor::ColorChoice::Always,
            ColorChoice::Never => termcolor::ColorChoice::Never,
            ColorChoice::Auto => {
                if atty::is(atty::Stream::Stderr) {
                    termcolor::ColorChoice::Auto
                } else {
                    termcolor::ColorChoice::Never
                }
            }
        }
    }
}

/// Terminal width used to decide whether the source excerpt needs
/// truncating; falls back to 80 columns when not attached to a terminal
/// (piped output, CI logs).
fn terminal_width() -> usize {
    terminal_size::terminal_size().map(|(terminal_size::Width(w), _)| w as usize).unwrap_or(80)
}

/// Renders every diagnostic to stderr in `spec.md` §7's block format,
/// followed by the `N errors, M warnings` summary line, and returns
/// whether any error-severity diagnostic was emitted (the Driver's exit
/// code hinges on this).
pub fn render_terminal(diagnostics: &[Diagnostic], color: ColorChoice) -> std::io::Result<bool> {
    let mut stream = StandardStream::stderr(color.resolve());
    let width = terminal_width();
    let mut error_count = 0usize;
    let mut warning_count = 0usize;

    for diag in diagnostics {
        match diag.severity {
            Severity::Error => error_count += 1,
            Severity::Warning => warning_count += 1,
        }
        render_one(&mut stream, diag, width)?;
    }

    stream.reset()?;
    writeln!(stream, "{} error(s), {} warning(s)", error_count, warning_count)?;
    Ok(error_count > 0)
}

fn render_one(stream: &mut StandardStream, diag: &Diagnostic, width: usize) -> std::io::Result<()> {
    let mut header = ColorSpec::new();
    header.set_fg(Some(diag.severity.color())).set_bold(true);
    stream.set_color(&header)?;
    write!(stream, "{}", diag.severity.label())?;
    stream.reset()?;
    writeln!(stream, "[{}]: {}", diag.code, diag.message)?;

    let mut location = ColorSpec::new();
    location.set_fg(Some(Color::Blue));
    stream.set_color(&location)?;
    writeln!(stream, "  --> {}:{}:{}", diag.file_name, diag.line, diag.column)?;
    stream.reset()?;

    if let Some(source_line) = &diag.source_line {
        let truncated = truncate_for_width(source_line, width);
        writeln!(stream, "   | {}", truncated)?;
        let pointer = ascii_underline(diag.column, diag.length);
        let mut underline = ColorSpec::new();
        underline.set_fg(Some(diag.severity.color()));
        stream.set_color(&underline)?;
        writeln!(stream, "   | {}", pointer)?;
        stream.reset()?;
    }
    writeln!(stream)?;
    Ok(())
}

fn truncate_for_width(line: &str, width: usize) -> String {
    let budget = width.saturating_sub(4).max(8);
    if line.chars().count() <= budget {
        line.to_string()
    } else {
        format!("{}...", line.chars().take(budget.saturating_sub(3)).collect::<String>())
    }
}

fn ascii_underline(column: u32, length: u32) -> String {
    let indent = column.saturating_sub(1) as usize;
    format!("{}{}", " ".repeat(indent), "^".repeat(length.max(1) as usize))
}

/// Renders every diagnostic as a JSON array (`--dump-namespace`'s sibling
/// for error output, so tooling consumers never have to scrape the
/// terminal format).
pub fn render_json(diagnostics: &[Diagnostic]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_is_pulled_from_the_right_line() {
        let source = "def main() {\n  return 0\n}\n";
        let diag = Diagnostic::new(Severity::Error, "ERR_X", "a.flint", 2, 3, 6, "oops", Some(source));
        assert_eq!(diag.source_line.as_deref(), Some("  return 0"));
    }

    #[test]
    fn underline_aligns_with_column() {
        let pointer = ascii_underline(3, 4);
        assert_eq!(pointer, "  ^^^^");
    }

    #[test]
    fn json_round_trips_severity_and_code() {
        let diag = Diagnostic::new(Severity::Warning, "ERR_Y", "b.flint", 1, 1, 1, "hm", None);
        let json = render_json(&[diag]).unwrap();
        assert!(json.contains("\"Warning\""));
        assert!(json.contains("ERR_Y"));
    }

    #[test]
    fn json_rendering_matches_snapshot() {
        let source = "def main() {\n  return 0\n}\n";
        let diag = Diagnostic::new(Severity::Error, "ERR_DIVISION_BY_ZERO", "a.flint", 2, 10, 1, "division by zero", Some(source));
        let json = render_json(&[diag]).unwrap();
        insta::assert_snapshot!(json, @r###"
        [
          {
            "severity": "Error",
            "code": "ERR_DIVISION_BY_ZERO",
            "file_name": "a.flint",
            "line": 2,
            "column": 10,
            "length": 1,
            "message": "division by zero",
            "source_line": "  return 0"
          }
        ]
        "###);
    }
}
