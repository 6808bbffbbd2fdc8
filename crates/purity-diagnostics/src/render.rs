//! Diagnostic rendering for terminals and in-memory buffers.
//!
//! [`Renderer`] writes to any `termcolor::WriteColor`, so the same code path
//! serves colored stderr output and plain `termcolor::Buffer`s in tests.

use crate::span::{Label, LabelStyle, LineColumn, ResolvedSpan, SourceSpan};
use crate::{Diagnostic, DiagnosticSeverity};
use std::collections::HashMap;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use unicode_width::UnicodeWidthChar;

/// Configuration for the diagnostic renderer.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Whether to use colors.
    pub use_color: bool,
    /// Maximum line width for source excerpts.
    pub max_width: usize,
    /// Whether to show documentation links.
    pub show_docs_links: bool,
    /// Base URL for documentation links.
    pub docs_base_url: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            use_color: true,
            max_width: 100,
            show_docs_links: true,
            docs_base_url: "https://purity-lang.org/errors".to_string(),
        }
    }
}

/// A cache for source file contents.
#[derive(Debug, Default)]
pub struct SourceCache {
    files: HashMap<String, String>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, path: impl Into<String>, source: impl Into<String>) {
        self.files.insert(path.into(), source.into());
    }

    pub fn get_source(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(|s| s.as_str())
    }

    /// Resolves a span to line/column information and source text.
    pub fn resolve_span(&self, span: &SourceSpan) -> Option<ResolvedSpan> {
        let path = span.file.to_string_lossy();
        let source = self.get_source(&path)?;

        let start = offset_to_line_col(source, span.start);
        let end = offset_to_line_col(source, span.end);

        let lines: Vec<String> = source
            .lines()
            .skip(start.line.saturating_sub(1))
            .take(end.line.saturating_sub(start.line) + 1)
            .map(String::from)
            .collect();

        Some(ResolvedSpan {
            span: span.clone(),
            start,
            end,
            lines,
        })
    }
}

/// Converts a byte offset to a line and display column.
fn offset_to_line_col(source: &str, offset: usize) -> LineColumn {
    let offset = offset.min(source.len());
    let mut line = 1;
    let mut column = 1;

    for (index, ch) in source.char_indices() {
        if index >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += ch.width().unwrap_or(0);
        }
    }
    LineColumn::new(line, column)
}

/// Renders diagnostics in the canonical `error[CODE]: message` format.
pub struct Renderer<W> {
    config: RenderConfig,
    out: W,
}

impl Renderer<StandardStream> {
    /// Renderer writing to stderr, colored when the terminal supports it.
    pub fn stderr(config: RenderConfig) -> Self {
        let choice = if config.use_color {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        Self::new(StandardStream::stderr(choice), config)
    }
}

impl<W: WriteColor> Renderer<W> {
    pub fn new(out: W, config: RenderConfig) -> Self {
        Self { config, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn severity_color(severity: DiagnosticSeverity) -> Color {
        match severity {
            DiagnosticSeverity::Error => Color::Red,
            DiagnosticSeverity::Warning => Color::Yellow,
            DiagnosticSeverity::Note => Color::Cyan,
            DiagnosticSeverity::Help => Color::Green,
        }
    }

    fn underline_char(style: LabelStyle, severity: DiagnosticSeverity) -> char {
        match (style, severity) {
            (LabelStyle::Primary, DiagnosticSeverity::Error) => '^',
            (LabelStyle::Primary, DiagnosticSeverity::Warning) => '~',
            (LabelStyle::Primary, _) => '-',
            (LabelStyle::Secondary, _) => '-',
        }
    }

    fn write_colored(&mut self, text: &str, color: Color, bold: bool) -> io::Result<()> {
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(color)).set_bold(bold);
        self.out.set_color(&spec)?;
        write!(self.out, "{}", text)?;
        self.out.reset()
    }

    fn write_header(&mut self, diagnostic: &Diagnostic) -> io::Result<()> {
        let color = Self::severity_color(diagnostic.severity);
        let mut header = diagnostic.severity.prefix().to_string();
        if let Some(code) = &diagnostic.code {
            header.push_str(&format!("[{}]", code));
        }
        self.write_colored(&header, color, true)?;
        writeln!(self.out, ": {}", diagnostic.message)
    }

    fn write_source_line(&mut self, line_num: usize, line: &str, gutter: usize) -> io::Result<()> {
        let number = format!("{:>width$}", line_num, width = gutter);
        self.write_colored(&number, Color::Blue, false)?;

        let budget = self.config.max_width.saturating_sub(gutter + 3);
        if line.chars().count() > budget {
            let truncated: String = line.chars().take(budget.saturating_sub(3)).collect();
            writeln!(self.out, " | {}...", truncated)
        } else {
            writeln!(self.out, " | {}", line)
        }
    }

    fn write_underline(
        &mut self,
        label: &Label,
        resolved: &ResolvedSpan,
        severity: DiagnosticSeverity,
        gutter: usize,
    ) -> io::Result<()> {
        let color = match label.style {
            LabelStyle::Primary => Self::severity_color(severity),
            LabelStyle::Secondary => Self::severity_color(DiagnosticSeverity::Note),
        };

        write!(self.out, "{:>width$} | ", "", width = gutter)?;
        write!(self.out, "{:>width$}", "", width = resolved.start.column - 1)?;

        let underline: String = std::iter::repeat(Self::underline_char(label.style, severity))
            .take(resolved.underline_width())
            .collect();
        self.write_colored(&underline, color, false)?;

        if !label.message.is_empty() {
            write!(self.out, " ")?;
            self.write_colored(&label.message, color, false)?;
        }
        writeln!(self.out)
    }

    /// Renders a single diagnostic, followed by a blank line.
    pub fn render(&mut self, diagnostic: &Diagnostic, sources: &SourceCache) -> io::Result<()> {
        self.write_header(diagnostic)?;

        let primary = diagnostic
            .spans
            .primary_span()
            .and_then(|span| sources.resolve_span(span));
        if let Some(resolved) = primary {
            let gutter = resolved.end.line.to_string().len().max(2);
            writeln!(
                self.out,
                "{:>width$} {}:{}:{}",
                "-->",
                resolved.span.file.display(),
                resolved.start.line,
                resolved.start.column,
                width = gutter + 3
            )?;
            writeln!(self.out, "{:>width$} |", "", width = gutter)?;

            for (i, line) in resolved.lines.iter().enumerate() {
                self.write_source_line(resolved.start.line + i, line, gutter)?;
            }
            for label in diagnostic.spans.labels() {
                if let Some(label_resolved) = sources.resolve_span(&label.span) {
                    self.write_underline(label, &label_resolved, diagnostic.severity, gutter)?;
                }
            }
        }

        for child in &diagnostic.children {
            let color = Self::severity_color(child.severity);
            write!(self.out, "  = ")?;
            self.write_colored(child.severity.prefix(), color, true)?;
            writeln!(self.out, ": {}", child.message)?;
        }

        if self.config.show_docs_links {
            if let Some(code) = &diagnostic.code {
                let url = format!("{}/{}", self.config.docs_base_url, code);
                writeln!(self.out, "  docs: {}", url)?;
            }
        }

        writeln!(self.out)
    }

    /// Renders every diagnostic, then a one-line summary.
    pub fn render_all(&mut self, diagnostics: &[Diagnostic], sources: &SourceCache) -> io::Result<()> {
        for diagnostic in diagnostics {
            self.render(diagnostic, sources)?;
        }
        self.render_summary(diagnostics)
    }

    pub fn render_summary(&mut self, diagnostics: &[Diagnostic]) -> io::Result<()> {
        let count = |severity| diagnostics.iter().filter(|d| d.severity == severity).count();
        let errors = count(DiagnosticSeverity::Error);
        let warnings = count(DiagnosticSeverity::Warning);

        if errors > 0 {
            self.write_colored("error", Color::Red, true)?;
            let plural = if errors == 1 { "" } else { "s" };
            writeln!(self.out, ": effect check failed with {} error{}", errors, plural)
        } else if warnings > 0 {
            self.write_colored("warning", Color::Yellow, true)?;
            let plural = if warnings == 1 { "" } else { "s" };
            writeln!(self.out, ": effect check passed with {} warning{}", warnings, plural)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::Buffer;

    fn plain() -> RenderConfig {
        RenderConfig {
            use_color: false,
            show_docs_links: false,
            ..RenderConfig::default()
        }
    }

    fn rendered(diagnostics: &[Diagnostic], sources: &SourceCache) -> String {
        let mut renderer = Renderer::new(Buffer::no_color(), plain());
        renderer.render_all(diagnostics, sources).unwrap();
        String::from_utf8(renderer.into_inner().into_inner()).unwrap()
    }

    #[test]
    fn test_offset_to_line_col() {
        let source = "line 1\nline 2\nline 3";
        assert_eq!(offset_to_line_col(source, 0), LineColumn::new(1, 1));
        assert_eq!(offset_to_line_col(source, 5), LineColumn::new(1, 6));
        assert_eq!(offset_to_line_col(source, 7), LineColumn::new(2, 1));
        assert_eq!(offset_to_line_col(source, 14), LineColumn::new(3, 1));
    }

    #[test]
    fn test_resolve_span() {
        let mut cache = SourceCache::new();
        cache.add_source("test.pur", "val x = 42\nval y = x + 1");

        let resolved = cache
            .resolve_span(&SourceSpan::new("test.pur", 4, 5))
            .unwrap();
        assert_eq!(resolved.start, LineColumn::new(1, 5));
        assert_eq!(resolved.lines, vec!["val x = 42".to_string()]);
        assert!(cache.resolve_span(&SourceSpan::new("other.pur", 0, 1)).is_none());
    }

    #[test]
    fn test_resolve_reversed_span() {
        let mut cache = SourceCache::new();
        cache.add_source("test.pur", "val x = 42\nval y = x + 1");

        let span = SourceSpan {
            file: "test.pur".into(),
            start: 15,
            end: 2,
        };
        let resolved = cache.resolve_span(&span).unwrap();
        assert_eq!(resolved.start, LineColumn::new(2, 5));
        assert_eq!(resolved.lines, vec!["val y = x + 1".to_string()]);
        assert_eq!(resolved.underline_width(), 1);
    }

    #[test]
    fn test_render_mismatch_with_source() {
        let mut cache = SourceCache::new();
        cache.add_source("main.pur", "def run(): Unit = write(\"hi\")\n");

        let diagnostic = Diagnostic::error("effect mismatch")
            .with_code("E5001")
            .with_primary_span(SourceSpan::new("main.pur", 18, 29), "expected `Pure`, found `IO`")
            .with_note("`run` is declared pure");

        insta::assert_snapshot!(rendered(&[diagnostic], &cache), @r###"
        error[E5001]: effect mismatch
          --> main.pur:1:19
           |
         1 | def run(): Unit = write("hi")
           |                   ^^^^^^^^^^^ expected `Pure`, found `IO`
          = note: `run` is declared pure

        error: effect check failed with 1 error
        "###);
    }

    #[test]
    fn test_render_without_source_and_with_docs() {
        let mut renderer = Renderer::new(Buffer::no_color(), RenderConfig::default());
        let diagnostic = Diagnostic::warning("invalid checker configuration").with_code("E3001");
        renderer.render(&diagnostic, &SourceCache::new()).unwrap();
        let text = String::from_utf8(renderer.into_inner().into_inner()).unwrap();

        assert_eq!(
            text,
            "warning[E3001]: invalid checker configuration\n  docs: https://purity-lang.org/errors/E3001\n\n"
        );
    }

    #[test]
    fn test_summary_is_silent_without_findings() {
        assert_eq!(rendered(&[], &SourceCache::new()), "");
    }
}
