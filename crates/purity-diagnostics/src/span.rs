//! Source locations a diagnostic points at.
//!
//! Checker output carries byte ranges; line and column numbers are only
//! computed against the source text when rendering.

use std::ops::Range;
use std::path::PathBuf;

/// Byte range `start..end` in `file`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub file: PathBuf,
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    /// Bounds given in the wrong order are swapped.
    pub fn new(file: impl Into<PathBuf>, start: usize, end: usize) -> Self {
        Self {
            file: file.into(),
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.range().len()
    }

    pub fn is_empty(&self) -> bool {
        self.range().is_empty()
    }
}

/// Whether a label marks the offending code or something related to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LabelStyle {
    #[default]
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub span: SourceSpan,
    pub message: String,
    pub style: LabelStyle,
}

/// Labels of one diagnostic, in the order they were attached
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiSpan {
    labels: Vec<Label>,
}

impl MultiSpan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, style: LabelStyle, span: SourceSpan, message: impl Into<String>) {
        self.labels.push(Label {
            span,
            message: message.into(),
            style,
        });
    }

    /// Span of the first primary label; the renderer anchors the excerpt
    /// there.
    pub fn primary_span(&self) -> Option<&SourceSpan> {
        self.labels
            .iter()
            .find(|label| label.style == LabelStyle::Primary)
            .map(|label| &label.span)
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// 1-based position; the column counts terminal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

impl LineColumn {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A span located in its source text, with the lines it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpan {
    pub span: SourceSpan,
    pub start: LineColumn,
    pub end: LineColumn,
    pub lines: Vec<String>,
}

impl ResolvedSpan {
    pub fn is_multiline(&self) -> bool {
        self.end.line > self.start.line
    }

    /// Width of the underline drawn below a single-line span
    pub fn underline_width(&self) -> usize {
        if self.is_multiline() {
            1
        } else {
            self.end.column.saturating_sub(self.start.column).max(1)
        }
    }
}
