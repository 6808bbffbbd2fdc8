//! Purity Diagnostics - what the effect checker tells its users.
//!
//! A [`Diagnostic`] is a severity, an optional error code, a message, the
//! source spans it points at and any attached notes. [`render::Renderer`]
//! turns diagnostics into rustc-style terminal output.
//!
//! ```rust
//! use purity_diagnostics::{Diagnostic, DiagnosticSeverity};
//! use purity_diagnostics::span::SourceSpan;
//!
//! let diagnostic = Diagnostic::error("effect mismatch")
//!     .with_code("E5001")
//!     .with_primary_span(SourceSpan::new("src/main.pur", 20, 32), "expected `Pure`, found `IO`")
//!     .with_note("`main` is declared pure");
//!
//! assert_eq!(diagnostic.severity, DiagnosticSeverity::Error);
//! assert_eq!(diagnostic.code.as_deref(), Some("E5001"));
//! ```

pub mod render;
pub mod span;

use span::{LabelStyle, MultiSpan, SourceSpan};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum DiagnosticSeverity {
    Help,
    Note,
    Warning,
    #[default]
    Error,
}

impl DiagnosticSeverity {
    pub fn prefix(&self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Note => "note",
            DiagnosticSeverity::Help => "help",
        }
    }

    /// Errors fail the check; everything else is informational.
    pub fn is_fatal(&self) -> bool {
        *self == DiagnosticSeverity::Error
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A note or help line printed under its parent diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubDiagnostic {
    pub severity: DiagnosticSeverity,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    /// Registry code such as `E5001`
    pub code: Option<String>,
    pub message: String,
    pub spans: MultiSpan,
    pub children: Vec<SubDiagnostic>,
}

impl Diagnostic {
    pub fn new(severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            spans: MultiSpan::new(),
            children: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Warning, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_primary_span(mut self, span: SourceSpan, message: impl Into<String>) -> Self {
        self.spans.push(LabelStyle::Primary, span, message);
        self
    }

    pub fn with_secondary_span(mut self, span: SourceSpan, message: impl Into<String>) -> Self {
        self.spans.push(LabelStyle::Secondary, span, message);
        self
    }

    pub fn with_note(self, message: impl Into<String>) -> Self {
        self.with_child(DiagnosticSeverity::Note, message)
    }

    pub fn with_help(self, message: impl Into<String>) -> Self {
        self.with_child(DiagnosticSeverity::Help, message)
    }

    fn with_child(mut self, severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        self.children.push(SubDiagnostic {
            severity,
            message: message.into(),
        });
        self
    }
}

// ============================================================================
// Error codes
// ============================================================================

/// Error codes are `E` followed by four digits; the first digit names the
/// category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCategory {
    /// E3xxx: checker configuration
    Configuration,
    /// E5xxx: effect checking
    Effects,
}

impl ErrorCategory {
    const ALL: [(char, ErrorCategory); 2] = [
        ('3', ErrorCategory::Configuration),
        ('5', ErrorCategory::Effects),
    ];

    /// Category of a well-formed code, `None` otherwise
    pub fn from_code(code: &str) -> Option<Self> {
        let digits = code.strip_prefix('E')?;
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let first = digits.chars().next()?;
        Self::ALL
            .iter()
            .find(|(digit, _)| *digit == first)
            .map(|(_, category)| *category)
    }
}

/// Codes emitted by the checker and what they mean
const STANDARD_CODES: &[(&str, &str)] = &[
    ("E3001", "invalid checker configuration"),
    ("E5001", "effect mismatch"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCodeInfo {
    pub category: ErrorCategory,
    pub description: String,
}

/// Known error codes, ordered by code
#[derive(Debug, Clone, Default)]
pub struct ErrorCodeRegistry {
    codes: BTreeMap<String, ErrorCodeInfo>,
}

impl ErrorCodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_standard_codes() -> Self {
        let mut registry = Self::new();
        for (code, description) in STANDARD_CODES {
            let registered = registry.register(*code, *description);
            debug_assert!(registered.is_ok(), "malformed standard code {}", code);
        }
        registry
    }

    pub fn register(
        &mut self,
        code: impl Into<String>,
        description: impl Into<String>,
    ) -> DiagnosticResult<()> {
        let code = code.into();
        let category =
            ErrorCategory::from_code(&code).ok_or_else(|| DiagnosticError::InvalidCode(code.clone()))?;
        self.codes.insert(
            code,
            ErrorCodeInfo {
                category,
                description: description.into(),
            },
        );
        Ok(())
    }

    pub fn get(&self, code: &str) -> Option<&ErrorCodeInfo> {
        self.codes.get(code)
    }

    pub fn codes_in_category(&self, category: ErrorCategory) -> impl Iterator<Item = &str> {
        self.codes
            .iter()
            .filter(move |(_, info)| info.category == category)
            .map(|(code, _)| code.as_str())
    }
}

pub type DiagnosticResult<T> = Result<T, DiagnosticError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticError {
    #[error("`{0}` is not an error code (expected E followed by four digits)")]
    InvalidCode(String),
}
