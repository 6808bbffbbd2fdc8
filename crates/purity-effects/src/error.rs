//! Errors raised by effect checking, annotation parsing and configuration.

use purity_ast::Span;
use purity_diagnostics::span::SourceSpan;
use purity_diagnostics::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Errors reported by the effect checker
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffectError {
    #[error("Effect mismatch: expected {expected}, found {found}")]
    Mismatch {
        expected: String,
        found: String,
        span: Span,
        note: Option<String>,
    },
}

impl EffectError {
    pub fn span(&self) -> Span {
        match self {
            EffectError::Mismatch { span, .. } => *span,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            EffectError::Mismatch { .. } => "E5001",
        }
    }

    /// Convert into a renderable diagnostic pointing into `file`.
    pub fn to_diagnostic(&self, file: &Path) -> Diagnostic {
        match self {
            EffectError::Mismatch {
                expected,
                found,
                span,
                note,
            } => {
                let diag = Diagnostic::error("effect mismatch")
                    .with_code(self.code())
                    .with_primary_span(
                        SourceSpan::new(file, span.start, span.end),
                        format!("expected `{}`, found `{}`", expected, found),
                    );
                match note {
                    Some(note) => diag.with_note(note.clone()),
                    None => diag,
                }
            }
        }
    }
}

/// A `@rel(...)` argument that could not be turned into a relative effect
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    #[error("empty relative effect")]
    Empty,

    #[error("`{0}` is not a parameter of `{1}`")]
    UnknownParameter(String, String),

    #[error("malformed relative effect `{0}`")]
    Malformed(String),
}

/// Errors loading an [`AnalysisConfig`](crate::AnalysisConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        "E3001"
    }

    /// Convert into a diagnostic about the configuration file `file`.
    pub fn to_diagnostic(&self, file: &Path) -> Diagnostic {
        Diagnostic::error("invalid checker configuration")
            .with_code(self.code())
            .with_note(format!("while loading `{}`: {}", file.display(), self))
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use purity_diagnostics::{DiagnosticSeverity, ErrorCategory, ErrorCodeRegistry};

    #[test]
    fn test_mismatch_display() {
        let err = EffectError::Mismatch {
            expected: "Pure".into(),
            found: "IO".into(),
            span: Span::new(3, 9),
            note: None,
        };
        assert_eq!(err.to_string(), "Effect mismatch: expected Pure, found IO");
        assert_eq!(err.span(), Span::new(3, 9));
    }

    #[test]
    fn test_mismatch_to_diagnostic() {
        let err = EffectError::Mismatch {
            expected: "Pure".into(),
            found: "IO".into(),
            span: Span::new(3, 9),
            note: Some("while checking `main`".into()),
        };
        let diag = err.to_diagnostic(Path::new("main.pur"));

        assert_eq!(diag.severity, DiagnosticSeverity::Error);
        assert_eq!(diag.code.as_deref(), Some("E5001"));
        assert_eq!(diag.spans.labels()[0].message, "expected `Pure`, found `IO`");
        assert_eq!(diag.children[0].message, "while checking `main`");
    }

    #[test]
    fn test_config_error_to_diagnostic() {
        let err = "exclude = 3".parse::<crate::AnalysisConfig>().unwrap_err();
        let diag = err.to_diagnostic(Path::new("purity.toml"));

        assert_eq!(diag.code.as_deref(), Some("E3001"));
        assert_eq!(diag.message, "invalid checker configuration");
        assert!(diag.children[0].message.starts_with("while loading `purity.toml`: invalid configuration"));
        assert!(diag.spans.is_empty());

        let registry = ErrorCodeRegistry::with_standard_codes();
        let category = registry.get(err.code()).map(|info| info.category);
        assert_eq!(category, Some(ErrorCategory::Configuration));
    }

    #[test]
    fn test_mismatch_code_is_registered() {
        let err = EffectError::Mismatch {
            expected: "Pure".into(),
            found: "IO".into(),
            span: Span::dummy(),
            note: None,
        };
        let registry = ErrorCodeRegistry::with_standard_codes();
        let info = registry.get(err.code()).map(|info| info.category);
        assert_eq!(info, Some(ErrorCategory::Effects));
    }
}
