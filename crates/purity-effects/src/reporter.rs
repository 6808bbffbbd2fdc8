//! Diagnostic sinks for effect mismatches.

use crate::error::EffectError;
use purity_ast::{ExprId, Span};
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use std::fmt;

/// An inferred effect that does not conform to the expected one
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch<E> {
    pub expected: E,
    pub found: E,
    pub expr: ExprId,
    pub span: Span,
    pub note: Option<SmolStr>,
}

impl<E: fmt::Display> Mismatch<E> {
    pub fn to_error(&self) -> EffectError {
        EffectError::Mismatch {
            expected: self.expected.to_string(),
            found: self.found.to_string(),
            span: self.span,
            note: self.note.as_ref().map(|n| n.to_string()),
        }
    }
}

/// Receives mismatches as the checker finds them.
///
/// Marking an expression erroneous lets later consumers skip diagnostics
/// that would only echo the one already issued.
pub trait Reporter<E> {
    fn issue_error(&mut self, mismatch: Mismatch<E>);

    fn mark_erroneous(&mut self, expr: ExprId);

    fn is_erroneous(&self, expr: ExprId) -> bool;
}

/// Reporter that keeps everything in memory for the caller to inspect
#[derive(Debug, Clone)]
pub struct CollectingReporter<E> {
    mismatches: Vec<Mismatch<E>>,
    erroneous: FxHashSet<ExprId>,
}

impl<E> CollectingReporter<E> {
    pub fn new() -> Self {
        Self {
            mismatches: Vec::new(),
            erroneous: FxHashSet::default(),
        }
    }

    pub fn mismatches(&self) -> &[Mismatch<E>] {
        &self.mismatches
    }

    pub fn erroneous(&self) -> &FxHashSet<ExprId> {
        &self.erroneous
    }

    pub fn has_errors(&self) -> bool {
        !self.mismatches.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Mismatch<E>>, FxHashSet<ExprId>) {
        (self.mismatches, self.erroneous)
    }
}

impl<E: fmt::Display> CollectingReporter<E> {
    pub fn errors(&self) -> Vec<EffectError> {
        self.mismatches.iter().map(Mismatch::to_error).collect()
    }
}

impl<E> Default for CollectingReporter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Reporter<E> for CollectingReporter<E> {
    fn issue_error(&mut self, mismatch: Mismatch<E>) {
        self.mismatches.push(mismatch);
    }

    fn mark_erroneous(&mut self, expr: ExprId) {
        self.erroneous.insert(expr);
    }

    fn is_erroneous(&self, expr: ExprId) -> bool {
        self.erroneous.contains(&expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_reporter() {
        let mut reporter = CollectingReporter::new();
        assert!(!reporter.has_errors());

        reporter.issue_error(Mismatch {
            expected: "Pure",
            found: "IO",
            expr: ExprId(4),
            span: Span::new(1, 2),
            note: Some("in `main`".into()),
        });
        reporter.mark_erroneous(ExprId(4));

        assert!(reporter.has_errors());
        assert!(reporter.is_erroneous(ExprId(4)));
        assert!(!reporter.is_erroneous(ExprId(5)));
        assert_eq!(
            reporter.errors(),
            vec![EffectError::Mismatch {
                expected: "Pure".into(),
                found: "IO".into(),
                span: Span::new(1, 2),
                note: Some("in `main`".into()),
            }]
        );
    }
}
