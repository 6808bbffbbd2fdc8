use crate::relative::{RelativeEffect, RelativeEnv};
use purity_ast::DeclId;
use smol_str::SmolStr;
use std::rc::Rc;

/// Immutable state threaded through one traversal.
///
/// Every recursive step that needs a different expected effect or relative
/// environment derives a new context; nothing is mutated in place.
#[derive(Debug, Clone)]
pub struct EffectContext<E> {
    /// Effect the current expression must conform to, if any
    pub expected: Option<E>,
    pub relative_env: Rc<RelativeEnv>,
    /// Declaration whose body is being analyzed; `this` refers to its
    /// receiver
    pub enclosing: Option<DeclId>,
    /// Extra text attached to every mismatch reported under this context
    pub note: Option<SmolStr>,
}

impl<E: Clone> EffectContext<E> {
    pub fn new(enclosing: Option<DeclId>) -> Self {
        Self {
            expected: None,
            relative_env: Rc::new(RelativeEnv::new()),
            enclosing,
            note: None,
        }
    }

    pub fn with_expected(&self, expected: Option<E>) -> Self {
        Self {
            expected,
            ..self.clone()
        }
    }

    pub fn without_expected(&self) -> Self {
        self.with_expected(None)
    }

    pub fn with_relative_env(&self, env: RelativeEnv) -> Self {
        Self {
            relative_env: Rc::new(env),
            ..self.clone()
        }
    }

    /// Also assume `clause` from here on
    pub fn assuming(&self, clause: RelativeEffect) -> Self {
        if self.relative_env.contains(&clause) {
            return self.clone();
        }
        self.with_relative_env(self.relative_env.with(clause))
    }

    pub fn with_note(&self, note: Option<SmolStr>) -> Self {
        Self {
            note,
            ..self.clone()
        }
    }
}
