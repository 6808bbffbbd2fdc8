//! Two-point purity lattice: `Pure < Impure`.

use crate::domain::EffectDomain;
use purity_ast::{Decl, Program};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Purity {
    Pure,
    Impure,
}

impl fmt::Display for Purity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Purity::Pure => write!(f, "Pure"),
            Purity::Impure => write!(f, "Impure"),
        }
    }
}

/// Reads `@pure`, `@impure` and `@effect(...)`. Any non-empty effect list
/// counts as impure.
#[derive(Debug, Clone, Default)]
pub struct PurityDomain {
    builtins: FxHashMap<SmolStr, Purity>,
}

impl PurityDomain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the effect of every declaration called `name`, whatever its
    /// annotations say
    pub fn with_builtin(mut self, name: impl Into<SmolStr>, purity: Purity) -> Self {
        self.builtins.insert(name.into(), purity);
        self
    }
}

impl EffectDomain for PurityDomain {
    type Effect = Purity;

    fn bottom(&self) -> Purity {
        Purity::Pure
    }

    fn top(&self) -> Purity {
        Purity::Impure
    }

    fn join(&self, a: &Purity, b: &Purity) -> Purity {
        (*a).max(*b)
    }

    fn le(&self, a: &Purity, b: &Purity) -> bool {
        a <= b
    }

    fn default_invocation_effect(&self, _program: &Program, decl: &Decl) -> Option<Purity> {
        self.builtins.get(&decl.name).copied()
    }

    fn from_annotation(&self, _program: &Program, decl: &Decl) -> Option<Purity> {
        decl.annotations
            .iter()
            .filter_map(|annotation| match annotation.name.as_str() {
                "pure" => Some(Purity::Pure),
                "impure" => Some(Purity::Impure),
                "effect" if annotation.args.is_empty() => Some(Purity::Pure),
                "effect" => Some(Purity::Impure),
                _ => None,
            })
            .reduce(|a, b| self.join(&a, &b))
    }
}
