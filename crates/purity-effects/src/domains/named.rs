//! Sets of named effects such as `IO` or `Console`, with an `Any` element
//! above every set.

use crate::context::EffectContext;
use crate::domain::{Analyzer, EffectDomain};
use indexmap::IndexSet;
use purity_ast::{Decl, Expr, ExprKind, Program};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::fmt;
use tracing::warn;

/// Effect raised by `throw`
pub const THROW: &str = "Throw";

/// Annotation argument standing for every effect
pub const ANY: &str = "Any";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamedEffects {
    /// Exactly these effects; empty is pure
    Known(IndexSet<SmolStr>),
    /// Possibly anything
    Any,
}

impl NamedEffects {
    pub fn pure() -> Self {
        NamedEffects::Known(IndexSet::new())
    }

    pub fn of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        NamedEffects::Known(names.into_iter().map(Into::into).collect())
    }

    pub fn is_pure(&self) -> bool {
        matches!(self, NamedEffects::Known(effects) if effects.is_empty())
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            NamedEffects::Known(effects) => effects.contains(name),
            NamedEffects::Any => true,
        }
    }

    pub fn union(&self, other: &NamedEffects) -> NamedEffects {
        match (self, other) {
            (NamedEffects::Known(a), NamedEffects::Known(b)) => {
                NamedEffects::Known(a.union(b).cloned().collect())
            }
            _ => NamedEffects::Any,
        }
    }

    pub fn is_subset(&self, other: &NamedEffects) -> bool {
        match (self, other) {
            (_, NamedEffects::Any) => true,
            (NamedEffects::Any, NamedEffects::Known(_)) => false,
            (NamedEffects::Known(a), NamedEffects::Known(b)) => a.is_subset(b),
        }
    }
}

impl fmt::Display for NamedEffects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamedEffects::Any => write!(f, "{}", ANY),
            NamedEffects::Known(effects) if effects.is_empty() => write!(f, "Pure"),
            NamedEffects::Known(effects) => {
                let mut names: Vec<&SmolStr> = effects.iter().collect();
                names.sort();
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", name)?;
                }
                Ok(())
            }
        }
    }
}

/// Reads `@pure` and `@effect(IO, Console)`.
///
/// With a registry of known effect names, an annotation naming anything else
/// is treated as `Any`.
#[derive(Debug, Clone, Default)]
pub struct NamedEffectDomain {
    builtins: FxHashMap<SmolStr, NamedEffects>,
    known: Option<IndexSet<SmolStr>>,
}

impl NamedEffectDomain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin(mut self, name: impl Into<SmolStr>, effects: NamedEffects) -> Self {
        self.builtins.insert(name.into(), effects);
        self
    }

    /// Restrict annotations to these effect names (`Throw` is always known)
    pub fn with_known_effects<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        let mut known: IndexSet<SmolStr> = names.into_iter().map(Into::into).collect();
        known.insert(SmolStr::new(THROW));
        self.known = Some(known);
        self
    }

    fn effect_named(&self, decl: &Decl, name: &str) -> NamedEffects {
        if name == ANY {
            return NamedEffects::Any;
        }
        match &self.known {
            Some(known) if !known.contains(name) => {
                warn!(decl = %decl.name, effect = name, "unknown effect name");
                NamedEffects::Any
            }
            _ => NamedEffects::of([name]),
        }
    }
}

impl EffectDomain for NamedEffectDomain {
    type Effect = NamedEffects;

    fn bottom(&self) -> NamedEffects {
        NamedEffects::pure()
    }

    fn top(&self) -> NamedEffects {
        NamedEffects::Any
    }

    fn join(&self, a: &NamedEffects, b: &NamedEffects) -> NamedEffects {
        a.union(b)
    }

    fn le(&self, a: &NamedEffects, b: &NamedEffects) -> bool {
        a.is_subset(b)
    }

    fn default_invocation_effect(&self, _program: &Program, decl: &Decl) -> Option<NamedEffects> {
        self.builtins.get(&decl.name).cloned()
    }

    fn from_annotation(&self, _program: &Program, decl: &Decl) -> Option<NamedEffects> {
        decl.annotations
            .iter()
            .filter_map(|annotation| match annotation.name.as_str() {
                "pure" => Some(NamedEffects::pure()),
                "effect" => Some(
                    annotation
                        .args
                        .iter()
                        .map(|name| self.effect_named(decl, name.trim()))
                        .fold(NamedEffects::pure(), |acc, e| acc.union(&e)),
                ),
                _ => None,
            })
            .reduce(|a, b| a.union(&b))
    }

    /// `throw e` raises `Throw` on top of whatever evaluating `e` does
    fn compute_raw_effect(
        &self,
        analyzer: &mut dyn Analyzer<NamedEffects>,
        expr: &Expr,
        ctx: &EffectContext<NamedEffects>,
    ) -> Option<NamedEffects> {
        match expr.kind {
            ExprKind::Throw(value) => {
                let operand = analyzer.compute_effect(value, ctx);
                Some(operand.union(&NamedEffects::of([THROW])))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use purity_ast::{Annotation, DeclKind, ProgramBuilder};

    fn samples() -> Vec<NamedEffects> {
        vec![
            NamedEffects::pure(),
            NamedEffects::of(["IO"]),
            NamedEffects::of(["Console"]),
            NamedEffects::of(["IO", "Console"]),
            NamedEffects::Any,
        ]
    }

    #[test]
    fn test_lattice_laws() {
        let domain = NamedEffectDomain::new();
        for a in samples() {
            assert!(domain.le(&domain.bottom(), &a));
            assert!(domain.le(&a, &domain.top()));
            assert_eq!(domain.join(&a, &a), a);
            assert_eq!(domain.join(&a, &domain.bottom()), a);
            for b in samples() {
                let joined = domain.join(&a, &b);
                assert_eq!(joined, domain.join(&b, &a));
                assert!(domain.le(&a, &joined));
                assert!(domain.le(&b, &joined));
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(NamedEffects::pure().to_string(), "Pure");
        assert_eq!(NamedEffects::of(["IO", "Console"]).to_string(), "Console, IO");
        assert_eq!(NamedEffects::Any.to_string(), "Any");
    }

    #[test]
    fn test_set_equality_ignores_order() {
        assert_eq!(NamedEffects::of(["IO", "Console"]), NamedEffects::of(["Console", "IO"]));
        assert!(!NamedEffects::Any.is_subset(&NamedEffects::of(["IO"])));
        assert!(NamedEffects::Any.contains(THROW));
    }

    #[test]
    fn test_annotations() {
        let mut b = ProgramBuilder::new();
        let print = b.declare(DeclKind::Operation, "print");
        b.annotate(print, Annotation::new("effect", ["IO", "Console"]));
        let len = b.declare(DeclKind::Operation, "len");
        b.annotate(len, Annotation::marker("pure"));
        let odd = b.declare(DeclKind::Operation, "odd");
        b.annotate(odd, Annotation::new("effect", ["Telepathy"]));
        let bare = b.declare(DeclKind::Operation, "bare");
        let program = b.finish();

        let domain = NamedEffectDomain::new().with_known_effects(["IO", "Console"]);
        let effect = |decl| domain.from_annotation(&program, program.decl(decl));
        assert_eq!(effect(print), Some(NamedEffects::of(["IO", "Console"])));
        assert_eq!(effect(len), Some(NamedEffects::pure()));
        assert_eq!(effect(odd), Some(NamedEffects::Any));
        assert_eq!(effect(bare), None);

        let open = NamedEffectDomain::new();
        assert_eq!(
            open.from_annotation(&program, program.decl(odd)),
            Some(NamedEffects::of(["Telepathy"]))
        );
    }
}
