//! The effect domain contract.
//!
//! The engine is generic over the lattice it computes in. An [`EffectDomain`]
//! supplies the lattice primitives, reads declared effects off annotations and
//! may take over the effect of expression kinds it gives special meaning to.

use crate::context::EffectContext;
use crate::relative::{self, RelativeEffect};
use purity_ast::{Decl, Expr, ExprId, Program};
use std::fmt;

/// Declared effect of a declaration together with its relative effects
#[derive(Debug, Clone, PartialEq)]
pub struct EffectAnnotation<E> {
    /// `None` when the declaration carries no effect annotation
    pub effect: Option<E>,
    pub relative: Vec<RelativeEffect>,
}

/// Callback into the running analysis, handed to
/// [`EffectDomain::compute_raw_effect`] so domain-specific expression kinds
/// can recurse into their children.
pub trait Analyzer<E> {
    fn program(&self) -> &Program;

    fn compute_effect(&mut self, expr: ExprId, ctx: &EffectContext<E>) -> E;
}

pub trait EffectDomain {
    type Effect: Clone + PartialEq + fmt::Debug + fmt::Display;

    fn bottom(&self) -> Self::Effect;

    fn top(&self) -> Self::Effect;

    fn join(&self, a: &Self::Effect, b: &Self::Effect) -> Self::Effect;

    /// Lattice order: `a` is at most as effectful as `b`
    fn le(&self, a: &Self::Effect, b: &Self::Effect) -> bool;

    fn join_all<I>(&self, effects: I) -> Self::Effect
    where
        I: IntoIterator<Item = Self::Effect>,
    {
        effects
            .into_iter()
            .fold(self.bottom(), |acc, e| self.join(&acc, &e))
    }

    /// Built-in effect of `decl`, overriding whatever it is annotated with.
    /// Used for primitives whose effect the domain knows better than any
    /// annotation could state.
    fn default_invocation_effect(&self, _program: &Program, _decl: &Decl) -> Option<Self::Effect> {
        None
    }

    /// Effect declared by `decl`'s annotations, if it has any
    fn from_annotation(&self, program: &Program, decl: &Decl) -> Option<Self::Effect>;

    /// Latent effect assumed for declarations without an effect annotation
    fn unannotated_effect(&self) -> Self::Effect {
        self.top()
    }

    fn relative_effects_of(&self, _program: &Program, decl: &Decl) -> Vec<RelativeEffect> {
        relative::parse_relative_annotations(decl)
    }

    /// Whether assuming `assumed` discharges `obligation`. By default a
    /// clause without a target covers every operation at its location.
    fn implies(&self, assumed: &RelativeEffect, obligation: &RelativeEffect) -> bool {
        assumed.location == obligation.location && assumed.target.is_none()
    }

    /// Full effect signature of `decl`. Relative effects without an effect
    /// annotation declare nothing beyond themselves, so the concrete part
    /// is `bottom`.
    fn annotation(&self, program: &Program, decl: &Decl) -> EffectAnnotation<Self::Effect> {
        let relative = self.relative_effects_of(program, decl);
        let effect = self
            .from_annotation(program, decl)
            .or_else(|| (!relative.is_empty()).then(|| self.bottom()));
        EffectAnnotation { effect, relative }
    }

    /// Hook for domain-specific expression kinds. Returning `None` falls
    /// back to the engine's default dispatch.
    fn compute_raw_effect(
        &self,
        _analyzer: &mut dyn Analyzer<Self::Effect>,
        _expr: &Expr,
        _ctx: &EffectContext<Self::Effect>,
    ) -> Option<Self::Effect> {
        None
    }
}
