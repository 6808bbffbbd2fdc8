//! Latent effects and their expansion at call sites.
//!
//! The latent effect of a declaration is the most it may do when invoked:
//! its declared effect joined with one contribution per relative effect.
//! Relative effects are resolved against what the call site actually
//! passes, so handing a pure function to `map` makes the call pure.
//!
//! Expansion is cut off by assumption: a relative effect already in the
//! environment contributes nothing, and each one being expanded is assumed
//! while its target is expanded. Recursive and mutually recursive relative
//! effects therefore terminate, at the price of under-approximating them
//! (no fixpoint is computed).

use crate::checker::EffectChecker;
use crate::context::EffectContext;
use crate::domain::EffectDomain;
use crate::invocation::{ArgBindings, DeferredEffects};
use crate::relative::{Location, RelativeEffect};
use crate::reporter::Reporter;
use purity_ast::{Decl, DeclId, DeclKind, Ty};
use tracing::{debug, warn};

impl<'p, D, R> EffectChecker<'p, D, R>
where
    D: EffectDomain,
    R: Reporter<D::Effect>,
{
    /// Maximal effect of invoking `decl` with the given bindings.
    pub fn latent(
        &mut self,
        decl: DeclId,
        bindings: &ArgBindings,
        deferred: &DeferredEffects<D::Effect>,
        ctx: &EffectContext<D::Effect>,
    ) -> D::Effect {
        let program = self.program;
        let domain = self.domain;
        let decl = program.decl(decl);

        if let Some(effect) = domain.default_invocation_effect(program, decl) {
            return effect;
        }

        let annotation = domain.annotation(program, decl);
        let mut effect = match annotation.effect {
            Some(effect) => effect,
            None if infers_from_body(decl) => self.inferred_effect(decl, ctx),
            None => domain.unannotated_effect(),
        };

        for clause in &annotation.relative {
            let contribution = self.expand_clause(clause, bindings, deferred, ctx);
            effect = domain.join(&effect, &contribution);
        }
        debug!(decl = %decl.name, %effect, "latent effect");
        effect
    }

    /// Effect of evaluating the body of `decl`. The receiver of `decl` is
    /// assumed while its body is analyzed, so an initializer reading itself
    /// contributes nothing the second time round.
    fn inferred_effect(&mut self, decl: &Decl, ctx: &EffectContext<D::Effect>) -> D::Effect {
        let Some(body) = decl.body else {
            return self.domain.unannotated_effect();
        };
        let itself = RelativeEffect::whole(Location::This(decl.id));
        if ctx.relative_env.contains(&itself) {
            debug!(decl = %decl.name, "recursive initializer");
            return self.domain.bottom();
        }
        self.compute_effect(body, &ctx.assuming(itself).without_expected())
    }

    fn expand_clause(
        &mut self,
        clause: &RelativeEffect,
        bindings: &ArgBindings,
        deferred: &DeferredEffects<D::Effect>,
        ctx: &EffectContext<D::Effect>,
    ) -> D::Effect {
        let program = self.program;
        let domain = self.domain;

        if ctx.relative_env.subsumes(clause, domain) {
            debug!(clause = %clause.describe(program), "relative effect discharged");
            return domain.bottom();
        }

        if let Location::Param(param) = clause.location {
            let by_name = program.param(param).map_or(false, |p| p.by_name);
            if by_name && clause.target.is_none() {
                return deferred.get(&param).cloned().unwrap_or_else(|| domain.top());
            }
        }

        let declared = self.location_type(clause.location);
        let target = clause.target.clone().or_else(|| {
            declared
                .as_ref()
                .and_then(|ty| program.function_operation(ty))
                .cloned()
        });
        let Some(target) = target else {
            // No operation to expand against.
            debug!(clause = %clause.describe(program), "relative effect without target");
            return domain.top();
        };

        let assumed = ctx.assuming(clause.clone());
        let receiver_ty = match bindings.get(&clause.location) {
            Some(binding) => {
                if let Some(location) = binding.location {
                    let forwarded = RelativeEffect::on(location, target.clone());
                    if ctx.relative_env.subsumes(&forwarded, domain) {
                        debug!(clause = %clause.describe(program), "argument forwards an assumed relative effect");
                        return domain.bottom();
                    }
                }
                Some(binding.ty.clone())
            }
            None => declared,
        };

        match receiver_ty.and_then(|ty| program.resolve_member(&ty, &target)) {
            Some(resolved) => self.latent(
                resolved.decl(),
                &ArgBindings::default(),
                &DeferredEffects::default(),
                &assumed,
            ),
            None => {
                warn!(clause = %clause.describe(program), %target, "cannot resolve relative effect target");
                domain.top()
            }
        }
    }

    /// Declared type of the value at `location`
    fn location_type(&self, location: Location) -> Option<Ty> {
        match location {
            Location::Param(param) => self.program.param(param).map(|p| p.ty.clone()),
            Location::This(decl) => self.program.decl(decl).owner.map(Ty::Named),
        }
    }
}

/// Function literals, lazy values and modules are not annotated at their
/// definition; their latent effect is that of their body.
fn infers_from_body(decl: &Decl) -> bool {
    decl.anonymous || matches!(decl.kind, DeclKind::LazyValue | DeclKind::Module)
}
