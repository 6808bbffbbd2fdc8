//! Effect of invoking a declaration.
//!
//! An invocation costs the effect of evaluating its receiver, plus the
//! effects of its strict arguments, plus the latent effect of the invoked
//! declaration specialized to the arguments actually passed. By-name
//! arguments are not charged here: their effects are handed to the latent
//! expansion, which charges them only where a relative effect asks for them.

use crate::checker::EffectChecker;
use crate::context::EffectContext;
use crate::domain::EffectDomain;
use crate::relative::{Location, RelativeEffect};
use crate::reporter::Reporter;
use purity_ast::{DeclId, Expr, ExprId, ExprKind, ParamRef, Program, Symbol, Ty};
use rustc_hash::FxHashMap;
use tracing::debug;

/// What the expander knows about the value bound to a location at a call
/// site
#[derive(Debug, Clone, PartialEq)]
pub struct ArgBinding {
    /// Static type of the argument expression
    pub ty: Ty,
    /// Set when the argument is itself a parameter or the receiver of the
    /// enclosing declaration
    pub location: Option<Location>,
}

pub type ArgBindings = FxHashMap<Location, ArgBinding>;

/// Effects of by-name arguments, keyed by the formal parameter
pub type DeferredEffects<E> = FxHashMap<ParamRef, E>;

/// An invocation-like expression seen uniformly
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub expr: ExprId,
    pub decl: DeclId,
    pub recv: Option<ExprId>,
    /// Arguments with all groups flattened
    pub args: Vec<ExprId>,
}

impl Invocation {
    /// Recognize calls (with or without type arguments), references to
    /// callable members, and bare references to parameterless callables.
    ///
    /// A call whose callee is a function value rather than a declaration,
    /// such as `f()` on a function-typed parameter, invokes the function
    /// operation of the callee's static type with the callee as receiver.
    /// `None` for such a call means that operation could not be resolved.
    pub fn of(program: &Program, node: &Expr) -> Option<Self> {
        let callable = |decl: DeclId| program.decl(decl).kind.is_callable();
        match &node.kind {
            ExprKind::Call { fun, args, .. } => {
                let (decl, recv) = match program.expr(*fun).kind {
                    ExprKind::Select { recv, member } if callable(member) => (member, Some(recv)),
                    ExprKind::Ref(Symbol::Decl(decl)) if callable(decl) => (decl, None),
                    _ => (function_value_operation(program, *fun)?, Some(*fun)),
                };
                Some(Self {
                    expr: node.id,
                    decl,
                    recv,
                    args: args.iter().flatten().copied().collect(),
                })
            }
            ExprKind::Select { recv, member } if callable(*member) => Some(Self {
                expr: node.id,
                decl: *member,
                recv: Some(*recv),
                args: Vec::new(),
            }),
            ExprKind::Ref(Symbol::Decl(decl))
                if callable(*decl) && program.decl(*decl).is_parameterless() =>
            {
                Some(Self {
                    expr: node.id,
                    decl: *decl,
                    recv: None,
                    args: Vec::new(),
                })
            }
            _ => None,
        }
    }
}

/// The operation invoked by applying the function value `fun`
fn function_value_operation(program: &Program, fun: ExprId) -> Option<DeclId> {
    let ty = &program.expr(fun).ty;
    let name = program.function_operation(ty)?;
    program.resolve_member(ty, name).map(|member| member.decl())
}

impl<'p, D, R> EffectChecker<'p, D, R>
where
    D: EffectDomain,
    R: Reporter<D::Effect>,
{
    pub fn resolve_invocation(
        &mut self,
        invocation: &Invocation,
        ctx: &EffectContext<D::Effect>,
    ) -> D::Effect {
        let program = self.program;
        let domain = self.domain;
        let decl = program.decl(invocation.decl);

        let fun_effect = match invocation.recv {
            Some(recv) => self.compute_effect(recv, ctx),
            None => domain.bottom(),
        };

        let (deferred, eager): (Vec<_>, Vec<_>) = decl
            .param_refs()
            .zip(invocation.args.iter().copied())
            .partition(|((_, param), _)| param.by_name);

        // Arguments beyond the formal parameters (varargs) are evaluated
        // strictly.
        let surplus = invocation.args.iter().skip(decl.param_count()).copied();
        let eager_effects: Vec<D::Effect> = eager
            .iter()
            .map(|(_, arg)| *arg)
            .chain(surplus)
            .map(|arg| self.compute_effect(arg, ctx))
            .collect();
        let eager_effect = domain.join_all(eager_effects);

        let deferred_ctx = ctx.without_expected();
        let deferred_effects: DeferredEffects<D::Effect> = deferred
            .iter()
            .map(|((param, _), arg)| (*param, self.compute_effect(*arg, &deferred_ctx)))
            .collect();

        let latent_effect = if self.is_covered(invocation, ctx) {
            debug!(callee = %decl.name, "invocation covered by an assumed relative effect");
            domain.bottom()
        } else {
            let bindings = self.argument_bindings(invocation, ctx);
            self.latent(invocation.decl, &bindings, &deferred_effects, ctx)
        };

        domain.join(&domain.join(&fun_effect, &eager_effect), &latent_effect)
    }

    /// `recv.m(...)` where `(location of recv, m)` is already assumed. The
    /// enclosing declaration has promised to charge it at its own call
    /// sites.
    fn is_covered(&self, invocation: &Invocation, ctx: &EffectContext<D::Effect>) -> bool {
        let Some(location) = invocation.recv.and_then(|recv| self.location_of(recv, ctx)) else {
            return false;
        };
        let name = self.program.decl(invocation.decl).name.clone();
        ctx.relative_env
            .subsumes(&RelativeEffect::on(location, name), self.domain)
    }

    /// Bind every formal parameter, and the receiver, of the invoked
    /// declaration to what was passed for it.
    fn argument_bindings(&self, invocation: &Invocation, ctx: &EffectContext<D::Effect>) -> ArgBindings {
        let program = self.program;
        let bind = |arg: ExprId| ArgBinding {
            ty: program.expr(arg).ty.clone(),
            location: self.location_of(arg, ctx),
        };

        let mut bindings: ArgBindings = program
            .decl(invocation.decl)
            .param_refs()
            .zip(invocation.args.iter().copied())
            .map(|((param, _), arg)| (Location::Param(param), bind(arg)))
            .collect();
        if let Some(recv) = invocation.recv {
            bindings.insert(Location::This(invocation.decl), bind(recv));
        }
        bindings
    }
}
