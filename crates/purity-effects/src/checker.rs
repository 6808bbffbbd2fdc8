//! Effect computation and conformance checking.
//!
//! [`EffectChecker::compute_effect`] is the single entry point of the
//! analysis. It dispatches on the expression kind, delegates invocations to
//! the resolver (`invocation.rs`) and declared effects to the expander
//! (`latent.rs`), both of which call back into it. Anything without special
//! meaning joins the effects of its immediate children, each computed through
//! `compute_effect` again, so the traversal only ever looks one level deep.

use crate::context::EffectContext;
use crate::domain::{Analyzer, EffectDomain};
use crate::invocation::{ArgBindings, DeferredEffects, Invocation};
use crate::relative::{Location, RelativeEnv};
use crate::reporter::{Mismatch, Reporter};
use purity_ast::{DeclId, DeclKind, Expr, ExprId, ExprKind, ParamRef, Program, Symbol};
use smol_str::SmolStr;
use tracing::{debug, warn};

pub struct EffectChecker<'p, D: EffectDomain, R> {
    pub(crate) program: &'p Program,
    pub(crate) domain: &'p D,
    reporter: R,
}

impl<'p, D, R> EffectChecker<'p, D, R>
where
    D: EffectDomain,
    R: Reporter<D::Effect>,
{
    pub fn new(program: &'p Program, domain: &'p D, reporter: R) -> Self {
        Self {
            program,
            domain,
            reporter,
        }
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn domain(&self) -> &'p D {
        self.domain
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Initial context for analyzing the body of `decl`: its declared effect
    /// is expected and its own relative effects are assumed.
    pub fn decl_context(&self, decl: DeclId, note: Option<SmolStr>) -> EffectContext<D::Effect> {
        let annotation = self.domain.annotation(self.program, self.program.decl(decl));
        EffectContext::new(Some(decl))
            .with_expected(annotation.effect)
            .with_relative_env(RelativeEnv::from_clauses(annotation.relative))
            .with_note(note)
    }

    /// Check the body of `decl` against its declared effect. Returns the
    /// effect of the body, or `None` when `decl` has no body.
    pub fn check_decl(&mut self, decl: DeclId, note: Option<SmolStr>) -> Option<D::Effect> {
        let body = self.program.decl(decl).body?;
        let ctx = self.decl_context(decl, note);
        Some(self.compute_effect(body, &ctx))
    }

    /// Compare `found` against the expected effect of `ctx`.
    ///
    /// A non-conforming effect is reported, the expression is marked
    /// erroneous and `bottom` is returned so enclosing expressions do not
    /// report the same problem again.
    pub fn check_conform(
        &mut self,
        found: D::Effect,
        expr: ExprId,
        ctx: &EffectContext<D::Effect>,
    ) -> D::Effect {
        let expected = match &ctx.expected {
            Some(expected) if !self.domain.le(&found, expected) => expected.clone(),
            _ => return found,
        };

        debug!(%expr, %expected, %found, "effect mismatch");
        self.reporter.issue_error(Mismatch {
            expected,
            found,
            expr,
            span: self.program.expr(expr).span,
            note: ctx.note.clone(),
        });
        self.reporter.mark_erroneous(expr);
        self.domain.bottom()
    }

    pub fn compute_effect(&mut self, expr: ExprId, ctx: &EffectContext<D::Effect>) -> D::Effect {
        let found = self.compute_raw_effect(expr, ctx);
        self.check_conform(found, expr, ctx)
    }

    /// Effect of `expr` before conformance checking. The domain gets the
    /// first say; the default dispatch handles everything it declines.
    pub fn compute_raw_effect(&mut self, expr: ExprId, ctx: &EffectContext<D::Effect>) -> D::Effect {
        let program = self.program;
        let domain = self.domain;
        let node = program.expr(expr);
        if let Some(effect) = domain.compute_raw_effect(self, node, ctx) {
            return effect;
        }
        self.default_raw_effect(node, ctx)
    }

    fn default_raw_effect(&mut self, node: &'p Expr, ctx: &EffectContext<D::Effect>) -> D::Effect {
        let program = self.program;

        if let Some(invocation) = Invocation::of(program, node) {
            return self.resolve_invocation(&invocation, ctx);
        }

        if let ExprKind::Call { fun, .. } = &node.kind {
            warn!(expr = %node.id, callee_ty = ?program.expr(*fun).ty, "cannot resolve invoked operation");
            return self.domain.top();
        }

        if let Some(decl) = accessed_decl(node) {
            if matches!(program.decl(decl).kind, DeclKind::Module | DeclKind::LazyValue) {
                return self.latent(decl, &ArgBindings::default(), &DeferredEffects::default(), ctx);
            }
        }

        if let Some(param) = self.by_name_access(node) {
            return if ctx.relative_env.mentions(Location::Param(param)) {
                self.domain.bottom()
            } else {
                self.domain.top()
            };
        }

        match &node.kind {
            ExprKind::Def(_) | ExprKind::Lambda(_) => self.domain.bottom(),
            ExprKind::ValDef { decl, .. } if program.decl(*decl).kind == DeclKind::LazyValue => {
                self.domain.bottom()
            }
            _ => {
                let children = node.children();
                let effects: Vec<D::Effect> = children
                    .into_iter()
                    .map(|child| self.compute_effect(child, ctx))
                    .collect();
                self.domain.join_all(effects)
            }
        }
    }

    /// The by-name parameter `node` forces, either directly or through a
    /// field mirroring a by-name constructor parameter.
    fn by_name_access(&self, node: &Expr) -> Option<ParamRef> {
        match &node.kind {
            ExprKind::Ref(Symbol::Param(param)) => self
                .program
                .param(*param)
                .filter(|p| p.by_name)
                .map(|_| *param),
            ExprKind::Ref(Symbol::Decl(field)) => self.program.mirrored_by_name_param(*field),
            ExprKind::Select { recv, member } => match self.program.expr(*recv).kind {
                ExprKind::This => self.program.mirrored_by_name_param(*member),
                _ => None,
            },
            _ => None,
        }
    }

    /// Location `expr` denotes when it is a plain reference to a parameter
    /// or to the receiver of the enclosing declaration.
    pub(crate) fn location_of(&self, expr: ExprId, ctx: &EffectContext<D::Effect>) -> Option<Location> {
        match &self.program.expr(expr).kind {
            ExprKind::Ref(Symbol::Param(param)) => Some(Location::Param(*param)),
            ExprKind::This => ctx.enclosing.map(Location::This),
            _ => None,
        }
    }
}

impl<'p, D, R> Analyzer<D::Effect> for EffectChecker<'p, D, R>
where
    D: EffectDomain,
    R: Reporter<D::Effect>,
{
    fn program(&self) -> &Program {
        self.program
    }

    fn compute_effect(&mut self, expr: ExprId, ctx: &EffectContext<D::Effect>) -> D::Effect {
        EffectChecker::compute_effect(self, expr, ctx)
    }
}

/// Declaration a non-invoking reference reads
fn accessed_decl(node: &Expr) -> Option<DeclId> {
    match &node.kind {
        ExprKind::Ref(Symbol::Decl(decl)) => Some(*decl),
        ExprKind::Select { member, .. } => Some(*member),
        _ => None,
    }
}
