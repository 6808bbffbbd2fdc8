//! Incremental construction of resolved programs.
//!
//! Front ends and tests assemble a [`Program`] bottom-up: declare types and
//! declarations first, then build expressions that refer to them, then attach
//! bodies. Ids handed out by the builder stay valid in the finished program.

use crate::{
    Annotation, BinOp, Decl, DeclId, DeclKind, Expr, ExprId, ExprKind, Literal, MatchArm, Param,
    ParamRef, Program, SmolStr, Span, Symbol, Ty, TypeDef, TypeId, TypeKind, UnOp,
};
use indexmap::IndexMap;

/// A function literal under construction
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    /// Synthesized `apply` operation holding the literal's body
    pub apply: DeclId,
    /// Anonymous class the literal instantiates
    pub ty: TypeId,
    pub params: Vec<ParamRef>,
}

#[derive(Debug, Default)]
pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Program {
        self.program
    }

    /// Read access to what has been built so far
    pub fn program(&self) -> &Program {
        &self.program
    }

    // ------------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------------

    pub fn declare_type(
        &mut self,
        kind: TypeKind,
        name: impl Into<SmolStr>,
        parent: Option<TypeId>,
    ) -> TypeId {
        let id = TypeId(self.program.types.len() as u32);
        self.program.types.push(TypeDef {
            id,
            name: name.into(),
            kind,
            parent,
            members: IndexMap::new(),
            primary_ctor: None,
            span: Span::dummy(),
        });
        id
    }

    pub fn set_primary_ctor(&mut self, ty: TypeId, ctor: DeclId) {
        self.program.types[ty.index()].primary_ctor = Some(ctor);
    }

    /// Declare a function trait with a single abstract `apply` operation
    pub fn function_type(&mut self, name: impl Into<SmolStr>) -> TypeId {
        let ty = self.declare_type(TypeKind::Function, name, None);
        let apply = self.declare_member(ty, DeclKind::Operation, "apply");
        self.param_group(apply);
        ty
    }

    /// Declare a singleton: its type and the module declaration accessing it
    pub fn module(&mut self, name: impl Into<SmolStr>) -> (TypeId, DeclId) {
        let name = name.into();
        let ty = self.declare_type(TypeKind::Module, name.clone(), None);
        let decl = self.declare(DeclKind::Module, name);
        self.set_result(decl, Ty::Named(ty));
        (ty, decl)
    }

    // ------------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------------

    /// Declare a top-level or local declaration
    pub fn declare(&mut self, kind: DeclKind, name: impl Into<SmolStr>) -> DeclId {
        let id = DeclId(self.program.decls.len() as u32);
        self.program.decls.push(Decl {
            id,
            name: name.into(),
            kind,
            owner: None,
            param_groups: Vec::new(),
            result: Ty::Unit,
            body: None,
            annotations: Vec::new(),
            overrides: None,
            anonymous: false,
            span: Span::dummy(),
        });
        id
    }

    /// Declare a member of `owner`. A member of the same name on a supertype
    /// is recorded as overridden.
    pub fn declare_member(
        &mut self,
        owner: TypeId,
        kind: DeclKind,
        name: impl Into<SmolStr>,
    ) -> DeclId {
        let name = name.into();
        let overrides = self.program.type_def(owner).parent.and_then(|parent| {
            self.program
                .ancestors(parent)
                .find_map(|def| def.members.get(&name).copied())
        });
        let id = self.declare(kind, name.clone());
        let decl = &mut self.program.decls[id.index()];
        decl.owner = Some(owner);
        decl.overrides = overrides;
        self.program.types[owner.index()].members.insert(name, id);
        id
    }

    /// Start a new parameter group
    pub fn param_group(&mut self, decl: DeclId) {
        self.program.decls[decl.index()].param_groups.push(Vec::new());
    }

    pub fn param(&mut self, decl: DeclId, name: impl Into<SmolStr>, ty: Ty) -> ParamRef {
        self.push_param(decl, Param::new(name, ty))
    }

    pub fn by_name_param(&mut self, decl: DeclId, name: impl Into<SmolStr>, ty: Ty) -> ParamRef {
        self.push_param(decl, Param::by_name(name, ty))
    }

    /// Append to the last parameter group, opening one if needed
    pub fn push_param(&mut self, decl: DeclId, param: Param) -> ParamRef {
        let d = &mut self.program.decls[decl.index()];
        let index = d.param_count();
        if d.param_groups.is_empty() {
            d.param_groups.push(Vec::new());
        }
        if let Some(group) = d.param_groups.last_mut() {
            group.push(param);
        }
        ParamRef::new(decl, index)
    }

    pub fn set_result(&mut self, decl: DeclId, ty: Ty) {
        self.program.decls[decl.index()].result = ty;
    }

    pub fn annotate(&mut self, decl: DeclId, annotation: Annotation) {
        self.program.decls[decl.index()].annotations.push(annotation);
    }

    pub fn set_body(&mut self, decl: DeclId, body: ExprId) {
        self.program.decls[decl.index()].body = Some(body);
    }

    pub fn set_decl_span(&mut self, decl: DeclId, span: Span) {
        self.program.decls[decl.index()].span = span;
    }

    // ------------------------------------------------------------------------
    // Function literals
    // ------------------------------------------------------------------------

    /// Declare a function literal implementing `fn_type`. The body is
    /// attached with [`ProgramBuilder::lambda_expr`] once it has been built
    /// against the returned parameters.
    pub fn lambda(&mut self, fn_type: TypeId, params: &[(&str, Ty)]) -> Lambda {
        let index = self.program.types.len();
        let ty = self.declare_type(TypeKind::Class, format!("$anon{}", index), Some(fn_type));
        let apply = self.declare_member(ty, DeclKind::Operation, "apply");
        self.program.decls[apply.index()].anonymous = true;
        self.param_group(apply);
        let params = params
            .iter()
            .map(|(name, ty)| self.param(apply, *name, ty.clone()))
            .collect();
        Lambda { apply, ty, params }
    }

    /// Attach the body of a function literal and build the literal itself
    pub fn lambda_expr(&mut self, lambda: &Lambda, body: ExprId) -> ExprId {
        let result = self.program.expr(body).ty.clone();
        self.set_result(lambda.apply, result);
        self.set_body(lambda.apply, body);
        self.expr(ExprKind::Lambda(lambda.apply), Ty::Named(lambda.ty))
    }

    /// Eta-expand a reference to `target` into a function literal that
    /// forwards its parameters to it
    pub fn eta_expand(&mut self, fn_type: TypeId, target: DeclId) -> ExprId {
        let params: Vec<(SmolStr, Ty)> = self
            .program
            .decl(target)
            .params()
            .map(|p| (p.name.clone(), p.ty.clone()))
            .collect();
        let borrowed: Vec<(&str, Ty)> = params
            .iter()
            .map(|(name, ty)| (name.as_str(), ty.clone()))
            .collect();
        let lambda = self.lambda(fn_type, &borrowed);
        let args = lambda
            .params
            .iter()
            .map(|p| self.param_ref(*p))
            .collect();
        let callee = self.decl_ref(target);
        let body = self.call(callee, args);
        self.lambda_expr(&lambda, body)
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    pub fn expr(&mut self, kind: ExprKind, ty: Ty) -> ExprId {
        let id = ExprId(self.program.exprs.len() as u32);
        self.program.exprs.push(Expr {
            id,
            kind,
            ty,
            span: Span::dummy(),
        });
        id
    }

    pub fn set_span(&mut self, expr: ExprId, span: Span) {
        self.program.exprs[expr.index()].span = span;
    }

    pub fn unit(&mut self) -> ExprId {
        self.expr(ExprKind::Literal(Literal::Unit), Ty::Unit)
    }

    pub fn int(&mut self, value: i64) -> ExprId {
        self.expr(ExprKind::Literal(Literal::Int(value)), Ty::Int)
    }

    pub fn bool(&mut self, value: bool) -> ExprId {
        self.expr(ExprKind::Literal(Literal::Bool(value)), Ty::Bool)
    }

    pub fn string(&mut self, value: impl Into<SmolStr>) -> ExprId {
        self.expr(ExprKind::Literal(Literal::Str(value.into())), Ty::Str)
    }

    pub fn param_ref(&mut self, param: ParamRef) -> ExprId {
        let ty = self
            .program
            .param(param)
            .map(|p| p.ty.clone())
            .unwrap_or(Ty::Unknown);
        self.expr(ExprKind::Ref(Symbol::Param(param)), ty)
    }

    pub fn decl_ref(&mut self, decl: DeclId) -> ExprId {
        let ty = self.program.decl(decl).result.clone();
        self.expr(ExprKind::Ref(Symbol::Decl(decl)), ty)
    }

    pub fn this(&mut self, ty: TypeId) -> ExprId {
        self.expr(ExprKind::This, Ty::Named(ty))
    }

    pub fn select(&mut self, recv: ExprId, member: DeclId) -> ExprId {
        let ty = self.program.decl(member).result.clone();
        self.expr(ExprKind::Select { recv, member }, ty)
    }

    pub fn call(&mut self, fun: ExprId, args: Vec<ExprId>) -> ExprId {
        self.call_full(fun, Vec::new(), vec![args])
    }

    pub fn call_full(&mut self, fun: ExprId, type_args: Vec<Ty>, args: Vec<Vec<ExprId>>) -> ExprId {
        let ty = self
            .program
            .referenced_decl(fun)
            .map(|decl| self.program.decl(decl).result.clone())
            .unwrap_or(Ty::Unknown);
        self.expr(
            ExprKind::Call {
                fun,
                type_args,
                args,
            },
            ty,
        )
    }

    /// `recv.decl(args)`, or `decl(args)` without a receiver
    pub fn invoke(&mut self, recv: Option<ExprId>, decl: DeclId, args: Vec<ExprId>) -> ExprId {
        let fun = match recv {
            Some(recv) => self.select(recv, decl),
            None => self.decl_ref(decl),
        };
        self.call(fun, args)
    }

    pub fn block(&mut self, stmts: Vec<ExprId>, result: Option<ExprId>) -> ExprId {
        let ty = result
            .map(|r| self.program.expr(r).ty.clone())
            .unwrap_or(Ty::Unit);
        self.expr(ExprKind::Block { stmts, result }, ty)
    }

    pub fn if_else(&mut self, cond: ExprId, then_branch: ExprId, else_branch: Option<ExprId>) -> ExprId {
        let ty = match else_branch {
            Some(_) => self.program.expr(then_branch).ty.clone(),
            None => Ty::Unit,
        };
        self.expr(
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            },
            ty,
        )
    }

    pub fn while_loop(&mut self, cond: ExprId, body: ExprId) -> ExprId {
        self.expr(ExprKind::While { cond, body }, Ty::Unit)
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId) -> ExprId {
        self.expr(ExprKind::Assign { target, value }, Ty::Unit)
    }

    pub fn binary(&mut self, op: BinOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        let ty = if op.is_comparison() {
            Ty::Bool
        } else {
            self.program.expr(lhs).ty.clone()
        };
        self.expr(ExprKind::Binary { op, lhs, rhs }, ty)
    }

    pub fn unary(&mut self, op: UnOp, operand: ExprId) -> ExprId {
        let ty = self.program.expr(operand).ty.clone();
        self.expr(ExprKind::Unary { op, operand }, ty)
    }

    pub fn match_expr(&mut self, scrutinee: ExprId, arms: Vec<MatchArm>) -> ExprId {
        let ty = arms
            .first()
            .map(|arm| self.program.expr(arm.body).ty.clone())
            .unwrap_or(Ty::Unit);
        self.expr(ExprKind::Match { scrutinee, arms }, ty)
    }

    pub fn ret(&mut self, value: Option<ExprId>) -> ExprId {
        self.expr(ExprKind::Return(value), Ty::Unit)
    }

    pub fn throw(&mut self, value: ExprId) -> ExprId {
        self.expr(ExprKind::Throw(value), Ty::Unit)
    }

    pub fn try_expr(&mut self, body: ExprId, handlers: Vec<ExprId>, finally: Option<ExprId>) -> ExprId {
        let ty = self.program.expr(body).ty.clone();
        self.expr(
            ExprKind::Try {
                body,
                handlers,
                finally,
            },
            ty,
        )
    }

    /// Local `val`/`lazy val`; also sets `decl`'s initializer body
    pub fn val_def(&mut self, decl: DeclId, init: ExprId) -> ExprId {
        let ty = self.program.expr(init).ty.clone();
        self.set_result(decl, ty);
        self.set_body(decl, init);
        self.expr(ExprKind::ValDef { decl, init }, Ty::Unit)
    }

    pub fn def(&mut self, decl: DeclId) -> ExprId {
        self.expr(ExprKind::Def(decl), Ty::Unit)
    }
}
