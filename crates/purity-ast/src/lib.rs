//! Purity Typed Program Model
//!
//! The effect checker never parses or type checks source code. It consumes a
//! program that a front end has already resolved: every reference points at a
//! declaration or a parameter, every expression carries its static type, and
//! every member of a nominal type knows which member it overrides.
//!
//! Declarations, types and expressions live in flat arenas owned by
//! [`Program`] and are addressed by copyable ids. Programs are assembled with
//! [`ProgramBuilder`].

mod builder;

pub use builder::{Lambda, ProgramBuilder};
pub use smol_str::SmolStr;

use indexmap::IndexMap;
use std::fmt;
use std::ops::Range;

// ============================================================================
// Source Locations
// ============================================================================

/// Byte range in the source file a node was produced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    pub fn is_dummy(&self) -> bool {
        self.start == 0 && self.end == 0
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

// ============================================================================
// Identifiers
// ============================================================================

/// Declaration handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

/// Nominal type handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// Expression handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Formal parameter of a declaration, addressed by its position once all
/// parameter groups are flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamRef {
    pub decl: DeclId,
    pub index: u32,
}

impl ParamRef {
    pub fn new(decl: DeclId, index: usize) -> Self {
        Self {
            decl,
            index: index as u32,
        }
    }
}

// ============================================================================
// Types
// ============================================================================

/// Static type attached to expressions, parameters and results
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    Unit,
    Bool,
    Int,
    Str,
    Named(TypeId),
    /// Left behind by the front end when it could not resolve a type
    Unknown,
}

impl Ty {
    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            Ty::Named(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Trait,
    Module,
    /// Function trait: a single abstract operation, conventionally `apply`
    Function,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub id: TypeId,
    pub name: SmolStr,
    pub kind: TypeKind,
    pub parent: Option<TypeId>,
    /// Members declared directly on this type, in declaration order
    pub members: IndexMap<SmolStr, DeclId>,
    pub primary_ctor: Option<DeclId>,
    pub span: Span,
}

/// Outcome of looking an operation up on a nominal type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedMember {
    /// The member introduces the name; nothing above it declares it
    Primary(DeclId),
    /// The member replaces `overridden` from a supertype
    Overriding { decl: DeclId, overridden: DeclId },
}

impl ResolvedMember {
    pub fn decl(&self) -> DeclId {
        match self {
            ResolvedMember::Primary(decl) => *decl,
            ResolvedMember::Overriding { decl, .. } => *decl,
        }
    }
}

// ============================================================================
// Annotations
// ============================================================================

/// Annotation attached to a declaration, e.g. `@effect(IO, Console)` or
/// `@rel(f.apply)`. Arguments are kept as raw text; effect domains decide
/// what they mean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub name: SmolStr,
    pub args: Vec<SmolStr>,
    pub span: Span,
}

impl Annotation {
    pub fn new<I, S>(name: impl Into<SmolStr>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
            span: Span::dummy(),
        }
    }

    /// Annotation without arguments, e.g. `@pure`
    pub fn marker(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            span: Span::dummy(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "(")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    /// `def` method or function
    Operation,
    /// Primary or auxiliary constructor
    Constructor,
    /// Strict value (`val`), local or member
    Value,
    /// Lazily initialized value; its initializer runs on first access
    LazyValue,
    /// Class field backed by a constructor parameter
    Field,
    /// Singleton object; its initializer runs on first access
    Module,
    Class,
    TypeAlias,
}

impl DeclKind {
    pub fn is_callable(self) -> bool {
        matches!(self, DeclKind::Operation | DeclKind::Constructor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: SmolStr,
    pub ty: Ty,
    /// Deferred (by-name) parameter: the argument is evaluated at each use
    pub by_name: bool,
    pub span: Span,
}

impl Param {
    pub fn new(name: impl Into<SmolStr>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
            by_name: false,
            span: Span::dummy(),
        }
    }

    pub fn by_name(name: impl Into<SmolStr>, ty: Ty) -> Self {
        Self {
            by_name: true,
            ..Self::new(name, ty)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub id: DeclId,
    pub name: SmolStr,
    pub kind: DeclKind,
    /// Type this declaration is a member of
    pub owner: Option<TypeId>,
    pub param_groups: Vec<Vec<Param>>,
    pub result: Ty,
    pub body: Option<ExprId>,
    pub annotations: Vec<Annotation>,
    pub overrides: Option<DeclId>,
    /// Synthesized by the front end for a function literal or eta-expansion
    pub anonymous: bool,
    pub span: Span,
}

impl Decl {
    /// Formal parameters with all groups flattened
    pub fn params(&self) -> impl Iterator<Item = &Param> {
        self.param_groups.iter().flatten()
    }

    pub fn param(&self, index: usize) -> Option<&Param> {
        self.params().nth(index)
    }

    pub fn param_count(&self) -> usize {
        self.param_groups.iter().map(Vec::len).sum()
    }

    pub fn param_refs(&self) -> impl Iterator<Item = (ParamRef, &Param)> + '_ {
        let decl = self.id;
        self.params()
            .enumerate()
            .map(move |(index, param)| (ParamRef::new(decl, index), param))
    }

    pub fn param_named(&self, name: &str) -> Option<(ParamRef, &Param)> {
        self.param_refs().find(|(_, param)| param.name == name)
    }

    /// No parameter list at all, so a bare reference already invokes it
    pub fn is_parameterless(&self) -> bool {
        self.param_groups.is_empty()
    }

    pub fn annotations_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Annotation> {
        self.annotations.iter().filter(move |a| a.is(name))
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a.is(name))
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Unit,
    Bool(bool),
    Int(i64),
    Str(SmolStr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn is_comparison(self) -> bool {
        !matches!(self, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    Neg,
    Not,
}

/// What a resolved name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Param(ParamRef),
    Decl(DeclId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub guard: Option<ExprId>,
    pub body: ExprId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    /// Bare reference to a parameter, local or top-level declaration
    Ref(Symbol),
    /// The receiver of the enclosing declaration
    This,
    /// `recv.member`
    Select { recv: ExprId, member: DeclId },
    /// `fun[type_args](args)(args)...`
    Call {
        fun: ExprId,
        type_args: Vec<Ty>,
        args: Vec<Vec<ExprId>>,
    },
    Block {
        stmts: Vec<ExprId>,
        result: Option<ExprId>,
    },
    If {
        cond: ExprId,
        then_branch: ExprId,
        else_branch: Option<ExprId>,
    },
    While { cond: ExprId, body: ExprId },
    Assign { target: ExprId, value: ExprId },
    Binary { op: BinOp, lhs: ExprId, rhs: ExprId },
    Unary { op: UnOp, operand: ExprId },
    Match {
        scrutinee: ExprId,
        arms: Vec<MatchArm>,
    },
    Return(Option<ExprId>),
    Throw(ExprId),
    Try {
        body: ExprId,
        handlers: Vec<ExprId>,
        finally: Option<ExprId>,
    },
    /// Local `val` or `lazy val` definition
    ValDef { decl: DeclId, init: ExprId },
    /// Local `def`, class, module or type definition
    Def(DeclId),
    /// Function literal; `decl` is its synthesized `apply`
    Lambda(DeclId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
    pub ty: Ty,
    pub span: Span,
}

impl Expr {
    /// Immediate subexpressions, in evaluation order
    pub fn children(&self) -> Vec<ExprId> {
        match &self.kind {
            ExprKind::Literal(_)
            | ExprKind::Ref(_)
            | ExprKind::This
            | ExprKind::Def(_)
            | ExprKind::Lambda(_) => Vec::new(),
            ExprKind::Select { recv, .. } => vec![*recv],
            ExprKind::Call { fun, args, .. } => {
                let mut children = vec![*fun];
                children.extend(args.iter().flatten().copied());
                children
            }
            ExprKind::Block { stmts, result } => {
                let mut children = stmts.clone();
                children.extend(result.iter().copied());
                children
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let mut children = vec![*cond, *then_branch];
                children.extend(else_branch.iter().copied());
                children
            }
            ExprKind::While { cond, body } => vec![*cond, *body],
            ExprKind::Assign { target, value } => vec![*target, *value],
            ExprKind::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            ExprKind::Unary { operand, .. } => vec![*operand],
            ExprKind::Match { scrutinee, arms } => {
                let mut children = vec![*scrutinee];
                for arm in arms {
                    children.extend(arm.guard.iter().copied());
                    children.push(arm.body);
                }
                children
            }
            ExprKind::Return(value) => value.iter().copied().collect(),
            ExprKind::Throw(value) => vec![*value],
            ExprKind::Try {
                body,
                handlers,
                finally,
            } => {
                let mut children = vec![*body];
                children.extend(handlers.iter().copied());
                children.extend(finally.iter().copied());
                children
            }
            ExprKind::ValDef { init, .. } => vec![*init],
        }
    }
}

// ============================================================================
// Program
// ============================================================================

/// A fully resolved program
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    decls: Vec<Decl>,
    types: Vec<TypeDef>,
    exprs: Vec<Expr>,
}

impl Program {
    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    pub fn type_def(&self, id: TypeId) -> &TypeDef {
        &self.types[id.index()]
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    pub fn param(&self, param: ParamRef) -> Option<&Param> {
        self.decl(param.decl).param(param.index as usize)
    }

    pub fn decls(&self) -> impl Iterator<Item = &Decl> {
        self.decls.iter()
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.iter()
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    /// First declaration with the given name, in declaration order
    pub fn find_decl(&self, name: &str) -> Option<DeclId> {
        self.decls.iter().find(|d| d.name == name).map(|d| d.id)
    }

    /// Supertypes of `ty`, starting with `ty` itself
    pub fn ancestors(&self, ty: TypeId) -> impl Iterator<Item = &TypeDef> {
        std::iter::successors(Some(self.type_def(ty)), move |def| {
            def.parent.map(|parent| self.type_def(parent))
        })
    }

    /// Look up the most specific member called `name` visible on `ty`.
    ///
    /// The search starts at the type itself and walks up the supertype
    /// chain, so a subclass' override wins over the declaration it
    /// replaces.
    pub fn resolve_member(&self, ty: &Ty, name: &str) -> Option<ResolvedMember> {
        let start = ty.type_id()?;
        let decl = self
            .ancestors(start)
            .find_map(|def| def.members.get(name).copied())?;
        Some(match self.decl(decl).overrides {
            Some(overridden) => ResolvedMember::Overriding { decl, overridden },
            None => ResolvedMember::Primary(decl),
        })
    }

    /// Name of the single abstract operation of a function type, if `ty`
    /// is (or extends) one
    pub fn function_operation(&self, ty: &Ty) -> Option<&SmolStr> {
        let start = ty.type_id()?;
        self.ancestors(start)
            .find(|def| def.kind == TypeKind::Function)
            .and_then(|def| def.members.keys().next())
    }

    /// The by-name parameter of the owner's primary constructor that a
    /// field mirrors, matched by name.
    pub fn mirrored_by_name_param(&self, field: DeclId) -> Option<ParamRef> {
        let decl = self.decl(field);
        if !matches!(decl.kind, DeclKind::Field | DeclKind::Value) {
            return None;
        }
        let ctor = self.type_def(decl.owner?).primary_ctor?;
        self.decl(ctor)
            .param_named(&decl.name)
            .filter(|(_, param)| param.by_name)
            .map(|(param_ref, _)| param_ref)
    }

    /// Declaration invoked or referenced by a callee expression
    pub fn referenced_decl(&self, expr: ExprId) -> Option<DeclId> {
        match &self.expr(expr).kind {
            ExprKind::Ref(Symbol::Decl(decl)) => Some(*decl),
            ExprKind::Select { member, .. } => Some(*member),
            _ => None,
        }
    }
}
