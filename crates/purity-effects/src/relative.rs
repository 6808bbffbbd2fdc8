//! Relative (polymorphic) effects.
//!
//! A relative effect says "invoking this declaration also does whatever
//! invoking `target` on the value at `location` does". `@rel(f)` makes a
//! declaration's effect depend on the function passed as `f`; `@rel(this.close)`
//! makes it depend on the receiver's `close`.
//!
//! While a declaration is being analyzed its own relative effects are
//! assumed: they sit in the [`RelativeEnv`] and any obligation they subsume
//! is treated as already charged.

use crate::domain::EffectDomain;
use crate::error::AnnotationError;
use indexmap::IndexSet;
use purity_ast::{Decl, DeclId, ParamRef, Program};
use smol_str::SmolStr;
use tracing::warn;

/// Annotation carrying relative effects, e.g. `@rel(f, this.flush)`
pub const REL_ANNOTATION: &str = "rel";

/// An abstract binding site relative to a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Location {
    /// The receiver of the declaration
    This(DeclId),
    /// A formal parameter of the declaration
    Param(ParamRef),
}

impl Location {
    /// Human-readable name, e.g. `this` or `f`
    pub fn describe(&self, program: &Program) -> String {
        match self {
            Location::This(_) => "this".to_string(),
            Location::Param(param) => program
                .param(*param)
                .map(|p| p.name.to_string())
                .unwrap_or_else(|| format!("<param {}>", param.index)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelativeEffect {
    pub location: Location,
    /// Operation invoked on the value at `location`; `None` means its whole
    /// effect
    pub target: Option<SmolStr>,
}

impl RelativeEffect {
    pub fn new(location: Location, target: Option<SmolStr>) -> Self {
        Self { location, target }
    }

    pub fn whole(location: Location) -> Self {
        Self::new(location, None)
    }

    pub fn on(location: Location, target: impl Into<SmolStr>) -> Self {
        Self::new(location, Some(target.into()))
    }

    /// Parse one `@rel` argument (`x`, `x.op`, `this` or `this.op`) in the
    /// scope of `decl`.
    pub fn parse(decl: &Decl, text: &str) -> Result<Self, AnnotationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AnnotationError::Empty);
        }

        let (head, target) = match text.split_once('.') {
            Some((head, target)) => (head.trim(), Some(target.trim())),
            None => (text, None),
        };
        let valid_ident = |s: &str| {
            !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        };
        if !valid_ident(head) || target.map_or(false, |t| !valid_ident(t)) {
            return Err(AnnotationError::Malformed(text.to_string()));
        }

        let location = if head == "this" {
            Location::This(decl.id)
        } else {
            let (param, _) = decl.param_named(head).ok_or_else(|| {
                AnnotationError::UnknownParameter(head.to_string(), decl.name.to_string())
            })?;
            Location::Param(param)
        };
        Ok(Self::new(location, target.map(SmolStr::from)))
    }

    /// Render as it would be written in an annotation
    pub fn describe(&self, program: &Program) -> String {
        match &self.target {
            Some(target) => format!("{}.{}", self.location.describe(program), target),
            None => self.location.describe(program),
        }
    }
}

/// Relative effects declared on `decl` through `@rel` annotations.
///
/// Arguments that do not parse are skipped with a warning; a missing
/// relative effect only makes the result more conservative.
pub fn parse_relative_annotations(decl: &Decl) -> Vec<RelativeEffect> {
    decl.annotations_named(REL_ANNOTATION)
        .flat_map(|annotation| annotation.args.iter())
        .filter_map(|arg| match RelativeEffect::parse(decl, arg) {
            Ok(rel) => Some(rel),
            Err(err) => {
                warn!(decl = %decl.name, %err, "ignoring relative effect annotation");
                None
            }
        })
        .collect()
}

/// Ordered set of relative effects currently assumed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelativeEnv {
    clauses: IndexSet<RelativeEffect>,
}

impl RelativeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_clauses(clauses: impl IntoIterator<Item = RelativeEffect>) -> Self {
        Self {
            clauses: clauses.into_iter().collect(),
        }
    }

    /// A copy of this environment that also assumes `clause`
    pub fn with(&self, clause: RelativeEffect) -> Self {
        let mut clauses = self.clauses.clone();
        clauses.insert(clause);
        Self { clauses }
    }

    pub fn contains(&self, clause: &RelativeEffect) -> bool {
        self.clauses.contains(clause)
    }

    /// Whether any assumed clause is rooted at `location`
    pub fn mentions(&self, location: Location) -> bool {
        self.clauses.iter().any(|c| c.location == location)
    }

    /// Whether `obligation` is already discharged: assumed verbatim, or
    /// implied by an assumed clause under the domain's rules.
    pub fn subsumes<D: EffectDomain + ?Sized>(&self, obligation: &RelativeEffect, domain: &D) -> bool {
        self.contains(obligation) || self.clauses.iter().any(|c| domain.implies(c, obligation))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RelativeEffect> {
        self.clauses.iter()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::PurityDomain;
    use purity_ast::{Annotation, DeclKind, ProgramBuilder, Ty};

    fn higher_order() -> (Program, DeclId, ParamRef) {
        let mut b = ProgramBuilder::new();
        let fn_ty = b.function_type("Function1");
        let map = b.declare(DeclKind::Operation, "map");
        let f = b.param(map, "f", Ty::Named(fn_ty));
        b.param(map, "xs", Ty::Unknown);
        b.annotate(map, Annotation::new(REL_ANNOTATION, ["f", "this.size", "ys", "f.", ""]));
        (b.finish(), map, f)
    }

    #[test]
    fn test_parse_locations() {
        let (program, map, f) = higher_order();
        let decl = program.decl(map);

        assert_eq!(
            RelativeEffect::parse(decl, "f"),
            Ok(RelativeEffect::whole(Location::Param(f)))
        );
        assert_eq!(
            RelativeEffect::parse(decl, " f.apply "),
            Ok(RelativeEffect::on(Location::Param(f), "apply"))
        );
        assert_eq!(
            RelativeEffect::parse(decl, "this"),
            Ok(RelativeEffect::whole(Location::This(map)))
        );
    }

    #[test]
    fn test_parse_errors() {
        let (program, map, _) = higher_order();
        let decl = program.decl(map);

        assert_eq!(RelativeEffect::parse(decl, "  "), Err(AnnotationError::Empty));
        assert_eq!(
            RelativeEffect::parse(decl, "ys"),
            Err(AnnotationError::UnknownParameter("ys".into(), "map".into()))
        );
        assert_eq!(
            RelativeEffect::parse(decl, "f.apply()"),
            Err(AnnotationError::Malformed("f.apply()".into()))
        );
    }

    #[test]
    fn test_annotations_skip_malformed_arguments() {
        let (program, map, f) = higher_order();
        let clauses = parse_relative_annotations(program.decl(map));

        assert_eq!(
            clauses,
            vec![
                RelativeEffect::whole(Location::Param(f)),
                RelativeEffect::on(Location::This(map), "size"),
            ]
        );
        assert_eq!(clauses[1].describe(&program), "this.size");
        assert_eq!(clauses[0].describe(&program), "f");
    }

    #[test]
    fn test_subsumes_exact_and_implied() {
        let (_, map, f) = higher_order();
        let domain = PurityDomain::new();
        let env = RelativeEnv::from_clauses([RelativeEffect::whole(Location::Param(f))]);

        assert!(env.subsumes(&RelativeEffect::whole(Location::Param(f)), &domain));
        assert!(env.subsumes(&RelativeEffect::on(Location::Param(f), "apply"), &domain));
        assert!(!env.subsumes(&RelativeEffect::on(Location::This(map), "apply"), &domain));

        let narrow = RelativeEnv::from_clauses([RelativeEffect::on(Location::This(map), "size")]);
        assert!(!narrow.subsumes(&RelativeEffect::whole(Location::This(map)), &domain));
        assert!(!narrow.subsumes(&RelativeEffect::on(Location::This(map), "clear"), &domain));
        assert!(narrow.mentions(Location::This(map)));
        assert!(!narrow.mentions(Location::Param(f)));
    }

    #[test]
    fn test_with_leaves_original_untouched() {
        let (_, map, _) = higher_order();
        let env = RelativeEnv::new();
        let extended = env.with(RelativeEffect::whole(Location::This(map)));

        assert!(env.is_empty());
        assert_eq!(extended.len(), 1);
    }
}
