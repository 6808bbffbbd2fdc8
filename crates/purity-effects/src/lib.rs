//! Purity Effects - effect inference and effect checking.
//!
//! The engine infers, for every expression, an effect drawn from a
//! pluggable lattice ([`EffectDomain`]) and checks it against the effect
//! expected by its context. Declarations may state *relative* effects
//! (`@rel(f)`), making the effect of a call depend on what is passed for
//! `f`; these are expanded per call site.
//!
//! ```rust
//! use purity_ast::{Annotation, DeclKind, ProgramBuilder};
//! use purity_effects::{Analysis, AnalysisConfig, Purity, PurityDomain};
//!
//! let mut b = ProgramBuilder::new();
//! let print = b.declare(DeclKind::Operation, "print");
//! b.annotate(print, Annotation::new("effect", ["IO"]));
//! let main = b.declare(DeclKind::Operation, "main");
//! b.annotate(main, Annotation::marker("pure"));
//! let call = b.invoke(None, print, vec![]);
//! b.set_body(main, call);
//! let program = b.finish();
//!
//! let domain = PurityDomain::new();
//! let report = Analysis::new(&program, &domain, AnalysisConfig::default()).run();
//! assert_eq!(report.mismatches.len(), 1);
//! assert_eq!(report.mismatches[0].found, Purity::Impure);
//! ```

mod checker;
mod config;
mod context;
mod domain;
pub mod domains;
mod driver;
mod error;
mod invocation;
mod latent;
mod relative;
mod reporter;

pub use checker::EffectChecker;
pub use config::AnalysisConfig;
pub use context::EffectContext;
pub use domain::{Analyzer, EffectAnnotation, EffectDomain};
pub use domains::{NamedEffectDomain, NamedEffects, Purity, PurityDomain};
pub use driver::{Analysis, AnalysisReport, DeclReport};
pub use error::{AnnotationError, ConfigError, ConfigResult, EffectError};
pub use invocation::{ArgBinding, ArgBindings, DeferredEffects, Invocation};
pub use relative::{parse_relative_annotations, Location, RelativeEffect, RelativeEnv, REL_ANNOTATION};
pub use reporter::{CollectingReporter, Mismatch, Reporter};
