//! Whole-program analysis: check every declaration body and collect the
//! findings into a report.

use crate::checker::EffectChecker;
use crate::config::AnalysisConfig;
use crate::domain::EffectDomain;
use crate::error::EffectError;
use crate::reporter::{CollectingReporter, Mismatch};
use purity_ast::{DeclId, ExprId, Program};
use purity_diagnostics::render::{Renderer, SourceCache};
use purity_diagnostics::Diagnostic;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use std::fmt;
use std::io;
use std::path::Path;
use termcolor::WriteColor;
use tracing::{debug, info, info_span, instrument};

/// One analysis pass over a program
pub struct Analysis<'p, D: EffectDomain> {
    program: &'p Program,
    domain: &'p D,
    config: AnalysisConfig,
}

impl<'p, D: EffectDomain> Analysis<'p, D> {
    pub fn new(program: &'p Program, domain: &'p D, config: AnalysisConfig) -> Self {
        Self {
            program,
            domain,
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Check every declaration that has a body, in declaration order.
    #[instrument(skip_all)]
    pub fn run(&self) -> AnalysisReport<D::Effect> {
        let mut checker = EffectChecker::new(self.program, self.domain, CollectingReporter::new());
        let note = self.config.diagnostic_note.as_deref().map(SmolStr::new);
        let mut decls = Vec::new();

        for decl in self.program.decls() {
            if decl.body.is_none() {
                continue;
            }
            if self.config.is_excluded(&decl.name) {
                debug!(decl = %decl.name, "excluded from analysis");
                continue;
            }
            if decl.anonymous && !self.config.check_anonymous {
                continue;
            }

            let _span = info_span!("check_decl", decl = %decl.name).entered();
            let inferred = checker.check_decl(decl.id, note.clone());
            decls.push(DeclReport {
                decl: decl.id,
                name: decl.name.clone(),
                declared: self.domain.annotation(self.program, decl).effect,
                inferred,
            });
        }

        let (mismatches, erroneous) = checker.into_reporter().into_parts();
        info!(
            checked = decls.len(),
            mismatches = mismatches.len(),
            "effect analysis finished"
        );
        AnalysisReport {
            decls,
            mismatches,
            erroneous,
        }
    }
}

/// Outcome for a single declaration
#[derive(Debug, Clone, PartialEq)]
pub struct DeclReport<E> {
    pub decl: DeclId,
    pub name: SmolStr,
    /// Effect the declaration is annotated with
    pub declared: Option<E>,
    /// Effect of the body after mismatches were cut off
    pub inferred: Option<E>,
}

#[derive(Debug, Clone)]
pub struct AnalysisReport<E> {
    pub decls: Vec<DeclReport<E>>,
    pub mismatches: Vec<Mismatch<E>>,
    pub erroneous: FxHashSet<ExprId>,
}

impl<E> AnalysisReport<E> {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn decl(&self, decl: DeclId) -> Option<&DeclReport<E>> {
        self.decls.iter().find(|report| report.decl == decl)
    }

    pub fn inferred(&self, decl: DeclId) -> Option<&E> {
        self.decl(decl).and_then(|report| report.inferred.as_ref())
    }
}

impl<E: fmt::Display> AnalysisReport<E> {
    pub fn errors(&self) -> Vec<EffectError> {
        self.mismatches.iter().map(Mismatch::to_error).collect()
    }

    /// Diagnostics for every mismatch, with spans pointing into `file`
    pub fn diagnostics(&self, file: &Path) -> Vec<Diagnostic> {
        self.errors()
            .iter()
            .map(|error| error.to_diagnostic(file))
            .collect()
    }

    /// Render all diagnostics against `source`, the text of `file`
    pub fn render<W: WriteColor>(
        &self,
        renderer: &mut Renderer<W>,
        file: &Path,
        source: &str,
    ) -> io::Result<()> {
        let mut sources = SourceCache::new();
        sources.add_source(file.to_string_lossy(), source);
        renderer.render_all(&self.diagnostics(file), &sources)
    }
}
