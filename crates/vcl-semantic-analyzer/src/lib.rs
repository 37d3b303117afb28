//! Multi-pass semantic validation for VCL programs.
//!
//! The analyzer drives four validators over a parsed [`Program`], in
//! order, appending each pass's findings to one list:
//!
//! 1. **VMOD** — imports, calls, and object construction against the
//!    registry; populates the symbol table the other passes read.
//! 2. **Return actions** — every `return (...)` in a built-in subroutine
//!    against the metadata's per-method action table.
//! 3. **Variable access** — every read/write/unset against the per-method
//!    access predicate.
//! 4. **Version** — every variable reference against the declared VCL
//!    version.
//!
//! Passes never halt each other: semantic diagnostics accumulate and each
//! pass runs to completion over whatever AST exists. The passes are pure
//! with respect to their inputs — analyzing the same program twice yields
//! the same diagnostics.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use vcl_metadata::MetadataLoader;
//! use vcl_parser_core::Parser;
//! use vcl_semantic_analyzer::SemanticAnalyzer;
//!
//! let outcome = Parser::parse_source("vcl 4.0;\nsub vcl_recv { return (hash); }", None);
//! let loader = MetadataLoader::bundled().unwrap();
//! let analyzer = SemanticAnalyzer::new(loader.snapshot(), None);
//! let analysis = analyzer.analyze(&outcome.program);
//! assert!(analysis.diagnostics.is_empty());
//! ```

pub mod analysis;

use analysis::returns::ReturnValidator;
use analysis::variables::{collect_accesses, validate_accesses};
use analysis::version::validate_versions;
use analysis::vmod::VmodValidator;
use std::sync::Arc;
use tracing::debug;
use vcl_ast::Program;
use vcl_error::Diagnostic;
use vcl_metadata::LanguageMetadata;
use vcl_symbol_table::SymbolTable;
use vcl_vmod_registry::VmodRegistry;

pub use analysis::type_inference::infer;
pub use analysis::variables::VariableAccess;

/// What one analysis run produces: the combined diagnostics of all four
/// passes, plus the symbol table the VMOD pass built.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub diagnostics: Vec<Diagnostic>,
    pub symbols: SymbolTable,
}

/// The pass driver. One analyzer can serve many programs; each run gets a
/// fresh symbol table. The metadata snapshot and registry are shared,
/// read-only side-inputs, so analyzing independent units in parallel is
/// safe with one analyzer per unit.
pub struct SemanticAnalyzer {
    metadata: Arc<LanguageMetadata>,
    registry: Option<Arc<VmodRegistry>>,
}

impl SemanticAnalyzer {
    /// An analyzer over `metadata`, optionally with a VMOD registry.
    /// Without a registry no VMODs are available and module-related
    /// validation is skipped.
    pub fn new(metadata: Arc<LanguageMetadata>, registry: Option<Arc<VmodRegistry>>) -> Self {
        SemanticAnalyzer { metadata, registry }
    }

    /// Run all four passes over `program`.
    pub fn analyze(&self, program: &Program) -> AnalysisOutcome {
        let mut symbols = SymbolTable::new();
        let mut diagnostics = Vec::new();

        diagnostics.extend(VmodValidator::run(
            program,
            self.registry.as_deref(),
            &self.metadata,
            &mut symbols,
        ));

        diagnostics.extend(ReturnValidator::run(program, &self.metadata));

        let accesses = collect_accesses(program, &symbols, &self.metadata);
        diagnostics.extend(validate_accesses(&accesses, &self.metadata));
        diagnostics.extend(validate_versions(program, &accesses, &self.metadata));

        debug!(
            diagnostics = diagnostics.len(),
            symbols = symbols.len(),
            "analysis finished"
        );
        AnalysisOutcome { diagnostics, symbols }
    }
}
