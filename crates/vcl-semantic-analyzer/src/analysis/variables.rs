//! Variable-access collection and validation.
//!
//! One walk gathers every variable reference in the program — writes and
//! unsets from `set`/`unset` statements, reads from everywhere else —
//! attributed to the subroutine it appears in. The access validator
//! checks each against the metadata's access predicate; the version
//! validator reuses the same collection for its range checks.
//!
//! The collector rides the AST's [`Visitor`] traversal: it overrides the
//! hooks where access kind or skip rules apply and leaves the rest to the
//! structural `walk_*` defaults.

use rustc_hash::FxHashSet;
use std::sync::Arc;
use vcl_ast::visit::{walk_expression, walk_statement};
use vcl_ast::{Declaration, Expression, Program, Spanned, Statement, Visitor};
use vcl_error::{Diagnostic, Stage};
use vcl_lexer::{Keyword, Span};
use vcl_metadata::{AccessKind, AccessOutcome, LanguageMetadata};
use vcl_symbol_table::SymbolTable;

/// One variable reference, attributed to its enclosing subroutine.
#[derive(Debug, Clone)]
pub struct VariableAccess {
    /// Dotted variable spelling, e.g. `req.http.host`
    pub path: String,
    pub kind: AccessKind,
    pub span: Span,
    /// Name of the enclosing subroutine
    pub method: Arc<str>,
}

/// Collect every variable access in the program's subroutine bodies.
///
/// Identifiers that name something other than a variable are skipped:
/// return actions, declared subroutines/backends/probes/ACLs, imported
/// modules, and VMOD object instances. Member chains based on a module or
/// instance are call paths, not variable reads. Bare identifiers the
/// metadata does not know are skipped too — they are enum tokens or
/// string-ish operands, not variables.
pub fn collect_accesses(
    program: &Program,
    symbols: &SymbolTable,
    metadata: &LanguageMetadata,
) -> Vec<VariableAccess> {
    let mut declared: FxHashSet<String> = FxHashSet::default();
    for declaration in &program.declarations {
        if let Some(name) = declaration.name() {
            declared.insert(name.name.to_string());
        }
    }

    let mut collector = Collector {
        symbols,
        metadata,
        declared,
        method: Arc::from(""),
        accesses: Vec::new(),
    };
    collector.visit_program(program);
    collector.accesses
}

struct Collector<'a> {
    symbols: &'a SymbolTable,
    metadata: &'a LanguageMetadata,
    declared: FxHashSet<String>,
    method: Arc<str>,
    accesses: Vec<VariableAccess>,
}

impl Visitor for Collector<'_> {
    /// Only subroutine bodies hold accesses; other declarations are
    /// passed over.
    fn visit_declaration(&mut self, declaration: &Declaration) {
        if let Declaration::Sub { name, body, .. } = declaration {
            self.method = name.name.clone();
            self.visit_block(body);
        }
    }

    fn visit_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Set { target, value, .. } => {
                self.lvalue(target, AccessKind::Write);
                self.visit_expression(value);
            }
            Statement::Unset { target, .. } => self.lvalue(target, AccessKind::Unset),
            Statement::Return { action, .. } => {
                // The action name is not a variable; arguments of a
                // call-form action are ordinary reads.
                if let Some(Expression::Call { args, named_args, .. }) = action {
                    for arg in args {
                        self.visit_expression(arg);
                    }
                    for named in named_args {
                        self.visit_expression(&named.value);
                    }
                }
            }
            other => walk_statement(self, other),
        }
    }

    /// Every expression position this hook reaches is a read.
    fn visit_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Identifier(ident) => {
                if !self.skip_bare(&ident.name) {
                    self.push(ident.name.to_string(), AccessKind::Read, &ident.span);
                }
            }
            Expression::Member { object, .. } => {
                if let Some(base) = expression.path_base() {
                    if self.symbols.is_module(&base.name)
                        || self.symbols.is_object_instance(&base.name)
                    {
                        return;
                    }
                }
                match expression.dotted_path() {
                    Some(path) => self.push(path, AccessKind::Read, expression.span()),
                    None => self.visit_expression(object),
                }
            }
            Expression::Call { callee, args, named_args, .. } => {
                // The callee is a function reference, not a variable read;
                // only non-path callees hide further expressions.
                if !matches!(&**callee, Expression::Member { .. } | Expression::Identifier(_)) {
                    self.visit_expression(callee);
                }
                for arg in args {
                    self.visit_expression(arg);
                }
                for named in named_args {
                    self.visit_expression(&named.value);
                }
            }
            other => walk_expression(self, other),
        }
    }
}

impl Collector<'_> {
    fn lvalue(&mut self, target: &Expression, kind: AccessKind) {
        if let Some(path) = target.dotted_path() {
            self.push(path, kind, target.span());
        }
    }

    /// Bare identifiers are variables only when the metadata says so.
    fn skip_bare(&self, name: &str) -> bool {
        if Keyword::lookup(name).is_some_and(|k| k.is_action()) {
            return true;
        }
        if self.declared.contains(name)
            || self.symbols.is_module(name)
            || self.symbols.is_object_instance(name)
            || self.symbols.is_backend(name)
        {
            return true;
        }
        self.metadata.variable(name).is_none()
    }

    fn push(&mut self, path: String, kind: AccessKind, span: &Span) {
        self.accesses.push(VariableAccess {
            path,
            kind,
            span: span.clone(),
            method: self.method.clone(),
        });
    }
}

/// The variable-access pass: every access inside a built-in subroutine
/// must satisfy the metadata's access predicate.
pub fn validate_accesses(
    accesses: &[VariableAccess],
    metadata: &LanguageMetadata,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for access in accesses {
        if !access.method.starts_with("vcl_") {
            continue;
        }
        match metadata.variable_access(&access.path, &access.method, access.kind) {
            AccessOutcome::Allowed => {}
            AccessOutcome::Denied => diagnostics.push(Diagnostic::error(
                Stage::Variable,
                format!(
                    "variable '{}' is not {} in '{}'",
                    access.path,
                    access.kind.as_str(),
                    access.method
                ),
                &access.span.start,
                access.path.as_str(),
            )),
            AccessOutcome::UnknownVariable => diagnostics.push(Diagnostic::error(
                Stage::Variable,
                format!("unknown variable '{}'", access.path),
                &access.span.start,
                access.path.as_str(),
            )),
        }
    }

    diagnostics
}
