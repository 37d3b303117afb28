//! Return-action validation.
//!
//! Every built-in subroutine admits a fixed set of return actions; the
//! metadata carries the table. Returns inside nested blocks and
//! conditional branches still belong to the enclosing subroutine. Empty
//! returns are always accepted, and action names compare case-sensitively.

use vcl_ast::{Block, Declaration, Expression, Program, Statement};
use vcl_error::{Diagnostic, Stage};
use vcl_metadata::LanguageMetadata;

pub struct ReturnValidator<'a> {
    metadata: &'a LanguageMetadata,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ReturnValidator<'a> {
    pub fn run(program: &Program, metadata: &'a LanguageMetadata) -> Vec<Diagnostic> {
        let mut validator = ReturnValidator {
            metadata,
            diagnostics: Vec::new(),
        };
        for declaration in &program.declarations {
            if let Declaration::Sub { name, body, .. } = declaration {
                // Only lifecycle hooks have a defined action table.
                if name.name.starts_with("vcl_") {
                    validator.check_block(&name.name, body);
                }
            }
        }
        validator.diagnostics
    }

    fn check_block(&mut self, method: &str, block: &Block) {
        for statement in &block.statements {
            self.check_statement(method, statement);
        }
    }

    fn check_statement(&mut self, method: &str, statement: &Statement) {
        match statement {
            Statement::Block(block) => self.check_block(method, block),
            Statement::If { then_branch, else_branch, .. } => {
                self.check_block(method, then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_statement(method, else_branch);
                }
            }
            Statement::Return { action: Some(action), .. } => {
                if let Some((name, span)) = action_name(action) {
                    if self.metadata.method(method).is_some()
                        && !self.metadata.valid_return_action(method, name)
                    {
                        self.diagnostics.push(Diagnostic::error(
                            Stage::Return,
                            format!("return action '{name}' not permitted in '{method}'"),
                            &span.start,
                            name,
                        ));
                    }
                }
            }
            _ => {}
        }
    }
}

/// The action name of a return expression: a bare identifier (`hash`) or
/// the callee of a call form (`synth(404)`), through any grouping parens.
fn action_name(action: &Expression) -> Option<(&str, &vcl_lexer::Span)> {
    match action {
        Expression::Identifier(ident) => Some((&ident.name, &ident.span)),
        Expression::Call { callee, .. } => match &**callee {
            Expression::Identifier(ident) => Some((&ident.name, &ident.span)),
            _ => None,
        },
        Expression::Grouping { inner, .. } => action_name(inner),
        _ => None,
    }
}
