//! Structural traversal over the AST.
//!
//! A pass implements [`Visitor`] and overrides only the hooks it needs;
//! the default implementations delegate to the `walk_*` functions, which
//! perform the full structural recursion. Overriding a hook and still
//! wanting recursion means calling the matching `walk_*` yourself — the
//! same discipline the analyzer passes rely on to attribute nested
//! statements to their enclosing subroutine.

use crate::ast::{Block, Declaration, Expression, Program, Statement};

/// One hook per syntactic category, with structural defaults.
pub trait Visitor {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_declaration(&mut self, declaration: &Declaration) {
        walk_declaration(self, declaration);
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_statement(&mut self, statement: &Statement) {
        walk_statement(self, statement);
    }

    fn visit_expression(&mut self, expression: &Expression) {
        walk_expression(self, expression);
    }
}

/// Recurse into every declaration of a program.
pub fn walk_program<V: Visitor + ?Sized>(visitor: &mut V, program: &Program) {
    for declaration in &program.declarations {
        visitor.visit_declaration(declaration);
    }
}

/// Recurse into the parts of one declaration.
pub fn walk_declaration<V: Visitor + ?Sized>(visitor: &mut V, declaration: &Declaration) {
    match declaration {
        Declaration::Import { .. } | Declaration::Include { .. } => {}
        Declaration::Backend { properties, .. } | Declaration::Probe { properties, .. } => {
            for property in properties {
                visitor.visit_expression(&property.value);
            }
        }
        Declaration::Acl { .. } => {}
        Declaration::Sub { body, .. } => visitor.visit_block(body),
    }
}

/// Recurse into every statement of a block.
pub fn walk_block<V: Visitor + ?Sized>(visitor: &mut V, block: &Block) {
    for statement in &block.statements {
        visitor.visit_statement(statement);
    }
}

/// Recurse into the operands of one statement.
pub fn walk_statement<V: Visitor + ?Sized>(visitor: &mut V, statement: &Statement) {
    match statement {
        Statement::Block(block) => visitor.visit_block(block),
        Statement::If { condition, then_branch, else_branch, .. } => {
            visitor.visit_expression(condition);
            visitor.visit_block(then_branch);
            if let Some(else_branch) = else_branch {
                visitor.visit_statement(else_branch);
            }
        }
        Statement::Set { target, value, .. } => {
            visitor.visit_expression(target);
            visitor.visit_expression(value);
        }
        Statement::Unset { target, .. } => visitor.visit_expression(target),
        Statement::Call { .. } => {}
        Statement::Return { action, .. } => {
            if let Some(action) = action {
                visitor.visit_expression(action);
            }
        }
        Statement::Synthetic { value, .. } => visitor.visit_expression(value),
        Statement::Error { status, body, .. } => {
            if let Some(status) = status {
                visitor.visit_expression(status);
            }
            if let Some(body) = body {
                visitor.visit_expression(body);
            }
        }
        Statement::Restart { .. } => {}
        Statement::New { constructor, .. } => visitor.visit_expression(constructor),
        Statement::Expression { expression, .. } => visitor.visit_expression(expression),
        Statement::InlineSource { .. } => {}
    }
}

/// Recurse into the operands of one expression.
pub fn walk_expression<V: Visitor + ?Sized>(visitor: &mut V, expression: &Expression) {
    match expression {
        Expression::Identifier(_)
        | Expression::Integer { .. }
        | Expression::Float { .. }
        | Expression::StringLiteral { .. }
        | Expression::Boolean { .. }
        | Expression::Duration { .. }
        | Expression::Ip { .. } => {}
        Expression::Unary { operand, .. } => visitor.visit_expression(operand),
        Expression::Binary { left, right, .. } => {
            visitor.visit_expression(left);
            visitor.visit_expression(right);
        }
        Expression::Grouping { inner, .. } => visitor.visit_expression(inner),
        Expression::Member { object, .. } => visitor.visit_expression(object),
        Expression::Call { callee, args, named_args, .. } => {
            visitor.visit_expression(callee);
            for arg in args {
                visitor.visit_expression(arg);
            }
            for named in named_args {
                visitor.visit_expression(&named.value);
            }
        }
        Expression::ObjectLiteral { properties, .. } => {
            for property in properties {
                visitor.visit_expression(&property.value);
            }
        }
    }
}
