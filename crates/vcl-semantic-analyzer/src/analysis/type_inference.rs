//! Shape-driven type inference for argument expressions.
//!
//! The inference is deliberately shallow: it answers "what VCC type does
//! this expression produce" well enough to check call signatures, flowing
//! the expected parameter type in as a hint so enum tokens and numeric
//! coercions resolve the way the registry's compatibility relation
//! expects. `None` means "could not tell", which the signature check
//! treats as passing.

use vcl_ast::Expression;
use vcl_metadata::LanguageMetadata;
use vcl_symbol_table::{Symbol, SymbolTable};
use vcl_vcc::VccType;

/// Infer the type of `expression`, with the expected parameter type as a
/// hint.
pub fn infer(
    expression: &Expression,
    hint: Option<VccType>,
    symbols: &SymbolTable,
    metadata: &LanguageMetadata,
) -> Option<VccType> {
    match expression {
        Expression::StringLiteral { .. } => Some(VccType::String),
        Expression::Integer { .. } => Some(VccType::Int),
        Expression::Float { .. } => Some(VccType::Real),
        Expression::Boolean { .. } => Some(VccType::Bool),
        Expression::Duration { .. } => Some(VccType::Duration),
        Expression::Ip { .. } => Some(VccType::Ip),

        Expression::Identifier(ident) => match symbols.get(&ident.name) {
            Some(Symbol::Backend { .. }) => Some(VccType::Backend),
            Some(Symbol::Module { .. }) | Some(Symbol::ObjectInstance { .. }) => None,
            Some(Symbol::Variable { info, .. }) => metadata_type(&info.vtype),
            None => match metadata.variable(&ident.name) {
                Some(info) => metadata_type(&info.vtype),
                // A bare identifier in an enum slot is an enum token;
                // everything else defaults to string.
                None if hint == Some(VccType::Enum) => Some(VccType::Enum),
                None => Some(VccType::String),
            },
        },

        Expression::Member { .. } => {
            if let Some(path) = expression.dotted_path() {
                if let Some(info) = metadata.variable(&path) {
                    return metadata_type(&info.vtype);
                }
            }
            // A member on an object instance reads as the method's
            // declared return type.
            resolved_return_type(expression, symbols)
        }

        Expression::Call { callee, .. } => resolved_return_type(callee, symbols),

        Expression::Unary { operand, .. } => infer(operand, hint, symbols, metadata),
        Expression::Grouping { inner, .. } => infer(inner, hint, symbols, metadata),

        Expression::Binary { operator, left, .. } => {
            use vcl_ast::BinaryOperator as Op;
            match operator {
                Op::Or | Op::And | Op::Eq | Op::Ne | Op::Lt | Op::Le | Op::Gt | Op::Ge
                | Op::Match | Op::NotMatch => Some(VccType::Bool),
                Op::Add | Op::Subtract | Op::Multiply | Op::Divide => {
                    infer(left, hint, symbols, metadata)
                }
            }
        }

        Expression::ObjectLiteral { .. } => None,
    }
}

/// The declared return type behind a `module.function` or
/// `instance.method` reference, when it resolves.
fn resolved_return_type(callee: &Expression, symbols: &SymbolTable) -> Option<VccType> {
    let Expression::Member { object, property, .. } = callee else {
        return None;
    };
    let Expression::Identifier(base) = &**object else {
        return None;
    };

    if let Some((module, type_name)) = symbols.object_instance(&base.name) {
        let descriptor = symbols.module(module)?;
        let object_type = descriptor.object(type_name)?;
        return Some(object_type.method(&property.name)?.return_type);
    }

    let descriptor = symbols.module(&base.name)?;
    Some(descriptor.function(&property.name)?.return_type)
}

/// Map a metadata type string to the VCC vocabulary. Headers read as
/// strings in expression position.
fn metadata_type(name: &str) -> Option<VccType> {
    match VccType::lookup(name) {
        Some(VccType::Header) => Some(VccType::String),
        other => other,
    }
}
