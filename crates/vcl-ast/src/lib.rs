//! VCL AST library.
//!
//! Provides the abstract syntax tree definitions for VCL.
//!
//! - `ast`: the node model — typed enums per syntactic category.
//! - `visit`: match-driven structural traversal.

pub mod ast;
pub mod visit;

pub use ast::{
    AclEntry, BinaryOperator, Block, Declaration, Expression, Ident, NamedArg, ObjectProperty,
    Program, SetOperator, Spanned, Statement, UnaryOperator, VersionDecl,
};
pub use vcl_lexer::{Position, Span};
pub use visit::Visitor;
