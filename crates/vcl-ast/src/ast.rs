//! Abstract syntax tree definitions for VCL.
//!
//! The tree is a closed sum per syntactic category: declarations,
//! statements, and expressions each form a tagged enum whose variants carry
//! their operands as named fields. Every node records the source region it
//! was parsed from, and positions survive include splicing — a node spliced
//! out of another file keeps that file's positions.
//!
//! Traversal is match-driven: the [`crate::visit`] module provides walk
//! functions so each analysis pass implements only the hooks it cares
//! about, and exhaustiveness checking catches missed variants at compile
//! time.

use std::sync::Arc;
use vcl_lexer::Span;

/// A parsed compilation unit: optional version declaration plus ordered
/// top-level declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// The leading `vcl <major>.<minor>;` declaration, when present
    pub version: Option<VersionDecl>,
    /// Top-level declarations in source order
    pub declarations: Vec<Declaration>,
    /// Region covered by the whole unit
    pub span: Span,
}

impl Program {
    /// Iterate over the include declarations still present in the tree.
    ///
    /// After include resolution this iterator is empty.
    pub fn includes(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations
            .iter()
            .filter(|d| matches!(d, Declaration::Include { .. }))
    }
}

/// The `vcl 4.1;` version declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionDecl {
    /// The numeric text as written, e.g. `4.0`
    pub version: Arc<str>,
    pub span: Span,
}

/// An identifier with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: Arc<str>,
    pub span: Span,
}

/// A brace-delimited statement sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

/// A `.key = value` property inside a backend, probe, or object literal.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectProperty {
    pub name: Ident,
    pub value: Expression,
    pub span: Span,
}

/// One entry of an ACL body: optional negation, quoted address, optional
/// CIDR mask.
#[derive(Debug, Clone, PartialEq)]
pub struct AclEntry {
    pub negated: bool,
    pub address: Arc<str>,
    pub mask: Option<u32>,
    pub span: Span,
}

/// Top-level declarations.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// `import std;` / `import std as stdlib;`
    Import {
        name: Ident,
        alias: Option<Ident>,
        span: Span,
    },
    /// `include "other.vcl";` — present only before include resolution
    Include { path: Arc<str>, span: Span },
    /// `backend origin { .host = "..."; ... }`
    Backend {
        name: Ident,
        properties: Vec<ObjectProperty>,
        span: Span,
    },
    /// `probe healthcheck { .url = "/"; ... }`
    Probe {
        name: Ident,
        properties: Vec<ObjectProperty>,
        span: Span,
    },
    /// `acl trusted { "10.0.0.0"/8; ! "10.0.0.1"; }`
    Acl {
        name: Ident,
        entries: Vec<AclEntry>,
        span: Span,
    },
    /// `sub vcl_recv { ... }`
    Sub { name: Ident, body: Block, span: Span },
}

impl Declaration {
    /// The declared name, where the declaration has one.
    pub fn name(&self) -> Option<&Ident> {
        match self {
            Declaration::Import { name, .. }
            | Declaration::Backend { name, .. }
            | Declaration::Probe { name, .. }
            | Declaration::Acl { name, .. }
            | Declaration::Sub { name, .. } => Some(name),
            Declaration::Include { .. } => None,
        }
    }
}

/// The operator of a `set` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    /// `=`
    Assign,
    /// `+=`
    Add,
    /// `-=`
    Subtract,
    /// `*=`
    Multiply,
    /// `/=`
    Divide,
}

impl SetOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetOperator::Assign => "=",
            SetOperator::Add => "+=",
            SetOperator::Subtract => "-=",
            SetOperator::Multiply => "*=",
            SetOperator::Divide => "/=",
        }
    }
}

/// Statements inside subroutine bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// A nested `{ ... }` block
    Block(Block),
    /// `if (cond) { ... } else ...` — `else_branch` is either another `If`
    /// (for `else if` chains) or a `Block`
    If {
        condition: Expression,
        then_branch: Block,
        else_branch: Option<Box<Statement>>,
        span: Span,
    },
    /// `set lvalue OP rvalue;`
    Set {
        target: Expression,
        operator: SetOperator,
        value: Expression,
        span: Span,
    },
    /// `unset lvalue;`
    Unset { target: Expression, span: Span },
    /// `call custom_sub;`
    Call { target: Ident, span: Span },
    /// `return;` / `return (action);`
    Return {
        action: Option<Expression>,
        span: Span,
    },
    /// `synthetic ("body");`
    Synthetic { value: Expression, span: Span },
    /// `error 503 "backend down";` — both operands optional
    Error {
        status: Option<Expression>,
        body: Option<Expression>,
        span: Span,
    },
    /// `restart;`
    Restart { span: Span },
    /// `new d = directors.round_robin();`
    New {
        name: Ident,
        constructor: Expression,
        span: Span,
    },
    /// A bare expression followed by `;`
    Expression { expression: Expression, span: Span },
    /// An embedded `C{ ... }C` block; `source` is the enclosed text
    InlineSource { source: Arc<str>, span: Span },
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// `!`
    Not,
    /// `-`
    Negate,
    /// `+`
    Plus,
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "!",
            UnaryOperator::Negate => "-",
            UnaryOperator::Plus => "+",
        }
    }
}

/// Binary operators, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// `||`
    Or,
    /// `&&`
    And,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `~`
    Match,
    /// `!~`
    NotMatch,
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Or => "||",
            BinaryOperator::And => "&&",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::Match => "~",
            BinaryOperator::NotMatch => "!~",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
        }
    }
}

/// A `name = expression` argument in a call.
///
/// Stored as a list so diagnostics iterate in source order; the parser
/// guarantees names are pairwise distinct.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedArg {
    pub name: Ident,
    pub value: Expression,
}

/// Expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A bare name
    Identifier(Ident),
    /// `200`
    Integer { value: i64, span: Span },
    /// `0.5`
    Float { value: f64, span: Span },
    /// `"text"` — `value` has the quotes stripped
    StringLiteral { value: Arc<str>, span: Span },
    /// `true` / `false`
    Boolean { value: bool, span: Span },
    /// `30s`, `2.5h` — a numeral merged with its unit suffix
    Duration {
        value: f64,
        unit: Arc<str>,
        span: Span,
    },
    /// An IPv4/IPv6-shaped operand
    Ip { address: Arc<str>, span: Span },
    /// `!x`, `-x`, `+x`
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
        span: Span,
    },
    /// `a OP b`
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
        span: Span,
    },
    /// `( inner )`
    Grouping { inner: Box<Expression>, span: Span },
    /// `object.property`
    Member {
        object: Box<Expression>,
        property: Ident,
        span: Span,
    },
    /// `callee(positional..., name = value...)`
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
        named_args: Vec<NamedArg>,
        span: Span,
    },
    /// `{ .key = value; ... }`
    ObjectLiteral {
        properties: Vec<ObjectProperty>,
        span: Span,
    },
}

impl Expression {
    /// Look up a named argument by name. Only meaningful on `Call`.
    pub fn named_arg(&self, name: &str) -> Option<&Expression> {
        match self {
            Expression::Call { named_args, .. } => named_args
                .iter()
                .find(|arg| &*arg.name.name == name)
                .map(|arg| &arg.value),
            _ => None,
        }
    }

    /// Flatten an identifier or member chain into its dotted spelling:
    /// `req.http.host` comes back as `"req.http.host"`. Returns `None` for
    /// shapes that are not pure name paths (calls, literals, groupings).
    pub fn dotted_path(&self) -> Option<String> {
        match self {
            Expression::Identifier(ident) => Some(ident.name.to_string()),
            Expression::Member { object, property, .. } => {
                let mut base = object.dotted_path()?;
                base.push('.');
                base.push_str(&property.name);
                Some(base)
            }
            _ => None,
        }
    }

    /// The leftmost identifier of a name path, e.g. `req` in
    /// `req.http.host`.
    pub fn path_base(&self) -> Option<&Ident> {
        match self {
            Expression::Identifier(ident) => Some(ident),
            Expression::Member { object, .. } => object.path_base(),
            _ => None,
        }
    }
}

/// Anything that can report the source region it covers.
pub trait Spanned {
    fn span(&self) -> &Span;
}

impl Spanned for Program {
    fn span(&self) -> &Span {
        &self.span
    }
}

impl Spanned for VersionDecl {
    fn span(&self) -> &Span {
        &self.span
    }
}

impl Spanned for Ident {
    fn span(&self) -> &Span {
        &self.span
    }
}

impl Spanned for Block {
    fn span(&self) -> &Span {
        &self.span
    }
}

impl Spanned for ObjectProperty {
    fn span(&self) -> &Span {
        &self.span
    }
}

impl Spanned for AclEntry {
    fn span(&self) -> &Span {
        &self.span
    }
}

impl Spanned for NamedArg {
    fn span(&self) -> &Span {
        self.value.span()
    }
}

impl Spanned for Declaration {
    fn span(&self) -> &Span {
        match self {
            Declaration::Import { span, .. }
            | Declaration::Include { span, .. }
            | Declaration::Backend { span, .. }
            | Declaration::Probe { span, .. }
            | Declaration::Acl { span, .. }
            | Declaration::Sub { span, .. } => span,
        }
    }
}

impl Spanned for Statement {
    fn span(&self) -> &Span {
        match self {
            Statement::Block(block) => &block.span,
            Statement::If { span, .. }
            | Statement::Set { span, .. }
            | Statement::Unset { span, .. }
            | Statement::Call { span, .. }
            | Statement::Return { span, .. }
            | Statement::Synthetic { span, .. }
            | Statement::Error { span, .. }
            | Statement::Restart { span, .. }
            | Statement::New { span, .. }
            | Statement::Expression { span, .. }
            | Statement::InlineSource { span, .. } => span,
        }
    }
}

impl Spanned for Expression {
    fn span(&self) -> &Span {
        match self {
            Expression::Identifier(ident) => &ident.span,
            Expression::Integer { span, .. }
            | Expression::Float { span, .. }
            | Expression::StringLiteral { span, .. }
            | Expression::Boolean { span, .. }
            | Expression::Duration { span, .. }
            | Expression::Ip { span, .. }
            | Expression::Unary { span, .. }
            | Expression::Binary { span, .. }
            | Expression::Grouping { span, .. }
            | Expression::Member { span, .. }
            | Expression::Call { span, .. }
            | Expression::ObjectLiteral { span, .. } => span,
        }
    }
}
