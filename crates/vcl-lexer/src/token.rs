//! Token types and structures for the VCL lexer.

use crate::position::Span;
use std::sync::Arc;

/// Reserved words of the VCL grammar.
///
/// The action names used inside `return (...)` are part of this set but
/// double as plain identifiers everywhere else; the parser demotes them in
/// non-return contexts via [`Keyword::is_action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// `vcl` — version declaration, also a return action (`vcl(label)`)
    Vcl,
    /// `import`
    Import,
    /// `include`
    Include,
    /// `backend`
    Backend,
    /// `probe`
    Probe,
    /// `acl`
    Acl,
    /// `sub`
    Sub,
    /// `new`
    New,
    /// `set`
    Set,
    /// `unset`
    Unset,
    /// `call`
    Call,
    /// `return`
    Return,
    /// `if`
    If,
    /// `else`
    Else,
    /// `elseif`
    Elseif,
    /// `elsif`
    Elsif,
    /// `elif`
    Elif,
    /// `synthetic`
    Synthetic,
    /// `error` — statement form and return action
    Error,
    /// `restart` — statement form and return action
    Restart,

    // Return-action names
    /// `hash`
    Hash,
    /// `lookup`
    Lookup,
    /// `pass`
    Pass,
    /// `pipe`
    Pipe,
    /// `fetch`
    Fetch,
    /// `hit`
    Hit,
    /// `miss`
    Miss,
    /// `deliver`
    Deliver,
    /// `purge`
    Purge,
    /// `synth`
    Synth,
    /// `abandon`
    Abandon,
    /// `retry`
    Retry,
    /// `ok`
    Ok,
    /// `fail`
    Fail,
}

/// Static keyword table; exact-match lookup during identifier scanning.
static KEYWORDS: phf::Map<&'static str, Keyword> = phf::phf_map! {
    "vcl" => Keyword::Vcl,
    "import" => Keyword::Import,
    "include" => Keyword::Include,
    "backend" => Keyword::Backend,
    "probe" => Keyword::Probe,
    "acl" => Keyword::Acl,
    "sub" => Keyword::Sub,
    "new" => Keyword::New,
    "set" => Keyword::Set,
    "unset" => Keyword::Unset,
    "call" => Keyword::Call,
    "return" => Keyword::Return,
    "if" => Keyword::If,
    "else" => Keyword::Else,
    "elseif" => Keyword::Elseif,
    "elsif" => Keyword::Elsif,
    "elif" => Keyword::Elif,
    "synthetic" => Keyword::Synthetic,
    "error" => Keyword::Error,
    "restart" => Keyword::Restart,
    "hash" => Keyword::Hash,
    "lookup" => Keyword::Lookup,
    "pass" => Keyword::Pass,
    "pipe" => Keyword::Pipe,
    "fetch" => Keyword::Fetch,
    "hit" => Keyword::Hit,
    "miss" => Keyword::Miss,
    "deliver" => Keyword::Deliver,
    "purge" => Keyword::Purge,
    "synth" => Keyword::Synth,
    "abandon" => Keyword::Abandon,
    "retry" => Keyword::Retry,
    "ok" => Keyword::Ok,
    "fail" => Keyword::Fail,
};

impl Keyword {
    /// Look up a lexeme in the reserved-word table.
    pub fn lookup(text: &str) -> Option<Keyword> {
        KEYWORDS.get(text).copied()
    }

    /// The canonical spelling of the keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Vcl => "vcl",
            Keyword::Import => "import",
            Keyword::Include => "include",
            Keyword::Backend => "backend",
            Keyword::Probe => "probe",
            Keyword::Acl => "acl",
            Keyword::Sub => "sub",
            Keyword::New => "new",
            Keyword::Set => "set",
            Keyword::Unset => "unset",
            Keyword::Call => "call",
            Keyword::Return => "return",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::Elseif => "elseif",
            Keyword::Elsif => "elsif",
            Keyword::Elif => "elif",
            Keyword::Synthetic => "synthetic",
            Keyword::Error => "error",
            Keyword::Restart => "restart",
            Keyword::Hash => "hash",
            Keyword::Lookup => "lookup",
            Keyword::Pass => "pass",
            Keyword::Pipe => "pipe",
            Keyword::Fetch => "fetch",
            Keyword::Hit => "hit",
            Keyword::Miss => "miss",
            Keyword::Deliver => "deliver",
            Keyword::Purge => "purge",
            Keyword::Synth => "synth",
            Keyword::Abandon => "abandon",
            Keyword::Retry => "retry",
            Keyword::Ok => "ok",
            Keyword::Fail => "fail",
        }
    }

    /// Whether this keyword names a return action.
    ///
    /// Action keywords behave as ordinary identifiers outside of a
    /// `return (...)` argument.
    pub fn is_action(&self) -> bool {
        matches!(
            self,
            Keyword::Hash
                | Keyword::Lookup
                | Keyword::Pass
                | Keyword::Pipe
                | Keyword::Fetch
                | Keyword::Hit
                | Keyword::Miss
                | Keyword::Deliver
                | Keyword::Purge
                | Keyword::Synth
                | Keyword::Abandon
                | Keyword::Retry
                | Keyword::Ok
                | Keyword::Fail
                | Keyword::Error
                | Keyword::Restart
                | Keyword::Vcl
        )
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token types for VCL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier: `[A-Za-z_][A-Za-z0-9_\-]*`, minus reserved words
    Identifier,
    /// Integer numeral: `200`
    Integer,
    /// Floating numeral: `4.0`
    Float,
    /// Double-quoted string; the lexeme keeps the surrounding quotes
    String,
    /// Comment (`#`, `//` or `/* */`); emitted, skipped by the parser
    Comment,
    /// Inline source block `C{ ... }C`, captured atomically
    InlineSource,

    // Delimiters
    /// Left parenthesis: (
    LeftParen,
    /// Right parenthesis: )
    RightParen,
    /// Left bracket: [
    LeftBracket,
    /// Right bracket: ]
    RightBracket,
    /// Left brace: {
    LeftBrace,
    /// Right brace: }
    RightBrace,

    // Punctuation
    /// Semicolon: ;
    Semicolon,
    /// Comma: ,
    Comma,
    /// Dot: .
    Dot,

    // Assignment operators
    /// Plain assignment: =
    Assign,
    /// Addition assignment: +=
    AddAssign,
    /// Subtraction assignment: -=
    SubAssign,
    /// Multiplication assignment: *=
    MulAssign,
    /// Division assignment: /=
    DivAssign,

    // Arithmetic operators
    /// Addition: +
    Plus,
    /// Subtraction: -
    Minus,
    /// Multiplication: *
    Star,
    /// Division: /
    Slash,

    // Comparison operators
    /// Equality: ==
    Eq,
    /// Inequality: !=
    Ne,
    /// Less than: <
    Lt,
    /// Less or equal: <=
    Le,
    /// Greater than: >
    Gt,
    /// Greater or equal: >=
    Ge,

    // Regex operators
    /// Regex match: ~
    Match,
    /// Regex mismatch: !~
    NotMatch,

    // Logical operators
    /// Logical and: &&
    And,
    /// Logical or: ||
    Or,
    /// Logical not: !
    Bang,

    /// Reserved word
    Keyword(Keyword),

    /// End of input sentinel
    Eof,
    /// Error token for unrecognized or unterminated input
    Error,
}

impl TokenKind {
    /// Whether a token of this kind can serve as an identifier.
    ///
    /// Action keywords are reserved only inside `return (...)`; in every
    /// other position they read as plain names (`pipe` is a fine backend
    /// name).
    pub fn is_identifier_like(&self) -> bool {
        match self {
            TokenKind::Identifier => true,
            TokenKind::Keyword(kw) => kw.is_action(),
            _ => false,
        }
    }
}

/// Token with position information.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// The raw text of the token, exactly as it appears in the source
    pub text: Arc<str>,
    /// Source region covered by the token; `span.end` is exclusive
    pub span: Span,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, text: impl Into<Arc<str>>, span: Span) -> Self {
        Token { kind, text: text.into(), span }
    }

    /// Byte length of the token.
    pub fn len(&self) -> usize {
        self.span.len()
    }

    /// Check if the token is empty (only the EOF sentinel is).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this token is the end-of-input sentinel.
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// The token's keyword, if it is one.
    pub fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword(kw) => Some(kw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_is_exact() {
        assert_eq!(Keyword::lookup("backend"), Some(Keyword::Backend));
        assert_eq!(Keyword::lookup("Backend"), None);
        assert_eq!(Keyword::lookup("backends"), None);
    }

    #[test]
    fn action_keywords_read_as_identifiers() {
        assert!(TokenKind::Keyword(Keyword::Pipe).is_identifier_like());
        assert!(TokenKind::Keyword(Keyword::Synth).is_identifier_like());
        assert!(!TokenKind::Keyword(Keyword::Sub).is_identifier_like());
        assert!(!TokenKind::Keyword(Keyword::Set).is_identifier_like());
    }

    #[test]
    fn every_keyword_round_trips_through_lookup() {
        for (text, kw) in KEYWORDS.entries() {
            assert_eq!(kw.as_str(), *text);
            assert_eq!(Keyword::lookup(text), Some(*kw));
        }
    }
}
