//! Forward-only VCL lexer with precise position tracking.
//!
//! Turns raw VCL source into a lazy token sequence terminated by an
//! end-of-input sentinel. Every token records the exact byte region it was
//! cut from, so downstream stages can re-locate any construct in the
//! original text:
//!
//! - Whitespace is skipped; comments are emitted as real tokens so
//!   comment-aware tooling can reuse the same stream (the parser skips them
//!   during its advance step).
//! - Inline source blocks (`C{ ... }C`) are captured as one atomic token.
//! - The lexer never fails. Unrecognized or unterminated input becomes an
//!   error token; the parser decides what to do with it.
//!
//! # Usage
//!
//! ```
//! use vcl_lexer::{Lexer, TokenKind};
//!
//! let mut lexer = Lexer::new("vcl 4.0;", None);
//! let tokens = lexer.by_ref().collect::<Vec<_>>();
//! assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
//! ```

mod error;
mod position;
mod token;

pub use error::LexerError;
pub use position::{Position, Span};
pub use token::{Keyword, Token, TokenKind};

use memchr::{memchr, memmem};
use std::sync::Arc;

/// Forward-only tokenizer over one source text.
///
/// Restartable only in the trivial sense of being reconstructible from the
/// original text. The iterator yields every token including the trailing
/// [`TokenKind::Eof`] sentinel, then ends.
pub struct Lexer<'a> {
    src: &'a str,
    pos: Position,
    finished: bool,
    last_error: Option<LexerError>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `src`, optionally tagged with a file identifier.
    ///
    /// The file identifier ends up on every emitted position, which is what
    /// lets spans survive include splicing.
    pub fn new(src: &'a str, file: Option<Arc<str>>) -> Self {
        Lexer {
            src,
            pos: Position::start(file),
            finished: false,
            last_error: None,
        }
    }

    /// Collect the whole token stream, EOF sentinel included.
    pub fn tokenize(src: &'a str, file: Option<Arc<str>>) -> Vec<Token> {
        Lexer::new(src, file).collect()
    }

    /// The classification of the most recent error token.
    ///
    /// Valid immediately after [`Lexer::next_token`] returned a token of
    /// kind [`TokenKind::Error`]; taking it resets the slot.
    pub fn take_error(&mut self) -> Option<LexerError> {
        self.last_error.take()
    }

    /// Produce the next token, or `None` once the EOF sentinel was handed out.
    pub fn next_token(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        self.skip_whitespace();

        if self.rest().is_empty() {
            self.finished = true;
            let span = Span::new(self.pos.clone(), self.pos.clone());
            return Some(Token::new(TokenKind::Eof, "", span));
        }

        let start = self.pos.clone();
        let rest = self.rest();
        // Unwrap-free: rest is non-empty here.
        let Some(ch) = rest.chars().next() else {
            self.finished = true;
            let span = Span::new(self.pos.clone(), self.pos.clone());
            return Some(Token::new(TokenKind::Eof, "", span));
        };

        let kind = match ch {
            '#' => self.scan_line_comment(),
            '/' if rest.starts_with("//") => self.scan_line_comment(),
            '/' if rest.starts_with("/*") => self.scan_block_comment(),
            '"' => self.scan_string(),
            'C' if rest.starts_with("C{") => self.scan_inline_source(),
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(),
            c if c.is_ascii_digit() => self.scan_number(),
            _ => self.scan_operator(ch),
        };

        let end = self.pos.clone();
        let text = &self.src[start.offset..end.offset];
        Some(Token::new(kind, text, Span::new(start, end)))
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos.offset..]
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.rest().chars().next()?;
        self.pos.advance(ch);
        Some(ch)
    }

    /// Advance over `n` bytes known to be ASCII.
    fn bump_bytes(&mut self, n: usize) {
        let text = &self.src[self.pos.offset..self.pos.offset + n];
        self.pos.advance_str(text);
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.rest().chars().next() {
            if ch.is_ascii_whitespace() {
                self.pos.advance(ch);
            } else {
                break;
            }
        }
    }

    fn scan_line_comment(&mut self) -> TokenKind {
        let rest = self.rest();
        let len = memchr(b'\n', rest.as_bytes()).unwrap_or(rest.len());
        self.pos.advance_str(&rest[..len]);
        TokenKind::Comment
    }

    fn scan_block_comment(&mut self) -> TokenKind {
        let offset = self.pos.offset;
        let rest = self.rest();
        match memmem::find(&rest.as_bytes()[2..], b"*/") {
            Some(idx) => {
                self.pos.advance_str(&rest[..2 + idx + 2]);
                TokenKind::Comment
            }
            None => {
                self.pos.advance_str(rest);
                self.last_error = Some(LexerError::UnterminatedComment { offset });
                TokenKind::Error
            }
        }
    }

    /// Scan a double-quoted string. The lexeme keeps the raw text including
    /// both quotes; the parser strips them when materializing the literal.
    /// Strings do not span lines.
    fn scan_string(&mut self) -> TokenKind {
        let offset = self.pos.offset;
        self.bump_bytes(1); // opening quote
        loop {
            match self.rest().chars().next() {
                Some('"') => {
                    self.bump_bytes(1);
                    return TokenKind::String;
                }
                Some('\n') | None => {
                    self.last_error = Some(LexerError::UnterminatedString { offset });
                    return TokenKind::Error;
                }
                Some(ch) => {
                    self.pos.advance(ch);
                }
            }
        }
    }

    fn scan_inline_source(&mut self) -> TokenKind {
        let offset = self.pos.offset;
        let rest = self.rest();
        match memmem::find(&rest.as_bytes()[2..], b"}C") {
            Some(idx) => {
                self.pos.advance_str(&rest[..2 + idx + 2]);
                TokenKind::InlineSource
            }
            None => {
                self.pos.advance_str(rest);
                self.last_error = Some(LexerError::UnterminatedInlineSource { offset });
                TokenKind::Error
            }
        }
    }

    /// Identifiers are `[A-Za-z_][A-Za-z0-9_\-]*`. The dash is part of the
    /// identifier alphabet (HTTP header names); `a - b` needs the spaces.
    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos.offset;
        self.bump_bytes(1);
        while let Some(ch) = self.rest().chars().next() {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                self.pos.advance(ch);
            } else {
                break;
            }
        }
        let text = &self.src[start..self.pos.offset];
        match Keyword::lookup(text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier,
        }
    }

    /// Numerals split integer vs. floating by the presence of a dot. A
    /// trailing dot without digits stays outside the numeral (`4.` is
    /// integer `4` then `.`), so member access after a numeral still works.
    /// Duration suffixes are not the lexer's business: `30s` tokenizes as
    /// numeral `30` plus identifier `s`, merged by the parser.
    fn scan_number(&mut self) -> TokenKind {
        while let Some(ch) = self.rest().chars().next() {
            if ch.is_ascii_digit() {
                self.pos.advance(ch);
            } else {
                break;
            }
        }
        let rest = self.rest();
        let mut chars = rest.chars();
        if chars.next() == Some('.') && chars.next().is_some_and(|c| c.is_ascii_digit()) {
            self.bump_bytes(1); // dot
            while let Some(ch) = self.rest().chars().next() {
                if ch.is_ascii_digit() {
                    self.pos.advance(ch);
                } else {
                    break;
                }
            }
            return TokenKind::Float;
        }
        TokenKind::Integer
    }

    fn scan_operator(&mut self, first: char) -> TokenKind {
        let rest = self.rest();
        let two = |s: &str| rest.starts_with(s);
        let (kind, len) = match first {
            '(' => (TokenKind::LeftParen, 1),
            ')' => (TokenKind::RightParen, 1),
            '[' => (TokenKind::LeftBracket, 1),
            ']' => (TokenKind::RightBracket, 1),
            '{' => (TokenKind::LeftBrace, 1),
            '}' => (TokenKind::RightBrace, 1),
            ';' => (TokenKind::Semicolon, 1),
            ',' => (TokenKind::Comma, 1),
            '.' => (TokenKind::Dot, 1),
            '+' if two("+=") => (TokenKind::AddAssign, 2),
            '+' => (TokenKind::Plus, 1),
            '-' if two("-=") => (TokenKind::SubAssign, 2),
            '-' => (TokenKind::Minus, 1),
            '*' if two("*=") => (TokenKind::MulAssign, 2),
            '*' => (TokenKind::Star, 1),
            '/' if two("/=") => (TokenKind::DivAssign, 2),
            '/' => (TokenKind::Slash, 1),
            '=' if two("==") => (TokenKind::Eq, 2),
            '=' => (TokenKind::Assign, 1),
            '!' if two("!=") => (TokenKind::Ne, 2),
            '!' if two("!~") => (TokenKind::NotMatch, 2),
            '!' => (TokenKind::Bang, 1),
            '<' if two("<=") => (TokenKind::Le, 2),
            '<' => (TokenKind::Lt, 1),
            '>' if two(">=") => (TokenKind::Ge, 2),
            '>' => (TokenKind::Gt, 1),
            '~' => (TokenKind::Match, 1),
            '&' if two("&&") => (TokenKind::And, 2),
            '|' if two("||") => (TokenKind::Or, 2),
            _ => {
                let offset = self.pos.offset;
                self.bump();
                self.last_error = Some(LexerError::UnrecognizedChar { ch: first, offset });
                return TokenKind::Error;
            }
        };
        self.bump_bytes(len);
        kind
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}
