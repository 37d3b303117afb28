//! Main VCL parser implementation.
//!
//! A single-pass recursive-descent parser with a Pratt-style precedence
//! climbing loop for expressions. State is (current token, peek token); the
//! parser looks ahead exactly one token. Comments are skipped during the
//! advance step, error tokens from the lexer become lexical diagnostics,
//! and everything else flows through the grammar.
//!
//! Errors accumulate: the parser resynchronizes at declaration and
//! statement boundaries and keeps going until the configured diagnostic
//! bound is reached. Callers always receive a program, possibly partial,
//! plus the collected diagnostics — the two are independent outcomes.

mod declarations;
mod expressions;
mod statements;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::debug;
use vcl_ast::{Declaration, Ident, Program, VersionDecl};
use vcl_error::{Diagnostic, DiagnosticList, Stage};
use vcl_lexer::{Keyword, Lexer, Span, Token, TokenKind};

/// Tuning knobs for one parser instance.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Stop after this many diagnostics; zero disables the limit.
    pub max_errors: usize,
    /// Treat `C{ ... }C` blocks as errors instead of statements.
    pub reject_inline_source: bool,
    /// Require `return (action);` — disabling this reproduces the older
    /// grammar that also accepted `return action;`.
    pub require_parenthesized_return: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            max_errors: 8,
            reject_inline_source: false,
            require_parenthesized_return: true,
        }
    }
}

/// What a parse run produces: an AST (possibly partial) and whatever
/// diagnostics were collected. An empty diagnostic list means the program
/// parsed cleanly; a non-empty one still comes with useful partial
/// structure.
#[derive(Debug)]
pub struct ParseOutcome {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
}

/// Signal that the current construct cannot continue; the thrower has
/// already recorded a diagnostic and the catcher resynchronizes.
pub(crate) struct AbortParse;

pub(crate) type PResult<T> = Result<T, AbortParse>;

/// Single-pass VCL parser over one source text.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    source: Arc<str>,
    pub(crate) current: Token,
    pub(crate) peek: Token,
    eof: Token,
    pub(crate) config: ParserConfig,
    diagnostics: DiagnosticList,
}

impl<'a> Parser<'a> {
    /// Create a parser with default configuration.
    pub fn new(source: &'a str, file: Option<Arc<str>>) -> Self {
        Parser::with_config(source, file, ParserConfig::default())
    }

    /// Create a parser with explicit configuration.
    pub fn with_config(source: &'a str, file: Option<Arc<str>>, config: ParserConfig) -> Self {
        let mut lexer = Lexer::new(source, file);
        let shared: Arc<str> = Arc::from(source);
        let mut diagnostics = DiagnosticList::with_limit(config.max_errors);
        // Pre-fill the two-token window. The EOF sentinel doubles as the
        // fallback once the stream is exhausted.
        let eof = Token::new(TokenKind::Eof, "", Span::default());
        let current = fetch_significant(&mut lexer, &shared, &mut diagnostics).unwrap_or_else(|| eof.clone());
        let peek = fetch_significant(&mut lexer, &shared, &mut diagnostics).unwrap_or_else(|| eof.clone());
        Parser {
            lexer,
            source: shared,
            current,
            peek,
            eof,
            config,
            diagnostics,
        }
    }

    /// Parse `source` in one call with default configuration.
    pub fn parse_source(source: &str, file: Option<Arc<str>>) -> ParseOutcome {
        Parser::new(source, file).parse()
    }

    /// Run the parser to completion.
    pub fn parse(mut self) -> ParseOutcome {
        let start = self.current.span.start.clone();

        let version = match self.parse_version_declaration() {
            Some(version) => version,
            None => {
                // The version declaration is the price of admission; without
                // it the file is not parsed further.
                let span = Span::new(start, self.current.span.end.clone());
                return self.finish(Program { version: None, declarations: Vec::new(), span });
            }
        };

        let mut declarations = Vec::new();
        while !self.at_eof() && !self.diagnostics.is_full() {
            match self.parse_declaration() {
                Ok(declaration) => declarations.push(declaration),
                Err(AbortParse) => self.resync_declaration(),
            }
        }

        let span = Span::new(start, self.current.span.end.clone());
        self.finish(Program { version: Some(version), declarations, span })
    }

    fn finish(self, program: Program) -> ParseOutcome {
        let diagnostics = self.diagnostics.into_vec();
        debug!(
            declarations = program.declarations.len(),
            diagnostics = diagnostics.len(),
            "parse finished"
        );
        ParseOutcome { program, diagnostics }
    }

    /// `vcl <major>.<minor>;` — must be the first thing in the file. Its
    /// absence (or a broken one) yields exactly one diagnostic and ends the
    /// parse with no declarations.
    fn parse_version_declaration(&mut self) -> Option<VersionDecl> {
        if self.current.keyword() != Some(Keyword::Vcl) {
            self.error_here("program must begin with a version declaration ('vcl <major>.<minor>;')");
            return None;
        }
        let kw = self.current.clone();
        self.advance();

        if self.current.kind != TokenKind::Float {
            self.error_here("expected version numeral after 'vcl'");
            return None;
        }
        let numeral = self.current.clone();
        self.advance();

        if self.current.kind != TokenKind::Semicolon {
            self.error_here("expected ';' after version declaration");
            return None;
        }
        let semi = self.current.clone();
        self.advance();

        Some(VersionDecl {
            version: numeral.text,
            span: kw.span.join(&semi.span),
        })
    }

    fn parse_declaration(&mut self) -> PResult<Declaration> {
        match self.current.keyword() {
            Some(Keyword::Import) => self.parse_import(),
            Some(Keyword::Include) => self.parse_include(),
            Some(Keyword::Backend) => self.parse_backend(),
            Some(Keyword::Probe) => self.parse_probe(),
            Some(Keyword::Acl) => self.parse_acl(),
            Some(Keyword::Sub) => self.parse_sub(),
            _ => {
                self.error_here("expected a declaration (import, include, backend, probe, acl, or sub)");
                Err(AbortParse)
            }
        }
    }

    /// Skip forward to the next token that can start a declaration. Always
    /// makes progress, even when the bad token itself is such a keyword.
    fn resync_declaration(&mut self) {
        if !self.at_eof() {
            self.advance();
        }
        while !self.at_eof() {
            if matches!(
                self.current.keyword(),
                Some(
                    Keyword::Import
                        | Keyword::Include
                        | Keyword::Backend
                        | Keyword::Probe
                        | Keyword::Acl
                        | Keyword::Sub
                )
            ) {
                return;
            }
            self.advance();
        }
    }

    // --- token window -----------------------------------------------------

    pub(crate) fn advance(&mut self) {
        let next = fetch_significant(&mut self.lexer, &self.source, &mut self.diagnostics)
            .unwrap_or_else(|| self.eof.clone());
        self.current = std::mem::replace(&mut self.peek, next);
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Consume the current token when it matches; report and abort when it
    /// does not.
    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> PResult<Token> {
        if self.current.kind == kind {
            let token = self.current.clone();
            self.advance();
            Ok(token)
        } else {
            self.error_here(format!("expected {what}, found {}", describe(&self.current)));
            Err(AbortParse)
        }
    }

    /// Consume an identifier, accepting action keywords in identifier
    /// position.
    pub(crate) fn expect_identifier(&mut self, what: &str) -> PResult<Ident> {
        if self.current.kind.is_identifier_like() {
            let token = self.current.clone();
            self.advance();
            Ok(Ident { name: token.text, span: token.span })
        } else {
            self.error_here(format!("expected {what}, found {}", describe(&self.current)));
            Err(AbortParse)
        }
    }

    /// Whether two consecutive tokens touch with no whitespace in between.
    pub(crate) fn adjacent(left: &Token, right: &Token) -> bool {
        left.span.end.offset == right.span.start.offset
    }

    // --- diagnostics ------------------------------------------------------

    pub(crate) fn error_here(&mut self, message: impl Into<String>) {
        let diagnostic = Diagnostic::error(
            Stage::Parse,
            message,
            &self.current.span.start,
            self.current.text.clone(),
        )
        .with_source(self.source.clone());
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn error_at(&mut self, token: &Token, message: impl Into<String>) {
        let diagnostic =
            Diagnostic::error(Stage::Parse, message, &token.span.start, token.text.clone())
                .with_source(self.source.clone());
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn saturated(&self) -> bool {
        self.diagnostics.is_full()
    }
}

/// Pull the next parser-visible token: comments are skipped, lexer error
/// tokens are converted into lexical diagnostics and skipped.
fn fetch_significant(
    lexer: &mut Lexer<'_>,
    source: &Arc<str>,
    diagnostics: &mut DiagnosticList,
) -> Option<Token> {
    loop {
        let token = lexer.next_token()?;
        match token.kind {
            TokenKind::Comment => continue,
            TokenKind::Error => {
                let message = match lexer.take_error() {
                    Some(error) => error.to_string(),
                    None => "unrecognized input".to_string(),
                };
                let diagnostic =
                    Diagnostic::error(Stage::Lex, message, &token.span.start, token.text.clone())
                        .with_source(source.clone());
                diagnostics.push(diagnostic);
                continue;
            }
            _ => return Some(token),
        }
    }
}

/// Human-readable rendering of a token for error messages.
pub(crate) fn describe(token: &Token) -> String {
    if token.kind == TokenKind::Eof {
        "end of input".to_string()
    } else {
        format!("'{}'", token.text)
    }
}
