//! Top-level declaration grammar: import, include, backend, probe, acl,
//! and subroutine declarations.

use super::{AbortParse, PResult, Parser};
use vcl_ast::{AclEntry, Declaration, ObjectProperty};
use vcl_lexer::TokenKind;

impl Parser<'_> {
    /// `import <module> [as <alias>];`
    ///
    /// `as` is a contextual keyword: it only means aliasing between two
    /// identifiers in an import declaration.
    pub(crate) fn parse_import(&mut self) -> PResult<Declaration> {
        let kw = self.current.clone();
        self.advance();
        let name = self.expect_identifier("module name after 'import'")?;

        let alias = if self.current.kind == TokenKind::Identifier
            && &*self.current.text == "as"
            && self.peek.kind.is_identifier_like()
        {
            self.advance();
            Some(self.expect_identifier("alias after 'as'")?)
        } else {
            None
        };

        let semi = self.expect(TokenKind::Semicolon, "';' after import declaration")?;
        Ok(Declaration::Import {
            name,
            alias,
            span: kw.span.join(&semi.span),
        })
    }

    /// `include "path";`
    pub(crate) fn parse_include(&mut self) -> PResult<Declaration> {
        let kw = self.current.clone();
        self.advance();
        let path = self.expect(TokenKind::String, "quoted path after 'include'")?;
        let semi = self.expect(TokenKind::Semicolon, "';' after include declaration")?;
        Ok(Declaration::Include {
            path: strip_quotes(&path.text).into(),
            span: kw.span.join(&semi.span),
        })
    }

    /// `backend <name> { .prop = value; ... }`
    pub(crate) fn parse_backend(&mut self) -> PResult<Declaration> {
        let kw = self.current.clone();
        self.advance();
        let name = self.expect_identifier("backend name")?;
        self.expect(TokenKind::LeftBrace, "'{' to open backend body")?;
        let properties = self.parse_property_list()?;
        let close = self.expect(TokenKind::RightBrace, "'}' to close backend body")?;
        Ok(Declaration::Backend {
            name,
            properties,
            span: kw.span.join(&close.span),
        })
    }

    /// `probe <name> { .prop = value; ... }`
    pub(crate) fn parse_probe(&mut self) -> PResult<Declaration> {
        let kw = self.current.clone();
        self.advance();
        let name = self.expect_identifier("probe name")?;
        self.expect(TokenKind::LeftBrace, "'{' to open probe body")?;
        let properties = self.parse_property_list()?;
        let close = self.expect(TokenKind::RightBrace, "'}' to close probe body")?;
        Ok(Declaration::Probe {
            name,
            properties,
            span: kw.span.join(&close.span),
        })
    }

    /// Dot-prefixed properties terminated by semicolons, up to (but not
    /// consuming) the closing brace. Shared between backend bodies, probe
    /// bodies, and inline object literals — `.probe = { .url = "/"; }`
    /// parses by the same rules as any other object expression.
    pub(crate) fn parse_property_list(&mut self) -> PResult<Vec<ObjectProperty>> {
        let mut properties = Vec::new();
        while self.check(TokenKind::Dot) {
            let dot = self.current.clone();
            self.advance();
            let name = self.expect_identifier("property name after '.'")?;
            self.expect(TokenKind::Assign, "'=' after property name")?;
            let value = self.parse_expression(0)?;
            let semi = self.expect(TokenKind::Semicolon, "';' after property value")?;
            properties.push(ObjectProperty {
                name,
                value,
                span: dot.span.join(&semi.span),
            });
        }
        if !self.check(TokenKind::RightBrace) {
            self.error_here("expected '.' to start a property or '}' to end the body");
            return Err(AbortParse);
        }
        Ok(properties)
    }

    /// `acl <name> { [!] "address" [/mask]; ... }`
    pub(crate) fn parse_acl(&mut self) -> PResult<Declaration> {
        let kw = self.current.clone();
        self.advance();
        let name = self.expect_identifier("acl name")?;
        self.expect(TokenKind::LeftBrace, "'{' to open acl body")?;

        let mut entries = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.at_eof() {
            let start = self.current.clone();
            let negated = if self.check(TokenKind::Bang) {
                self.advance();
                true
            } else {
                false
            };
            let address = self.expect(TokenKind::String, "quoted address in acl entry")?;
            let mask = if self.check(TokenKind::Slash) {
                self.advance();
                let mask = self.expect(TokenKind::Integer, "mask width after '/'")?;
                match mask.text.parse::<u32>() {
                    Ok(width) => Some(width),
                    Err(_) => {
                        self.error_at(&mask, "mask width is not a valid integer");
                        None
                    }
                }
            } else {
                None
            };
            let semi = self.expect(TokenKind::Semicolon, "';' after acl entry")?;
            entries.push(AclEntry {
                negated,
                address: strip_quotes(&address.text).into(),
                mask,
                span: start.span.join(&semi.span),
            });
        }

        let close = self.expect(TokenKind::RightBrace, "'}' to close acl body")?;
        Ok(Declaration::Acl {
            name,
            entries,
            span: kw.span.join(&close.span),
        })
    }

    /// `sub <name> { ... }`
    pub(crate) fn parse_sub(&mut self) -> PResult<Declaration> {
        let kw = self.current.clone();
        self.advance();
        let name = self.expect_identifier("subroutine name")?;
        let body = self.parse_block()?;
        let span = kw.span.join(&body.span);
        Ok(Declaration::Sub { name, body, span })
    }
}

/// Drop the surrounding double quotes from a string lexeme. The lexer only
/// classifies terminated strings as `TokenKind::String`, so both quotes are
/// present.
pub(crate) fn strip_quotes(lexeme: &str) -> &str {
    lexeme
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(lexeme)
}
