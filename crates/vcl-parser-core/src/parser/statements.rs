//! Statement grammar for subroutine bodies.

use super::{AbortParse, PResult, Parser};
use vcl_ast::{Block, Expression, SetOperator, Spanned, Statement};
use vcl_lexer::{Keyword, Span, TokenKind};

impl Parser<'_> {
    /// `{ statement* }`
    pub(crate) fn parse_block(&mut self) -> PResult<Block> {
        let open = self.expect(TokenKind::LeftBrace, "'{' to open a block")?;
        let mut statements = Vec::new();

        loop {
            if self.check(TokenKind::RightBrace) || self.saturated() {
                break;
            }
            if self.at_eof() {
                self.error_here("unclosed block: expected '}' before end of input");
                let span = Span::new(open.span.start, self.current.span.end.clone());
                return Ok(Block { statements, span });
            }
            match self.parse_statement() {
                Ok(Some(statement)) => statements.push(statement),
                Ok(None) => {}
                Err(AbortParse) => self.resync_statement(),
            }
        }

        let close = self.expect(TokenKind::RightBrace, "'}' to close the block")?;
        Ok(Block {
            statements,
            span: open.span.join(&close.span),
        })
    }

    /// Skip to the next statement boundary: past the nearest semicolon, or
    /// up to a closing brace / end of input.
    fn resync_statement(&mut self) {
        while !self.at_eof() {
            match self.current.kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RightBrace => return,
                _ => self.advance(),
            }
        }
    }

    /// One statement, or `None` for constructs that produce no node (stray
    /// semicolons, rejected inline source).
    fn parse_statement(&mut self) -> PResult<Option<Statement>> {
        match self.current.kind {
            TokenKind::LeftBrace => Ok(Some(Statement::Block(self.parse_block()?))),
            TokenKind::Semicolon => {
                self.advance();
                Ok(None)
            }
            TokenKind::InlineSource => self.parse_inline_source(),
            TokenKind::Keyword(Keyword::Set) => self.parse_set().map(Some),
            TokenKind::Keyword(Keyword::Unset) => self.parse_unset().map(Some),
            TokenKind::Keyword(Keyword::Call) => self.parse_call_statement().map(Some),
            TokenKind::Keyword(Keyword::Return) => self.parse_return().map(Some),
            TokenKind::Keyword(Keyword::Synthetic) => self.parse_synthetic().map(Some),
            TokenKind::Keyword(Keyword::Error) => self.parse_error_statement().map(Some),
            TokenKind::Keyword(Keyword::Restart) => self.parse_restart().map(Some),
            TokenKind::Keyword(Keyword::New) => self.parse_new().map(Some),
            TokenKind::Keyword(Keyword::If) => self.parse_if().map(Some),
            _ if self.can_start_expression() => {
                let expression = self.parse_expression(0)?;
                let semi = self.expect(TokenKind::Semicolon, "';' after expression statement")?;
                let span = expression.span().clone().join(&semi.span);
                Ok(Some(Statement::Expression { expression, span }))
            }
            _ => {
                self.error_here("unexpected token in block");
                self.advance();
                Ok(None)
            }
        }
    }

    fn can_start_expression(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Identifier
                | TokenKind::Integer
                | TokenKind::Float
                | TokenKind::String
                | TokenKind::LeftParen
                | TokenKind::LeftBrace
                | TokenKind::Bang
                | TokenKind::Minus
                | TokenKind::Plus
        ) || self.current.kind.is_identifier_like()
    }

    fn parse_inline_source(&mut self) -> PResult<Option<Statement>> {
        let token = self.current.clone();
        self.advance();
        if self.config.reject_inline_source {
            self.error_at(&token, "inline source blocks are disabled");
            return Ok(None);
        }
        let inner = token
            .text
            .strip_prefix("C{")
            .and_then(|s| s.strip_suffix("}C"))
            .unwrap_or(&token.text);
        Ok(Some(Statement::InlineSource {
            source: inner.into(),
            span: token.span,
        }))
    }

    /// `set <lvalue> <op> <expression>;`
    fn parse_set(&mut self) -> PResult<Statement> {
        let kw = self.current.clone();
        self.advance();
        let target = self.parse_lvalue()?;

        let operator = match self.current.kind {
            TokenKind::Assign => SetOperator::Assign,
            TokenKind::AddAssign => SetOperator::Add,
            TokenKind::SubAssign => SetOperator::Subtract,
            TokenKind::MulAssign => SetOperator::Multiply,
            TokenKind::DivAssign => SetOperator::Divide,
            _ => {
                self.error_here("expected an assignment operator (=, +=, -=, *=, /=)");
                return Err(AbortParse);
            }
        };
        self.advance();

        let value = self.parse_expression(0)?;
        let semi = self.expect(TokenKind::Semicolon, "';' after set statement")?;
        Ok(Statement::Set {
            target,
            operator,
            value,
            span: kw.span.join(&semi.span),
        })
    }

    /// `unset <lvalue>;`
    fn parse_unset(&mut self) -> PResult<Statement> {
        let kw = self.current.clone();
        self.advance();
        let target = self.parse_lvalue()?;
        let semi = self.expect(TokenKind::Semicolon, "';' after unset statement")?;
        Ok(Statement::Unset {
            target,
            span: kw.span.join(&semi.span),
        })
    }

    /// `call <subroutine>;`
    fn parse_call_statement(&mut self) -> PResult<Statement> {
        let kw = self.current.clone();
        self.advance();
        let target = self.expect_identifier("subroutine name after 'call'")?;
        let semi = self.expect(TokenKind::Semicolon, "';' after call statement")?;
        Ok(Statement::Call {
            target,
            span: kw.span.join(&semi.span),
        })
    }

    /// `return;` or `return (action);` — the action is a bare name
    /// (`hash`) or a call form (`synth(404, "Not Found")`).
    fn parse_return(&mut self) -> PResult<Statement> {
        let kw = self.current.clone();
        self.advance();

        if self.check(TokenKind::Semicolon) {
            let semi = self.current.clone();
            self.advance();
            return Ok(Statement::Return {
                action: None,
                span: kw.span.join(&semi.span),
            });
        }

        let action = if self.check(TokenKind::LeftParen) {
            self.advance();
            let action = self.parse_expression(0)?;
            self.expect(TokenKind::RightParen, "')' after return action")?;
            action
        } else {
            if self.config.require_parenthesized_return {
                self.error_here("return action must be parenthesized");
            }
            // Parse the action anyway so later passes still see it.
            self.parse_expression(0)?
        };

        let semi = self.expect(TokenKind::Semicolon, "';' after return statement")?;
        Ok(Statement::Return {
            action: Some(action),
            span: kw.span.join(&semi.span),
        })
    }

    /// `synthetic (<expression>);`
    fn parse_synthetic(&mut self) -> PResult<Statement> {
        let kw = self.current.clone();
        self.advance();
        let value = self.parse_expression(0)?;
        let semi = self.expect(TokenKind::Semicolon, "';' after synthetic statement")?;
        Ok(Statement::Synthetic {
            value,
            span: kw.span.join(&semi.span),
        })
    }

    /// `error;` / `error <status>;` / `error <status> <body>;`
    fn parse_error_statement(&mut self) -> PResult<Statement> {
        let kw = self.current.clone();
        self.advance();

        let mut status = None;
        let mut body = None;
        if !self.check(TokenKind::Semicolon) {
            status = Some(self.parse_expression(0)?);
            if !self.check(TokenKind::Semicolon) {
                body = Some(self.parse_expression(0)?);
            }
        }
        let semi = self.expect(TokenKind::Semicolon, "';' after error statement")?;
        Ok(Statement::Error {
            status,
            body,
            span: kw.span.join(&semi.span),
        })
    }

    /// `restart;`
    fn parse_restart(&mut self) -> PResult<Statement> {
        let kw = self.current.clone();
        self.advance();
        let semi = self.expect(TokenKind::Semicolon, "';' after restart statement")?;
        Ok(Statement::Restart {
            span: kw.span.join(&semi.span),
        })
    }

    /// `new <name> = <module>.<type>(args);`
    fn parse_new(&mut self) -> PResult<Statement> {
        let kw = self.current.clone();
        self.advance();
        let name = self.expect_identifier("instance name after 'new'")?;
        self.expect(TokenKind::Assign, "'=' after instance name")?;
        let constructor = self.parse_expression(0)?;

        // Constructors are syntactically a call on a module.type member.
        let well_formed = matches!(
            &constructor,
            Expression::Call { callee, .. } if matches!(&**callee, Expression::Member { .. })
        );
        if !well_formed {
            self.error_at(&kw, "'new' requires a constructor call of the form module.type(...)");
        }

        let semi = self.expect(TokenKind::Semicolon, "';' after new statement")?;
        Ok(Statement::New {
            name,
            constructor,
            span: kw.span.join(&semi.span),
        })
    }

    /// `if (cond) { ... } [else if ... | elseif ... | else { ... }]`
    fn parse_if(&mut self) -> PResult<Statement> {
        let kw = self.current.clone();
        self.advance();
        self.parse_if_tail(kw.span)
    }

    /// Everything after an `if`-like keyword has the same shape, which is
    /// what makes `elseif`/`elsif`/`elif` chains fold into nested `If`
    /// nodes.
    fn parse_if_tail(&mut self, kw_span: Span) -> PResult<Statement> {
        self.expect(TokenKind::LeftParen, "'(' after 'if'")?;
        let condition = self.parse_expression(0)?;
        self.expect(TokenKind::RightParen, "')' after if condition")?;
        let then_branch = self.parse_block()?;

        let else_branch = match self.current.kind {
            TokenKind::Keyword(Keyword::Else) => {
                self.advance();
                if self.check(TokenKind::Keyword(Keyword::If)) {
                    let nested_kw = self.current.clone();
                    self.advance();
                    Some(Box::new(self.parse_if_tail(nested_kw.span)?))
                } else {
                    Some(Box::new(Statement::Block(self.parse_block()?)))
                }
            }
            TokenKind::Keyword(Keyword::Elseif | Keyword::Elsif | Keyword::Elif) => {
                let nested_kw = self.current.clone();
                self.advance();
                Some(Box::new(self.parse_if_tail(nested_kw.span)?))
            }
            _ => None,
        };

        let end = match &else_branch {
            Some(statement) => statement.span().clone(),
            None => then_branch.span.clone(),
        };
        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
            span: kw_span.join(&end),
        })
    }
}
