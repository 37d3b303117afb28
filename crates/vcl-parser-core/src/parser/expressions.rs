//! Pratt expression parsing.
//!
//! The climb state is the minimum precedence the next operator must exceed
//! to bind to the current left-hand expression. Prefix forms (grouping
//! parentheses, object braces, unary operators, literals) seed the loop;
//! member access and call application sit above every binary operator.

use super::declarations::strip_quotes;
use super::{AbortParse, PResult, Parser, describe};
use rustc_hash::FxHashSet;
use vcl_ast::{BinaryOperator, Expression, Ident, NamedArg, Spanned, UnaryOperator};
use vcl_lexer::{Token, TokenKind};

// Precedence levels, lowest to highest.
pub(crate) const LOWEST: u8 = 0;
const OR: u8 = 1;
const AND: u8 = 2;
const EQUALITY: u8 = 3;
const COMPARISON: u8 = 4;
const MATCH: u8 = 5;
const ADDITIVE: u8 = 6;
const MULTIPLICATIVE: u8 = 7;
const UNARY: u8 = 8;
const CALL: u8 = 9;
const MEMBER: u8 = 10;

/// Time-unit suffixes that turn a numeral into a duration literal.
const DURATION_UNITS: &[&str] = &["ms", "s", "us", "ns", "m", "h", "d", "w"];

fn is_duration_unit(text: &str) -> bool {
    DURATION_UNITS.contains(&text)
}

/// Binding power and operator for infix binary tokens.
fn infix_binding(kind: TokenKind) -> Option<(u8, BinaryOperator)> {
    let binding = match kind {
        TokenKind::Or => (OR, BinaryOperator::Or),
        TokenKind::And => (AND, BinaryOperator::And),
        TokenKind::Eq => (EQUALITY, BinaryOperator::Eq),
        TokenKind::Ne => (EQUALITY, BinaryOperator::Ne),
        TokenKind::Lt => (COMPARISON, BinaryOperator::Lt),
        TokenKind::Le => (COMPARISON, BinaryOperator::Le),
        TokenKind::Gt => (COMPARISON, BinaryOperator::Gt),
        TokenKind::Ge => (COMPARISON, BinaryOperator::Ge),
        TokenKind::Match => (MATCH, BinaryOperator::Match),
        TokenKind::NotMatch => (MATCH, BinaryOperator::NotMatch),
        TokenKind::Plus => (ADDITIVE, BinaryOperator::Add),
        TokenKind::Minus => (ADDITIVE, BinaryOperator::Subtract),
        TokenKind::Star => (MULTIPLICATIVE, BinaryOperator::Multiply),
        TokenKind::Slash => (MULTIPLICATIVE, BinaryOperator::Divide),
        _ => return None,
    };
    Some(binding)
}

impl Parser<'_> {
    /// Precedence-climbing loop. The loop is bounded by syntactic end
    /// markers (semicolon, closing delimiters, comma — none of which are
    /// operators) and by `min_precedence` from the parent frame.
    pub(crate) fn parse_expression(&mut self, min_precedence: u8) -> PResult<Expression> {
        let mut left = self.parse_prefix()?;

        loop {
            match self.current.kind {
                TokenKind::Dot if MEMBER > min_precedence => {
                    self.advance();
                    let property = self.expect_identifier("property name after '.'")?;
                    let span = left.span().join(&property.span);
                    left = Expression::Member {
                        object: Box::new(left),
                        property,
                        span,
                    };
                }
                TokenKind::LeftParen if CALL > min_precedence => {
                    left = self.parse_call_arguments(left)?;
                }
                kind => match infix_binding(kind) {
                    // Left-associative: the recursive call passes the
                    // operator's own precedence as the new floor.
                    Some((precedence, operator)) if precedence > min_precedence => {
                        self.advance();
                        let right = self.parse_expression(precedence)?;
                        let span = left.span().join(right.span());
                        left = Expression::Binary {
                            operator,
                            left: Box::new(left),
                            right: Box::new(right),
                            span,
                        };
                    }
                    _ => break,
                },
            }
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> PResult<Expression> {
        match self.current.kind {
            TokenKind::Bang => self.parse_unary(UnaryOperator::Not),
            TokenKind::Minus => self.parse_unary(UnaryOperator::Negate),
            TokenKind::Plus => self.parse_unary(UnaryOperator::Plus),
            TokenKind::LeftParen => {
                let open = self.current.clone();
                self.advance();
                let inner = self.parse_expression(LOWEST)?;
                let close = self.expect(TokenKind::RightParen, "')' to close the group")?;
                Ok(Expression::Grouping {
                    inner: Box::new(inner),
                    span: open.span.join(&close.span),
                })
            }
            TokenKind::LeftBrace => {
                let open = self.current.clone();
                self.advance();
                let properties = self.parse_property_list()?;
                let close = self.expect(TokenKind::RightBrace, "'}' to close the object literal")?;
                Ok(Expression::ObjectLiteral {
                    properties,
                    span: open.span.join(&close.span),
                })
            }
            TokenKind::Integer | TokenKind::Float => self.parse_numeric(),
            TokenKind::String => {
                let token = self.current.clone();
                self.advance();
                Ok(Expression::StringLiteral {
                    value: strip_quotes(&token.text).into(),
                    span: token.span,
                })
            }
            _ if self.current.kind.is_identifier_like() => {
                let token = self.current.clone();
                self.advance();
                match &*token.text {
                    "true" => Ok(Expression::Boolean { value: true, span: token.span }),
                    "false" => Ok(Expression::Boolean { value: false, span: token.span }),
                    _ => Ok(Expression::Identifier(Ident {
                        name: token.text,
                        span: token.span,
                    })),
                }
            }
            _ => {
                self.error_here(format!("expected an expression, found {}", describe(&self.current)));
                Err(AbortParse)
            }
        }
    }

    fn parse_unary(&mut self, operator: UnaryOperator) -> PResult<Expression> {
        let op_token = self.current.clone();
        self.advance();
        let operand = self.parse_expression(UNARY)?;
        let span = op_token.span.join(operand.span());
        Ok(Expression::Unary {
            operator,
            operand: Box::new(operand),
            span,
        })
    }

    /// Numerals, plus the two shapes that start with one:
    ///
    /// - `30s` — a numeral immediately followed by a unit suffix becomes a
    ///   single duration expression spanning both tokens;
    /// - `192.168.0.1` — four dotted octets tokenize as float-dot-float;
    ///   when all pieces touch, they merge into one IP expression.
    fn parse_numeric(&mut self) -> PResult<Expression> {
        let numeral = self.current.clone();
        self.advance();

        if self.current.kind == TokenKind::Identifier
            && Self::adjacent(&numeral, &self.current)
            && is_duration_unit(&self.current.text)
        {
            let unit = self.current.clone();
            self.advance();
            return Ok(Expression::Duration {
                value: parse_f64(&numeral.text),
                unit: unit.text,
                span: numeral.span.join(&unit.span),
            });
        }

        if numeral.kind == TokenKind::Float
            && self.current.kind == TokenKind::Dot
            && Self::adjacent(&numeral, &self.current)
            && self.peek.kind == TokenKind::Float
            && Self::adjacent(&self.current, &self.peek)
        {
            self.advance(); // dot
            let tail = self.current.clone();
            self.advance();
            return Ok(Expression::Ip {
                address: format!("{}.{}", numeral.text, tail.text).into(),
                span: numeral.span.join(&tail.span),
            });
        }

        match numeral.kind {
            TokenKind::Integer => Ok(Expression::Integer {
                value: parse_i64(self, &numeral),
                span: numeral.span,
            }),
            _ => Ok(Expression::Float {
                value: parse_f64(&numeral.text),
                span: numeral.span,
            }),
        }
    }

    /// An assignable path: identifier optionally followed by `.property`
    /// segments. Used by `set` and `unset`, which never take full
    /// expressions on the left.
    pub(crate) fn parse_lvalue(&mut self) -> PResult<Expression> {
        let base = self.expect_identifier("variable name")?;
        let mut lvalue = Expression::Identifier(base);
        while self.check(TokenKind::Dot) {
            self.advance();
            let property = self.expect_identifier("property name after '.'")?;
            let span = lvalue.span().join(&property.span);
            lvalue = Expression::Member {
                object: Box::new(lvalue),
                property,
                span,
            };
        }
        Ok(lvalue)
    }

    /// Call arguments: positional first, then named. Seeing `name =`
    /// commits the parser to the named phase; later positional arguments
    /// and duplicate names are diagnostics, not aborts, so the call node
    /// still materializes for the validator.
    fn parse_call_arguments(&mut self, callee: Expression) -> PResult<Expression> {
        self.expect(TokenKind::LeftParen, "'(' to open the argument list")?;

        let mut args = Vec::new();
        let mut named_args: Vec<NamedArg> = Vec::new();
        let mut seen_names: FxHashSet<String> = FxHashSet::default();
        let mut named_phase = false;

        if !self.check(TokenKind::RightParen) {
            loop {
                if self.current.kind.is_identifier_like() && self.peek.kind == TokenKind::Assign {
                    let name = self.expect_identifier("argument name")?;
                    self.advance(); // '='
                    let value = self.parse_expression(LOWEST)?;
                    named_phase = true;
                    if seen_names.insert(name.name.to_string()) {
                        named_args.push(NamedArg { name, value });
                    } else {
                        let message = format!("duplicate named argument '{}'", name.name);
                        let token =
                            Token::new(TokenKind::Identifier, name.name.clone(), name.span.clone());
                        self.error_at(&token, message);
                    }
                } else {
                    let value = self.parse_expression(LOWEST)?;
                    if named_phase {
                        self.error_at(
                            &token_at(&value),
                            "positional argument not allowed after named arguments",
                        );
                    } else {
                        args.push(value);
                    }
                }

                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let close = self.expect(TokenKind::RightParen, "')' to close the argument list")?;
        let span = callee.span().join(&close.span);
        Ok(Expression::Call {
            callee: Box::new(callee),
            args,
            named_args,
            span,
        })
    }
}

fn parse_i64(parser: &mut Parser<'_>, token: &Token) -> i64 {
    match token.text.parse::<i64>() {
        Ok(value) => value,
        Err(_) => {
            parser.error_at(token, "integer literal out of range");
            0
        }
    }
}

fn parse_f64(text: &str) -> f64 {
    // Numeral lexemes are digit runs with at most one interior dot.
    text.parse::<f64>().unwrap_or(0.0)
}

/// A stand-in token for diagnostics that point at an expression rather
/// than a single token.
fn token_at(expression: &Expression) -> Token {
    Token::new(TokenKind::Identifier, "", expression.span().clone())
}
