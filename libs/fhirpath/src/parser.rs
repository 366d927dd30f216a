//! FHIRPath parser
//!
//! Recursive descent, one level per precedence tier (lowest first):
//! implies, or/xor, and, membership (in/contains), equality, inequality,
//! type (is/as), union, additive, multiplicative, unary polarity, then the
//! postfix chain of `.name`, `.name(args)` and `[expr]`.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::ast::{BinaryOp, Expr, TypeOperator, TypeSpecifier, UnaryOp};
use crate::error::{Error, Result};
use crate::lexer::Lexer;
use crate::temporal;
use crate::token::{Token, TokenKind};

const MAX_DEPTH: usize = 200;

pub struct Parser {
    lexer: Lexer,
    current: Token,
    depth: usize,
}

/// Parse a complete expression.
pub fn parse(input: &str) -> Result<Expr> {
    Parser::new(input).parse_all()
}

impl Parser {
    pub fn new(input: &str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            depth: 0,
        }
    }

    fn bump(&mut self) -> Token {
        std::mem::replace(&mut self.current, self.lexer.next_token())
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn at_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current.kind)
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        // Error tokens carry their own message from the lexer.
        if self.current.kind == TokenKind::Error {
            Error::parse(
                self.current.text.clone(),
                self.current.line,
                self.current.column,
            )
        } else {
            Error::parse(message, self.current.line, self.current.column)
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.error_here(format!(
                "expected {expected}, found '{}'",
                describe(&self.current)
            )))
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error_here(format!(
                "expression nesting exceeds {MAX_DEPTH} levels"
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    pub fn parse_all(&mut self) -> Result<Expr> {
        let expr = self.parse_expression()?;
        if !self.at(TokenKind::Eof) {
            return Err(self.error_here(format!(
                "expected end of expression, found '{}'",
                describe(&self.current)
            )));
        }
        Ok(expr)
    }

    fn parse_expression(&mut self) -> Result<Expr> {
        self.enter()?;
        let expr = self.parse_implies();
        self.leave();
        expr
    }

    fn parse_implies(&mut self) -> Result<Expr> {
        let mut left = self.parse_or()?;
        while self.at(TokenKind::Implies) {
            self.bump();
            let right = self.parse_or()?;
            left = binary(BinaryOp::Implies, left, right);
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.at_any(&[TokenKind::Or, TokenKind::Xor]) {
            let op = if self.bump().kind == TokenKind::Or {
                BinaryOp::Or
            } else {
                BinaryOp::Xor
            };
            let right = self.parse_and()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_membership()?;
        while self.at(TokenKind::And) {
            self.bump();
            let right = self.parse_membership()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_membership(&mut self) -> Result<Expr> {
        let mut left = self.parse_equality()?;
        while self.at_any(&[TokenKind::In, TokenKind::Contains]) {
            let op = if self.bump().kind == TokenKind::In {
                BinaryOp::In
            } else {
                BinaryOp::Contains
            };
            let right = self.parse_equality()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        let mut left = self.parse_inequality()?;
        while self.at_any(&[
            TokenKind::Equal,
            TokenKind::NotEqual,
            TokenKind::Equivalent,
            TokenKind::NotEquivalent,
        ]) {
            let op = match self.bump().kind {
                TokenKind::Equal => BinaryOp::Equal,
                TokenKind::NotEqual => BinaryOp::NotEqual,
                TokenKind::Equivalent => BinaryOp::Equivalent,
                _ => BinaryOp::NotEquivalent,
            };
            let right = self.parse_inequality()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_inequality(&mut self) -> Result<Expr> {
        let mut left = self.parse_type_op()?;
        while self.at_any(&[
            TokenKind::Less,
            TokenKind::LessEqual,
            TokenKind::Greater,
            TokenKind::GreaterEqual,
        ]) {
            let op = match self.bump().kind {
                TokenKind::Less => BinaryOp::Less,
                TokenKind::LessEqual => BinaryOp::LessEqual,
                TokenKind::Greater => BinaryOp::Greater,
                _ => BinaryOp::GreaterEqual,
            };
            let right = self.parse_type_op()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_type_op(&mut self) -> Result<Expr> {
        let mut left = self.parse_union()?;
        while self.at_any(&[TokenKind::Is, TokenKind::As]) {
            let op = if self.bump().kind == TokenKind::Is {
                TypeOperator::Is
            } else {
                TypeOperator::As
            };
            let type_specifier = self.parse_type_specifier()?;
            left = Expr::TypeOp {
                op,
                operand: Box::new(left),
                type_specifier,
            };
        }
        Ok(left)
    }

    fn parse_union(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive()?;
        while self.at(TokenKind::Pipe) {
            self.bump();
            let right = self.parse_additive()?;
            left = binary(BinaryOp::Union, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        while self.at_any(&[TokenKind::Plus, TokenKind::Minus, TokenKind::Ampersand]) {
            let op = match self.bump().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => BinaryOp::Concat,
            };
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        while self.at_any(&[
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Div,
            TokenKind::Mod,
        ]) {
            let op = match self.bump().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Div => BinaryOp::IntDiv,
                _ => BinaryOp::Mod,
            };
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.at_any(&[TokenKind::Plus, TokenKind::Minus]) {
            let negative = self.bump().kind == TokenKind::Minus;

            // A sign directly before a numeric literal folds into it, so
            // `-3.fhirpath()` and `-5 'mg'` keep their natural meaning.
            if negative && self.at_any(&[TokenKind::Number, TokenKind::LongNumber]) {
                let literal = self.parse_number_literal(true)?;
                return self.parse_postfix_from(literal);
            }

            self.enter()?;
            let operand = self.parse_unary();
            self.leave();
            let op = if negative { UnaryOp::Minus } else { UnaryOp::Plus };
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand?),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let term = self.parse_term()?;
        self.parse_postfix_from(term)
    }

    fn parse_postfix_from(&mut self, mut expr: Expr) -> Result<Expr> {
        loop {
            if self.at(TokenKind::Dot) {
                self.bump();
                expr = self.parse_invocation(Some(expr))?;
            } else if self.at(TokenKind::OpenBracket) {
                self.bump();
                let index = self.parse_expression()?;
                self.expect(TokenKind::CloseBracket, "']'")?;
                expr = Expr::Indexer {
                    receiver: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    /// A member or function invocation; `receiver` is `None` at the head of
    /// an expression.
    fn parse_invocation(&mut self, receiver: Option<Expr>) -> Result<Expr> {
        match self.current.kind {
            TokenKind::This | TokenKind::Index | TokenKind::Total | TokenKind::Resource
                if receiver.is_none() =>
            {
                let node = match self.bump().kind {
                    TokenKind::This => Expr::This,
                    TokenKind::Index => Expr::Index,
                    TokenKind::Total => Expr::Total,
                    _ => Expr::ResourceRef,
                };
                Ok(node)
            }
            // Operator keywords double as ordinary names after a dot
            // (`value.contains('x')`, `collection.is(Type)`).
            TokenKind::Identifier
            | TokenKind::DelimitedIdentifier
            | TokenKind::Contains
            | TokenKind::In
            | TokenKind::As
            | TokenKind::Is
            | TokenKind::Div
            | TokenKind::Mod => {
                let delimited = self.current.kind == TokenKind::DelimitedIdentifier;
                let name = self.bump().text;
                if self.at(TokenKind::OpenParen) {
                    self.bump();
                    let args = self.parse_arguments()?;
                    Ok(Expr::Invocation {
                        receiver: receiver.map(Box::new),
                        function: name,
                        args,
                    })
                } else {
                    match receiver {
                        Some(inner) => Ok(Expr::Path {
                            receiver: Box::new(inner),
                            name,
                        }),
                        None if delimited => Ok(Expr::DelimitedIdentifier(name)),
                        None => Ok(Expr::Identifier(name)),
                    }
                }
            }
            _ => Err(self.error_here(format!(
                "expected an identifier or function call, found '{}'",
                describe(&self.current)
            ))),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.at(TokenKind::CloseParen) {
            self.bump();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if self.at(TokenKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "')' or ','")?;
        Ok(args)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        match self.current.kind {
            TokenKind::OpenParen => {
                self.bump();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::CloseParen, "')'")?;
                Ok(expr)
            }
            TokenKind::OpenBrace => {
                self.bump();
                let mut elements = Vec::new();
                if !self.at(TokenKind::CloseBrace) {
                    loop {
                        elements.push(self.parse_expression()?);
                        if self.at(TokenKind::Comma) {
                            self.bump();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::CloseBrace, "'}' or ','")?;
                Ok(Expr::Collection(elements))
            }
            TokenKind::Variable => Ok(Expr::Variable(self.bump().text)),
            TokenKind::True => {
                self.bump();
                Ok(Expr::Boolean(true))
            }
            TokenKind::False => {
                self.bump();
                Ok(Expr::Boolean(false))
            }
            TokenKind::Str => Ok(Expr::StringLit(self.bump().text)),
            TokenKind::Number | TokenKind::LongNumber => self.parse_number_literal(false),
            TokenKind::DateLiteral => {
                let token = self.bump();
                let (value, precision) = temporal::parse_date(&token.text).ok_or_else(|| {
                    Error::parse(
                        format!("invalid date literal '@{}'", token.text),
                        token.line,
                        token.column,
                    )
                })?;
                Ok(Expr::Date(value, precision))
            }
            TokenKind::DateTimeLiteral => {
                let token = self.bump();
                let (value, precision, offset) = temporal::parse_datetime(&token.text)
                    .ok_or_else(|| {
                        Error::parse(
                            format!("invalid datetime literal '@{}'", token.text),
                            token.line,
                            token.column,
                        )
                    })?;
                Ok(Expr::DateTime(value, precision, offset))
            }
            TokenKind::TimeLiteral => {
                let token = self.bump();
                let (value, precision) = temporal::parse_time(&token.text).ok_or_else(|| {
                    Error::parse(
                        format!("invalid time literal '@T{}'", token.text),
                        token.line,
                        token.column,
                    )
                })?;
                Ok(Expr::Time(value, precision))
            }
            _ => self.parse_invocation(None),
        }
    }

    /// Number, long number or quantity literal, optionally negated.
    fn parse_number_literal(&mut self, negative: bool) -> Result<Expr> {
        let token = self.bump();
        let mut text = token.text.clone();
        if negative {
            text.insert(0, '-');
        }

        let unit = self.parse_quantity_unit();
        if let Some(unit) = unit {
            let value = Decimal::from_str(&text).map_err(|e| {
                Error::parse(format!("invalid number '{text}': {e}"), token.line, token.column)
            })?;
            return Ok(Expr::Quantity { value, unit });
        }

        if token.kind == TokenKind::LongNumber {
            let value = i64::from_str(&text).map_err(|e| {
                Error::parse(format!("invalid long literal '{text}': {e}"), token.line, token.column)
            })?;
            return Ok(Expr::Long(value));
        }

        if text.contains('.') {
            let value = Decimal::from_str(&text).map_err(|e| {
                Error::parse(format!("invalid decimal '{text}': {e}"), token.line, token.column)
            })?;
            Ok(Expr::Decimal(value))
        } else {
            let value = i64::from_str(&text).map_err(|e| {
                Error::parse(format!("invalid integer '{text}': {e}"), token.line, token.column)
            })?;
            Ok(Expr::Integer(value))
        }
    }

    /// A quantity unit directly after a number: a quoted UCUM string or a
    /// calendar duration keyword.
    fn parse_quantity_unit(&mut self) -> Option<String> {
        if self.at(TokenKind::Str) {
            return Some(self.bump().text);
        }
        if self.at(TokenKind::Identifier) && lumen_ucum::is_calendar_unit(&self.current.text) {
            return Some(self.bump().text);
        }
        None
    }

    fn parse_type_specifier(&mut self) -> Result<TypeSpecifier> {
        let mut parts = Vec::new();
        let first = self.expect_identifier("a type name")?;
        parts.push(first);
        while self.at(TokenKind::Dot) {
            self.bump();
            parts.push(self.expect_identifier("a type name after '.'")?);
        }
        Ok(TypeSpecifier::new(parts))
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<String> {
        if self.at_any(&[TokenKind::Identifier, TokenKind::DelimitedIdentifier]) {
            Ok(self.bump().text)
        } else {
            Err(self.error_here(format!(
                "expected {expected}, found '{}'",
                describe(&self.current)
            )))
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => "end of expression".to_string(),
        _ => token.text.clone(),
    }
}
