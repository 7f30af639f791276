//! Recursive-descent parser producing [`Statement`]s.
//!
//! Precedence, loosest first: `||`, `&&`, comparisons (non-associative),
//! `+ -`, `* / %`, unary `- !`, postfix `.name`, `.name(args)` and `[index]`.

use super::lexer::{tokenize, Spanned, Tok};
use super::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Expr>),
    Var(String),
    SelfRef,
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// `target.name` or `target.name(args)`; `args` is `None` without parentheses
    Member {
        target: Box<Expr>,
        name: String,
        args: Option<Vec<Expr>>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// Left-hand side of an assignment
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Var(String),
    Attr(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expr(Expr),
    Assign { target: Target, value: Expr },
}

/// Parse one action string into a statement
pub fn parse(source: &str) -> Result<Statement, ParseError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
    };
    let statement = parser.statement()?;
    if let Some(extra) = parser.peek_spanned() {
        return Err(ParseError::UnexpectedToken {
            found: extra.tok.describe(),
            expected: "end of expression".into(),
            pos: extra.pos,
        });
    }
    Ok(statement)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|s| &s.tok)
    }

    fn peek_at(&self, offset: usize) -> Option<&Tok> {
        self.tokens.get(self.pos + offset).map(|s| &s.tok)
    }

    fn peek_spanned(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, expected: &Tok) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek_spanned() {
            Some(s) => ParseError::UnexpectedToken {
                found: s.tok.describe(),
                expected: expected.to_string(),
                pos: s.pos,
            },
            None => ParseError::UnexpectedEnd {
                expected: expected.to_string(),
                pos: self.end,
            },
        }
    }

    fn expect(&mut self, expected: Tok) -> Result<(), ParseError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", expected.describe())))
        }
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        match (self.peek(), self.peek_at(1), self.peek_at(2), self.peek_at(3)) {
            (Some(Tok::Ident(name)), Some(Tok::Assign), _, _) => {
                let target = Target::Var(name.clone());
                self.pos += 2;
                let value = self.expr()?;
                Ok(Statement::Assign { target, value })
            }
            (Some(Tok::SelfKw), Some(Tok::Dot), Some(Tok::Ident(name)), Some(Tok::Assign)) => {
                let target = Target::Attr(name.clone());
                self.pos += 4;
                let value = self.expr()?;
                Ok(Statement::Assign { target, value })
            }
            _ => Ok(Statement::Expr(self.expr()?)),
        }
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        self.or()
    }

    fn or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.and()?;
        while self.eat(&Tok::OrOr) {
            let rhs = self.and()?;
            lhs = binary(BinOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.comparison()?;
        while self.eat(&Tok::AndAnd) {
            let rhs = self.comparison()?;
            lhs = binary(BinOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.additive()?;
        let op = match self.peek() {
            Some(Tok::EqEq) => BinOp::Eq,
            Some(Tok::NotEq) => BinOp::Ne,
            Some(Tok::Lt) => BinOp::Lt,
            Some(Tok::Le) => BinOp::Le,
            Some(Tok::Gt) => BinOp::Gt,
            Some(Tok::Ge) => BinOp::Ge,
            _ => return Ok(lhs),
        };
        self.pos += 1;
        let rhs = self.additive()?;
        Ok(binary(op, lhs, rhs))
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Plus) => BinOp::Add,
                Some(Tok::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Star) => BinOp::Mul,
                Some(Tok::Slash) => BinOp::Div,
                Some(Tok::Percent) => BinOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            // The magnitude of i64::MIN only fits once the sign is applied
            Some(Tok::Minus) if self.peek_at(1) == Some(&Tok::Int(i64::MIN.unsigned_abs())) => {
                self.pos += 2;
                return Ok(Expr::Int(i64::MIN));
            }
            Some(Tok::Minus) => UnaryOp::Neg,
            Some(Tok::Bang) => UnaryOp::Not,
            _ => return self.postfix(),
        };
        self.pos += 1;
        let operand = self.unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&Tok::Dot) {
                let name = match self.peek() {
                    Some(Tok::Ident(name)) => name.clone(),
                    _ => return Err(self.unexpected("method or attribute name")),
                };
                self.pos += 1;
                let args = if self.eat(&Tok::LParen) {
                    Some(self.arguments(Tok::RParen)?)
                } else {
                    None
                };
                expr = Expr::Member {
                    target: Box::new(expr),
                    name,
                    args,
                };
            } else if self.eat(&Tok::LBracket) {
                let index = self.expr()?;
                self.expect(Tok::RBracket)?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma-separated expressions up to `close`, which is consumed
    fn arguments(&mut self, close: Tok) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.eat(&close) {
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            if self.eat(&close) {
                return Ok(args);
            }
            self.expect(Tok::Comma)?;
            // trailing comma
            if self.eat(&close) {
                return Ok(args);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let Some(tok) = self.peek().cloned() else {
            return Err(self.unexpected("an expression"));
        };
        let expr = match tok {
            Tok::Int(magnitude) => match i64::try_from(magnitude) {
                Ok(i) => Expr::Int(i),
                Err(_) => {
                    return Err(ParseError::InvalidNumber {
                        text: magnitude.to_string(),
                        pos: self.peek_spanned().map_or(self.end, |s| s.pos),
                    });
                }
            },
            Tok::Float(x) => Expr::Float(x),
            Tok::Str(s) => Expr::Str(s),
            Tok::True => Expr::Bool(true),
            Tok::False => Expr::Bool(false),
            Tok::Nil => Expr::Nil,
            Tok::SelfKw => Expr::SelfRef,
            Tok::Ident(name) => {
                self.pos += 1;
                if self.eat(&Tok::LParen) {
                    let args = self.arguments(Tok::RParen)?;
                    return Ok(Expr::Call { name, args });
                }
                return Ok(Expr::Var(name));
            }
            Tok::LParen => {
                self.pos += 1;
                let inner = self.expr()?;
                self.expect(Tok::RParen)?;
                return Ok(inner);
            }
            Tok::LBracket => {
                self.pos += 1;
                return Ok(Expr::List(self.arguments(Tok::RBracket)?));
            }
            _ => return Err(self.unexpected("an expression")),
        };
        self.pos += 1;
        Ok(expr)
    }
}

fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}
