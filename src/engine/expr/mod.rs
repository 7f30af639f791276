//! Sandboxed expression language for breakpoint actions.
//!
//! Action strings are parsed into a small statement AST and evaluated against
//! an explicit [`Scope`](crate::engine::scope::Scope). Nothing outside the
//! scope, the receiver and the registered functions is reachable.

pub mod eval;
pub mod lexer;
pub mod parser;

pub use eval::{evaluate, execute};
pub use parser::{parse, BinOp, Expr, Statement, Target, UnaryOp};

/// Syntax errors, with byte offsets into the action string
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character '{ch}' at {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unterminated string starting at {pos}")]
    UnterminatedString { pos: usize },

    #[error("invalid number literal \"{text}\" at {pos}")]
    InvalidNumber { text: String, pos: usize },

    #[error("unexpected \"{found}\" at {pos}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        pos: usize,
    },

    #[error("unexpected end of expression at {pos}, expected {expected}")]
    UnexpectedEnd { expected: String, pos: usize },
}
