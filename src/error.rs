//! Error types shared by the parser, the access gate and both backends.

use thiserror::Error;

/// Malformed query text.
///
/// `offset` is the character offset into the query where the problem was
/// detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Syntax error at offset {offset}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub offset: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Errors raised while evaluating a parsed query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Null-unsafe access on null, access on a scalar, an illegal subscript
    /// key, or a rejection from the host's interceptor
    #[error("Access error: {0}")]
    Access(String),

    /// Call to a global function that is not registered
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Operator symbol that maps to no known operator
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// Invalid operand or argument types
    #[error("Type error: {0}")]
    Type(String),

    #[error("Division by zero")]
    DivisionByZero,

    /// Failure reported by a host callable
    #[error("{0}")]
    Host(String),
}

pub type EvalResult<T = crate::Value> = Result<T, EvalError>;

/// Anything [`Runner::run`](crate::Runner::run) can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}
