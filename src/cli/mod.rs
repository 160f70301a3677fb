//! CLI support for thyme-query
//!
//! The command implementations live here so that tools embedding the engine
//! can reuse them; `src/main.rs` only parses arguments and prints.

mod check;
mod eval;
mod explain;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use eval::{EvalOptions, execute_eval, parse_context};
pub use explain::explain;

use std::io;

use thiserror::Error;

use crate::error::{EvalError, QueryError, SyntaxError};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The context must be a JSON object so its keys can become variables
    #[error("Context must be a JSON object, got {0}")]
    ContextNotObject(String),
}

impl From<QueryError> for CliError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::Syntax(e) => CliError::Syntax(e),
            QueryError::Eval(e) => CliError::Eval(e),
        }
    }
}
