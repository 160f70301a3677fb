//! Syntax-check queries without evaluating them

use crate::{Node, parse};

use super::CliError;

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The query to validate
    pub query: String,
    /// Return the parsed AST instead of a bare confirmation
    pub ast: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Syntax validation passed, with the parsed tree
    Ast(Node),
}

/// Execute a thyme check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let node = parse(&options.query)?;
    if options.ast {
        Ok(CheckResult::Ast(node))
    } else {
        Ok(CheckResult::SyntaxValid)
    }
}
