//! Evaluate a query against a JSON context

use crate::{Context, Functions, Runner, Strategy, Value, builtins};

use super::CliError;

/// Options for the eval command
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    /// The query to evaluate
    pub query: String,
    /// JSON object whose keys become the query's variables
    pub context: Option<String>,
    pub strategy: Strategy,
    /// Register the standard functions
    pub builtins: bool,
}

/// Parses a JSON object into a context.
///
/// Blank input yields an empty context.
pub fn parse_context(json: &str) -> Result<Context, CliError> {
    if json.trim().is_empty() {
        return Ok(Context::new());
    }

    let json: serde_json::Value = serde_json::from_str(json)?;
    match Value::from(json) {
        Value::Map(map) => Ok(Context::from(map)),
        other => Err(CliError::ContextNotObject(other.type_name().to_string())),
    }
}

/// Execute a thyme eval operation
pub fn execute_eval(options: &EvalOptions) -> Result<Value, CliError> {
    let context = match &options.context {
        Some(json) => parse_context(json)?,
        None => Context::new(),
    };
    let functions = if options.builtins {
        builtins::standard()
    } else {
        Functions::new()
    };

    let runner = Runner::new(options.strategy);
    Ok(runner.run(&options.query, context, &functions)?)
}
