//! Show the compiled listing of a query

use crate::{Program, parse};

use super::CliError;

/// Compiles `query` and returns its listing.
pub fn explain(query: &str) -> Result<String, CliError> {
    let program = Program::compile(parse(query)?);
    Ok(program.source().to_string())
}
