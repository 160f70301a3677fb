//! Thyme: an embeddable expression engine.
//!
//! A query such as `user?.profile.name ?? "anonymous"` is parsed into a
//! [`Node`] tree and evaluated against a host-supplied [`Context`] and
//! [`Functions`] registry, either by walking the tree ([`Interpreter`]) or by
//! running a [`Program`] compiled once by the [`Transpiler`]. The [`Runner`]
//! ties both together behind a query cache.
//!
//! Every member, method and subscript is resolved through [`Scope`], after
//! the host's [`Interceptor`] has had a chance to wrap or reject the object
//! being accessed.
//!
//! ```
//! use thyme_query::{Context, Functions, Runner, Strategy, Value};
//!
//! let runner = Runner::new(Strategy::Interpret);
//! let context = Context::new()
//!     .with("user", Value::map([("age", 30), ("minAge", 18)]));
//!
//! let result = runner.run("user.age > user.minAge", context, &Functions::new());
//! assert_eq!(result, Ok(Value::Boolean(true)));
//! ```

pub mod ast;
pub mod builtins;
pub mod context;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod operations;
pub mod output;
pub mod parser;
pub mod runner;
pub mod scope;
mod stack;
pub mod transpiler;
pub mod value;
pub mod visitor;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{ArgumentList, Literal, Node, Token};
pub use context::{Context, Functions};
pub use error::{EvalError, EvalResult, QueryError, SyntaxError};
pub use interpreter::Interpreter;
pub use lexer::Lexer;
pub use parser::{Parser, parse};
pub use runner::{CacheStore, Entry, MemoryCache, Runner, Strategy};
pub use scope::{Interceptor, Scope};
pub use transpiler::{Mapping, Program, Transpiler};
pub use value::{Callable, Object, Value};
pub use visitor::Visitor;
