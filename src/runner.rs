//! Query entry point: cache lookup, strategy dispatch and execution.

use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};

use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

use crate::{
    ast::Node,
    context::{Context, Functions},
    error::{QueryError, SyntaxError},
    interpreter::Interpreter,
    parser::parse,
    scope::Interceptor,
    transpiler::Program,
    value::Value,
};

/// How a [`Runner`] executes queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Walk the AST on every run
    #[default]
    Interpret,
    /// Compile once, then execute the compiled program on every run
    Compile,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown strategy '{0}' (expected 'interpret' or 'compile')")]
pub struct ParseStrategyError(String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "interpret" => Ok(Strategy::Interpret),
            "compile" => Ok(Strategy::Compile),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Interpret => "interpret",
            Strategy::Compile => "compile",
        })
    }
}

/// A cached query: its AST, or its compiled program.
///
/// Entries hold no per-call state and are never mutated once stored.
#[derive(Debug, Clone)]
pub enum Entry {
    Parsed(Arc<Node>),
    Compiled(Arc<Program>),
}

impl Entry {
    pub fn node(&self) -> &Arc<Node> {
        match self {
            Entry::Parsed(node) => node,
            Entry::Compiled(program) => program.node(),
        }
    }
}

/// Storage for parsed and compiled queries, keyed by the raw query string.
pub trait CacheStore: Send + Sync {
    fn exists(&self, key: &str) -> bool;

    fn get(&self, key: &str) -> Option<Entry>;

    fn set(&self, key: &str, entry: Entry);
}

/// In-process [`CacheStore`], safe for concurrent readers and writers.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl CacheStore for MemoryCache {
    fn exists(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    fn get(&self, key: &str) -> Option<Entry> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, entry: Entry) {
        self.entries.write().insert(key.to_string(), entry);
    }
}

/// Runs queries against host-supplied contexts, caching the parse (and,
/// under [`Strategy::Compile`], the compilation) of every distinct query.
///
/// # Examples
///
/// ```
/// use thyme_query::{Context, Functions, Runner, Strategy, Value};
///
/// let runner = Runner::new(Strategy::Compile);
/// let context = Context::new().with("foo", Value::map([("bar", 42)]));
///
/// assert_eq!(runner.run("foo.bar", context, &Functions::new()), Ok(Value::Integer(42)));
/// ```
pub struct Runner {
    strategy: Strategy,
    cache: Arc<dyn CacheStore>,
    interceptor: Option<Interceptor>,
}

impl Runner {
    /// Creates a runner backed by a fresh [`MemoryCache`].
    pub fn new(strategy: Strategy) -> Self {
        Self::with_cache(strategy, Arc::new(MemoryCache::new()))
    }

    pub fn with_cache(strategy: Strategy, cache: Arc<dyn CacheStore>) -> Self {
        Runner {
            strategy,
            cache,
            interceptor: None,
        }
    }

    /// Binds the interceptor applied to every object before member access.
    pub fn with_interceptor(mut self, interceptor: Interceptor) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Evaluates `query` against `context`.
    ///
    /// An empty query returns the whole context as a map.
    #[tracing::instrument(level = "debug", skip(self, context, functions), fields(strategy = %self.strategy))]
    pub fn run(&self, query: &str, context: Context, functions: &Functions) -> Result<Value, QueryError> {
        if query.is_empty() {
            return Ok(context.to_value());
        }

        let entry = self.entry(query)?;
        let result = match (&entry, self.strategy) {
            (Entry::Compiled(program), Strategy::Compile) => {
                program.execute(context, functions, self.interceptor.as_ref())
            }
            (entry, _) => Interpreter::new(context, functions.clone())
                .with_interceptor(self.interceptor.clone())
                .evaluate(entry.node()),
        };
        Ok(result?)
    }

    /// Fetches the cache entry for `query`, creating or upgrading it as the
    /// strategy requires.
    fn entry(&self, query: &str) -> Result<Entry, SyntaxError> {
        let cached = if self.cache.exists(query) {
            self.cache.get(query)
        } else {
            None
        };

        match (cached, self.strategy) {
            (Some(Entry::Parsed(node)), Strategy::Compile) => {
                debug!("cache hit, compiling parsed entry");
                let entry = Entry::Compiled(Arc::new(Program::compile(node)));
                self.cache.set(query, entry.clone());
                Ok(entry)
            }
            (Some(entry), _) => {
                debug!("cache hit");
                Ok(entry)
            }
            (None, strategy) => {
                debug!("cache miss");
                let node = Arc::new(parse(query)?);
                let entry = match strategy {
                    Strategy::Interpret => Entry::Parsed(node),
                    Strategy::Compile => Entry::Compiled(Arc::new(Program::compile(node))),
                };
                self.cache.set(query, entry.clone());
                Ok(entry)
            }
        }
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("strategy", &self.strategy)
            .field("interceptor", &self.interceptor)
            .finish_non_exhaustive()
    }
}
