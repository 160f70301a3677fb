//! Host-supplied evaluation inputs: the variable context and the global
//! function registry.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    error::EvalResult,
    value::{Callable, Value},
};

/// Name → value bindings visible to a query.
///
/// A context may sit on top of a parent frame: lookups fall through to the
/// parent, and [`Context::child`] shadows names without touching the parent.
/// Closures use this to bind their parameters.
///
/// # Examples
///
/// ```
/// use thyme_query::{Context, Value};
///
/// let context = Context::new()
///     .with("title", "Home")
///     .with_thunk("expensive", || Ok(Value::Integer(42)));
///
/// assert_eq!(context.get("title"), Some(&Value::from("Home")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    vars: HashMap<String, Value>,
    parent: Option<Arc<Context>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Binds `name` to a value computed each time a query reads it.
    pub fn with_thunk<F>(self, name: impl Into<String>, thunk: F) -> Self
    where
        F: Fn() -> EvalResult + Send + Sync + 'static,
    {
        self.with(name, Callable::thunk(thunk))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Looks `name` up in this frame, then in its parents.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.vars.get(name) {
            Some(value) => Some(value),
            None => self.parent.as_ref().and_then(|parent| parent.get(name)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty() && self.parent.as_ref().is_none_or(|parent| parent.is_empty())
    }

    /// Creates a frame on top of `parent` holding `bindings`.
    pub fn child(parent: &Arc<Context>, bindings: impl IntoIterator<Item = (String, Value)>) -> Self {
        Context {
            vars: bindings.into_iter().collect(),
            parent: Some(Arc::clone(parent)),
        }
    }

    /// Flattens every frame into a single map, inner frames winning.
    pub fn to_value(&self) -> Value {
        let mut map = match &self.parent {
            Some(parent) => match parent.to_value() {
                Value::Map(map) => map,
                _ => HashMap::new(),
            },
            None => HashMap::new(),
        };
        map.extend(self.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        Value::Map(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Context {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            parent: None,
        }
    }
}

impl From<HashMap<String, Value>> for Context {
    fn from(vars: HashMap<String, Value>) -> Self {
        Context { vars, parent: None }
    }
}

/// Name → callable registry of global functions.
///
/// Cloning is cheap: the table is shared.
#[derive(Clone, Default)]
pub struct Functions {
    table: Arc<HashMap<String, Callable>>,
}

impl Functions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Value]) -> EvalResult + Send + Sync + 'static,
    {
        self.insert(name, Callable::new(function));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, function: Callable) {
        Arc::make_mut(&mut self.table).insert(name.into(), function);
    }

    /// Adds every function of `other`, replacing same-named entries.
    pub fn extend(&mut self, other: &Functions) {
        let table = Arc::make_mut(&mut self.table);
        for (name, function) in other.table.iter() {
            table.insert(name.clone(), function.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&Callable> {
        self.table.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl fmt::Debug for Functions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.table.keys().collect();
        names.sort();
        f.debug_set().entries(names).finish()
    }
}
