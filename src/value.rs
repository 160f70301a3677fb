use std::{collections::HashMap, fmt, sync::Arc};

use crate::error::EvalResult;

/// A runtime value produced or consumed by a query.
///
/// Besides the JSON-like data variants, a value can hold a host
/// [`Object`] (resolved through its methods and properties) or a
/// [`Callable`] (host function, thunk, or a closure created by a query).
///
/// # Type Preservation
///
/// Integers and floats are kept apart; arithmetic keeps integer results
/// whenever they are whole.
///
/// # Examples
///
/// ```
/// use thyme_query::Value;
/// use std::collections::HashMap;
///
/// let null = Value::Null;
/// let integer = Value::Integer(42);
/// let string = Value::from("hello");
///
/// let array = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
///
/// let mut map = HashMap::new();
/// map.insert("key".to_string(), Value::from("value"));
/// let map = Value::Map(map);
/// ```
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,

    Boolean(bool),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    Float(f64),

    String(String),

    /// Ordered list of values
    Array(Vec<Value>),

    /// String-keyed mapping
    Map(HashMap<String, Value>),

    /// Host object, only reachable through [`Scope`](crate::Scope)
    Object(Arc<dyn Object>),

    /// Host function, thunk or query closure
    Callable(Callable),
}

/// A host object exposed to queries.
///
/// Queries never touch an object directly: every member read goes through
/// [`Scope::access`](crate::Scope::access), which first asks for a method and
/// then for a property.
pub trait Object: fmt::Debug + Send + Sync {
    /// Name reported in error messages and type checks
    fn type_name(&self) -> &str;

    /// Invokes the public method `name`, or returns `None` when the object
    /// has no such method.
    fn call_method(&self, name: &str, args: &[Value]) -> Option<EvalResult>;

    /// Reads the public property `name`.
    fn property(&self, _name: &str) -> Option<Value> {
        None
    }
}

type NativeFn = dyn Fn(&[Value]) -> EvalResult + Send + Sync;

/// A shareable function value.
///
/// Two callables are equal only when they are the same allocation.
#[derive(Clone)]
pub struct Callable(Arc<NativeFn>);

impl Callable {
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(&[Value]) -> EvalResult + Send + Sync + 'static,
    {
        Callable(Arc::new(function))
    }

    /// Wraps a zero-argument function computed only when queried.
    pub fn thunk<F>(function: F) -> Self
    where
        F: Fn() -> EvalResult + Send + Sync + 'static,
    {
        Callable::new(move |_| function())
    }

    pub fn call(&self, args: &[Value]) -> EvalResult {
        (self.0)(args)
    }

    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callable")
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Value::Callable(a), Value::Callable(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Value {
    /// Wraps a host object.
    pub fn object(object: impl Object + 'static) -> Self {
        Value::Object(Arc::new(object))
    }

    /// Wraps a host function.
    pub fn callable<F>(function: F) -> Self
    where
        F: Fn(&[Value]) -> EvalResult + Send + Sync + 'static,
    {
        Value::Callable(Callable::new(function))
    }

    /// Builds a map from key/value pairs.
    pub fn map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if the value is truthy (for conditions)
    ///
    /// `null`, `false`, `0`, `0.0`, `""`, `"0"` and empty collections are
    /// falsy; objects and callables are always truthy.
    pub fn is_truthy(&self) -> bool {
        use Value::*;
        match self {
            Null => false,
            Boolean(b) => *b,
            Integer(n) => *n != 0,
            Float(n) => *n != 0.0,
            String(s) => !s.is_empty() && s != "0",
            Array(arr) => !arr.is_empty(),
            Map(map) => !map.is_empty(),
            Object(_) | Callable(_) => true,
        }
    }

    /// Returns a human-readable type name
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Object(object) => object.type_name(),
            Value::Callable(_) => "callable",
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(n) => Some(n.round() as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert scalars to their string form; collections and objects have none
    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Float(n) => Some(n.to_string()),
            Value::Integer(n) => Some(n.to_string()),
            Value::Boolean(true) => Some("1".to_string()),
            Value::Boolean(false) | Value::Null => Some(String::new()),
            _ => None,
        }
    }

    /// Converts to a `serde_json::Value`.
    ///
    /// Objects become their type name, callables and non-finite floats
    /// become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Callable(_) => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(arr) => serde_json::Value::Array(arr.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Object(object) => serde_json::Value::String(object.type_name().to_string()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => {
                Value::Map(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(map: HashMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<Callable> for Value {
    fn from(callable: Callable) -> Self {
        Value::Callable(callable)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
