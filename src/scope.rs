//! The member-access gate.
//!
//! [`Scope`] is the single place where a member, method or entry of a value
//! is resolved. Both backends route every `.name`, `.name(..)` and `[key]`
//! through [`Scope::access`], and every top-level identifier through
//! [`Scope::get`]. Host objects are only ever reached through the
//! [`Object`](crate::Object) trait, after the runner's [`Interceptor`] has
//! seen them.

use std::{fmt, sync::Arc};

use crate::{
    context::{Context, Functions},
    error::{EvalError, EvalResult},
    value::Value,
};

pub struct Scope;

impl Scope {
    /// Resolves `name` on `subject`, yielding `Null` on a null-safe access to null.
    pub fn access(subject: &Value, name: &str, null_safe: bool, args: &[Value]) -> EvalResult {
        Self::access_or(subject, name, null_safe, Value::Null, args)
    }

    /// Resolves `name` on `subject`.
    ///
    /// - null: `default` when `null_safe`, otherwise an access error
    /// - map: the entry, invoked with `args` when it is callable
    /// - array: the element at `name` read as an index (negative counts from the end)
    /// - object: the method `name` called with `args`, else the property `name`
    ///
    /// Missing entries, elements, methods and properties are `Null`.
    pub fn access_or(
        subject: &Value,
        name: &str,
        null_safe: bool,
        default: Value,
        args: &[Value],
    ) -> EvalResult {
        match subject {
            Value::Null if null_safe => Ok(default),
            Value::Null => Err(EvalError::Access(format!("Cannot access {} on NULL", name))),
            Value::Map(map) => match map.get(name) {
                Some(entry) => Self::resolve(entry, args),
                None => Ok(Value::Null),
            },
            Value::Array(items) => {
                let Ok(index) = name.parse::<i64>() else {
                    return Ok(Value::Null);
                };
                let index = if index < 0 {
                    // Negative index: count from end (-1 = last, -2 = second to last)
                    match items.len().checked_sub(index.unsigned_abs() as usize) {
                        Some(index) => index,
                        None => return Ok(Value::Null),
                    }
                } else {
                    index as usize
                };
                match items.get(index) {
                    Some(entry) => Self::resolve(entry, args),
                    None => Ok(Value::Null),
                }
            }
            Value::Object(object) => {
                if let Some(result) = object.call_method(name, args) {
                    return result;
                }
                Ok(object.property(name).unwrap_or(Value::Null))
            }
            other => Err(EvalError::Access(format!(
                "Cannot access {} on {}",
                name,
                other.type_name()
            ))),
        }
    }

    /// Resolves a top-level identifier.
    ///
    /// A context entry wins over a same-named global function; callables
    /// found either way are invoked without arguments.
    pub fn get(name: &str, context: &Context, functions: &Functions) -> EvalResult {
        if let Some(value) = context.get(name) {
            return Self::resolve(value, &[]);
        }
        if let Some(function) = functions.get(name) {
            return function.call(&[]);
        }
        Ok(Value::Null)
    }

    /// Converts a computed subscript key into a member name.
    pub fn key(key: &Value) -> EvalResult<String> {
        match key {
            Value::String(s) => Ok(s.clone()),
            Value::Integer(n) => Ok(n.to_string()),
            Value::Float(n) => Ok(n.to_string()),
            Value::Boolean(b) => Ok(if *b { "1" } else { "0" }.to_string()),
            Value::Null => Ok(String::new()),
            other => Err(EvalError::Access(format!(
                "Illegal offset type: {}",
                other.type_name()
            ))),
        }
    }

    fn resolve(entry: &Value, args: &[Value]) -> EvalResult {
        match entry {
            Value::Callable(function) => function.call(args),
            value => Ok(value.clone()),
        }
    }
}

/// Host hook applied to every object right before a member is resolved on it.
///
/// The host uses it to wrap or reject objects according to its own
/// allow-list; returning an error aborts the query.
#[derive(Clone)]
pub struct Interceptor(Arc<dyn Fn(Value) -> EvalResult + Send + Sync>);

impl Interceptor {
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(Value) -> EvalResult + Send + Sync + 'static,
    {
        Interceptor(Arc::new(hook))
    }

    /// Runs the hook on objects; every other value passes through.
    pub fn apply(&self, value: Value) -> EvalResult {
        match value {
            Value::Object(_) => (self.0)(value),
            other => Ok(other),
        }
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Interceptor")
    }
}

/// Applies an optional interceptor.
pub(crate) fn intercept(interceptor: Option<&Interceptor>, value: Value) -> EvalResult {
    match interceptor {
        Some(interceptor) => interceptor.apply(value),
        None => Ok(value),
    }
}
