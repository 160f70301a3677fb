//! Opt-in standard library of global functions.
//!
//! The engine registers no functions by itself; hosts that want these pass
//! [`standard()`] (possibly extended with their own) to the runner.
//!
//! Every function takes its subject as the first argument:
//!
//! ```text
//! count(items)                     upper(name)
//! join(tags, ", ")                 matches(email, "@example\\.com$")
//! filter(items, (item) => item.active)
//! sum(items, (item) => item.price)
//! ```

use std::cmp::Ordering;

use regex::Regex;

use crate::{
    context::Functions,
    error::{EvalError, EvalResult},
    operations,
    value::{Callable, Value},
};

/// Returns a registry holding every standard function.
pub fn standard() -> Functions {
    Functions::new()
        // Collections
        .with("count", count)
        .with("first", first)
        .with("last", last)
        .with("keys", keys)
        .with("values", values)
        .with("min", min)
        .with("max", max)
        .with("sum", sum)
        .with("avg", avg)
        .with("unique", unique)
        .with("reverse", reverse)
        .with("sort", sort)
        .with("filter", filter)
        .with("map", map)
        .with("any", any)
        .with("all", all)
        // Strings
        .with("upper", upper)
        .with("lower", lower)
        .with("trim", trim)
        .with("split", split)
        .with("join", join)
        .with("contains", contains)
        .with("startswith", startswith)
        .with("endswith", endswith)
        .with("matches", matches)
        // Types
        .with("type", type_of)
}

fn subject<'a>(name: &str, args: &'a [Value]) -> EvalResult<&'a Value> {
    args.first()
        .ok_or_else(|| EvalError::Type(format!("{}() requires an argument", name)))
}

fn array<'a>(name: &str, args: &'a [Value]) -> EvalResult<&'a [Value]> {
    match subject(name, args)? {
        Value::Array(items) => Ok(items),
        other => Err(EvalError::Type(format!(
            "{}() requires array, got {}",
            name,
            other.type_name()
        ))),
    }
}

fn string<'a>(name: &str, args: &'a [Value], index: usize) -> EvalResult<&'a str> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(EvalError::Type(format!(
            "{}() argument {} must be string, got {}",
            name,
            index + 1,
            other.type_name()
        ))),
        None => Err(EvalError::Type(format!(
            "{}() requires {} arguments",
            name,
            index + 1
        ))),
    }
}

fn callable<'a>(name: &str, args: &'a [Value], index: usize) -> EvalResult<Option<&'a Callable>> {
    match args.get(index) {
        Some(Value::Callable(f)) => Ok(Some(f)),
        None | Some(Value::Null) => Ok(None),
        Some(other) => Err(EvalError::Type(format!(
            "{}() argument {} must be a closure, got {}",
            name,
            index + 1,
            other.type_name()
        ))),
    }
}

fn required_callable<'a>(name: &str, args: &'a [Value]) -> EvalResult<&'a Callable> {
    callable(name, args, 1)?
        .ok_or_else(|| EvalError::Type(format!("{}() requires a closure argument", name)))
}

/// Invokes `f` with `(item, index)`; closures ignore the arguments they do
/// not declare.
fn apply(f: &Callable, item: &Value, index: usize) -> EvalResult {
    f.call(&[item.clone(), Value::Integer(index as i64)])
}

fn count(args: &[Value]) -> EvalResult {
    match subject("count", args)? {
        Value::Array(items) => Ok(Value::Integer(items.len() as i64)),
        Value::Map(map) => Ok(Value::Integer(map.len() as i64)),
        Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
        Value::Null => Ok(Value::Integer(0)),
        other => Err(EvalError::Type(format!(
            "count() requires array, map or string, got {}",
            other.type_name()
        ))),
    }
}

fn first(args: &[Value]) -> EvalResult {
    Ok(array("first", args)?.first().cloned().unwrap_or(Value::Null))
}

fn last(args: &[Value]) -> EvalResult {
    Ok(array("last", args)?.last().cloned().unwrap_or(Value::Null))
}

fn sorted_entries(map: &std::collections::HashMap<String, Value>) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

fn keys(args: &[Value]) -> EvalResult {
    match subject("keys", args)? {
        Value::Map(map) => Ok(Value::Array(
            sorted_entries(map)
                .into_iter()
                .map(|(key, _)| Value::String(key.clone()))
                .collect(),
        )),
        Value::Array(items) => Ok(Value::Array(
            (0..items.len() as i64).map(Value::Integer).collect(),
        )),
        other => Err(EvalError::Type(format!(
            "keys() requires map or array, got {}",
            other.type_name()
        ))),
    }
}

fn values(args: &[Value]) -> EvalResult {
    match subject("values", args)? {
        Value::Map(map) => Ok(Value::Array(
            sorted_entries(map)
                .into_iter()
                .map(|(_, value)| value.clone())
                .collect(),
        )),
        Value::Array(items) => Ok(Value::Array(items.clone())),
        other => Err(EvalError::Type(format!(
            "values() requires map or array, got {}",
            other.type_name()
        ))),
    }
}

fn extreme(name: &str, args: &[Value], wanted: Ordering) -> EvalResult {
    let mut best: Option<&Value> = None;
    for item in array(name, args)? {
        match best {
            Some(current) if operations::ordering(item, current) != Some(wanted) => {}
            _ => best = Some(item),
        }
    }
    Ok(best.cloned().unwrap_or(Value::Null))
}

fn min(args: &[Value]) -> EvalResult {
    extreme("min", args, Ordering::Less)
}

fn max(args: &[Value]) -> EvalResult {
    extreme("max", args, Ordering::Greater)
}

/// Numeric values of the array, optionally extracted by a closure.
fn numbers(name: &str, args: &[Value]) -> EvalResult<Vec<Value>> {
    let items = array(name, args)?;
    let extract = callable(name, args, 1)?;

    let mut result = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let value = match extract {
            Some(f) => apply(f, item, index)?,
            None => item.clone(),
        };
        match value {
            Value::Integer(_) | Value::Float(_) => result.push(value),
            other => {
                return Err(EvalError::Type(format!(
                    "{}() requires numeric values, got {}",
                    name,
                    other.type_name()
                )));
            }
        }
    }
    Ok(result)
}

fn sum(args: &[Value]) -> EvalResult {
    let mut sum_int: i64 = 0;
    let mut sum_float: f64 = 0.0;
    let mut has_float = false;

    for value in numbers("sum", args)? {
        match value {
            Value::Integer(n) if !has_float => match sum_int.checked_add(n) {
                Some(total) => sum_int = total,
                None => {
                    has_float = true;
                    sum_float = sum_int as f64 + n as f64;
                }
            },
            Value::Integer(n) => sum_float += n as f64,
            Value::Float(n) => {
                if !has_float {
                    sum_float = sum_int as f64;
                    has_float = true;
                }
                sum_float += n;
            }
            _ => {}
        }
    }

    if has_float {
        Ok(Value::Float(sum_float))
    } else {
        Ok(Value::Integer(sum_int))
    }
}

fn avg(args: &[Value]) -> EvalResult {
    let values = numbers("avg", args)?;
    if values.is_empty() {
        return Ok(Value::Null);
    }
    let total: f64 = values.iter().filter_map(Value::as_float).sum();
    Ok(Value::Float(total / values.len() as f64))
}

fn unique(args: &[Value]) -> EvalResult {
    let mut result: Vec<Value> = Vec::new();
    for item in array("unique", args)? {
        if !result.contains(item) {
            result.push(item.clone());
        }
    }
    Ok(Value::Array(result))
}

fn reverse(args: &[Value]) -> EvalResult {
    match subject("reverse", args)? {
        Value::Array(items) => Ok(Value::Array(items.iter().rev().cloned().collect())),
        Value::String(s) => Ok(Value::String(s.chars().rev().collect())),
        other => Err(EvalError::Type(format!(
            "reverse() requires array or string, got {}",
            other.type_name()
        ))),
    }
}

fn sort(args: &[Value]) -> EvalResult {
    let items = array("sort", args)?;
    let key = callable("sort", args, 1)?;

    // Extract sort keys if a closure was given
    let mut keyed: Vec<(Value, Value)> = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let sort_key = match key {
            Some(f) => apply(f, item, index)?,
            None => item.clone(),
        };
        keyed.push((item.clone(), sort_key));
    }

    keyed.sort_by(|(_, a), (_, b)| operations::ordering(a, b).unwrap_or(Ordering::Equal));
    Ok(Value::Array(keyed.into_iter().map(|(item, _)| item).collect()))
}

fn filter(args: &[Value]) -> EvalResult {
    let items = array("filter", args)?;
    let f = required_callable("filter", args)?;

    let mut result = Vec::new();
    for (index, item) in items.iter().enumerate() {
        if apply(f, item, index)?.is_truthy() {
            result.push(item.clone());
        }
    }
    Ok(Value::Array(result))
}

fn map(args: &[Value]) -> EvalResult {
    let items = array("map", args)?;
    let f = required_callable("map", args)?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| apply(f, item, index))
        .collect::<EvalResult<Vec<_>>>()
        .map(Value::Array)
}

fn any(args: &[Value]) -> EvalResult {
    let items = array("any", args)?;
    let f = required_callable("any", args)?;

    for (index, item) in items.iter().enumerate() {
        if apply(f, item, index)?.is_truthy() {
            return Ok(Value::Boolean(true));
        }
    }
    Ok(Value::Boolean(false))
}

fn all(args: &[Value]) -> EvalResult {
    let items = array("all", args)?;
    let f = required_callable("all", args)?;

    for (index, item) in items.iter().enumerate() {
        if !apply(f, item, index)?.is_truthy() {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

fn upper(args: &[Value]) -> EvalResult {
    Ok(Value::String(string("upper", args, 0)?.to_uppercase()))
}

fn lower(args: &[Value]) -> EvalResult {
    Ok(Value::String(string("lower", args, 0)?.to_lowercase()))
}

fn trim(args: &[Value]) -> EvalResult {
    Ok(Value::String(string("trim", args, 0)?.trim().to_string()))
}

fn split(args: &[Value]) -> EvalResult {
    let s = string("split", args, 0)?;
    let parts: Vec<Value> = match args.get(1) {
        None | Some(Value::Null) => s.split_whitespace().map(Value::from).collect(),
        Some(_) => s.split(string("split", args, 1)?).map(Value::from).collect(),
    };
    Ok(Value::Array(parts))
}

fn join(args: &[Value]) -> EvalResult {
    let items = array("join", args)?;
    let separator = match args.get(1) {
        None | Some(Value::Null) => "",
        Some(_) => string("join", args, 1)?,
    };

    let parts = items
        .iter()
        .map(|item| {
            item.as_string().ok_or_else(|| {
                EvalError::Type(format!("join() cannot join {}", item.type_name()))
            })
        })
        .collect::<EvalResult<Vec<_>>>()?;
    Ok(Value::String(parts.join(separator)))
}

fn contains(args: &[Value]) -> EvalResult {
    let needle = args.get(1).cloned().unwrap_or_default();
    match subject("contains", args)? {
        Value::String(s) => match needle.as_string() {
            Some(needle) => Ok(Value::Boolean(s.contains(needle.as_str()))),
            None => Ok(Value::Boolean(false)),
        },
        Value::Array(items) => Ok(Value::Boolean(items.contains(&needle))),
        Value::Map(map) => Ok(Value::Boolean(
            needle.as_string().is_some_and(|key| map.contains_key(&key)),
        )),
        Value::Null => Ok(Value::Boolean(false)),
        other => Err(EvalError::Type(format!(
            "contains() requires string, array or map, got {}",
            other.type_name()
        ))),
    }
}

fn startswith(args: &[Value]) -> EvalResult {
    let s = string("startswith", args, 0)?;
    Ok(Value::Boolean(s.starts_with(string("startswith", args, 1)?)))
}

fn endswith(args: &[Value]) -> EvalResult {
    let s = string("endswith", args, 0)?;
    Ok(Value::Boolean(s.ends_with(string("endswith", args, 1)?)))
}

fn matches(args: &[Value]) -> EvalResult {
    let pattern = string("matches", args, 1)?;
    let re = Regex::new(pattern).map_err(|e| EvalError::Type(format!("invalid regex: {e}")))?;
    match subject("matches", args)? {
        Value::String(s) => Ok(Value::Boolean(re.is_match(s))),
        _ => Ok(Value::Boolean(false)),
    }
}

fn type_of(args: &[Value]) -> EvalResult {
    Ok(Value::from(subject("type", args)?.type_name()))
}
