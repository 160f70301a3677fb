//! Operator semantics shared by both backends.
//!
//! Comparison follows loose/strict equality and ordering rules of dynamic
//! template languages: numeric strings compare as numbers, `null` and
//! booleans compare by truthiness, and incomparable pairs are never ordered.
//! Arithmetic coerces its operands to numbers and keeps integer results
//! whenever they are whole.

use std::cmp::Ordering;

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{
    ast::{ArithmeticOp, ComparisonOp, UnaryOp},
    error::{EvalError, EvalResult},
    value::Value,
};

/// Applies a comparison operator.
pub fn compare(op: ComparisonOp, left: &Value, right: &Value) -> bool {
    match op {
        ComparisonOp::Equal => loose_equals(left, right),
        ComparisonOp::NotEqual => !loose_equals(left, right),
        ComparisonOp::Identical => strict_equals(left, right),
        ComparisonOp::NotIdentical => !strict_equals(left, right),
        ComparisonOp::Less => ordering(left, right) == Some(Ordering::Less),
        ComparisonOp::LessEqual => {
            matches!(ordering(left, right), Some(Ordering::Less | Ordering::Equal))
        }
        ComparisonOp::Greater => ordering(left, right) == Some(Ordering::Greater),
        ComparisonOp::GreaterEqual => {
            matches!(ordering(left, right), Some(Ordering::Greater | Ordering::Equal))
        }
    }
}

/// Same type and same value; objects and callables by identity.
pub fn strict_equals(left: &Value, right: &Value) -> bool {
    left == right
}

/// `==` with type juggling.
pub fn loose_equals(left: &Value, right: &Value) -> bool {
    use Value::*;
    match (left, right) {
        (Null, Null) => true,
        (Null, String(s)) | (String(s), Null) => s.is_empty(),
        (Boolean(_) | Null, _) | (_, Boolean(_) | Null) => left.is_truthy() == right.is_truthy(),
        (Integer(_) | Float(_), Integer(_) | Float(_)) => {
            number_ordering(to_number(left), to_number(right)) == Some(Ordering::Equal)
        }
        (Integer(_) | Float(_), String(s)) | (String(s), Integer(_) | Float(_)) => {
            let number = if matches!(left, String(_)) { right } else { left };
            match parse_numeric(s) {
                Some(parsed) => number_ordering(to_number(number), Some(parsed)) == Some(Ordering::Equal),
                None => number.as_string().as_deref() == Some(s.as_str()),
            }
        }
        (String(a), String(b)) => match (parse_numeric(a), parse_numeric(b)) {
            (Some(x), Some(y)) => number_ordering(Some(x), Some(y)) == Some(Ordering::Equal),
            _ => a == b,
        },
        (Array(_) | Map(_), Array(_) | Map(_)) => {
            let entries = entries(left);
            entries.len() == entries_len(right)
                && entries.iter().all(|(key, value)| {
                    member(right, key).is_some_and(|other| loose_equals(value, other))
                })
        }
        (Object(_), Object(_)) | (Callable(_), Callable(_)) => left == right,
        _ => false,
    }
}

/// Orders two values, or `None` when they are incomparable.
pub fn ordering(left: &Value, right: &Value) -> Option<Ordering> {
    use Value::*;
    match (left, right) {
        (Null, String(s)) => Some("".cmp(s.as_str())),
        (String(s), Null) => Some(s.as_str().cmp("")),
        (Boolean(_) | Null, _) | (_, Boolean(_) | Null) => {
            Some(left.is_truthy().cmp(&right.is_truthy()))
        }
        (Integer(_) | Float(_), Integer(_) | Float(_)) => {
            number_ordering(to_number(left), to_number(right))
        }
        (Integer(_) | Float(_), String(s)) => match parse_numeric(s) {
            Some(parsed) => number_ordering(to_number(left), Some(parsed)),
            None => left.as_string().map(|text| text.as_str().cmp(s.as_str())),
        },
        (String(s), Integer(_) | Float(_)) => match parse_numeric(s) {
            Some(parsed) => number_ordering(Some(parsed), to_number(right)),
            None => right.as_string().map(|text| s.as_str().cmp(text.as_str())),
        },
        (String(a), String(b)) => match (parse_numeric(a), parse_numeric(b)) {
            (Some(x), Some(y)) => number_ordering(Some(x), Some(y)),
            _ => Some(a.as_bytes().cmp(b.as_bytes())),
        },
        (Array(_) | Map(_), Array(_) | Map(_)) => {
            let entries = entries(left);
            match entries.len().cmp(&entries_len(right)) {
                Ordering::Equal => {}
                unequal => return Some(unequal),
            }
            for (key, value) in entries {
                match ordering(value, member(right, &key)?)? {
                    Ordering::Equal => continue,
                    unequal => return Some(unequal),
                }
            }
            Some(Ordering::Equal)
        }
        (Array(_) | Map(_), Integer(_) | Float(_) | String(_)) => Some(Ordering::Greater),
        (Integer(_) | Float(_) | String(_), Array(_) | Map(_)) => Some(Ordering::Less),
        (Object(_), Object(_)) | (Callable(_), Callable(_)) if left == right => {
            Some(Ordering::Equal)
        }
        _ => None,
    }
}

/// Applies an arithmetic operator after numeric coercion.
pub fn arithmetic(op: ArithmeticOp, left: &Value, right: &Value) -> EvalResult {
    let (Some(a), Some(b)) = (to_number(left), to_number(right)) else {
        return Err(EvalError::Type(format!(
            "Unsupported operand types: {} {} {}",
            describe(left),
            op,
            describe(right)
        )));
    };

    match op {
        ArithmeticOp::Modulo => {
            let (a, b) = (a.truncate(), b.truncate());
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            // i64::MIN % -1 overflows; the remainder is 0
            Ok(Value::Integer(a.checked_rem(b).unwrap_or(0)))
        }
        ArithmeticOp::Divide if b.is_zero() => Err(EvalError::DivisionByZero),
        _ => Ok(match (a, b) {
            (Number::Int(a), Number::Int(b)) => integer_op(op, a, b),
            (Number::Float(a), Number::Float(b)) => Value::Float(float_op(op, a, b)),
            (Number::Int(a), Number::Float(b)) => {
                decimal_op(op, Decimal::from_i64(a), Decimal::from_f64(b))
                    .unwrap_or_else(|| Value::Float(float_op(op, a as f64, b)))
            }
            (Number::Float(a), Number::Int(b)) => {
                decimal_op(op, Decimal::from_f64(a), Decimal::from_i64(b))
                    .unwrap_or_else(|| Value::Float(float_op(op, a, b as f64)))
            }
        }),
    }
}

/// Applies a prefix operator.
pub fn unary(op: UnaryOp, operand: &Value) -> EvalResult {
    match op {
        UnaryOp::Not => Ok(Value::Boolean(!operand.is_truthy())),
        UnaryOp::Negate => match to_number(operand) {
            Some(Number::Int(n)) => Ok(n
                .checked_neg()
                .map(Value::Integer)
                .unwrap_or(Value::Float(-(n as f64)))),
            Some(Number::Float(n)) => Ok(Value::Float(-n)),
            None => Err(EvalError::Type(format!(
                "Unsupported operand type: -{}",
                describe(operand)
            ))),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(n) => n,
        }
    }

    fn truncate(self) -> i64 {
        match self {
            Number::Int(n) => n,
            // Saturating cast, NaN becomes 0
            Number::Float(n) => n.trunc() as i64,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Int(n) => n == 0,
            Number::Float(n) => n == 0.0,
        }
    }
}

fn to_number(value: &Value) -> Option<Number> {
    match value {
        Value::Null => Some(Number::Int(0)),
        Value::Boolean(b) => Some(Number::Int(i64::from(*b))),
        Value::Integer(n) => Some(Number::Int(*n)),
        Value::Float(n) => Some(Number::Float(*n)),
        Value::String(s) => parse_numeric(s),
        _ => None,
    }
}

/// Parses a numeric string (`"42"`, `" 1.5"`, `"1e3"`), rejecting words
/// such as `"inf"` or `"NaN"` that `f64` would otherwise accept.
fn parse_numeric(s: &str) -> Option<Number> {
    let s = s.trim_start();
    if !s.bytes().any(|b| b.is_ascii_digit())
        || !s
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return None;
    }
    if let Ok(n) = s.parse::<i64>() {
        return Some(Number::Int(n));
    }
    s.parse::<f64>().ok().map(Number::Float)
}

fn number_ordering(left: Option<Number>, right: Option<Number>) -> Option<Ordering> {
    match (left?, right?) {
        (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
        (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
    }
}

fn integer_op(op: ArithmeticOp, a: i64, b: i64) -> Value {
    let checked = match op {
        ArithmeticOp::Add => a.checked_add(b),
        ArithmeticOp::Subtract => a.checked_sub(b),
        ArithmeticOp::Multiply => a.checked_mul(b),
        // Check if division is exact; if not, return Float
        ArithmeticOp::Divide => match a.checked_rem(b) {
            Some(0) => a.checked_div(b),
            _ => None,
        },
        ArithmeticOp::Modulo => a.checked_rem(b),
    };
    // Overflow (or an inexact quotient) continues in floating point
    checked
        .map(Value::Integer)
        .unwrap_or_else(|| Value::Float(float_op(op, a as f64, b as f64)))
}

fn float_op(op: ArithmeticOp, a: f64, b: f64) -> f64 {
    match op {
        ArithmeticOp::Add => a + b,
        ArithmeticOp::Subtract => a - b,
        ArithmeticOp::Multiply => a * b,
        ArithmeticOp::Divide => a / b,
        ArithmeticOp::Modulo => a % b,
    }
}

/// Mixed integer/float arithmetic, exact when both sides fit a `Decimal`.
fn decimal_op(op: ArithmeticOp, a: Option<Decimal>, b: Option<Decimal>) -> Option<Value> {
    let (a, b) = (a?, b?);
    let result = match op {
        ArithmeticOp::Add => a.checked_add(b),
        ArithmeticOp::Subtract => a.checked_sub(b),
        ArithmeticOp::Multiply => a.checked_mul(b),
        ArithmeticOp::Divide => a.checked_div(b),
        ArithmeticOp::Modulo => a.checked_rem(b),
    }?;

    if result.is_integer()
        && let Some(r) = result.to_i64()
    {
        return Some(Value::Integer(r));
    }
    result.to_f64().map(Value::Float)
}

/// Every (key, value) pair of an array or map; arrays are keyed by index.
fn entries(value: &Value) -> Vec<(String, &Value)> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item))
            .collect(),
        Value::Map(map) => {
            let mut entries: Vec<(String, &Value)> =
                map.iter().map(|(key, item)| (key.clone(), item)).collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            entries
        }
        _ => Vec::new(),
    }
}

fn entries_len(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Map(map) => map.len(),
        _ => 0,
    }
}

fn member<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
        Value::Map(map) => map.get(key),
        _ => None,
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("string \"{}\"", s),
        other => other.type_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    #[test]
    fn test_loose_equality() {
        assert!(loose_equals(&Value::Integer(1), &Value::Float(1.0)));
        assert!(loose_equals(&Value::Integer(10), &s("10")));
        assert!(loose_equals(&s("1e1"), &s("10")));
        assert!(loose_equals(&Value::Null, &s("")));
        assert!(loose_equals(&Value::Null, &Value::Integer(0)));
        assert!(loose_equals(&Value::Boolean(true), &s("yes")));
        assert!(!loose_equals(&Value::Null, &s("0")));
        assert!(!loose_equals(&Value::Integer(0), &s("a")));
        assert!(loose_equals(
            &Value::Array(vec![Value::Integer(1), s("2")]),
            &Value::map([("0", s("1")), ("1", Value::Integer(2))])
        ));
    }

    #[test]
    fn test_strict_equality() {
        assert!(strict_equals(&Value::Integer(1), &Value::Integer(1)));
        assert!(!strict_equals(&Value::Integer(1), &Value::Float(1.0)));
        assert!(!strict_equals(&Value::Integer(1), &s("1")));
    }

    #[test]
    fn test_ordering() {
        assert_eq!(ordering(&Value::Integer(2), &Value::Float(1.5)), Some(Ordering::Greater));
        assert_eq!(ordering(&s("9"), &s("10")), Some(Ordering::Less));
        assert_eq!(ordering(&s("apple"), &s("banana")), Some(Ordering::Less));
        assert_eq!(ordering(&Value::Null, &Value::Boolean(true)), Some(Ordering::Less));
        assert_eq!(
            ordering(
                &Value::Array(vec![Value::Integer(1), Value::Integer(3)]),
                &Value::Array(vec![Value::Integer(1), Value::Integer(2)])
            ),
            Some(Ordering::Greater)
        );
        assert_eq!(
            ordering(&Value::Array(vec![Value::Integer(9)]), &Value::Array(vec![])),
            Some(Ordering::Greater)
        );
        assert_eq!(ordering(&Value::Float(f64::NAN), &Value::Integer(1)), None);
    }

    #[test]
    fn test_incomparable_is_never_ordered() {
        let callable = Value::callable(|_| Ok(Value::Null));
        for op in [
            ComparisonOp::Less,
            ComparisonOp::LessEqual,
            ComparisonOp::Greater,
            ComparisonOp::GreaterEqual,
        ] {
            assert!(!compare(op, &callable, &Value::Integer(1)));
        }
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(
            arithmetic(ArithmeticOp::Add, &Value::Integer(2), &Value::Integer(3)),
            Ok(Value::Integer(5))
        );
        assert_eq!(
            arithmetic(ArithmeticOp::Divide, &Value::Integer(6), &Value::Integer(3)),
            Ok(Value::Integer(2))
        );
        assert_eq!(
            arithmetic(ArithmeticOp::Divide, &Value::Integer(7), &Value::Integer(2)),
            Ok(Value::Float(3.5))
        );
        assert_eq!(
            arithmetic(ArithmeticOp::Add, &Value::Integer(i64::MAX), &Value::Integer(1)),
            Ok(Value::Float(i64::MAX as f64 + 1.0))
        );
    }

    #[test]
    fn test_mixed_arithmetic_keeps_whole_integers() {
        assert_eq!(
            arithmetic(ArithmeticOp::Multiply, &Value::Integer(2), &Value::Float(1.5)),
            Ok(Value::Integer(3))
        );
        assert_eq!(
            arithmetic(ArithmeticOp::Add, &Value::Float(0.5), &Value::Integer(1)),
            Ok(Value::Float(1.5))
        );
    }

    #[test]
    fn test_coercion() {
        assert_eq!(
            arithmetic(ArithmeticOp::Add, &s("2"), &Value::Boolean(true)),
            Ok(Value::Integer(3))
        );
        assert_eq!(
            arithmetic(ArithmeticOp::Add, &Value::Null, &Value::Integer(4)),
            Ok(Value::Integer(4))
        );
        assert!(matches!(
            arithmetic(ArithmeticOp::Add, &s("abc"), &Value::Integer(1)),
            Err(EvalError::Type(_))
        ));
        assert!(matches!(
            arithmetic(ArithmeticOp::Add, &Value::Array(vec![]), &Value::Integer(1)),
            Err(EvalError::Type(_))
        ));
    }

    #[test]
    fn test_modulo_and_division_by_zero() {
        assert_eq!(
            arithmetic(ArithmeticOp::Modulo, &Value::Float(7.9), &Value::Integer(3)),
            Ok(Value::Integer(1))
        );
        assert_eq!(
            arithmetic(ArithmeticOp::Divide, &Value::Integer(1), &Value::Integer(0)),
            Err(EvalError::DivisionByZero)
        );
        assert_eq!(
            arithmetic(ArithmeticOp::Modulo, &Value::Integer(1), &Value::Float(0.5)),
            Err(EvalError::DivisionByZero)
        );
    }

    #[test]
    fn test_unary() {
        assert_eq!(unary(UnaryOp::Negate, &s("4")), Ok(Value::Integer(-4)));
        assert_eq!(unary(UnaryOp::Not, &s("0")), Ok(Value::Boolean(true)));
        assert!(unary(UnaryOp::Negate, &Value::Map(Default::default())).is_err());
    }
}
