//! Text rendering of values and literals.
//!
//! - [`to_json()`] / [`to_json_pretty()`] print a [`Value`] as deterministic
//!   JSON (map keys sorted, 2-space indentation when pretty)
//! - [`quote()`] renders a string as a query literal that lexes back to the
//!   same string; compiled listings use it for every string constant
//!
//! The JSON functions go through [`Value::to_json`] and `serde_json`, so host
//! objects print as their type name and callables as `null`.
//!
//! # Examples
//!
//! ```
//! use thyme_query::Value;
//! use thyme_query::output::{quote, to_json};
//!
//! let value = Value::map([("name", Value::from("Alice")), ("age", Value::Integer(30))]);
//! assert_eq!(to_json(&value), r#"{"age":30,"name":"Alice"}"#);
//!
//! assert_eq!(quote("say \"hi\"\n"), r#""say \"hi\"\n""#);
//! ```

use std::{fmt, fmt::Write};

use crate::value::Value;

/// Renders a float so it always reads back as a float (`2.0`, never `2`).
pub fn format_float(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 {
        format!("{:.1}", n)
    } else {
        n.to_string()
    }
}

/// Quotes `s` as a double-quoted query string literal.
///
/// Quotes, backslashes and control characters are escaped with the
/// sequences the lexer understands, so parsing the result yields `s` again.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Converts a Value to compact JSON string representation.
pub fn to_json(value: &Value) -> String {
    value.to_json().to_string()
}

/// Converts a Value to pretty-printed JSON string representation.
///
/// ```
/// use thyme_query::Value;
/// use thyme_query::output::to_json_pretty;
///
/// let value = Value::map([("tags", Value::Array(vec![Value::from("a")]))]);
/// assert_eq!(to_json_pretty(&value), "{\n  \"tags\": [\n    \"a\"\n  ]\n}");
/// ```
pub fn to_json_pretty(value: &Value) -> String {
    format!("{:#}", value.to_json())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str(&to_json_pretty(self))
        } else {
            f.write_str(&to_json(self))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_keeps_decimal_point() {
        assert_eq!(to_json(&Value::Float(2.0)), "2.0");
        assert_eq!(to_json(&Value::Float(0.25)), "0.25");
        assert_eq!(to_json(&Value::Float(f64::NAN)), "null");
        assert_eq!(format_float(-3.0), "-3.0");
    }

    #[test]
    fn test_json_escaping() {
        assert_eq!(to_json(&Value::from("a\"b\\c\u{1}")), r#""a\"b\\c\u0001""#);
    }

    #[test]
    fn test_quote_control_characters() {
        assert_eq!(quote("\u{7}"), r#""\u{7}""#);
        assert_eq!(quote("tab\there"), r#""tab\there""#);
        assert_eq!(quote("nul\0"), r#""nul\0""#);
    }

    #[test]
    fn test_display_is_compact_json() {
        let value = Value::Array(vec![Value::Integer(1), Value::Null]);
        assert_eq!(value.to_string(), "[1,null]");
        assert_eq!(format!("{:#}", value), "[\n  1,\n  null\n]");
    }

    #[test]
    fn test_objects_and_callables() {
        #[derive(Debug)]
        struct Page;

        impl crate::Object for Page {
            fn type_name(&self) -> &str {
                "Page"
            }

            fn call_method(&self, _: &str, _: &[Value]) -> Option<crate::EvalResult> {
                None
            }
        }

        let value = Value::map([
            ("page", Value::object(Page)),
            ("f", Value::callable(|_| Ok(Value::Null))),
        ]);
        assert_eq!(to_json(&value), r#"{"f":null,"page":"Page"}"#);
    }
}
