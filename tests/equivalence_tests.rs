//! Property-based tests for backend equivalence.
//!
//! These tests generate random queries and verify that the tree-walking
//! interpreter and the compiled program agree on every one of them: same
//! value, or same error.
//!
//! Generated text is not always valid; a syntax error must then be reported
//! identically by both strategies.

#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use proptest::prelude::*;
use thyme_query::{Context, Functions, Runner, Strategy as Backend, Value, builtins};

// -- Query Generation Strategies --

/// Generate a variable bound in [`context`], or one that is not.
fn variable_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("x".to_string()),
        Just("y".to_string()),
        Just("name".to_string()),
        Just("items".to_string()),
        Just("user".to_string()),
        Just("missing".to_string()),
    ]
}

/// Generate a literal.
fn literal_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (0i64..100).prop_map(|n| n.to_string()),
        (0u32..1000).prop_map(|n| format!("{}.5", n)),
        prop::string::string_regex("[a-z0-9 ]{0,6}")
            .unwrap()
            .prop_map(|s| format!("'{}'", s)),
        Just("true".to_string()),
        Just("false".to_string()),
        Just("null".to_string()),
    ]
}

/// Generate an operand: literal, variable, or member read.
fn simple_expr_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        literal_strategy(),
        variable_strategy(),
        variable_strategy().prop_map(|v| format!("{}.age", v)),
        variable_strategy().prop_map(|v| format!("{}?.name", v)),
        (variable_strategy(), 0i64..4).prop_map(|(v, i)| format!("{}[{}]", v, i)),
    ]
}

/// Generate a binary operator.
fn binary_op_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("+".to_string()),
        Just("-".to_string()),
        Just("*".to_string()),
        Just("/".to_string()),
        Just("%".to_string()),
        Just("==".to_string()),
        Just("===".to_string()),
        Just("!=".to_string()),
        Just("<".to_string()),
        Just(">=".to_string()),
        Just("&&".to_string()),
        Just("||".to_string()),
        Just("??".to_string()),
    ]
}

/// Generate a query (recursive with depth limit).
fn expr_strategy(depth: u32) -> BoxedStrategy<String> {
    if depth == 0 {
        simple_expr_strategy().boxed()
    } else {
        prop_oneof![
            simple_expr_strategy(),
            (
                expr_strategy(depth - 1),
                binary_op_strategy(),
                expr_strategy(depth - 1)
            )
                .prop_map(|(left, op, right)| format!("{} {} {}", left, op, right)),
            expr_strategy(depth - 1).prop_map(|e| format!("-({})", e)),
            expr_strategy(depth - 1).prop_map(|e| format!("!({})", e)),
            (
                expr_strategy(depth - 1),
                expr_strategy(depth - 1),
                expr_strategy(depth - 1)
            )
                .prop_map(|(cond, then, otherwise)| format!("({}) ? {} : {}", cond, then, otherwise)),
            (expr_strategy(depth - 1), expr_strategy(depth - 1))
                .prop_map(|(cond, otherwise)| format!("({}) ?: {}", cond, otherwise)),
            prop::collection::vec(expr_strategy(depth - 1), 0..4)
                .prop_map(|items| format!("[{}]", items.join(", "))),
            (expr_strategy(depth - 1), variable_strategy())
                .prop_map(|(e, v)| format!("map(items, (item, index) => item * index + {}) ?? {}", e, v)),
            expr_strategy(depth - 1).prop_map(|e| format!("count([{}])", e)),
        ]
        .boxed()
    }
}

fn context() -> Context {
    Context::new()
        .with("x", 7)
        .with("y", -3)
        .with("name", "thyme")
        .with("items", Value::Array(vec![1.into(), 2.5.into(), "3".into()]))
        .with("user", Value::map([("age", Value::from(41)), ("name", Value::from("ada"))]))
        .with("missing", Value::Null)
}

fn assert_backends_agree(query: &str) -> Result<(), TestCaseError> {
    let functions = builtins::standard();
    let interpreted = Runner::new(Backend::Interpret).run(query, context(), &functions);
    let compiled = Runner::new(Backend::Compile).run(query, context(), &functions);
    prop_assert_eq!(interpreted, compiled, "Backends disagree on: {}", query);
    Ok(())
}

#[test]
fn test_precedence_agrees() {
    let functions = Functions::new();
    for backend in [Backend::Interpret, Backend::Compile] {
        let result = Runner::new(backend).run("2 + 3 * 4", Context::new(), &functions);
        assert_eq!(result, Ok(Value::Integer(14)));
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 1000,
        ..ProptestConfig::default()
    })]

    /// Both backends produce the same result for generated queries.
    #[test]
    fn prop_backends_agree(query in expr_strategy(3)) {
        assert_backends_agree(&query)?;
    }

    /// Integer arithmetic agrees, including overflow into floats.
    #[test]
    fn prop_integer_arithmetic_agrees(
        a in any::<i64>(),
        b in any::<i64>(),
        op in binary_op_strategy(),
    ) {
        let query = format!("({}) {} ({})", a, op, b);
        assert_backends_agree(&query)?;
    }
}
