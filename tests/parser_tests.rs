// tests/parser_tests.rs

use std::sync::Arc;

use pretty_assertions::assert_eq;
use thyme_query::ast::{ArithmeticOp, ComparisonOp, LogicalOp, UnaryOp};
use thyme_query::{ArgumentList, Literal, Node, parse};

fn var(name: &str) -> Node {
    Node::variable(name)
}

fn int(n: i64) -> Node {
    Node::Literal(Literal::Integer(n))
}

fn string(s: &str) -> Node {
    Node::Literal(Literal::String(s.into()))
}

fn member(target: Node, name: &str) -> Node {
    Node::MemberAccess {
        target: Box::new(target),
        name: name.into(),
        null_safe: false,
    }
}

fn arith(left: Node, op: ArithmeticOp, right: Node) -> Node {
    Node::Arithmetic {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn compare(left: Node, op: ComparisonOp, right: Node) -> Node {
    Node::Comparison {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn ternary(condition: Node, then: Option<Node>, otherwise: Node) -> Node {
    Node::Ternary {
        condition: Box::new(condition),
        then: then.map(Box::new),
        otherwise: Box::new(otherwise),
    }
}

fn coalesce(left: Node, right: Node) -> Node {
    Node::Coalesce {
        left: Box::new(left),
        right: Box::new(right),
    }
}

// ============================================================================
// Simple tests
// ============================================================================

#[test]
fn test_literals() {
    assert_eq!(parse("null").unwrap(), Node::Literal(Literal::Null));
    assert_eq!(parse("true").unwrap(), Node::Literal(Literal::Boolean(true)));
    assert_eq!(parse("1.5").unwrap(), Node::Literal(Literal::Float(1.5)));
    assert_eq!(parse("'x'").unwrap(), string("x"));
}

#[test]
fn test_negative_literals_fold() {
    assert_eq!(parse("-3").unwrap(), int(-3));
    assert_eq!(parse("-2.5").unwrap(), Node::Literal(Literal::Float(-2.5)));
    assert_eq!(
        parse("-x").unwrap(),
        Node::Unary {
            op: UnaryOp::Negate,
            operand: Box::new(var("x")),
        }
    );
}

#[test]
fn test_integer_bounds() {
    assert_eq!(parse("-9223372036854775808").unwrap(), int(i64::MIN));
    assert_eq!(parse("9223372036854775807").unwrap(), int(i64::MAX));

    let err = parse("1 + 9223372036854775808").unwrap_err();
    assert!(err.message.contains("out of range"), "{}", err.message);
    assert_eq!(err.offset, 4);
}

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(
        parse("1 + 2 * 3").unwrap(),
        arith(int(1), ArithmeticOp::Add, arith(int(2), ArithmeticOp::Multiply, int(3)))
    );
    assert_eq!(
        parse("(x + y) * z").unwrap(),
        arith(arith(var("x"), ArithmeticOp::Add, var("y")), ArithmeticOp::Multiply, var("z"))
    );
}

#[test]
fn test_binary_operators_are_left_associative() {
    assert_eq!(
        parse("10 - 4 - 3").unwrap(),
        arith(arith(int(10), ArithmeticOp::Subtract, int(4)), ArithmeticOp::Subtract, int(3))
    );
    assert_eq!(
        parse("a < b < c").unwrap(),
        compare(compare(var("a"), ComparisonOp::Less, var("b")), ComparisonOp::Less, var("c"))
    );
}

#[test]
fn test_logical_precedence() {
    assert_eq!(
        parse("a || b && c").unwrap(),
        Node::Logical {
            left: Box::new(var("a")),
            op: LogicalOp::Or,
            right: Box::new(Node::Logical {
                left: Box::new(var("b")),
                op: LogicalOp::And,
                right: Box::new(var("c")),
            }),
        }
    );
    assert_eq!(parse("a and b").unwrap(), parse("a && b").unwrap());
}

// ============================================================================
// Postfix chains
// ============================================================================

#[test]
fn test_member_chain() {
    assert_eq!(parse("user.profile.name").unwrap(), member(member(var("user"), "profile"), "name"));
}

#[test]
fn test_numeric_member() {
    assert_eq!(parse("rows.0.1").unwrap(), member(member(var("rows"), "0"), "1"));
}

#[test]
fn test_null_safe_marks_are_independent() {
    assert_eq!(
        parse("a?.b.c").unwrap(),
        Node::MemberAccess {
            target: Box::new(Node::MemberAccess {
                target: Box::new(var("a")),
                name: "b".into(),
                null_safe: true,
            }),
            name: "c".into(),
            null_safe: false,
        }
    );
}

#[test]
fn test_null_safe_numeric_member() {
    assert_eq!(
        parse("items?.0").unwrap(),
        Node::MemberAccess {
            target: Box::new(var("items")),
            name: "0".into(),
            null_safe: true,
        }
    );
}

#[test]
fn test_keywords_as_member_names() {
    assert_eq!(parse("page.null").unwrap(), member(var("page"), "null"));
    assert_eq!(parse("page.true").unwrap(), member(var("page"), "true"));
    assert_eq!(
        parse("user.and && ok").unwrap(),
        Node::Logical {
            left: Box::new(member(var("user"), "and")),
            op: LogicalOp::And,
            right: Box::new(var("ok")),
        }
    );
}

#[test]
fn test_subscripts() {
    assert_eq!(
        parse("items[i + 1]").unwrap(),
        Node::Subscript {
            target: Box::new(var("items")),
            key: Box::new(arith(var("i"), ArithmeticOp::Add, int(1))),
            null_safe: false,
        }
    );
    assert_eq!(
        parse("items?.['key']").unwrap(),
        Node::Subscript {
            target: Box::new(var("items")),
            key: Box::new(string("key")),
            null_safe: true,
        }
    );
}

#[test]
fn test_method_and_function_calls() {
    assert_eq!(
        parse("page?.children(1, 'x').first()").unwrap(),
        Node::MethodCall {
            target: Box::new(Node::MethodCall {
                target: Box::new(var("page")),
                name: "children".into(),
                args: ArgumentList::new(vec![int(1), string("x")]),
                null_safe: true,
            }),
            name: "first".into(),
            args: ArgumentList::default(),
            null_safe: false,
        }
    );
    assert_eq!(
        parse("upper(name,)").unwrap(),
        Node::GlobalFunctionCall {
            name: "upper".into(),
            args: ArgumentList::new(vec![var("name")]),
        }
    );
}

#[test]
fn test_calling_an_expression_is_rejected() {
    assert!(parse("a.b()()").is_err());
    assert!(parse("(f)(1)").is_err());
}

#[test]
fn test_array_literal() {
    assert_eq!(
        parse("[1, 'two', [],]").unwrap(),
        Node::ArrayList {
            items: vec![int(1), string("two"), Node::ArrayList { items: vec![] }],
        }
    );
}

// ============================================================================
// Closures
// ============================================================================

#[test]
fn test_closures() {
    assert_eq!(
        parse("() => result").unwrap(),
        Node::Closure {
            params: vec![],
            body: Arc::new(var("result")),
        }
    );
    assert_eq!(
        parse("(item, index) => item.price * index").unwrap(),
        Node::Closure {
            params: vec!["item".into(), "index".into()],
            body: Arc::new(arith(member(var("item"), "price"), ArithmeticOp::Multiply, var("index"))),
        }
    );
}

#[test]
fn test_parenthesized_identifier_is_not_a_closure() {
    assert_eq!(parse("(a)").unwrap(), var("a"));
}

#[test]
fn test_duplicate_closure_params() {
    let err = parse("(a, a) => a").unwrap_err();
    assert!(err.message.contains("Duplicate"), "{}", err.message);
    assert_eq!(err.offset, 4);
}

// ============================================================================
// Conditionals and coalescing
// ============================================================================

#[test]
fn test_coalesce_is_right_associative() {
    assert_eq!(parse("a ?? b ?? c").unwrap(), coalesce(var("a"), coalesce(var("b"), var("c"))));
}

#[test]
fn test_ternary_and_elvis() {
    assert_eq!(
        parse("a ? b : c").unwrap(),
        ternary(var("a"), Some(var("b")), var("c"))
    );
    assert_eq!(parse("a ?: c").unwrap(), ternary(var("a"), None, var("c")));
}

#[test]
fn test_ternary_is_right_associative() {
    assert_eq!(
        parse("a ? b : c ? d : e").unwrap(),
        ternary(var("a"), Some(var("b")), ternary(var("c"), Some(var("d")), var("e")))
    );
}

#[test]
fn test_ternary_binds_tighter_than_coalesce() {
    assert_eq!(
        parse("a ?? b ? c : d").unwrap(),
        coalesce(var("a"), ternary(var("b"), Some(var("c")), var("d")))
    );
}

#[test]
fn test_comparison_condition_needs_parentheses() {
    // The ternary binds tighter than comparison
    assert_eq!(
        parse("a > b ? x : y").unwrap(),
        compare(var("a"), ComparisonOp::Greater, ternary(var("b"), Some(var("x")), var("y")))
    );
    assert_eq!(
        parse("(a > b) ? x : y").unwrap(),
        ternary(compare(var("a"), ComparisonOp::Greater, var("b")), Some(var("x")), var("y"))
    );
}

#[test]
fn test_then_branch_is_a_full_expression() {
    assert_eq!(
        parse("ok ? a || b : c").unwrap(),
        ternary(
            var("ok"),
            Some(Node::Logical {
                left: Box::new(var("a")),
                op: LogicalOp::Or,
                right: Box::new(var("b")),
            }),
            var("c")
        )
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_syntax_errors_carry_offsets() {
    let cases = vec![
        ("", 0),
        ("a +", 3),
        ("a b", 2),
        ("(a", 2),
        ("a ? b", 5),
        ("a.", 2),
        ("[1 2]", 3),
    ];

    for (query, offset) in cases {
        let err = parse(query).unwrap_err();
        assert_eq!(err.offset, offset, "Wrong offset for {:?}: {}", query, err.message);
    }
}

#[test]
fn test_identical_text_gives_identical_tree() {
    let query = "user?.items[0].price * (1 + tax) ?? 0";
    assert_eq!(parse(query).unwrap(), parse(query).unwrap());
}

#[test]
fn test_deep_nesting_does_not_overflow() {
    let depth = 20_000;
    let query = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(parse(&query).unwrap(), int(1));

    let negations = format!("{}x", "!".repeat(5_000));
    assert!(parse(&negations).is_ok());

    let unclosed = "(".repeat(depth);
    assert_eq!(parse(&unclosed).unwrap_err().offset, depth);
}
