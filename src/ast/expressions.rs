use std::sync::Arc;

use crate::{
    ast::{ArithmeticOp, ComparisonOp, LogicalOp, UnaryOp},
    value::Value,
    visitor::Visitor,
};

/// Literal values that can appear directly in a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Integer(n) => Value::Integer(*n),
            Literal::Float(n) => Value::Float(*n),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

/// Ordered arguments of a method or global function call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArgumentList {
    pub items: Vec<Node>,
}

impl ArgumentList {
    pub fn new(items: Vec<Node>) -> Self {
        ArgumentList { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Abstract Syntax Tree node representing a parsed expression.
///
/// Nodes carry no runtime state; every backend walks them through a
/// [`Visitor`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal value
    ///
    /// # Examples
    /// ```text
    /// 42
    /// "hello"
    /// null
    /// ```
    Literal(Literal),

    /// Top-level identifier lookup
    ///
    /// # Example
    /// ```text
    /// page
    /// ```
    Variable { name: String },

    /// Member access
    ///
    /// # Examples
    /// ```text
    /// page.title
    /// page?.title
    /// items.0
    /// ```
    MemberAccess {
        target: Box<Node>,
        name: String,
        null_safe: bool,
    },

    /// Subscript with a computed key
    ///
    /// # Examples
    /// ```text
    /// page["title"]
    /// items[index + 1]
    /// items?.[0]
    /// ```
    Subscript {
        target: Box<Node>,
        key: Box<Node>,
        null_safe: bool,
    },

    /// Method call
    ///
    /// # Examples
    /// ```text
    /// page.children()
    /// user?.avatar(128)
    /// ```
    MethodCall {
        target: Box<Node>,
        name: String,
        args: ArgumentList,
        null_safe: bool,
    },

    /// Call to a host-registered global function
    ///
    /// # Example
    /// ```text
    /// upper(page.title)
    /// ```
    GlobalFunctionCall { name: String, args: ArgumentList },

    /// Array literal
    ///
    /// # Example
    /// ```text
    /// [page.title, 1, "two"]
    /// ```
    ArrayList { items: Vec<Node> },

    /// Arrow closure with a single expression body
    ///
    /// # Examples
    /// ```text
    /// () => result
    /// (item, index) => item.price * index
    /// ```
    Closure { params: Vec<String>, body: Arc<Node> },

    /// Null-coalescing (`??`)
    Coalesce { left: Box<Node>, right: Box<Node> },

    /// Ternary (`a ? b : c`) or Elvis (`a ?: c`, `then` omitted)
    Ternary {
        condition: Box<Node>,
        then: Option<Box<Node>>,
        otherwise: Box<Node>,
    },

    /// Comparison (`==`, `===`, `!=`, `!==`, `<`, `<=`, `>`, `>=`)
    Comparison {
        left: Box<Node>,
        op: ComparisonOp,
        right: Box<Node>,
    },

    /// Arithmetic (`+`, `-`, `*`, `/`, `%`)
    Arithmetic {
        left: Box<Node>,
        op: ArithmeticOp,
        right: Box<Node>,
    },

    /// Short-circuiting logical operation (`&&`, `||`)
    Logical {
        left: Box<Node>,
        op: LogicalOp,
        right: Box<Node>,
    },

    /// Prefix operation (`-x`, `!x`)
    Unary { op: UnaryOp, operand: Box<Node> },
}

impl Node {
    /// Hands this node to a visitor.
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit(self)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Node::Variable { name: name.into() }
    }

    pub fn literal(literal: Literal) -> Self {
        Node::Literal(literal)
    }
}
