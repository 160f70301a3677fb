//! Node visitor abstraction.
//!
//! A [`Visitor`] has one method per node kind and produces a result of its
//! associated `Output` type. There is no default walking: every visitor
//! decides itself whether and when to visit a node's children. Backends rely
//! on that to short-circuit `&&`/`||`, skip the untaken side of `?:`/`??`, and
//! skip the key or arguments of a null-safe access on null.

use std::sync::Arc;

use crate::{
    ast::{ArgumentList, ArithmeticOp, ComparisonOp, Literal, LogicalOp, Node, UnaryOp},
    stack::ensure_sufficient_stack,
};

pub trait Visitor {
    /// The result type produced by visiting
    type Output;

    /// Main entry point, dispatches on the node kind. Each level runs with
    /// enough stack for deeply nested trees.
    fn visit(&mut self, node: &Node) -> Self::Output {
        ensure_sufficient_stack(|| match node {
            Node::Literal(literal) => self.visit_literal(literal),
            Node::Variable { name } => self.visit_variable(name),
            Node::MemberAccess {
                target,
                name,
                null_safe,
            } => self.visit_member_access(target, name, *null_safe),
            Node::Subscript {
                target,
                key,
                null_safe,
            } => self.visit_subscript(target, key, *null_safe),
            Node::MethodCall {
                target,
                name,
                args,
                null_safe,
            } => self.visit_method_call(target, name, args, *null_safe),
            Node::GlobalFunctionCall { name, args } => self.visit_global_function_call(name, args),
            Node::ArrayList { items } => self.visit_array_list(items),
            Node::Closure { params, body } => self.visit_closure(params, body),
            Node::Coalesce { left, right } => self.visit_coalesce(left, right),
            Node::Ternary {
                condition,
                then,
                otherwise,
            } => self.visit_ternary(condition, then.as_deref(), otherwise),
            Node::Comparison { left, op, right } => self.visit_comparison(left, *op, right),
            Node::Arithmetic { left, op, right } => self.visit_arithmetic(left, *op, right),
            Node::Logical { left, op, right } => self.visit_logical(left, *op, right),
            Node::Unary { op, operand } => self.visit_unary(*op, operand),
        })
    }

    fn visit_literal(&mut self, literal: &Literal) -> Self::Output;

    fn visit_variable(&mut self, name: &str) -> Self::Output;

    fn visit_member_access(&mut self, target: &Node, name: &str, null_safe: bool) -> Self::Output;

    fn visit_subscript(&mut self, target: &Node, key: &Node, null_safe: bool) -> Self::Output;

    fn visit_method_call(
        &mut self,
        target: &Node,
        name: &str,
        args: &ArgumentList,
        null_safe: bool,
    ) -> Self::Output;

    fn visit_global_function_call(&mut self, name: &str, args: &ArgumentList) -> Self::Output;

    fn visit_argument_list(&mut self, args: &ArgumentList) -> Self::Output;

    fn visit_array_list(&mut self, items: &[Node]) -> Self::Output;

    fn visit_closure(&mut self, params: &[String], body: &Arc<Node>) -> Self::Output;

    fn visit_coalesce(&mut self, left: &Node, right: &Node) -> Self::Output;

    /// `then` is `None` for the Elvis form `condition ?: otherwise`
    fn visit_ternary(
        &mut self,
        condition: &Node,
        then: Option<&Node>,
        otherwise: &Node,
    ) -> Self::Output;

    fn visit_comparison(&mut self, left: &Node, op: ComparisonOp, right: &Node) -> Self::Output;

    fn visit_arithmetic(&mut self, left: &Node, op: ArithmeticOp, right: &Node) -> Self::Output;

    fn visit_logical(&mut self, left: &Node, op: LogicalOp, right: &Node) -> Self::Output;

    fn visit_unary(&mut self, op: UnaryOp, operand: &Node) -> Self::Output;
}
