//! Tree-walking backend.

use std::sync::Arc;

use tracing::trace;

use crate::{
    ast::{ArgumentList, ArithmeticOp, ComparisonOp, Literal, LogicalOp, Node, UnaryOp},
    context::{Context, Functions},
    error::{EvalError, EvalResult},
    operations,
    scope::{Interceptor, Scope, intercept},
    value::{Callable, Value},
    visitor::Visitor,
};

/// Evaluates a [`Node`] directly against a context.
///
/// # Examples
///
/// ```
/// use thyme_query::{parse, Context, Functions, Interpreter, Value};
///
/// let node = parse("(x + y) * z").unwrap();
/// let context = Context::new().with("x", 4).with("y", 9).with("z", 2);
///
/// let result = Interpreter::new(context, Functions::new()).evaluate(&node);
/// assert_eq!(result, Ok(Value::Integer(26)));
/// ```
pub struct Interpreter {
    context: Arc<Context>,
    functions: Functions,
    interceptor: Option<Interceptor>,
}

impl Interpreter {
    pub fn new(context: impl Into<Arc<Context>>, functions: Functions) -> Self {
        Interpreter {
            context: context.into(),
            functions,
            interceptor: None,
        }
    }

    pub fn with_interceptor(mut self, interceptor: Option<Interceptor>) -> Self {
        self.interceptor = interceptor;
        self
    }

    pub fn evaluate(&mut self, node: &Node) -> EvalResult {
        node.accept(self)
    }

    fn evaluate_args(&mut self, args: &ArgumentList) -> EvalResult<Vec<Value>> {
        args.items.iter().map(|arg| self.visit(arg)).collect()
    }

    fn intercept(&self, value: Value) -> EvalResult {
        intercept(self.interceptor.as_ref(), value)
    }
}

impl Visitor for Interpreter {
    type Output = EvalResult;

    fn visit_literal(&mut self, literal: &Literal) -> EvalResult {
        Ok(literal.to_value())
    }

    fn visit_variable(&mut self, name: &str) -> EvalResult {
        Scope::get(name, &self.context, &self.functions)
    }

    fn visit_member_access(&mut self, target: &Node, name: &str, null_safe: bool) -> EvalResult {
        let subject = self.visit(target)?;
        if null_safe && subject.is_null() {
            return Ok(Value::Null);
        }
        let subject = self.intercept(subject)?;
        Scope::access(&subject, name, null_safe, &[])
    }

    fn visit_subscript(&mut self, target: &Node, key: &Node, null_safe: bool) -> EvalResult {
        let subject = self.visit(target)?;
        if null_safe && subject.is_null() {
            return Ok(Value::Null);
        }
        let key = Scope::key(&self.visit(key)?)?;
        let subject = self.intercept(subject)?;
        Scope::access(&subject, &key, null_safe, &[])
    }

    fn visit_method_call(
        &mut self,
        target: &Node,
        name: &str,
        args: &ArgumentList,
        null_safe: bool,
    ) -> EvalResult {
        let subject = self.visit(target)?;
        if null_safe && subject.is_null() {
            return Ok(Value::Null);
        }
        let args = self.evaluate_args(args)?;
        let subject = self.intercept(subject)?;
        Scope::access(&subject, name, null_safe, &args)
    }

    fn visit_global_function_call(&mut self, name: &str, args: &ArgumentList) -> EvalResult {
        let Some(function) = self.functions.get(name).cloned() else {
            return Err(EvalError::UnknownFunction(name.to_string()));
        };
        let args = self.evaluate_args(args)?;
        trace!(function = name, args = args.len(), "calling global function");
        function.call(&args)
    }

    fn visit_argument_list(&mut self, args: &ArgumentList) -> EvalResult {
        self.evaluate_args(args).map(Value::Array)
    }

    fn visit_array_list(&mut self, items: &[Node]) -> EvalResult {
        items
            .iter()
            .map(|item| self.visit(item))
            .collect::<EvalResult<Vec<_>>>()
            .map(Value::Array)
    }

    fn visit_closure(&mut self, params: &[String], body: &Arc<Node>) -> EvalResult {
        let context = Arc::clone(&self.context);
        let functions = self.functions.clone();
        let interceptor = self.interceptor.clone();
        let params = params.to_vec();
        let body = Arc::clone(body);

        Ok(Value::Callable(Callable::new(move |args| {
            trace!(params = params.len(), args = args.len(), "invoking closure");
            // Missing arguments bind as null, extra ones are ignored
            let bindings = params
                .iter()
                .enumerate()
                .map(|(index, param)| (param.clone(), args.get(index).cloned().unwrap_or_default()));
            let frame = Context::child(&context, bindings);

            Interpreter::new(frame, functions.clone())
                .with_interceptor(interceptor.clone())
                .evaluate(&body)
        })))
    }

    fn visit_coalesce(&mut self, left: &Node, right: &Node) -> EvalResult {
        match self.visit(left)? {
            Value::Null => self.visit(right),
            value => Ok(value),
        }
    }

    fn visit_ternary(&mut self, condition: &Node, then: Option<&Node>, otherwise: &Node) -> EvalResult {
        let condition = self.visit(condition)?;
        if !condition.is_truthy() {
            return self.visit(otherwise);
        }
        match then {
            Some(then) => self.visit(then),
            None => Ok(condition),
        }
    }

    fn visit_comparison(&mut self, left: &Node, op: ComparisonOp, right: &Node) -> EvalResult {
        let left = self.visit(left)?;
        let right = self.visit(right)?;
        Ok(Value::Boolean(operations::compare(op, &left, &right)))
    }

    fn visit_arithmetic(&mut self, left: &Node, op: ArithmeticOp, right: &Node) -> EvalResult {
        let left = self.visit(left)?;
        let right = self.visit(right)?;
        operations::arithmetic(op, &left, &right)
    }

    fn visit_logical(&mut self, left: &Node, op: LogicalOp, right: &Node) -> EvalResult {
        let left = self.visit(left)?.is_truthy();
        let result = match op {
            LogicalOp::And => left && self.visit(right)?.is_truthy(),
            LogicalOp::Or => left || self.visit(right)?.is_truthy(),
        };
        Ok(Value::Boolean(result))
    }

    fn visit_unary(&mut self, op: UnaryOp, operand: &Node) -> EvalResult {
        let operand = self.visit(operand)?;
        operations::unary(op, &operand)
    }
}
