//! Compile backend.
//!
//! The [`Transpiler`] walks a [`Node`] once and composes a tree of closures
//! that can be executed many times against different contexts. Alongside the
//! closures it writes a textual listing of the compiled program, together
//! with two side tables:
//!
//! - `mappings`: every variable and global function the query names, keyed
//!   by a deterministic synthetic identifier (`v_<hash>` / `f_<hash>`)
//! - `uses`: the runtime support symbols the program relies on
//!
//! Every member, method and subscript compiles to
//! `Scope::access(intercept(..), ..)`; the listing never contains a raw
//! member reference, and neither does the executable form.
//!
//! # Listing format
//!
//! ```text
//! use Scope::access;
//! use Scope::get;
//! use intercept;
//!
//! let v_8c6a5c5f59d3b1e4 = Scope::get("user", context, functions);
//!
//! return Scope::access(intercept(v_8c6a5c5f59d3b1e4), "name", false, []);
//! ```

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt::{self, Write},
    hash::{Hash, Hasher},
    sync::Arc,
};

use rustc_hash::FxHasher;
use tracing::trace;

use crate::{
    ast::{ArgumentList, ArithmeticOp, ComparisonOp, Literal, LogicalOp, Node, UnaryOp},
    context::{Context, Functions},
    error::{EvalError, EvalResult},
    operations,
    output::{format_float, quote},
    scope::{Interceptor, Scope, intercept},
    stack::ensure_sufficient_stack,
    value::{Callable, Value},
    visitor::Visitor,
};

type Exec = Arc<dyn Fn(&Frame) -> EvalResult + Send + Sync>;

/// One compiled fragment: its listing text and its executable form.
pub struct Emitted {
    source: String,
    exec: Exec,
}

impl Emitted {
    fn new<F>(source: String, exec: F) -> Self
    where
        F: Fn(&Frame) -> EvalResult + Send + Sync + 'static,
    {
        Emitted {
            source,
            exec: Arc::new(move |frame: &Frame| ensure_sufficient_stack(|| exec(frame))),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// What a synthetic identifier in a compiled program stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mapping {
    /// A top-level variable, resolved through `Scope::get`
    Variable(String),
    /// A host-registered global function
    Function(String),
}

impl Mapping {
    pub fn name(&self) -> &str {
        match self {
            Mapping::Variable(name) | Mapping::Function(name) => name,
        }
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mapping::Variable(name) => write!(f, "Scope::get({}, context, functions)", quote(name)),
            Mapping::Function(name) => write!(f, "functions[{}]", quote(name)),
        }
    }
}

/// Per-execution state: the bindings in effect and the memoized variable
/// slots. A closure invocation runs in a fresh frame over its child context.
struct Frame {
    context: Arc<Context>,
    functions: Functions,
    interceptor: Option<Interceptor>,
    slots: RefCell<Vec<Option<Value>>>,
}

impl Frame {
    fn new(context: Arc<Context>, functions: Functions, interceptor: Option<Interceptor>) -> Self {
        Frame {
            context,
            functions,
            interceptor,
            slots: RefCell::new(Vec::new()),
        }
    }

    /// Resolves a variable at most once per frame.
    fn variable(&self, slot: usize, name: &str) -> EvalResult {
        if let Some(Some(value)) = self.slots.borrow().get(slot) {
            return Ok(value.clone());
        }

        let value = Scope::get(name, &self.context, &self.functions)?;

        let mut slots = self.slots.borrow_mut();
        if slots.len() <= slot {
            slots.resize(slot + 1, None);
        }
        slots[slot] = Some(value.clone());
        Ok(value)
    }

    fn intercept(&self, value: Value) -> EvalResult {
        intercept(self.interceptor.as_ref(), value)
    }
}

/// Compiles nodes into [`Program`]s.
#[derive(Default)]
pub struct Transpiler {
    mappings: BTreeMap<String, Mapping>,
    slots: HashMap<String, usize>,
    uses: BTreeSet<&'static str>,
}

impl Transpiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile(mut self, node: Arc<Node>) -> Program {
        let body = self.visit(&node);

        let mut source = String::new();
        for symbol in &self.uses {
            let _ = writeln!(source, "use {};", symbol);
        }
        if !self.uses.is_empty() {
            source.push('\n');
        }
        for (name, mapping) in &self.mappings {
            let _ = writeln!(source, "let {} = {};", name, mapping);
        }
        if !self.mappings.is_empty() {
            source.push('\n');
        }
        let _ = write!(source, "return {};", body.source);

        trace!(
            mappings = self.mappings.len(),
            uses = self.uses.len(),
            "compiled query"
        );

        Program {
            node,
            body: body.exec,
            mappings: self.mappings,
            uses: self.uses,
            source,
        }
    }

    /// Registers a variable and returns its synthetic name and slot.
    fn variable(&mut self, name: &str) -> (String, usize) {
        let synthetic = self.synthetic("v", Mapping::Variable(name.to_string()));
        let next = self.slots.len();
        let slot = *self.slots.entry(name.to_string()).or_insert(next);
        self.uses.insert("Scope::get");
        (synthetic, slot)
    }

    fn function(&mut self, name: &str) -> String {
        self.synthetic("f", Mapping::Function(name.to_string()))
    }

    /// Derives a stable identifier from the mapped name, salting on the rare
    /// hash collision between two different names.
    fn synthetic(&mut self, prefix: &str, mapping: Mapping) -> String {
        let mut salt = 0u32;
        loop {
            let mut hasher = FxHasher::default();
            mapping.name().hash(&mut hasher);
            if salt > 0 {
                salt.hash(&mut hasher);
            }
            let synthetic = format!("{}_{:016x}", prefix, hasher.finish());

            match self.mappings.get(&synthetic) {
                Some(existing) if *existing != mapping => salt += 1,
                Some(_) => return synthetic,
                None => {
                    self.mappings.insert(synthetic.clone(), mapping);
                    return synthetic;
                }
            }
        }
    }

    fn arguments(&mut self, args: &ArgumentList) -> (String, Arc<[Exec]>) {
        let (sources, execs): (Vec<String>, Vec<Exec>) = args
            .items
            .iter()
            .map(|arg| {
                let emitted = self.visit(arg);
                (emitted.source, emitted.exec)
            })
            .unzip();
        (sources.join(", "), execs.into())
    }

    /// Emits `Scope::access(intercept(target), ..)`, the only form member
    /// resolution ever takes.
    fn access(&mut self, target: Emitted, key: String, args: String, null_safe: bool) -> String {
        self.uses.insert("Scope::access");
        self.uses.insert("intercept");
        format!(
            "Scope::access(intercept({}), {}, {}, [{}])",
            target.source, key, null_safe, args
        )
    }
}

fn run_all(execs: &[Exec], frame: &Frame) -> EvalResult<Vec<Value>> {
    execs.iter().map(|exec| exec(frame)).collect()
}

fn render_literal(literal: &Literal) -> String {
    match literal {
        Literal::Null => "null".to_string(),
        Literal::Boolean(b) => b.to_string(),
        Literal::Integer(n) => n.to_string(),
        Literal::Float(n) => format_float(*n),
        Literal::String(s) => quote(s),
    }
}

impl Visitor for Transpiler {
    type Output = Emitted;

    fn visit_literal(&mut self, literal: &Literal) -> Emitted {
        let value = literal.to_value();
        Emitted::new(render_literal(literal), move |_| Ok(value.clone()))
    }

    fn visit_variable(&mut self, name: &str) -> Emitted {
        let (synthetic, slot) = self.variable(name);
        let name = name.to_string();
        Emitted::new(synthetic, move |frame| frame.variable(slot, &name))
    }

    fn visit_member_access(&mut self, target: &Node, name: &str, null_safe: bool) -> Emitted {
        let target = self.visit(target);
        let run = Arc::clone(&target.exec);
        let source = self.access(target, quote(name), String::new(), null_safe);

        let name = name.to_string();
        Emitted::new(source, move |frame| {
            let subject = run(frame)?;
            if null_safe && subject.is_null() {
                return Ok(Value::Null);
            }
            let subject = frame.intercept(subject)?;
            Scope::access(&subject, &name, null_safe, &[])
        })
    }

    fn visit_subscript(&mut self, target: &Node, key: &Node, null_safe: bool) -> Emitted {
        let target = self.visit(target);
        let key = self.visit(key);
        let run = Arc::clone(&target.exec);
        let run_key = key.exec;
        self.uses.insert("Scope::key");
        let source = self.access(
            target,
            format!("Scope::key({})", key.source),
            String::new(),
            null_safe,
        );

        Emitted::new(source, move |frame| {
            let subject = run(frame)?;
            if null_safe && subject.is_null() {
                return Ok(Value::Null);
            }
            let key = Scope::key(&run_key(frame)?)?;
            let subject = frame.intercept(subject)?;
            Scope::access(&subject, &key, null_safe, &[])
        })
    }

    fn visit_method_call(
        &mut self,
        target: &Node,
        name: &str,
        args: &ArgumentList,
        null_safe: bool,
    ) -> Emitted {
        let target = self.visit(target);
        let (arg_source, run_args) = self.arguments(args);
        let run = Arc::clone(&target.exec);
        let source = self.access(target, quote(name), arg_source, null_safe);

        let name = name.to_string();
        Emitted::new(source, move |frame| {
            let subject = run(frame)?;
            if null_safe && subject.is_null() {
                return Ok(Value::Null);
            }
            let args = run_all(&run_args, frame)?;
            let subject = frame.intercept(subject)?;
            Scope::access(&subject, &name, null_safe, &args)
        })
    }

    fn visit_global_function_call(&mut self, name: &str, args: &ArgumentList) -> Emitted {
        let synthetic = self.function(name);
        let (arg_source, run_args) = self.arguments(args);

        let name = name.to_string();
        Emitted::new(format!("{}({})", synthetic, arg_source), move |frame| {
            let Some(function) = frame.functions.get(&name).cloned() else {
                return Err(EvalError::UnknownFunction(name.clone()));
            };
            let args = run_all(&run_args, frame)?;
            trace!(function = %name, args = args.len(), "calling global function");
            function.call(&args)
        })
    }

    fn visit_argument_list(&mut self, args: &ArgumentList) -> Emitted {
        let (source, run_args) = self.arguments(args);
        Emitted::new(format!("[{}]", source), move |frame| {
            run_all(&run_args, frame).map(Value::Array)
        })
    }

    fn visit_array_list(&mut self, items: &[Node]) -> Emitted {
        let (sources, execs): (Vec<String>, Vec<Exec>) = items
            .iter()
            .map(|item| {
                let emitted = self.visit(item);
                (emitted.source, emitted.exec)
            })
            .unzip();

        Emitted::new(format!("[{}]", sources.join(", ")), move |frame| {
            run_all(&execs, frame).map(Value::Array)
        })
    }

    fn visit_closure(&mut self, params: &[String], body: &Arc<Node>) -> Emitted {
        self.uses.insert("Closure");
        let body = self.visit(body);

        let rendered: Vec<String> = params.iter().map(|param| quote(param)).collect();
        let source = format!("Closure::new([{}], || {})", rendered.join(", "), body.source);

        let params: Arc<[String]> = params.into();
        let run_body = body.exec;
        Emitted::new(source, move |frame| {
            let context = Arc::clone(&frame.context);
            let functions = frame.functions.clone();
            let interceptor = frame.interceptor.clone();
            let params = Arc::clone(&params);
            let run_body = Arc::clone(&run_body);

            Ok(Value::Callable(Callable::new(move |args| {
                trace!(params = params.len(), args = args.len(), "invoking closure");
                // Missing arguments bind as null, extra ones are ignored
                let bindings = params.iter().enumerate().map(|(index, param)| {
                    (param.clone(), args.get(index).cloned().unwrap_or_default())
                });
                let frame = Frame::new(
                    Arc::new(Context::child(&context, bindings)),
                    functions.clone(),
                    interceptor.clone(),
                );
                run_body(&frame)
            })))
        })
    }

    fn visit_coalesce(&mut self, left: &Node, right: &Node) -> Emitted {
        let left = self.visit(left);
        let right = self.visit(right);
        let (run_left, run_right) = (left.exec, right.exec);

        Emitted::new(
            format!("({} ?? {})", left.source, right.source),
            move |frame| match run_left(frame)? {
                Value::Null => run_right(frame),
                value => Ok(value),
            },
        )
    }

    fn visit_ternary(&mut self, condition: &Node, then: Option<&Node>, otherwise: &Node) -> Emitted {
        let condition = self.visit(condition);
        let then = then.map(|then| self.visit(then));
        let otherwise = self.visit(otherwise);

        let source = match &then {
            Some(then) => format!(
                "({} ? {} : {})",
                condition.source, then.source, otherwise.source
            ),
            None => format!("({} ?: {})", condition.source, otherwise.source),
        };

        let run_condition = condition.exec;
        let run_then = then.map(|then| then.exec);
        let run_otherwise = otherwise.exec;
        Emitted::new(source, move |frame| {
            let condition = run_condition(frame)?;
            if !condition.is_truthy() {
                return run_otherwise(frame);
            }
            match &run_then {
                Some(run_then) => run_then(frame),
                None => Ok(condition),
            }
        })
    }

    fn visit_comparison(&mut self, left: &Node, op: ComparisonOp, right: &Node) -> Emitted {
        let left = self.visit(left);
        let right = self.visit(right);
        let (run_left, run_right) = (left.exec, right.exec);

        Emitted::new(
            format!("({} {} {})", left.source, op, right.source),
            move |frame| {
                let left = run_left(frame)?;
                let right = run_right(frame)?;
                Ok(Value::Boolean(operations::compare(op, &left, &right)))
            },
        )
    }

    fn visit_arithmetic(&mut self, left: &Node, op: ArithmeticOp, right: &Node) -> Emitted {
        let left = self.visit(left);
        let right = self.visit(right);
        let (run_left, run_right) = (left.exec, right.exec);

        Emitted::new(
            format!("({} {} {})", left.source, op, right.source),
            move |frame| {
                let left = run_left(frame)?;
                let right = run_right(frame)?;
                operations::arithmetic(op, &left, &right)
            },
        )
    }

    fn visit_logical(&mut self, left: &Node, op: LogicalOp, right: &Node) -> Emitted {
        let left = self.visit(left);
        let right = self.visit(right);
        let (run_left, run_right) = (left.exec, right.exec);

        Emitted::new(
            format!("({} {} {})", left.source, op, right.source),
            move |frame| {
                let left = run_left(frame)?.is_truthy();
                let result = match op {
                    LogicalOp::And => left && run_right(frame)?.is_truthy(),
                    LogicalOp::Or => left || run_right(frame)?.is_truthy(),
                };
                Ok(Value::Boolean(result))
            },
        )
    }

    fn visit_unary(&mut self, op: UnaryOp, operand: &Node) -> Emitted {
        let operand = self.visit(operand);
        let run = operand.exec;

        Emitted::new(format!("{}{}", op, operand.source), move |frame| {
            operations::unary(op, &run(frame)?)
        })
    }
}

/// A compiled query, executable any number of times.
///
/// Nothing from one execution survives into the next: variable slots live
/// in a frame created per call.
///
/// # Examples
///
/// ```
/// use thyme_query::{parse, Context, Functions, Program, Value};
///
/// let program = Program::compile(parse("user.age > user.minAge").unwrap());
/// let user = Value::map([("age", 30), ("minAge", 18)]);
///
/// let result = program.execute(Context::new().with("user", user), &Functions::new(), None);
/// assert_eq!(result, Ok(Value::Boolean(true)));
/// assert_eq!(program.source().matches("Scope::access(").count(), 2);
/// ```
pub struct Program {
    node: Arc<Node>,
    body: Exec,
    mappings: BTreeMap<String, Mapping>,
    uses: BTreeSet<&'static str>,
    source: String,
}

impl Program {
    pub fn compile(node: impl Into<Arc<Node>>) -> Program {
        Transpiler::new().compile(node.into())
    }

    pub fn execute(
        &self,
        context: impl Into<Arc<Context>>,
        functions: &Functions,
        interceptor: Option<&Interceptor>,
    ) -> EvalResult {
        let frame = Frame::new(context.into(), functions.clone(), interceptor.cloned());
        (self.body)(&frame)
    }

    /// The listing of the compiled program.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn mappings(&self) -> &BTreeMap<String, Mapping> {
        &self.mappings
    }

    pub fn uses(&self) -> &BTreeSet<&'static str> {
        &self.uses
    }

    /// The AST this program was compiled from.
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("mappings", &self.mappings)
            .field("uses", &self.uses)
            .field("source", &self.source)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::parse;

    fn compile(query: &str) -> Program {
        Program::compile(parse(query).unwrap())
    }

    #[test]
    fn test_synthetic_names_are_stable() {
        let first = compile("user.name");
        let second = compile("user.email ?? user");

        let names: Vec<&String> = first.mappings().keys().collect();
        assert_eq!(names, second.mappings().keys().collect::<Vec<_>>());
        assert!(names[0].starts_with("v_"));
        assert_eq!(names[0].len(), 2 + 16);
    }

    #[test]
    fn test_variables_and_functions_map_separately() {
        let program = compile("upper(upper)");
        let mappings: Vec<&Mapping> = program.mappings().values().collect();

        assert_eq!(mappings.len(), 2);
        assert!(mappings.contains(&&Mapping::Function("upper".into())));
        assert!(mappings.contains(&&Mapping::Variable("upper".into())));
    }

    #[test]
    fn test_listing_layout() {
        let program = compile("page.title");
        let lines: Vec<&str> = program.source().lines().collect();

        assert_eq!(lines[0], "use Scope::access;");
        assert_eq!(lines[1], "use Scope::get;");
        assert_eq!(lines[2], "use intercept;");
        assert!(lines[4].starts_with("let v_"));
        assert!(lines[4].ends_with(" = Scope::get(\"page\", context, functions);"));
        assert!(
            lines[6].starts_with("return Scope::access(intercept(v_")
                && lines[6].ends_with("), \"title\", false, []);")
        );
    }

    #[test]
    fn test_variable_resolved_once_per_frame() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let context = Context::new().with_thunk("n", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Integer(2))
        });
        let context = Arc::new(context);

        let program = compile("n + n * n");
        assert_eq!(
            program.execute(Arc::clone(&context), &Functions::new(), None),
            Ok(Value::Integer(6))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        program.execute(context, &Functions::new(), None).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_closure_sees_its_own_parameters() {
        let program = compile("apply((x) => x * factor, 5)");
        let functions = Functions::new().with("apply", |args| match args {
            [Value::Callable(f), value] => f.call(std::slice::from_ref(value)),
            _ => Ok(Value::Null),
        });

        let result = program.execute(Context::new().with("factor", 3), &functions, None);
        assert_eq!(result, Ok(Value::Integer(15)));
    }
}
