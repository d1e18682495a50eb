mod builtins;

use crate::ast::{BinOp, Expr, LiteralValue, Member, Param, Stmt, UnOp};
use crate::environment::{EnvRef, Environment};
use crate::error::MusError;
use crate::value::{ArrayValue, ClassValue, FunctionValue, InstanceValue, NativeFn, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Non-local control transfer for `return`: a dedicated result carrier rather
/// than an exception or a panic, propagated by `execute`/`execute_block`
/// until it is consumed by the enclosing call frame.
enum ExecSignal {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    /// Set from outside the evaluation loop (e.g. a SIGINT handler); polled at
    /// statement boundaries and function-call entry rather than inside the
    /// evaluation of any single expression.
    interrupted: Arc<AtomicBool>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Environment::new_root();
        builtins::install(&globals);
        Self {
            globals,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    /// A handle the CLI driver can hand to a signal handler; setting it true
    /// aborts evaluation with `MusError::Interrupt` at the next statement
    /// boundary or call entry.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    fn check_interrupt(&self) -> Result<(), MusError> {
        if self.interrupted.load(Ordering::Relaxed) {
            Err(MusError::Interrupt)
        } else {
            Ok(())
        }
    }

    pub fn interpret(&self, statements: &[Stmt]) -> Result<(), MusError> {
        for statement in statements {
            self.execute(statement, &self.globals)?;
        }
        Ok(())
    }

    /// Evaluates a single expression against the global scope; used by the
    /// REPL to echo bare expression results.
    pub fn eval_global(&self, expr: &Expr) -> Result<Value, MusError> {
        self.evaluate(expr, &self.globals)
    }

    fn execute_block(&self, statements: &[Stmt], env: &EnvRef) -> Result<ExecSignal, MusError> {
        for statement in statements {
            match self.execute(statement, env)? {
                ExecSignal::Normal => continue,
                signal @ ExecSignal::Return(_) => return Ok(signal),
            }
        }
        Ok(ExecSignal::Normal)
    }

    fn execute(&self, stmt: &Stmt, env: &EnvRef) -> Result<ExecSignal, MusError> {
        self.check_interrupt()?;
        match stmt {
            Stmt::Placeholder => Ok(ExecSignal::Normal),

            Stmt::ExpressionStmt(expr) => {
                self.evaluate(expr, env)?;
                Ok(ExecSignal::Normal)
            }

            Stmt::VarDecl {
                name,
                declared_type,
                initializer,
                token,
            } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Null,
                };

                // An initializer array literal (as opposed to some other
                // array-valued expression) adopts the declared element type,
                // empty or not (spec §4.4). A non-literal initializer (e.g. a
                // variable reference) is left alone and checked for
                // compatibility below instead.
                let is_array_literal = matches!(
                    initializer,
                    Some(Expr::Literal { value: LiteralValue::Array(_), .. })
                );
                if let (Value::Array(arr), true, true) = (
                    &value,
                    is_array_literal,
                    declared_type.starts_with("array<") && declared_type.ends_with('>'),
                ) {
                    let element_type = &declared_type[6..declared_type.len() - 1];
                    arr.borrow_mut().element_type = element_type.to_string();
                }

                if !value.matches_declared_type(declared_type) {
                    return Err(MusError::ty(
                        format!(
                            "Cannot assign a value of type '{}' to a variable declared as '{}'",
                            value.type_name(),
                            declared_type
                        ),
                        token.position(),
                    ));
                }

                Environment::define_variable(env, name, declared_type, value);
                Ok(ExecSignal::Normal)
            }

            Stmt::FunctionDecl { name, params, body, .. } => {
                let function = Rc::new(FunctionValue {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    closure: Some(env.clone()),
                    native: None,
                });
                Environment::define_function(env, name, function);
                Ok(ExecSignal::Normal)
            }

            Stmt::ClassDecl {
                name,
                superclass_name,
                fields,
                methods,
                token,
            } => {
                let superclass = match superclass_name {
                    Some(superclass_name) => Some(
                        Environment::get_class(env, superclass_name).ok_or_else(|| {
                            MusError::name(
                                format!("Superclass '{superclass_name}' not found"),
                                token.position(),
                            )
                        })?,
                    ),
                    None => None,
                };

                let mut method_table = HashMap::new();
                for method in methods {
                    if let Stmt::FunctionDecl {
                        name: method_name,
                        params,
                        body,
                        ..
                    } = method
                    {
                        method_table.insert(
                            method_name.clone(),
                            Rc::new(FunctionValue {
                                name: method_name.clone(),
                                params: params.clone(),
                                body: body.clone(),
                                closure: Some(env.clone()),
                                native: None,
                            }),
                        );
                    }
                }

                let class = Rc::new(ClassValue {
                    name: name.clone(),
                    fields_template: fields.clone(),
                    methods: method_table,
                    superclass,
                    declaring_env: env.clone(),
                });
                Environment::define_class(env, name, class);
                Ok(ExecSignal::Normal)
            }

            Stmt::Block(statements) => {
                let child = Environment::child(env);
                self.execute_block(statements, &child)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition, env)?.is_truthy() {
                    self.execute(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch, env)
                } else {
                    Ok(ExecSignal::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition, env)?.is_truthy() {
                    match self.execute(body, env)? {
                        ExecSignal::Normal => {}
                        signal @ ExecSignal::Return(_) => return Ok(signal),
                    }
                }
                Ok(ExecSignal::Normal)
            }

            Stmt::For {
                iter_name,
                iterable,
                body,
            } => {
                let iterable_value = self.evaluate(iterable, env)?;
                let Value::Array(array) = iterable_value else {
                    return Err(MusError::ty(
                        "Can only iterate over arrays",
                        iterable.token().position(),
                    ));
                };
                let elements = array.borrow().elements.clone();

                for element in elements {
                    let child = Environment::child(env);
                    Environment::define_variable(&child, iter_name, "any", element);
                    match self.execute(body, &child)? {
                        ExecSignal::Normal => {}
                        signal @ ExecSignal::Return(_) => return Ok(signal),
                    }
                }
                Ok(ExecSignal::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Null,
                };
                Ok(ExecSignal::Return(value))
            }
        }
    }

    fn evaluate(&self, expr: &Expr, env: &EnvRef) -> Result<Value, MusError> {
        match expr {
            Expr::Literal { value, .. } => self.evaluate_literal(value, env),

            Expr::Variable { name, token } => Environment::resolve_name(env, name)
                .ok_or_else(|| MusError::name(format!("Undefined variable '{name}'"), token.position())),

            Expr::This { token } => Environment::get_variable(env, "this")
                .ok_or_else(|| MusError::name("Cannot use 'this' outside of a method", token.position())),

            Expr::Super { method, token } => self.evaluate_super(method, token, env),

            Expr::Unary { op, right, token } => {
                let value = self.evaluate(right, env)?;
                match op {
                    UnOp::Neg => match value {
                        Value::Integer(i) => Ok(Value::Integer(-i)),
                        other => Err(MusError::ty(
                            format!("Operand must be a number, got {}", other.type_name()),
                            token.position(),
                        )),
                    },
                    UnOp::Not => Ok(Value::Boolean(!value.is_truthy())),
                }
            }

            Expr::Binary { left, op, right, token } => self.evaluate_binary(left, *op, right, token, env),

            Expr::Call { callee, args, token } => self.evaluate_call(callee, args, token, env),

            Expr::Get { object, member, token } => self.evaluate_get(object, member, token, env),

            Expr::Assign { name, value, token: _ } => {
                let value = self.evaluate(value, env)?;
                Environment::assign(env, name, value.clone())?;
                Ok(value)
            }

            Expr::Set {
                object,
                member,
                value,
                token,
            } => self.evaluate_set(object, member, value, token, env),
        }
    }

    fn evaluate_literal(&self, value: &LiteralValue, env: &EnvRef) -> Result<Value, MusError> {
        match value {
            LiteralValue::Integer(i) => Ok(Value::Integer(*i)),
            LiteralValue::String(s) => Ok(Value::String(s.clone())),
            LiteralValue::Boolean(b) => Ok(Value::Boolean(*b)),
            LiteralValue::Null => Ok(Value::Null),
            LiteralValue::Array(exprs) => {
                let mut elements = Vec::with_capacity(exprs.len());
                for expr in exprs {
                    elements.push(self.evaluate(expr, env)?);
                }
                Ok(Value::Array(Rc::new(RefCell::new(ArrayValue {
                    elements,
                    element_type: "any".to_string(),
                }))))
            }
        }
    }

    fn evaluate_super(
        &self,
        method: &str,
        token: &crate::lexer::Token,
        env: &EnvRef,
    ) -> Result<Value, MusError> {
        let this = Environment::get_variable(env, "this")
            .ok_or_else(|| MusError::name("'super' reference not available", token.position()))?;
        let Value::Instance(instance) = this else {
            return Err(MusError::name("'super' reference not available", token.position()));
        };

        let Some(Value::Class(superclass)) = Environment::get_variable(env, "super") else {
            return Err(MusError::name("'super' reference not available", token.position()));
        };

        let method_fn = superclass
            .get_method(method)
            .ok_or_else(|| MusError::name(format!("Method '{method}' not found in superclass"), token.position()))?;

        let dynamic_class = instance.borrow().class.clone();
        Ok(Value::Function(bind_method(&method_fn, instance, dynamic_class)))
    }

    fn evaluate_binary(
        &self,
        left: &Expr,
        op: BinOp,
        right: &Expr,
        token: &crate::lexer::Token,
        env: &EnvRef,
    ) -> Result<Value, MusError> {
        // Short-circuiting connectives evaluate the right operand lazily.
        if op == BinOp::And {
            let left = self.evaluate(left, env)?;
            return if !left.is_truthy() { Ok(left) } else { self.evaluate(right, env) };
        }
        if op == BinOp::Or {
            let left = self.evaluate(left, env)?;
            return if left.is_truthy() { Ok(left) } else { self.evaluate(right, env) };
        }

        let left = self.evaluate(left, env)?;
        let right = self.evaluate(right, env)?;
        let pos = token.position();

        match op {
            BinOp::Add => match (&left, &right) {
                (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a + b)),
                (Value::String(_), _) | (_, Value::String(_)) => {
                    Ok(Value::String(format!("{left}{right}")))
                }
                _ => Err(MusError::ty("Operands must be numbers or strings", pos)),
            },
            BinOp::Sub => numeric_op(&left, &right, pos, |a, b| Ok(Value::Integer(a - b))),
            BinOp::Mul => numeric_op(&left, &right, pos, |a, b| Ok(Value::Integer(a * b))),
            BinOp::Div => numeric_op(&left, &right, pos, |a, b| {
                if b == 0 {
                    Err(MusError::runtime("Division by zero", pos))
                } else {
                    Ok(Value::Integer(a / b))
                }
            }),
            BinOp::Mod => numeric_op(&left, &right, pos, |a, b| {
                if b == 0 {
                    Err(MusError::runtime("Modulo by zero", pos))
                } else {
                    Ok(Value::Integer(a % b))
                }
            }),
            BinOp::Gt => numeric_op(&left, &right, pos, |a, b| Ok(Value::Boolean(a > b))),
            BinOp::Ge => numeric_op(&left, &right, pos, |a, b| Ok(Value::Boolean(a >= b))),
            BinOp::Lt => numeric_op(&left, &right, pos, |a, b| Ok(Value::Boolean(a < b))),
            BinOp::Le => numeric_op(&left, &right, pos, |a, b| Ok(Value::Boolean(a <= b))),
            BinOp::Eq => Ok(Value::Boolean(left.equals(&right))),
            BinOp::Ne => Ok(Value::Boolean(!left.equals(&right))),
            BinOp::And | BinOp::Or => unreachable!("handled above"),
        }
    }

    fn evaluate_call(
        &self,
        callee: &Expr,
        args: &[Expr],
        token: &crate::lexer::Token,
        env: &EnvRef,
    ) -> Result<Value, MusError> {
        let callee_value = self.evaluate(callee, env)?;

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.evaluate(arg, env)?);
        }

        match callee_value {
            Value::Function(function) => self.call_function(&function, arg_values, token),
            Value::Class(class) => self.instantiate(&class, arg_values, token),
            other => Err(MusError::ty(
                format!("Can only call functions and classes, got {}", other.type_name()),
                token.position(),
            )),
        }
    }

    fn call_function(
        &self,
        function: &Rc<FunctionValue>,
        args: Vec<Value>,
        token: &crate::lexer::Token,
    ) -> Result<Value, MusError> {
        self.check_interrupt()?;
        if args.len() != function.params.len() {
            return Err(MusError::runtime(
                format!(
                    "Function '{}' expects {} argument(s) but got {}",
                    function.name,
                    function.params.len(),
                    args.len()
                ),
                token.position(),
            ));
        }

        if let Some(native) = &function.native {
            return native(&args);
        }

        let closure = function
            .closure
            .clone()
            .expect("non-native functions always carry a closure");
        let call_env = Environment::child(&closure);
        for (param, arg) in function.params.iter().zip(args) {
            Environment::define_variable(&call_env, &param.name, &param.declared_type, arg);
        }

        match self.execute_block(&function.body, &call_env)? {
            ExecSignal::Return(value) => Ok(value),
            ExecSignal::Normal => Ok(Value::Null),
        }
    }

    fn instantiate(
        &self,
        class: &Rc<ClassValue>,
        args: Vec<Value>,
        token: &crate::lexer::Token,
    ) -> Result<Value, MusError> {
        let mut fields = HashMap::new();
        for field in &class.fields_template {
            let Stmt::VarDecl {
                name,
                declared_type: _,
                initializer,
                ..
            } = field
            else {
                continue;
            };
            let value = match initializer {
                Some(expr) => self.evaluate(expr, &class.declaring_env)?,
                None => Value::Null,
            };
            fields.insert(name.clone(), value);
        }

        let instance = Rc::new(RefCell::new(InstanceValue::new(class.clone(), fields)));

        if let Some(init) = class.get_method("init") {
            let bound_init = bind_method(&init, instance.clone(), class.clone());
            // The constructor's return value (if any) is discarded; the call
            // always yields the instance.
            self.call_function(&bound_init, args, token)?;
        }

        Ok(Value::Instance(instance))
    }

    fn evaluate_get(
        &self,
        object: &Expr,
        member: &Member,
        token: &crate::lexer::Token,
        env: &EnvRef,
    ) -> Result<Value, MusError> {
        let object_value = self.evaluate(object, env)?;

        match (&object_value, member) {
            (Value::Instance(instance), Member::Name(name)) => {
                if let Some(value) = instance.borrow().fields.get(name).cloned() {
                    return Ok(value);
                }
                let class = instance.borrow().class.clone();
                if let Some(method) = class.get_method(name) {
                    return Ok(Value::Function(bind_method(&method, instance.clone(), class)));
                }
                Err(MusError::name(
                    format!("Field '{name}' not found in class '{}'", class.name),
                    token.position(),
                ))
            }
            (Value::Array(array), Member::Name(name)) if name == "length" => {
                Ok(Value::Integer(array.borrow().elements.len() as i64))
            }
            (Value::Array(array), Member::Name(name)) if name == "push" => {
                Ok(Value::Function(array_push(array.clone(), token.position())))
            }
            (Value::Array(array), Member::Name(name)) if name == "pop" => {
                Ok(Value::Function(array_pop(array.clone(), token.position())))
            }
            (Value::Array(_), Member::Name(name)) => Err(MusError::name(
                format!("Unknown array property '{name}'"),
                token.position(),
            )),
            (Value::Array(array), Member::Index(index_expr)) => {
                let index = self.evaluate_index(index_expr, env, token)?;
                let array = array.borrow();
                if index < 0 || index as usize >= array.elements.len() {
                    return Err(MusError::runtime(
                        format!("Array index {index} out of bounds"),
                        token.position(),
                    ));
                }
                Ok(array.elements[index as usize].clone())
            }
            (_, Member::Index(_)) => Err(MusError::ty("Only arrays can be indexed", token.position())),
            (other, Member::Name(_)) => Err(MusError::ty(
                format!("Only instances have properties, got {}", other.type_name()),
                token.position(),
            )),
        }
    }

    fn evaluate_set(
        &self,
        object: &Expr,
        member: &Member,
        value: &Expr,
        token: &crate::lexer::Token,
        env: &EnvRef,
    ) -> Result<Value, MusError> {
        let object_value = self.evaluate(object, env)?;
        let value = self.evaluate(value, env)?;

        match (&object_value, member) {
            (Value::Instance(instance), Member::Name(name)) => {
                instance.borrow_mut().fields.insert(name.clone(), value.clone());
                Ok(value)
            }
            (Value::Array(array), Member::Index(index_expr)) => {
                let index = self.evaluate_index(index_expr, env, token)?;
                let mut array = array.borrow_mut();
                if index < 0 || index as usize >= array.elements.len() {
                    return Err(MusError::runtime(
                        format!("Array index {index} out of bounds"),
                        token.position(),
                    ));
                }
                array.elements[index as usize] = value.clone();
                Ok(value)
            }
            (Value::Array(_), Member::Name(_)) => {
                Err(MusError::ty("Arrays only support index assignment", token.position()))
            }
            (_, Member::Index(_)) => Err(MusError::ty("Only arrays can be indexed", token.position())),
            (other, Member::Name(_)) => Err(MusError::ty(
                format!("Only instances have fields, got {}", other.type_name()),
                token.position(),
            )),
        }
    }

    fn evaluate_index(
        &self,
        index_expr: &Expr,
        env: &EnvRef,
        token: &crate::lexer::Token,
    ) -> Result<i64, MusError> {
        match self.evaluate(index_expr, env)? {
            Value::Integer(i) => Ok(i),
            other => Err(MusError::ty(
                format!("Array index must be an integer, got {}", other.type_name()),
                token.position(),
            )),
        }
    }
}

/// Binds a class-owned method to an instance: creates a fresh `Function`
/// sharing the original's params/body, with a new closure pre-populated with
/// `this` and (if the instance's dynamic class has a superclass) `super`
/// bound to the superclass value itself. The class-owned function is never
/// mutated.
fn bind_method(
    function: &Rc<FunctionValue>,
    instance: Rc<RefCell<InstanceValue>>,
    dynamic_class: Rc<ClassValue>,
) -> Rc<FunctionValue> {
    let parent_closure = function
        .closure
        .clone()
        .expect("class methods always carry a closure");
    let closure = Environment::child(&parent_closure);
    Environment::define_variable(&closure, "this", &dynamic_class.name, Value::Instance(instance));
    if let Some(superclass) = &dynamic_class.superclass {
        Environment::define_variable(&closure, "super", &superclass.name, Value::Class(superclass.clone()));
    }

    Rc::new(FunctionValue {
        name: function.name.clone(),
        params: function.params.clone(),
        body: function.body.clone(),
        closure: Some(closure),
        native: None,
    })
}

/// Binds an array's `push` method: a single-argument native function closing
/// over the array's shared handle. Type-checks the new element against the
/// array's declared element type, the same compatibility table a `VarDecl`
/// checks against.
fn array_push(array: Rc<RefCell<ArrayValue>>, pos: (usize, usize)) -> Rc<FunctionValue> {
    Rc::new(FunctionValue {
        name: "push".to_string(),
        params: vec![Param {
            name: "value".to_string(),
            declared_type: "any".to_string(),
        }],
        body: vec![],
        closure: None,
        native: Some(Rc::new(move |args: &[Value]| {
            let value = args[0].clone();
            let element_type = array.borrow().element_type.clone();
            if !value.matches_declared_type(&element_type) {
                return Err(MusError::ty(
                    format!(
                        "Cannot push a value of type '{}' onto an array of '{}'",
                        value.type_name(),
                        element_type
                    ),
                    pos,
                ));
            }
            array.borrow_mut().elements.push(value);
            Ok(Value::Null)
        }) as NativeFn),
    })
}

/// Binds an array's `pop` method: removes and returns the last element,
/// raising a RuntimeError on an empty array.
fn array_pop(array: Rc<RefCell<ArrayValue>>, pos: (usize, usize)) -> Rc<FunctionValue> {
    Rc::new(FunctionValue {
        name: "pop".to_string(),
        params: vec![],
        body: vec![],
        closure: None,
        native: Some(Rc::new(move |_args: &[Value]| {
            array
                .borrow_mut()
                .elements
                .pop()
                .ok_or_else(|| MusError::runtime("Cannot pop from empty array", pos))
        }) as NativeFn),
    })
}

fn numeric_op(
    left: &Value,
    right: &Value,
    pos: (usize, usize),
    f: impl FnOnce(i64, i64) -> Result<Value, MusError>,
) -> Result<Value, MusError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => f(*a, *b),
        _ => Err(MusError::ty("Operands must be numbers", pos)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run(src: &str) -> Result<(), MusError> {
        let tokens = Lexer::new(src).lex()?;
        let program = Parser::parse(tokens)?;
        Interpreter::new().interpret(&program)
    }

    #[test]
    fn arithmetic_precedence() {
        assert!(run("out(1 + 2 * 3)").is_ok());
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let err = run("out(1 / 0)").unwrap_err();
        assert!(matches!(err, MusError::Runtime { .. }));
    }

    #[test]
    fn modulo_by_zero_is_a_runtime_error() {
        let err = run("out(1 % 0)").unwrap_err();
        assert!(matches!(err, MusError::Runtime { .. }));
    }

    #[test]
    fn array_index_at_length_is_out_of_bounds() {
        let err = run("var a => array<integer> = [1,2,3] out(a[3])").unwrap_err();
        assert!(matches!(err, MusError::Runtime { .. }));
    }

    #[test]
    fn non_empty_typed_array_literal_adopts_the_declared_element_type() {
        assert!(run("var a => array<integer> = [1, 2, 3] out(a.length)").is_ok());
    }

    #[test]
    fn push_grows_length_by_one() {
        let src = r#"
            var a => array<integer> = [1, 2, 3]
            a.push(4)
            if (a.length == 4) { out("ok") } else { out("wrong") }
        "#;
        assert!(run(src).is_ok());
    }

    #[test]
    fn push_rejects_a_value_of_the_wrong_element_type() {
        let src = r#"
            var a => array<integer> = [1, 2, 3]
            a.push("not an integer")
        "#;
        let err = run(src).unwrap_err();
        assert!(matches!(err, MusError::Type { .. }));
    }

    #[test]
    fn pop_removes_and_returns_the_last_element() {
        let src = r#"
            var a => array<integer> = [1, 2, 3]
            if (a.pop() == 3) { out("ok") } else { out("wrong") }
            if (a.length == 2) { out("ok") } else { out("wrong") }
        "#;
        assert!(run(src).is_ok());
    }

    #[test]
    fn pop_on_an_empty_array_is_a_runtime_error() {
        let src = r#"
            var a => array<integer> = []
            a.pop()
        "#;
        let err = run(src).unwrap_err();
        assert!(matches!(err, MusError::Runtime { .. }));
    }

    #[test]
    fn this_outside_a_method_is_a_name_error() {
        let err = run("out(this)").unwrap_err();
        assert!(matches!(err, MusError::Name { .. }));
    }

    #[test]
    fn closures_capture_their_declaring_environment_by_reference() {
        let src = r#"
            fun make() {
                var n => integer = 0
                fun step() { n = n + 1 return n }
                return step
            }
            var s => any = make()
            out(s())
            out(s())
            out(s())
        "#;
        assert!(run(src).is_ok());
    }

    #[test]
    fn class_inheritance_and_super_dispatch() {
        let src = r#"
            class A { fun hi() { out("A") } }
            class B extends A { fun hi() { super.hi() out("B") } }
            var b => any = new B()
            b.hi()
        "#;
        assert!(run(src).is_ok());
    }

    #[test]
    fn for_in_over_array_literal() {
        assert!(run("for (x in [10,20,30]) { out(x) }").is_ok());
    }

    #[test]
    fn c_style_for_with_early_return() {
        let src = r#"
            fun first_over(limit => integer) {
                for (var i = 0; i < 10; i = i + 1) { if (i > limit) { return i } }
                return -1
            }
            out(first_over(3))
        "#;
        assert!(run(src).is_ok());
    }

    #[test]
    fn truthiness_only_null_and_false_are_falsy() {
        assert!(run("if (0) { out(\"truthy\") } else { out(\"falsy\") }").is_ok());
    }

    #[test]
    fn interrupt_flag_aborts_evaluation_at_the_next_statement_boundary() {
        let tokens = Lexer::new("var a => integer = 1 var b => integer = 2").lex().unwrap();
        let program = Parser::parse(tokens).unwrap();
        let interpreter = Interpreter::new();
        interpreter.interrupt_handle().store(true, Ordering::Relaxed);
        let err = interpreter.interpret(&program).unwrap_err();
        assert!(matches!(err, MusError::Interrupt));
    }

    #[test]
    fn short_circuit_or_does_not_evaluate_right_when_left_is_truthy() {
        let src = r#"
            fun boom() { out("should not run") return true }
            out(true || boom())
        "#;
        assert!(run(src).is_ok());
    }
}
