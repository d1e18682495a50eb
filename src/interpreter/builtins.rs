use crate::ast::Param;
use crate::environment::{EnvRef, Environment};
use crate::error::MusError;
use crate::value::{FunctionValue, NativeFn, Value};
use std::io::Write;
use std::rc::Rc;

/// Wraps a Rust closure as a native `Param`-less single-arg builtin, matching
/// the shape of every builtin this interpreter ships.
fn native(
    env: &EnvRef,
    name: &str,
    param_name: &str,
    param_type: &str,
    f: impl Fn(&[Value]) -> Result<Value, MusError> + 'static,
) {
    let function = Rc::new(FunctionValue {
        name: name.to_string(),
        params: vec![Param {
            name: param_name.to_string(),
            declared_type: param_type.to_string(),
        }],
        body: vec![],
        closure: None,
        native: Some(Rc::new(f) as NativeFn),
    });
    Environment::define_function(env, name, function);
}

/// Installs the global native builtins (`out`, `length`, `error`, `warn`)
/// into the interpreter's root environment.
pub fn install(globals: &EnvRef) {
    native(globals, "out", "value", "any", |args| {
        let value = args.first().ok_or_else(|| {
            MusError::runtime("Function 'out' expects exactly one argument", (0, 0))
        })?;
        println!("{value}");
        Ok(Value::Null)
    });

    native(globals, "length", "array", "array<any>", |args| {
        let value = args.first().ok_or_else(|| {
            MusError::runtime("Function 'length' expects exactly one argument", (0, 0))
        })?;
        match value {
            Value::Array(arr) => Ok(Value::Integer(arr.borrow().elements.len() as i64)),
            other => Err(MusError::ty(
                format!("Function 'length' expects an array argument, got {}", other.type_name()),
                (0, 0),
            )),
        }
    });

    native(globals, "error", "value", "any", |args| {
        let value = args.first().ok_or_else(|| {
            MusError::runtime("Function 'error' expects exactly one argument", (0, 0))
        })?;
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "{value}");
        Ok(Value::Null)
    });

    native(globals, "warn", "value", "any", |args| {
        let value = args.first().ok_or_else(|| {
            MusError::runtime("Function 'warn' expects exactly one argument", (0, 0))
        })?;
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "Warning: {value}");
        Ok(Value::Null)
    });
}
