use crate::ast::{Param, Stmt};
use crate::environment::EnvRef;
use crate::error::MusError;
use std::cell::RefCell;
use std::fmt::{self, Display};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A host-side callable backing a native builtin (`out`, `length`, ...). Takes
/// the already-evaluated argument vector and returns the call's result.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, MusError>>;

#[derive(Clone)]
pub struct FunctionValue {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    /// `None` only for native functions, which have no AST body to run against
    /// a closure.
    pub closure: Option<EnvRef>,
    pub native: Option<NativeFn>,
}

impl FunctionValue {
    pub fn is_native(&self) -> bool {
        self.native.is_some()
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionValue")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("native", &self.native.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ArrayValue {
    pub elements: Vec<Value>,
    pub element_type: String,
}

pub struct ClassValue {
    pub name: String,
    /// `VarDecl` statements, in declaration order, used to initialize a fresh
    /// instance's fields.
    pub fields_template: Vec<Stmt>,
    pub methods: std::collections::HashMap<String, Rc<FunctionValue>>,
    pub superclass: Option<Rc<ClassValue>>,
    /// Environment the class was declared in; field initializers and method
    /// closures are evaluated/bound against it.
    pub declaring_env: EnvRef,
}

impl ClassValue {
    /// Walks the inheritance chain (self first) looking for a method.
    pub fn get_method(&self, name: &str) -> Option<Rc<FunctionValue>> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }
        self.superclass.as_ref().and_then(|s| s.get_method(name))
    }

    pub fn is_subclass_of(&self, other: &str) -> bool {
        if self.name == other {
            return true;
        }
        match &self.superclass {
            Some(parent) => parent.is_subclass_of(other),
            None => false,
        }
    }
}

impl fmt::Debug for ClassValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassValue").field("name", &self.name).finish()
    }
}

static NEXT_INSTANCE_ID: AtomicUsize = AtomicUsize::new(1);

#[derive(Debug)]
pub struct InstanceValue {
    pub class: Rc<ClassValue>,
    pub fields: std::collections::HashMap<String, Value>,
    pub id: usize,
}

impl InstanceValue {
    pub fn new(class: Rc<ClassValue>, fields: std::collections::HashMap<String, Value>) -> Self {
        Self {
            class,
            fields,
            id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    String(String),
    Boolean(bool),
    Null,
    Array(Rc<RefCell<ArrayValue>>),
    Function(Rc<FunctionValue>),
    Class(Rc<ClassValue>),
    Instance(Rc<RefCell<InstanceValue>>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Value {
    /// Only `null` and `false` are falsy; everything else, including `0` and
    /// empty strings/arrays, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::String(_) => "string",
            Value::Boolean(_) => "bool",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Function(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }

    /// Structural equality as defined for `==`/`!=`: `null` only equals
    /// `null`; values of differing kinds are never equal. Arrays compare by
    /// content (element-wise, plus declared element type), the same
    /// structural equality the value model's other immutable literal kinds
    /// get; functions, classes, and instances are reference types and
    /// compare by identity.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let a = a.borrow();
                let b = b.borrow();
                a.element_type == b.element_type
                    && a.elements.len() == b.elements.len()
                    && a.elements.iter().zip(b.elements.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Checks whether this value is compatible with a declared type, per the
    /// compatibility table (integer/string/bool/array<T>/any/class name).
    pub fn matches_declared_type(&self, declared_type: &str) -> bool {
        match declared_type {
            "any" => true,
            "integer" => matches!(self, Value::Integer(_)),
            "string" => matches!(self, Value::String(_)),
            "bool" | "boolean" => matches!(self, Value::Boolean(_)),
            ty if ty.starts_with("array<") && ty.ends_with('>') => match self {
                Value::Array(arr) => {
                    let element_type = &ty[6..ty.len() - 1];
                    let arr = arr.borrow();
                    arr.elements.is_empty() || arr.element_type == element_type
                }
                _ => false,
            },
            class_name => match self {
                Value::Instance(inst) => inst.borrow().class.is_subclass_of(class_name),
                _ => false,
            },
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Null => write!(f, "null"),
            Value::Array(arr) => {
                let arr = arr.borrow();
                write!(f, "[")?;
                for (i, el) in arr.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{el}")?;
                }
                write!(f, "]")
            }
            Value::Instance(inst) => {
                let inst = inst.borrow();
                write!(f, "<{}>@{}", inst.class.name, inst.id)
            }
            Value::Function(func) => {
                write!(f, "fun {}(", func.name)?;
                for (i, param) in func.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} => {}", param.name, param.declared_type)?;
                }
                write!(f, ")")
            }
            Value::Class(class) => write!(f, "class {}", class.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array(elements: Vec<Value>, element_type: &str) -> Value {
        Value::Array(Rc::new(RefCell::new(ArrayValue {
            elements,
            element_type: element_type.to_string(),
        })))
    }

    #[test]
    fn arrays_with_equal_contents_compare_equal_by_value() {
        let a = array(vec![Value::Integer(1), Value::Integer(2)], "integer");
        let b = array(vec![Value::Integer(1), Value::Integer(2)], "integer");
        assert!(a.equals(&b));
    }

    #[test]
    fn arrays_with_differing_contents_are_not_equal() {
        let a = array(vec![Value::Integer(1)], "integer");
        let b = array(vec![Value::Integer(2)], "integer");
        assert!(!a.equals(&b));
    }

    #[test]
    fn only_null_equals_null() {
        assert!(Value::Null.equals(&Value::Null));
        assert!(!Value::Null.equals(&Value::Integer(0)));
        assert!(!Value::Boolean(false).equals(&Value::Null));
    }

    #[test]
    fn truthiness_excludes_only_null_and_false() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::String(String::new()).is_truthy());
        assert!(array(vec![], "any").is_truthy());
    }
}
