use crate::error::MusError;
use crate::value::{ClassValue, FunctionValue, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub type EnvRef = Rc<RefCell<Environment>>;

/// Name → value mapping with a parent link forming the scope chain. Holds
/// three disjoint namespaces (variables, functions, classes) as the language
/// spec describes, so a name can be a variable, a function, and a class
/// simultaneously without one shadowing the others.
#[derive(Debug)]
pub struct Environment {
    parent: Option<EnvRef>,
    variables: HashMap<String, (String, Value)>,
    functions: HashMap<String, Rc<FunctionValue>>,
    classes: HashMap<String, Rc<ClassValue>>,
}

impl Environment {
    pub fn new_root() -> EnvRef {
        Rc::new(RefCell::new(Environment {
            parent: None,
            variables: HashMap::new(),
            functions: HashMap::new(),
            classes: HashMap::new(),
        }))
    }

    pub fn child(parent: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            parent: Some(parent.clone()),
            variables: HashMap::new(),
            functions: HashMap::new(),
            classes: HashMap::new(),
        }))
    }

    pub fn define_variable(this: &EnvRef, name: &str, declared_type: &str, value: Value) {
        this.borrow_mut()
            .variables
            .insert(name.to_string(), (declared_type.to_string(), value));
    }

    /// Finds the nearest enclosing binding for `name` and updates it in place.
    /// Shadowing is not retroactive: only the binding actually found is
    /// touched, never one further out.
    pub fn assign(this: &EnvRef, name: &str, value: Value) -> Result<(), MusError> {
        if this.borrow().variables.contains_key(name) {
            let declared_type = this.borrow().variables[name].0.clone();
            this.borrow_mut()
                .variables
                .insert(name.to_string(), (declared_type, value));
            return Ok(());
        }

        let parent = this.borrow().parent.clone();
        match parent {
            Some(parent) => Environment::assign(&parent, name, value),
            None => Err(MusError::name(format!("Undefined variable '{name}'"), (0, 0))),
        }
    }

    pub fn get_variable(this: &EnvRef, name: &str) -> Option<Value> {
        if let Some((_, value)) = this.borrow().variables.get(name) {
            return Some(value.clone());
        }
        let parent = this.borrow().parent.clone();
        parent.and_then(|parent| Environment::get_variable(&parent, name))
    }

    pub fn declared_type(this: &EnvRef, name: &str) -> Option<String> {
        if let Some((ty, _)) = this.borrow().variables.get(name) {
            return Some(ty.clone());
        }
        let parent = this.borrow().parent.clone();
        parent.and_then(|parent| Environment::declared_type(&parent, name))
    }

    pub fn define_function(this: &EnvRef, name: &str, function: Rc<FunctionValue>) {
        this.borrow_mut().functions.insert(name.to_string(), function);
    }

    pub fn get_function(this: &EnvRef, name: &str) -> Option<Rc<FunctionValue>> {
        if let Some(function) = this.borrow().functions.get(name) {
            return Some(function.clone());
        }
        let parent = this.borrow().parent.clone();
        parent.and_then(|parent| Environment::get_function(&parent, name))
    }

    pub fn define_class(this: &EnvRef, name: &str, class: Rc<ClassValue>) {
        this.borrow_mut().classes.insert(name.to_string(), class);
    }

    pub fn get_class(this: &EnvRef, name: &str) -> Option<Rc<ClassValue>> {
        if let Some(class) = this.borrow().classes.get(name) {
            return Some(class.clone());
        }
        let parent = this.borrow().parent.clone();
        parent.and_then(|parent| Environment::get_class(&parent, name))
    }

    /// Resolves a bare identifier the way a `Variable` expression does: try
    /// the variable namespace across the whole scope chain first, then the
    /// function namespace, then the class namespace.
    pub fn resolve_name(this: &EnvRef, name: &str) -> Option<Value> {
        if let Some(value) = Environment::get_variable(this, name) {
            return Some(value);
        }
        if let Some(function) = Environment::get_function(this, name) {
            return Some(Value::Function(function));
        }
        if let Some(class) = Environment::get_class(this, name) {
            return Some(Value::Class(class));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_sees_parent_bindings() {
        let root = Environment::new_root();
        Environment::define_variable(&root, "x", "integer", Value::Integer(1));
        let child = Environment::child(&root);
        assert_eq!(Environment::get_variable(&child, "x"), Some(Value::Integer(1)));
    }

    #[test]
    fn assign_updates_nearest_enclosing_binding() {
        let root = Environment::new_root();
        Environment::define_variable(&root, "x", "integer", Value::Integer(1));
        let child = Environment::child(&root);
        Environment::assign(&child, "x", Value::Integer(2)).unwrap();
        assert_eq!(Environment::get_variable(&root, "x"), Some(Value::Integer(2)));
    }

    #[test]
    fn shadowing_in_child_does_not_leak_to_parent() {
        let root = Environment::new_root();
        Environment::define_variable(&root, "x", "integer", Value::Integer(1));
        let child = Environment::child(&root);
        Environment::define_variable(&child, "x", "integer", Value::Integer(99));
        assert_eq!(Environment::get_variable(&root, "x"), Some(Value::Integer(1)));
        assert_eq!(Environment::get_variable(&child, "x"), Some(Value::Integer(99)));
    }

    #[test]
    fn assign_to_unknown_name_is_an_error() {
        let root = Environment::new_root();
        assert!(Environment::assign(&root, "nope", Value::Null).is_err());
    }
}
