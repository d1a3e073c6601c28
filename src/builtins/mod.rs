//! # Builtin Type Hierarchy and Functions
//!
//! Every runtime value observable to user code is an instance of a class
//! from this module. The hierarchy is rooted at `object`:
//!
//! - **object** — default dunders; arithmetic slots report "Not implemented"
//! - **type** — the metaclass representing classes themselves
//! - **Number** — closed int/float arithmetic and comparison dispatch
//! - **int**, **float** — wrap the numeric primitives in a `value` field
//! - **container** — shared stubs for the sequence protocol
//! - **list**, **map**, **str** — concrete containers
//!
//! Top-level builtin functions (`len`, `print`, `time`, `input`) live in
//! [`functions`]. Each sub-module defines its classes; this module wires
//! them together and registers everything into the globals environment.

use std::collections::HashMap;
use std::rc::Rc;

use crate::env::Environment;
use crate::value::{BuiltinMethod, Class, NativeMethodFn, Value};

pub mod container;
pub mod functions;
pub mod number;
pub mod object;

/// Names of the top-level builtin functions. Rebinding one is an error.
pub const BUILTIN_FUNCTION_NAMES: [&str; 4] = ["len", "print", "time", "input"];

/// Names of the builtin classes, in definition order.
pub const BUILTIN_CLASS_NAMES: [&str; 9] = [
    "object",
    "type",
    "Number",
    "int",
    "float",
    "container",
    "list",
    "map",
    "str",
];

pub fn is_builtin_function(name: &str) -> bool {
    BUILTIN_FUNCTION_NAMES.contains(&name)
}

pub fn is_builtin_class(name: &str) -> bool {
    BUILTIN_CLASS_NAMES.contains(&name)
}

/// True for any reserved builtin name, function or class.
pub fn is_builtin_name(name: &str) -> bool {
    is_builtin_function(name) || is_builtin_class(name)
}

/// Direct handles to the builtin classes, used by the interpreter to wrap
/// literals without an environment lookup.
pub struct BuiltinClasses {
    pub object: Rc<Class>,
    pub type_class: Rc<Class>,
    pub number: Rc<Class>,
    pub int: Rc<Class>,
    pub float: Rc<Class>,
    pub container: Rc<Class>,
    pub list: Rc<Class>,
    pub map: Rc<Class>,
    pub string: Rc<Class>,
}

/// Builds the builtin class hierarchy, leaves last.
pub fn define_builtin_classes() -> BuiltinClasses {
    let object = object::define_object_class();
    let type_class = object::define_type_class(&object);
    let number = number::define_number_class(&type_class);
    let int = number::define_int_class(&number);
    let float = number::define_float_class(&number);
    let container = container::define_container_class(&type_class);
    let list = container::define_list_class(&container);
    let map = container::define_map_class(&container);
    let string = container::define_str_class(&container);
    BuiltinClasses {
        object,
        type_class,
        number,
        int,
        float,
        container,
        list,
        map,
        string,
    }
}

/// Seeds the globals environment with the builtin classes and functions.
pub fn register_builtins(globals: &Rc<Environment>, classes: &BuiltinClasses) {
    globals.define("object", Value::Class(Rc::clone(&classes.object)));
    globals.define("type", Value::Class(Rc::clone(&classes.type_class)));
    globals.define("Number", Value::Class(Rc::clone(&classes.number)));
    globals.define("int", Value::Class(Rc::clone(&classes.int)));
    globals.define("float", Value::Class(Rc::clone(&classes.float)));
    globals.define("container", Value::Class(Rc::clone(&classes.container)));
    globals.define("list", Value::Class(Rc::clone(&classes.list)));
    globals.define("map", Value::Class(Rc::clone(&classes.map)));
    globals.define("str", Value::Class(Rc::clone(&classes.string)));

    for builtin in functions::builtin_functions() {
        globals.define(builtin.name, Value::Builtin(builtin));
    }
}

/// Builds one entry of a builtin method table.
pub(crate) fn method(
    name: &'static str,
    arity: i32,
    func: NativeMethodFn,
) -> (String, Rc<BuiltinMethod>) {
    (name.to_string(), Rc::new(BuiltinMethod { name, arity, func }))
}

/// Assembles a builtin class from its method table and superclass chain.
pub(crate) fn class(
    name: &str,
    superclasses: Vec<Rc<Class>>,
    methods: Vec<(String, Rc<BuiltinMethod>)>,
) -> Rc<Class> {
    Rc::new(Class {
        name: name.to_string(),
        superclasses,
        user_methods: HashMap::new(),
        builtin_methods: methods.into_iter().collect(),
    })
}

/// Extracts an i64 from an argument, unwrapping an `int` instance if needed.
pub(crate) fn int_arg(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(*n),
        Value::Instance(instance) => match instance.primitive() {
            Some(Value::Int(n)) => Some(n),
            _ => None,
        },
        _ => None,
    }
}

/// Extracts a string from an argument, unwrapping a `str` instance if needed.
pub(crate) fn str_arg(value: &Value) -> Option<Rc<String>> {
    match value {
        Value::Str(s) => Some(Rc::clone(s)),
        Value::Instance(instance) => match instance.primitive() {
            Some(Value::Str(s)) => Some(s),
            _ => None,
        },
        _ => None,
    }
}

/// The primitive behind an argument: the value itself, or the instance's
/// `value` field.
pub(crate) fn primitive_of(value: &Value) -> Value {
    match value {
        Value::Instance(instance) => instance.primitive().unwrap_or(Value::Null),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_name_tables() {
        assert!(is_builtin_function("print"));
        assert!(is_builtin_class("int"));
        assert!(is_builtin_name("len"));
        assert!(is_builtin_name("object"));
        assert!(!is_builtin_name("user_thing"));
    }

    #[test]
    fn test_class_hierarchy_shape() {
        let classes = define_builtin_classes();
        assert!(classes.object.superclasses.is_empty());
        assert_eq!(classes.type_class.superclasses[0].name, "object");
        assert_eq!(classes.number.superclasses[0].name, "type");
        assert_eq!(classes.int.superclasses[0].name, "Number");
        assert_eq!(classes.float.superclasses[0].name, "Number");
        assert_eq!(classes.container.superclasses[0].name, "type");
        assert_eq!(classes.list.superclasses[0].name, "container");
        assert_eq!(classes.map.superclasses[0].name, "container");
        assert_eq!(classes.string.superclasses[0].name, "container");
    }

    #[test]
    fn test_int_inherits_number_arithmetic() {
        let classes = define_builtin_classes();
        assert!(classes.int.get_method("__add__").is_some());
        assert!(classes.int.get_method("__lt__").is_some());
        // __get__ belongs to containers, not numbers.
        assert!(classes.int.get_method("__get__").is_none());
    }
}
