//! The `object` root class and the `type` metaclass.
//!
//! `object` supplies the default dunder slots every value inherits. The
//! arithmetic and comparison slots all answer "Not implemented" so that an
//! unsupported operator surfaces as an evaluation error instead of a crash.

use std::rc::Rc;

use super::{class, method};
use crate::error::EvalError;
use crate::interpreter::Interpreter;
use crate::value::{Class, Value};

pub fn define_object_class() -> Rc<Class> {
    class(
        "object",
        vec![],
        vec![
            method("__repr__", 0, object_repr),
            method("__str__", 0, object_str),
            method("__eq__", 1, not_implemented),
            method("__ne__", 1, not_implemented),
            method("__add__", 1, not_implemented),
            method("__sub__", 1, not_implemented),
            method("__mul__", 1, not_implemented),
            method("__div__", 1, not_implemented),
            method("__mod__", 1, not_implemented),
        ],
    )
}

pub fn define_type_class(object: &Rc<Class>) -> Rc<Class> {
    class(
        "type",
        vec![Rc::clone(object)],
        vec![
            method("__repr__", 0, type_repr),
            method("__str__", 0, type_repr),
        ],
    )
}

fn object_repr(
    interp: &mut Interpreter,
    _receiver: &Value,
    _args: &[Value],
) -> Result<Value, EvalError> {
    interp.make_str("<object instance>")
}

/// `__str__` defers to `__repr__`, so overriding one reroutes the other.
fn object_str(
    interp: &mut Interpreter,
    receiver: &Value,
    _args: &[Value],
) -> Result<Value, EvalError> {
    interp.call_method(receiver, "__repr__", vec![])
}

fn type_repr(
    interp: &mut Interpreter,
    receiver: &Value,
    _args: &[Value],
) -> Result<Value, EvalError> {
    match super::primitive_of(receiver) {
        Value::Str(s) => interp.make_str(s.to_string()),
        _ => interp.make_str("<type instance>"),
    }
}

fn not_implemented(
    _interp: &mut Interpreter,
    _receiver: &Value,
    _args: &[Value],
) -> Result<Value, EvalError> {
    Err(EvalError::NotImplemented)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_has_default_dunders() {
        let object = define_object_class();
        for name in [
            "__repr__", "__str__", "__eq__", "__ne__", "__add__", "__sub__", "__mul__",
            "__div__", "__mod__",
        ] {
            assert!(object.get_method(name).is_some(), "missing {}", name);
        }
        assert!(object.get_method("__lt__").is_none());
    }

    #[test]
    fn test_type_extends_object() {
        let object = define_object_class();
        let type_class = define_type_class(&object);
        // __eq__ is not defined on type itself; it comes from object.
        assert!(type_class.builtin_methods.get("__eq__").is_none());
        assert!(type_class.get_method("__eq__").is_some());
    }
}
