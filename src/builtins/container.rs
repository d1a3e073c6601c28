//! Container classes: `container`, `list`, `map`, and `str`.
//!
//! `container` carries stub slots for the sequence protocol that concrete
//! containers override. Strings index and slice by character, never by
//! byte, so multi-byte text cannot split a code point.

use std::rc::Rc;

use super::{class, int_arg, method, primitive_of, str_arg};
use crate::error::EvalError;
use crate::interpreter::Interpreter;
use crate::value::{Class, MapKey, Value};

pub fn define_container_class(type_class: &Rc<Class>) -> Rc<Class> {
    class(
        "container",
        vec![Rc::clone(type_class)],
        vec![
            method("__repr__", 0, container_repr),
            method("__str__", 0, container_repr),
            method("slice", 2, not_implemented),
            method("replace", 2, not_implemented),
            method("split", 1, not_implemented),
            method("__get__", 1, not_implemented),
        ],
    )
}

pub fn define_list_class(container: &Rc<Class>) -> Rc<Class> {
    class(
        "list",
        vec![Rc::clone(container)],
        vec![
            method("init", 1, list_init),
            method("__repr__", 0, list_repr),
            method("__get__", 1, list_get),
        ],
    )
}

pub fn define_map_class(container: &Rc<Class>) -> Rc<Class> {
    class(
        "map",
        vec![Rc::clone(container)],
        vec![
            method("init", 1, map_init),
            method("__repr__", 0, not_implemented),
            method("__get__", 1, map_get),
        ],
    )
}

pub fn define_str_class(container: &Rc<Class>) -> Rc<Class> {
    class(
        "str",
        vec![Rc::clone(container)],
        vec![
            method("init", 1, str_init),
            method("slice", 2, str_slice),
            method("replace", 2, str_replace),
            method("split", 1, str_split),
            method("__get__", 1, str_get),
            method("__repr__", 0, str_repr),
            method("__str__", 0, str_repr),
            method("__len__", 0, str_len),
            method("__add__", 1, str_add),
            method("__eq__", 1, str_eq),
        ],
    )
}

fn container_repr(
    interp: &mut Interpreter,
    _receiver: &Value,
    _args: &[Value],
) -> Result<Value, EvalError> {
    interp.make_str("<container instance>")
}

fn not_implemented(
    _interp: &mut Interpreter,
    _receiver: &Value,
    _args: &[Value],
) -> Result<Value, EvalError> {
    Err(EvalError::NotImplemented)
}

// ----------------------------------------------------------------------
// list
// ----------------------------------------------------------------------

fn list_init(
    _interp: &mut Interpreter,
    receiver: &Value,
    args: &[Value],
) -> Result<Value, EvalError> {
    let Value::Instance(instance) = receiver else {
        return Err(EvalError::runtime("init called without an instance"));
    };
    match primitive_of(&args[0]) {
        // The backing storage is shared, not copied: list(xs) aliases xs.
        Value::List(elements) => {
            instance.set("value", Value::List(elements));
            Ok(Value::Null)
        }
        other => Err(EvalError::runtime(format!(
            "list() argument must be a list, got {}",
            other.type_name()
        ))),
    }
}

fn list_repr(
    interp: &mut Interpreter,
    receiver: &Value,
    _args: &[Value],
) -> Result<Value, EvalError> {
    let Value::List(elements) = primitive_of(receiver) else {
        return Err(EvalError::runtime("list instance has no element storage"));
    };
    let snapshot: Vec<Value> = elements.borrow().clone();
    let mut rendered = Vec::with_capacity(snapshot.len());
    for element in &snapshot {
        rendered.push(interp.repr_string(element)?);
    }
    interp.make_str(format!("[{}]", rendered.join(", ")))
}

fn list_get(
    _interp: &mut Interpreter,
    receiver: &Value,
    args: &[Value],
) -> Result<Value, EvalError> {
    let Value::List(elements) = primitive_of(receiver) else {
        return Err(EvalError::runtime("list instance has no element storage"));
    };
    let index = int_arg(&args[0]).ok_or(EvalError::IndexOutOfRange)?;
    let elements = elements.borrow();
    if index < 0 || index as usize >= elements.len() {
        return Err(EvalError::IndexOutOfRange);
    }
    Ok(elements[index as usize].clone())
}

// ----------------------------------------------------------------------
// map
// ----------------------------------------------------------------------

fn map_init(
    _interp: &mut Interpreter,
    receiver: &Value,
    args: &[Value],
) -> Result<Value, EvalError> {
    let Value::Instance(instance) = receiver else {
        return Err(EvalError::runtime("init called without an instance"));
    };
    match primitive_of(&args[0]) {
        Value::Map(pairs) => {
            instance.set("value", Value::Map(pairs));
            Ok(Value::Null)
        }
        other => Err(EvalError::runtime(format!(
            "map() argument must be a map, got {}",
            other.type_name()
        ))),
    }
}

fn map_get(
    _interp: &mut Interpreter,
    receiver: &Value,
    args: &[Value],
) -> Result<Value, EvalError> {
    let Value::Map(pairs) = primitive_of(receiver) else {
        return Err(EvalError::runtime("map instance has no pair storage"));
    };
    let key_primitive = primitive_of(&args[0]);
    let key = MapKey::of_primitive(&key_primitive)
        .ok_or_else(|| EvalError::UnhashableKey(args[0].type_name()))?;
    let pairs = pairs.borrow();
    pairs
        .get(&key)
        .map(|pair| pair.value.clone())
        .ok_or(EvalError::KeyNotFound)
}

// ----------------------------------------------------------------------
// str
// ----------------------------------------------------------------------

fn str_init(
    _interp: &mut Interpreter,
    receiver: &Value,
    args: &[Value],
) -> Result<Value, EvalError> {
    let Value::Instance(instance) = receiver else {
        return Err(EvalError::runtime("init called without an instance"));
    };
    match primitive_of(&args[0]) {
        Value::Str(s) => {
            instance.set("value", Value::Str(s));
            Ok(Value::Null)
        }
        other => Err(EvalError::runtime(format!(
            "str() argument must be a string, got {}",
            other.type_name()
        ))),
    }
}

fn receiver_str(receiver: &Value) -> Result<Rc<String>, EvalError> {
    match primitive_of(receiver) {
        Value::Str(s) => Ok(s),
        _ => Err(EvalError::runtime("str instance has no string value")),
    }
}

/// `slice(start, end)` over characters; both bounds must lie inside the
/// string.
fn str_slice(
    interp: &mut Interpreter,
    receiver: &Value,
    args: &[Value],
) -> Result<Value, EvalError> {
    let s = receiver_str(receiver)?;
    let chars: Vec<char> = s.chars().collect();
    let start = int_arg(&args[0]).ok_or(EvalError::IndexOutOfRange)?;
    let end = int_arg(&args[1]).ok_or(EvalError::IndexOutOfRange)?;

    let len = chars.len() as i64;
    if start < 0 || start >= len || end < 0 || end >= len || start > end {
        return Err(EvalError::IndexOutOfRange);
    }
    let sliced: String = chars[start as usize..end as usize].iter().collect();
    interp.make_str(sliced)
}

/// `replace(old, new)` replaces every occurrence.
fn str_replace(
    interp: &mut Interpreter,
    receiver: &Value,
    args: &[Value],
) -> Result<Value, EvalError> {
    let s = receiver_str(receiver)?;
    let old = str_arg(&args[0]).ok_or_else(|| {
        EvalError::runtime(format!("replace() expects strings, got {}", args[0].type_name()))
    })?;
    let new = str_arg(&args[1]).ok_or_else(|| {
        EvalError::runtime(format!("replace() expects strings, got {}", args[1].type_name()))
    })?;
    interp.make_str(s.replace(old.as_str(), new.as_str()))
}

/// `split(sep)` yields a list of `str` instances. An empty separator splits
/// into individual characters.
fn str_split(
    interp: &mut Interpreter,
    receiver: &Value,
    args: &[Value],
) -> Result<Value, EvalError> {
    let s = receiver_str(receiver)?;
    let sep = str_arg(&args[0]).ok_or_else(|| {
        EvalError::runtime(format!("split() expects a string, got {}", args[0].type_name()))
    })?;

    let parts: Vec<String> = if sep.is_empty() {
        s.chars().map(|c| c.to_string()).collect()
    } else {
        s.split(sep.as_str()).map(|part| part.to_string()).collect()
    };

    let mut elements = Vec::with_capacity(parts.len());
    for part in parts {
        elements.push(interp.make_str(part)?);
    }
    interp.make_list(elements)
}

fn str_get(
    interp: &mut Interpreter,
    receiver: &Value,
    args: &[Value],
) -> Result<Value, EvalError> {
    let s = receiver_str(receiver)?;
    let index = int_arg(&args[0]).ok_or(EvalError::IndexOutOfRange)?;
    let chars: Vec<char> = s.chars().collect();
    if index < 0 || index as usize >= chars.len() {
        return Err(EvalError::IndexOutOfRange);
    }
    interp.make_str(chars[index as usize].to_string())
}

fn str_repr(
    interp: &mut Interpreter,
    receiver: &Value,
    _args: &[Value],
) -> Result<Value, EvalError> {
    let s = receiver_str(receiver)?;
    interp.make_str(s.to_string())
}

fn str_len(
    interp: &mut Interpreter,
    receiver: &Value,
    _args: &[Value],
) -> Result<Value, EvalError> {
    let s = receiver_str(receiver)?;
    interp.make_int(s.chars().count() as i64)
}

fn str_add(
    interp: &mut Interpreter,
    receiver: &Value,
    args: &[Value],
) -> Result<Value, EvalError> {
    let s = receiver_str(receiver)?;
    let other = str_arg(&args[0]).ok_or_else(|| {
        EvalError::unsupported_operands("+", &receiver.type_name(), &args[0].type_name())
    })?;
    interp.make_str(format!("{}{}", s, other))
}

fn str_eq(
    _interp: &mut Interpreter,
    receiver: &Value,
    args: &[Value],
) -> Result<Value, EvalError> {
    let s = receiver_str(receiver)?;
    let other = str_arg(&args[0]).ok_or_else(|| {
        EvalError::unsupported_operands("==", &receiver.type_name(), &args[0].type_name())
    })?;
    Ok(Value::Bool(s.as_str() == other.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap_str(interp: &mut Interpreter, s: &str) -> Value {
        interp.make_str(s).expect("str wrapping failed")
    }

    #[test]
    fn test_str_slice_by_characters() {
        let mut interp = Interpreter::new();
        let s = wrap_str(&mut interp, "héllo");
        let a = interp.make_int(1).unwrap();
        let b = interp.make_int(3).unwrap();
        let sliced = str_slice(&mut interp, &s, &[a, b]).unwrap();
        assert_eq!(interp.repr_string(&sliced).unwrap(), "él");
    }

    #[test]
    fn test_str_slice_bounds() {
        let mut interp = Interpreter::new();
        let s = wrap_str(&mut interp, "abc");
        let a = interp.make_int(0).unwrap();
        let b = interp.make_int(3).unwrap();
        let err = str_slice(&mut interp, &s, &[a, b]).unwrap_err();
        assert_eq!(err, EvalError::IndexOutOfRange);
    }

    #[test]
    fn test_str_split_empty_separator() {
        let mut interp = Interpreter::new();
        let s = wrap_str(&mut interp, "abc");
        let sep = wrap_str(&mut interp, "");
        let parts = str_split(&mut interp, &s, &[sep]).unwrap();
        assert_eq!(interp.repr_string(&parts).unwrap(), "[a, b, c]");
    }

    #[test]
    fn test_list_get_bounds() {
        let mut interp = Interpreter::new();
        let one = interp.make_int(1).unwrap();
        let list = interp.make_list(vec![one]).unwrap();
        let index = interp.make_int(-1).unwrap();
        let err = list_get(&mut interp, &list, &[index]).unwrap_err();
        assert_eq!(err, EvalError::IndexOutOfRange);
    }

    #[test]
    fn test_list_aliases_its_argument() {
        let mut interp = Interpreter::new();
        let one = interp.make_int(1).unwrap();
        let original = interp.make_list(vec![one]).unwrap();
        let copy_class = Rc::clone(&interp_classes_list(&interp));
        let alias = interp
            .instantiate(&copy_class, vec![original.clone()])
            .unwrap();

        // Pushing through the original is visible through the alias.
        if let Value::List(elements) = primitive_of(&original) {
            let two = interp.make_int(2).unwrap();
            elements.borrow_mut().push(two);
        }
        assert_eq!(interp.repr_string(&alias).unwrap(), "[1, 2]");
    }

    fn interp_classes_list(interp: &Interpreter) -> Rc<Class> {
        // The list class is reachable through the globals table.
        match interp_global(interp, "list") {
            Value::Class(class) => class,
            other => panic!("expected list class, got {:?}", other),
        }
    }

    fn interp_global(interp: &Interpreter, name: &str) -> Value {
        interp
            .global(name)
            .unwrap_or_else(|| panic!("missing global {}", name))
    }

    #[test]
    fn test_map_get_by_hashable_key() {
        use crate::value::{MapKey, MapPair};
        use std::collections::HashMap;

        let mut interp = Interpreter::new();
        let key = wrap_str(&mut interp, "k");
        let value = interp.make_int(9).unwrap();

        let mut pairs = HashMap::new();
        let map_key = MapKey::of_primitive(&primitive_of(&key)).unwrap();
        pairs.insert(
            map_key,
            MapPair {
                key: key.clone(),
                value,
            },
        );
        let map = interp.make_map(pairs).unwrap();

        let found = map_get(&mut interp, &map, &[key]).unwrap();
        assert_eq!(interp.repr_string(&found).unwrap(), "9");
    }

    #[test]
    fn test_map_get_missing_key() {
        let mut interp = Interpreter::new();
        let map = interp.make_map(std::collections::HashMap::new()).unwrap();
        let key = wrap_str(&mut interp, "nope");
        let err = map_get(&mut interp, &map, &[key]).unwrap_err();
        assert_eq!(err, EvalError::KeyNotFound);
    }

    #[test]
    fn test_map_get_unhashable_key() {
        let mut interp = Interpreter::new();
        let map = interp.make_map(std::collections::HashMap::new()).unwrap();
        let key = interp.make_list(vec![]).unwrap();
        let err = map_get(&mut interp, &map, &[key]).unwrap_err();
        assert!(matches!(err, EvalError::UnhashableKey(_)));
    }
}
