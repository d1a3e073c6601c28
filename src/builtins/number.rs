//! Numeric classes: `Number`, `int`, and `float`.
//!
//! `Number` implements the arithmetic and comparison dunders as a closed
//! 2×2 dispatch over `{int, float} × {int, float}`. Mixed operands promote
//! to float; division always produces a float.

use std::rc::Rc;

use super::{class, method, primitive_of};
use crate::error::EvalError;
use crate::interpreter::Interpreter;
use crate::value::{format_float, Class, Value};

pub fn define_number_class(type_class: &Rc<Class>) -> Rc<Class> {
    class(
        "Number",
        vec![Rc::clone(type_class)],
        vec![
            method("__add__", 1, number_add),
            method("__sub__", 1, number_sub),
            method("__mul__", 1, number_mul),
            method("__div__", 1, number_div),
            method("__mod__", 1, number_mod),
            method("__eq__", 1, number_eq),
            method("__ne__", 1, number_ne),
            method("__lt__", 1, number_lt),
        ],
    )
}

pub fn define_int_class(number: &Rc<Class>) -> Rc<Class> {
    class(
        "int",
        vec![Rc::clone(number)],
        vec![
            method("init", 1, int_init),
            method("__repr__", 0, int_repr),
            method("__str__", 0, int_repr),
        ],
    )
}

pub fn define_float_class(number: &Rc<Class>) -> Rc<Class> {
    class(
        "float",
        vec![Rc::clone(number)],
        vec![
            method("init", 1, float_init),
            method("__repr__", 0, float_repr),
            method("__str__", 0, float_repr),
        ],
    )
}

/// A numeric primitive pulled out of an operand.
#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(n) => n,
        }
    }

    fn as_i64(self) -> i64 {
        match self {
            Num::Int(n) => n,
            Num::Float(n) => n as i64,
        }
    }
}

fn operand(value: &Value) -> Option<Num> {
    match primitive_of(value) {
        Value::Int(n) => Some(Num::Int(n)),
        Value::Float(n) => Some(Num::Float(n)),
        _ => None,
    }
}

/// Pulls both operands or reports the unsupported pairing.
fn operands(op: &str, receiver: &Value, args: &[Value]) -> Result<(Num, Num), EvalError> {
    match (operand(receiver), operand(&args[0])) {
        (Some(left), Some(right)) => Ok((left, right)),
        _ => Err(EvalError::unsupported_operands(
            op,
            &receiver.type_name(),
            &args[0].type_name(),
        )),
    }
}

fn arithmetic(
    interp: &mut Interpreter,
    receiver: &Value,
    args: &[Value],
    op: &str,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    let (left, right) = operands(op, receiver, args)?;
    match (left, right) {
        (Num::Int(a), Num::Int(b)) => interp.make_int(int_op(a, b)),
        _ => interp.make_float(float_op(left.as_f64(), right.as_f64())),
    }
}

fn number_add(i: &mut Interpreter, r: &Value, a: &[Value]) -> Result<Value, EvalError> {
    arithmetic(i, r, a, "+", i64::wrapping_add, |x, y| x + y)
}

fn number_sub(i: &mut Interpreter, r: &Value, a: &[Value]) -> Result<Value, EvalError> {
    arithmetic(i, r, a, "-", i64::wrapping_sub, |x, y| x - y)
}

fn number_mul(i: &mut Interpreter, r: &Value, a: &[Value]) -> Result<Value, EvalError> {
    arithmetic(i, r, a, "*", i64::wrapping_mul, |x, y| x * y)
}

/// Division always produces a float, even for two ints.
fn number_div(i: &mut Interpreter, r: &Value, a: &[Value]) -> Result<Value, EvalError> {
    let (left, right) = operands("/", r, a)?;
    if right.as_f64() == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    i.make_float(left.as_f64() / right.as_f64())
}

/// Remainder. Two ints stay an int; any float truncates both operands to
/// integers first and wraps the result back into a float.
fn number_mod(i: &mut Interpreter, r: &Value, a: &[Value]) -> Result<Value, EvalError> {
    let (left, right) = operands("%", r, a)?;
    match (left, right) {
        (Num::Int(x), Num::Int(y)) => {
            let rem = x.checked_rem(y).ok_or(EvalError::DivisionByZero)?;
            i.make_int(rem)
        }
        _ => {
            let rem = left
                .as_i64()
                .checked_rem(right.as_i64())
                .ok_or(EvalError::DivisionByZero)?;
            i.make_float(rem as f64)
        }
    }
}

fn compare(
    receiver: &Value,
    args: &[Value],
    op: &str,
    int_cmp: fn(i64, i64) -> bool,
    float_cmp: fn(f64, f64) -> bool,
) -> Result<Value, EvalError> {
    let (left, right) = operands(op, receiver, args)?;
    let result = match (left, right) {
        (Num::Int(a), Num::Int(b)) => int_cmp(a, b),
        _ => float_cmp(left.as_f64(), right.as_f64()),
    };
    Ok(Value::Bool(result))
}

fn number_eq(_i: &mut Interpreter, r: &Value, a: &[Value]) -> Result<Value, EvalError> {
    compare(r, a, "==", |x, y| x == y, |x, y| x == y)
}

fn number_ne(_i: &mut Interpreter, r: &Value, a: &[Value]) -> Result<Value, EvalError> {
    compare(r, a, "!=", |x, y| x != y, |x, y| x != y)
}

fn number_lt(_i: &mut Interpreter, r: &Value, a: &[Value]) -> Result<Value, EvalError> {
    compare(r, a, "<", |x, y| x < y, |x, y| x < y)
}

fn int_init(
    _interp: &mut Interpreter,
    receiver: &Value,
    args: &[Value],
) -> Result<Value, EvalError> {
    let Value::Instance(instance) = receiver else {
        return Err(EvalError::runtime("init called without an instance"));
    };
    match primitive_of(&args[0]) {
        Value::Int(n) => {
            instance.set("value", Value::Int(n));
            Ok(Value::Null)
        }
        other => Err(EvalError::runtime(format!(
            "int() argument must be an integer, got {}",
            other.type_name()
        ))),
    }
}

fn float_init(
    _interp: &mut Interpreter,
    receiver: &Value,
    args: &[Value],
) -> Result<Value, EvalError> {
    let Value::Instance(instance) = receiver else {
        return Err(EvalError::runtime("init called without an instance"));
    };
    match primitive_of(&args[0]) {
        Value::Float(n) => {
            instance.set("value", Value::Float(n));
            Ok(Value::Null)
        }
        Value::Int(n) => {
            instance.set("value", Value::Float(n as f64));
            Ok(Value::Null)
        }
        other => Err(EvalError::runtime(format!(
            "float() argument must be a number, got {}",
            other.type_name()
        ))),
    }
}

fn int_repr(
    interp: &mut Interpreter,
    receiver: &Value,
    _args: &[Value],
) -> Result<Value, EvalError> {
    match primitive_of(receiver) {
        Value::Int(n) => interp.make_str(n.to_string()),
        _ => Err(EvalError::runtime("int instance has no integer value")),
    }
}

fn float_repr(
    interp: &mut Interpreter,
    receiver: &Value,
    _args: &[Value],
) -> Result<Value, EvalError> {
    match primitive_of(receiver) {
        Value::Float(n) => interp.make_str(format_float(n)),
        _ => Err(EvalError::runtime("float instance has no float value")),
    }
}
