//! Top-level builtin functions: `len`, `print`, `time`, `input`.

use std::io::{self, BufRead, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::EvalError;
use crate::interpreter::Interpreter;
use crate::value::{Builtin, Instance, Value, VARIADIC};

pub fn builtin_functions() -> Vec<Rc<Builtin>> {
    vec![
        Rc::new(Builtin {
            name: "len",
            arity: 1,
            func: builtin_len,
        }),
        Rc::new(Builtin {
            name: "print",
            arity: VARIADIC,
            func: builtin_print,
        }),
        Rc::new(Builtin {
            name: "time",
            arity: 0,
            func: builtin_time,
        }),
        Rc::new(Builtin {
            name: "input",
            arity: 1,
            func: builtin_input,
        }),
    ]
}

/// `len(x)` dispatches to `x.__len__()`.
fn builtin_len(interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    if let Value::Instance(instance) = &args[0] {
        if let Some(method) = Instance::get(instance, "__len__") {
            return interp.call_value(&method, vec![]);
        }
    }
    Err(EvalError::NoLen(args[0].type_name()))
}

/// `print(x...)` renders each argument through `__str__`, one per line.
fn builtin_print(interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    for arg in args {
        let rendered = interp.str_string(arg)?;
        println!("{}", rendered);
    }
    Ok(Value::Null)
}

/// `time()` returns milliseconds since the Unix epoch as an `int` instance.
fn builtin_time(interp: &mut Interpreter, _args: &[Value]) -> Result<Value, EvalError> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64;
    interp.make_int(millis)
}

/// `input(prompt)` writes the prompt, blocks for a line of standard input,
/// and returns it as a `str` instance with the trailing newline removed.
fn builtin_input(interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    let prompt = interp.str_string(&args[0])?;
    print!("{}", prompt);
    io::stdout()
        .flush()
        .map_err(|e| EvalError::runtime(e.to_string()))?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| EvalError::runtime(e.to_string()))?;
    let line = line.trim_end_matches(['\n', '\r']).to_string();
    interp.make_str(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len_dispatches_to_dunder() {
        let mut interp = Interpreter::new();
        let s = interp.make_str("abcd").unwrap();
        let length = builtin_len(&mut interp, &[s]).unwrap();
        assert_eq!(interp.repr_string(&length).unwrap(), "4");
    }

    #[test]
    fn test_len_without_dunder() {
        let mut interp = Interpreter::new();
        let n = interp.make_int(5).unwrap();
        let err = builtin_len(&mut interp, &[n]).unwrap_err();
        assert_eq!(err.to_string(), "object of type 'int' has no len()");
    }

    #[test]
    fn test_time_returns_int_instance() {
        let mut interp = Interpreter::new();
        let now = builtin_time(&mut interp, &[]).unwrap();
        match now {
            Value::Instance(instance) => assert_eq!(instance.class.name, "int"),
            other => panic!("expected int instance, got {:?}", other),
        }
    }
}
