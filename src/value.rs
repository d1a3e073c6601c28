// ABOUTME: Runtime value types: primitives, classes, instances, and callables

use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::ast::Block;
use crate::env::Environment;
use crate::error::EvalError;
use crate::interpreter::Interpreter;

/// A runtime value.
///
/// Every value observable to user code is an [`Instance`] of some class;
/// the primitive variants back the storage inside an instance's `value`
/// field. Booleans and null are singletons and are never wrapped.
#[derive(Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(Rc<String>),
    List(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<HashMap<MapKey, MapPair>>>),
    Bool(bool),
    Null,
    Function(Rc<Function>),
    Builtin(Rc<Builtin>),
    /// An unbound builtin method, as produced by attribute access on a class.
    Method(Rc<BuiltinMethod>),
    /// A builtin method paired with its receiver.
    BoundMethod(Rc<BoundMethod>),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
}

impl Value {
    /// `null` and `false` are falsy; every other value is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    /// The name used for this value in diagnostics. Instances report their
    /// class name; everything else reports its structural kind.
    pub fn type_name(&self) -> String {
        match self {
            Value::Int(_) => "INTEGER".to_string(),
            Value::Float(_) => "FLOAT".to_string(),
            Value::Str(_) => "STRING".to_string(),
            Value::List(_) => "LIST".to_string(),
            Value::Map(_) => "MAP".to_string(),
            Value::Bool(_) => "BOOLEAN".to_string(),
            Value::Null => "NULL".to_string(),
            Value::Function(_) => "FUNCTION".to_string(),
            Value::Builtin(_) | Value::Method(_) | Value::BoundMethod(_) => "BUILTIN".to_string(),
            Value::Class(_) => "CLASS".to_string(),
            Value::Instance(instance) => instance.class.name.clone(),
        }
    }
}

/// Renders a float so that whole values still read as floats.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => f.write_str(&format_float(*n)),
            Value::Str(s) => f.write_str(s),
            Value::List(elements) => {
                let rendered: Vec<String> =
                    elements.borrow().iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Value::Map(pairs) => {
                let rendered: Vec<String> = pairs
                    .borrow()
                    .values()
                    .map(|pair| format!("{}: {}", pair.key, pair.value))
                    .collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => f.write_str("null"),
            Value::Function(func) => write!(f, "{}", func),
            Value::Builtin(builtin) => write!(f, "<built-in function {}>", builtin.name),
            Value::Method(method) => write!(f, "<built-in method {}>", method.name),
            Value::BoundMethod(bound) => write!(f, "<built-in method {}>", bound.method.name),
            Value::Class(class) => write!(f, "<class {}>", class.name),
            Value::Instance(instance) => write!(f, "<instance of {}>", instance.class.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "Str({:?})", s),
            other => write!(f, "{}", other),
        }
    }
}

/// A user-defined function: parameter names, a shared body, and the
/// environment captured where the literal was evaluated.
pub struct Function {
    pub parameters: Vec<String>,
    pub body: Rc<Block>,
    pub env: Rc<Environment>,
}

impl Function {
    pub fn new(parameters: Vec<String>, body: Rc<Block>, env: Rc<Environment>) -> Self {
        Function {
            parameters,
            body,
            env,
        }
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Produces a copy whose captured environment is extended with a `self`
    /// binding for `receiver`. The original function is left untouched.
    pub fn bind(&self, receiver: Value) -> Function {
        let env = Environment::with_parent(self.env.clone());
        env.define("self", receiver);
        Function {
            parameters: self.parameters.clone(),
            body: Rc::clone(&self.body),
            env,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func({}) {{ {} }}", self.parameters.join(", "), self.body)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function(func({}))", self.parameters.join(", "))
    }
}

/// Native implementation of a top-level builtin function.
pub type BuiltinFn = fn(&mut Interpreter, &[Value]) -> Result<Value, EvalError>;

/// Native implementation of a builtin method. The receiver is always an
/// explicit parameter; it is never smuggled through the argument list.
pub type NativeMethodFn = fn(&mut Interpreter, &Value, &[Value]) -> Result<Value, EvalError>;

/// Arity marker for variadic callables.
pub const VARIADIC: i32 = -1;

/// A top-level builtin function such as `len` or `print`.
pub struct Builtin {
    pub name: &'static str,
    pub arity: i32,
    pub func: BuiltinFn,
}

/// A builtin method attached to a class's method table.
pub struct BuiltinMethod {
    pub name: &'static str,
    pub arity: i32,
    pub func: NativeMethodFn,
}

/// A builtin method bound to its receiver. Binding creates a fresh value;
/// the shared [`BuiltinMethod`] is never mutated.
pub struct BoundMethod {
    pub method: Rc<BuiltinMethod>,
    pub receiver: Value,
}

/// A method found during lookup, from either method table.
#[derive(Clone)]
pub enum ClassMethod {
    User(Rc<Function>),
    Builtin(Rc<BuiltinMethod>),
}

/// A class: a name, ordered superclasses, and two method tables.
///
/// The interpreter guarantees `object` is the first superclass of every
/// class it creates.
pub struct Class {
    pub name: String,
    pub superclasses: Vec<Rc<Class>>,
    pub user_methods: HashMap<String, Rc<Function>>,
    pub builtin_methods: HashMap<String, Rc<BuiltinMethod>>,
}

impl Class {
    /// Looks up a method: the class's own user table first, then its own
    /// builtin table, then each superclass from last-declared to first,
    /// recursively. The ordering means an explicit superclass is searched
    /// before `object`.
    pub fn get_method(&self, name: &str) -> Option<ClassMethod> {
        if let Some(func) = self.user_methods.get(name) {
            return Some(ClassMethod::User(Rc::clone(func)));
        }
        if let Some(method) = self.builtin_methods.get(name) {
            return Some(ClassMethod::Builtin(Rc::clone(method)));
        }
        for superclass in self.superclasses.iter().rev() {
            if let Some(method) = superclass.get_method(name) {
                return Some(method);
            }
        }
        None
    }

    /// A class's call arity is its initializer's arity; 0 without one.
    pub fn arity(&self) -> i32 {
        match self.get_method("init") {
            Some(ClassMethod::User(func)) => func.arity() as i32,
            Some(ClassMethod::Builtin(method)) => method.arity,
            None => 0,
        }
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.name)
    }
}

/// An instance of a class: a class handle plus a field map.
pub struct Instance {
    pub class: Rc<Class>,
    pub fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Rc<Self> {
        Rc::new(Instance {
            class,
            fields: RefCell::new(HashMap::new()),
        })
    }

    /// Attribute access: a field if present, otherwise a method from the
    /// class hierarchy bound to this instance.
    pub fn get(this: &Rc<Self>, name: &str) -> Option<Value> {
        if let Some(value) = this.fields.borrow().get(name) {
            return Some(value.clone());
        }
        let receiver = Value::Instance(Rc::clone(this));
        match this.class.get_method(name)? {
            ClassMethod::User(func) => Some(Value::Function(Rc::new(func.bind(receiver)))),
            ClassMethod::Builtin(method) => Some(Value::BoundMethod(Rc::new(BoundMethod {
                method,
                receiver,
            }))),
        }
    }

    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.fields.borrow_mut().insert(name.into(), value);
    }

    /// The primitive stored in the `value` field, if any.
    pub fn primitive(&self) -> Option<Value> {
        self.fields.borrow().get("value").cloned()
    }
}

/// Hash-based map key: the primitive's kind plus its hash. Two primitives
/// of different kinds never collide even when their hashes match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapKey {
    kind: KeyKind,
    hash: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum KeyKind {
    Int,
    Float,
    Bool,
    Str,
}

impl MapKey {
    /// Builds a key from a hashable primitive. Lists, maps, and callables
    /// are not hashable.
    pub fn of_primitive(value: &Value) -> Option<MapKey> {
        let (kind, hash) = match value {
            Value::Int(n) => (KeyKind::Int, hash_of(n)),
            Value::Float(n) => (KeyKind::Float, hash_of(&n.to_bits())),
            Value::Bool(b) => (KeyKind::Bool, hash_of(b)),
            Value::Str(s) => (KeyKind::Str, hash_of(s.as_str())),
            _ => return None,
        };
        Some(MapKey { kind, hash })
    }
}

fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// A stored key/value pair. The original key is kept alongside the value so
/// maps can render their contents.
#[derive(Debug, Clone)]
pub struct MapPair {
    pub key: Value,
    pub value: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str, superclasses: Vec<Rc<Class>>) -> Rc<Class> {
        Rc::new(Class {
            name: name.to_string(),
            superclasses,
            user_methods: HashMap::new(),
            builtin_methods: HashMap::new(),
        })
    }

    fn class_with_builtin(
        name: &str,
        superclasses: Vec<Rc<Class>>,
        method_name: &'static str,
    ) -> Rc<Class> {
        fn stub(_: &mut Interpreter, _: &Value, _: &[Value]) -> Result<Value, EvalError> {
            Ok(Value::Null)
        }
        let mut builtin_methods = HashMap::new();
        builtin_methods.insert(
            method_name.to_string(),
            Rc::new(BuiltinMethod {
                name: method_name,
                arity: 0,
                func: stub,
            }),
        );
        Rc::new(Class {
            name: name.to_string(),
            superclasses,
            user_methods: HashMap::new(),
            builtin_methods,
        })
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int(0).is_truthy());
        assert!(Value::Str(Rc::new(String::new())).is_truthy());
    }

    #[test]
    fn test_primitive_display() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_method_lookup_prefers_last_declared_superclass() {
        // object is always first; the explicit superclass is appended after
        // it and must win the search.
        let object = class_with_builtin("object", vec![], "m");
        let base = class_with_builtin("Base", vec![object.clone()], "m");
        let derived = class("Derived", vec![object.clone(), base.clone()]);

        match derived.get_method("m") {
            Some(ClassMethod::Builtin(method)) => {
                // Both stubs share a name; identity tells them apart.
                assert!(Rc::ptr_eq(&method, base.builtin_methods.get("m").unwrap()));
            }
            _ => panic!("expected builtin method"),
        }
    }

    #[test]
    fn test_method_lookup_recurses_through_grandparents() {
        let object = class("object", vec![]);
        let a = class_with_builtin("A", vec![object.clone()], "m");
        let b = class("B", vec![object.clone(), a]);
        let c = class("C", vec![object, b]);
        assert!(c.get_method("m").is_some());
        assert!(c.get_method("missing").is_none());
    }

    #[test]
    fn test_instance_fields_shadow_methods() {
        let object = class_with_builtin("object", vec![], "x");
        let instance = Instance::new(object);
        instance.set("x", Value::Int(5));
        match Instance::get(&instance, "x") {
            Some(Value::Int(5)) => {}
            other => panic!("expected field value, got {:?}", other),
        }
    }

    #[test]
    fn test_map_keys_distinguish_kinds() {
        let int_key = MapKey::of_primitive(&Value::Int(1)).unwrap();
        let bool_key = MapKey::of_primitive(&Value::Bool(true)).unwrap();
        assert_ne!(int_key, bool_key);

        let a = MapKey::of_primitive(&Value::Str(Rc::new("k".to_string()))).unwrap();
        let b = MapKey::of_primitive(&Value::Str(Rc::new("k".to_string()))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unhashable_primitives() {
        let list = Value::List(Rc::new(RefCell::new(vec![])));
        assert!(MapKey::of_primitive(&list).is_none());
        assert!(MapKey::of_primitive(&Value::Null).is_none());
    }
}
