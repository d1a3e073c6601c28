// ABOUTME: Tree-walking interpreter driving evaluation and the class model

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{Block, ClassDecl, Expr, NodeId, Stmt};
use crate::builtins::{self, is_builtin_function, BuiltinClasses};
use crate::env::Environment;
use crate::error::EvalError;
use crate::token::TokenKind;
use crate::value::{
    BoundMethod, Class, ClassMethod, Function, Instance, MapKey, MapPair, Value, VARIADIC,
};

/// Non-local control flow during evaluation: either a `return` unwinding to
/// the nearest function boundary, or an error unwinding to the top level.
#[derive(Debug)]
pub enum Interrupt {
    Return(Value),
    Error(EvalError),
}

impl From<EvalError> for Interrupt {
    fn from(err: EvalError) -> Self {
        Interrupt::Error(err)
    }
}

/// The tree walker.
///
/// Holds the globals (pre-populated with builtin functions and classes), the
/// current environment, and the resolver's side table of lexical depths.
pub struct Interpreter {
    globals: Rc<Environment>,
    env: Rc<Environment>,
    locals: HashMap<NodeId, usize>,
    classes: BuiltinClasses,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Environment::new();
        let classes = builtins::define_builtin_classes();
        builtins::register_builtins(&globals, &classes);
        Interpreter {
            env: globals.clone(),
            globals,
            locals: HashMap::new(),
            classes,
        }
    }

    /// Records the lexical depth of a resolved reference. Called by the
    /// resolver; keyed on node identity.
    pub fn resolve(&mut self, id: NodeId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// The recorded depth for a node, if the resolver found it in a local
    /// scope. Global references have no entry.
    pub fn resolved_depth(&self, id: NodeId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    /// Reads a binding from the globals environment.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name)
    }

    /// Runs a program and returns the value of its last statement, which is
    /// `None` for definitions and other value-less statements.
    pub fn interpret(&mut self, program: &[Stmt]) -> Result<Option<Value>, EvalError> {
        let mut result = None;
        for statement in program {
            match self.execute_statement(statement) {
                Ok(value) => result = value,
                // The resolver rejects top-level returns; treat one that
                // slips through as the final value.
                Err(Interrupt::Return(value)) => return Ok(Some(value)),
                Err(Interrupt::Error(err)) => return Err(err),
            }
        }
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn execute_statement(&mut self, statement: &Stmt) -> Result<Option<Value>, Interrupt> {
        match statement {
            Stmt::Def { name, value } => {
                let value = self.eval_expression(value)?;
                if is_builtin_function(&name.name) {
                    return Err(EvalError::RedefineBuiltin(name.name.clone()).into());
                }
                self.env.define(name.name.clone(), value);
                Ok(None)
            }
            Stmt::Return { value } => {
                let value = self.eval_expression(value)?;
                Err(Interrupt::Return(value))
            }
            Stmt::While { condition, body } => {
                while self.eval_expression(condition)?.is_truthy() {
                    let env = Environment::with_parent(self.env.clone());
                    self.execute_block(body, env)?;
                }
                Ok(None)
            }
            Stmt::Class(decl) => {
                self.execute_class(decl)?;
                Ok(None)
            }
            Stmt::Block(block) => {
                let env = Environment::with_parent(self.env.clone());
                self.execute_block(block, env)?;
                Ok(None)
            }
            Stmt::Expr(expr) => Ok(Some(self.eval_expression(expr)?)),
        }
    }

    /// Executes a block's statements in `env`, restoring the previous
    /// environment on every exit path. Statement values are discarded; only
    /// a `return` or an error stops the block early.
    fn execute_block(&mut self, block: &Block, env: Rc<Environment>) -> Result<(), Interrupt> {
        let previous = std::mem::replace(&mut self.env, env);
        for statement in &block.statements {
            if let Err(interrupt) = self.execute_statement(statement) {
                self.env = previous;
                return Err(interrupt);
            }
        }
        self.env = previous;
        Ok(())
    }

    fn execute_class(&mut self, decl: &ClassDecl) -> Result<(), Interrupt> {
        self.env.define(decl.name.name.clone(), Value::Null);

        let object_class = Rc::clone(&self.classes.object);
        let mut superclasses = vec![Rc::clone(&object_class)];

        let explicit = match &decl.superclass {
            Some(ident) => {
                let value = self.lookup_variable(&ident.name, ident.id)?;
                match value {
                    Value::Class(class) => {
                        superclasses.push(Rc::clone(&class));
                        Some(class)
                    }
                    _ => return Err(EvalError::SuperclassNotClass.into()),
                }
            }
            None => None,
        };

        // Methods close over an environment that binds `super` to `object`
        // and, when an explicit superclass exists, a nearer `super` bound to
        // that class. The layering must match the resolver's scope stack.
        let base_env = Environment::with_parent(self.env.clone());
        base_env.define("super", Value::Class(Rc::clone(&object_class)));
        let method_env = match &explicit {
            Some(class) => {
                let env = Environment::with_parent(base_env);
                env.define("super", Value::Class(Rc::clone(class)));
                env
            }
            None => base_env,
        };

        let mut user_methods = HashMap::new();
        for method in &decl.methods {
            let parameters = method
                .function
                .parameters
                .iter()
                .map(|p| p.name.clone())
                .collect();
            let function = Function::new(
                parameters,
                Rc::clone(&method.function.body),
                Rc::clone(&method_env),
            );
            user_methods.insert(method.name.name.clone(), Rc::new(function));
        }

        let class = Rc::new(Class {
            name: decl.name.name.clone(),
            superclasses,
            user_methods,
            builtin_methods: HashMap::new(),
        });
        self.env.define(decl.name.name.clone(), Value::Class(class));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn eval_expression(&mut self, expr: &Expr) -> Result<Value, Interrupt> {
        match expr {
            Expr::Ident(ident) => Ok(self.lookup_variable(&ident.name, ident.id)?),
            Expr::Int(n) => Ok(self.make_int(*n)?),
            Expr::Float(n) => Ok(self.make_float(*n)?),
            Expr::Str(s) => Ok(self.make_str(s.clone())?),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::List(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expression(element)?);
                }
                Ok(self.make_list(values)?)
            }
            Expr::Prefix { op, right } => {
                let right = self.eval_expression(right)?;
                Ok(self.eval_prefix(*op, right)?)
            }
            Expr::Infix { op, left, right } => self.eval_infix(*op, left, right),
            Expr::If {
                condition,
                consequence,
                alternative,
            } => {
                let condition = self.eval_expression(condition)?;
                if condition.is_truthy() {
                    let env = Environment::with_parent(self.env.clone());
                    self.execute_block(consequence, env)?;
                } else if let Some(alternative) = alternative {
                    let env = Environment::with_parent(self.env.clone());
                    self.execute_block(alternative, env)?;
                }
                // A branch only produces a value by returning out of the
                // enclosing function; otherwise the expression is null.
                Ok(Value::Null)
            }
            Expr::Call { callee, arguments } => {
                let callee = self.eval_expression(callee)?;
                let mut args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.eval_expression(argument)?);
                }
                Ok(self.call_value(&callee, args)?)
            }
            Expr::Index { left, index } => {
                let left = self.eval_expression(left)?;
                let index = self.eval_expression(index)?;
                Ok(self.eval_index(left, index)?)
            }
            Expr::Function(func) => {
                let parameters = func.parameters.iter().map(|p| p.name.clone()).collect();
                Ok(Value::Function(Rc::new(Function::new(
                    parameters,
                    Rc::clone(&func.body),
                    self.env.clone(),
                ))))
            }
            Expr::Assign { id, name, value } => {
                let value = self.eval_expression(value)?;
                if is_builtin_function(name) {
                    return Err(EvalError::ReservedIdentifier(name.clone()).into());
                }
                if let Some(&distance) = self.locals.get(id) {
                    self.env.set_at(distance, name.clone(), value);
                } else {
                    self.globals.define(name.clone(), value);
                }
                Ok(Value::Null)
            }
            Expr::Get { object, property } => {
                let object = self.eval_expression(object)?;
                Ok(self.eval_get(&object, property)?)
            }
            Expr::Set {
                object,
                property,
                value,
            } => {
                let object = self.eval_expression(object)?;
                let value = self.eval_expression(value)?;
                match &object {
                    Value::Instance(instance) => {
                        instance.set(property.clone(), value.clone());
                        Ok(value)
                    }
                    other => Err(EvalError::PropertyAccessUnsupported(other.type_name()).into()),
                }
            }
            Expr::SelfRef { id } => Ok(self.lookup_variable("self", *id)?),
            Expr::SuperRef { id, method } => Ok(self.eval_super(*id, method)?),
        }
    }

    fn lookup_variable(&self, name: &str, id: NodeId) -> Result<Value, EvalError> {
        let found = if let Some(&distance) = self.locals.get(&id) {
            self.env.get_at(distance, name)
        } else {
            self.globals.get(name)
        };
        found.ok_or_else(|| EvalError::UndefinedVariable(name.to_string()))
    }

    fn eval_prefix(&mut self, op: TokenKind, right: Value) -> Result<Value, EvalError> {
        match op {
            TokenKind::Bang => Ok(Value::Bool(!right.is_truthy())),
            TokenKind::Minus => {
                if let Value::Instance(instance) = &right {
                    match instance.primitive() {
                        Some(Value::Int(n)) => return self.make_int(-n),
                        Some(Value::Float(n)) => return self.make_float(-n),
                        _ => {}
                    }
                }
                Err(EvalError::UnknownPrefixOperator {
                    op: op.to_string(),
                    operand: right.type_name(),
                })
            }
            _ => Err(EvalError::UnknownPrefixOperator {
                op: op.to_string(),
                operand: right.type_name(),
            }),
        }
    }

    fn eval_infix(&mut self, op: TokenKind, left: &Expr, right: &Expr) -> Result<Value, Interrupt> {
        // `and`/`or` short-circuit: the right operand is untouched when the
        // left already decides the result.
        if op == TokenKind::And {
            let left = self.eval_expression(left)?;
            if !left.is_truthy() {
                return Ok(Value::Bool(false));
            }
            let right = self.eval_expression(right)?;
            return Ok(Value::Bool(right.is_truthy()));
        }
        if op == TokenKind::Or {
            let left = self.eval_expression(left)?;
            if left.is_truthy() {
                return Ok(Value::Bool(true));
            }
            let right = self.eval_expression(right)?;
            return Ok(Value::Bool(right.is_truthy()));
        }

        let left = self.eval_expression(left)?;
        let right = self.eval_expression(right)?;

        let dunder = match op {
            TokenKind::Plus => "__add__",
            TokenKind::Minus => "__sub__",
            TokenKind::Asterisk => "__mul__",
            TokenKind::Slash => "__div__",
            TokenKind::Percent => "__mod__",
            TokenKind::Lt => "__lt__",
            TokenKind::Eq => "__eq__",
            TokenKind::NotEq => "__ne__",
            _ => {
                return Err(EvalError::UnknownInfixOperator {
                    op: op.to_string(),
                    left: left.type_name(),
                    right: right.type_name(),
                }
                .into())
            }
        };

        // Operators dispatch through the left operand's dunder slot.
        if let Value::Instance(instance) = &left {
            if let Some(method) = Instance::get(instance, dunder) {
                return Ok(self.call_value(&method, vec![right])?);
            }
        }
        Err(EvalError::UnknownInfixOperator {
            op: op.to_string(),
            left: left.type_name(),
            right: right.type_name(),
        }
        .into())
    }

    fn eval_index(&mut self, left: Value, index: Value) -> Result<Value, EvalError> {
        if let Value::Instance(instance) = &left {
            if let Some(method) = Instance::get(instance, "__get__") {
                return self.call_value(&method, vec![index]);
            }
        }
        Err(EvalError::NotIndexable(left.type_name()))
    }

    fn eval_get(&mut self, object: &Value, property: &str) -> Result<Value, EvalError> {
        match object {
            // Attribute access on a class yields the raw, unbound method.
            Value::Class(class) => match class.get_method(property) {
                Some(ClassMethod::User(func)) => Ok(Value::Function(func)),
                Some(ClassMethod::Builtin(method)) => Ok(Value::Method(method)),
                None => Err(EvalError::NoSuchMethod {
                    method: property.to_string(),
                    class: class.name.clone(),
                }),
            },
            Value::Instance(instance) => Instance::get(instance, property)
                .ok_or_else(|| EvalError::UndefinedProperty(property.to_string())),
            other => Err(EvalError::PropertyAccessUnsupported(other.type_name())),
        }
    }

    fn eval_super(&mut self, id: NodeId, method_name: &str) -> Result<Value, EvalError> {
        let distance = self
            .locals
            .get(&id)
            .copied()
            .ok_or(EvalError::SuperOutsideMethod)?;

        let superclass = match self.env.get_at(distance, "super") {
            Some(Value::Class(class)) => class,
            _ => return Err(EvalError::SuperOutsideMethod),
        };
        // The receiver lives one scope nearer than the `super` binding.
        let receiver_distance = distance
            .checked_sub(1)
            .ok_or(EvalError::SuperOutsideMethod)?;
        let receiver = self
            .env
            .get_at(receiver_distance, "self")
            .ok_or(EvalError::SuperOutsideMethod)?;

        match superclass.get_method(method_name) {
            Some(ClassMethod::User(func)) => {
                Ok(Value::Function(Rc::new(func.bind(receiver))))
            }
            Some(ClassMethod::Builtin(method)) => {
                Ok(Value::BoundMethod(Rc::new(BoundMethod { method, receiver })))
            }
            None => Err(EvalError::UndefinedMethod(method_name.to_string())),
        }
    }

    // ------------------------------------------------------------------
    // Calling
    // ------------------------------------------------------------------

    /// Calls any callable value, enforcing arity first. Non-variadic
    /// callables require the exact argument count.
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, EvalError> {
        let arity = match callee {
            Value::Function(func) => func.arity() as i32,
            Value::Builtin(builtin) => builtin.arity,
            Value::BoundMethod(bound) => bound.method.arity,
            Value::Class(class) => class.arity(),
            Value::Method(method) => return Err(EvalError::UnboundMethod(method.name.to_string())),
            other => return Err(EvalError::NotCallable(other.type_name())),
        };
        if arity != VARIADIC && args.len() != arity as usize {
            return Err(EvalError::arity(args.len(), arity as usize));
        }

        match callee {
            Value::Function(func) => self.call_function(func, args),
            Value::Builtin(builtin) => (builtin.func)(self, &args),
            Value::BoundMethod(bound) => {
                let receiver = bound.receiver.clone();
                (bound.method.func)(self, &receiver, &args)
            }
            Value::Class(class) => {
                let class = Rc::clone(class);
                self.instantiate(&class, args)
            }
            _ => unreachable!("arity check rejected non-callables"),
        }
    }

    /// Invokes a user function: binds parameters in a fresh environment
    /// enclosed by the function's captured scope, then runs the body. A
    /// function without an explicit `return` yields null.
    pub fn call_function(&mut self, function: &Function, args: Vec<Value>) -> Result<Value, EvalError> {
        let env = Environment::with_parent(function.env.clone());
        for (parameter, arg) in function.parameters.iter().zip(args) {
            env.define(parameter.clone(), arg);
        }
        match self.execute_block(&function.body, env) {
            Ok(()) => Ok(Value::Null),
            Err(Interrupt::Return(value)) => Ok(value),
            Err(Interrupt::Error(err)) => Err(err),
        }
    }

    /// Constructs an instance of `class`. `init` runs when present anywhere
    /// in the hierarchy; its return value is ignored and the instance is
    /// always the result.
    pub fn instantiate(&mut self, class: &Rc<Class>, args: Vec<Value>) -> Result<Value, EvalError> {
        let instance = Instance::new(Rc::clone(class));
        let receiver = Value::Instance(instance);
        match class.get_method("init") {
            Some(ClassMethod::User(func)) => {
                let bound = func.bind(receiver.clone());
                self.call_function(&bound, args)?;
            }
            Some(ClassMethod::Builtin(method)) => {
                (method.func)(self, &receiver, &args)?;
            }
            None => {}
        }
        Ok(receiver)
    }

    /// Looks up `name` on `receiver` (field or bound method) and calls it.
    pub fn call_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        match receiver {
            Value::Instance(instance) => match Instance::get(instance, name) {
                Some(callable) => self.call_value(&callable, args),
                None => Err(EvalError::UndefinedProperty(name.to_string())),
            },
            other => Err(EvalError::PropertyAccessUnsupported(other.type_name())),
        }
    }

    // ------------------------------------------------------------------
    // Value construction and rendering
    // ------------------------------------------------------------------

    /// Wraps a primitive by calling the corresponding builtin class, whose
    /// `init` stores the primitive into the instance's `value` field.
    pub fn make_int(&mut self, value: i64) -> Result<Value, EvalError> {
        let class = Rc::clone(&self.classes.int);
        self.instantiate(&class, vec![Value::Int(value)])
    }

    pub fn make_float(&mut self, value: f64) -> Result<Value, EvalError> {
        let class = Rc::clone(&self.classes.float);
        self.instantiate(&class, vec![Value::Float(value)])
    }

    pub fn make_str(&mut self, value: impl Into<String>) -> Result<Value, EvalError> {
        let class = Rc::clone(&self.classes.string);
        self.instantiate(&class, vec![Value::Str(Rc::new(value.into()))])
    }

    pub fn make_list(&mut self, elements: Vec<Value>) -> Result<Value, EvalError> {
        let class = Rc::clone(&self.classes.list);
        self.instantiate(
            &class,
            vec![Value::List(Rc::new(std::cell::RefCell::new(elements)))],
        )
    }

    pub fn make_map(&mut self, pairs: HashMap<MapKey, MapPair>) -> Result<Value, EvalError> {
        let class = Rc::clone(&self.classes.map);
        self.instantiate(
            &class,
            vec![Value::Map(Rc::new(std::cell::RefCell::new(pairs)))],
        )
    }

    /// Renders a value through its `__repr__` method; non-instances render
    /// directly.
    pub fn repr_string(&mut self, value: &Value) -> Result<String, EvalError> {
        self.render(value, "__repr__")
    }

    /// Renders a value through its `__str__` method; non-instances render
    /// directly.
    pub fn str_string(&mut self, value: &Value) -> Result<String, EvalError> {
        self.render(value, "__str__")
    }

    fn render(&mut self, value: &Value, dunder: &str) -> Result<String, EvalError> {
        match value {
            Value::Instance(_) => {
                let rendered = self.call_method(value, dunder, vec![])?;
                Ok(coerce_to_string(&rendered))
            }
            other => Ok(other.to_string()),
        }
    }
}

/// Turns a dunder rendering result into a host string. Builtin dunders
/// produce `str` instances; user-defined ones may produce anything.
fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::Str(s) => s.to_string(),
        Value::Instance(instance) => match instance.primitive() {
            Some(primitive) => primitive.to_string(),
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}
