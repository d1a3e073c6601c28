// ABOUTME: Error types for resolution and evaluation failures

use thiserror::Error;

/// Scoping violations detected by the resolver. These are fatal: they abort
/// the run before any evaluation happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Variable with this name already declared in this scope.")]
    DuplicateDeclaration,

    #[error("Can't read local variable in its own initializer.")]
    ReadInOwnInitializer,

    #[error("Can't return from top-level code.")]
    TopLevelReturn,

    #[error("Can't return a value from an initializer.")]
    ReturnFromInitializer,

    #[error("Can't use 'self' outside of a class.")]
    SelfOutsideClass,

    #[error("Can't use 'super' outside of a class.")]
    SuperOutsideClass,

    #[error("Can't use 'super' in a class with no superclass.")]
    SuperWithoutSuperclass,

    #[error("A class can't inherit from itself.")]
    InheritFromSelf,
}

/// Runtime diagnostics. An `EvalError` halts the enclosing block and
/// propagates out to the interpreter's top level, where the driver reports
/// it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("undefined variable {0}")]
    UndefinedVariable(String),

    #[error("wrong number of arguments. got={got}, want={want}")]
    ArityMismatch { got: usize, want: usize },

    #[error("unknown operator: {op}{operand}")]
    UnknownPrefixOperator { op: String, operand: String },

    #[error("unknown operator: {left} {op} {right}")]
    UnknownInfixOperator {
        op: String,
        left: String,
        right: String,
    },

    #[error("unsupported operand type(s) for {op}: '{left}' and '{right}'")]
    UnsupportedOperands {
        op: String,
        left: String,
        right: String,
    },

    #[error("not a function: {0}")]
    NotCallable(String),

    #[error("builtin method {0} must be accessed through an instance")]
    UnboundMethod(String),

    #[error("no method {method} found for class {class}")]
    NoSuchMethod { method: String, class: String },

    #[error("undefined property {0}")]
    UndefinedProperty(String),

    #[error("undefined method {0}")]
    UndefinedMethod(String),

    #[error("property access not supported on {0}")]
    PropertyAccessUnsupported(String),

    #[error("object of type {0} does not support indexing")]
    NotIndexable(String),

    #[error("object of type '{0}' has no len()")]
    NoLen(String),

    #[error("index out of range")]
    IndexOutOfRange,

    #[error("key not found")]
    KeyNotFound,

    #[error("unhashable key: {0}")]
    UnhashableKey(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("superclass must be a class")]
    SuperclassNotClass,

    #[error("super must be used inside a method")]
    SuperOutsideMethod,

    #[error("Built-in function {0} cannot be redefined")]
    RedefineBuiltin(String),

    #[error("identifier {0} is reserved")]
    ReservedIdentifier(String),

    #[error("Not implemented")]
    NotImplemented,

    #[error("{0}")]
    Runtime(String),
}

impl EvalError {
    /// Arity failure for a call site expecting exactly `want` arguments.
    pub fn arity(got: usize, want: usize) -> Self {
        EvalError::ArityMismatch { got, want }
    }

    /// Operand type failure for a binary operator dunder.
    pub fn unsupported_operands(op: &str, left: &str, right: &str) -> Self {
        EvalError::UnsupportedOperands {
            op: op.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        }
    }

    /// A free-form runtime failure.
    pub fn runtime(message: impl Into<String>) -> Self {
        EvalError::Runtime(message.into())
    }
}
