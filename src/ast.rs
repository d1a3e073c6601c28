// ABOUTME: AST statement and expression variants produced by the parser

use std::fmt;
use std::rc::Rc;

use crate::token::TokenKind;

/// Stable identity for the AST nodes the resolver annotates.
///
/// The resolver's side table is keyed on these ids, never on structural
/// equality; the parser hands them out from a monotonically increasing
/// counter so two textually identical references stay distinct.
pub type NodeId = u32;

/// An identifier reference or binding occurrence.
#[derive(Debug, Clone)]
pub struct Ident {
    pub id: NodeId,
    pub name: String,
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A braced sequence of statements. Runs in its own scope.
#[derive(Debug, Clone)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

/// A function literal: `func(a, b) { ... }`.
///
/// The body is shared so evaluating the literal (possibly many times, for a
/// literal inside a loop) does not clone the statement tree.
#[derive(Debug, Clone)]
pub struct FuncLit {
    pub parameters: Vec<Ident>,
    pub body: Rc<Block>,
}

impl fmt::Display for FuncLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.parameters.iter().map(|p| p.name.clone()).collect();
        write!(f, "func({}) {{ {} }}", params.join(", "), self.body)
    }
}

/// A single method inside a class body: a name bound to a function literal.
#[derive(Debug, Clone)]
pub struct MethodDef {
    pub name: Ident,
    pub function: FuncLit,
}

/// A class declaration with an optional explicit superclass.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: Ident,
    pub superclass: Option<Ident>,
    pub methods: Vec<MethodDef>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `def name = value;` — the value defaults to a null literal.
    Def { name: Ident, value: Expr },
    Return { value: Expr },
    While { condition: Expr, body: Block },
    Class(ClassDecl),
    Block(Block),
    Expr(Expr),
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Def { name, value } => write!(f, "def {} = {};", name, value),
            Stmt::Return { value } => write!(f, "return {};", value),
            Stmt::While { condition, body } => write!(f, "while ({}) {{ {} }}", condition, body),
            Stmt::Class(decl) => {
                write!(f, "class {}", decl.name)?;
                if let Some(superclass) = &decl.superclass {
                    write!(f, " : {}", superclass)?;
                }
                write!(f, " {{ ")?;
                for method in &decl.methods {
                    write!(f, "def {} = {}; ", method.name, method.function)?;
                }
                write!(f, "}}")
            }
            Stmt::Block(block) => write!(f, "{{ {} }}", block),
            Stmt::Expr(expr) => write!(f, "{}", expr),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Ident(Ident),
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    List(Vec<Expr>),
    Prefix {
        op: TokenKind,
        right: Box<Expr>,
    },
    Infix {
        op: TokenKind,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        consequence: Block,
        alternative: Option<Block>,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Index {
        left: Box<Expr>,
        index: Box<Expr>,
    },
    Function(FuncLit),
    Assign {
        id: NodeId,
        name: String,
        value: Box<Expr>,
    },
    Get {
        object: Box<Expr>,
        property: String,
    },
    Set {
        object: Box<Expr>,
        property: String,
        value: Box<Expr>,
    },
    SelfRef {
        id: NodeId,
    },
    SuperRef {
        id: NodeId,
        method: String,
    },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(ident) => write!(f, "{}", ident),
            Expr::Int(n) => write!(f, "{}", n),
            Expr::Float(n) => write!(f, "{}", n),
            Expr::Str(s) => write!(f, "{}", s),
            Expr::Bool(b) => write!(f, "{}", b),
            Expr::Null => write!(f, "null"),
            Expr::List(elements) => {
                let rendered: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Expr::Prefix { op, right } => write!(f, "({}{})", op, right),
            Expr::Infix { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Expr::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if ({}) {{ {} }}", condition, consequence)?;
                if let Some(alt) = alternative {
                    write!(f, " else {{ {} }}", alt)?;
                }
                Ok(())
            }
            Expr::Call { callee, arguments } => {
                let args: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", callee, args.join(", "))
            }
            Expr::Index { left, index } => write!(f, "({}[{}])", left, index),
            Expr::Function(func) => write!(f, "{}", func),
            Expr::Assign { name, value, .. } => write!(f, "{} = {}", name, value),
            Expr::Get { object, property } => write!(f, "{}.{}", object, property),
            Expr::Set {
                object,
                property,
                value,
            } => write!(f, "{}.{} = {}", object, property, value),
            Expr::SelfRef { .. } => write!(f, "self"),
            Expr::SuperRef { method, .. } => write!(f, "super.{}", method),
        }
    }
}
