// ABOUTME: Lexical resolver computing variable-to-scope distances before execution

use std::collections::HashMap;

use crate::ast::{Block, ClassDecl, Expr, FuncLit, Ident, Stmt};
use crate::builtins::is_builtin_name;
use crate::error::ResolveError;
use crate::interpreter::Interpreter;

/// What kind of function body is currently being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassKind {
    None,
    Class,
    Subclass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopKind {
    None,
    While,
}

/// One pre-execution walk over the program.
///
/// Maintains a stack of scopes mapping each declared name to whether its
/// initializer has finished resolving. For every identifier, `self`, `super`,
/// or assignment reference found in some scope, the number of scopes between
/// the reference and the declaration is recorded in the interpreter's side
/// table. Names found in no scope are assumed global and get no entry.
pub struct Resolver<'i> {
    interpreter: &'i mut Interpreter,
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionKind,
    current_class: ClassKind,
    current_loop: LoopKind,
}

impl<'i> Resolver<'i> {
    pub fn new(interpreter: &'i mut Interpreter) -> Self {
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionKind::None,
            current_class: ClassKind::None,
            current_loop: LoopKind::None,
        }
    }

    pub fn resolve_program(&mut self, statements: &[Stmt]) -> Result<(), ResolveError> {
        for statement in statements {
            self.resolve_statement(statement)?;
        }
        Ok(())
    }

    fn resolve_statement(&mut self, statement: &Stmt) -> Result<(), ResolveError> {
        match statement {
            Stmt::Def { name, value } => {
                self.declare(name)?;
                self.resolve_expression(value)?;
                self.define(name);
                Ok(())
            }
            Stmt::Return { value } => {
                if self.current_function == FunctionKind::None {
                    return Err(ResolveError::TopLevelReturn);
                }
                if self.current_function == FunctionKind::Initializer
                    && !matches!(value, Expr::Null)
                {
                    return Err(ResolveError::ReturnFromInitializer);
                }
                self.resolve_expression(value)
            }
            Stmt::While { condition, body } => {
                let enclosing = self.current_loop;
                self.current_loop = LoopKind::While;
                self.resolve_expression(condition)?;
                let result = self.resolve_block(body);
                self.current_loop = enclosing;
                result
            }
            Stmt::Class(decl) => self.resolve_class(decl),
            Stmt::Block(block) => self.resolve_block(block),
            Stmt::Expr(expr) => self.resolve_expression(expr),
        }
    }

    fn resolve_block(&mut self, block: &Block) -> Result<(), ResolveError> {
        self.begin_scope();
        let result = self.resolve_program(&block.statements);
        self.end_scope();
        result
    }

    fn resolve_class(&mut self, decl: &ClassDecl) -> Result<(), ResolveError> {
        let enclosing = self.current_class;
        self.current_class = ClassKind::Class;

        let result = self.resolve_class_inner(decl);

        self.current_class = enclosing;
        result
    }

    fn resolve_class_inner(&mut self, decl: &ClassDecl) -> Result<(), ResolveError> {
        self.declare(&decl.name)?;
        self.define(&decl.name);

        if let Some(superclass) = &decl.superclass {
            if superclass.name == decl.name.name {
                return Err(ResolveError::InheritFromSelf);
            }
            self.current_class = ClassKind::Subclass;
            self.resolve_identifier(superclass)?;
        }

        // The scope layering must match the environments the interpreter
        // pushes at declaration time: an outer scope holding `super` (only
        // when an explicit superclass is present), then an inner scope
        // holding `self`.
        if decl.superclass.is_some() {
            self.begin_scope();
            self.define_name("super");
        }

        self.begin_scope();
        self.define_name("self");

        let mut result = Ok(());
        for method in &decl.methods {
            let kind = if method.name.name == "init" {
                FunctionKind::Initializer
            } else {
                FunctionKind::Method
            };
            result = self.resolve_function(&method.function, kind);
            if result.is_err() {
                break;
            }
        }

        self.end_scope();
        if decl.superclass.is_some() {
            self.end_scope();
        }
        result
    }

    fn resolve_function(
        &mut self,
        func: &FuncLit,
        kind: FunctionKind,
    ) -> Result<(), ResolveError> {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        let mut result = Ok(());
        for parameter in &func.parameters {
            result = self.declare(parameter);
            if result.is_err() {
                break;
            }
            self.define(parameter);
        }
        if result.is_ok() {
            // The body shares the parameter scope; no extra scope is pushed,
            // matching the single environment the interpreter creates per call.
            result = self.resolve_program(&func.body.statements);
        }
        self.end_scope();

        self.current_function = enclosing;
        result
    }

    fn resolve_expression(&mut self, expr: &Expr) -> Result<(), ResolveError> {
        match expr {
            Expr::Ident(ident) => self.resolve_identifier(ident),
            Expr::Int(_) | Expr::Float(_) | Expr::Str(_) | Expr::Bool(_) | Expr::Null => Ok(()),
            Expr::List(elements) => {
                for element in elements {
                    self.resolve_expression(element)?;
                }
                Ok(())
            }
            Expr::Prefix { right, .. } => self.resolve_expression(right),
            Expr::Infix { left, right, .. } => {
                self.resolve_expression(left)?;
                self.resolve_expression(right)
            }
            Expr::If {
                condition,
                consequence,
                alternative,
            } => {
                self.resolve_expression(condition)?;
                self.resolve_block(consequence)?;
                if let Some(alternative) = alternative {
                    self.resolve_block(alternative)?;
                }
                Ok(())
            }
            Expr::Call { callee, arguments } => {
                self.resolve_expression(callee)?;
                for argument in arguments {
                    self.resolve_expression(argument)?;
                }
                Ok(())
            }
            Expr::Index { left, index } => {
                self.resolve_expression(left)?;
                self.resolve_expression(index)
            }
            Expr::Function(func) => self.resolve_function(func, FunctionKind::Function),
            Expr::Assign { id, name, value } => {
                self.resolve_expression(value)?;
                self.resolve_local(*id, name);
                Ok(())
            }
            Expr::Get { object, .. } => self.resolve_expression(object),
            Expr::Set { object, value, .. } => {
                self.resolve_expression(value)?;
                self.resolve_expression(object)
            }
            Expr::SelfRef { id } => {
                if self.current_class == ClassKind::None {
                    return Err(ResolveError::SelfOutsideClass);
                }
                self.resolve_local(*id, "self");
                Ok(())
            }
            Expr::SuperRef { id, .. } => {
                if self.current_class == ClassKind::None {
                    return Err(ResolveError::SuperOutsideClass);
                }
                if self.current_class != ClassKind::Subclass {
                    return Err(ResolveError::SuperWithoutSuperclass);
                }
                self.resolve_local(*id, "super");
                Ok(())
            }
        }
    }

    fn resolve_identifier(&mut self, ident: &Ident) -> Result<(), ResolveError> {
        if let Some(scope) = self.scopes.last() {
            if scope.get(&ident.name) == Some(&false) {
                // Builtin names always resolve as globals, shadowing rules
                // notwithstanding.
                if is_builtin_name(&ident.name) {
                    return Ok(());
                }
                // Method and while-loop bodies permit forward-looking reads.
                if self.current_function == FunctionKind::Method
                    || self.current_loop == LoopKind::While
                {
                    self.resolve_local(ident.id, &ident.name);
                    return Ok(());
                }
                return Err(ResolveError::ReadInOwnInitializer);
            }
        }
        self.resolve_local(ident.id, &ident.name);
        Ok(())
    }

    /// Walks the scope stack innermost-outward and records the depth of the
    /// first scope containing `name`. Not finding it means the reference is
    /// global; nothing is recorded.
    fn resolve_local(&mut self, id: crate::ast::NodeId, name: &str) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name) {
                self.interpreter.resolve(id, depth);
                return;
            }
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Ident) -> Result<(), ResolveError> {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.name) {
                return Err(ResolveError::DuplicateDeclaration);
            }
            scope.insert(name.name.clone(), false);
        }
        Ok(())
    }

    fn define(&mut self, name: &Ident) {
        self.define_name(&name.name);
    }

    fn define_name(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn resolve(input: &str) -> (Interpreter, Vec<Stmt>, Result<(), ResolveError>) {
        let mut parser = Parser::new(Lexer::new(input));
        let program = parser.parse_program();
        assert!(
            parser.errors().is_empty(),
            "parser errors for {:?}: {:?}",
            input,
            parser.errors()
        );
        let mut interpreter = Interpreter::new();
        let result = Resolver::new(&mut interpreter).resolve_program(&program);
        (interpreter, program, result)
    }

    fn resolve_err(input: &str) -> ResolveError {
        let (_, _, result) = resolve(input);
        result.expect_err("expected a resolution error")
    }

    /// Finds the id of the first identifier expression with the given name.
    fn find_ident_id(statements: &[Stmt], name: &str) -> Option<crate::ast::NodeId> {
        fn in_expr(expr: &Expr, name: &str) -> Option<crate::ast::NodeId> {
            match expr {
                Expr::Ident(ident) if ident.name == name => Some(ident.id),
                Expr::Infix { left, right, .. } => {
                    in_expr(left, name).or_else(|| in_expr(right, name))
                }
                Expr::Prefix { right, .. } => in_expr(right, name),
                Expr::Call { callee, arguments } => in_expr(callee, name)
                    .or_else(|| arguments.iter().find_map(|a| in_expr(a, name))),
                Expr::Assign { value, .. } => in_expr(value, name),
                Expr::Function(func) => in_stmts(&func.body.statements, name),
                _ => None,
            }
        }
        fn in_stmts(statements: &[Stmt], name: &str) -> Option<crate::ast::NodeId> {
            statements.iter().find_map(|stmt| match stmt {
                Stmt::Expr(expr) => in_expr(expr, name),
                Stmt::Def { value, .. } => in_expr(value, name),
                Stmt::Return { value } => in_expr(value, name),
                Stmt::Block(block) => in_stmts(&block.statements, name),
                Stmt::While { condition, body } => {
                    in_expr(condition, name).or_else(|| in_stmts(&body.statements, name))
                }
                Stmt::Class(_) => None,
            })
        }
        in_stmts(statements, name)
    }

    #[test]
    fn test_global_references_record_nothing() {
        let (interpreter, program, result) = resolve("def x = 1; x;");
        result.unwrap();
        let id = find_ident_id(&program, "x").unwrap();
        assert_eq!(interpreter.resolved_depth(id), None);
    }

    #[test]
    fn test_block_local_depth() {
        let (interpreter, program, result) = resolve("{ def x = 1; x; }");
        result.unwrap();
        let id = find_ident_id(&program, "x").unwrap();
        assert_eq!(interpreter.resolved_depth(id), Some(0));
    }

    #[test]
    fn test_nested_block_depth() {
        let (interpreter, program, result) = resolve("{ def x = 1; { { x; } } }");
        result.unwrap();
        let id = find_ident_id(&program, "x").unwrap();
        assert_eq!(interpreter.resolved_depth(id), Some(2));
    }

    #[test]
    fn test_closure_captures_parameter_depth() {
        let (interpreter, program, result) =
            resolve("def f = func(a) { def g = func() { return a; }; };");
        result.unwrap();
        let id = find_ident_id(&program, "a").unwrap();
        // a lives in f's parameter scope, one function scope above g's body.
        assert_eq!(interpreter.resolved_depth(id), Some(1));
    }

    #[test]
    fn test_duplicate_declaration_in_scope() {
        assert_eq!(
            resolve_err("{ def x = 1; def x = 2; }"),
            ResolveError::DuplicateDeclaration
        );
    }

    #[test]
    fn test_read_in_own_initializer() {
        assert_eq!(
            resolve_err("{ def x = x; }"),
            ResolveError::ReadInOwnInitializer
        );
    }

    #[test]
    fn test_while_body_permits_forward_reference() {
        let (_, _, result) = resolve("{ def i = 0; while (i < 3) { def x = x; } }");
        result.unwrap();
    }

    #[test]
    fn test_method_body_permits_forward_reference() {
        let (_, _, result) = resolve("class C { m() { def y = y; } }");
        result.unwrap();
    }

    #[test]
    fn test_top_level_return() {
        assert_eq!(resolve_err("return 1;"), ResolveError::TopLevelReturn);
    }

    #[test]
    fn test_return_value_from_initializer() {
        assert_eq!(
            resolve_err("class C { init() { return 1; } }"),
            ResolveError::ReturnFromInitializer
        );
    }

    #[test]
    fn test_return_null_from_initializer_is_allowed() {
        let (_, _, result) = resolve("class C { init() { return null; } }");
        result.unwrap();
    }

    #[test]
    fn test_self_outside_class() {
        assert_eq!(resolve_err("self;"), ResolveError::SelfOutsideClass);
    }

    #[test]
    fn test_super_outside_class() {
        assert_eq!(resolve_err("super.m();"), ResolveError::SuperOutsideClass);
    }

    #[test]
    fn test_super_without_superclass() {
        assert_eq!(
            resolve_err("class C { m() { super.m(); } }"),
            ResolveError::SuperWithoutSuperclass
        );
    }

    #[test]
    fn test_class_inheriting_from_itself() {
        assert_eq!(
            resolve_err("class C : C {}"),
            ResolveError::InheritFromSelf
        );
    }

    #[test]
    fn test_self_and_super_depths_in_subclass_method() {
        let (interpreter, program, result) =
            resolve("class A {} class B : A { m() { return self; } }");
        result.unwrap();

        // Walk into B's method body to find the self reference id.
        let mut self_id = None;
        for stmt in &program {
            if let Stmt::Class(decl) = stmt {
                for method in &decl.methods {
                    for stmt in &method.function.body.statements {
                        if let Stmt::Return {
                            value: Expr::SelfRef { id },
                        } = stmt
                        {
                            self_id = Some(*id);
                        }
                    }
                }
            }
        }
        // Scopes between the reference and `self`: the method's parameter
        // scope, then the class `self` scope.
        assert_eq!(interpreter.resolved_depth(self_id.unwrap()), Some(1));
    }
}
