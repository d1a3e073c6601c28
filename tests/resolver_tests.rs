// ABOUTME: Integration tests for scoping rules and resolution failures

use loam::error::ResolveError;
use loam::interpreter::Interpreter;
use loam::lexer::Lexer;
use loam::parser::Parser;
use loam::resolver::Resolver;

fn resolve(source: &str) -> Result<(), ResolveError> {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();
    assert!(
        parser.errors().is_empty(),
        "parser errors for {:?}: {:?}",
        source,
        parser.errors()
    );
    let mut interpreter = Interpreter::new();
    Resolver::new(&mut interpreter).resolve_program(&program)
}

#[test]
fn test_valid_programs_resolve() {
    for source in [
        "def x = 1; x;",
        "{ def x = 1; { def y = x; } }",
        "def f = func(a, b) { return a + b; };",
        "class C { m() { return self; } }",
        "class A {} class B : A { m() { return super.m; } }",
        "def i = 0; while (i < 10) { i = i + 1; }",
        "def shadow = 1; { def shadow = 2; }",
    ] {
        assert!(resolve(source).is_ok(), "expected {:?} to resolve", source);
    }
}

#[test]
fn test_duplicate_declaration_is_fatal() {
    assert_eq!(
        resolve("{ def a = 1; def a = 2; }"),
        Err(ResolveError::DuplicateDeclaration)
    );
}

#[test]
fn test_duplicate_globals_are_permitted() {
    // Top-level scope is dynamic; redefinition is allowed there.
    assert!(resolve("def a = 1; def a = 2;").is_ok());
}

#[test]
fn test_self_reference_in_initializer_is_fatal() {
    assert_eq!(
        resolve("{ def a = a; }"),
        Err(ResolveError::ReadInOwnInitializer)
    );
}

#[test]
fn test_return_outside_function_is_fatal() {
    assert_eq!(resolve("return 5;"), Err(ResolveError::TopLevelReturn));
}

#[test]
fn test_initializer_cannot_return_a_value() {
    assert_eq!(
        resolve("class C { init() { return 5; } }"),
        Err(ResolveError::ReturnFromInitializer)
    );
    assert!(resolve("class C { init() { return null; } }").is_ok());
}

#[test]
fn test_self_outside_class_is_fatal() {
    assert_eq!(resolve("def x = self;"), Err(ResolveError::SelfOutsideClass));
    assert_eq!(
        resolve("def f = func() { return self; };"),
        Err(ResolveError::SelfOutsideClass)
    );
}

#[test]
fn test_super_outside_class_is_fatal() {
    assert_eq!(
        resolve("def x = super.m;"),
        Err(ResolveError::SuperOutsideClass)
    );
}

#[test]
fn test_super_requires_explicit_superclass() {
    assert_eq!(
        resolve("class C { m() { return super.m; } }"),
        Err(ResolveError::SuperWithoutSuperclass)
    );
}

#[test]
fn test_class_cannot_inherit_from_itself() {
    assert_eq!(resolve("class C : C {}"), Err(ResolveError::InheritFromSelf));
}

#[test]
fn test_resolution_happens_before_evaluation() {
    // The failing statement comes after code with side effects; resolution
    // must reject the whole program before anything runs.
    let source = "def x = 1; return x;";
    assert_eq!(resolve(source), Err(ResolveError::TopLevelReturn));
}

#[test]
fn test_depths_match_scope_nesting() {
    use loam::ast::{Expr, Stmt};

    let source = "{ def x = 1; { x; } }";
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();
    assert!(parser.errors().is_empty());

    let mut interpreter = Interpreter::new();
    Resolver::new(&mut interpreter)
        .resolve_program(&program)
        .unwrap();

    // Dig out the inner `x;` reference.
    let Stmt::Block(outer) = &program[0] else {
        panic!("expected outer block");
    };
    let Stmt::Block(inner) = &outer.statements[1] else {
        panic!("expected inner block");
    };
    let Stmt::Expr(Expr::Ident(x)) = &inner.statements[0] else {
        panic!("expected identifier expression");
    };

    // One block scope between the reference and the declaration.
    assert_eq!(interpreter.resolved_depth(x.id), Some(1));

    // The declaration's initializer is a literal; nothing else is local.
    let Stmt::Def { name, .. } = &outer.statements[0] else {
        panic!("expected def statement");
    };
    assert_eq!(interpreter.resolved_depth(name.id), None);
}
