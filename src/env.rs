// ABOUTME: Environment module for managing variable bindings and scopes

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// A lexical scope: a name→value map with an optional parent pointer.
///
/// Environments are shared by reference; a closure and the block that
/// created it may both hold the same scope, and writes through either handle
/// are visible to both.
pub struct Environment {
    store: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new root environment with no parent.
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            store: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a new child environment enclosed by `parent`.
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            store: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Binds `name` in THIS scope (doesn't walk the parent chain).
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.store.borrow_mut().insert(name.into(), value);
    }

    /// Looks up `name` in this scope and then the parent chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.store.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.get(name))
    }

    /// Reads `name` from the scope exactly `distance` parents up. No
    /// fallback: the resolver guarantees the binding lives there, so a
    /// missing ancestor or name simply reads as absent.
    pub fn get_at(&self, distance: usize, name: &str) -> Option<Value> {
        if distance == 0 {
            return self.store.borrow().get(name).cloned();
        }
        let ancestor = self.ancestor(distance)?;
        let value = ancestor.store.borrow().get(name).cloned();
        value
    }

    /// Writes `name` in the scope exactly `distance` parents up.
    pub fn set_at(&self, distance: usize, name: impl Into<String>, value: Value) {
        if distance == 0 {
            self.store.borrow_mut().insert(name.into(), value);
            return;
        }
        // The resolver only records depths for scopes that exist.
        if let Some(ancestor) = self.ancestor(distance) {
            ancestor.store.borrow_mut().insert(name.into(), value);
        }
    }

    fn ancestor(&self, distance: usize) -> Option<Rc<Environment>> {
        let mut env = self.parent.clone()?;
        for _ in 1..distance {
            let parent = env.parent.clone()?;
            env = parent;
        }
        Some(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get() {
        let env = Environment::new();
        env.define("x", Value::Int(42));
        match env.get("x") {
            Some(Value::Int(n)) => assert_eq!(n, 42),
            other => panic!("expected Int(42), got {:?}", other),
        }
    }

    #[test]
    fn test_undefined_name() {
        let env = Environment::new();
        assert!(env.get("missing").is_none());
    }

    #[test]
    fn test_shadowing() {
        let parent = Environment::new();
        parent.define("x", Value::Int(1));

        let child = Environment::with_parent(parent);
        child.define("x", Value::Int(2));

        match child.get("x") {
            Some(Value::Int(n)) => assert_eq!(n, 2),
            other => panic!("expected Int(2), got {:?}", other),
        }
    }

    #[test]
    fn test_parent_lookup() {
        let parent = Environment::new();
        parent.define("x", Value::Int(7));

        let child = Environment::with_parent(parent);
        match child.get("x") {
            Some(Value::Int(n)) => assert_eq!(n, 7),
            other => panic!("expected Int(7), got {:?}", other),
        }
    }

    #[test]
    fn test_get_at_walks_exact_distance() {
        let grandparent = Environment::new();
        grandparent.define("a", Value::Int(1));

        let parent = Environment::with_parent(grandparent);
        parent.define("a", Value::Int(2));

        let child = Environment::with_parent(parent);
        child.define("a", Value::Int(3));

        assert!(matches!(child.get_at(0, "a"), Some(Value::Int(3))));
        assert!(matches!(child.get_at(1, "a"), Some(Value::Int(2))));
        assert!(matches!(child.get_at(2, "a"), Some(Value::Int(1))));
    }

    #[test]
    fn test_get_at_has_no_fallback() {
        let parent = Environment::new();
        parent.define("x", Value::Int(1));

        let child = Environment::with_parent(parent);
        // x lives at distance 1; distance 0 must not find it.
        assert!(child.get_at(0, "x").is_none());
    }

    #[test]
    fn test_set_at_writes_to_ancestor() {
        let parent = Environment::new();
        parent.define("x", Value::Int(1));

        let child = Environment::with_parent(parent.clone());
        child.set_at(1, "x", Value::Int(9));

        assert!(matches!(parent.get("x"), Some(Value::Int(9))));
        assert!(child.store.borrow().get("x").is_none());
    }

    #[test]
    fn test_mutation_is_visible_through_shared_handles() {
        let shared = Environment::new();
        let alias = shared.clone();
        shared.define("n", Value::Int(1));
        alias.define("n", Value::Int(2));
        assert!(matches!(shared.get("n"), Some(Value::Int(2))));
    }
}
