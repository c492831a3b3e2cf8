use std::collections::HashMap;

use crate::errors::errors::ErrorImpl;

/// Nested lexical scopes mapping names to bindings.
///
/// Lookups walk from the innermost scope outwards, so an inner binding
/// shadows an outer one until its scope is popped. The outermost scope is
/// never popped.
#[derive(Debug)]
pub struct ScopeStack<T> {
    scopes: Vec<HashMap<String, T>>,
}

impl<T> Default for ScopeStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ScopeStack<T> {
    pub fn new() -> Self {
        ScopeStack {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Binds `name` in the innermost scope.
    pub fn declare(&mut self, name: &str, value: T) -> Result<(), ErrorImpl> {
        let depth = self.scopes.len() - 1;
        let scope = &mut self.scopes[depth];

        if scope.contains_key(name) {
            return Err(ErrorImpl::VariableAlreadyDeclared {
                variable: name.to_string(),
            });
        }

        scope.insert(name.to_string(), value);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&T> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::ScopeStack;
    use crate::errors::errors::ErrorImpl;

    #[test]
    fn test_lookup_prefers_innermost_binding() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x", 1).unwrap();
        scopes.push();
        scopes.declare("x", 2).unwrap();

        assert_eq!(scopes.lookup("x"), Some(&2));

        scopes.pop();
        assert_eq!(scopes.lookup("x"), Some(&1));
    }

    #[test]
    fn test_outer_bindings_visible_from_inner_scope() {
        let mut scopes = ScopeStack::new();
        scopes.declare("outer", 7).unwrap();
        scopes.push();
        scopes.push();

        assert_eq!(scopes.lookup("outer"), Some(&7));
        assert_eq!(scopes.lookup("missing"), None);
        assert_eq!(scopes.depth(), 3);
    }

    #[test]
    fn test_redeclaration_in_same_scope_fails() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x", 1).unwrap();

        assert_eq!(
            scopes.declare("x", 2),
            Err(ErrorImpl::VariableAlreadyDeclared {
                variable: "x".to_string()
            })
        );
        assert_eq!(scopes.lookup("x"), Some(&1));
    }

    #[test]
    fn test_inner_binding_dropped_on_pop() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        scopes.declare("tmp", 3).unwrap();
        scopes.pop();

        assert_eq!(scopes.lookup("tmp"), None);
    }

    #[test]
    fn test_outermost_scope_is_never_popped() {
        let mut scopes = ScopeStack::new();
        scopes.pop();
        scopes.pop();

        assert_eq!(scopes.depth(), 1);
        scopes.declare("x", 1).unwrap();
        assert_eq!(scopes.lookup("x"), Some(&1));
    }
}
