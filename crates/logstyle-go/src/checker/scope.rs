//! Lexical scopes of function bodies.

use std::collections::HashMap;

use logstyle_core::ObjectId;

/// Stack of block scopes, innermost last.
#[derive(Debug, Default)]
pub(super) struct Scopes(Vec<HashMap<String, ObjectId>>);

impl Scopes {
    pub(super) fn push(&mut self) {
        self.0.push(HashMap::new());
    }

    pub(super) fn pop(&mut self) {
        self.0.pop();
    }

    pub(super) fn lookup(&self, name: &str) -> Option<ObjectId> {
        self.0.iter().rev().find_map(|scope| scope.get(name).copied())
    }

    /// Looks `name` up in the innermost scope only.
    pub(super) fn innermost(&self, name: &str) -> Option<ObjectId> {
        self.0.last().and_then(|scope| scope.get(name).copied())
    }

    pub(super) fn insert(&mut self, name: &str, obj: ObjectId) {
        if let Some(scope) = self.0.last_mut() {
            scope.insert(name.to_string(), obj);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scopes_shadow_outer_ones() {
        let mut scopes = Scopes::default();
        scopes.push();
        scopes.insert("x", ObjectId(1));
        scopes.push();
        assert_eq!(scopes.lookup("x"), Some(ObjectId(1)));
        assert_eq!(scopes.innermost("x"), None);
        scopes.insert("x", ObjectId(2));
        assert_eq!(scopes.lookup("x"), Some(ObjectId(2)));
        scopes.pop();
        assert_eq!(scopes.lookup("x"), Some(ObjectId(1)));
        scopes.pop();
        assert_eq!(scopes.lookup("x"), None);
    }
}
