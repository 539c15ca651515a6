//! Pattern matching between statements and substitution instantiation.
//!
//! Matching is one-level: terms are constants or variables, so a binding
//! maps a variable name to a single term. A variable on either side may bind.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::statement::{Statement, Term};

/// An ordered, consistent variable substitution.
///
/// A variable never maps to two different terms: [`Bindings::bind`] refuses
/// a conflicting binding instead of overwriting it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    entries: Vec<(String, Term)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the term bound to `var` (name without `?`).
    pub fn get(&self, var: &str) -> Option<&Term> {
        self.entries
            .iter()
            .find(|(name, _)| name == var)
            .map(|(_, term)| term)
    }

    /// Bind `var` to `term` unless it is already bound to something else.
    ///
    /// Returns `false` on conflict, leaving the bindings unchanged.
    pub fn bind(&mut self, var: &str, term: &Term) -> bool {
        match self.get(var) {
            Some(existing) => existing == term,
            None => {
                self.entries.push((var.to_string(), term.clone()));
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.entries.iter().map(|(name, term)| (name.as_str(), term))
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, term)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "?{name} : {term}")?;
        }
        Ok(())
    }
}

/// Match `pattern` against `target`, producing the bindings that make them
/// equal, or `None` if they cannot match.
///
/// Predicates and arities must agree. Positionally, a variable in `pattern`
/// binds to the target term; otherwise a variable in `target` binds to the
/// pattern term; two constants must be identical. An empty `Bindings` is a
/// successful match of two identical ground statements.
pub fn unify(pattern: &Statement, target: &Statement) -> Option<Bindings> {
    if pattern.predicate() != target.predicate() || pattern.arity() != target.arity() {
        return None;
    }

    let mut bindings = Bindings::new();
    for (left, right) in pattern.terms().iter().zip(target.terms()) {
        let consistent = match (left, right) {
            (Term::Variable(var), _) => bindings.bind(var, right),
            (_, Term::Variable(var)) => bindings.bind(var, left),
            _ => left == right,
        };
        if !consistent {
            return None;
        }
    }
    Some(bindings)
}

/// Substitute every bound variable in `statement`; unbound variables stay.
pub fn instantiate(statement: &Statement, bindings: &Bindings) -> Statement {
    let terms = statement
        .terms()
        .iter()
        .map(|term| match term {
            Term::Variable(var) => bindings.get(var).cloned().unwrap_or_else(|| term.clone()),
            Term::Constant(_) => term.clone(),
        })
        .collect();
    Statement::new(statement.predicate(), terms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn st(predicate: &str, terms: &[&str]) -> Statement {
        Statement::new(predicate, terms.iter().map(|t| Term::parse(t)).collect())
    }

    #[test]
    fn binds_pattern_variables() {
        let b = unify(&st("isa", &["?x", "block"]), &st("isa", &["cube", "block"])).unwrap();
        assert_eq!(b.get("x"), Some(&Term::constant("cube")));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn binds_target_variables() {
        let b = unify(&st("isa", &["cube", "block"]), &st("isa", &["?x", "block"])).unwrap();
        assert_eq!(b.get("x"), Some(&Term::constant("cube")));
    }

    #[test]
    fn rejects_predicate_or_arity_mismatch() {
        assert!(unify(&st("isa", &["?x"]), &st("inst", &["cube"])).is_none());
        assert!(unify(&st("isa", &["?x"]), &st("isa", &["cube", "block"])).is_none());
    }

    #[test]
    fn rejects_constant_clash() {
        assert!(unify(&st("isa", &["cube", "?y"]), &st("isa", &["pyramid", "block"])).is_none());
    }

    #[test]
    fn repeated_variable_must_bind_consistently() {
        let pattern = st("same", &["?x", "?x"]);
        assert!(unify(&pattern, &st("same", &["a", "a"])).is_some());
        assert!(unify(&pattern, &st("same", &["a", "b"])).is_none());
    }

    #[test]
    fn identical_ground_statements_match_with_empty_bindings() {
        let b = unify(&st("isa", &["cube", "block"]), &st("isa", &["cube", "block"])).unwrap();
        assert!(b.is_empty());
    }

    #[test]
    fn instantiate_leaves_unbound_variables() {
        let mut b = Bindings::new();
        assert!(b.bind("x", &Term::constant("cube")));
        let out = instantiate(&st("on", &["?x", "?y"]), &b);
        assert_eq!(out, st("on", &["cube", "?y"]));
    }

    #[test]
    fn bind_refuses_conflicts() {
        let mut b = Bindings::new();
        assert!(b.bind("x", &Term::constant("a")));
        assert!(b.bind("x", &Term::constant("a")));
        assert!(!b.bind("x", &Term::constant("b")));
        assert_eq!(b.to_string(), "?x : a");
    }
}
