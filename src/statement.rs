//! Statement model: terms, atomic statements, rules and the `Item` shape.
//!
//! Everything here is immutable once built. Equality is structural:
//! variables compare by name, never by unification.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Term
// ---------------------------------------------------------------------------

/// A term in a statement: a constant or a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    /// A constant symbol (e.g., `cube`).
    Constant(String),
    /// A variable (e.g., `?x`). Stored without the `?` prefix.
    Variable(String),
}

impl Term {
    pub fn constant(name: impl Into<String>) -> Self {
        Self::Constant(name.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// Returns `true` if this term is a variable.
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// The bare name of the term, without any `?` prefix.
    pub fn name(&self) -> &str {
        match self {
            Self::Constant(name) | Self::Variable(name) => name,
        }
    }

    /// Parse a term from a token. Variables start with `?`, everything else
    /// is a constant.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        match token.strip_prefix('?') {
            Some(var) => Self::Variable(var.to_string()),
            None => Self::Constant(token.to_string()),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(name) => write!(f, "{name}"),
            Self::Variable(name) => write!(f, "?{name}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Statement
// ---------------------------------------------------------------------------

/// An atomic predicate: a name plus an ordered list of terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    predicate: String,
    terms: Vec<Term>,
}

impl Statement {
    pub fn new(predicate: impl Into<String>, terms: Vec<Term>) -> Self {
        Self {
            predicate: predicate.into(),
            terms,
        }
    }

    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    /// Returns `true` if no term is a variable.
    pub fn is_ground(&self) -> bool {
        self.terms.iter().all(|t| !t.is_variable())
    }

    /// Variable names in order of first appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for term in &self.terms {
            if let Term::Variable(name) = term {
                if !seen.contains(&name.as_str()) {
                    seen.push(name.as_str());
                }
            }
        }
        seen
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.predicate)?;
        for term in &self.terms {
            write!(f, " {term}")?;
        }
        write!(f, ")")
    }
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// An implication: an ordered, non-empty antecedent list and one consequent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRule")]
pub struct Rule {
    lhs: Vec<Statement>,
    rhs: Statement,
}

/// Wire form of a [`Rule`], checked by [`Rule::new`] on the way in.
#[derive(Deserialize)]
struct RawRule {
    lhs: Vec<Statement>,
    rhs: Statement,
}

impl TryFrom<RawRule> for Rule {
    type Error = &'static str;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        Rule::new(raw.lhs, raw.rhs).ok_or("a rule needs at least one antecedent")
    }
}

impl Rule {
    /// Build a rule. Returns `None` when `lhs` is empty.
    pub fn new(lhs: Vec<Statement>, rhs: Statement) -> Option<Self> {
        if lhs.is_empty() {
            return None;
        }
        Some(Self { lhs, rhs })
    }

    /// Antecedents, in matching order.
    pub fn lhs(&self) -> &[Statement] {
        &self.lhs
    }

    /// Consequent.
    pub fn rhs(&self) -> &Statement {
        &self.rhs
    }

    /// The antecedent that incoming facts are matched against.
    pub fn first(&self) -> &Statement {
        &self.lhs[0]
    }

    /// Antecedents after the first.
    pub fn rest(&self) -> &[Statement] {
        &self.lhs[1..]
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, statement) in self.lhs.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{statement}")?;
        }
        write!(f, ") -> {}", self.rhs)
    }
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// The shape of something that can be asserted, retracted or asked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Item {
    Fact(Statement),
    Rule(Rule),
}

impl Item {
    /// Returns `true` for fact-shaped items. Only these can be asked.
    pub fn is_fact_shaped(&self) -> bool {
        matches!(self, Self::Fact(_))
    }

    pub fn as_fact(&self) -> Option<&Statement> {
        match self {
            Self::Fact(statement) => Some(statement),
            Self::Rule(_) => None,
        }
    }

    pub fn as_rule(&self) -> Option<&Rule> {
        match self {
            Self::Rule(rule) => Some(rule),
            Self::Fact(_) => None,
        }
    }
}

impl From<Statement> for Item {
    fn from(statement: Statement) -> Self {
        Self::Fact(statement)
    }
}

impl From<Rule> for Item {
    fn from(rule: Rule) -> Self {
        Self::Rule(rule)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fact(statement) => write!(f, "fact: {statement}"),
            Self::Rule(rule) => write!(f, "rule: {rule}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isa(a: &str, b: &str) -> Statement {
        Statement::new("isa", vec![Term::parse(a), Term::parse(b)])
    }

    #[test]
    fn term_parse_distinguishes_variables() {
        assert_eq!(Term::parse("?x"), Term::variable("x"));
        assert_eq!(Term::parse("cube"), Term::constant("cube"));
        assert!(Term::parse(" ?y ").is_variable());
    }

    #[test]
    fn structural_equality_compares_variables_by_name() {
        assert_eq!(isa("?x", "block"), isa("?x", "block"));
        assert_ne!(isa("?x", "block"), isa("?y", "block"));
        assert_ne!(
            isa("cube", "block"),
            Statement::new("inst", vec![Term::constant("cube"), Term::constant("block")])
        );
    }

    #[test]
    fn statement_display_and_variables() {
        let s = Statement::new(
            "on",
            vec![Term::variable("x"), Term::constant("table"), Term::variable("x")],
        );
        assert_eq!(s.to_string(), "(on ?x table ?x)");
        assert_eq!(s.variables(), vec!["x"]);
        assert!(!s.is_ground());
        assert!(isa("cube", "block").is_ground());
    }

    #[test]
    fn rule_requires_an_antecedent() {
        assert!(Rule::new(Vec::new(), isa("?x", "block")).is_none());

        let rule = Rule::new(vec![isa("?x", "?y"), isa("?y", "?z")], isa("?x", "?z")).unwrap();
        assert_eq!(rule.first(), &isa("?x", "?y"));
        assert_eq!(rule.rest(), &[isa("?y", "?z")]);
        assert_eq!(
            rule.to_string(),
            "((isa ?x ?y) (isa ?y ?z)) -> (isa ?x ?z)"
        );
    }

    #[test]
    fn rule_without_antecedents_is_rejected_on_deserialize() {
        let empty = r#"{"Rule":{"lhs":[],"rhs":{"predicate":"q","terms":[]}}}"#;
        let err = serde_json::from_str::<Item>(empty).unwrap_err();
        assert!(err.to_string().contains("at least one antecedent"));

        let rule = Rule::new(vec![isa("?x", "block")], isa("?x", "shape")).unwrap();
        let json = serde_json::to_string(&Item::from(rule.clone())).unwrap();
        assert_eq!(serde_json::from_str::<Item>(&json).unwrap(), Item::Rule(rule));
    }

    #[test]
    fn item_shape() {
        let fact = Item::from(isa("cube", "block"));
        assert!(fact.is_fact_shaped());
        assert_eq!(fact.to_string(), "fact: (isa cube block)");

        let rule = Item::from(Rule::new(vec![isa("?x", "block")], isa("?x", "shape")).unwrap());
        assert!(!rule.is_fact_shaped());
        assert!(rule.as_fact().is_none());
        assert!(rule.as_rule().is_some());
    }
}
