//! Forward-chaining inference: one resolution step of a fact against a rule.
//!
//! The step is stateless. The knowledge base decides which (fact, rule)
//! pairs to resolve and feeds the derivations back into itself, which is
//! what drives chaining to a fixpoint.

use crate::item::{JustifiedItem, Support};
use crate::statement::{Item, Rule};
use crate::unify::{instantiate, unify};

/// A newly derived item together with the premise pair that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    pub item: Item,
    pub support: Support,
}

/// Resolve `fact` against the first antecedent of `rule`.
///
/// A one-antecedent rule yields its instantiated consequent as a fact.
/// A longer rule yields a shorter rule: the remaining antecedents and the
/// consequent, all instantiated under the match. Returns `None` when the
/// fact does not match, or when the arguments are not a fact and a rule.
pub fn resolve(fact: &JustifiedItem, rule: &JustifiedItem) -> Option<Derivation> {
    let statement = fact.statement()?;
    let pattern = rule.rule()?;

    tracing::trace!(
        fact = %statement,
        rule = %pattern,
        "attempting resolution"
    );

    let bindings = unify(statement, pattern.first())?;
    let support = Support::new(fact.id(), rule.id());

    let item = if pattern.rest().is_empty() {
        Item::Fact(instantiate(pattern.rhs(), &bindings))
    } else {
        let lhs = pattern
            .rest()
            .iter()
            .map(|antecedent| instantiate(antecedent, &bindings))
            .collect();
        let rhs = instantiate(pattern.rhs(), &bindings);
        // `rest()` is non-empty here, so the rule is well-formed.
        Item::Rule(Rule::new(lhs, rhs)?)
    };

    tracing::debug!(derived = %item, bindings = %bindings, "resolved");
    Some(Derivation { item, support })
}
