//! Retraction cascade tests.
//!
//! These cover the shapes the justification graph can take: long chains,
//! diamonds, derived rules, mixed asserted/derived items, and repeated
//! assert/retract cycles.

use chainkb::kb::KnowledgeBase;
use chainkb::parse::parse_item;
use chainkb::statement::Item;

fn item(text: &str) -> Item {
    parse_item(text).unwrap()
}

fn kb(lines: &[&str]) -> KnowledgeBase {
    KnowledgeBase::from_items(lines.iter().map(|l| item(l)))
}

#[test]
fn long_chain_retracts_without_recursion() {
    const DEPTH: usize = 3_000;

    let mut kb = KnowledgeBase::new();
    for i in 0..DEPTH {
        kb.assert(item(&format!("rule: ((p{i} ?x)) -> (p{} ?x)", i + 1)));
    }
    kb.assert(item("fact: (p0 a)"));
    assert_eq!(kb.fact_count(), DEPTH + 1);
    assert!(kb.contains(&item(&format!("fact: (p{DEPTH} a)"))));

    let result = kb.retract(&item("fact: (p0 a)"));
    assert_eq!(result.retracted.len(), DEPTH + 1);
    assert_eq!(result.cascade_depth, DEPTH);
    assert_eq!(kb.fact_count(), 0);
    assert_eq!(kb.rule_count(), DEPTH);
    kb.check_consistency().unwrap();
}

#[test]
fn cascade_removes_derived_rules_and_their_conclusions() {
    let mut kb = kb(&[
        "rule: ((parent ?x ?y) (parent ?y ?z)) -> (grandparent ?x ?z)",
        "fact: (parent ann bob)",
        "fact: (parent bob cal)",
    ]);
    assert!(kb.contains(&item("rule: ((parent bob ?z)) -> (grandparent ann ?z)")));
    assert!(kb.contains(&item("fact: (grandparent ann cal)")));

    let result = kb.retract(&item("fact: (parent ann bob)"));

    assert!(!kb.contains(&item("rule: ((parent bob ?z)) -> (grandparent ann ?z)")));
    assert!(!kb.contains(&item("fact: (grandparent ann cal)")));
    // (parent bob cal) produced its own curried rule, which stays.
    assert!(kb.contains(&item("rule: ((parent cal ?z)) -> (grandparent bob ?z)")));
    assert_eq!(result.retracted.len(), 3);
    assert_eq!(result.cascade_depth, 2);
    kb.check_consistency().unwrap();
}

#[test]
fn retracting_second_premise_cleans_up_curried_rule_edges() {
    let mut kb = kb(&[
        "rule: ((parent ?x ?y) (parent ?y ?z)) -> (grandparent ?x ?z)",
        "fact: (parent ann bob)",
        "fact: (parent bob cal)",
    ]);

    // (grandparent ann cal) rests on (parent bob cal) and the curried rule.
    kb.retract(&item("fact: (parent bob cal)"));

    assert!(!kb.contains(&item("fact: (grandparent ann cal)")));
    let curried = kb
        .find_rule(item("rule: ((parent bob ?z)) -> (grandparent ann ?z)").as_rule().unwrap())
        .unwrap();
    assert!(curried.supports_facts().is_empty());
    kb.check_consistency().unwrap();
}

#[test]
fn diamond_is_removed_once() {
    // Two rules derive (q a) and (r a) from (p a); both feed (s a).
    let mut kb = kb(&[
        "rule: ((p ?x)) -> (q ?x)",
        "rule: ((p ?x)) -> (r ?x)",
        "rule: ((q ?x) (r ?x)) -> (s ?x)",
        "fact: (p a)",
    ]);
    assert!(kb.contains(&item("fact: (s a)")));

    let result = kb.retract(&item("fact: (p a)"));

    for gone in ["fact: (p a)", "fact: (q a)", "fact: (r a)", "fact: (s a)"] {
        assert!(!kb.contains(&item(gone)), "{gone} should be retracted");
    }
    assert!(!kb.contains(&item("rule: ((r a)) -> (s a)")));
    let mut ids: Vec<_> = result.retracted.iter().map(|(id, _)| *id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), result.retracted.len());
    kb.check_consistency().unwrap();
}

#[test]
fn same_fact_through_two_rules_loses_both_justifications() {
    let mut kb = kb(&[
        "rule: ((p ?x)) -> (q ?x)",
        "rule: ((p ?x) (p ?x)) -> (q ?x)",
        "fact: (p a)",
    ]);
    let q = kb.lookup(&item("fact: (q a)")).unwrap();
    assert_eq!(kb.get(q).unwrap().supported_by().len(), 2);

    kb.retract(&item("fact: (p a)"));
    assert!(kb.get(q).is_none());
    kb.check_consistency().unwrap();
}

#[test]
fn asserted_rule_keeps_its_derivations() {
    let mut kb = kb(&["fact: (p a)", "rule: ((p ?x)) -> (q ?x)"]);

    let result = kb.retract(&item("rule: ((p ?x)) -> (q ?x)"));
    assert!(result.is_noop());
    assert!(kb.contains(&item("fact: (q a)")));
}

#[test]
fn asserted_derived_rule_survives_loss_of_support() {
    let mut kb = kb(&[
        "fact: (p a)",
        "rule: ((p ?x) (q ?x)) -> (r ?x)",
        "rule: ((q a)) -> (r a)",
    ]);
    let curried = kb.lookup(&item("rule: ((q a)) -> (r a)")).unwrap();
    let curried_item = kb.get(curried).unwrap();
    assert!(curried_item.is_asserted());
    assert_eq!(curried_item.supported_by().len(), 1);

    kb.retract(&item("fact: (p a)"));

    let curried_item = kb.get(curried).unwrap();
    assert!(curried_item.is_asserted());
    assert!(curried_item.supported_by().is_empty());

    // Still an asserted rule, so a direct request does nothing.
    assert!(kb.retract(&item("rule: ((q a)) -> (r a)")).is_noop());
    kb.check_consistency().unwrap();
}

#[test]
fn demoted_fact_is_removed_when_support_goes() {
    let mut kb = kb(&["fact: (p a)", "rule: ((p ?x)) -> (q ?x)", "fact: (q a)"]);

    let demote = kb.retract(&item("fact: (q a)"));
    assert!(demote.demoted.is_some());
    assert!(kb.contains(&item("fact: (q a)")));

    kb.retract(&item("fact: (p a)"));
    assert!(!kb.contains(&item("fact: (q a)")));
    kb.check_consistency().unwrap();
}

#[test]
fn reassertion_rederives() {
    let mut kb = kb(&["rule: ((p ?x)) -> (q ?x)", "fact: (p a)"]);

    for _ in 0..3 {
        kb.retract(&item("fact: (p a)"));
        assert!(!kb.contains(&item("fact: (q a)")));

        kb.assert(item("fact: (p a)"));
        let q = kb.lookup(&item("fact: (q a)")).unwrap();
        assert_eq!(kb.get(q).unwrap().supported_by().len(), 1);
        kb.check_consistency().unwrap();
    }
}

#[test]
fn duplicate_rule_is_stored_once() {
    let mut kb = kb(&["fact: (p a)", "rule: ((p ?x)) -> (q ?x)"]);
    kb.assert(item("rule: ((p ?x)) -> (q ?x)"));

    assert_eq!(kb.rule_count(), 1);
    let q = kb.lookup(&item("fact: (q a)")).unwrap();
    assert_eq!(kb.get(q).unwrap().supported_by().len(), 1);
    kb.check_consistency().unwrap();
}

#[test]
fn derived_rule_with_two_justifications_survives_losing_one() {
    let mut kb = kb(&[
        "rule: ((p ?x) (q ?x)) -> (r ?x)",
        "rule: ((s ?x) (q ?x)) -> (r ?x)",
        "fact: (p a)",
        "fact: (s a)",
        "fact: (q a)",
    ]);
    let curried = kb.lookup(&item("rule: ((q a)) -> (r a)")).unwrap();
    assert_eq!(kb.get(curried).unwrap().supported_by().len(), 2);
    assert!(kb.contains(&item("fact: (r a)")));

    let result = kb.retract(&item("fact: (p a)"));
    assert!(!result.removed(curried));
    assert!(result.re_evaluated.contains(&curried));

    let s = kb.lookup(&item("fact: (s a)")).unwrap();
    let second = kb.lookup(&item("rule: ((s ?x) (q ?x)) -> (r ?x)")).unwrap();
    let curried_item = kb.get(curried).unwrap();
    assert!(!curried_item.is_asserted());
    assert_eq!(curried_item.supported_by(), &[chainkb::item::Support::new(s, second)]);
    assert!(kb.contains(&item("fact: (r a)")));
    kb.check_consistency().unwrap();

    kb.retract(&item("fact: (s a)"));
    assert!(kb.get(curried).is_none());
    assert!(!kb.contains(&item("fact: (r a)")));
    kb.check_consistency().unwrap();
}
