// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # chainkb
//!
//! A forward-chaining rule engine with support-based truth maintenance.
//! Facts and rules are asserted into a [`KnowledgeBase`](kb::KnowledgeBase),
//! which chains them to a fixpoint and records, for every derived item, the
//! premise fact and rule that justify it. Retracting an item cascades
//! through everything that depended on it alone.
//!
//! ## Architecture
//!
//! - **Statements** (`statement`): terms, statements, rules, `Item` shapes
//! - **Unification** (`unify`): bindings, matching, instantiation
//! - **Justified items** (`item`): arena ids and justification edges
//! - **Inference** (`infer`): one resolution step of a fact against a rule
//! - **Knowledge base** (`kb`): assert/merge, ask, retraction cascades
//! - **Text format** (`parse`): `fact:` / `rule:` lines and knowledge files
//!
//! ## Library usage
//!
//! ```
//! use chainkb::kb::KnowledgeBase;
//! use chainkb::parse::parse_item;
//!
//! let mut kb = KnowledgeBase::new();
//! kb.assert(parse_item("fact: (isa cube block)").unwrap());
//! kb.assert(parse_item("rule: ((isa ?x block)) -> (stackable ?x)").unwrap());
//!
//! let answers = kb.ask(&parse_item("fact: (stackable ?y)").unwrap());
//! assert_eq!(answers.len(), 1);
//!
//! kb.retract(&parse_item("fact: (isa cube block)").unwrap());
//! assert!(kb.ask(&parse_item("fact: (stackable ?y)").unwrap()).is_empty());
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod infer;
pub mod item;
pub mod kb;
pub mod parse;
pub mod statement;
pub mod unify;
