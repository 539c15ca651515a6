//! Knowledge base: the store of justified facts and rules.
//!
//! Every derived item records the premise pairs that justify it, and every
//! premise records the items it helped derive. Asserting an item chains
//! forward until no new item can be produced; retracting one cascades
//! through everything that depended on it alone:
//!
//! 1. Dependents lose the justifications that named the retracted item
//! 2. A dependent left without justification is retracted in turn, unless
//!    the user asserted it, in which case it survives as a plain assertion
//! 3. The cascade continues through the whole dependency graph
//!
//! Both chaining and cascades run off explicit queues, so deep derivation
//! chains never grow the call stack.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;

use crate::error::{KbError, KbResult};
use crate::infer;
use crate::item::{ItemId, ItemKind, JustifiedItem, Support};
use crate::statement::{Item, Rule, Statement};
use crate::unify::{Bindings, unify};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One answer to [`KnowledgeBase::ask`]: the bindings and the fact that
/// justifies them.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub bindings: Bindings,
    pub fact: ItemId,
    pub statement: Statement,
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bindings.is_empty() {
            write!(f, "yes, by {}", self.statement)
        } else {
            write!(f, "{}, by {}", self.bindings, self.statement)
        }
    }
}

/// What a retraction request changed.
#[derive(Debug, Clone, Default)]
pub struct RetractionResult {
    /// Items removed from the store, the requested target first.
    pub retracted: Vec<(ItemId, Item)>,
    /// The target kept its derivational support and only lost its
    /// asserted flag.
    pub demoted: Option<ItemId>,
    /// Dependents that lost a justification but stayed, either through
    /// remaining support or because the user asserted them.
    pub re_evaluated: Vec<ItemId>,
    /// Longest dependency chain the cascade walked.
    pub cascade_depth: usize,
}

impl RetractionResult {
    /// True if the request changed nothing.
    pub fn is_noop(&self) -> bool {
        self.retracted.is_empty() && self.demoted.is_none()
    }

    /// True if `id` was removed.
    pub fn removed(&self, id: ItemId) -> bool {
        self.retracted.iter().any(|(r, _)| *r == id)
    }
}

// ---------------------------------------------------------------------------
// Knowledge base
// ---------------------------------------------------------------------------

/// Pending (fact, rule) resolutions.
type Agenda = VecDeque<(ItemId, ItemId)>;

/// The mutable store of all justified facts and rules.
///
/// Items live in an arena keyed by [`ItemId`]; all justification edges are
/// ids, so removing an item never leaves a dangling pointer. The two
/// indexes enforce structural uniqueness.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    items: BTreeMap<ItemId, JustifiedItem>,
    facts: HashMap<Statement, ItemId>,
    rules: HashMap<Rule, ItemId>,
    last_id: Option<ItemId>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a knowledge base by asserting `items` in order.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut kb = Self::new();
        kb.assert_all(items);
        kb
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn get(&self, id: ItemId) -> Option<&JustifiedItem> {
        self.items.get(&id)
    }

    /// Find the stored item structurally equal to `item`.
    pub fn lookup(&self, item: &Item) -> Option<ItemId> {
        match item {
            Item::Fact(statement) => self.facts.get(statement).copied(),
            Item::Rule(rule) => self.rules.get(rule).copied(),
        }
    }

    pub fn find_fact(&self, statement: &Statement) -> Option<&JustifiedItem> {
        self.facts.get(statement).and_then(|id| self.items.get(id))
    }

    pub fn find_rule(&self, rule: &Rule) -> Option<&JustifiedItem> {
        self.rules.get(rule).and_then(|id| self.items.get(id))
    }

    pub fn contains(&self, item: &Item) -> bool {
        self.lookup(item).is_some()
    }

    /// Stored facts in creation order.
    pub fn facts(&self) -> impl Iterator<Item = &JustifiedItem> {
        self.items.values().filter(|i| i.is_fact())
    }

    /// Stored rules in creation order.
    pub fn rules(&self) -> impl Iterator<Item = &JustifiedItem> {
        self.items.values().filter(|i| i.is_rule())
    }

    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    // -----------------------------------------------------------------------
    // Assertion
    // -----------------------------------------------------------------------

    /// Assert an item on the user's behalf.
    ///
    /// A new item is inserted and chained against every compatible item
    /// already present. An item that is already stored is only marked as
    /// asserted.
    pub fn assert(&mut self, item: Item) -> ItemId {
        tracing::debug!(item = %item, "asserting");
        self.add_and_chain(item, None)
    }

    /// Assert every item in order.
    pub fn assert_all(&mut self, items: impl IntoIterator<Item = Item>) {
        for item in items {
            self.assert(item);
        }
    }

    /// Merge-or-insert `item`.
    ///
    /// `support` is `None` for a user assertion and names the premise pair
    /// for a derivation. Returns the id of the stored item, which is the
    /// pre-existing one when `item` merged into it, or `None` when `support`
    /// does not name a stored fact and a stored rule.
    pub fn add(&mut self, item: Item, support: Option<Support>) -> Option<ItemId> {
        if let Some(support) = support {
            let valid = self.get(support.fact).is_some_and(|f| f.is_fact())
                && self.get(support.rule).is_some_and(|r| r.is_rule());
            if !valid {
                tracing::warn!(
                    item = %item,
                    fact = %support.fact,
                    rule = %support.rule,
                    "ignoring item justified by unknown premises"
                );
                return None;
            }
        }
        Some(self.add_and_chain(item, support))
    }

    fn add_and_chain(&mut self, item: Item, support: Option<Support>) -> ItemId {
        let is_fact = item.is_fact_shaped();
        let mut agenda = Agenda::new();
        let id = self.insert_or_merge(item, support, &mut agenda);
        if let Some(support) = support {
            self.link(support, id, is_fact);
        }
        self.run_agenda(agenda);
        id
    }

    fn insert_or_merge(
        &mut self,
        item: Item,
        support: Option<Support>,
        agenda: &mut Agenda,
    ) -> ItemId {
        if let Some(id) = self.lookup(&item) {
            if let Some(existing) = self.items.get_mut(&id) {
                match support {
                    Some(support) => {
                        tracing::debug!(item = %item, %id, "merging justification");
                        existing.supported_by.push(support);
                    }
                    None => existing.asserted = true,
                }
            }
            return id;
        }

        let id = match self.last_id {
            None => ItemId::first(),
            Some(last) => last
                .next()
                .expect("item id space exhausted: more than u64::MAX items allocated"),
        };
        self.last_id = Some(id);
        tracing::debug!(item = %item, %id, "adding");

        // Pair the newcomer with every counterpart already present; each
        // (fact, rule) pair is scheduled exactly once, by its later member.
        match &item {
            Item::Fact(statement) => {
                self.facts.insert(statement.clone(), id);
                agenda.extend(self.rules().map(|rule| (id, rule.id)));
            }
            Item::Rule(rule) => {
                self.rules.insert(rule.clone(), id);
                agenda.extend(self.facts().map(|fact| (fact.id, id)));
            }
        }
        self.items.insert(id, JustifiedItem::new(id, item, support));
        id
    }

    fn run_agenda(&mut self, mut agenda: Agenda) {
        while let Some((fact_id, rule_id)) = agenda.pop_front() {
            let (Some(fact), Some(rule)) = (self.items.get(&fact_id), self.items.get(&rule_id))
            else {
                continue;
            };
            let Some(derivation) = infer::resolve(fact, rule) else {
                continue;
            };

            let is_fact = derivation.item.is_fact_shaped();
            let support = derivation.support;
            let derived = self.insert_or_merge(derivation.item, Some(support), &mut agenda);
            self.link(support, derived, is_fact);
        }
    }

    /// Record `derived` as a dependent of both premises of `support`.
    fn link(&mut self, support: Support, derived: ItemId, derived_is_fact: bool) {
        for premise in [support.fact, support.rule] {
            if let Some(item) = self.items.get_mut(&premise) {
                item.supports_mut(derived_is_fact).push(derived);
            }
        }
    }

    /// Drop one back reference from `premise` to `dependent`.
    fn unlink(&mut self, premise: ItemId, dependent: ItemId, dependent_is_fact: bool) {
        if let Some(item) = self.items.get_mut(&premise) {
            let list = item.supports_mut(dependent_is_fact);
            if let Some(pos) = list.iter().position(|&d| d == dependent) {
                list.remove(pos);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Query
    // -----------------------------------------------------------------------

    /// Ask which stored facts match `query`.
    ///
    /// Rule-shaped queries are reported and answered with nothing. An empty
    /// result means no fact matched.
    pub fn ask(&self, query: &Item) -> Vec<Answer> {
        match self.try_ask(query) {
            Ok(answers) => answers,
            Err(e) => {
                tracing::warn!(error = %e, "invalid ask");
                Vec::new()
            }
        }
    }

    /// Like [`ask`](Self::ask), but a rule-shaped query is an error.
    pub fn try_ask(&self, query: &Item) -> KbResult<Vec<Answer>> {
        let Some(statement) = query.as_fact() else {
            return Err(KbError::InvalidQuery {
                query: query.to_string(),
            });
        };
        Ok(self.ask_statement(statement))
    }

    /// Match `query` against every stored fact, in creation order.
    pub fn ask_statement(&self, query: &Statement) -> Vec<Answer> {
        tracing::info!(query = %query, "asking");
        self.facts()
            .filter_map(|fact| {
                let statement = fact.statement()?;
                let bindings = unify(query, statement)?;
                Some(Answer {
                    bindings,
                    fact: fact.id,
                    statement: statement.clone(),
                })
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Retraction
    // -----------------------------------------------------------------------

    /// Withdraw the user's assertion of `item`.
    ///
    /// - A fact that still has derivational support only loses its asserted
    ///   flag. An unsupported fact is removed and the removal cascades.
    /// - An asserted rule is never removed this way. An unasserted rule is
    ///   removed (with cascade) only once it has no support left.
    /// - An item that is not stored is ignored.
    pub fn retract(&mut self, item: &Item) -> RetractionResult {
        tracing::info!(item = %item, "retracting");

        let Some(id) = self.lookup(item) else {
            tracing::debug!(item = %item, "not present, nothing to retract");
            return RetractionResult::default();
        };
        let Some(target) = self.items.get(&id) else {
            return RetractionResult::default();
        };

        match (target.is_fact(), target.asserted, target.is_supported()) {
            (true, _, true) => {
                if let Some(target) = self.items.get_mut(&id) {
                    target.asserted = false;
                }
                tracing::debug!(%id, "still derived, clearing asserted flag");
                RetractionResult {
                    demoted: Some(id),
                    ..Default::default()
                }
            }
            (true, _, false) => self.cascade(id),
            (false, true, _) => {
                tracing::debug!(%id, "asserted rules are not retracted");
                RetractionResult::default()
            }
            (false, false, true) => RetractionResult::default(),
            (false, false, false) => self.cascade(id),
        }
    }

    /// Remove `root` and everything left without justification by its
    /// removal, breadth first.
    fn cascade(&mut self, root: ItemId) -> RetractionResult {
        let mut result = RetractionResult::default();
        let mut queue: VecDeque<(ItemId, usize)> = VecDeque::from([(root, 0)]);
        let mut queued = HashSet::from([root]);

        while let Some((current, depth)) = queue.pop_front() {
            let Some(removed) = self.remove(current) else {
                continue;
            };
            result.cascade_depth = result.cascade_depth.max(depth);
            let removed_is_fact = removed.is_fact();

            // Forget the removed item on the premise side.
            for support in &removed.supported_by {
                self.unlink(support.fact, current, removed_is_fact);
                self.unlink(support.rule, current, removed_is_fact);
            }

            // Withdraw every justification it lent to its dependents.
            let mut seen = HashSet::new();
            let dependents = removed
                .supports_facts
                .iter()
                .map(|&d| (d, true))
                .chain(removed.supports_rules.iter().map(|&d| (d, false)));
            for (dependent, dependent_is_fact) in dependents {
                if !seen.insert(dependent) {
                    continue;
                }
                let Some(item) = self.items.get_mut(&dependent) else {
                    continue;
                };

                let mut dropped = Vec::new();
                item.supported_by.retain(|s| {
                    let keep = !s.depends_on(current);
                    if !keep {
                        dropped.push(*s);
                    }
                    keep
                });
                let orphaned = !item.is_supported();
                let asserted = item.asserted;

                for support in dropped {
                    self.unlink(support.other(current), dependent, dependent_is_fact);
                }

                if orphaned && !asserted {
                    if queued.insert(dependent) {
                        queue.push_back((dependent, depth + 1));
                    }
                } else {
                    tracing::debug!(%dependent, "justification withdrawn, item survives");
                    result.re_evaluated.push(dependent);
                }
            }

            tracing::debug!(id = %current, item = %removed.to_item(), "retracted");
            result.retracted.push((current, removed.to_item()));
        }

        result
    }

    /// Take an item out of the arena and its index.
    fn remove(&mut self, id: ItemId) -> Option<JustifiedItem> {
        let item = self.items.remove(&id)?;
        match &item.kind {
            ItemKind::Fact(statement) => {
                self.facts.remove(statement);
            }
            ItemKind::Rule(rule) => {
                self.rules.remove(rule);
            }
        }
        Some(item)
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Verify uniqueness, liveness and referential consistency.
    pub fn check_consistency(&self) -> KbResult<()> {
        let inconsistent = |message: String| Err(KbError::Inconsistent { message });

        if self.facts.len() + self.rules.len() != self.items.len() {
            return inconsistent(format!(
                "{} items stored but {} indexed",
                self.items.len(),
                self.facts.len() + self.rules.len()
            ));
        }

        // Expected back references, counted per (premise, dependent).
        let mut expected: HashMap<(ItemId, ItemId), usize> = HashMap::new();
        for item in self.items.values() {
            if self.lookup(&item.to_item()) != Some(item.id) {
                return inconsistent(format!("{} is not indexed under its shape", item.id));
            }
            if !item.asserted && item.supported_by.is_empty() {
                return inconsistent(format!("{} is neither asserted nor supported", item.id));
            }
            for support in &item.supported_by {
                let premises_ok = self.get(support.fact).is_some_and(|f| f.is_fact())
                    && self.get(support.rule).is_some_and(|r| r.is_rule());
                if !premises_ok {
                    return inconsistent(format!(
                        "{} is supported by missing or mistyped premises ({}, {})",
                        item.id, support.fact, support.rule
                    ));
                }
                *expected.entry((support.fact, item.id)).or_default() += 1;
                *expected.entry((support.rule, item.id)).or_default() += 1;
            }
        }

        let mut actual: HashMap<(ItemId, ItemId), usize> = HashMap::new();
        for item in self.items.values() {
            for (&dependent, is_fact) in item
                .supports_facts
                .iter()
                .map(|d| (d, true))
                .chain(item.supports_rules.iter().map(|d| (d, false)))
            {
                let kind_ok = self.get(dependent).is_some_and(|d| d.is_fact() == is_fact);
                if !kind_ok {
                    return inconsistent(format!(
                        "{} lists missing or mistyped dependent {}",
                        item.id, dependent
                    ));
                }
                *actual.entry((item.id, dependent)).or_default() += 1;
            }
        }

        if expected != actual {
            return inconsistent("justification edges and back references disagree".into());
        }
        Ok(())
    }

    /// Render the justification tree of `id`, one line per node.
    pub fn explain(&self, id: ItemId) -> Option<String> {
        let item = self.get(id)?;
        let mut out = String::new();
        let mut path = Vec::new();
        self.explain_into(item, 0, &mut path, &mut out);
        Some(out)
    }

    fn explain_into(
        &self,
        item: &JustifiedItem,
        indent: usize,
        path: &mut Vec<ItemId>,
        out: &mut String,
    ) {
        let pad = "  ".repeat(indent);
        out.push_str(&format!("{pad}{} {}{}\n", item.id, item.to_item(), marker(item)));
        if path.contains(&item.id) {
            return;
        }
        path.push(item.id);
        for support in &item.supported_by {
            out.push_str(&format!("{pad}  because\n"));
            for premise in [support.fact, support.rule] {
                if let Some(p) = self.get(premise) {
                    self.explain_into(p, indent + 2, path, out);
                }
            }
        }
        path.pop();
    }
}

fn marker(item: &JustifiedItem) -> &'static str {
    match (item.asserted, item.is_supported()) {
        (true, true) => " [asserted, derived]",
        (true, false) => " [asserted]",
        (false, _) => " [derived]",
    }
}

impl fmt::Display for KnowledgeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Knowledge Base:")?;
        for item in self.facts().chain(self.rules()) {
            writeln!(f, "{} {}{}", item.id, item.to_item(), marker(item))?;
        }
        Ok(())
    }
}
