//! Justified items: stored facts and rules with their justification edges.
//!
//! Items live in the knowledge base's arena and refer to each other only by
//! [`ItemId`]. An id never gets reused, so a stale id simply stops resolving
//! once its item is removed.

use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use crate::statement::{Item, Rule, Statement};

/// Arena index of a stored fact or rule.
///
/// Ids are allocated monotonically, so ordering by id is creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ItemId(NonZeroU64);

impl ItemId {
    /// Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(ItemId)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }

    pub(crate) fn first() -> Self {
        ItemId(NonZeroU64::MIN)
    }

    /// Returns `None` once the id space is exhausted.
    pub(crate) fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(ItemId)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One derivation: the premise fact and premise rule whose resolution
/// produced the supported item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Support {
    pub fact: ItemId,
    pub rule: ItemId,
}

impl Support {
    pub fn new(fact: ItemId, rule: ItemId) -> Self {
        Self { fact, rule }
    }

    /// Check if this derivation used `id` as a premise.
    pub fn depends_on(&self, id: ItemId) -> bool {
        self.fact == id || self.rule == id
    }

    /// The premise that is not `id`. Only meaningful when `depends_on(id)`.
    pub fn other(&self, id: ItemId) -> ItemId {
        if self.fact == id { self.rule } else { self.fact }
    }
}

/// What a stored item is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Fact(Statement),
    Rule(Rule),
}

/// A stored fact or rule plus its bookkeeping.
#[derive(Debug, Clone)]
pub struct JustifiedItem {
    pub(crate) id: ItemId,
    pub(crate) kind: ItemKind,
    pub(crate) asserted: bool,
    pub(crate) supported_by: Vec<Support>,
    pub(crate) supports_facts: Vec<ItemId>,
    pub(crate) supports_rules: Vec<ItemId>,
}

impl JustifiedItem {
    pub(crate) fn new(id: ItemId, item: Item, support: Option<Support>) -> Self {
        let kind = match item {
            Item::Fact(statement) => ItemKind::Fact(statement),
            Item::Rule(rule) => ItemKind::Rule(rule),
        };
        Self {
            id,
            kind,
            asserted: support.is_none(),
            supported_by: support.into_iter().collect(),
            supports_facts: Vec::new(),
            supports_rules: Vec::new(),
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn is_fact(&self) -> bool {
        matches!(self.kind, ItemKind::Fact(_))
    }

    pub fn is_rule(&self) -> bool {
        matches!(self.kind, ItemKind::Rule(_))
    }

    pub fn statement(&self) -> Option<&Statement> {
        match &self.kind {
            ItemKind::Fact(statement) => Some(statement),
            ItemKind::Rule(_) => None,
        }
    }

    pub fn rule(&self) -> Option<&Rule> {
        match &self.kind {
            ItemKind::Rule(rule) => Some(rule),
            ItemKind::Fact(_) => None,
        }
    }

    /// The item's shape, detached from its bookkeeping.
    pub fn to_item(&self) -> Item {
        match &self.kind {
            ItemKind::Fact(statement) => Item::Fact(statement.clone()),
            ItemKind::Rule(rule) => Item::Rule(rule.clone()),
        }
    }

    /// True if the user asserted this item directly.
    pub fn is_asserted(&self) -> bool {
        self.asserted
    }

    /// True if at least one derivation still justifies this item.
    pub fn is_supported(&self) -> bool {
        !self.supported_by.is_empty()
    }

    pub fn supported_by(&self) -> &[Support] {
        &self.supported_by
    }

    pub fn supports_facts(&self) -> &[ItemId] {
        &self.supports_facts
    }

    pub fn supports_rules(&self) -> &[ItemId] {
        &self.supports_rules
    }

    /// Back-reference list that holds dependents of the given kind.
    pub(crate) fn supports_mut(&mut self, dependent_is_fact: bool) -> &mut Vec<ItemId> {
        if dependent_is_fact {
            &mut self.supports_facts
        } else {
            &mut self.supports_rules
        }
    }
}
