//! Export types for serializing knowledge base state.
//!
//! These are plain snapshots: ids are rendered as numbers and every item
//! carries its text form, so the output reads without the live store.

use serde::{Deserialize, Serialize};

use crate::item::JustifiedItem;
use crate::kb::KnowledgeBase;
use crate::statement::Item;

/// One exported fact or rule with its justification edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemExport {
    pub id: u64,
    /// Text form, e.g. `fact: (isa cube block)`.
    pub text: String,
    pub item: Item,
    pub asserted: bool,
    /// `(fact id, rule id)` premise pairs.
    pub supported_by: Vec<(u64, u64)>,
    pub supports_facts: Vec<u64>,
    pub supports_rules: Vec<u64>,
}

impl From<&JustifiedItem> for ItemExport {
    fn from(item: &JustifiedItem) -> Self {
        let shape = item.to_item();
        Self {
            id: item.id().get(),
            text: shape.to_string(),
            item: shape,
            asserted: item.is_asserted(),
            supported_by: item
                .supported_by()
                .iter()
                .map(|s| (s.fact.get(), s.rule.get()))
                .collect(),
            supports_facts: item.supports_facts().iter().map(|id| id.get()).collect(),
            supports_rules: item.supports_rules().iter().map(|id| id.get()).collect(),
        }
    }
}

/// Snapshot of a whole knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbExport {
    pub facts: Vec<ItemExport>,
    pub rules: Vec<ItemExport>,
}

impl KnowledgeBase {
    /// Snapshot the store, facts and rules in creation order.
    pub fn export(&self) -> KbExport {
        KbExport {
            facts: self.facts().map(ItemExport::from).collect(),
            rules: self.rules().map(ItemExport::from).collect(),
        }
    }
}
