//! Link reconciliation
//!
//! Link tables are a cache of the mentions in a record's text. This module
//! holds the deduplicated per-kind id sets and the pure set difference
//! between what the text says and what is stored.

use super::mentions::{parse_mentions, Mention};
use crate::database::EntityKind;
use serde::Serialize;
use std::collections::BTreeSet;

/// Deduplicated entity ids, one set per link table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkSet {
    pub chars: BTreeSet<i64>,
    pub npcs: BTreeSet<i64>,
    pub locations: BTreeSet<i64>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mentions(mentions: &[Mention]) -> Self {
        let mut set = Self::new();
        for mention in mentions {
            set.insert(mention.kind, mention.id);
        }
        set
    }

    /// Parse `text` and collect its mentions
    pub fn from_text(text: &str) -> Self {
        Self::from_mentions(&parse_mentions(text))
    }

    /// Returns true if the id was not present yet
    pub fn insert(&mut self, kind: EntityKind, id: i64) -> bool {
        self.ids_mut(kind).insert(id)
    }

    pub fn contains(&self, kind: EntityKind, id: i64) -> bool {
        self.ids(kind).contains(&id)
    }

    pub fn ids(&self, kind: EntityKind) -> &BTreeSet<i64> {
        match kind {
            EntityKind::Char => &self.chars,
            EntityKind::Npc => &self.npcs,
            EntityKind::Location => &self.locations,
        }
    }

    fn ids_mut(&mut self, kind: EntityKind) -> &mut BTreeSet<i64> {
        match kind {
            EntityKind::Char => &mut self.chars,
            EntityKind::Npc => &mut self.npcs,
            EntityKind::Location => &mut self.locations,
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len() + self.npcs.len() + self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All (kind, id) pairs, grouped by kind
    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, i64)> + '_ {
        EntityKind::ALL
            .into_iter()
            .flat_map(move |kind| self.ids(kind).iter().map(move |id| (kind, *id)))
    }
}

/// What has to change in the link tables to match the text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkDiff {
    pub to_add: LinkSet,
    pub to_remove: LinkSet,
}

impl LinkDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Per-kind set difference between parsed and stored links.
///
/// `to_add = parsed - current`, `to_remove = current - parsed`. Kinds never
/// mix: a char id and an npc id with the same number are unrelated.
pub fn reconcile(parsed: &LinkSet, current: &LinkSet) -> LinkDiff {
    let mut diff = LinkDiff::default();

    for kind in EntityKind::ALL {
        let wanted = parsed.ids(kind);
        let stored = current.ids(kind);

        for id in wanted.difference(stored) {
            diff.to_add.insert(kind, *id);
        }
        for id in stored.difference(wanted) {
            diff.to_remove.insert(kind, *id);
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(EntityKind, i64)]) -> LinkSet {
        let mut set = LinkSet::new();
        for (kind, id) in pairs {
            set.insert(*kind, *id);
        }
        set
    }

    #[test]
    fn test_create_has_nothing_to_remove() {
        let parsed = LinkSet::from_text("@char:1`A` @npc:2`B` @location:3`C`");
        let diff = reconcile(&parsed, &LinkSet::new());

        assert_eq!(diff.to_add, parsed);
        assert!(diff.to_remove.is_empty());
    }

    #[test]
    fn test_update_adds_and_removes() {
        let current = set(&[(EntityKind::Char, 1), (EntityKind::Npc, 2)]);
        let parsed = set(&[(EntityKind::Char, 1), (EntityKind::Location, 5)]);

        let diff = reconcile(&parsed, &current);

        assert_eq!(diff.to_add, set(&[(EntityKind::Location, 5)]));
        assert_eq!(diff.to_remove, set(&[(EntityKind::Npc, 2)]));
    }

    #[test]
    fn test_kinds_do_not_mix() {
        let current = set(&[(EntityKind::Char, 7)]);
        let parsed = set(&[(EntityKind::Npc, 7)]);

        let diff = reconcile(&parsed, &current);

        assert!(diff.to_add.contains(EntityKind::Npc, 7));
        assert!(diff.to_remove.contains(EntityKind::Char, 7));
    }

    #[test]
    fn test_unchanged_text_is_empty_diff() {
        let links = LinkSet::from_text("@char:1`A` and again @char:1`A`");
        assert!(reconcile(&links, &links).is_empty());
    }

    #[test]
    fn test_removing_all_mentions() {
        let current = set(&[(EntityKind::Char, 1)]);
        let diff = reconcile(&LinkSet::from_text("nothing here"), &current);

        assert!(diff.to_add.is_empty());
        assert_eq!(diff.to_remove, current);
    }

    #[test]
    fn test_iter_is_grouped_by_kind() {
        let links = LinkSet::from_text("@location:3`C` @npc:2`B` @char:9`A` @char:1`D`");
        let pairs: Vec<_> = links.iter().collect();

        assert_eq!(
            pairs,
            vec![
                (EntityKind::Char, 1),
                (EntityKind::Char, 9),
                (EntityKind::Npc, 2),
                (EntityKind::Location, 3),
            ]
        );
    }
}
