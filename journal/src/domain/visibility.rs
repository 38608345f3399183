//! Visibility filter
//!
//! Anything a player can hide carries a `hidden_by` column: `0` means
//! visible to everyone, otherwise only the player with that id sees it.
//! Filtering runs on rows already scoped to the current game and with
//! soft-deleted rows removed.

use crate::database::{Char, Location, Npc, Quest, QuestTask, Record};

/// Rows carrying a `hidden_by` marker
pub trait Hideable {
    fn hidden_by(&self) -> i64;

    fn is_visible_to(&self, player_id: i64) -> bool {
        let hidden_by = self.hidden_by();
        hidden_by == 0 || hidden_by == player_id
    }
}

macro_rules! impl_hideable {
    ($($ty:ty),*) => {
        $(
            impl Hideable for $ty {
                fn hidden_by(&self) -> i64 {
                    self.hidden_by
                }
            }
        )*
    };
}

impl_hideable!(Record, Char, Npc, Location, Quest, QuestTask);

/// Keep the items `player_id` may see, preserving order
pub fn filter_visible<T: Hideable>(items: Vec<T>, player_id: i64) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| item.is_visible_to(player_id))
        .collect()
}

/// Value stored in `hidden_by` for a "hide from others" flag
pub fn hidden_by_for(hidden: bool, player_id: i64) -> i64 {
    if hidden {
        player_id
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        label: &'static str,
        hidden_by: i64,
    }

    impl Hideable for Row {
        fn hidden_by(&self) -> i64 {
            self.hidden_by
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { label: "public", hidden_by: 0 },
            Row { label: "mine", hidden_by: 5 },
        ]
    }

    #[test]
    fn test_owner_sees_hidden() {
        let visible = filter_visible(rows(), 5);
        assert_eq!(visible, rows());
    }

    #[test]
    fn test_other_player_sees_public_only() {
        let visible = filter_visible(rows(), 7);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].label, "public");
    }

    #[test]
    fn test_order_preserved_and_idempotent() {
        let input = vec![
            Row { label: "a", hidden_by: 0 },
            Row { label: "b", hidden_by: 3 },
            Row { label: "c", hidden_by: 2 },
            Row { label: "d", hidden_by: 0 },
        ];

        let once = filter_visible(input, 2);
        let labels: Vec<_> = once.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["a", "c", "d"]);

        let twice = filter_visible(once.clone(), 2);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_hidden_by_for() {
        assert_eq!(hidden_by_for(true, 9), 9);
        assert_eq!(hidden_by_for(false, 9), 0);
    }
}
