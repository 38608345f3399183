//! Parent links for locations and quests
//!
//! Both tables point at themselves through `parent_id`. Before a parent is
//! stored we walk its ancestor chain and refuse anything that would lead
//! back to the row being edited.

use crate::error::{AppError, Result};
use std::collections::{HashMap, HashSet};

/// Check that making `parent_id` the parent of `id` keeps the tree acyclic.
///
/// `parents` maps every live row of the game to its current parent. For a
/// row that does not exist yet pass `id = None`; only the parent's
/// existence is then checked.
pub fn ensure_valid_parent(
    parents: &HashMap<i64, Option<i64>>,
    id: Option<i64>,
    parent_id: i64,
    what: &str,
) -> Result<()> {
    if Some(parent_id) == id {
        return Err(AppError::Validation(format!(
            "{} {} cannot be its own parent",
            what, parent_id
        )));
    }

    if !parents.contains_key(&parent_id) {
        return Err(AppError::not_found(&format!("parent {}", what), parent_id));
    }

    let Some(id) = id else {
        return Ok(());
    };

    let mut seen = HashSet::new();
    let mut cursor = Some(parent_id);
    while let Some(current) = cursor {
        if current == id {
            return Err(AppError::Validation(format!(
                "{} {} cannot be moved under its own descendant {}",
                what, id, parent_id
            )));
        }
        if !seen.insert(current) {
            // Existing data already loops; stop walking
            tracing::warn!("Found a parent loop through {} {}", what, current);
            break;
        }
        cursor = parents.get(&current).copied().flatten();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1 <- 2 <- 3, 4 standalone
    fn tree() -> HashMap<i64, Option<i64>> {
        HashMap::from([(1, None), (2, Some(1)), (3, Some(2)), (4, None)])
    }

    #[test]
    fn test_valid_move() {
        assert!(ensure_valid_parent(&tree(), Some(4), 3, "location").is_ok());
        assert!(ensure_valid_parent(&tree(), Some(3), 1, "location").is_ok());
    }

    #[test]
    fn test_new_row_under_existing_parent() {
        assert!(ensure_valid_parent(&tree(), None, 2, "location").is_ok());
    }

    #[test]
    fn test_self_parent_rejected() {
        let err = ensure_valid_parent(&tree(), Some(2), 2, "location").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_descendant_parent_rejected() {
        let err = ensure_valid_parent(&tree(), Some(1), 3, "quest").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_missing_parent_is_not_found() {
        let err = ensure_valid_parent(&tree(), Some(1), 99, "location").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_existing_loop_terminates() {
        let looped = HashMap::from([(1, Some(2)), (2, Some(1)), (5, None)]);
        assert!(ensure_valid_parent(&looped, Some(5), 1, "location").is_ok());
    }
}
