//! Domain rules
//!
//! Pure logic with no database access: mention parsing, link
//! reconciliation, visibility, record policy, quest task reconciliation
//! and parent-chain checks. Services compose these around the repository.

pub mod hierarchy;
pub mod links;
pub mod mentions;
pub mod policy;
pub mod tasks;
pub mod visibility;

pub use hierarchy::ensure_valid_parent;
pub use links::{reconcile, LinkDiff, LinkSet};
pub use mentions::{parse_mentions, render_mention, Mention};
pub use policy::{can_mutate_record, ensure_can_mutate_record, ensure_game_master, ensure_same_game};
pub use tasks::{apply_progress, is_finished, reconcile_tasks, NewTask, TaskPlan};
pub use visibility::{filter_visible, hidden_by_for, Hideable};
