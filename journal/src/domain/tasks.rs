//! Quest task reconciliation
//!
//! A quest edit sends the complete desired task list. Ids of `0` are new
//! tasks, known ids are updated in place and anything not mentioned is
//! deleted. Completion is never stored independently: it follows from the
//! task type, its progress and its capacity.

use crate::config::MAX_NAME_LENGTH;
use crate::database::{Quest, QuestTask, TaskDraft, TaskProgress, TaskType};
use crate::domain::visibility::hidden_by_for;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// Completion rule: binary tasks are done once progressed at all, decimal
/// tasks once progress reaches capacity (overshooting still counts).
pub fn is_finished(task_type: TaskType, current: i64, capacity: i64) -> bool {
    match task_type {
        TaskType::Binary => current > 0,
        TaskType::Decimal => current >= capacity,
    }
}

/// Finished timestamp after a change. An already finished task keeps its
/// original time; dropping below the threshold clears it.
pub fn finished_at(
    task_type: TaskType,
    current: i64,
    capacity: i64,
    previous: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if is_finished(task_type, current, capacity) {
        Some(previous.unwrap_or(now))
    } else {
        None
    }
}

/// Quest-level finished flag to timestamp, same keep/clear rule as tasks
pub fn quest_finished_at(
    finished: bool,
    previous: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if finished {
        Some(previous.unwrap_or(now))
    } else {
        None
    }
}

/// Task row to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub quest_id: i64,
    pub game_id: i64,
    pub name: String,
    pub description: String,
    pub task_type: TaskType,
    pub capacity: i64,
    pub hidden_by: i64,
}

/// The three batches a quest edit turns into
#[derive(Debug, Clone, Default)]
pub struct TaskPlan {
    pub updated: Vec<QuestTask>,
    pub inserted: Vec<NewTask>,
    pub deleted: Vec<i64>,
}

fn validate_draft(draft: &TaskDraft) -> Result<()> {
    if draft.name.trim().is_empty() {
        return Err(AppError::Validation("task name cannot be empty".to_string()));
    }
    if draft.name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "task name is longer than {} characters",
            MAX_NAME_LENGTH
        )));
    }
    if draft.capacity < 0 {
        return Err(AppError::Validation(format!(
            "task {} has negative capacity",
            draft.name
        )));
    }
    if draft.task_type == TaskType::Decimal && draft.capacity < 1 {
        return Err(AppError::Validation(format!(
            "counted task {} needs a capacity of at least 1",
            draft.name
        )));
    }
    Ok(())
}

/// New tasks for a freshly created quest
pub fn new_tasks(quest: &Quest, drafts: &[TaskDraft], actor_id: i64) -> Result<Vec<NewTask>> {
    drafts
        .iter()
        .map(|draft| {
            validate_draft(draft)?;
            Ok(NewTask {
                quest_id: quest.id,
                game_id: quest.game_id,
                name: draft.name.clone(),
                description: draft.description.clone(),
                task_type: draft.task_type,
                capacity: draft.capacity,
                hidden_by: hidden_by_for(draft.hidden, actor_id),
            })
        })
        .collect()
}

/// Diff the stored tasks of `quest` against the requested task list.
pub fn reconcile_tasks(
    quest: &Quest,
    current: &[QuestTask],
    requested: &[TaskDraft],
    actor_id: i64,
    now: DateTime<Utc>,
) -> Result<TaskPlan> {
    let existing: HashMap<i64, &QuestTask> = current
        .iter()
        .filter(|task| task.quest_id == quest.id)
        .map(|task| (task.id, task))
        .collect();

    let mut plan = TaskPlan::default();
    let mut kept: HashSet<i64> = HashSet::new();

    for draft in requested {
        validate_draft(draft)?;

        if draft.id == 0 {
            plan.inserted.push(NewTask {
                quest_id: quest.id,
                game_id: quest.game_id,
                name: draft.name.clone(),
                description: draft.description.clone(),
                task_type: draft.task_type,
                capacity: draft.capacity,
                hidden_by: hidden_by_for(draft.hidden, actor_id),
            });
            continue;
        }

        if !kept.insert(draft.id) {
            return Err(AppError::Validation(format!(
                "task {} appears more than once",
                draft.id
            )));
        }

        let Some(stored) = existing.get(&draft.id) else {
            tracing::warn!(
                "Ignoring task {} which does not belong to quest {}",
                draft.id,
                quest.id
            );
            continue;
        };

        let mut task = (*stored).clone();
        task.name = draft.name.clone();
        task.description = draft.description.clone();
        task.task_type = draft.task_type;
        task.capacity = draft.capacity;
        task.hidden_by = hidden_by_for(draft.hidden, actor_id);
        task.finished_at = finished_at(
            task.task_type,
            task.current,
            task.capacity,
            stored.finished_at,
            now,
        );
        plan.updated.push(task);
    }

    plan.deleted = current
        .iter()
        .filter(|task| task.quest_id == quest.id && !kept.contains(&task.id))
        .map(|task| task.id)
        .collect();

    Ok(plan)
}

/// Apply progress-only changes to loaded tasks.
///
/// Returns the ids that were touched. Fails when either list is empty.
pub fn apply_progress(
    tasks: &mut [QuestTask],
    patches: &[TaskProgress],
    now: DateTime<Utc>,
) -> Result<Vec<i64>> {
    if patches.is_empty() || tasks.is_empty() {
        return Err(AppError::Validation(
            "empty tasks on update or quest itself".to_string(),
        ));
    }

    if let Some(bad) = patches.iter().find(|p| p.current < 0) {
        return Err(AppError::Validation(format!(
            "task {} progress cannot be negative",
            bad.id
        )));
    }

    let mut touched = Vec::new();
    for task in tasks.iter_mut() {
        // Last patch for an id wins
        let Some(patch) = patches.iter().rev().find(|p| p.id == task.id) else {
            continue;
        };

        task.current = patch.current;
        task.finished_at = finished_at(
            task.task_type,
            task.current,
            task.capacity,
            task.finished_at,
            now,
        );
        touched.push(task.id);
    }

    Ok(touched)
}
