//! Quests service
//!
//! Quests own their tasks. A full quest update reconciles the task list;
//! progress updates only touch `current` and the finished timestamp.

use super::context::{current_context, validate_name};
use crate::database::{
    CreateQuestRequest, GameContext, Player, Quest, QuestTask, Record, Repository, TaskProgress,
    UpdateQuestRequest,
};
use crate::domain::tasks::{new_tasks, quest_finished_at};
use crate::domain::{
    apply_progress, ensure_same_game, ensure_valid_parent, filter_visible, hidden_by_for,
    reconcile_tasks, Hideable,
};
use crate::error::{AppError, Result};
use chrono::Utc;
use serde::Serialize;

/// A quest with its visible tasks and the visible records filed under it
#[derive(Debug, Clone, Serialize)]
pub struct QuestPage {
    pub quest: Quest,
    pub tasks: Vec<QuestTask>,
    pub records: Vec<Record>,
}

#[derive(Clone)]
pub struct QuestsService {
    repo: Repository,
}

impl QuestsService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    async fn load_visible(&self, actor: &Player, ctx: &GameContext, id: i64) -> Result<Quest> {
        let quest = self.repo.get_quest(id).await?;
        ensure_same_game(quest.game_id, ctx, "quest", id)?;

        if !quest.is_visible_to(actor.id) {
            return Err(AppError::not_found("quest", id));
        }
        Ok(quest)
    }

    async fn check_parent(&self, ctx: &GameContext, id: Option<i64>, parent_id: Option<i64>) -> Result<()> {
        if let Some(parent_id) = parent_id {
            let parents = self.repo.quest_parents(ctx.game.id).await?;
            ensure_valid_parent(&parents, id, parent_id, "quest")?;
        }
        Ok(())
    }

    async fn page(&self, actor: &Player, quest: Quest) -> Result<QuestPage> {
        let tasks = filter_visible(self.repo.list_tasks(quest.id).await?, actor.id);
        let records = filter_visible(self.repo.records_for_quest(quest.id).await?, actor.id);

        Ok(QuestPage {
            quest,
            tasks,
            records,
        })
    }

    /// Create a quest and its initial tasks in one transaction
    pub async fn create_quest(&self, actor: &Player, req: CreateQuestRequest) -> Result<QuestPage> {
        validate_name(&req.name, "quest")?;
        let ctx = current_context(&self.repo, actor).await?;
        self.check_parent(&ctx, None, req.parent_id).await?;

        tracing::info!("Creating quest {} in game {}", req.name, ctx.game.id);

        let now = Utc::now();
        let draft = Quest {
            id: 0,
            game_id: ctx.game.id,
            name: req.name,
            title: req.title,
            description: req.description,
            hidden_by: hidden_by_for(req.hidden, actor.id),
            successful: req.successful,
            parent_id: req.parent_id,
            child_id: req.child_id,
            head_id: req.head_id,
            finished_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let mut tx = self.repo.begin().await?;
        let quest = self.repo.insert_quest(&mut *tx, &draft, now).await?;
        for task in new_tasks(&quest, &req.tasks, actor.id)? {
            self.repo.insert_task(&mut *tx, &task).await?;
        }
        tx.commit().await?;

        tracing::info!("Quest created successfully: {}", quest.id);

        self.page(actor, quest).await
    }

    /// Update quest fields and reconcile its task list in one transaction
    pub async fn update_quest(&self, actor: &Player, req: UpdateQuestRequest) -> Result<QuestPage> {
        validate_name(&req.name, "quest")?;
        let ctx = current_context(&self.repo, actor).await?;
        let existing = self.load_visible(actor, &ctx, req.id).await?;
        self.check_parent(&ctx, Some(req.id), req.parent_id).await?;

        tracing::debug!("Updating quest: {}", req.id);

        let now = Utc::now();
        let current_tasks = self.repo.list_tasks(existing.id).await?;
        let plan = reconcile_tasks(&existing, &current_tasks, &req.tasks, actor.id, now)?;

        let quest = Quest {
            name: req.name,
            title: req.title,
            description: req.description,
            hidden_by: hidden_by_for(req.hidden, actor.id),
            successful: req.successful,
            parent_id: req.parent_id,
            child_id: req.child_id,
            head_id: req.head_id,
            finished_at: quest_finished_at(req.finished, existing.finished_at, now),
            ..existing
        };

        let mut tx = self.repo.begin().await?;
        let quest = self.repo.update_quest_row(&mut *tx, &quest, now).await?;
        self.repo
            .delete_tasks(&mut *tx, quest.id, &plan.deleted)
            .await?;
        for task in &plan.updated {
            self.repo.update_task(&mut *tx, task).await?;
        }
        for task in &plan.inserted {
            self.repo.insert_task(&mut *tx, task).await?;
        }
        tx.commit().await?;

        tracing::debug!(
            "Quest {} tasks: {} updated, {} inserted, {} deleted",
            quest.id,
            plan.updated.len(),
            plan.inserted.len(),
            plan.deleted.len()
        );

        self.page(actor, quest).await
    }

    /// Set progress on some of a quest's tasks; returns the visible tasks
    pub async fn patch_tasks(
        &self,
        actor: &Player,
        quest_id: i64,
        patches: &[TaskProgress],
    ) -> Result<Vec<QuestTask>> {
        let ctx = current_context(&self.repo, actor).await?;
        let quest = self.load_visible(actor, &ctx, quest_id).await?;

        let mut tasks = self.repo.list_tasks(quest.id).await?;
        let touched = apply_progress(&mut tasks, patches, Utc::now())?;

        let mut tx = self.repo.begin().await?;
        for task in tasks.iter().filter(|task| touched.contains(&task.id)) {
            self.repo.update_task_progress(&mut *tx, task).await?;
        }
        tx.commit().await?;

        tracing::debug!("Updated progress of {} tasks in quest {}", touched.len(), quest.id);

        Ok(filter_visible(tasks, actor.id))
    }

    pub async fn list_quests(&self, actor: &Player) -> Result<Vec<Quest>> {
        let ctx = current_context(&self.repo, actor).await?;
        let quests = self.repo.list_quests(ctx.game.id).await?;
        Ok(filter_visible(quests, actor.id))
    }

    pub async fn get_quest(&self, actor: &Player, id: i64) -> Result<QuestPage> {
        let ctx = current_context(&self.repo, actor).await?;
        let quest = self.load_visible(actor, &ctx, id).await?;
        self.page(actor, quest).await
    }

    /// Soft delete; tasks and records keep pointing at it
    pub async fn delete_quest(&self, actor: &Player, id: i64) -> Result<()> {
        let ctx = current_context(&self.repo, actor).await?;
        self.load_visible(actor, &ctx, id).await?;

        tracing::info!("Deleting quest: {}", id);

        self.repo.soft_delete_quest(id, Utc::now()).await
    }
}
