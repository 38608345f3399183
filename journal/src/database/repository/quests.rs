//! Quests and quest tasks

use super::{Repository, LIVE};
use crate::database::models::{Quest, QuestTask};
use crate::domain::NewTask;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use std::collections::HashMap;

impl Repository {
    /// Insert a quest. `quest.id`, `created_at` and `updated_at` are
    /// assigned here; everything else is taken as given.
    pub async fn insert_quest(
        &self,
        conn: &mut SqliteConnection,
        quest: &Quest,
        now: DateTime<Utc>,
    ) -> Result<Quest> {
        let created = sqlx::query_as::<_, Quest>(
            r#"
            INSERT INTO quests (game_id, name, title, description, hidden_by, successful,
                parent_id, child_id, head_id, finished_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(quest.game_id)
        .bind(&quest.name)
        .bind(&quest.title)
        .bind(&quest.description)
        .bind(quest.hidden_by)
        .bind(quest.successful)
        .bind(quest.parent_id)
        .bind(quest.child_id)
        .bind(quest.head_id)
        .bind(quest.finished_at)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        tracing::debug!("Created quest: {}", created.id);
        Ok(created)
    }

    /// Write every editable column of `quest` back
    pub async fn update_quest_row(
        &self,
        conn: &mut SqliteConnection,
        quest: &Quest,
        now: DateTime<Utc>,
    ) -> Result<Quest> {
        let sql = format!(
            r#"
            UPDATE quests SET name = ?, title = ?, description = ?, hidden_by = ?, successful = ?,
                parent_id = ?, child_id = ?, head_id = ?, finished_at = ?, updated_at = ?
            WHERE id = ? AND {}
            RETURNING *
            "#,
            LIVE
        );
        let updated = sqlx::query_as::<_, Quest>(&sql)
            .bind(&quest.name)
            .bind(&quest.title)
            .bind(&quest.description)
            .bind(quest.hidden_by)
            .bind(quest.successful)
            .bind(quest.parent_id)
            .bind(quest.child_id)
            .bind(quest.head_id)
            .bind(quest.finished_at)
            .bind(now)
            .bind(quest.id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::not_found("quest", quest.id))?;

        tracing::debug!("Updated quest: {}", quest.id);
        Ok(updated)
    }

    pub async fn get_quest(&self, id: i64) -> Result<Quest> {
        let sql = format!("SELECT * FROM quests WHERE id = ? AND {}", LIVE);
        sqlx::query_as::<_, Quest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("quest", id))
    }

    pub async fn list_quests(&self, game_id: i64) -> Result<Vec<Quest>> {
        let sql = format!(
            "SELECT * FROM quests WHERE game_id = ? AND {} ORDER BY id",
            LIVE
        );
        let quests = sqlx::query_as::<_, Quest>(&sql)
            .bind(game_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(quests)
    }

    pub async fn soft_delete_quest(&self, id: i64, now: DateTime<Utc>) -> Result<()> {
        let sql = format!("UPDATE quests SET deleted_at = ? WHERE id = ? AND {}", LIVE);
        let rows = sqlx::query(&sql)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("quest", id));
        }

        tracing::debug!("Soft deleted quest: {}", id);
        Ok(())
    }

    /// `id -> parent_id` for every live quest of a game
    pub async fn quest_parents(&self, game_id: i64) -> Result<HashMap<i64, Option<i64>>> {
        let sql = format!("SELECT id, parent_id FROM quests WHERE game_id = ? AND {}", LIVE);
        let rows: Vec<(i64, Option<i64>)> = sqlx::query_as(&sql)
            .bind(game_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().collect())
    }

    pub async fn list_tasks(&self, quest_id: i64) -> Result<Vec<QuestTask>> {
        let tasks = sqlx::query_as::<_, QuestTask>(
            "SELECT * FROM quest_tasks WHERE quest_id = ? ORDER BY id",
        )
        .bind(quest_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    pub async fn insert_task(&self, conn: &mut SqliteConnection, task: &NewTask) -> Result<QuestTask> {
        let created = sqlx::query_as::<_, QuestTask>(
            r#"
            INSERT INTO quest_tasks (quest_id, game_id, name, description, task_type, capacity,
                current_value, hidden_by)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?)
            RETURNING *
            "#,
        )
        .bind(task.quest_id)
        .bind(task.game_id)
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.task_type)
        .bind(task.capacity)
        .bind(task.hidden_by)
        .fetch_one(&mut *conn)
        .await?;

        Ok(created)
    }

    pub async fn update_task(&self, conn: &mut SqliteConnection, task: &QuestTask) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE quest_tasks SET name = ?, description = ?, task_type = ?, capacity = ?,
                current_value = ?, hidden_by = ?, finished_at = ?
            WHERE id = ? AND quest_id = ?
            "#,
        )
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.task_type)
        .bind(task.capacity)
        .bind(task.current)
        .bind(task.hidden_by)
        .bind(task.finished_at)
        .bind(task.id)
        .bind(task.quest_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Progress-only write: `current_value` and `finished_at`
    pub async fn update_task_progress(
        &self,
        conn: &mut SqliteConnection,
        task: &QuestTask,
    ) -> Result<()> {
        sqlx::query("UPDATE quest_tasks SET current_value = ?, finished_at = ? WHERE id = ?")
            .bind(task.current)
            .bind(task.finished_at)
            .bind(task.id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    pub async fn delete_tasks(
        &self,
        conn: &mut SqliteConnection,
        quest_id: i64,
        ids: &[i64],
    ) -> Result<u64> {
        let mut removed = 0;
        for id in ids {
            removed += sqlx::query("DELETE FROM quest_tasks WHERE id = ? AND quest_id = ?")
                .bind(id)
                .bind(quest_id)
                .execute(&mut *conn)
                .await?
                .rows_affected();
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use crate::database::repository::test_support::*;
    use crate::database::{Quest, TaskType};
    use crate::domain::NewTask;
    use crate::error::AppError;
    use chrono::Utc;

    fn draft_quest(game_id: i64, name: &str) -> Quest {
        Quest {
            id: 0,
            game_id,
            name: name.to_string(),
            title: String::new(),
            description: String::new(),
            hidden_by: 0,
            successful: false,
            parent_id: None,
            child_id: None,
            head_id: None,
            finished_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_quest_with_tasks() {
        let repo = create_test_repo().await;
        let gm = player(&repo, "gm").await;
        let (game, _) = game(&repo, &gm, "Fen").await;

        let mut tx = repo.begin().await.unwrap();
        let quest = repo
            .insert_quest(&mut tx, &draft_quest(game.id, "Bell"), Utc::now())
            .await
            .unwrap();
        let task = repo
            .insert_task(
                &mut tx,
                &NewTask {
                    quest_id: quest.id,
                    game_id: game.id,
                    name: "Pieces".to_string(),
                    description: String::new(),
                    task_type: TaskType::Decimal,
                    capacity: 3,
                    hidden_by: 0,
                },
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(task.current, 0);
        assert_eq!(task.task_type, TaskType::Decimal);
        assert!(task.finished_at.is_none());

        let mut progressed = task.clone();
        progressed.current = 3;
        progressed.finished_at = Some(Utc::now());
        let mut conn = repo.acquire().await.unwrap();
        repo.update_task_progress(&mut conn, &progressed).await.unwrap();
        drop(conn);

        let tasks = repo.list_tasks(quest.id).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].current, 3);
        assert!(tasks[0].finished_at.is_some());
    }

    #[tokio::test]
    async fn test_soft_delete_quest() {
        let repo = create_test_repo().await;
        let gm = player(&repo, "gm").await;
        let (game, _) = game(&repo, &gm, "Fen").await;

        let mut tx = repo.begin().await.unwrap();
        let quest = repo
            .insert_quest(&mut tx, &draft_quest(game.id, "Bell"), Utc::now())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(repo.list_quests(game.id).await.unwrap().len(), 1);
        repo.soft_delete_quest(quest.id, Utc::now()).await.unwrap();
        assert!(repo.list_quests(game.id).await.unwrap().is_empty());
        assert!(matches!(repo.get_quest(quest.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_quest_parents() {
        let repo = create_test_repo().await;
        let gm = player(&repo, "gm").await;
        let (game, _) = game(&repo, &gm, "Fen").await;

        let mut tx = repo.begin().await.unwrap();
        let root = repo
            .insert_quest(&mut tx, &draft_quest(game.id, "Main"), Utc::now())
            .await
            .unwrap();
        let mut side = draft_quest(game.id, "Side");
        side.parent_id = Some(root.id);
        let side = repo.insert_quest(&mut tx, &side, Utc::now()).await.unwrap();
        tx.commit().await.unwrap();

        let parents = repo.quest_parents(game.id).await.unwrap();
        assert_eq!(parents.get(&side.id), Some(&Some(root.id)));
        assert_eq!(parents.get(&root.id), Some(&None));
    }
}
