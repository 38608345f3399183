//! Play sessions

use super::Repository;
use crate::database::models::Session;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

impl Repository {
    /// The open session of a game, if any
    pub async fn current_session(
        &self,
        conn: &mut SqliteConnection,
        game_id: i64,
    ) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE game_id = ? AND end_time IS NULL",
        )
        .bind(game_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(session)
    }

    pub async fn close_session(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        end_time: DateTime<Utc>,
    ) -> Result<()> {
        let rows = sqlx::query("UPDATE sessions SET end_time = ? WHERE id = ? AND end_time IS NULL")
            .bind(end_time)
            .bind(id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::Conflict(format!("session {} is already closed", id)));
        }

        tracing::debug!("Closed session: {}", id);
        Ok(())
    }

    /// Insert a session. A second open session for the same game, or a
    /// repeated number, is reported as `Conflict`.
    pub async fn insert_session(
        &self,
        conn: &mut SqliteConnection,
        game_id: i64,
        number: i64,
        started_at: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
    ) -> Result<Session> {
        let result = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (game_id, number, started_at, end_time)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(game_id)
        .bind(number)
        .bind(started_at)
        .bind(end_time)
        .fetch_one(&mut *conn)
        .await;

        match result {
            Ok(session) => {
                tracing::debug!("Created session {} for game {}", number, game_id);
                Ok(session)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                format!("game {} already has session {} or an open session", game_id, number),
            )),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_sessions(&self, game_id: i64) -> Result<Vec<Session>> {
        let sessions = sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE game_id = ? ORDER BY number",
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use crate::database::repository::test_support::*;
    use crate::error::AppError;
    use chrono::Utc;

    #[tokio::test]
    async fn test_second_open_session_conflicts() {
        let repo = create_test_repo().await;
        let gm = player(&repo, "gm").await;
        let (game, _) = game(&repo, &gm, "Fen").await;

        let mut tx = repo.begin().await.unwrap();
        repo.insert_session(&mut tx, game.id, 1, Utc::now(), None)
            .await
            .unwrap();
        let second = repo.insert_session(&mut tx, game.id, 2, Utc::now(), None).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_current_and_close() {
        let repo = create_test_repo().await;
        let gm = player(&repo, "gm").await;
        let (game, _) = game(&repo, &gm, "Fen").await;

        let mut tx = repo.begin().await.unwrap();
        let open = repo
            .insert_session(&mut tx, game.id, 0, Utc::now(), None)
            .await
            .unwrap();
        assert_eq!(
            repo.current_session(&mut tx, game.id).await.unwrap().map(|s| s.id),
            Some(open.id)
        );

        repo.close_session(&mut tx, open.id, Utc::now()).await.unwrap();
        assert!(repo.current_session(&mut tx, game.id).await.unwrap().is_none());
        assert!(matches!(
            repo.close_session(&mut tx, open.id, Utc::now()).await,
            Err(AppError::Conflict(_))
        ));
        tx.commit().await.unwrap();

        assert_eq!(repo.list_sessions(game.id).await.unwrap().len(), 1);
    }
}
