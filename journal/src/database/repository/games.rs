//! Games, their settings and membership

use super::{Repository, LIVE};
use crate::database::models::{Game, GameContext, GameSettings, Player};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

impl Repository {
    /// Create a game with `gm_id` as its game master
    pub async fn insert_game(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
        gm_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Game> {
        let game = sqlx::query_as::<_, Game>(
            "INSERT INTO games (name, gm_id, created_at) VALUES (?, ?, ?) RETURNING *",
        )
        .bind(name)
        .bind(gm_id)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        tracing::debug!("Created game: {}", game.id);
        Ok(game)
    }

    /// Default settings row for a new game
    pub async fn insert_game_settings(
        &self,
        conn: &mut SqliteConnection,
        game_id: i64,
    ) -> Result<GameSettings> {
        let settings = sqlx::query_as::<_, GameSettings>(
            "INSERT INTO game_settings (game_id, allow_all_edit_records) VALUES (?, 0) RETURNING *",
        )
        .bind(game_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(settings)
    }

    /// Idempotent
    pub async fn add_member(
        &self,
        conn: &mut SqliteConnection,
        player_id: i64,
        game_id: i64,
    ) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO players_games (player_id, game_id) VALUES (?, ?)")
            .bind(player_id)
            .bind(game_id)
            .execute(&mut *conn)
            .await?;

        tracing::debug!("Player {} joined game {}", player_id, game_id);
        Ok(())
    }

    /// Get a live game by ID
    pub async fn get_game(&self, id: i64) -> Result<Game> {
        let sql = format!("SELECT * FROM games WHERE id = ? AND {}", LIVE);
        sqlx::query_as::<_, Game>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("game", id))
    }

    /// Settings row for a game; games created before settings existed get
    /// the defaults
    pub async fn game_settings(&self, game_id: i64) -> Result<GameSettings> {
        let settings = sqlx::query_as::<_, GameSettings>(
            "SELECT * FROM game_settings WHERE game_id = ?",
        )
        .bind(game_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings.unwrap_or(GameSettings {
            game_id,
            allow_all_edit_records: false,
        }))
    }

    /// A game together with its settings
    pub async fn game_context(&self, game_id: i64) -> Result<GameContext> {
        let game = self.get_game(game_id).await?;
        let settings = self.game_settings(game_id).await?;
        Ok(GameContext { game, settings })
    }

    /// Create or replace a game's settings
    pub async fn update_game_settings(
        &self,
        game_id: i64,
        allow_all_edit_records: bool,
    ) -> Result<GameSettings> {
        let settings = sqlx::query_as::<_, GameSettings>(
            r#"
            INSERT INTO game_settings (game_id, allow_all_edit_records) VALUES (?, ?)
            ON CONFLICT(game_id) DO UPDATE SET allow_all_edit_records = excluded.allow_all_edit_records
            RETURNING *
            "#,
        )
        .bind(game_id)
        .bind(allow_all_edit_records)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            "Game {} allow_all_edit_records = {}",
            game_id,
            allow_all_edit_records
        );
        Ok(settings)
    }

    /// Whether a player has joined a game
    pub async fn is_member(&self, player_id: i64, game_id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM players_games WHERE player_id = ? AND game_id = ?",
        )
        .bind(player_id)
        .bind(game_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Games a player has joined, ordered by ID
    pub async fn list_player_games(&self, player_id: i64) -> Result<Vec<Game>> {
        let sql = format!(
            r#"
            SELECT g.* FROM games g
            JOIN players_games pg ON pg.game_id = g.id
            WHERE pg.player_id = ? AND g.{}
            ORDER BY g.id
            "#,
            LIVE
        );
        let games = sqlx::query_as::<_, Game>(&sql)
            .bind(player_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(games)
    }

    /// Members of a game, ordered by ID
    pub async fn list_game_players(&self, game_id: i64) -> Result<Vec<Player>> {
        let players = sqlx::query_as::<_, Player>(
            r#"
            SELECT p.* FROM players p
            JOIN players_games pg ON pg.player_id = p.id
            WHERE pg.game_id = ?
            ORDER BY p.id
            "#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(players)
    }
}

#[cfg(test)]
mod tests {
    use crate::database::repository::test_support::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_game_context_defaults() {
        let repo = create_test_repo().await;
        let gm = player(&repo, "gm").await;
        let (game, gm) = game(&repo, &gm, "Curse of the Fen").await;

        assert_eq!(gm.current_game_id, Some(game.id));

        let ctx = repo.game_context(game.id).await.unwrap();
        assert_eq!(ctx.game.gm_id, gm.id);
        assert!(!ctx.settings.allow_all_edit_records);
        assert!(ctx.is_game_master(gm.id));
    }

    #[tokio::test]
    async fn test_update_settings() {
        let repo = create_test_repo().await;
        let gm = player(&repo, "gm").await;
        let (game, _) = game(&repo, &gm, "Fen").await;

        let settings = repo.update_game_settings(game.id, true).await.unwrap();
        assert!(settings.allow_all_edit_records);
        assert!(repo.game_settings(game.id).await.unwrap().allow_all_edit_records);
    }

    #[tokio::test]
    async fn test_membership() {
        let repo = create_test_repo().await;
        let gm = player(&repo, "gm").await;
        let mira = player(&repo, "mira").await;
        let (fen, gm) = game(&repo, &gm, "Fen").await;
        let (hills, _) = game(&repo, &gm, "Hills").await;

        join(&repo, &mira, &fen).await;

        assert!(repo.is_member(mira.id, fen.id).await.unwrap());
        assert!(!repo.is_member(mira.id, hills.id).await.unwrap());

        let players = repo.list_game_players(fen.id).await.unwrap();
        assert_eq!(players.len(), 2);

        let games = repo.list_player_games(gm.id).await.unwrap();
        assert_eq!(games.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_game() {
        let repo = create_test_repo().await;
        assert!(matches!(repo.get_game(42).await, Err(AppError::NotFound(_))));
    }
}
