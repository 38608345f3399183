//! Players and auth tokens

use super::Repository;
use crate::database::models::{AuthToken, Player};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

impl Repository {
    /// Create a new player with the given access key
    pub async fn insert_player(
        &self,
        username: &str,
        access_key: &str,
        now: DateTime<Utc>,
    ) -> Result<Player> {
        let player = sqlx::query_as::<_, Player>(
            r#"
            INSERT INTO players (username, access_key, registered_at, last_action_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(access_key)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created player: {}", player.id);
        Ok(player)
    }

    /// Get a player by ID
    pub async fn get_player(&self, id: i64) -> Result<Player> {
        sqlx::query_as::<_, Player>("SELECT * FROM players WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("player", id))
    }

    /// Look up the player owning an access key
    pub async fn player_by_access_key(&self, access_key: &str) -> Result<Option<Player>> {
        let player = sqlx::query_as::<_, Player>("SELECT * FROM players WHERE access_key = ?")
            .bind(access_key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(player)
    }

    /// Whether any player other than `except_id` already uses `username`
    pub async fn username_taken(
        &self,
        conn: &mut SqliteConnection,
        username: &str,
        except_id: i64,
    ) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM players WHERE username = ? AND id != ?")
                .bind(username)
                .bind(except_id)
                .fetch_one(&mut *conn)
                .await?;

        Ok(count > 0)
    }

    /// Rename a player inside the caller's transaction
    pub async fn set_username(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        username: &str,
    ) -> Result<Player> {
        let player = sqlx::query_as::<_, Player>(
            "UPDATE players SET username = ? WHERE id = ? RETURNING *",
        )
        .bind(username)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found("player", id))?;

        tracing::debug!("Changed username of player {}", id);
        Ok(player)
    }

    /// Switch the game a player is currently playing
    pub async fn set_current_game(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        game_id: i64,
    ) -> Result<Player> {
        sqlx::query_as::<_, Player>(
            "UPDATE players SET current_game_id = ? WHERE id = ? RETURNING *",
        )
        .bind(game_id)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found("player", id))
    }

    /// Record the time of a player's last action
    pub async fn touch_player(&self, id: i64, now: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE players SET last_action_at = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Store the digest of a freshly issued auth token
    pub async fn insert_auth_token(
        &self,
        player_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<AuthToken> {
        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO auth_tokens (player_id, token_hash, expires_at, revoked, created_at)
            VALUES (?, ?, ?, 0, ?)
            RETURNING *
            "#,
        )
        .bind(player_id)
        .bind(token_hash)
        .bind(expires_at)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Issued auth token {} for player {}", token.id, player_id);
        Ok(token)
    }

    /// Find a token by its SHA-256 digest, revoked or not
    pub async fn auth_token_by_hash(&self, token_hash: &str) -> Result<Option<AuthToken>> {
        let token = sqlx::query_as::<_, AuthToken>("SELECT * FROM auth_tokens WHERE token_hash = ?")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(token)
    }

    /// Returns false when no live token had that hash
    pub async fn revoke_auth_token(&self, token_hash: &str) -> Result<bool> {
        let rows = sqlx::query("UPDATE auth_tokens SET revoked = 1 WHERE token_hash = ? AND revoked = 0")
            .bind(token_hash)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::database::repository::test_support::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_player_by_access_key() {
        let repo = create_test_repo().await;
        let created = player(&repo, "mira").await;

        let found = repo.player_by_access_key("key-mira").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(found.current_game_id.is_none());

        assert!(repo.player_by_access_key("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_username_taken() {
        let repo = create_test_repo().await;
        let mira = player(&repo, "mira").await;
        let hob = player(&repo, "hob").await;

        let mut conn = repo.acquire().await.unwrap();
        assert!(repo.username_taken(&mut conn, "mira", hob.id).await.unwrap());
        assert!(!repo.username_taken(&mut conn, "mira", mira.id).await.unwrap());
        assert!(!repo.username_taken(&mut conn, "free", hob.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_auth_token_revoke() {
        let repo = create_test_repo().await;
        let mira = player(&repo, "mira").await;
        let expires = Utc::now() + Duration::hours(1);

        repo.insert_auth_token(mira.id, "abc", expires, Utc::now()).await.unwrap();

        let token = repo.auth_token_by_hash("abc").await.unwrap().unwrap();
        assert!(!token.revoked);

        assert!(repo.revoke_auth_token("abc").await.unwrap());
        assert!(!repo.revoke_auth_token("abc").await.unwrap());

        let token = repo.auth_token_by_hash("abc").await.unwrap().unwrap();
        assert!(token.revoked);
    }
}
