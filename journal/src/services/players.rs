//! Players service
//!
//! Access-key login, auth tokens, username changes and switching the
//! current game.

use crate::config::{AuthConfig, MAX_USERNAME_LENGTH};
use crate::crypto::{generate_access_key, generate_token, hash_token};
use crate::database::{Game, GameContext, Player, Repository};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of a successful login. `token` is only ever returned here.
#[derive(Debug, Clone, Serialize)]
pub struct Login {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub player: Player,
    pub current_game: Option<Game>,
}

#[derive(Clone)]
pub struct PlayersService {
    repo: Repository,
    auth: AuthConfig,
}

fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("username cannot be empty".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AppError::Validation(format!(
            "username is longer than {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(AppError::Validation("username cannot contain spaces".to_string()));
    }
    Ok(())
}

impl PlayersService {
    pub fn new(repo: Repository, auth: AuthConfig) -> Self {
        Self { repo, auth }
    }

    /// Create a player with a fresh access key
    pub async fn register(&self, username: &str) -> Result<Player> {
        validate_username(username)?;

        let mut conn = self.repo.acquire().await?;
        if self.repo.username_taken(&mut *conn, username, 0).await? {
            return Err(AppError::Conflict(format!("username {} is not available", username)));
        }
        drop(conn);

        let player = self
            .repo
            .insert_player(username, &generate_access_key(), Utc::now())
            .await?;

        tracing::info!("Registered player {} ({})", player.username, player.id);
        Ok(player)
    }

    /// Exchange an access key for an auth token
    pub async fn login(&self, access_key: &str) -> Result<Login> {
        let player = self
            .repo
            .player_by_access_key(access_key)
            .await?
            .ok_or_else(|| AppError::Unauthorized("no player for this access key".to_string()))?;

        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.auth.token_ttl()?)
            .ok_or_else(|| AppError::Config("token expiry is out of range".to_string()))?;
        self.repo.touch_player(player.id, now).await?;

        let token = generate_token();
        self.repo
            .insert_auth_token(player.id, &hash_token(&token), expires_at, now)
            .await?;

        let current_game = match player.current_game_id {
            Some(game_id) => Some(self.repo.get_game(game_id).await?),
            None => None,
        };

        tracing::info!("Player {} logged in", player.username);

        Ok(Login {
            token,
            expires_at,
            player,
            current_game,
        })
    }

    /// Resolve a bearer token to its player
    pub async fn authenticate(&self, token: &str) -> Result<Player> {
        let stored = self
            .repo
            .auth_token_by_hash(&hash_token(token))
            .await?
            .ok_or_else(|| AppError::Unauthorized("unknown token".to_string()))?;

        if stored.revoked {
            return Err(AppError::Unauthorized("token was revoked".to_string()));
        }
        if stored.expires_at <= Utc::now() {
            return Err(AppError::Unauthorized("token expired".to_string()));
        }

        self.repo.get_player(stored.player_id).await
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        if !self.repo.revoke_auth_token(&hash_token(token)).await? {
            tracing::debug!("Logout with unknown or revoked token");
        }
        Ok(())
    }

    /// Rename a player; the availability check and the write share a
    /// transaction
    pub async fn change_username(&self, actor: &Player, username: &str) -> Result<Player> {
        validate_username(username)?;

        let mut tx = self.repo.begin().await?;
        if self.repo.username_taken(&mut *tx, username, actor.id).await? {
            return Err(AppError::Conflict(format!("username {} is not available", username)));
        }
        let player = self.repo.set_username(&mut *tx, actor.id, username).await?;
        tx.commit().await?;

        tracing::info!("Player {} is now {}", actor.id, player.username);
        Ok(player)
    }

    pub async fn player_games(&self, actor: &Player) -> Result<Vec<Game>> {
        self.repo.list_player_games(actor.id).await
    }

    /// Switch to another game the player belongs to
    pub async fn change_current_game(&self, actor: &Player, game_id: i64) -> Result<GameContext> {
        let ctx = self.repo.game_context(game_id).await?;
        if !self.repo.is_member(actor.id, game_id).await? {
            return Err(AppError::Forbidden(format!(
                "player {} is not in game {}",
                actor.username, game_id
            )));
        }

        let mut conn = self.repo.acquire().await?;
        self.repo.set_current_game(&mut *conn, actor.id, game_id).await?;

        tracing::info!("Player {} switched to game {}", actor.username, game_id);
        Ok(ctx)
    }
}
