//! Request context shared by the services

use crate::config::MAX_NAME_LENGTH;
use crate::database::{GameContext, Player, Repository};
use crate::error::{AppError, Result};

/// Load the acting player's current game and its settings
pub async fn current_context(repo: &Repository, actor: &Player) -> Result<GameContext> {
    let game_id = actor.current_game_id.ok_or_else(|| {
        AppError::NotFound(format!("current game of player {}", actor.username))
    })?;

    repo.game_context(game_id).await
}

/// Names are required everywhere and bounded in length
pub fn validate_name(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation(format!("{} name cannot be empty", what)));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "{} name is longer than {} characters",
            what, MAX_NAME_LENGTH
        )));
    }
    Ok(())
}
