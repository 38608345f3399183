//! Game commands

use super::views::{GameInfo, PlayerInfo};
use crate::app::AppState;
use crate::database::{CreateGameRequest, GameSettingsUpdate, Player};
use crate::error::Result;

/// Create a game; the caller becomes its GM and switches into it
pub async fn create_game(state: &AppState, player: &Player, req: CreateGameRequest) -> Result<GameInfo> {
    let ctx = state.games_service.create_game(player, req).await?;
    Ok(GameInfo::from(&ctx))
}

pub async fn update_game_settings(
    state: &AppState,
    player: &Player,
    req: GameSettingsUpdate,
) -> Result<GameInfo> {
    let ctx = state.games_service.update_settings(player, req).await?;
    Ok(GameInfo::from(&ctx))
}

pub async fn add_player_to_game(state: &AppState, player: &Player, player_id: i64) -> Result<PlayerInfo> {
    let added = state.games_service.add_player(player, player_id).await?;
    Ok(PlayerInfo::from(&added))
}

pub async fn get_current_game(state: &AppState, player: &Player) -> Result<GameInfo> {
    let ctx = state.games_service.current_game(player).await?;
    Ok(GameInfo::from(&ctx))
}

pub async fn get_game_players(state: &AppState, player: &Player) -> Result<Vec<PlayerInfo>> {
    let players = state.games_service.game_players(player).await?;
    Ok(players.iter().map(PlayerInfo::from).collect())
}
