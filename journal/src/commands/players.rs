//! Login and player settings commands

use super::views::{GameInfo, LoginInfo, PlayerInfo, PlayerSettings};
use crate::app::AppState;
use crate::database::Player;
use crate::error::Result;

/// Exchange an access key for a token
pub async fn login(state: &AppState, access_key: &str) -> Result<LoginInfo> {
    let login = state.players_service.login(access_key.trim()).await?;
    Ok(LoginInfo::from(login))
}

pub async fn logout(state: &AppState, token: &str) -> Result<()> {
    state.players_service.logout(token).await
}

pub async fn get_player_settings(state: &AppState, player: &Player) -> Result<PlayerSettings> {
    let games = state.players_service.player_games(player).await?;
    let current_game = games
        .iter()
        .find(|game| Some(game.id) == player.current_game_id)
        .map(GameInfo::from);

    Ok(PlayerSettings {
        player: PlayerInfo::from(player),
        games: games.iter().map(GameInfo::from).collect(),
        current_game,
    })
}

pub async fn change_current_game(state: &AppState, player: &Player, game_id: i64) -> Result<GameInfo> {
    let ctx = state.players_service.change_current_game(player, game_id).await?;
    Ok(GameInfo::from(&ctx))
}

pub async fn change_username(state: &AppState, player: &Player, username: &str) -> Result<PlayerInfo> {
    let player = state
        .players_service
        .change_username(player, username.trim())
        .await?;
    Ok(PlayerInfo::from(&player))
}
