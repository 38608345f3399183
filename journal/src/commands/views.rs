//! Response shapes returned by the commands

use crate::database::{Game, GameContext, Player, Record, Session, Suggestion};
use crate::services::{GameRecords, Login};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerInfo {
    pub id: i64,
    pub username: String,
}

impl From<&Player> for PlayerInfo {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            username: player.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub id: i64,
    pub title: String,
    pub gm_id: i64,
    /// Only known when the settings were loaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_all_edit_records: Option<bool>,
}

impl From<&Game> for GameInfo {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id,
            title: game.name.clone(),
            gm_id: game.gm_id,
            allow_all_edit_records: None,
        }
    }
}

impl From<&GameContext> for GameInfo {
    fn from(ctx: &GameContext) -> Self {
        Self {
            allow_all_edit_records: Some(ctx.settings.allow_all_edit_records),
            ..GameInfo::from(&ctx.game)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInfo {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub player: PlayerInfo,
    pub current_game: Option<GameInfo>,
}

impl From<Login> for LoginInfo {
    fn from(login: Login) -> Self {
        Self {
            player: PlayerInfo::from(&login.player),
            current_game: login.current_game.as_ref().map(GameInfo::from),
            token: login.token,
            expires_at: login.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecordsView {
    pub records: Vec<Record>,
    pub players: Vec<PlayerInfo>,
    pub sessions: Vec<Session>,
    pub current_game: GameInfo,
}

impl GameRecordsView {
    pub fn new(view: GameRecords, ctx: &GameContext) -> Self {
        Self {
            records: view.records,
            players: view.players.iter().map(PlayerInfo::from).collect(),
            sessions: view.sessions,
            current_game: GameInfo::from(ctx),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSettings {
    pub player: PlayerInfo,
    pub games: Vec<GameInfo>,
    pub current_game: Option<GameInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionData {
    #[serde(rename = "entities")]
    pub suggestions: Vec<Suggestion>,
}
