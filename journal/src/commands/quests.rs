//! Quest and session commands

use crate::app::AppState;
use crate::database::{
    CreateQuestRequest, Player, Quest, QuestTask, Session, TaskProgress, UpdateQuestRequest,
};
use crate::error::Result;
use crate::services::QuestPage;

pub async fn get_quests(state: &AppState, player: &Player) -> Result<Vec<Quest>> {
    state.quests_service.list_quests(player).await
}

pub async fn get_quest(state: &AppState, player: &Player, id: i64) -> Result<QuestPage> {
    state.quests_service.get_quest(player, id).await
}

pub async fn create_quest(
    state: &AppState,
    player: &Player,
    req: CreateQuestRequest,
) -> Result<QuestPage> {
    state.quests_service.create_quest(player, req).await
}

pub async fn update_quest(
    state: &AppState,
    player: &Player,
    req: UpdateQuestRequest,
) -> Result<QuestPage> {
    state.quests_service.update_quest(player, req).await
}

/// Progress-only update of some tasks
pub async fn patch_quest_tasks(
    state: &AppState,
    player: &Player,
    quest_id: i64,
    tasks: Vec<TaskProgress>,
) -> Result<Vec<QuestTask>> {
    state.quests_service.patch_tasks(player, quest_id, &tasks).await
}

pub async fn delete_quest(state: &AppState, player: &Player, id: i64) -> Result<()> {
    state.quests_service.delete_quest(player, id).await
}

/// GM only; returns the session that was just opened
pub async fn start_new_game_session(state: &AppState, player: &Player) -> Result<Session> {
    state.sessions_service.start_new_session(player).await
}

pub async fn get_sessions(state: &AppState, player: &Player) -> Result<Vec<Session>> {
    state.sessions_service.list_sessions(player).await
}

/// The open session of the current game, if one was started
pub async fn get_current_session(state: &AppState, player: &Player) -> Result<Option<Session>> {
    state.sessions_service.current_session(player).await
}
