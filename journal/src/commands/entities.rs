//! Char, NPC and location commands

use super::views::SuggestionData;
use crate::app::AppState;
use crate::database::{
    Char, CreateEntityRequest, Location, Npc, Player, UpdateEntityRequest,
};
use crate::error::Result;
use crate::services::EntityPage;

pub async fn get_chars(state: &AppState, player: &Player) -> Result<Vec<Char>> {
    state.entities_service.list(player).await
}

pub async fn get_char(state: &AppState, player: &Player, id: i64) -> Result<EntityPage<Char>> {
    state.entities_service.get(player, id).await
}

pub async fn create_char(state: &AppState, player: &Player, req: CreateEntityRequest) -> Result<Char> {
    state.entities_service.create(player, req).await
}

pub async fn update_char(state: &AppState, player: &Player, req: UpdateEntityRequest) -> Result<Char> {
    state.entities_service.update(player, req).await
}

pub async fn get_npcs(state: &AppState, player: &Player) -> Result<Vec<Npc>> {
    state.entities_service.list(player).await
}

pub async fn get_npc(state: &AppState, player: &Player, id: i64) -> Result<EntityPage<Npc>> {
    state.entities_service.get(player, id).await
}

pub async fn create_npc(state: &AppState, player: &Player, req: CreateEntityRequest) -> Result<Npc> {
    state.entities_service.create(player, req).await
}

pub async fn update_npc(state: &AppState, player: &Player, req: UpdateEntityRequest) -> Result<Npc> {
    state.entities_service.update(player, req).await
}

pub async fn get_locations(state: &AppState, player: &Player) -> Result<Vec<Location>> {
    state.entities_service.list(player).await
}

pub async fn get_location(
    state: &AppState,
    player: &Player,
    id: i64,
) -> Result<EntityPage<Location>> {
    state.entities_service.get(player, id).await
}

pub async fn create_location(
    state: &AppState,
    player: &Player,
    req: CreateEntityRequest,
) -> Result<Location> {
    state.entities_service.create(player, req).await
}

pub async fn update_location(
    state: &AppState,
    player: &Player,
    req: UpdateEntityRequest,
) -> Result<Location> {
    state.entities_service.update(player, req).await
}

/// Direct children of a location
pub async fn get_location_children(
    state: &AppState,
    player: &Player,
    id: i64,
) -> Result<Vec<Location>> {
    state.entities_service.location_children(player, id).await
}

/// Mention autocomplete for the current game
pub async fn get_suggestions(state: &AppState, player: &Player) -> Result<SuggestionData> {
    let suggestions = state.entities_service.suggestions(player).await?;
    Ok(SuggestionData { suggestions })
}
