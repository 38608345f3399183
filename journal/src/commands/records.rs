//! Record commands

use super::views::GameRecordsView;
use crate::app::AppState;
use crate::database::{CreateRecordRequest, Player, Record, UpdateRecordRequest};
use crate::domain::LinkSet;
use crate::error::Result;
use crate::services::current_context;

/// Journal view: visible records, players and sessions of the current game
pub async fn get_records(state: &AppState, player: &Player) -> Result<GameRecordsView> {
    let ctx = current_context(&state.repo, player).await?;
    let view = state.records_service.game_records(player).await?;
    Ok(GameRecordsView::new(view, &ctx))
}

pub async fn create_record(
    state: &AppState,
    player: &Player,
    req: CreateRecordRequest,
) -> Result<Record> {
    state.records_service.create_record(player, req).await
}

pub async fn update_record(
    state: &AppState,
    player: &Player,
    req: UpdateRecordRequest,
) -> Result<Record> {
    state.records_service.update_record(player, req).await
}

pub async fn delete_record(state: &AppState, player: &Player, id: i64) -> Result<()> {
    state.records_service.delete_record(player, id).await
}

/// Entities a record links to, as stored
pub async fn get_record_links(state: &AppState, player: &Player, id: i64) -> Result<LinkSet> {
    state.records_service.record_links(player, id).await
}
