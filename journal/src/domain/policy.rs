//! Authorization policy
//!
//! A record may be changed by its author, by the game's GM, or by anyone
//! in the game when the game allows all players to edit records.

use crate::database::{GameContext, Player, Record};
use crate::error::{AppError, Result};

/// Whether `actor_id` may update or delete `record`
pub fn can_mutate_record(record: &Record, actor_id: i64, ctx: &GameContext) -> bool {
    actor_id == record.player_id
        || ctx.is_game_master(actor_id)
        || ctx.settings.allow_all_edit_records
}

/// [`can_mutate_record`] as a `Forbidden` error, including the game check
pub fn ensure_can_mutate_record(record: &Record, actor: &Player, ctx: &GameContext) -> Result<()> {
    ensure_same_game(record.game_id, ctx, "record", record.id)?;

    if !can_mutate_record(record, actor.id, ctx) {
        return Err(AppError::Forbidden(format!(
            "player {} cannot change other players' records",
            actor.username
        )));
    }
    Ok(())
}

/// GM-only actions such as starting a session
pub fn ensure_game_master(actor: &Player, ctx: &GameContext, action: &str) -> Result<()> {
    if !ctx.is_game_master(actor.id) {
        return Err(AppError::Forbidden(format!("only the GM may {}", action)));
    }
    Ok(())
}

/// Rows from another game are never reachable through the current one
pub fn ensure_same_game(row_game_id: i64, ctx: &GameContext, what: &str, id: i64) -> Result<()> {
    if row_game_id != ctx.game.id {
        return Err(AppError::Forbidden(format!(
            "{} {} does not belong to game {}",
            what, id, ctx.game.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Game, GameSettings};
    use chrono::Utc;

    const AUTHOR: i64 = 1;
    const GM: i64 = 2;
    const OTHER: i64 = 3;

    fn ctx(allow_all: bool) -> GameContext {
        GameContext {
            game: Game {
                id: 10,
                name: "Curse of the Fen".to_string(),
                gm_id: GM,
                created_at: Utc::now(),
                deleted_at: None,
            },
            settings: GameSettings {
                game_id: 10,
                allow_all_edit_records: allow_all,
            },
        }
    }

    fn record(game_id: i64) -> Record {
        Record {
            id: 100,
            game_id,
            player_id: AUTHOR,
            text: "We camped.".to_string(),
            hidden_by: 0,
            quest_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn player(id: i64) -> Player {
        Player {
            id,
            username: format!("player{}", id),
            access_key: String::new(),
            current_game_id: Some(10),
            registered_at: Utc::now(),
            last_action_at: Utc::now(),
        }
    }

    #[test]
    fn test_author_may_mutate() {
        assert!(can_mutate_record(&record(10), AUTHOR, &ctx(false)));
    }

    #[test]
    fn test_gm_may_mutate_others() {
        assert!(can_mutate_record(&record(10), GM, &ctx(false)));
    }

    #[test]
    fn test_allow_all_setting() {
        assert!(!can_mutate_record(&record(10), OTHER, &ctx(false)));
        assert!(can_mutate_record(&record(10), OTHER, &ctx(true)));
    }

    #[test]
    fn test_denial_is_forbidden() {
        let err = ensure_can_mutate_record(&record(10), &player(OTHER), &ctx(false)).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_other_game_is_forbidden_even_for_author() {
        let err = ensure_can_mutate_record(&record(11), &player(AUTHOR), &ctx(true)).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_game_master_only() {
        assert!(ensure_game_master(&player(GM), &ctx(false), "start a session").is_ok());
        assert!(matches!(
            ensure_game_master(&player(OTHER), &ctx(true), "start a session"),
            Err(AppError::Forbidden(_))
        ));
    }
}
