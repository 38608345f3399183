//! Games service

use super::context::{current_context, validate_name};
use crate::database::{CreateGameRequest, GameContext, GameSettingsUpdate, Player, Repository};
use crate::domain::ensure_game_master;
use crate::error::{AppError, Result};
use chrono::Utc;

#[derive(Clone)]
pub struct GamesService {
    repo: Repository,
}

impl GamesService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a game run by `actor` and switch them into it.
    ///
    /// Game, settings row, membership and the current-game switch commit
    /// together.
    pub async fn create_game(&self, actor: &Player, req: CreateGameRequest) -> Result<GameContext> {
        validate_name(&req.name, "game")?;

        tracing::info!("Creating game {} for {}", req.name, actor.username);

        let mut tx = self.repo.begin().await?;
        let game = self
            .repo
            .insert_game(&mut *tx, &req.name, actor.id, Utc::now())
            .await?;
        let settings = self.repo.insert_game_settings(&mut *tx, game.id).await?;
        self.repo.add_member(&mut *tx, actor.id, game.id).await?;
        self.repo.set_current_game(&mut *tx, actor.id, game.id).await?;
        tx.commit().await?;

        tracing::info!("Game created successfully: {}", game.id);

        Ok(GameContext { game, settings })
    }

    /// Change a game's settings. Only that game's GM may do this.
    pub async fn update_settings(&self, actor: &Player, req: GameSettingsUpdate) -> Result<GameContext> {
        let ctx = self.repo.game_context(req.game_id).await?;
        ensure_game_master(actor, &ctx, "change game settings")?;

        let settings = self
            .repo
            .update_game_settings(req.game_id, req.allow_all_edit_records)
            .await?;

        Ok(GameContext {
            game: ctx.game,
            settings,
        })
    }

    /// Add an existing player to the GM's current game
    pub async fn add_player(&self, actor: &Player, player_id: i64) -> Result<Player> {
        let ctx = current_context(&self.repo, actor).await?;
        ensure_game_master(actor, &ctx, "add players")?;

        let player = self.repo.get_player(player_id).await?;

        let mut tx = self.repo.begin().await?;
        self.repo.add_member(&mut *tx, player.id, ctx.game.id).await?;
        let player = match player.current_game_id {
            Some(_) => player,
            None => self.repo.set_current_game(&mut *tx, player.id, ctx.game.id).await?,
        };
        tx.commit().await?;

        tracing::info!("Player {} added to game {}", player.username, ctx.game.id);
        Ok(player)
    }

    /// The actor's current game with settings
    pub async fn current_game(&self, actor: &Player) -> Result<GameContext> {
        current_context(&self.repo, actor).await
    }

    /// Players of the actor's current game
    pub async fn game_players(&self, actor: &Player) -> Result<Vec<Player>> {
        let ctx = current_context(&self.repo, actor).await?;
        let players = self.repo.list_game_players(ctx.game.id).await?;
        if !players.iter().any(|p| p.id == actor.id) {
            return Err(AppError::Forbidden(format!(
                "player {} is not in game {}",
                actor.username, ctx.game.id
            )));
        }
        Ok(players)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::test_support::*;

    #[tokio::test]
    async fn test_create_game_makes_gm() {
        let repo = create_test_repo().await;
        let mira = player(&repo, "mira").await;
        let service = GamesService::new(repo.clone());

        let ctx = service
            .create_game(&mira, CreateGameRequest { name: "Fen".to_string() })
            .await
            .unwrap();

        assert!(ctx.is_game_master(mira.id));
        assert!(!ctx.settings.allow_all_edit_records);
        assert!(repo.is_member(mira.id, ctx.game.id).await.unwrap());

        let mira = repo.get_player(mira.id).await.unwrap();
        assert_eq!(mira.current_game_id, Some(ctx.game.id));
        assert_eq!(service.game_players(&mira).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_game_name() {
        let repo = create_test_repo().await;
        let mira = player(&repo, "mira").await;
        let service = GamesService::new(repo);

        let err = service
            .create_game(&mira, CreateGameRequest { name: String::new() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_settings_gm_only() {
        let repo = create_test_repo().await;
        let gm = player(&repo, "gm").await;
        let mira = player(&repo, "mira").await;
        let (game, gm) = game(&repo, &gm, "Fen").await;
        let mira = join(&repo, &mira, &game).await;
        let service = GamesService::new(repo);

        let update = GameSettingsUpdate {
            game_id: game.id,
            allow_all_edit_records: true,
        };

        assert!(matches!(
            service.update_settings(&mira, update.clone()).await,
            Err(AppError::Forbidden(_))
        ));

        let ctx = service.update_settings(&gm, update).await.unwrap();
        assert!(ctx.settings.allow_all_edit_records);
    }

    #[tokio::test]
    async fn test_add_player() {
        let repo = create_test_repo().await;
        let gm = player(&repo, "gm").await;
        let hob = player(&repo, "hob").await;
        let (game, gm) = game(&repo, &gm, "Fen").await;
        let service = GamesService::new(repo.clone());

        let hob = service.add_player(&gm, hob.id).await.unwrap();
        assert_eq!(hob.current_game_id, Some(game.id));
        assert!(repo.is_member(hob.id, game.id).await.unwrap());

        assert!(matches!(
            service.add_player(&hob, gm.id).await,
            Err(AppError::Forbidden(_))
        ));
    }
}
