//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::AppConfig;
use crate::database::{create_pool, Player, Repository};
use crate::error::Result;
use crate::services::{
    EntitiesService, GamesService, PlayersService, QuestsService, RecordsService, SessionsService,
};
use sqlx::SqlitePool;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub repo: Repository,
    pub records_service: RecordsService,
    pub entities_service: EntitiesService,
    pub quests_service: QuestsService,
    pub sessions_service: SessionsService,
    pub players_service: PlayersService,
    pub games_service: GamesService,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig) -> Self {
        let repo = Repository::new(pool);

        Self {
            records_service: RecordsService::new(repo.clone()),
            entities_service: EntitiesService::new(repo.clone()),
            quests_service: QuestsService::new(repo.clone()),
            sessions_service: SessionsService::new(repo.clone()),
            players_service: PlayersService::new(repo.clone(), config.auth.clone()),
            games_service: GamesService::new(repo.clone()),
            repo,
            config,
        }
    }

    /// Re-read the player so every command sees the stored current game
    pub async fn resolve_player(&self, token: &str) -> Result<Player> {
        let player = self.players_service.authenticate(token).await?;
        self.repo
            .touch_player(player.id, chrono::Utc::now())
            .await?;
        Ok(player)
    }
}

/// Application setup - called once on startup
pub async fn setup(config: AppConfig) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("Database path: {:?}", config.database.path);

    let pool = create_pool(&config.database.path, config.database.max_connections).await?;
    let state = AppState::new(pool, config);

    tracing::info!("Application initialized successfully");

    Ok(state)
}
