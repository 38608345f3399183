//! Repository layer for database operations
//!
//! CRUD for every table, split by aggregate. Reads go through the pool.
//! Writes that belong to a larger unit of work take a
//! `&mut SqliteConnection` so services can run them inside one
//! transaction; never touch the pool while such a transaction is open.

mod entities;
mod games;
mod players;
mod quests;
mod records;
mod sessions;

pub use entities::EntityFields;
pub use records::RecordFields;

use crate::error::Result;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Predicate every listing query uses to hide soft-deleted rows
pub(crate) const LIVE: &str = "deleted_at IS NULL";

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a write transaction. Dropping it without `commit` rolls back.
    ///
    /// `BEGIN IMMEDIATE` takes the write lock up front, so a transaction
    /// that reads before it writes waits on `busy_timeout` instead of
    /// failing with `SQLITE_BUSY` when another writer commits first.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// A single pooled connection for reads that share a helper with
    /// transactional code
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by repository and service tests

    use super::Repository;
    use crate::database::{create_memory_pool, Game, Player};
    use chrono::Utc;

    pub async fn create_test_repo() -> Repository {
        let pool = create_memory_pool().await.unwrap();
        Repository::new(pool)
    }

    pub async fn player(repo: &Repository, username: &str) -> Player {
        repo.insert_player(username, &format!("key-{}", username), Utc::now())
            .await
            .unwrap()
    }

    /// A game run by `gm`, with `gm` switched into it
    pub async fn game(repo: &Repository, gm: &Player, name: &str) -> (Game, Player) {
        let mut tx = repo.begin().await.unwrap();
        let game = repo.insert_game(&mut tx, name, gm.id, Utc::now()).await.unwrap();
        repo.insert_game_settings(&mut tx, game.id).await.unwrap();
        repo.add_member(&mut tx, gm.id, game.id).await.unwrap();
        let gm = repo.set_current_game(&mut tx, gm.id, game.id).await.unwrap();
        tx.commit().await.unwrap();
        (game, gm)
    }

    /// Add `player` to `game` and make it their current game
    pub async fn join(repo: &Repository, player: &Player, game: &Game) -> Player {
        let mut tx = repo.begin().await.unwrap();
        repo.add_member(&mut tx, player.id, game.id).await.unwrap();
        let player = repo.set_current_game(&mut tx, player.id, game.id).await.unwrap();
        tx.commit().await.unwrap();
        player
    }
}
