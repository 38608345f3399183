//! Play sessions
//!
//! Sessions are numbered from 0. Starting a new one closes the open
//! session; the very first call seeds a closed session 0 so play starts
//! at session 1.

use super::context::current_context;
use crate::database::{Player, Repository, Session};
use crate::domain::ensure_game_master;
use crate::error::Result;
use chrono::Utc;

#[derive(Clone)]
pub struct SessionsService {
    repo: Repository,
}

impl SessionsService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Close the open session and open the next one. GM only.
    ///
    /// Returns the newly opened session.
    pub async fn start_new_session(&self, actor: &Player) -> Result<Session> {
        let ctx = current_context(&self.repo, actor).await?;
        ensure_game_master(actor, &ctx, "start a new session")?;

        let game_id = ctx.game.id;
        let now = Utc::now();

        let mut tx = self.repo.begin().await?;
        let next_number = match self.repo.current_session(&mut *tx, game_id).await? {
            Some(open) => {
                self.repo.close_session(&mut *tx, open.id, now).await?;
                open.number + 1
            }
            None => {
                let zero = self.repo.insert_session(&mut *tx, game_id, 0, now, Some(now)).await?;
                zero.number + 1
            }
        };
        let session = self
            .repo
            .insert_session(&mut *tx, game_id, next_number, now, None)
            .await?;
        tx.commit().await?;

        tracing::info!("Started session {} of game {}", session.number, game_id);

        Ok(session)
    }

    pub async fn list_sessions(&self, actor: &Player) -> Result<Vec<Session>> {
        let ctx = current_context(&self.repo, actor).await?;
        self.repo.list_sessions(ctx.game.id).await
    }

    pub async fn current_session(&self, actor: &Player) -> Result<Option<Session>> {
        let ctx = current_context(&self.repo, actor).await?;
        let mut conn = self.repo.acquire().await?;
        self.repo.current_session(&mut *conn, ctx.game.id).await
    }
}
