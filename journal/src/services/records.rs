//! Records service
//!
//! Journal entries and the mention links derived from their text. Every
//! write parses the text and rewrites the record's link rows in the same
//! transaction as the row itself.

use super::context::current_context;
use crate::config::MAX_RECORD_TEXT_LENGTH;
use crate::database::{
    CreateRecordRequest, GameContext, Player, Record, RecordFields, Repository, Session,
    UpdateRecordRequest,
};
use crate::domain::{
    ensure_can_mutate_record, filter_visible, hidden_by_for, reconcile, Hideable, LinkSet,
};
use crate::error::{AppError, Result};
use chrono::Utc;
use serde::Serialize;

/// Everything the journal view of a game needs
#[derive(Debug, Clone, Serialize)]
pub struct GameRecords {
    pub records: Vec<Record>,
    pub players: Vec<Player>,
    pub sessions: Vec<Session>,
}

/// Service for managing records
#[derive(Clone)]
pub struct RecordsService {
    repo: Repository,
}

impl RecordsService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    fn validate_text(text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(AppError::Validation("record text cannot be empty".to_string()));
        }
        if text.len() > MAX_RECORD_TEXT_LENGTH {
            return Err(AppError::Validation(format!(
                "record text exceeds {} bytes",
                MAX_RECORD_TEXT_LENGTH
            )));
        }
        Ok(())
    }

    /// A record may only point at a live quest of its own game
    async fn check_quest(&self, quest_id: Option<i64>, ctx: &GameContext) -> Result<()> {
        let Some(quest_id) = quest_id else {
            return Ok(());
        };

        let quest = self.repo.get_quest(quest_id).await?;
        if quest.game_id != ctx.game.id {
            return Err(AppError::not_found("quest", quest_id));
        }
        Ok(())
    }

    /// Create a record in the author's current game
    pub async fn create_record(&self, author: &Player, req: CreateRecordRequest) -> Result<Record> {
        Self::validate_text(&req.text)?;
        let ctx = current_context(&self.repo, author).await?;
        self.check_quest(req.quest_id, &ctx).await?;

        tracing::info!("Creating record in game {} by {}", ctx.game.id, author.username);

        let links = LinkSet::from_text(&req.text);
        let fields = RecordFields {
            text: &req.text,
            hidden_by: hidden_by_for(req.hidden, author.id),
            quest_id: req.quest_id,
        };

        let mut tx = self.repo.begin().await?;
        let record = self
            .repo
            .insert_record(&mut *tx, ctx.game.id, author.id, fields, Utc::now())
            .await?;
        self.repo.insert_links(&mut *tx, record.id, &links).await?;
        tx.commit().await?;

        tracing::info!("Record created successfully: {}", record.id);

        Ok(record)
    }

    /// Replace a record's text and flags, then rebuild its links
    pub async fn update_record(&self, actor: &Player, req: UpdateRecordRequest) -> Result<Record> {
        Self::validate_text(&req.text)?;
        let ctx = current_context(&self.repo, actor).await?;
        let existing = self.repo.get_record(req.id).await?;
        ensure_can_mutate_record(&existing, actor, &ctx)?;
        self.check_quest(req.quest_id, &ctx).await?;

        tracing::debug!("Updating record: {}", req.id);

        let parsed = LinkSet::from_text(&req.text);
        let fields = RecordFields {
            text: &req.text,
            hidden_by: hidden_by_for(req.hidden, actor.id),
            quest_id: req.quest_id,
        };

        let mut tx = self.repo.begin().await?;
        let current = self.repo.list_links(&mut *tx, req.id).await?;
        let diff = reconcile(&parsed, &current);
        tracing::debug!(
            "Record {} links: +{} -{}",
            req.id,
            diff.to_add.len(),
            diff.to_remove.len()
        );

        let record = self
            .repo
            .update_record_row(&mut *tx, req.id, fields, Utc::now())
            .await?;
        self.repo.delete_links(&mut *tx, req.id).await?;
        self.repo.insert_links(&mut *tx, req.id, &parsed).await?;
        tx.commit().await?;

        tracing::debug!("Record updated successfully: {}", record.id);

        Ok(record)
    }

    /// Soft delete a record
    pub async fn delete_record(&self, actor: &Player, id: i64) -> Result<()> {
        let ctx = current_context(&self.repo, actor).await?;
        let existing = self.repo.get_record(id).await?;
        ensure_can_mutate_record(&existing, actor, &ctx)?;

        tracing::info!("Deleting record: {}", id);

        self.repo.soft_delete_record(id, Utc::now()).await?;

        tracing::info!("Record deleted successfully: {}", id);

        Ok(())
    }

    /// Live records of the current game that `actor` may see
    pub async fn records_for_player(&self, actor: &Player) -> Result<Vec<Record>> {
        let ctx = current_context(&self.repo, actor).await?;
        let records = self.repo.list_game_records(ctx.game.id).await?;
        Ok(filter_visible(records, actor.id))
    }

    /// Stored links of a record the actor can see
    pub async fn record_links(&self, actor: &Player, id: i64) -> Result<LinkSet> {
        let ctx = current_context(&self.repo, actor).await?;
        let record = self.repo.get_record(id).await?;
        if record.game_id != ctx.game.id || !record.is_visible_to(actor.id) {
            return Err(AppError::not_found("record", id));
        }

        let mut conn = self.repo.acquire().await?;
        self.repo.list_links(&mut *conn, id).await
    }

    /// Records plus the players and sessions of the current game
    pub async fn game_records(&self, actor: &Player) -> Result<GameRecords> {
        let ctx = current_context(&self.repo, actor).await?;
        let records = filter_visible(self.repo.list_game_records(ctx.game.id).await?, actor.id);
        let players = self.repo.list_game_players(ctx.game.id).await?;
        let sessions = self.repo.list_sessions(ctx.game.id).await?;

        Ok(GameRecords {
            records,
            players,
            sessions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::test_support::*;
    use crate::database::EntityKind;

    async fn setup() -> (RecordsService, Repository, Player, Player) {
        let repo = create_test_repo().await;
        let gm = player(&repo, "gm").await;
        let mira = player(&repo, "mira").await;
        let (game, gm) = game(&repo, &gm, "Fen").await;
        let mira = join(&repo, &mira, &game).await;
        (RecordsService::new(repo.clone()), repo, gm, mira)
    }

    fn create(text: &str) -> CreateRecordRequest {
        CreateRecordRequest {
            text: text.to_string(),
            hidden: false,
            quest_id: None,
        }
    }

    fn update(id: i64, text: &str) -> UpdateRecordRequest {
        UpdateRecordRequest {
            id,
            text: text.to_string(),
            hidden: false,
            quest_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_stores_links() {
        let (service, _, _, mira) = setup().await;

        let record = service
            .create_record(&mira, create("@char:12`Aria` and @npc:7`Guard` and @char:12`Aria`"))
            .await
            .unwrap();

        let links = service.record_links(&mira, record.id).await.unwrap();
        assert_eq!(links.len(), 2);
        assert!(links.contains(EntityKind::Char, 12));
        assert!(links.contains(EntityKind::Npc, 7));
    }

    #[tokio::test]
    async fn test_update_rewrites_links() {
        let (service, _, _, mira) = setup().await;

        let record = service
            .create_record(&mira, create("@char:1`A` @npc:2`B`"))
            .await
            .unwrap();
        service
            .update_record(&mira, update(record.id, "@char:1`A` @location:5`C`"))
            .await
            .unwrap();

        let links = service.record_links(&mira, record.id).await.unwrap();
        assert_eq!(links, LinkSet::from_text("@char:1`A` @location:5`C`"));
    }

    #[tokio::test]
    async fn test_forbidden_update_changes_nothing() {
        let (service, repo, gm, mira) = setup().await;

        let record = service
            .create_record(&gm, create("@npc:2`Spy`"))
            .await
            .unwrap();

        let err = service
            .update_record(&mira, update(record.id, "@char:9`Nope`"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let stored = repo.get_record(record.id).await.unwrap();
        assert_eq!(stored.text, "@npc:2`Spy`");
        let links = service.record_links(&gm, record.id).await.unwrap();
        assert_eq!(links, LinkSet::from_text("@npc:2`Spy`"));
    }

    #[tokio::test]
    async fn test_failed_link_insert_keeps_old_text_and_links() {
        let (service, repo, _, mira) = setup().await;

        let record = service
            .create_record(&mira, create("@char:1`Aria` at camp"))
            .await
            .unwrap();

        sqlx::query(
            "CREATE TRIGGER reject_npc_links BEFORE INSERT ON records_npcs
             BEGIN SELECT RAISE(ABORT, 'npc links unavailable'); END",
        )
        .execute(repo.pool())
        .await
        .unwrap();

        let err = service
            .update_record(&mira, update(record.id, "@npc:2`Hob` at the mill"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        let stored = repo.get_record(record.id).await.unwrap();
        assert_eq!(stored.text, "@char:1`Aria` at camp");
        let links = service.record_links(&mira, record.id).await.unwrap();
        assert_eq!(links, LinkSet::from_text("@char:1`Aria` at camp"));
    }

    #[tokio::test]
    async fn test_gm_and_allow_all() {
        let (service, repo, gm, mira) = setup().await;

        let mine = service.create_record(&mira, create("mine")).await.unwrap();
        service
            .update_record(&gm, update(mine.id, "edited by gm"))
            .await
            .unwrap();

        let gms = service.create_record(&gm, create("gm notes")).await.unwrap();
        assert!(service.delete_record(&mira, gms.id).await.is_err());

        repo.update_game_settings(gm.current_game_id.unwrap(), true)
            .await
            .unwrap();
        service.delete_record(&mira, gms.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_hidden_records_filtered() {
        let (service, _, gm, mira) = setup().await;

        service.create_record(&gm, create("public")).await.unwrap();
        service
            .create_record(
                &gm,
                CreateRecordRequest {
                    hidden: true,
                    ..create("gm only")
                },
            )
            .await
            .unwrap();

        assert_eq!(service.records_for_player(&gm).await.unwrap().len(), 2);

        let visible = service.records_for_player(&mira).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].text, "public");
    }

    #[tokio::test]
    async fn test_deleted_records_not_listed() {
        let (service, _, _, mira) = setup().await;

        let record = service.create_record(&mira, create("gone")).await.unwrap();
        service.delete_record(&mira, record.id).await.unwrap();

        let view = service.game_records(&mira).await.unwrap();
        assert!(view.records.is_empty());
        assert_eq!(view.players.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let (service, _, _, mira) = setup().await;
        let err = service.create_record(&mira, create("  ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_quest_rejected() {
        let (service, _, _, mira) = setup().await;
        let err = service
            .create_record(
                &mira,
                CreateRecordRequest {
                    quest_id: Some(99),
                    ..create("quest note")
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(service.records_for_player(&mira).await.unwrap().is_empty());
    }
}
