//! Chars, NPCs and locations
//!
//! One generic service for all three kinds. Reads are filtered through
//! the visibility rule; entities hidden from the actor behave as missing.

use super::context::{current_context, validate_name};
use crate::database::{
    CreateEntityRequest, EntityFields, EntityKind, GameContext, GameEntity, Location, Player,
    Record, Repository, Suggestion, UpdateEntityRequest,
};
use crate::domain::{ensure_same_game, ensure_valid_parent, filter_visible, hidden_by_for, Hideable};
use crate::error::{AppError, Result};
use chrono::Utc;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;

/// Row types the service works with
pub trait EntityRow:
    GameEntity + Hideable + for<'r> FromRow<'r, SqliteRow> + Send + Unpin + Serialize
{
}

impl<T> EntityRow for T where
    T: GameEntity + Hideable + for<'r> FromRow<'r, SqliteRow> + Send + Unpin + Serialize
{
}

/// An entity with the records that mention it
#[derive(Debug, Clone, Serialize)]
pub struct EntityPage<T> {
    pub entity: T,
    pub records: Vec<Record>,
}

#[derive(Clone)]
pub struct EntitiesService {
    repo: Repository,
}

impl EntitiesService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Load a live entity of the current game that the actor can see
    async fn load_visible<T: EntityRow>(&self, actor: &Player, ctx: &GameContext, id: i64) -> Result<T> {
        let entity: T = self.repo.get_entity(id).await?;
        ensure_same_game(entity.game_id(), ctx, T::KIND.as_str(), id)?;

        if !entity.is_visible_to(actor.id) {
            return Err(AppError::not_found(T::KIND.as_str(), id));
        }
        Ok(entity)
    }

    /// Only locations keep a parent, and it must not create a loop
    async fn checked_parent(
        &self,
        kind: EntityKind,
        ctx: &GameContext,
        id: Option<i64>,
        parent_id: Option<i64>,
    ) -> Result<Option<i64>> {
        if kind != EntityKind::Location {
            return Ok(None);
        }
        let Some(parent_id) = parent_id else {
            return Ok(None);
        };

        let parents = self.repo.location_parents(ctx.game.id).await?;
        ensure_valid_parent(&parents, id, parent_id, kind.as_str())?;
        Ok(Some(parent_id))
    }

    pub async fn create<T: EntityRow>(&self, actor: &Player, req: CreateEntityRequest) -> Result<T> {
        let kind = T::KIND;
        validate_name(&req.name, kind.as_str())?;
        let ctx = current_context(&self.repo, actor).await?;
        let parent_id = self.checked_parent(kind, &ctx, None, req.parent_id).await?;

        tracing::info!("Creating {} {} in game {}", kind, req.name, ctx.game.id);

        let fields = EntityFields {
            name: req.name,
            title: req.title,
            description: req.description,
            hidden_by: hidden_by_for(req.hidden, actor.id),
            parent_id,
        };
        let entity: T = self
            .repo
            .insert_entity(ctx.game.id, actor.id, &fields, Utc::now())
            .await?;

        tracing::info!("{} created successfully: {} ({})", kind, entity.id(), entity.name());

        Ok(entity)
    }

    pub async fn update<T: EntityRow>(&self, actor: &Player, req: UpdateEntityRequest) -> Result<T> {
        let kind = T::KIND;
        validate_name(&req.name, kind.as_str())?;
        let ctx = current_context(&self.repo, actor).await?;
        self.load_visible::<T>(actor, &ctx, req.id).await?;
        let parent_id = self.checked_parent(kind, &ctx, Some(req.id), req.parent_id).await?;

        tracing::debug!("Updating {}: {}", kind, req.id);

        let fields = EntityFields {
            name: req.name,
            title: req.title,
            description: req.description,
            hidden_by: hidden_by_for(req.hidden, actor.id),
            parent_id,
        };
        let entity: T = self.repo.update_entity(req.id, &fields, Utc::now()).await?;

        tracing::debug!("{} updated successfully: {} ({})", kind, entity.id(), entity.name());

        Ok(entity)
    }

    /// Visible, live entities of the current game
    pub async fn list<T: EntityRow>(&self, actor: &Player) -> Result<Vec<T>> {
        let ctx = current_context(&self.repo, actor).await?;
        let entities: Vec<T> = self.repo.list_entities(ctx.game.id).await?;
        Ok(filter_visible(entities, actor.id))
    }

    /// The entity together with the visible records that mention it
    pub async fn get<T: EntityRow>(&self, actor: &Player, id: i64) -> Result<EntityPage<T>> {
        let ctx = current_context(&self.repo, actor).await?;
        let entity: T = self.load_visible(actor, &ctx, id).await?;

        let records = self
            .repo
            .records_mentioning(T::KIND, id, ctx.game.id)
            .await?;

        Ok(EntityPage {
            entity,
            records: filter_visible(records, actor.id),
        })
    }

    /// Visible direct children of a location
    pub async fn location_children(&self, actor: &Player, id: i64) -> Result<Vec<Location>> {
        let ctx = current_context(&self.repo, actor).await?;
        self.load_visible::<Location>(actor, &ctx, id).await?;

        let children = self.repo.location_children(ctx.game.id, id).await?;
        Ok(filter_visible(children, actor.id))
    }

    /// Autocomplete entries for mentions in the current game
    pub async fn suggestions(&self, actor: &Player) -> Result<Vec<Suggestion>> {
        let ctx = current_context(&self.repo, actor).await?;
        self.repo.suggestions(ctx.game.id, actor.id).await
    }
}
