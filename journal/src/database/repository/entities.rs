//! Chars, NPCs and locations
//!
//! The three tables share their columns, so every query here is written
//! once and pointed at a table through [`GameEntity::KIND`]. Locations add
//! `parent_id`.

use super::{Repository, LIVE};
use crate::database::models::{EntityKind, GameEntity, Location, Suggestion};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;
use std::collections::HashMap;

/// Column values of an entity insert or update
#[derive(Debug, Clone, Default)]
pub struct EntityFields {
    pub name: String,
    pub title: String,
    pub description: String,
    pub hidden_by: i64,
    /// Ignored for anything but locations
    pub parent_id: Option<i64>,
}

impl Repository {
    pub async fn insert_entity<T>(
        &self,
        game_id: i64,
        created_by: i64,
        fields: &EntityFields,
        now: DateTime<Utc>,
    ) -> Result<T>
    where
        T: GameEntity + for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let kind = T::KIND;
        let sql = format!(
            r#"
            INSERT INTO {} (game_id, name, title, description, hidden_by, created_by, created_at, updated_at{})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?{})
            RETURNING *
            "#,
            kind.table(),
            if kind == EntityKind::Location { ", parent_id" } else { "" },
            if kind == EntityKind::Location { ", ?" } else { "" },
        );

        let mut query = sqlx::query_as::<_, T>(&sql)
            .bind(game_id)
            .bind(&fields.name)
            .bind(&fields.title)
            .bind(&fields.description)
            .bind(fields.hidden_by)
            .bind(created_by)
            .bind(now)
            .bind(now);
        if kind == EntityKind::Location {
            query = query.bind(fields.parent_id);
        }

        let entity = query.fetch_one(&self.pool).await?;

        tracing::debug!("Created {}: {}", kind, entity.id());
        Ok(entity)
    }

    pub async fn update_entity<T>(
        &self,
        id: i64,
        fields: &EntityFields,
        now: DateTime<Utc>,
    ) -> Result<T>
    where
        T: GameEntity + for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let kind = T::KIND;
        let sql = format!(
            r#"
            UPDATE {} SET name = ?, title = ?, description = ?, hidden_by = ?, updated_at = ?{}
            WHERE id = ? AND {}
            RETURNING *
            "#,
            kind.table(),
            if kind == EntityKind::Location { ", parent_id = ?" } else { "" },
            LIVE
        );

        let mut query = sqlx::query_as::<_, T>(&sql)
            .bind(&fields.name)
            .bind(&fields.title)
            .bind(&fields.description)
            .bind(fields.hidden_by)
            .bind(now);
        if kind == EntityKind::Location {
            query = query.bind(fields.parent_id);
        }

        let entity = query
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(kind.as_str(), id))?;

        tracing::debug!("Updated {}: {}", kind, id);
        Ok(entity)
    }

    /// Live entity by id
    pub async fn get_entity<T>(&self, id: i64) -> Result<T>
    where
        T: GameEntity + for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let kind = T::KIND;
        let sql = format!("SELECT * FROM {} WHERE id = ? AND {}", kind.table(), LIVE);
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(kind.as_str(), id))
    }

    pub async fn list_entities<T>(&self, game_id: i64) -> Result<Vec<T>>
    where
        T: GameEntity + for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let sql = format!(
            "SELECT * FROM {} WHERE game_id = ? AND {} ORDER BY id",
            T::KIND.table(),
            LIVE
        );
        let entities = sqlx::query_as::<_, T>(&sql)
            .bind(game_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(entities)
    }

    pub async fn location_children(&self, game_id: i64, parent_id: i64) -> Result<Vec<Location>> {
        let sql = format!(
            "SELECT * FROM locations WHERE game_id = ? AND parent_id = ? AND {} ORDER BY id",
            LIVE
        );
        let children = sqlx::query_as::<_, Location>(&sql)
            .bind(game_id)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(children)
    }

    /// `id -> parent_id` for every live location of a game
    pub async fn location_parents(&self, game_id: i64) -> Result<HashMap<i64, Option<i64>>> {
        let sql = format!(
            "SELECT id, parent_id FROM locations WHERE game_id = ? AND {}",
            LIVE
        );
        let rows: Vec<(i64, Option<i64>)> = sqlx::query_as(&sql)
            .bind(game_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().collect())
    }

    /// Mention autocomplete over live chars, NPCs and locations.
    ///
    /// Entities hidden from `player_id` are included with `hidden = true`.
    pub async fn suggestions(&self, game_id: i64, player_id: i64) -> Result<Vec<Suggestion>> {
        let select = |kind: EntityKind| {
            format!(
                r#"
                SELECT id, '{kind}:' || id AS sid, '{kind}' AS kind, name,
                    CASE WHEN hidden_by = 0 OR hidden_by = ? THEN 0 ELSE 1 END AS hidden
                FROM {table}
                WHERE game_id = ? AND {live}
                "#,
                kind = kind.as_str(),
                table = kind.table(),
                live = LIVE
            )
        };

        let sql = format!(
            "{} UNION ALL {} UNION ALL {} ORDER BY kind, id",
            select(EntityKind::Char),
            select(EntityKind::Npc),
            select(EntityKind::Location)
        );

        let mut query = sqlx::query_as::<_, Suggestion>(&sql);
        for _ in EntityKind::ALL {
            query = query.bind(player_id).bind(game_id);
        }

        let suggestions = query.fetch_all(&self.pool).await?;
        Ok(suggestions)
    }
}
