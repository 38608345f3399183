//! Records and their mention link tables

use super::{Repository, LIVE};
use crate::database::models::{EntityKind, Record};
use crate::domain::LinkSet;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

/// Column values of a record insert or update
#[derive(Debug, Clone)]
pub struct RecordFields<'a> {
    pub text: &'a str,
    pub hidden_by: i64,
    pub quest_id: Option<i64>,
}

impl Repository {
    pub async fn insert_record(
        &self,
        conn: &mut SqliteConnection,
        game_id: i64,
        player_id: i64,
        fields: RecordFields<'_>,
        now: DateTime<Utc>,
    ) -> Result<Record> {
        let record = sqlx::query_as::<_, Record>(
            r#"
            INSERT INTO records (game_id, player_id, text, hidden_by, quest_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(game_id)
        .bind(player_id)
        .bind(fields.text)
        .bind(fields.hidden_by)
        .bind(fields.quest_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        tracing::debug!("Created record: {}", record.id);
        Ok(record)
    }

    pub async fn update_record_row(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        fields: RecordFields<'_>,
        now: DateTime<Utc>,
    ) -> Result<Record> {
        let sql = format!(
            r#"
            UPDATE records SET text = ?, hidden_by = ?, quest_id = ?, updated_at = ?
            WHERE id = ? AND {}
            RETURNING *
            "#,
            LIVE
        );
        let record = sqlx::query_as::<_, Record>(&sql)
            .bind(fields.text)
            .bind(fields.hidden_by)
            .bind(fields.quest_id)
            .bind(now)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::not_found("record", id))?;

        tracing::debug!("Updated record: {}", id);
        Ok(record)
    }

    /// Live record by id
    pub async fn get_record(&self, id: i64) -> Result<Record> {
        let sql = format!("SELECT * FROM records WHERE id = ? AND {}", LIVE);
        sqlx::query_as::<_, Record>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("record", id))
    }

    /// Soft delete; link rows are left in place
    pub async fn soft_delete_record(&self, id: i64, now: DateTime<Utc>) -> Result<()> {
        let sql = format!("UPDATE records SET deleted_at = ? WHERE id = ? AND {}", LIVE);
        let rows = sqlx::query(&sql)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("record", id));
        }

        tracing::debug!("Soft deleted record: {}", id);
        Ok(())
    }

    pub async fn list_game_records(&self, game_id: i64) -> Result<Vec<Record>> {
        let sql = format!(
            "SELECT * FROM records WHERE game_id = ? AND {} ORDER BY id",
            LIVE
        );
        let records = sqlx::query_as::<_, Record>(&sql)
            .bind(game_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Live records whose text mentions the given entity
    pub async fn records_mentioning(
        &self,
        kind: EntityKind,
        entity_id: i64,
        game_id: i64,
    ) -> Result<Vec<Record>> {
        let sql = format!(
            r#"
            SELECT r.* FROM records r
            JOIN {table} l ON l.record_id = r.id
            WHERE l.{column} = ? AND r.game_id = ? AND r.{live}
            ORDER BY r.id
            "#,
            table = kind.link_table(),
            column = kind.link_column(),
            live = LIVE
        );
        let records = sqlx::query_as::<_, Record>(&sql)
            .bind(entity_id)
            .bind(game_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    pub async fn records_for_quest(&self, quest_id: i64) -> Result<Vec<Record>> {
        let sql = format!(
            "SELECT * FROM records WHERE quest_id = ? AND {} ORDER BY id",
            LIVE
        );
        let records = sqlx::query_as::<_, Record>(&sql)
            .bind(quest_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Stored links of a record, per kind
    pub async fn list_links(&self, conn: &mut SqliteConnection, record_id: i64) -> Result<LinkSet> {
        let mut links = LinkSet::new();

        for kind in EntityKind::ALL {
            let sql = format!(
                "SELECT {} FROM {} WHERE record_id = ?",
                kind.link_column(),
                kind.link_table()
            );
            let ids: Vec<i64> = sqlx::query_scalar(&sql)
                .bind(record_id)
                .fetch_all(&mut *conn)
                .await?;

            for id in ids {
                links.insert(kind, id);
            }
        }

        Ok(links)
    }

    pub async fn insert_links(
        &self,
        conn: &mut SqliteConnection,
        record_id: i64,
        links: &LinkSet,
    ) -> Result<()> {
        for (kind, entity_id) in links.iter() {
            let sql = format!(
                "INSERT OR IGNORE INTO {} (record_id, {}) VALUES (?, ?)",
                kind.link_table(),
                kind.link_column()
            );
            sqlx::query(&sql)
                .bind(record_id)
                .bind(entity_id)
                .execute(&mut *conn)
                .await?;
        }

        tracing::debug!("Inserted {} links for record {}", links.len(), record_id);
        Ok(())
    }

    /// Remove every link of a record; returns the number of rows removed
    pub async fn delete_links(&self, conn: &mut SqliteConnection, record_id: i64) -> Result<u64> {
        let mut removed = 0;

        for kind in EntityKind::ALL {
            let sql = format!("DELETE FROM {} WHERE record_id = ?", kind.link_table());
            removed += sqlx::query(&sql)
                .bind(record_id)
                .execute(&mut *conn)
                .await?
                .rows_affected();
        }

        Ok(removed)
    }
}
