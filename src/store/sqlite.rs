//! SQLite-backed [`RelayStore`].
//!
//! The schema migration is applied inline via `include_str!` on open.

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use super::{
    Channel, ChannelId, ChannelRef, EdgeChange, Filter, FilterMode, NewFilter, PendingChange,
    RelayStore, StoreError,
};
use crate::graph::ChannelGraph;

const SCHEMA_SQL: &str = include_str!("../../migrations/001_relay_schema.sql");

/// Relay graph and filter rules stored in SQLite.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Raw row from the `filters` table.
type FilterRow = (String, String, Option<String>, String);

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migration fails.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .pragma("trusted_schema", "OFF")
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open relay db at {}", path.display()))?;

        Self::from_pool(pool)
            .await
            .context("failed to apply relay schema migration")
    }

    /// Wrap an existing pool, applying the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the migration fails.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the underlying SQLite pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn channel_from_row((id, name, url): (String, String, String)) -> Channel {
    Channel {
        id: ChannelId::from(id),
        name,
        url,
    }
}

fn filter_from_row((id, condition, replacement, mode): FilterRow) -> Result<Filter, StoreError> {
    let mode = FilterMode::parse(&mode).ok_or(StoreError::InvalidEnum {
        field: "mode",
        value: mode,
    })?;
    Ok(Filter {
        id,
        condition,
        replacement,
        mode,
    })
}

#[async_trait]
impl RelayStore for SqliteStore {
    async fn find_channel(&self, reference: &ChannelRef) -> Result<Option<Channel>, StoreError> {
        let sql = match reference {
            ChannelRef::Name(_) => "SELECT id, name, url FROM channels WHERE name = ?1",
            ChannelRef::Url(_) => "SELECT id, name, url FROM channels WHERE url = ?1",
        };
        let row: Option<(String, String, String)> = sqlx::query_as(sql)
            .bind(reference.value())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(channel_from_row))
    }

    async fn find_conflicting_channel(
        &self,
        name: &str,
        url: &str,
    ) -> Result<Option<Channel>, StoreError> {
        let row: Option<(String, String, String)> = sqlx::query_as(
            "SELECT id, name, url FROM channels WHERE name = ?1 OR url = ?2 LIMIT 1",
        )
        .bind(name)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(channel_from_row))
    }

    async fn list_channels(&self) -> Result<Vec<Channel>, StoreError> {
        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT id, name, url FROM channels ORDER BY rowid ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(channel_from_row).collect())
    }

    async fn insert_channel(&self, name: &str, url: &str) -> Result<Channel, StoreError> {
        let channel = Channel {
            id: ChannelId::random(),
            name: name.to_owned(),
            url: url.to_owned(),
        };
        sqlx::query("INSERT INTO channels (id, name, url, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(channel.id.as_str())
            .bind(&channel.name)
            .bind(&channel.url)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        debug!(id = %channel.id, name = %channel.name, "channel inserted");
        Ok(channel)
    }

    async fn delete_channel(&self, id: &ChannelId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let edges = sqlx::query("DELETE FROM channel_edges WHERE input_id = ?1 OR output_id = ?1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM channels WHERE id = ?1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        debug!(id = %id, edges = edges.rows_affected(), "channel deleted");
        Ok(())
    }

    async fn load_graph(&self) -> Result<ChannelGraph, StoreError> {
        let channels = self.list_channels().await?;
        let edges: Vec<(String, String)> =
            sqlx::query_as("SELECT input_id, output_id FROM channel_edges ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;
        let edges = edges
            .into_iter()
            .map(|(input, output)| (ChannelId::from(input), ChannelId::from(output)));
        Ok(ChannelGraph::new(channels, edges))
    }

    async fn stage_edge(&self, change: EdgeChange) -> Result<Box<dyn PendingChange>, StoreError> {
        let mut tx = self.pool.begin().await?;
        match &change {
            EdgeChange::Insert { input, output } => {
                sqlx::query("INSERT INTO channel_edges (input_id, output_id) VALUES (?1, ?2)")
                    .bind(input.as_str())
                    .bind(output.as_str())
                    .execute(&mut *tx)
                    .await?;
            }
            EdgeChange::Delete { input, output } => {
                sqlx::query("DELETE FROM channel_edges WHERE input_id = ?1 AND output_id = ?2")
                    .bind(input.as_str())
                    .bind(output.as_str())
                    .execute(&mut *tx)
                    .await?;
            }
        }
        debug!(?change, "edge change staged");
        Ok(Box::new(SqlitePendingChange { tx }))
    }

    async fn list_filters(&self) -> Result<Vec<Filter>, StoreError> {
        let rows: Vec<FilterRow> =
            sqlx::query_as("SELECT id, condition, replacement, mode FROM filters ORDER BY seq ASC")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(filter_from_row).collect()
    }

    async fn find_filter_by_condition(
        &self,
        condition: &str,
    ) -> Result<Option<Filter>, StoreError> {
        let row: Option<FilterRow> = sqlx::query_as(
            "SELECT id, condition, replacement, mode FROM filters WHERE condition = ?1",
        )
        .bind(condition)
        .fetch_optional(&self.pool)
        .await?;
        row.map(filter_from_row).transpose()
    }

    async fn find_filter_by_replacement(
        &self,
        mode: FilterMode,
        replacement: &str,
    ) -> Result<Option<Filter>, StoreError> {
        let row: Option<FilterRow> = sqlx::query_as(
            "SELECT id, condition, replacement, mode FROM filters
             WHERE mode = ?1 AND replacement = ?2
             ORDER BY seq ASC
             LIMIT 1",
        )
        .bind(mode.as_str())
        .bind(replacement)
        .fetch_optional(&self.pool)
        .await?;
        row.map(filter_from_row).transpose()
    }

    async fn insert_filter(&self, filter: NewFilter) -> Result<Filter, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO filters (id, condition, replacement, mode, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&id)
        .bind(&filter.condition)
        .bind(&filter.replacement)
        .bind(filter.mode.as_str())
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(Filter {
            id,
            condition: filter.condition,
            replacement: filter.replacement,
            mode: filter.mode,
        })
    }

    async fn delete_filter(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM filters WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// An open SQLite transaction holding one staged edge change.
struct SqlitePendingChange {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl PendingChange for SqlitePendingChange {
    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
