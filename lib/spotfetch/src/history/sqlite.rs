use async_trait::async_trait;
use shared::{history::HistoryEntry, metadata::EntityType};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use tracing::{debug, info};

use crate::{error::HistoryError, traits::HistoryStore};

/// Cap on stored fetches before the oldest are evicted.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: String,
    url: String,
    entity_type: String,
    display_name: String,
    summary_info: String,
    thumbnail_url: String,
    serialized_payload: String,
    timestamp_secs: i64,
}

impl From<HistoryRow> for HistoryEntry {
    fn from(row: HistoryRow) -> Self {
        Self {
            id: row.id,
            url: row.url,
            entity_type: EntityType::from_str(&row.entity_type).unwrap_or(EntityType::Unknown),
            display_name: row.display_name,
            summary_info: row.summary_info,
            thumbnail_url: row.thumbnail_url,
            serialized_payload: row.serialized_payload,
            timestamp_secs: row.timestamp_secs,
        }
    }
}

/// Fetch history kept in a sqlite database.
///
/// Only the most recent fetch of a given URL and entity type is kept. Once
/// the table reaches `max_entries`, the oldest twentieth is evicted before
/// the next insert.
#[derive(Debug, Clone)]
pub struct SqliteHistoryStore {
    pool: SqlitePool,
    max_entries: usize,
}

impl SqliteHistoryStore {
    /// Opens (creating if missing) the database at `database_url` and runs
    /// migrations.
    pub async fn connect(database_url: &str, max_entries: usize) -> Result<Self, HistoryError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        info!("Opened fetch history database at {}", database_url);
        Self::from_pool(pool, max_entries).await
    }

    pub async fn from_pool(pool: SqlitePool, max_entries: usize) -> Result<Self, HistoryError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self {
            pool,
            max_entries: max_entries.max(1),
        })
    }

    /// All entries, newest first.
    pub async fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            "SELECT id, url, entity_type, display_name, summary_info, thumbnail_url, \
             serialized_payload, timestamp_secs FROM fetch_history \
             ORDER BY timestamp_secs DESC, seq DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(HistoryEntry::from).collect())
    }

    pub async fn get(&self, id: &str) -> Result<Option<HistoryEntry>, HistoryError> {
        let row = sqlx::query_as::<_, HistoryRow>(
            "SELECT id, url, entity_type, display_name, summary_info, thumbnail_url, \
             serialized_payload, timestamp_secs FROM fetch_history WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(HistoryEntry::from))
    }

    pub async fn delete(&self, id: &str) -> Result<(), HistoryError> {
        sqlx::query("DELETE FROM fetch_history WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), HistoryError> {
        sqlx::query("DELETE FROM fetch_history")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn clear_by_type(&self, entity_type: EntityType) -> Result<(), HistoryError> {
        sqlx::query("DELETE FROM fetch_history WHERE entity_type = ?")
            .bind(entity_type.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        let mut tx = self.pool.begin().await?;

        if !entry.url.is_empty() {
            sqlx::query("DELETE FROM fetch_history WHERE url = ? AND entity_type = ?")
                .bind(&entry.url)
                .bind(entry.entity_type.as_str())
                .execute(&mut *tx)
                .await?;
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM fetch_history")
            .fetch_one(&mut *tx)
            .await?;
        if count as usize >= self.max_entries {
            let evict = (self.max_entries / 20).max(1) as i64;
            debug!("History full ({} entries), evicting {} oldest", count, evict);
            sqlx::query(
                "DELETE FROM fetch_history WHERE seq IN \
                 (SELECT seq FROM fetch_history ORDER BY seq ASC LIMIT ?)",
            )
            .bind(evict)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "INSERT INTO fetch_history \
             (id, url, entity_type, display_name, summary_info, thumbnail_url, serialized_payload, timestamp_secs) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.url)
        .bind(entry.entity_type.as_str())
        .bind(&entry.display_name)
        .bind(&entry.summary_info)
        .bind(&entry.thumbnail_url)
        .bind(&entry.serialized_payload)
        .bind(entry.timestamp_secs)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store(max_entries: usize) -> SqliteHistoryStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteHistoryStore::from_pool(pool, max_entries).await.unwrap()
    }

    fn entry(url: &str, entity_type: EntityType, timestamp_secs: i64) -> HistoryEntry {
        HistoryEntry {
            timestamp_secs,
            ..HistoryEntry::new(url, entity_type, "name", "info", "", "{}")
        }
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let store = store(DEFAULT_MAX_ENTRIES).await;
        store.append(entry("a", EntityType::Track, 10)).await.unwrap();
        store.append(entry("b", EntityType::Album, 30)).await.unwrap();
        store.append(entry("c", EntityType::Playlist, 20)).await.unwrap();

        let urls: Vec<String> = store.list().await.unwrap().into_iter().map(|e| e.url).collect();
        assert_eq!(urls, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn refetching_a_url_replaces_its_entry() {
        let store = store(DEFAULT_MAX_ENTRIES).await;
        store.append(entry("a", EntityType::Album, 1)).await.unwrap();
        let newer = entry("a", EntityType::Album, 2);
        store.append(newer.clone()).await.unwrap();
        // same url, different type is a separate entry
        store.append(entry("a", EntityType::Artist, 3)).await.unwrap();

        let entries = store.list().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(store.get(&newer.id).await.unwrap(), Some(newer));
    }

    #[tokio::test]
    async fn evicts_oldest_when_full() {
        let store = store(20).await;
        for i in 0..20 {
            store
                .append(entry(&format!("u{i}"), EntityType::Track, i))
                .await
                .unwrap();
        }
        store.append(entry("u20", EntityType::Track, 20)).await.unwrap();

        let entries = store.list().await.unwrap();
        assert_eq!(entries.len(), 20);
        assert!(entries.iter().all(|e| e.url != "u0"));
        assert_eq!(entries[0].url, "u20");
    }

    #[tokio::test]
    async fn delete_and_clear() {
        let store = store(DEFAULT_MAX_ENTRIES).await;
        let first = entry("a", EntityType::Track, 1);
        store.append(first.clone()).await.unwrap();
        store.append(entry("b", EntityType::Album, 2)).await.unwrap();
        store.append(entry("c", EntityType::Album, 3)).await.unwrap();

        store.delete(&first.id).await.unwrap();
        assert!(store.get(&first.id).await.unwrap().is_none());

        store.clear_by_type(EntityType::Album).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());

        store.append(entry("d", EntityType::Artist, 4)).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }
}
