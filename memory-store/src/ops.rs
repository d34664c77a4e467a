//! `Store` trait implementation: row<->`Memory` mapping and CRUD.

use crate::LibsqlStore;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use memory_core::error::{Error, Result};
use memory_core::store::{NeighbourRow, Store, StoreStats};
use memory_core::types::{Memory, PatternType, Status};
use memory_core::vector;
use std::collections::HashMap;

fn row_to_memory(row: &libsql::Row) -> Result<Memory> {
    let id: String = row.get(0).map_err(|e| Error::StoreCorruption(e.to_string()))?;
    let title: String = row.get(1).map_err(|e| Error::StoreCorruption(e.to_string()))?;
    let detail: String = row.get(2).map_err(|e| Error::StoreCorruption(e.to_string()))?;
    let domain: String = row.get(3).map_err(|e| Error::StoreCorruption(e.to_string()))?;
    let pattern_type: Option<String> = row.get(4).ok();
    let source: String = row.get(5).map_err(|e| Error::StoreCorruption(e.to_string()))?;
    let source_section: String = row.get(6).unwrap_or_default();
    let created_at: i64 = row.get(7).map_err(|e| Error::StoreCorruption(e.to_string()))?;
    let last_retrieved_at: i64 = row.get(8).map_err(|e| Error::StoreCorruption(e.to_string()))?;
    let retrieval_count: i64 = row.get(9).map_err(|e| Error::StoreCorruption(e.to_string()))?;
    let activation: f64 = row.get(10).map_err(|e| Error::StoreCorruption(e.to_string()))?;
    let content_hash: String = row.get(11).map_err(|e| Error::StoreCorruption(e.to_string()))?;
    let embedding_blob: Option<Vec<u8>> = row.get(12).ok();
    let status: Option<String> = row.get(13).ok();
    let superseded_by: Option<String> = row.get(14).ok();
    let corrects: Option<String> = row.get(15).ok();

    let embedding = embedding_blob
        .filter(|b| !b.is_empty())
        .and_then(|blob| vector::deserialize(&blob, blob.len() / 4));

    Ok(Memory {
        id,
        title,
        detail,
        domain,
        pattern_type: pattern_type.and_then(|s| PatternType::parse(&s)),
        source,
        source_section,
        created: timestamp_to_utc(created_at),
        last_retrieved: timestamp_to_utc(last_retrieved_at),
        retrieval_count: retrieval_count.max(0) as u64,
        activation,
        content_hash,
        embedding,
        status: Status::parse(status.as_deref()),
        superseded_by,
        corrects,
        tags: Vec::new(),
    })
}

fn timestamp_to_utc(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}

const SELECT_COLUMNS: &str = "id, title, detail, domain, pattern_type, source, source_section, \
    created_at, last_retrieved_at, retrieval_count, activation, content_hash, embedding, status, \
    superseded_by, corrects";

impl LibsqlStore {
    async fn fetch_tags(&self, conn: &libsql::Connection, ids: &[String]) -> Result<HashMap<String, Vec<String>>> {
        let mut out: HashMap<String, Vec<String>> = HashMap::new();
        if ids.is_empty() {
            return Ok(out);
        }
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!("SELECT memory_id, tag FROM memory_tags WHERE memory_id IN ({placeholders})");
        let mut rows = conn
            .query(&sql, libsql::params_from_iter(ids.iter().cloned()))
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        while let Some(row) = rows.next().await.map_err(|e| Error::StoreUnavailable(e.to_string()))? {
            let memory_id: String = row.get(0).map_err(|e| Error::StoreCorruption(e.to_string()))?;
            let tag: String = row.get(1).map_err(|e| Error::StoreCorruption(e.to_string()))?;
            out.entry(memory_id).or_default().push(tag);
        }
        Ok(out)
    }

    async fn attach_tags(&self, conn: &libsql::Connection, mut memories: Vec<Memory>) -> Result<Vec<Memory>> {
        let ids: Vec<String> = memories.iter().map(|m| m.id.clone()).collect();
        let tags = self.fetch_tags(conn, &ids).await?;
        for memory in &mut memories {
            if let Some(t) = tags.get(&memory.id) {
                memory.tags = t.clone();
            }
        }
        Ok(memories)
    }

    async fn upsert_one(&self, conn: &libsql::Connection, memory: &Memory) -> Result<()> {
        let sql = format!(
            "INSERT OR REPLACE INTO memories ({SELECT_COLUMNS}) VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)"
        );
        let embedding_blob = memory.embedding.as_deref().map(vector::serialize);
        conn.execute(
            &sql,
            libsql::params![
                memory.id.clone(),
                memory.title.clone(),
                memory.detail.clone(),
                memory.domain.clone(),
                memory.pattern_type.map(|p| p.as_str().to_string()),
                memory.source.clone(),
                memory.source_section.clone(),
                memory.created.timestamp(),
                memory.last_retrieved.timestamp(),
                memory.retrieval_count as i64,
                memory.activation,
                memory.content_hash.clone(),
                embedding_blob,
                memory.status.as_str().to_string(),
                memory.superseded_by.clone(),
                memory.corrects.clone(),
            ],
        )
        .await
        .map_err(|e| Error::StoreUnavailable(format!("upsert failed: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl Store for LibsqlStore {
    async fn migrate(&self) -> Result<()> {
        self.migrate_impl().await
    }

    async fn upsert_memory(&self, memory: &Memory) -> Result<()> {
        let conn = self.connection().await?;
        self.upsert_one(&conn, memory).await?;
        self.set_tags(memory.id.as_str(), &memory.tags).await
    }

    async fn upsert_memories_batch(&self, memories: &[Memory]) -> Result<()> {
        let conn = self.connection().await?;
        conn.execute("BEGIN", ())
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        for memory in memories {
            if let Err(e) = self.upsert_one(&conn, memory).await {
                let _ = conn.execute("ROLLBACK", ()).await;
                return Err(e);
            }
        }
        conn.execute("COMMIT", ())
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn get_memory(&self, id: &str) -> Result<Option<Memory>> {
        let conn = self.connection().await?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM memories WHERE id = ?");
        let mut rows = conn
            .query(&sql, libsql::params![id.to_string()])
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        let Some(row) = rows.next().await.map_err(|e| Error::StoreUnavailable(e.to_string()))? else {
            return Ok(None);
        };
        let memory = row_to_memory(&row)?;
        let with_tags = self.attach_tags(&conn, vec![memory]).await?;
        Ok(with_tags.into_iter().next())
    }

    async fn get_memories(&self, ids: &[String]) -> Result<Vec<Memory>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.connection().await?;
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!("SELECT {SELECT_COLUMNS} FROM memories WHERE id IN ({placeholders})");
        let mut rows = conn
            .query(&sql, libsql::params_from_iter(ids.iter().cloned()))
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        let mut by_id: HashMap<String, Memory> = HashMap::new();
        while let Some(row) = rows.next().await.map_err(|e| Error::StoreUnavailable(e.to_string()))? {
            let memory = row_to_memory(&row)?;
            by_id.insert(memory.id.clone(), memory);
        }
        let ordered: Vec<Memory> = ids.iter().filter_map(|id| by_id.remove(id)).collect();
        self.attach_tags(&conn, ordered).await
    }

    async fn scan_active_with_embedding(&self) -> Result<Vec<Memory>> {
        let conn = self.connection().await?;
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM memories WHERE status = 'active' AND embedding IS NOT NULL"
        );
        let mut rows = conn
            .query(&sql, ())
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| Error::StoreUnavailable(e.to_string()))? {
            out.push(row_to_memory(&row)?);
        }
        self.attach_tags(&conn, out).await
    }

    async fn scan_by_domain(&self, domain: &str) -> Result<Vec<Memory>> {
        let conn = self.connection().await?;
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM memories WHERE status = 'active' AND domain = ? ORDER BY activation DESC"
        );
        let mut rows = conn
            .query(&sql, libsql::params![domain.to_string()])
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| Error::StoreUnavailable(e.to_string()))? {
            out.push(row_to_memory(&row)?);
        }
        self.attach_tags(&conn, out).await
    }

    async fn top_by_activation(&self, limit: usize) -> Result<Vec<Memory>> {
        let conn = self.connection().await?;
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM memories WHERE status = 'active' ORDER BY activation DESC LIMIT ?"
        );
        let mut rows = conn
            .query(&sql, libsql::params![limit as i64])
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| Error::StoreUnavailable(e.to_string()))? {
            out.push(row_to_memory(&row)?);
        }
        self.attach_tags(&conn, out).await
    }

    async fn bump_activation(
        &self,
        ids: &[String],
        delta: f64,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let conn = self.connection().await?;
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "UPDATE memories SET activation = activation + ?, retrieval_count = retrieval_count + 1, \
             last_retrieved_at = ? WHERE id IN ({placeholders})"
        );
        let mut params: Vec<libsql::Value> = vec![delta.into(), now.timestamp().into()];
        params.extend(ids.iter().cloned().map(libsql::Value::from));
        let affected = conn
            .execute(&sql, libsql::params_from_iter(params))
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        Ok(affected)
    }

    async fn decay_all(&self, factor: f64) -> Result<u64> {
        let conn = self.connection().await?;
        let affected = conn
            .execute("UPDATE memories SET activation = activation * ?", libsql::params![factor])
            .await
            .map_err(|e| Error::StoreUnavailable(format!("decay failed: {e}")))?;
        Ok(affected)
    }

    async fn low_activation(&self, threshold: f64, limit: usize) -> Result<Vec<Memory>> {
        let conn = self.connection().await?;
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM memories WHERE activation < ? ORDER BY activation ASC LIMIT ?"
        );
        let mut rows = conn
            .query(&sql, libsql::params![threshold, limit as i64])
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| Error::StoreUnavailable(e.to_string()))? {
            out.push(row_to_memory(&row)?);
        }
        self.attach_tags(&conn, out).await
    }

    async fn deprecate(&self, old_id: &str, new_id: &str) -> Result<()> {
        let conn = self.connection().await?;
        let affected = conn
            .execute(
                "UPDATE memories SET status = 'deprecated', superseded_by = ? WHERE id = ?",
                libsql::params![new_id.to_string(), old_id.to_string()],
            )
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        if affected == 0 {
            return Err(Error::NotFound(old_id.to_string()));
        }
        Ok(())
    }

    async fn mark_correction(&self, correction_id: &str, corrected_id: &str) -> Result<()> {
        let conn = self.connection().await?;
        let affected = conn
            .execute(
                "UPDATE memories SET corrects = ? WHERE id = ?",
                libsql::params![corrected_id.to_string(), correction_id.to_string()],
            )
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        if affected == 0 {
            return Err(Error::NotFound(correction_id.to_string()));
        }
        Ok(())
    }

    async fn set_tags(&self, memory_id: &str, tags: &[String]) -> Result<()> {
        let conn = self.connection().await?;
        conn.execute(
            "DELETE FROM memory_tags WHERE memory_id = ?",
            libsql::params![memory_id.to_string()],
        )
        .await
        .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        for tag in tags {
            conn.execute(
                "INSERT OR IGNORE INTO memory_tags (memory_id, tag) VALUES (?, ?)",
                libsql::params![memory_id.to_string(), tag.clone()],
            )
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        }
        Ok(())
    }

    async fn add_cooccurrence(&self, a: &str, b: &str, delta: f64) -> Result<()> {
        self.add_cooccurrence_batch(&[(a.to_string(), b.to_string(), delta)]).await
    }

    async fn add_cooccurrence_batch(&self, pairs: &[(String, String, f64)]) -> Result<()> {
        if pairs.is_empty() {
            return Ok(());
        }
        let conn = self.connection().await?;
        conn.execute("BEGIN", ())
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        for (a, b, delta) in pairs {
            for (from, to) in [(a, b), (b, a)] {
                if let Err(e) = conn
                    .execute(
                        "INSERT INTO cooccurrence (from_id, to_id, weight) VALUES (?, ?, ?) \
                         ON CONFLICT (from_id, to_id) DO UPDATE SET weight = weight + excluded.weight",
                        libsql::params![from.clone(), to.clone(), *delta],
                    )
                    .await
                {
                    let _ = conn.execute("ROLLBACK", ()).await;
                    return Err(Error::StoreUnavailable(e.to_string()));
                }
            }
        }
        conn.execute("COMMIT", ())
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn top_neighbours(&self, id: &str, limit: usize) -> Result<Vec<NeighbourRow>> {
        let conn = self.connection().await?;
        let mut rows = conn
            .query(
                "SELECT to_id, weight FROM cooccurrence WHERE from_id = ? ORDER BY weight DESC LIMIT ?",
                libsql::params![id.to_string(), limit as i64],
            )
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| Error::StoreUnavailable(e.to_string()))? {
            let id: String = row.get(0).map_err(|e| Error::StoreCorruption(e.to_string()))?;
            let weight: f64 = row.get(1).map_err(|e| Error::StoreCorruption(e.to_string()))?;
            out.push(NeighbourRow { id, weight });
        }
        Ok(out)
    }

    async fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connection().await?;
        let mut rows = conn
            .query("SELECT value FROM meta WHERE key = ?", libsql::params![key.to_string()])
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        let Some(row) = rows.next().await.map_err(|e| Error::StoreUnavailable(e.to_string()))? else {
            return Ok(None);
        };
        let value: String = row.get(0).map_err(|e| Error::StoreCorruption(e.to_string()))?;
        Ok(Some(value))
    }

    async fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.connection().await?;
        conn.execute(
            "INSERT INTO meta (key, value) VALUES (?, ?) ON CONFLICT (key) DO UPDATE SET value = excluded.value",
            libsql::params![key.to_string(), value.to_string()],
        )
        .await
        .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let conn = self.connection().await?;

        let mut active = 0u64;
        let mut deprecated = 0u64;
        {
            let mut rows = conn
                .query("SELECT status, COUNT(*) FROM memories GROUP BY status", ())
                .await
                .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
            while let Some(row) = rows.next().await.map_err(|e| Error::StoreUnavailable(e.to_string()))? {
                let status: String = row.get(0).map_err(|e| Error::StoreCorruption(e.to_string()))?;
                let count: i64 = row.get(1).map_err(|e| Error::StoreCorruption(e.to_string()))?;
                match Status::parse(Some(status.as_str())) {
                    Status::Active => active = count.max(0) as u64,
                    Status::Deprecated => deprecated = count.max(0) as u64,
                }
            }
        }

        let mut by_domain = Vec::new();
        {
            let mut rows = conn
                .query("SELECT domain, COUNT(*) FROM memories GROUP BY domain", ())
                .await
                .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
            while let Some(row) = rows.next().await.map_err(|e| Error::StoreUnavailable(e.to_string()))? {
                let domain: String = row.get(0).map_err(|e| Error::StoreCorruption(e.to_string()))?;
                let count: i64 = row.get(1).map_err(|e| Error::StoreCorruption(e.to_string()))?;
                by_domain.push((domain, count.max(0) as u64));
            }
        }

        let mut by_pattern_type = Vec::new();
        {
            let mut rows = conn
                .query(
                    "SELECT pattern_type, COUNT(*) FROM memories WHERE pattern_type IS NOT NULL GROUP BY pattern_type",
                    (),
                )
                .await
                .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
            while let Some(row) = rows.next().await.map_err(|e| Error::StoreUnavailable(e.to_string()))? {
                let pattern_type: String = row.get(0).map_err(|e| Error::StoreCorruption(e.to_string()))?;
                let count: i64 = row.get(1).map_err(|e| Error::StoreCorruption(e.to_string()))?;
                by_pattern_type.push((pattern_type, count.max(0) as u64));
            }
        }

        let mut activations = Vec::new();
        {
            let mut rows = conn
                .query("SELECT activation FROM memories", ())
                .await
                .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
            while let Some(row) = rows.next().await.map_err(|e| Error::StoreUnavailable(e.to_string()))? {
                let activation: f64 = row.get(0).map_err(|e| Error::StoreCorruption(e.to_string()))?;
                activations.push(activation);
            }
        }
        activations.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let min = activations.first().copied().unwrap_or(0.0);
        let max = activations.last().copied().unwrap_or(0.0);
        let p50 = memory_core::activation::percentile(&activations, 0.50);
        let p95 = memory_core::activation::percentile(&activations, 0.95);

        Ok(StoreStats {
            total_active: active,
            total_deprecated: deprecated,
            by_domain,
            by_pattern_type,
            activation_min: min,
            activation_p50: p50,
            activation_p95: p95,
            activation_max: max,
        })
    }

    async fn missing_embeddings(&self, limit: usize) -> Result<Vec<Memory>> {
        let conn = self.connection().await?;
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM memories WHERE status = 'active' AND embedding IS NULL LIMIT ?"
        );
        let mut rows = conn
            .query(&sql, libsql::params![limit as i64])
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| Error::StoreUnavailable(e.to_string()))? {
            out.push(row_to_memory(&row)?);
        }
        self.attach_tags(&conn, out).await
    }
}
