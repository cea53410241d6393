//! SQLite implementation of the issue vector store.
//!
//! Embeddings are persisted as little-endian f32 BLOBs. Nearest-neighbor
//! search is exact: the namespace-scoped, non-terminal candidate rows are
//! fetched and ranked by cosine similarity in Rust. The corpus is one row
//! per tracked issue, so a full scan of the namespace stays cheap and no
//! approximate index is needed.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{IssueRecord, MergeState, SimilarIssue};
use crate::domain::ports::IssueStore;

#[derive(Clone)]
pub struct SqliteIssueStore {
    pool: SqlitePool,
}

impl SqliteIssueStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Serialize an embedding vector to bytes for storage.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize an embedding vector from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> DomainResult<Vec<f32>> {
        if bytes.len() % 4 != 0 {
            return Err(DomainError::Storage(
                "invalid embedding bytes length".to_string(),
            ));
        }
        Ok(bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect())
    }

    /// Cosine similarity between two vectors, in `[-1, 1]`.
    ///
    /// Mismatched dimensions or a zero-magnitude vector cannot rank
    /// meaningfully and yield `None`.
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
        if a.len() != b.len() {
            return None;
        }
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if mag_a == 0.0 || mag_b == 0.0 {
            return None;
        }
        Some(dot / (mag_a * mag_b))
    }
}

#[async_trait]
impl IssueStore for SqliteIssueStore {
    async fn upsert(&self, record: &IssueRecord) -> DomainResult<()> {
        let embedding_bytes = record
            .embedding
            .as_deref()
            .map(Self::embedding_to_bytes);

        sqlx::query(
            r#"INSERT INTO issues (id, repo_name, issue_number, title, body, author, embedding, merge_state, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                 repo_name = excluded.repo_name,
                 issue_number = excluded.issue_number,
                 title = excluded.title,
                 body = excluded.body,
                 author = excluded.author,
                 embedding = excluded.embedding,
                 merge_state = excluded.merge_state,
                 updated_at = excluded.updated_at"#,
        )
        .bind(record.id as i64)
        .bind(&record.repo_name)
        .bind(record.issue_number as i64)
        .bind(&record.title)
        .bind(&record.body)
        .bind(&record.author)
        .bind(embedding_bytes)
        .bind(record.merge_state.as_str())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn nearest_neighbors(
        &self,
        query: &[f32],
        namespace: &str,
        limit: usize,
    ) -> DomainResult<Vec<SimilarIssue>> {
        // An exact `owner/repo` namespace selects one repository; a bare
        // owner selects all of that owner's repositories.
        let sql = if namespace.contains('/') {
            r#"SELECT id, repo_name, issue_number, title, merge_state, embedding
               FROM issues
               WHERE repo_name = ?
                 AND embedding IS NOT NULL
                 AND merge_state NOT IN ('merged', 'rejected')"#
        } else {
            r#"SELECT id, repo_name, issue_number, title, merge_state, embedding
               FROM issues
               WHERE repo_name LIKE ?
                 AND embedding IS NOT NULL
                 AND merge_state NOT IN ('merged', 'rejected')"#
        };
        let pattern = if namespace.contains('/') {
            namespace.to_string()
        } else {
            format!("{namespace}/%")
        };

        let rows = sqlx::query(sql).bind(pattern).fetch_all(&self.pool).await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let embedding_bytes: Vec<u8> = row.get("embedding");
            let embedding = Self::bytes_to_embedding(&embedding_bytes)?;
            let Some(similarity) = Self::cosine_similarity(query, &embedding) else {
                continue;
            };

            let id: i64 = row.get("id");
            let issue_number: i64 = row.get("issue_number");
            let merge_state: String = row.get("merge_state");
            results.push(SimilarIssue {
                id: id as u64,
                repo_name: row.get("repo_name"),
                issue_number: issue_number as u64,
                title: row.get("title"),
                merge_state: MergeState::parse(&merge_state),
                similarity,
            });
        }

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);
        Ok(results)
    }

    async fn set_merge_state(
        &self,
        repo_name: &str,
        issue_number: u64,
        state: MergeState,
    ) -> DomainResult<()> {
        sqlx::query(
            "UPDATE issues SET merge_state = ?, updated_at = ? WHERE repo_name = ? AND issue_number = ?",
        )
        .bind(state.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(repo_name)
        .bind(issue_number as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn exists(&self, id: u64) -> DomainResult<bool> {
        let row = sqlx::query("SELECT 1 FROM issues WHERE id = ?")
            .bind(id as i64)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::connection::create_test_pool;

    fn record(id: u64, repo: &str, number: u64, embedding: Option<Vec<f32>>) -> IssueRecord {
        IssueRecord::new(id, repo, number, format!("issue {number}"), "body", "alice", embedding)
    }

    async fn store() -> SqliteIssueStore {
        SqliteIssueStore::new(create_test_pool().await.expect("pool"))
    }

    #[test]
    fn test_embedding_serialization_round_trip() {
        let embedding = vec![0.1, -0.2, 0.3, 0.4, 0.5];
        let bytes = SqliteIssueStore::embedding_to_bytes(&embedding);
        let restored = SqliteIssueStore::bytes_to_embedding(&bytes).unwrap();
        assert_eq!(embedding.len(), restored.len());
        for (a, b) in embedding.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((SqliteIssueStore::cosine_similarity(&a, &a).unwrap() - 1.0).abs() < 1e-6);

        let orthogonal = vec![0.0, 1.0, 0.0];
        assert!(SqliteIssueStore::cosine_similarity(&a, &orthogonal).unwrap().abs() < 1e-6);

        let opposite = vec![-1.0, 0.0, 0.0];
        assert!((SqliteIssueStore::cosine_similarity(&a, &opposite).unwrap() + 1.0).abs() < 1e-6);

        assert!(SqliteIssueStore::cosine_similarity(&a, &[1.0, 0.0]).is_none());
        assert!(SqliteIssueStore::cosine_similarity(&a, &[0.0, 0.0, 0.0]).is_none());
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_and_replaces_content() {
        let store = store().await;
        let mut rec = record(1, "acme/widgets", 10, Some(vec![1.0, 0.0]));
        store.upsert(&rec).await.unwrap();
        store.upsert(&rec).await.unwrap();

        rec.title = "updated title".to_string();
        store.upsert(&rec).await.unwrap();

        let results = store
            .nearest_neighbors(&[1.0, 0.0], "acme/widgets", 5)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "updated title");
    }

    #[tokio::test]
    async fn test_nearest_neighbors_orders_by_similarity() {
        let store = store().await;
        store.upsert(&record(1, "acme/widgets", 1, Some(vec![1.0, 0.0]))).await.unwrap();
        store.upsert(&record(2, "acme/widgets", 2, Some(vec![0.8, 0.6]))).await.unwrap();
        store.upsert(&record(3, "acme/widgets", 3, Some(vec![0.0, 1.0]))).await.unwrap();

        let results = store
            .nearest_neighbors(&[1.0, 0.0], "acme/widgets", 5)
            .await
            .unwrap();
        let numbers: Vec<u64> = results.iter().map(|r| r.issue_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(results[0].similarity > results[1].similarity);
        assert!(results[1].similarity > results[2].similarity);
    }

    #[tokio::test]
    async fn test_nearest_neighbors_excludes_terminal_states() {
        let store = store().await;
        store.upsert(&record(1, "acme/widgets", 1, Some(vec![1.0, 0.0]))).await.unwrap();
        store.upsert(&record(2, "acme/widgets", 2, Some(vec![1.0, 0.0]))).await.unwrap();
        store.upsert(&record(3, "acme/widgets", 3, Some(vec![1.0, 0.0]))).await.unwrap();

        store.set_merge_state("acme/widgets", 2, MergeState::Merged).await.unwrap();
        store.set_merge_state("acme/widgets", 3, MergeState::Rejected).await.unwrap();

        let results = store
            .nearest_neighbors(&[1.0, 0.0], "acme/widgets", 5)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].issue_number, 1);
    }

    #[tokio::test]
    async fn test_nearest_neighbors_skips_missing_embeddings() {
        let store = store().await;
        store.upsert(&record(1, "acme/widgets", 1, None)).await.unwrap();
        store.upsert(&record(2, "acme/widgets", 2, Some(vec![1.0, 0.0]))).await.unwrap();

        let results = store
            .nearest_neighbors(&[1.0, 0.0], "acme/widgets", 5)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].issue_number, 2);
    }

    #[tokio::test]
    async fn test_namespace_owner_prefix_vs_exact_repo() {
        let store = store().await;
        store.upsert(&record(1, "acme/widgets", 1, Some(vec![1.0, 0.0]))).await.unwrap();
        store.upsert(&record(2, "acme/gadgets", 2, Some(vec![1.0, 0.0]))).await.unwrap();
        store.upsert(&record(3, "other/widgets", 3, Some(vec![1.0, 0.0]))).await.unwrap();

        let owner_scoped = store.nearest_neighbors(&[1.0, 0.0], "acme", 5).await.unwrap();
        assert_eq!(owner_scoped.len(), 2);

        let repo_scoped = store
            .nearest_neighbors(&[1.0, 0.0], "acme/widgets", 5)
            .await
            .unwrap();
        assert_eq!(repo_scoped.len(), 1);
        assert_eq!(repo_scoped[0].repo_name, "acme/widgets");
    }

    #[tokio::test]
    async fn test_set_merge_state_preserves_content() {
        let store = store().await;
        store.upsert(&record(1, "acme/widgets", 1, Some(vec![1.0, 0.0]))).await.unwrap();
        store.set_merge_state("acme/widgets", 1, MergeState::Pending).await.unwrap();

        let results = store
            .nearest_neighbors(&[1.0, 0.0], "acme/widgets", 5)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "issue 1");
        assert_eq!(results[0].merge_state, MergeState::Pending);
    }

    #[tokio::test]
    async fn test_exists() {
        let store = store().await;
        assert!(!store.exists(42).await.unwrap());
        store.upsert(&record(42, "acme/widgets", 1, None)).await.unwrap();
        assert!(store.exists(42).await.unwrap());
    }
}
