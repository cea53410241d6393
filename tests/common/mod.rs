//! Shared mock adapters for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use echofinder::domain::errors::{DomainError, DomainResult};
use echofinder::domain::models::{IssueComment, IssueRecord, MergeState, SimilarIssue};
use echofinder::domain::ports::{
    CloseReason, CreatedIssue, EmbeddingProvider, GenerationError, IssueStore, IssueTracker,
    TextGenerator, TrackedIssue,
};

pub type IssueKey = (String, u64);

fn key(repo: &str, number: u64) -> IssueKey {
    (repo.to_string(), number)
}

// -- Tracker ----------------------------------------------------------------

/// In-memory issue tracker capturing every mutation for assertions.
#[derive(Default)]
pub struct MockTracker {
    pub issues: Mutex<HashMap<IssueKey, TrackedIssue>>,
    pub comments: Mutex<HashMap<IssueKey, Vec<IssueComment>>>,
    pub labels: Mutex<HashMap<IssueKey, Vec<String>>>,
    pub closed: Mutex<HashMap<IssueKey, CloseReason>>,
    /// `(repo, title, body, labels)` per created issue.
    pub created: Mutex<Vec<(String, String, String, Vec<String>)>>,
    next_number: AtomicU64,
    pub fail_create_issue: AtomicBool,
}

impl MockTracker {
    pub fn new() -> Self {
        Self {
            next_number: AtomicU64::new(100),
            ..Self::default()
        }
    }

    pub fn add_issue(&self, repo: &str, id: u64, number: u64, title: &str, body: &str, author: &str) {
        self.issues.lock().unwrap().insert(
            key(repo, number),
            TrackedIssue {
                id,
                number,
                title: title.to_string(),
                body: body.to_string(),
                author: author.to_string(),
            },
        );
    }

    /// Seed a comment as if a user (or the bot) had posted it earlier.
    pub fn seed_comment(&self, repo: &str, number: u64, author: &str, body: &str) {
        self.comments.lock().unwrap().entry(key(repo, number)).or_default().push(IssueComment {
            author: author.to_string(),
            body: body.to_string(),
        });
    }

    pub fn comments_on(&self, repo: &str, number: u64) -> Vec<IssueComment> {
        self.comments.lock().unwrap().get(&key(repo, number)).cloned().unwrap_or_default()
    }

    pub fn labels_on(&self, repo: &str, number: u64) -> Vec<String> {
        self.labels.lock().unwrap().get(&key(repo, number)).cloned().unwrap_or_default()
    }

    pub fn is_closed(&self, repo: &str, number: u64) -> Option<CloseReason> {
        self.closed.lock().unwrap().get(&key(repo, number)).copied()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }
}

#[async_trait]
impl IssueTracker for MockTracker {
    async fn get_issue(&self, repo: &str, number: u64) -> DomainResult<TrackedIssue> {
        self.issues
            .lock()
            .unwrap()
            .get(&key(repo, number))
            .cloned()
            .ok_or_else(|| DomainError::Tracker(format!("no such issue {repo}#{number}")))
    }

    async fn list_comments(&self, repo: &str, number: u64) -> DomainResult<Vec<IssueComment>> {
        Ok(self.comments_on(repo, number))
    }

    async fn create_comment(&self, repo: &str, number: u64, body: &str) -> DomainResult<()> {
        self.comments.lock().unwrap().entry(key(repo, number)).or_default().push(IssueComment {
            author: "echofinder[bot]".to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    async fn create_issue(
        &self,
        repo: &str,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> DomainResult<CreatedIssue> {
        if self.fail_create_issue.load(Ordering::SeqCst) {
            return Err(DomainError::Tracker("create_issue unavailable".to_string()));
        }
        self.created.lock().unwrap().push((
            repo.to_string(),
            title.to_string(),
            body.to_string(),
            labels.to_vec(),
        ));
        let number = self.next_number.fetch_add(1, Ordering::SeqCst);
        Ok(CreatedIssue {
            number,
            html_url: format!("https://github.com/{repo}/issues/{number}"),
        })
    }

    async fn close_issue(&self, repo: &str, number: u64, reason: CloseReason) -> DomainResult<()> {
        self.closed.lock().unwrap().insert(key(repo, number), reason);
        Ok(())
    }

    async fn add_labels(&self, repo: &str, number: u64, labels: &[String]) -> DomainResult<()> {
        self.labels
            .lock()
            .unwrap()
            .entry(key(repo, number))
            .or_default()
            .extend(labels.iter().cloned());
        Ok(())
    }

    async fn list_open_issues(&self, repo: &str) -> DomainResult<Vec<TrackedIssue>> {
        let mut issues: Vec<TrackedIssue> = self
            .issues
            .lock()
            .unwrap()
            .iter()
            .filter(|((r, _), _)| r == repo)
            .map(|(_, issue)| issue.clone())
            .collect();
        issues.sort_by_key(|i| i.number);
        Ok(issues)
    }
}

// -- Issue store ------------------------------------------------------------

/// In-memory issue store with the same search semantics as the SQLite
/// adapter: namespace scoping, terminal-state exclusion, cosine ranking.
#[derive(Default)]
pub struct InMemoryIssueStore {
    pub records: Mutex<HashMap<u64, IssueRecord>>,
}

impl InMemoryIssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge_state_of(&self, repo: &str, number: u64) -> Option<MergeState> {
        self.records
            .lock()
            .unwrap()
            .values()
            .find(|r| r.repo_name == repo && r.issue_number == number)
            .map(|r| r.merge_state)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> Option<f32> {
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

#[async_trait]
impl IssueStore for InMemoryIssueStore {
    async fn upsert(&self, record: &IssueRecord) -> DomainResult<()> {
        self.records.lock().unwrap().insert(record.id, record.clone());
        Ok(())
    }

    async fn nearest_neighbors(
        &self,
        query: &[f32],
        namespace: &str,
        limit: usize,
    ) -> DomainResult<Vec<SimilarIssue>> {
        let records = self.records.lock().unwrap();
        let mut results: Vec<SimilarIssue> = records
            .values()
            .filter(|r| {
                if namespace.contains('/') {
                    r.repo_name == namespace
                } else {
                    r.repo_name.starts_with(&format!("{namespace}/"))
                }
            })
            .filter(|r| !r.merge_state.is_terminal())
            .filter_map(|r| {
                let embedding = r.embedding.as_ref()?;
                let similarity = cosine(query, embedding)?;
                Some(SimilarIssue {
                    id: r.id,
                    repo_name: r.repo_name.clone(),
                    issue_number: r.issue_number,
                    title: r.title.clone(),
                    merge_state: r.merge_state,
                    similarity,
                })
            })
            .collect();
        results.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap());
        results.truncate(limit);
        Ok(results)
    }

    async fn set_merge_state(
        &self,
        repo_name: &str,
        issue_number: u64,
        state: MergeState,
    ) -> DomainResult<()> {
        let mut records = self.records.lock().unwrap();
        for record in records.values_mut() {
            if record.repo_name == repo_name && record.issue_number == issue_number {
                record.merge_state = state;
            }
        }
        Ok(())
    }

    async fn exists(&self, id: u64) -> DomainResult<bool> {
        Ok(self.records.lock().unwrap().contains_key(&id))
    }
}

/// Store whose nearest-neighbor answer is scripted, for exact-score
/// threshold tests.
#[derive(Default)]
pub struct ScriptedStore {
    pub neighbors: Mutex<Vec<SimilarIssue>>,
    pub upserts: Mutex<Vec<IssueRecord>>,
    pub state_changes: Mutex<Vec<(String, u64, MergeState)>>,
}

#[async_trait]
impl IssueStore for ScriptedStore {
    async fn upsert(&self, record: &IssueRecord) -> DomainResult<()> {
        self.upserts.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn nearest_neighbors(
        &self,
        _query: &[f32],
        _namespace: &str,
        limit: usize,
    ) -> DomainResult<Vec<SimilarIssue>> {
        let mut neighbors = self.neighbors.lock().unwrap().clone();
        neighbors.truncate(limit);
        Ok(neighbors)
    }

    async fn set_merge_state(
        &self,
        repo_name: &str,
        issue_number: u64,
        state: MergeState,
    ) -> DomainResult<()> {
        self.state_changes
            .lock()
            .unwrap()
            .push((repo_name.to_string(), issue_number, state));
        Ok(())
    }

    async fn exists(&self, _id: u64) -> DomainResult<bool> {
        Ok(false)
    }
}

// -- Embedding provider -----------------------------------------------------

/// Embedding provider returning a fixed vector per exact text, counting
/// calls.
pub struct MockEmbedding {
    pub vectors: Mutex<HashMap<String, Vec<f32>>>,
    pub fallback: Option<Vec<f32>>,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl MockEmbedding {
    pub fn with_fallback(fallback: Vec<f32>) -> Self {
        Self {
            vectors: Mutex::new(HashMap::new()),
            fallback: Some(fallback),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn map_text(&self, text: &str, vector: Vec<f32>) {
        self.vectors.lock().unwrap().insert(text.to_string(), vector);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedding {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn dimension(&self) -> usize {
        2
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::Provider("embedding service down".to_string()));
        }
        if let Some(vector) = self.vectors.lock().unwrap().get(text) {
            return Ok(vector.clone());
        }
        self.fallback
            .clone()
            .ok_or_else(|| DomainError::Provider("no vector for text".to_string()))
    }
}

// -- Text generator ---------------------------------------------------------

/// Scripted per-model behavior.
#[derive(Debug, Clone)]
pub enum GenBehavior {
    Ok(String),
    Transient,
    Fatal,
}

/// Text generator with scripted per-model outcomes and an optional
/// artificial delay for concurrency tests.
#[derive(Default)]
pub struct MockGenerator {
    pub behaviors: Mutex<HashMap<String, GenBehavior>>,
    pub calls: Mutex<Vec<String>>,
    pub delay: Option<Duration>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// All models answer with this JSON result.
    pub fn always_ok(json: &str) -> Self {
        let generator = Self::new();
        generator
            .behaviors
            .lock()
            .unwrap()
            .insert("*".to_string(), GenBehavior::Ok(json.to_string()));
        generator
    }

    pub fn script(&self, model: &str, behavior: GenBehavior) {
        self.behaviors.lock().unwrap().insert(model.to_string(), behavior);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn models_called(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, model: &str, _prompt: &str) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(model.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let behavior = {
            let behaviors = self.behaviors.lock().unwrap();
            behaviors.get(model).or_else(|| behaviors.get("*")).cloned()
        };
        match behavior {
            Some(GenBehavior::Ok(text)) => Ok(text),
            Some(GenBehavior::Transient) => Err(GenerationError::Overloaded),
            Some(GenBehavior::Fatal) => {
                Err(GenerationError::InvalidRequest("scripted fatal".to_string()))
            }
            None => Err(GenerationError::InvalidRequest(format!("unscripted model {model}"))),
        }
    }
}
