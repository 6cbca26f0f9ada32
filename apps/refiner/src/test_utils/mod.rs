//! In-memory collaborators and fixtures for unit tests.

pub mod fixtures;

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::{GenerationError, RepositoryError};
use crate::evidence::{EvidenceError, ReferenceProvider, ReferenceSnippet};
use crate::llm_client::{Completion, TextGenerator};
use crate::models::content::{ContentItem, TargetProfile};
use crate::models::job::{BulkJob, JobPatch, JobStatus};
use crate::models::snapshot::{ImprovementPass, ScoreSnapshot, TokenUsage};
use crate::repository::{ContentRepository, JobSink};

// ────────────────────────────────────────────────────────────────────────────
// Content repository
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryContentRepository {
    items: Mutex<HashMap<Uuid, ContentItem>>,
    profiles: Mutex<HashMap<Uuid, TargetProfile>>,
    snapshots: Mutex<Vec<ScoreSnapshot>>,
    passes: Mutex<Vec<ImprovementPass>>,
    puts: AtomicUsize,
    unavailable_ids: Mutex<HashSet<Uuid>>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `item` and binds `profile` to its strategy.
    pub fn insert(&self, item: ContentItem, mut profile: TargetProfile) -> Uuid {
        profile.strategy_id = item.strategy_id;
        let id = item.id;
        self.profiles.lock().unwrap().insert(item.strategy_id, profile);
        self.items.lock().unwrap().insert(id, item);
        id
    }

    /// Every read of `id` fails as if the store were down.
    pub fn make_unavailable(&self, id: Uuid) {
        self.unavailable_ids.lock().unwrap().insert(id);
    }

    pub fn item(&self, id: Uuid) -> ContentItem {
        self.items.lock().unwrap()[&id].clone()
    }

    pub fn passes_for(&self, id: Uuid) -> Vec<ImprovementPass> {
        self.passes
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.content_id == id)
            .cloned()
            .collect()
    }

    pub fn snapshots_for(&self, id: Uuid) -> Vec<ScoreSnapshot> {
        self.snapshots
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.content_id == id)
            .cloned()
            .collect()
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn get(&self, id: Uuid) -> Result<ContentItem, RepositoryError> {
        if self.unavailable_ids.lock().unwrap().contains(&id) {
            return Err(RepositoryError::Unavailable("connection refused".to_string()));
        }
        self.items
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "content item",
                id: id.to_string(),
            })
    }

    async fn target_profile(&self, strategy_id: Uuid) -> Result<TargetProfile, RepositoryError> {
        self.profiles
            .lock()
            .unwrap()
            .get(&strategy_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "target profile",
                id: strategy_id.to_string(),
            })
    }

    async fn put(&self, id: Uuid, body: &str, word_count: u32) -> Result<(), RepositoryError> {
        let mut items = self.items.lock().unwrap();
        let item = items.get_mut(&id).ok_or_else(|| RepositoryError::NotFound {
            entity: "content item",
            id: id.to_string(),
        })?;
        item.body = body.to_string();
        item.word_count = word_count;
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn append_score_snapshot(
        &self,
        _id: Uuid,
        snapshot: &ScoreSnapshot,
    ) -> Result<(), RepositoryError> {
        self.snapshots.lock().unwrap().push(snapshot.clone());
        Ok(())
    }

    async fn append_improvement_pass(
        &self,
        _id: Uuid,
        pass: &ImprovementPass,
    ) -> Result<(), RepositoryError> {
        self.passes.lock().unwrap().push(pass.clone());
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Job sink
// ────────────────────────────────────────────────────────────────────────────

/// Processing jobs untouched for this long are claimable again.
pub const STALE_AFTER_MINUTES: i64 = 30;

#[derive(Default)]
pub struct InMemoryJobSink {
    jobs: Mutex<HashMap<Uuid, BulkJob>>,
    /// Marks the job cancelled once it holds this many results.
    cancel_after: Mutex<Option<usize>>,
    unavailable: AtomicBool,
}

impl InMemoryJobSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel_after(&self, results: usize) {
        *self.cancel_after.lock().unwrap() = Some(results);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn job(&self, id: Uuid) -> BulkJob {
        self.jobs.lock().unwrap()[&id].clone()
    }

    /// Moves the job's last update `minutes` into the past.
    pub fn backdate(&self, id: Uuid, minutes: i64) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get_mut(&id) {
            job.updated_at -= chrono::Duration::minutes(minutes);
        }
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl JobSink for InMemoryJobSink {
    async fn create_job(&self, content_ids: &[Uuid]) -> Result<Uuid, RepositoryError> {
        self.check_available()?;
        let job = BulkJob::new(content_ids.to_vec());
        let id = job.id;
        self.jobs.lock().unwrap().insert(id, job);
        Ok(id)
    }

    async fn update_job(&self, job_id: Uuid, patch: JobPatch) -> Result<(), RepositoryError> {
        self.check_available()?;
        let cancel_after = *self.cancel_after.lock().unwrap();
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&job_id).ok_or_else(|| RepositoryError::NotFound {
            entity: "job",
            id: job_id.to_string(),
        })?;
        job.apply(&patch);
        if cancel_after.is_some_and(|n| job.results.len() >= n) && !job.status.is_terminal() {
            job.status = JobStatus::Cancelled;
        }
        Ok(())
    }

    async fn get_job(&self, job_id: Uuid) -> Result<BulkJob, RepositoryError> {
        self.check_available()?;
        self.jobs
            .lock()
            .unwrap()
            .get(&job_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "job",
                id: job_id.to_string(),
            })
    }

    async fn claim_next_queued(&self) -> Result<Option<BulkJob>, RepositoryError> {
        self.check_available()?;
        let stale_before = Utc::now() - chrono::Duration::minutes(STALE_AFTER_MINUTES);
        let mut jobs = self.jobs.lock().unwrap();
        let next = jobs
            .values_mut()
            .filter(|j| {
                j.status == JobStatus::Queued
                    || (j.status == JobStatus::Processing && j.updated_at < stale_before)
            })
            .min_by_key(|j| j.created_at);
        Ok(next.map(|job| {
            job.status = JobStatus::Processing;
            job.updated_at = Utc::now();
            job.clone()
        }))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Text generator
// ────────────────────────────────────────────────────────────────────────────

pub enum Step {
    Reply(String),
    Fail(GenerationError),
    /// Never completes.
    Hang,
}

/// Plays back `steps` in order, then repeats `fallback` (if any).
pub struct ScriptedGenerator {
    steps: Mutex<VecDeque<Step>>,
    fallback: Option<String>,
    usage: TokenUsage,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback: None,
            usage: TokenUsage {
                input_tokens: 1_000,
                output_tokens: 500,
            },
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Replies with `text` on every call.
    pub fn always(text: impl Into<String>) -> Self {
        Self {
            fallback: Some(text.into()),
            ..Self::new(vec![])
        }
    }

    pub fn with_usage(mut self, input_tokens: u32, output_tokens: u32) -> Self {
        self.usage = TokenUsage {
            input_tokens,
            output_tokens,
        };
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(
        &self,
        _system: &str,
        prompt: &str,
        _max_tokens: u32,
    ) -> Result<Completion, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let step = self.steps.lock().unwrap().pop_front();
        let step = match (step, &self.fallback) {
            (Some(step), _) => step,
            (None, Some(text)) => Step::Reply(text.clone()),
            (None, None) => Step::Fail(GenerationError::Service("script exhausted".to_string())),
        };
        match step {
            Step::Reply(text) => Ok(Completion {
                text,
                usage: self.usage,
            }),
            Step::Fail(e) => Err(e),
            Step::Hang => std::future::pending().await,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Reference provider
// ────────────────────────────────────────────────────────────────────────────

/// Answers searches whose claim contains a registered needle.
#[derive(Default)]
pub struct StaticReferenceProvider {
    answers: Vec<(String, Vec<ReferenceSnippet>)>,
    failing: Vec<String>,
    calls: AtomicUsize,
}

impl StaticReferenceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, needle: &str, urls: &[&str]) -> Self {
        let snippets = urls
            .iter()
            .map(|url| ReferenceSnippet {
                url: url.to_string(),
                snippet: format!("{needle} ({url})"),
            })
            .collect();
        self.answers.push((needle.to_string(), snippets));
        self
    }

    pub fn failing(mut self, needle: &str) -> Self {
        self.failing.push(needle.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReferenceProvider for StaticReferenceProvider {
    async fn search(&self, claim: &str) -> Result<Vec<ReferenceSnippet>, EvidenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.iter().any(|n| claim.contains(n.as_str())) {
            return Err(EvidenceError::Status(503));
        }
        Ok(self
            .answers
            .iter()
            .find(|(needle, _)| claim.contains(needle.as_str()))
            .map(|(_, snippets)| snippets.clone())
            .unwrap_or_default())
    }
}
