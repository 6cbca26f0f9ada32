//! Improvement Pass Controller: the bounded score → rewrite → rescore loop for
//! one content item.
//!
//! # States
//! `Scoring → Selecting → Rewriting → Rescoring → Deciding → Scoring …` until
//! `Selecting` hits a stop condition (threshold, max iterations, budget).
//!
//! Every pass appends exactly one `ImprovementPass`, including failed and
//! no-change ones, and counts toward `max_iterations`. A failed or reverted
//! pass never touches the stored body.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{AppError, GenerationError};
use crate::llm_client::{estimate_cost_usd, TextGenerator};
use crate::models::content::{ContentItem, ContentStatus};
use crate::models::snapshot::{ImprovementPass, PassOutcome, ScoreSnapshot, TokenUsage};
use crate::refinement::prompts::REWRITE_SYSTEM;
use crate::refinement::rewrite::{
    build_rewrite_prompt, change_ratio, parse_rewrite, ParsedRewrite,
};
use crate::repository::ContentRepository;
use crate::scoring::factcheck::EvidenceSet;
use crate::scoring::scorer::ContentScorer;
use crate::scoring::text::Document;
use crate::scoring::Dimension;

/// Above this share of changed vocabulary a single-dimension pass is suspicious.
const CHANGE_RATIO_WARN: f64 = 0.6;

// ────────────────────────────────────────────────────────────────────────────
// Config and outcome types
// ────────────────────────────────────────────────────────────────────────────

/// What to do with a rewrite that lowers the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RegressionPolicy {
    /// Never write a regressed rewrite. Stored content is monotonically non-regressing.
    Revert,
    /// Keep a regression of at most `tolerance` overall points; revert larger ones.
    AcceptWithin { tolerance: u32 },
}

#[derive(Debug, Clone)]
pub struct RefinementConfig {
    pub target_overall: u32,
    pub max_iterations: u32,
    pub cost_budget_usd: f64,
    pub dimensions_per_pass: usize,
    pub generation_timeout: Duration,
    pub max_rewrite_tokens: u32,
    pub regression_policy: RegressionPolicy,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            target_overall: 85,
            max_iterations: 5,
            cost_budget_usd: 0.50,
            dimensions_per_pass: 1,
            generation_timeout: Duration::from_secs(90),
            max_rewrite_tokens: 4096,
            regression_policy: RegressionPolicy::Revert,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    ThresholdReached,
    MaxIterations,
    BudgetExhausted,
}

#[derive(Debug, Clone)]
pub struct RefinementOutcome {
    pub content_id: Uuid,
    pub initial: ScoreSnapshot,
    pub final_snapshot: ScoreSnapshot,
    pub passes: Vec<ImprovementPass>,
    pub iterations: u32,
    pub cumulative_cost_usd: f64,
    pub usage: TokenUsage,
    pub stop_reason: StopReason,
}

// ────────────────────────────────────────────────────────────────────────────
// Identifier-keyed lock
// ────────────────────────────────────────────────────────────────────────────

/// Content ids currently being refined in this process.
#[derive(Clone, Default)]
pub struct ContentLocks {
    held: Arc<Mutex<HashSet<Uuid>>>,
}

pub struct ContentLockGuard {
    held: Arc<Mutex<HashSet<Uuid>>>,
    id: Uuid,
}

impl ContentLocks {
    pub fn acquire(&self, id: Uuid) -> Result<ContentLockGuard, AppError> {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        if !held.insert(id) {
            return Err(AppError::Conflict(format!(
                "content item {id} is already being refined"
            )));
        }
        Ok(ContentLockGuard {
            held: self.held.clone(),
            id,
        })
    }
}

impl Drop for ContentLockGuard {
    fn drop(&mut self) {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        held.remove(&self.id);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// State machine
// ────────────────────────────────────────────────────────────────────────────

struct Candidate {
    item: ContentItem,
    notes: Option<String>,
    usage: TokenUsage,
}

enum State {
    Scoring,
    Selecting,
    Rewriting {
        dimensions: Vec<Dimension>,
    },
    Rescoring {
        dimensions: Vec<Dimension>,
        candidate: Candidate,
    },
    Deciding {
        dimensions: Vec<Dimension>,
        candidate: Candidate,
        after: ScoreSnapshot,
    },
    Stopped(StopReason),
}

/// Mutable bookkeeping for one `refine` call.
struct Run {
    item: ContentItem,
    current: Option<ScoreSnapshot>,
    initial: Option<ScoreSnapshot>,
    passes: Vec<ImprovementPass>,
    iterations: u32,
    cost_usd: f64,
    usage: TokenUsage,
}

impl Run {
    fn charge(&mut self, usage: TokenUsage) -> f64 {
        let cost = estimate_cost_usd(usage);
        self.cost_usd += cost;
        self.usage.add(usage);
        cost
    }
}

pub struct ImprovementPassController {
    repository: Arc<dyn ContentRepository>,
    generator: Arc<dyn TextGenerator>,
    scorer: ContentScorer,
    config: RefinementConfig,
    locks: ContentLocks,
}

impl ImprovementPassController {
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        generator: Arc<dyn TextGenerator>,
        scorer: ContentScorer,
        config: RefinementConfig,
    ) -> Self {
        Self {
            repository,
            generator,
            scorer,
            config,
            locks: ContentLocks::default(),
        }
    }

    /// Refines one content item until a stop condition holds.
    pub async fn refine(&self, content_id: Uuid) -> Result<RefinementOutcome, AppError> {
        let _guard = self.locks.acquire(content_id)?;

        let item = self.repository.get(content_id).await?;
        if item.status == ContentStatus::Published {
            return Err(AppError::Validation(format!(
                "content item {content_id} is {} and cannot be refined",
                item.status.as_str()
            )));
        }
        let profile = self.repository.target_profile(item.strategy_id).await?;
        let mut evidence = EvidenceSet::new();

        info!(content_id = %content_id, "refinement started");

        let mut run = Run {
            item,
            current: None,
            initial: None,
            passes: Vec::new(),
            iterations: 0,
            cost_usd: 0.0,
            usage: TokenUsage::default(),
        };
        let mut state = State::Scoring;

        let stop_reason = loop {
            state = match state {
                State::Scoring => {
                    // Reused when the body is unchanged since the last snapshot.
                    if run.current.is_none() {
                        let snapshot = self.scorer.score(&run.item, &profile, &mut evidence).await;
                        self.repository
                            .append_score_snapshot(content_id, &snapshot)
                            .await?;
                        if run.initial.is_none() {
                            run.initial = Some(snapshot.clone());
                        }
                        run.current = Some(snapshot);
                    }
                    State::Selecting
                }

                State::Selecting => {
                    let current = current_snapshot(&run)?;
                    match self.stop_condition(current.overall, &run) {
                        Some(reason) => State::Stopped(reason),
                        None => State::Rewriting {
                            dimensions: current
                                .ranked()
                                .into_iter()
                                .take(self.config.dimensions_per_pass.max(1))
                                .map(|r| r.dimension)
                                .collect(),
                        },
                    }
                }

                State::Rewriting { dimensions } => {
                    run.iterations += 1;
                    let current = current_snapshot(&run)?.clone();
                    let prompt = build_rewrite_prompt(&run.item, &profile, &current, &dimensions);

                    match self.generate(&prompt).await {
                        (Ok(parsed), usage) => {
                            let word_count = Document::parse(&parsed.body).word_count() as u32;
                            let item = ContentItem {
                                body: parsed.body,
                                word_count,
                                ..run.item.clone()
                            };
                            State::Rescoring {
                                dimensions,
                                candidate: Candidate {
                                    item,
                                    notes: parsed.notes,
                                    usage,
                                },
                            }
                        }
                        (Err(err), usage) => {
                            let cost = run.charge(usage);
                            warn!(
                                content_id = %content_id,
                                pass = run.iterations,
                                dimension = %dimensions[0],
                                error = %err,
                                "rewrite failed; content left unchanged"
                            );
                            let pass = ImprovementPass {
                                id: Uuid::new_v4(),
                                content_id,
                                pass_number: run.iterations,
                                dimensions,
                                before: current,
                                after: None,
                                cost_usd: cost,
                                usage,
                                outcome: PassOutcome::Failed,
                                applied: false,
                                change_ratio: None,
                                error: Some(err.to_string()),
                                created_at: Utc::now(),
                            };
                            self.repository
                                .append_improvement_pass(content_id, &pass)
                                .await?;
                            run.passes.push(pass);
                            State::Scoring
                        }
                    }
                }

                State::Rescoring {
                    dimensions,
                    candidate,
                } => {
                    let after = self
                        .scorer
                        .score(&candidate.item, &profile, &mut evidence)
                        .await;
                    self.repository
                        .append_score_snapshot(content_id, &after)
                        .await?;
                    State::Deciding {
                        dimensions,
                        candidate,
                        after,
                    }
                }

                State::Deciding {
                    dimensions,
                    candidate,
                    after,
                } => {
                    self.decide(&mut run, dimensions, candidate, after).await?;
                    State::Scoring
                }

                State::Stopped(reason) => break reason,
            };
        };

        let final_snapshot = current_snapshot(&run)?.clone();
        let initial = run.initial.take().unwrap_or_else(|| final_snapshot.clone());

        info!(
            content_id = %content_id,
            initial = initial.overall,
            overall = final_snapshot.overall,
            passes = run.iterations,
            cost_usd = run.cost_usd,
            stop_reason = ?stop_reason,
            "refinement finished"
        );

        Ok(RefinementOutcome {
            content_id,
            initial,
            final_snapshot,
            passes: run.passes,
            iterations: run.iterations,
            cumulative_cost_usd: run.cost_usd,
            usage: run.usage,
            stop_reason,
        })
    }

    fn stop_condition(&self, overall: u32, run: &Run) -> Option<StopReason> {
        if overall >= self.config.target_overall {
            Some(StopReason::ThresholdReached)
        } else if run.iterations >= self.config.max_iterations {
            Some(StopReason::MaxIterations)
        } else if run.cost_usd >= self.config.cost_budget_usd {
            Some(StopReason::BudgetExhausted)
        } else {
            None
        }
    }

    /// One bounded call to the generator. Usage is returned even when the
    /// output turns out to be unusable, so its cost is still charged.
    async fn generate(
        &self,
        prompt: &str,
    ) -> (Result<ParsedRewrite, GenerationError>, TokenUsage) {
        let timeout = self.config.generation_timeout;
        let call = self
            .generator
            .complete(REWRITE_SYSTEM, prompt, self.config.max_rewrite_tokens);

        match tokio::time::timeout(timeout, call).await {
            Err(_) => (Err(GenerationError::Timeout(timeout)), TokenUsage::default()),
            Ok(Err(e)) => (Err(e), TokenUsage::default()),
            Ok(Ok(completion)) => {
                debug!(
                    input_tokens = completion.usage.input_tokens,
                    output_tokens = completion.usage.output_tokens,
                    "rewrite generated"
                );
                (parse_rewrite(&completion.text), completion.usage)
            }
        }
    }

    async fn decide(
        &self,
        run: &mut Run,
        dimensions: Vec<Dimension>,
        candidate: Candidate,
        after: ScoreSnapshot,
    ) -> Result<(), AppError> {
        let before = current_snapshot(run)?.clone();
        let content_id = before.content_id;
        let cost = run.charge(candidate.usage);
        let ratio = change_ratio(&run.item.body, &candidate.item.body);

        let (outcome, applied) = if after.overall > before.overall {
            (PassOutcome::Improved, true)
        } else if after.overall == before.overall {
            (PassOutcome::NoChange, true)
        } else {
            let drop = before.overall - after.overall;
            let keep = match self.config.regression_policy {
                RegressionPolicy::Revert => false,
                RegressionPolicy::AcceptWithin { tolerance } => drop <= tolerance,
            };
            (PassOutcome::Regressed, keep)
        };

        if dimensions.len() == 1 && ratio > CHANGE_RATIO_WARN {
            warn!(
                content_id = %content_id,
                pass = run.iterations,
                dimension = %dimensions[0],
                change_ratio = ratio,
                "single-dimension rewrite changed most of the text"
            );
        }

        if applied {
            if candidate.item.body != run.item.body {
                self.repository
                    .put(content_id, &candidate.item.body, candidate.item.word_count)
                    .await?;
                run.item = candidate.item;
            }
            run.current = Some(after.clone());
        }

        match outcome {
            PassOutcome::Regressed => warn!(
                content_id = %content_id,
                pass = run.iterations,
                before = before.overall,
                after = after.overall,
                kept = applied,
                "rewrite regressed"
            ),
            _ => info!(
                content_id = %content_id,
                pass = run.iterations,
                dimension = %dimensions[0],
                before = before.overall,
                overall = after.overall,
                outcome = outcome.as_str(),
                notes = candidate.notes.as_deref().unwrap_or(""),
                "pass complete"
            ),
        }

        let pass = ImprovementPass {
            id: Uuid::new_v4(),
            content_id,
            pass_number: run.iterations,
            dimensions,
            before,
            after: Some(after),
            cost_usd: cost,
            usage: candidate.usage,
            outcome,
            applied,
            change_ratio: Some(ratio),
            error: None,
            created_at: Utc::now(),
        };
        self.repository
            .append_improvement_pass(content_id, &pass)
            .await?;
        run.passes.push(pass);
        Ok(())
    }
}

fn current_snapshot(run: &Run) -> Result<&ScoreSnapshot, AppError> {
    run.current
        .as_ref()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("no snapshot for current content")))
}
