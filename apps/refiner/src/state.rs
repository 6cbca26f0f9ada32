use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;
use crate::evidence::{HttpReferenceProvider, ReferenceProvider};
use crate::jobs::{BulkJobOrchestrator, Worker};
use crate::llm_client::{self, LlmClient, TextGenerator};
use crate::refinement::ImprovementPassController;
use crate::repository::{ContentRepository, JobSink, PgContentRepository, PgJobSink};
use crate::scoring::scorer::ContentScorer;
use crate::scoring::ScoringConfig;

/// Shared collaborators wired once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub repository: Arc<dyn ContentRepository>,
    pub sink: Arc<dyn JobSink>,
    pub generator: Arc<dyn TextGenerator>,
    /// Fact-check lookups are skipped when absent.
    pub references: Option<Arc<dyn ReferenceProvider>>,
}

impl AppState {
    pub fn new(config: Config, db: PgPool) -> Result<Self> {
        let generator = LlmClient::new(config.anthropic_api_key.clone())?;
        info!("LLM client initialized (model: {})", llm_client::MODEL);

        let references: Option<Arc<dyn ReferenceProvider>> = match &config.reference_search_url {
            Some(url) => {
                info!(endpoint = %url, "reference search enabled");
                Some(Arc::new(HttpReferenceProvider::new(url.clone())?))
            }
            None => {
                info!("REFERENCE_SEARCH_URL not set; fact-check scores stay neutral");
                None
            }
        };

        Ok(Self {
            repository: Arc::new(PgContentRepository::new(db.clone())),
            sink: Arc::new(PgJobSink::new(db, config.job_stale_after)),
            generator: Arc::new(generator),
            references,
            config,
        })
    }

    pub fn scoring_config(&self) -> Result<ScoringConfig> {
        let config = ScoringConfig::default();
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    pub fn orchestrator(&self) -> Result<BulkJobOrchestrator> {
        let scorer = ContentScorer::new(self.scoring_config()?, self.references.clone());
        let controller = ImprovementPassController::new(
            self.repository.clone(),
            self.generator.clone(),
            scorer,
            self.config.refinement.clone(),
        );
        Ok(BulkJobOrchestrator::new(
            Arc::new(controller),
            self.sink.clone(),
            self.config.inter_item_delay,
        ))
    }

    pub fn worker(&self) -> Result<Worker> {
        Ok(Worker::new(
            Arc::new(self.orchestrator()?),
            self.sink.clone(),
            self.config.poll_interval,
        ))
    }
}
