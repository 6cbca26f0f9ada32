use std::sync::Arc;

use tracing::{debug, warn};

use crate::evidence::ReferenceProvider;
use crate::models::content::{ContentItem, TargetProfile};
use crate::models::snapshot::ScoreSnapshot;
use crate::scoring::factcheck::{extract_claims, EvidenceSet};
use crate::scoring::{score_dimensions, ScoringConfig, ScoringInput};

/// Produces score snapshots. The only scoring step that does I/O is the
/// reference lookup for fact-check claims; everything else is pure.
#[derive(Clone)]
pub struct ContentScorer {
    config: ScoringConfig,
    references: Option<Arc<dyn ReferenceProvider>>,
}

impl ContentScorer {
    pub fn new(config: ScoringConfig, references: Option<Arc<dyn ReferenceProvider>>) -> Self {
        Self { config, references }
    }

    /// Scores `item` against `profile`. Claims already present in `evidence`
    /// (from an earlier pass of the same run) are not looked up again.
    pub async fn score(
        &self,
        item: &ContentItem,
        profile: &TargetProfile,
        evidence: &mut EvidenceSet,
    ) -> ScoreSnapshot {
        let input = ScoringInput::new(item, profile);

        let evidence = match &self.references {
            Some(provider) => {
                self.gather_evidence(provider.as_ref(), &input.plain_text, evidence)
                    .await;
                Some(&*evidence)
            }
            None => None,
        };

        let reports = score_dimensions(&input, evidence, &self.config);
        let snapshot = ScoreSnapshot::from_reports(
            item.id,
            reports,
            input.target_reading_ease,
            &self.config,
        );
        debug!(
            content_id = %item.id,
            overall = snapshot.overall,
            readability = snapshot.scores.readability,
            seo = snapshot.scores.seo,
            aeo = snapshot.scores.aeo,
            engagement = snapshot.scores.engagement,
            factcheck = snapshot.scores.factcheck,
            "content scored"
        );
        snapshot
    }

    async fn gather_evidence(
        &self,
        provider: &dyn ReferenceProvider,
        plain_text: &str,
        evidence: &mut EvidenceSet,
    ) {
        for claim in extract_claims(plain_text, self.config.max_claims) {
            if evidence.contains(&claim) {
                continue;
            }
            match provider.search(&claim).await {
                Ok(snippets) => evidence.record(&claim, snippets),
                Err(e) => {
                    warn!(error = %e, "reference lookup failed; claim left unchecked");
                    evidence.record_failure(&claim);
                }
            }
        }
    }
}
