//! Composite score aggregation and deficit ranking.

use serde::{Deserialize, Serialize};

use crate::scoring::{Dimension, DimensionScores};

/// Fixed weight vector over the five dimensions. Must sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionWeights {
    pub readability: f64,
    pub seo: f64,
    pub aeo: f64,
    pub engagement: f64,
    pub factcheck: f64,
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            readability: 0.2,
            seo: 0.2,
            aeo: 0.2,
            engagement: 0.2,
            factcheck: 0.2,
        }
    }
}

impl DimensionWeights {
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Readability => self.readability,
            Dimension::Seo => self.seo,
            Dimension::Aeo => self.aeo,
            Dimension::Engagement => self.engagement,
            Dimension::FactCheck => self.factcheck,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if Dimension::ALL.iter().any(|d| self.get(*d) < 0.0) {
            return Err("dimension weights must be non-negative".to_string());
        }
        let sum: f64 = Dimension::ALL.iter().map(|d| self.get(*d)).sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(format!("dimension weights must sum to 1.0, got {sum}"));
        }
        Ok(())
    }
}

/// `round(Σ wᵢ × scoreᵢ)`, summed in fixed dimension order.
pub fn aggregate(scores: &DimensionScores, weights: &DimensionWeights) -> u32 {
    let total: f64 = Dimension::ALL
        .iter()
        .map(|d| weights.get(*d) * scores.get(*d))
        .sum();
    total.round().clamp(0.0, 100.0) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedDimension {
    pub dimension: Dimension,
    pub score: f64,
}

/// Dimensions ascending by score (weakest first). Ties fall back to
/// `Dimension::priority` (readability first).
pub fn rank(scores: &DimensionScores) -> Vec<RankedDimension> {
    let mut ranked: Vec<RankedDimension> = Dimension::ALL
        .iter()
        .map(|d| RankedDimension {
            dimension: *d,
            score: scores.get(*d),
        })
        .collect();
    ranked.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then(a.dimension.priority().cmp(&b.dimension.priority()))
    });
    ranked
}
