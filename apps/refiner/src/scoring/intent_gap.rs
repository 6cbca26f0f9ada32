//! Intent gap mapping: how well the actual reading ease matches the audience
//! target, NOT how easy the text is in absolute terms.
//!
//! `gap = |actual − target|` runs through a piecewise-linear band table:
//!
//! | gap        | score                      |
//! |------------|----------------------------|
//! | 0 – 5      | 95 + (5 − gap)             |
//! | 5 – 10     | 85 + (10 − gap)            |
//! | 10 – 15    | 70 + (15 − gap)            |
//! | 15 – 20    | 55 + (20 − gap)            |
//! | 20 – 30    | 35 + (30 − gap)            |
//! | > 30       | max(10, 35 − (gap − 30))   |
//!
//! Each band includes its upper edge, so gap 5 scores 95 and gap 30 scores 35.

use serde::{Deserialize, Serialize};

/// One band: applies while `gap <= upper`, scoring `base + (upper − gap)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapBand {
    pub upper: f64,
    pub base: f64,
}

/// The full curve. Bands must be sorted by `upper`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapCurve {
    pub bands: Vec<GapBand>,
    /// Score at the last band's edge, decreasing one point per gap point beyond it.
    pub tail_base: f64,
    pub floor: f64,
}

impl Default for GapCurve {
    fn default() -> Self {
        Self {
            bands: vec![
                GapBand { upper: 5.0, base: 95.0 },
                GapBand { upper: 10.0, base: 85.0 },
                GapBand { upper: 15.0, base: 70.0 },
                GapBand { upper: 20.0, base: 55.0 },
                GapBand { upper: 30.0, base: 35.0 },
            ],
            tail_base: 35.0,
            floor: 10.0,
        }
    }
}

impl GapCurve {
    /// Maps an absolute gap to a 0–100 sub-score.
    pub fn score(&self, gap: f64) -> f64 {
        if !gap.is_finite() {
            return self.floor;
        }
        let gap = gap.abs();
        for band in &self.bands {
            if gap <= band.upper {
                return (band.base + (band.upper - gap)).clamp(0.0, 100.0);
            }
        }
        let tail_start = self.bands.last().map(|b| b.upper).unwrap_or(0.0);
        (self.tail_base - (gap - tail_start)).max(self.floor).clamp(0.0, 100.0)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.bands.is_empty() {
            return Err("gap curve needs at least one band".to_string());
        }
        if self
            .bands
            .windows(2)
            .any(|pair| pair[0].upper >= pair[1].upper)
        {
            return Err("gap curve bands must be strictly increasing".to_string());
        }
        Ok(())
    }
}

/// Gap between actual and target reading ease.
pub fn gap(actual: f64, target: f64) -> f64 {
    (actual - target).abs()
}

/// Intent-aware readability sub-score for an actual/target pair.
pub fn intent_score(actual: f64, target: f64, curve: &GapCurve) -> f64 {
    curve.score(gap(actual, target))
}
