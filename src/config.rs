//! Tunable thresholds for the planners and checks.
//!
//! Every field defaults to the values the planners were designed around, so
//! a RON file only needs to list what it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::curve::CurveType;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Upper position-fraction bounds for each chapter phase.
///
/// Checked in order: setup, development, escalation, climax; anything
/// beyond `climax` is resolution. Chapter 1 is always the opening.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseThresholds {
    pub setup: f64,
    pub development: f64,
    pub escalation: f64,
    pub climax: f64,
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            setup: 0.15,
            development: 0.70,
            escalation: 0.85,
            climax: 0.95,
        }
    }
}

/// One volume-size band: books of at most `max_total` chapters use `size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeBand {
    pub max_total: u32,
    pub size: u32,
}

/// Rules for deriving chapters-per-volume from the book length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeSizing {
    /// Books this short are not split.
    pub single_volume_max: u32,
    /// Checked in order after `single_volume_max`.
    pub bands: Vec<VolumeBand>,
    pub default_size: u32,
}

impl Default for VolumeSizing {
    fn default() -> Self {
        Self {
            single_volume_max: 20,
            bands: vec![
                VolumeBand { max_total: 50, size: 15 },
                VolumeBand { max_total: 100, size: 20 },
                VolumeBand { max_total: 200, size: 25 },
            ],
            default_size: 30,
        }
    }
}

impl VolumeSizing {
    pub fn chapters_per_volume(&self, total_chapters: u32) -> u32 {
        if total_chapters <= self.single_volume_max {
            return total_chapters;
        }
        self.bands
            .iter()
            .find(|band| total_chapters <= band.max_total)
            .map_or(self.default_size, |band| band.size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Allowed absolute deviation from the planned intensity.
    pub tolerance: f64,
    pub saturation_threshold: f64,
    pub saturation_window: usize,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.15,
            saturation_threshold: 0.85,
            saturation_window: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Similarity at or above this rejects the outline as a near-duplicate.
    pub reject_threshold: f64,
    pub warn_threshold: f64,
    /// Outlines with fewer non-whitespace characters get a warning.
    pub min_outline_chars: usize,
    /// Character n-gram length.
    pub ngram: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            reject_threshold: 0.7,
            warn_threshold: 0.5,
            min_outline_chars: 20,
            ngram: 2,
        }
    }
}

/// Top-level planner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub curve_type: CurveType,
    pub phases: PhaseThresholds,
    pub volume_sizing: VolumeSizing,
    /// Extra chapters a volume may run past its plan before it is force-closed.
    pub volume_end_slack: u32,
    pub escalation: EscalationConfig,
    pub similarity: SimilarityConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            curve_type: CurveType::WaveWithClimax,
            phases: PhaseThresholds::default(),
            volume_sizing: VolumeSizing::default(),
            volume_end_slack: 2,
            escalation: EscalationConfig::default(),
            similarity: SimilarityConfig::default(),
        }
    }
}

impl PlannerConfig {
    pub fn load_from_ron(path: &Path) -> Result<PlannerConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<PlannerConfig, ConfigError> {
        Ok(ron::from_str(input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_volume_bands() {
        let sizing = VolumeSizing::default();
        assert_eq!(sizing.chapters_per_volume(12), 12);
        assert_eq!(sizing.chapters_per_volume(20), 20);
        assert_eq!(sizing.chapters_per_volume(21), 15);
        assert_eq!(sizing.chapters_per_volume(50), 15);
        assert_eq!(sizing.chapters_per_volume(51), 20);
        assert_eq!(sizing.chapters_per_volume(100), 20);
        assert_eq!(sizing.chapters_per_volume(200), 25);
        assert_eq!(sizing.chapters_per_volume(201), 30);
    }

    #[test]
    fn partial_ron_keeps_defaults() {
        let cfg = PlannerConfig::parse_ron(
            "(curve_type: linear, volume_end_slack: 3, escalation: (tolerance: 0.2))",
        )
        .unwrap();
        assert_eq!(cfg.curve_type, CurveType::Linear);
        assert_eq!(cfg.volume_end_slack, 3);
        assert!((cfg.escalation.tolerance - 0.2).abs() < 1e-9);
        assert_eq!(cfg.escalation.saturation_window, 5);
        assert_eq!(cfg.phases, PhaseThresholds::default());
    }

    #[test]
    fn empty_ron_is_default() {
        let cfg = PlannerConfig::parse_ron("()").unwrap();
        assert_eq!(cfg, PlannerConfig::default());
    }

    #[test]
    fn malformed_ron_is_an_error() {
        assert!(matches!(
            PlannerConfig::parse_ron("(curve_type: 7"),
            Err(ConfigError::Ron(_))
        ));
    }
}
