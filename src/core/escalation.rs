//! Conflict escalation enforcement against a planned curve.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::EscalationConfig;
use crate::core::curve::{plan_curve, render_curve_chart, CurveType};

/// What the writer should do about the current chapter's intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationAction {
    Escalate,
    Maintain,
    Reduce,
}

/// Result of comparing an observed intensity against the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationCheck {
    pub is_acceptable: bool,
    pub expected_intensity: f64,
    pub current_intensity: f64,
    pub deviation: f64,
    pub action: EscalationAction,
    pub suggestions: Vec<String>,
}

/// Result of a saturation scan over recent chapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Saturation {
    pub is_saturated: bool,
    pub message: String,
}

/// Holds a planned conflict curve and checks chapters against it.
#[derive(Debug, Clone)]
pub struct ConflictEscalator {
    curve_type: CurveType,
    curve: Vec<f64>,
    config: EscalationConfig,
}

impl ConflictEscalator {
    pub fn new(curve_type: CurveType) -> Self {
        Self::with_config(curve_type, EscalationConfig::default())
    }

    pub fn with_config(curve_type: CurveType, config: EscalationConfig) -> Self {
        Self {
            curve_type,
            curve: Vec::new(),
            config,
        }
    }

    pub fn curve_type(&self) -> CurveType {
        self.curve_type
    }

    pub fn curve(&self) -> &[f64] {
        &self.curve
    }

    pub fn is_planned(&self) -> bool {
        !self.curve.is_empty()
    }

    /// Plan the curve, optionally overriding the configured shape.
    pub fn plan_conflict_arc(&mut self, total_chapters: u32, curve_type: Option<CurveType>) -> &[f64] {
        let curve_type = curve_type.unwrap_or(self.curve_type);
        self.curve = plan_curve(total_chapters, curve_type);

        let (lo, hi) = self
            .curve
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        info!(
            chapters = self.curve.len(),
            curve = %curve_type,
            "conflict curve planned, intensity {:.2}-{:.2}",
            lo,
            hi
        );
        &self.curve
    }

    /// Planned intensity for a 1-based chapter, or 0.0 when out of range.
    pub fn intensity_at(&self, chapter_num: u32) -> f64 {
        chapter_num
            .checked_sub(1)
            .and_then(|i| self.curve.get(i as usize))
            .copied()
            .unwrap_or(0.0)
    }

    /// Check with the configured tolerance.
    pub fn enforce(&self, chapter_num: u32, current_intensity: f64) -> EscalationCheck {
        self.enforce_with_tolerance(chapter_num, current_intensity, self.config.tolerance)
    }

    /// Compare `current_intensity` with the plan for `chapter_num`.
    ///
    /// An unplanned curve or an out-of-range chapter yields an acceptable
    /// result carrying an explanatory suggestion.
    pub fn enforce_with_tolerance(
        &self,
        chapter_num: u32,
        current_intensity: f64,
        tolerance: f64,
    ) -> EscalationCheck {
        let mut check = EscalationCheck {
            is_acceptable: true,
            expected_intensity: 0.0,
            current_intensity,
            deviation: 0.0,
            action: EscalationAction::Maintain,
            suggestions: Vec::new(),
        };

        if self.curve.is_empty() {
            check
                .suggestions
                .push("conflict curve is not planned; call plan_conflict_arc first".to_string());
            return check;
        }
        if chapter_num < 1 || chapter_num as usize > self.curve.len() {
            check
                .suggestions
                .push(format!("chapter {chapter_num} is outside the planned curve"));
            return check;
        }

        let expected = self.curve[chapter_num as usize - 1];
        let deviation = current_intensity - expected;
        check.expected_intensity = expected;
        check.deviation = deviation;

        if deviation.abs() > tolerance {
            check.is_acceptable = false;
            if deviation < 0.0 {
                check.action = EscalationAction::Escalate;
                check.suggestions.push(format!(
                    "conflict too weak (expected {expected:.2}, got {current_intensity:.2}); strengthen:"
                ));
                check.suggestions.extend(escalation_suggestions(expected));
            } else {
                check.action = EscalationAction::Reduce;
                check.suggestions.push(format!(
                    "conflict too strong (expected {expected:.2}, got {current_intensity:.2}); \
                     give the characters a breather or shift the focus of the conflict"
                ));
            }
        }

        info!(
            chapter = chapter_num,
            action = ?check.action,
            "conflict check: expected={:.2} actual={:.2} deviation={:.2}",
            expected,
            current_intensity,
            deviation
        );
        check
    }

    /// Saturation check with the configured threshold and window.
    pub fn detect_saturation(&self, recent_intensities: &[f64]) -> Saturation {
        detect_saturation(
            recent_intensities,
            self.config.saturation_threshold,
            self.config.saturation_window,
        )
    }

    pub fn visualize_curve(&self, width: usize) -> String {
        render_curve_chart(&self.curve, width)
    }
}

/// Flag sustained high intensity: the mean of the last `window` values is at
/// least `threshold`. Fewer than `window` samples never saturate.
pub fn detect_saturation(recent_intensities: &[f64], threshold: f64, window: usize) -> Saturation {
    if window == 0 || recent_intensities.len() < window {
        return Saturation {
            is_saturated: false,
            message: String::new(),
        };
    }

    let recent = &recent_intensities[recent_intensities.len() - window..];
    let avg = recent.iter().sum::<f64>() / window as f64;

    if avg >= threshold {
        Saturation {
            is_saturated: true,
            message: format!(
                "conflict saturation: {window}-chapter average intensity {avg:.2}; \
                 schedule a calmer chapter to avoid reader fatigue"
            ),
        }
    } else {
        Saturation {
            is_saturated: false,
            message: String::new(),
        }
    }
}

/// Concrete remedies, keyed by the band the expected intensity falls in.
fn escalation_suggestions(target: f64) -> Vec<String> {
    let items: &[&str] = if target < 0.3 {
        &[
            "- add a small obstacle or misunderstanding",
            "- introduce a new clue or mystery",
        ]
    } else if target < 0.5 {
        &[
            "- increase friction or opposition between characters",
            "- bring in outside pressure or a time limit",
            "- put the protagonist in a moral dilemma",
        ]
    } else if target < 0.7 {
        &[
            "- stage a clash between important characters",
            "- create a crisis or a failure",
            "- reveal a hidden threat",
        ]
    } else if target < 0.9 {
        &[
            "- design a high-stakes confrontation or battle",
            "- make a character suffer a major loss",
            "- let several conflict lines erupt at once",
        ]
    } else {
        &[
            "- the final battle or ultimate showdown",
            "- an irreversible major choice",
            "- resolve every conflict together",
        ]
    };
    items.iter().map(|s| s.to_string()).collect()
}
