//! Chapter planning — phase classification, target conflict and per-chapter guidance.

use tracing::info;

use crate::config::{EscalationConfig, PhaseThresholds, PlannerConfig};
use crate::core::curve::CurveType;
use crate::core::escalation::{ConflictEscalator, EscalationCheck};
use crate::schema::chapter::{ChapterType, PlotGuidance, Tone, VolumeLink};

/// Classifies chapters and derives their guidance from a planned conflict curve.
#[derive(Debug, Clone)]
pub struct PlotManager {
    total_chapters: u32,
    phases: PhaseThresholds,
    escalator: ConflictEscalator,
}

impl PlotManager {
    pub fn new(total_chapters: u32, curve_type: CurveType) -> Self {
        Self::with_config(
            total_chapters,
            curve_type,
            PhaseThresholds::default(),
            EscalationConfig::default(),
        )
    }

    pub fn from_config(total_chapters: u32, config: &PlannerConfig) -> Self {
        Self::with_config(
            total_chapters,
            config.curve_type,
            config.phases,
            config.escalation,
        )
    }

    pub fn with_config(
        total_chapters: u32,
        curve_type: CurveType,
        phases: PhaseThresholds,
        escalation: EscalationConfig,
    ) -> Self {
        let mut escalator = ConflictEscalator::with_config(curve_type, escalation);
        escalator.plan_conflict_arc(total_chapters, None);
        info!(total_chapters, "plot manager ready");
        Self {
            total_chapters,
            phases,
            escalator,
        }
    }

    pub fn total_chapters(&self) -> u32 {
        self.total_chapters
    }

    pub fn escalator(&self) -> &ConflictEscalator {
        &self.escalator
    }

    pub fn conflict_curve(&self) -> &[f64] {
        self.escalator.curve()
    }

    /// Narrative phase of `chapter_num` by its position in the book.
    pub fn chapter_type(&self, chapter_num: u32, total_chapters: Option<u32>) -> ChapterType {
        if chapter_num == 1 {
            return ChapterType::Opening;
        }
        let total = total_chapters.unwrap_or(self.total_chapters);
        let progress = chapter_num as f64 / total as f64;

        if progress <= self.phases.setup {
            ChapterType::Setup
        } else if progress <= self.phases.development {
            ChapterType::Development
        } else if progress <= self.phases.escalation {
            ChapterType::Escalation
        } else if progress <= self.phases.climax {
            ChapterType::Climax
        } else {
            ChapterType::Resolution
        }
    }

    /// Planned curve value adjusted for the chapter's phase.
    pub fn conflict_level(&self, chapter_num: u32, chapter_type: Option<ChapterType>) -> f64 {
        let expected = self.escalator.intensity_at(chapter_num);
        match chapter_type.unwrap_or_else(|| self.chapter_type(chapter_num, None)) {
            ChapterType::Opening => expected.min(0.4),
            ChapterType::Setup => expected * 0.8,
            ChapterType::Climax => expected.max(0.8),
            ChapterType::Development | ChapterType::Escalation | ChapterType::Resolution => {
                expected
            }
        }
    }

    pub fn plot_guidance(
        &self,
        chapter_num: u32,
        total_chapters: Option<u32>,
        volume_num: Option<u32>,
        volume_context: Option<&str>,
    ) -> PlotGuidance {
        let total = total_chapters.unwrap_or(self.total_chapters);
        let chapter_type = self.chapter_type(chapter_num, Some(total));
        let conflict_level = self.conflict_level(chapter_num, Some(chapter_type));

        let guidance = PlotGuidance {
            chapter_num,
            chapter_type,
            chapter_type_name: chapter_type.display_name().to_string(),
            conflict_level,
            pacing_suggestions: pacing_suggestions(chapter_type, conflict_level),
            content_focus: to_strings(content_focus(chapter_type)),
            tone: tone(chapter_type, conflict_level),
            key_elements: to_strings(key_elements(chapter_type)),
            volume: volume_num.map(|volume_num| VolumeLink {
                volume_num,
                volume_context: volume_context.unwrap_or_default().to_string(),
            }),
        };

        info!(
            chapter = chapter_num,
            chapter_type = %chapter_type,
            "plot guidance: conflict level {:.2}",
            conflict_level
        );
        guidance
    }

    /// Check an observed intensity against the planned curve.
    pub fn validate_chapter_pacing(&self, chapter_num: u32, actual_intensity: f64) -> EscalationCheck {
        self.escalator.enforce(chapter_num, actual_intensity)
    }

    pub fn visualize_plot_curve(&self) -> String {
        self.escalator.visualize_curve(60)
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn pacing_suggestions(chapter_type: ChapterType, conflict_level: f64) -> Vec<String> {
    let base: &[&str] = match chapter_type {
        ChapterType::Opening => &[
            "introduce the protagonist and the core premise",
            "establish the story's tone and world",
            "plant an initial hook or goal",
            "keep a moderate pace, neither rushed nor slow",
        ],
        ChapterType::Setup => &[
            "deepen characterization",
            "unfold details of the world",
            "lay foreshadowing and clues",
            "raise the conflict gradually",
        ],
        ChapterType::Development => &[
            "advance the main plot",
            "develop character relationships",
            "set obstacles and challenges",
            "vary the rhythm",
        ],
        ChapterType::Escalation => &[
            "quicken the pace",
            "raise the conflict intensity",
            "build a sense of urgency",
            "prepare for the climax",
        ],
        ChapterType::Climax => &[
            "reach the peak of conflict",
            "resolve the central contradiction",
            "show the characters' growth",
            "deliver the emotional high point",
        ],
        ChapterType::Resolution => &[
            "tie off the plot threads",
            "give characters their endings",
            "answer the key mysteries",
            "leave the reader satisfied",
        ],
    };

    let mut suggestions = to_strings(base);
    if conflict_level > 0.7 {
        suggestions.push("maintain tension: keep action and dialogue tight".to_string());
    } else if conflict_level < 0.3 {
        suggestions.push("add breathing room such as description or recollection".to_string());
    }
    suggestions
}

fn content_focus(chapter_type: ChapterType) -> &'static [&'static str] {
    match chapter_type {
        ChapterType::Opening => &["character introduction", "background setting", "theme hint"],
        ChapterType::Setup => &["world building", "characterization", "clue laying"],
        ChapterType::Development => &["plot progression", "character development", "rising conflict"],
        ChapterType::Escalation => &["conflict intensification", "crisis", "emotional build-up"],
        ChapterType::Climax => &["decisive confrontation", "truth revealed", "character transformation"],
        ChapterType::Resolution => &["plot wrap-up", "character fates", "thematic elevation"],
    }
}

fn tone(chapter_type: ChapterType, conflict_level: f64) -> Tone {
    match chapter_type {
        ChapterType::Climax | ChapterType::Escalation => Tone::TenseAndFierce,
        ChapterType::Opening => Tone::Engaging,
        ChapterType::Resolution if conflict_level < 0.5 => Tone::WistfulAndCalm,
        ChapterType::Resolution => Tone::Rousing,
        ChapterType::Setup | ChapterType::Development => {
            if conflict_level > 0.6 {
                Tone::Urgent
            } else if conflict_level > 0.4 {
                Tone::Steady
            } else {
                Tone::Calm
            }
        }
    }
}

fn key_elements(chapter_type: ChapterType) -> &'static [&'static str] {
    match chapter_type {
        ChapterType::Opening => &["protagonist debut", "story starting point", "initial goal"],
        ChapterType::Setup => &["relationships", "background information", "foreshadowing"],
        ChapterType::Development => &["events advance", "character growth", "deepening conflict"],
        ChapterType::Escalation => &["mounting pressure", "time running out", "hard choices"],
        ChapterType::Climax => &["final showdown", "truth comes out", "emotional outburst"],
        ChapterType::Resolution => &["ending explained", "mysteries answered", "emotional afterglow"],
    }
}
