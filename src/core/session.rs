//! A generation session: one book's plan plus the consistency engines.
//!
//! Wires together volume planning, chapter guidance, escalation checks,
//! arc tracking, the event graph and the outline guard. Built via
//! `NovelSession::builder()`.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, PlannerConfig};
use crate::core::arc::{ArcConfigError, CharacterArcTracker};
use crate::core::escalation::{EscalationCheck, Saturation};
use crate::core::events::EventDependencyGraph;
use crate::core::plot::PlotManager;
use crate::core::similarity::OutlineCheck;
use crate::core::volume::{VolumeError, VolumeManager};
use crate::schema::arc::ArcCheck;
use crate::schema::chapter::PlotGuidance;
use crate::schema::event::{IntegrityReport, StoryEvent};
use crate::schema::volume::{PlanDecodeError, VolumePlan};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("arc config error: {0}")]
    ArcConfig(#[from] ArcConfigError),
    #[error("volume error: {0}")]
    Volume(#[from] VolumeError),
    #[error("plan error: {0}")]
    Plan(#[from] PlanDecodeError),
    #[error("a chapter count or a saved plan is required")]
    MissingChapterCount,
    #[error("chapter {0} is not in the volume plan")]
    ChapterOutOfRange(u32),
}

/// What the caller knows about a freshly written chapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterDraft {
    pub chapter_num: u32,
    pub outline: Option<String>,
    /// Conflict intensity the caller measured for the chapter, in `[0, 1]`.
    pub observed_intensity: Option<f64>,
    /// Character name to the state they are in by the end of the chapter.
    pub character_states: BTreeMap<String, String>,
    pub events: Vec<StoryEvent>,
}

impl ChapterDraft {
    pub fn new(chapter_num: u32) -> Self {
        Self {
            chapter_num,
            ..Self::default()
        }
    }

    pub fn outline(mut self, outline: impl Into<String>) -> Self {
        self.outline = Some(outline.into());
        self
    }

    pub fn intensity(mut self, intensity: f64) -> Self {
        self.observed_intensity = Some(intensity);
        self
    }

    pub fn state(mut self, character: impl Into<String>, state: impl Into<String>) -> Self {
        self.character_states.insert(character.into(), state.into());
        self
    }

    pub fn event(mut self, event: StoryEvent) -> Self {
        self.events.push(event);
        self
    }
}

/// Everything the engines report about one chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterReview {
    pub chapter_num: u32,
    pub volume_num: u32,
    pub guidance: PlotGuidance,
    pub escalation: Option<EscalationCheck>,
    pub saturation: Saturation,
    pub arc_checks: Vec<ArcCheck>,
    pub outline_check: Option<OutlineCheck>,
    /// Present when the chapter registered events.
    pub integrity: Option<IntegrityReport>,
    pub volume_complete: bool,
    pub volume_end_reason: String,
}

impl ChapterReview {
    /// True when no engine reported a hard inconsistency.
    pub fn is_clean(&self) -> bool {
        self.escalation.as_ref().map_or(true, |c| c.is_acceptable)
            && !self.saturation.is_saturated
            && self.arc_checks.iter().all(|c| c.is_consistent)
            && self.outline_check.as_ref().map_or(true, |c| c.is_valid)
            && self.integrity.as_ref().map_or(true, |r| r.is_valid)
    }
}

/// The top-level planner session. Built via `NovelSession::builder()`.
pub struct NovelSession {
    config: PlannerConfig,
    plot: PlotManager,
    volumes: VolumeManager,
    arcs: CharacterArcTracker,
    events: EventDependencyGraph,
    intensity_history: Vec<f64>,
    outlines: FxHashMap<u32, Vec<String>>,
    chapters_written: FxHashMap<u32, u32>,
}

/// Builder for constructing a `NovelSession`.
pub struct NovelSessionBuilder {
    title: String,
    genre: String,
    theme: String,
    total_chapters: Option<u32>,
    chapters_per_volume: Option<u32>,
    config_path: Option<String>,
    arcs_path: Option<String>,
    plan_path: Option<String>,
    /// Directly provided config (for testing without files).
    config: Option<PlannerConfig>,
    /// Directly provided arcs (for testing without files).
    arcs: Option<CharacterArcTracker>,
    /// Directly provided plan (for testing without files).
    plan: Option<VolumePlan>,
}

impl NovelSession {
    pub fn builder() -> NovelSessionBuilder {
        NovelSessionBuilder {
            title: String::new(),
            genre: String::new(),
            theme: String::new(),
            total_chapters: None,
            chapters_per_volume: None,
            config_path: None,
            arcs_path: None,
            plan_path: None,
            config: None,
            arcs: None,
            plan: None,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn plot(&self) -> &PlotManager {
        &self.plot
    }

    pub fn volumes(&self) -> &VolumeManager {
        &self.volumes
    }

    pub fn plan(&self) -> Option<&VolumePlan> {
        self.volumes.plan()
    }

    pub fn arcs(&self) -> &CharacterArcTracker {
        &self.arcs
    }

    pub fn arcs_mut(&mut self) -> &mut CharacterArcTracker {
        &mut self.arcs
    }

    pub fn events(&self) -> &EventDependencyGraph {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventDependencyGraph {
        &mut self.events
    }

    pub fn intensity_history(&self) -> &[f64] {
        &self.intensity_history
    }

    /// Guidance for a chapter before it is written.
    pub fn guidance(&self, chapter_num: u32) -> Result<PlotGuidance, SessionError> {
        let volume = self
            .volumes
            .volume_for_chapter(chapter_num)
            .ok_or(SessionError::ChapterOutOfRange(chapter_num))?;
        Ok(self.plot.plot_guidance(
            chapter_num,
            None,
            Some(volume.volume_num),
            Some(&volume.theme),
        ))
    }

    /// Run every per-chapter check and record the chapter.
    ///
    /// Each call counts as one more chapter written in its volume.
    pub fn review_chapter(&mut self, draft: &ChapterDraft) -> Result<ChapterReview, SessionError> {
        let chapter_num = draft.chapter_num;
        let volume_num = self
            .volumes
            .volume_for_chapter(chapter_num)
            .map(|v| v.volume_num)
            .ok_or(SessionError::ChapterOutOfRange(chapter_num))?;
        let guidance = self.guidance(chapter_num)?;

        let escalation = draft.observed_intensity.map(|intensity| {
            self.intensity_history.push(intensity);
            self.plot.validate_chapter_pacing(chapter_num, intensity)
        });
        let saturation = self.plot.escalator().detect_saturation(&self.intensity_history);
        if saturation.is_saturated {
            warn!(chapter = chapter_num, "{}", saturation.message);
        }

        let arc_checks: Vec<ArcCheck> = draft
            .character_states
            .iter()
            .map(|(character, state)| {
                self.arcs
                    .check_consistency(character, chapter_num, state, draft.outline.as_deref())
            })
            .collect();

        let integrity = if draft.events.is_empty() {
            None
        } else {
            for event in &draft.events {
                self.events.insert(event.clone());
            }
            Some(self.events.validate_integrity())
        };

        let prior = self.outlines.entry(volume_num).or_default();
        let outline_check = draft.outline.as_ref().map(|outline| {
            let check = self
                .volumes
                .validator()
                .validate_chapter_outline(outline, prior.as_slice(), chapter_num);
            prior.push(outline.clone());
            check
        });

        let written = self.chapters_written.entry(volume_num).or_insert(0);
        *written += 1;
        let (volume_complete, volume_end_reason) =
            self.volumes
                .should_end_volume(volume_num, *written, chapter_num)?;

        let review = ChapterReview {
            chapter_num,
            volume_num,
            guidance,
            escalation,
            saturation,
            arc_checks,
            outline_check,
            integrity,
            volume_complete,
            volume_end_reason,
        };
        info!(
            chapter = chapter_num,
            volume = volume_num,
            clean = review.is_clean(),
            volume_complete,
            "chapter reviewed"
        );
        Ok(review)
    }
}

impl NovelSessionBuilder {
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn genre(mut self, genre: &str) -> Self {
        self.genre = genre.to_string();
        self
    }

    pub fn theme(mut self, theme: &str) -> Self {
        self.theme = theme.to_string();
        self
    }

    pub fn total_chapters(mut self, total: u32) -> Self {
        self.total_chapters = Some(total);
        self
    }

    pub fn chapters_per_volume(mut self, size: u32) -> Self {
        self.chapters_per_volume = Some(size);
        self
    }

    pub fn config_file(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    pub fn arcs_file(mut self, path: &str) -> Self {
        self.arcs_path = Some(path.to_string());
        self
    }

    /// Resume from a saved plan instead of planning afresh.
    pub fn plan_file(mut self, path: &str) -> Self {
        self.plan_path = Some(path.to_string());
        self
    }

    /// Provide config directly (for testing without files).
    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Provide arcs directly (for testing without files).
    pub fn with_arcs(mut self, arcs: CharacterArcTracker) -> Self {
        self.arcs = Some(arcs);
        self
    }

    /// Provide a plan directly (for testing without files).
    pub fn with_plan(mut self, plan: VolumePlan) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn build(self) -> Result<NovelSession, SessionError> {
        let config = match (self.config, &self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) if Path::new(path).exists() => {
                PlannerConfig::load_from_ron(Path::new(path))?
            }
            (None, Some(path)) => {
                warn!(path = %path, "config file not found, using defaults");
                PlannerConfig::default()
            }
            (None, None) => PlannerConfig::default(),
        };

        let plan = match (self.plan, &self.plan_path) {
            (Some(plan), _) => Some(plan),
            (None, Some(path)) => Some(VolumePlan::load(Path::new(path))?),
            (None, None) => None,
        };

        let total_chapters = plan
            .as_ref()
            .map(|p| p.total_chapters)
            .or(self.total_chapters)
            .ok_or(SessionError::MissingChapterCount)?;

        let plot = PlotManager::from_config(total_chapters, &config);
        let mut volumes = VolumeManager::from_config(&config).with_plot_manager(plot.clone());
        match plan {
            Some(plan) => {
                volumes.load_plan(plan)?;
            }
            None => {
                volumes.plan_volumes(
                    &self.title,
                    &self.genre,
                    &self.theme,
                    total_chapters,
                    self.chapters_per_volume,
                )?;
            }
        }

        let mut arcs = self.arcs.unwrap_or_default();
        if let Some(ref path) = self.arcs_path {
            let report = arcs.load_from_json_file(Path::new(path))?;
            info!(
                path = %path,
                loaded = report.loaded.len(),
                skipped = report.skipped.len(),
                "arc configuration applied"
            );
        }

        info!(
            total_chapters,
            characters = arcs.len(),
            "novel session ready"
        );

        Ok(NovelSession {
            config,
            plot,
            volumes,
            arcs,
            events: EventDependencyGraph::new(),
            intensity_history: Vec::new(),
            outlines: FxHashMap::default(),
            chapters_written: FxHashMap::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn hero_arcs() -> CharacterArcTracker {
        let mut arcs = CharacterArcTracker::new();
        arcs.add_character_arc(
            "林远",
            ["普通人", "觉醒", "成长", "蜕变", "强者"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            BTreeMap::from([(1, "普通人".to_string()), (10, "觉醒".to_string()), (20, "成长".to_string())]),
            Vec::new(),
        );
        arcs
    }

    fn session() -> NovelSession {
        NovelSession::builder()
            .title("Ember")
            .genre("fantasy")
            .theme("defying fate")
            .total_chapters(30)
            .with_arcs(hero_arcs())
            .build()
            .unwrap()
    }

    #[test]
    fn builder_plans_volumes() {
        let s = session();
        let plan = s.plan().unwrap();
        assert_eq!(plan.total_volumes, 2);
        assert_eq!(s.plot().total_chapters(), 30);
        assert_eq!(s.arcs().len(), 1);
    }

    #[test]
    fn builder_needs_a_length() {
        let err = NovelSession::builder().title("x").build().err().unwrap();
        assert!(matches!(err, SessionError::MissingChapterCount));
    }

    #[test]
    fn builder_resumes_from_plan() {
        let plan = session().plan().unwrap().clone();
        let resumed = NovelSession::builder().with_plan(plan.clone()).build().unwrap();
        assert_eq!(resumed.plan(), Some(&plan));
        assert_eq!(resumed.plot().total_chapters(), 30);
    }

    #[test]
    fn clean_chapter_review() {
        let mut s = session();
        let expected = s.plot().escalator().intensity_at(12);
        let draft = ChapterDraft::new(12)
            .outline("林远在山谷中第一次感受到体内的力量，决定离开村庄寻找师父。")
            .intensity(expected)
            .state("林远", "觉醒")
            .event(StoryEvent::new("awakening", 12).describe("power awakens"));
        let review = s.review_chapter(&draft).unwrap();

        assert_eq!(review.volume_num, 1);
        assert!(review.escalation.as_ref().unwrap().is_acceptable);
        assert_eq!(review.arc_checks.len(), 1);
        assert!(review.arc_checks[0].is_consistent);
        assert!(review.outline_check.as_ref().unwrap().is_valid);
        assert!(review.integrity.as_ref().unwrap().is_valid);
        assert!(!review.volume_complete);
        assert!(review.is_clean());
        assert_eq!(s.intensity_history(), &[expected]);
        assert_eq!(s.events().len(), 1);
    }

    #[test]
    fn regression_and_duplicate_outline_are_flagged() {
        let mut s = session();
        let outline = "林远与宿敌在城门外决战，最终击败对手，赢得众人尊重。";
        s.review_chapter(&ChapterDraft::new(20).outline(outline)).unwrap();

        let review = s
            .review_chapter(&ChapterDraft::new(21).outline(outline).state("林远", "觉醒"))
            .unwrap();
        assert!(review.arc_checks[0].is_regression);
        assert!(!review.outline_check.as_ref().unwrap().is_valid);
        assert!(!review.is_clean());
    }

    #[test]
    fn outlines_are_compared_within_a_volume_only() {
        let mut s = session();
        let outline = "林远与宿敌在城门外决战，最终击败对手，赢得众人尊重。";
        s.review_chapter(&ChapterDraft::new(15).outline(outline)).unwrap();
        let review = s.review_chapter(&ChapterDraft::new(16).outline(outline)).unwrap();
        assert_eq!(review.volume_num, 2);
        assert!(review.outline_check.unwrap().is_valid);
    }

    #[test]
    fn last_planned_chapter_completes_the_volume() {
        let mut s = session();
        let review = s.review_chapter(&ChapterDraft::new(15)).unwrap();
        assert!(review.volume_complete);
        assert!(review.volume_end_reason.contains("boundary"));
        assert!(review.escalation.is_none());
        assert!(review.integrity.is_none());
    }

    #[test]
    fn sustained_intensity_saturates() {
        let mut s = session();
        let mut last = None;
        for chapter in 2..=6 {
            last = Some(s.review_chapter(&ChapterDraft::new(chapter).intensity(0.95)).unwrap());
        }
        let review = last.unwrap();
        assert!(review.saturation.is_saturated);
        assert!(!review.escalation.unwrap().is_acceptable);
    }

    #[test]
    fn chapters_outside_the_plan_are_errors() {
        let mut s = session();
        assert!(matches!(
            s.review_chapter(&ChapterDraft::new(31)),
            Err(SessionError::ChapterOutOfRange(31))
        ));
        assert!(s.guidance(0).is_err());
    }
}
