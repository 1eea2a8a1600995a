//! Volume planning: partitions a book into volumes and drives the
//! volume-level generation passes.
//!
//! The plan is the single source of truth for volume boundaries. Every
//! generation call and `should_end_volume` fail with [`VolumeError`] when the
//! plan is missing or the volume number is out of range; data-quality problems
//! in generated outlines are only logged.

use thiserror::Error;
use tracing::{info, warn};

use crate::config::{PlannerConfig, VolumeSizing};
use crate::core::generator::{GenerationError, GenerationOptions, TextGenerator};
use crate::core::plot::PlotManager;
use crate::core::similarity::OutlineValidator;
use crate::schema::volume::{PlanDecodeError, Volume, VolumePlan};

const PREVIOUS_OUTLINE_PREVIEW: usize = 200;
const CHAPTER_PREVIEW: usize = 300;

#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("volumes are not planned; call plan_volumes first")]
    NotPlanned,
    #[error("volume {volume_num} is out of range (plan has {total_volumes} volumes)")]
    VolumeOutOfRange { volume_num: u32, total_volumes: u32 },
    #[error("a book needs at least one chapter")]
    NoChapters,
    #[error("chapters per volume must be at least 1")]
    InvalidVolumeSize,
    #[error("invalid volume plan: {0}")]
    InvalidPlan(#[from] PlanDecodeError),
    #[error("text generation failed: {0}")]
    Generation(#[from] GenerationError),
}

/// Owns the volume plan and builds the volume-level prompts.
#[derive(Debug, Clone)]
pub struct VolumeManager {
    validator: OutlineValidator,
    plot_manager: Option<PlotManager>,
    sizing: VolumeSizing,
    end_slack: u32,
    options: GenerationOptions,
    plan: Option<VolumePlan>,
}

impl Default for VolumeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeManager {
    pub fn new() -> Self {
        Self::from_config(&PlannerConfig::default())
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            validator: OutlineValidator::new(config.similarity),
            plot_manager: None,
            sizing: config.volume_sizing.clone(),
            end_slack: config.volume_end_slack,
            options: GenerationOptions::default(),
            plan: None,
        }
    }

    pub fn with_plot_manager(mut self, plot_manager: PlotManager) -> Self {
        self.plot_manager = Some(plot_manager);
        self
    }

    pub fn with_validator(mut self, validator: OutlineValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_generation_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn plot_manager(&self) -> Option<&PlotManager> {
        self.plot_manager.as_ref()
    }

    pub fn validator(&self) -> &OutlineValidator {
        &self.validator
    }

    pub fn plan(&self) -> Option<&VolumePlan> {
        self.plan.as_ref()
    }

    /// Partition `total_chapters` into contiguous volumes.
    ///
    /// Without an explicit size the chapters-per-volume comes from the
    /// configured sizing bands. Replaces any previous plan.
    pub fn plan_volumes(
        &mut self,
        title: &str,
        genre: &str,
        theme: &str,
        total_chapters: u32,
        chapters_per_volume: Option<u32>,
    ) -> Result<&VolumePlan, VolumeError> {
        if total_chapters == 0 {
            return Err(VolumeError::NoChapters);
        }
        let size = chapters_per_volume.unwrap_or_else(|| self.sizing.chapters_per_volume(total_chapters));
        if size == 0 {
            return Err(VolumeError::InvalidVolumeSize);
        }
        let total_volumes = total_chapters.div_ceil(size);

        info!(
            total_chapters,
            chapters_per_volume = size,
            total_volumes,
            "planning volumes"
        );

        let volumes = (1..=total_volumes)
            .map(|volume_num| {
                let start_chapter = (volume_num - 1) * size + 1;
                let end_chapter = volume_num.saturating_mul(size).min(total_chapters);
                Volume {
                    volume_num,
                    title: volume_title(volume_num, total_volumes, title),
                    theme: volume_theme(volume_num, total_volumes, theme),
                    start_chapter,
                    end_chapter,
                    chapter_count: end_chapter - start_chapter + 1,
                }
            })
            .collect();

        let plan = self.plan.insert(VolumePlan {
            title: title.to_string(),
            genre: genre.to_string(),
            theme: theme.to_string(),
            total_chapters,
            total_volumes,
            chapters_per_volume: size,
            volumes,
        });
        info!(total_volumes, "volume plan ready");
        Ok(plan)
    }

    /// Install a previously persisted plan after checking its partition.
    pub fn load_plan(&mut self, plan: VolumePlan) -> Result<&VolumePlan, VolumeError> {
        plan.validate()?;
        info!(
            title = %plan.title,
            total_volumes = plan.total_volumes,
            "volume plan loaded"
        );
        Ok(self.plan.insert(plan))
    }

    /// A copy of volume `volume_num`, or `None` when unplanned or out of range.
    pub fn volume_info(&self, volume_num: u32) -> Option<Volume> {
        self.plan.as_ref()?.volume(volume_num).cloned()
    }

    pub fn volume_for_chapter(&self, chapter_num: u32) -> Option<&Volume> {
        self.plan.as_ref()?.volume_for_chapter(chapter_num)
    }

    fn planned_volume(&self, volume_num: u32) -> Result<(&VolumePlan, &Volume), VolumeError> {
        let plan = self.plan.as_ref().ok_or(VolumeError::NotPlanned)?;
        let volume = plan.volume(volume_num).ok_or(VolumeError::VolumeOutOfRange {
            volume_num,
            total_volumes: plan.total_volumes,
        })?;
        Ok((plan, volume))
    }

    /// Decide whether volume `volume_num` is complete.
    ///
    /// Ends at the planned boundary, or once the volume has run `end_slack`
    /// chapters past its planned size. The reason is empty when continuing.
    pub fn should_end_volume(
        &self,
        volume_num: u32,
        chapters_in_volume: u32,
        current_chapter: u32,
    ) -> Result<(bool, String), VolumeError> {
        let (_, volume) = self.planned_volume(volume_num)?;

        if current_chapter >= volume.end_chapter {
            return Ok((
                true,
                format!(
                    "reached the planned boundary of volume {volume_num} (chapter {})",
                    volume.end_chapter
                ),
            ));
        }
        if chapters_in_volume >= volume.chapter_count.saturating_add(self.end_slack) {
            return Ok((
                true,
                format!(
                    "volume {volume_num} has run past its plan ({chapters_in_volume}/{} chapters)",
                    volume.chapter_count
                ),
            ));
        }
        Ok((false, String::new()))
    }

    pub fn generate_volume_outline(
        &self,
        volume_num: u32,
        generator: Option<&mut dyn TextGenerator>,
    ) -> Result<String, VolumeError> {
        let (plan, volume) = self.planned_volume(volume_num)?;
        info!(volume = volume_num, "generating volume outline");

        let outline = match generator {
            Some(generator) => {
                let prompt = volume_outline_prompt(plan, volume);
                generate_non_empty(generator, &prompt, &self.options)?
            }
            None => default_volume_outline(plan, volume),
        };

        info!(
            volume = volume_num,
            chars = outline.chars().count(),
            "volume outline ready"
        );
        Ok(outline)
    }

    /// One outline per chapter of the volume, each checked against the
    /// outlines produced before it. Failed checks are logged, not fatal.
    pub fn generate_chapter_outlines(
        &self,
        volume_num: u32,
        volume_outline: &str,
        mut generator: Option<&mut dyn TextGenerator>,
    ) -> Result<Vec<String>, VolumeError> {
        let (plan, volume) = self.planned_volume(volume_num)?;
        info!(
            volume = volume_num,
            "generating chapter outlines {}-{}",
            volume.start_chapter,
            volume.end_chapter
        );

        let mut outlines: Vec<String> = Vec::with_capacity(volume.chapter_count as usize);
        for chapter_num in volume.start_chapter..=volume.end_chapter {
            let outline = match generator.as_deref_mut() {
                Some(generator) => {
                    let prompt = self.chapter_outline_prompt(plan, volume, chapter_num, volume_outline, &outlines);
                    generator.generate(&prompt, &self.options)?
                }
                None => format!("Chapter {chapter_num} outline (pending)"),
            };

            let check = self
                .validator
                .validate_chapter_outline(&outline, &outlines, chapter_num);
            if !check.is_valid {
                warn!(
                    chapter = chapter_num,
                    errors = ?check.errors,
                    "chapter outline failed validation"
                );
            }
            outlines.push(outline);
        }

        info!(volume = volume_num, chapters = outlines.len(), "chapter outlines ready");
        Ok(outlines)
    }

    pub fn generate_volume_summary(
        &self,
        volume_num: u32,
        chapter_contents: &[String],
        generator: Option<&mut dyn TextGenerator>,
    ) -> Result<String, VolumeError> {
        let (plan, volume) = self.planned_volume(volume_num)?;
        info!(volume = volume_num, "generating volume summary");

        let summary = match generator {
            Some(generator) => {
                let prompt = volume_summary_prompt(plan, volume, chapter_contents);
                generate_non_empty(generator, &prompt, &self.options)?
            }
            None => default_volume_summary(volume, chapter_contents),
        };

        info!(
            volume = volume_num,
            chars = summary.chars().count(),
            "volume summary ready"
        );
        Ok(summary)
    }

    fn chapter_outline_prompt(
        &self,
        plan: &VolumePlan,
        volume: &Volume,
        chapter_num: u32,
        volume_outline: &str,
        previous_outlines: &[String],
    ) -> String {
        let guidance = self
            .plot_manager
            .as_ref()
            .map(|pm| {
                let g = pm.plot_guidance(
                    chapter_num,
                    Some(plan.total_chapters),
                    Some(volume.volume_num),
                    Some(&volume.theme),
                );
                format!(
                    "\nPlot guidance:\n\
                     - Chapter type: {}\n\
                     - Conflict intensity: {:.2}\n\
                     - Content focus: {}\n\
                     - Tone: {}\n",
                    g.chapter_type_name,
                    g.conflict_level,
                    g.content_focus.join(", "),
                    g.tone.label()
                )
            })
            .unwrap_or_default();

        let previous = previous_outlines
            .last()
            .map(|prev| {
                format!(
                    "\n[Previous chapter outline]\n{}...\n",
                    preview(prev, PREVIOUS_OUTLINE_PREVIEW)
                )
            })
            .unwrap_or_default();

        let position = chapter_num - volume.start_chapter + 1;
        format!(
            "Write a detailed outline for chapter {chapter_num} of the following novel.\n\
             \n\
             Novel:\n\
             - Title: {title}\n\
             - Genre: {genre}\n\
             \n\
             Volume:\n\
             - Volume {volume_num}: {volume_title}\n\
             - Volume theme: {volume_theme}\n\
             \n\
             [Volume outline]\n\
             {volume_outline}\n\
             {previous}{guidance}\n\
             Task:\n\
             - Outline chapter {chapter_num}\n\
             - Position: chapter {position} of volume {volume_num}\n\
             - Overall progress: chapter {chapter_num}/{total}\n\
             \n\
             The outline (200-300 words) should cover:\n\
             1. The chapter's core event\n\
             2. Character development focus\n\
             3. Foreshadowing for the next chapter\n\
             4. How conflict or tension is set up\n\
             \n\
             Begin the outline:",
            title = plan.title,
            genre = plan.genre,
            volume_num = volume.volume_num,
            volume_title = volume.title,
            volume_theme = volume.theme,
            total = plan.total_chapters,
        )
    }
}

/// Volume-level text must not come back blank.
fn generate_non_empty(
    generator: &mut dyn TextGenerator,
    prompt: &str,
    options: &GenerationOptions,
) -> Result<String, GenerationError> {
    let text = generator.generate(prompt, options)?;
    if text.trim().is_empty() {
        return Err(GenerationError::Empty);
    }
    Ok(text)
}

fn volume_title(volume_num: u32, total_volumes: u32, base_title: &str) -> String {
    if total_volumes == 1 {
        base_title.to_string()
    } else if volume_num == 1 {
        format!("{base_title} - Volume 1: Beginning")
    } else if volume_num == total_volumes {
        format!("{base_title} - Volume {volume_num}: Ending")
    } else {
        format!("{base_title} - Volume {volume_num}")
    }
}

fn volume_theme(volume_num: u32, total_volumes: u32, base_theme: &str) -> String {
    let progress = volume_num as f64 / total_volumes as f64;
    let stage = if progress <= 0.33 {
        "origin and exploration"
    } else if progress <= 0.67 {
        "growth and challenge"
    } else {
        "climax and resolution"
    };
    format!("{base_theme} - {stage}")
}

/// First `max_chars` characters of `text`.
fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn volume_outline_prompt(plan: &VolumePlan, volume: &Volume) -> String {
    format!(
        "Write a detailed outline for volume {n} of the following novel.\n\
         \n\
         Novel:\n\
         - Title: {title}\n\
         - Genre: {genre}\n\
         - Theme: {theme}\n\
         \n\
         Volume:\n\
         - Volume {n} of {total}\n\
         - Volume title: {vtitle}\n\
         - Volume theme: {vtheme}\n\
         - Chapters {start}-{end} ({count} chapters)\n\
         \n\
         The outline should contain:\n\
         1. [Synopsis] (200-300 words): the core events, how the main conflict develops, the characters' growth\n\
         2. [Turning points]: the 3-5 key events of this volume\n\
         3. [Chapter plan]: a short note on where each chapter is heading\n\
         \n\
         Begin the outline:",
        n = volume.volume_num,
        title = plan.title,
        genre = plan.genre,
        theme = plan.theme,
        total = plan.total_volumes,
        vtitle = volume.title,
        vtheme = volume.theme,
        start = volume.start_chapter,
        end = volume.end_chapter,
        count = volume.chapter_count,
    )
}

fn default_volume_outline(plan: &VolumePlan, volume: &Volume) -> String {
    format!(
        "[Volume {n} outline]\n\
         \n\
         Title: {vtitle}\n\
         Theme: {vtheme}\n\
         Chapters: {start}-{end}\n\
         \n\
         [Synopsis]\n\
         This volume picks up from what came before and continues the theme of {theme}.\n\
         The story enters a new stage at chapter {start} and advances the main plot over {count} chapters.\n\
         \n\
         [Turning points]\n\
         (to be planned)\n\
         \n\
         [Chapter plan]\n\
         Each chapter unfolds the volume theme while keeping pace and tension.\n",
        n = volume.volume_num,
        vtitle = volume.title,
        vtheme = volume.theme,
        start = volume.start_chapter,
        end = volume.end_chapter,
        theme = plan.theme,
        count = volume.chapter_count,
    )
}

fn volume_summary_prompt(plan: &VolumePlan, volume: &Volume, chapter_contents: &[String]) -> String {
    let previews = chapter_contents
        .iter()
        .enumerate()
        .map(|(i, content)| {
            let chapter_num = volume.start_chapter + i as u32;
            let head = preview(content, CHAPTER_PREVIEW);
            let ellipsis = if head.len() < content.len() { "..." } else { "" };
            format!("Chapter {chapter_num} preview:\n{head}{ellipsis}")
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Write a summary of volume {n} of the following novel.\n\
         \n\
         Novel:\n\
         - Title: {title}\n\
         - Volume {n}: {vtitle}\n\
         - Chapters {start}-{end}\n\
         \n\
         [Chapter previews]\n\
         {previews}\n\
         \n\
         The summary (400-600 words) should cover:\n\
         1. The main events of the volume\n\
         2. Character growth and changing relationships\n\
         3. Important foreshadowing and turning points\n\
         4. Groundwork for the next volume\n\
         \n\
         Begin the summary:",
        n = volume.volume_num,
        title = plan.title,
        vtitle = volume.title,
        start = volume.start_chapter,
        end = volume.end_chapter,
    )
}

fn default_volume_summary(volume: &Volume, chapter_contents: &[String]) -> String {
    let total_chars: usize = chapter_contents.iter().map(|c| c.chars().count()).sum();
    format!(
        "[Volume {n} summary]\n\
         \n\
         Title: {vtitle}\n\
         Covers chapters {start}-{end}, {written} chapters in all.\n\
         \n\
         The volume advances the main plot through a series of events while the characters grow and change.\n\
         Its turning points lay groundwork for the next volume.\n\
         \n\
         Total length: about {total_chars} characters\n",
        n = volume.volume_num,
        vtitle = volume.title,
        start = volume.start_chapter,
        end = volume.end_chapter,
        written = chapter_contents.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::curve::CurveType;

    fn planned(total: u32) -> VolumeManager {
        let mut vm = VolumeManager::new();
        vm.plan_volumes("Ember", "fantasy", "defying fate", total, None)
            .unwrap();
        vm
    }

    #[test]
    fn thirty_chapters_split_in_two() {
        let vm = planned(30);
        let plan = vm.plan().unwrap();
        assert_eq!(plan.total_volumes, 2);
        assert_eq!(plan.chapters_per_volume, 15);
        let spans: Vec<_> = plan
            .volumes
            .iter()
            .map(|v| (v.start_chapter, v.end_chapter, v.chapter_count))
            .collect();
        assert_eq!(spans, vec![(1, 15, 15), (16, 30, 15)]);
        assert_eq!(plan.volumes[0].title, "Ember - Volume 1: Beginning");
        assert_eq!(plan.volumes[1].title, "Ember - Volume 2: Ending");
        assert_eq!(plan.volumes[0].theme, "defying fate - growth and challenge");
        assert_eq!(plan.volumes[1].theme, "defying fate - climax and resolution");
        plan.validate().unwrap();
    }

    #[test]
    fn short_book_is_one_volume() {
        let vm = planned(12);
        let plan = vm.plan().unwrap();
        assert_eq!(plan.total_volumes, 1);
        assert_eq!(plan.volumes[0].title, "Ember");
        assert_eq!(plan.volumes[0].end_chapter, 12);
    }

    #[test]
    fn long_book_has_short_last_volume() {
        let vm = planned(201);
        let plan = vm.plan().unwrap();
        assert_eq!(plan.chapters_per_volume, 30);
        assert_eq!(plan.total_volumes, 7);
        let last = plan.volumes.last().unwrap();
        assert_eq!((last.start_chapter, last.end_chapter, last.chapter_count), (181, 201, 21));
        assert_eq!(plan.volumes[3].title, "Ember - Volume 4");
        assert_eq!(plan.volumes[0].theme, "defying fate - origin and exploration");
        plan.validate().unwrap();
    }

    #[test]
    fn explicit_size_and_bad_inputs() {
        let mut vm = VolumeManager::new();
        let plan = vm.plan_volumes("t", "g", "th", 10, Some(4)).unwrap();
        assert_eq!(plan.total_volumes, 3);
        assert_eq!(plan.volumes[2].chapter_count, 2);

        assert!(matches!(
            vm.plan_volumes("t", "g", "th", 0, None),
            Err(VolumeError::NoChapters)
        ));
        assert!(matches!(
            vm.plan_volumes("t", "g", "th", 10, Some(0)),
            Err(VolumeError::InvalidVolumeSize)
        ));
    }

    #[test]
    fn volume_boundary_ends_volume() {
        let vm = planned(30);
        let (end, reason) = vm.should_end_volume(1, 10, 15).unwrap();
        assert!(end);
        assert!(reason.contains("boundary"));
        assert_eq!(vm.should_end_volume(1, 10, 14).unwrap(), (false, String::new()));
    }

    #[test]
    fn slack_forces_end() {
        let vm = planned(30);
        assert!(!vm.should_end_volume(1, 16, 14).unwrap().0);
        let (end, reason) = vm.should_end_volume(1, 17, 14).unwrap();
        assert!(end);
        assert!(reason.contains("17/15"));
    }

    #[test]
    fn huge_slack_never_forces_an_end() {
        let mut config = PlannerConfig::default();
        config.volume_end_slack = u32::MAX;
        let mut vm = VolumeManager::from_config(&config);
        vm.plan_volumes("t", "g", "th", 30, None).unwrap();
        assert_eq!(vm.should_end_volume(1, 1000, 14).unwrap(), (false, String::new()));
        assert!(vm.should_end_volume(1, 1000, 15).unwrap().0);
    }

    #[test]
    fn preconditions_fail_loudly() {
        let vm = VolumeManager::new();
        assert!(matches!(vm.should_end_volume(1, 1, 1), Err(VolumeError::NotPlanned)));
        assert!(matches!(vm.generate_volume_outline(1, None), Err(VolumeError::NotPlanned)));

        let vm = planned(30);
        assert!(matches!(
            vm.should_end_volume(3, 1, 1),
            Err(VolumeError::VolumeOutOfRange { volume_num: 3, total_volumes: 2 })
        ));
        assert!(matches!(
            vm.generate_chapter_outlines(0, "", None),
            Err(VolumeError::VolumeOutOfRange { .. })
        ));
        assert!(vm.volume_info(3).is_none());
        assert_eq!(vm.volume_info(2).map(|v| v.start_chapter), Some(16));
        assert_eq!(vm.volume_for_chapter(15).map(|v| v.volume_num), Some(1));
    }

    #[test]
    fn reloaded_plan_makes_identical_decisions() {
        let vm = planned(30);
        let mut value = serde_json::to_value(vm.plan().unwrap()).unwrap();
        // Simulate a serializer that renders numbers as strings.
        for volume in value["volumes"].as_array_mut().unwrap() {
            for key in ["volume_num", "start_chapter", "end_chapter", "chapter_count"] {
                let n = volume[key].as_u64().unwrap();
                volume[key] = serde_json::Value::String(n.to_string());
            }
        }
        value["total_volumes"] = serde_json::Value::String("2".to_string());

        let mut reloaded = VolumeManager::new();
        reloaded
            .load_plan(VolumePlan::from_json_value(value).unwrap())
            .unwrap();

        for volume_num in 1..=2 {
            for chapters_in_volume in 0..=18 {
                for current in 1..=30 {
                    assert_eq!(
                        vm.should_end_volume(volume_num, chapters_in_volume, current).unwrap(),
                        reloaded
                            .should_end_volume(volume_num, chapters_in_volume, current)
                            .unwrap()
                    );
                }
            }
        }
    }

    #[test]
    fn inconsistent_plan_is_refused() {
        let vm = planned(30);
        let mut plan = vm.plan().unwrap().clone();
        plan.volumes[1].start_chapter = 15;
        let mut other = VolumeManager::new();
        assert!(matches!(other.load_plan(plan), Err(VolumeError::InvalidPlan(_))));
        assert!(other.plan().is_none());
    }

    #[test]
    fn offline_outlines_use_templates() {
        let vm = planned(30);
        let outline = vm.generate_volume_outline(2, None).unwrap();
        assert!(outline.contains("[Volume 2 outline]"));
        assert!(outline.contains("Chapters: 16-30"));

        let chapters = vm.generate_chapter_outlines(2, &outline, None).unwrap();
        assert_eq!(chapters.len(), 15);
        assert_eq!(chapters[0], "Chapter 16 outline (pending)");

        let summary = vm
            .generate_volume_summary(2, &["abc".to_string(), "de".to_string()], None)
            .unwrap();
        assert!(summary.contains("2 chapters in all"));
        assert!(summary.contains("about 5 characters"));
    }

    #[test]
    fn chapter_prompts_carry_guidance_and_previous_outline() {
        let mut vm = VolumeManager::new().with_plot_manager(PlotManager::new(30, CurveType::WaveWithClimax));
        vm.plan_volumes("Ember", "fantasy", "defying fate", 30, None)
            .unwrap();

        let mut prompts = Vec::new();
        let mut generator = |prompt: &str| -> Result<String, GenerationError> {
            prompts.push(prompt.to_string());
            Ok(format!("outline number {} with its own distinct events", prompts.len()))
        };
        let outlines = vm
            .generate_chapter_outlines(1, "the volume outline", Some(&mut generator))
            .unwrap();
        assert_eq!(outlines.len(), 15);
        assert_eq!(prompts.len(), 15);
        assert!(prompts[0].contains("Chapter type: Opening"));
        assert!(prompts[0].contains("Overall progress: chapter 1/30"));
        assert!(!prompts[0].contains("[Previous chapter outline]"));
        assert!(prompts[1].contains("[Previous chapter outline]\noutline number 1"));
        assert!(prompts[14].contains("Position: chapter 15 of volume 1"));
    }

    #[test]
    fn generator_failure_is_an_error() {
        let vm = planned(30);
        let mut broken = |_: &str| -> Result<String, GenerationError> {
            Err(GenerationError::Failed("timeout".to_string()))
        };
        assert!(matches!(
            vm.generate_volume_summary(1, &[], Some(&mut broken)),
            Err(VolumeError::Generation(_))
        ));
    }

    #[test]
    fn blank_volume_text_is_an_error() {
        let vm = planned(30);
        let mut blank = |_: &str| -> Result<String, GenerationError> { Ok("  \n".to_string()) };
        assert!(matches!(
            vm.generate_volume_outline(1, Some(&mut blank)),
            Err(VolumeError::Generation(GenerationError::Empty))
        ));
        assert!(matches!(
            vm.generate_volume_summary(1, &[], Some(&mut blank)),
            Err(VolumeError::Generation(GenerationError::Empty))
        ));
    }

    #[test]
    fn summary_prompt_truncates_long_chapters() {
        let vm = planned(30);
        let long = "字".repeat(400);
        let mut captured = String::new();
        let mut generator = |prompt: &str| -> Result<String, GenerationError> {
            captured = prompt.to_string();
            Ok("summary".to_string())
        };
        vm.generate_volume_summary(2, &[long, "short".to_string()], Some(&mut generator))
            .unwrap();
        assert!(captured.contains(&format!("Chapter 16 preview:\n{}...", "字".repeat(300))));
        assert!(captured.contains("Chapter 17 preview:\nshort\n"));
    }

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("主角离开", 2), "主角");
        assert_eq!(preview("abc", 10), "abc");
    }
}
