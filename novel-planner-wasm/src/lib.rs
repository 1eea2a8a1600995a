//! WASM bindings for novel-planner — JSON in, JSON out.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use novel_planner::core::arc::CharacterArcTracker;
use novel_planner::core::curve::{plan_curve, CurveType};
use novel_planner::core::events::EventDependencyGraph;
use novel_planner::core::plot::PlotManager;
use novel_planner::core::volume::VolumeManager;
use novel_planner::schema::arc::{ArcCheck, ArcLoadReport};
use novel_planner::schema::event::{IntegrityReport, PlotHole, StoryEvent};
use novel_planner::{ChapterDraft, NovelSession, PlannerConfig};

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(Deserialize)]
struct PlanInput {
    title: String,
    #[serde(default)]
    genre: String,
    #[serde(default)]
    theme: String,
    total_chapters: u32,
    chapters_per_volume: Option<u32>,
}

#[derive(Deserialize)]
struct SessionInput {
    #[serde(flatten)]
    plan: PlanInput,
    /// RON text of a `PlannerConfig`.
    config: Option<String>,
    /// Arc configuration keyed by character.
    arcs: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct EventReport {
    integrity: IntegrityReport,
    plot_holes: Vec<PlotHole>,
}

#[derive(Serialize)]
struct ArcResult {
    load: ArcLoadReport,
    check: ArcCheck,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// Stateless entry points
// ---------------------------------------------------------------------------

/// Plan volumes from `{title, genre, theme, total_chapters, chapters_per_volume?}`.
#[wasm_bindgen]
pub fn plan_volumes(input_json: &str) -> Result<String, JsError> {
    let input: PlanInput = serde_json::from_str(input_json)
        .map_err(|e| JsError::new(&format!("Invalid plan JSON: {e}")))?;
    let mut manager = VolumeManager::new();
    let plan = manager
        .plan_volumes(
            &input.title,
            &input.genre,
            &input.theme,
            input.total_chapters,
            input.chapters_per_volume,
        )
        .map_err(|e| JsError::new(&format!("Planning error: {e}")))?;
    to_json(plan)
}

/// JSON array with one planned intensity per chapter.
#[wasm_bindgen]
pub fn conflict_curve(total_chapters: u32, curve_type: &str) -> Result<String, JsError> {
    to_json(&plan_curve(total_chapters, CurveType::parse(curve_type)))
}

#[wasm_bindgen]
pub fn plot_guidance(
    total_chapters: u32,
    chapter_num: u32,
    curve_type: &str,
) -> Result<String, JsError> {
    let manager = PlotManager::new(total_chapters, CurveType::parse(curve_type));
    to_json(&manager.plot_guidance(chapter_num, None, None, None))
}

/// Validate a JSON array of events.
#[wasm_bindgen]
pub fn validate_events(events_json: &str) -> Result<String, JsError> {
    let events: Vec<StoryEvent> = serde_json::from_str(events_json)
        .map_err(|e| JsError::new(&format!("Invalid events JSON: {e}")))?;
    let mut graph = EventDependencyGraph::new();
    for event in events {
        graph.insert(event);
    }
    to_json(&EventReport {
        integrity: graph.validate_integrity(),
        plot_holes: graph.plot_holes(),
    })
}

/// Load an arc configuration and check one character's state at one chapter.
#[wasm_bindgen]
pub fn check_arc(
    arcs_json: &str,
    character: &str,
    chapter_num: u32,
    current_state: &str,
) -> Result<String, JsError> {
    let mut tracker = CharacterArcTracker::new();
    let load = tracker
        .load_from_json_str(arcs_json)
        .map_err(|e| JsError::new(&format!("Arc config error: {e}")))?;
    let check = tracker.check_consistency(character, chapter_num, current_state, None);
    to_json(&ArcResult { load, check })
}

/// Return JSON array of curve type names.
#[wasm_bindgen]
pub fn curve_types() -> String {
    serde_json::to_string(&["wave_with_climax", "linear", "exponential"])
        .unwrap_or_else(|_| "[]".to_string())
}

// ---------------------------------------------------------------------------
// PlannerSession: stateful wrapper around a NovelSession
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct PlannerSession {
    session: NovelSession,
}

#[wasm_bindgen]
impl PlannerSession {
    /// Expected JSON shape:
    /// ```json
    /// {
    ///   "title": "Ember",
    ///   "genre": "fantasy",
    ///   "theme": "defying fate",
    ///   "total_chapters": 60,
    ///   "config": "(curve_type: linear)",
    ///   "arcs": { "Lin": { "states": ["..."], "triggers": { "1": "..." } } }
    /// }
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new(input_json: &str) -> Result<PlannerSession, JsError> {
        let input: SessionInput = serde_json::from_str(input_json)
            .map_err(|e| JsError::new(&format!("Invalid session JSON: {e}")))?;

        let config = match input.config {
            Some(ref ron) => PlannerConfig::parse_ron(ron)
                .map_err(|e| JsError::new(&format!("Config error: {e}")))?,
            None => PlannerConfig::default(),
        };

        let mut arcs = CharacterArcTracker::new();
        if let Some(ref raw) = input.arcs {
            arcs.load_from_value(raw)
                .map_err(|e| JsError::new(&format!("Arc config error: {e}")))?;
        }

        let mut builder = NovelSession::builder()
            .title(&input.plan.title)
            .genre(&input.plan.genre)
            .theme(&input.plan.theme)
            .total_chapters(input.plan.total_chapters)
            .with_config(config)
            .with_arcs(arcs);
        if let Some(size) = input.plan.chapters_per_volume {
            builder = builder.chapters_per_volume(size);
        }
        let session = builder
            .build()
            .map_err(|e| JsError::new(&format!("Session build error: {e}")))?;
        Ok(PlannerSession { session })
    }

    /// The current volume plan as JSON.
    pub fn plan(&self) -> Result<String, JsError> {
        to_json(&self.session.plan())
    }

    pub fn guidance(&self, chapter_num: u32) -> Result<String, JsError> {
        let guidance = self
            .session
            .guidance(chapter_num)
            .map_err(|e| JsError::new(&format!("Guidance error: {e}")))?;
        to_json(&guidance)
    }

    /// Review a chapter described by a `ChapterDraft` JSON object.
    pub fn review(&mut self, draft_json: &str) -> Result<String, JsError> {
        let draft: ChapterDraft = serde_json::from_str(draft_json)
            .map_err(|e| JsError::new(&format!("Invalid draft JSON: {e}")))?;
        let review = self
            .session
            .review_chapter(&draft)
            .map_err(|e| JsError::new(&format!("Review error: {e}")))?;
        to_json(&review)
    }

    pub fn curve_chart(&self, width: usize) -> String {
        self.session.plot().escalator().visualize_curve(width)
    }
}
