/// Consistency integration tests — arcs, the event graph and a full session.

use novel_planner::core::arc::CharacterArcTracker;
use novel_planner::core::events::EventDependencyGraph;
use novel_planner::core::generator::GenerationError;
use novel_planner::schema::arc::SkipReason;
use novel_planner::schema::event::{PlotHoleKind, Severity, StoryEvent};
use novel_planner::{ChapterDraft, NovelSession};
use std::collections::HashMap;
use std::path::Path;

fn sample_arcs() -> CharacterArcTracker {
    let mut tracker = CharacterArcTracker::new();
    tracker
        .load_from_json_file(Path::new("planner_data/arcs.json"))
        .unwrap();
    tracker
}

#[test]
fn sample_arcs_load_with_diagnostics() {
    let mut tracker = CharacterArcTracker::new();
    let report = tracker
        .load_from_json_file(Path::new("planner_data/arcs.json"))
        .unwrap();

    assert_eq!(tracker.characters(), vec!["林远", "苏晴"]);
    assert_eq!(report.metadata_keys.len(), 2);
    assert_eq!(report.skipped.len(), 2);
    let reason_for = |name: &str| {
        report
            .skipped
            .iter()
            .find(|s| s.character == name)
            .map(|s| s.reason.clone())
    };
    assert_eq!(
        reason_for("影卫"),
        Some(SkipReason::StatesNotAList("string".to_string()))
    );
    assert_eq!(reason_for("老者"), Some(SkipReason::MissingTriggers));
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("final"));
}

#[test]
fn expected_state_uses_latest_trigger() {
    let tracker = sample_arcs();
    assert_eq!(tracker.expected_state("林远", 7), Some("觉醒"));
    assert_eq!(tracker.expected_state("林远", 12), Some("成长"));
    assert_eq!(tracker.expected_state("苏晴", 2), None);
    assert_eq!(tracker.expected_state("nobody", 2), None);
}

#[test]
fn regression_is_ordered_by_state_rank() {
    let tracker = sample_arcs();
    assert!(tracker.is_regression("林远", "觉醒", "成长"));
    assert!(!tracker.is_regression("林远", "成长", "觉醒"));
    // Substring fallback: "初步觉醒" locates "觉醒".
    assert!(tracker.is_regression("林远", "初步觉醒", "蜕变"));
    // Unknown labels never count as regression.
    assert!(!tracker.is_regression("林远", "迷茫", "成长"));
}

#[test]
fn milestone_missing_from_outline_is_reported() {
    let tracker = sample_arcs();
    let check = tracker.check_consistency("林远", 24, "蜕变", Some("林远独自下山，回忆往事。"));
    assert!(check.is_consistent);
    assert_eq!(check.missed_milestones.len(), 1);
    assert_eq!(check.missed_milestones[0].event, "师父陨落");

    let unknown = tracker.check_consistency("无名", 3, "觉醒", None);
    assert!(!unknown.is_consistent);
    assert_eq!(unknown.warnings.len(), 1);
}

fn four_events() -> EventDependencyGraph {
    let mut graph = EventDependencyGraph::new();
    graph.add_event("E1", 1, "the village burns", &[], &[], HashMap::new());
    graph.add_event("E2", 3, "the hero swears revenge", &["E1"], &[], HashMap::new());
    graph.add_event("E3", 5, "the hero finds a mentor", &["E2"], &[], HashMap::new());
    graph.add_event("E4", 2, "a comet passes", &[], &[], HashMap::new());
    graph
}

#[test]
fn isolated_event_is_the_only_plot_hole() {
    let graph = four_events();
    let report = graph.validate_integrity();
    assert!(report.is_valid);
    assert_eq!(report.orphaned_events, vec!["E4"]);
    assert!(report.circular_dependencies.is_empty());
    assert!(report.timeline_violations.is_empty());

    let holes = graph.plot_holes();
    assert_eq!(holes.len(), 1);
    assert_eq!(holes[0].severity, Severity::Medium);
    assert_eq!(holes[0].kind, PlotHoleKind::OrphanedEvent);

    let chain = graph.event_chain("E3");
    assert_eq!(chain.predecessors, vec!["E1", "E2"]);
    assert_eq!(chain.depth, 2);
}

#[test]
fn dependency_after_the_event_breaks_the_timeline() {
    let mut graph = four_events();
    graph.insert(StoryEvent::new("E5", 1).after(&["E2"]));
    let report = graph.validate_integrity();
    assert!(!report.is_valid);
    assert!(report
        .timeline_violations
        .contains(&("E5".to_string(), "E2".to_string())));
    assert!(graph.render_text(3).contains("2 more events not shown"));
}

#[test]
fn session_runs_a_volume_end_to_end() {
    let mut session = NovelSession::builder()
        .title("Ember")
        .genre("fantasy")
        .theme("defying fate")
        .total_chapters(30)
        .config_file("planner_data/planner.ron")
        .arcs_file("planner_data/arcs.json")
        .build()
        .unwrap();
    assert_eq!(session.arcs().len(), 2);

    let mut prompts = Vec::new();
    let mut generator = |prompt: &str| -> Result<String, GenerationError> {
        prompts.push(prompt.to_string());
        Ok("Volume one follows Lin Yuan from the burning village to the mountain sect.".to_string())
    };
    let outline = session
        .volumes()
        .generate_volume_outline(1, Some(&mut generator))
        .unwrap();
    assert!(outline.starts_with("Volume one"));
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Chapters 1-15 (15 chapters)"));

    let mut last = None;
    for chapter in 1..=15 {
        let planned = session.plot().escalator().intensity_at(chapter);
        let mut draft = ChapterDraft::new(chapter).intensity(planned);
        if chapter == 5 {
            draft = draft
                .outline("林远在祖祠中血脉觉醒，第一次看见了隐藏在村庄下的古老阵法。")
                .state("林远", "觉醒")
                .event(StoryEvent::new("awakening", 5).describe("bloodline awakens"));
        }
        let review = session.review_chapter(&draft).unwrap();
        assert!(review.is_clean(), "chapter {chapter}: {review:?}");
        assert_eq!(review.volume_complete, chapter == 15);
        last = Some(review);
    }

    let last = last.unwrap();
    assert!(last.volume_end_reason.contains("boundary"));
    assert_eq!(session.intensity_history().len(), 15);
    assert_eq!(session.events().len(), 1);
}
