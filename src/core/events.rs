//! Event dependency graph: causal structure of plot events and its integrity checks.

use rustc_hash::FxHashMap;
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};

use crate::core::graph::{AdjacencyGraph, DependencyGraph};
use crate::schema::event::{
    EventChain, IntegrityReport, PlotHole, PlotHoleKind, Severity, StoryEvent, Value,
};

/// Narrative events plus the graph of prerequisite and consequence edges.
///
/// Prerequisite edges run dependency → event, consequence edges run
/// event → consequence. Events accumulate; validation runs on demand.
#[derive(Debug, Clone, Default)]
pub struct EventDependencyGraph<G = AdjacencyGraph> {
    events: Vec<StoryEvent>,
    index: FxHashMap<String, usize>,
    graph: G,
}

impl EventDependencyGraph<AdjacencyGraph> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<G: DependencyGraph> EventDependencyGraph<G> {
    /// Build over a caller-supplied graph backend.
    pub fn with_graph(graph: G) -> Self {
        Self {
            events: Vec::new(),
            index: FxHashMap::default(),
            graph,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&StoryEvent> {
        self.index.get(id).map(|&i| &self.events[i])
    }

    pub fn events(&self) -> &[StoryEvent] {
        &self.events
    }

    /// Register an event and wire its edges.
    ///
    /// Referenced ids need not exist yet. Re-adding an id replaces its record
    /// but edges already wired stay in the graph.
    pub fn add_event(
        &mut self,
        id: &str,
        chapter_num: u32,
        description: &str,
        dependencies: &[&str],
        consequences: &[&str],
        metadata: HashMap<String, Value>,
    ) {
        let event = StoryEvent {
            id: id.to_string(),
            chapter_num,
            description: description.to_string(),
            dependencies: dependencies.iter().map(|s| s.to_string()).collect(),
            consequences: consequences.iter().map(|s| s.to_string()).collect(),
            metadata,
        };
        self.insert(event);
    }

    /// Register a prebuilt event record.
    pub fn insert(&mut self, event: StoryEvent) {
        self.graph.add_node(&event.id);
        for dep in &event.dependencies {
            self.graph.add_edge(dep, &event.id);
        }
        for cons in &event.consequences {
            self.graph.add_edge(&event.id, cons);
        }

        info!(
            event = %event.id,
            chapter = event.chapter_num,
            dependencies = event.dependencies.len(),
            consequences = event.consequences.len(),
            "event added"
        );

        match self.index.get(&event.id) {
            Some(&i) => {
                warn!(event = %event.id, "event redefined, replacing previous record");
                self.events[i] = event;
            }
            None => {
                self.index.insert(event.id.clone(), self.events.len());
                self.events.push(event);
            }
        }
    }

    /// Run the four integrity checks.
    ///
    /// Missing dependencies, cycles and timeline violations invalidate the
    /// graph; orphaned events only warn.
    pub fn validate_integrity(&self) -> IntegrityReport {
        let mut report = IntegrityReport {
            is_valid: true,
            ..IntegrityReport::default()
        };

        report.missing_dependencies = self.missing_dependencies();
        if !report.missing_dependencies.is_empty() {
            report.is_valid = false;
            report.errors.push(format!(
                "missing prerequisite events: {}",
                report.missing_dependencies.join(", ")
            ));
        }

        report.orphaned_events = self.orphaned_events();
        if !report.orphaned_events.is_empty() {
            report.warnings.push(format!(
                "isolated events with no causal links: {}",
                report.orphaned_events.join(", ")
            ));
        }

        report.circular_dependencies = self.graph.cycles();
        if !report.circular_dependencies.is_empty() {
            report.is_valid = false;
            let rendered: Vec<String> = report
                .circular_dependencies
                .iter()
                .map(|c| c.join(" -> "))
                .collect();
            report
                .errors
                .push(format!("circular dependencies: {}", rendered.join("; ")));
        }

        report.timeline_violations = self.timeline_violations();
        if !report.timeline_violations.is_empty() {
            report.is_valid = false;
            report
                .errors
                .push("timeline error: an event happens before one of its prerequisites".to_string());
        }

        info!(
            valid = report.is_valid,
            missing = report.missing_dependencies.len(),
            orphaned = report.orphaned_events.len(),
            cycles = report.circular_dependencies.len(),
            timeline = report.timeline_violations.len(),
            "event integrity validated"
        );
        report
    }

    fn missing_dependencies(&self) -> Vec<String> {
        let missing: BTreeSet<&str> = self
            .events
            .iter()
            .flat_map(|e| e.dependencies.iter())
            .filter(|dep| !self.index.contains_key(dep.as_str()))
            .map(String::as_str)
            .collect();
        missing.into_iter().map(str::to_string).collect()
    }

    fn orphaned_events(&self) -> Vec<String> {
        self.graph
            .node_ids()
            .into_iter()
            .filter(|id| self.graph.in_degree(id) == 0 && self.graph.out_degree(id) == 0)
            .collect()
    }

    fn timeline_violations(&self) -> Vec<(String, String)> {
        let mut violations = Vec::new();
        for event in &self.events {
            for dep in &event.dependencies {
                if let Some(dep_event) = self.get(dep) {
                    if dep_event.chapter_num >= event.chapter_num {
                        violations.push((event.id.clone(), dep.clone()));
                    }
                }
            }
        }
        violations
    }

    /// Flatten the integrity report into actionable items.
    pub fn plot_holes(&self) -> Vec<PlotHole> {
        let report = self.validate_integrity();
        let mut holes = Vec::new();

        for missing in report.missing_dependencies {
            holes.push(PlotHole {
                kind: PlotHoleKind::MissingDependency,
                description: format!("event {missing} is referenced but never defined"),
                event: missing,
                severity: Severity::High,
            });
        }
        for cycle in report.circular_dependencies {
            let joined = cycle.join(" -> ");
            holes.push(PlotHole {
                kind: PlotHoleKind::CircularDependency,
                description: format!("circular dependency: {joined}"),
                event: joined,
                severity: Severity::High,
            });
        }
        for (event, dep) in report.timeline_violations {
            holes.push(PlotHole {
                kind: PlotHoleKind::TimelineViolation,
                description: format!(
                    "event {event} depends on {dep}, but {dep} does not happen earlier"
                ),
                event,
                severity: Severity::High,
            });
        }
        for orphan in report.orphaned_events {
            holes.push(PlotHole {
                kind: PlotHoleKind::OrphanedEvent,
                description: format!("event {orphan} has no causes or consequences"),
                event: orphan,
                severity: Severity::Medium,
            });
        }
        holes
    }

    /// Ancestors, descendants and dependency depth of `event_id`.
    pub fn event_chain(&self, event_id: &str) -> EventChain {
        if !self.index.contains_key(event_id) {
            return EventChain::default();
        }
        let predecessors = self.graph.ancestors(event_id);
        let depth = if predecessors.is_empty() {
            0
        } else {
            self.graph.root_depth(event_id)
        };
        EventChain {
            successors: self.graph.descendants(event_id),
            predecessors,
            depth,
        }
    }

    /// Plain-text listing of up to `max_events` events.
    pub fn render_text(&self, max_events: usize) -> String {
        let mut lines = vec!["event dependency graph".to_string(), "=".repeat(60)];

        for event in self.events.iter().take(max_events) {
            let desc: String = event.description.chars().take(30).collect();
            lines.push(format!(
                "\n[{}] chapter {}: {}",
                event.id, event.chapter_num, desc
            ));
            if !event.dependencies.is_empty() {
                lines.push(format!("  <- after: {}", event.dependencies.join(", ")));
            }
            if !event.consequences.is_empty() {
                lines.push(format!("  -> causes: {}", event.consequences.join(", ")));
            }
        }

        if self.events.len() > max_events {
            lines.push(format!(
                "\n... {} more events not shown",
                self.events.len() - max_events
            ));
        }
        lines.join("\n")
    }
}
