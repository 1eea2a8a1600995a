use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A dynamic value that can be stored in event metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

/// A narrative event in the dependency graph.
///
/// `dependencies` must happen before this event; `consequences` are events
/// this one causes. Either list may name events that are not defined yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryEvent {
    pub id: String,
    pub chapter_num: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub consequences: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl StoryEvent {
    pub fn new(id: impl Into<String>, chapter_num: u32) -> Self {
        Self {
            id: id.into(),
            chapter_num,
            description: String::new(),
            dependencies: Vec::new(),
            consequences: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn after(mut self, deps: &[&str]) -> Self {
        self.dependencies.extend(deps.iter().map(|d| d.to_string()));
        self
    }

    pub fn causes(mut self, cons: &[&str]) -> Self {
        self.consequences.extend(cons.iter().map(|c| c.to_string()));
        self
    }
}

/// Severity of a plot hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Low,
}

/// Kind of integrity issue found in the event graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotHoleKind {
    MissingDependency,
    CircularDependency,
    TimelineViolation,
    OrphanedEvent,
}

/// One actionable integrity issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotHole {
    pub kind: PlotHoleKind,
    pub event: String,
    pub description: String,
    pub severity: Severity,
}

/// Result of `EventDependencyGraph::validate_integrity`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub is_valid: bool,
    pub missing_dependencies: Vec<String>,
    pub orphaned_events: Vec<String>,
    pub circular_dependencies: Vec<Vec<String>>,
    /// `(event, dependency)` pairs where the dependency does not come first.
    pub timeline_violations: Vec<(String, String)>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Ancestors, descendants and dependency depth of one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventChain {
    pub predecessors: Vec<String>,
    pub successors: Vec<String>,
    pub depth: usize,
}
