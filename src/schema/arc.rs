//! Character arc records and the validating decode step for arc configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use thiserror::Error;

/// A scheduled plot event tied to a chapter and an arc transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub chapter: u32,
    #[serde(default)]
    pub event: String,
    /// Free text such as `"awakened -> growing"`.
    #[serde(default)]
    pub state_change: String,
}

/// Arc definition for one character.
///
/// `states` is ordered by maturity: an index is a rank. `triggers` maps a
/// chapter to the state the character should have reached by then.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcConfig {
    pub states: Vec<String>,
    pub triggers: BTreeMap<u32, String>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

impl ArcConfig {
    /// Trigger and milestone labels that are not listed in `states`.
    pub fn unknown_labels(&self) -> Vec<String> {
        let mut unknown = Vec::new();
        let mut note = |label: &str| {
            if !label.is_empty()
                && !self.states.iter().any(|s| s == label)
                && !unknown.iter().any(|u: &String| u == label)
            {
                unknown.push(label.to_string());
            }
        };
        for state in self.triggers.values() {
            note(state);
        }
        for milestone in &self.milestones {
            for part in milestone.state_change.split("->") {
                note(part.trim());
            }
        }
        unknown
    }
}

/// Why a configuration entry was not loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SkipReason {
    #[error("entry is not an object (found {0})")]
    NotAnObject(String),
    #[error("missing `states`")]
    MissingStates,
    #[error("missing `triggers`")]
    MissingTriggers,
    #[error("`states` is not a list (found {0})")]
    StatesNotAList(String),
    #[error("`triggers` is not a map (found {0})")]
    TriggersNotAMap(String),
    #[error("state #{0} is not a string")]
    NonStringState(usize),
}

/// A character entry that was skipped during loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub character: String,
    pub reason: SkipReason,
}

/// Outcome of decoding one character entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ArcDecode {
    Loaded {
        config: ArcConfig,
        warnings: Vec<String>,
    },
    Skipped(SkipReason),
}

/// Diagnostics collected while loading a whole arc configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArcLoadReport {
    pub loaded: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
    /// Reserved `_`-prefixed keys that were ignored.
    pub metadata_keys: Vec<String>,
    pub warnings: Vec<String>,
}

impl ArcLoadReport {
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}

/// Result of an arc consistency check for one character at one chapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArcCheck {
    pub character: String,
    pub chapter_num: u32,
    pub is_consistent: bool,
    pub expected_state: Option<String>,
    pub current_state: String,
    pub is_regression: bool,
    pub missed_triggers: Vec<u32>,
    pub missed_milestones: Vec<Milestone>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Read-only projection of a character's arc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcProgression {
    pub character: String,
    pub total_states: usize,
    pub states: Vec<String>,
    pub trigger_chapters: Vec<u32>,
    pub milestones_count: usize,
    pub milestones: Vec<Milestone>,
}

pub(crate) fn json_type_name(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "list",
        Json::Object(_) => "object",
    }
}

fn chapter_from_json(value: &Json) -> Option<u32> {
    match value {
        Json::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Decode one character entry into a typed [`ArcConfig`].
///
/// Structural problems skip the whole entry. Problems inside `triggers` or
/// `milestones` drop only the offending item and are reported as warnings.
pub fn decode_arc_entry(character: &str, raw: &Json) -> ArcDecode {
    let Json::Object(fields) = raw else {
        return ArcDecode::Skipped(SkipReason::NotAnObject(json_type_name(raw).to_string()));
    };

    let Some(raw_states) = fields.get("states") else {
        return ArcDecode::Skipped(SkipReason::MissingStates);
    };
    let Some(raw_triggers) = fields.get("triggers") else {
        return ArcDecode::Skipped(SkipReason::MissingTriggers);
    };
    let Json::Array(state_items) = raw_states else {
        return ArcDecode::Skipped(SkipReason::StatesNotAList(
            json_type_name(raw_states).to_string(),
        ));
    };
    let Json::Object(trigger_items) = raw_triggers else {
        return ArcDecode::Skipped(SkipReason::TriggersNotAMap(
            json_type_name(raw_triggers).to_string(),
        ));
    };

    let mut states = Vec::with_capacity(state_items.len());
    for (i, item) in state_items.iter().enumerate() {
        match item.as_str() {
            Some(s) => states.push(s.to_string()),
            None => return ArcDecode::Skipped(SkipReason::NonStringState(i)),
        }
    }

    let mut warnings = Vec::new();
    let mut triggers = BTreeMap::new();
    for (key, state) in trigger_items {
        let Ok(chapter) = key.trim().parse::<u32>() else {
            warnings.push(format!(
                "{character}: trigger key '{key}' is not a chapter number, ignored"
            ));
            continue;
        };
        match state.as_str() {
            Some(s) => {
                triggers.insert(chapter, s.to_string());
            }
            None => warnings.push(format!(
                "{character}: trigger for chapter {chapter} is a {}, expected a state label",
                json_type_name(state)
            )),
        }
    }

    let mut milestones = Vec::new();
    match fields.get("milestones") {
        None | Some(Json::Null) => {}
        Some(Json::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                let Json::Object(m) = item else {
                    warnings.push(format!("{character}: milestone #{i} is not an object, ignored"));
                    continue;
                };
                let Some(chapter) = m.get("chapter").and_then(chapter_from_json) else {
                    warnings.push(format!(
                        "{character}: milestone #{i} has no usable chapter number, ignored"
                    ));
                    continue;
                };
                let text = |field: &str| {
                    m.get(field)
                        .and_then(Json::as_str)
                        .unwrap_or_default()
                        .to_string()
                };
                milestones.push(Milestone {
                    chapter,
                    event: text("event"),
                    state_change: text("state_change"),
                });
            }
        }
        Some(other) => warnings.push(format!(
            "{character}: `milestones` is a {}, expected a list; ignored",
            json_type_name(other)
        )),
    }

    let config = ArcConfig {
        states,
        triggers,
        milestones,
    };
    for label in config.unknown_labels() {
        warnings.push(format!(
            "{character}: label '{label}' does not appear in states"
        ));
    }

    ArcDecode::Loaded { config, warnings }
}
